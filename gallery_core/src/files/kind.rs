use serde::{Deserialize, Serialize};
use std::path::Path;

/// Display class of a stored file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
}

/// Every accepted extension and the kind it maps to. Lowercase only.
const EXTENSION_TABLE: &[(&str, FileKind)] = &[
    ("pdf", FileKind::Document),
    ("jpg", FileKind::Image),
    ("jpeg", FileKind::Image),
    ("png", FileKind::Image),
    ("gif", FileKind::Image),
];

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(allowed, _)| *allowed == ext)
            .map(|(_, kind)| *kind)
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        extension_of(filename).and_then(Self::from_extension)
    }

    /// Value of the `type` field in listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "pdf",
            FileKind::Image => "image",
        }
    }

    pub fn allowed_extensions() -> impl Iterator<Item = &'static str> {
        EXTENSION_TABLE.iter().map(|(ext, _)| *ext)
    }
}

pub fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(FileKind::from_filename("report.pdf"), Some(FileKind::Document));
        assert_eq!(FileKind::from_filename("REPORT.PDF"), Some(FileKind::Document));
        assert_eq!(FileKind::from_filename("photo.png"), Some(FileKind::Image));
        assert_eq!(FileKind::from_filename("photo.JpEg"), Some(FileKind::Image));
        assert_eq!(FileKind::from_filename("anim.gif"), Some(FileKind::Image));
    }

    #[test]
    fn test_rejected_extensions() {
        assert_eq!(FileKind::from_filename("a.exe"), None);
        assert_eq!(FileKind::from_filename("notes.txt"), None);
        assert_eq!(FileKind::from_filename("noextension"), None);
        assert_eq!(FileKind::from_filename(".png"), None);
        // no substring matching on the extension
        assert_eq!(FileKind::from_filename("image.pngx"), None);
        assert_eq!(FileKind::from_filename("archive.pdf.zip"), None);
    }

    #[test]
    fn test_type_strings() {
        assert_eq!(FileKind::Document.as_str(), "pdf");
        assert_eq!(FileKind::Image.as_str(), "image");
        assert_eq!(FileKind::allowed_extensions().count(), 5);
    }
}
