use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::error::{AppError, Result};

/// Hands out strictly increasing millisecond tokens used as stored-name prefixes.
#[derive(Clone, Default)]
pub struct NameGenerator {
    last_token: Arc<AtomicI64>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds, or one past the last token if the clock
    /// has not advanced (or went backwards).
    pub fn next_token(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_token
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    pub fn stored_name(&self, original_filename: &str) -> String {
        format!("{}-{}", self.next_token(), sanitize_filename(original_filename))
    }
}

/// Keeps the final path component and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original);

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Rejects anything that is not a plain, visible file name inside the storage directory.
pub fn check_stored_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');

    if invalid {
        return Err(AppError::InvalidFileName(name.to_string()));
    }
    Ok(())
}
