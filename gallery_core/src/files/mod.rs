pub mod kind;
pub mod manager;
pub mod models;
pub mod naming;
pub mod store;
pub mod validation;

pub use kind::FileKind;
pub use manager::{FileManager, FileManagerConfig};
pub use models::{FileUpload, StorageStats, StoredFile};
pub use naming::NameGenerator;
pub use store::FileStore;
pub use validation::{FileValidationConfig, FileValidator, ValidationError};
