#![forbid(unsafe_code)]

pub mod csv_source;
pub mod location;
pub mod repository;
pub mod settings_file;
pub mod sqlite;

pub use location::SettingsLocation;
pub use repository::{Storage, StorageError};
