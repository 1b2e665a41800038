pub mod config;
pub mod error;
pub mod gather;
pub mod output_formats;

pub use config::{
    BUILTIN_EXCLUDED_DIRS, CollectConfig, DEFAULT_CONFIG_FILENAME, DEFAULT_MANIFEST_PATH,
    FileConfig, MATCHED_EXTENSIONS, MATCHED_FILE_NAMES, ReadErrorPolicy,
};
pub use error::{AppError, Result};
pub use gather::{FileInfo, gather_contracts, normalize_relative_path, read_file};
pub use output_formats::{BundleDocument, BundleFormatter, JsonStyle, serialize_context_to_json};
