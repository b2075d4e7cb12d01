use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read or write store snapshot")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize store snapshot")]
    Json(#[from] serde_json::Error),
    #[error("Failed to move store snapshot into place")]
    Persist(#[from] tempfile::PersistError),
    #[error("Store snapshot has format version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
    #[error("Module `{module}` has training data for unknown code {hash}")]
    DanglingCode { module: String, hash: String },
}
