use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Font(#[from] fontmodel::Error),
    #[error("bad instance '{0}': expected comma separated 'tag=value' pairs")]
    BadInstance(String),
    #[error("could not write to '{path}': '{inner}'")]
    FileWrite {
        path: PathBuf,
        inner: std::io::Error,
    },
    #[error("write failed: '{0}'")]
    Io(#[from] std::io::Error),
    #[error("could not serialize diff: '{0}'")]
    Json(#[from] serde_json::Error),
}
