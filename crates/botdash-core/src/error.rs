use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Not logged in; run `botdash login` first")]
    NotLoggedIn,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    ServerRejection { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// True when the server answered with 401, i.e. the stored session is gone.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::ServerRejection { status: 401, .. })
    }
}
