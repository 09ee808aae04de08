use thiserror::Error;

/// Errors raised while fetching media
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The external tool could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The external tool exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    /// yt-dlp finished without reporting a downloaded file
    #[error("no media file was produced")]
    NoOutput,
    /// Downloaded file exceeds the upload limit
    #[error("file is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
    /// A remote API answered with an unusable response
    #[error("{0}")]
    Api(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;
