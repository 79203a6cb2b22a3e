#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Table store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode table store response: {0}")]
    Decode(#[from] serde_json::Error),
}
