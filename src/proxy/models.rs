use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamResponse {
    pub title: String,
    pub stream_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
