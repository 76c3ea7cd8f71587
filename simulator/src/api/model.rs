use serde::Serialize;

/// Body of a successful `DELETE /api/files/delete/{file}`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReply {
    pub success: bool,
    pub message: String,
}

impl DeleteReply {
    pub fn deleted(image_file: &str) -> Self {
        Self {
            success: true,
            message: format!("File {image_file} deleted and marked as removed"),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
