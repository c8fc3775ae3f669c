use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamError {
    /// The params document is not valid JSON.
    #[error("invalid params JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The params document parsed, but its top level is not an object.
    #[error("params must be a JSON object, got {0}")]
    NotAnObject(String),
}
