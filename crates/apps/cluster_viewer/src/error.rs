use formats::DatasetError;
use layers::LabelError;
use runtime::LoopError;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("invalid cluster dataset: {0}")]
    InvalidDataset(#[from] DatasetError),
    #[error("invalid viewer config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid viewer config: {field} {reason}")]
    ConfigRange { field: &'static str, reason: String },
    #[error("label: {0}")]
    Label(#[from] LabelError),
    #[error("host: {0}")]
    Host(String),
    #[error("gpu: {0}")]
    Gpu(String),
    #[error(transparent)]
    Loop(#[from] LoopError),
}

impl ViewerError {
    /// Wraps a thrown JS value, keeping its string form when it has one.
    pub fn host(value: JsValue) -> Self {
        Self::Host(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<ViewerError> for JsValue {
    fn from(err: ViewerError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ViewerError;
    use formats::ClusterDataset;
    use runtime::LoopError;

    #[test]
    fn dataset_errors_convert() {
        let err: ViewerError = ClusterDataset::from_json_str(r#"[{"x":[1],"y":[],"z":[1]}]"#)
            .unwrap_err()
            .into();
        assert!(matches!(err, ViewerError::InvalidDataset(_)));
        assert!(err.to_string().starts_with("invalid cluster dataset"));
    }

    #[test]
    fn loop_errors_are_transparent() {
        let err = ViewerError::from(LoopError::AlreadyRunning);
        assert_eq!(err.to_string(), LoopError::AlreadyRunning.to_string());
    }
}
