use thiserror::Error;

/// Failure inside a processor while handling one input line. Recorded in
/// traces and the error log by the telemetry wrapper, then re-raised.
#[derive(Debug, Clone, Error)]
#[error("processor '{processor_id}' failed: {message}")]
pub struct ProcessorError {
    pub processor_id: String,
    pub message: String,
}

impl ProcessorError {
    pub fn new(processor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            processor_id: processor_id.into(),
            message: message.into(),
        }
    }
}
