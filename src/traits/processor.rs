use async_trait::async_trait;

use crate::errors::ProcessorError;
use crate::line::TaggedLine;

/// A stage in the stream: consumes tagged lines one at a time, emits zero
/// or more tagged lines per input.
///
/// The contract is pull-per-line. One `feed` may emit nothing (the line is
/// dropped), one line, or many (fan-out). Fan-in processors buffer across
/// calls and drain whatever is pending when `flush` signals end of stream.
#[async_trait]
pub trait Processor: Send {
    async fn feed(&mut self, line: TaggedLine) -> Result<Vec<TaggedLine>, ProcessorError>;

    /// Called once when the input stream is exhausted.
    async fn flush(&mut self) -> Result<Vec<TaggedLine>, ProcessorError> {
        Ok(Vec::new())
    }

    fn type_name(&self) -> &'static str;
}
