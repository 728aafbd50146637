use crate::error::KbChatError;
use crate::llm::FragmentStream;

/// Events emitted by a client's reader task while a response streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    Done,
    Error(String),
}

/// A hosted text-generation service.
///
/// One call per user turn. The returned stream yields text fragments in
/// arrival order and ends at end-of-response or at the first error.
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send the payload and get a stream of response fragments.
    ///
    /// Errors returned here happen before any fragment is produced
    /// (connection failure, non-success status).
    async fn generate_stream(&self, payload: &str) -> Result<FragmentStream, KbChatError>;

    /// Model identifier, for status display and logs.
    fn model(&self) -> &str;
}
