pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod llm;
pub mod session;

// Re-export key types
pub use config::{SecretStore, Settings};
pub use context::{KnowledgeSnippet, PromptAssembler, Role, Transcript, Turn};
pub use error::{KbChatError, Result};
pub use llm::{FragmentStream, GeminiClient, GenerationClient, SafetySetting, StreamEvent};
pub use session::{ChatSession, SessionEvent, TurnOutcome, TurnState};
