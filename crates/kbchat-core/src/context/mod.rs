mod knowledge;
mod prompt;
mod transcript;

pub use knowledge::KnowledgeSnippet;
pub use prompt::PromptAssembler;
pub use transcript::{Role, Transcript, Turn};
