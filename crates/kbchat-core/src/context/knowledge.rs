use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::constants::prompt;
use crate::error::{KbChatError, Result};

/// Fixed reference text injected into every prompt.
///
/// Cheap to clone; the text itself is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSnippet {
    text: Arc<str>,
}

impl KnowledgeSnippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Arc::from(text.into()),
        }
    }

    /// The Bengali fact sheet shipped with the binary.
    pub fn builtin() -> Self {
        Self::new(prompt::KNOWLEDGE_BASE)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KbChatError::config(format!("cannot read knowledge file {}: {e}", path.display()))
        })?;
        Ok(Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Default for KnowledgeSnippet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Display for KnowledgeSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
