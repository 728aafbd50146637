use crate::constants::prompt;
use crate::context::KnowledgeSnippet;

/// Builds the per-turn payload: instruction template with the knowledge
/// snippet interpolated, then the separator, then the user's question.
///
/// Text is taken verbatim. Nothing is escaped, validated or truncated.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: String,
    knowledge: KnowledgeSnippet,
    placeholder: String,
    separator: String,
}

impl PromptAssembler {
    pub fn new(template: impl Into<String>, knowledge: KnowledgeSnippet) -> Self {
        Self {
            template: template.into(),
            knowledge,
            placeholder: prompt::KNOWLEDGE_PLACEHOLDER.to_string(),
            separator: prompt::QUESTION_SEPARATOR.to_string(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn knowledge(&self) -> &KnowledgeSnippet {
        &self.knowledge
    }

    /// The instruction block with the knowledge interpolated.
    pub fn instruction(&self) -> String {
        if self.placeholder.is_empty() {
            return self.template.clone();
        }
        self.template
            .replace(&self.placeholder, self.knowledge.as_str())
    }

    pub fn assemble(&self, question: &str) -> String {
        let instruction = self.instruction();
        let mut payload =
            String::with_capacity(instruction.len() + self.separator.len() + question.len());
        payload.push_str(&instruction);
        payload.push_str(&self.separator);
        payload.push_str(question);
        payload
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(prompt::INSTRUCTION_TEMPLATE, KnowledgeSnippet::builtin())
    }
}
