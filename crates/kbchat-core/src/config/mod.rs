mod secrets;

pub use secrets::SecretStore;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{endpoints, models, paths, prompt, secrets as secret_names, ui};
use crate::context::{KnowledgeSnippet, PromptAssembler};
use crate::error::{KbChatError, Result};
use crate::llm::{GeminiClient, HarmBlockThreshold, SafetySetting};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub prompt: PromptSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    /// Name of the credential in the secret store.
    pub api_key_name: String,
    /// Applied to all four harm categories.
    pub safety_threshold: HarmBlockThreshold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_path: Option<PathBuf>,
    pub placeholder: String,
    pub separator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub title: String,
    pub description: String,
    pub input_placeholder: String,
    pub spinner_text: String,
    pub theme: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: models::DEFAULT_GEMINI_MODEL.to_string(),
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
            api_key_name: secret_names::DEFAULT_API_KEY_NAME.to_string(),
            safety_threshold: HarmBlockThreshold::BlockNone,
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            instruction_path: None,
            knowledge_path: None,
            placeholder: prompt::KNOWLEDGE_PLACEHOLDER.to_string(),
            separator: prompt::QUESTION_SEPARATOR.to_string(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title: ui::TITLE.to_string(),
            description: ui::DESCRIPTION.to_string(),
            input_placeholder: ui::INPUT_PLACEHOLDER.to_string(),
            spinner_text: ui::SPINNER_TEXT.to_string(),
            theme: ui::DEFAULT_THEME.to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Load from the default location, falling back to defaults when the
    /// file is absent or unreadable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("ignoring {}: {e}", config_path.display()),
            }
        }
        Self::default()
    }

    /// Load from an explicit path. Unlike [`Settings::load`], any failure is reported.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KbChatError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| KbChatError::config(format!("invalid {}: {e}", path.display())))
    }

    /// Resolve the API credential. Absence is a configuration error.
    pub fn api_key(&self, secrets: &SecretStore) -> Result<String> {
        secrets.require(&self.llm.api_key_name)
    }

    pub fn safety_settings(&self) -> Vec<SafetySetting> {
        SafetySetting::all_categories(self.llm.safety_threshold)
    }

    /// Build the prompt assembler, reading template and knowledge files once.
    pub fn build_assembler(&self) -> Result<PromptAssembler> {
        let template = match self.prompt.instruction_path {
            Some(ref path) => std::fs::read_to_string(path).map_err(|e| {
                KbChatError::config(format!("cannot read instruction template {}: {e}", path.display()))
            })?,
            None => prompt::INSTRUCTION_TEMPLATE.to_string(),
        };
        let knowledge = match self.prompt.knowledge_path {
            Some(ref path) => KnowledgeSnippet::from_file(path)?,
            None => KnowledgeSnippet::builtin(),
        };

        Ok(PromptAssembler::new(template, knowledge)
            .with_placeholder(&self.prompt.placeholder)
            .with_separator(&self.prompt.separator))
    }

    /// Build the generation client from the current settings.
    pub fn build_client(&self, api_key: impl Into<String>) -> GeminiClient {
        GeminiClient::new(api_key)
            .with_model(&self.llm.model)
            .with_base_url(&self.llm.base_url)
            .with_safety_settings(self.safety_settings())
    }
}
