/// kbchat: centralized constants.
/// Model identifiers, endpoints, default prompt text and UI strings.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    /// Gemini model identifier requested by default.
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const GEMINI_API_VERSION: &str = "v1beta";
    pub const STREAM_METHOD: &str = "streamGenerateContent";
    pub const API_KEY_HEADER: &str = "x-goog-api-key";
}

// ─── Secrets ──────────────────────────────────────────────────────────────────

pub mod secrets {
    /// Name of the API credential in the secret store (and env override).
    pub const DEFAULT_API_KEY_NAME: &str = "GEMINI_API";
    pub const SECRETS_FILE: &str = "secrets.toml";
    /// Project-local secret store directory, checked before the config dir.
    pub const LOCAL_SECRETS_DIR: &str = ".kbchat";
}

// ─── Prompt ───────────────────────────────────────────────────────────────────

pub mod prompt {
    pub const KNOWLEDGE_PLACEHOLDER: &str = "{knowledge_base_content}";
    pub const QUESTION_SEPARATOR: &str = "\n\nUser's Question: ";

    pub const INSTRUCTION_TEMPLATE: &str = "
You are a helpful and informative AI assistant.
You have been provided with the following context. Use this context to answer the user's questions.
If you cannot find the answer within the provided context, state that you do not have information on that specific topic.
Respond in Bengali.

Provided Information (Context):
{knowledge_base_content}
";

    pub const KNOWLEDGE_BASE: &str = "
বাংলাদেশের জাতীয় ফল কাঁঠাল। কাঁঠাল আকারে বেশ বড় হয় এবং এর পুষ্টিগুণ অনেক। এটি গ্রীষ্মকালে পাওয়া যায়।
বাংলাদেশের রাজধানী ঢাকা। এটি একটি জনবহুল শহর।
জাতীয় ফুল শাপলা।
বাংলাদেশের প্রধান ভাষা বাংলা।
";
}

// ─── Error Text ───────────────────────────────────────────────────────────────

pub mod errors {
    /// Prefix of the assistant turn recorded when generation fails.
    pub const TURN_PREFIX: &str = "An error occurred: ";
    /// Prefix of the inline banner shown when generation fails.
    pub const BANNER_PREFIX: &str = "Sorry, an error occurred: ";
}

// ─── UI Strings ───────────────────────────────────────────────────────────────

pub mod ui {
    pub const TITLE: &str = "💬 Bengali Gemini Chatbot";
    pub const DESCRIPTION: &str = "This is a simple chatbot that uses Google's Gemini Pro model. \
        Please ask your questions in Bengali.";
    pub const INPUT_PLACEHOLDER: &str = "Write your question in Bengali...";
    pub const SPINNER_TEXT: &str = "Thinking...";
    pub const STREAM_CURSOR: &str = "▌";
    pub const DEFAULT_THEME: &str = "dark";
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "kbchat";
    pub const CONFIG_FILE: &str = "config.toml";
}
