use serde::{Deserialize, Serialize};

/// Harm categories configurable on a Gemini request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

/// Filtering level, from least to most restrictive.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    #[default]
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    pub fn new(category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        Self { category, threshold }
    }

    /// One setting per category, all at the same threshold.
    pub fn all_categories(threshold: HarmBlockThreshold) -> Vec<Self> {
        HarmCategory::ALL
            .iter()
            .map(|&category| Self::new(category, threshold))
            .collect()
    }

    /// Every category explicitly set to `BLOCK_NONE`.
    pub fn permissive() -> Vec<Self> {
        Self::all_categories(HarmBlockThreshold::BlockNone)
    }
}
