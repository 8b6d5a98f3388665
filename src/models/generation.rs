use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodboardRequest {
    pub app_name: Option<String>,
    pub app_desc: Option<String>,
    pub vibes: Option<Vec<String>>,
    /// Accepted for client compatibility; not part of the prompt.
    #[allow(dead_code)]
    pub tech_stack: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub app_name: Option<String>,
    pub app_desc: Option<String>,
    pub audience: Option<String>,
    pub vibes: Option<Vec<String>>,
    pub colors: Option<Palette>,
    pub font_heading: Option<String>,
    pub font_body: Option<String>,
    pub pages: Option<Vec<String>>,
    pub radius: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub bg: String,
    pub surface: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub accent: String,
    pub border: String,
}

/// A generated image ready to hand back to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Base64 image bytes exactly as the provider returned them.
    #[serde(rename = "image")]
    pub image_data: String,
    pub mime_type: String,
}

/// One unit of a multimodal provider response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

#[cfg(test)]
impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: Option<&str>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.map(str::to_string),
                data: data.into(),
            }),
        }
    }
}
