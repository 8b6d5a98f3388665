use crate::errors::GenerationError;
use crate::models::generation::{ContentPart, GenerationResult, DEFAULT_MIME_TYPE};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Anything that can take a prompt and answer with an ordered list of
/// multimodal content parts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Whether the provider has the credential it needs to be called.
    fn is_configured(&self) -> bool;

    /// Submits `prompt` to `model`, asking for both text and image output.
    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<Vec<ContentPart>, GenerationError>;
}

pub struct GenerationClient {
    provider: Arc<dyn ContentProvider>,
    model: String,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn ContentProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<GenerationResult, GenerationError> {
        let parts = self.provider.generate_content(&self.model, prompt).await?;
        debug!(parts = parts.len(), model = %self.model, "Provider returned content parts");

        first_inline_image(parts).ok_or(GenerationError::NoImage)
    }
}

/// The first part carrying non-empty inline data, with its media type
/// defaulted when the provider leaves it out.
pub fn first_inline_image(parts: impl IntoIterator<Item = ContentPart>) -> Option<GenerationResult> {
    parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|inline| !inline.data.is_empty())
        .map(|inline| GenerationResult {
            image_data: inline.data,
            mime_type: inline
                .mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn picks_first_image_part_after_text() {
        let parts = vec![
            ContentPart::text("Here is your board"),
            ContentPart::inline(Some("image/jpeg"), "AAAA"),
            ContentPart::inline(Some("image/png"), "BBBB"),
        ];
        let image = first_inline_image(parts).unwrap();
        assert_eq!(image.image_data, "AAAA");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn missing_mime_type_defaults_to_png() {
        let image = first_inline_image(vec![ContentPart::inline(None, "AAAA")]).unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn empty_inline_data_is_skipped() {
        let parts = vec![
            ContentPart::inline(Some("image/webp"), ""),
            ContentPart::inline(Some("image/png"), "CCCC"),
        ];
        assert_eq!(first_inline_image(parts).unwrap().image_data, "CCCC");
    }

    #[test]
    fn text_only_response_has_no_image() {
        assert!(first_inline_image(vec![ContentPart::text("sorry")]).is_none());
        assert!(first_inline_image(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn client_passes_model_and_prompt_to_provider() {
        let mut provider = MockContentProvider::new();
        provider
            .expect_generate_content()
            .withf(|model, prompt| model == "image-model" && prompt == "draw a cat")
            .times(1)
            .returning(|_, _| Ok(vec![ContentPart::inline(Some("image/png"), "QUJD")]));

        let client = GenerationClient::new(Arc::new(provider), "image-model");
        let image = assert_ok!(client.generate_image("draw a cat").await);
        assert_eq!(image.image_data, "QUJD");
    }

    #[tokio::test]
    async fn client_reports_no_image() {
        let mut provider = MockContentProvider::new();
        provider
            .expect_generate_content()
            .returning(|_, _| Ok(vec![ContentPart::text("only words")]));

        let client = GenerationClient::new(Arc::new(provider), "image-model");
        let err = assert_err!(client.generate_image("draw").await);
        assert!(matches!(err, GenerationError::NoImage));
        assert_eq!(err.to_string(), "No image generated");
    }

    #[tokio::test]
    async fn client_surfaces_provider_message() {
        let mut provider = MockContentProvider::new();
        provider.expect_generate_content().returning(|_, _| {
            Err(GenerationError::Provider {
                status: 429,
                message: "Resource has been exhausted".to_string(),
            })
        });

        let client = GenerationClient::new(Arc::new(provider), "image-model");
        let err = assert_err!(client.generate_image("draw").await);
        assert_eq!(err.to_string(), "Resource has been exhausted");
    }
}
