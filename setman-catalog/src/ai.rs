//! Translation and OCR collaborators
//!
//! Only the request/response shapes and the capability traits live here.
//! Transports (HTTP clients for the individual services) implement
//! [`Translator`] or [`TextExtractor`] outside the catalog.

use crate::materials::fs;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use setman_common::{Code, Error, Result};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub target_lang: String,
    /// `None` lets the service detect the source language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_lang: target_lang.into(),
            source_lang: None,
            context: None,
        }
    }

    pub fn with_source(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = Some(source_lang.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Image payload for text extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrRequest {
    pub image_base64: String,
    pub mime_type: String,
}

impl OcrRequest {
    /// Fails with `file_not_valid` when the bytes are not a recognised image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let kind = infer::get(bytes)
            .filter(|k| k.matcher_type() == infer::MatcherType::Image)
            .ok_or_else(|| {
                Error::with_message(Code::FileNotValid, "Data is not a recognised image")
            })?;

        Ok(Self {
            image_base64: fs::bytes_to_base64(bytes),
            mime_type: kind.mime_type().to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::file_to_bytes(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Normalised reply of any AI service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub content: String,
    /// Raw service reply, kept for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_json: Option<String>,
}

impl UnifiedResponse {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            valid: true,
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Content of a valid reply, or the reply's error
    pub fn into_result(self) -> Result<String> {
        if self.valid {
            Ok(self.content)
        } else {
            Err(Error::with_message(
                Code::Generic,
                self.error.unwrap_or_else(|| "AI service returned an invalid reply".to_string()),
            ))
        }
    }
}

/// Text translation capability
#[async_trait]
pub trait Translator: Send + Sync {
    /// Service identifier (e.g. "deepl", "openrouter")
    fn name(&self) -> &str;

    async fn translate(&self, request: &TranslationRequest) -> Result<UnifiedResponse>;
}

/// Image-to-text capability
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_text(&self, request: &OcrRequest) -> Result<UnifiedResponse>;
}

/// Routes translation requests to one of several registered translators
pub struct TranslationService {
    translators: Vec<Arc<dyn Translator>>,
    preferred: Option<String>,
    target_lang: String,
    source_lang: Option<String>,
}

impl TranslationService {
    pub fn new(target_lang: impl Into<String>) -> Self {
        Self {
            translators: Vec::new(),
            preferred: None,
            target_lang: target_lang.into(),
            source_lang: None,
        }
    }

    pub fn register(&mut self, translator: Arc<dyn Translator>) -> &mut Self {
        self.translators.push(translator);
        self
    }

    /// Prefer the translator with this name when it is registered
    pub fn choose(&mut self, name: impl Into<String>) -> &mut Self {
        self.preferred = Some(name.into());
        self
    }

    pub fn set_target_language(&mut self, lang: impl Into<String>) -> &mut Self {
        self.target_lang = lang.into();
        self
    }

    pub fn set_source_language(&mut self, lang: impl Into<String>) -> &mut Self {
        self.source_lang = Some(lang.into());
        self
    }

    pub fn auto_detect_source_language(&mut self) -> &mut Self {
        self.source_lang = None;
        self
    }

    fn active(&self) -> Option<&Arc<dyn Translator>> {
        self.preferred
            .as_deref()
            .and_then(|name| self.translators.iter().find(|t| t.name() == name))
            .or_else(|| self.translators.first())
    }

    /// Translate `text` with the preferred translator, or the first one
    /// registered
    pub async fn translate(&self, text: &str) -> Result<String> {
        let translator = self.active().ok_or_else(|| {
            Error::with_message(Code::ConfigError, "No translator is configured")
        })?;

        let mut request = TranslationRequest::new(text, self.target_lang.clone());
        request.source_lang = self.source_lang.clone();

        tracing::debug!(
            translator = %translator.name(),
            target = %request.target_lang,
            chars = text.chars().count(),
            "Sending translation request"
        );

        translator.translate(&request).await?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTranslator {
        name: &'static str,
    }

    #[async_trait]
    impl Translator for EchoTranslator {
        fn name(&self) -> &str {
            self.name
        }

        async fn translate(&self, request: &TranslationRequest) -> Result<UnifiedResponse> {
            Ok(UnifiedResponse::ok(format!(
                "{}:{}:{}",
                self.name, request.target_lang, request.text
            )))
        }
    }

    #[tokio::test]
    async fn test_service_prefers_chosen_translator() {
        let mut service = TranslationService::new("EN");
        service
            .register(Arc::new(EchoTranslator { name: "deepl" }))
            .register(Arc::new(EchoTranslator { name: "openrouter" }));

        assert_eq!(service.translate("hi").await.unwrap(), "deepl:EN:hi");

        service.choose("openrouter");
        assert_eq!(service.translate("hi").await.unwrap(), "openrouter:EN:hi");

        service.choose("missing");
        assert_eq!(service.translate("hi").await.unwrap(), "deepl:EN:hi");
    }

    #[tokio::test]
    async fn test_service_without_translators() {
        let service = TranslationService::new("EN");
        let err = service.translate("hi").await.unwrap_err();
        assert_eq!(err.code(), Code::ConfigError);
    }

    #[test]
    fn test_ocr_request_detects_mime() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let request = OcrRequest::from_bytes(&png).unwrap();
        assert_eq!(request.mime_type, "image/png");

        let err = OcrRequest::from_bytes(b"plain text").unwrap_err();
        assert_eq!(err.code(), Code::FileNotValid);
    }

    #[test]
    fn test_invalid_response_is_error() {
        let err = UnifiedResponse::failed("quota").into_result().unwrap_err();
        assert_eq!(err.message(), "quota");
    }
}
