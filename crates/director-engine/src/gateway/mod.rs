//! Outbound model calls.
//!
//! [`ModelGateway`] is the only place that talks to the inference API. It
//! resolves a model through the [`ModelRegistry`], checks credentials before
//! any network activity and classifies every failure into a
//! [`GatewayFailure`]. One attempt per call; no retries.

mod dryrun;
mod gemini;
mod imagen;

use std::collections::BTreeMap;

use async_trait::async_trait;
use director_contracts::models::{
    Fallback, ModelRegistry, ModelSpec, CAPABILITY_EDIT, CAPABILITY_IMAGE, CAPABILITY_TEXT,
    CAPABILITY_VISION,
};
use director_contracts::truncate_chars;
use serde_json::Value;

pub use dryrun::DryrunProvider;
pub use gemini::GeminiProvider;
pub use imagen::ImagenProvider;

use crate::config::EngineConfig;
use crate::error::GatewayFailure;
use crate::frame::Frame;

/// Model used when a placeholder image is wanted.
pub const DRYRUN_IMAGE_MODEL: &str = "dryrun-image-1";

#[derive(Debug, Clone, Copy)]
pub struct TextCall<'a> {
    pub model: &'a str,
    pub instruction: &'a str,
    pub image: Option<&'a Frame>,
}

#[derive(Debug, Clone, Copy)]
pub struct ImageCall<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub image: Option<&'a Frame>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn requires_credentials(&self) -> bool {
        true
    }

    async fn generate_text(
        &self,
        api_key: &str,
        call: &TextCall<'_>,
    ) -> Result<String, GatewayFailure>;

    async fn generate_image(
        &self,
        api_key: &str,
        call: &ImageCall<'_>,
    ) -> Result<ImageBytes, GatewayFailure>;
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn InferenceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: InferenceProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn InferenceProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }
}

pub struct ModelGateway {
    api_key: Option<String>,
    models: ModelRegistry,
    providers: ProviderRegistry,
}

impl ModelGateway {
    pub fn new(api_key: Option<String>, models: ModelRegistry, providers: ProviderRegistry) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            models,
            providers,
        }
    }

    /// Builds the gateway with one shared HTTP client carrying the request timeout.
    pub fn from_config(config: &EngineConfig) -> Result<Self, GatewayFailure> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GatewayFailure::unavailable(format!("HTTP client init failed: {err}")))?;
        let mut providers = ProviderRegistry::new();
        providers.register(DryrunProvider);
        providers.register(GeminiProvider::new(http.clone(), &config.gemini_api_base));
        providers.register(ImagenProvider::new(http, &config.imagen_api_base));
        Ok(Self::new(
            config.api_key.clone(),
            ModelRegistry::default(),
            providers,
        ))
    }

    /// Text or vision call. The image, when present, is sent ahead of the instruction.
    pub async fn invoke(&self, call: TextCall<'_>) -> Result<String, GatewayFailure> {
        if call.instruction.trim().is_empty() {
            return Err(GatewayFailure::invalid_input("instruction is empty"));
        }
        let capability = if call.image.is_some() {
            CAPABILITY_VISION
        } else {
            CAPABILITY_TEXT
        };
        let (model, provider) = self.resolve(call.model, capability)?;
        let api_key = self.credentials_for(provider)?;
        tracing::debug!(
            provider = provider.name(),
            model = %model.name,
            with_image = call.image.is_some(),
            "invoking text model"
        );
        let call = TextCall {
            model: &model.name,
            ..call
        };
        let result = provider.generate_text(api_key, &call).await;
        if let Err(failure) = &result {
            tracing::warn!(model = %model.name, %failure, "text call failed");
        }
        result
    }

    /// Image generation, or image edit when a source frame is supplied.
    pub async fn generate_image(&self, call: ImageCall<'_>) -> Result<ImageBytes, GatewayFailure> {
        if call.prompt.trim().is_empty() {
            return Err(GatewayFailure::invalid_input("prompt is empty"));
        }
        let capability = if call.image.is_some() {
            CAPABILITY_EDIT
        } else {
            CAPABILITY_IMAGE
        };
        let (model, provider) = self.resolve(call.model, capability)?;
        let api_key = self.credentials_for(provider)?;
        tracing::debug!(
            provider = provider.name(),
            model = %model.name,
            with_image = call.image.is_some(),
            "invoking image model"
        );
        let call = ImageCall {
            model: &model.name,
            ..call
        };
        let result = provider.generate_image(api_key, &call).await;
        if let Err(failure) = &result {
            tracing::warn!(model = %model.name, %failure, "image call failed");
        }
        result
    }

    fn resolve(
        &self,
        requested: &str,
        capability: &str,
    ) -> Result<(ModelSpec, &dyn InferenceProvider), GatewayFailure> {
        let resolved = self
            .models
            .resolve(Some(requested), capability)
            .map_err(|err| GatewayFailure::invalid_input(err.to_string()))?;
        match &resolved.fallback {
            None => {}
            Some(Fallback::Unspecified) => {
                tracing::debug!(model = %resolved.model.name, capability, "using default model")
            }
            Some(reason) => tracing::warn!(
                fallback = %resolved.model.name,
                capability,
                %reason,
                "model fallback"
            ),
        }
        let provider = self.providers.get(&resolved.model.provider).ok_or_else(|| {
            GatewayFailure::invalid_input(format!(
                "no provider registered for '{}'",
                resolved.model.provider
            ))
        })?;
        Ok((resolved.model, provider))
    }

    fn credentials_for(&self, provider: &dyn InferenceProvider) -> Result<&str, GatewayFailure> {
        if !provider.requires_credentials() {
            return Ok("");
        }
        self.api_key
            .as_deref()
            .ok_or_else(GatewayFailure::missing_credentials)
    }
}

pub(crate) async fn send(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<Value, GatewayFailure> {
    let response = request.send().await.map_err(|err| {
        GatewayFailure::unavailable(format!("{provider} request failed: {}", err.without_url()))
    })?;
    response_json_or_error(provider, response).await
}

async fn response_json_or_error(
    provider: &str,
    response: reqwest::Response,
) -> Result<Value, GatewayFailure> {
    let status = response.status();
    let code = status.as_u16();
    let body = response.text().await.map_err(|err| {
        GatewayFailure::unavailable(format!(
            "{provider} response body read failed: {}",
            err.without_url()
        ))
    })?;
    if !status.is_success() {
        return Err(GatewayFailure::unavailable(format!(
            "{provider} request failed ({code}): {}",
            truncate_chars(&body, 512)
        )));
    }
    serde_json::from_str(&body).map_err(|err| {
        GatewayFailure::malformed(format!("{provider} returned invalid JSON payload: {err}"))
    })
}
