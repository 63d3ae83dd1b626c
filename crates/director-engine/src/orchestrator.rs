//! Single entry point composing router, gateway, normalizer and fallbacks.

use director_contracts::chat::render_transcript;
use director_contracts::normalize::{normalize, GuidanceSchema};
use director_contracts::{ChatReply, GuidanceResult, Mode};
use serde::{Deserialize, Serialize};

use crate::assets::AssetStore;
use crate::config::EngineConfig;
use crate::error::{FailureKind, GatewayFailure, GuidanceError};
use crate::fallback;
use crate::frame::Frame;
use crate::gateway::{ImageBytes, ImageCall, ModelGateway, TextCall, DRYRUN_IMAGE_MODEL};
use crate::prompts;
use crate::request::GuidanceRequest;
use crate::router::{shape_chat_reply, GuidanceRouter, RequestKind};

/// Effect preset rendered for a shooting guide.
pub const GUIDE_EFFECT: &str = "steam_loop";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    pub edited_image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStatus {
    Applied,
    Mock,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectResult {
    pub effect_type: String,
    pub status: EffectStatus,
    pub overlay_url: String,
}

/// Serializes as `{}` when no overlay was rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEffectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl VideoEffectMetadata {
    pub fn rendered() -> Self {
        Self {
            frame_rate: Some(24),
            quality: Some("4K".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEffectResult {
    pub effect_type: String,
    pub veo_overlay_stream: String,
    #[serde(default)]
    pub metadata: VideoEffectMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideResult {
    pub video_url: String,
}

enum Rendered {
    Image(ImageBytes),
    Placeholder(ImageBytes),
    Failed(GatewayFailure),
}

/// Holds only read-only collaborators; safe to share across requests.
pub struct Orchestrator {
    config: EngineConfig,
    gateway: ModelGateway,
    assets: AssetStore,
    router: GuidanceRouter,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, gateway: ModelGateway) -> Self {
        let assets = AssetStore::new(config.static_dir.clone());
        Self {
            config,
            gateway,
            assets,
            router: GuidanceRouter,
        }
    }

    pub fn from_config(config: EngineConfig) -> Result<Self, GatewayFailure> {
        let gateway = ModelGateway::from_config(&config)?;
        Ok(Self::new(config, gateway))
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Live frame coaching on the 0–100 scale with camera adjustments.
    pub async fn analyze(&self, request: &GuidanceRequest) -> Result<GuidanceResult, GuidanceError> {
        let frame = require_frame(request)?;
        let route = self.router.route(RequestKind::FrameAnalysis, request);
        let instruction = prompts::frame_analysis(&request.context_label, request.mode);
        let outcome = self
            .gateway
            .invoke(TextCall {
                model: route.capability.model(&self.config),
                instruction: &instruction,
                image: Some(frame),
            })
            .await;
        match outcome {
            Ok(raw) => Ok(normalize(&raw, GuidanceSchema::FrameAnalysis).into_result()),
            Err(failure) => match failure.kind {
                FailureKind::MissingCredentials => {
                    tracing::info!("no API key configured; serving mock frame analysis");
                    Ok(fallback::mock_frame_analysis())
                }
                FailureKind::UpstreamUnavailable | FailureKind::MalformedUpstreamResponse => {
                    Ok(fallback::technical_issue(&failure.detail))
                }
                FailureKind::InvalidInput => Err(GuidanceError::InvalidInput(failure.detail)),
            },
        }
    }

    /// Proactive scene read on the decile scale, canonicalised to 0–100.
    pub async fn analyze_scene(
        &self,
        request: &GuidanceRequest,
    ) -> Result<GuidanceResult, GuidanceError> {
        let frame = require_frame(request)?;
        let route = self.router.route(RequestKind::SceneAnalysis, request);
        let instruction = prompts::scene_analysis(&request.context_label);
        let outcome = self
            .gateway
            .invoke(TextCall {
                model: route.capability.model(&self.config),
                instruction: &instruction,
                image: Some(frame),
            })
            .await;
        match outcome {
            Ok(raw) => Ok(normalize(&raw, GuidanceSchema::SceneAnalysis).into_result()),
            Err(failure) if failure.kind == FailureKind::InvalidInput => {
                Err(GuidanceError::InvalidInput(failure.detail))
            }
            Err(failure) => {
                tracing::info!(kind = failure.kind.as_str(), "serving mock scene analysis");
                Ok(fallback::mock_scene(&frame.fingerprint()))
            }
        }
    }

    pub async fn chat(
        &self,
        request: &GuidanceRequest,
        message: &str,
    ) -> Result<ChatReply, GuidanceError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(GuidanceError::InvalidInput("message is empty".to_string()));
        }
        let route = self.router.route(RequestKind::Chat, request);
        let transcript = render_transcript(
            &request.history,
            self.config.history_turns,
            prompts::assistant_label(route.template),
        );
        let instruction = prompts::chat(route.template, &request.context_label, &transcript, message);
        let outcome = self
            .gateway
            .invoke(TextCall {
                model: route.capability.model(&self.config),
                instruction: &instruction,
                image: request.image.as_ref(),
            })
            .await;
        let reply = match outcome {
            Ok(raw) => shape_chat_reply(raw.trim()),
            Err(failure) => match failure.kind {
                FailureKind::MissingCredentials => {
                    shape_chat_reply(fallback::chat_greeting(route.capability))
                }
                FailureKind::UpstreamUnavailable | FailureKind::MalformedUpstreamResponse => {
                    shape_chat_reply(&fallback::chat_busy(route.capability, &failure.detail))
                }
                FailureKind::InvalidInput => {
                    return Err(GuidanceError::InvalidInput(failure.detail))
                }
            },
        };
        tracing::debug!(
            capability = route.capability.as_str(),
            action = reply.action.map(|action| action.as_str()),
            "chat reply shaped"
        );
        Ok(reply)
    }

    /// Edits the frame as instructed and returns the stored result's URL.
    /// An empty URL means the edit could not be produced.
    pub async fn edit(&self, prompt: &str, frame: &Frame) -> Result<EditResult, GuidanceError> {
        let prompt = require_text(prompt, "prompt")?;
        let rendered = self
            .render(RequestKind::Edit, &photo_routing(), prompt, Some(frame))
            .await?;
        let edited_image_url = match rendered {
            Rendered::Image(image) | Rendered::Placeholder(image) => {
                self.assets.persist_png("edits", "edit", &image.bytes).await?
            }
            Rendered::Failed(failure) => {
                tracing::warn!(%failure, "photo edit unavailable");
                String::new()
            }
        };
        Ok(EditResult { edited_image_url })
    }

    pub async fn apply_effect(
        &self,
        frame: &Frame,
        prompt: &str,
    ) -> Result<EffectResult, GuidanceError> {
        let effect_type = prompt.trim().to_string();
        if prompts::is_no_fx(&effect_type) {
            return Ok(EffectResult {
                effect_type,
                status: EffectStatus::Skipped,
                overlay_url: String::new(),
            });
        }
        require_text(&effect_type, "effect")?;
        let rendered = self
            .render(RequestKind::Effect, &photo_routing(), &effect_type, Some(frame))
            .await?;
        let (status, overlay_url) = match rendered {
            Rendered::Image(image) => (
                EffectStatus::Applied,
                self.assets.persist_png("effects", "effect", &image.bytes).await?,
            ),
            Rendered::Placeholder(image) => (
                EffectStatus::Mock,
                self.assets.persist_png("effects", "effect", &image.bytes).await?,
            ),
            Rendered::Failed(failure) => {
                tracing::warn!(%failure, effect = %effect_type, "effect unavailable");
                (EffectStatus::Failed, String::new())
            }
        };
        Ok(EffectResult {
            effect_type,
            status,
            overlay_url,
        })
    }

    /// Renders an overlay for a named preset or free-form effect description.
    pub async fn apply_video_effect(
        &self,
        context_label: &str,
        effect: &str,
    ) -> Result<VideoEffectResult, GuidanceError> {
        let effect_type = effect.trim().to_string();
        let Some(description) = prompts::video_effect_description(&effect_type) else {
            return Ok(VideoEffectResult {
                effect_type,
                veo_overlay_stream: String::new(),
                metadata: VideoEffectMetadata::default(),
            });
        };
        let routing = GuidanceRequest::new(context_label, Mode::Videography);
        let prompt = prompts::overlay_prompt(&description);
        let stream = match self
            .render(RequestKind::VideoEffect, &routing, &prompt, None)
            .await?
        {
            Rendered::Image(image) | Rendered::Placeholder(image) => Some(
                self.assets
                    .persist_png("effects", "video_fx", &image.bytes)
                    .await?,
            ),
            Rendered::Failed(failure) => {
                tracing::warn!(%failure, effect = %effect_type, "video overlay unavailable");
                None
            }
        };
        Ok(match stream {
            Some(veo_overlay_stream) => VideoEffectResult {
                effect_type,
                veo_overlay_stream,
                metadata: VideoEffectMetadata::rendered(),
            },
            None => VideoEffectResult {
                effect_type,
                veo_overlay_stream: String::new(),
                metadata: VideoEffectMetadata::default(),
            },
        })
    }

    pub async fn generate_guide(&self, context_label: &str) -> Result<GuideResult, GuidanceError> {
        let effect = self.apply_video_effect(context_label, GUIDE_EFFECT).await?;
        Ok(GuideResult {
            video_url: effect.veo_overlay_stream,
        })
    }

    async fn render(
        &self,
        kind: RequestKind,
        routing: &GuidanceRequest,
        prompt: &str,
        image: Option<&Frame>,
    ) -> Result<Rendered, GuidanceError> {
        let route = self.router.route(kind, routing);
        let outcome = self
            .gateway
            .generate_image(ImageCall {
                model: route.capability.model(&self.config),
                prompt,
                image,
            })
            .await;
        let failure = match outcome {
            Ok(image) => return Ok(Rendered::Image(image)),
            Err(failure) => failure,
        };
        match failure.kind {
            FailureKind::InvalidInput => Err(GuidanceError::InvalidInput(failure.detail)),
            FailureKind::MissingCredentials => {
                tracing::info!(
                    capability = route.capability.as_str(),
                    "no API key configured; rendering placeholder"
                );
                let placeholder = self
                    .gateway
                    .generate_image(ImageCall {
                        model: DRYRUN_IMAGE_MODEL,
                        prompt,
                        image,
                    })
                    .await;
                Ok(match placeholder {
                    Ok(image) => Rendered::Placeholder(image),
                    Err(failure) => Rendered::Failed(failure),
                })
            }
            FailureKind::UpstreamUnavailable | FailureKind::MalformedUpstreamResponse => {
                Ok(Rendered::Failed(failure))
            }
        }
    }
}

fn photo_routing() -> GuidanceRequest {
    GuidanceRequest::new("photo edit", Mode::Photography)
}

fn require_frame(request: &GuidanceRequest) -> Result<&Frame, GuidanceError> {
    request
        .image
        .as_ref()
        .ok_or_else(|| GuidanceError::InvalidInput("an image frame is required".to_string()))
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, GuidanceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GuidanceError::InvalidInput(format!("{field} is empty")));
    }
    Ok(trimmed)
}
