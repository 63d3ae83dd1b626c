//! Maps a request onto a prompt template and the capability that serves it.

use director_contracts::chat::{detect_action, strip_sentinel};
use director_contracts::ChatReply;

use crate::config::EngineConfig;
use crate::request::GuidanceRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    FrameAnalysis,
    SceneAnalysis,
    Chat,
    Edit,
    Effect,
    VideoEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    FrameAnalysis,
    SceneAnalysis,
    PhotographyChat,
    VideographyChat,
    Edit,
    Overlay,
}

/// Stateless role that answers a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Analyst,
    SceneAnalyst,
    Photographer,
    Videographer,
    Editor,
    Guide,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Analyst => "analyst",
            Capability::SceneAnalyst => "scene_analyst",
            Capability::Photographer => "photographer",
            Capability::Videographer => "videographer",
            Capability::Editor => "editor",
            Capability::Guide => "guide",
        }
    }

    pub fn model<'a>(self, config: &'a EngineConfig) -> &'a str {
        match self {
            Capability::Analyst | Capability::Photographer | Capability::Videographer => {
                &config.text_model
            }
            Capability::SceneAnalyst => &config.scene_model,
            Capability::Editor => &config.edit_model,
            Capability::Guide => &config.overlay_model,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub template: TemplateKind,
    pub capability: Capability,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuidanceRouter;

impl GuidanceRouter {
    pub fn route(&self, kind: RequestKind, request: &GuidanceRequest) -> Route {
        let (template, capability) = match kind {
            RequestKind::FrameAnalysis => (TemplateKind::FrameAnalysis, Capability::Analyst),
            RequestKind::SceneAnalysis => (TemplateKind::SceneAnalysis, Capability::SceneAnalyst),
            RequestKind::Chat if prefers_videography(&request.context_label) => {
                (TemplateKind::VideographyChat, Capability::Videographer)
            }
            RequestKind::Chat => (TemplateKind::PhotographyChat, Capability::Photographer),
            RequestKind::Edit | RequestKind::Effect => (TemplateKind::Edit, Capability::Editor),
            RequestKind::VideoEffect => (TemplateKind::Overlay, Capability::Guide),
        };
        tracing::debug!(
            ?kind,
            ?template,
            capability = capability.as_str(),
            context = %request.context_label,
            mode = %request.mode,
            "routed request"
        );
        Route {
            template,
            capability,
        }
    }
}

/// Heuristic substring match on the label. The operating mode does not take
/// part; a "Professional Profile" chat stays with the photographer.
pub fn prefers_videography(context_label: &str) -> bool {
    let label = context_label.to_lowercase();
    label.contains("video") || label.contains("cinematographer")
}

/// Action detection runs on the raw text; the sentinel is stripped after.
pub fn shape_chat_reply(raw: &str) -> ChatReply {
    ChatReply {
        action: detect_action(raw),
        text: strip_sentinel(raw),
    }
}
