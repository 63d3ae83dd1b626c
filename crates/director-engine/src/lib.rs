//! Guidance engine: model gateway, routing, fallbacks and the orchestrator
//! that serves every request kind.

pub mod assets;
pub mod config;
pub mod error;
pub mod fallback;
pub mod frame;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
pub mod request;
pub mod router;

pub use assets::AssetStore;
pub use config::EngineConfig;
pub use error::{FailureKind, GatewayFailure, GuidanceError};
pub use frame::Frame;
pub use gateway::{InferenceProvider, ModelGateway, ProviderRegistry};
pub use orchestrator::{
    EditResult, EffectResult, EffectStatus, GuideResult, Orchestrator, VideoEffectMetadata,
    VideoEffectResult,
};
pub use request::GuidanceRequest;
pub use router::{Capability, GuidanceRouter, RequestKind, Route, TemplateKind};
