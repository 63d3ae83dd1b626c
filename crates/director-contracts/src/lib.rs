//! Shared, I/O-free contracts for the director guidance pipeline.
//!
//! Everything in this crate is pure: result schema, lighting vocabulary,
//! operating modes, chat turns, intent detection and the response
//! normalizer that turns loose model output into a [`GuidanceResult`].

pub mod chat;
pub mod mode;
pub mod models;
pub mod normalize;
pub mod schema;

pub use mode::{Mode, ModeController, ModeState};
pub use normalize::truncate_chars;
pub use schema::{
    ChatAction, ChatReply, ChatRole, ChatTurn, GuidanceResult, LightingLabel, SceneDetails,
    ScoreScale, TechnicalAdjustments,
};
