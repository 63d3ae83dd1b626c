use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

const PHOTOGRAPHY_FEATURES: &[&str] = &["scene_analysis", "composition_guide", "shutter_control"];
const VIDEOGRAPHY_FEATURES: &[&str] = &[
    "video_stabilization",
    "audio_monitoring",
    "continuous_focus",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Photography,
    Videography,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Photography => "photography",
            Mode::Videography => "videography",
        }
    }

    pub fn features(self) -> &'static [&'static str] {
        match self {
            Mode::Photography => PHOTOGRAPHY_FEATURES,
            Mode::Videography => VIDEOGRAPHY_FEATURES,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "photography" | "photo" => Some(Mode::Photography),
            "videography" | "video" => Some(Mode::Videography),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    pub current_mode: Mode,
    pub is_recording: bool,
    pub active_features: Vec<String>,
}

impl ModeState {
    fn for_mode(mode: Mode, is_recording: bool) -> Self {
        Self {
            current_mode: mode,
            is_recording,
            active_features: mode
                .features()
                .iter()
                .map(|feature| (*feature).to_string())
                .collect(),
        }
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::for_mode(Mode::default(), false)
    }
}

/// Process-wide operating mode.
///
/// `active_features` is rewritten in the same write as `current_mode`, so a
/// reader never observes a mode paired with another mode's features.
/// Concurrent `set_mode` calls are last-writer-wins.
#[derive(Debug, Default)]
pub struct ModeController {
    state: RwLock<ModeState>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModeState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_mode(&self) -> Mode {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_mode
    }

    /// Switches mode. Never fails and leaves `is_recording` untouched.
    pub fn set_mode(&self, mode: Mode) -> ModeState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = ModeState::for_mode(mode, state.is_recording);
        tracing::info!(mode = %mode, "operating mode changed");
        state.clone()
    }

    pub fn set_recording(&self, is_recording: bool) -> ModeState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.is_recording = is_recording;
        tracing::info!(is_recording, mode = %state.current_mode, "recording state changed");
        state.clone()
    }
}
