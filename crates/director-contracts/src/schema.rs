use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical score (0–100) at or above which a frame is flagged ready to shoot.
/// Equivalent to 7 on the decile scale.
pub const READINESS_THRESHOLD: u8 = 70;

pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 5.0;
pub const EXPOSURE_MIN: f32 = -2.0;
pub const EXPOSURE_MAX: f32 = 2.0;

/// Range a schema's raw composition score is expressed in.
///
/// Results always carry the canonical 0–100 value; decile scores are
/// multiplied by ten. A decile schema that receives a value above 10 treats
/// it as already being a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScale {
    Percent,
    Decile,
}

impl ScoreScale {
    pub fn to_canonical(self, raw: f64) -> u8 {
        if !raw.is_finite() {
            return 0;
        }
        let value = match self {
            ScoreScale::Percent => raw,
            ScoreScale::Decile if raw <= 10.0 => raw * 10.0,
            ScoreScale::Decile => raw,
        };
        value.round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightingLabel {
    Poor,
    Fair,
    Good,
    Excellent,
    #[default]
    Unknown,
    Error,
}

const LIGHTING_KEYWORDS: &[(LightingLabel, &[&str])] = &[
    (LightingLabel::Error, &["error"]),
    (
        LightingLabel::Poor,
        &[
            "poor",
            "dark",
            "dim",
            "harsh",
            "low",
            "bad",
            "backlit",
            "underexposed",
            "overexposed",
            "blown",
        ],
    ),
    (
        LightingLabel::Excellent,
        &["excellent", "perfect", "great", "ideal", "superb"],
    ),
    (
        LightingLabel::Good,
        &["good", "soft", "balanced", "even", "nice", "well"],
    ),
    (
        LightingLabel::Fair,
        &[
            "fair", "ok", "okay", "adequate", "moderate", "mixed", "average", "decent",
        ],
    ),
];

impl LightingLabel {
    pub const ALL: [LightingLabel; 6] = [
        LightingLabel::Poor,
        LightingLabel::Fair,
        LightingLabel::Good,
        LightingLabel::Excellent,
        LightingLabel::Unknown,
        LightingLabel::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LightingLabel::Poor => "Poor",
            LightingLabel::Fair => "Fair",
            LightingLabel::Good => "Good",
            LightingLabel::Excellent => "Excellent",
            LightingLabel::Unknown => "Unknown",
            LightingLabel::Error => "Error",
        }
    }

    /// Maps free-form lighting prose ("Soft and balanced", "too harsh") onto
    /// the closed vocabulary. The first word that is itself a label name wins
    /// ("Good low-key light" is Good); otherwise the first keyword group with
    /// a whole-word hit decides.
    pub fn from_free_text(text: &str) -> Self {
        let lowered = text.trim().to_ascii_lowercase();
        let words: Vec<&str> = lowered
            .split(|ch: char| !ch.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        if let Some(label) = words.iter().find_map(|word| {
            Self::ALL
                .iter()
                .find(|label| label.as_str().eq_ignore_ascii_case(word))
        }) {
            return *label;
        }

        LIGHTING_KEYWORDS
            .iter()
            .find(|(_, keywords)| words.iter().any(|word| keywords.contains(word)))
            .map(|(label, _)| *label)
            .unwrap_or(LightingLabel::Unknown)
    }
}

impl fmt::Display for LightingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera adjustments the client may apply automatically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAdjustments {
    pub zoom_level: f32,
    pub exposure_offset: f32,
    pub torch_on: bool,
}

impl Default for TechnicalAdjustments {
    fn default() -> Self {
        Self::neutral()
    }
}

impl TechnicalAdjustments {
    pub const fn neutral() -> Self {
        Self {
            zoom_level: ZOOM_MIN,
            exposure_offset: 0.0,
            torch_on: false,
        }
    }

    pub fn clamped(zoom_level: f32, exposure_offset: f32, torch_on: bool) -> Self {
        let neutral = Self::neutral();
        Self {
            zoom_level: if zoom_level.is_finite() {
                zoom_level.clamp(ZOOM_MIN, ZOOM_MAX)
            } else {
                neutral.zoom_level
            },
            exposure_offset: if exposure_offset.is_finite() {
                exposure_offset.clamp(EXPOSURE_MIN, EXPOSURE_MAX)
            } else {
                neutral.exposure_offset
            },
            torch_on,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDetails {
    pub subject_position: String,
    pub background_quality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceResult {
    pub composition_score: u8,
    pub lighting: LightingLabel,
    pub suggestion: String,
    pub is_ready_to_shoot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_adjustments: Option<TechnicalAdjustments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<SceneDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ChatRole {
    User,
    Assistant,
}

impl From<String> for ChatRole {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("user") {
            ChatRole::User
        } else {
            ChatRole::Assistant
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    #[serde(rename = "content", alias = "text")]
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    StartRecording,
    StopRecording,
    CapturePhoto,
}

impl ChatAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatAction::StartRecording => "start_recording",
            ChatAction::StopRecording => "stop_recording",
            ChatAction::CapturePhoto => "capture_photo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub action: Option<ChatAction>,
}
