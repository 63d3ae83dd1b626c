//! Canned results served when the model cannot be reached.

use director_contracts::normalize::GuidanceSchema;
use director_contracts::{
    truncate_chars, GuidanceResult, LightingLabel, SceneDetails, TechnicalAdjustments,
};

use crate::router::Capability;

pub const MOCK_FRAME_SUGGESTION: &str = "[MOCK] Gemini client not initialized. Check API Key.";
const ISSUE_DETAIL_CHARS: usize = 40;

/// Result for a frame analysis when no API key is configured.
pub fn mock_frame_analysis() -> GuidanceResult {
    GuidanceResult {
        composition_score: 70,
        lighting: LightingLabel::Unknown,
        suggestion: MOCK_FRAME_SUGGESTION.to_string(),
        is_ready_to_shoot: false,
        technical_adjustments: Some(TechnicalAdjustments::neutral()),
        details: None,
    }
}

/// Result for a frame analysis whose upstream call failed.
pub fn technical_issue(detail: &str) -> GuidanceResult {
    GuidanceResult {
        composition_score: 0,
        lighting: LightingLabel::Error,
        suggestion: format!("Technical issue: {}", truncate_chars(detail, ISSUE_DETAIL_CHARS)),
        is_ready_to_shoot: false,
        technical_adjustments: Some(TechnicalAdjustments::neutral()),
        details: None,
    }
}

struct SceneMock {
    score: u8,
    lighting: LightingLabel,
    suggestion: &'static str,
    subject_position: &'static str,
    background_quality: &'static str,
}

const SCENE_MOCKS: [SceneMock; 4] = [
    SceneMock {
        score: 8,
        lighting: LightingLabel::Good,
        suggestion: "Subject is well placed. Try a slight head tilt for a more dynamic look.",
        subject_position: "Centered, following the rule of thirds",
        background_quality: "Clean with good depth of field",
    },
    SceneMock {
        score: 6,
        lighting: LightingLabel::Fair,
        suggestion: "Move closer to the window for better natural light.",
        subject_position: "Slightly off-center",
        background_quality: "Cluttered, consider changing the angle",
    },
    SceneMock {
        score: 9,
        lighting: LightingLabel::Excellent,
        suggestion: "Lighting and composition look great. Ready to shoot.",
        subject_position: "Strong placement with natural framing",
        background_quality: "Professional quality",
    },
    SceneMock {
        score: 5,
        lighting: LightingLabel::Poor,
        suggestion: "Light is too harsh. Move into shade or change the camera position.",
        subject_position: "Acceptable but could be improved",
        background_quality: "Backlit, causing a silhouette",
    },
];

pub const SCENE_MOCK_COUNT: usize = SCENE_MOCKS.len();

/// One of the documented scene results, chosen by `seed`.
pub fn mock_scene(seed: &[u8]) -> GuidanceResult {
    let index = seed.first().copied().map(usize::from).unwrap_or(0) % SCENE_MOCKS.len();
    let mock = &SCENE_MOCKS[index];
    let composition_score = GuidanceSchema::SceneAnalysis
        .scale()
        .to_canonical(f64::from(mock.score));
    GuidanceResult {
        composition_score,
        lighting: mock.lighting,
        suggestion: mock.suggestion.to_string(),
        is_ready_to_shoot: composition_score >= director_contracts::schema::READINESS_THRESHOLD,
        technical_adjustments: None,
        details: Some(SceneDetails {
            subject_position: mock.subject_position.to_string(),
            background_quality: mock.background_quality.to_string(),
        }),
    }
}

pub fn chat_greeting(capability: Capability) -> &'static str {
    match capability {
        Capability::Videographer => {
            "Action! I'm your video director. What kind of scene are we shooting?"
        }
        _ => "Hi! I'm your photo director, ready to help you take great shots. What are we shooting today?",
    }
}

pub fn chat_busy(capability: Capability, detail: &str) -> String {
    let detail = truncate_chars(detail, ISSUE_DETAIL_CHARS);
    match capability {
        Capability::Videographer => format!("Cut! The director is busy: {detail}. Let's go again!"),
        _ => format!("The director is busy: {detail}. Let's try again!"),
    }
}
