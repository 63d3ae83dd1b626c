//! Coerces loosely structured model output into a [`GuidanceResult`].
//!
//! The model is asked for JSON but frequently wraps it in a markdown fence or
//! answers in prose. [`decode`] is strict and reports why a payload could not
//! be read; [`normalize`] never fails and substitutes a degraded result so the
//! live guidance loop always has something to display.

mod fence;
mod fields;

use serde_json::{Map, Value};

pub use fence::unwrap_fenced;
pub use fields::truncate_chars;

use crate::schema::{
    GuidanceResult, LightingLabel, SceneDetails, ScoreScale, TechnicalAdjustments,
    READINESS_THRESHOLD,
};

/// Length of the raw-text excerpt used as the suggestion of a degraded result.
pub const DEGRADED_SUGGESTION_CHARS: usize = 50;

/// Shape the model was asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidanceSchema {
    /// Live frame coaching: 0–100 score plus camera adjustments.
    FrameAnalysis,
    /// Proactive scene read: 1–10 score plus subject/background details.
    SceneAnalysis,
}

impl GuidanceSchema {
    pub fn scale(self) -> ScoreScale {
        match self {
            GuidanceSchema::FrameAnalysis => ScoreScale::Percent,
            GuidanceSchema::SceneAnalysis => ScoreScale::Decile,
        }
    }

    pub fn default_score(self) -> u8 {
        match self {
            GuidanceSchema::FrameAnalysis => 70,
            GuidanceSchema::SceneAnalysis => ScoreScale::Decile.to_canonical(5.0),
        }
    }

    pub fn default_lighting(self) -> LightingLabel {
        match self {
            GuidanceSchema::FrameAnalysis => LightingLabel::Unknown,
            GuidanceSchema::SceneAnalysis => LightingLabel::Fair,
        }
    }

    pub fn default_suggestion(self) -> &'static str {
        match self {
            GuidanceSchema::FrameAnalysis => "",
            GuidanceSchema::SceneAnalysis => "Keep practicing!",
        }
    }

    pub fn carries_adjustments(self) -> bool {
        self == GuidanceSchema::FrameAnalysis
    }

    pub fn carries_details(self) -> bool {
        self == GuidanceSchema::SceneAnalysis
    }

    /// A complete result holding every default, not ready to shoot.
    pub fn defaults(self) -> GuidanceResult {
        GuidanceResult {
            composition_score: self.default_score(),
            lighting: self.default_lighting(),
            suggestion: self.default_suggestion().to_string(),
            is_ready_to_shoot: false,
            technical_adjustments: self
                .carries_adjustments()
                .then(TechnicalAdjustments::neutral),
            details: self.carries_details().then(SceneDetails::default),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("model output is empty")]
    Empty,
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("model output is JSON but not an object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Parsed(GuidanceResult),
    Degraded {
        result: GuidanceResult,
        reason: ParseFailure,
    },
}

impl Normalized {
    pub fn into_result(self) -> GuidanceResult {
        match self {
            Normalized::Parsed(result) => result,
            Normalized::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Normalized::Degraded { .. })
    }
}

pub fn decode(raw: &str, schema: GuidanceSchema) -> Result<GuidanceResult, ParseFailure> {
    let content = unwrap_fenced(raw);
    if content.is_empty() {
        return Err(ParseFailure::Empty);
    }
    let value: Value = serde_json::from_str(content)
        .map_err(|err| ParseFailure::InvalidJson(err.to_string()))?;
    let Value::Object(object) = value else {
        return Err(ParseFailure::NotAnObject);
    };
    Ok(from_object(&object, schema))
}

pub fn normalize(raw: &str, schema: GuidanceSchema) -> Normalized {
    match decode(raw, schema) {
        Ok(result) => Normalized::Parsed(result),
        Err(reason) => {
            tracing::warn!(%reason, ?schema, "model output did not decode; degrading");
            Normalized::Degraded {
                result: degraded(raw, schema),
                reason,
            }
        }
    }
}

/// Schema-valid stand-in built from the first characters of the raw reply.
pub fn degraded(raw: &str, schema: GuidanceSchema) -> GuidanceResult {
    let mut result = schema.defaults();
    let excerpt = raw.trim();
    if !excerpt.is_empty() {
        result.suggestion = fields::truncate_chars(excerpt, DEGRADED_SUGGESTION_CHARS);
    }
    result.lighting = LightingLabel::Unknown;
    result.is_ready_to_shoot = false;
    result
}

fn from_object(object: &Map<String, Value>, schema: GuidanceSchema) -> GuidanceResult {
    let mut result = schema.defaults();

    let score = fields::number(
        object
            .get("composition_score")
            .or_else(|| object.get("score")),
    );
    if let Some(raw_score) = score {
        result.composition_score = schema.scale().to_canonical(raw_score);
    }
    if let Some(lighting) = fields::text(object.get("lighting")) {
        result.lighting = LightingLabel::from_free_text(&lighting);
    }
    if let Some(suggestion) = fields::text(object.get("suggestion")) {
        result.suggestion = suggestion;
    }
    result.is_ready_to_shoot = match fields::flag(object.get("is_ready_to_shoot")) {
        Some(flag) => flag,
        None => score.is_some() && result.composition_score >= READINESS_THRESHOLD,
    };

    if schema.carries_adjustments() {
        result.technical_adjustments = Some(adjustments_from(object.get("technical_adjustments")));
    }
    if schema.carries_details() {
        result.details = Some(details_from(object));
    }
    result
}

fn adjustments_from(value: Option<&Value>) -> TechnicalAdjustments {
    let Some(object) = value.and_then(Value::as_object) else {
        return TechnicalAdjustments::neutral();
    };
    let neutral = TechnicalAdjustments::neutral();
    TechnicalAdjustments::clamped(
        fields::number(object.get("zoom_level"))
            .map(|zoom| zoom as f32)
            .unwrap_or(neutral.zoom_level),
        fields::number(object.get("exposure_offset"))
            .map(|offset| offset as f32)
            .unwrap_or(neutral.exposure_offset),
        fields::flag(object.get("torch_on")).unwrap_or(neutral.torch_on),
    )
}

fn details_from(object: &Map<String, Value>) -> SceneDetails {
    let nested = object.get("details").and_then(Value::as_object);
    let read = |key: &str| {
        fields::text(nested.and_then(|details| details.get(key)))
            .or_else(|| fields::text(object.get(key)))
            .unwrap_or_default()
    };
    SceneDetails {
        subject_position: read("subject_position"),
        background_quality: read("background_quality"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOADS: &[&str] = &[
        r#"{"composition_score": 85, "is_ready_to_shoot": true}"#,
        r#"{"composition_score": 40, "suggestion": "Move closer", "lighting": "too dark"}"#,
        r#"{"composition_score": "92", "lighting": "Soft and balanced", "technical_adjustments": {"zoom_level": 1.5, "exposure_offset": -0.5, "torch_on": false}}"#,
    ];

    #[test]
    fn fenced_json_reads_with_default_fill() -> anyhow::Result<()> {
        let raw = "```json\n{\"composition_score\": 85, \"is_ready_to_shoot\": true}\n```";
        let result = decode(raw, GuidanceSchema::FrameAnalysis)?;
        assert_eq!(result.composition_score, 85);
        assert!(result.is_ready_to_shoot);
        assert_eq!(result.lighting, LightingLabel::Unknown);
        assert_eq!(result.suggestion, "");
        assert_eq!(
            result.technical_adjustments,
            Some(TechnicalAdjustments::neutral())
        );
        Ok(())
    }

    #[test]
    fn fenced_and_unwrapped_payloads_decode_identically() -> anyhow::Result<()> {
        for schema in [GuidanceSchema::FrameAnalysis, GuidanceSchema::SceneAnalysis] {
            for payload in PAYLOADS {
                let plain = decode(payload, schema)?;
                let tagged = decode(&format!("```json\n{payload}\n```"), schema)?;
                let bare = decode(&format!("```\n{payload}\n```"), schema)?;
                assert_eq!(plain, tagged);
                assert_eq!(plain, bare);
            }
        }
        Ok(())
    }

    #[test]
    fn malformed_text_degrades_instead_of_failing() {
        let inputs = [
            "",
            "   ",
            "Tilt up a little and wait for the cloud to pass over the sun, then shoot.",
            "```json\n{\"composition_score\": 85,\n```",
            "[1, 2, 3]",
            "42",
        ];
        for schema in [GuidanceSchema::FrameAnalysis, GuidanceSchema::SceneAnalysis] {
            for raw in inputs {
                let normalized = normalize(raw, schema);
                assert!(normalized.is_degraded(), "{raw:?} should degrade");
                let result = normalized.into_result();
                assert!(!result.is_ready_to_shoot);
                assert_eq!(result.composition_score, schema.default_score());
                assert_eq!(
                    result.technical_adjustments.is_some(),
                    schema.carries_adjustments()
                );
                assert_eq!(result.details.is_some(), schema.carries_details());
            }
        }
    }

    #[test]
    fn degraded_suggestion_is_a_short_excerpt() {
        let raw = "Director says: the horizon is tilted, level the phone before you shoot again.";
        let result = normalize(raw, GuidanceSchema::FrameAnalysis).into_result();
        assert_eq!(
            result.suggestion,
            format!("{}…", raw.chars().take(DEGRADED_SUGGESTION_CHARS).collect::<String>())
        );
        assert_eq!(result.lighting, LightingLabel::Unknown);
    }

    #[test]
    fn decode_reports_failure_reasons() {
        assert_eq!(
            decode("```json\n```", GuidanceSchema::FrameAnalysis),
            Err(ParseFailure::Empty)
        );
        assert_eq!(
            decode("[]", GuidanceSchema::FrameAnalysis),
            Err(ParseFailure::NotAnObject)
        );
        assert!(matches!(
            decode("not json", GuidanceSchema::FrameAnalysis),
            Err(ParseFailure::InvalidJson(_))
        ));
    }

    #[test]
    fn readiness_derives_from_score_when_flag_missing() -> anyhow::Result<()> {
        let ready = decode(r#"{"composition_score": 70}"#, GuidanceSchema::FrameAnalysis)?;
        assert!(ready.is_ready_to_shoot);
        let not_ready = decode(r#"{"composition_score": 69}"#, GuidanceSchema::FrameAnalysis)?;
        assert!(!not_ready.is_ready_to_shoot);
        let explicit = decode(
            r#"{"composition_score": 95, "is_ready_to_shoot": "no"}"#,
            GuidanceSchema::FrameAnalysis,
        )?;
        assert!(!explicit.is_ready_to_shoot);
        let no_score = decode(r#"{"suggestion": "Hold steady"}"#, GuidanceSchema::FrameAnalysis)?;
        assert_eq!(no_score.composition_score, 70);
        assert!(!no_score.is_ready_to_shoot);
        Ok(())
    }

    #[test]
    fn scene_scores_are_canonicalised_and_gated_at_seven() -> anyhow::Result<()> {
        let raw = r#"```json
{
  "composition_score": 7,
  "lighting": "Good",
  "suggestion": "Move slightly left to align with the rule of thirds",
  "subject_position": "Well-centered",
  "background_quality": "Clean and uncluttered"
}
```"#;
        let result = decode(raw, GuidanceSchema::SceneAnalysis)?;
        assert_eq!(result.composition_score, 70);
        assert!(result.is_ready_to_shoot);
        assert_eq!(result.lighting, LightingLabel::Good);
        assert_eq!(result.technical_adjustments, None);
        assert_eq!(
            result.details,
            Some(SceneDetails {
                subject_position: "Well-centered".to_string(),
                background_quality: "Clean and uncluttered".to_string(),
            })
        );

        let six = decode(r#"{"composition_score": 6}"#, GuidanceSchema::SceneAnalysis)?;
        assert_eq!(six.composition_score, 60);
        assert!(!six.is_ready_to_shoot);
        Ok(())
    }

    #[test]
    fn scene_defaults_fill_missing_fields() -> anyhow::Result<()> {
        let result = decode(
            r#"{"details": {"subject_position": "Off-center"}}"#,
            GuidanceSchema::SceneAnalysis,
        )?;
        assert_eq!(result.composition_score, 50);
        assert_eq!(result.lighting, LightingLabel::Fair);
        assert_eq!(result.suggestion, "Keep practicing!");
        assert_eq!(
            result.details.map(|details| details.subject_position),
            Some("Off-center".to_string())
        );
        Ok(())
    }

    #[test]
    fn adjustments_are_read_leniently_and_clamped() -> anyhow::Result<()> {
        let result = decode(
            r#"{"technical_adjustments": {"zoom_level": "7.5", "exposure_offset": -3, "torch_on": "yes"}}"#,
            GuidanceSchema::FrameAnalysis,
        )?;
        assert_eq!(
            result.technical_adjustments,
            Some(TechnicalAdjustments::clamped(5.0, -2.0, true))
        );

        let partial = decode(
            r#"{"technical_adjustments": {"exposure_offset": 0.7}}"#,
            GuidanceSchema::FrameAnalysis,
        )?;
        assert_eq!(
            partial.technical_adjustments,
            Some(TechnicalAdjustments::clamped(1.0, 0.7, false))
        );
        Ok(())
    }
}
