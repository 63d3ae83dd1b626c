//! Instruction templates. Wording is not a contract; the JSON keys are.

use director_contracts::Mode;

use crate::router::TemplateKind;

/// Effect name that disables effects entirely.
pub const NO_FX: &str = "no fx";

const OVERLAY_SUFFIX: &str = " isolated on transparent background, high quality overlay, cinematic.";

/// Named overlay presets for video effects. `no fx` maps to nothing.
pub const VIDEO_EFFECT_PRESETS: &[(&str, Option<&str>)] = &[
    (NO_FX, None),
    (
        "steam_loop",
        Some("Dynamic looping steam and heat haze layers for advertising."),
    ),
    (
        "particle_slowmo",
        Some("Slow-motion cinematic particles and drifting dust motes."),
    ),
    (
        "lighting_transition",
        Some("Dynamic lighting changes sweeping into a golden hour glow."),
    ),
];

pub fn is_no_fx(effect: &str) -> bool {
    effect.trim().eq_ignore_ascii_case(NO_FX)
}

/// Preset description for a known effect name, the raw text otherwise.
/// `None` means the effect is switched off.
pub fn video_effect_description(effect: &str) -> Option<String> {
    let key = effect.trim().to_lowercase();
    match VIDEO_EFFECT_PRESETS.iter().find(|(name, _)| *name == key) {
        Some((_, description)) => description.map(str::to_string),
        None if key.is_empty() => None,
        None => Some(effect.trim().to_string()),
    }
}

pub fn overlay_prompt(description: &str) -> String {
    format!("{}{OVERLAY_SUFFIX}", description.trim_end_matches('.'))
}

pub fn frame_analysis(context_label: &str, mode: Mode) -> String {
    let direction = match mode {
        Mode::Photography => {
            "Judge the frame as a still photograph: framing, subject placement, focus and light."
        }
        Mode::Videography => {
            "Judge the frame as a moving shot: stable horizon, headroom for motion and consistent exposure."
        }
    };
    let product_notes = if context_label.to_lowercase().contains("product") {
        "\nFor product work also check that the product is centred, free of glare and deep \
         shadow, on a clean background, with branding sharp and visible.\n"
    } else {
        ""
    };
    format!(
        r#"You are a live camera director coaching someone who is shooting: '{context_label}'.
{direction}{product_notes}
Look at this frame from the live feed and answer with ONLY a JSON object:
{{
  "composition_score": <integer 0-100>,
  "suggestion": "<short spoken instruction, at most 10 words, e.g. 'Tilt up slightly'>",
  "lighting": "<one of Poor, Fair, Good, Excellent>",
  "is_ready_to_shoot": <true|false>,
  "technical_adjustments": {{
    "zoom_level": <float 1.0-5.0, 1.0 is default>,
    "exposure_offset": <float -2.0-2.0, 0.0 is default>,
    "torch_on": <true if extra light is needed>
  }}
}}
If the shot is perfect, the suggestion is "Perfect, capture now!"."#
    )
}

pub fn scene_analysis(context_label: &str) -> String {
    format!(
        r#"Review this frame for {context_label} photography.
Answer with ONLY a JSON object:
{{
  "composition_score": <integer 1-10>,
  "lighting": "<one of Poor, Fair, Good, Excellent>",
  "suggestion": "<one specific, actionable tip, at most 50 words>",
  "subject_position": "<brief note on where the subject sits>",
  "background_quality": "<brief note on the background>"
}}"#
    )
}

/// Speaker label used for assistant turns in a rendered transcript.
pub fn assistant_label(template: TemplateKind) -> &'static str {
    match template {
        TemplateKind::VideographyChat => "Director",
        _ => "Coach",
    }
}

pub fn chat(template: TemplateKind, context_label: &str, transcript: &str, message: &str) -> String {
    let persona = match template {
        TemplateKind::VideographyChat => format!(
            "You are a film director and cinematographer guiding a shoot for: {context_label}.\n\
             Talk about camera movement, shot composition, lighting and pacing.\n\
             When the user says \"Action\" or \"Start\", say action and start the take; \
             when they say \"Cut\" or \"Stop\", say cut.\n\
             Keep replies short and punchy, like a director on set."
        ),
        _ => format!(
            "You are a friendly photography coach helping with: {context_label}.\n\
             Give specific, actionable advice on posing, framing and light.\n\
             Keep replies to two or three sentences. When it is the right moment to take \
             the picture, include the word CAPTURE in your reply."
        ),
    };
    let history = if transcript.is_empty() {
        String::new()
    } else {
        format!("\n\nConversation so far:\n{transcript}")
    };
    format!("{persona}{history}\n\nUser: {message}\n{}:", assistant_label(template))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_and_unknown_names_pass_through() {
        assert_eq!(video_effect_description("No FX"), None);
        assert!(video_effect_description("steam_loop").is_some_and(|d| d.contains("steam")));
        assert_eq!(
            video_effect_description(" falling snow "),
            Some("falling snow".to_string())
        );
        assert_eq!(video_effect_description(""), None);
    }

    #[test]
    fn overlay_prompt_carries_transparency_hint() {
        let prompt = overlay_prompt("Heat haze.");
        assert!(prompt.starts_with("Heat haze isolated on transparent background"));
    }

    #[test]
    fn chat_prompt_includes_history_and_message() {
        let prompt = chat(
            TemplateKind::VideographyChat,
            "Food Commercial",
            "User: ready?",
            "Action",
        );
        assert!(prompt.contains("Food Commercial"));
        assert!(prompt.contains("Conversation so far:\nUser: ready?"));
        assert!(prompt.ends_with("User: Action\nDirector:"));
    }

    #[test]
    fn product_context_adds_product_checks() {
        assert!(frame_analysis("Product Photography", Mode::Photography).contains("branding"));
        assert!(!frame_analysis("Portrait", Mode::Photography).contains("branding"));
    }
}
