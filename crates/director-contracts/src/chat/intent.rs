use super::keywords::{ACTION_RULES, CAPTURE_SENTINEL};
use crate::schema::ChatAction;

/// Keyword heuristic over the model's reply. Plain substring matching, so
/// "actionable" reads as a start cue; callers treat the result as a hint.
pub fn detect_action(text: &str) -> Option<ChatAction> {
    let lowered = text.to_lowercase();
    ACTION_RULES
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .map(|rule| rule.action)
}

pub fn strip_sentinel(text: &str) -> String {
    let mut cleaned = text.replace(CAPTURE_SENTINEL, "");
    while cleaned.contains("  ") {
        cleaned = cleaned.replace("  ", " ");
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{detect_action, strip_sentinel};
    use crate::schema::ChatAction;

    #[test]
    fn detects_recording_start() {
        assert_eq!(
            detect_action("Action! Slow dolly in on the chef."),
            Some(ChatAction::StartRecording)
        );
        assert_eq!(
            detect_action("Let's start rolling"),
            Some(ChatAction::StartRecording)
        );
    }

    #[test]
    fn stop_wins_over_capture() {
        assert_eq!(
            detect_action("Cut there, then capture a still of the plate."),
            Some(ChatAction::StopRecording)
        );
    }

    #[test]
    fn detects_capture_cues() {
        assert_eq!(
            detect_action("Perfect light. CAPTURE"),
            Some(ChatAction::CapturePhoto)
        );
        assert_eq!(
            detect_action("Go ahead and take a photo now"),
            Some(ChatAction::CapturePhoto)
        );
    }

    #[test]
    fn no_keywords_means_no_action() {
        assert_eq!(detect_action("Tilt the camera up slightly."), None);
        assert_eq!(detect_action(""), None);
    }

    #[test]
    fn sentinel_is_removed_from_visible_text() {
        assert_eq!(
            strip_sentinel("Great smile, CAPTURE now!"),
            "Great smile, now!"
        );
        assert_eq!(strip_sentinel("  CAPTURE  "), "");
        assert_eq!(
            strip_sentinel("capture the moment"),
            "capture the moment"
        );
    }
}
