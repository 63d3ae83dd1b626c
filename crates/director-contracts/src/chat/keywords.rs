use crate::schema::ChatAction;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ActionRule {
    pub action: ChatAction,
    pub keywords: &'static [&'static str],
}

/// Evaluated top to bottom; the first rule with a hit wins. Recording
/// controls sit above capture because "cut" and "capture" can co-occur.
pub(crate) const ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        action: ChatAction::StartRecording,
        keywords: &["start_recording", "action", "start"],
    },
    ActionRule {
        action: ChatAction::StopRecording,
        keywords: &["stop_recording", "cut", "stop"],
    },
    ActionRule {
        action: ChatAction::CapturePhoto,
        keywords: &["capture_photo", "capture", "take a photo"],
    },
];

/// Token the photography coach is told to emit when the moment is right.
pub const CAPTURE_SENTINEL: &str = "CAPTURE";
