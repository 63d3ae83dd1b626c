mod history;
mod intent;
mod keywords;

pub use history::{recent_turns, render_transcript};
pub use intent::{detect_action, strip_sentinel};
pub use keywords::CAPTURE_SENTINEL;
