use crate::schema::{ChatRole, ChatTurn};

/// The last `limit` turns, oldest first.
pub fn recent_turns(history: &[ChatTurn], limit: usize) -> &[ChatTurn] {
    let start = history.len().saturating_sub(limit);
    &history[start..]
}

/// Renders the bounded suffix as `User: ...` / `<assistant_label>: ...` lines.
pub fn render_transcript(history: &[ChatTurn], limit: usize, assistant_label: &str) -> String {
    recent_turns(history, limit)
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => assistant_label,
            };
            format!("{speaker}: {}", turn.text.trim())
        })
        .collect::<Vec<String>>()
        .join("\n")
}
