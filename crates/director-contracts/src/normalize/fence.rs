const FENCE: &str = "```";

/// Extracts the payload of a markdown code fence.
///
/// Grammar: `[prefix] FENCE [tag] NEWLINE content [FENCE [suffix]]`. The tag is
/// optional and may also be followed by the content on the same line. When
/// the closing fence is missing the content runs to the end of the text.
/// Text without a fence is returned as-is. The result is always trimmed.
pub fn unwrap_fenced(text: &str) -> &str {
    let Some(open) = text.find(FENCE) else {
        return text.trim();
    };
    let body = skip_language_tag(&text[open + FENCE.len()..]);
    let content = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    content.trim()
}

fn is_language_tag(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-'))
}

fn skip_language_tag(after_open: &str) -> &str {
    let (first_line, rest) = match after_open.split_once('\n') {
        Some((line, rest)) => (line, Some(rest)),
        None => (after_open, None),
    };

    if is_language_tag(first_line.trim()) {
        return rest.unwrap_or("");
    }

    // ```json {"a": 1}```
    let leading = first_line.trim_start();
    if let Some((word, remainder)) = leading.split_once(char::is_whitespace) {
        let remainder = remainder.trim_start();
        if is_language_tag(word) && (remainder.starts_with('{') || remainder.starts_with('[')) {
            let offset = after_open.len() - after_open.trim_start().len();
            return &after_open[offset + word.len()..];
        }
    }
    after_open
}
