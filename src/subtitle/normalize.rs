//! Caption markup to plain text
//!
//! ASS/SSA dialogue text carries inline override tags such as
//! `{\pos(100,200)}` or `{\i1}` and two escape codes: `\N` (forced line
//! break) and `\h` (hard space). The script editor shows the text without
//! any of that, so tags are dropped, escapes are substituted, and the
//! remaining pieces are glued back together with a space where a tag sat
//! between two words.

/// Characters that never get a space inserted in front of them.
const NO_SPACE_BEFORE: [char; 8] = [',', '.', ':', '!', '?', ')', '}', ']'];

/// Convert caption markup into plain text.
///
/// Never fails. A `{` without a matching `}` is not a tag group and is
/// kept as a literal character.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Escapes first, so any escape inside a tag group leaves with the group.
    let text = regex!(r"\\[Nn]").replace_all(text, "\n");
    let text = regex!(r"\\[Hh]").replace_all(&text, " ");

    let mut out = String::with_capacity(text.len());
    for segment in regex!(r"\{[^}]*\}").split(&text) {
        if segment.is_empty() {
            continue;
        }
        if needs_space(&out, segment) {
            out.push(' ');
        }
        out.push_str(segment);
    }
    out
}

/// Like [`normalize`], for callers that may not have any text at all.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn needs_space(out: &str, next: &str) -> bool {
    let Some(last) = out.chars().last() else {
        return false;
    };
    let Some(first) = next.chars().next() else {
        return false;
    };
    !last.is_whitespace() && !first.is_whitespace() && !NO_SPACE_BEFORE.contains(&first)
}
