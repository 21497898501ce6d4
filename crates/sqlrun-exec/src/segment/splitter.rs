//! The segmentation algorithm

use std::sync::LazyLock;

use regex::Regex;
use sqlrun_core::Unit;

// Non-greedy so adjacent comments stay separate; (?s) so a comment can
// span lines.
static BLOCK_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

// A candidate containing any of these anywhere runs as a single block.
// CREATE may carry OR REPLACE, and whitespace between keywords can
// include newlines.
static PROCEDURAL_OPENER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:BEGIN|DECLARE|CREATE\s+(?:OR\s+REPLACE\s+)?(?:PROCEDURE|FUNCTION|TRIGGER|PACKAGE|TYPE))\b",
    )
    .expect("valid regex")
});

/// Marker that starts a line comment.
const LINE_COMMENT_MARKER: &str = "--";

/// Split raw script text into executable units.
///
/// Total and deterministic: malformed input degrades to odd-looking
/// units rather than an error. Ordinals are 1-based in emission order.
pub fn segment(raw_text: &str) -> Vec<Unit> {
    let normalized = normalize_line_endings(raw_text);
    let without_block_comments = strip_block_comments(&normalized);
    let without_comments = strip_line_comments(&without_block_comments);

    let mut units = Vec::new();
    let mut ordinal = 0u32;

    for candidate in split_on_terminator_lines(&without_comments) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }

        if PROCEDURAL_OPENER_REGEX.is_match(candidate) {
            ordinal += 1;
            units.push(Unit::procedural_block(ordinal, candidate));
        } else {
            for piece in candidate.split(';') {
                let piece = piece.trim();
                if piece.is_empty() {
                    continue;
                }
                ordinal += 1;
                units.push(Unit::statement(ordinal, piece));
            }
        }
    }

    units
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace each `/* ... */` with a single space so tokens on either side
/// stay separated.
fn strip_block_comments(text: &str) -> String {
    BLOCK_COMMENT_REGEX.replace_all(text, " ").into_owned()
}

/// Cut each line at the first `--`.
///
/// Position-based on purpose: a marker inside a string literal truncates
/// the line. Scripts in the wild rely on the behavior being stable, so it
/// stays (see the pinning test).
fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        match line.find(LINE_COMMENT_MARKER) {
            Some(position) => out.push_str(&line[..position]),
            None => out.push_str(line),
        }
    }
    out
}

/// Split on lines holding nothing but a `/`, whitespace allowed around
/// it. The terminator lines themselves are consumed.
fn split_on_terminator_lines(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim() == "/" {
            candidates.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }

    candidates.push(current.join("\n"));
    candidates
}
