use crate::{statics::*, types::LineKind};
use encoding_rs::{UTF_8, WINDOWS_1251};
use std::borrow::Cow;

pub fn is_engine_command(text: &str) -> bool {
    let trimmed: &str = text.trim();
    trimmed.len() >= 2 * COMMAND_DELIMITER.len()
        && trimmed.starts_with(COMMAND_DELIMITER)
        && trimmed.ends_with(COMMAND_DELIMITER)
}

/// Variable assignments, counters and routing expressions.
pub fn is_game_logic(text: &str) -> bool {
    let trimmed: &str = text.trim();

    BRACED_ASSIGNMENT_RE.is_match(trimmed)
        || BARE_ASSIGNMENT_RE.is_match(trimmed)
        || INCREMENT_RE.is_match(trimmed)
        || (trimmed.contains('?') && trimmed.contains(";;") && !trimmed.starts_with(CHOICE_MARKER))
        || trimmed.starts_with("??")
        || REDIRECT_RE.is_match(trimmed)
}

pub fn is_choice(text: &str) -> bool {
    text.trim_start().starts_with(CHOICE_MARKER)
}

/// Categorizes a raw line. Anything unrecognized is content.
pub fn classify(text: &str) -> LineKind {
    if is_engine_command(text) {
        LineKind::Command
    } else if is_choice(text) {
        LineKind::Choice
    } else if is_game_logic(text) {
        LineKind::Logic
    } else {
        LineKind::Content
    }
}

fn normalize_once(text: &str) -> String {
    let trimmed: &str = text.trim();

    match classify(trimmed) {
        LineKind::Command => trimmed.to_lowercase(),
        LineKind::Logic => trimmed.to_string(),
        LineKind::Choice | LineKind::Content => {
            let without_speaker: Cow<str> = SPEAKER_PREFIX_RE.replace(trimmed, "");
            let unquoted: String = without_speaker
                .chars()
                .filter(|char: &char| !QUOTE_CHARS.contains(char))
                .collect();

            WHITESPACE_RE.replace_all(&unquoted, " ").trim().to_lowercase()
        }
    }
}

/// Comparison key deciding whether two lines are the same logical entry.
///
/// Commands compare case-insensitively, logic literally. Content loses its
/// speaker prefix and quote marks, has whitespace collapsed and is lower-cased.
/// Stripping can expose a new speaker prefix (`"АЛЬФ: да"`), so the key is
/// iterated to a fixed point, which makes `normalize` idempotent.
pub fn normalize(text: &str) -> String {
    let mut key: String = normalize_once(text);

    loop {
        let next: String = normalize_once(&key);

        if next == key {
            return key;
        }

        key = next;
    }
}

/// Speaker name of a `NAME : "text"` dialogue line.
pub fn extract_speaker(text: &str) -> Option<&str> {
    QUOTED_SPEAKER_RE
        .captures(text.trim())
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().trim())
}

/// Display text of a `*[:emote:] text -> target` choice line, emote excluded.
pub fn choice_display(line: &str) -> &str {
    let after_marker: &str = line.trim().trim_start_matches(CHOICE_MARKER).trim();
    let text: &str = match after_marker.find("->") {
        Some(arrow) => after_marker[..arrow].trim(),
        None => after_marker,
    };

    match LEADING_EMOTE_RE.find(text) {
        Some(emote) => text[emote.end()..].trim(),
        None => text,
    }
}

pub fn choice_emote(line: &str) -> Option<&str> {
    let after_marker: &str = line.trim().trim_start_matches(CHOICE_MARKER).trim();

    LEADING_EMOTE_RE
        .captures(after_marker)
        .and_then(|captures| captures.get(1))
        .map(|tag| tag.as_str())
}

pub fn choice_target(line: &str) -> Option<&str> {
    CHOICE_TARGET_RE
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|target| target.as_str())
}

/// Strips a leading emote and one pair of surrounding quotes or parentheses;
/// used to compare echo lines with the choices that lead to them.
pub fn echo_key(text: &str) -> String {
    let trimmed: &str = text.trim();
    let without_emote: &str = match LEADING_EMOTE_RE.find(trimmed) {
        Some(emote) => trimmed[emote.end()..].trim(),
        None => trimmed,
    };

    without_emote
        .trim_start_matches(['"', '\u{201C}', '\u{00AB}', '('])
        .trim_end_matches(['"', '\u{201D}', '\u{00BB}', ')'])
        .trim()
        .to_string()
}

pub fn is_garbage_line(text: &str) -> bool {
    let trimmed: &str = text.trim();

    trimmed.is_empty()
        || trimmed.chars().all(|char: char| char.is_ascii_digit())
        || (trimmed.chars().count() <= 2 && !trimmed.starts_with('$'))
}

/// More than ten Latin letters and no Cyrillic at all.
pub fn has_substantial_english(text: &str) -> bool {
    let trimmed: &str = text.trim();

    if !classify(trimmed).is_content() {
        return false;
    }

    if LEADING_EMOTE_RE.find(trimmed).is_some_and(|emote| emote.end() == trimmed.len()) {
        return false;
    }

    // Bare passage names such as `customer-intro`.
    if trimmed.len() > 5
        && trimmed
            .chars()
            .all(|char: char| char.is_alphanumeric() || char == '_' || char == '-')
    {
        return false;
    }

    let latin: usize = trimmed.chars().filter(|char: &char| char.is_ascii_alphabetic()).count();
    let cyrillic: bool = CYRILLIC_RE.is_match(trimmed);

    latin > 10 && !cyrillic
}

/// Similarity ratio in `[0, 1]`: `2 * LCS / (len(a) + len(b))` over chars,
/// i.e. one minus the normalized insert/delete edit distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total: usize = a.len() + b.len();

    if total == 0 {
        return 1.0;
    }

    let mut previous: Vec<usize> = vec![0; b.len() + 1];
    let mut current: Vec<usize> = vec![0; b.len() + 1];

    for &a_char in &a {
        for (j, &b_char) in b.iter().enumerate() {
            current[j + 1] = if a_char == b_char {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }

        std::mem::swap(&mut previous, &mut current);
    }

    (2 * previous[b.len()]) as f64 / total as f64
}

/// `054_ludivine_01` -> `054_ludivine`; ids with a letter suffix stay as they are.
pub fn obj_id_to_prefix(obj_id: &str) -> &str {
    OBJ_SUFFIX_RE
        .captures(obj_id)
        .and_then(|captures| captures.get(1))
        .map_or(obj_id, |prefix| prefix.as_str())
}

/// Decodes file bytes as UTF-8 (BOM stripped), falling back to windows-1251.
/// The fallback assigns a character to every byte, so decoding never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes: &[u8] = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return text.into_owned();
    }

    tracing::debug!(encoding = WINDOWS_1251.name(), "decoded with fallback encoding");
    WINDOWS_1251.decode_without_bom_handling(bytes).0.into_owned()
}

/// Cuts `text` to at most `limit` chars for one-line report output.
pub fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_structural_lines() {
        assert_eq!(classify("$$ anim: IDLE_DRIVER $$"), LineKind::Command);
        assert_eq!(classify("  $$ reveal: clue-3 $$  "), LineKind::Command);
        assert_eq!(classify("$$"), LineKind::Content);
        assert_eq!(classify("*\"Hello.\" -> customer-hello"), LineKind::Choice);
        assert_eq!(classify("_Driver.Met.Ludwig=1"), LineKind::Logic);
        assert_eq!(classify("{ _Driver.Met.X = 1 }"), LineKind::Logic);
        assert_eq!(classify("interruptions+=1"), LineKind::Logic);
        assert_eq!(classify("_Driver.Is.Sandman=1?passage-a;;passage-b"), LineKind::Logic);
        assert_eq!(classify("??option1|option2"), LineKind::Logic);
        assert_eq!(classify("-> next-passage"), LineKind::Logic);
        assert_eq!(classify("ALPH : \"Hello there.\""), LineKind::Content);
        assert_eq!(classify("Is it far? Not really;; he says"), LineKind::Logic);
        assert_eq!(classify("The rain keeps falling."), LineKind::Content);
    }

    #[test]
    fn normalization_ignores_speaker_quotes_and_case() {
        assert_eq!(normalize("ALPH : \"Hello   there.\""), "hello there.");
        assert_eq!(normalize("«Hello there.»"), "hello there.");
        assert_eq!(normalize("“Hello there.”"), "hello there.");
        assert_eq!(normalize("$$ Anim: X $$"), "$$ anim: x $$");
        assert_eq!(normalize(" _Var.X=1 "), "_Var.X=1");
    }

    #[test]
    fn normalization_is_idempotent() {
        for line in [
            "ALPH : \"Hello   there.\"",
            "\"АЛЬФ: да\"",
            "А\tБ: x",
            "ALPH: Б: x",
            "\"$$ hidden $$\"",
            "'a=1'",
            "$$ anim: X $$",
            "",
        ] {
            let once: String = normalize(line);
            assert_eq!(normalize(&once), once, "not idempotent for {line:?}");
        }
    }

    #[test]
    fn parses_choice_parts() {
        let line: &str = "*:silence: \"Keep driving.\" -> customer-silence";

        assert_eq!(choice_display(line), "\"Keep driving.\"");
        assert_eq!(choice_emote(line), Some("silence"));
        assert_eq!(choice_target(line), Some("customer-silence"));
        assert_eq!(choice_target("*\"No target\""), None);
    }

    #[test]
    fn extracts_quoted_speakers_only() {
        assert_eq!(extract_speaker("ЛЮДВИГ : «Добрый вечер.»"), Some("ЛЮДВИГ"));
        assert_eq!(extract_speaker("PATRICIA: \"Evening.\""), Some("PATRICIA"));
        assert_eq!(extract_speaker("Narration: without quotes"), None);
    }

    #[test]
    fn detects_untranslated_english() {
        assert!(has_substantial_english("\"I never take this road at night.\""));
        assert!(!has_substantial_english("\"Я никогда не езжу ночью, ok?\""));
        assert!(!has_substantial_english("$$ anim: SOMETHING_VERY_LONG $$"));
        assert!(!has_substantial_english("customer-introduction"));
    }

    #[test]
    fn similarity_ratio_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("abcd", "abce") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn strips_numeric_object_suffix() {
        assert_eq!(obj_id_to_prefix("054_ludivine_01"), "054_ludivine");
        assert_eq!(obj_id_to_prefix("009_ludwig_00a"), "009_ludwig_00a");
        assert_eq!(obj_id_to_prefix("100_cop_1"), "100_cop");
    }

    #[test]
    fn decodes_with_fallback() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello"), "hello");
        // "Да" in windows-1251
        assert_eq!(decode_text(&[0xC4, 0xE0]), "Да");
        // 0x98 has no windows-1251 letter but still decodes
        assert_eq!(decode_text(&[0xC4, 0x98, 0xFF]).chars().count(), 3);
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("привет", 3), "при");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
