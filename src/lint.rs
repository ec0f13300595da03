//! Checks that need no reference: file format, choice line bugs and
//! near-duplicate lines left behind by edits.

use crate::{
    config::Config,
    functions::*,
    statics::*,
    types::*,
};
use std::str::from_utf8;

fn finding(file: &str, passage: &str, line: usize, rule: &'static str, severity: Severity, detail: String) -> Finding {
    Finding {
        file: file.to_string(),
        passage: passage.to_string(),
        line,
        rule,
        severity,
        detail,
    }
}

/// Format checks over raw file bytes.
/// # Parameters
/// * `file_name` - name used in findings
/// * `bytes` - file content as read from disk
/// * `config` - supplies the valid emote tags
/// * `strict` - also warn about unknown emotes and unquoted speaker lines
pub fn validate_bytes(file_name: &str, bytes: &[u8], config: &Config, strict: bool) -> Vec<Finding> {
    let mut findings: Vec<Finding> = Vec::new();

    if from_utf8(bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)).is_err() {
        findings.push(finding(
            file_name,
            "",
            0,
            "NOT_UTF8",
            Severity::Error,
            String::from("file is not valid UTF-8, read as windows-1251"),
        ));
    }

    let text: String = decode_text(bytes);

    let mut passage: &str = "";

    for (i, line) in text.lines().enumerate() {
        let line_number: usize = i + 1;

        if let Some(name) = line.strip_prefix(PASSAGE_HEADER) {
            passage = name.trim();

            if CYRILLIC_RE.is_match(passage) {
                findings.push(finding(
                    file_name,
                    passage,
                    line_number,
                    "CYRILLIC_HEADER",
                    Severity::Error,
                    format!("Cyrillic in passage header: {}", truncate(line, 80)),
                ));
            }
        }

        if line.contains('\0') {
            findings.push(finding(
                file_name,
                passage,
                line_number,
                "NULL_BYTES",
                Severity::Error,
                String::from("line contains null bytes"),
            ));
        }

        if DASH_CHOICE_RE.is_match(line) {
            findings.push(finding(
                file_name,
                passage,
                line_number,
                "DASH_CHOICE",
                Severity::Error,
                format!("dash-led choice, use *\"text\": {}", truncate(line, 80)),
            ));
        }

        if let Some(tag) = CHOICE_EMOTE_TAG_RE.captures(line).and_then(|captures| captures.get(1)) {
            let tag: &str = tag.as_str();

            if CYRILLIC_RE.is_match(tag) {
                findings.push(finding(
                    file_name,
                    passage,
                    line_number,
                    "TRANSLATED_EMOTE",
                    Severity::Error,
                    format!("translated emote :{tag}:, emote tags stay in English"),
                ));
            } else if strict && !config.is_valid_emote(tag) {
                findings.push(finding(
                    file_name,
                    passage,
                    line_number,
                    "UNKNOWN_EMOTE",
                    Severity::Warn,
                    format!("unknown emote tag :{tag}:"),
                ));
            }
        }

        if strict {
            if let Some(captures) = CYRILLIC_SPEAKER_RE.captures(line) {
                let speech: &str = captures.get(2).map_or("", |speech| speech.as_str().trim());

                if !speech.is_empty()
                    && !speech.starts_with(['"', '\'', '\u{00AB}', '\u{201C}'])
                    && !speech.starts_with(COMMAND_DELIMITER)
                {
                    let name: &str = captures.get(1).map_or("", |name| name.as_str().trim());

                    findings.push(finding(
                        file_name,
                        passage,
                        line_number,
                        "UNQUOTED_SPEAKER",
                        Severity::Warn,
                        format!("speaker without quotes ({name}): {}", truncate(line, 80)),
                    ));
                }
            }
        }
    }

    findings
}

/// Choice display text with valid `:emote:` tags removed.
fn choice_words(line: &str, config: &Config) -> String {
    let text: &str = line.trim().trim_start_matches(CHOICE_MARKER);
    let text: &str = text.split("->").next().unwrap_or(text);
    let mut cleaned: String = text.to_string();

    for emote in &config.emotes {
        cleaned = cleaned.replace(&format!(":{emote}:"), "");
    }

    cleaned
}

/// Scans choice lines for quoting bugs, leftover English and echo lines that
/// repeat only one of the choices leading to their passage.
pub fn scan_file(file: &TargetFile, config: &Config) -> Vec<Finding> {
    let mut findings: Vec<Finding> = Vec::new();
    let mut incoming: Xxh3IndexMap<&str, Vec<&TargetLine>> = Xxh3IndexMap::default();

    for passage in file.passages.values() {
        for choice in &passage.choices {
            let line_number: usize = choice.index + 1;
            let after_marker: &str = choice.text.trim_start_matches(CHOICE_MARKER).trim();
            let unemoted: &str = match LEADING_EMOTE_RE.find(after_marker) {
                Some(emote) => &after_marker[emote.end()..],
                None => after_marker,
            };

            if unemoted.starts_with('\'') && unemoted[1..].contains('\'') {
                findings.push(finding(
                    &file.file_name,
                    &passage.name,
                    line_number,
                    "SINGLE_QUOTE_CHOICE",
                    Severity::Warn,
                    choice.text.clone(),
                ));
            }

            let cleaned: String = choice_words(&choice.text, config);
            let words: Vec<&str> = ENGLISH_WORD_RE
                .find_iter(&cleaned)
                .map(|word| word.as_str())
                .filter(|word: &&str| !config.is_valid_emote(word))
                .collect();

            if !words.is_empty() {
                findings.push(finding(
                    &file.file_name,
                    &passage.name,
                    line_number,
                    "ENGLISH_IN_CHOICE",
                    Severity::Warn,
                    format!("{} (words: {})", choice.text, words.join(", ")),
                ));
            }

            if PERIOD_OUTSIDE_QUOTES_RE.is_match(&choice.text) {
                findings.push(finding(
                    &file.file_name,
                    &passage.name,
                    line_number,
                    "PERIOD_OUTSIDE_QUOTES",
                    Severity::Warn,
                    choice.text.clone(),
                ));
            }

            if let Some(target) = choice_target(&choice.text) {
                incoming.entry(target).or_default().push(choice);
            }
        }
    }

    for passage in file.passages.values() {
        let Some(choices) = incoming.get(passage.name.as_str()).filter(|choices| choices.len() >= 2) else {
            continue;
        };

        let Some(first) = passage
            .lines
            .iter()
            .find(|line: &&TargetLine| !is_engine_command(&line.text))
        else {
            continue;
        };

        let unemoted: &str = match LEADING_EMOTE_RE.find(&first.text) {
            Some(emote) => &first.text[emote.end()..],
            None => first.text.as_str(),
        };

        if !unemoted.starts_with(['"', '\u{201C}', '(']) || first.text.contains(" : ") {
            continue;
        }

        let echo: String = echo_key(&first.text);

        if echo.is_empty() {
            continue;
        }

        let matching: usize = choices
            .iter()
            .filter(|choice: &&&TargetLine| echo_key(choice_display(&choice.text)) == echo)
            .count();

        if matching == 1 {
            findings.push(finding(
                &file.file_name,
                &passage.name,
                first.index + 1,
                "MISMATCHED_ECHO",
                Severity::Warn,
                format!(
                    "echo matches only one of {} incoming choices: {}",
                    choices.len(),
                    truncate(&first.text, 80)
                ),
            ));
        }
    }

    findings
}

/// Minimum length, in chars, of both lines of a near-duplicate pair.
pub const DUPLICATE_MIN_CHARS: usize = 15;
/// Lines are compared with the next this-many-minus-one content lines.
pub const DUPLICATE_WINDOW: usize = 5;
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.75;

/// Near-duplicate content lines inside each passage.
pub fn find_duplicates(file: &TargetFile, threshold: f64) -> Vec<Finding> {
    let mut findings: Vec<Finding> = Vec::new();

    for passage in file.passages.values() {
        let content: Vec<&TargetLine> = passage
            .lines
            .iter()
            .filter(|line: &&TargetLine| {
                classify(&line.text).is_content() && !line.text.starts_with([':', '{'])
            })
            .collect();

        for (i, first) in content.iter().enumerate() {
            if first.text.chars().count() < DUPLICATE_MIN_CHARS {
                continue;
            }

            for second in content.iter().take((i + DUPLICATE_WINDOW).min(content.len())).skip(i + 1) {
                if second.text.chars().count() < DUPLICATE_MIN_CHARS {
                    continue;
                }

                let ratio: f64 = similarity(&first.text, &second.text);

                if ratio > threshold {
                    findings.push(finding(
                        &file.file_name,
                        &passage.name,
                        second.index + 1,
                        "NEAR_DUPLICATE",
                        Severity::Warn,
                        format!(
                            "{:.0}% similar to line {}: {}",
                            ratio * 100.0,
                            first.index + 1,
                            truncate(&second.text, 120)
                        ),
                    ));
                }
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::parse_target_file;
    use std::path::Path;

    fn rules(findings: &[Finding]) -> Vec<&'static str> {
        findings.iter().map(|finding: &Finding| finding.rule).collect()
    }

    #[test]
    fn validates_format_errors() {
        let content: &str = "=== пролог\n*\u{2014} Нет. -> a\n*:улыбка: \"Да.\" -> b\nbad\0line\n*:smile: \"Да.\" -> c\n";
        let findings: Vec<Finding> = validate_bytes("a_rus.txt", content.as_bytes(), &Config::default(), false);

        assert_eq!(
            rules(&findings),
            vec!["CYRILLIC_HEADER", "DASH_CHOICE", "TRANSLATED_EMOTE", "NULL_BYTES"]
        );
        assert_eq!(findings[1].line, 2);
        assert_eq!(findings[1].passage, "пролог");
    }

    #[test]
    fn strict_mode_adds_warnings() {
        let content: &str = "=== a\n*:blush: \"Да.\" -> b\nАЛЬФ : Привет.\nАЛЬФ : \"Привет.\"\n";

        assert!(validate_bytes("a_rus.txt", content.as_bytes(), &Config::default(), false).is_empty());

        let findings: Vec<Finding> = validate_bytes("a_rus.txt", content.as_bytes(), &Config::default(), true);
        assert_eq!(rules(&findings), vec!["UNKNOWN_EMOTE", "UNQUOTED_SPEAKER"]);
        assert!(findings.iter().all(|finding: &Finding| !finding.severity.is_error()));
    }

    #[test]
    fn flags_legacy_encoding() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("=== a\nПривет.\n");
        let findings: Vec<Finding> = validate_bytes("a_rus.txt", &bytes, &Config::default(), false);

        assert_eq!(rules(&findings), vec!["NOT_UTF8"]);
    }

    #[test]
    fn scans_choice_bugs() {
        let file: TargetFile = parse_target_file(
            Path::new("a_rus.txt"),
            "=== start\n*\"Да.\" -> yes\n*:smile: \"Sure thing.\" -> yes\n*'Ага.' -> no\n*\"Нет\". -> no\n=== yes\n\"Да.\"\nДальше.\n=== no\n\"Нет.\"\n",
        );

        let findings: Vec<Finding> = scan_file(&file, &Config::default());

        assert_eq!(
            rules(&findings),
            vec!["ENGLISH_IN_CHOICE", "SINGLE_QUOTE_CHOICE", "PERIOD_OUTSIDE_QUOTES", "MISMATCHED_ECHO"]
        );
        assert!(findings[0].detail.contains("Sure, thing"));
        assert_eq!(findings[3].passage, "yes");
        assert_eq!(findings[3].line, 7);
    }

    #[test]
    fn finds_near_duplicates_within_window() {
        let file: TargetFile = parse_target_file(
            Path::new("a_rus.txt"),
            "=== a\nОн медленно открывает дверь машины.\n$$ anim: IN $$\nОн медленно открывает дверь машины!\nКоротко.\nКоротко.\n",
        );

        let findings: Vec<Finding> = find_duplicates(&file, DEFAULT_DUPLICATE_THRESHOLD);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 4);
        assert!(findings[0].detail.contains("similar to line 2"));
        assert!(find_duplicates(&file, 0.99).is_empty());
    }
}
