use once_cell::sync::Lazy;
use regex::Regex;

pub static BRACED_ASSIGNMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{.*=.*\}$").unwrap());
pub static BARE_ASSIGNMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_a-zA-Z][\w.-]*\s*=\s*\d+$").unwrap());
pub static INCREMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.-]+\s*[+-]=\s*\d+$").unwrap());
pub static REDIRECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^->\s").unwrap());

pub static SPEAKER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z\u{0400}-\u{04FF}][A-Z\u{0400}-\u{04FF} .'-]+\s*:\s*").unwrap());
/// Speaker followed by an opening quote, e.g. `АЛЬФ : "text"`.
pub static QUOTED_SPEAKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-ZÀ-ÖØ-ÞА-ЯЁ][A-ZÀ-ÖØ-ÞА-ЯЁa-zà-öø-þа-яё\s-]+?)\s*:\s*["«“'„]"#).unwrap());
pub static CYRILLIC_SPEAKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\u{0410}-\u{042F}\u{0401}][\u{0410}-\u{042F}\u{0401}\- ]{1,25})\s*:\s+(.+)$").unwrap());
pub static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub static CHOICE_TARGET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"->\s*(\S+)\s*$").unwrap());
pub static LEADING_EMOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:(\w+):\s*").unwrap());
pub static ENGLISH_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z]{3,}\b").unwrap());
pub static PERIOD_OUTSIDE_QUOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""\.\s*(->|$)"#).unwrap());
pub static DASH_CHOICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\s*[\u{2014}\u{2013}]").unwrap());
pub static CHOICE_EMOTE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*:([^:]+):").unwrap());
pub static CYRILLIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{0400}-\u{04FF}]").unwrap());
pub static OBJ_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)_(\d{1,2})$").unwrap());

pub static PASSAGE_HEADER: &str = "=== ";
pub static CHOICE_MARKER: char = '*';
pub static COMMAND_DELIMITER: &str = "$$";
pub static QUOTE_CHARS: [char; 7] = ['"', '\'', '\u{00AB}', '\u{00BB}', '\u{201C}', '\u{201D}', '\u{201E}'];

/// Emote tags the game recognizes in choice lines.
pub static DEFAULT_EMOTES: [&str; 15] = [
    "anger", "angry", "irony", "love", "money", "negative", "positive", "puzzled", "radio", "sad", "silence", "smile",
    "smoking", "taxi", "violence",
];

/// Directives whose absence breaks scene flow, not just presentation.
pub static IMPORTANT_COMMAND_KEYWORDS: [&str; 3] = ["reveal:", "anim-link:", "music-control:"];
