//! Replacement dictionaries loaded from TOML data files.
//!
//! ```toml
//! normalize_guillemets = true
//!
//! [[speaker]]
//! from = "JOSIE"
//! to = "ДЖОСИ"
//!
//! [[replace]]
//! find = "Привет,"
//! replace = "Здравствуйте,"
//! files = ["054_ludivine"]
//! passage = "ludivine-intro"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::{fs::read_to_string, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    #[serde(rename = "speaker")]
    pub speakers: Vec<SpeakerRule>,
    #[serde(rename = "replace")]
    pub replacements: Vec<ReplaceRule>,
    /// Turn `«` and `»` into ASCII double quotes.
    pub normalize_guillemets: bool,
}

/// Renames a speaker at the start of a dialogue line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeakerRule {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Replaces the first occurrence of `find` in a file, or in one passage of it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceRule {
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub passage: Option<String>,
}

/// An empty filter matches every file.
fn matches_file(files: &[String], file_name: &str) -> bool {
    files.is_empty() || files.iter().any(|file: &String| file_name.contains(file.as_str()))
}

impl Rules {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Rules {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }

        let content: String = read_to_string(path).map_err(|err| Error::io(path, err))?;
        let rules: Rules = Rules::from_toml(&content, path)?;

        tracing::debug!(
            speakers = rules.speakers.len(),
            replacements = rules.replacements.len(),
            "loaded replacement rules"
        );

        Ok(rules)
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty() && self.replacements.is_empty() && !self.normalize_guillemets
    }
}

impl SpeakerRule {
    pub fn applies_to(&self, file_name: &str) -> bool {
        matches_file(&self.files, file_name)
    }

    /// `JOSIE : "..."` -> `ДЖОСИ : "..."`. Indentation and everything after
    /// the name are kept; `None` when the line does not start with the name.
    pub fn rename(&self, line: &str) -> Option<String> {
        let trimmed: &str = line.trim_start();
        let indent: &str = &line[..line.len() - trimmed.len()];
        let rest: &str = trimmed.strip_prefix(self.from.as_str())?;

        if !rest.trim_start().starts_with(':') {
            return None;
        }

        Some(format!("{indent}{}{rest}", self.to))
    }
}

impl ReplaceRule {
    pub fn applies_to(&self, file_name: &str, passage: &str) -> bool {
        matches_file(&self.files, file_name)
            && self
                .passage
                .as_deref()
                .map_or(true, |scoped: &str| scoped == passage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
normalize_guillemets = true

[[speaker]]
from = "JOSIE"
to = "ДЖОСИ"

[[speaker]]
from = "CLIENT"
to = "КЛИЕНТ"
files = ["054_ludivine"]

[[replace]]
find = "Привет,"
replace = "Здравствуйте,"
passage = "ludivine-intro"
"#;

    #[test]
    fn parses_rule_file() {
        let rules: Rules = Rules::from_toml(RULES, Path::new("rules.toml")).unwrap();

        assert!(rules.normalize_guillemets);
        assert_eq!(rules.speakers.len(), 2);
        assert_eq!(rules.replacements[0].passage.as_deref(), Some("ludivine-intro"));
        assert!(!rules.is_empty());
        assert!(Rules::default().is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err: Error = Rules::from_toml("[[speaker]]\nfrom = \"A\"\nto = \"B\"\nwhen = 1\n", Path::new("r.toml"))
            .unwrap_err();

        assert!(matches!(err, Error::Rules { .. }));
    }

    #[test]
    fn renames_speaker_at_line_start_only() {
        let rule: SpeakerRule = SpeakerRule {
            from: String::from("JOSIE"),
            to: String::from("ДЖОСИ"),
            files: Vec::new(),
        };

        assert_eq!(rule.rename("JOSIE : \"Hi.\"").as_deref(), Some("ДЖОСИ : \"Hi.\""));
        assert_eq!(rule.rename("  JOSIE: \"Hi.\"").as_deref(), Some("  ДЖОСИ: \"Hi.\""));
        assert_eq!(rule.rename("She calls JOSIE : \"Hi.\""), None);
        assert_eq!(rule.rename("JOSIEPHINE : \"Hi.\""), None);
    }

    #[test]
    fn scopes_rules_to_files_and_passages() {
        let rules: Rules = Rules::from_toml(RULES, Path::new("rules.toml")).unwrap();

        assert!(rules.speakers[0].applies_to("001_any_rus.txt"));
        assert!(rules.speakers[1].applies_to("054_ludivine_rus.txt"));
        assert!(!rules.speakers[1].applies_to("009_ludwig_rus.txt"));

        assert!(rules.replacements[0].applies_to("x_rus.txt", "ludivine-intro"));
        assert!(!rules.replacements[0].applies_to("x_rus.txt", "ludivine-end"));
    }
}
