use crate::{
    error::{Error, Result},
    statics::DEFAULT_EMOTES,
};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs::read_to_string,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_FILE: &str = "prompter.toml";

/// Locations and tunables every command receives instead of path globals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the translated passage files.
    pub texts_dir: PathBuf,
    /// Reference (source language) passage dump.
    pub reference_dump: PathBuf,
    /// Where JSON reports and the translation queue are written.
    pub output_dir: PathBuf,
    /// File name suffix of translated passage files, e.g. `_rus.txt`.
    pub file_suffix: String,
    /// Write `<file>.bak` before the first in-place modification.
    pub backup: bool,
    pub emotes: Vec<String>,
    /// Reference speaker name -> translated speaker name.
    pub speakers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            texts_dir: PathBuf::from("texts"),
            reference_dump: PathBuf::from("reference/passage_dump.txt"),
            output_dir: PathBuf::from("output"),
            file_suffix: String::from("_rus.txt"),
            backup: true,
            emotes: DEFAULT_EMOTES.iter().map(|emote: &&str| emote.to_string()).collect(),
            speakers: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if given, otherwise `prompter.toml` from the working
    /// directory when it exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path: &Path = match path {
            Some(path) => path,
            None => {
                let default_path: &Path = Path::new(DEFAULT_CONFIG_FILE);

                if !default_path.exists() {
                    return Ok(Config::default());
                }

                default_path
            }
        };

        let content: String = read_to_string(path).map_err(|err| Error::io(path, err))?;
        let config: Config = Config::from_toml(&content, path)?;
        tracing::debug!(path = %path.display(), "loaded config");

        Ok(config)
    }

    pub fn with_texts_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.texts_dir = dir;
        }
        self
    }

    pub fn with_reference_dump(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.reference_dump = path;
        }
        self
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }

    pub fn require_texts_dir(&self) -> Result<&Path> {
        if self.texts_dir.is_dir() {
            Ok(&self.texts_dir)
        } else {
            Err(Error::MissingDirectory(self.texts_dir.clone()))
        }
    }

    pub fn require_reference_dump(&self) -> Result<&Path> {
        if self.reference_dump.is_file() {
            Ok(&self.reference_dump)
        } else {
            Err(Error::MissingFile(self.reference_dump.clone()))
        }
    }

    pub fn missing_report_path(&self) -> PathBuf {
        self.output_dir.join("missing_lines.json")
    }

    pub fn queue_path(&self) -> PathBuf {
        self.output_dir.join("lines_to_translate.txt")
    }

    pub fn is_valid_emote(&self, tag: &str) -> bool {
        let lowercased: String = tag.to_lowercase();
        self.emotes.iter().any(|emote: &String| *emote == lowercased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = Config::from_toml(
            "texts_dir = \"data/Russian_Texts\"\nbackup = false\n\n[speakers]\nALPH = \"АЛЬФ\"\n",
            Path::new("prompter.toml"),
        )
        .unwrap();

        assert_eq!(config.texts_dir, PathBuf::from("data/Russian_Texts"));
        assert!(!config.backup);
        assert_eq!(config.file_suffix, "_rus.txt");
        assert_eq!(config.speakers.get("ALPH").map(String::as_str), Some("АЛЬФ"));
        assert!(config.is_valid_emote("Silence"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result: Result<Config> = Config::from_toml("text_dir = \"x\"", Path::new("prompter.toml"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn cli_overrides_replace_file_values() {
        let config: Config = Config::default()
            .with_texts_dir(Some(PathBuf::from("fixtures/texts")))
            .with_reference_dump(None)
            .with_output_dir(Some(PathBuf::from("out")));

        assert_eq!(config.texts_dir, PathBuf::from("fixtures/texts"));
        assert_eq!(config.reference_dump, PathBuf::from("reference/passage_dump.txt"));
        assert_eq!(config.missing_report_path(), PathBuf::from("out/missing_lines.json"));
    }
}
