use crate::{
    error::{Error, Result},
    functions::{decode_text, obj_id_to_prefix},
    statics::{CHOICE_MARKER, PASSAGE_HEADER},
    types::*,
};
use sonic_rs::from_str;
use std::{
    fs::{read, read_dir, DirEntry},
    path::{Path, PathBuf},
};

/// Reads a text file, falling back to windows-1251 when it is not UTF-8.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes: Vec<u8> = read(path).map_err(|err| Error::io(path, err))?;
    Ok(decode_text(&bytes))
}

/// Parses the reference dump.
///
/// Records: `OBJ <id> <count>`, `P <name> <lines> <choices>`, `L <text>`,
/// `C <display>\t<target>`. Malformed `P` and `C` records are skipped with a
/// warning; `L` and `C` records before the first passage are ignored.
pub fn parse_reference_dump(content: &str) -> ReferenceDump {
    let mut dump: ReferenceDump = ReferenceDump::default();
    let mut current_obj: Option<String> = None;
    let mut current_passage: Option<ReferencePassage> = None;

    fn flush(dump: &mut ReferenceDump, obj: &Option<String>, passage: &mut Option<ReferencePassage>) {
        if let (Some(obj), Some(passage)) = (obj, passage.take()) {
            if let Some(object) = dump.objects.get_mut(obj) {
                object.passages.insert(passage.name.clone(), passage);
            }
        }
    }

    for (i, line) in content.trim_start_matches('\u{FEFF}').lines().enumerate() {
        let line_number: usize = i + 1;

        if let Some(rest) = line.strip_prefix("OBJ ") {
            flush(&mut dump, &current_obj, &mut current_passage);

            let Some(id) = rest.split_whitespace().next() else {
                tracing::warn!(line_number, "OBJ record without an id, skipping");
                current_obj = None;
                continue;
            };

            dump.objects.insert(
                id.to_string(),
                ReferenceObject {
                    id: id.to_string(),
                    ..Default::default()
                },
            );
            current_obj = Some(id.to_string());
        } else if line.starts_with("P ") {
            flush(&mut dump, &current_obj, &mut current_passage);

            let parts: Vec<&str> = line.split_whitespace().collect();

            let counts: Option<(usize, usize)> = match parts.as_slice() {
                [_, _, lines, choices, ..] => lines.parse().ok().zip(choices.parse().ok()),
                _ => None,
            };

            let Some((line_count, choice_count)) = counts else {
                tracing::warn!(line_number, record = line, "malformed passage record, skipping");
                continue;
            };

            current_passage = Some(ReferencePassage {
                name: parts[1].to_string(),
                line_count,
                choice_count,
                ..Default::default()
            });
        } else if let Some(text) = line.strip_prefix("L ") {
            if let Some(passage) = current_passage.as_mut() {
                passage.lines.push(text.trim_end_matches('\r').to_string());
            }
        } else if let Some(record) = line.strip_prefix("C ") {
            if let Some(passage) = current_passage.as_mut() {
                match record.trim_end_matches('\r').split_once('\t') {
                    Some((text, target)) => passage.choices.push(Choice {
                        text: text.to_string(),
                        target: target.to_string(),
                    }),
                    None => tracing::warn!(line_number, record = line, "choice record without target, skipping"),
                }
            }
        }
    }

    flush(&mut dump, &current_obj, &mut current_passage);
    dump
}

pub fn read_reference_dump(path: &Path) -> Result<ReferenceDump> {
    let content: String = read_text(path)?;
    let dump: ReferenceDump = parse_reference_dump(&content);

    tracing::debug!(
        objects = dump.objects.len(),
        passages = dump.passage_count(),
        "parsed reference dump"
    );

    Ok(dump)
}

impl ReferenceDump {
    pub fn passage_count(&self) -> usize {
        self.objects.values().map(|object: &ReferenceObject| object.passages.len()).sum()
    }

    /// Objects belonging to the target file with the given prefix, sorted by id.
    ///
    /// `054_ludivine` collects `054_ludivine_01`, `054_ludivine_02`, ...;
    /// when no object has that stripped prefix, an object whose id equals the
    /// prefix exactly (`009_ludwig_00a`, `099_boss_01`) is used.
    pub fn objects_for_prefix(&self, prefix: &str) -> Vec<&ReferenceObject> {
        let mut objects: Vec<&ReferenceObject> = self
            .objects
            .values()
            .filter(|object: &&ReferenceObject| obj_id_to_prefix(&object.id) == prefix)
            .collect();

        if objects.is_empty() {
            if let Some(object) = self.objects.get(prefix) {
                objects.push(object);
            }
        }

        objects.sort_by(|a: &&ReferenceObject, b: &&ReferenceObject| a.id.cmp(&b.id));
        objects
    }

    /// Passage `name` among the objects of the file with `prefix`; later
    /// objects win.
    pub fn file_passage(&self, prefix: &str, name: &str) -> Option<&ReferencePassage> {
        self.objects_for_prefix(prefix)
            .into_iter()
            .rev()
            .find_map(|object: &ReferenceObject| object.passages.get(name))
    }

    /// Like [`ReferenceDump::file_passage`], falling back to the last object
    /// in the dump that defines `name`.
    pub fn find_passage(&self, prefix: &str, name: &str) -> Option<&ReferencePassage> {
        self.file_passage(prefix, name).or_else(|| {
            self.objects
                .values()
                .rev()
                .find_map(|object: &ReferenceObject| object.passages.get(name))
        })
    }
}

fn is_ignored_line(stripped: &str) -> bool {
    stripped.is_empty()
        || stripped.starts_with("%%")
        || stripped.starts_with("//")
        || stripped.starts_with("VAR ")
        || stripped.starts_with("+++")
}

/// Parses a translated passage file, keeping its raw lines.
/// # Parameters
/// * `path` - where the file lives, kept for writing back
/// * `content` - decoded file content
pub fn parse_target_file(path: &Path, content: &str) -> TargetFile {
    let raw: Vec<String> = content.lines().map(str::to_string).collect();
    let line_ending: &'static str = if content.contains("\r\n") { "\r\n" } else { "\n" };

    let headers: Vec<(usize, String)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            line.strip_prefix(PASSAGE_HEADER)
                .map(|name: &str| (i, name.trim().to_string()))
        })
        .collect();

    let mut passages: Xxh3IndexMap<String, TargetPassage> = Xxh3IndexMap::default();

    for (n, (header, name)) in headers.iter().enumerate() {
        let end: usize = headers.get(n + 1).map_or(raw.len(), |(next, _)| *next);
        let mut passage: TargetPassage = TargetPassage {
            name: name.clone(),
            header: *header,
            end,
            ..Default::default()
        };

        for (index, line) in raw.iter().enumerate().take(end).skip(header + 1) {
            let stripped: &str = line.trim();

            if is_ignored_line(stripped) {
                continue;
            }

            let target_line: TargetLine = TargetLine {
                index,
                text: stripped.to_string(),
            };

            if stripped.starts_with(CHOICE_MARKER) {
                passage.choices.push(target_line);
            } else {
                passage.lines.push(target_line);
            }
        }

        if passages.insert(name.clone(), passage).is_some() {
            tracing::warn!(path = %path.display(), passage = name.as_str(), "duplicate passage header, last one wins");
        }
    }

    TargetFile {
        path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        raw,
        passages,
        line_ending,
        trailing_newline: content.ends_with('\n'),
    }
}

pub fn read_target_file(path: &Path) -> Result<TargetFile> {
    Ok(parse_target_file(path, &read_text(path)?))
}

/// `054_ludivine_rus.txt` -> `054_ludivine`.
pub fn file_prefix<'a>(file_name: &'a str, suffix: &str) -> &'a str {
    file_name.strip_suffix(suffix).unwrap_or(file_name)
}

/// Lists translated files in `dir` ending with `suffix`, sorted by name.
/// # Parameters
/// * `dir` - directory to scan
/// * `suffix` - file name suffix, e.g. `_rus.txt`
/// * `filter` - keep only files whose prefix (name without `suffix`) contains this substring
pub fn list_target_files(dir: &Path, suffix: &str, filter: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = read_dir(dir)
        .map_err(|err| Error::io(dir, err))?
        .flatten()
        .filter(|entry: &DirEntry| entry.path().is_file())
        .filter_map(|entry: DirEntry| {
            let name: String = entry.file_name().into_string().ok()?;

            if !name.ends_with(suffix) {
                return None;
            }

            if filter.is_some_and(|filter: &str| !file_prefix(&name, suffix).contains(filter)) {
                return None;
            }

            Some(entry.path())
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Parses the translation queue: `FILE|PASSAGE|POSITION|CATEGORY|TEXT` per line,
/// `##` comments and blank lines ignored, malformed rows skipped with a warning.
pub fn parse_queue(content: &str) -> Vec<QueueEntry> {
    let mut entries: Vec<QueueEntry> = Vec::new();

    for (i, line) in content.trim_start_matches('\u{FEFF}').lines().enumerate() {
        let line_number: usize = i + 1;

        if line.trim().is_empty() || line.starts_with("##") {
            continue;
        }

        let parts: Vec<&str> = line.splitn(5, '|').collect();

        let [file, passage, position, category, text] = parts.as_slice() else {
            tracing::warn!(line_number, row = line, "malformed queue row, skipping");
            continue;
        };

        let Ok(position) = position.trim().parse::<usize>() else {
            tracing::warn!(line_number, position = *position, "invalid position in queue row, skipping");
            continue;
        };

        let Some(category) = Category::parse(category) else {
            tracing::warn!(line_number, category = *category, "unknown category in queue row, skipping");
            continue;
        };

        entries.push(QueueEntry {
            file: file.trim().to_string(),
            passage: passage.trim().to_string(),
            position,
            category,
            text: text.trim().to_string(),
        });
    }

    entries
}

pub fn read_queue(path: &Path) -> Result<Vec<QueueEntry>> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    Ok(parse_queue(&read_text(path)?))
}

pub fn read_missing_report(path: &Path) -> Result<Vec<PassageReport>> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let content: String = read_text(path)?;

    from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\u{FEFF}OBJ 054_ludivine_01 2
P ludivine-intro 3 2
L $$ anim: IN $$
L LUDIVINE : \"Evening.\"
L She sits down.
C \"Evening.\"\tludivine-evening
C :silence: (Say nothing)\tludivine-silence
P broken x 1
L orphan line
P ludivine-evening 1 0
L \"Evening.\"
OBJ 054_ludivine_02 1
P ludivine-end 1 0
L Goodbye.
C missing tab
OBJ 009_ludwig_00a 1
P ludwig-intro 1 0
L Hello.
";

    #[test]
    fn parses_dump_records() {
        let dump: ReferenceDump = parse_reference_dump(DUMP);

        assert_eq!(dump.objects.len(), 3);
        assert_eq!(dump.passage_count(), 4);

        let intro: &ReferencePassage = &dump.objects["054_ludivine_01"].passages["ludivine-intro"];
        assert_eq!(intro.line_count, 3);
        assert_eq!(intro.choice_count, 2);
        assert_eq!(intro.lines.len(), 3);
        assert_eq!(
            intro.choices[1],
            Choice {
                text: String::from(":silence: (Say nothing)"),
                target: String::from("ludivine-silence"),
            }
        );

        // Lines after a malformed `P` record attach to nothing.
        assert!(dump.objects["054_ludivine_01"].passages.get("broken").is_none());
        assert_eq!(dump.objects["054_ludivine_02"].passages["ludivine-end"].choices.len(), 0);
    }

    #[test]
    fn maps_files_to_objects() {
        let dump: ReferenceDump = parse_reference_dump(DUMP);

        let ids: Vec<&str> = dump
            .objects_for_prefix("054_ludivine")
            .iter()
            .map(|object| object.id.as_str())
            .collect();
        assert_eq!(ids, vec!["054_ludivine_01", "054_ludivine_02"]);

        assert_eq!(dump.objects_for_prefix("009_ludwig_00a").len(), 1);
        assert!(dump.objects_for_prefix("999_nobody").is_empty());
        assert!(dump.find_passage("999_nobody", "ludwig-intro").is_some());
    }

    #[test]
    fn parses_target_passages() {
        let content: &str = "%% header comment\r\n\r\n=== intro\r\n\r\n$$ anim: IN $$\r\nЛЮДИВИН : «Вечер.»\r\n// note\r\nVAR x = 1\r\n*\"Вечер.\" -> evening\r\n\r\n=== evening\r\n\"Вечер.\"\r\n";
        let file: TargetFile = parse_target_file(Path::new("054_ludivine_rus.txt"), content);

        assert_eq!(file.file_name, "054_ludivine_rus.txt");
        assert_eq!(file.line_ending, "\r\n");
        assert!(file.trailing_newline);
        assert_eq!(file.passages.len(), 2);

        let intro: &TargetPassage = &file.passages["intro"];
        assert_eq!(intro.header, 2);
        assert_eq!(intro.end, 10);
        assert_eq!(intro.texts(), vec!["$$ anim: IN $$", "ЛЮДИВИН : «Вечер.»"]);
        assert_eq!(intro.lines[1].index, 5);
        assert_eq!(intro.choices.len(), 1);

        assert_eq!(file.passages["evening"].end, file.raw.len());
    }

    #[test]
    fn parses_queue_rows() {
        let content: &str = "## FORMAT\n\na_rus.txt|intro|2|MISSING_TEXT|Текст | с чертой\nbad row\na_rus.txt|intro|x|MISSING_TEXT|t\na_rus.txt|intro|3|WHATEVER|t\n";
        let entries: Vec<QueueEntry> = parse_queue(content);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, 2);
        assert_eq!(entries[0].text, "Текст | с чертой");
    }

    #[test]
    fn filters_files_by_prefix() {
        let dir: tempfile::TempDir = tempfile::tempdir().unwrap();

        for name in ["054_ludivine_rus.txt", "009_ludwig_rus.txt", "notes.txt"] {
            std::fs::write(dir.path().join(name), "=== intro\n").unwrap();
        }

        let names = |filter: Option<&str>| -> Vec<String> {
            list_target_files(dir.path(), "_rus.txt", filter)
                .unwrap()
                .iter()
                .map(|path: &PathBuf| path.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        assert_eq!(names(None), vec!["009_ludwig_rus.txt", "054_ludivine_rus.txt"]);
        assert_eq!(names(Some("ludivine")), vec!["054_ludivine_rus.txt"]);
        assert!(names(Some("_rus")).is_empty());
    }

    #[test]
    fn strips_file_suffix() {
        assert_eq!(file_prefix("054_ludivine_rus.txt", "_rus.txt"), "054_ludivine");
        assert_eq!(file_prefix("notes.md", "_rus.txt"), "notes.md");
    }
}
