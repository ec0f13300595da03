use crate::{
    align::{align, Alignment},
    error::{Error, Result},
    functions::classify,
    rules::{ReplaceRule, Rules, SpeakerRule},
    statics::CHOICE_MARKER,
    types::*,
};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs::{copy, create_dir_all, write},
    ops::{AddAssign, Range},
    path::{Path, PathBuf},
};

/// A translated line going in front of raw line `line` of its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub passage: String,
    pub line: usize,
    pub position: usize,
    pub category: Category,
    pub text: String,
}

/// Where lines land when no later reference line is matched: right after the
/// last structural line, or after the header of a passage that has none.
pub fn passage_end(passage: &TargetPassage) -> usize {
    passage
        .lines
        .last()
        .map_or(passage.header + 1, |line: &TargetLine| line.index + 1)
}

/// Plans insertions for the queue entries of one passage.
///
/// Each entry goes immediately before the target line of the nearest later
/// matched reference line, or to [`passage_end`]. Entries whose position is
/// out of range or already matched are skipped, as are repeated positions.
/// # Parameters
/// * `alignment` - reference lines of the passage aligned against `passage.lines`
/// * `passage` - the target passage
/// * `entries` - queue entries of this passage
pub fn plan_insertions(alignment: &Alignment, passage: &TargetPassage, entries: &[&QueueEntry]) -> Vec<Insertion> {
    let mut seen: Xxh3HashSet<usize> = Xxh3HashSet::default();
    let mut plan: Vec<Insertion> = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.position >= alignment.reference_len() {
            tracing::warn!(
                passage = passage.name.as_str(),
                position = entry.position,
                "position is outside the reference passage, skipping"
            );
            continue;
        }

        if alignment.is_matched(entry.position) {
            tracing::debug!(
                passage = passage.name.as_str(),
                position = entry.position,
                "line already present, skipping"
            );
            continue;
        }

        if !seen.insert(entry.position) {
            tracing::warn!(
                passage = passage.name.as_str(),
                position = entry.position,
                "position queued twice, keeping the first entry"
            );
            continue;
        }

        let line: usize = alignment
            .next_matched_after(entry.position)
            .and_then(|(_, target)| passage.lines.get(target))
            .map_or_else(|| passage_end(passage), |line: &TargetLine| line.index);

        plan.push(Insertion {
            passage: passage.name.clone(),
            line,
            position: entry.position,
            category: entry.category,
            text: entry.text.clone(),
        });
    }

    plan
}

/// Plans every queue entry that belongs to `file`. Passages missing from the
/// file or from the reference are skipped with a warning.
pub fn plan_file(file: &TargetFile, dump: &ReferenceDump, prefix: &str, entries: &[&QueueEntry]) -> Vec<Insertion> {
    let mut by_passage: Xxh3IndexMap<&str, Vec<&QueueEntry>> = Xxh3IndexMap::default();

    for &entry in entries {
        if entry.text.is_empty() {
            tracing::warn!(file = file.file_name.as_str(), passage = entry.passage.as_str(), position = entry.position, "empty text, skipping");
            continue;
        }

        by_passage.entry(entry.passage.as_str()).or_default().push(entry);
    }

    let mut plan: Vec<Insertion> = Vec::new();

    for (name, entries) in by_passage {
        let Some(passage) = file.passages.get(name) else {
            tracing::warn!(file = file.file_name.as_str(), passage = name, "passage not found in file, skipping");
            continue;
        };

        let Some(reference) = dump.find_passage(prefix, name) else {
            tracing::warn!(file = file.file_name.as_str(), passage = name, "passage not found in reference, skipping");
            continue;
        };

        let alignment: Alignment = align(&reference.lines, &passage.texts());
        plan.extend(plan_insertions(&alignment, passage, &entries));
    }

    plan
}

/// Applies insertions bottom-up so earlier indices stay valid. Lines sharing
/// an insertion point end up in ascending reference order.
pub fn apply_insertions(raw: &mut Vec<String>, mut plan: Vec<Insertion>) -> usize {
    plan.sort_by(|a: &Insertion, b: &Insertion| b.line.cmp(&a.line).then(b.position.cmp(&a.position)));

    for insertion in &plan {
        let at: usize = insertion.line.min(raw.len());
        raw.insert(at, insertion.text.clone());
    }

    plan.len()
}

/// One dry-run block: the planned line between its future neighbours.
pub fn describe_insertion(raw: &[String], insertion: &Insertion) -> String {
    let before: &str = insertion
        .line
        .checked_sub(1)
        .and_then(|index: usize| raw.get(index))
        .map_or("", String::as_str);
    let after: &str = raw.get(insertion.line).map_or("", String::as_str);

    format!(
        "[{}] #{} {} before line {}\n    {before}\n  + {}\n    {after}",
        insertion.passage,
        insertion.position,
        insertion.category.as_str(),
        insertion.line + 1,
        insertion.text
    )
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copies `path` to `<path>.bak` unless a backup already exists, so the
/// oldest state is what survives.
pub fn backup_file(path: &Path) -> Result<bool> {
    let backup: PathBuf = backup_path(path);

    if backup.exists() {
        return Ok(false);
    }

    copy(path, &backup).map_err(|err| Error::io(&backup, err))?;
    tracing::debug!(path = %backup.display(), "created backup");

    Ok(true)
}

pub fn serialize_lines(raw: &[String], line_ending: &str, trailing_newline: bool) -> String {
    let mut content: String = raw.join(line_ending);

    if trailing_newline && !raw.is_empty() {
        content.push_str(line_ending);
    }

    content
}

/// Writes `raw` back to the file as UTF-8 with its original line endings.
pub fn write_target_file(file: &TargetFile, raw: &[String], backup: bool) -> Result<()> {
    if backup {
        backup_file(&file.path)?;
    }

    let content: String = serialize_lines(raw, file.line_ending, file.trailing_newline);
    write(&file.path, content).map_err(|err| Error::io(&file.path, err))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreStats {
    pub passages_checked: usize,
    pub passages_changed: usize,
    pub commands_restored: usize,
    pub duplicates_removed: usize,
}

impl AddAssign for RestoreStats {
    fn add_assign(&mut self, other: Self) {
        self.passages_checked += other.passages_checked;
        self.passages_changed += other.passages_changed;
        self.commands_restored += other.commands_restored;
        self.duplicates_removed += other.duplicates_removed;
    }
}

/// Replacement for the raw lines `start..end` of one passage body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyEdit {
    pub passage: String,
    pub start: usize,
    pub end: usize,
    pub lines: Vec<String>,
    pub commands_restored: usize,
    pub duplicates_removed: usize,
}

/// Lines after the header up to the last non-blank line of the passage.
pub fn body_range(raw: &[String], passage: &TargetPassage) -> Range<usize> {
    let start: usize = passage.header + 1;
    let mut end: usize = passage.end.min(raw.len());

    while end > start && raw[end - 1].trim().is_empty() {
        end -= 1;
    }

    start..end
}

fn restore_commands(
    reference: &ReferencePassage,
    alignment: &Alignment,
    range: Range<usize>,
    output: &mut Vec<String>,
) -> usize {
    let mut restored: usize = 0;

    for position in range {
        let line: &str = reference.lines[position].trim();

        if !alignment.is_matched(position) && classify(line).is_command() {
            output.push(line.to_string());
            restored += 1;
        }
    }

    restored
}

/// Rebuilds a passage body against its reference.
///
/// Matched lines, unmatched logic and commands, blank and comment lines stay
/// where they are. Unmatched reference commands are restored in front of the
/// next matched line, or after the last line. Unmatched target content is
/// dropped only while the target holds more content lines than the
/// reference, last surplus line first, so reordered translations keep their
/// text. Choices move to the end. `None` when the body would not change.
pub fn restore_passage(reference: &ReferencePassage, passage: &TargetPassage, raw: &[String]) -> Option<BodyEdit> {
    if reference.lines.is_empty() {
        return None;
    }

    let texts: Vec<&str> = passage.texts();
    let alignment: Alignment = align(&reference.lines, &texts);
    let mut reference_of: Vec<Option<usize>> = vec![None; texts.len()];

    for (reference_index, target_index) in alignment.matched() {
        reference_of[target_index] = Some(reference_index);
    }

    let reference_content: usize = reference
        .lines
        .iter()
        .filter(|line: &&String| classify(line).is_content())
        .count();
    let target_content: usize = texts.iter().filter(|text: &&&str| classify(text).is_content()).count();

    let surplus: usize = if reference_content == 0 {
        0
    } else {
        target_content.saturating_sub(reference_content)
    };

    let dropped: Xxh3HashSet<usize> = (0..texts.len())
        .rev()
        .filter(|&index: &usize| reference_of[index].is_none() && classify(texts[index]).is_content())
        .take(surplus)
        .collect();

    let range: Range<usize> = body_range(raw, passage);
    let mut output: Vec<String> = Vec::with_capacity(range.len() + reference.lines.len());
    let mut choices: Vec<String> = Vec::new();
    let mut next_reference: usize = 0;
    let mut next_line: usize = 0;
    let mut commands_restored: usize = 0;
    let mut duplicates_removed: usize = 0;

    for (index, line) in raw.iter().enumerate().take(range.end).skip(range.start) {
        let is_structural: bool = passage
            .lines
            .get(next_line)
            .is_some_and(|structural: &TargetLine| structural.index == index);

        if is_structural {
            let target_index: usize = next_line;
            next_line += 1;

            match reference_of[target_index] {
                Some(reference_index) => {
                    commands_restored +=
                        restore_commands(reference, &alignment, next_reference..reference_index, &mut output);
                    next_reference = reference_index + 1;
                    output.push(line.clone());
                }
                None if dropped.contains(&target_index) => {
                    duplicates_removed += 1;
                }
                None => output.push(line.clone()),
            }
        } else if line.trim_start().starts_with(CHOICE_MARKER) {
            choices.push(line.clone());
        } else {
            output.push(line.clone());
        }
    }

    let mut tail: Vec<String> = Vec::new();
    commands_restored += restore_commands(reference, &alignment, next_reference..reference.lines.len(), &mut tail);

    let tail_at: usize = output
        .iter()
        .rposition(|line: &String| !line.trim().is_empty())
        .map_or(0, |last: usize| last + 1);
    output.splice(tail_at..tail_at, tail);
    output.extend(choices);

    if output.as_slice() == &raw[range.clone()] {
        return None;
    }

    Some(BodyEdit {
        passage: passage.name.clone(),
        start: range.start,
        end: range.end,
        lines: output,
        commands_restored,
        duplicates_removed,
    })
}

/// Restores every passage of `file` that its own reference objects define.
pub fn restore_file(file: &TargetFile, dump: &ReferenceDump, prefix: &str) -> (Vec<BodyEdit>, RestoreStats) {
    let mut edits: Vec<BodyEdit> = Vec::new();
    let mut stats: RestoreStats = RestoreStats::default();

    for passage in file.passages.values() {
        let Some(reference) = dump.file_passage(prefix, &passage.name) else {
            tracing::debug!(file = file.file_name.as_str(), passage = passage.name.as_str(), "no reference passage");
            continue;
        };

        stats.passages_checked += 1;

        if let Some(edit) = restore_passage(reference, passage, &file.raw) {
            stats.passages_changed += 1;
            stats.commands_restored += edit.commands_restored;
            stats.duplicates_removed += edit.duplicates_removed;
            edits.push(edit);
        }
    }

    (edits, stats)
}

/// Splices body edits into `raw`, last passage first.
pub fn apply_body_edits(raw: &mut Vec<String>, mut edits: Vec<BodyEdit>) {
    edits.sort_by(|a: &BodyEdit, b: &BodyEdit| b.start.cmp(&a.start));

    for edit in edits {
        raw.splice(edit.start..edit.end, edit.lines);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub speakers_renamed: usize,
    pub replacements: usize,
    pub replacements_missed: usize,
    pub quotes_normalized: usize,
}

impl PatchStats {
    pub fn changes(&self) -> usize {
        self.speakers_renamed + self.replacements + self.quotes_normalized
    }
}

impl AddAssign for PatchStats {
    fn add_assign(&mut self, other: Self) {
        self.speakers_renamed += other.speakers_renamed;
        self.replacements += other.replacements;
        self.replacements_missed += other.replacements_missed;
        self.quotes_normalized += other.quotes_normalized;
    }
}

/// Applies replacement rules to the passage bodies of `file`; lines before the
/// first passage are left alone. Returns the patched lines.
pub fn patch_file(file: &TargetFile, rules: &Rules) -> (Vec<String>, PatchStats) {
    let mut raw: Vec<String> = file.raw.clone();
    let mut stats: PatchStats = PatchStats::default();

    let speakers: Vec<&SpeakerRule> = rules
        .speakers
        .iter()
        .filter(|rule: &&SpeakerRule| rule.applies_to(&file.file_name))
        .collect();

    for passage in file.passages.values() {
        for line in &mut raw[passage.header + 1..passage.end] {
            if let Some(renamed) = speakers.iter().find_map(|rule: &&SpeakerRule| rule.rename(line)) {
                *line = renamed;
                stats.speakers_renamed += 1;
            }
        }
    }

    for rule in &rules.replacements {
        let mut replaced: bool = false;

        'passages: for passage in file.passages.values() {
            if !rule.applies_to(&file.file_name, &passage.name) {
                continue;
            }

            for line in &mut raw[passage.header + 1..passage.end] {
                if line.contains(rule.find.as_str()) {
                    *line = line.replacen(rule.find.as_str(), &rule.replace, 1);
                    replaced = true;
                    break 'passages;
                }
            }
        }

        if replaced {
            stats.replacements += 1;
        } else if rule_targets(rule, &file.file_name) {
            stats.replacements_missed += 1;
            tracing::warn!(file = file.file_name.as_str(), find = rule.find.as_str(), "replacement text not found");
        }
    }

    if rules.normalize_guillemets {
        for passage in file.passages.values() {
            for line in &mut raw[passage.header + 1..passage.end] {
                let count: usize = line.matches(['\u{00AB}', '\u{00BB}']).count();

                if count > 0 {
                    *line = line.replace(['\u{00AB}', '\u{00BB}'], "\"");
                    stats.quotes_normalized += count;
                }
            }
        }
    }

    (raw, stats)
}

/// A file-scoped rule that found nothing is worth a warning; an unscoped one
/// simply does not apply to most files.
fn rule_targets(rule: &ReplaceRule, file_name: &str) -> bool {
    !rule.files.is_empty() && rule.applies_to(file_name, rule.passage.as_deref().unwrap_or_default())
}

pub const QUEUE_HEADER: &str = "## Lines to translate. Translate TEXT, keep the other fields.
## FORMAT: FILE|PASSAGE|POSITION|CATEGORY|TEXT";

/// Flattens missing-line reports into queue rows.
pub fn queue_rows(reports: &[PassageReport], text_only: bool) -> Vec<QueueEntry> {
    reports
        .iter()
        .flat_map(|report: &PassageReport| {
            report
                .missing
                .iter()
                .filter(move |line: &&MissingLine| !text_only || line.category == Category::MissingText)
                .map(move |line: &MissingLine| QueueEntry {
                    file: report.file.clone(),
                    passage: report.passage.clone(),
                    position: line.position,
                    category: line.category,
                    text: line.text.replace(['\r', '\n'], " "),
                })
        })
        .collect()
}

pub fn render_queue(rows: &[QueueEntry]) -> String {
    let mut content: String = String::from(QUEUE_HEADER);
    content.push('\n');

    for row in rows {
        content.push_str(&format!(
            "{}|{}|{}|{}|{}\n",
            row.file,
            row.passage,
            row.position,
            row.category.as_str(),
            row.text
        ));
    }

    content
}

pub fn queue_counts(rows: &[QueueEntry]) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();

    for row in rows {
        *counts.entry(row.category).or_default() += 1;
    }

    counts
}

pub fn write_queue(path: &Path, rows: &[QueueEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent: &&Path| !parent.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }

    write(path, render_queue(rows)).map_err(|err| Error::io(path, err))
}
