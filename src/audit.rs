use crate::{
    align::{align, missing_lines, Alignment},
    config::Config,
    error::Result,
    functions::*,
    statics::{IMPORTANT_COMMAND_KEYWORDS, LEADING_EMOTE_RE},
    types::*,
};
use sonic_rs::to_string_pretty;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write,
};

const RULER: &str = "======================================================================";

/// Words of the human-readable reports. The binary fills them from its
/// localization; rule ids and categories stay untranslated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLabels<'a> {
    pub reference: &'a str,
    pub target: &'a str,
    pub missing: &'a str,
    pub before: &'a str,
    pub after: &'a str,
    pub passages_with_missing: &'a str,
    pub missing_lines: &'a str,
    pub file: &'a str,
    pub passages: &'a str,
    pub total: &'a str,
    pub errors: &'a str,
    pub warnings: &'a str,
    pub files_checked: &'a str,
    pub files_with_issues: &'a str,
    pub total_errors: &'a str,
    pub total_warnings: &'a str,
}

impl ReportLabels<'static> {
    pub const ENGLISH: Self = ReportLabels {
        reference: "reference",
        target: "target",
        missing: "missing",
        before: "before:",
        after: "after:",
        passages_with_missing: "Passages with missing lines:",
        missing_lines: "Missing lines:",
        file: "FILE",
        passages: "PASSAGES",
        total: "TOTAL",
        errors: "errors",
        warnings: "warnings",
        files_checked: "Files checked:",
        files_with_issues: "Files with issues:",
        total_errors: "Total errors:",
        total_warnings: "Total warnings:",
    };
}

/// Reference passages of a file by name. Later objects win on name clashes.
pub fn reference_passages<'a>(dump: &'a ReferenceDump, prefix: &str) -> BTreeMap<&'a str, &'a ReferencePassage> {
    let mut passages: BTreeMap<&str, &ReferencePassage> = BTreeMap::new();

    for object in dump.objects_for_prefix(prefix) {
        for (name, passage) in &object.passages {
            passages.insert(name.as_str(), passage);
        }
    }

    passages
}

/// Missing-line reports for one target file, passages in name order.
///
/// A passage is aligned only when its reference has more structural lines
/// than the target; passages absent from the file are left to [`audit_file`].
pub fn find_missing(file: &TargetFile, dump: &ReferenceDump, prefix: &str) -> Vec<PassageReport> {
    let mut reports: Vec<PassageReport> = Vec::new();

    for (name, reference) in reference_passages(dump, prefix) {
        let Some(target) = file.passages.get(name) else {
            continue;
        };

        if reference.lines.len() <= target.lines.len() {
            continue;
        }

        let alignment: Alignment = align(&reference.lines, &target.texts());
        let missing: Vec<MissingLine> = missing_lines(&reference.lines, &alignment);

        tracing::debug!(
            file = file.file_name.as_str(),
            passage = name,
            missing = missing.len(),
            extras = alignment.extras().len(),
            "aligned passage"
        );

        if !missing.is_empty() {
            reports.push(PassageReport {
                file: file.file_name.clone(),
                passage: name.to_string(),
                reference_total: reference.lines.len(),
                target_total: target.lines.len(),
                missing,
            });
        }
    }

    reports
}

pub fn has_missing_text(reports: &[PassageReport]) -> bool {
    reports.iter().any(|report: &PassageReport| {
        report
            .missing
            .iter()
            .any(|line: &MissingLine| line.category == Category::MissingText)
    })
}

pub fn render_missing(reports: &[PassageReport], labels: &ReportLabels) -> String {
    let mut output: String = String::new();

    for report in reports {
        let _ = writeln!(
            output,
            "=== {} / {}  ({} {}, {} {}, {} {})",
            report.file,
            report.passage,
            labels.reference,
            report.reference_total,
            labels.target,
            report.target_total,
            labels.missing,
            report.missing.len()
        );

        for line in &report.missing {
            let _ = writeln!(output, "  [{}] #{} {}", line.category.as_str(), line.position, line.text);

            if !line.context_before.is_empty() {
                let _ = writeln!(output, "      {:<7} {}", labels.before, truncate(&line.context_before, 80));
            }

            if !line.context_after.is_empty() {
                let _ = writeln!(output, "      {:<7} {}", labels.after, truncate(&line.context_after, 80));
            }
        }

        output.push('\n');
    }

    let lines: usize = reports.iter().map(|report: &PassageReport| report.missing.len()).sum();
    let _ = writeln!(output, "{} {}", labels.passages_with_missing, reports.len());
    let _ = write!(output, "{} {lines}", labels.missing_lines);

    output
}

/// Per-file table of missing lines by category.
pub fn render_missing_summary(reports: &[PassageReport], labels: &ReportLabels) -> String {
    let mut rows: BTreeMap<&str, [usize; 4]> = BTreeMap::new();

    for report in reports {
        let row: &mut [usize; 4] = rows.entry(report.file.as_str()).or_default();
        row[0] += 1;

        for line in &report.missing {
            let column: usize = match line.category {
                Category::MissingText => 1,
                Category::MissingCommand => 2,
                Category::MissingLogic => 3,
            };

            row[column] += 1;
        }
    }

    let mut output: String = format!(
        "{:<40} {:>8} {:>6} {:>8} {:>6}\n",
        labels.file, labels.passages, "TEXT", "COMMAND", "LOGIC"
    );
    let mut total: [usize; 4] = [0; 4];

    for (file, row) in &rows {
        let _ = writeln!(output, "{file:<40} {:>8} {:>6} {:>8} {:>6}", row[0], row[1], row[2], row[3]);

        for (sum, value) in total.iter_mut().zip(row) {
            *sum += value;
        }
    }

    let _ = write!(
        output,
        "{:<40} {:>8} {:>6} {:>8} {:>6}",
        labels.total, total[0], total[1], total[2], total[3]
    );

    output
}

pub fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(to_string_pretty(value)?)
}

fn finding(file: &TargetFile, passage: &str, line: usize, rule: &'static str, severity: Severity, detail: String) -> Finding {
    Finding {
        file: file.file_name.clone(),
        passage: passage.to_string(),
        line,
        rule,
        severity,
        detail,
    }
}

fn starts_quoted(text: &str) -> bool {
    text.starts_with(['"', '\'', '\u{00AB}', '\u{201C}', '('])
}

/// Audits one passage that exists in both the reference and the target.
pub fn audit_passage(
    file: &TargetFile,
    reference: &ReferencePassage,
    target: &TargetPassage,
    config: &Config,
) -> Vec<Finding> {
    let name: &str = &target.name;
    let mut findings: Vec<Finding> = Vec::new();

    for line in &target.lines {
        let kind: LineKind = classify(&line.text);

        if kind.is_content() && is_garbage_line(&line.text) {
            findings.push(finding(
                file,
                name,
                line.index + 1,
                "GARBAGE_LINE",
                Severity::Error,
                format!("garbage content: '{}'", line.text),
            ));
        }

        if has_substantial_english(&line.text) {
            findings.push(finding(
                file,
                name,
                line.index + 1,
                "UNTRANSLATED",
                Severity::Error,
                format!("untranslated: {}", truncate(&line.text, 80)),
            ));
        }

        if let Some(speaker) = extract_speaker(&line.text) {
            if let Some(translated) = config.speakers.get(speaker) {
                findings.push(finding(
                    file,
                    name,
                    line.index + 1,
                    "SPEAKER_UNTRANSLATED",
                    Severity::Error,
                    format!("speaker '{speaker}' not translated, should be '{translated}'"),
                ));
            }
        }
    }

    let reference_text: usize = reference
        .lines
        .iter()
        .filter(|line: &&String| !is_engine_command(line))
        .count();
    let target_text: usize = target
        .lines
        .iter()
        .filter(|line: &&TargetLine| classify(&line.text).is_content())
        .count();

    if reference_text > 0 && target_text == 0 {
        let sample: &str = reference
            .lines
            .iter()
            .find(|line: &&String| !is_engine_command(line))
            .map_or("", String::as_str);

        findings.push(finding(
            file,
            name,
            0,
            "EMPTY_PASSAGE",
            Severity::Error,
            format!("reference has {reference_text} text lines, target has none; reference: {}", truncate(sample, 80)),
        ));
    } else if reference_text > target_text + 1 {
        let diff: usize = reference_text - target_text;

        findings.push(finding(
            file,
            name,
            0,
            "MISSING_CONTENT",
            if diff >= 3 { Severity::Error } else { Severity::Warn },
            format!("reference has {reference_text} text lines, target has {target_text} (missing {diff})"),
        ));
    }

    let reference_choices: usize = reference.choices.len();
    let target_choices: usize = target.choices.len();

    if reference_choices != target_choices {
        findings.push(finding(
            file,
            name,
            0,
            "CHOICE_COUNT",
            if reference_choices.abs_diff(target_choices) > 1 {
                Severity::Error
            } else {
                Severity::Warn
            },
            format!("reference has {reference_choices} choices, target has {target_choices}"),
        ));
    }

    for (n, (expected, actual)) in reference.choices.iter().zip(&target.choices).enumerate() {
        if let Some(target_name) = choice_target(&actual.text) {
            if !expected.target.is_empty() && target_name != expected.target {
                findings.push(finding(
                    file,
                    name,
                    actual.index + 1,
                    "CHOICE_WRONG_TARGET",
                    Severity::Error,
                    format!("choice #{} goes to '{target_name}', reference goes to '{}'", n + 1, expected.target),
                ));
            }
        }

        let display: &str = choice_display(&actual.text);

        if display.is_empty() || starts_quoted(display) || display.starts_with(':') {
            continue;
        }

        let reference_display: &str = match LEADING_EMOTE_RE.find(&expected.text) {
            Some(emote) => expected.text[emote.end()..].trim(),
            None => expected.text.trim(),
        };

        if starts_quoted(reference_display) {
            findings.push(finding(
                file,
                name,
                actual.index + 1,
                "CHOICE_WRONG_TEXT",
                Severity::Error,
                format!("choice looks like narration: {} (reference: {})", truncate(display, 70), truncate(reference_display, 70)),
            ));
        } else if display.chars().count() > 60 {
            findings.push(finding(
                file,
                name,
                actual.index + 1,
                "CHOICE_WRONG_TEXT",
                Severity::Warn,
                format!("choice text suspiciously long ({} chars): {}", display.chars().count(), truncate(display, 70)),
            ));
        }
    }

    let reference_commands: BTreeSet<&str> = reference
        .lines
        .iter()
        .map(|line: &String| line.trim())
        .filter(|line: &&str| is_engine_command(line))
        .collect();
    let target_commands: BTreeSet<&str> = target
        .lines
        .iter()
        .map(|line: &TargetLine| line.text.as_str())
        .filter(|line: &&str| is_engine_command(line))
        .collect();

    for command in reference_commands.difference(&target_commands) {
        if IMPORTANT_COMMAND_KEYWORDS.iter().any(|keyword: &&str| command.contains(keyword)) {
            findings.push(finding(
                file,
                name,
                0,
                "MISSING_COMMAND",
                Severity::Warn,
                format!("missing: {command}"),
            ));
        }
    }

    findings
}

/// Audits every reference passage of the file, errors first.
pub fn audit_file(file: &TargetFile, dump: &ReferenceDump, prefix: &str, config: &Config) -> Vec<Finding> {
    let mut findings: Vec<Finding> = Vec::new();

    for (name, reference) in reference_passages(dump, prefix) {
        match file.passages.get(name) {
            Some(target) => findings.extend(audit_passage(file, reference, target, config)),
            None => findings.push(finding(
                file,
                name,
                0,
                "MISSING_PASSAGE",
                Severity::Error,
                format!("passage '{name}' missing from the file"),
            )),
        }
    }

    sort_findings(&mut findings);
    findings
}

/// Errors first, then by passage and line.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a: &Finding, b: &Finding| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.passage.cmp(&b.passage))
            .then(a.line.cmp(&b.line))
    });
}

pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|finding: &Finding| finding.severity.is_error())
}

/// Findings grouped by file, followed by totals per `SEVERITY:RULE`.
pub fn render_findings(findings: &[Finding], files_checked: usize, labels: &ReportLabels) -> String {
    let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();

    for finding in findings {
        by_file.entry(finding.file.as_str()).or_default().push(finding);
    }

    let mut output: String = String::new();

    for (file, findings) in &by_file {
        let errors: usize = findings.iter().filter(|finding| finding.severity.is_error()).count();

        let _ = writeln!(output, "{RULER}");
        let _ = writeln!(
            output,
            "{}: {file}  ({errors} {}, {} {})",
            labels.file,
            labels.errors,
            findings.len() - errors,
            labels.warnings
        );
        let _ = writeln!(output, "{RULER}");

        for finding in findings {
            let location: String = match (finding.passage.is_empty(), finding.line) {
                (true, 0) => String::from("-"),
                (true, line) => line.to_string(),
                (false, 0) => finding.passage.clone(),
                (false, line) => format!("{}:{line}", finding.passage),
            };

            let _ = writeln!(
                output,
                "  {:<5}  {:<22} [{location}] {}",
                finding.severity.as_str(),
                finding.rule,
                finding.detail
            );
        }

        output.push('\n');
    }

    let errors: usize = findings.iter().filter(|finding| finding.severity.is_error()).count();
    let mut by_rule: BTreeMap<String, usize> = BTreeMap::new();

    for finding in findings {
        *by_rule
            .entry(format!("{}:{}", finding.severity.as_str(), finding.rule))
            .or_default() += 1;
    }

    let _ = writeln!(output, "{:<20}{files_checked}", labels.files_checked);
    let _ = writeln!(output, "{:<20}{}", labels.files_with_issues, by_file.len());
    let _ = writeln!(output, "{:<20}{errors}", labels.total_errors);
    let _ = write!(output, "{:<20}{}", labels.total_warnings, findings.len() - errors);

    for (rule, count) in &by_rule {
        let _ = write!(output, "\n  {rule:<35} {count:>4}");
    }

    output
}
