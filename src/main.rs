mod localization;
use crate::localization::*;
use clap::{Arg, ArgAction, ArgMatches, Command, crate_version, value_parser};
use color_print::cformat;
use prompter_lib::{
    audit::*,
    config::Config,
    error::{Error, Result},
    lint::*,
    read::*,
    rules::Rules,
    types::*,
    write::*,
};
use std::{
    collections::BTreeMap,
    fs::{create_dir_all, read, write},
    io::stderr,
    path::{Path, PathBuf},
    process::exit,
    time::Instant,
};
use sys_locale::get_locale;
use tracing_subscriber::EnvFilter;

const SUBCOMMANDS: [&str; 9] = [
    "missing",
    "extract",
    "apply",
    "restore",
    "audit",
    "validate",
    "scan",
    "duplicates",
    "patch",
];

fn preparse_args() -> Language {
    let preparse = Command::new("preparse")
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .disable_version_flag(true)
        .ignore_errors(true)
        .subcommands(SUBCOMMANDS.map(Command::new))
        .args([Arg::new("language")
            .short('l')
            .long("language")
            .global(true)
            .value_parser(["ru", "en"])]);
    let mut preparse_matches: ArgMatches = preparse.get_matches();
    let language_arg: Option<String> = preparse_matches.remove_one::<String>("language");

    let language: String = language_arg.unwrap_or_else(|| {
        let locale: String = get_locale().unwrap_or(String::from("en-US"));

        if let Some((lang, _)) = locale.split_once('-') {
            lang.to_owned()
        } else {
            locale
        }
    });

    match language.as_str() {
        "ru" | "be" | "uk" => Language::Russian,
        _ => Language::English,
    }
}

fn setup_cli(localization: &Localization<'static>) -> Command {
    let input_dir_arg: Arg = Arg::new("input-dir")
        .short('i')
        .long("input-dir")
        .global(true)
        .help(localization.input_dir_arg_desc)
        .value_name(localization.input_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .display_order(1);

    let reference_arg: Arg = Arg::new("reference")
        .short('r')
        .long("reference")
        .global(true)
        .help(localization.reference_arg_desc)
        .value_name(localization.input_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .display_order(2);

    let output_dir_arg: Arg = Arg::new("output-dir")
        .short('o')
        .long("output-dir")
        .global(true)
        .help(localization.output_dir_arg_desc)
        .value_name(localization.output_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .display_order(3);

    let config_arg: Arg = Arg::new("config")
        .short('c')
        .long("config")
        .global(true)
        .help(localization.config_arg_desc)
        .value_name(localization.file_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .display_order(4);

    let language_arg: Arg = Arg::new("language")
        .short('l')
        .long("language")
        .value_name(localization.language_arg_type)
        .global(true)
        .help(cformat!(
            "{}\n<bold>[{} en, ru]\n[{} --language en]</>",
            localization.language_arg_desc,
            localization.possible_values,
            localization.example,
        ))
        .value_parser(["en", "ru"])
        .display_order(96);

    let log_flag: Arg = Arg::new("log")
        .short('L')
        .long("log")
        .action(ArgAction::SetTrue)
        .global(true)
        .help(localization.log_arg_desc)
        .display_order(97);

    let help_flag: Arg = Arg::new("help")
        .short('h')
        .long("help")
        .help(localization.help_arg_desc)
        .action(ArgAction::Help)
        .display_order(98);

    let version_flag: Arg = Arg::new("version")
        .short('v')
        .long("version")
        .action(ArgAction::Version)
        .help(localization.version_flag_desc)
        .display_order(99);

    let file_arg: Arg = Arg::new("file")
        .short('f')
        .long("file")
        .help(localization.file_arg_desc)
        .value_name(localization.file_filter_arg_type)
        .display_order(10);

    let json_flag: Arg = Arg::new("json")
        .short('j')
        .long("json")
        .action(ArgAction::SetTrue)
        .help(localization.json_flag_desc)
        .display_order(11);

    let summary_flag: Arg = Arg::new("summary")
        .short('s')
        .long("summary")
        .action(ArgAction::SetTrue)
        .conflicts_with("json")
        .help(localization.summary_flag_desc)
        .display_order(12);

    let save_flag: Arg = Arg::new("save")
        .short('S')
        .long("save")
        .action(ArgAction::SetTrue)
        .help(localization.save_flag_desc)
        .display_order(13);

    let report_arg: Arg = Arg::new("report")
        .long("report")
        .help(localization.report_arg_desc)
        .value_name(localization.file_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .display_order(14);

    let queue_arg: Arg = Arg::new("queue")
        .short('q')
        .long("queue")
        .help(localization.queue_arg_desc)
        .value_name(localization.file_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .display_order(15);

    let text_only_flag: Arg = Arg::new("text-only")
        .short('t')
        .long("text-only")
        .action(ArgAction::SetTrue)
        .help(localization.text_only_flag_desc)
        .display_order(16);

    let stats_flag: Arg = Arg::new("stats")
        .long("stats")
        .action(ArgAction::SetTrue)
        .help(localization.stats_flag_desc)
        .display_order(17);

    let dry_run_flag: Arg = Arg::new("dry-run")
        .short('d')
        .long("dry-run")
        .action(ArgAction::SetTrue)
        .help(localization.dry_run_flag_desc)
        .display_order(20);

    let no_backup_flag: Arg = Arg::new("no-backup")
        .long("no-backup")
        .action(ArgAction::SetTrue)
        .help(localization.no_backup_flag_desc)
        .display_order(21);

    let verbose_flag: Arg = Arg::new("verbose")
        .short('V')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help(localization.verbose_flag_desc)
        .display_order(22);

    let strict_flag: Arg = Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help(localization.strict_flag_desc)
        .display_order(23);

    let threshold_arg: Arg = Arg::new("threshold")
        .long("threshold")
        .value_name(localization.threshold_arg_type)
        .value_parser(value_parser!(f64))
        .default_value("0.75")
        .hide_default_value(true)
        .help(cformat!(
            "{}\n<bold>[{} 0.75]</>",
            localization.threshold_arg_desc,
            localization.default_value,
        ))
        .display_order(24);

    let rules_arg: Arg = Arg::new("rules")
        .long("rules")
        .required(true)
        .value_name(localization.file_path_arg_type)
        .value_parser(value_parser!(PathBuf))
        .help(cformat!(
            "{}\n<bold>[{} --rules fixes.toml]</>",
            localization.rules_arg_desc,
            localization.example,
        ))
        .display_order(25);

    let subcommand = |name: &'static str, about: &'static str| -> Command {
        Command::new(name)
            .disable_help_flag(true)
            .help_template(localization.subcommand_help_template)
            .about(about)
            .arg(&help_flag)
    };

    let missing_subcommand: Command = subcommand("missing", localization.missing_command_desc)
        .args([&file_arg, &json_flag, &summary_flag, &save_flag]);

    let extract_subcommand: Command = subcommand("extract", localization.extract_command_desc)
        .args([&report_arg, &text_only_flag, &stats_flag]);

    let apply_subcommand: Command = subcommand("apply", localization.apply_command_desc)
        .args([&file_arg, &queue_arg, &dry_run_flag, &no_backup_flag]);

    let restore_subcommand: Command = subcommand("restore", localization.restore_command_desc)
        .args([&file_arg, &dry_run_flag, &no_backup_flag, &verbose_flag]);

    let audit_subcommand: Command =
        subcommand("audit", localization.audit_command_desc).args([&file_arg, &json_flag]);

    let validate_subcommand: Command = subcommand("validate", localization.validate_command_desc)
        .args([&file_arg, &json_flag, &strict_flag]);

    let scan_subcommand: Command =
        subcommand("scan", localization.scan_command_desc).args([&file_arg, &json_flag]);

    let duplicates_subcommand: Command = subcommand("duplicates", localization.duplicates_command_desc)
        .args([&file_arg, &json_flag, &threshold_arg]);

    let patch_subcommand: Command = subcommand("patch", localization.patch_command_desc)
        .args([&rules_arg, &file_arg, &dry_run_flag, &no_backup_flag]);

    Command::new("")
        .version(crate_version!())
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .disable_help_flag(true)
        .next_line_help(true)
        .term_width(120)
        .about(localization.about_msg)
        .help_template(localization.help_template)
        .subcommands([
            missing_subcommand,
            extract_subcommand,
            apply_subcommand,
            restore_subcommand,
            audit_subcommand,
            validate_subcommand,
            scan_subcommand,
            duplicates_subcommand,
            patch_subcommand,
        ])
        .args([
            input_dir_arg,
            reference_arg,
            output_dir_arg,
            config_arg,
            language_arg,
            log_flag,
            help_flag,
            version_flag,
        ])
        .hide_possible_values(true)
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_logging(enabled: bool) {
    let default_level: &str = if enabled { "debug" } else { "warn" };
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_target(false)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let config: Config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?
        .with_texts_dir(matches.get_one::<PathBuf>("input-dir").cloned())
        .with_reference_dump(matches.get_one::<PathBuf>("reference").cloned())
        .with_output_dir(matches.get_one::<PathBuf>("output-dir").cloned());

    tracing::debug!(
        texts_dir = %config.texts_dir.display(),
        reference_dump = %config.reference_dump.display(),
        output_dir = %config.output_dir.display(),
        "using config"
    );

    Ok(config)
}

fn file_filter(matches: &ArgMatches) -> Option<&str> {
    matches.get_one::<String>("file").map(String::as_str)
}

fn target_files(config: &Config, matches: &ArgMatches) -> Result<Vec<PathBuf>> {
    let texts_dir: &Path = config.require_texts_dir()?;
    list_target_files(texts_dir, &config.file_suffix, file_filter(matches))
}

fn print_findings(localization: &Localization, findings: &[Finding], files_checked: usize, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(findings)?);
    } else if findings.is_empty() {
        println!("{}", localization.no_issues_msg);
    } else {
        println!("{}", render_findings(findings, files_checked, &localization.report_labels));
    }

    Ok(())
}

fn run_missing(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let files: Vec<PathBuf> = target_files(config, matches)?;
    let dump: ReferenceDump = read_reference_dump(config.require_reference_dump()?)?;

    if files.is_empty() {
        eprintln!("{}", localization.no_files_found_msg);
    }

    let mut reports: Vec<PassageReport> = Vec::new();

    for path in &files {
        let file: TargetFile = read_target_file(path)?;

        let prefix: &str = file_prefix(&file.file_name, &config.file_suffix);

        if dump.objects_for_prefix(prefix).is_empty() {
            tracing::warn!(file = file.file_name.as_str(), "no reference objects for file, skipping");
            continue;
        }

        reports.extend(find_missing(&file, &dump, prefix));
    }

    if matches.get_flag("json") {
        println!("{}", render_json(&reports)?);
    } else if matches.get_flag("summary") {
        println!("{}", render_missing_summary(&reports, &localization.report_labels));
    } else {
        println!("{}", render_missing(&reports, &localization.report_labels));
    }

    if matches.get_flag("save") {
        create_dir_all(&config.output_dir).map_err(|err| Error::io(&config.output_dir, err))?;

        let report_path: PathBuf = config.missing_report_path();
        write(&report_path, render_json(&reports)?).map_err(|err| Error::io(&report_path, err))?;
        eprintln!("{} {}", localization.report_saved_msg, report_path.display());
    }

    Ok(if has_missing_text(&reports) { 1 } else { 0 })
}

fn run_extract(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let report_path: PathBuf = matches
        .get_one::<PathBuf>("report")
        .cloned()
        .unwrap_or_else(|| config.missing_report_path());

    let reports: Vec<PassageReport> = read_missing_report(&report_path)?;
    let rows: Vec<QueueEntry> = queue_rows(&reports, matches.get_flag("text-only"));

    if matches.get_flag("stats") {
        for (category, count) in queue_counts(&rows) {
            println!("{:<16} {count}", category.as_str());
        }

        println!("{} {}", localization.queue_total_msg, rows.len());
        return Ok(0);
    }

    let queue_path: PathBuf = config.queue_path();
    write_queue(&queue_path, &rows)?;

    println!("{} {}", localization.queue_written_msg, queue_path.display());
    println!("{} {}", localization.queue_total_msg, rows.len());

    Ok(0)
}

fn run_apply(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let queue_path: PathBuf = matches
        .get_one::<PathBuf>("queue")
        .cloned()
        .unwrap_or_else(|| config.queue_path());

    let entries: Vec<QueueEntry> = read_queue(&queue_path)?;
    let texts_dir: &Path = config.require_texts_dir()?;
    let dump: ReferenceDump = read_reference_dump(config.require_reference_dump()?)?;

    let dry_run: bool = matches.get_flag("dry-run");
    let backup: bool = config.backup && !matches.get_flag("no-backup");
    let filter: Option<&str> = file_filter(matches);

    let mut by_file: BTreeMap<&str, Vec<&QueueEntry>> = BTreeMap::new();

    for entry in &entries {
        if filter.is_some_and(|filter: &str| !file_prefix(&entry.file, &config.file_suffix).contains(filter)) {
            continue;
        }

        by_file.entry(entry.file.as_str()).or_default().push(entry);
    }

    let mut total: usize = 0;

    for (file_name, entries) in by_file {
        let path: PathBuf = texts_dir.join(file_name);

        if !path.is_file() {
            tracing::warn!(file = file_name, "file not found, skipping");
            continue;
        }

        let target: TargetFile = read_target_file(&path)?;

        let prefix: &str = file_prefix(&target.file_name, &config.file_suffix);
        let mut plan: Vec<Insertion> = plan_file(&target, &dump, prefix, &entries);

        if plan.is_empty() {
            continue;
        }

        if dry_run {
            plan.sort_by_key(|insertion: &Insertion| (insertion.line, insertion.position));
            println!("{file_name}");

            for insertion in &plan {
                println!("{}", describe_insertion(&target.raw, insertion));
            }

            total += plan.len();
        } else {
            let mut raw: Vec<String> = target.raw.clone();
            let inserted: usize = apply_insertions(&mut raw, plan);

            write_target_file(&target, &raw, backup)?;
            println!("  {file_name}: {inserted}");

            total += inserted;
        }
    }

    if dry_run {
        println!("{} {total}", localization.lines_would_insert_msg);
        println!("{}", localization.dry_run_msg);
    } else {
        println!("{} {total}", localization.lines_inserted_msg);

        if backup && total > 0 {
            println!("{}", localization.backup_msg);
        }
    }

    Ok(0)
}

fn run_restore(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let files: Vec<PathBuf> = target_files(config, matches)?;
    let dump: ReferenceDump = read_reference_dump(config.require_reference_dump()?)?;

    let dry_run: bool = matches.get_flag("dry-run");
    let backup: bool = config.backup && !matches.get_flag("no-backup");
    let verbose: bool = matches.get_flag("verbose");

    let mut totals: RestoreStats = RestoreStats::default();
    let mut files_changed: usize = 0;

    for path in &files {
        let file: TargetFile = read_target_file(path)?;

        let prefix: &str = file_prefix(&file.file_name, &config.file_suffix);
        let (edits, stats): (Vec<BodyEdit>, RestoreStats) = restore_file(&file, &dump, prefix);
        totals += stats;

        if edits.is_empty() {
            continue;
        }

        files_changed += 1;
        println!("  {}: {}", file.file_name, edits.len());

        if verbose {
            for edit in &edits {
                println!(
                    "    {}: +{} cmds, -{} dup",
                    edit.passage, edit.commands_restored, edit.duplicates_removed
                );
            }
        }

        if !dry_run {
            let mut raw: Vec<String> = file.raw.clone();
            apply_body_edits(&mut raw, edits);
            write_target_file(&file, &raw, backup)?;
        }
    }

    println!("{} {}", localization.passages_checked_msg, totals.passages_checked);
    println!("{} {}", localization.passages_changed_msg, totals.passages_changed);
    println!("{} {}", localization.commands_restored_msg, totals.commands_restored);
    println!("{} {}", localization.duplicates_removed_msg, totals.duplicates_removed);
    println!("{} {files_changed}", localization.files_changed_msg);

    if dry_run {
        println!("{}", localization.dry_run_msg);
    }

    Ok(0)
}

fn run_audit(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let files: Vec<PathBuf> = target_files(config, matches)?;
    let dump: ReferenceDump = read_reference_dump(config.require_reference_dump()?)?;

    let mut findings: Vec<Finding> = Vec::new();
    let mut files_checked: usize = 0;

    for path in &files {
        let file: TargetFile = read_target_file(path)?;

        let prefix: &str = file_prefix(&file.file_name, &config.file_suffix);

        if dump.objects_for_prefix(prefix).is_empty() {
            tracing::warn!(file = file.file_name.as_str(), "no reference objects for file, skipping");
            continue;
        }

        files_checked += 1;
        findings.extend(audit_file(&file, &dump, prefix, config));
    }

    print_findings(localization, &findings, files_checked, matches.get_flag("json"))?;
    Ok(if has_errors(&findings) { 1 } else { 0 })
}

fn run_validate(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let files: Vec<PathBuf> = target_files(config, matches)?;
    let strict: bool = matches.get_flag("strict");

    let mut findings: Vec<Finding> = Vec::new();

    for path in &files {
        let bytes: Vec<u8> = read(path).map_err(|err| Error::io(path, err))?;
        let file_name: String = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        findings.extend(validate_bytes(&file_name, &bytes, config, strict));
    }

    sort_findings(&mut findings);
    print_findings(localization, &findings, files.len(), matches.get_flag("json"))?;

    Ok(if has_errors(&findings) { 1 } else { 0 })
}

fn run_scan(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let files: Vec<PathBuf> = target_files(config, matches)?;
    let mut findings: Vec<Finding> = Vec::new();

    for path in &files {
        let file: TargetFile = read_target_file(path)?;
        findings.extend(scan_file(&file, config));
    }

    print_findings(localization, &findings, files.len(), matches.get_flag("json"))?;
    Ok(if findings.is_empty() { 0 } else { 1 })
}

fn run_duplicates(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let files: Vec<PathBuf> = target_files(config, matches)?;
    let threshold: f64 = matches
        .get_one::<f64>("threshold")
        .copied()
        .unwrap_or(DEFAULT_DUPLICATE_THRESHOLD);

    let mut findings: Vec<Finding> = Vec::new();

    for path in &files {
        let file: TargetFile = read_target_file(path)?;
        findings.extend(find_duplicates(&file, threshold));
    }

    print_findings(localization, &findings, files.len(), matches.get_flag("json"))?;
    Ok(if findings.is_empty() { 0 } else { 1 })
}

fn run_patch(localization: &Localization, config: &Config, matches: &ArgMatches) -> Result<i32> {
    let rules_path: &PathBuf = matches
        .get_one::<PathBuf>("rules")
        .ok_or_else(|| Error::MissingFile(PathBuf::from("--rules")))?;

    let rules: Rules = Rules::load(rules_path)?;

    if rules.is_empty() {
        println!("{}", localization.empty_rules_msg);
        return Ok(0);
    }

    let files: Vec<PathBuf> = target_files(config, matches)?;
    let dry_run: bool = matches.get_flag("dry-run");
    let backup: bool = config.backup && !matches.get_flag("no-backup");

    let mut totals: PatchStats = PatchStats::default();
    let mut files_changed: usize = 0;

    for path in &files {
        let file: TargetFile = read_target_file(path)?;

        let (raw, stats): (Vec<String>, PatchStats) = patch_file(&file, &rules);
        totals += stats;

        if stats.changes() == 0 {
            continue;
        }

        files_changed += 1;
        println!("  {}: {}", file.file_name, stats.changes());

        if !dry_run {
            write_target_file(&file, &raw, backup)?;
        }
    }

    println!("{} {}", localization.speakers_renamed_msg, totals.speakers_renamed);
    println!("{} {}", localization.replacements_msg, totals.replacements);
    println!("{} {}", localization.replacements_missed_msg, totals.replacements_missed);
    println!("{} {}", localization.quotes_normalized_msg, totals.quotes_normalized);
    println!("{} {files_changed}", localization.files_changed_msg);

    if dry_run {
        println!("{}", localization.dry_run_msg);
    }

    Ok(0)
}

fn run(localization: &Localization, subcommand: &str, matches: &ArgMatches) -> Result<i32> {
    let config: Config = load_config(matches)?;

    match subcommand {
        "missing" => run_missing(localization, &config, matches),
        "extract" => run_extract(localization, &config, matches),
        "apply" => run_apply(localization, &config, matches),
        "restore" => run_restore(localization, &config, matches),
        "audit" => run_audit(localization, &config, matches),
        "validate" => run_validate(localization, &config, matches),
        "scan" => run_scan(localization, &config, matches),
        "duplicates" => run_duplicates(localization, &config, matches),
        "patch" => run_patch(localization, &config, matches),
        _ => unreachable!(),
    }
}

fn main() {
    let start_time: Instant = Instant::now();

    let language: Language = preparse_args();
    let localization: Localization = Localization::new(language);
    let cli: Command = setup_cli(&localization);

    let matches: ArgMatches = cli.get_matches();
    let (subcommand, subcommand_matches): (&str, &ArgMatches) =
        matches.subcommand().unwrap_or_else(|| {
            println!("{}", localization.no_subcommand_specified_msg);
            exit(0);
        });

    init_logging(subcommand_matches.get_flag("log"));

    let code: i32 = match run(&localization, subcommand, subcommand_matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", localization.fatal_error_msg);
            2
        }
    };

    eprintln!(
        "{} {}",
        localization.elapsed_time_msg,
        start_time.elapsed().as_secs_f64()
    );

    exit(code);
}
