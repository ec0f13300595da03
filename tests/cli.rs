use std::{
    fs::{read_to_string, write},
    path::PathBuf,
    process::{Command, Output},
};
use tempfile::{TempDir, tempdir};

const DUMP: &str = "OBJ 001_intro_01 1
P intro 4 0
L ALPH : \"Hello.\"
L $$ anim: IDLE $$
L ALPH : \"How are you?\"
L ALPH : \"Bye.\"
";

const MISSING_TEXT: &str = "=== intro\nАЛЬФ : \"Привет.\"\n$$ anim: IDLE $$\nАЛЬФ : \"Пока.\"\n";
const MISSING_COMMAND: &str = "=== intro\nАЛЬФ : \"Привет.\"\nАЛЬФ : \"Как дела?\"\nАЛЬФ : \"Пока.\"\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(target: &str) -> Self {
        let dir: TempDir = tempdir().unwrap();

        std::fs::create_dir(dir.path().join("texts")).unwrap();
        write(dir.path().join("dump.txt"), DUMP).unwrap();
        write(dir.path().join("texts/001_intro_rus.txt"), target).unwrap();

        Fixture { dir }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn target(&self) -> String {
        read_to_string(self.path("texts/001_intro_rus.txt")).unwrap()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_prompter-txt-rs"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .args(args)
            .args(["-l", "en", "-i", "texts", "-r", "dump.txt", "-o", "output"])
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn missing_reports_dropped_text_and_fails() {
    let fixture: Fixture = Fixture::new(MISSING_TEXT);
    let output: Output = fixture.run(&["missing", "--json"]);

    assert_eq!(output.status.code(), Some(1));

    let report: String = stdout(&output);
    assert!(report.contains("MISSING_TEXT"));
    assert!(report.contains("Bye."));
    assert!(report.contains("001_intro_rus.txt"));
}

#[test]
fn missing_command_alone_does_not_fail() {
    let fixture: Fixture = Fixture::new(MISSING_COMMAND);
    let output: Output = fixture.run(&["missing"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("MISSING_COMMAND"));
}

#[test]
fn extract_then_apply_fills_the_gap() {
    let fixture: Fixture = Fixture::new(MISSING_TEXT);

    let missing: Output = fixture.run(&["missing", "--save"]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(fixture.path("output/missing_lines.json").is_file());

    let extract: Output = fixture.run(&["extract"]);
    assert_eq!(extract.status.code(), Some(0));

    let queue: String = read_to_string(fixture.path("output/lines_to_translate.txt")).unwrap();
    assert!(queue.starts_with("##"));
    assert!(queue.contains("001_intro_rus.txt|intro|3|MISSING_TEXT|ALPH : \"Bye.\""));

    let dry_run: Output = fixture.run(&["apply", "--dry-run"]);
    assert_eq!(dry_run.status.code(), Some(0));
    assert_eq!(fixture.target(), MISSING_TEXT);

    let apply: Output = fixture.run(&["apply"]);
    assert_eq!(apply.status.code(), Some(0));
    assert_eq!(
        fixture.target(),
        "=== intro\nАЛЬФ : \"Привет.\"\n$$ anim: IDLE $$\nАЛЬФ : \"Пока.\"\nALPH : \"Bye.\"\n"
    );
    assert_eq!(
        read_to_string(fixture.path("texts/001_intro_rus.txt.bak")).unwrap(),
        MISSING_TEXT
    );

    let again: Output = fixture.run(&["missing"]);
    assert_eq!(again.status.code(), Some(0));
}

#[test]
fn restore_puts_lost_command_back() {
    let fixture: Fixture = Fixture::new(MISSING_COMMAND);

    let dry_run: Output = fixture.run(&["restore", "--dry-run"]);
    assert_eq!(dry_run.status.code(), Some(0));
    assert!(stdout(&dry_run).contains("Commands restored: 1"));
    assert_eq!(fixture.target(), MISSING_COMMAND);

    let restore: Output = fixture.run(&["restore", "--no-backup"]);
    assert_eq!(restore.status.code(), Some(0));
    assert_eq!(
        fixture.target(),
        "=== intro\nАЛЬФ : \"Привет.\"\n$$ anim: IDLE $$\nАЛЬФ : \"Как дела?\"\nАЛЬФ : \"Пока.\"\n"
    );
    assert!(!fixture.path("texts/001_intro_rus.txt.bak").exists());
}

#[test]
fn validate_exit_code_follows_errors() {
    let fixture: Fixture = Fixture::new(MISSING_TEXT);

    let clean: Output = fixture.run(&["validate"]);
    assert_eq!(clean.status.code(), Some(0));

    write(fixture.path("texts/002_broken_rus.txt"), "=== outro\nАЛЬФ : \"Пока.\0\"\n").unwrap();

    let broken: Output = fixture.run(&["validate", "--file", "002"]);
    assert_eq!(broken.status.code(), Some(1));
    assert!(stdout(&broken).contains("NULL_BYTES"));
}

#[test]
fn patch_renames_speakers() {
    let fixture: Fixture = Fixture::new(MISSING_TEXT);
    write(fixture.path("rules.toml"), "[[speaker]]\nfrom = \"АЛЬФ\"\nto = \"АЛЬФОНС\"\n").unwrap();

    let output: Output = fixture.run(&["patch", "--rules", "rules.toml", "--no-backup"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(fixture.target().contains("АЛЬФОНС : \"Привет.\""));
    assert!(fixture.target().contains("АЛЬФОНС : \"Пока.\""));
}

#[test]
fn missing_texts_directory_is_fatal() {
    let fixture: Fixture = Fixture::new(MISSING_TEXT);

    let output: Output = Command::new(env!("CARGO_BIN_EXE_prompter-txt-rs"))
        .current_dir(fixture.dir.path())
        .args(["missing", "-l", "en", "-i", "nowhere", "-r", "dump.txt"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}
