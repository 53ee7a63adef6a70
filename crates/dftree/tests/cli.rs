use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_path(suffix: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "dftree-{suffix}-{}-{timestamp}.Dockerfile",
        std::process::id()
    ));
    path
}

struct Fixture {
    path: PathBuf,
}

impl Fixture {
    fn new(contents: &str) -> Self {
        let path = unique_path("fixture");
        fs::write(&path, contents).expect("fixture write should succeed");
        Self { path }
    }

    fn path_str(&self) -> &str {
        self.path
            .to_str()
            .expect("fixture path should be valid utf-8")
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

const MULTI_STAGE_DOCKERFILE: &str = "FROM rust:1.80 AS builder\n\
                                      WORKDIR /src\n\
                                      COPY . .\n\
                                      RUN cargo build --release\n\
                                      FROM debian:bookworm-slim\n\
                                      USER app\n\
                                      ENTRYPOINT [\"/usr/local/bin/app\"]\n";

fn command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dftree"));
    command.env_remove("RUST_LOG");
    command
}

fn run(args: &[&str]) -> Output {
    command()
        .args(args)
        .output()
        .expect("command should run")
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = command()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("command should spawn");

    {
        let mut stdin = child.stdin.take().expect("stdin should be piped");
        stdin
            .write_all(input.as_bytes())
            .expect("stdin write should succeed");
    }

    child
        .wait_with_output()
        .expect("command output should be available")
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be utf-8")
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr should be utf-8")
}

#[test]
fn prints_compact_flat_document() {
    let fixture = Fixture::new(
        "FROM base\n\
         WORKDIR /app\n\
         USER dev\n\
         RUN echo hi\n",
    );

    let output = run(&["--file", fixture.path_str(), "--compact"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        "{\"from\":{\"image\":\"base\"},\"workdir\":{\"/app\":{\"dev\":{\"run\":[\"echo hi\"]}}}}\n"
    );
    assert_eq!(stderr_text(&output), "");
}

#[test]
fn pretty_output_is_the_default() {
    let fixture = Fixture::new("FROM alpine\nEXPOSE 80\n");

    let output = run(&["-f", fixture.path_str()]);
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        "{\n  \"from\": {\n    \"image\": \"alpine\"\n  },\n  \"expose\": [\n    \"80/tcp\"\n  ]\n}\n"
    );
}

#[test]
fn reads_dockerfile_from_stdin() {
    let output = run_with_stdin(
        &["--stdin", "--compact"],
        "FROM alpine\nRUN apk add \\\n  curl\nSHELL [\"/bin/ash\"]\nRUN ignored\n",
    );
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        "{\"from\":{\"image\":\"alpine\"},\"workdir\":{\"/\":{\"root\":{\"run\":[\"apk add curl\"]}}}}\n"
    );
}

#[test]
fn stage_ids_key_every_stage() {
    let fixture = Fixture::new(MULTI_STAGE_DOCKERFILE);

    let output = run(&["--file", fixture.path_str(), "--stage-ids", "--compact"]);
    assert!(output.status.success());

    let document: serde_json::Value =
        serde_json::from_str(&stdout_text(&output)).expect("stdout should be json");
    let stages = document.as_object().expect("root should be an object");
    assert_eq!(stages.len(), 2);

    let mut images = Vec::new();
    for (id, stage) in stages {
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()));
        images.push(stage["from"]["image"].as_str().map(str::to_string));
    }
    images.sort();
    assert_eq!(
        images,
        vec![Some("debian".to_string()), Some("rust".to_string())]
    );

    let runtime = stages
        .values()
        .find(|stage| stage["from"]["image"] == "debian")
        .expect("runtime stage should exist");
    assert_eq!(
        runtime["workdir"]["/src"]["app"]["entrypoint"],
        serde_json::json!(["/usr/local/bin/app"])
    );
}

#[test]
fn onbuild_triggers_render_as_sub_document() {
    let fixture = Fixture::new("FROM node:20\nONBUILD COPY . /app\nONBUILD RUN npm ci\n");

    let output = run(&["--file", fixture.path_str(), "--compact"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        "{\"from\":{\"image\":\"node\",\"tag\":\"20\"},\"onbuild\":{\"copy\":[{\"src\":[\".\"],\"dest\":\"/app\"}],\"run\":[\"npm ci\"]}}\n"
    );
}

#[test]
fn onbuild_depth_limit_returns_error() {
    let fixture = Fixture::new("FROM a\nONBUILD ONBUILD RUN x\n");

    let output = run(&[
        "--file",
        fixture.path_str(),
        "--max-onbuild-depth",
        "1",
    ]);
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(stdout_text(&output), "");
    assert!(stderr_text(&output).contains("ONBUILD triggers nested deeper than 1 levels"));
}

#[test]
fn invalid_instruction_value_returns_normalize_error() {
    let fixture = Fixture::new("FROM alpine\nENV ONLY_KEY\n");

    let output = run(&["--file", fixture.path_str()]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr_text(&output).contains("invalid ENV: missing value for key \"ONLY_KEY\""));
}

#[test]
fn missing_file_returns_io_error() {
    let path = unique_path("missing");
    let path = path.to_str().expect("temp path should be valid utf-8");

    let output = run(&["--file", path]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr_text(&output).contains("io error reading"));
}

#[test]
fn stdin_and_file_conflict_returns_usage_error() {
    let fixture = Fixture::new("FROM alpine\n");

    let output = run(&["--file", fixture.path_str(), "--stdin"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr_text(&output).contains("--stdin is mutually exclusive with --file"));
}

#[test]
fn empty_dockerfile_prints_empty_object() {
    let fixture = Fixture::new("# nothing here\n\n");

    let output = run(&["--file", fixture.path_str(), "--compact"]);
    assert!(output.status.success());
    assert_eq!(stdout_text(&output), "{}\n");
}

#[test]
fn verbose_logs_go_to_stderr() {
    let fixture = Fixture::new("FROM a\nHEALTHCHECK NONE\n");

    let output = run(&["--file", fixture.path_str(), "--compact", "--verbose"]);
    assert!(output.status.success());
    assert_eq!(stdout_text(&output), "{\"from\":{\"image\":\"a\"}}\n");
    assert!(stderr_text(&output).contains("halting on unknown instruction"));
}

#[test]
fn help_exits_successfully() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("Usage:"));
}

#[test]
fn generates_shell_completion() {
    let output = run(&["completion", "bash"]);
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("dftree"));
}

#[test]
fn unknown_flag_returns_usage_error() {
    let output = run(&["--nope"]);
    assert_eq!(output.status.code(), Some(64));
}
