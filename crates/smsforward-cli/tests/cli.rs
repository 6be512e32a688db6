use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

fn base_cmd(temp: &TempDir) -> assert_cmd::Command {
    cmd_in_region(temp, "US")
}

fn cmd_in_region(temp: &TempDir, region: &str) -> assert_cmd::Command {
    let db_path = temp.path().join("smsforward.sqlite3");
    let mut cmd = cargo_bin_cmd!("smsforward");
    cmd.env("XDG_CONFIG_HOME", temp.path().join("config"))
        .env_remove("RUST_LOG")
        .args(["--db-path", db_path.to_str().expect("db path")])
        .args(["--region", region]);
    cmd
}

fn run_output(temp: &TempDir, args: &[&str]) -> Output {
    base_cmd(temp).args(args).output().expect("run command")
}

fn run_cmd(temp: &TempDir, args: &[&str]) -> String {
    let output = run_output(temp, args);
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8(output.stdout).expect("utf8")
}

fn run_cmd_json(temp: &TempDir, args: &[&str]) -> Value {
    let output = base_cmd(temp)
        .arg("--json")
        .args(args)
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("parse json")
}

fn listen(temp: &TempDir, input: &str) -> Output {
    base_cmd(temp)
        .arg("listen")
        .write_stdin(input)
        .output()
        .expect("run listen")
}

fn stdout_lines(output: &Output) -> Vec<Value> {
    String::from_utf8(output.stdout.clone())
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[cfg(unix)]
fn write_config(dir: &Path, contents: &str) {
    use std::os::unix::fs::PermissionsExt;
    let app_dir = dir.join("config").join("smsforward");
    std::fs::create_dir_all(&app_dir).expect("config dir");
    let path = app_dir.join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).expect("chmod");
}

#[test]
fn normalize_prints_both_forms() {
    let temp = TempDir::new().expect("temp dir");
    let value = run_cmd_json(&temp, &["normalize", "202.555.0143"]);
    assert_eq!(value["unified"], "+12025550143");
    assert_eq!(value["visual"], "(202) 555-0143");
    assert_eq!(value["region"], "US");

    let output = cmd_in_region(&temp, "FR")
        .args(["--json", "normalize", "06 12 34 56 78"])
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    let french: Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(french["unified"], "+33612345678");
    assert_eq!(french["visual"], "06 12 34 56 78");
}

#[test]
fn normalize_rejects_garbage_with_invalid_input_code() {
    let temp = TempDir::new().expect("temp dir");
    let output = run_output(&temp, &["normalize", "hello"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("invalid phone number"));
}

#[test]
fn unknown_region_is_invalid_input() {
    let temp = TempDir::new().expect("temp dir");
    let output = cmd_in_region(&temp, "ZZ")
        .args(["normalize", "2025550143"])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn configure_activate_listen_deactivate_flow() {
    let temp = TempDir::new().expect("temp dir");

    let status = run_cmd_json(&temp, &["status"]);
    assert_eq!(status["state"], "disabled");
    assert!(status["rule"].is_null());

    let source = run_cmd_json(&temp, &["source", "+1 202 555 0143"]);
    assert_eq!(source["value"], "(202) 555-0143");
    assert_eq!(source["state"], "disabled");

    let destination = run_cmd_json(&temp, &["destination", "202-555-0187"]);
    assert_eq!(destination["value"], "(202) 555-0187");
    assert_eq!(destination["state"], "enabled");

    let armed = run_cmd_json(&temp, &["activate"]);
    assert_eq!(armed["state"], "armed");
    assert_eq!(armed["rule"]["activated"], true);
    assert_eq!(armed["rule"]["destination"]["unified"], "+12025550187");

    let input = concat!(
        "{\"sender\":\"+12025550143\",\"body\":\"hello\"}\n",
        "{\"sender\":\"+12025550100\",\"body\":\"not for you\"}\n",
        "{\"sender\":\"+12025550187\",\"body\":\"echo\"}\n",
        "{\"sender\":\"(202) 555-0143\",\"body\":\"second\"}\n",
    );
    let output = listen(&temp, input);
    assert!(output.status.success(), "listen failed: {:?}", output);
    let sent = stdout_lines(&output);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["to"], "+12025550187");
    assert_eq!(sent[0]["body"], "From (202) 555-0143:\nhello");
    assert_eq!(sent[1]["body"], "From (202) 555-0143:\nsecond");
    let summary = String::from_utf8(output.stderr).expect("utf8");
    assert!(summary.contains("forwarded 2"));
    assert!(summary.contains("discarded 2"));

    let removed = run_cmd_json(&temp, &["deactivate"]);
    assert_eq!(removed["removed"], true);
    assert_eq!(removed["state"], "disabled");

    let again = run_cmd(&temp, &["deactivate"]);
    assert!(again.contains("already disabled"));

    let status = run_cmd_json(&temp, &["status"]);
    assert_eq!(status["state"], "disabled");
    assert!(status["rule"].is_null());
}

#[test]
fn activate_with_inline_fields() {
    let temp = TempDir::new().expect("temp dir");
    let out = run_cmd(
        &temp,
        &[
            "activate",
            "--source",
            "2025550143",
            "--destination",
            "+12025550187",
        ],
    );
    assert!(out.contains("forwarding armed"));

    let status = run_cmd(&temp, &["status"]);
    assert!(status.contains("state: armed"));
    assert!(status.contains("(202) 555-0143 (+12025550143)"));
}

#[test]
fn activate_reports_missing_destination() {
    let temp = TempDir::new().expect("temp dir");
    run_cmd(&temp, &["source", "+12025550143"]);
    let output = run_output(&temp, &["activate"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("destination is required"));

    let status = run_cmd_json(&temp, &["status"]);
    assert_eq!(status["state"], "disabled");
}

#[test]
fn activate_rejects_same_source_and_destination() {
    let temp = TempDir::new().expect("temp dir");
    run_cmd(&temp, &["source", "(202) 555-0143"]);
    run_cmd(&temp, &["destination", "+1 202 555 0143"]);
    let output = run_output(&temp, &["activate"]);
    assert_eq!(output.status.code(), Some(3));

    let status = run_cmd_json(&temp, &["status"]);
    assert_eq!(status["state"], "enabled");
    assert_eq!(status["rule"]["activated"], false);
}

#[test]
fn activate_with_empty_inline_source_reports_missing_source() {
    let temp = TempDir::new().expect("temp dir");
    let output = run_output(
        &temp,
        &["activate", "--source", "", "--destination", "+12025550187"],
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("source is required"), "stderr: {stderr}");

    let status = run_cmd_json(&temp, &["status"]);
    assert_eq!(status["state"], "disabled");
    assert!(status["rule"].is_null());
}

#[test]
fn failed_inline_activate_stores_nothing() {
    let temp = TempDir::new().expect("temp dir");
    let output = run_output(
        &temp,
        &["activate", "--source", "(202) 555-0143", "--destination", "+1 202 555 0143"],
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("must be different"), "stderr: {stderr}");

    let output = run_output(
        &temp,
        &["activate", "--source", "+12025550143", "--destination", "nope"],
    );
    assert_eq!(output.status.code(), Some(3));

    let status = run_cmd_json(&temp, &["status"]);
    assert_eq!(status["state"], "disabled");
    assert!(status["rule"].is_null());
}

#[test]
fn armed_rule_cannot_be_edited() {
    let temp = TempDir::new().expect("temp dir");
    run_cmd(
        &temp,
        &["activate", "--source", "+12025550143", "--destination", "+12025550187"],
    );
    let output = run_output(&temp, &["destination", "+12025550111"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn pattern_source_forwards_alphanumeric_senders() {
    let temp = TempDir::new().expect("temp dir");
    let source = run_cmd_json(&temp, &["source", "--pattern", "BANK.*"]);
    assert_eq!(source["kind"], "pattern");
    assert_eq!(source["value"], "BANK.*");

    let output = run_output(&temp, &["source", "--pattern", "("]);
    assert_eq!(output.status.code(), Some(3));

    run_cmd(&temp, &["destination", "+12025550187"]);
    run_cmd(&temp, &["activate"]);

    let check = run_cmd_json(&temp, &["check", "BANKCORP", "--body", "balance 10"]);
    assert_eq!(check["forward"], true);
    assert_eq!(check["to"], "+12025550187");
    assert_eq!(check["body"], "From BANKCORP:\nbalance 10");

    let miss = run_cmd_json(&temp, &["check", "+12025550143"]);
    assert_eq!(miss["forward"], false);
    assert_eq!(miss["reason"], "no_match");
}

#[test]
fn check_without_rule_discards() {
    let temp = TempDir::new().expect("temp dir");
    let out = run_cmd(&temp, &["check", "+12025550143", "--body", "hi"]);
    assert!(out.contains("discard: no active rule"));
}

#[test]
fn listen_requires_armed_rule() {
    let temp = TempDir::new().expect("temp dir");
    run_cmd(&temp, &["source", "+12025550143"]);
    let output = listen(&temp, "{\"sender\":\"+12025550143\",\"body\":\"hi\"}\n");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn listen_skips_bad_lines_and_joins_segments() {
    let temp = TempDir::new().expect("temp dir");
    run_cmd(
        &temp,
        &["activate", "--source", "+12025550143", "--destination", "+12025550187"],
    );
    let input = concat!(
        "not json\n",
        "{\"sender\":\"+12025550143\",\"body\":\"world\",\"reference\":4,\"part\":2,\"parts\":2}\n",
        "{\"sender\":\"+12025550143\",\"body\":\"hello \",\"reference\":4,\"part\":1,\"parts\":2}\n",
    );
    let output = base_cmd(&temp)
        .args(["--json", "listen"])
        .write_stdin(input)
        .output()
        .expect("run listen");
    assert!(output.status.success(), "listen failed: {:?}", output);

    let sent = stdout_lines(&output);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["body"], "From (202) 555-0143:\nhello world");

    let stderr = String::from_utf8(output.stderr).expect("utf8");
    let summary: Value = stderr
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str(line).ok())
        .expect("summary");
    assert_eq!(summary["received"], 3);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["forwarded"], 1);
}

#[test]
fn listen_reads_input_file() {
    let temp = TempDir::new().expect("temp dir");
    run_cmd(
        &temp,
        &["activate", "--source", "+12025550143", "--destination", "+12025550187"],
    );
    let input = temp.path().join("inbox.jsonl");
    std::fs::write(&input, "{\"sender\":\"+12025550143\",\"body\":\"from file\"}\n")
        .expect("write input");

    let output = run_output(&temp, &["listen", "--input", input.to_str().expect("path")]);
    assert!(output.status.success(), "listen failed: {:?}", output);
    assert_eq!(stdout_lines(&output).len(), 1);

    let missing = temp.path().join("missing.jsonl");
    let output = run_output(&temp, &["listen", "--input", missing.to_str().expect("path")]);
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn own_number_from_config_is_never_forwarded() {
    let temp = TempDir::new().expect("temp dir");
    write_config(temp.path(), "own_number = \"+12025550111\"\n");
    run_cmd(&temp, &["source", "--pattern", r"\+1202.*"]);
    run_cmd(&temp, &["destination", "+12025550187"]);
    run_cmd(&temp, &["activate"]);

    let check = run_cmd_json(&temp, &["check", "+12025550111"]);
    assert_eq!(check["forward"], false);
    assert_eq!(check["reason"], "sender_is_self");
}

#[cfg(unix)]
#[test]
fn own_number_follows_region_override() {
    let temp = TempDir::new().expect("temp dir");
    write_config(
        temp.path(),
        "region = \"US\"\nown_number = \"06 11 11 11 11\"\n",
    );

    let run_fr = |args: &[&str]| {
        let output = cmd_in_region(&temp, "FR")
            .arg("--json")
            .args(args)
            .output()
            .expect("run command");
        assert!(output.status.success(), "command failed: {:?}", output);
        serde_json::from_slice::<Value>(&output.stdout).expect("parse json")
    };
    run_fr(&["source", "--pattern", ".*"]);
    run_fr(&["destination", "06 12 34 56 78"]);
    run_fr(&["activate"]);

    let check = run_fr(&["check", "+33611111111"]);
    assert_eq!(check["forward"], false);
    assert_eq!(check["reason"], "sender_is_self");

    // Without the override the national form is not a US number.
    let output = run_output(&temp, &["check", "+33611111111"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("own_number"), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn command_transport_failure_is_reported_and_relay_continues() {
    let temp = TempDir::new().expect("temp dir");
    write_config(
        temp.path(),
        "[transport]\nkind = \"command\"\ncommand = [\"sh\", \"-c\", \"cat > /dev/null; exit 1\"]\ntimeout_seconds = 5\n[notifications]\nenabled = true\nbackend = \"console\"\n",
    );
    run_cmd(
        &temp,
        &["activate", "--source", "+12025550143", "--destination", "+12025550187"],
    );

    let output = listen(
        &temp,
        concat!(
            "{\"sender\":\"+12025550143\",\"body\":\"one\"}\n",
            "{\"sender\":\"+12025550143\",\"body\":\"two\"}\n",
        ),
    );
    assert!(output.status.success(), "listen failed: {:?}", output);
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("forward failed"));
    assert!(stderr.contains("failed 2"));
}

#[test]
fn completions_do_not_touch_the_database() {
    let temp = TempDir::new().expect("temp dir");
    let out = run_cmd(&temp, &["completions", "bash"]);
    assert!(out.contains("smsforward"));
    assert!(!temp.path().join("smsforward.sqlite3").exists());
}
