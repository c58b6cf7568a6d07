use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp file");
    tmp.write_all(contents.as_bytes()).expect("write temp file");
    tmp
}

fn open_world() -> NamedTempFile {
    write_temp(
        r#"<world>
  <player>
    <position>0 1 0</position>
  </player>
  <station>
    <position>0 1 -5</position>
  </station>
</world>
"#,
    )
}

#[test]
fn cli_walks_and_reports_final_state() {
    let world = open_world();
    let script = write_temp(
        "# walk straight ahead for half a second\n\
         press W\n\
         wait 0.5\n\
         release W\n\
         press U\n\
         tick 1\n",
    );
    let mut cmd = Command::cargo_bin("rollcraft").expect("binary exists");
    cmd.arg(world.path())
        .arg("--script")
        .arg(script.path())
        .arg("--seed")
        .arg("7");
    cmd.assert()
        .success()
        .stdout(contains("Loaded world with 0 colliders (station at 0.00, 1.00, -5.00)"))
        .stdout(contains("Running 5 script command(s)"))
        .stdout(contains("Final state after 31 frames"))
        .stdout(contains(" - player pos=(0.00, 1.00, -5.00)"))
        .stdout(contains(" - crafted: 0"))
        .stdout(contains(" - You have no cigarette to smoke!"));
}

#[test]
fn cli_uses_builtin_world_without_arguments() {
    let mut cmd = Command::cargo_bin("rollcraft").expect("binary exists");
    cmd.assert()
        .success()
        .stdout(contains("Loaded world with 11 colliders"))
        .stdout(contains(" - items in world: 4"));
}

#[test]
fn cli_reports_script_errors_with_line_numbers() {
    let script = write_temp("press W\nfly away\n");
    let mut cmd = Command::cargo_bin("rollcraft").expect("binary exists");
    cmd.arg("--script").arg(script.path());
    cmd.assert()
        .failure()
        .stderr(contains("line 2"))
        .stderr(contains("unknown command `fly`"));
}

#[test]
fn cli_rejects_unknown_flags() {
    let mut cmd = Command::cargo_bin("rollcraft").expect("binary exists");
    cmd.arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}
