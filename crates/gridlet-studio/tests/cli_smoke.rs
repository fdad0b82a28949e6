use std::path::PathBuf;
use std::process::Command;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gridlet-cli-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn studio() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gridlet-studio"))
}

#[test]
fn once_writes_png_for_new_source() {
    let dir = scratch_dir("once");
    let source = dir.join("color.js");
    let out = dir.join("frame.png");
    let _ = std::fs::remove_file(&source);
    let _ = std::fs::remove_file(&out);

    let status = studio()
        .arg("--source").arg(&source)
        .arg("--out").arg(&out)
        .arg("--once")
        .status()
        .unwrap();
    assert!(status.success());

    assert!(std::fs::read_to_string(&source).unwrap().contains("function color(x, y)"));
    let png = std::fs::read(&out).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn once_fails_on_syntax_error_without_writing() {
    let dir = scratch_dir("broken");
    let source = dir.join("color.js");
    let out = dir.join("frame.png");
    let _ = std::fs::remove_file(&out);
    std::fs::write(&source, "syntax error {{{").unwrap();

    let status = studio()
        .arg("--source").arg(&source)
        .arg("--out").arg(&out)
        .arg("--once")
        .arg("--log").arg("off")
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!out.exists());
}

#[test]
fn unknown_preset_is_rejected() {
    let dir = scratch_dir("preset");
    let output = studio()
        .arg("--source").arg(dir.join("color.js"))
        .arg("--preset").arg("zigzag")
        .arg("--once")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}
