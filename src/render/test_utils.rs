//! Shared test utilities for renderer tests
//!
//! Fake renderers are small shell scripts written into a temp directory, so
//! tests exercise real process spawning without the actual tools installed.

use std::path::{Path, PathBuf};

/// PNG signature followed by a marker payload
pub const FAKE_PNG_PRINTF: &str = r"printf '\211PNG\r\n\032\nfake-image'";

/// Write an executable `/bin/sh` script and return its path
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake tool");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake tool");
    }
    path
}

/// Code renderer stand-in: records its arguments, writes a PNG into `--save-to`
pub fn fake_code_tool(dir: &Path, args_log: &Path) -> PathBuf {
    let body = format!(
        r#"printf '%s\n' "$@" > '{log}'
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --save-to) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
{png} > "$out/carbon-$$.png""#,
        log = args_log.display(),
        png = FAKE_PNG_PRINTF,
    );
    fake_tool(dir, "fake-carbon", &body)
}

/// Diagram renderer stand-in: records arguments, copies `-c` next to the log,
/// writes a PNG to `-o`
pub fn fake_diagram_tool(dir: &Path, args_log: &Path) -> PathBuf {
    let body = format!(
        r#"printf '%s\n' "$@" > '{log}'
out=""
cfg=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -c) cfg="$2"; shift 2 ;;
    *) shift ;;
  esac
done
cp "$cfg" '{log}.config.json'
{png} > "$out""#,
        log = args_log.display(),
        png = FAKE_PNG_PRINTF,
    );
    fake_tool(dir, "fake-mmdc", &body)
}

/// Read back the argument log written by a fake tool
pub fn read_args(args_log: &Path) -> Vec<String> {
    std::fs::read_to_string(args_log)
        .expect("read args log")
        .lines()
        .map(str::to_string)
        .collect()
}
