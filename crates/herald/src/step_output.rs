use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

pub(crate) const THREAD_ID_OUTPUT: &str = "thread-id";

/// Publishes `thread-id` on stdout and, when configured, to the step output file.
pub(crate) fn emit_thread_id(output_file: Option<&Path>, thread_ts: &str) -> Result<()> {
    let line = format!("{THREAD_ID_OUTPUT}={thread_ts}");
    println!("{line}");
    let Some(path) = output_file.filter(|path| !path.as_os_str().is_empty()) else {
        return Ok(());
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open step output file {}", path.display()))?;
    writeln!(file, "{line}")
        .with_context(|| format!("failed to write step output file {}", path.display()))?;
    Ok(())
}
