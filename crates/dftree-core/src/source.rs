//! Dockerfile input: reading files and rebuilding logical instruction lines.

use std::path::Path;

use tracing::debug;

use crate::error::Error;

const CONTINUATION: char = '\\';

/// Reads a Dockerfile and splits it into raw lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>, Error> {
    let content = std::fs::read_to_string(path).map_err(|err| Error::read(path, err))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Joins continued lines into logical instruction lines.
///
/// Blank lines and lines starting with `#` are skipped. A line ending in `\`
/// (only the line terminator is ignored, so `\ ` does not continue) is glued
/// to the following lines without a separator, minus the marker itself. An
/// unterminated continuation at end of input is dropped.
pub fn logical_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut result = Vec::new();
    let mut pending = String::new();
    let mut pending_lines = 0usize;

    for line in lines {
        let line = line.as_ref().trim_end_matches(['\r', '\n']);
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        pending_lines += 1;
        match line.strip_suffix(CONTINUATION) {
            Some(head) => pending.push_str(head),
            None => {
                pending.push_str(line);
                result.push(std::mem::take(&mut pending));
                pending_lines = 0;
            }
        }
    }

    if pending_lines > 0 {
        debug!(
            lines = pending_lines,
            "dropping unterminated continuation at end of input"
        );
    }

    result
}
