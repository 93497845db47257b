//! Child process plumbing shared by package manager adapters

use crate::error::{ModlayerError, ModlayerResult};
use std::io;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Max number of output lines to include in failure messages.
const ERROR_TAIL_LINES: usize = 50;

/// Return the last `ERROR_TAIL_LINES` lines of combined output.
pub(crate) fn error_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Turn one raw line into text, dropping the line terminator.
///
/// Bytes that are not valid UTF-8 become U+FFFD.
fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Handle one `read_until` result for a pipe; returns whether it hit EOF.
///
/// `buf` keeps bytes from a read that `select!` cancelled, so anything
/// left in it at EOF is the final unterminated line.
fn take_line(
    read: io::Result<usize>,
    buf: &mut Vec<u8>,
    on_output: &(dyn Fn(&str) + Send + Sync),
    output: &mut Vec<String>,
) -> ModlayerResult<bool> {
    let n = read.map_err(|e| ModlayerError::io("reading child output", e))?;
    if !buf.is_empty() {
        let line = decode_line(buf);
        buf.clear();
        on_output(&line);
        output.push(line);
    }
    Ok(n == 0)
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected lines in the order they arrived. Both pipes must
/// have been configured with `Stdio::piped()`. Both pipes are drained to
/// EOF whatever their encoding, so the child never blocks on a full pipe.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(&str) + Send + Sync),
) -> ModlayerResult<Vec<String>> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ModlayerError::Internal("child stderr not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ModlayerError::Internal("child stdout not piped".to_string()))?;

    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_buf = Vec::new();
    let mut stdout_buf = Vec::new();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            read = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_done => {
                stderr_done = take_line(read, &mut stderr_buf, on_output, &mut all_output)?;
            }
            read = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_done => {
                stdout_done = take_line(read, &mut stdout_buf, on_output, &mut all_output)?;
            }
        }
    }

    Ok(all_output)
}
