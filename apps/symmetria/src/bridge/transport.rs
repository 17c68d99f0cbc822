//! # Line Transport
//!
//! One JSON request per line in, one JSON response per line out.
//!
//! The reader is either stdin or an append-only request file. With
//! `follow` set, end of input is not the end of the channel: the transport
//! sleeps for the poll interval and looks for appended lines, keeping any
//! partial line until its newline arrives. The channel ends on `quit`, or on
//! end of input when not following.

use super::CommandBridge;
use super::protocol::Response;
use std::path::Path;
use std::time::Duration;
use symmetria_core::SymmetriaError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// How a channel run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSummary {
    /// Requests handled, including failed ones.
    pub handled: u64,
    /// True when the run ended because of `quit`.
    pub terminated: bool,
}

/// Drive `bridge` from `reader`, writing responses to `writer`.
pub async fn run_channel<R, W>(
    bridge: &mut CommandBridge,
    mut reader: R,
    mut writer: W,
    follow: Option<Duration>,
) -> Result<ChannelSummary, SymmetriaError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = ChannelSummary::default();
    let mut pending = String::new();

    loop {
        let read = reader
            .read_line(&mut pending)
            .await
            .map_err(|e| SymmetriaError::IoError(format!("read failed: {}", e)))?;

        let complete = pending.ends_with('\n');
        if !complete {
            if read > 0 {
                // Partial line; the rest may follow.
                continue;
            }
            match follow {
                Some(interval) => {
                    tokio::time::sleep(interval).await;
                    continue;
                }
                None if pending.trim().is_empty() => break,
                None => {}
            }
        }

        let line = std::mem::take(&mut pending);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = bridge.handle_line(line);
        summary.handled += 1;
        write_response(&mut writer, &response).await?;

        if bridge.is_terminated() {
            summary.terminated = true;
            break;
        }
        if !complete {
            break;
        }
    }

    tracing::info!(
        handled = summary.handled,
        terminated = summary.terminated,
        "line channel closed"
    );
    Ok(summary)
}

async fn write_response<W>(writer: &mut W, response: &Response) -> Result<(), SymmetriaError>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(response)
        .map_err(|e| SymmetriaError::SerializationError(e.to_string()))?;
    encoded.push(b'\n');
    writer
        .write_all(&encoded)
        .await
        .map_err(|e| SymmetriaError::IoError(format!("write failed: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| SymmetriaError::IoError(format!("flush failed: {}", e)))
}

/// Serve the bridge over stdin/stdout.
pub async fn run_stdio(bridge: &mut CommandBridge) -> Result<ChannelSummary, SymmetriaError> {
    let reader = BufReader::new(tokio::io::stdin());
    run_channel(bridge, reader, tokio::io::stdout(), None).await
}

/// Serve the bridge from a request file. Responses go to `output` when
/// given (appended), otherwise to stdout.
pub async fn run_file(
    bridge: &mut CommandBridge,
    requests: &Path,
    output: Option<&Path>,
    follow: Option<Duration>,
) -> Result<ChannelSummary, SymmetriaError> {
    let file = tokio::fs::File::open(requests).await.map_err(|e| {
        SymmetriaError::IoError(format!(
            "cannot open request file '{}': {}",
            requests.display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);
    tracing::info!(
        requests = %requests.display(),
        follow = follow.is_some(),
        "reading requests from file"
    );

    match output {
        Some(path) => {
            let out = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
                .map_err(|e| {
                    SymmetriaError::IoError(format!(
                        "cannot open response file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
            run_channel(bridge, reader, out, follow).await
        }
        None => run_channel(bridge, reader, tokio::io::stdout(), follow).await,
    }
}

// =============================================================================
// TESTS
// =============================================================================
