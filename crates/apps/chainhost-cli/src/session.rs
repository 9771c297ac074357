use anyhow::{bail, Context};
use chainhost_client::{Chain, Engine};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// How long responses are still collected once the input is exhausted.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub sent: usize,
    pub rejected: usize,
    pub received: usize,
}

/// Sends every non-empty input line to `chain` and writes each response as one output line.
///
/// Rejected requests are logged and skipped unless the error leaves the client unusable. Once
/// the input ends, responses are drained until none arrives for `drain_grace`.
pub async fn run_session<E, R, W>(
    chain: &Chain<E>,
    input: R,
    output: &mut W,
    drain_grace: Duration,
) -> anyhow::Result<SessionSummary>
where
    E: Engine,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if !chain.is_json_rpc_enabled() {
        bail!("chain {} has JSON-RPC disabled", chain.id());
    }

    let mut summary = SessionSummary::default();
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                let request = line.trim();
                if request.is_empty() {
                    continue;
                }
                match chain.send_json_rpc(request) {
                    Ok(()) => summary.sent += 1,
                    Err(err) if err.is_terminal() => return Err(err.into()),
                    Err(err) => {
                        log::warn!("request rejected ({}): {err}", err.code());
                        summary.rejected += 1;
                    }
                }
            }
            response = chain.next_json_rpc_response() => {
                write_line(output, &response?).await?;
                summary.received += 1;
            }
        }
    }

    while let Ok(response) = tokio::time::timeout(drain_grace, chain.next_json_rpc_response()).await
    {
        write_line(output, &response?).await?;
        summary.received += 1;
    }
    log::debug!(
        "session finished: {} sent, {} rejected, {} received",
        summary.sent,
        summary.rejected,
        summary.received
    );
    Ok(summary)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> anyhow::Result<()> {
    output.write_all(line.as_bytes()).await.context("failed to write response")?;
    output.write_all(b"\n").await.context("failed to write response")?;
    output.flush().await.context("failed to write response")?;
    Ok(())
}
