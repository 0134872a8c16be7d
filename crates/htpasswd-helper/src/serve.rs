//! Request loop.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::authenticator::Authenticator;
use crate::error::HelperError;

/// Answer request lines from `reader` until EOF or `shutdown` fires.
///
/// Each reply is flushed before the next line is read. Digest work runs on
/// the blocking pool so high `rounds` values do not stall the runtime.
/// Returns the number of requests answered.
pub async fn serve<R, W>(
    auth: Arc<Authenticator>,
    reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> Result<u64, HelperError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0u64;

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("shutdown requested, stopping request loop");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("input closed");
            break;
        };

        let auth = Arc::clone(&auth);
        let reply = tokio::task::spawn_blocking(move || auth.handle_line(&line)).await?;

        writer.write_all(reply.as_str().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        answered += 1;
    }

    Ok(answered)
}
