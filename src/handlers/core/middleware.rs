//! Response middleware for routing flushed output.
//!
//! Direct forwards to the connection writer; Capturing buffers lines so
//! tests (and dry runs) can inspect what would have been sent.
//!
//! # Slow writer protection
//!
//! The writer task paces lines to the server and may fall behind. A send that
//! cannot enqueue within [`SEND_TIMEOUT`] is dropped with a warning rather
//! than stalling the dispatch loop.

use super::output::Outbound;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

/// Timeout for enqueueing one line on a full outbound queue.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SendError {
    #[error("outbound queue closed")]
    Closed,
    #[error("outbound queue full for {0:?}")]
    Timeout(Duration),
}

/// Where flushed lines go.
#[derive(Debug, Clone)]
pub enum ResponseMiddleware {
    Direct(mpsc::Sender<Outbound>),
    Capturing(Arc<Mutex<Vec<Outbound>>>),
}

impl ResponseMiddleware {
    /// A capturing middleware and the buffer it fills.
    pub fn capturing() -> (Self, Arc<Mutex<Vec<Outbound>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Self::Capturing(Arc::clone(&buf)), buf)
    }

    /// Send or buffer one line depending on middleware mode.
    pub async fn send(&self, line: Outbound) -> Result<(), SendError> {
        match self {
            Self::Direct(tx) => match tokio::time::timeout(SEND_TIMEOUT, tx.send(line)).await {
                Ok(Ok(())) => {
                    crate::metrics::record_message_sent();
                    Ok(())
                }
                Ok(Err(_)) => Err(SendError::Closed),
                Err(_timeout) => {
                    tracing::warn!(
                        "outbound queue full: writer not draining (timeout after {:?})",
                        SEND_TIMEOUT
                    );
                    Err(SendError::Timeout(SEND_TIMEOUT))
                }
            },
            Self::Capturing(buf) => {
                buf.lock().await.push(line);
                Ok(())
            }
        }
    }

    /// Send several lines in order, stopping at the first failure.
    pub async fn send_all(&self, lines: Vec<Outbound>) -> Result<(), SendError> {
        for line in lines {
            self.send(line).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capturing_collects_in_order() {
        let (sink, buf) = ResponseMiddleware::capturing();
        sink.send_all(vec![Outbound::new("#a", "1"), Outbound::new("#a", "2")])
            .await
            .unwrap();
        let lines = buf.lock().await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "2");
    }

    #[tokio::test]
    async fn test_direct_reports_closed_queue() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ResponseMiddleware::Direct(tx);
        assert!(matches!(
            sink.send(Outbound::new("#a", "x")).await,
            Err(SendError::Closed)
        ));
    }
}
