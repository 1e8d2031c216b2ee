//! Outbound message path
//!
//! Replies from the request loop and events from every forwarding task go
//! through one channel to a single writer that owns the output stream, so
//! frames never interleave.

use crate::error::{PodError, Result};
use crate::message::{Outbound, ReplyStatus};
use fswatch_watcher::{EventSink, WatchEvent};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Cloneable handle for queueing outbound messages
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ResponseWriter {
    /// Create a writer handle and the receiving end drained by [`write_responses`]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a message
    pub fn send(&self, outbound: Outbound) {
        if self.tx.send(outbound).is_err() {
            trace!("Output closed, dropping message");
        }
    }

    /// Queue an invoke reply. Requests without an id get no reply.
    pub fn reply(&self, id: Option<&str>, value: impl Into<String>, status: ReplyStatus) {
        if let Some(id) = id {
            self.send(Outbound::invoke(id, value, status));
        }
    }

    /// Queue an error reply. Requests without an id get no reply.
    pub fn reply_error(&self, id: Option<&str>, err: &PodError) {
        if let Some(id) = id {
            self.send(Outbound::error(id, err.ex_message()));
        }
    }

    /// Sink delivering watcher events on the channel of invoke `id`
    pub fn sink(&self, id: Option<String>) -> InvokeSink {
        InvokeSink {
            id,
            writer: self.clone(),
        }
    }
}

/// Event sink bound to one `watch*` invocation
#[derive(Debug, Clone)]
pub struct InvokeSink {
    id: Option<String>,
    writer: ResponseWriter,
}

impl EventSink for InvokeSink {
    fn emit(&self, event: WatchEvent) {
        match serde_json::to_string(&event) {
            Ok(value) => self
                .writer
                .reply(self.id.as_deref(), value, ReplyStatus::Streaming),
            Err(e) => warn!("Failed to encode event {:?}: {}", event, e),
        }
    }
}

/// Write queued messages to `out` until every [`ResponseWriter`] is dropped
pub async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<Outbound>, mut out: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(outbound) = rx.recv().await {
        let frame = outbound.encode()?;
        out.write_all(&frame).await?;
        out.flush().await?;
    }
    debug!("Response writer stopped");
    Ok(())
}
