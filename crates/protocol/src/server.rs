//! Serve loop
//!
//! Reads bencode requests from the input stream on a dedicated thread (the
//! read blocks, and must not hold up runtime shutdown), handles them one at a
//! time, and writes every reply and event through a single writer task.

use crate::error::{PodError, Result};
use crate::handler::{Flow, PodHandler};
use crate::message::Message;
use crate::writer::{write_responses, ResponseWriter};
use fswatch_core::config::Config;
use serde::Deserialize;
use std::io::{BufReader, Read};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Inbound requests buffered between the reader thread and the request loop
const INBOUND_CAPACITY: usize = 64;

/// Serve the pod protocol until the host sends `shutdown` or closes `input`.
///
/// Undecodable input ends the loop with an error; every watcher is released
/// before returning either way.
pub async fn serve<R, W>(config: &Config, input: R, output: W) -> Result<()>
where
    R: Read + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (writer, outbound_rx) = ResponseWriter::new();
    let writer_task = tokio::spawn(write_responses(outbound_rx, output));

    let mut handler = PodHandler::new(config.watcher.clone(), writer);
    let mut inbound = spawn_reader(input);

    info!("Pod ready");

    let mut outcome = Ok(());
    while let Some(item) = inbound.recv().await {
        match item {
            Ok(message) => {
                if handler.handle(message) == Flow::Shutdown {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to decode request: {}", e);
                outcome = Err(e);
                break;
            }
        }
    }

    handler.shutdown();
    drop(handler);

    match writer_task.await {
        Ok(result) => result?,
        Err(e) => return Err(PodError::Io(std::io::Error::other(e))),
    }

    outcome
}

/// Decode requests from `input` on a plain thread. End of input closes the
/// channel; a decode error is forwarded and ends the thread.
fn spawn_reader<R>(input: R) -> mpsc::Receiver<Result<Message>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);

    std::thread::spawn(move || {
        let mut de = serde_bencode::de::Deserializer::new(BufReader::new(input));
        loop {
            match Message::deserialize(&mut de) {
                Ok(message) => {
                    if tx.blocking_send(Ok(message)).is_err() {
                        break;
                    }
                }
                Err(serde_bencode::Error::EndOfStream) => {
                    debug!("Input closed");
                    break;
                }
                Err(e) => {
                    let _ = tx.blocking_send(Err(e.into()));
                    break;
                }
            }
        }
    });

    rx
}
