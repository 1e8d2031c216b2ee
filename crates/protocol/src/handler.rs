//! Request routing
//!
//! One `PodHandler` processes host requests strictly one at a time. It owns the
//! watcher registry, so watch and unwatch never race with each other.

use crate::describe::{describe, NAMESPACE, UNWATCH_VAR, WATCH_VAR};
use crate::error::{PodError, Result};
use crate::message::{Message, Outbound, ReplyStatus};
use crate::writer::ResponseWriter;
use fswatch_core::config::WatcherConfig;
use fswatch_watcher::{WatchOptions, WatcherId, WatcherInfo, WatcherService};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the serve loop does after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Routes decoded requests to the watcher registry
#[derive(Debug)]
pub struct PodHandler {
    service: WatcherService,
    writer: ResponseWriter,
}

impl PodHandler {
    pub fn new(config: WatcherConfig, writer: ResponseWriter) -> Self {
        Self {
            service: WatcherService::new(config),
            writer,
        }
    }

    /// Handle one request. Failures are answered on the request's own id and
    /// never stop the loop; only `shutdown` does.
    pub fn handle(&mut self, message: Message) -> Flow {
        debug!("Handling op={} var={:?} id={:?}", message.op, message.var, message.id);

        match message.op.as_str() {
            "describe" => {
                self.writer.send(Outbound::Describe(describe()));
                Flow::Continue
            }
            "invoke" => {
                self.invoke(&message);
                Flow::Continue
            }
            "shutdown" => {
                self.shutdown();
                Flow::Shutdown
            }
            other => {
                let err = PodError::UnknownOp(other.to_string());
                warn!("{}", err);
                self.writer.reply_error(message.id.as_deref(), &err);
                Flow::Continue
            }
        }
    }

    /// Release every watcher
    pub fn shutdown(&mut self) {
        let released = self.service.cancel_all();
        info!("Shutting down, released {} watchers", released);
    }

    /// Registry backing this handler
    pub fn service(&self) -> &WatcherService {
        &self.service
    }

    fn invoke(&mut self, message: &Message) {
        let var = message.var.as_deref().unwrap_or_default();
        let args = message.args.as_deref().unwrap_or("[]");

        let name = var
            .strip_prefix(NAMESPACE)
            .and_then(|rest| rest.strip_prefix('/'));

        let result = match name {
            Some(WATCH_VAR) => self
                .watch(message.id.clone(), args)
                .map(|value| (value, ReplyStatus::Streaming)),
            Some(UNWATCH_VAR) => self
                .unwatch(args)
                .map(|value| (value, ReplyStatus::Done)),
            _ => Err(PodError::UnknownVar(var.to_string())),
        };

        match result {
            Ok((value, status)) => self.writer.reply(message.id.as_deref(), value, status),
            Err(e) => {
                warn!("Invoke of {} failed: {}", var, e);
                self.writer.reply_error(message.id.as_deref(), &e);
            }
        }
    }

    fn watch(&mut self, invoke_id: Option<String>, args: &str) -> Result<String> {
        let (path, options) = parse_watch_args(args)?;
        let sink = Arc::new(self.writer.sink(invoke_id));
        let id = self.service.create(&path, &options, sink)?;
        Ok(serde_json::to_string(&WatcherInfo::new(id))?)
    }

    fn unwatch(&mut self, args: &str) -> Result<String> {
        match parse_unwatch_args(args)? {
            Some(id) => {
                self.service.cancel(id);
            }
            None => debug!("Ignoring unwatch for non-positive id in {}", args),
        }
        Ok("null".to_string())
    }
}

/// `[path, opts]`; a missing or null `opts` means defaults
fn parse_watch_args(args: &str) -> Result<(PathBuf, WatchOptions)> {
    let mut values = serde_json::from_str::<Vec<Value>>(args)?.into_iter();

    let path: String = match values.next() {
        Some(value) => serde_json::from_value(value)?,
        None => {
            return Err(PodError::InvalidArgs(
                "watch* expects [path, opts]".to_string(),
            ))
        }
    };

    let options = match values.next() {
        None | Some(Value::Null) => WatchOptions::default(),
        Some(value) => serde_json::from_value(value)?,
    };

    Ok((PathBuf::from(path), options))
}

/// `[id]`. Ids are positive, so zero and negative ids name no watcher.
fn parse_unwatch_args(args: &str) -> Result<Option<WatcherId>> {
    let raw = serde_json::from_str::<Vec<i64>>(args)?
        .first()
        .copied()
        .ok_or_else(|| PodError::InvalidArgs("unwatch expects [watcher-id]".to_string()))?;

    Ok(u64::try_from(raw)
        .ok()
        .filter(|id| *id > 0)
        .map(WatcherId::new))
}
