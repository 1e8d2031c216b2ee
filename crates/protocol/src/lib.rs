#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! babashka pod protocol for the filesystem watcher
//!
//! Requests and replies are bencode dictionaries exchanged over stdin and
//! stdout. Payloads are JSON. The pod exposes `watch*` and `unwatch` in the
//! `pod.babashka.filewatcher` namespace, plus a client-side `watch` wrapper.

mod describe;
mod error;
mod handler;
mod message;
mod server;
mod writer;

pub use describe::{describe, NAMESPACE, UNWATCH_VAR, WATCH_VAR};
pub use error::{PodError, Result};
pub use handler::{Flow, PodHandler};
pub use message::{
    DescribeResponse, ErrorResponse, InvokeResponse, Message, Namespace, Outbound, ReplyStatus,
    Var,
};
pub use server::serve;
pub use writer::{write_responses, InvokeSink, ResponseWriter};
