//! Pod protocol message types
//!
//! Messages are bencode dictionaries. Invoke arguments and reply values are
//! JSON text embedded as bencode strings, since the pod announces the `json`
//! payload format in its describe reply.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const STATUS_DONE: &str = "done";
pub(crate) const STATUS_ERROR: &str = "error";

/// A request from the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
}

impl Message {
    /// Build an invoke request
    pub fn invoke(id: impl Into<String>, var: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            op: "invoke".to_string(),
            id: Some(id.into()),
            var: Some(var.into()),
            args: Some(args.into()),
        }
    }

    /// Build a request carrying only an op
    pub fn op(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            ..Default::default()
        }
    }
}

/// Reply to `describe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub format: String,
    pub namespaces: Vec<Namespace>,
    pub ops: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub vars: Vec<Var>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Successful reply to an invoke, or an asynchronous event on its channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub id: String,
    pub value: String,
    pub status: Vec<String>,
}

/// Failed invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub id: String,
    pub status: Vec<String>,
    #[serde(rename = "ex-message")]
    pub ex_message: String,
    #[serde(rename = "ex-data")]
    pub ex_data: String,
}

/// Whether a reply closes its invoke channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// More messages follow on this id (watch replies and events)
    Streaming,
    /// Final message for this id
    Done,
}

impl ReplyStatus {
    fn to_status(self) -> Vec<String> {
        match self {
            Self::Streaming => Vec::new(),
            Self::Done => vec![STATUS_DONE.to_string()],
        }
    }
}

/// Any message written to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Describe(DescribeResponse),
    Invoke(InvokeResponse),
    Error(ErrorResponse),
}

impl Outbound {
    pub fn invoke(id: impl Into<String>, value: impl Into<String>, status: ReplyStatus) -> Self {
        Self::Invoke(InvokeResponse {
            id: id.into(),
            value: value.into(),
            status: status.to_status(),
        })
    }

    pub fn error(id: impl Into<String>, ex_message: impl Into<String>) -> Self {
        Self::Error(ErrorResponse {
            id: id.into(),
            status: vec![STATUS_DONE.to_string(), STATUS_ERROR.to_string()],
            ex_message: ex_message.into(),
            ex_data: "{}".to_string(),
        })
    }

    /// Encode as one bencode frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_bencode::to_bytes(self)?)
    }
}
