//! Remote verification protocol.
//!
//! After a submission passes its local suite it is checked against a hidden
//! test case. The server hands out an input (with a request id), the client
//! runs the submission on it and sends back the encoded answer.
//!
//! The transport is not part of this crate: implement [`GradingServer`] over
//! whatever client is available. The reply parsers below accept the JSON
//! bodies the server sends.

mod error;

pub use error::RemoteProtocolError;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::codec::TaggedValue;
use crate::runner::TaskKind;

/// Operations the runner needs from a grading server.
pub trait GradingServer {
    /// Fetch the hidden input for `function`.
    fn get_test_input(
        &self,
        username: &str,
        function: &str,
    ) -> Result<RemoteTestInput, RemoteProtocolError>;

    /// Submit `answer` (a serialized [`TaggedValue`]) for the input issued
    /// under `request_id`.
    fn check_answer(
        &self,
        username: &str,
        function: &str,
        request_id: &str,
        answer: &str,
    ) -> Result<CheckAnswerReply, RemoteProtocolError>;
}

/// Hidden test input issued by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTestInput {
    pub input: BTreeMap<String, TaggedValue>,
    #[serde(alias = "task_type")]
    pub task_kind: TaskKind,
    /// Identifies the issued input when the answer is checked.
    #[serde(rename = "ipd", deserialize_with = "string_or_number")]
    pub request_id: String,
}

/// Verdict on a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAnswerReply {
    pub success: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Error { error: String },
    Ok(T),
}

fn parse_reply<T>(body: &str) -> Result<T, RemoteProtocolError>
where
    T: for<'de> Deserialize<'de>,
{
    match serde_json::from_str::<Reply<T>>(body) {
        Ok(Reply::Ok(reply)) => Ok(reply),
        Ok(Reply::Error { error }) => Err(RemoteProtocolError::Server(error)),
        Err(e) => Err(RemoteProtocolError::MalformedReply(e.to_string())),
    }
}

/// Parse the body of a test input reply.
pub fn parse_test_input_reply(body: &str) -> Result<RemoteTestInput, RemoteProtocolError> {
    parse_reply(body)
}

/// Parse a check answer reply. Any status other than 200 is an error.
pub fn parse_check_answer_reply(
    status: u16,
    body: &str,
) -> Result<CheckAnswerReply, RemoteProtocolError> {
    if status != 200 {
        return Err(RemoteProtocolError::Status(status));
    }
    parse_reply(body)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number request id, got {}",
            other
        ))),
    }
}
