use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Video,
    Text,
    Link,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Text => "Text",
            Self::Link => "Link",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message type: {0}")]
pub struct UnknownMessageType(pub String);

impl FromStr for MessageType {
    type Err = UnknownMessageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Video" => Ok(Self::Video),
            "Text" => Ok(Self::Text),
            "Link" => Ok(Self::Link),
            other => Err(UnknownMessageType(other.to_string())),
        }
    }
}

/// A stored message. `receiver_id` is the partition key, `(message_id, created_at)` the clustering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub msg_body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub msg_type: MessageType,
    pub has_read: bool,
}

/// A message as submitted by a client, before the writer assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub msg_body: String,
    pub msg_type: MessageType,
}

impl Message {
    /// Builds an unread message. `created_at` is truncated to the millisecond, the resolution of a CQL timestamp.
    #[must_use]
    pub fn new(message_id: Uuid, new: NewMessage, created_at: OffsetDateTime) -> Self {
        Self {
            message_id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            msg_body: new.msg_body,
            created_at: truncate_to_millis(created_at),
            msg_type: new.msg_type,
            has_read: false,
        }
    }
}

#[must_use]
pub fn truncate_to_millis(ts: OffsetDateTime) -> OffsetDateTime {
    let millis = ts.millisecond();
    ts.replace_millisecond(millis).unwrap_or(ts)
}
