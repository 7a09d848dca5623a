use crate::domain::message::{Message, truncate_to_millis};
use crate::error::AppError;
use scylla::{DeserializeRow, SerializeRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Row layout of the `messages` table. `msg_type` is plain text and `created_at` has millisecond resolution.
#[derive(Debug, Clone, SerializeRow, DeserializeRow)]
pub(crate) struct MessageRecord {
    pub(crate) message_id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) receiver_id: Uuid,
    pub(crate) msg_body: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) msg_type: String,
    pub(crate) has_read: bool,
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.message_id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            msg_body: message.msg_body,
            created_at: truncate_to_millis(message.created_at),
            msg_type: message.msg_type.to_string(),
            has_read: message.has_read,
        }
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = AppError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let msg_type = record.msg_type.parse().map_err(|e| AppError::RowDecode(format!("{e}")))?;

        Ok(Self {
            message_id: record.message_id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            msg_body: record.msg_body,
            created_at: record.created_at,
            msg_type,
            has_read: record.has_read,
        })
    }
}
