use crate::adapters::database::MessageStore;
use crate::adapters::database::records::MessageRecord;
use crate::domain::message::Message;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::errors::PrepareError;
use scylla::statement::Consistency;
use scylla::statement::prepared::PreparedStatement;
use std::sync::Arc;
use uuid::Uuid;

const INSERT_MESSAGE: &str = "INSERT INTO messages (message_id, sender_id, receiver_id, msg_body, created_at, msg_type, has_read) \
     VALUES (?, ?, ?, ?, ?, ?, ?)";

const SELECT_MESSAGE: &str = "SELECT message_id, sender_id, receiver_id, msg_body, created_at, msg_type, has_read \
     FROM messages WHERE receiver_id = ? AND message_id = ? LIMIT 1";

/// `MessageStore` backed by the `messages` table. Both statements run at consistency `ONE`.
#[derive(Clone, Debug)]
pub struct MessageRepository {
    session: Arc<Session>,
    insert: PreparedStatement,
    select: PreparedStatement,
}

impl MessageRepository {
    /// Prepares the insert and lookup statements. The session must already be using the keyspace.
    ///
    /// # Errors
    /// Returns `PrepareError` if the table does not exist or the cluster rejects the statements.
    pub async fn new(session: Arc<Session>) -> std::result::Result<Self, PrepareError> {
        let mut insert = session.prepare(INSERT_MESSAGE).await?;
        insert.set_consistency(Consistency::One);

        let mut select = session.prepare(SELECT_MESSAGE).await?;
        select.set_consistency(Consistency::One);

        Ok(Self { session, insert, select })
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    #[tracing::instrument(
        level = "debug",
        err(level = "warn"),
        skip(self, message),
        fields(receiver_id = %message.receiver_id, message_id = %message.message_id)
    )]
    async fn save(&self, message: Message) -> Result<Message> {
        let record = MessageRecord::from(message.clone());
        self.session.execute_unpaged(&self.insert, &record).await?;
        Ok(message)
    }

    #[tracing::instrument(level = "debug", err(level = "warn"), skip(self))]
    async fn get_by_id(&self, message_id: Uuid, receiver_id: Uuid) -> Result<Option<Message>> {
        let result = self.session.execute_unpaged(&self.select, (receiver_id, message_id)).await?;

        let rows = result.into_rows_result().map_err(|e| AppError::RowDecode(e.to_string()))?;
        let record = rows.maybe_first_row::<MessageRecord>().map_err(|e| AppError::RowDecode(e.to_string()))?;

        record.map(Message::try_from).transpose()
    }
}
