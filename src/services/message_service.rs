use crate::adapters::database::MessageStore;
use crate::domain::message::{Message, NewMessage};
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) saved_total: Counter<u64>,
    pub(crate) fetched_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("ism-server");
        Self {
            saved_total: meter
                .u64_counter("ism_messages_saved_total")
                .with_description("Total message insert attempts")
                .build(),
            fetched_total: meter
                .u64_counter("ism_messages_fetched_total")
                .with_description("Total message lookups")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    node_id: [u8; 6],
    metrics: Metrics,
}

impl MessageService {
    /// Creates the service. The node id embedded in generated v1 identifiers is random per instance.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store, node_id: rand::random(), metrics: Metrics::new() }
    }

    /// Assigns a time-ordered id and a creation timestamp, then persists the message.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, new),
        fields(receiver_id = %new.receiver_id, msg_type = %new.msg_type, message_id = tracing::field::Empty)
    )]
    pub async fn send(&self, new: NewMessage) -> Result<Message> {
        let message_id = Uuid::now_v1(&self.node_id);
        tracing::Span::current().record("message_id", tracing::field::display(message_id));

        let message = Message::new(message_id, new, OffsetDateTime::now_utc());

        match self.store.save(message).await {
            Ok(saved) => {
                tracing::debug!("Message stored");
                self.metrics.saved_total.add(1, &[KeyValue::new("status", "success")]);
                Ok(saved)
            }
            Err(e) => {
                self.metrics.saved_total.add(1, &[KeyValue::new("status", "failure")]);
                Err(e)
            }
        }
    }

    /// Fetches one message from the receiver's partition.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if no such message exists.
    /// Returns `AppError::Database` if the lookup fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn get(&self, message_id: Uuid, receiver_id: Uuid) -> Result<Message> {
        let result = self.store.get_by_id(message_id, receiver_id).await;

        let status = match &result {
            Ok(Some(_)) => "found",
            Ok(None) => "not_found",
            Err(_) => "failure",
        };
        self.metrics.fetched_total.add(1, &[KeyValue::new("status", status)]);

        result?.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::MockMessageStore;
    use crate::domain::message::MessageType;
    use mockall::predicate::eq;
    use scylla::errors::ExecutionError;

    fn new_message(receiver_id: Uuid) -> NewMessage {
        NewMessage {
            sender_id: Uuid::new_v4(),
            receiver_id,
            msg_body: "hello".to_string(),
            msg_type: MessageType::Text,
        }
    }

    #[tokio::test]
    async fn test_send_assigns_time_based_id() {
        let mut store = MockMessageStore::new();
        store.expect_save().times(2).returning(Ok);

        let service = MessageService::new(Arc::new(store));
        let receiver = Uuid::new_v4();

        let first = service.send(new_message(receiver)).await.unwrap();
        let second = service.send(new_message(receiver)).await.unwrap();

        assert_eq!(first.message_id.get_version_num(), 1);
        assert_eq!(second.message_id.get_version_num(), 1);
        assert_ne!(first.message_id, second.message_id);

        let ticks = |id: Uuid| id.get_timestamp().unwrap().to_gregorian().0;
        assert!(ticks(second.message_id) >= ticks(first.message_id));

        assert_eq!(first.receiver_id, receiver);
        assert_eq!(first.msg_body, "hello");
        assert_eq!(first.msg_type, MessageType::Text);
        assert!(!first.has_read);
    }

    #[tokio::test]
    async fn test_send_propagates_store_error() {
        let mut store = MockMessageStore::new();
        store.expect_save().returning(|_| Err(AppError::Database(ExecutionError::EmptyPlan)));

        let service = MessageService::new(Arc::new(store));
        let result = service.send(new_message(Uuid::new_v4())).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let message_id = Uuid::new_v4();
        let receiver_id = Uuid::new_v4();

        let mut store = MockMessageStore::new();
        store.expect_get_by_id().with(eq(message_id), eq(receiver_id)).times(1).returning(|_, _| Ok(None));

        let service = MessageService::new(Arc::new(store));
        let result = service.get(message_id, receiver_id).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_returns_stored_message() {
        let receiver_id = Uuid::new_v4();
        let stored = Message::new(Uuid::new_v4(), new_message(receiver_id), OffsetDateTime::now_utc());
        let returned = stored.clone();

        let mut store = MockMessageStore::new();
        store.expect_get_by_id().returning(move |_, _| Ok(Some(returned.clone())));

        let service = MessageService::new(Arc::new(store));
        let message = service.get(stored.message_id, receiver_id).await.unwrap();

        assert_eq!(message, stored);
    }
}
