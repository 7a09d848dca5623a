pub mod message_repo;
pub mod records;
pub mod schema;

use crate::config::DatabaseConfig;
use crate::domain::message::Message;
use crate::error::Result;
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::errors::NewSessionError;
use uuid::Uuid;

pub use message_repo::MessageRepository;

/// Durable storage and point lookup of messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Inserts a single row. Saving the same `(receiver_id, message_id, created_at)` again overwrites it.
    ///
    /// `created_at` is stored with millisecond resolution; anything finer is dropped, so callers
    /// should build messages with `Message::new`, which truncates up front.
    async fn save(&self, message: Message) -> Result<Message>;

    /// Looks up one message inside the receiver's partition. `Ok(None)` means no such row.
    async fn get_by_id(&self, message_id: Uuid, receiver_id: Uuid) -> Result<Option<Message>>;
}

/// Opens the shared session to the cluster. No keyspace is selected yet.
///
/// # Errors
/// Returns `NewSessionError` if the contact point is unreachable or authentication fails.
pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Session, NewSessionError> {
    let contact_point = config.contact_point();
    let session = SessionBuilder::new()
        .known_node(&contact_point)
        .user(&config.user, &config.password)
        .build()
        .await?;

    tracing::info!(contact_point = %contact_point, "Connected to message database");
    Ok(session)
}
