use scylla::client::session::Session;
use scylla::errors::{ExecutionError, UseKeyspaceError};
use thiserror::Error;

pub const CREATE_MESSAGES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS messages (
        message_id UUID,
        sender_id UUID,
        receiver_id UUID,
        msg_body TEXT,
        created_at TIMESTAMP,
        msg_type TEXT,
        has_read BOOLEAN,
        PRIMARY KEY ((receiver_id), message_id, created_at)
    )";

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to create keyspace {keyspace}: {source}")]
    CreateKeyspace { keyspace: String, source: ExecutionError },
    #[error("failed to use keyspace {keyspace}: {source}")]
    UseKeyspace { keyspace: String, source: UseKeyspaceError },
    #[error("failed to create messages table: {0}")]
    CreateTable(ExecutionError),
}

#[must_use]
pub fn create_keyspace_statement(keyspace: &str) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} \
         WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
    )
}

/// Creates the keyspace and the `messages` table if they are missing, leaving the session on the keyspace.
///
/// Safe to run against an already provisioned cluster.
///
/// # Errors
/// Returns `SchemaError` if any DDL statement or the keyspace switch fails.
#[tracing::instrument(skip(session))]
pub async fn bootstrap(session: &Session, keyspace: &str) -> Result<(), SchemaError> {
    session
        .query_unpaged(create_keyspace_statement(keyspace), ())
        .await
        .map_err(|source| SchemaError::CreateKeyspace { keyspace: keyspace.to_string(), source })?;
    tracing::info!(keyspace, "Keyspace ready");

    use_keyspace(session, keyspace).await?;

    session.query_unpaged(CREATE_MESSAGES_TABLE, ()).await.map_err(SchemaError::CreateTable)?;
    tracing::info!("Table messages ready");

    Ok(())
}

/// Switches the session to an existing keyspace.
///
/// # Errors
/// Returns `SchemaError::UseKeyspace` if the keyspace does not exist.
pub async fn use_keyspace(session: &Session, keyspace: &str) -> Result<(), SchemaError> {
    session
        .use_keyspace(keyspace, true)
        .await
        .map_err(|source| SchemaError::UseKeyspace { keyspace: keyspace.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_statement_uses_single_replica() {
        let stmt = create_keyspace_statement("messaging");

        assert!(stmt.starts_with("CREATE KEYSPACE IF NOT EXISTS messaging "));
        assert!(stmt.contains("'class': 'SimpleStrategy'"));
        assert!(stmt.contains("'replication_factor': 1"));
    }

    #[test]
    fn test_table_primary_key() {
        assert!(CREATE_MESSAGES_TABLE.contains("IF NOT EXISTS messages"));
        assert!(CREATE_MESSAGES_TABLE.contains("PRIMARY KEY ((receiver_id), message_id, created_at)"));
    }
}
