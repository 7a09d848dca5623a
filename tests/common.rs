#![allow(dead_code, unreachable_pub, clippy::unwrap_used, clippy::missing_panics_doc, clippy::must_use_candidate)]
use async_trait::async_trait;
use ism_server::adapters::database::MessageStore;
use ism_server::domain::message::Message;
use ism_server::error::{AppError, Result};
use scylla::errors::ExecutionError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("ism_server=debug".parse().unwrap())
            .add_directive("scylla=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

type Key = (Uuid, Uuid, OffsetDateTime);

/// Keeps rows keyed and ordered like the `messages` table: partition, then clustering columns.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<BTreeMap<Key, Message>>,
}

impl InMemoryStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn save(&self, message: Message) -> Result<Message> {
        let key = (message.receiver_id, message.message_id, message.created_at);
        self.rows.lock().unwrap().insert(key, message.clone());
        Ok(message)
    }

    async fn get_by_id(&self, message_id: Uuid, receiver_id: Uuid) -> Result<Option<Message>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|((receiver, id, _), _)| *receiver == receiver_id && *id == message_id)
            .map(|(_, message)| message.clone()))
    }
}

/// Every call fails the way an unreachable cluster would.
#[derive(Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl MessageStore for UnavailableStore {
    async fn save(&self, _message: Message) -> Result<Message> {
        Err(AppError::Database(ExecutionError::EmptyPlan))
    }

    async fn get_by_id(&self, _message_id: Uuid, _receiver_id: Uuid) -> Result<Option<Message>> {
        Err(AppError::Database(ExecutionError::EmptyPlan))
    }
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub store: Arc<dyn MessageStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(InMemoryStore::default())).await
    }

    pub async fn spawn_with_store(store: Arc<dyn MessageStore>) -> Self {
        setup_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let router = ism_server::api::app_router(ism_server::build_state(Arc::clone(&store)));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { server_url: format!("http://{addr}"), client: reqwest::Client::new(), store }
    }

    pub async fn post_message(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client.post(format!("{}/messages", self.server_url)).json(body).send().await.unwrap()
    }

    pub async fn get_message(&self, receiver_id: &str, message_id: &str) -> reqwest::Response {
        self.client.get(format!("{}/messages/{receiver_id}/{message_id}", self.server_url)).send().await.unwrap()
    }
}
