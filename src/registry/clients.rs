use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Where to reach a client, if they linked a messenger account.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn notification_address(&self, client_id: Uuid) -> Option<String>;
}

#[derive(Default)]
pub struct InMemoryClientDirectory {
    addresses: DashMap<Uuid, String>,
}

impl InMemoryClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self, client_id: Uuid, address: impl Into<String>) {
        self.addresses.insert(client_id, address.into());
    }
}

#[async_trait]
impl ClientDirectory for InMemoryClientDirectory {
    async fn notification_address(&self, client_id: Uuid) -> Option<String> {
        self.addresses.get(&client_id).map(|a| a.clone())
    }
}
