// libs/scheduling-cell/src/services/directory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Provider existence and role lookup, owned by the external
/// user-management collaborator. The engine only consumes it.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn provider_exists(&self, id: Uuid) -> bool;

    /// Whether the id refers to a resource that can hold a calendar
    /// (a clinician, as opposed to e.g. an administrative account).
    async fn is_schedulable_role(&self, id: Uuid) -> bool;
}

/// Directory backed by an in-process table. Used for wiring the API
/// binding and for tests; a deployment would implement the trait
/// against the user-management service instead.
pub struct StaticProviderDirectory {
    providers: RwLock<HashMap<Uuid, bool>>,
}

impl StaticProviderDirectory {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, id: Uuid, schedulable: bool) {
        self.providers.write().await.insert(id, schedulable);
    }
}

impl Default for StaticProviderDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderDirectory for StaticProviderDirectory {
    async fn provider_exists(&self, id: Uuid) -> bool {
        self.providers.read().await.contains_key(&id)
    }

    async fn is_schedulable_role(&self, id: Uuid) -> bool {
        self.providers.read().await.get(&id).copied().unwrap_or(false)
    }
}
