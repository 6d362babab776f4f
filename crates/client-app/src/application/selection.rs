//! World selection context
//!
//! Holds the loaded world list and the currently selected world, restores
//! the selection from durable storage after loading, and publishes every
//! change on a watch channel so entity views can follow it.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use worldloom_domain::catalog::WORLD_SPEC;
use worldloom_domain::{ProjectId, Scope, World, WorldId};
use worldloom_ports::outbound::{storage_keys, ApiError, Notice, NotificationPort, StorageProvider};

use crate::application::{Api, ResourceService, ServiceError};

/// Snapshot of the selection context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub worlds: Vec<World>,
    pub current: Option<World>,
    pub loading: bool,
}

impl SelectionState {
    pub fn current_world_id(&self) -> Option<&WorldId> {
        self.current.as_ref().map(|w| &w.id)
    }

    /// Scope for world-scoped calls under the current selection
    pub fn scope(&self, project_id: Option<ProjectId>) -> Scope {
        Scope {
            world_id: self.current_world_id().cloned(),
            project_id,
        }
    }
}

pub struct SelectionContext {
    worlds: ResourceService<World>,
    storage: Arc<dyn StorageProvider>,
    notifier: Arc<dyn NotificationPort>,
    state: watch::Sender<SelectionState>,
    cancel: CancellationToken,
}

impl SelectionContext {
    pub fn new(
        api: Api,
        storage: Arc<dyn StorageProvider>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        let (state, _) = watch::channel(SelectionState::default());
        Self {
            worlds: ResourceService::new(api, &WORLD_SPEC),
            storage,
            notifier,
            state,
            cancel: CancellationToken::new(),
        }
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<World> {
        self.state.borrow().current.clone()
    }

    /// Fetch all worlds, then restore the persisted selection if that world
    /// is still in the list.
    ///
    /// A persisted id with no matching world leaves nothing selected; the
    /// stored value itself is left alone.
    pub async fn load_worlds(&self) -> Result<(), ServiceError> {
        self.state.send_modify(|s| s.loading = true);

        let unscoped = Scope::none();
        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(ServiceError::Cancelled),
            listed = self.worlds.list(&unscoped) => listed,
        };

        match result {
            Ok(worlds) => {
                let restored = self.restore_selection(&worlds);
                tracing::info!(
                    count = worlds.len(),
                    restored = restored.as_ref().map(|w| w.id.to_string()),
                    "Loaded worlds"
                );
                self.state.send_modify(|s| {
                    s.worlds = worlds;
                    s.current = restored;
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|s| s.loading = false);
                if !e.is_cancelled() {
                    tracing::error!("Failed to load worlds: {}", e);
                    self.notifier
                        .notify(Notice::error(format!("Failed to load worlds: {}", e)));
                }
                Err(e)
            }
        }
    }

    /// Select a world (or clear the selection) and persist the choice
    pub fn select_world(&self, world: Option<World>) {
        match &world {
            Some(w) => {
                self.storage
                    .save(storage_keys::SELECTED_WORLD_ID, &w.id.to_string());
                tracing::info!(world_id = %w.id, name = %w.name, "Selected world");
            }
            None => {
                self.storage.remove(storage_keys::SELECTED_WORLD_ID);
                tracing::info!("Cleared world selection");
            }
        }
        self.state.send_modify(|s| s.current = world);
    }

    /// Select a world from the loaded list by id
    pub fn select_by_id(&self, id: &WorldId) -> Result<World, ServiceError> {
        let world = self
            .state
            .borrow()
            .worlds
            .iter()
            .find(|w| &w.id == id)
            .cloned()
            .ok_or(ServiceError::Api(ApiError::NotFound))?;
        self.select_world(Some(world.clone()));
        Ok(world)
    }

    /// Abort any in-flight load
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn restore_selection(&self, worlds: &[World]) -> Option<World> {
        let saved = self.storage.load(storage_keys::SELECTED_WORLD_ID)?;
        let id = match WorldId::parse(&saved) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(saved = %saved, "Ignoring unreadable saved world id: {}", e);
                return None;
            }
        };

        let found = worlds.iter().find(|w| w.id == id).cloned();
        if found.is_none() {
            tracing::warn!(world_id = %id, "Saved world no longer exists");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use worldloom_ports::outbound::{MockNotificationPort, MockRawApiPort, MockStorageProvider};

    fn worlds_api(body: serde_json::Value) -> Api {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .with(eq("/api/worlds"))
            .returning(move |_| Ok(body.clone()));
        Api::new(Arc::new(raw))
    }

    fn quiet_notifier() -> Arc<MockNotificationPort> {
        let mut notifier = MockNotificationPort::new();
        notifier.expect_notify().never();
        Arc::new(notifier)
    }

    #[tokio::test]
    async fn saved_selection_is_restored_after_load() {
        let mut storage = MockStorageProvider::new();
        storage
            .expect_load()
            .with(eq(storage_keys::SELECTED_WORLD_ID))
            .returning(|_| Some("2".to_string()));

        let context = SelectionContext::new(
            worlds_api(json!([{"id": 1, "name": "Aeloria"}, {"id": 2, "name": "Thule"}])),
            Arc::new(storage),
            quiet_notifier(),
        );

        context.load_worlds().await.unwrap();
        let state = context.snapshot();
        assert_eq!(state.worlds.len(), 2);
        assert_eq!(state.current.unwrap().name, "Thule");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn stale_saved_id_selects_nothing_and_keeps_storage() {
        let mut storage = MockStorageProvider::new();
        storage.expect_load().returning(|_| Some("99".to_string()));
        storage.expect_remove().never();
        storage.expect_save().never();

        let context = SelectionContext::new(
            worlds_api(json!([{"id": 1, "name": "Aeloria"}])),
            Arc::new(storage),
            quiet_notifier(),
        );

        context.load_worlds().await.unwrap();
        assert!(context.current().is_none());
    }

    #[tokio::test]
    async fn selecting_persists_and_clearing_removes() {
        let mut storage = MockStorageProvider::new();
        storage
            .expect_save()
            .with(eq(storage_keys::SELECTED_WORLD_ID), eq("7"))
            .times(1)
            .return_const(());
        storage
            .expect_remove()
            .with(eq(storage_keys::SELECTED_WORLD_ID))
            .times(1)
            .return_const(());

        let context = SelectionContext::new(
            worlds_api(json!([])),
            Arc::new(storage),
            quiet_notifier(),
        );
        let mut updates = context.subscribe();

        context.select_world(Some(World::new(WorldId::from(7), "Aeloria")));
        assert!(updates.has_changed().unwrap());
        assert_eq!(
            updates.borrow_and_update().current_world_id(),
            Some(&WorldId::from(7))
        );

        context.select_world(None);
        assert!(context.current().is_none());
    }

    #[tokio::test]
    async fn failed_load_notifies_and_keeps_previous_list() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut raw = MockRawApiPort::new();
        let counter = calls.clone();
        raw.expect_get_json().returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(json!([{"id": 1, "name": "Aeloria"}]))
            } else {
                Err(ApiError::Request("connection refused".into()))
            }
        });

        let mut storage = MockStorageProvider::new();
        storage.expect_load().returning(|_| Some("1".to_string()));

        let mut notifier = MockNotificationPort::new();
        notifier
            .expect_notify()
            .withf(|notice| notice.is_error() && notice.message.contains("connection refused"))
            .times(1)
            .return_const(());

        let context = SelectionContext::new(
            Api::new(Arc::new(raw)),
            Arc::new(storage),
            Arc::new(notifier),
        );

        context.load_worlds().await.unwrap();
        assert_eq!(context.current().unwrap().name, "Aeloria");

        let err = context.load_worlds().await.unwrap_err();
        assert!(matches!(err, ServiceError::Api(ApiError::Request(_))));

        let state = context.snapshot();
        assert!(!state.loading);
        assert_eq!(state.worlds.len(), 1);
        assert_eq!(state.current_world_id(), Some(&WorldId::from(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
