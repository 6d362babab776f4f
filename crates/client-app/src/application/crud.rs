//! Generic CRUD controller
//!
//! One controller drives the list, the create/edit form and deletion for any
//! catalog entry. It re-fetches when the selected world changes, maps form
//! fields to storage fields on the way out and back on the way in, and turns
//! every failure into a notice.
//!
//! Fetches follow last-request-wins: starting a fetch cancels the previous
//! one, and a sequence number keeps a late response from overwriting a newer
//! list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use worldloom_domain::{
    EntityStatistics, FormValues, ProjectId, Resource, ResourceSpec, Scope, WorldId,
};
use worldloom_ports::outbound::{ApiError, ConfirmationPort, Notice, NotificationPort};

use crate::application::{Api, ResourceService, SelectionState, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    /// Last fetch failed; the message is what the user was shown
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalMode<Id> {
    Create,
    Edit(Id),
}

/// An open create/edit form
#[derive(Debug, Clone, PartialEq)]
pub struct ModalState<Id> {
    pub mode: ModalMode<Id>,
    /// Form-named values
    pub values: FormValues,
    pub submitting: bool,
    pub error: Option<String>,
}

impl<Id> ModalState<Id> {
    fn new(mode: ModalMode<Id>, values: FormValues) -> Self {
        Self {
            mode,
            values,
            submitting: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerState<R: Resource> {
    pub phase: Phase,
    pub records: Vec<R>,
    /// Scope of the most recent fetch
    pub scope: Scope,
    pub modal: Option<ModalState<R::Id>>,
}

impl<R: Resource> Default for ControllerState<R> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            records: Vec::new(),
            scope: Scope::none(),
            modal: None,
        }
    }
}

impl<R: Resource> ControllerState<R> {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Counts over the current list
    pub fn statistics(&self, spec: &ResourceSpec) -> EntityStatistics {
        EntityStatistics::compute(&self.records, spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined the confirmation; nothing was sent
    Declined,
}

pub struct CrudController<R: Resource> {
    spec: &'static ResourceSpec,
    service: ResourceService<R>,
    notifier: Arc<dyn NotificationPort>,
    confirmer: Arc<dyn ConfirmationPort>,
    state: watch::Sender<ControllerState<R>>,
    /// Cancelled on close; parent of every fetch token
    root: CancellationToken,
    in_flight: Mutex<Option<CancellationToken>>,
    fetch_seq: AtomicU64,
}

impl<R: Resource> CrudController<R> {
    pub fn new(
        api: Api,
        spec: &'static ResourceSpec,
        notifier: Arc<dyn NotificationPort>,
        confirmer: Arc<dyn ConfirmationPort>,
    ) -> Self {
        let (state, _) = watch::channel(ControllerState::default());
        Self {
            spec,
            service: ResourceService::new(api, spec),
            notifier,
            confirmer,
            state,
            root: CancellationToken::new(),
            in_flight: Mutex::new(None),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    pub fn snapshot(&self) -> ControllerState<R> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState<R>> {
        self.state.subscribe()
    }

    pub fn records(&self) -> Vec<R> {
        self.state.borrow().records.clone()
    }

    pub fn statistics(&self) -> EntityStatistics {
        self.state.borrow().statistics(self.spec)
    }

    /// Replace the list with the records under `scope`.
    ///
    /// With no world in scope a world-scoped resource is not fetched at all
    /// and the list is emptied. A failed fetch keeps the previous records,
    /// sets the error phase and notifies.
    pub async fn fetch_list(&self, scope: Scope) -> Result<(), ServiceError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.root.child_token();
        if let Some(previous) = self.in_flight.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        if !scope.satisfies(self.spec.scope) {
            tracing::debug!(resource = self.spec.key, "No world selected, clearing list");
            self.state.send_modify(|s| {
                s.scope = scope;
                s.records.clear();
                s.phase = Phase::Idle;
            });
            return Ok(());
        }

        self.state.send_modify(|s| {
            s.scope = scope.clone();
            s.phase = Phase::Loading;
        });

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ServiceError::Cancelled),
            listed = self.service.list(&scope) => listed,
        };

        if self.fetch_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(resource = self.spec.key, seq, "Discarding superseded fetch");
            return Err(ServiceError::Cancelled);
        }

        match result {
            Ok(records) => {
                tracing::debug!(resource = self.spec.key, count = records.len(), "Fetched list");
                self.state.send_modify(|s| {
                    s.records = records;
                    s.phase = Phase::Idle;
                });
                Ok(())
            }
            Err(ServiceError::Cancelled) => {
                self.state.send_modify(|s| s.phase = Phase::Idle);
                Err(ServiceError::Cancelled)
            }
            Err(e) => {
                let message = format!("Failed to load {}s: {}", self.spec.label, e);
                tracing::error!(resource = self.spec.key, "{}", message);
                self.state.send_modify(|s| s.phase = Phase::Error(message.clone()));
                self.notifier.notify(Notice::error(message));
                Err(e)
            }
        }
    }

    /// Re-fetch under the scope of the most recent fetch
    pub async fn refresh(&self) -> Result<(), ServiceError> {
        let scope = self.state.borrow().scope.clone();
        self.fetch_list(scope).await
    }

    /// Open an empty create form
    pub fn open_create(&self) {
        self.state
            .send_modify(|s| s.modal = Some(ModalState::new(ModalMode::Create, FormValues::new())));
    }

    /// Open an edit form prefilled with `record`'s values under form names
    pub fn open_edit(&self, record: &R) {
        let values = record.to_form(self.spec);
        let id = record.id().clone();
        self.state
            .send_modify(|s| s.modal = Some(ModalState::new(ModalMode::Edit(id), values)));
    }

    /// Open an edit form for a listed record
    pub fn open_edit_by_id(&self, id: &R::Id) -> Result<(), ServiceError> {
        let record = self
            .state
            .borrow()
            .find(id)
            .cloned()
            .ok_or(ServiceError::Api(ApiError::NotFound))?;
        self.open_edit(&record);
        Ok(())
    }

    /// Change one form-named field of the open form
    pub fn set_field(&self, key: &str, value: Value) -> Result<(), ServiceError> {
        let mut outcome = Err(ServiceError::NoOpenForm);
        self.state.send_if_modified(|s| match &mut s.modal {
            Some(modal) => {
                modal.values.set(key, value);
                outcome = Ok(());
                true
            }
            None => false,
        });
        outcome
    }

    pub fn close_modal(&self) {
        self.state.send_if_modified(|s| s.modal.take().is_some());
    }

    /// Submit the open form with `values` (form names).
    ///
    /// Values are mapped to storage names, scoped, validated and sent as a
    /// create or an update. On success the form closes and the list is
    /// re-fetched; on failure the form stays open with its values and the
    /// error. A second submit while one is in flight is rejected.
    pub async fn submit(&self, values: FormValues) -> Result<(), ServiceError> {
        let (mode, scope) = self.begin_submit(&values)?;

        let mut payload = self.spec.remap.to_storage(&values);
        payload.remove("id");

        if self.spec.is_world_scoped() {
            let world_id = match &mode {
                ModalMode::Create => scope.world_id.clone(),
                ModalMode::Edit(id) => self.record_world(id).or_else(|| scope.world_id.clone()),
            };
            let Some(world_id) = world_id else {
                return self.fail_submit(ServiceError::NoWorldSelected);
            };
            payload.insert("world_id".into(), serde_json::to_value(&world_id).unwrap_or(Value::Null));

            if let (ModalMode::Create, Some(project_id)) = (&mode, &scope.project_id) {
                payload.insert(
                    "project_id".into(),
                    serde_json::to_value(project_id).unwrap_or(Value::Null),
                );
            }
        }

        if let Err(e) = self.spec.validate_payload(&payload) {
            return self.fail_submit(e.into());
        }

        let sent = tokio::select! {
            _ = self.root.cancelled() => Err(ServiceError::Cancelled),
            sent = async {
                match &mode {
                    ModalMode::Create => self.service.create(&payload).await,
                    ModalMode::Edit(id) => self.service.update(id, &payload).await,
                }
            } => sent,
        };

        match sent {
            Ok(_) => {
                let verb = match mode {
                    ModalMode::Create => "created",
                    ModalMode::Edit(_) => "updated",
                };
                tracing::info!(resource = self.spec.key, "{} {}", self.spec.label, verb);
                self.state.send_modify(|s| s.modal = None);
                self.notifier
                    .notify(Notice::success(format!("{} {}", self.spec.label, verb)));

                if let Err(e) = self.fetch_list(scope).await {
                    tracing::debug!(resource = self.spec.key, "Re-fetch after save failed: {}", e);
                }
                Ok(())
            }
            Err(e) => self.fail_submit(e),
        }
    }

    /// Delete a record after the user confirms.
    ///
    /// A declined confirmation sends nothing. A failed delete leaves the
    /// list as it was.
    pub async fn delete(&self, id: &R::Id) -> Result<DeleteOutcome, ServiceError> {
        let name = self
            .state
            .borrow()
            .find(id)
            .map(|r| r.display_name(self.spec))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string());

        let prompt = format!(
            "Delete {} \"{}\"? This cannot be undone.",
            self.spec.label.to_lowercase(),
            name
        );
        if !self.confirmer.confirm(&prompt).await {
            tracing::debug!(resource = self.spec.key, id = %id, "Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let result = tokio::select! {
            _ = self.root.cancelled() => Err(ServiceError::Cancelled),
            deleted = self.service.delete(id) => deleted,
        };

        match result {
            Ok(()) => {
                tracing::info!(resource = self.spec.key, id = %id, "Deleted record");
                self.notifier
                    .notify(Notice::success(format!("{} deleted", self.spec.label)));
                if let Err(e) = self.refresh().await {
                    tracing::debug!(resource = self.spec.key, "Re-fetch after delete failed: {}", e);
                }
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                tracing::error!(resource = self.spec.key, id = %id, "Delete failed: {}", e);
                if !e.is_cancelled() {
                    self.notifier.notify(Notice::error(format!(
                        "Failed to delete {}: {}",
                        self.spec.label.to_lowercase(),
                        e
                    )));
                }
                Err(e)
            }
        }
    }

    /// Re-fetch whenever the selected world changes.
    ///
    /// The current selection is fetched immediately. A change of world that
    /// arrives mid-fetch drops that fetch and starts over with the new world;
    /// other selection updates (loading flag, refreshed world list) let the
    /// fetch finish.
    pub fn follow_selection(
        self: &Arc<Self>,
        mut selection: watch::Receiver<SelectionState>,
        project_id: Option<ProjectId>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut last: Option<Option<WorldId>> = None;
            'follow: loop {
                let world_id = selection.borrow_and_update().current_world_id().cloned();
                if last.as_ref() != Some(&world_id) {
                    last = Some(world_id.clone());
                    let fetch = this.fetch_list(Scope {
                        world_id: world_id.clone(),
                        project_id: project_id.clone(),
                    });
                    tokio::pin!(fetch);

                    loop {
                        let changed = tokio::select! {
                            _ = this.root.cancelled() => break 'follow,
                            _ = &mut fetch => break,
                            changed = selection.changed() => changed,
                        };
                        if changed.is_err() {
                            break 'follow;
                        }
                        let current = selection.borrow_and_update().current_world_id().cloned();
                        if current != world_id {
                            continue 'follow;
                        }
                    }
                }

                tokio::select! {
                    _ = this.root.cancelled() => break,
                    changed = selection.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(resource = this.spec.key, "Stopped following selection");
        })
    }

    /// Cancel in-flight work and stop following the selection
    pub fn close(&self) {
        self.root.cancel();
    }

    fn begin_submit(&self, values: &FormValues) -> Result<(ModalMode<R::Id>, Scope), ServiceError> {
        let mut outcome = Err(ServiceError::NoOpenForm);
        self.state.send_if_modified(|s| match &mut s.modal {
            None => false,
            Some(modal) if modal.submitting => {
                outcome = Err(ServiceError::Busy);
                false
            }
            Some(modal) => {
                modal.values = values.clone();
                modal.submitting = true;
                modal.error = None;
                outcome = Ok((modal.mode.clone(), s.scope.clone()));
                true
            }
        });
        outcome
    }

    fn fail_submit(&self, error: ServiceError) -> Result<(), ServiceError> {
        let message = error.to_string();
        tracing::warn!(resource = self.spec.key, "Save rejected: {}", message);
        self.state.send_modify(|s| {
            if let Some(modal) = &mut s.modal {
                modal.submitting = false;
                modal.error = Some(message.clone());
            }
        });
        if !error.is_cancelled() {
            self.notifier.notify(Notice::error(format!(
                "Failed to save {}: {}",
                self.spec.label.to_lowercase(),
                message
            )));
        }
        Err(error)
    }

    /// World the listed record belongs to
    fn record_world(&self, id: &R::Id) -> Option<WorldId> {
        let state = self.state.borrow();
        let storage = state.find(id)?.to_storage();
        let raw = storage.get("world_id")?.clone();
        serde_json::from_value(raw).ok()
    }
}

impl<R: Resource> Drop for CrudController<R> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use worldloom_adapters::infrastructure::testing::MockBackend;
    use worldloom_adapters::infrastructure::MemoryStorageProvider;
    use worldloom_domain::catalog::{CHARACTER_SPEC, POWER_LEVEL_SPEC};
    use worldloom_domain::{EntityId, EntityRecord};
    use worldloom_ports::outbound::{MockConfirmationPort, NoticeLevel};

    use crate::application::SelectionContext;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: StdMutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn levels(&self) -> Vec<NoticeLevel> {
            self.notices.lock().unwrap().iter().map(|n| n.level).collect()
        }
    }

    impl NotificationPort for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn confirmer(answer: bool) -> Arc<MockConfirmationPort> {
        let mut confirmer = MockConfirmationPort::new();
        confirmer.expect_confirm().returning(move |_| answer);
        Arc::new(confirmer)
    }

    fn controller(
        backend: &MockBackend,
        spec: &'static ResourceSpec,
    ) -> (Arc<CrudController<EntityRecord>>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = CrudController::new(
            Api::new(Arc::new(backend.clone())),
            spec,
            notifier.clone(),
            confirmer(true),
        );
        (Arc::new(controller), notifier)
    }

    fn world_one() -> Scope {
        Scope::world(WorldId::from(1))
    }

    fn seeded_characters() -> MockBackend {
        let backend = MockBackend::new();
        backend.seed(
            "/api/characters",
            vec![
                json!({"id": 1, "world_id": 1, "name": "Mira", "character_type": "protagonist"}),
                json!({"id": 2, "world_id": 1, "name": "Oren", "character_type": "supporting"}),
                json!({"id": 3, "world_id": 2, "name": "Vask", "character_type": "antagonist"}),
            ],
        );
        backend
    }

    #[tokio::test]
    async fn fetch_replaces_the_list() {
        let backend = seeded_characters();
        let (controller, _) = controller(&backend, &CHARACTER_SPEC);

        controller.fetch_list(world_one()).await.unwrap();
        controller.fetch_list(world_one()).await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.phase, Phase::Idle);

        controller.fetch_list(Scope::world(WorldId::from(2))).await.unwrap();
        assert_eq!(controller.records().len(), 1);
    }

    #[tokio::test]
    async fn no_world_clears_without_a_request() {
        let backend = seeded_characters();
        let (controller, _) = controller(&backend, &CHARACTER_SPEC);

        controller.fetch_list(world_one()).await.unwrap();
        controller.fetch_list(Scope::none()).await.unwrap();

        assert!(controller.records().is_empty());
        assert_eq!(backend.call_count("GET", "/api/characters"), 1);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_records_and_notifies() {
        let backend = seeded_characters();
        let (controller, notifier) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();

        backend.fail_once("GET", "/api/characters", ApiError::http(500, "down"));
        let err = controller.fetch_list(world_one()).await.unwrap_err();

        assert_eq!(err, ServiceError::Api(ApiError::http(500, "down")));
        let state = controller.snapshot();
        assert_eq!(state.records.len(), 2);
        assert!(matches!(state.phase, Phase::Error(_)));
        assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn create_attaches_scope_and_refetches() {
        let backend = seeded_characters();
        let (controller, notifier) = controller(&backend, &CHARACTER_SPEC);
        let scope = world_one().with_project(Some(ProjectId::from(9)));
        controller.fetch_list(scope).await.unwrap();

        controller.open_create();
        controller
            .submit(
                FormValues::new()
                    .with("name", "Ilse")
                    .with("character_type", "minor"),
            )
            .await
            .unwrap();

        let created = backend
            .records("/api/characters")
            .into_iter()
            .find(|r| r["name"] == json!("Ilse"))
            .unwrap();
        assert_eq!(created["world_id"], json!(1));
        assert_eq!(created["project_id"], json!(9));

        let state = controller.snapshot();
        assert!(state.modal.is_none());
        assert_eq!(backend.call_count("GET", "/api/characters"), 2);
        assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent_and_stays_open() {
        let backend = seeded_characters();
        let (controller, notifier) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();

        controller.open_create();
        let values = FormValues::new().with("name", "Ilse").with("character_type", "villain");
        let err = controller.submit(values.clone()).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(backend.call_count("POST", "/api/characters"), 0);
        let modal = controller.snapshot().modal.unwrap();
        assert_eq!(modal.values, values);
        assert!(!modal.submitting);
        assert!(modal.error.is_some());
        assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn submit_without_open_form_is_rejected() {
        let backend = seeded_characters();
        let (controller, _) = controller(&backend, &CHARACTER_SPEC);
        let err = controller.submit(FormValues::new()).await.unwrap_err();
        assert_eq!(err, ServiceError::NoOpenForm);
        assert_eq!(controller.set_field("name", json!("x")), Err(ServiceError::NoOpenForm));
    }

    #[tokio::test]
    async fn unchanged_power_level_edit_sends_the_stored_fields() {
        let backend = MockBackend::new();
        backend.seed(
            "/api/power-levels",
            vec![json!({
                "id": 4,
                "world_id": 1,
                "level": 2,
                "level_name": "Foundation",
                "description": "Qi condenses into a core"
            })],
        );
        let (controller, _) = controller(&backend, &POWER_LEVEL_SPEC);
        controller.fetch_list(world_one()).await.unwrap();

        controller.open_edit_by_id(&EntityId::from(4)).unwrap();
        let modal = controller.snapshot().modal.unwrap();
        assert_eq!(modal.mode, ModalMode::Edit(EntityId::from(4)));
        assert_eq!(modal.values.get("level_number"), Some(&json!(2)));
        assert_eq!(modal.values.get("level_title"), Some(&json!("Foundation")));

        controller.submit(modal.values).await.unwrap();

        let put = backend
            .calls()
            .into_iter()
            .find(|c| c.method == "PUT")
            .unwrap();
        assert_eq!(put.path, "/api/power-levels/4");
        assert_eq!(
            put.body,
            Some(json!({
                "world_id": 1,
                "level": 2,
                "level_name": "Foundation",
                "description": "Qi condenses into a core"
            }))
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_the_form_values() {
        let backend = seeded_characters();
        let (controller, notifier) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();
        backend.fail_once("PUT", "/api/characters", ApiError::Timeout);

        controller.open_edit_by_id(&EntityId::from(1)).unwrap();
        controller.set_field("name", json!("Mira Vey")).unwrap();
        let values = controller.snapshot().modal.unwrap().values;
        let err = controller.submit(values).await.unwrap_err();

        assert_eq!(err, ServiceError::Api(ApiError::Timeout));
        let modal = controller.snapshot().modal.unwrap();
        assert_eq!(modal.values.get_str("name"), Some("Mira Vey"));
        assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_saving_is_busy() {
        let backend = seeded_characters();
        backend.set_latency("/api/characters", Duration::from_millis(200));
        let (controller, _) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();

        controller.open_create();
        let values = FormValues::new()
            .with("name", "Ilse")
            .with("character_type", "minor");

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            let values = values.clone();
            async move { controller.submit(values).await }
        });

        let mut updates = controller.subscribe();
        updates
            .wait_for(|s| s.modal.as_ref().is_some_and(|m| m.submitting))
            .await
            .unwrap();

        assert_eq!(controller.submit(values).await, Err(ServiceError::Busy));
        first.await.unwrap().unwrap();
        assert_eq!(backend.call_count("POST", "/api/characters"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_fetch_wins_over_a_slower_older_one() {
        let backend = seeded_characters();
        backend.set_latency("/api/characters", Duration::from_millis(500));
        let (controller, _) = controller(&backend, &CHARACTER_SPEC);

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.fetch_list(world_one()).await }
        });
        while backend.call_count("GET", "/api/characters") == 0 {
            tokio::task::yield_now().await;
        }

        controller
            .fetch_list(Scope::world(WorldId::from(2)))
            .await
            .unwrap();

        assert_eq!(first.await.unwrap(), Err(ServiceError::Cancelled));
        let state = controller.snapshot();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].world_id, WorldId::from(2));
        assert_eq!(state.scope.world_id, Some(WorldId::from(2)));
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_list_unchanged() {
        let backend = seeded_characters();
        backend.fail("DELETE", "/api/characters", ApiError::http(500, "locked"));
        let (controller, notifier) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();
        let before = controller.records();

        let err = controller.delete(&EntityId::from(1)).await.unwrap_err();

        assert_eq!(err, ServiceError::Api(ApiError::http(500, "locked")));
        assert_eq!(controller.records(), before);
        assert_eq!(backend.records("/api/characters").len(), 3);
        assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let backend = seeded_characters();
        let notifier = Arc::new(RecordingNotifier::default());
        let mut confirm = MockConfirmationPort::new();
        confirm
            .expect_confirm()
            .withf(|prompt| prompt.contains("Mira"))
            .times(1)
            .returning(|_| false);
        let controller: CrudController<EntityRecord> = CrudController::new(
            Api::new(Arc::new(backend.clone())),
            &CHARACTER_SPEC,
            notifier.clone(),
            Arc::new(confirm),
        );
        controller.fetch_list(world_one()).await.unwrap();

        let outcome = controller.delete(&EntityId::from(1)).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(backend.call_count("DELETE", "/api/characters"), 0);
        assert!(notifier.levels().is_empty());
    }

    #[tokio::test]
    async fn confirmed_delete_refetches() {
        let backend = seeded_characters();
        let (controller, notifier) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();

        let outcome = controller.delete(&EntityId::from(2)).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(controller.records().len(), 1);
        assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn statistics_follow_the_current_list() {
        let backend = seeded_characters();
        let (controller, _) = controller(&backend, &CHARACTER_SPEC);
        controller.fetch_list(world_one()).await.unwrap();

        let stats = controller.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count("protagonist"), 1);
        assert_eq!(stats.group("main"), Some(1));
    }

    #[tokio::test]
    async fn lists_follow_the_restored_selection() {
        let backend = seeded_characters();
        backend.seed(
            "/api/worlds",
            vec![json!({"id": 1, "name": "Aeloria"}), json!({"id": 2, "name": "Thule"})],
        );
        let storage = Arc::new(MemoryStorageProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let api = Api::new(Arc::new(backend.clone()));

        let first_run = SelectionContext::new(api.clone(), storage.clone(), notifier.clone());
        first_run.load_worlds().await.unwrap();
        assert!(first_run.current().is_none());
        first_run.select_by_id(&WorldId::from(1)).unwrap();

        let second_run = SelectionContext::new(api, storage, notifier);
        second_run.load_worlds().await.unwrap();
        assert_eq!(second_run.current().unwrap().name, "Aeloria");

        let (controller, _) = controller(&backend, &CHARACTER_SPEC);
        let follower = controller.follow_selection(second_run.subscribe(), None);
        let mut updates = controller.subscribe();
        let state = updates
            .wait_for(|s| s.records.len() == 2 && !s.is_loading())
            .await
            .unwrap()
            .clone();
        assert!(state.records.iter().all(|r| r.world_id == WorldId::from(1)));

        second_run.select_world(None);
        updates
            .wait_for(|s| s.records.is_empty())
            .await
            .unwrap();

        controller.close();
        follower.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reloading_worlds_mid_fetch_lets_the_fetch_finish() {
        let backend = seeded_characters();
        backend.seed("/api/worlds", vec![json!({"id": 1, "name": "Aeloria"})]);
        backend.set_latency("/api/characters", Duration::from_millis(500));
        let notifier = Arc::new(RecordingNotifier::default());
        let selection = SelectionContext::new(
            Api::new(Arc::new(backend.clone())),
            Arc::new(MemoryStorageProvider::new()),
            notifier,
        );
        selection.load_worlds().await.unwrap();
        selection.select_by_id(&WorldId::from(1)).unwrap();

        let (controller, _) = controller(&backend, &CHARACTER_SPEC);
        let follower = controller.follow_selection(selection.subscribe(), None);
        let mut updates = controller.subscribe();
        updates.wait_for(|s| s.is_loading()).await.unwrap();

        selection.load_worlds().await.unwrap();
        let state = updates
            .wait_for(|s| !s.is_loading())
            .await
            .unwrap()
            .clone();

        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.records.len(), 2);
        assert_eq!(backend.call_count("GET", "/api/characters"), 1);

        controller.close();
        follower.await.unwrap();
    }
}
