//! Wiring of adapters into application services

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use worldloom_adapters::infrastructure::config::DEFAULT_SEARCH_DEBOUNCE_MS;
use worldloom_adapters::infrastructure::{
    AppConfig, AutoConfirm, ConsoleNotifier, FileStorageProvider, HttpApiClient, StdinConfirmation,
};
use worldloom_app::application::{
    Api, CrudController, GlobalSearch, SearchSession, SelectionContext,
};
use worldloom_domain::{ProjectId, Resource, ResourceSpec, Scope, TypeFilter};
use worldloom_ports::outbound::{ConfirmationPort, NotificationPort, RawApiPort, StorageProvider};

/// Everything a command needs, built once per process
pub struct App {
    pub api: Api,
    pub selection: SelectionContext,
    pub notifier: Arc<dyn NotificationPort>,
    pub confirmer: Arc<dyn ConfirmationPort>,
    pub project_id: Option<ProjectId>,
    /// Debounce window of interactive search sessions
    pub search_debounce: Duration,
}

impl App {
    pub fn from_config(config: &AppConfig, assume_yes: bool) -> Result<Self> {
        let http = HttpApiClient::new(&config.api_base_url, config.request_timeout)
            .with_context(|| format!("failed to set up the HTTP client for {}", config.api_base_url))?;
        let raw_api: Arc<dyn RawApiPort> = Arc::new(http);
        let storage: Arc<dyn StorageProvider> =
            Arc::new(FileStorageProvider::open(config.storage_path.clone()));
        let confirmer: Arc<dyn ConfirmationPort> = if assume_yes {
            Arc::new(AutoConfirm)
        } else {
            Arc::new(StdinConfirmation)
        };

        let project_id = config
            .project_id
            .as_deref()
            .map(ProjectId::parse)
            .transpose()
            .context("WORLDLOOM_PROJECT_ID is not a valid id")?;

        let mut app = Self::new(
            raw_api,
            storage,
            Arc::new(ConsoleNotifier),
            confirmer,
            project_id,
        );
        app.search_debounce = config.search_debounce;
        Ok(app)
    }

    pub fn new(
        raw_api: Arc<dyn RawApiPort>,
        storage: Arc<dyn StorageProvider>,
        notifier: Arc<dyn NotificationPort>,
        confirmer: Arc<dyn ConfirmationPort>,
        project_id: Option<ProjectId>,
    ) -> Self {
        let api = Api::new(raw_api);
        let selection = SelectionContext::new(api.clone(), storage, notifier.clone());
        Self {
            api,
            selection,
            notifier,
            confirmer,
            project_id,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }

    pub fn controller<R: Resource>(&self, spec: &'static ResourceSpec) -> CrudController<R> {
        CrudController::new(
            self.api.clone(),
            spec,
            self.notifier.clone(),
            self.confirmer.clone(),
        )
    }

    pub fn search(&self) -> GlobalSearch {
        GlobalSearch::new(self.api.clone())
    }

    /// Visible search-as-you-type session over `scope`
    pub fn search_session(&self, scope: Scope, filter: TypeFilter) -> SearchSession {
        let session = SearchSession::spawn(Arc::new(self.search()), self.search_debounce);
        session.set_scope(scope);
        session.set_filter(filter);
        session.set_visible(true);
        session
    }
}
