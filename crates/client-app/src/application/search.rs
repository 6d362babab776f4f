//! Global search across every entity kind of the selected world
//!
//! There is no search endpoint: each kind's list is fetched concurrently and
//! filtered client-side. A kind whose fetch fails contributes nothing rather
//! than failing the whole search.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use worldloom_domain::{filter_hits, EntityKind, EntityRecord, Scope, SearchHit, TypeFilter};

use crate::application::{Api, ResourceService};

pub struct GlobalSearch {
    api: Api,
    kinds: Vec<EntityKind>,
}

impl GlobalSearch {
    /// Search every entity kind
    pub fn new(api: Api) -> Self {
        Self::with_kinds(api, EntityKind::ALL.to_vec())
    }

    pub fn with_kinds(api: Api, kinds: Vec<EntityKind>) -> Self {
        Self { api, kinds }
    }

    /// Records of the scoped world whose name, description or title contains
    /// `term` (case-insensitive), restricted to `filter`.
    ///
    /// A blank term or a scope without a world returns nothing and fetches
    /// nothing. Results keep catalog order.
    pub async fn search(&self, term: &str, filter: TypeFilter, scope: &Scope) -> Vec<SearchHit> {
        let term = term.trim();
        if term.is_empty() || scope.world_id.is_none() {
            return Vec::new();
        }

        let fetches = self.kinds.iter().copied().map(|kind| {
            let service = ResourceService::<EntityRecord>::new(self.api.clone(), kind.spec());
            async move {
                match service.list(scope).await {
                    Ok(records) => records
                        .into_iter()
                        .map(|record| SearchHit::new(kind, record))
                        .collect(),
                    Err(e) => {
                        tracing::warn!(kind = %kind, "Search skipped a kind: {}", e);
                        Vec::new()
                    }
                }
            }
        });

        let hits: Vec<SearchHit> = join_all(fetches).await.into_iter().flatten().collect();
        let total = hits.len();
        let matched = filter_hits(hits, term, filter);
        tracing::debug!(term, %filter, scanned = total, matched = matched.len(), "Search finished");
        matched
    }
}

/// Current input of a search panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub term: String,
    pub filter: TypeFilter,
    /// Hidden panels don't search
    pub visible: bool,
    pub scope: Scope,
}

/// Latest published results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    /// Query these hits answer
    pub query: SearchQuery,
    pub hits: Vec<SearchHit>,
    pub searching: bool,
}

/// Search-as-you-type driver.
///
/// Query changes are debounced and coalesced to the latest value. A change
/// that arrives mid-search drops that search and starts a new debounce
/// window, so results always answer the newest query.
pub struct SearchSession {
    query: watch::Sender<SearchQuery>,
    results: watch::Receiver<SearchResults>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SearchSession {
    pub fn spawn(search: Arc<GlobalSearch>, debounce: Duration) -> Self {
        let (query, query_rx) = watch::channel(SearchQuery::default());
        let (results_tx, results) = watch::channel(SearchResults::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_session(
            search,
            query_rx,
            results_tx,
            debounce,
            cancel.clone(),
        ));

        Self {
            query,
            results,
            cancel,
            task,
        }
    }

    pub fn set_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.query.send_if_modified(|q| replace(&mut q.term, term));
    }

    pub fn set_filter(&self, filter: TypeFilter) {
        self.query.send_if_modified(|q| replace(&mut q.filter, filter));
    }

    pub fn set_visible(&self, visible: bool) {
        self.query.send_if_modified(|q| replace(&mut q.visible, visible));
    }

    pub fn set_scope(&self, scope: Scope) {
        self.query.send_if_modified(|q| replace(&mut q.scope, scope));
    }

    pub fn results(&self) -> watch::Receiver<SearchResults> {
        self.results.clone()
    }

    pub fn latest(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    /// Stop the background task and wait for it to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Search session ended abnormally: {}", e);
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

async fn run_session(
    search: Arc<GlobalSearch>,
    mut queries: watch::Receiver<SearchQuery>,
    results: watch::Sender<SearchResults>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut pending = false;
    loop {
        if !pending {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = queries.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
        pending = false;

        // Every further change restarts the window
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(debounce) => break,
                changed = queries.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let query = queries.borrow_and_update().clone();
        if !query.visible {
            results.send_modify(|r| r.searching = false);
            continue;
        }

        results.send_modify(|r| r.searching = true);
        tokio::select! {
            _ = cancel.cancelled() => return,
            hits = search.search(&query.term, query.filter, &query.scope) => {
                results.send_replace(SearchResults {
                    query,
                    hits,
                    searching: false,
                });
            }
            changed = queries.changed() => {
                if changed.is_err() {
                    return;
                }
                tracing::debug!("Query changed mid-search, restarting");
                pending = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use worldloom_adapters::infrastructure::testing::MockBackend;
    use worldloom_domain::catalog::HISTORICAL_EVENT_SPEC;
    use worldloom_domain::WorldId;
    use worldloom_ports::outbound::ApiError;

    fn lore_backend() -> MockBackend {
        let backend = MockBackend::new();
        backend.seed(
            "/api/characters",
            vec![
                json!({"id": 1, "world_id": 1, "name": "暴风剑圣", "description": "Sword saint"}),
                json!({"id": 2, "world_id": 1, "name": "Lin", "description": "Child of the STORM"}),
                json!({"id": 3, "world_id": 2, "name": "暴风 of another world"}),
            ],
        );
        backend.seed(
            "/api/locations",
            vec![json!({"id": 7, "world_id": 1, "name": "暴风城", "description": "Storm keep"})],
        );
        backend.seed(
            HISTORICAL_EVENT_SPEC.endpoint,
            vec![json!({"id": 9, "world_id": 1, "title": "The Long Storm"})],
        );
        backend
    }

    fn world_one() -> Scope {
        Scope::world(WorldId::from(1))
    }

    #[tokio::test]
    async fn character_filter_returns_only_matching_characters() {
        let backend = lore_backend();
        let search = GlobalSearch::new(Api::new(Arc::new(backend)));

        let hits = search
            .search("暴风", TypeFilter::Kind(EntityKind::Character), &world_one())
            .await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, EntityKind::Character);
        assert_eq!(hits[0].label(), "暴风剑圣");
    }

    #[tokio::test]
    async fn matching_is_case_insensitive_across_kinds_and_fields() {
        let backend = lore_backend();
        let search = GlobalSearch::new(Api::new(Arc::new(backend)));

        let hits = search.search("storm", TypeFilter::All, &world_one()).await;
        let kinds: Vec<EntityKind> = hits.iter().map(|h| h.kind).collect();

        assert_eq!(
            kinds,
            vec![
                EntityKind::Character,
                EntityKind::Location,
                EntityKind::HistoricalEvent
            ]
        );
        assert_eq!(hits[0].type_name, "Character");
    }

    #[tokio::test]
    async fn blank_term_or_no_world_fetches_nothing() {
        let backend = lore_backend();
        let search = GlobalSearch::new(Api::new(Arc::new(backend.clone())));

        assert!(search.search("   ", TypeFilter::All, &world_one()).await.is_empty());
        assert!(search.search("storm", TypeFilter::All, &Scope::none()).await.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn failing_kind_contributes_nothing() {
        let backend = lore_backend();
        backend.fail("GET", "/api/locations", ApiError::http(500, "down"));
        let search = GlobalSearch::new(Api::new(Arc::new(backend.clone())));

        let hits = search.search("storm", TypeFilter::All, &world_one()).await;

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.kind != EntityKind::Location));
        assert_eq!(backend.calls().len(), EntityKind::ALL.len());
    }

    #[tokio::test(start_paused = true)]
    async fn typing_is_debounced_into_one_search() {
        let backend = lore_backend();
        let search = Arc::new(GlobalSearch::with_kinds(
            Api::new(Arc::new(backend.clone())),
            vec![EntityKind::Character, EntityKind::Location],
        ));
        let session = SearchSession::spawn(search, Duration::from_millis(300));
        let mut results = session.results();

        session.set_scope(world_one());
        session.set_visible(true);
        for partial in ["s", "st", "sto", "storm"] {
            session.set_term(partial);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let latest = results
            .wait_for(|r| r.query.term == "storm" && !r.searching)
            .await
            .unwrap()
            .clone();

        assert_eq!(latest.hits.len(), 2);
        assert_eq!(backend.calls().len(), 2);
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_panel_does_not_search() {
        let backend = lore_backend();
        let search = Arc::new(GlobalSearch::new(Api::new(Arc::new(backend.clone()))));
        let session = SearchSession::spawn(search, Duration::from_millis(300));

        session.set_scope(world_one());
        session.set_term("storm");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(backend.calls().is_empty());
        assert!(session.latest().hits.is_empty());
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn newer_query_replaces_an_in_flight_search() {
        let backend = lore_backend();
        backend.set_latency("/api/characters", Duration::from_millis(1_000));
        let search = Arc::new(GlobalSearch::with_kinds(
            Api::new(Arc::new(backend.clone())),
            vec![EntityKind::Character],
        ));
        let session = SearchSession::spawn(search, Duration::from_millis(100));
        let mut results = session.results();

        session.set_scope(world_one());
        session.set_visible(true);
        session.set_term("sword");
        results.wait_for(|r| r.searching).await.unwrap();

        session.set_term("storm");
        let latest = results
            .wait_for(|r| r.query.term == "storm" && !r.searching)
            .await
            .unwrap()
            .clone();

        assert_eq!(latest.hits.len(), 1);
        assert_eq!(latest.hits[0].label(), "Lin");
        assert_eq!(backend.calls().len(), 2);
        session.shutdown().await;
    }
}
