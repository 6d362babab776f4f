use std::io::{self, Write};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldloom_adapters::infrastructure::AppConfig;
use worldloom_app::application::{DeleteOutcome, SelectionState};
use worldloom_domain::catalog::ALL_SPECS;
use worldloom_domain::{
    DomainError, EntityRecord, EntityStatistics, FormValues, Resource, ResourceSpec, Scope,
    SearchHit, TypeFilter, World,
};

use crate::cli::{Command, USAGE};
use crate::composition::App;

pub async fn run() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldloom=info,worldloom_app=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = AppConfig::from_env()?;
    tracing::debug!(api = %config.api_base_url, storage = ?config.storage_path, "Configuration loaded");

    let assume_yes = matches!(command, Command::Delete { assume_yes: true, .. });
    let app = App::from_config(&config, assume_yes)?;

    let mut stdout = io::stdout().lock();
    let result = execute(&app, command, &mut stdout).await;
    app.selection.shutdown();
    result
}

enum Action {
    List,
    Stats,
    Create(FormValues),
    Edit(String, FormValues),
    Delete(String),
}

/// Run one parsed command, writing its output to `out`
pub async fn execute(app: &App, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Help => writeln!(out, "{}", USAGE)?,
        Command::Kinds => print_kinds(out)?,
        Command::Worlds => {
            app.selection.load_worlds().await?;
            print_worlds(&app.selection.snapshot(), out)?;
        }
        Command::Select(None) => {
            app.selection.select_world(None);
            writeln!(out, "Selection cleared")?;
        }
        Command::Select(Some(id)) => {
            app.selection.load_worlds().await?;
            let world = app
                .selection
                .select_by_id(&id)
                .map_err(|_| anyhow!("no world with id {}", id))?;
            writeln!(out, "Selected world {} ({})", world.name, world.id)?;
        }
        Command::List(spec) => dispatch(app, spec, Action::List, out).await?,
        Command::Stats(spec) => dispatch(app, spec, Action::Stats, out).await?,
        Command::Create { spec, values } => dispatch(app, spec, Action::Create(values), out).await?,
        Command::Edit { spec, id, values } => {
            dispatch(app, spec, Action::Edit(id, values), out).await?
        }
        Command::Delete { spec, id, .. } => dispatch(app, spec, Action::Delete(id), out).await?,
        Command::Search { term, filter } => {
            let scope = world_scope(app).await?;
            let hits = app.search().search(&term, filter, &scope).await;
            print_hits(&hits, out)?;
        }
        Command::Browse(filter) => {
            let scope = world_scope(app).await?;
            browse(app, scope, filter, BufReader::new(tokio::io::stdin()), out).await?;
        }
    }
    Ok(())
}

/// Feed each input line to a search session and print the settled results
async fn browse<I>(
    app: &App,
    scope: Scope,
    filter: TypeFilter,
    input: I,
    out: &mut dyn Write,
) -> Result<()>
where
    I: AsyncBufRead + Unpin,
{
    let session = app.search_session(scope, filter);
    let mut results = session.results();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let term = line.trim().to_string();
        if term.is_empty() {
            continue;
        }
        session.set_term(term.clone());
        let settled = match results
            .wait_for(|r| r.query.term == term && !r.searching)
            .await
        {
            Ok(settled) => settled.clone(),
            Err(_) => break,
        };
        writeln!(out, "> {}", term)?;
        print_hits(&settled.hits, out)?;
        out.flush()?;
    }

    session.shutdown().await;
    Ok(())
}

/// Scope of the persisted world selection; fails when nothing is selected
async fn world_scope(app: &App) -> Result<Scope> {
    app.selection.load_worlds().await?;
    let scope = app.selection.snapshot().scope(app.project_id.clone());
    if scope.world_id.is_none() {
        bail!("no world selected; run `worldloom select <world-id>` first");
    }
    Ok(scope)
}

async fn dispatch(
    app: &App,
    spec: &'static ResourceSpec,
    action: Action,
    out: &mut dyn Write,
) -> Result<()> {
    if spec.is_world_scoped() {
        let scope = world_scope(app).await?;
        perform::<EntityRecord>(app, spec, scope, action, out).await
    } else {
        perform::<World>(app, spec, Scope::none(), action, out).await
    }
}

async fn perform<R>(
    app: &App,
    spec: &'static ResourceSpec,
    scope: Scope,
    action: Action,
    out: &mut dyn Write,
) -> Result<()>
where
    R: Resource,
    R::Id: FromStr<Err = DomainError>,
{
    let controller = app.controller::<R>(spec);
    controller
        .fetch_list(scope)
        .await
        .with_context(|| format!("could not load {}s", spec.label.to_lowercase()))?;

    let result = match action {
        Action::List => print_records(&controller.records(), spec, out),
        Action::Stats => print_stats(&controller.statistics(), spec, out),
        Action::Create(values) => {
            controller.open_create();
            controller.submit(values).await?;
            writeln!(out, "Created {}", spec.label.to_lowercase()).map_err(Into::into)
        }
        Action::Edit(raw_id, values) => {
            let id: R::Id = raw_id.parse()?;
            controller
                .open_edit_by_id(&id)
                .map_err(|_| anyhow!("no {} with id {}", spec.label.to_lowercase(), id))?;

            let mut merged = controller
                .snapshot()
                .modal
                .map(|modal| modal.values)
                .unwrap_or_default();
            for (key, value) in values.iter() {
                merged.set(key.clone(), value.clone());
            }

            controller.submit(merged).await?;
            writeln!(out, "Updated {} {}", spec.label.to_lowercase(), id).map_err(Into::into)
        }
        Action::Delete(raw_id) => {
            let id: R::Id = raw_id.parse()?;
            let outcome = controller.delete(&id).await?;
            match outcome {
                DeleteOutcome::Deleted => {
                    writeln!(out, "Deleted {} {}", spec.label.to_lowercase(), id)
                }
                DeleteOutcome::Declined => writeln!(out, "Nothing deleted"),
            }
            .map_err(Into::into)
        }
    };

    controller.close();
    result
}

fn print_kinds(out: &mut dyn Write) -> io::Result<()> {
    for spec in ALL_SPECS.iter() {
        let required: Vec<&str> = spec
            .required_fields
            .iter()
            .map(|field| spec.remap.form_name(field))
            .collect();
        writeln!(out, "{:<18} {}", spec.key, spec.label)?;
        writeln!(out, "    required: {}", required.join(", "))?;
        if let Some(field) = spec.category_field {
            writeln!(
                out,
                "    {}: {}",
                spec.remap.form_name(field),
                spec.categories.join(" | ")
            )?;
        }
    }
    Ok(())
}

fn print_worlds(state: &SelectionState, out: &mut dyn Write) -> io::Result<()> {
    if state.worlds.is_empty() {
        return writeln!(out, "No worlds yet");
    }
    let current = state.current_world_id();
    for world in &state.worlds {
        let marker = if Some(&world.id) == current { "*" } else { " " };
        writeln!(
            out,
            "{} {}\t{}\t{}\t{}",
            marker,
            world.id,
            world.name,
            world.world_type.as_deref().unwrap_or("-"),
            world.status.as_ref().map(|s| s.as_str()).unwrap_or("-")
        )?;
    }
    Ok(())
}

fn print_records<R: Resource>(
    records: &[R],
    spec: &ResourceSpec,
    out: &mut dyn Write,
) -> Result<()> {
    if records.is_empty() {
        writeln!(out, "No {}s", spec.label.to_lowercase())?;
        return Ok(());
    }
    for record in records {
        let name = record.display_name(spec);
        match spec.category_field.and_then(|field| record.field_text(field)) {
            Some(category) => writeln!(out, "{}\t{}\t{}", record.id(), name, category)?,
            None => writeln!(out, "{}\t{}", record.id(), name)?,
        }
    }
    Ok(())
}

fn print_stats(stats: &EntityStatistics, spec: &ResourceSpec, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Total: {}", stats.total)?;
    if let Some(field) = spec.category_field {
        writeln!(out, "By {}:", spec.remap.form_name(field))?;
        for (category, count) in &stats.by_category {
            writeln!(out, "  {}: {}", category, count)?;
        }
        if stats.uncategorized > 0 {
            writeln!(out, "  (none): {}", stats.uncategorized)?;
        }
    }
    if spec.status_field.is_some() && !stats.by_status.is_empty() {
        writeln!(out, "By status:")?;
        for (status, count) in &stats.by_status {
            writeln!(out, "  {}: {}", status, count)?;
        }
    }
    for group in &stats.groups {
        writeln!(out, "Group {}: {}", group.label, group.count)?;
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit], out: &mut dyn Write) -> io::Result<()> {
    if hits.is_empty() {
        return writeln!(out, "No matches");
    }
    for hit in hits {
        writeln!(out, "[{}] {}\t{}", hit.type_name, hit.record.id, hit.label())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use worldloom_adapters::infrastructure::testing::MockBackend;
    use worldloom_adapters::infrastructure::{AutoConfirm, ConsoleNotifier, MemoryStorageProvider};

    fn backend() -> MockBackend {
        let backend = MockBackend::new();
        backend.seed(
            "/api/worlds",
            vec![json!({"id": 1, "name": "Aeloria", "world_type": "fantasy", "status": "draft"})],
        );
        backend.seed(
            "/api/characters",
            vec![
                json!({"id": 1, "world_id": 1, "name": "Mira", "character_type": "protagonist"}),
                json!({"id": 2, "world_id": 1, "name": "Oren", "character_type": "antagonist"}),
            ],
        );
        backend
    }

    fn app(backend: &MockBackend, storage: &Arc<MemoryStorageProvider>) -> App {
        App::new(
            Arc::new(backend.clone()),
            storage.clone(),
            Arc::new(ConsoleNotifier),
            Arc::new(AutoConfirm),
            None,
        )
    }

    async fn run_line(app: &App, line: &str) -> Result<String> {
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let mut out = Vec::new();
        execute(app, Command::parse(&args)?, &mut out).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[tokio::test]
    async fn entity_commands_need_a_selection() {
        let backend = backend();
        let storage = Arc::new(MemoryStorageProvider::new());
        let app = app(&backend, &storage);

        let err = run_line(&app, "list character").await.unwrap_err();
        assert!(err.to_string().contains("no world selected"));
    }

    #[tokio::test]
    async fn selection_persists_between_runs() {
        let backend = backend();
        let storage = Arc::new(MemoryStorageProvider::new());

        let selected = run_line(&app(&backend, &storage), "select 1").await.unwrap();
        assert!(selected.contains("Aeloria"));

        let worlds = run_line(&app(&backend, &storage), "worlds").await.unwrap();
        assert!(worlds.starts_with("* 1\tAeloria\tfantasy\tdraft"));

        let listed = run_line(&app(&backend, &storage), "list character").await.unwrap();
        assert_eq!(listed, "1\tMira\tprotagonist\n2\tOren\tantagonist\n");
    }

    #[tokio::test]
    async fn create_edit_delete_round_trip() {
        let backend = backend();
        let storage = Arc::new(MemoryStorageProvider::new());
        run_line(&app(&backend, &storage), "select 1").await.unwrap();

        run_line(
            &app(&backend, &storage),
            "create power-level level_number=1 level_title=Tempering",
        )
        .await
        .unwrap();
        let stored = backend.records("/api/power-levels");
        assert_eq!(stored[0]["level"], json!(1));
        assert_eq!(stored[0]["level_name"], json!("Tempering"));
        assert_eq!(stored[0]["world_id"], json!(1));

        run_line(&app(&backend, &storage), "edit power-level 1 level_title=Bone-Tempering")
            .await
            .unwrap();
        let stored = backend.records("/api/power-levels");
        assert_eq!(stored[0]["level"], json!(1));
        assert_eq!(stored[0]["level_name"], json!("Bone-Tempering"));

        let deleted = run_line(&app(&backend, &storage), "delete power-level 1 --yes")
            .await
            .unwrap();
        assert_eq!(deleted, "Deleted power level 1\n");
        assert!(backend.records("/api/power-levels").is_empty());
    }

    #[tokio::test]
    async fn stats_and_search_use_the_selected_world() {
        let backend = backend();
        let storage = Arc::new(MemoryStorageProvider::new());
        run_line(&app(&backend, &storage), "select 1").await.unwrap();

        let stats = run_line(&app(&backend, &storage), "stats character").await.unwrap();
        assert!(stats.contains("Total: 2"));
        assert!(stats.contains("Group main: 2"));

        let hits = run_line(&app(&backend, &storage), "search mira --type character")
            .await
            .unwrap();
        assert_eq!(hits, "[Character] 1\tMira\n");
    }

    #[tokio::test]
    async fn invalid_create_is_reported() {
        let backend = backend();
        let storage = Arc::new(MemoryStorageProvider::new());
        run_line(&app(&backend, &storage), "select 1").await.unwrap();

        let err = run_line(&app(&backend, &storage), "create character name=Ilse")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("character_type"));
        assert_eq!(backend.records("/api/characters").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn browse_prints_results_for_each_term() {
        let backend = backend();
        let storage = Arc::new(MemoryStorageProvider::new());
        let mut app = app(&backend, &storage);
        app.search_debounce = std::time::Duration::from_millis(50);
        run_line(&app, "select 1").await.unwrap();
        backend.clear_calls();

        let scope = Scope::world(worldloom_domain::WorldId::from(1));
        let mut out = Vec::new();
        browse(&app, scope, TypeFilter::All, &b"mira\n\noren\n"[..], &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8_lossy(&out),
            "> mira\n[Character] 1\tMira\n> oren\n[Character] 2\tOren\n"
        );
        assert_eq!(backend.call_count("GET", "/api/characters"), 2);
    }
}
