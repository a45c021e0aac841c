//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tabled::Tabled;
use tokio::sync::broadcast;

use ptit_core::{
    Editable, EntityId, HttpBackend, ListBackend, Listable, OperationEvent, PageSize,
    ResourceBackend, ResourcePage, StatusBackend, Toggleable, ViewState,
};

use crate::cli::{FilterArg, GlobalOpts, ListArgs, OutputFormat};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

pub type Page<T> = ResourcePage<T, HttpBackend>;

/// Record identifiers are numeric or opaque strings; both parse.
pub fn parse_id(raw: &str) -> EntityId {
    let Ok(id) = raw.trim().parse::<EntityId>();
    id
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("{}: {e}", path.display()),
    })
}

/// Print success toasts for settled operations; failures surface as the
/// command's error instead.
pub fn drain_events(events: &mut broadcast::Receiver<OperationEvent>, quiet: bool) {
    while let Ok(event) = events.try_recv() {
        if event.is_success() {
            output::print_status(&event.to_string(), quiet);
        }
    }
}

fn apply_filters(view: &mut ViewState, filters: &[FilterArg]) {
    for filter in filters {
        view.filters.insert(filter.key.clone(), filter.value.clone());
    }
}

/// Translate list flags into a view state for `T`.
pub fn view_state<T: Listable>(args: &ListArgs, default_size: PageSize) -> Result<ViewState, CliError> {
    let mut view = ViewState::for_keys(T::FILTER_KEYS);
    view.search_term = args.search.clone().unwrap_or_default();
    apply_filters(&mut view, &args.filters);
    view.page = args.page;
    view.page_size = match args.page_size {
        Some(size) => PageSize::new(size)?,
        None => default_size,
    };
    Ok(view)
}

/// Search and filter flags only; paging left at defaults.
pub fn filter_view<T: Listable>(search: Option<&str>, filters: &[FilterArg]) -> ViewState {
    let mut view = ViewState::for_keys(T::FILTER_KEYS);
    view.search_term = search.unwrap_or_default().to_owned();
    apply_filters(&mut view, filters);
    view
}

/// Open a page for `T` and fetch its source collection.
pub async fn load_page<T>(conn: &Connection) -> Result<Page<T>, CliError>
where
    T: Listable,
    HttpBackend: ListBackend<T>,
{
    let mut page = ResourcePage::new(conn.client.build_backend()?);
    let count = page.load().await?;
    tracing::debug!(entity = T::ENTITY_TYPE, count, "collection loaded");
    Ok(page)
}

/// Look up a loaded record by id.
pub fn find<T, B>(page: &ResourcePage<T, B>, raw_id: &str) -> Result<Arc<T>, CliError>
where
    T: Listable,
    B: ListBackend<T>,
{
    page.orchestrator()
        .collection()
        .get(&parse_id(raw_id))
        .ok_or_else(|| CliError::not_found(T::ENTITY_TYPE, raw_id))
}

// ── Generic read handlers ───────────────────────────────────────────

/// `<resource> list`: one page plus the range footer.
pub async fn list<T, R>(
    conn: &Connection,
    args: &ListArgs,
    global: &GlobalOpts,
    to_row: impl Fn(&Arc<T>) -> R,
) -> Result<(), CliError>
where
    T: Listable + Serialize,
    HttpBackend: ListBackend<T>,
    R: Tabled,
{
    let view = view_state::<T>(args, conn.page_size)?;
    let mut page = ResourcePage::with_view(conn.client.build_backend()?, view)?;
    page.load().await?;

    let visible = page.visible_page();
    let out = output::render_list(global.output, &visible.items, to_row, |r| {
        r.id().to_string()
    })?;
    output::print_output(&out, global.quiet);
    if matches!(global.output, OutputFormat::Table) {
        output::print_status(&output::page_footer(&visible), global.quiet);
    }
    Ok(())
}

/// `<resource> get <id>`.
pub async fn get<T>(
    conn: &Connection,
    raw_id: &str,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError>
where
    T: Listable + Serialize,
    HttpBackend: ListBackend<T>,
{
    let page = load_page::<T>(conn).await?;
    let record = find(&page, raw_id)?;
    render_record(record.as_ref(), global, detail)
}

// ── Generic mutation handlers ───────────────────────────────────────

fn render_record<T: Listable + Serialize>(
    record: &T,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError> {
    let out = output::render_single(global.output, record, detail, |r| r.id().to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// `<resource> create`: validate, submit, print the server's record.
pub async fn create<T>(
    conn: &Connection,
    draft: &T::Draft,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError>
where
    T: Editable + Serialize,
    HttpBackend: ResourceBackend<T>,
{
    let page: Page<T> = ResourcePage::new(conn.client.build_backend()?);
    let mut events = page.orchestrator().subscribe();
    let created = page.orchestrator().submit_create(draft).await?;
    drain_events(&mut events, global.quiet);
    render_record(&created, global, detail)
}

/// `<resource> update <id>`: submit only the fields that were given.
pub async fn update<T>(
    conn: &Connection,
    raw_id: &str,
    patch: &T::Patch,
    global: &GlobalOpts,
    detail: impl Fn(&T) -> String,
) -> Result<(), CliError>
where
    T: Editable + Serialize,
    HttpBackend: ResourceBackend<T>,
{
    let page: Page<T> = ResourcePage::new(conn.client.build_backend()?);
    let mut events = page.orchestrator().subscribe();
    let updated = page
        .orchestrator()
        .submit_update(&parse_id(raw_id), patch)
        .await?;
    drain_events(&mut events, global.quiet);
    render_record(&updated, global, detail)
}

/// `<resource> delete <id>`: confirm, then delete.
pub async fn delete<T>(conn: &Connection, raw_id: &str, global: &GlobalOpts) -> Result<(), CliError>
where
    T: Editable,
    HttpBackend: ResourceBackend<T>,
{
    let page = load_page::<T>(conn).await?;
    let record = find(&page, raw_id)?;
    let confirmation = page.orchestrator().request_delete(record.id());
    if !confirm(&confirmation.prompt(), global.yes)? {
        output::print_status("Aborted", global.quiet);
        return Ok(());
    }
    let mut events = page.orchestrator().subscribe();
    page.orchestrator().submit_delete(confirmation).await?;
    drain_events(&mut events, global.quiet);
    Ok(())
}

/// `<resource> enable|disable <id>`. A record already in the requested
/// state is left alone.
pub async fn set_active<T>(
    conn: &Connection,
    raw_id: &str,
    active: bool,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    T: Toggleable,
    HttpBackend: StatusBackend<T> + ListBackend<T>,
{
    let page = load_page::<T>(conn).await?;
    let record = find(&page, raw_id)?;
    if record.is_active() == active {
        let state = if active { "enabled" } else { "disabled" };
        output::print_status(
            &format!("{} {} is already {state}", T::ENTITY_TYPE, record.id()),
            global.quiet,
        );
        return Ok(());
    }
    let mut events = page.orchestrator().subscribe();
    page.orchestrator()
        .submit_status_toggle(record.id(), record.is_active())
        .await?;
    drain_events(&mut events, global.quiet);
    Ok(())
}

/// `-` for absent optional cells.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

/// `YYYY-MM-DD HH:MM` or `-`.
pub fn timestamp(value: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}
