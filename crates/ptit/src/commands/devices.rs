//! Device command handlers.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;

use ptit_core::{Device, DevicePatch, HttpBackend, NewDevice, ResourcePage};

use crate::cli::{DeviceFields, DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl DeviceRow {
    fn new(d: &Device, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            device_type: util::or_dash(d.device_type.as_deref()),
            location: util::or_dash(d.location.as_deref()),
            mac: util::or_dash(d.mac_address.as_deref()),
            status: output::paint_status(
                d.status.as_ref(),
                d.status == ptit_core::DeviceStatus::Active,
                color,
            ),
        }
    }
}

#[derive(Clone, Tabled, Serialize)]
struct ImportFailureRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Error")]
    error: String,
}

#[derive(Serialize)]
struct ImportOutcome {
    created: Vec<Device>,
    failed: Vec<ImportFailureRow>,
}

fn detail(d: &Device) -> String {
    [
        format!("ID:       {}", d.id),
        format!("Name:     {}", d.name),
        format!("Type:     {}", util::or_dash(d.device_type.as_deref())),
        format!("Location: {}", util::or_dash(d.location.as_deref())),
        format!("MAC:      {}", util::or_dash(d.mac_address.as_deref())),
        format!("Status:   {}", d.status),
        format!("Created:  {}", util::timestamp(d.created_at.as_ref())),
    ]
    .join("\n")
}

// ── Payloads ────────────────────────────────────────────────────────

fn draft(fields: DeviceFields) -> Result<NewDevice, CliError> {
    if let Some(path) = &fields.from_file {
        return util::read_json_file(path);
    }
    Ok(NewDevice {
        name: fields.name.unwrap_or_default(),
        device_type: fields.device_type.unwrap_or_default(),
        location: fields.location,
        mac_address: fields.mac_address,
    })
}

fn patch(fields: DeviceFields) -> Result<DevicePatch, CliError> {
    if let Some(path) = &fields.from_file {
        return util::read_json_file(path);
    }
    Ok(DevicePatch {
        name: fields.name,
        device_type: fields.device_type,
        location: fields.location,
        mac_address: fields.mac_address,
    })
}

// ── Import ──────────────────────────────────────────────────────────

fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(len).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

async fn import(
    conn: &Connection,
    path: &std::path::Path,
    concurrency: usize,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let drafts: Vec<NewDevice> = util::read_json_file(path)?;
    let total = drafts.len();
    let page: ResourcePage<Device, HttpBackend> = ResourcePage::new(conn.client.build_backend()?);

    let bar = progress_bar(total, global.quiet);
    bar.set_message("importing");
    let report = page
        .orchestrator()
        .import(&drafts, concurrency, |row, result| {
            if let Err(err) = result {
                bar.println(format!("row {}: {}", row + 1, err.user_message()));
            }
            bar.inc(1);
        })
        .await;
    bar.finish_with_message("done");

    let failures: Vec<ImportFailureRow> = report
        .failed
        .iter()
        .map(|(row, err)| ImportFailureRow {
            row: row + 1,
            name: drafts.get(*row).map(|d| d.name.clone()).unwrap_or_default(),
            error: err.user_message(),
        })
        .collect();
    let failed = failures.len();

    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            if !failures.is_empty() {
                let out = output::render_list(global.output, &failures, Clone::clone, |f| {
                    f.row.to_string()
                })?;
                output::print_output(&out, global.quiet);
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            let outcome = ImportOutcome {
                created: report.created.into_iter().map(|(_, d)| d).collect(),
                failed: failures,
            };
            let out = output::render_single(
                global.output,
                &outcome,
                |_| String::new(),
                |_| String::new(),
            )?;
            output::print_output(&out, global.quiet);
        }
    }

    output::print_status(
        &format!("Imported {} of {total} devices", total - failed),
        global.quiet,
    );
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::PartialFailure { failed, total })
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    conn: &Connection,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        DevicesCommand::List(list) => {
            util::list::<Device, _>(conn, &list, global, |d| DeviceRow::new(d, color)).await
        }
        DevicesCommand::Get { id } => util::get::<Device>(conn, &id, global, detail).await,
        DevicesCommand::Create(fields) => {
            util::create::<Device>(conn, &draft(fields)?, global, detail).await
        }
        DevicesCommand::Update { id, fields } => {
            util::update::<Device>(conn, &id, &patch(fields)?, global, detail).await
        }
        DevicesCommand::Delete { id } => util::delete::<Device>(conn, &id, global).await,
        DevicesCommand::Enable { id } => util::set_active::<Device>(conn, &id, true, global).await,
        DevicesCommand::Disable { id } => {
            util::set_active::<Device>(conn, &id, false, global).await
        }
        DevicesCommand::Import {
            from_file,
            concurrency,
        } => import(conn, &from_file, concurrency, global).await,
    }
}
