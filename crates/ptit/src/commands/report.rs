//! `ptit report`: record counts per filter value.

use serde::Serialize;
use tabled::Tabled;

use ptit_core::{
    Device, DeviceType, FacetReport, HistoryEntry, HttpBackend, ListBackend, Listable,
    Notification, ResourcePage, User, facet_counts,
};

use crate::cli::{GlobalOpts, OutputFormat, ReportArgs, ReportResource};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Clone, Serialize, Tabled)]
struct BucketRow {
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

fn share(count: usize, total: usize) -> String {
    if total == 0 {
        return "-".into();
    }
    // Integer tenths of a percent, rounded half up.
    let tenths = (count * 1000 + total / 2) / total;
    format!("{}.{}%", tenths / 10, tenths % 10)
}

fn rows(report: &FacetReport) -> Vec<BucketRow> {
    report
        .buckets
        .iter()
        .map(|(value, count)| BucketRow {
            value: value.clone(),
            count: *count,
            share: share(*count, report.total),
        })
        .collect()
}

async fn facet<T>(conn: &Connection, args: &ReportArgs) -> Result<FacetReport, CliError>
where
    T: Listable,
    HttpBackend: ListBackend<T>,
{
    let view = util::filter_view::<T>(args.filter.search.as_deref(), &args.filter.filters);
    let mut page = ResourcePage::with_view(conn.client.build_backend()?, view)?;
    page.load().await?;
    Ok(facet_counts(&page.list().filtered(), &args.by)?)
}

pub async fn handle(conn: &Connection, args: ReportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let report = match args.resource {
        ReportResource::Users => facet::<User>(conn, &args).await?,
        ReportResource::DeviceTypes => facet::<DeviceType>(conn, &args).await?,
        ReportResource::Devices => facet::<Device>(conn, &args).await?,
        ReportResource::History => facet::<HistoryEntry>(conn, &args).await?,
        ReportResource::Notifications => facet::<Notification>(conn, &args).await?,
    };

    let out = match global.output {
        OutputFormat::Table => {
            output::render_list(global.output, &rows(&report), Clone::clone, |r| r.value.clone())?
        }
        OutputFormat::Plain => report
            .buckets
            .iter()
            .map(|(value, count)| format!("{value}\t{count}"))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_single(global.output, &report, |_| String::new(), |_| String::new())?
        }
    };
    output::print_output(&out, global.quiet);
    if matches!(global.output, OutputFormat::Table) {
        output::print_status(
            &format!("{} {} records by {}", report.total, report.entity_type, report.key),
            global.quiet,
        );
    }
    Ok(())
}
