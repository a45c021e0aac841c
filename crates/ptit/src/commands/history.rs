//! History log handlers (read-only).

use tabled::Tabled;

use ptit_core::HistoryEntry;

use crate::cli::{GlobalOpts, HistoryArgs, HistoryCommand};
use crate::config::Connection;
use crate::error::CliError;

use super::util;

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "By")]
    actor: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(h: &HistoryEntry) -> Self {
        Self {
            id: h.id.to_string(),
            time: util::timestamp(h.timestamp.as_ref()),
            device: util::or_dash(h.device.as_deref()),
            action: h.action.clone(),
            actor: util::or_dash(h.actor.as_deref()),
            detail: util::or_dash(h.detail.as_deref()),
        }
    }
}

fn detail(h: &HistoryEntry) -> String {
    [
        format!("ID:     {}", h.id),
        format!("Time:   {}", util::timestamp(h.timestamp.as_ref())),
        format!("Device: {}", util::or_dash(h.device.as_deref())),
        format!("Action: {}", h.action),
        format!("By:     {}", util::or_dash(h.actor.as_deref())),
        format!("Detail: {}", util::or_dash(h.detail.as_deref())),
    ]
    .join("\n")
}

pub async fn handle(conn: &Connection, args: HistoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        HistoryCommand::List(list) => {
            util::list::<HistoryEntry, _>(conn, &list, global, |h| HistoryRow::from(h.as_ref()))
                .await
        }
        HistoryCommand::Get { id } => util::get::<HistoryEntry>(conn, &id, global, detail).await,
    }
}
