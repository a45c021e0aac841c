//! Notification handlers.

use tabled::Tabled;

use ptit_core::{NewNotification, Notification, NotificationLevel, NotificationPatch};

use crate::cli::{GlobalOpts, NotificationFields, NotificationsArgs, NotificationsCommand};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Read")]
    read: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl NotificationRow {
    fn new(n: &Notification, color: bool) -> Self {
        Self {
            id: n.id.to_string(),
            level: output::paint_status(
                n.level.as_ref(),
                n.level == NotificationLevel::Info,
                color,
            ),
            title: n.title.clone(),
            read: if n.read { "yes" } else { "no" }.into(),
            created: util::timestamp(n.created_at.as_ref()),
        }
    }
}

fn detail(n: &Notification) -> String {
    [
        format!("ID:      {}", n.id),
        format!("Title:   {}", n.title),
        format!("Level:   {}", n.level),
        format!("Read:    {}", n.read),
        format!("Created: {}", util::timestamp(n.created_at.as_ref())),
        String::new(),
        n.message.clone().unwrap_or_default(),
    ]
    .join("\n")
}

fn draft(fields: NotificationFields) -> Result<NewNotification, CliError> {
    if let Some(path) = &fields.from_file {
        return util::read_json_file(path);
    }
    Ok(NewNotification {
        title: fields.title.unwrap_or_default(),
        message: fields.message,
        level: fields.level,
    })
}

fn patch(fields: NotificationFields) -> Result<NotificationPatch, CliError> {
    if let Some(path) = &fields.from_file {
        return util::read_json_file(path);
    }
    Ok(NotificationPatch {
        title: fields.title,
        message: fields.message,
        level: fields.level,
    })
}

async fn mark_read(conn: &Connection, raw_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let page = util::load_page::<Notification>(conn).await?;
    let notification = util::find(&page, raw_id)?;
    if notification.read {
        output::print_status(
            &format!("notification {} is already read", notification.id),
            global.quiet,
        );
        return Ok(());
    }
    let mut events = page.orchestrator().subscribe();
    page.orchestrator().submit_mark_read(&notification.id).await?;
    util::drain_events(&mut events, global.quiet);
    Ok(())
}

pub async fn handle(
    conn: &Connection,
    args: NotificationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        NotificationsCommand::List(list) => {
            util::list::<Notification, _>(conn, &list, global, |n| NotificationRow::new(n, color))
                .await
        }
        NotificationsCommand::Get { id } => {
            util::get::<Notification>(conn, &id, global, detail).await
        }
        NotificationsCommand::Create(fields) => {
            util::create::<Notification>(conn, &draft(fields)?, global, detail).await
        }
        NotificationsCommand::Update { id, fields } => {
            util::update::<Notification>(conn, &id, &patch(fields)?, global, detail).await
        }
        NotificationsCommand::Delete { id } => {
            util::delete::<Notification>(conn, &id, global).await
        }
        NotificationsCommand::Read { id } => mark_read(conn, &id, global).await,
    }
}
