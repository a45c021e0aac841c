//! User account command handlers.

use tabled::Tabled;

use ptit_core::{AccountStatus, NewUser, Role, User, UserPatch};

use crate::cli::{GlobalOpts, UserCreateArgs, UserUpdateArgs, UsersArgs, UsersCommand};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    full_name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl UserRow {
    fn new(u: &User, color: bool) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            full_name: util::or_dash(u.full_name.as_deref()),
            email: util::or_dash(u.email.as_deref()),
            role: u.role.to_string(),
            status: output::paint_status(
                u.status.as_ref(),
                u.status == AccountStatus::Active,
                color,
            ),
        }
    }
}

fn detail(u: &User) -> String {
    [
        format!("ID:       {}", u.id),
        format!("Username: {}", u.username),
        format!("Name:     {}", util::or_dash(u.full_name.as_deref())),
        format!("Email:    {}", util::or_dash(u.email.as_deref())),
        format!("Role:     {}", u.role),
        format!("Status:   {}", u.status),
        format!("Created:  {}", util::timestamp(u.created_at.as_ref())),
    ]
    .join("\n")
}

// ── Payloads ────────────────────────────────────────────────────────

fn draft(args: UserCreateArgs) -> Result<NewUser, CliError> {
    let mut draft = match &args.from_file {
        Some(path) => util::read_json_file(path)?,
        None => NewUser {
            username: args.username.unwrap_or_default(),
            email: args.email.unwrap_or_default(),
            full_name: args.full_name,
            password: None,
            role: args.role,
        },
    };
    if args.password {
        let password = rpassword::prompt_password("Initial password: ")?;
        if password.is_empty() {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "password cannot be empty".into(),
            });
        }
        draft.password = Some(password);
    }
    Ok(draft)
}

fn patch(args: UserUpdateArgs) -> Result<(String, UserPatch), CliError> {
    let patch = match &args.from_file {
        Some(path) => util::read_json_file(path)?,
        None => UserPatch {
            username: args.username,
            email: args.email,
            full_name: args.full_name,
            role: None,
        },
    };
    Ok((args.id, patch))
}

// ── Role change ─────────────────────────────────────────────────────

async fn change_role(
    conn: &Connection,
    raw_id: &str,
    role: Role,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let page = util::load_page::<User>(conn).await?;
    let user = util::find(&page, raw_id)?;
    if user.role == role {
        output::print_status(
            &format!("user {} already has role {role}", user.id),
            global.quiet,
        );
        return Ok(());
    }
    let mut events = page.orchestrator().subscribe();
    let updated = page.orchestrator().submit_role_change(&user.id, role).await?;
    util::drain_events(&mut events, global.quiet);
    let out = output::render_single(global.output, &updated, detail, |u| u.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(conn: &Connection, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        UsersCommand::List(list) => {
            util::list::<User, _>(conn, &list, global, |u| UserRow::new(u, color)).await
        }
        UsersCommand::Get { id } => util::get::<User>(conn, &id, global, detail).await,
        UsersCommand::Create(create) => {
            util::create::<User>(conn, &draft(create)?, global, detail).await
        }
        UsersCommand::Update(update) => {
            let (id, patch) = patch(update)?;
            util::update::<User>(conn, &id, &patch, global, detail).await
        }
        UsersCommand::Delete { id } => util::delete::<User>(conn, &id, global).await,
        UsersCommand::Role { id, role } => change_role(conn, &id, role, global).await,
        UsersCommand::Enable { id } => util::set_active::<User>(conn, &id, true, global).await,
        UsersCommand::Disable { id } => util::set_active::<User>(conn, &id, false, global).await,
    }
}
