//! Clap derive structures for the `ptit` CLI.
//!
//! Defines the command tree, global flags, and the list arguments shared
//! by every resource.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ptit_core::{FilterValue, Role};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ptit -- administer users, device types, devices and notifications
#[derive(Debug, Parser)]
#[command(
    name = "ptit",
    version,
    about = "Administer the PTIT IoT Platform from the command line",
    long_about = "Manage users, device types, devices, history and notifications\n\
        on a PTIT IoT Platform backend. Lists support search, categorical\n\
        filters and pagination; mutations report success or failure per record.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "PTIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, env = "PTIT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token issued by the auth service
    #[arg(long, env = "PTIT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PTIT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PTIT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PTIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage user accounts, roles and account status
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage the device type catalogue
    #[command(alias = "types")]
    DeviceTypes(DeviceTypesArgs),

    /// Manage registered devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Browse the device history log
    History(HistoryArgs),

    /// Manage notifications
    #[command(alias = "notif")]
    Notifications(NotificationsArgs),

    /// Count records per filter value
    Report(ReportArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// A `key=value` filter; `key=all` clears the dimension.
#[derive(Debug, Clone)]
pub struct FilterArg {
    pub key: String,
    pub value: FilterValue,
}

fn parse_filter(raw: &str) -> Result<FilterArg, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter key in '{raw}'"));
    }
    let Ok(value) = value.parse::<FilterValue>();
    Ok(FilterArg {
        key: key.to_owned(),
        value,
    })
}

/// Search, filter and paging arguments shared by all list commands.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Case-insensitive substring match over the searchable fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Categorical filter, e.g. `--filter status=active` (repeatable)
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,

    /// Page to show (1-based; clamped to the last page)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page (overrides profile)
    #[arg(long)]
    pub page_size: Option<usize>,
}

/// Search and filter arguments without paging, for whole-set commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive substring match over the searchable fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Categorical filter, e.g. `--filter status=active` (repeatable)
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users (filters: role, status)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one user
    Get { id: String },

    /// Create a user
    Create(UserCreateArgs),

    /// Update a user's profile fields
    Update(UserUpdateArgs),

    /// Delete a user
    #[command(alias = "rm")]
    Delete { id: String },

    /// Change a user's role
    Role {
        id: String,
        /// New role: admin or user
        role: Role,
    },

    /// Re-enable a disabled account
    Enable { id: String },

    /// Disable an account
    Disable { id: String },
}

#[derive(Debug, Args)]
pub struct UserCreateArgs {
    /// Login name
    #[arg(long)]
    pub username: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Display name
    #[arg(long)]
    pub full_name: Option<String>,

    /// Initial role: admin or user
    #[arg(long)]
    pub role: Option<Role>,

    /// Prompt for an initial password
    #[arg(long)]
    pub password: bool,

    /// Read the full record from a JSON file
    #[arg(long, conflicts_with_all = ["username", "email", "full_name", "role"])]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UserUpdateArgs {
    pub id: String,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub full_name: Option<String>,

    /// Read the changed fields from a JSON file
    #[arg(long, conflicts_with_all = ["username", "email", "full_name"])]
    pub from_file: Option<PathBuf>,
}

// ── Device types ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceTypesArgs {
    #[command(subcommand)]
    pub command: DeviceTypesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceTypesCommand {
    /// List device types (filter: category)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one device type
    Get { id: String },

    /// Create a device type
    Create(DeviceTypeFields),

    /// Update a device type
    Update {
        id: String,
        #[command(flatten)]
        fields: DeviceTypeFields,
    },

    /// Delete a device type
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct DeviceTypeFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub manufacturer: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Read the fields from a JSON file
    #[arg(long, conflicts_with_all = ["name", "description", "manufacturer", "category"])]
    pub from_file: Option<PathBuf>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices (filters: device_type, status)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one device
    Get { id: String },

    /// Register a device
    Create(DeviceFields),

    /// Update a device
    Update {
        id: String,
        #[command(flatten)]
        fields: DeviceFields,
    },

    /// Delete a device
    #[command(alias = "rm")]
    Delete { id: String },

    /// Mark a device active
    Enable { id: String },

    /// Mark a device inactive
    Disable { id: String },

    /// Bulk-register devices from a JSON array
    Import {
        /// JSON file holding an array of device records
        #[arg(long)]
        from_file: PathBuf,

        /// Maximum requests in flight
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
}

#[derive(Debug, Args)]
pub struct DeviceFields {
    #[arg(long)]
    pub name: Option<String>,

    /// Device type name
    #[arg(long = "type")]
    pub device_type: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long = "mac")]
    pub mac_address: Option<String>,

    /// Read the fields from a JSON file
    #[arg(long, conflicts_with_all = ["name", "device_type", "location", "mac_address"])]
    pub from_file: Option<PathBuf>,
}

// ── History ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List history entries (filter: action)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one history entry
    Get { id: String },
}

// ── Notifications ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// List notifications (filters: level, read)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one notification
    Get { id: String },

    /// Publish a notification
    Create(NotificationFields),

    /// Update a notification
    Update {
        id: String,
        #[command(flatten)]
        fields: NotificationFields,
    },

    /// Delete a notification
    #[command(alias = "rm")]
    Delete { id: String },

    /// Mark a notification as read
    Read { id: String },
}

#[derive(Debug, Args)]
pub struct NotificationFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub message: Option<String>,

    /// info, warning or critical
    #[arg(long)]
    pub level: Option<ptit_core::NotificationLevel>,

    /// Read the fields from a JSON file
    #[arg(long, conflicts_with_all = ["title", "message", "level"])]
    pub from_file: Option<PathBuf>,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Resource to count
    pub resource: ReportResource,

    /// Filter key to group by (e.g. status, role, device_type)
    #[arg(long)]
    pub by: String,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportResource {
    Users,
    DeviceTypes,
    Devices,
    History,
    Notifications,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (tokens redacted)
    Show,

    /// Set a profile value
    Set {
        /// Key: api_url, token_env, ca_cert, insecure, timeout, page_size, role_change
        key: String,
        value: String,
    },

    /// List profiles (default marked with *)
    Profiles,

    /// Set the default profile
    Use { name: String },

    /// Store the profile's bearer token in the system keyring
    SetToken {
        /// Read the token from this env var instead of prompting
        #[arg(long)]
        from_env: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
