use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tp", about = concat!("[*] taskpad v", env!("CARGO_PKG_VERSION"), " - your tasks stay on your machine"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks (filtered, searched, sorted)
    List(ListArgs),
    /// Show task details
    Show(IdArg),
    /// Edit a task's fields
    Edit(EditArgs),
    /// Toggle a task between pending and completed
    Toggle(IdArg),
    /// Complete the given tasks (bulk; already-completed tasks are untouched)
    Done(BulkArgs),
    /// Delete the given tasks and their subtasks (bulk)
    Rm(BulkArgs),
    /// Set a priority on the given tasks (bulk)
    Priority(PriorityArgs),
    /// Move a task so it sits just before another
    Mv(MvArgs),
    /// Subtask operations
    Sub(SubCmd),
    /// Save, instantiate, and manage task templates
    Template(TemplateCmd),
    /// Export the task list (or chat transcript) to a JSON file
    Export(ExportArgs),
    /// Replace the task list from a JSON file
    Import(ImportArgs),
    /// Show or set the display theme
    Theme(ThemeArgs),
    /// Ask the chat helper
    Chat(ChatArgs),
    /// Run the chat relay HTTP server
    Serve,
    /// Sign in against the configured identity service
    Login(CredentialArgs),
    /// Create an account on the configured identity service
    Signup(CredentialArgs),
    /// Forget the stored session
    Logout,
    /// Undo the most recent task mutation
    Undo,
}

// ---------------------------------------------------------------------------
// Task command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Longer description
    #[arg(long)]
    pub desc: Option<String>,
    /// Priority (low, medium, high, urgent)
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD or RFC3339)
    #[arg(long)]
    pub due: Option<String>,
    /// Category label
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Status filter (all, pending, completed)
    #[arg(long)]
    pub status: Option<String>,
    /// Substring to search in title, description, and category
    #[arg(long)]
    pub search: Option<String>,
    /// Sort key (date, priority, due, alpha)
    #[arg(long)]
    pub sort: Option<String>,
    /// Show the subtasks of the given task inline (repeatable)
    #[arg(long = "expand", value_name = "ID")]
    pub expand: Vec<u64>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: u64,
}

/// Target selection for the bulk commands: explicit ids, or `--all` for
/// every task in the current view (optionally narrowed like `list`).
#[derive(Args)]
pub struct BulkArgs {
    /// Task IDs
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub ids: Vec<u64>,
    /// Apply to every task in the current view instead of naming ids
    #[arg(long)]
    pub all: bool,
    /// Narrow --all to a status (all, pending, completed)
    #[arg(long, requires = "all")]
    pub status: Option<String>,
    /// Narrow --all to tasks matching a search string
    #[arg(long, requires = "all")]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: u64,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description
    #[arg(long)]
    pub desc: Option<String>,
    /// Clear the description
    #[arg(long, conflicts_with = "desc")]
    pub clear_desc: bool,
    /// New priority (low, medium, high, urgent)
    #[arg(long)]
    pub priority: Option<String>,
    /// New due date (YYYY-MM-DD or RFC3339)
    #[arg(long)]
    pub due: Option<String>,
    /// Clear the due date
    #[arg(long, conflicts_with = "due")]
    pub clear_due: bool,
    /// New category label
    #[arg(long)]
    pub category: Option<String>,
    /// Clear the category
    #[arg(long, conflicts_with = "category")]
    pub clear_category: bool,
}

#[derive(Args)]
pub struct PriorityArgs {
    /// Priority (low, medium, high, urgent)
    pub priority: String,
    #[command(flatten)]
    pub select: BulkArgs,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID to move
    pub id: u64,
    /// The task it should be placed before
    pub before: u64,
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a subtask to a task
    Add(SubAddArgs),
    /// Toggle a subtask's checkbox
    Toggle(SubIdArgs),
    /// Remove a subtask
    Rm(SubIdArgs),
}

#[derive(Args)]
pub struct SubAddArgs {
    /// Parent task ID
    pub task_id: u64,
    /// Subtask title
    pub title: String,
}

#[derive(Args)]
pub struct SubIdArgs {
    /// Parent task ID
    pub task_id: u64,
    /// Subtask ID
    pub subtask_id: u64,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TemplateCmd {
    #[command(subcommand)]
    pub action: TemplateAction,
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Snapshot a task as a template
    Save(IdArg),
    /// Stamp out a new task from a template
    Use(TemplateIdArg),
    /// List saved templates
    List,
    /// Delete a template
    Rm(TemplateIdArg),
}

#[derive(Args)]
pub struct TemplateIdArg {
    /// Template ID
    pub id: u64,
}

// ---------------------------------------------------------------------------
// Transfer, theme, chat, auth
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Output file path
    pub file: String,
    /// Export the chat transcript instead of the task list
    #[arg(long)]
    pub chat: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file holding an array of tasks
    pub file: String,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// Theme to set (dark, light); omit to print the current theme
    pub value: Option<String>,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Message for the chat helper
    pub message: String,
}

#[derive(Args)]
pub struct CredentialArgs {
    /// Email address
    pub email: String,
    /// Password (at least 6 characters)
    pub password: String,
}
