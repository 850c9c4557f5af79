use std::fs;
use std::path::PathBuf;

use chrono::Local;

use crate::cli::commands::*;
use crate::cli::output;
use crate::io::config_io::read_config;
use crate::io::lock::StoreLock;
use crate::io::store::Store;
use crate::model::config::AppConfig;
use crate::model::view::{ViewAction, ViewState};
use crate::ops::auth::{AuthError, AuthGate, Session};
use crate::ops::bulk;
use crate::ops::repo::{NewTask, Repo, TaskPatch};
use crate::ops::template_ops::{Templates, use_template};
use crate::ops::transfer::{export_chat, export_tasks, parse_import};
use crate::ops::undo::{Operation, UndoStack, apply_undo};
use crate::ops::view::project;
use crate::relay;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command handler needs: the opened store, the parsed
/// config, and the global output flag.
struct Ctx {
    store: Store,
    config: AppConfig,
    json: bool,
}

impl Ctx {
    /// Take the write lock for the data directory; held until drop.
    fn lock(&self) -> Result<StoreLock, Box<dyn std::error::Error>> {
        Ok(StoreLock::acquire_default(self.store.dir())?)
    }

    fn record(&self, op: Operation) {
        let mut stack = UndoStack::load(&self.store);
        stack.push(op);
        stack.save(&self.store);
    }
}

pub fn dispatch(cli: Cli) -> CmdResult {
    let dir = match &cli.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => Store::default_dir()?,
    };
    let store = Store::open(&dir)?;
    let config = read_config(&dir)?;
    let ctx = Ctx {
        store,
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args),
        Commands::Done(args) => cmd_done(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Priority(args) => cmd_priority(&ctx, args),
        Commands::Mv(args) => cmd_mv(&ctx, args),
        Commands::Sub(cmd) => cmd_sub(&ctx, cmd.action),
        Commands::Template(cmd) => cmd_template(&ctx, cmd.action),
        Commands::Export(args) => cmd_export(&ctx, args),
        Commands::Import(args) => cmd_import(&ctx, args),
        Commands::Theme(args) => cmd_theme(&ctx, args),
        Commands::Chat(args) => cmd_chat(&ctx, args),
        Commands::Serve => cmd_serve(&ctx),
        Commands::Login(args) => cmd_auth(&ctx, args, false),
        Commands::Signup(args) => cmd_auth(&ctx, args, true),
        Commands::Logout => cmd_logout(&ctx),
        Commands::Undo => cmd_undo(&ctx),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Ctx, args: AddArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());

    let priority = args.priority.as_deref().map(output::parse_priority).transpose()?;
    let due_date = args.due.as_deref().map(output::parse_due).transpose()?;
    let Some(id) = repo.add(NewTask {
        title: args.title,
        description: args.desc,
        priority,
        due_date,
        category: args.category,
    }) else {
        return Err("title cannot be empty".into());
    };
    ctx.record(Operation::Added { id });

    if ctx.json {
        print_json(repo.task(id).unwrap())
    } else {
        println!("{id}");
        Ok(())
    }
}

fn cmd_list(ctx: &Ctx, args: ListArgs) -> CmdResult {
    let repo = Repo::load(ctx.store.clone());

    let mut state = ViewState {
        sort: ctx.config.ui.default_sort,
        ..Default::default()
    };
    if let Some(status) = &args.status {
        state = state.reduce(ViewAction::SetFilter(output::parse_filter(status)?));
    }
    if let Some(search) = args.search {
        state = state.reduce(ViewAction::SetSearch(search));
    }
    if let Some(sort) = &args.sort {
        state = state.reduce(ViewAction::SetSort(output::parse_sort(sort)?));
    }

    for id in args.expand {
        state = state.reduce(ViewAction::ToggleExpanded(id));
    }

    let visible = project(repo.tasks(), &state);
    if ctx.json {
        return print_json(&visible);
    }
    let now = Local::now();
    for task in visible {
        println!("{}", output::format_task_line(task, now));
        if state.expanded.contains(&task.id) {
            for sub in &task.subtasks {
                println!("{}", output::format_subtask_line(sub));
            }
        }
    }
    Ok(())
}

/// Resolve a bulk command's target selection: the named ids, or with
/// `--all` exactly the tasks the narrowed view projects.
fn bulk_selection(repo: &Repo, args: &BulkArgs) -> Result<ViewState, Box<dyn std::error::Error>> {
    if !args.all {
        return Ok(ViewState::default().reduce(ViewAction::SelectAll(args.ids.clone())));
    }
    let mut state = ViewState::default();
    if let Some(status) = &args.status {
        state = state.reduce(ViewAction::SetFilter(output::parse_filter(status)?));
    }
    if let Some(search) = &args.search {
        state = state.reduce(ViewAction::SetSearch(search.clone()));
    }
    Ok(bulk::select_visible(state, repo.tasks()))
}

fn cmd_show(ctx: &Ctx, args: IdArg) -> CmdResult {
    let repo = Repo::load(ctx.store.clone());
    let task = repo
        .task(args.id)
        .ok_or_else(|| format!("no task with id {}", args.id))?;
    if ctx.json {
        return print_json(task);
    }
    for line in output::format_task_detail(task, Local::now()) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_edit(ctx: &Ctx, args: EditArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());
    let before = repo
        .task(args.id)
        .cloned()
        .ok_or_else(|| format!("no task with id {}", args.id))?;

    let patch = TaskPatch {
        title: args.title,
        description: if args.clear_desc {
            Some(None)
        } else {
            args.desc.map(Some)
        },
        priority: args.priority.as_deref().map(output::parse_priority).transpose()?,
        due_date: if args.clear_due {
            Some(None)
        } else {
            args.due.as_deref().map(output::parse_due).transpose()?.map(Some)
        },
        category: if args.clear_category {
            Some(None)
        } else {
            args.category.map(Some)
        },
    };
    repo.update(args.id, patch);
    ctx.record(Operation::Mutated { before });

    if ctx.json {
        print_json(repo.task(args.id).unwrap())
    } else {
        println!("updated task {}", args.id);
        Ok(())
    }
}

fn cmd_toggle(ctx: &Ctx, args: IdArg) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());
    let before = repo
        .task(args.id)
        .cloned()
        .ok_or_else(|| format!("no task with id {}", args.id))?;
    repo.toggle_status(args.id);
    ctx.record(Operation::Mutated { before });

    let task = repo.task(args.id).unwrap();
    if ctx.json {
        print_json(task)
    } else {
        println!("task {} is now {}", args.id, output::status_name(task.status));
        Ok(())
    }
}

fn cmd_done(ctx: &Ctx, args: BulkArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());
    let state = bulk_selection(&repo, &args)?;
    let (_state, result) = bulk::bulk_complete(&mut repo, state);
    if !result.changed.is_empty() {
        ctx.record(Operation::BulkMutated {
            before: result.changed.clone(),
        });
    }
    println!("completed {} task(s)", result.changed.len());
    Ok(())
}

fn cmd_rm(ctx: &Ctx, args: BulkArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());
    let state = bulk_selection(&repo, &args)?;
    let (_state, result) = bulk::bulk_delete(&mut repo, state);
    if !result.removed.is_empty() {
        ctx.record(Operation::BulkRemoved {
            removed: result.removed.clone(),
        });
    }
    println!("deleted {} task(s)", result.removed.len());
    Ok(())
}

fn cmd_priority(ctx: &Ctx, args: PriorityArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let priority = output::parse_priority(&args.priority)?;
    let mut repo = Repo::load(ctx.store.clone());
    let state = bulk_selection(&repo, &args.select)?;
    let (_state, result) = bulk::bulk_set_priority(&mut repo, state, priority);
    if !result.changed.is_empty() {
        ctx.record(Operation::BulkMutated {
            before: result.changed.clone(),
        });
    }
    println!(
        "set {} on {} task(s)",
        output::priority_name(priority),
        result.changed.len()
    );
    Ok(())
}

fn cmd_mv(ctx: &Ctx, args: MvArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());
    let before = repo.tasks().to_vec();
    if !repo.reorder(args.id, args.before) {
        return Err(format!("cannot move task {} before task {}", args.id, args.before).into());
    }
    ctx.record(Operation::Replaced { before });
    println!("moved task {} before task {}", args.id, args.before);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

fn cmd_sub(ctx: &Ctx, action: SubAction) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());

    match action {
        SubAction::Add(args) => {
            let before = repo
                .task(args.task_id)
                .cloned()
                .ok_or_else(|| format!("no task with id {}", args.task_id))?;
            let Some(sub_id) = repo.add_subtask(args.task_id, &args.title) else {
                return Err("subtask title cannot be empty".into());
            };
            ctx.record(Operation::Mutated { before });
            println!("{sub_id}");
        }
        SubAction::Toggle(args) => {
            let before = repo
                .task(args.task_id)
                .cloned()
                .ok_or_else(|| format!("no task with id {}", args.task_id))?;
            if !repo.toggle_subtask(args.task_id, args.subtask_id) {
                return Err(format!(
                    "no subtask {} on task {}",
                    args.subtask_id, args.task_id
                )
                .into());
            }
            ctx.record(Operation::Mutated { before });
            println!("toggled subtask {}", args.subtask_id);
        }
        SubAction::Rm(args) => {
            let before = repo
                .task(args.task_id)
                .cloned()
                .ok_or_else(|| format!("no task with id {}", args.task_id))?;
            if !repo.remove_subtask(args.task_id, args.subtask_id) {
                return Err(format!(
                    "no subtask {} on task {}",
                    args.subtask_id, args.task_id
                )
                .into());
            }
            ctx.record(Operation::Mutated { before });
            println!("removed subtask {}", args.subtask_id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn cmd_template(ctx: &Ctx, action: TemplateAction) -> CmdResult {
    match action {
        TemplateAction::Save(args) => {
            let _lock = ctx.lock()?;
            let repo = Repo::load(ctx.store.clone());
            let task = repo
                .task(args.id)
                .ok_or_else(|| format!("no task with id {}", args.id))?;
            let mut templates = Templates::load(&ctx.store);
            let id = templates.save_from_task(&ctx.store, task);
            println!("{id}");
        }
        TemplateAction::Use(args) => {
            let _lock = ctx.lock()?;
            let mut repo = Repo::load(ctx.store.clone());
            let templates = Templates::load(&ctx.store);
            let Some(task_id) = use_template(&mut repo, &templates, args.id) else {
                return Err(format!("no template with id {}", args.id).into());
            };
            ctx.record(Operation::Added { id: task_id });
            if ctx.json {
                return print_json(repo.task(task_id).unwrap());
            }
            println!("{task_id}");
        }
        TemplateAction::List => {
            let templates = Templates::load(&ctx.store);
            if ctx.json {
                return print_json(&templates.items());
            }
            for template in templates.items() {
                println!(
                    "{:>4} {} ({} subtask(s))",
                    template.id,
                    template.title,
                    template.subtask_titles.len()
                );
            }
        }
        TemplateAction::Rm(args) => {
            let _lock = ctx.lock()?;
            let mut templates = Templates::load(&ctx.store);
            if !templates.remove(&ctx.store, args.id) {
                return Err(format!("no template with id {}", args.id).into());
            }
            println!("deleted template {}", args.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transfer & theme
// ---------------------------------------------------------------------------

fn cmd_export(ctx: &Ctx, args: ExportArgs) -> CmdResult {
    let document = if args.chat {
        export_chat(&ctx.store.load_chat_history())
    } else {
        let repo = Repo::load(ctx.store.clone());
        export_tasks(repo.tasks())
    };
    fs::write(&args.file, document)?;
    println!("exported to {}", args.file);
    Ok(())
}

fn cmd_import(ctx: &Ctx, args: ImportArgs) -> CmdResult {
    let text = fs::read_to_string(&args.file)?;
    // Parse fully before touching the list; a bad file changes nothing
    let tasks = parse_import(&text)?;

    let _lock = ctx.lock()?;
    let mut repo = Repo::load(ctx.store.clone());
    let before = repo.tasks().to_vec();
    let count = tasks.len();
    repo.replace_all(tasks);
    ctx.record(Operation::Replaced { before });
    println!("imported {count} task(s)");
    Ok(())
}

fn cmd_theme(ctx: &Ctx, args: ThemeArgs) -> CmdResult {
    match args.value {
        Some(value) => {
            let theme = output::parse_theme(&value)?;
            let _lock = ctx.lock()?;
            ctx.store.set_theme(theme);
            println!("theme set to {}", theme.as_str());
        }
        None => println!("{}", ctx.store.theme().as_str()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat & relay server
// ---------------------------------------------------------------------------

fn cmd_chat(ctx: &Ctx, args: ChatArgs) -> CmdResult {
    let rt = tokio::runtime::Runtime::new()?;
    let reply = rt.block_on(relay::chat_once(&ctx.store, &ctx.config, &args.message))?;
    println!("{reply}");
    Ok(())
}

fn cmd_serve(ctx: &Ctx) -> CmdResult {
    tracing_subscriber::fmt::init();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(relay::server::serve(ctx.store.clone(), &ctx.config))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

fn cmd_auth(ctx: &Ctx, args: CredentialArgs, signup: bool) -> CmdResult {
    let base_url = ctx
        .config
        .auth
        .base_url
        .clone()
        .ok_or(AuthError::NotConfigured)?;
    let gate = AuthGate::new(base_url);

    let rt = tokio::runtime::Runtime::new()?;
    let session = rt.block_on(async {
        if signup {
            gate.sign_up(&args.email, &args.password).await
        } else {
            gate.sign_in(&args.email, &args.password).await
        }
    })?;
    session.save(&ctx.store);
    println!("signed in as {}", session.email);
    Ok(())
}

fn cmd_logout(ctx: &Ctx) -> CmdResult {
    Session::clear(&ctx.store);
    println!("signed out");
    Ok(())
}

// ---------------------------------------------------------------------------
// Undo
// ---------------------------------------------------------------------------

fn cmd_undo(ctx: &Ctx) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut stack = UndoStack::load(&ctx.store);
    let Some(op) = stack.pop() else {
        println!("nothing to undo");
        return Ok(());
    };
    let mut repo = Repo::load(ctx.store.clone());
    let description = apply_undo(&mut repo, op);
    stack.save(&ctx.store);
    println!("undid: {description}");
    Ok(())
}
