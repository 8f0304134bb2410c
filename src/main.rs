//! Interactive CLI for the tasklink client.
//!
//! Surfaces the three collaborators around the core: a login/registration
//! menu, the task list with its four operations, and the session-expiry /
//! account-deletion prompts. Every accepted input line counts as
//! qualifying user activity for the idle timer.

use anyhow::Result;
use clap::Parser;
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use std::path::PathBuf;
use std::sync::Arc;
use tasklink::{
    account, ApiClient, Config, CredentialStore, SessionManager, SessionState, Task,
    TaskSynchronizer,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tasklink", version, about = "Task list client for a remote task API")]
struct Cli {
    /// Base URL of the remote task API (overrides config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Seconds of inactivity before the session expires (overrides config file)
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Path to an alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = cli.idle_timeout_secs {
        config.idle_timeout_secs = secs;
    }

    let api = ApiClient::new(&config.api_url)?;
    let store = CredentialStore::new(config.credential_path());
    let session = SessionManager::new(store, config.idle_timeout());
    let sync = TaskSynchronizer::new(api.clone(), Arc::clone(&session));

    session.initialize();

    loop {
        match session.state() {
            SessionState::Unauthenticated => {
                if !login_menu(&api, &session).await? {
                    break;
                }
            }
            SessionState::Expired => {
                println!(
                    "{}",
                    style("Your session has expired. Please log in again.").yellow()
                );
                let _ = Confirm::new()
                    .with_prompt("OK")
                    .default(true)
                    .interact()?;
                session.acknowledge_expiry();
            }
            SessionState::Authenticated => {
                if !task_loop(&api, &session, &sync).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Login surface. Returns `false` when the user chooses to quit.
async fn login_menu(api: &ApiClient, session: &Arc<SessionManager>) -> Result<bool> {
    let choice = Select::new()
        .with_prompt("tasklink")
        .items(&["Log in", "Create an account", "Quit"])
        .default(0)
        .interact()?;
    if choice == 2 {
        return Ok(false);
    }

    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;

    let result = if choice == 0 {
        account::login(api, session, &email, &password).await
    } else {
        account::register(api, session, &email, &password).await
    };

    if let Err(err) = result {
        println!("{}", style(format!("{err:#}")).red());
    }
    Ok(true)
}

/// Authenticated command loop. Returns `false` when the user quits the
/// program, `true` to hand control back to the session dispatcher (logout,
/// expiry, account deletion).
async fn task_loop(
    api: &ApiClient,
    session: &Arc<SessionManager>,
    sync: &TaskSynchronizer,
) -> Result<bool> {
    report(sync.load_all().await);
    print_tasks(&sync.snapshot());

    loop {
        if session.state() != SessionState::Authenticated {
            return Ok(true);
        }

        let line: String = Input::new()
            .with_prompt("tasklink")
            .allow_empty(true)
            .interact_text()?;
        session.notify_activity();

        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "list" | "ls" => print_tasks(&sync.snapshot()),
            "add" => {
                report(sync.create(rest).await);
                print_tasks(&sync.snapshot());
            }
            "done" => {
                if let Some(id) = resolve(sync, rest) {
                    report(sync.toggle_completion(&id).await);
                    print_tasks(&sync.snapshot());
                }
            }
            "edit" => {
                let (row, title) = match rest.split_once(' ') {
                    Some((row, title)) => (row, title.trim()),
                    None => (rest, ""),
                };
                if let Some(id) = resolve(sync, row) {
                    report(sync.rename(&id, title).await);
                    print_tasks(&sync.snapshot());
                }
            }
            "rm" => {
                if let Some(id) = resolve(sync, rest) {
                    report(sync.delete(&id).await);
                    print_tasks(&sync.snapshot());
                }
            }
            "stats" => {
                let stats = sync.stats();
                println!(
                    "Total: {}  Completed: {}  Incomplete: {}",
                    stats.total, stats.completed, stats.incomplete
                );
            }
            "logout" => {
                session.logout();
                return Ok(true);
            }
            "delete-account" => {
                let confirmed = Confirm::new()
                    .with_prompt(
                        "Are you sure you want to delete your account? This action is irreversible.",
                    )
                    .default(false)
                    .interact()?;
                if confirmed {
                    report(account::delete_account(api, session).await);
                    return Ok(true);
                }
            }
            "help" => print_help(),
            "quit" | "exit" => return Ok(false),
            other => println!("Unknown command '{other}' (try 'help')"),
        }
    }
}

/// Map a 1-based row number from the current listing to a task id.
fn resolve(sync: &TaskSynchronizer, row: &str) -> Option<String> {
    let tasks = sync.snapshot();
    match row.parse::<usize>() {
        Ok(n) if n >= 1 && n <= tasks.len() => Some(tasks[n - 1].id.clone()),
        _ => {
            println!("No task #{row}");
            None
        }
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("(no tasks)");
        return;
    }
    for (i, task) in tasks.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        let title = if task.completed {
            style(task.title.as_str()).strikethrough().dim().to_string()
        } else {
            task.title.clone()
        };
        println!("{:>3}. [{mark}] {title}", i + 1);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  list               show tasks");
    println!("  add <title>        create a task");
    println!("  done <n>           toggle completion of row n");
    println!("  edit <n> <title>   rename row n");
    println!("  rm <n>             delete row n");
    println!("  stats              show counts");
    println!("  logout             end the session");
    println!("  delete-account     delete the account (irreversible)");
    println!("  quit               exit");
}

/// Report a kind-(c) remote failure and keep going; validation no-ops and
/// handled authorization rejections arrive here as `Ok`.
fn report(result: Result<()>) {
    if let Err(err) = result {
        println!("{}", style(format!("{err:#}")).red());
    }
}
