//! Scripted walk-through of the to-do list.
//!
//! Runs every operation against the file-backed store named by
//! `TODO_DATA_FILE` and prints the view after each step. Run it twice to see
//! the list survive a restart.

use anyhow::Context;
use std::time::Duration;
use todo::{Config, Filter, TodoApp, TodoView};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

fn print_view(label: &str, view: &TodoView) {
    println!("\n>>> {label}");
    println!("Filter: {}  ({}/{} shown)", view.filter, view.items.len(), view.total);
    for todo in &view.items {
        let status = if todo.completed { "✓" } else { " " };
        let editing = view
            .editing
            .as_ref()
            .filter(|session| session.todo_id == todo.id)
            .map(|session| format!("   <- editing: {:?}", session.text))
            .unwrap_or_default();
        println!("  [{status}] {} (#{}){editing}", todo.text, todo.id);
    }
    println!(
        "{} item(s) left{}",
        view.items_left,
        if view.has_completed { "  [clear completed]" } else { "" }
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=info,composable_todo_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    todo::register_metrics();

    println!("=== Todo: Composable Todo Architecture ===");

    let config = Config::from_env();
    let app = TodoApp::open(&config).context("invalid configuration")?;

    app.load()
        .await?
        .wait_with_timeout(STEP_TIMEOUT)
        .await
        .context("loading todos")?;
    print_view("Loaded", &app.view().await);

    for text in ["Buy milk", "  Write documentation  ", "   ", "Deploy to production"] {
        app.add_todo(text).await?;
    }
    print_view("Added three todos (the blank one was ignored)", &app.view().await);

    let todos = app.todos().await;
    let recent: Vec<_> = todos.iter().rev().take(3).map(|t| t.id).collect();
    let [deploy, docs, milk] = recent[..] else {
        anyhow::bail!("expected at least three todos, found {}", todos.len());
    };

    app.toggle_todo(milk).await?;
    print_view("Completed 'Buy milk'", &app.view().await);

    app.start_edit(docs).await?;
    app.edit_text_changed("Write the README").await?;
    print_view("Editing", &app.view().await);
    app.commit_edit().await?;
    print_view("Committed edit", &app.view().await);

    app.start_edit(deploy).await?;
    app.cancel_edit().await?;

    app.set_filter(Filter::Active).await?;
    print_view("Active only", &app.view().await);
    app.set_filter(Filter::Completed).await?;
    print_view("Completed only", &app.view().await);
    app.set_filter(Filter::All).await?;

    app.clear_completed().await?;
    print_view("Cleared completed", &app.view().await);

    app.delete_todo(deploy).await?;
    print_view("Deleted 'Deploy to production'", &app.view().await);

    app.shutdown(config.shutdown_timeout)
        .await
        .context("waiting for the final save")?;

    println!("\nSaved to {}", config.data_file.display());
    println!("\n=== Demo Complete ===");
    Ok(())
}
