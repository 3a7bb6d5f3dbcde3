use super::read_content;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{EditorSession, HydrationState, NoopPersistence, SharedNode, Tab};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Initial-content file (JSON snapshot, update list, or base64 update)
    pub input: PathBuf,

    /// Hydrate as this historical version instead of the live document
    #[arg(long)]
    pub version: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub async fn inspect(args: InspectArgs, config: &Config) -> Result<()> {
    let content = read_content(&args.input)?;
    let kind = content.kind();
    let sanitizer = config.sanitizer();

    let session = match &args.version {
        None => {
            EditorSession::open(
                config.editor.clone(),
                content,
                sanitizer.as_ref(),
                &NoopPersistence,
            )
            .await
        }
        Some(version_id) => {
            let mut session = EditorSession::new(config.editor.clone());
            session.ensure_directory();
            session
                .hydrate_version(content, version_id, sanitizer.as_ref(), &NoopPersistence)
                .await;
            session
        }
    };

    match args.format.as_str() {
        "json" => {
            let tabs: Vec<Value> = session
                .tabs()
                .into_iter()
                .map(|tab| {
                    let content = session.fragment_json(&tab.id).unwrap_or(Value::Null);
                    json!({ "tab": tab, "content": content })
                })
                .collect();
            let output = json!({
                "kind": kind.to_string(),
                "activeTabId": session.active_tab_id(),
                "tabs": tabs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => print_text(&session, &args, &kind.to_string()),
        other => {
            return Err(anyhow::anyhow!(
                "Unknown format: {}. Use: text or json",
                other
            ))
        }
    }

    Ok(())
}

fn print_text(session: &EditorSession, args: &InspectArgs, kind: &str) {
    println!("🔍 {} {}", "Inspecting".green().bold(), args.input.display());
    println!("   Content: {}", kind);
    println!("   State:   {}", state_label(session.hydration_state()));
    println!();

    let active = session.active_tab_id();
    for tab in session.tabs() {
        print_tab(session, &tab, tab.id == active);
    }
}

fn print_tab(session: &EditorSession, tab: &Tab, active: bool) {
    let marker = if active { "●".green() } else { "○".dimmed() };
    let emoji = tab.emoji.as_deref().unwrap_or("");
    println!(
        "  {} {}{} {}",
        marker,
        emoji,
        tab.name.bold(),
        format!("({})", tab.id).dimmed()
    );

    let blocks = session
        .fragment_json(&tab.id)
        .map(|snapshot| folio_editor::nodes_from_json(&snapshot))
        .unwrap_or_default();
    if blocks.is_empty() {
        println!("      {}", "(empty)".dimmed());
    }
    for block in blocks {
        println!("      {}", preview(&block));
    }
}

fn preview(node: &SharedNode) -> String {
    let text = node.plain_text();
    let label = match node {
        SharedNode::Element { tag, .. } => tag.as_str(),
        SharedNode::Text { .. } => "text",
    };
    let mut line: String = text.chars().take(60).collect();
    if text.chars().count() > 60 {
        line.push('…');
    }
    format!("{} {}", format!("[{}]", label).cyan(), line)
}

fn state_label(state: &HydrationState) -> String {
    match state {
        HydrationState::Ready(Some(key)) | HydrationState::ContentApplied(Some(key)) => {
            format!("{} ({})", state_name(state), key)
        }
        _ => state_name(state).to_string(),
    }
}

fn state_name(state: &HydrationState) -> &'static str {
    match state {
        HydrationState::Uninitialized => "uninitialized",
        HydrationState::WaitingForTabState => "waiting for tab state",
        HydrationState::Applying => "applying",
        HydrationState::ContentApplied(_) => "content applied",
        HydrationState::InitializingPersistence => "initializing persistence",
        HydrationState::Ready(_) => "ready",
        HydrationState::PersistenceFailed => "persistence failed",
    }
}
