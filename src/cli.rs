//! CLI module
//!
//! This module provides the command-line interface for taskline. Every command
//! except `serve`, `guide` and `completions` talks to a running server.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;

use crate::{
    api::{serve, Client, ClientConfig, HttpClient, ServerConfig},
    gesture::{Gesture, GestureOutcome},
    guide::{get_guide_string, GuideMode},
    models::{parse_spec, Forest, Position},
    session::{Core, Session, TransitionLogEntry},
    view::{LevelView, ViewRow},
};

/// Terminal columns given to one grid column
const CELL_WIDTH: usize = 14;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API server URL
    #[arg(short, long, env = "TASKLINE_SERVER", default_value = "http://localhost:3000")]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the taskline API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "TASKLINE_PORT", default_value_t = 3000)]
        port: u16,

        /// Start from the demonstration forest
        #[arg(long, conflicts_with = "forest")]
        example: bool,

        /// Load the initial forest from a JSON file
        #[arg(long)]
        forest: Option<PathBuf>,
    },

    /// Print the forest as a grid
    View,

    /// Print the raw forest as JSON
    Forest,

    /// Print the number of grid columns a task covers
    Span {
        /// Level index of the task
        level: usize,
        /// Task id (placeholders are negative)
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// Drop one task onto (or beside) another
    Drop {
        /// Dragged task (e.g., 1,5,1 for task 5 on level 1 under task 1)
        source: String,
        /// Task or placeholder it lands on
        target: String,
        /// Land beside the target instead of on it
        #[arg(short, long)]
        position: Option<Position>,
    },

    /// Create a new task at a target
    Create {
        /// Task or placeholder the create control lands on
        target: String,
        /// Land beside the target instead of on it
        #[arg(short, long)]
        position: Option<Position>,
    },

    /// Delete a task and its whole subtree
    Delete {
        /// Task to remove
        source: String,
    },

    /// Append an empty level
    #[command(name = "add-level")]
    AddLevel,

    /// Show recent state transitions
    History,

    /// Interactive guide on how to use this tool
    Guide,

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run the CLI application
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            port,
            example,
            forest,
        } => {
            println!("Starting taskline API server on port {}...", port);

            let initial = match forest {
                Some(path) => {
                    println!("Loading forest from {}...", path.display());
                    let json = std::fs::read_to_string(path)?;
                    let forest: Forest = serde_json::from_str(&json)?;
                    forest.validate()?;
                    forest
                }
                None if *example => {
                    println!("Populating with the example forest...");
                    Forest::sample()
                }
                None => Forest::new(),
            };

            let core = Core::new(Session::new(initial));

            // Create a server configuration with the specified port
            let config = ServerConfig {
                address: ([127, 0, 0, 1], *port).into(),
            };

            serve(core, config).await?;
            Ok(())
        }

        Commands::View => {
            let client = create_client(&cli.server);
            let view = client.get_view().await?;
            print_grid(&view);
            Ok(())
        }

        Commands::Forest => {
            let client = create_client(&cli.server);
            let forest = client.get_forest().await?;
            println!("{}", serde_json::to_string_pretty(&forest)?);
            Ok(())
        }

        Commands::Span { level, id } => {
            let client = create_client(&cli.server);
            let span = client.get_span(*level, *id).await?;
            println!(
                "Task {} on level {} spans {} column(s)",
                span.task_id, span.level_index, span.span
            );
            Ok(())
        }

        Commands::Drop {
            source,
            target,
            position,
        } => {
            let gesture = Gesture::new(parse_spec(source)?, parse_spec(target)?, *position);
            apply_and_print(&cli.server, gesture).await
        }

        Commands::Create { target, position } => {
            let gesture = Gesture::create(parse_spec(target)?, *position);
            apply_and_print(&cli.server, gesture).await
        }

        Commands::Delete { source } => {
            let gesture = Gesture::delete(parse_spec(source)?);
            apply_and_print(&cli.server, gesture).await
        }

        Commands::AddLevel => {
            let client = create_client(&cli.server);
            let added = client.add_level().await?;
            println!(
                "Added level {} ({} level(s) total)",
                added.level_index, added.level_count
            );
            Ok(())
        }

        Commands::History => {
            let client = create_client(&cli.server);
            let history = client.get_history().await?;
            print_history(&history);
            Ok(())
        }

        Commands::Guide => {
            println!("{}", get_guide_string(GuideMode::Cli));

            // Only show the grid if a server is running
            let client = create_client(&cli.server);
            if let Ok(view) = client.get_view().await {
                println!("\n== CURRENT FOREST ==\n");
                print_grid(&view);
            }

            Ok(())
        }

        Commands::Completions { shell } => {
            // Generate completions for the specified shell
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn create_client(server_url: &str) -> HttpClient {
    let config = ClientConfig {
        base_url: server_url.to_string(),
    };

    HttpClient::with_config(config)
}

async fn apply_and_print(
    server_url: &str,
    gesture: Gesture,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = create_client(server_url);
    let outcome = client.apply_gesture(gesture).await?;
    print_outcome(&outcome);

    let view = client.get_view().await?;
    println!();
    print_grid(&view);
    Ok(())
}

fn print_outcome(outcome: &GestureOutcome) {
    println!("{} {:?}", "Applied".green().bold(), outcome.kind);
    if let Some(id) = outcome.created {
        println!("  Created task {}", id);
    }
    if !outcome.removed.is_empty() {
        let ids: Vec<String> = outcome.removed.iter().map(|id| id.to_string()).collect();
        println!("  Removed tasks {}", ids.join(", "));
    }
}

fn print_grid(view: &[LevelView]) {
    if view.iter().all(|level| level.rows.is_empty()) {
        println!("  No tasks yet. Add one with 'taskline create 0,-2'");
        return;
    }

    for level in view {
        let mut line = format!("{:>4} ", format!("L{}", level.key)).dimmed().to_string();
        for row in &level.rows {
            let cell = render_cell(row, row.span * CELL_WIDTH);
            if row.is_placeholder() {
                line.push_str(&cell.dimmed().to_string());
            } else {
                line.push_str(&cell);
            }
        }
        println!("{}", line);
    }
}

/// Formats one grid cell as exactly `width` characters: the row's label padded
/// or cut to fit, followed by a separator.
fn render_cell(row: &ViewRow, width: usize) -> String {
    let label = if row.is_placeholder() {
        match row.parent_id {
            Some(parent) => format!("[{}:{}]", row.task_id, parent),
            None => format!("[{}]", row.task_id),
        }
    } else {
        format!("{} {}", row.task_id, row.content.as_deref().unwrap_or_default())
    };

    let inner = width.saturating_sub(1);
    let mut text: String = label.chars().take(inner).collect();
    let used = text.chars().count();
    text.push_str(&" ".repeat(inner - used));
    text.push('|');
    text
}

fn print_history(history: &[TransitionLogEntry]) {
    if history.is_empty() {
        println!("No transitions yet.");
        return;
    }

    for entry in history {
        println!(
            "{} {} {}",
            entry.timestamp.format("%H:%M:%S").to_string().dimmed(),
            entry.action.bold(),
            entry.details.as_deref().unwrap_or_default()
        );
    }
}
