//! Profile Publisher CLI
//!
//! Publish profile management assistant for bot projects

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use profile_publisher::{
    ConfigLoadOptions, ConfigLoader, ConfirmPrompt, HttpPublishService, HttpSettingsService,
    PollerOptions, PublishHistoryRecord, PublishOrchestrator, SecretStore, AutoConfirm,
    STATUS_PENDING, STATUS_SUCCESS,
};
use std::process;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Publish profile management assistant
#[derive(Parser)]
#[command(name = "profile-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publish profile management assistant", long_about = None)]
struct Cli {
    /// Service endpoint base URL (overrides configuration)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Project id (overrides configuration)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Bot name (overrides configuration)
    #[arg(long, global = true)]
    bot: Option<String>,

    /// Directory holding per-bot sensitive settings files
    #[arg(long, global = true)]
    secrets_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured publish profiles
    List,

    /// List registered publish types and their features
    Types,

    /// Add a new publish profile
    Add {
        /// Profile name (unique within the project)
        name: String,

        /// Registered publish type
        #[arg(long = "type")]
        type_name: String,

        /// Type-specific configuration (JSON string)
        #[arg(long, default_value = "{}")]
        configuration: String,
    },

    /// Edit the publish profile at an index
    Edit {
        /// Index in the profile list
        index: usize,

        /// New profile name
        name: String,

        /// Registered publish type
        #[arg(long = "type")]
        type_name: String,

        /// Type-specific configuration (JSON string)
        #[arg(long, default_value = "{}")]
        configuration: String,
    },

    /// Delete the publish profile at an index
    Delete {
        /// Index in the profile list
        index: usize,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Publish to a profile
    Publish {
        /// Profile name
        target: String,

        /// Comment attached to the new version
        #[arg(short, long)]
        comment: Option<String>,

        /// Keep polling until the publish resolves
        #[arg(long)]
        wait: bool,
    },

    /// Roll a profile back to a prior successful version
    Rollback {
        /// Profile name
        target: String,

        /// Version id to roll back to
        version: String,
    },

    /// Show grouped publish history ("all" for every profile)
    History {
        /// Profile name or "all"
        #[arg(default_value = "all")]
        target: String,
    },

    /// Show the log of one published version
    Log {
        /// Profile name
        target: String,

        /// Version id
        version: String,
    },

    /// Watch a profile until its pending publish resolves
    Watch {
        /// Profile name
        target: String,
    },
}

/// Interactive yes/no prompt on stdin
struct StdinConfirm;

#[async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, message: &str) -> Result<bool> {
        let mut stdout = io::stdout();
        stdout
            .write_all(format!("{} (yes/no): ", message).as_bytes())
            .await?;
        stdout.flush().await?;

        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut answer = String::new();
        reader.read_line(&mut answer).await?;

        let answer = answer.trim().to_lowercase();
        Ok(answer == "yes" || answer == "y")
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(ConfigLoadOptions::for_path(".")).await?;

    let project_config = config.project.clone();
    let project_id = cli
        .project
        .or_else(|| project_config.as_ref().map(|p| p.project_id.clone()))
        .ok_or_else(|| anyhow::anyhow!("project id is not configured (--project)"))?;
    let bot_name = cli
        .bot
        .or_else(|| project_config.as_ref().map(|p| p.bot_name.clone()))
        .ok_or_else(|| anyhow::anyhow!("bot name is not configured (--bot)"))?;
    let endpoint = cli
        .endpoint
        .or_else(|| config.service.as_ref().map(|s| s.endpoint.clone()))
        .ok_or_else(|| anyhow::anyhow!("service endpoint is not configured (--endpoint)"))?;
    let secrets_dir = cli
        .secrets_dir
        .or_else(|| config.secrets.as_ref().and_then(|s| s.dir.clone()))
        .unwrap_or_else(|| ".profile-publisher/secrets".to_string());

    let mut orchestrator = PublishOrchestrator::new(
        project_id,
        bot_name,
        Arc::new(HttpPublishService::new(endpoint.clone())),
        Arc::new(HttpSettingsService::new(endpoint)),
        SecretStore::new(secrets_dir),
        PollerOptions {
            delay: config.poller().interval(),
        },
    );
    orchestrator.initialize().await?;

    match cli.command {
        Commands::List => {
            println!("📦 Publish profiles:");
            if orchestrator.targets().is_empty() {
                println!("  (none configured)");
            }
            for (index, target) in orchestrator.targets().iter().enumerate() {
                let last = target
                    .last_published
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "  [{}] {} ({}) last published: {}",
                    index, target.name, target.type_name, last
                );
            }
        }

        Commands::Types => {
            println!("🔌 Publish types:");
            for publish_type in orchestrator.publish_types() {
                let mut features = Vec::new();
                if publish_type.features.rollback {
                    features.push("rollback");
                }
                if publish_type.features.pull {
                    features.push("pull");
                }
                if publish_type.features.history {
                    features.push("history");
                }
                println!("  - {} [{}]", publish_type.name, features.join(", "));
            }
        }

        Commands::Add {
            name,
            type_name,
            configuration,
        } => {
            orchestrator
                .add_target(&name, &type_name, &configuration)
                .await?;
            println!("✅ Profile added: {}", name);
        }

        Commands::Edit {
            index,
            name,
            type_name,
            configuration,
        } => {
            orchestrator
                .update_target(index, &name, &type_name, &configuration)
                .await?;
            println!("✅ Profile updated: {}", name);
        }

        Commands::Delete { index, yes } => {
            let deleted = if yes {
                orchestrator.delete_target(index, &AutoConfirm(true)).await?
            } else {
                orchestrator.delete_target(index, &StdinConfirm).await?
            };
            if deleted {
                println!("✅ Profile deleted");
            } else {
                println!("Deletion cancelled");
            }
        }

        Commands::Publish {
            target,
            comment,
            wait,
        } => {
            orchestrator.select_target(&target).await?;
            let record = orchestrator.publish(comment).await?;
            println!("📤 Publish accepted: version {}", record.id);
            print_record(&record);

            if wait {
                watch_until_resolved(&mut orchestrator).await;
            }
        }

        Commands::Rollback { target, version } => {
            orchestrator.select_target(&target).await?;
            orchestrator.rollback(&version).await?;
            println!("↩️  Rollback requested: {} to version {}", target, version);
        }

        Commands::History { target } => {
            orchestrator.select_target(&target).await?;
            let view = orchestrator.history_view();

            if view.is_empty() {
                println!("No publish history");
                return Ok(0);
            }

            for group in &view.groups {
                println!("📦 {}", group.name);
                let records = &view.items[group.start_index..group.start_index + group.count];
                for record in records {
                    print_record(record);
                }
            }
        }

        Commands::Log { target, version } => {
            orchestrator.select_target(&target).await?;
            if orchestrator.select_version(&version).is_none() {
                println!("⚠️  Version {} not found for {}", version, target);
                return Ok(1);
            }
            println!("📋 Publish log for version {}:\n", version);
            println!("{}", orchestrator.version_log().unwrap_or(""));
        }

        Commands::Watch { target } => {
            orchestrator.select_target(&target).await?;
            if !orchestrator.polling() {
                println!("✅ No pending publish for {}", target);
                return Ok(0);
            }
            println!("👀 Watching {} for status updates...", target);
            watch_until_resolved(&mut orchestrator).await;
        }
    }

    Ok(0)
}

/// Drain poll updates until the pending publish resolves
async fn watch_until_resolved(orchestrator: &mut PublishOrchestrator) {
    while orchestrator.polling() {
        let Some(update) = orchestrator.recv_update().await else {
            break;
        };
        if orchestrator.apply_update(update) {
            if let Some(record) = orchestrator.history_view().items.first() {
                print_record(record);
            }
        }
    }
    println!("Done");
}

fn print_record(record: &PublishHistoryRecord) {
    let icon = match record.status {
        STATUS_SUCCESS => "✅",
        STATUS_PENDING => "⏳",
        _ => "❌",
    };
    let comment = record.comment.as_deref().unwrap_or("");
    println!(
        "  {} [{}] {} {} {}",
        icon,
        record.status,
        record.id,
        record.time.to_rfc3339(),
        comment
    );
}
