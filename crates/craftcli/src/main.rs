use anyhow::Result;
use clap::{Parser, Subcommand};
use craftcore::{CredentialStore, ExecutionEvent, NodeSpec, PipelineSpec};
use craftruntime::{ExecutorRegistry, NodeStatus, PipelineRuntime, ResultCallback, RunStatus};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "craft")]
#[command(about = "Craftflow pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline file
    Run {
        /// Path to pipeline JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a pipeline file without running it
    Validate {
        /// Path to pipeline JSON file
        file: PathBuf,
    },

    /// List available executor types
    Nodes,

    /// Create a new example pipeline
    Init {
        /// Output file path
        #[arg(short, long, default_value = "pipeline.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, verbose } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_pipeline(file).await?;
        }

        Commands::Validate { file } => {
            validate_pipeline(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_pipeline(output)?;
        }
    }

    Ok(())
}

fn builtin_registry() -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    craftnodes::register_builtin(&mut registry);
    registry
}

async fn run_pipeline(file: PathBuf) -> Result<()> {
    println!("🚀 Loading pipeline from: {}", file.display());

    let pipeline_json = std::fs::read_to_string(&file)?;
    let pipeline: PipelineSpec = serde_json::from_str(&pipeline_json)?;

    println!("📋 Pipeline: {}", pipeline.name);
    println!("   Nodes: {}", pipeline.nodes.len());
    println!("   Connections: {}", pipeline.connections.len());
    println!();

    let runtime = PipelineRuntime::new(Arc::new(builtin_registry()));

    // API keys come from the environment: CRAFT_OPENAI_API_KEY etc.
    let credentials = CredentialStore::from_env("CRAFT_");

    // Stream node-level events while the run is in flight
    let mut events = runtime.subscribe();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { .. } => {
                    println!("▶️  Run started");
                }
                ExecutionEvent::NodeStarted {
                    node_id, type_id, ..
                } => {
                    println!("  ⚡ Starting node: {} ({})", node_id, type_id);
                }
                ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
                    craftcore::NodeEvent::Info { message } => {
                        println!("     ℹ️  [{}] {}", node_id, message);
                    }
                    craftcore::NodeEvent::Warning { message } => {
                        println!("     ⚠️  [{}] {}", node_id, message);
                    }
                    craftcore::NodeEvent::Progress { percent, message } => {
                        if let Some(msg) = message {
                            println!("     📊 [{}] {}% - {}", node_id, percent, msg);
                        } else {
                            println!("     📊 [{}] {}%", node_id, percent);
                        }
                    }
                },
                ExecutionEvent::RunFinished {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("✨ Run completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Run finished with failures after {}ms", duration_ms);
                    }
                }
                _ => {}
            }
        }
    });

    // Per-node terminal results arrive through the reporter callback
    let on_result: ResultCallback = Arc::new(|result| match result.status {
        NodeStatus::Success => {
            println!(
                "  ✅ Node {} completed in {}ms",
                result.node_id, result.duration_ms
            );
        }
        NodeStatus::Error => {
            println!(
                "  ❌ Node {} failed: {}",
                result.node_id,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        NodeStatus::Skipped => match &result.blocked_on {
            Some(ancestor) => {
                println!("  ⏭️  Node {} skipped (blocked on {})", result.node_id, ancestor);
            }
            None => println!("  ⏭️  Node {} skipped", result.node_id),
        },
        _ => {}
    });

    let summary = runtime
        .execute(&pipeline, Some(on_result), credentials)
        .await?;

    // Let the event listener drain before printing the summary
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Run Summary:");
    println!("   Run ID: {}", summary.run_id);
    println!(
        "   Status: {}",
        match summary.status {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    );
    println!(
        "   Nodes: {} total, {} succeeded, {} failed, {} skipped",
        summary.total, summary.succeeded, summary.failed, summary.skipped
    );

    let mut with_outputs: Vec<_> = summary
        .results
        .values()
        .filter(|r| !r.outputs.is_empty())
        .collect();
    with_outputs.sort_by(|a, b| a.node_id.cmp(&b.node_id));

    if !with_outputs.is_empty() {
        println!();
        println!("📤 Outputs:");
        for result in with_outputs {
            println!("   Node {}:", result.node_id);
            let mut ports: Vec<_> = result.outputs.iter().collect();
            ports.sort_by_key(|(port, _)| **port);
            for (port, value) in ports {
                println!("     {}: {}", port, value.to_text());
            }
        }
    }

    Ok(())
}

fn validate_pipeline(file: PathBuf) -> Result<()> {
    println!("🔍 Validating pipeline: {}", file.display());

    let pipeline_json = std::fs::read_to_string(&file)?;
    let pipeline: PipelineSpec = serde_json::from_str(&pipeline_json)?;

    pipeline.validate()?;

    println!("✅ Pipeline is valid:");
    println!("   Name: {}", pipeline.name);
    println!("   Nodes: {}", pipeline.nodes.len());
    println!("   Connections: {}", pipeline.connections.len());

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Executor Types:");
    println!();

    let registry = builtin_registry();
    let mut type_ids = registry.list_type_ids();
    type_ids.sort();

    for type_id in type_ids {
        println!("  • {}", type_id);
        if let Some(schema) = registry.schema(&type_id) {
            for spec in &schema.settings {
                match &spec.options {
                    Some(options) => {
                        let options: Vec<String> =
                            options.iter().map(|o| o.to_string()).collect();
                        println!(
                            "    {} (default: {}, options: {})",
                            spec.key,
                            spec.default,
                            options.join(", ")
                        );
                    }
                    None => println!("    {} (default: {})", spec.key, spec.default),
                }
            }
        }
    }
}

fn create_example_pipeline(output: PathBuf) -> Result<()> {
    let mut pipeline = PipelineSpec::new("Example Research Pipeline");
    pipeline.description =
        Some("Fetches a page, formats it in the brand voice, exports markdown".to_string());

    let fetch = pipeline.add_node(
        NodeSpec::new("fetch", "research.fetch")
            .with_label("Fetch Source")
            .with_setting("url", "https://api.github.com/zen"),
    );
    let format = pipeline.add_node(
        NodeSpec::new("format", "brand.format")
            .with_label("Brand Voice")
            .with_setting("voice", "Punchy"),
    );
    let export = pipeline.add_node(
        NodeSpec::new("export", "export.markdown")
            .with_label("Export")
            .with_setting("title", "Research Digest"),
    );

    pipeline.connect(fetch, 0, format.clone(), 0);
    pipeline.connect(format, 0, export, 0);

    let json = serde_json::to_string_pretty(&pipeline)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example pipeline: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  craft run --file {}", output.display());

    Ok(())
}
