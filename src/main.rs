use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rundeck_mcp::config::RundeckConfig;

#[derive(Parser)]
#[command(
    name = "rundeck-mcp",
    about = "Model Context Protocol server for Rundeck job automation",
    version,
    long_about = None
)]
struct Cli {
    /// TOML file with extra servers and tuning
    #[arg(long, global = true, env = "RUNDECK_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines (always on stderr)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,

    /// List configured Rundeck servers
    Servers,

    /// Run a single tool and print its result
    Call {
        /// Tool name, e.g. get_projects
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,

        /// Target server (overrides any `server` in --args)
        #[arg(long)]
        server: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries the MCP stream
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = RundeckConfig::resolve(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Starting Rundeck MCP server");
            rundeck_mcp::serve(config).await?;
        }
        Commands::Servers => {
            let toolbox = rundeck_mcp::build_toolbox(&config)?;
            let output = toolbox.call("list_servers", serde_json::Value::Null).await;
            println!("{}", output.text);
        }
        Commands::Call { tool, args, server } => {
            let mut arguments: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let Some(map) = arguments.as_object_mut() else {
                anyhow::bail!("--args must be a JSON object");
            };
            if let Some(server) = server {
                map.insert("server".to_string(), serde_json::Value::String(server));
            }

            let toolbox = rundeck_mcp::build_toolbox(&config)?;
            let output = toolbox.call(&tool, arguments).await;
            println!("{}", output.text);
            if output.is_error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
