use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use specd::cli::document::ContentSource;
use specd::error::SpecError;
use specd::models::DocumentType;
use specd::services::Workspace;
use specd::Result;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "specd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Phase-gated feature specifications: requirements, design, tasks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root holding specd.toml and the specs directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a specification with an initial requirements document
    Create {
        /// Feature name (kebab-case)
        feature: String,

        /// One-line description of the feature
        idea: String,
    },

    /// List specifications
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a document with file references resolved
    Read {
        /// Feature name
        feature: String,

        /// requirements, design or tasks
        document: DocumentType,

        /// Print the stored text without resolving references
        #[arg(long)]
        raw: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace a document
    Update {
        /// Feature name
        feature: String,

        /// requirements, design or tasks
        document: DocumentType,

        /// Read content from a file
        #[arg(short, long, conflicts_with = "stdin", required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Approve the document and advance the workflow
        #[arg(long)]
        approve: bool,
    },

    /// Approve the current phase's document as stored and advance
    Approve {
        /// Feature name
        feature: String,
    },

    /// Show the phase of a specification
    #[command(alias = "status")]
    Phase {
        /// Feature name
        feature: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Task operations
    #[command(subcommand)]
    Task(specd::cli::task::TaskCommands),

    /// Delete a specification and its documents
    Delete {
        /// Feature name
        feature: String,
    },

    /// Run the MCP server on stdio
    Serve,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {}", e).red());
        if let Some(hint) = e.downcast_ref::<SpecError>().and_then(SpecError::hint) {
            eprintln!("{}", format!("Hint: {}", hint).yellow());
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    // Logs go to stderr; stdout carries command output and MCP messages
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .try_init();
}

async fn run_async(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "specd", &mut io::stdout());
        return Ok(());
    }

    let workspace = Workspace::open(&cli.root)?;
    init_logging(cli.verbose, &workspace.config().log_level);

    match cli.command {
        Commands::Create { feature, idea } => {
            println!("{}", format!("📝 Creating specification: {}", feature).cyan());
            specd::cli::spec::create(&workspace, &feature, &idea)?;
        }

        Commands::List { json } => {
            specd::cli::spec::list(&workspace, json)?;
        }

        Commands::Read {
            feature,
            document,
            raw,
            json,
        } => {
            specd::cli::document::read(&workspace, &feature, document, raw, json)?;
        }

        Commands::Update {
            feature,
            document,
            file,
            stdin: _,
            approve,
        } => {
            let source = match &file {
                Some(path) => ContentSource::File(path),
                None => ContentSource::Stdin,
            };
            specd::cli::document::update(&workspace, &feature, document, source, approve)?;
        }

        Commands::Approve { feature } => {
            specd::cli::spec::approve(&workspace, &feature)?;
        }

        Commands::Phase { feature, json } => {
            specd::cli::spec::phase(&workspace, &feature, json)?;
        }

        Commands::Task(cmd) => {
            specd::cli::task::run(cmd, &workspace)?;
        }

        Commands::Delete { feature } => {
            specd::cli::spec::delete(&workspace, &feature)?;
        }

        Commands::Serve => {
            specd::cli::serve::run(workspace).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
