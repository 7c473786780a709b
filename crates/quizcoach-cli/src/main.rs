//! quizcoach CLI: timed, AI-generated quizzes in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use quizcoach_core::model::Difficulty;

mod commands;

#[derive(Parser)]
#[command(
    name = "quizcoach",
    version,
    about = "Timed quizzes generated from your study notes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a quiz session
    Play {
        /// Learner name
        #[arg(long)]
        name: String,

        /// Difficulty: bachelor, master or expert
        #[arg(long, default_value = "bachelor")]
        difficulty: Difficulty,

        /// Study file (.txt, .md or .html); repeat for several files
        #[arg(
            long = "file",
            conflicts_with = "course",
            required_unless_present = "course"
        )]
        files: Vec<PathBuf>,

        /// Built-in course slug instead of study files
        #[arg(long)]
        course: Option<String>,

        /// Provider name from the config (default: the config's default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Start with sound cues off
        #[arg(long)]
        mute: bool,
    },

    /// Check a quiz JSON file against the quiz schema
    Validate {
        /// Path to the quiz JSON
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Print the study corpus built from files
    Ingest {
        /// Study file; repeat for several files
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// List the built-in courses
    Courses,

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example study notes
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizcoach=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            name,
            difficulty,
            files,
            course,
            provider,
            model,
            config,
            mute,
        } => {
            commands::play::execute(commands::play::PlayArgs {
                name,
                difficulty,
                files,
                course,
                provider,
                model,
                config,
                mute,
            })
            .await
        }
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Ingest { files } => commands::ingest::execute(files).await,
        Commands::Courses => commands::courses::execute(),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
