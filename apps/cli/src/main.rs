mod commands;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use mosaic_ssg::DEFAULT_ENVIRONMENT;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(about = "A static site builder with pluggable file handlers", long_about = None)]
struct Cli {
    /// Log every file as it is handled
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init {
        dir: Option<PathBuf>,
    },
    Build {
        #[arg(default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        #[arg(long, short)]
        input: Option<PathBuf>,

        #[arg(long, action = clap::ArgAction::Set)]
        pretty: Option<bool>,
    },
    Serve {
        #[arg(default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        #[arg(long, short)]
        input: Option<PathBuf>,

        #[arg(long, default_value = "3000")]
        port: u16,

        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(error) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("Failed to initialize logging: {error}");
    }

    let result = match cli.command {
        Commands::Init { dir } => commands::init_site(dir.as_deref()),
        Commands::Build { env, input, pretty } => {
            commands::build_site(input.as_deref(), &env, pretty).map(|_| ())
        }
        Commands::Serve {
            env,
            input,
            port,
            open,
        } => commands::serve_site(input.as_deref(), &env, port, open).await,
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
