use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use naukri_cli::commands::{self, setup::SetupArgs, upload::UploadArgs};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "naukri-uploader")]
#[command(author, version, long_about = None)]
#[command(
    about = "Keep your Naukri profile fresh by re-uploading your resume",
    long_about = "naukri-uploader drives a Chromium-family browser to re-upload your resume \
                  on Naukri, reusing a saved login session and falling back to email/password \
                  login when the session has expired."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the resume and verify that Naukri accepted it
    Upload(UploadArgs),

    /// Log in once in a visible browser and save the session
    Setup(SetupArgs),

    /// Inspect or delete the saved session
    Session {
        #[command(subcommand)]
        command: SessionCommands,

        /// Session file [default: ~/naukri_job/storage_state.json]
        #[arg(long, value_name = "FILE", global = true)]
        storage: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    #[command(after_long_help = "\
SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    Bash:
        naukri-uploader completion --shell bash > ~/.local/share/bash-completion/completions/naukri-uploader
        # or add to ~/.bashrc:
        eval \"$(naukri-uploader completion --shell bash)\"

    Zsh:
        naukri-uploader completion --shell zsh > \"${fpath[1]}/_naukri-uploader\"
        # or add to ~/.zshrc:
        eval \"$(naukri-uploader completion --shell zsh)\"

    Fish:
        naukri-uploader completion --shell fish > ~/.config/fish/completions/naukri-uploader.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Show where the session lives and what it holds
    Info,

    /// Delete the saved session
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Upload(args) => commands::upload::execute(args),
        Commands::Setup(args) => commands::setup::execute(args),
        Commands::Session { command, storage } => {
            match command {
                SessionCommands::Info => commands::session::info(storage)?,
                SessionCommands::Clear { force } => commands::session::clear(storage, force)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "naukri_uploader=debug,naukri_cli=debug,naukri_core=debug,naukri_browser=debug",
        )
    } else {
        EnvFilter::new("naukri_uploader=info,naukri_cli=info,naukri_core=info,naukri_browser=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
