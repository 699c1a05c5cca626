use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drivetunes::utils::{get_settings_path, load_settings, load_settings_from, save_settings};
use drivetunes::{auth, player};

#[derive(Parser)]
#[command(name = "drivetunes", version, about = "Index and play the music in your Google Drive")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in to Google Drive in the browser
    Login,
    /// Forget the stored Drive credentials
    Logout,
    /// Scan Drive and tag new MP3 files into the library
    Index,
    /// Show the song library
    List,
    /// Play a song by id or by its number in `list`
    Play { song: String },
    /// Remove a song from the library so the next `index` tags it again
    Forget { song: String },
    /// Remove every song from the library
    Reset,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> drivetunes::Result<()> {
    let settings = load_settings();

    match command {
        Command::Login => {
            drivetunes::login(&settings, |url| {
                println!("Open this URL in your browser to sign in:\n\n  {}\n", url);
            })
            .await?;
            println!("Signed in.");
        }
        Command::Logout => {
            auth::logout()?;
            println!("Signed out.");
        }
        Command::Index => {
            let summary = drivetunes::index_library(&settings).await?;
            println!(
                "{} files listed, {} new songs tagged, {} already indexed, {} skipped, {} failed",
                summary.listed, summary.tagged, summary.already_indexed, summary.skipped, summary.failed
            );
        }
        Command::List => {
            let songs = drivetunes::list_songs(&settings)?;
            print!("{}", player::render_songs(&songs));
        }
        Command::Play { song } => {
            drivetunes::play_song(&settings, &song).await?;
        }
        Command::Forget { song } => {
            let song = drivetunes::forget_song(&settings, &song)?;
            println!("Forgot {}", player::render_song_line(&song));
        }
        Command::Reset => {
            let removed = drivetunes::reset_library(&settings)?;
            println!("{} songs removed.", removed);
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            ConfigAction::Set { key, value } => {
                // Edit the file as stored, without environment overrides
                let mut stored = load_settings_from(&get_settings_path());
                stored.set(&key, &value)?;
                save_settings(&stored)?;
            }
        },
    }

    Ok(())
}
