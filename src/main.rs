use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use tenor::aggregate::{no_progress, CancelFlag, ScanProgress};
use tenor::analysis::{AggregationMode, Analyzer, TextInputError};
use tenor::auth::{LoginOutcome, SignUp, UserStore};
use tenor::config::Config;
use tenor::models::{ModelBackend, ModelRegistry};
use tenor::output::terminal;
use tenor::speech::HttpTranscriber;
use tenor::youtube::{is_youtube_url, YoutubeClient};

/// Tenor: sentiment and emotion analysis.
///
/// Classifies text, voice recordings, CSV files, and the comment sections of
/// YouTube videos as Negative, Neutral, or Positive.
#[derive(Parser)]
#[command(name = "tenor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Create a user account (password from TENOR_PASSWORD or stdin)
    Signup { username: String },

    /// Check a user's credentials (password from TENOR_PASSWORD or stdin)
    Login { username: String },

    /// Analyze a piece of text, or average a YouTube link's comments
    Analyze {
        text: String,

        /// Sentiment backend: classical or transformer (default: TENOR_MODEL)
        #[arg(long)]
        model: Option<ModelBackend>,
    },

    /// Aggregate the sentiment of a YouTube video's comments
    Youtube {
        url: String,

        /// average (mean distribution) or count (comments per label)
        #[arg(long, default_value = "count")]
        mode: AggregationMode,

        /// Max comments to fetch (default: TENOR_COMMENT_LIMIT)
        #[arg(long)]
        limit: Option<usize>,

        /// Sentiment backend (default: transformer for count, TENOR_MODEL for average)
        #[arg(long)]
        model: Option<ModelBackend>,
    },

    /// Transcribe a WAV file and analyze what was said
    Voice { path: PathBuf },

    /// Score every row of a CSV file with a `text` column
    Bulk {
        path: PathBuf,

        /// Where to write the scored CSV (default: <input>_scored.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Download the ONNX sentiment and emotion models (~830 MB)
    DownloadModel,

    /// Start the web API server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tenor=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing Tenor database...");
            let db = tenor::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext steps:");
            println!("  tenor download-model      # fetch the transformer models");
            println!("  tenor signup <username>   # create an account for the web API");
        }

        Commands::Signup { username } => {
            let db = tenor::db::open_sqlite(&config.db_path)?;
            let password = read_password()?;
            let outcome = UserStore::new(db).sign_up(&username, &password).await?;
            match outcome {
                SignUp::Created => println!("{}", outcome.message().green()),
                _ => anyhow::bail!(outcome.message()),
            }
        }

        Commands::Login { username } => {
            let db = tenor::db::open_sqlite(&config.db_path)?;
            let password = read_password()?;
            let outcome = UserStore::new(db).login(&username, &password).await?;
            match outcome {
                LoginOutcome::Success(ref user) => {
                    println!("{} Logged in as {}", "✓".green(), user.bold())
                }
                _ => anyhow::bail!(outcome.message()),
            }
        }

        Commands::Analyze { text, model } => {
            let backend = model.unwrap_or(config.default_backend);
            let analyzer = build_analyzer(&config)?;

            let result = if is_youtube_url(&text) {
                let pb = terminal::comment_progress_bar()?;
                let mut progress = |p: ScanProgress| terminal::update_progress(&pb, p);
                let result = analyzer.analyze_text(&text, backend, &mut progress).await;
                pb.finish_and_clear();
                result
            } else {
                config.require_model(backend)?;
                config.require_emotion_model()?;
                analyzer.analyze_text(&text, backend, &mut no_progress).await
            };

            match result {
                Ok(analysis) => terminal::display_text_analysis(&analysis),
                Err(e) => match e.downcast_ref::<TextInputError>() {
                    Some(warning) => println!("{}", warning.to_string().yellow()),
                    None => return Err(e),
                },
            }
        }

        Commands::Youtube {
            url,
            mode,
            limit,
            model,
        } => {
            config.require_youtube()?;
            let backend = model.unwrap_or(match mode {
                AggregationMode::Count => ModelBackend::Transformer,
                AggregationMode::Average => config.default_backend,
            });
            config.require_model(backend)?;
            let analyzer = build_analyzer(&config)?;
            let limit = limit.unwrap_or(config.comment_limit);

            // Ctrl-C stops after the current comment and still prints what was gathered
            let cancel = CancelFlag::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            println!("Analyzing comments ({mode}, {backend} model, up to {limit})...");
            let pb = terminal::comment_progress_bar()?;
            let mut progress = |p: ScanProgress| terminal::update_progress(&pb, p);
            let report = analyzer
                .analyze_video(&url, mode, backend, limit, &mut progress, Some(&cancel))
                .await;
            pb.finish_and_clear();

            terminal::display_video_report(&report?);
        }

        Commands::Voice { path } => {
            config.require_speech()?;
            config.require_model(ModelBackend::Transformer)?;
            config.require_emotion_model()?;
            let audio = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let analysis = build_analyzer(&config)?.analyze_voice(&audio).await?;
            terminal::display_voice_analysis(&analysis);
        }

        Commands::Bulk { path, output } => {
            config.require_model(ModelBackend::Transformer)?;
            config.require_emotion_model()?;
            let input = std::fs::File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;

            let table = build_analyzer(&config)?.analyze_csv(input).await?;

            let output = output.unwrap_or_else(|| scored_output_path(&path));
            let file = std::fs::File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            table.write_csv(file)?;

            terminal::display_csv_summary(&table);
            println!("\nWrote {}", output.display().to_string().bold());
        }

        Commands::DownloadModel => {
            let model_dir = &config.model_dir;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", model_dir.display());

            tenor::models::download::download_models(model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `tenor analyze \"some text\"`.");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            config.require_session_secret()?;
            let db = tenor::db::initialize_sqlite(&config.db_path)?;
            let users = UserStore::new(Arc::clone(&db));
            let analyzer = build_analyzer(&config)?;
            let state = tenor::web::AppState::new(config, db, users, analyzer);
            tenor::web::run_server(state, port, &bind).await?;
        }
    }

    Ok(())
}

/// Wire the real collaborators into an Analyzer.
fn build_analyzer(config: &Config) -> Result<Analyzer> {
    Ok(Analyzer::new(
        Arc::new(ModelRegistry::new(config.model_dir.clone())),
        Arc::new(YoutubeClient::new(&config.youtube_api_key)?),
        Arc::new(HttpTranscriber::new(&config.speech_url)?),
        config.comment_limit,
    ))
}

/// `reviews.csv` → `reviews_scored.csv`, next to the input.
fn scored_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_scored.csv"))
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var("TENOR_PASSWORD") {
        return Ok(password);
    }
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
