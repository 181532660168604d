use clap::{Parser, Subcommand};
use mediamm_pilot::{
    FixedChoice, HttpBackend, JobState, Orchestrator, PilotError, SelectionPort, Settings,
    SubtitleLanguage, TerminalPrompt, WorkflowError, choose_candidate, logging, render_preview,
};
use std::process;

/// Scrape movie metadata and fetch subtitles through a mediamm server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the mediamm server
    #[arg(long, env = "MEDIAMM_URL")]
    url: Option<String>,

    /// Library root to scan
    #[arg(long, env = "MEDIAMM_ROOT")]
    root: Option<String>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the media items below the library root
    Scan,

    /// Search metadata for one item, scrape it and follow the job
    Scrape {
        /// Path or file name of the item
        item: String,

        /// Search text (defaults to the cleaned file name)
        #[arg(long)]
        query: Option<String>,

        /// Release year filter
        #[arg(long)]
        year: Option<String>,

        /// Pick the N-th search result instead of asking
        #[arg(long)]
        pick: Option<usize>,
    },

    /// Search and download a subtitle for one item
    Subtitles {
        /// Path or file name of the item
        item: String,

        /// Search text (defaults to the cleaned file name)
        #[arg(long)]
        query: Option<String>,

        /// Answer the subtitle choice with N instead of asking
        #[arg(long)]
        pick: Option<String>,

        /// Subtitle language (chs, cht, eng)
        #[arg(long)]
        lang: Option<SubtitleLanguage>,
    },

    /// Show or initialize the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Write the effective settings to the settings file
    Init,
}

/// Prints a progress line for every polled job state
fn handle_job_update(state: &JobState) {
    match state {
        JobState::Running(_) => println!("  {}", state),
        JobState::NetworkError(reason) => println!("{} ({})", state, reason),
        _ => println!("{}", state),
    }
}

fn orchestrator(settings: &Settings) -> Result<Orchestrator<HttpBackend>, PilotError> {
    let backend = HttpBackend::new(&settings.base_url, settings.request_timeout())?;
    Ok(Orchestrator::new(backend).with_language(settings.subtitle_language))
}

fn library_root(settings: &Settings) -> &str {
    settings.default_root.as_deref().unwrap_or("")
}

/// Scans the library and opens a search session for `needle`
async fn target_item(
    orchestrator: &mut Orchestrator<HttpBackend>,
    settings: &Settings,
    needle: &str,
) -> Result<(), PilotError> {
    orchestrator.scan(library_root(settings)).await?;

    let path = orchestrator
        .inventory()
        .lookup(needle)
        .map(|item| item.path.clone())
        .ok_or_else(|| WorkflowError::NotFound(needle.to_string()))?;

    let session = orchestrator.open_search(&path)?;
    println!("Current file: {}", session.target().name);
    Ok(())
}

async fn run_scan(settings: &Settings) -> Result<(), PilotError> {
    let mut orchestrator = orchestrator(settings)?;
    let items = orchestrator.scan(library_root(settings)).await?;

    if items.is_empty() {
        println!("No media files found.");
        return Ok(());
    }

    for item in items {
        println!("{}", item.name);
        println!("  {}", item.path);
        println!("  {}", item.artifact_label());
    }
    println!("\nFound {} item(s).", items.len());
    Ok(())
}

async fn run_scrape(
    settings: &Settings,
    needle: &str,
    query: Option<String>,
    year: Option<String>,
    pick: Option<usize>,
) -> Result<(), PilotError> {
    let mut orchestrator = orchestrator(settings)?;
    target_item(&mut orchestrator, settings, needle).await?;

    let text = match query {
        Some(query) => query,
        None => orchestrator
            .session()
            .map(|session| session.query().text.clone())
            .unwrap_or_default(),
    };

    println!("Searching for '{}'...", text);
    let results = orchestrator.submit_search(&text, year.as_deref()).await?;
    if results.is_empty() {
        println!("No matching results.");
        return Ok(());
    }

    let index = match pick {
        Some(position) if (1..=results.len()).contains(&position) => position - 1,
        Some(position) => {
            return Err(WorkflowError::Validation(format!(
                "--pick {} is out of range 1-{}",
                position,
                results.len()
            ))
            .into());
        }
        None => match choose_candidate(results)? {
            Some(index) => index,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        },
    };
    let candidate_id = results[index].id.clone();

    let started = orchestrator.choose(&candidate_id).await?;
    println!("\n{}\n", render_preview(&started.preview));
    println!("Scraping metadata, please wait...");

    let report = orchestrator.follow(&started.job, handle_job_update).await;
    if let Some(item) = report.refreshed {
        println!("{}: {}", item.name, item.artifact_label());
    }

    match report.state {
        JobState::NetworkError(reason) => Err(WorkflowError::Transport(reason).into()),
        _ => Ok(()),
    }
}

async fn run_subtitles(
    settings: &Settings,
    needle: &str,
    query: Option<String>,
    pick: Option<String>,
) -> Result<(), PilotError> {
    let mut orchestrator = orchestrator(settings)?;
    target_item(&mut orchestrator, settings, needle).await?;

    if let Some(query) = query {
        orchestrator.edit_query(&query)?;
    }

    let port: Box<dyn SelectionPort> = match pick {
        Some(answer) => Box::new(FixedChoice(answer)),
        None => Box::new(TerminalPrompt),
    };

    match orchestrator.request_subtitles(port.as_ref()).await? {
        Some(saved) => println!(
            "Subtitle '{}' saved:\n{}",
            saved.candidate.release_label, saved.saved_path
        ),
        None => println!("Cancelled."),
    }
    Ok(())
}

fn run_config(settings: &Settings, action: ConfigAction) -> Result<(), PilotError> {
    match action {
        ConfigAction::Show => {
            println!("# {}", Settings::config_path()?.display());
            println!(
                "{}",
                serde_json::to_string_pretty(settings).map_err(mediamm_pilot::ConfigError::from)?
            );
        }
        ConfigAction::Init => {
            let path = Settings::config_path()?;
            settings.save_to(&path)?;
            println!("Settings written to {}", path.display());
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), PilotError> {
    let mut settings = Settings::load()?;
    if let Some(url) = cli.url {
        settings.base_url = url;
    }
    if let Some(root) = cli.root {
        settings.default_root = Some(root);
    }

    match cli.command {
        Command::Scan => run_scan(&settings).await,
        Command::Scrape {
            item,
            query,
            year,
            pick,
        } => run_scrape(&settings, &item, query, year, pick).await,
        Command::Subtitles {
            item,
            query,
            pick,
            lang,
        } => {
            if let Some(lang) = lang {
                settings.subtitle_language = lang;
            }
            run_subtitles(&settings, &item, query, pick).await
        }
        Command::Config { action } => run_config(&settings, action),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
