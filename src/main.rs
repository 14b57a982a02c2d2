//! Sakina Companion CLI
//!
//! Local-first wellness companion: journal, calm sessions, and insights.

use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use sakina_companion::{
    config::Config,
    core::{
        extract_interventions, generate, mood_style, trend_window, TrendSummary, INTERVENTIONS,
    },
    session::{spawn_ticker, Completion, SessionRunner, SharedRunner},
    store::{
        types::{
            BioPatch, InterventionKind, Language, Mood, NewJournalEntry, NotificationPatch,
            NudgeKind, NudgePatch, Theme,
        },
        FileSlot, Store,
    },
    DATA_NOTICE, VERSION,
};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[cfg(feature = "api")]
use sakina_companion::api::{BackendStatus, BlockingApiClient, EnvToken, InterventionLogRequest};

#[derive(Parser)]
#[command(name = "sakina")]
#[command(author = "Sakina")]
#[command(version = VERSION)]
#[command(about = "Local-first wellness companion: journal, calm sessions, and insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the local store at a glance
    Status,

    /// Set the color theme (light, dark, or system)
    Theme { theme: Theme },

    /// Set the interface language (en or ar)
    Language { language: Language },

    /// Update notification preferences
    Notify {
        /// Enable or disable proactive nudges
        #[arg(long)]
        nudges: Option<bool>,

        /// Enable or disable the daily reminder
        #[arg(long)]
        daily_reminder: Option<bool>,
    },

    /// Write, list, or delete journal entries
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Trigger or dismiss the proactive nudge
    Nudge {
        #[command(subcommand)]
        action: NudgeAction,
    },

    /// Update the live bio-load reading
    Bio {
        #[command(subcommand)]
        action: BioAction,
    },

    /// Run a guided calm session
    Session {
        /// Catalog id (see `sakina catalog`)
        intervention: String,

        /// Also log the completed session to the backend
        #[arg(long)]
        sync: bool,
    },

    /// List the available calm exercises
    Catalog,

    /// Show simulated bio-load trends
    Trends {
        /// Window length in days (1-365)
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Check whether the backend is reachable
    Health,

    /// Fetch the dashboard summary from the backend
    Dashboard,

    /// Display what is stored and where
    Data,

    /// Show configuration
    Config,
}

#[derive(Subcommand)]
enum JournalAction {
    /// Add an entry
    Add {
        /// How you feel
        #[arg(long)]
        mood: Option<Mood>,

        /// Record a voice entry of this many seconds instead of text
        #[arg(long)]
        voice: Option<u32>,

        /// Entry text
        content: Vec<String>,
    },
    /// List entries, newest first
    List {
        #[arg(long, short, default_value = "20")]
        limit: usize,
    },
    /// Delete an entry by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum NudgeAction {
    /// Show a nudge
    Trigger {
        #[arg(long)]
        message: String,

        #[arg(long, default_value = "breathing")]
        kind: NudgeKind,

        #[arg(long)]
        context: Option<String>,
    },
    /// Dismiss the nudge and reset the bio status to baseline
    Dismiss,
}

#[derive(Subcommand)]
enum BioAction {
    /// Set the current load (0-100)
    Set { load: u8 },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Status => cmd_status(),
        Commands::Theme { theme } => cmd_theme(theme),
        Commands::Language { language } => cmd_language(language),
        Commands::Notify {
            nudges,
            daily_reminder,
        } => cmd_notify(nudges, daily_reminder),
        Commands::Journal { action } => cmd_journal(action),
        Commands::Nudge { action } => cmd_nudge(action),
        Commands::Bio {
            action: BioAction::Set { load },
        } => cmd_bio_set(load),
        Commands::Session { intervention, sync } => cmd_session(&intervention, sync),
        Commands::Catalog => cmd_catalog(),
        Commands::Trends { days } => cmd_trends(days),
        Commands::Health => cmd_health(),
        Commands::Dashboard => cmd_dashboard(),
        Commands::Data => cmd_data(),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sakina=info,sakina_companion=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config, using defaults: {e}");
            Config::default()
        }
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    config
        .ensure_directories()
        .context("Could not create data directory")?;
    Ok(Store::open(FileSlot::new(
        &config.data_path,
        config.store_key.clone(),
    )))
}

fn cmd_status() -> anyhow::Result<()> {
    let config = load_config();
    let store = open_store(&config)?;
    let state = store.snapshot();
    let prefs = &state.preferences;

    println!("Sakina Companion Status");
    println!("=======================");
    println!();
    println!("Preferences:");
    println!("  Theme: {}", prefs.theme);
    println!("  Language: {}", prefs.language);
    println!(
        "  Nudges: {}",
        if prefs.notifications.nudges {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Daily reminder: {}",
        if prefs.notifications.daily_reminder {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("  Subscription: {}", prefs.subscription);
    println!();

    let bio = &state.bio_status;
    println!("Bio Status:");
    println!("  Load: {} ({})", bio.current_load, bio.status.label());
    println!(
        "  Updated: {}",
        bio.last_updated
            .with_timezone(&config.timezone)
            .format("%Y-%m-%d %H:%M")
    );
    println!();

    if state.nudge.active {
        println!("Nudge: {} [{}]", state.nudge.message, state.nudge.kind);
        if !state.nudge.context.is_empty() {
            println!("  {}", state.nudge.context);
        }
    } else {
        println!("Nudge: none");
    }
    println!();

    println!("History:");
    println!("  Journal entries: {}", state.journal_history.len());
    println!("  Calm sessions: {}", state.intervention_history.len());
    let calm_minutes: u32 = state
        .intervention_history
        .iter()
        .filter(|log| log.completed)
        .map(|log| log.duration_seconds)
        .sum::<u32>()
        / 60;
    println!("  Calm minutes: {calm_minutes}");
    Ok(())
}

fn cmd_theme(theme: Theme) -> anyhow::Result<()> {
    let mut store = open_store(&load_config())?;
    store.set_theme(theme)?;
    println!("Theme set to {theme}.");
    Ok(())
}

fn cmd_language(language: Language) -> anyhow::Result<()> {
    let mut store = open_store(&load_config())?;
    store.set_language(language)?;
    let direction = if language.is_rtl() { "rtl" } else { "ltr" };
    println!("Language set to {language} ({direction}).");
    Ok(())
}

fn cmd_notify(nudges: Option<bool>, daily_reminder: Option<bool>) -> anyhow::Result<()> {
    let mut store = open_store(&load_config())?;
    store.update_notification_preferences(NotificationPatch {
        nudges,
        daily_reminder,
    })?;
    let notifications = store.snapshot().preferences.notifications;
    println!(
        "Nudges: {}, daily reminder: {}",
        notifications.nudges, notifications.daily_reminder
    );
    Ok(())
}

fn cmd_journal(action: JournalAction) -> anyhow::Result<()> {
    let config = load_config();
    let mut store = open_store(&config)?;

    match action {
        JournalAction::Add {
            mood,
            voice,
            content,
        } => {
            let entry = match voice {
                Some(secs) => NewJournalEntry::voice(secs, mood),
                None => NewJournalEntry::text(content.join(" "), mood),
            };
            let created = store.add_journal_entry(entry)?;
            println!("Entry saved ({}).", created.id);
        }
        JournalAction::List { limit } => {
            let history = &store.snapshot().journal_history;
            if history.is_empty() {
                println!("No journal entries yet.");
                println!("Run 'sakina journal add --mood calm \"...\"' to write one.");
                return Ok(());
            }
            for entry in history.iter().take(limit) {
                let mood = entry
                    .mood
                    .map(|m| {
                        let style = mood_style(m);
                        format!("{} {}", style.emoji, style.label)
                    })
                    .unwrap_or_default();
                println!(
                    "[{}] {} {:<14} {}",
                    entry
                        .timestamp
                        .with_timezone(&config.timezone)
                        .format("%Y-%m-%d %H:%M"),
                    &entry.id[..8.min(entry.id.len())],
                    mood,
                    entry.content
                );
            }
        }
        JournalAction::Delete { id } => {
            if store.delete_journal_entry(&id)? {
                println!("Entry deleted.");
            } else {
                println!("No entry with id {id}.");
            }
        }
    }
    Ok(())
}

fn cmd_nudge(action: NudgeAction) -> anyhow::Result<()> {
    let mut store = open_store(&load_config())?;
    match action {
        NudgeAction::Trigger {
            message,
            kind,
            context,
        } => {
            let mut patch = NudgePatch::new(message, kind);
            if let Some(context) = context {
                patch = patch.with_context(context);
            }
            store.trigger_nudge(patch)?;
            println!("Nudge active.");
            if let Some(id) = kind.suggested_intervention() {
                println!("Suggested session: sakina session {id}");
            }
        }
        NudgeAction::Dismiss => {
            store.dismiss_nudge()?;
            println!("Nudge dismissed. Bio status reset to baseline.");
        }
    }
    Ok(())
}

fn cmd_bio_set(load: u8) -> anyhow::Result<()> {
    let mut store = open_store(&load_config())?;
    let reading = store.update_bio_status(BioPatch {
        current_load: Some(load),
        status: None,
    })?;
    println!(
        "Bio load: {} ({})",
        reading.current_load,
        reading.status.label()
    );
    Ok(())
}

fn cmd_session(intervention: &str, sync: bool) -> anyhow::Result<()> {
    let config = load_config();
    let runner = SessionRunner::for_id(intervention, config.pause_duration_secs)?;
    let def = runner.intervention();

    println!("{} ({})", def.title, def.duration_label);
    println!("{}", def.description);
    println!();
    println!("{}", runner.preparation());
    println!();
    match def.kind {
        InterventionKind::Breathing => println!("Press Ctrl+C or type q + Enter to end the session"),
        InterventionKind::Grounding => println!("Press Enter for the next step, q + Enter to stop"),
        InterventionKind::Pause => {
            println!("p + Enter pauses/resumes, Enter finishes at zero, q + Enter stops early")
        }
    }
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;
    let input = spawn_input_reader();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;
    let runner: SharedRunner = Arc::new(Mutex::new(runner));
    let completion = runtime.block_on(drive_session(runner, running, input))?;

    let Some(completion) = completion else {
        println!();
        println!("Session cancelled.");
        return Ok(());
    };

    println!();
    println!(
        "Well done. {} completed in {}.",
        def.title,
        sakina_companion::session::format_clock(completion.duration_seconds)
    );

    let mut store = open_store(&config)?;
    store.log_intervention(completion.to_log())?;

    if sync {
        sync_completion(&config, &completion);
    }
    Ok(())
}

async fn drive_session(
    runner: SharedRunner,
    running: Arc<AtomicBool>,
    input: Receiver<String>,
) -> anyhow::Result<Option<Completion>> {
    let _ticker = spawn_ticker(runner.clone(), Duration::from_secs(1));
    let mut last_line = String::new();

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut runner = runner
            .lock()
            .map_err(|_| anyhow!("Session state poisoned"))?;
        let now = Utc::now();

        if !running.load(Ordering::SeqCst) {
            runner.end(now);
        }
        while let Ok(line) = input.try_recv() {
            match line.trim() {
                "" => {
                    runner.advance(now);
                }
                "p" => runner.toggle_pause(),
                "q" => {
                    runner.end(now);
                }
                other => eprintln!("Unknown command '{other}'"),
            }
        }

        let line = runner.status_line();
        if line != last_line {
            println!("{line}");
            last_line = line;
        }

        if runner.is_done() {
            return Ok(runner.completion());
        }
    }
}

#[cfg(feature = "api")]
fn sync_completion(config: &Config, completion: &Completion) {
    let client = match BlockingApiClient::from_config(config, Arc::new(EnvToken::default())) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Warning: Could not create backend client: {e}");
            return;
        }
    };
    match client.log_intervention(&InterventionLogRequest::from(&completion.to_log())) {
        Ok(()) => println!("Synced to backend."),
        Err(e) => eprintln!("Warning: Sync failed: {}", e.user_message()),
    }
}

#[cfg(not(feature = "api"))]
fn sync_completion(_config: &Config, _completion: &Completion) {
    eprintln!("Warning: --sync ignored (api feature not enabled at compile time)");
}

fn cmd_catalog() -> anyhow::Result<()> {
    println!("Calm Exercises");
    println!("==============");
    println!();
    for def in INTERVENTIONS {
        println!("{:<22} {:<24} {:>8}  [{}]", def.id, def.title, def.duration_label, def.kind);
        println!("  {}", def.description);
        if let Some(params) = def.params {
            println!(
                "  inhale {}s, hold {}s, exhale {}s, hold {}s ({:.1} breaths/min)",
                params.inhale,
                params.hold_in,
                params.exhale,
                params.hold_out,
                params.breaths_per_minute()
            );
        }
    }
    Ok(())
}

fn cmd_trends(days: u32) -> anyhow::Result<()> {
    let days = trend_window(days)?;
    let config = load_config();
    let points = generate(days, config.timezone, &config.bio_trends);

    println!("Bio-Load Trends ({days} days, simulated)");
    println!("==============================");
    println!();

    if let Some(summary) = TrendSummary::from_points(&points, &config.timezone) {
        println!("  Samples: {}", summary.samples);
        println!("  Mean load: {:.1} (sd {:.1})", summary.mean, summary.std_dev);
        println!("  Range: {}-{}", summary.min, summary.max);
        println!("  90th percentile: {:.1}", summary.p90);
        println!("  Overload hours: {}", summary.overload_hours);
        if let Some(hour) = summary.peak_hour {
            println!("  Peak hour: {hour:02}:00");
        }
        println!();
    }

    let interventions = extract_interventions(&points);
    println!("Interventions: {}", interventions.len());
    for log in &interventions {
        println!(
            "  [{}] {} ({} min)",
            log.timestamp
                .with_timezone(&config.timezone)
                .format("%a %H:%M"),
            log.kind,
            log.duration_seconds / 60
        );
    }

    println!();
    println!("Last 24 hours:");
    for point in points.iter().rev().take(24).rev() {
        let bar = "#".repeat((point.bio_load as usize) / 4);
        println!(
            "  {} {:>3} {bar}",
            point.timestamp.with_timezone(&config.timezone).format("%H:%M"),
            point.bio_load
        );
    }
    Ok(())
}

#[cfg(feature = "api")]
fn cmd_health() -> anyhow::Result<()> {
    let config = load_config();
    let client = BlockingApiClient::from_config(&config, Arc::new(EnvToken::default()))?;
    let status = match client.health() {
        Ok(true) => BackendStatus::Available,
        Ok(false) => BackendStatus::Unavailable,
        Err(e) => {
            eprintln!("Warning: {e}");
            BackendStatus::Unavailable
        }
    };

    println!("Backend: {}", client.inner().base_url());
    match status {
        BackendStatus::Available => println!("Status: available ✓"),
        BackendStatus::Unavailable => {
            println!("Status: unavailable ✗");
            println!("Journaling and calm sessions keep working locally.");
        }
    }
    Ok(())
}

#[cfg(feature = "api")]
fn cmd_dashboard() -> anyhow::Result<()> {
    let config = load_config();
    let client = BlockingApiClient::from_config(&config, Arc::new(EnvToken::default()))?;
    let summary = client
        .dashboard_summary()
        .map_err(|e| anyhow!(e.user_message()))?;

    println!("Dashboard");
    println!("=========");
    println!();
    println!(
        "Streak: {} days (longest {}), {} entries total",
        summary.streak.current_streak, summary.streak.longest_streak, summary.streak.total_entries
    );
    println!(
        "Last {} days: {} entries, {} of {} sessions completed, {:.0} calm minutes",
        summary.stats.period_days,
        summary.stats.entry_count,
        summary.stats.completed_interventions,
        summary.stats.intervention_count,
        summary.stats.total_calm_minutes
    );
    if let Some(avg) = summary.stats.avg_stress_score {
        println!("Average stress: {avg:.0}");
    }
    println!();

    for entry in summary.entries.iter().take(5) {
        let analysis = match entry.stress_score {
            Some(score) => format!("stress {score}"),
            None => "analyzing...".to_string(),
        };
        println!(
            "  [{}] {} ({analysis})",
            entry.created_at.with_timezone(&config.timezone).format("%m-%d %H:%M"),
            entry.content
        );
    }

    let mut store = open_store(&config)?;
    if let Some(patch) = summary.nudge.to_patch() {
        println!();
        println!("Nudge: {}", summary.nudge.message);
        if store.snapshot().preferences.notifications.nudges {
            store.trigger_nudge(patch)?;
        }
    }
    Ok(())
}

#[cfg(not(feature = "api"))]
fn cmd_health() -> anyhow::Result<()> {
    Err(anyhow!("backend access requires the api feature"))
}

#[cfg(not(feature = "api"))]
fn cmd_dashboard() -> anyhow::Result<()> {
    Err(anyhow!("backend access requires the api feature"))
}

fn cmd_data() -> anyhow::Result<()> {
    let config = load_config();
    println!("{DATA_NOTICE}");
    println!("Store file: {:?}", config.store_path());
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}

/// Forward stdin lines to the session loop.
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
