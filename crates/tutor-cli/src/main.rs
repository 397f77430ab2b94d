// ============================================================================
// alamo — terminal front-end for the Alámò STEM tutor
// ============================================================================
// Usage:
//   alamo chat physics          Open a tutoring session for a subject
//   alamo stats                 Show coins, credits, streak, and progress
//   alamo history physics       Print a subject's stored transcript
//   alamo export                Dump profile and transcripts as JSON
//   alamo reset                 Wipe profile and transcripts (asks to confirm)
// ============================================================================

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tutor_core::{
    store, ChatMessage, ChatSession, GeminiTutor, IdentityProvider, KvStore, LocalIdentity,
    ProfileManager, Role, Subject, TurnOutcome, TutorDb, TutorService,
};

/// Alámò STEM tutor for WAEC/JAMB prep
#[derive(Parser)]
#[command(name = "alamo", version, about = "Chat with Alámò and track your study progress")]
struct Cli {
    /// Path to the database file (default: ~/.alamo/tutor.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an interactive tutoring session
    Chat {
        /// Subject: physics, mathematics, chemistry, biology
        subject: String,
    },

    /// Show profile statistics
    Stats,

    /// Print the stored transcript for a subject
    History {
        /// Subject: physics, mathematics, chemistry, biology
        subject: String,
    },

    /// Export profile and transcripts as JSON
    Export,

    /// Reset the profile and wipe all transcripts
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn parse_subject(s: &str) -> Result<Subject> {
    Subject::from_str(s).ok_or_else(|| {
        anyhow!(
            "Unknown subject '{}'. Valid values: physics, mathematics, chemistry, biology",
            s
        )
    })
}

fn format_timestamp(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("(invalid: {})", millis))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = TutorDb::open(cli.db_path.as_deref())?;
    let store: Arc<dyn KvStore> = Arc::new(db);

    match cli.command {
        Commands::Chat { subject } => cmd_chat(store, parse_subject(&subject)?).await,
        Commands::Stats => cmd_stats(&store),
        Commands::History { subject } => cmd_history(&store, parse_subject(&subject)?),
        Commands::Export => cmd_export(&store),
        Commands::Reset { yes } => cmd_reset(store, yes),
    }
}

async fn cmd_chat(store: Arc<dyn KvStore>, subject: Subject) -> Result<()> {
    let mut profile = ProfileManager::load(store.clone());
    profile.record_visit();

    let identity = LocalIdentity::from_env();
    match identity.current() {
        Some(user) => println!("Signed in as {}", user.display_label),
        None => println!("Studying as guest"),
    }

    let tutor = GeminiTutor::from_env();
    if !tutor.is_configured() {
        println!("(GEMINI_API_KEY is not set; Alámò will stay disconnected)");
    }
    let service: Arc<dyn TutorService> = Arc::new(tutor);
    let mut session = ChatSession::open(subject, store, service);

    println!();
    println!("=== {} Lab ===", subject);
    for message in session.messages() {
        print_message(message);
    }
    print_balances(&profile);
    println!("Type your question, or 'quit' to leave.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match session.send_turn(&mut profile, line).await {
            TurnOutcome::Rejected => continue,
            TurnOutcome::InsufficientCredits => {
                if let Some(notice) = session.messages().last() {
                    print_message(notice);
                }
            }
            TurnOutcome::Replied { reply, praise } => {
                println!("Alámò: {}", reply);
                if let Some(praise) = praise {
                    println!("🌟 {} (+10 Eko-Coins!)", praise.text);
                }
                print_balances(&profile);
            }
        }
    }

    println!("Ó dàbọ̀! Keep your streak alive.");
    Ok(())
}

fn print_message(message: &ChatMessage) {
    let speaker = match message.role {
        Role::User => "You",
        Role::Model => "Alámò",
    };
    println!(
        "[{}] {}: {}",
        format_timestamp(message.timestamp),
        speaker,
        message.text
    );
}

fn print_balances(profile: &ProfileManager) {
    let stats = profile.stats();
    println!(
        "  🔥 {} day streak | {} credits | {} coins",
        stats.streak, stats.credits, stats.coins
    );
}

fn cmd_stats(store: &Arc<dyn KvStore>) -> Result<()> {
    let profile = ProfileManager::load(store.clone());
    let stats = profile.stats();

    println!("=== Alámò Profile ===");
    println!("Coins:   {}", stats.coins);
    println!("Credits: {}", stats.credits);
    println!("Streak:  {} day(s), last visit {}", stats.streak, stats.last_visit);
    println!();
    println!("Progress:");
    for subject in Subject::ALL {
        let pct = stats.progress.get(&subject).copied().unwrap_or(0);
        println!("  {:12} {:>3}%", subject.as_str(), pct);
    }

    Ok(())
}

fn cmd_history(store: &Arc<dyn KvStore>, subject: Subject) -> Result<()> {
    match store::load_transcript(store.as_ref(), subject)? {
        Some(messages) if !messages.is_empty() => {
            println!("=== {} transcript ({} messages) ===", subject, messages.len());
            for message in &messages {
                print_message(message);
            }
        }
        _ => println!("No transcript stored for {} yet.", subject),
    }

    Ok(())
}

fn cmd_export(store: &Arc<dyn KvStore>) -> Result<()> {
    let profile = ProfileManager::load(store.clone());

    let mut transcripts = serde_json::Map::new();
    for subject in Subject::ALL {
        if let Some(messages) = store::load_transcript(store.as_ref(), subject)? {
            transcripts.insert(
                subject.as_str().to_string(),
                serde_json::to_value(messages)?,
            );
        }
    }

    let export = serde_json::json!({
        "profile": profile.stats(),
        "transcripts": transcripts,
    });
    println!("{}", serde_json::to_string_pretty(&export)?);

    Ok(())
}

fn cmd_reset(store: Arc<dyn KvStore>, yes: bool) -> Result<()> {
    if !yes {
        print!("This wipes your profile and every transcript. Type 'reset' to confirm: ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        if line.trim() != "reset" {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut profile = ProfileManager::load(store);
    profile.reset_all();
    println!("Profile reset. Fresh start, omo mi!");

    Ok(())
}
