use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};

use podspool::{
    run_all, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient, RunOptions,
    SharedProgressReporter,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[=] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[w] ");

/// Download new podcast episodes from configured RSS feeds
#[derive(Parser, Debug)]
#[command(name = "podspool")]
#[command(about = "Download new podcast episodes from configured RSS feeds")]
#[command(version)]
struct Args {
    /// Configuration file (default: ~/.podspoolrc)
    config_file: Option<PathBuf>,

    /// Overwrite existing files and re-download known episodes
    #[arg(long)]
    force: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Progress reporter rendering events to the terminal with a single
/// indicatif bar for the running download
struct ConsoleReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, length: Option<u64>, message: String) {
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .unwrap()
            .progress_chars("█▓░");

        let bar = ProgressBar::new(length.unwrap_or(0));
        bar.set_style(style);
        bar.set_message(message);

        *self.bar.lock().unwrap() = Some(bar);
    }

    fn finish_bar(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ChannelStarted { name, index, total } => {
                println!(
                    "\n{HEADPHONES}{} {} ({}/{})",
                    "Checking".bold(),
                    name.cyan(),
                    (index + 1).to_string().cyan(),
                    total.to_string().cyan()
                );
            }

            ProgressEvent::FeedFailed { url, error } => {
                eprintln!("  {FAILURE}{} - {}", url.dimmed(), error.red());
            }

            ProgressEvent::FeedEmpty { url } => {
                println!(
                    "  {} {}",
                    "No episodes found in feed".yellow(),
                    url.dimmed()
                );
            }

            ProgressEvent::EpisodeStarted {
                title,
                index,
                total,
            } => {
                println!(
                    "  [{}/{}] {}",
                    index.to_string().cyan(),
                    total.to_string().cyan(),
                    truncate_title(&title, 60)
                );
            }

            ProgressEvent::EpisodeSkippedDuplicate { title } => {
                println!(
                    "  {SKIP}{} {}",
                    "Already downloaded:".yellow(),
                    truncate_title(&title, 50)
                );
            }

            ProgressEvent::EpisodeAlreadyOnDisk { path } => {
                println!(
                    "  {SKIP}{} {}",
                    "Already on disk:".yellow(),
                    path.display().to_string().dimmed()
                );
            }

            ProgressEvent::OverwritingFile { path } => {
                println!(
                    "  {WARNING}{} {}",
                    "Overwriting".yellow(),
                    path.display().to_string().dimmed()
                );
            }

            ProgressEvent::DownloadStarting {
                title,
                content_length,
            } => {
                self.start_bar(content_length, truncate_title(&title, 40));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
            } => {
                let guard = self.bar.lock().unwrap();
                if let Some(bar) = guard.as_ref() {
                    if let Some(total) = total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(bytes_downloaded);
                }
            }

            ProgressEvent::DownloadCompleted { path, bytes } => {
                self.finish_bar();
                println!(
                    "  {SUCCESS}{} {}",
                    path.display().to_string().green(),
                    format!("({bytes} bytes)").dimmed()
                );
            }

            ProgressEvent::EpisodeFailed { title, error } => {
                self.finish_bar();
                eprintln!(
                    "  {FAILURE}{} - {}",
                    truncate_title(&title, 40).red(),
                    error.red()
                );
            }

            ProgressEvent::TagsWritten { path } => {
                println!(
                    "  {} {}",
                    "Updated tags for".dimmed(),
                    path.display().to_string().dimmed()
                );
            }

            ProgressEvent::Warning { message } => {
                eprintln!("  {WARNING}{}", message.yellow());
            }

            ProgressEvent::RunCompleted {
                downloaded,
                skipped,
                failed,
            } => {
                println!(
                    "\n{PARTY}{} {} downloaded, {} skipped, {} failed",
                    "Done:".bold().green(),
                    downloaded.to_string().green().bold(),
                    skipped.to_string().yellow(),
                    if failed > 0 {
                        failed.to_string().red().bold()
                    } else {
                        failed.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let truncated: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!(
            "\n{}{} {}",
            MICROPHONE,
            "podspool".bold().magenta(),
            "- Podcast Downloader".dimmed()
        );
    }

    let client = ReqwestClient::new();

    let options = RunOptions {
        config_path: args.config_file,
        tracking_path: None,
        force_overwrite: args.force,
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(ConsoleReporter::new())
    };

    run_all(&client, &options, reporter)
        .await
        .context("Failed to check podcast feeds")?;

    Ok(())
}
