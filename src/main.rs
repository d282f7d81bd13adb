use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};

use ytsync::downloader::NOTIFY_TITLE;
use ytsync::{
    BatchError, BatchEvent, BatchOptions, Catalog, CatalogError, DownloadArchive, DownloadEnv,
    FailureLedger, NoopNotifier, NoopReporter, NotifySend, ProgressReporter, SharedNotifier,
    SharedProgressReporter, YtDlp, run_batch,
};

// Emoji with fallback for terminals without Unicode support
static CLAPPER: Emoji<'_, '_> = Emoji("🎬  ", "");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static RETRY: Emoji<'_, '_> = Emoji("🔄 ", "[~] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static HOURGLASS: Emoji<'_, '_> = Emoji("⏳ ", "[z] ");
static NOTE: Emoji<'_, '_> = Emoji("📝 ", "[i] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Bulk download video playlists via yt-dlp
#[derive(Parser, Debug)]
#[command(name = "ytsync")]
#[command(about = "Bulk download video playlists via yt-dlp")]
#[command(version)]
struct Args {
    /// Playlist catalog JSON produced by the extractor step
    #[arg(default_value = "playlists_videos.json")]
    catalog: PathBuf,

    /// Output directory for downloaded videos
    #[arg(default_value = "videos")]
    output_dir: PathBuf,

    /// Failure ledger file
    #[arg(long, default_value = "failed_downloads.txt")]
    ledger: PathBuf,

    /// Download archive file maintained by yt-dlp
    #[arg(long, default_value = "downloaded.txt")]
    archive: PathBuf,

    /// Maximum number of items to attempt in the main pass
    #[arg(short, long)]
    limit: Option<usize>,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,
}

/// Progress reporter printing batch events through an indicatif spinner
struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {wide_msg}")
                .unwrap(),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: BatchEvent) {
        match event {
            BatchEvent::CatalogLoaded { playlists, videos } => {
                self.bar.println(format!(
                    "{NOTE}{} playlists, {} videos in catalog",
                    playlists.to_string().cyan(),
                    videos.to_string().cyan()
                ));
            }

            BatchEvent::PlaylistStarting { name, videos, .. } => {
                self.bar.println(format!(
                    "\n{FOLDER}Processing playlist: {} ({} videos)",
                    name.bold().green(),
                    videos
                ));
            }

            BatchEvent::DownloadStarting {
                title,
                index,
                attempt,
            } => {
                let suffix = if attempt > 0 { " (retry)" } else { "" };
                self.bar.set_message(format!(
                    "{DOWNLOAD}[{}] {}{}",
                    index.to_string().cyan(),
                    truncate_title(&title, 50),
                    suffix.yellow()
                ));
            }

            BatchEvent::DownloadRetrying {
                title,
                reason,
                cooldown,
            } => {
                let wait = cooldown
                    .map(|d| format!(" after {}s", d.as_secs()))
                    .unwrap_or_default();
                self.bar.println(format!(
                    "{RETRY}{} detected for {}, retrying once{}",
                    reason.yellow(),
                    truncate_title(&title, 40),
                    wait
                ));
            }

            BatchEvent::SleepWindowSkipped { title } => {
                self.bar.println(format!(
                    "{NOTE}{} already archived, skipping sleep interval",
                    truncate_title(&title, 40).dimmed()
                ));
            }

            BatchEvent::DownloadCompleted { title } => {
                self.bar
                    .println(format!("{SUCCESS}{}", truncate_title(&title, 50).green()));
            }

            BatchEvent::DownloadFailed { title, reason } => {
                self.bar.println(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&title, 40).red(),
                    reason.dimmed()
                ));
            }

            BatchEvent::RetryPassStarting { pending } => {
                if pending > 0 {
                    self.bar.println(format!(
                        "\n{RETRY}{} {} pending",
                        "Retrying failed downloads:".bold(),
                        pending.to_string().yellow()
                    ));
                }
            }

            BatchEvent::RetryCooldown { duration } => {
                self.bar
                    .set_message(format!("{HOURGLASS}Sleeping {}s...", duration.as_secs()));
            }

            BatchEvent::RetryIndexUnresolved { entry } => {
                self.bar.println(format!(
                    "{WARNING}No catalog position for {}; left in ledger",
                    entry.yellow()
                ));
            }

            BatchEvent::RetryPassCompleted { remaining } => {
                if remaining > 0 {
                    self.bar.println(format!(
                        "{WARNING}{} videos still failing after retry",
                        remaining.to_string().red().bold()
                    ));
                }
            }

            BatchEvent::BatchCompleted {
                downloaded,
                failed,
                still_failing,
            } => {
                self.bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} failed, {} still failing",
                    "Batch complete:".bold().green(),
                    downloaded.to_string().green().bold(),
                    failed.to_string().yellow(),
                    if still_failing > 0 {
                        still_failing.to_string().red().bold()
                    } else {
                        still_failing.to_string().green()
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

    println!(
        "\n{}{} {}\n",
        CLAPPER,
        "ytsync".bold().magenta(),
        "- Playlist Downloader".dimmed()
    );

    let notifier: SharedNotifier = if args.no_notify {
        NoopNotifier::shared()
    } else {
        NotifySend::shared()
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(ConsoleReporter::new())
    };

    let catalog = match Catalog::load(&args.catalog) {
        Ok(catalog) => catalog,
        Err(e @ CatalogError::NotFound(_)) => {
            notifier.notify(NOTIFY_TITLE, &e.to_string()).await;
            eprintln!("{FAILURE}{}", e.to_string().red());
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load catalog"),
    };

    let downloader = YtDlp::new();
    let ledger = FailureLedger::new(&args.ledger);
    let archive = DownloadArchive::new(&args.archive);
    let options = BatchOptions { limit: args.limit };

    let env = DownloadEnv {
        downloader: &downloader,
        ledger: &ledger,
        archive: &archive,
        notifier: notifier.as_ref(),
        reporter: &reporter,
        output_dir: &args.output_dir,
    };

    let result = tokio::select! {
        result = run_batch(&catalog, &env, &options) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{WARNING}{}", "Interrupted by user".yellow());
            notifier.notify(NOTIFY_TITLE, "Run was interrupted").await;
            std::process::exit(130);
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(BatchError::Download(e)) if e.is_fatal_auth() => {
            // The attempt path already sent the auth notification
            eprintln!("\n{FAILURE}{}", e.to_string().red().bold());
            std::process::exit(1);
        }
        Err(e) => {
            notifier.notify(NOTIFY_TITLE, &format!("Run stopped: {e}")).await;
            return Err(e).context("Batch run failed");
        }
    };

    notifier.notify(NOTIFY_TITLE, "All downloads completed!").await;

    if !args.quiet {
        if report.still_failing > 0 {
            println!("\n{}", "Still failing:".red().bold());
            for line in ledger.read().unwrap_or_default() {
                println!("  {CROSS}{}", line.yellow());
            }
        }

        println!(
            "\n{FOLDER}Output: {}\n",
            args.output_dir.display().to_string().cyan()
        );
    }

    if report.downloaded == 0 && report.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
