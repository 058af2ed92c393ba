//! CLI entry point for `olkarchive`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use olkarchive::archive::{self, style, ArchiveFormat, ArchiveLayout};
use olkarchive::backup::{BackupDir, MetadataSource};
use olkarchive::batch;
use olkarchive::config::Config;
use olkarchive::model::mail::MailRecord;
use olkarchive::olk15::{self, anchor, LengthUnit};
use olkarchive::store::MailStore;

/// Mails or attachments decoded per parallel batch.
const BATCH_SIZE: usize = 256;

#[derive(Parser)]
#[command(
    name = "olkarchive",
    version,
    about = "Convert an Outlook for Mac (OLK15) backup into a browsable HTML or MBOX archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive every mail and attachment of a backup profile
    Archive {
        /// Backup profile directory (defaults to $OLKARCHIVE_PROFILE)
        #[arg(value_name = "PROFILE")]
        profile: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<ArchiveFormat>,
        /// Start over without asking if a previous archive exists
        #[arg(short, long)]
        yes: bool,
        /// Extraction worker threads (0 = one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Decode a single message container
    Mail {
        container: PathBuf,
        /// Subject of the mail, used to locate the body
        #[arg(short, long)]
        subject: String,
        /// Write the raw UTF-16LE bytes instead of decoded text
        #[arg(long)]
        raw: bool,
    },
    /// Decode a single attachment container
    File {
        container: PathBuf,
        /// Directory to write the attachment to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Show anchor candidates and frame layout of a container
    Inspect {
        container: PathBuf,
        /// Treat the container as a message with this subject
        #[arg(short, long)]
        subject: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration file
    Config {
        /// Overwrite an existing file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = olkarchive::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Archive {
            profile,
            output,
            format,
            yes,
            jobs,
        } => cmd_archive(&config, profile.as_deref(), output, format, yes, jobs),
        Commands::Mail {
            container,
            subject,
            raw,
        } => cmd_mail(&config, &container, &subject, raw),
        Commands::File { container, output } => cmd_file(&config, &container, &output),
        Commands::Inspect {
            container,
            subject,
            json,
        } => cmd_inspect(&config, &container, subject.as_deref(), json),
        Commands::Config { init } => cmd_config(&config, init),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = olkarchive::config::log_file_path(config);
    let log_dir = olkarchive::config::cache_dir(config);
    if let (Ok(()), Some(file_name)) = (std::fs::create_dir_all(&log_dir), log_path.file_name()) {
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {label} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})"
            ))
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb
}

/// Per-item outcome counters for the final summary.
#[derive(Default)]
struct Tally {
    written: usize,
    empty: usize,
    failed: usize,
    bytes: u64,
}

/// Full archive run over a backup profile.
fn cmd_archive(
    config: &Config,
    profile: Option<&Path>,
    output: Option<PathBuf>,
    format: Option<ArchiveFormat>,
    yes: bool,
    jobs: Option<usize>,
) -> anyhow::Result<()> {
    let backup = BackupDir::locate(profile)?;
    let layout = ArchiveLayout::new(output.unwrap_or_else(|| config.archive.output_dir.clone()));
    let format = format.unwrap_or(config.archive.format);
    let workers = batch::effective_workers(jobs.unwrap_or(config.performance.workers));
    let queue_depth = config.performance.queue_depth;

    if layout.has_previous_run() {
        if !yes && !confirm_start_over()? {
            println!("Exiting.");
            return Ok(());
        }
        layout.clear_mails()?;
    }
    style::write_stylesheet(&layout, config.archive.stylesheet.as_deref())?;

    let store = MailStore::new(config.decoder.clone());
    let mut archiver = archive::create_archiver(format, layout.clone(), config.archive.date_options());
    let start = Instant::now();

    // ── Mails ──
    let mails = backup.mails()?;
    tracing::info!(count = mails.len(), workers, "Getting email content and writing to files");
    let pb = progress_bar(mails.len() as u64, "Mails");
    let mut mail_tally = Tally::default();

    for (chunk_idx, chunk) in mails.chunks(BATCH_SIZE).enumerate() {
        let base = (chunk_idx * BATCH_SIZE) as u64;
        let bodies = batch::run_parallel(
            chunk.iter().collect(),
            workers,
            queue_depth,
            |mail: &MailRecord| store.get_mail_content(backup.content_path(mail), &mail.subject),
            Some(&|done, _total| pb.set_position(base + done as u64)),
        );

        for (mail, body) in chunk.iter().zip(bodies) {
            match body {
                Ok(body) => {
                    if body.is_empty() {
                        mail_tally.empty += 1;
                    }
                    match archiver.archive_mail(mail, &body) {
                        Ok(()) => mail_tally.written += 1,
                        Err(e) => {
                            tracing::error!(id = mail.id, error = %e, "Failed to archive mail");
                            mail_tally.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(id = mail.id, error = %e, "Skipping mail");
                    mail_tally.failed += 1;
                }
            }
        }
    }
    pb.finish_and_clear();
    tracing::info!("Done getting emails");

    // ── Attachments ──
    let attachments = backup.attachments()?;
    tracing::info!(count = attachments.len(), "Getting attached files");
    let pb = progress_bar(attachments.len() as u64, "Attachments");
    let mut att_tally = Tally::default();

    for (chunk_idx, chunk) in attachments.chunks(BATCH_SIZE).enumerate() {
        let base = chunk_idx * BATCH_SIZE;
        let files = batch::run_parallel(
            chunk.iter().collect(),
            workers,
            queue_depth,
            |path: &PathBuf| store.get_file_content(path),
            Some(&|done, _total| pb.set_position((base + done) as u64)),
        );

        for (i, (path, file)) in chunk.iter().zip(files).enumerate() {
            let file = match file {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping attachment");
                    att_tally.failed += 1;
                    continue;
                }
            };
            match archiver.archive_attachment(&file, base + i) {
                Ok(Some(_)) => {
                    att_tally.written += 1;
                    att_tally.bytes += file.size();
                }
                Ok(None) => att_tally.empty += 1,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to write attachment");
                    att_tally.failed += 1;
                }
            }
        }
    }
    pb.finish_and_clear();
    archiver.finish()?;
    tracing::info!("Done getting attachments");

    print_summary(&layout, &mail_tally, &att_tally, start.elapsed());
    Ok(())
}

/// Ask whether a previous archive may be removed. Anything but "n"/"no" agrees.
fn confirm_start_over() -> anyhow::Result<bool> {
    print!("The Mails directory already exists, do you want to start over? [Y/n]: ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer != "n" && answer != "no")
}

fn print_summary(layout: &ArchiveLayout, mails: &Tally, atts: &Tally, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<25} {}", "Archive", layout.root().display());
    println!("  {:<25} {}", "Mails archived", mails.written);
    println!("  {:<25} {}", "  with empty body", mails.empty);
    println!("  {:<25} {}", "  failed", mails.failed);
    println!("  {:<25} {}", "Attachments written", atts.written);
    println!("  {:<25} {}", "  empty, skipped", atts.empty);
    println!("  {:<25} {}", "  failed", atts.failed);
    println!(
        "  {:<25} {}",
        "Attachment data",
        format_size(atts.bytes, BINARY)
    );
    println!("  {:<25} {:.2?}", "Elapsed", elapsed);
    println!();
}

/// Decode one message container and print it.
fn cmd_mail(config: &Config, container: &Path, subject: &str, raw: bool) -> anyhow::Result<()> {
    let store = MailStore::new(config.decoder.clone());
    let body = store.get_mail_content(container, subject)?;
    if body.is_empty() {
        eprintln!("  No message content found for subject {subject:?}");
        return Ok(());
    }
    if raw {
        std::io::stdout().write_all(body.as_bytes())?;
    } else {
        println!("{}", body.text());
    }
    Ok(())
}

/// Decode one attachment container and write it to `output`.
fn cmd_file(config: &Config, container: &Path, output: &Path) -> anyhow::Result<()> {
    let store = MailStore::new(config.decoder.clone());
    let file = store.get_file_content(container)?;
    if file.is_empty() {
        println!("  Attachment '{}' is empty, nothing written", file.name);
        return Ok(());
    }
    let path = archive::attachment::write_as(output, &file.name, &file.data)?;
    println!(
        "  Wrote {} ({})",
        path.display(),
        humansize::format_size(file.size(), humansize::BINARY)
    );
    Ok(())
}

/// Print what the decoder sees in a container.
fn cmd_inspect(
    config: &Config,
    container: &Path,
    subject: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    const FRAME_LIMIT: usize = 64;

    let profile = &config.decoder;
    let buffer = std::fs::read(container)
        .map_err(|e| olkarchive::error::ArchiveError::io(container, e))?;

    let (kind, candidates, chosen, start, unit, name) = match subject {
        Some(subject) => {
            let candidates = anchor::candidates(&buffer, subject);
            let chosen = anchor::locate(&buffer, subject, profile).ok();
            let start = chosen.map(|a| a.end() + profile.anchor_skip);
            let unit = profile.text_length_unit;
            ("message", candidates, chosen.map(|a| a.offset), start, unit, None)
        }
        None => {
            let name = olk15::attachment::read_name_field(&buffer, profile)
                .ok()
                .flatten();
            let start = Some(profile.name_width);
            ("attachment", Vec::new(), None, start, LengthUnit::Bytes, name)
        }
    };
    let (frames, error) = match start {
        Some(start) => olk15::frame_layout(&buffer, start, profile, unit, FRAME_LIMIT),
        None => (Vec::new(), None),
    };

    if json {
        let report = serde_json::json!({
            "file": container.to_string_lossy(),
            "size": buffer.len(),
            "kind": kind,
            "profile": profile,
            "anchor_candidates": candidates,
            "anchor": chosen,
            "name": name,
            "frames": frames,
            "error": error.map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("  {:<20} {}", "File", container.display());
    println!("  {:<20} {} bytes", "Size", buffer.len());
    println!("  {:<20} {}", "Kind", kind);
    if subject.is_some() {
        println!("  {:<20} {:?}", "Subject offsets", candidates);
        match chosen {
            Some(offset) => println!("  {:<20} {}", "Chosen anchor", offset),
            None => println!("  {:<20} none past header ({} bytes)", "Chosen anchor", profile.header_size),
        }
    } else {
        println!("  {:<20} {}", "Stored name", name.as_deref().unwrap_or("-"));
    }
    println!("  {:<20} {}", "Frames", frames.len());
    for f in &frames {
        println!("    @{:<10} len {}", f.offset, f.length);
    }
    if let Some(e) = error {
        println!("  {:<20} {}", "Stopped", e);
    }
    println!();
    Ok(())
}

/// Write the current (default or loaded) configuration to disk.
fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    let path = olkarchive::config::config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    if path.exists() && !init {
        println!("  Config already exists at {} (use --init to overwrite)", path.display());
        return Ok(());
    }
    let written = olkarchive::config::save_config(config)?;
    println!("  Wrote {}", written.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "olkarchive", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}
