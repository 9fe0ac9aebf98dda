use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use photo_renamer::app::{AppState, UploadMode};
use photo_renamer::config::ClientConfig;
use photo_renamer::core::bulk::BatchUploader;
use photo_renamer::core::downloads::{combine_archives, DirectorySink, DownloadQueue};
use photo_renamer::core::formats;
use photo_renamer::core::ingest::FolderIngestor;
use photo_renamer::core::size::{format_file_size, LimitPolicy};
use photo_renamer::http::ReqwestClient;
use photo_renamer::models::{LocationSummary, PhotoFile, ProgressEvent, RunOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "photo_renamer",
    version,
    about = "Upload photos by location for chronological renaming"
)]
struct Cli {
    /// TOML file with client settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Renaming service endpoint
    #[arg(long, global = true)]
    server: Option<String>,

    /// Directory the returned archives are saved to
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Refuse submissions over the display limit instead of warning
    #[arg(long, global = true)]
    enforce_limit: bool,

    /// Print progress events as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the locations found in one or more folders
    Preview {
        #[arg(required = true)]
        folders: Vec<PathBuf>,
    },
    /// Upload every location of one or more folders in size-capped batches
    Batch {
        #[arg(required = true)]
        folders: Vec<PathBuf>,

        /// Merge all returned archives into one file
        #[arg(long)]
        combine: bool,
    },
    /// Submit named groups in a single request
    Submit {
        /// NAME=PATH[,PATH...]
        #[arg(short, long = "group", value_parser = parse_group, required = true)]
        groups: Vec<GroupSpec>,
    },
}

#[derive(Clone, Debug)]
struct GroupSpec {
    name: String,
    paths: Vec<PathBuf>,
}

fn parse_group(raw: &str) -> std::result::Result<GroupSpec, String> {
    let (name, paths) = raw
        .split_once('=')
        .ok_or_else(|| String::from("expected NAME=PATH[,PATH...]"))?;

    let paths = paths
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect::<Vec<_>>();

    Ok(GroupSpec {
        name: name.to_string(),
        paths,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Preview { folders } => preview(&config, &folders),
        Command::Batch { folders, combine } => {
            batch(&config, &folders, combine || config.combine_archives, cli.json)
        }
        Command::Submit { groups } => submit(&config, &groups),
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("could not load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    if let Some(out) = &cli.out {
        config.output_dir = out.clone();
    }
    if cli.enforce_limit {
        config.limit_policy = LimitPolicy::Enforce;
    }

    Ok(config)
}

fn ingest(state: &mut AppState, config: &ClientConfig, folders: &[PathBuf]) -> Result<()> {
    state.begin_ingest();
    log::debug!("{} ({})", state.mode.label(), state.phase.label());
    let ingestor = FolderIngestor::new(config.max_depth);

    match ingestor.ingest_dropped(folders) {
        Ok(data) => {
            print_preview(&state.finish_ingest(data));
            Ok(())
        }
        Err(err) => Err(state.fail_ingest(err).into()),
    }
}

fn preview(config: &ClientConfig, folders: &[PathBuf]) -> Result<()> {
    let mut state = AppState::from_config(config);
    ingest(&mut state, config, folders)
}

fn batch(config: &ClientConfig, folders: &[PathBuf], combine: bool, json: bool) -> Result<()> {
    let mut state = AppState::from_config(config);
    ingest(&mut state, config, folders)?;

    let data = state.start_batch_upload()?;
    let client = ReqwestClient::new(config.server_url.as_str(), config.request_timeout())?;
    let uploader = BatchUploader::new(&client, config.batch_cap_bytes);

    let (tx, rx) = mpsc::channel();
    let report = thread::scope(|scope| {
        let worker = scope.spawn(|| uploader.run(&data, tx));
        for event in rx {
            print_event(&event, json)?;
            state.apply_progress(&event);
        }
        worker.join().map_err(|_| anyhow!("upload worker panicked"))
    })?;

    println!("{}", report.summary_message());
    log::info!("run ended: {}", state.phase.label());
    if report.outcome() == RunOutcome::TotalFailure {
        bail!("no batch was processed");
    }

    let queue = if combine && report.archives.len() > 1 {
        let archives = report
            .archives
            .iter()
            .map(|archive| archive.download.clone())
            .collect::<Vec<_>>();
        let mut queue = DownloadQueue::new();
        queue.push(combine_archives(&archives)?);
        queue
    } else {
        DownloadQueue::from_report(&report)
    };

    save_downloads(queue, config)
}

fn submit(config: &ClientConfig, groups: &[GroupSpec]) -> Result<()> {
    let mut state = AppState::from_config(config);
    state.set_mode(UploadMode::Manual);

    for (index, entry) in groups.iter().enumerate() {
        let id = match index {
            0 => state.groups[0].id,
            _ => state.add_group(),
        };

        let name = state.set_location_name(id, &entry.name)?.to_string();
        if name != entry.name {
            log::warn!("location \"{}\" sanitized to \"{name}\"", entry.name);
        }

        state.set_files(id, load_files(&entry.paths))?;

        println!("{name}:");
        for line in state.file_listing(id)? {
            println!("  {}  {}", line.name, line.size);
        }
    }

    let gauge = state.size_gauge();
    println!(
        "Total: {} ({:.1}% of {})",
        gauge.total_label(),
        gauge.percentage(),
        format_file_size(gauge.limit_bytes)
    );

    let client = ReqwestClient::new(config.server_url.as_str(), config.request_timeout())?;
    let download = state.submit_form(&client)?;

    let mut queue = DownloadQueue::new();
    queue.push(download);
    save_downloads(queue, config)
}

fn load_files(paths: &[PathBuf]) -> Vec<PhotoFile> {
    let mut files = Vec::new();

    for path in paths {
        if !formats::is_form_accepted(path) {
            log::warn!(
                "skipping {}: accepted types are {}",
                path.display(),
                formats::form_extensions().join(", ")
            );
            continue;
        }

        match PhotoFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }

    files
}

fn save_downloads(mut queue: DownloadQueue, config: &ClientConfig) -> Result<()> {
    let mut sink = DirectorySink::new(&config.output_dir);
    let mut failed = 0;

    for delivery in queue.process(&mut sink) {
        match delivery.result {
            Ok(path) => println!("Saved {}", path.display()),
            Err(err) => {
                failed += 1;
                eprintln!("Could not save {}: {err}", delivery.file_name);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} archive(s) could not be saved");
    }
    Ok(())
}

fn print_preview(summaries: &[LocationSummary]) {
    if summaries.is_empty() {
        println!("No photos found.");
        return;
    }

    for summary in summaries {
        println!(
            "{}: {}, {}",
            summary.location,
            summary.photo_label(),
            summary.size_label()
        );
    }
}

fn print_event(event: &ProgressEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        ProgressEvent::RunStarted {
            total_files,
            total_bytes,
            locations,
            batches,
        } => println!(
            "Uploading {total_files} photos ({}) from {locations} location(s) in {batches} request(s)",
            format_file_size(*total_bytes)
        ),
        ProgressEvent::BatchStarted {
            current,
            total,
            label,
            files,
            bytes,
            ..
        } => println!(
            "[{current}/{total}] {label}: {files} photos, {}",
            format_file_size(*bytes)
        ),
        ProgressEvent::BatchSucceeded {
            current,
            total,
            label,
            archive_bytes,
        } => println!(
            "[{current}/{total}] {label}: done ({})",
            format_file_size(*archive_bytes)
        ),
        ProgressEvent::BatchFailed {
            current,
            total,
            label,
            error,
            ..
        } => eprintln!("[{current}/{total}] {label}: failed: {error}"),
        ProgressEvent::RunFinished {
            outcome,
            succeeded,
            failed,
        } => println!(
            "{}: {succeeded} succeeded, {failed} failed",
            outcome.label()
        ),
    }

    Ok(())
}
