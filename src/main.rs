//! stemsplit CLI entry point

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use stemsplit::config::cli::{BatchArgs, Command, SeparateArgs};
use stemsplit::config::{Cli, Settings};
use stemsplit::export::{self, DownloadReport, JobReport, Report};
use stemsplit::pipeline::{self, BatchOptions, JobTicket, JobWorker, NO_FILES_MESSAGE};
use stemsplit::separation::family::ROFORMER_MODELS;
use stemsplit::separation::{BackendFamily, CommandBackend};
use stemsplit::{audio, JobOutcome};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    // Build settings from CLI
    let settings = Settings::from_cli(&cli);

    let result = match &cli.command {
        Command::Models { family } => {
            print_models(*family, settings.output_json);
            Ok(true)
        }
        Command::Separate(args) => with_worker(&settings, |worker| separate(&settings, worker, args)),
        Command::Batch(args) => with_worker(&settings, |worker| batch(&settings, worker, args)),
        Command::Download { url } => with_worker(&settings, |worker| download(&settings, worker, url)),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = cli.log_level().to_string().to_lowercase();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prepare directories and start the background worker before running `f`
fn with_worker(
    settings: &Settings,
    f: impl FnOnce(&JobWorker) -> stemsplit::Result<bool>,
) -> stemsplit::Result<bool> {
    settings.prepare_directories()?;
    let worker = JobWorker::spawn()?;
    f(&worker)
}

/// Run one job; returns false if no stems were produced
fn separate(settings: &Settings, worker: &JobWorker, args: &SeparateArgs) -> stemsplit::Result<bool> {
    let request = args.family.to_request();

    let (source, audio) = if let Some(input) = &args.source.input {
        (input.display().to_string(), audio::decode(input)?)
    } else if let Some(url) = &args.source.url {
        let downloader = settings.downloader();
        let target = url.clone();
        let ticket = worker.submit(move || downloader.download(&target))?;
        match wait_with_spinner(ticket, "Downloading...", settings.show_progress)? {
            Some(downloaded) => (url.clone(), downloaded.audio),
            None => {
                eprintln!("Error: no audio could be downloaded from {}", url);
                return Ok(false);
            }
        }
    } else {
        return Err(stemsplit::StemsplitError::ConfigError(
            "either --input or --url is required".to_string(),
        ));
    };

    let runner = settings.job_runner();
    let job_request = request.clone();
    let ticket = worker.submit(move || runner.run(&audio, &job_request))?;
    let message = format!("Separating with {} {}...", request.family(), request.model);
    let outcome = wait_with_spinner(ticket, &message, settings.show_progress)?;

    let succeeded = !outcome.is_failed();
    let report = Report::Job(JobReport {
        source,
        request,
        outcome,
    });

    emit(settings, report, |report| {
        if let Report::Job(job) = report {
            match &job.outcome {
                JobOutcome::Stems { paths } if paths.is_empty() => {
                    println!("Separation finished but no stems were found in {}", settings.output_dir.display());
                }
                JobOutcome::Stems { paths } => {
                    for path in paths {
                        println!("{}", path.display());
                    }
                }
                JobOutcome::Failed { message } => eprintln!("Error: {}", message),
            }
        }
    })?;

    Ok(succeeded)
}

/// Run a directory batch; returns false if any file failed or the batch never started
fn batch(settings: &Settings, worker: &JobWorker, args: &BatchArgs) -> stemsplit::Result<bool> {
    let options = BatchOptions {
        input_dir: args.input_dir.clone(),
        output_dir: args
            .batch_output
            .clone()
            .unwrap_or_else(|| settings.output_dir.clone()),
        recursive: args.recursive,
        normalization: settings.normalization.clone(),
        show_progress: settings.show_progress,
    };
    let backend = CommandBackend::new(&settings.separator_bin);
    let request = args.family.to_request();
    // The batch draws its own progress bar, so no spinner here
    let report = worker
        .submit(move || pipeline::run_batch(&backend, &options, &request))?
        .wait()?;

    let stopped_early =
        report.entries.is_empty() && report.log.first().map(String::as_str) != Some(NO_FILES_MESSAGE);
    let succeeded = report.failed() == 0 && !stopped_early;

    emit(settings, Report::Batch(report), |report| {
        if let Report::Batch(batch) = report {
            println!("{}", batch.log_text());
            if !batch.entries.is_empty() {
                println!();
                println!(
                    "Summary: {} processed, {} failed (of {} total)",
                    batch.processed(),
                    batch.failed(),
                    batch.entries.len()
                );
            }
        }
    })?;

    Ok(succeeded)
}

/// Download only; returns false if nothing was fetched
fn download(settings: &Settings, worker: &JobWorker, url: &str) -> stemsplit::Result<bool> {
    let downloader = settings.downloader();
    let target = url.to_string();
    let ticket = worker.submit(move || downloader.download(&target))?;
    let downloaded = wait_with_spinner(ticket, "Downloading...", settings.show_progress)?;

    let succeeded = downloaded.is_some();
    let report = Report::Download(DownloadReport {
        url: url.to_string(),
        path: downloaded.as_ref().map(|d| d.path.clone()),
        sample_rate: downloaded.as_ref().map(|d| d.audio.sample_rate),
        duration_seconds: downloaded.as_ref().map(|d| d.audio.duration()),
    });

    emit(settings, report, |report| {
        if let Report::Download(dl) = report {
            match &dl.path {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("Error: no audio could be downloaded from {}", dl.url),
            }
        }
    })?;

    Ok(succeeded)
}

/// Print a report as text or JSON, and write it to `--report` if given
fn emit(settings: &Settings, report: Report, print_text: impl FnOnce(&Report)) -> stemsplit::Result<()> {
    if let Some(path) = &settings.report_path {
        export::write_json(report.clone(), path)?;
    }

    if settings.output_json {
        println!("{}", export::to_json_string(report)?);
    } else {
        print_text(&report);
    }

    Ok(())
}

fn wait_with_spinner<T>(ticket: JobTicket<T>, message: &str, show: bool) -> stemsplit::Result<T> {
    if !show {
        return ticket.wait();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());

    let result = ticket.wait_with(Duration::from_millis(100), || spinner.tick());
    spinner.finish_and_clear();
    result
}

fn print_models(family: Option<BackendFamily>, as_json: bool) {
    let families: Vec<BackendFamily> = match family {
        Some(f) => vec![f],
        None => BackendFamily::ALL.to_vec(),
    };

    if as_json {
        let catalog: serde_json::Map<String, serde_json::Value> = families
            .iter()
            .map(|f| (f.slug().to_string(), serde_json::json!(f.catalog())))
            .collect();
        println!("{}", serde_json::Value::Object(catalog));
        return;
    }

    for (i, f) in families.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({}):", f.name(), f.slug());
        if *f == BackendFamily::Roformer {
            for (alias, file) in ROFORMER_MODELS {
                println!("  {}  ->  {}", alias, file);
            }
        } else {
            for model in f.catalog() {
                println!("  {}", model);
            }
        }
    }
}
