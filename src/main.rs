use std::path::PathBuf;
use std::sync::Arc;

use skincheck_client::backend::HttpBackend;
use skincheck_client::error::AppError;
use skincheck_client::presentation::StatusEvent;
use skincheck_client::{Configuration, PhotoFile, StillImageDevice, WorkflowController};
use tokio::sync::broadcast;
use tracing::{Level, error, info};

const USAGE: &str = "skincheck [--config FILE] [--camera IMAGE] <analyze PHOTO | capture | export-csv [DIR] | export-db | count>";

enum Command {
    Analyze(PathBuf),
    Capture,
    ExportCsv(PathBuf),
    ExportDb,
    Count,
}

struct Arguments {
    config: Option<PathBuf>,
    camera: PathBuf,
    command: Command,
}

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

fn parse_arguments(mut args: impl Iterator<Item = String>) -> Result<Arguments, AppError> {
    let mut config = None;
    let mut camera = PathBuf::from("camera.jpg");
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(
                    args.next().ok_or(AppError::Usage(USAGE.to_string()))?,
                ))
            }
            "--camera" => {
                camera = PathBuf::from(args.next().ok_or(AppError::Usage(USAGE.to_string()))?)
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match (positional.next().as_deref(), positional.next()) {
        (Some("analyze"), Some(photo)) => Command::Analyze(PathBuf::from(photo)),
        (Some("capture"), None) => Command::Capture,
        (Some("export-csv"), dir) => {
            Command::ExportCsv(dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")))
        }
        (Some("export-db"), None) => Command::ExportDb,
        (Some("count"), None) => Command::Count,
        _ => return Err(AppError::Usage(USAGE.to_string())),
    };
    Ok(Arguments {
        config,
        camera,
        command,
    })
}

fn spawn_status_printer(mut status_rx: broadcast::Receiver<StatusEvent>) {
    tokio::spawn(async move {
        while let Ok(event) = status_rx.recv().await {
            info!(color = %event.color, "{}", event.message);
        }
    });
}

async fn acquire_and_analyze(controller: &WorkflowController, command: Command) -> Result<(), AppError> {
    controller.request_location().await?;
    match command {
        Command::Analyze(path) => {
            controller.upload_photo(PhotoFile::read(&path).await?).await?;
        }
        Command::Capture => {
            controller.start_camera().await?;
            controller.capture_photo().await?;
        }
        _ => return Err(AppError::Usage(USAGE.to_string())),
    }
    controller.analyze().await?;
    if let Some(presented) = controller.presented_result().await {
        println!("{}", presented.message);
        println!("UV index: {}", presented.uv_index);
        println!("{}", presented.markup);
    }
    Ok(())
}

async fn run(arguments: Arguments) -> Result<(), AppError> {
    let configuration = Configuration::load(arguments.config.as_deref())?;
    let backend = Arc::new(HttpBackend::new(configuration.backend.clone())?);
    let controller = WorkflowController::builder(configuration)
        .backend(backend.clone())
        .location_service(backend)
        .camera(Arc::new(StillImageDevice::new(arguments.camera)))
        .build()?;
    spawn_status_printer(controller.subscribe());

    match arguments.command {
        Command::ExportCsv(dir) => {
            let file = controller.export_csv().await?;
            let path = dir.join(&file.file_name);
            tokio::fs::write(&path, &file.bytes).await?;
            println!("{}", path.display());
        }
        Command::ExportDb => {
            let summary = controller.export_db().await?;
            println!("saved: {}", summary.count.unwrap_or_default());
            for error in summary.errors {
                println!("error: {}", error);
            }
        }
        Command::Count => {
            println!("{}", controller.analysis_count().await?);
        }
        command => acquire_and_analyze(&controller, command).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let arguments = parse_arguments(std::env::args().skip(1))?;
    let outcome = run(arguments).await;
    if let Err(e) = &outcome {
        error!("{}", e);
    }
    outcome
}
