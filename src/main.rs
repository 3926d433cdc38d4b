use clap::Parser;
use log::{error, info, warn};
use recall::configuration::{Cli, Command, Config};
use recall::controller::Controller;
use recall::error_handling::types::ControllerError;
use recall::storage::types::ArtifactId;
use recall::web_interface::WebServer;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Importing configuration from {}", path.display());
            Config::from_file(path).unwrap_or_else(|e| {
                error!("Unable to import configuration from file: {}", e);
                std::process::exit(1);
            })
        }
        None => Config::default(),
    };
    config.apply_overrides(cli.data_dir.clone(), cli.port);

    let controller = match Controller::new(config) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = execute(cli.command, controller).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn execute(command: Command, controller: Arc<Controller>) -> Result<(), ControllerError> {
    match command {
        Command::Serve { autostart } => serve(controller, autostart).await,
        Command::Run => run_foreground(controller).await,
        Command::Stop => {
            if controller.stop()? {
                println!("Stop requested, capture ends at the next tick");
            } else {
                println!("Capture is not running");
            }
            Ok(())
        }
        Command::Status => {
            let status = controller.status()?;
            println!(
                "{}: {} of {} snapshots kept",
                if status.running { "running" } else { "stopped" },
                status.count,
                status.capacity
            );
            Ok(())
        }
        Command::List => {
            let entries = controller.timeline()?;
            if entries.is_empty() {
                println!("No snapshots yet");
            }
            for entry in entries {
                println!("{}  {}", entry.id, entry.captured_at);
            }
            Ok(())
        }
        Command::Search {
            query,
            case_sensitive,
        } => {
            for id in controller.search(&query, !case_sensitive)? {
                println!("{}", id);
            }
            Ok(())
        }
        Command::Describe { id } => {
            let id = ArtifactId::parse(&id)?;
            match controller.get_description(&id)? {
                Some(text) => println!("{}", text),
                None => println!("No description for {}", id),
            }
            Ok(())
        }
        Command::SetCapacity { capacity } => {
            let state = controller.set_capacity(capacity)?;
            println!("Capacity set to {}", state.capacity);
            Ok(())
        }
        Command::Reconcile => {
            let report = controller.reconcile().await?;
            println!(
                "{} orphan description(s) removed, {} snapshot(s) without description",
                report.records_removed,
                report.undescribed().count()
            );
            Ok(())
        }
    }
}

/// Hosts the capture loop next to the web interface until Ctrl-C.
async fn serve(controller: Arc<Controller>, autostart: bool) -> Result<(), ControllerError> {
    controller.recover()?;
    if autostart && !controller.start()? {
        warn!("Capture already running elsewhere");
    }

    let server = WebServer::new(controller.clone());
    let address = server.address()?;
    info!("Dashboard available at http://{}", address);
    tokio::select! {
        res = server.start() => res?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    if controller.stop()? {
        controller.join().await;
    }
    Ok(())
}

/// Captures in the foreground until stopped from elsewhere or by Ctrl-C.
async fn run_foreground(controller: Arc<Controller>) -> Result<(), ControllerError> {
    controller.recover()?;
    if !controller.start()? {
        warn!("Capture already running elsewhere");
        return Ok(());
    }

    let interrupt = controller.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, capture ends at the next tick");
            if let Err(e) = interrupt.stop() {
                error!("Unable to stop capture: {}", e);
            }
        }
    });

    controller.join().await;
    info!("Capture stopped");
    Ok(())
}
