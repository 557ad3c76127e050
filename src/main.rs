//! # Papershot CLI
//!
//! Command-line interface for the photo-to-receipt pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Print one photo
//! papershot print img/photo.jpg
//!
//! # Print through a config file, whole-image mode
//! papershot print --config papershot.json --whole img/photo.jpg
//!
//! # Exercise the pipeline without a printer
//! papershot print --dry-run img/photo.jpg
//!
//! # Watch a directory and print every new photo
//! papershot watch --dir img
//!
//! # Capture a still and print it
//! papershot camera
//!
//! # List candidate serial devices
//! papershot ports
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use papershot::config::Config;
use papershot::pipeline::Pipeline;
use papershot::transport::device::TransportFactory;
use papershot::transport::{self, DeviceAdapter, MockTransport, Transport};
use papershot::{camera, watch, PapershotError};

/// Papershot - photo printing on receipt paper
#[derive(Parser, Debug)]
#[command(name = "papershot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial device path (overrides the config)
    #[arg(long, global = true)]
    device: Option<PathBuf>,

    /// Use an in-memory transport instead of a real device
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one photo
    Print {
        /// Path to the photo
        image: PathBuf,

        /// Transmit the whole image in one write instead of strips
        #[arg(long)]
        whole: bool,
    },

    /// Watch a directory and print every new photo
    Watch {
        /// Directory to watch (overrides the config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Capture a still with the camera utility and print it
    Camera,

    /// List candidate serial devices
    Ports,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PapershotError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(device) = &cli.device {
        config.serial.path = device.clone();
    }

    let auto_open = config.serial.auto_open;

    match cli.command {
        Commands::Print { image, whole } => {
            config.print.whole_image = whole;
            let mut pipeline = build_pipeline(config, cli.dry_run);
            if auto_open {
                pipeline.connect().await?;
            }
            let job = pipeline.print(&image).await.into_result()?;
            println!("Printed {} ({} strips)", image.display(), job.strips_sent);
        }

        Commands::Watch { dir } => {
            if let Some(dir) = dir {
                config.watch.dir = dir;
            }
            let watch_config = config.watch.clone();
            let mut pipeline = build_pipeline(config, cli.dry_run);
            if auto_open {
                pipeline.connect().await?;
            }
            watch::run(&mut pipeline, &watch_config).await?;
        }

        Commands::Camera => {
            let camera_config = config.camera.clone();
            let mut pipeline = build_pipeline(config, cli.dry_run);
            if auto_open {
                pipeline.connect().await?;
            }
            let path = camera::capture(&camera_config).await?;
            let job = pipeline.print(&path).await.into_result()?;
            println!("Printed {} ({} strips)", path.display(), job.strips_sent);
        }

        Commands::Ports => {
            let ports = transport::list_ports();
            if ports.is_empty() {
                println!("No serial devices found.");
            } else {
                println!("Candidate serial devices:");
                for port in ports {
                    println!("  {}", port.display());
                }
            }
        }
    }

    Ok(())
}

fn build_pipeline(config: Config, dry_run: bool) -> Pipeline {
    if dry_run {
        let poll_interval = Duration::from_millis(config.serial.poll_interval_ms);
        let ready_timeout = config.serial.ready_timeout_ms.map(Duration::from_millis);
        let factory: TransportFactory =
            Arc::new(|| Ok(Box::new(MockTransport::new()) as Box<dyn Transport>));
        let adapter = DeviceAdapter::new(factory, poll_interval, ready_timeout);
        Pipeline::new(config, adapter)
    } else {
        Pipeline::with_serial(config)
    }
}
