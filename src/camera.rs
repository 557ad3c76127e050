//! # Still-Capture Trigger
//!
//! Invokes an external still-capture utility (`rpicam-jpeg` by default)
//! and hands its output path to the pipeline, identically to a manually
//! supplied path. No printing logic lives here.
//!
//! The invocation mirrors the Raspberry Pi camera stack's CLI:
//!
//! ```text
//! rpicam-jpeg --output img/capture.jpg --immediate -t 3000 \
//!             --hflip --rotation 180 --ev 9 --brightness 0.5
//! ```

use std::path::PathBuf;

use tokio::process::Command;

use crate::config::CameraConfig;
use crate::error::PapershotError;

/// Run the capture utility and return the path it wrote to.
///
/// ## Errors
///
/// `Capture` when the utility cannot be spawned (missing binary) or exits
/// nonzero.
pub async fn capture(config: &CameraConfig) -> Result<PathBuf, PapershotError> {
    if let Some(parent) = config.output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut cmd = Command::new(&config.command);
    cmd.arg("--output")
        .arg(&config.output)
        .arg("--immediate")
        .arg("-t")
        .arg(config.timeout_ms.to_string());
    if config.hflip {
        cmd.arg("--hflip");
    }
    cmd.arg("--rotation")
        .arg(config.rotation.to_string())
        .arg("--ev")
        .arg(config.ev.to_string())
        .arg("--brightness")
        .arg(config.brightness.to_string());

    log::info!("capturing still via {}", config.command);
    let status = cmd.status().await.map_err(|e| {
        PapershotError::Capture(format!("failed to run {}: {}", config.command, e))
    })?;
    if !status.success() {
        return Err(PapershotError::Capture(format!(
            "{} exited with {}",
            config.command, status
        )));
    }
    Ok(config.output.clone())
}
