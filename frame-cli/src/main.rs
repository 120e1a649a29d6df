//! `frame-render`: produce one panel-sized frame and print its fingerprint.

mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use frame_pipeline::{ChromiumBackend, FramePipeline, Renderer, fingerprint};

use crate::cli::{Cli, Source};
use crate::config::DeviceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = DeviceConfig::load();
    tracing::info!(
        resolution = %config.resolution,
        orientation = %config.orientation,
        inverted = config.inverted,
        "Device configuration loaded"
    );

    let backend = ChromiumBackend::new(&config.renderer_binary)
        .with_virtual_time_budget(config.virtual_time_budget_ms);
    tracing::debug!(binary = %backend.binary().display(), "Using headless renderer");
    let pipeline = FramePipeline::new(Renderer::new(backend), config.resolution)
        .with_orientation(config.orientation, config.inverted)
        .with_settings(cli.image_settings(&config))
        .with_timeout(cli.timeout(&config));

    let frame = match &cli.source {
        Source::Url { url } => pipeline.from_url(url).await,
        Source::Html { file } => {
            let html = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            pipeline.from_html(&html).await
        }
        Source::Target { target } => pipeline.from_target(target).await,
    }
    .context("no frame produced")?;

    frame
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    let fp = fingerprint(&frame);
    tracing::info!(output = %cli.output.display(), fingerprint = %fp, "Frame written");

    match cli.previous.as_deref() {
        Some(prev) if fp == *prev => tracing::info!("Frame unchanged since previous render"),
        Some(_) => tracing::info!("Frame changed since previous render"),
        None => {}
    }

    println!("{fp}");
    Ok(())
}
