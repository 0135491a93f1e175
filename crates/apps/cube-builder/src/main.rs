mod cli;
mod runner;
mod scenario;
mod sim;

use anyhow::{bail, Context, Result};
use clap::Parser;
use placement::{PlacementConfig, Variant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Args;
use runner::Runner;
use scenario::Scenario;

fn load_config(args: &Args) -> Result<PlacementConfig> {
    match &args.config {
        Some(path) => PlacementConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => PlacementConfig::load().context("Failed to load user config"),
    }
}

fn load_scenario(args: &Args) -> Result<Scenario> {
    let requested = args.variant.map(Variant::from);
    let Some(path) = &args.scenario else {
        return Ok(Scenario::demo(requested.unwrap_or_default()));
    };

    let scenario = Scenario::load_from_file(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    if let Some(variant) = requested {
        if variant != scenario.variant {
            bail!(
                "--variant {} does not match the {} scenario '{}'",
                variant,
                scenario.variant,
                scenario.name
            );
        }
    }
    Ok(scenario)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cube_builder={0},placement={0},devices={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&args)?;
    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    if args.save_config {
        let path = match &args.config {
            Some(path) => config.save_to(path).map(|_| path.clone()),
            None => config.save(),
        }
        .context("Failed to save config")?;
        tracing::info!("Saved config to {}", path.display());
        return Ok(());
    }

    tracing::info!("Cube Builder v{}", env!("CARGO_PKG_VERSION"));

    let scenario = load_scenario(&args)?;
    let summary = Runner::new(config, &scenario, args.frames)
        .run(&scenario)
        .context("Scenario playback failed")?;

    tracing::info!(
        "Finished '{}': {} frames, {} created, {} locked, {} deleted, {} remaining, {} scene commands",
        scenario.name,
        summary.frames,
        summary.created,
        summary.locked,
        summary.deleted,
        summary.remaining,
        summary.scene_commands
    );
    if summary.live_anchors + summary.released_anchors > 0 {
        tracing::info!(
            "Anchors: {} live, {} released",
            summary.live_anchors,
            summary.released_anchors
        );
    }
    Ok(())
}
