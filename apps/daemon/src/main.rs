//! Orrery daemon: keeps every seeded user's astrological state current and logs what it publishes.
//!
//! `orreryd --schema` prints the configuration JSON schema and exits.

mod subscribers;

use anyhow::Context;
use chrono::Utc;
use orrery_core::{AstroRuntime, MemoryPersistence, RuntimeSettings, Scheduler};
use orrery_signals::EntityKey;
use std::sync::Arc;
use urania::ephemeris::MeanMotionEphemeris;
use urania::{CancelToken, GroupRequest};

const SEED_GROUP: &str = "seed";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if std::env::args().any(|arg| arg == "--schema") {
        println!("{}", serde_json::to_string_pretty(&orrery_config::config_schema())?);
        return Ok(());
    }

    let (config, source) = orrery_config::load()?;
    match &source {
        Some(path) => log::info!("loaded config from {}", path.display()),
        None => log::info!("no config file found, using defaults"),
    }

    let runtime = Arc::new(
        AstroRuntime::new(
            Arc::new(MeanMotionEphemeris::new()),
            Arc::new(MemoryPersistence::new()),
            RuntimeSettings::from_config(&config),
        )
        .context("building runtime")?,
    );
    runtime.hydrate().await?;

    let mut seeded = Vec::new();
    for seed in &config.seed_users {
        match runtime.set_birth_data(&seed.id, seed.birth_data()).await {
            Ok(_) => seeded.push(seed.id.clone()),
            Err(e) => log::error!("seed user {} rejected: {}", seed.id, e),
        }
    }

    let mut loggers: Vec<_> = seeded
        .iter()
        .map(|id| subscribers::spawn_logger(runtime.subscribe(EntityKey::user(id.as_str()))))
        .collect();

    if seeded.len() >= 2 {
        runtime
            .register_group(GroupRequest {
                group_id: SEED_GROUP.to_string(),
                participant_ids: seeded.clone(),
            })
            .await?;
        loggers.push(subscribers::spawn_logger(runtime.subscribe(EntityKey::group(SEED_GROUP))));
        let analysis = runtime
            .analyze_group(SEED_GROUP, Utc::now(), CancelToken::new())
            .await?;
        log::info!(
            "group {}: {} pairs analyzed, {} dynamics",
            SEED_GROUP,
            analysis.synastry_matrix.len(),
            analysis.group_dynamics.len()
        );
    }

    let scheduler = Scheduler::new(runtime.clone(), &config.scheduler).spawn();
    log::info!("orrery running with {} users; Ctrl-C to stop", runtime.users().len());

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    log::info!("shutting down after {} ticks", scheduler.ticks());
    scheduler.shutdown().await;
    for logger in loggers {
        logger.abort();
    }
    Ok(())
}
