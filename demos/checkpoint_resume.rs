//! Checkpoint and Resume
//!
//! This example demonstrates checkpoint and resume for a long-running machine.
//!
//! Key concepts:
//! - Capturing the active configuration and history mid-run
//! - Serialization formats (JSON for readability, binary for compactness)
//! - Atomic writes to prevent corruption
//! - Resuming without re-running entry actions
//!
//! Run with: cargo run --example checkpoint_resume

use statetree::{state_enum, Checkpoint, StateMachine, StateMachineBuilder};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Job {
        Workflow,
        Initializing,
        Mapping,
        Reducing,
        Complete,
    }
}

fn workflow() -> anyhow::Result<StateMachine<Job, &'static str>> {
    let machine = StateMachineBuilder::new()
        .name("mapreduce")
        .state(Job::Workflow)
        .substate(Job::Initializing, Job::Workflow)
        .substate(Job::Mapping, Job::Workflow)
        .substate(Job::Reducing, Job::Workflow)
        .substate(Job::Complete, Job::Workflow)
        .initial(Job::Workflow, Job::Initializing)
        .on(Job::Initializing, "ready", Job::Mapping)
        .on(Job::Mapping, "mapped", Job::Reducing)
        .on(Job::Reducing, "reduced", Job::Complete)
        .on_entry(Job::Mapping, || {
            println!("  [Entry] Mapping phase started");
            Ok(())
        })
        .on_entry(Job::Reducing, || {
            println!("  [Entry] Reducing phase started");
            Ok(())
        })
        .build()?;
    Ok(machine)
}

/// Write through a temp file, then rename.
fn save(path: &Path, checkpoint: &Checkpoint<Job>) -> anyhow::Result<()> {
    let temp = path.with_extension("tmp");
    fs::write(&temp, checkpoint.to_json()?)?;
    fs::rename(&temp, path)?;
    println!("  [Checkpoint] Saved to {}", path.display());
    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Checkpoint<Job>> {
    let checkpoint = Checkpoint::from_json(&fs::read_to_string(path)?)?;
    println!("  [Checkpoint] Loaded from {}", path.display());
    Ok(checkpoint)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Checkpoint and Resume ===\n");
    let dir = std::env::temp_dir().join("statetree-checkpoints");
    fs::create_dir_all(&dir)?;
    let path = dir.join("mapreduce.json");

    println!("First run, interrupted after mapping:");
    let machine = workflow()?;
    machine.start().await?;
    machine.fire("ready")?;
    machine.fire("mapped")?;
    machine.settled().await?;

    let checkpoint = machine.checkpoint();
    save(&path, &checkpoint)?;
    println!(
        "  JSON is {} bytes, binary is {} bytes",
        checkpoint.to_json()?.len(),
        checkpoint.to_binary()?.len()
    );
    machine.stop().await?;
    println!("  Machine stopped in {:?}\n", checkpoint.active);

    println!("Second run, resumed from the checkpoint:");
    let resumed = workflow()?;
    resumed.start_from(load(&path)?).await?;
    println!("  Resumed in {:?} (no entry actions ran)", resumed.current_states());
    resumed.fire("reduced")?;
    resumed.settled().await?;

    let snapshot = resumed.snapshot();
    println!("  Finished in {:?}", snapshot.active);
    println!("  Path travelled:");
    for leaves in snapshot.history.get_path() {
        println!("    {leaves:?}");
    }
    resumed.stop().await?;

    fs::remove_file(&path)?;
    println!("\n=== Example Complete ===");
    Ok(())
}
