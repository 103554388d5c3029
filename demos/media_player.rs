//! Media Player
//!
//! This example demonstrates a hierarchical machine with orthogonal regions.
//!
//! Key concepts:
//! - Composite states with initial children
//! - Orthogonal regions (playback and volume change independently)
//! - Guards over typed payloads, with bubbling to the parent
//! - Concurrent producers feeding one serialized worker
//! - Observers for completed, declined and failed transitions
//!
//! Run with: RUST_LOG=debug cargo run --example media_player

use statetree::builder::TransitionBuilder;
use statetree::{state_enum, StateMachineBuilder, TracingObserver};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Player {
        Root,
        Idle,
        Active,
        Playing,
        Paused,
        Quiet,
        Loud,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Command {
    Insert,
    Eject,
    Pause,
    Resume,
    Volume,
    Seek,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Media Player ===\n");

    let machine = StateMachineBuilder::new()
        .name("media-player")
        .state(Player::Root)
        .substate(Player::Idle, Player::Root)
        .substate(Player::Active, Player::Root)
        .substate_in(Player::Playing, Player::Active, "playback")
        .substate_in(Player::Paused, Player::Active, "playback")
        .substate_in(Player::Quiet, Player::Active, "volume")
        .substate_in(Player::Loud, Player::Active, "volume")
        .initial(Player::Root, Player::Idle)
        .initial(Player::Active, Player::Playing)
        .initial(Player::Active, Player::Quiet)
        .on(Player::Idle, Command::Insert, Player::Active)
        .on(Player::Active, Command::Eject, Player::Idle)
        .on(Player::Playing, Command::Pause, Player::Paused)
        .on(Player::Paused, Command::Resume, Player::Playing)
        .transition(
            TransitionBuilder::new()
                .from(Player::Quiet)
                .on(Command::Volume)
                .to(Player::Loud)
                .when(|level: &u8| *level > 50),
        )?
        .transition(
            TransitionBuilder::new()
                .from(Player::Loud)
                .on(Command::Volume)
                .to(Player::Quiet)
                .when(|level: &u8| *level <= 50),
        )?
        .transition(
            TransitionBuilder::new()
                .from(Player::Active)
                .on(Command::Seek)
                .internal()
                .run(|seconds: &u32| {
                    anyhow::ensure!(*seconds < 3600, "cannot seek past the end");
                    println!("  seeking to {seconds}s");
                    Ok(())
                }),
        )?
        .on_entry(Player::Loud, || {
            println!("  speakers turned up");
            Ok(())
        })
        .observer(TracingObserver::new("media-player"))
        .on_transition_completed(|from, to, ctx| {
            println!("  {:?}: {:?} -> {:?}", ctx.trigger(), from, to);
        })
        .on_transition_declined(|ctx| {
            println!("  {:?} ignored in {:?}", ctx.trigger(), ctx.active());
        })
        .on_transition_exception(|ctx, error| {
            println!("  {:?} failed: {error:#}", ctx.trigger());
        })
        .build()?;
    let machine = Arc::new(machine);

    machine.start().await?;
    println!("Started in {:?}\n", machine.current_states());

    println!("Remote control:");
    machine.fire(Command::Insert)?;
    machine.fire(Command::Pause)?;
    machine.fire_with(Command::Volume, 80_u8)?;
    machine.fire_with(Command::Seek, 90_u32)?;
    machine.fire_with(Command::Seek, 7200_u32)?;
    machine.fire(Command::Insert)?;
    machine.settled().await?;
    println!("Now in {:?}\n", machine.current_states());

    println!("Two producers at once:");
    let remote = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move {
            for command in [Command::Resume, Command::Pause, Command::Resume] {
                machine.fire(command)?;
                tokio::task::yield_now().await;
            }
            anyhow::Ok(())
        })
    };
    let phone = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move {
            for level in [20_u8, 70, 10] {
                machine.fire_with(Command::Volume, level)?;
                tokio::task::yield_now().await;
            }
            anyhow::Ok(())
        })
    };
    remote.await??;
    phone.await??;
    machine.settled().await?;
    println!("Now in {:?}", machine.current_states());
    if let Some(path) = machine.active_path(&Player::Playing) {
        println!("Path to playback leaf: {path:?}");
    }

    machine.fire(Command::Eject)?;
    machine.settled().await?;
    println!("\nEjected, back in {:?}", machine.current_states());
    println!("Transitions recorded: {}", machine.snapshot().history.transitions().len());

    machine.stop().await?;
    println!("\n=== Example Complete ===");
    Ok(())
}
