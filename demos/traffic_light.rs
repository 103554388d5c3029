//! Traffic Light State Machine
//!
//! This example demonstrates a cyclic machine nested inside a composite state.
//!
//! Key concepts:
//! - Cyclic state transitions (states repeat)
//! - A transition on the parent that preempts every child
//! - Entry actions announcing each light
//!
//! Run with: cargo run --example traffic_light

use statetree::{state_enum, StateMachineBuilder, TracingObserver};
use tracing_subscriber::EnvFilter;

state_enum! {
    enum TrafficLight {
        Operating,
        Red,
        Yellow,
        Green,
        Flashing,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let mut builder = StateMachineBuilder::new()
        .name("traffic-light")
        .state(TrafficLight::Operating)
        .substate(TrafficLight::Red, TrafficLight::Operating)
        .substate(TrafficLight::Yellow, TrafficLight::Operating)
        .substate(TrafficLight::Green, TrafficLight::Operating)
        .state(TrafficLight::Flashing)
        .initial(TrafficLight::Operating, TrafficLight::Red)
        .on(TrafficLight::Red, "timer", TrafficLight::Green)
        .on(TrafficLight::Green, "timer", TrafficLight::Yellow)
        .on(TrafficLight::Yellow, "timer", TrafficLight::Red)
        .observer(TracingObserver::new("traffic-light"));
    for light in [TrafficLight::Red, TrafficLight::Yellow, TrafficLight::Green] {
        let label = format!("{light:?}");
        builder = builder.on_entry(light, move || {
            println!("  light is now {label}");
            Ok(())
        });
    }
    let machine = builder.build()?;

    machine.start().await?;
    println!("Initial lights: {:?}\n", machine.current_states());

    println!("Cycling through four timer ticks:");
    for _ in 0..4 {
        machine.fire("timer")?;
    }
    machine.settled().await?;

    println!("\nLights now: {:?}", machine.current_states());
    println!("Flashing is a second root and stays active alongside Operating.");

    machine.stop().await?;
    println!("\n=== Example Complete ===");
    Ok(())
}
