//! Traffic Light State Machine
//!
//! This example drives a nested, cyclic machine with timed transitions.
//!
//! Key concepts:
//! - Nested states (`light.red`, `light.green`, `light.yellow`)
//! - Delayed transitions on an injected scheduler
//! - An ancestor transition handling an event for every child
//! - Change notifications
//!
//! Run with: cargo run --example traffic_light

use statepath::core::{Hook, State};
use statepath::effects::ManualScheduler;
use statepath::{StateMachine, TransitionBuilder};
use std::sync::Arc;
use std::time::Duration;

fn timed(to: &str, millis: i64) -> statepath::Transition {
    TransitionBuilder::new()
        .on("tick")
        .to(to)
        .delay_ms(millis)
        .build()
        .unwrap()
}

fn lamp(name: &'static str) -> State {
    State::new(name).on_enter(Hook::sync(move |_, event_type, _| {
        println!("  lamp {name} on ({event_type})");
    }))
}

fn main() {
    println!("=== Traffic Light State Machine ===\n");

    let scheduler = Arc::new(ManualScheduler::new());
    let machine = StateMachine::builder(vec![
        State::new("light")
            .child(lamp("red").transition(timed("light.green", 3000)))
            .child(lamp("green").transition(timed("light.yellow", 2500)))
            .child(lamp("yellow").transition(timed("light.red", 500)))
            .transition(
                TransitionBuilder::new()
                    .on("fault")
                    .to("blinking")
                    .build()
                    .unwrap(),
            ),
        State::new("blinking"),
    ])
    .scheduler(scheduler.clone())
    .validate(true)
    .build()
    .unwrap();

    let _subscription = machine.on_change(|change| {
        println!("  {} -> {}", change.old_state, change.new_state);
    });

    machine.init("light.red", None, None).unwrap();
    println!("Initial state: {}\n", machine.active_state());

    println!("Cycling:");
    for _ in 0..3 {
        machine.fire_state_event("tick", None).unwrap();
        println!("  waiting in {}", machine.active_state());
        scheduler.run_until_idle();
    }
    println!("Virtual time elapsed: {:?}\n", scheduler.now());

    println!("A fault on any lamp is handled by the parent:");
    machine.fire_state_event("fault", None).unwrap();
    println!("Final state: {}", machine.active_state());

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(machine.active_state(), "blinking");

    println!("\n=== Example Complete ===");
}
