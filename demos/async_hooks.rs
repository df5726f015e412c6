//! Asynchronous Hooks
//!
//! This example shows enter/exit hooks that finish on another thread.
//!
//! Key concepts:
//! - `Hook::asynchronous` and its `Done` completion handle
//! - Events fired while a transition is in flight are dropped
//! - Debug diagnostics through `tracing` (visible with a subscriber installed)
//!
//! Run with: cargo run --example async_hooks

use statepath::builder::simple_transition;
use statepath::core::{Hook, State};
use statepath::{context, StateMachine};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn main() {
    println!("=== Asynchronous Hooks ===\n");

    let (finished, wait) = mpsc::channel::<()>();

    let machine = StateMachine::builder(vec![
        State::new("session")
            .child(
                State::new("anonymous")
                    .transition(simple_transition("login", "session.user")),
            )
            .child(
                State::new("user")
                    .on_enter(Hook::asynchronous(|ctx, event_type, from, done| {
                        let who = ctx.get("name").cloned();
                        println!("  loading profile for {who:?} after {event_type} from {from}");
                        thread::spawn(move || {
                            thread::sleep(Duration::from_millis(50));
                            println!("  profile loaded");
                            done.complete();
                        });
                    }))
                    .on_exit(Hook::sync(|_, _, target| println!("  leaving for {target}")))
                    .transition(simple_transition("logout", "session.anonymous")),
            ),
    ])
    .context(context! { "name" => "guest" })
    .debug(true)
    .build()
    .unwrap();

    let _subscription = machine.on_change(move |change| {
        println!("  now {} (via {})", change.new_state, change.event_type);
        let _ = finished.send(());
    });

    machine.init("session.anonymous", None, None).unwrap();
    println!("Initial state: {}\n", machine.active_state());

    machine
        .fire_state_event("login", Some(context! { "name" => "ann" }))
        .unwrap();
    println!("While loading, active state is {:?}", machine.active_state());

    machine.fire_state_event("logout", None).unwrap();
    println!("A logout fired now is dropped");

    wait.recv().unwrap();
    println!("After loading: {}\n", machine.active_state());

    machine.fire_state_event("logout", None).unwrap();
    println!("Final state: {}", machine.active_state());

    println!("\n=== Example Complete ===");
}
