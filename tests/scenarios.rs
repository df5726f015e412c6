//! End-to-end behaviour of the machine, driven through the public API.

use parking_lot::Mutex;
use statepath::builder::{guarded_transition, simple_transition};
use statepath::core::{Delay, Done, Hook, State};
use statepath::effects::{
    EventKind, Listener, ManualScheduler, MachineEvent, StateChange, WeakStateMachine,
};
use statepath::{context, MachineError, StateMachine, TransitionBuilder};
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

fn record_changes(machine: &StateMachine) -> Arc<Mutex<Vec<StateChange>>> {
    let changes: Arc<Mutex<Vec<StateChange>>> = Arc::default();
    let sink = Arc::clone(&changes);
    // Dropping a subscription does not cancel it.
    let _subscription = machine.on_change(move |change| sink.lock().push(change.clone()));
    changes
}

fn pairs(changes: &Mutex<Vec<StateChange>>) -> Vec<(String, String)> {
    changes
        .lock()
        .iter()
        .map(|c| (c.old_state.clone(), c.new_state.clone()))
        .collect()
}

fn toggle() -> Vec<State> {
    vec![State::new("root")
        .child(State::new("idle").transition(simple_transition("start", "root.active")))
        .child(State::new("active").transition(simple_transition("stop", "root.idle")))]
}

#[test]
fn toggle_round_trip() {
    let machine = StateMachine::builder(toggle()).build().unwrap();
    let changes = record_changes(&machine);

    machine.init("root.idle", None, None).unwrap();
    assert_eq!(machine.active_state(), "root.idle");
    assert!(changes.lock().is_empty());

    machine.fire_state_event("start", None).unwrap();
    assert_eq!(machine.active_state(), "root.active");
    assert_eq!(
        pairs(&changes),
        vec![("root.idle".to_string(), "root.active".to_string())]
    );
    assert_eq!(changes.lock()[0].event_type, "start");

    machine.fire_state_event("stop", None).unwrap();
    assert_eq!(machine.active_state(), "root.idle");
    assert_eq!(changes.lock().len(), 2);
}

#[test]
fn unmatched_event_emits_nothing() {
    let machine = StateMachine::builder(toggle()).build().unwrap();
    let changes = record_changes(&machine);
    machine.init("root.idle", None, None).unwrap();

    machine.fire_state_event("stop", None).unwrap();

    assert_eq!(machine.active_state(), "root.idle");
    assert!(changes.lock().is_empty());
}

#[test]
fn init_enters_each_ancestor_once_in_order() {
    let log: Log = Arc::default();
    let hook = |name: &'static str| {
        let log = Arc::clone(&log);
        Hook::sync(move |_, event_type, state| {
            log.lock().push(format!("{name}:{event_type}:{state}"));
        })
    };
    let machine = StateMachine::builder(vec![State::new("a")
        .on_enter(hook("a"))
        .child(State::new("b").on_enter(hook("b")))])
    .build()
    .unwrap();

    machine.init("a.b", None, None).unwrap();

    assert_eq!(machine.active_state(), "a.b");
    assert_eq!(*log.lock(), vec!["a:init:", "b:init:"]);
}

#[test]
fn second_init_always_fails() {
    let machine = StateMachine::builder(toggle()).build().unwrap();
    machine.init("root.idle", None, None).unwrap();

    for name in ["root.idle", "root.active", "nowhere"] {
        assert_eq!(machine.init(name, None, None), Err(MachineError::AlreadyInitialized));
    }
    assert_eq!(machine.active_state(), "root.idle");
}

#[test]
fn guard_gates_transition() {
    let machine = StateMachine::builder(vec![
        State::new("locked")
            .transition(guarded_transition("open", "open", |ctx, _, _| {
                ctx.get("key").and_then(|v| v.as_str()) == Some("right")
            })),
        State::new("open"),
    ])
    .build()
    .unwrap();
    machine.init("locked", None, None).unwrap();

    machine
        .fire_state_event("open", Some(context! { "key" => "wrong" }))
        .unwrap();
    assert_eq!(machine.active_state(), "locked");

    machine
        .fire_state_event("open", Some(context! { "key" => "right" }))
        .unwrap();
    assert_eq!(machine.active_state(), "open");
}

#[test]
fn stop_immediate_propagation_blocks_siblings_and_ancestors() {
    let evaluated: Log = Arc::default();
    let tracked = |label: &'static str, target: &'static str| {
        let evaluated = Arc::clone(&evaluated);
        TransitionBuilder::new()
            .on("go")
            .to(target)
            .when(move |_, _, _| {
                evaluated.lock().push(label.to_string());
                true
            })
    };
    let machine = StateMachine::builder(vec![
        State::new("outer")
            .transition(tracked("ancestor", "elsewhere").build().unwrap())
            .child(
                State::new("inner")
                    .transition(tracked("first", "target").stop_immediate_propagation().build().unwrap())
                    .transition(tracked("second", "elsewhere").build().unwrap()),
            ),
        State::new("target"),
        State::new("elsewhere"),
    ])
    .build()
    .unwrap();
    machine.init("outer.inner", None, None).unwrap();

    machine.fire_state_event("go", None).unwrap();

    assert_eq!(*evaluated.lock(), vec!["first"]);
    assert_eq!(machine.active_state(), "target");
}

#[test]
fn stop_propagation_still_evaluates_same_state() {
    let evaluated: Log = Arc::default();
    let tracked = |label: &'static str| {
        let evaluated = Arc::clone(&evaluated);
        move |_: &statepath::Context, _: &str, _: &str| {
            evaluated.lock().push(label.to_string());
            false
        }
    };
    let machine = StateMachine::builder(vec![State::new("outer")
        .transition(TransitionBuilder::new().on("go").to("outer").when(tracked("ancestor")).build().unwrap())
        .child(
            State::new("inner")
                .transition(
                    TransitionBuilder::new()
                        .on("go")
                        .to("outer")
                        .when(tracked("first"))
                        .stop_propagation()
                        .build()
                        .unwrap(),
                )
                .transition(TransitionBuilder::new().on("go").to("outer").when(tracked("second")).build().unwrap()),
        )])
    .build()
    .unwrap();
    machine.init("outer.inner", None, None).unwrap();

    machine.fire_state_event("go", None).unwrap();

    assert_eq!(*evaluated.lock(), vec!["first", "second"]);
    assert_eq!(machine.active_state(), "outer.inner");
}

#[test]
fn event_fired_from_exit_hook_is_dropped() {
    let handle: Arc<Mutex<WeakStateMachine>> = Arc::default();
    let seen: Log = Arc::default();
    let exit_handle = Arc::clone(&handle);
    let exit_seen = Arc::clone(&seen);

    let machine = StateMachine::builder(vec![
        State::new("a")
            .transition(simple_transition("go", "b"))
            .transition(simple_transition("sneak", "c"))
            .on_exit(Hook::sync(move |_, _, target| {
                let Some(machine) = exit_handle.lock().upgrade() else {
                    return;
                };
                exit_seen.lock().push(format!("active={:?} target={target}", machine.active_state()));
                machine.fire_state_event("sneak", None).unwrap();
            })),
        State::new("b").transition(simple_transition("sneak", "c")),
        State::new("c"),
    ])
    .build()
    .unwrap();
    *handle.lock() = machine.downgrade();
    let changes = record_changes(&machine);
    machine.init("a", None, None).unwrap();

    machine.fire_state_event("go", None).unwrap();

    assert_eq!(*seen.lock(), vec![r#"active="" target=b"#]);
    assert_eq!(machine.active_state(), "b");
    assert_eq!(pairs(&changes), vec![("a".to_string(), "b".to_string())]);
}

#[test]
fn cancelled_listener_is_not_called() {
    let machine = StateMachine::builder(toggle()).build().unwrap();
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let listener: Listener = Arc::new(move |_: &MachineEvent| *counter.lock() += 1);

    let first = machine.on(EventKind::Change, Arc::clone(&listener));
    let _again = machine.on(EventKind::Change, Arc::clone(&listener));
    machine.init("root.idle", None, None).unwrap();

    machine.fire_state_event("start", None).unwrap();
    assert_eq!(*calls.lock(), 1);

    first.cancel();
    first.cancel();
    machine.fire_state_event("stop", None).unwrap();
    assert_eq!(*calls.lock(), 1);
    assert_eq!(machine.active_state(), "root.idle");
}

#[test]
fn delayed_transition_reports_old_state_until_due() {
    let scheduler = Arc::new(ManualScheduler::new());
    let machine = StateMachine::builder(vec![
        State::new("red").transition(TransitionBuilder::new().on("next").to("green").delay_ms(50).build().unwrap()),
        State::new("green"),
    ])
    .scheduler(scheduler.clone())
    .build()
    .unwrap();
    let changes = record_changes(&machine);
    machine.init("red", None, None).unwrap();

    machine.fire_state_event("next", None).unwrap();
    assert_eq!(machine.active_state(), "red");
    assert!(changes.lock().is_empty());

    scheduler.advance(Duration::from_millis(49));
    assert_eq!(machine.active_state(), "red");

    scheduler.advance(Duration::from_millis(1));
    assert_eq!(machine.active_state(), "green");
    assert_eq!(pairs(&changes), vec![("red".to_string(), "green".to_string())]);
}

#[test]
fn zero_delay_waits_for_next_tick() {
    let scheduler = Arc::new(ManualScheduler::new());
    let machine = StateMachine::builder(vec![
        State::new("a").transition(TransitionBuilder::new().on("go").to("b").delay(Delay::from_millis(0)).build().unwrap()),
        State::new("b"),
    ])
    .scheduler(scheduler.clone())
    .build()
    .unwrap();
    machine.init("a", None, None).unwrap();

    machine.fire_state_event("go", None).unwrap();
    assert_eq!(machine.active_state(), "a");

    assert_eq!(scheduler.run_ticks(), 1);
    assert_eq!(machine.active_state(), "b");
}

#[test]
fn async_hooks_run_strictly_in_sequence() {
    let log: Log = Arc::default();
    let parked: Arc<Mutex<Vec<Done>>> = Arc::default();

    let async_hook = |label: &'static str| {
        let log = Arc::clone(&log);
        let parked = Arc::clone(&parked);
        Hook::asynchronous(move |_, _, _, done| {
            log.lock().push(label.to_string());
            parked.lock().push(done);
        })
    };
    let sync_hook = |label: &'static str| {
        let log = Arc::clone(&log);
        Hook::sync(move |_, _, _| log.lock().push(label.to_string()))
    };

    let machine = StateMachine::builder(vec![
        State::new("a")
            .on_exit(async_hook("exit a"))
            .transition(simple_transition("go", "b.c"))
            .child(State::new("x").on_exit(sync_hook("exit x"))),
        State::new("b")
            .on_enter(async_hook("enter b"))
            .child(State::new("c").on_enter(sync_hook("enter c"))),
    ])
    .build()
    .unwrap();
    let changes = record_changes(&machine);
    machine.init("a.x", None, None).unwrap();

    machine.fire_state_event("go", None).unwrap();
    assert_eq!(*log.lock(), vec!["exit a"]);
    assert_eq!(machine.active_state(), "");
    assert!(machine.is_transitioning());

    let next = || parked.lock().pop().unwrap();
    next().complete();
    assert_eq!(*log.lock(), vec!["exit a", "exit x", "enter b"]);
    assert!(changes.lock().is_empty());

    next().complete();
    assert_eq!(*log.lock(), vec!["exit a", "exit x", "enter b", "enter c"]);
    assert_eq!(machine.active_state(), "b.c");
    assert_eq!(pairs(&changes), vec![("a.x".to_string(), "b.c".to_string())]);
}

#[test]
fn async_init_blocks_events_until_done() {
    let parked: Arc<Mutex<Option<Done>>> = Arc::default();
    let slot = Arc::clone(&parked);
    let machine = StateMachine::builder(vec![
        State::new("a")
            .on_enter(Hook::asynchronous(move |_, _, _, done| *slot.lock() = Some(done)))
            .transition(simple_transition("go", "b")),
        State::new("b"),
    ])
    .build()
    .unwrap();

    machine.init("a", None, None).unwrap();
    assert!(machine.is_initialized());
    assert_eq!(machine.active_state(), "");
    assert_eq!(machine.init("a", None, None), Err(MachineError::AlreadyInitialized));

    machine.fire_state_event("go", None).unwrap();
    assert_eq!(machine.active_state(), "");

    let done = parked.lock().take().unwrap();
    done.complete();
    assert_eq!(machine.active_state(), "a");

    machine.fire_state_event("go", None).unwrap();
    assert_eq!(machine.active_state(), "b");
}

#[test]
fn listener_may_fire_follow_up_event() {
    let machine = StateMachine::builder(vec![
        State::new("a").transition(simple_transition("go", "b")),
        State::new("b").transition(simple_transition("go", "c")),
        State::new("c"),
    ])
    .build()
    .unwrap();
    let weak = machine.downgrade();
    let _chain = machine.on_change(move |change| {
        if change.new_state == "b" {
            if let Some(machine) = weak.upgrade() {
                machine.fire_state_event("go", None).unwrap();
            }
        }
    });
    machine.init("a", None, None).unwrap();

    machine.fire_state_event("go", None).unwrap();
    assert_eq!(machine.active_state(), "c");
}

#[test]
fn deep_path_with_inline_async_hooks() {
    const DEPTH: usize = 2_000;
    let entered = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&entered);
    let hook = Hook::asynchronous(move |_, _, _, done| {
        *counter.lock() += 1;
        done.complete();
    });

    let mut root = State::new("s").on_enter(hook.clone()).on_exit(hook.clone());
    for _ in 1..DEPTH {
        root = State::new("s").on_enter(hook.clone()).on_exit(hook.clone()).child(root);
    }
    let machine = StateMachine::builder(vec![
        root.transition(simple_transition("go", "other")),
        State::new("other"),
    ])
    .build()
    .unwrap();
    let deep = vec!["s"; DEPTH].join(".");

    machine.init(&deep, None, None).unwrap();
    assert_eq!(machine.active_state(), deep);
    assert_eq!(*entered.lock(), DEPTH);

    machine.fire_state_event("go", None).unwrap();
    assert_eq!(machine.active_state(), "other");
    assert_eq!(*entered.lock(), 2 * DEPTH);
}
