use std::sync::Arc;

use anyhow::bail;
use parking_lot::Mutex;
use strumline_core::chart::{Lane, Side};
use strumline_core::gameplay::hit_window::Rating;
use strumline_core::hooks::{Hook, HookBus, HookListener};

struct Recorder {
    seen: Arc<Mutex<Vec<String>>>,
}

impl HookListener for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_hook(&mut self, hook: &Hook<'_>) -> anyhow::Result<()> {
        self.seen.lock().push(hook.name().to_string());
        Ok(())
    }
}

struct Broken;

impl HookListener for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn on_hook(&mut self, hook: &Hook<'_>) -> anyhow::Result<()> {
        if let Hook::BeatHit(beat) = hook {
            bail!("script error on beat {beat}");
        }
        Ok(())
    }
}

#[test]
fn test_failing_listener_does_not_stop_others() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut bus = HookBus::new();
    bus.register(Broken);
    bus.register(Recorder { seen: seen.clone() });
    assert_eq!(bus.len(), 2);

    bus.dispatch(&Hook::BeatHit(4));
    bus.dispatch(&Hook::NoteHit {
        side: Side::Player,
        lane: Lane::Left,
        rating: Rating::Sick,
        delta: 0.0,
    });
    bus.dispatch(&Hook::BeatHit(5));

    assert_eq!(bus.failure_count(), 2);
    assert_eq!(*seen.lock(), vec!["beatHit", "noteHit", "beatHit"]);
}

#[test]
fn test_empty_bus_is_a_no_op() {
    let mut bus = HookBus::new();
    assert!(bus.is_empty());
    bus.dispatch(&Hook::SongEnd);
    assert_eq!(bus.failure_count(), 0);
}
