//! Factories for test stores and mines.

use std::fmt;
use std::sync::{Arc, Mutex};

use glam::Vec3;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Metadata, Subscriber};

use crate::config::MinefieldConfig;
use crate::mine::{Mine, MineId, PoolId};
use crate::pool::PoolStore;

/// An empty store laid out for `pools` teams of `per_pool` mines.
pub fn store_with_layout(pools: usize, per_pool: usize) -> PoolStore {
    let mut store = PoolStore::new();
    store.init(pools, per_pool);
    store
}

/// An active, vulnerable mine with default health and yield.
pub fn mine_at(id: u32, team: i32, position: Vec3, radius: f32) -> Mine {
    Mine::new(MineId::new(id), PoolId::new(team))
        .with_position(position)
        .with_destructive_radius(radius)
        .with_active(true)
}

/// A small config that runs quickly.
pub fn small_config(workers: usize, teams: usize, per_team: usize) -> MinefieldConfig {
    MinefieldConfig {
        worker_count: workers,
        team_count: teams,
        mines_per_team: per_team,
        ..MinefieldConfig::default()
    }
}

/// Runs `f` under a subscriber that records every event's level and message.
pub fn capture_events(f: impl FnOnce()) -> Vec<(Level, String)> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = EventLog {
        events: Arc::clone(&events),
    };
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

struct EventLog {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

#[derive(Default)]
struct Message(String);

impl Visit for Message {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl Subscriber for EventLog {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _: &Id, _: &Record<'_>) {}

    fn record_follows_from(&self, _: &Id, _: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut message = Message::default();
        event.record(&mut message);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), message.0));
    }

    fn enter(&self, _: &Id) {}

    fn exit(&self, _: &Id) {}
}
