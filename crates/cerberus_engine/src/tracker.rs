//! Sliding-window rate accounting.

use cerberus_core::{ActionKind, GuildRef, Principal};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default bounded history per (guild, principal) key.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy)]
struct ActionRecord {
    kind: ActionKind,
    at: Instant,
}

type Key = (GuildRef, Principal);
type History = Arc<Mutex<VecDeque<ActionRecord>>>;

/// Per-(guild, principal) sliding-window action counter.
///
/// Each key holds a bounded history of the most recent actions; once the
/// capacity is reached the oldest record is evicted even if still within a
/// configured window, which can under-count violations during extreme
/// bursts. That is the accepted cost of capping memory for pathological
/// spammers.
///
/// Counting scans the history at call time, so the window slides
/// continuously rather than in fixed buckets. The tracker performs no I/O
/// and holds its locks only for the scan.
#[derive(Debug)]
pub struct ActionTracker {
    capacity: usize,
    histories: RwLock<HashMap<Key, History>>,
}

impl Default for ActionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ActionTracker {
    /// A tracker with the given per-key history capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            histories: RwLock::new(HashMap::new()),
        }
    }

    fn history(&self, guild: GuildRef, principal: Principal) -> History {
        if let Some(history) = self.histories.read().get(&(guild, principal)) {
            return Arc::clone(history);
        }
        let mut map = self.histories.write();
        Arc::clone(
            map.entry((guild, principal))
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(self.capacity)))),
        )
    }

    /// Record one action for the key, evicting the oldest record at
    /// capacity.
    pub fn record(&self, guild: GuildRef, principal: Principal, kind: ActionKind) {
        let history = self.history(guild, principal);
        let mut deque = history.lock();
        if deque.len() == self.capacity {
            deque.pop_front();
        }
        deque.push_back(ActionRecord {
            kind,
            at: Instant::now(),
        });
    }

    /// Count records of `kind` no older than `window` at call time.
    pub fn count_recent(
        &self,
        guild: GuildRef,
        principal: Principal,
        kind: ActionKind,
        window: Duration,
    ) -> usize {
        let history = self.history(guild, principal);
        let deque = history.lock();
        let now = Instant::now();
        deque
            .iter()
            .filter(|r| r.kind == kind && now.duration_since(r.at) <= window)
            .count()
    }

    /// Record one action and return the window count including it.
    ///
    /// Both steps run under the key's lock, so a concurrent burst for the
    /// same key cannot interleave between the record and the count and slip
    /// under a threshold.
    pub fn record_and_count(
        &self,
        guild: GuildRef,
        principal: Principal,
        kind: ActionKind,
        window: Duration,
    ) -> usize {
        let history = self.history(guild, principal);
        let mut deque = history.lock();
        if deque.len() == self.capacity {
            deque.pop_front();
        }
        let now = Instant::now();
        deque.push_back(ActionRecord { kind, at: now });
        deque
            .iter()
            .filter(|r| r.kind == kind && now.duration_since(r.at) <= window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildRef = GuildRef(1);
    const ACTOR: Principal = Principal(2);

    #[test]
    fn counts_only_matching_kind() {
        let tracker = ActionTracker::default();
        tracker.record(GUILD, ACTOR, ActionKind::Ban);
        tracker.record(GUILD, ACTOR, ActionKind::Channel);
        tracker.record(GUILD, ACTOR, ActionKind::Ban);

        let window = Duration::from_secs(10);
        assert_eq!(tracker.count_recent(GUILD, ACTOR, ActionKind::Ban, window), 2);
        assert_eq!(
            tracker.count_recent(GUILD, ACTOR, ActionKind::Channel, window),
            1
        );
        assert_eq!(
            tracker.count_recent(GUILD, ACTOR, ActionKind::Role, window),
            0
        );
    }

    #[test]
    fn keys_are_independent() {
        let tracker = ActionTracker::default();
        tracker.record(GUILD, ACTOR, ActionKind::Ban);
        tracker.record(GuildRef(9), ACTOR, ActionKind::Ban);

        let window = Duration::from_secs(10);
        assert_eq!(tracker.count_recent(GUILD, ACTOR, ActionKind::Ban, window), 1);
        assert_eq!(
            tracker.count_recent(GUILD, Principal(3), ActionKind::Ban, window),
            0
        );
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let tracker = ActionTracker::new(3);
        for _ in 0..5 {
            tracker.record(GUILD, ACTOR, ActionKind::Ping);
        }
        // Only the capacity's worth of records survive.
        assert_eq!(
            tracker.count_recent(GUILD, ACTOR, ActionKind::Ping, Duration::from_secs(60)),
            3
        );
    }

    #[test]
    fn record_and_count_includes_the_new_event() {
        let tracker = ActionTracker::default();
        let window = Duration::from_secs(10);
        assert_eq!(
            tracker.record_and_count(GUILD, ACTOR, ActionKind::Channel, window),
            1
        );
        assert_eq!(
            tracker.record_and_count(GUILD, ACTOR, ActionKind::Channel, window),
            2
        );
    }

    #[test]
    fn zero_window_excludes_nothing_recorded_now() {
        let tracker = ActionTracker::default();
        // A zero-length window still matches a record taken at the same
        // instant; age zero is within the window.
        let count =
            tracker.record_and_count(GUILD, ACTOR, ActionKind::Ban, Duration::from_secs(0));
        assert_eq!(count, 1);
    }
}
