use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::inner::model::transport_event::WriteId;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    write: WriteId,
    since: Instant,
}

/// Single-writer throttle: one write in flight at most, and at least `min_interval`
/// between the previous completion and the next dispatch.
#[derive(Debug)]
pub(crate) struct Pacer {
    min_interval: Duration,
    next_write: u64,
    in_flight: Option<InFlight>,
    last_write_at: Option<Instant>,
    last_write_wall: Option<DateTime<Utc>>,
}

impl Pacer {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_write: 0,
            in_flight: None,
            last_write_at: None,
            last_write_wall: None,
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn next_write_id(&mut self) -> WriteId {
        self.next_write += 1;
        WriteId(self.next_write)
    }

    pub(crate) fn in_flight_write(&self) -> Option<WriteId> {
        self.in_flight.map(|in_flight| in_flight.write)
    }

    /// The first write is never delayed.
    pub(crate) fn interval_elapsed(&self, now: Instant) -> bool {
        self.last_write_at
            .map(|last| now.saturating_duration_since(last) >= self.min_interval)
            .unwrap_or(true)
    }

    pub(crate) fn begin(&mut self, write: WriteId, now: Instant) {
        self.in_flight = Some(InFlight { write, since: now });
    }

    pub(crate) fn complete(&mut self, now: Instant) {
        self.in_flight = None;
        self.last_write_at = Some(now);
        self.last_write_wall = Some(Utc::now());
    }

    /// Clears the in-flight flag without counting a completed write.
    pub(crate) fn unblock(&mut self) {
        self.in_flight = None;
    }

    pub(crate) fn in_flight_for(&self, now: Instant) -> Option<Duration> {
        self.in_flight
            .map(|in_flight| now.saturating_duration_since(in_flight.since))
    }

    pub(crate) fn last_write_wall(&self) -> Option<DateTime<Utc>> {
        self.last_write_wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_is_not_delayed() {
        let pacer = Pacer::new(Duration::from_secs(1));
        assert!(pacer.interval_elapsed(Instant::now()));
        assert!(!pacer.is_busy());
    }

    #[test]
    fn enforces_interval_after_completion() {
        let mut pacer = Pacer::new(Duration::from_secs(1));
        let started = Instant::now();
        let write = pacer.next_write_id();
        pacer.begin(write, started);
        assert_eq!(pacer.in_flight_write(), Some(write));
        assert!(pacer.is_busy());

        pacer.complete(started);
        assert!(!pacer.is_busy());
        assert!(!pacer.interval_elapsed(started + Duration::from_millis(999)));
        assert!(pacer.interval_elapsed(started + Duration::from_millis(1000)));
        assert!(pacer.last_write_wall().is_some());
    }

    #[test]
    fn unblock_keeps_last_completion() {
        let mut pacer = Pacer::new(Duration::from_secs(1));
        let now = Instant::now();
        let write = pacer.next_write_id();
        pacer.begin(write, now);
        pacer.unblock();

        assert!(!pacer.is_busy());
        assert!(pacer.interval_elapsed(now));
        assert!(pacer.last_write_wall().is_none());
    }

    #[test]
    fn write_ids_are_never_reused() {
        let mut pacer = Pacer::new(Duration::from_secs(1));
        let first = pacer.next_write_id();
        let second = pacer.next_write_id();
        assert_ne!(first, second);
        assert_eq!(pacer.in_flight_write(), None);
    }

    #[test]
    fn reports_in_flight_duration() {
        let mut pacer = Pacer::new(Duration::from_secs(1));
        let now = Instant::now();
        assert_eq!(pacer.in_flight_for(now), None);
        let write = pacer.next_write_id();
        pacer.begin(write, now);
        assert_eq!(
            pacer.in_flight_for(now + Duration::from_secs(3)),
            Some(Duration::from_secs(3))
        );
    }
}
