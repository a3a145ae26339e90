//! Poll sequencing and cadence, independent of any clock or transport.
//!
//! [`TelemetryPoller`] decides what gets rendered when a request completes;
//! [`PollCadence`] decides when the next request is due. The executor task
//! feeds both with real instants; tests feed them with synthetic ones.

use embassy_time::{Duration, Instant};

use super::TelemetrySample;
use crate::device::DeviceError;

/// Identity of one issued poll request. Tickets are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTicket {
    seq: u64,
}

impl PollTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What a completed request did to the rendered state.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The sample replaced the rendered one.
    Rendered(TelemetrySample),
    /// The request failed; the previously rendered sample stays.
    Retained(DeviceError),
    /// A newer request already rendered; this completion was ignored.
    Superseded,
}

/// Holds the one current telemetry sample and guards it against late completions.
#[derive(Debug, Default)]
pub struct TelemetryPoller {
    next_seq: u64,
    rendered_seq: Option<u64>,
    current: Option<TelemetrySample>,
    last_update: Option<Instant>,
    consecutive_failures: u32,
}

impl TelemetryPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a request that is about to be sent.
    pub fn begin(&mut self) -> PollTicket {
        let ticket = PollTicket { seq: self.next_seq };
        self.next_seq += 1;
        ticket
    }

    /// Apply the result of the request identified by `ticket`.
    ///
    /// Never fails: errors are returned as [`PollOutcome::Retained`] and leave
    /// the current sample untouched.
    pub fn complete(&mut self, ticket: PollTicket, result: Result<TelemetrySample, DeviceError>, now: Instant) -> PollOutcome {
        if self.rendered_seq.is_some_and(|seq| ticket.seq < seq) {
            return PollOutcome::Superseded;
        }

        match result {
            Ok(sample) => {
                self.rendered_seq = Some(ticket.seq);
                self.current = Some(sample);
                self.last_update = Some(now);
                self.consecutive_failures = 0;
                PollOutcome::Rendered(sample)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                PollOutcome::Retained(e)
            }
        }
    }

    pub fn current(&self) -> Option<&TelemetrySample> {
        self.current.as_ref()
    }

    /// Time since the last successful update, `None` before the first one.
    pub fn staleness(&self, now: Instant) -> Option<Duration> {
        self.last_update.map(|at| now.saturating_duration_since(at))
    }

    /// Failed polls since the last rendered one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

/// Fixed-period tick schedule with an immediate first tick.
///
/// Ticks missed while the executor was busy are skipped rather than replayed,
/// so a late wakeup yields one request and the schedule stays on its grid.
#[derive(Debug, Clone)]
pub struct PollCadence {
    period: Duration,
    next_due: Option<Instant>,
}

impl PollCadence {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking; the first tick is due at `now`. No-op while running.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// Returns `true` when a tick is due at `now` and advances the schedule.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                let mut next = due + self.period;
                while next <= now {
                    next += self.period;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lidar: f64) -> TelemetrySample {
        TelemetrySample {
            lidar,
            ..Default::default()
        }
    }

    #[test]
    fn cadence_fires_immediately_then_every_period() {
        let mut cadence = PollCadence::new(Duration::from_secs(5));
        assert_eq!(cadence.period(), Duration::from_secs(5));
        cadence.start(Instant::from_secs(0));

        let mut fired_at = Vec::new();
        for ms in (0..=60_000u64).step_by(100) {
            let now = Instant::from_millis(ms);
            if cadence.fire(now) {
                fired_at.push(ms);
            }
        }

        let expected: Vec<u64> = (0..=12).map(|i| i * 5_000).collect();
        assert_eq!(fired_at, expected);
    }

    #[test]
    fn cadence_does_not_replay_missed_ticks() {
        let mut cadence = PollCadence::new(Duration::from_secs(5));
        cadence.start(Instant::from_secs(100));
        assert!(cadence.fire(Instant::from_secs(100)));

        // Executor stalled for 12 s: one tick, and the grid is kept.
        assert!(cadence.fire(Instant::from_secs(112)));
        assert!(!cadence.fire(Instant::from_secs(112)));
        assert_eq!(cadence.next_deadline(), Some(Instant::from_secs(115)));
    }

    #[test]
    fn stopped_cadence_never_fires_and_restarts_immediately() {
        let mut cadence = PollCadence::new(Duration::from_secs(5));
        cadence.start(Instant::from_secs(0));
        assert!(cadence.fire(Instant::from_secs(0)));

        cadence.stop();
        assert!(!cadence.is_running());
        assert!(!cadence.fire(Instant::from_secs(5)));
        assert!(!cadence.fire(Instant::from_secs(50)));

        cadence.start(Instant::from_secs(51));
        assert!(cadence.fire(Instant::from_secs(51)));
        assert_eq!(cadence.next_deadline(), Some(Instant::from_secs(56)));
    }

    #[test]
    fn start_while_running_keeps_schedule() {
        let mut cadence = PollCadence::new(Duration::from_secs(5));
        cadence.start(Instant::from_secs(0));
        assert!(cadence.fire(Instant::from_secs(0)));
        cadence.start(Instant::from_secs(2));
        assert_eq!(cadence.next_deadline(), Some(Instant::from_secs(5)));
    }

    #[test]
    fn failed_poll_keeps_previous_sample() {
        let mut poller = TelemetryPoller::new();
        let first = poller.begin();
        poller.complete(first, Ok(sample(10.0)), Instant::from_secs(0));

        let second = poller.begin();
        let outcome = poller.complete(second, Err(DeviceError::Network("timed out".into())), Instant::from_secs(5));

        assert_eq!(outcome, PollOutcome::Retained(DeviceError::Network("timed out".into())));
        assert_eq!(poller.current(), Some(&sample(10.0)));
        assert_eq!(poller.staleness(Instant::from_secs(5)), Some(Duration::from_secs(5)));
        assert_eq!(poller.consecutive_failures(), 1);
    }

    #[test]
    fn failure_before_first_success_renders_nothing() {
        let mut poller = TelemetryPoller::new();
        let ticket = poller.begin();
        let outcome = poller.complete(ticket, Err(DeviceError::Decode("expected value".into())), Instant::from_secs(0));
        assert!(matches!(outcome, PollOutcome::Retained(_)));
        assert_eq!(poller.current(), None);
        assert_eq!(poller.staleness(Instant::from_secs(10)), None);
    }

    #[test]
    fn late_completion_does_not_overwrite_newer_sample() {
        let mut poller = TelemetryPoller::new();
        let a = poller.begin();
        let b = poller.begin();

        assert_eq!(poller.complete(b, Ok(sample(2.0)), Instant::from_secs(6)), PollOutcome::Rendered(sample(2.0)));
        assert_eq!(poller.complete(a, Ok(sample(1.0)), Instant::from_secs(7)), PollOutcome::Superseded);

        assert_eq!(poller.current(), Some(&sample(2.0)));
        assert_eq!(poller.staleness(Instant::from_secs(7)), Some(Duration::from_secs(1)));
    }

    #[test]
    fn older_success_still_renders_after_newer_failure() {
        let mut poller = TelemetryPoller::new();
        let a = poller.begin();
        let b = poller.begin();

        poller.complete(b, Err(DeviceError::Network("refused".into())), Instant::from_secs(5));
        assert_eq!(poller.complete(a, Ok(sample(1.0)), Instant::from_secs(6)), PollOutcome::Rendered(sample(1.0)));
        assert_eq!(poller.consecutive_failures(), 0);
    }

    #[test]
    fn staleness_counts_from_last_success() {
        let mut poller = TelemetryPoller::new();
        let ticket = poller.begin();
        poller.complete(ticket, Ok(sample(3.0)), Instant::from_secs(10));

        let failed = poller.begin();
        poller.complete(failed, Err(DeviceError::Network("refused".into())), Instant::from_secs(15));

        assert_eq!(poller.staleness(Instant::from_secs(17)), Some(Duration::from_secs(7)));
    }
}
