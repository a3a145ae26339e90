//! Wall-clock time driver for `embassy-time` on the host.
//!
//! Ticks are counted from the first time the clock is touched. Pending wakers
//! live in a deadline-ordered queue that a single background thread drains;
//! `schedule_wake` only enqueues and notifies, so the executor thread never
//! sleeps inside the driver.

use core::task::Waker;
use embassy_time_driver::{Driver, TICK_HZ, time_driver_impl};
use std::collections::BTreeMap;
use std::sync::{Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant as StdInstant};

#[derive(Default)]
struct WakeQueue {
    // tick deadline -> wakers due at that tick
    pending: BTreeMap<u64, Vec<Waker>>,
}

static ORIGIN: OnceLock<StdInstant> = OnceLock::new();
static QUEUE: Mutex<WakeQueue> = Mutex::new(WakeQueue { pending: BTreeMap::new() });
static WAKE_CV: Condvar = Condvar::new();
static WAKER_THREAD: OnceLock<()> = OnceLock::new();

fn origin() -> StdInstant {
    *ORIGIN.get_or_init(StdInstant::now)
}

fn ticks_since_origin(at: StdInstant) -> u64 {
    let elapsed = at.saturating_duration_since(origin());
    (elapsed.as_nanos() * TICK_HZ as u128 / 1_000_000_000u128).min(u64::MAX as u128) as u64
}

fn instant_for_ticks(ticks: u64) -> StdInstant {
    let nanos = ticks as u128 * 1_000_000_000u128 / TICK_HZ as u128;
    origin() + Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
}

fn ensure_waker_thread() {
    WAKER_THREAD.get_or_init(|| {
        if let Err(e) = std::thread::Builder::new().name("embassy-time-waker".into()).spawn(waker_thread) {
            log::error!("Failed to start the timer waker thread: {}", e);
        }
    });
}

/// Pop every waker whose deadline is at or before `now_ticks`.
fn take_due(queue: &mut WakeQueue, now_ticks: u64) -> Vec<Waker> {
    let later = queue.pending.split_off(&(now_ticks.saturating_add(1)));
    let due = std::mem::replace(&mut queue.pending, later);
    due.into_values().flatten().collect()
}

fn waker_thread() {
    let mut guard = match QUEUE.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    loop {
        let next = guard.pending.keys().next().copied();
        match next {
            None => {
                guard = WAKE_CV.wait(guard).unwrap_or_else(|p| p.into_inner());
            }
            Some(deadline) => {
                let target = instant_for_ticks(deadline);
                let now = StdInstant::now();
                if target > now {
                    guard = WAKE_CV
                        .wait_timeout(guard, target - now)
                        .map(|(g, _)| g)
                        .unwrap_or_else(|p| p.into_inner().0);
                    continue;
                }
                let ready = take_due(&mut guard, ticks_since_origin(now));
                // Wake outside the lock: a woken task may schedule again immediately.
                drop(guard);
                for waker in ready {
                    waker.wake();
                }
                guard = QUEUE.lock().unwrap_or_else(|p| p.into_inner());
            }
        }
    }
}

struct WallClockDriver;

impl Driver for WallClockDriver {
    fn now(&self) -> u64 {
        ticks_since_origin(StdInstant::now())
    }

    fn schedule_wake(&self, at: u64, waker: &Waker) {
        ensure_waker_thread();
        let mut guard = QUEUE.lock().unwrap_or_else(|p| p.into_inner());
        let slot = guard.pending.entry(at).or_default();
        if !slot.iter().any(|w| w.will_wake(waker)) {
            slot.push(waker.clone());
        }
        drop(guard);
        WAKE_CV.notify_all();
    }
}

time_driver_impl!(static DRIVER: WallClockDriver = WallClockDriver);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn ticks_round_trip_through_instants() {
        let ticks = ticks_since_origin(StdInstant::now()) + TICK_HZ;
        let back = ticks_since_origin(instant_for_ticks(ticks));
        let diff = back.abs_diff(ticks);
        assert!(diff <= 1, "tick mapping drifted by {} ticks", diff);
    }

    #[test]
    fn take_due_keeps_future_deadlines() {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut queue = WakeQueue::default();
        queue.pending.entry(10).or_default().push(waker.clone());
        queue.pending.entry(20).or_default().push(waker.clone());
        queue.pending.entry(30).or_default().push(waker);

        let due = take_due(&mut queue, 20);
        assert_eq!(due.len(), 2);
        assert_eq!(queue.pending.keys().copied().collect::<Vec<_>>(), vec![30]);

        for w in due {
            w.wake();
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clock_is_monotonic() {
        let a = DRIVER.now();
        std::thread::sleep(Duration::from_millis(2));
        let b = DRIVER.now();
        assert!(b > a);
    }
}
