//! Executor task that keeps the rendered telemetry sample current.
//!
//! Every tick starts one request on a worker thread. Requests are never
//! awaited in line: completions come back through [`COMPLETIONS`] in whatever
//! order the network delivers them, and [`TelemetryPoller`] drops the ones
//! that arrive after a newer sample was rendered.

use chrono::Local;
use embassy_futures::select::{Either3, select3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use std::sync::Arc;

use super::{LiveSource, PollCadence, PollOutcome, PollTicket, TelemetryPoller, TelemetrySample};
use crate::device::{DeviceError, worker};
use crate::ui::UIRefreshState;
use crate::{PollerControlQueueReceiver, UIRefreshQueueSender};

/// Requests are independent, so several may be in flight when the device is slow.
const COMPLETION_QUEUE_SIZE: usize = 16;

struct PollCompletion {
    ticket: PollTicket,
    result: Result<TelemetrySample, DeviceError>,
}

static COMPLETIONS: Channel<CriticalSectionRawMutex, PollCompletion, COMPLETION_QUEUE_SIZE> = Channel::new();

/// Operator control over the polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerControl {
    Start,
    Stop,
}

/// Poll `source` every `period`, starting immediately.
///
/// # Parameters
///
/// * `source` - Where snapshots come from (the device client in production)
/// * `period` - Tick period
/// * `ui_refresh_tx` - Channel for rendered samples and poll failures
/// * `control_rx` - Start/stop requests from the UI
#[embassy_executor::task]
pub async fn telemetry_task(
    source: Arc<dyn LiveSource>,
    period: Duration,
    ui_refresh_tx: UIRefreshQueueSender,
    control_rx: PollerControlQueueReceiver,
) {
    let mut poller = TelemetryPoller::new();
    let mut cadence = PollCadence::new(period);
    log::info!("Telemetry task started, polling every {} ms", cadence.period().as_millis());
    cadence.start(Instant::now());
    let _ = ui_refresh_tx.try_send(UIRefreshState::PollingChanged(true));

    loop {
        let deadline = cadence.next_deadline();
        let tick = async move {
            match deadline {
                Some(at) => Timer::at(at).await,
                None => core::future::pending::<()>().await,
            }
        };

        match select3(tick, COMPLETIONS.receive(), control_rx.receive()).await {
            Either3::First(()) => {
                if cadence.fire(Instant::now()) {
                    issue_poll(&mut poller, &source);
                }
            }
            Either3::Second(completion) => {
                handle_completion(&mut poller, completion, &ui_refresh_tx);
            }
            Either3::Third(control) => {
                match control {
                    PollerControl::Start => cadence.start(Instant::now()),
                    // In-flight requests still complete and may render.
                    PollerControl::Stop => cadence.stop(),
                }
                log::info!("Telemetry polling {}", if cadence.is_running() { "running" } else { "stopped" });
                let _ = ui_refresh_tx.try_send(UIRefreshState::PollingChanged(cadence.is_running()));
            }
        }
    }
}

fn issue_poll(poller: &mut TelemetryPoller, source: &Arc<dyn LiveSource>) {
    let ticket = poller.begin();
    let source = source.clone();
    let spawned = worker::spawn_job("live-poll", move || {
        let result = source.fetch_live();
        embassy_futures::block_on(COMPLETIONS.send(PollCompletion { ticket, result }));
    });

    if let Err(e) = spawned {
        let _ = COMPLETIONS.try_send(PollCompletion { ticket, result: Err(e) });
    }
}

fn handle_completion(poller: &mut TelemetryPoller, completion: PollCompletion, ui_refresh_tx: &UIRefreshQueueSender) {
    let seq = completion.ticket.seq();
    let now = Instant::now();
    match poller.complete(completion.ticket, completion.result, now) {
        PollOutcome::Rendered(sample) => {
            log::debug!("Poll #{} rendered", seq);
            let _ = ui_refresh_tx.try_send(UIRefreshState::TelemetryUpdated(sample, Local::now()));
        }
        PollOutcome::Retained(e) => {
            match (poller.current(), poller.staleness(now)) {
                (Some(kept), Some(age)) => {
                    log::debug!("Poll #{} failed, keeping {:?} from {} s ago: {}", seq, kept, age.as_secs(), e)
                }
                _ => log::debug!("Poll #{} failed, nothing rendered yet: {}", seq, e),
            }
            let _ = ui_refresh_tx.try_send(UIRefreshState::TelemetryFailed(e.to_string(), poller.consecutive_failures()));
        }
        PollOutcome::Superseded => {
            log::debug!("Poll #{} completed after a newer one, ignored", seq);
        }
    }
}
