//! Runs blocking device requests off the executor thread.
//!
//! The executor thread must never block on the network. Each request gets a
//! short-lived named thread; its result comes back either through an
//! [`offload`] future or through whatever the job itself sends on completion.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use std::sync::Arc;

use super::DeviceError;

/// Start `job` on a new named thread without waiting for it.
pub fn spawn_job<F>(name: &str, job: F) -> Result<(), DeviceError>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(job)
        .map(|_| ())
        .map_err(|e| DeviceError::Worker(e.to_string()))
}

/// Run `job` on a worker thread and await its result.
///
/// The calling task is suspended (not blocked) until the worker signals.
pub async fn offload<T, F>(name: &str, job: F) -> Result<T, DeviceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DeviceError> + Send + 'static,
{
    let done: Arc<Signal<CriticalSectionRawMutex, Result<T, DeviceError>>> = Arc::new(Signal::new());
    let completion = done.clone();
    spawn_job(name, move || completion.signal(job()))?;
    done.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offload_returns_worker_result() {
        let ok = embassy_futures::block_on(offload("test-ok", || Ok::<_, DeviceError>(42)));
        assert_eq!(ok, Ok(42));

        let err = embassy_futures::block_on(offload::<u8, _>("test-err", || Err(DeviceError::Network("refused".into()))));
        assert_eq!(err, Err(DeviceError::Network("refused".into())));
    }
}
