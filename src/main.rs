use anyhow::Context;
use eframe::egui;
use embassy_executor::{Executor, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::sync::Arc;
use std::thread;

mod command;
mod common;
mod device;
mod settings;
mod telemetry;
mod time_driver;
mod ui;

use command::JogRequest;
use common::DashboardConfig;
use device::DeviceClient;
use settings::SettingsRequest;
use telemetry::PollerControl;
use ui::{AppState, UIRefreshState};

const UI_REFRESH_QUEUE_SIZE: usize = 100;
type UIRefreshQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;
type UIRefreshQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;
type UIRefreshQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;

const POLLER_CONTROL_QUEUE_SIZE: usize = 4;
type PollerControlQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, PollerControl, POLLER_CONTROL_QUEUE_SIZE>;
type PollerControlQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, PollerControl, POLLER_CONTROL_QUEUE_SIZE>;
type PollerControlQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, PollerControl, POLLER_CONTROL_QUEUE_SIZE>;

// One request at a time: a second submit while the first is pending is refused in the UI.
const SETTINGS_REQUEST_QUEUE_SIZE: usize = 1;
type SettingsRequestQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, SettingsRequest, SETTINGS_REQUEST_QUEUE_SIZE>;
type SettingsRequestQueueReceiver =
    embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, SettingsRequest, SETTINGS_REQUEST_QUEUE_SIZE>;
type SettingsRequestQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, SettingsRequest, SETTINGS_REQUEST_QUEUE_SIZE>;

const JOG_REQUEST_QUEUE_SIZE: usize = 32;
type JogRequestQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, JogRequest, JOG_REQUEST_QUEUE_SIZE>;
type JogRequestQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, JogRequest, JOG_REQUEST_QUEUE_SIZE>;
type JogRequestQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, JogRequest, JOG_REQUEST_QUEUE_SIZE>;

/// Receiving ends handed to the executor tasks.
struct TaskQueues {
    ui_refresh_tx: UIRefreshQueueSender,
    poller_control_rx: PollerControlQueueReceiver,
    settings_request_rx: SettingsRequestQueueReceiver,
    jog_request_rx: JogRequestQueueReceiver,
}

fn embassy_init(spawner: Spawner, config: DashboardConfig, client: DeviceClient, queues: TaskQueues) {
    let source: Arc<dyn telemetry::LiveSource> = Arc::new(client.clone());

    if let Err(e) = spawner.spawn(telemetry::telemetry_task(
        source,
        config.poll_interval(),
        queues.ui_refresh_tx,
        queues.poller_control_rx,
    )) {
        log::error!("Failed to spawn telemetry task: {:?}", e);
    }
    if let Err(e) = spawner.spawn(settings::settings_task(client, queues.ui_refresh_tx, queues.settings_request_rx)) {
        log::error!("Failed to spawn settings task: {:?}", e);
    }
    if let Err(e) = spawner.spawn(command::command_task(config.websocket_url(), queues.ui_refresh_tx, queues.jog_request_rx)) {
        log::error!("Failed to spawn command task: {:?}", e);
    }
}

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("chute_monitor_dashboard"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Starting up");

    let config_path = DashboardConfig::path_from_args(std::env::args());
    let config = DashboardConfig::load(&config_path).with_context(|| format!("Loading {}", config_path.display()))?;
    info!("Device at {}, commands via {}", config.device_url, config.websocket_url());

    let client = DeviceClient::new(&config.device_url, config.request_timeout()).context("Creating device client")?;

    let ui_refresh_queue: &'static UIRefreshQueue = Box::leak(Box::new(UIRefreshQueue::new()));
    let poller_control_queue: &'static PollerControlQueue = Box::leak(Box::new(PollerControlQueue::new()));
    let settings_request_queue: &'static SettingsRequestQueue = Box::leak(Box::new(SettingsRequestQueue::new()));
    let jog_request_queue: &'static JogRequestQueue = Box::leak(Box::new(JogRequestQueue::new()));

    let queues = TaskQueues {
        ui_refresh_tx: ui_refresh_queue.sender(),
        poller_control_rx: poller_control_queue.receiver(),
        settings_request_rx: settings_request_queue.receiver(),
        jog_request_rx: jog_request_queue.receiver(),
    };

    let device_url = config.device_url.clone();

    // Spawn Embassy executor on a dedicated background thread
    thread::Builder::new()
        .name("embassy-executor".to_string())
        .spawn(move || {
            // Leak the executor to satisfy the 'static lifetime required by run()
            let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
            executor.run(|spawner| embassy_init(spawner, config, client, queues));
        })
        .context("Spawning executor thread")?;

    // Start the GUI on the main thread (required on macOS)
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Chute Monitor",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(AppState::new(
                device_url,
                ui_refresh_queue.receiver(),
                poller_control_queue.sender(),
                settings_request_queue.sender(),
                jog_request_queue.sender(),
                cc.storage,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI terminated: {}", e))
}
