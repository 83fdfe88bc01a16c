use mymusic_metronome::ui::app::MetronomeApp;
use mymusic_metronome::{
    Collaborators, CpalBackend, FileStorage, IndicatorState, KeepAwake, MemoryStorage, Metronome,
    MetronomeConfig, Storage, SystemKeepAwake, UnsupportedKeepAwake, create_notification_channel,
};
use std::sync::{Arc, Mutex};

// Audio failures are rare; a small buffer is plenty
const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 64;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("MyMusic Metronome {}", env!("CARGO_PKG_VERSION"));

    let config = MetronomeConfig::load_or_default();

    let (notification_tx, notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    let storage: Box<dyn Storage> = match FileStorage::open_default() {
        Ok(storage) => {
            log::info!("Storage: {}", storage.path().display());
            Box::new(storage)
        }
        Err(e) => {
            log::warn!("Persistent storage unavailable, using memory: {}", e);
            Box::new(MemoryStorage::new())
        }
    };

    let keep_awake: Box<dyn KeepAwake> = match SystemKeepAwake::detect() {
        Ok(provider) => Box::new(provider),
        Err(e) => {
            log::warn!("Display keep-awake unavailable: {}", e);
            Box::new(UnsupportedKeepAwake)
        }
    };

    let indicator = IndicatorState::new();

    // The audio stream is only opened on the first user gesture
    let metronome = Metronome::new(
        config,
        Collaborators {
            audio: Box::new(CpalBackend::new(notification_tx)),
            keep_awake,
            storage,
            feedback: Box::new(indicator.clone()),
        },
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 640.0])
            .with_title("MyMusic Metronome"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "MyMusic Metronome",
        native_options,
        Box::new(|_cc| Ok(Box::new(MetronomeApp::new(metronome, indicator, notification_rx)))),
    ) {
        log::error!("UI error: {}", e);
    }
}
