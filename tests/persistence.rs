//! Presets and theme survive a restart through the file-backed store

use mymusic_metronome::host::fake::{CountingKeepAwake, FakeAudioBackend, RecordingFeedback};
use mymusic_metronome::presets::PRESETS_KEY;
use mymusic_metronome::theme::THEME_KEY;
use mymusic_metronome::{
    Collaborators, FileStorage, Metronome, MetronomeConfig, Storage, Theme,
};
use std::path::Path;
use tempfile::tempdir;

fn open_metronome(path: &Path) -> Metronome {
    Metronome::new(
        MetronomeConfig::default(),
        Collaborators {
            audio: Box::new(FakeAudioBackend::new()),
            keep_awake: Box::new(CountingKeepAwake::new()),
            storage: Box::new(FileStorage::open(path).unwrap()),
            feedback: Box::new(RecordingFeedback::new()),
        },
    )
}

#[test]
fn test_presets_and_theme_survive_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let mut metronome = open_metronome(&path);
        metronome.set_tempo(140);
        assert!(metronome.save_preset());
        metronome.set_tempo(72);
        assert!(metronome.save_preset());
        assert_eq!(metronome.toggle_theme(), Theme::Light);
    }

    let metronome = open_metronome(&path);
    assert_eq!(metronome.presets().values(), &[72, 140]);
    assert_eq!(metronome.theme(), Theme::Light);

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get(PRESETS_KEY).as_deref(), Some("[72,140]"));
    assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));
}

#[test]
fn test_ninth_preset_evicts_highest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let mut metronome = open_metronome(&path);

    for bpm in [60, 70, 80, 90, 100, 110, 120, 130] {
        metronome.set_tempo(bpm);
        metronome.save_preset();
    }
    metronome.set_tempo(95);
    assert!(metronome.save_preset());

    let expected: &[u16] = &[60, 70, 80, 90, 95, 100, 110, 120];
    assert_eq!(metronome.presets().values(), expected);
    assert_eq!(open_metronome(&path).presets().values(), expected);
}

#[test]
fn test_deleted_preset_stays_deleted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let mut metronome = open_metronome(&path);
    metronome.set_tempo(100);
    metronome.save_preset();
    assert!(metronome.delete_preset(100));
    assert!(!metronome.delete_preset(100));

    assert!(open_metronome(&path).presets().is_empty());
}

#[test]
fn test_corrupt_store_starts_fresh() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "not json at all").unwrap();

    let metronome = open_metronome(&path);
    assert!(metronome.presets().is_empty());
    assert_eq!(metronome.theme(), Theme::Dark);
}
