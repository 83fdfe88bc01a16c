// Presets - Saved BPM values
// At most 8 distinct tempos, kept sorted ascending, stored as a JSON array

use crate::host::Storage;
use crate::sequencer::timeline::Tempo;

pub const PRESETS_KEY: &str = "metronomePresets";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetSet {
    values: Vec<u16>,
}

impl PresetSet {
    pub const CAPACITY: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw values: out-of-range entries are dropped, the rest
    /// deduplicated, sorted and capped to the lowest `CAPACITY` entries
    pub fn from_values<I: IntoIterator<Item = i64>>(values: I) -> Self {
        let mut values: Vec<u16> = values
            .into_iter()
            .filter(|&bpm| Tempo::in_range(bpm))
            .map(|bpm| bpm as u16)
            .collect();
        values.sort_unstable();
        values.dedup();
        values.truncate(Self::CAPACITY);
        Self { values }
    }

    pub fn values(&self) -> &[u16] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, bpm: u16) -> bool {
        self.values.binary_search(&bpm).is_ok()
    }

    /// Add a tempo if absent; when full the highest entry is evicted first
    /// Returns false if the tempo was already saved.
    pub fn add(&mut self, tempo: Tempo) -> bool {
        let bpm = tempo.bpm();
        if self.contains(bpm) {
            return false;
        }
        if self.values.len() >= Self::CAPACITY {
            self.values.pop();
        }
        self.values.push(bpm);
        self.values.sort_unstable();
        true
    }

    /// Returns false if the tempo was not saved
    pub fn remove(&mut self, bpm: u16) -> bool {
        match self.values.binary_search(&bpm) {
            Ok(index) => {
                self.values.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn to_json(&self) -> String {
        // A Vec<u16> always serializes
        serde_json::to_string(&self.values).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse the stored JSON array; malformed input yields an empty set
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Vec<i64>>(json) {
            Ok(values) => Self::from_values(values),
            Err(e) => {
                log::warn!("Ignoring malformed presets {:?}: {}", json, e);
                Self::new()
            }
        }
    }

    pub fn load(storage: &dyn Storage) -> Self {
        storage
            .get(PRESETS_KEY)
            .map(|json| Self::from_json(&json))
            .unwrap_or_default()
    }

    /// Persist; failure is logged and the in-memory set stays authoritative
    pub fn save(&self, storage: &mut dyn Storage) {
        if let Err(e) = storage.set(PRESETS_KEY, &self.to_json()) {
            log::warn!("Could not persist presets: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryStorage;

    fn full_set() -> PresetSet {
        let mut presets = PresetSet::new();
        for bpm in [60, 70, 80, 90, 100, 110, 120, 130] {
            presets.add(Tempo::new(bpm));
        }
        presets
    }

    #[test]
    fn test_add_keeps_sorted_and_distinct() {
        let mut presets = PresetSet::new();
        assert!(presets.add(Tempo::new(120)));
        assert!(presets.add(Tempo::new(60)));
        assert!(!presets.add(Tempo::new(120)));
        assert_eq!(presets.values(), &[60, 120]);
    }

    #[test]
    fn test_ninth_preset_evicts_maximum() {
        let mut presets = full_set();
        assert_eq!(presets.len(), 8);

        assert!(presets.add(Tempo::new(95)));
        assert_eq!(presets.len(), 8);
        assert_eq!(presets.values(), &[60, 70, 80, 90, 95, 100, 110, 120]);

        // A new maximum still evicts the old maximum first
        assert!(presets.add(Tempo::new(200)));
        assert_eq!(presets.values(), &[60, 70, 80, 90, 95, 100, 110, 200]);
    }

    #[test]
    fn test_remove() {
        let mut presets = full_set();
        assert!(presets.remove(90));
        assert!(!presets.remove(90));
        assert!(!presets.contains(90));
        assert_eq!(presets.len(), 7);
    }

    #[test]
    fn test_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        let presets = full_set();
        presets.save(&mut storage);

        assert_eq!(
            storage.get(PRESETS_KEY).as_deref(),
            Some("[60,70,80,90,100,110,120,130]")
        );
        assert_eq!(PresetSet::load(&storage), presets);
    }

    #[test]
    fn test_malformed_json_defaults_to_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(PRESETS_KEY, "{oops").unwrap();
        assert!(PresetSet::load(&storage).is_empty());
        assert!(PresetSet::from_json("null").is_empty());
    }

    #[test]
    fn test_sanitizes_stored_values() {
        let presets = PresetSet::from_json("[300, 90, 90, 10, 45]");
        assert_eq!(presets.values(), &[45, 90]);
    }
}
