use crate::models::Itinerary;
use crate::storage::{self, Storage};
use tracing::info;

/// Session-wide search outcome shared by the form and the results view.
///
/// `loading` and `error` are never both set. While a search is in flight,
/// `results` still holds the previous completed search.
#[derive(Default)]
pub struct SearchStore {
    results: Vec<Itinerary>,
    loading: bool,
    error: Option<String>,
    generation: u64,
    storage: Option<Storage>,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store backed by `storage`, rehydrating the last results.
    pub fn with_storage(storage: Storage) -> Self {
        let results: Vec<Itinerary> = storage
            .load_json(storage::FLIGHT_DATA)
            .unwrap_or_default();
        if !results.is_empty() {
            info!("Restored {} itineraries from storage", results.len());
        }
        Self {
            results,
            storage: Some(storage),
            ..Self::default()
        }
    }

    pub fn results(&self) -> &[Itinerary] {
        &self.results
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Bumped on every `set_results`; the results view resets when it moves.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_results(&mut self, results: Vec<Itinerary>) {
        if let Some(storage) = &self.storage {
            storage.save_json(storage::FLIGHT_DATA, &results);
        }
        self.results = results;
        self.generation += 1;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        if loading {
            self.error = None;
        }
    }

    pub fn set_error(&mut self, error: Option<String>) {
        if error.is_some() {
            self.loading = false;
        }
        self.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Leg, Price};

    fn itinerary(id: &str, raw: f64) -> Itinerary {
        Itinerary {
            id: id.to_string(),
            price: Price {
                raw: Some(raw),
                formatted: Some(format!("${raw}")),
            },
            legs: vec![Leg {
                departure: Some("2024-06-01T08:00:00".into()),
                arrival: Some("2024-06-01T11:25:00".into()),
                ..Leg::default()
            }],
        }
    }

    #[test]
    fn starts_empty() {
        let store = SearchStore::new();
        assert!(store.results().is_empty());
        assert!(!store.loading());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn loading_and_error_are_exclusive() {
        let mut store = SearchStore::new();
        store.set_error(Some("No flights found".into()));
        store.set_loading(true);
        assert_eq!(store.error(), None);

        store.set_error(Some("Invalid market".into()));
        assert!(!store.loading());
    }

    #[test]
    fn generation_moves_on_every_result_set() {
        let mut store = SearchStore::new();
        let before = store.generation();
        store.set_results(vec![]);
        store.set_results(vec![]);
        assert_eq!(store.generation(), before + 2);
    }

    #[test]
    fn results_survive_reinitialization() {
        let storage = Storage::open_in_memory().unwrap();
        let flights = vec![itinerary("a", 250.0), itinerary("b", 180.0)];

        let mut store = SearchStore::with_storage(storage.clone());
        store.set_results(flights.clone());

        let restored = SearchStore::with_storage(storage);
        assert_eq!(restored.results(), flights.as_slice());
        assert!(!restored.loading());
        assert_eq!(restored.error(), None);
    }

    #[test]
    fn corrupted_results_restore_as_empty() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set(storage::FLIGHT_DATA, "[{\"legs\": 7");

        let store = SearchStore::with_storage(storage);
        assert!(store.results().is_empty());
    }
}
