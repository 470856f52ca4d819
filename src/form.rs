//! Search form state and the submit/autocomplete flows.
//!
//! The form never talks to the network itself. [`SearchForm::begin_search`]
//! and [`SearchForm::update_field`] hand back the work to do (a query or a
//! lookup ticket), and the caller reports the outcome through
//! [`SearchForm::finish_search`] / [`SearchForm::finish_lookup`]. That keeps
//! every mutation on the event loop while requests run elsewhere.

use crate::api::FlightApi;
use crate::error::SearchError;
use crate::models::{AirportOption, Itinerary, SearchQuery, TripType};
use crate::storage::{self, Storage};
use crate::store::SearchStore;
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

pub const MIN_LOOKUP_LEN: usize = 2;
pub const MISSING_FIELDS: &str = "All fields are required";
pub const BAD_DATE: &str = "Dates must use YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    ValidatingInput,
    Searching,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirportField {
    Origin,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    TripType,
}

/// Identifies one autocomplete request. Only the newest ticket per field is
/// allowed to update the suggestion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub field: AirportField,
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Default)]
pub struct AirportInput {
    pub text: String,
    pub selected: Option<AirportOption>,
    pub options: Vec<AirportOption>,
    pub loading: bool,
    issued: u64,
}

#[derive(Default)]
pub struct SearchForm {
    pub trip_type: TripType,
    pub origin: AirportInput,
    pub destination: AirportInput,
    pub departure_date: String,
    pub return_date: String,
    phase: Phase,
    storage: Option<Storage>,
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a form from the fields saved by a previous session.
    pub fn restore(storage: Storage) -> Self {
        let trip_type = storage
            .get(storage::TRIP_TYPE)
            .and_then(|raw| TripType::parse(&raw))
            .unwrap_or_default();
        let restore_airport = |key: &str| {
            let selected: Option<AirportOption> = storage.load_json(key);
            AirportInput {
                text: selected.as_ref().map(|a| a.label.clone()).unwrap_or_default(),
                selected,
                ..AirportInput::default()
            }
        };

        let form = Self {
            trip_type,
            origin: restore_airport(storage::ORIGIN),
            destination: restore_airport(storage::DESTINATION),
            departure_date: storage.get(storage::DEPARTURE_DATE).unwrap_or_default(),
            return_date: storage.get(storage::RETURN_DATE).unwrap_or_default(),
            phase: Phase::Idle,
            storage: Some(storage),
        };
        info!("Restored search form ({})", form.trip_type.as_str());
        form
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_searching(&self) -> bool {
        self.phase == Phase::Searching
    }

    pub fn airport(&self, field: AirportField) -> &AirportInput {
        match field {
            AirportField::Origin => &self.origin,
            AirportField::Destination => &self.destination,
        }
    }

    fn airport_mut(&mut self, field: AirportField) -> &mut AirportInput {
        match field {
            AirportField::Origin => &mut self.origin,
            AirportField::Destination => &mut self.destination,
        }
    }

    fn persist(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            storage.set(key, value);
        }
    }

    /// Applies user input to one field.
    ///
    /// Typing into an airport field drops the previous selection and, once
    /// the text is long enough, returns a lookup for the caller to run.
    pub fn update_field(&mut self, field: FormField, value: String) -> Option<LookupTicket> {
        match field {
            FormField::Origin => self.type_airport(AirportField::Origin, value),
            FormField::Destination => self.type_airport(AirportField::Destination, value),
            FormField::DepartureDate => {
                self.persist(storage::DEPARTURE_DATE, &value);
                self.departure_date = value;
                None
            }
            FormField::ReturnDate => {
                self.persist(storage::RETURN_DATE, &value);
                self.return_date = value;
                None
            }
            FormField::TripType => {
                match TripType::parse(&value) {
                    Some(trip_type) => self.set_trip_type(trip_type),
                    None => warn!("Ignoring unknown trip type '{}'", value),
                }
                None
            }
        }
    }

    pub fn set_trip_type(&mut self, trip_type: TripType) {
        self.trip_type = trip_type;
        self.persist(storage::TRIP_TYPE, trip_type.as_str());
    }

    fn type_airport(&mut self, field: AirportField, text: String) -> Option<LookupTicket> {
        // Editing discards the selection, so a restart must not bring it back.
        if self.airport(field).selected.is_some() {
            if let Some(storage) = &self.storage {
                storage.remove(airport_key(field));
            }
        }

        let input = self.airport_mut(field);
        input.text = text;
        input.selected = None;
        // Any edit supersedes lookups still in flight.
        input.issued += 1;

        if input.text.trim().chars().count() < MIN_LOOKUP_LEN {
            input.loading = false;
            return None;
        }

        input.loading = true;
        Some(LookupTicket {
            field,
            seq: input.issued,
            query: input.text.trim().to_string(),
        })
    }

    /// Applies an autocomplete response. Returns false when the response
    /// belongs to a superseded request and was dropped.
    pub fn finish_lookup(
        &mut self,
        ticket: &LookupTicket,
        outcome: Result<Vec<AirportOption>, SearchError>,
    ) -> bool {
        let input = self.airport_mut(ticket.field);
        if ticket.seq != input.issued {
            debug!(
                "Dropping stale {:?} suggestions for '{}' (#{} < #{})",
                ticket.field, ticket.query, ticket.seq, input.issued
            );
            return false;
        }

        input.loading = false;
        match outcome {
            Ok(options) => input.options = options,
            Err(e) => warn!("{:?} search error: {}", ticket.field, e),
        }
        true
    }

    pub fn select_airport(&mut self, field: AirportField, option: AirportOption) {
        if let Some(storage) = &self.storage {
            storage.save_json(airport_key(field), &option);
        }

        let input = self.airport_mut(field);
        input.text = option.label.clone();
        input.selected = Some(option);
        input.options.clear();
        input.loading = false;
    }

    /// Checks required fields and builds the query the search client needs.
    pub fn validate(&self) -> Result<SearchQuery, SearchError> {
        let missing = || SearchError::Validation(MISSING_FIELDS.to_string());

        let origin = self.origin.selected.as_ref().ok_or_else(missing)?;
        let destination = self.destination.selected.as_ref().ok_or_else(missing)?;
        let departure = self.departure_date.trim();
        if departure.is_empty() {
            return Err(missing());
        }

        let return_date = match self.trip_type {
            TripType::Roundtrip => {
                let ret = self.return_date.trim();
                if ret.is_empty() {
                    return Err(missing());
                }
                Some(ret)
            }
            TripType::Oneway => None,
        };

        for date in std::iter::once(departure).chain(return_date) {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(SearchError::Validation(BAD_DATE.to_string()));
            }
        }

        Ok(SearchQuery::new(
            origin,
            destination,
            departure,
            return_date,
            self.trip_type,
        ))
    }

    /// Starts a submit. Returns the query to run, or `None` when validation
    /// failed (the store carries the message) or a search is already running.
    pub fn begin_search(&mut self, store: &mut SearchStore) -> Option<SearchQuery> {
        if self.is_searching() {
            debug!("Ignoring submit while a search is in flight");
            return None;
        }

        self.phase = Phase::ValidatingInput;
        match self.validate() {
            Ok(query) => {
                info!(
                    "Searching {} -> {} on {}",
                    query.origin_sky_id, query.destination_sky_id, query.departure_date
                );
                self.phase = Phase::Searching;
                store.set_loading(true);
                Some(query)
            }
            Err(e) => {
                self.phase = Phase::Failed;
                store.set_error(Some(e.user_message()));
                None
            }
        }
    }

    /// Records the outcome of the search started by [`begin_search`](Self::begin_search).
    pub fn finish_search(
        &mut self,
        store: &mut SearchStore,
        outcome: Result<Vec<Itinerary>, SearchError>,
    ) {
        let outcome = outcome.and_then(|flights| {
            if flights.is_empty() {
                Err(SearchError::EmptyResult)
            } else {
                Ok(flights)
            }
        });

        store.set_loading(false);
        match outcome {
            Ok(flights) => {
                info!("Search found {} itineraries", flights.len());
                store.set_results(flights);
                store.set_error(None);
                self.phase = Phase::Succeeded;
            }
            Err(e) => {
                error!("Flight search error: {}", e);
                store.set_results(Vec::new());
                store.set_error(Some(e.user_message()));
                self.phase = Phase::Failed;
            }
        }
    }

    /// Runs a whole submit against `api` in place.
    pub async fn submit<A: FlightApi + ?Sized>(&mut self, store: &mut SearchStore, api: &A) -> Phase {
        if let Some(query) = self.begin_search(store) {
            let outcome = api.search_flights(&query).await;
            self.finish_search(store, outcome);
        }
        self.phase
    }
}

fn airport_key(field: AirportField) -> &'static str {
    match field {
        AirportField::Origin => storage::ORIGIN,
        AirportField::Destination => storage::DESTINATION,
    }
}
