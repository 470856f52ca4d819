use serde::{Deserialize, Serialize};
use std::fmt;

use crate::duration;

/// One autocomplete suggestion, already reduced to what a search needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportOption {
    pub label: String,
    pub sky_id: String,
    pub entity_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    #[default]
    Oneway,
    Roundtrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::Oneway => "oneway",
            TripType::Roundtrip => "roundtrip",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "oneway" => Some(TripType::Oneway),
            "roundtrip" => Some(TripType::Roundtrip),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TripType::Oneway => TripType::Roundtrip,
            TripType::Roundtrip => TripType::Oneway,
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripType::Oneway => write!(f, "One-way"),
            TripType::Roundtrip => write!(f, "Round-trip"),
        }
    }
}

/// A validated search. Only built by the form controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub origin_sky_id: String,
    pub destination_sky_id: String,
    pub origin_entity_id: String,
    pub destination_entity_id: String,
    pub departure_date: String,
    // Accepted but never sent: the search endpoint only prices outbound legs.
    pub return_date: Option<String>,
    pub trip_type: TripType,
}

impl SearchQuery {
    pub fn new(
        origin: &AirportOption,
        destination: &AirportOption,
        departure_date: &str,
        return_date: Option<&str>,
        trip_type: TripType,
    ) -> Self {
        Self {
            origin_sky_id: origin.sky_id.clone(),
            destination_sky_id: destination.sky_id.clone(),
            origin_entity_id: origin.entity_id.clone(),
            destination_entity_id: destination.entity_id.clone(),
            departure_date: departure_date.to_string(),
            return_date: match trip_type {
                TripType::Roundtrip => return_date.map(str::to_string),
                TripType::Oneway => None,
            },
            trip_type,
        }
    }
}

// Result records. Every field is defaulted so one odd itinerary does not sink
// the whole payload; the same shapes are reused for local persistence.

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Itinerary {
    pub id: String,
    pub price: Price,
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Price {
    pub raw: Option<f64>,
    pub formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Leg {
    pub id: String,
    pub origin: Option<Place>,
    pub destination: Option<Place>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub stop_count: u32,
    pub segments: Vec<Segment>,
    pub carriers: Carriers,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    #[serde(alias = "flightPlaceId")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Segment {
    pub origin: Place,
    pub destination: Place,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub flight_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Carriers {
    pub marketing: Vec<Carrier>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Carrier {
    pub name: String,
    pub logo_url: Option<String>,
}

impl Itinerary {
    pub fn first_leg(&self) -> Option<&Leg> {
        self.legs.first()
    }
}

impl Leg {
    /// Arrival minus departure, when both timestamps parse.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let dep = duration::parse_timestamp(self.departure.as_deref()?)?;
        let arr = duration::parse_timestamp(self.arrival.as_deref()?)?;
        Some(arr - dep)
    }

    pub fn duration_label(&self) -> Option<String> {
        duration::flight_duration(self.departure.as_deref()?, self.arrival.as_deref()?)
    }

    pub fn stops_label(&self) -> String {
        if self.stop_count > 0 {
            format!("{} stop(s)", self.stop_count)
        } else {
            "Nonstop".to_string()
        }
    }
}

// Raw payloads from the sky-scrapper endpoints.

#[derive(Debug, Deserialize)]
pub struct AirportResponse {
    pub data: Vec<AirportSuggestion>,
}

#[derive(Debug, Deserialize)]
pub struct AirportSuggestion {
    pub presentation: Presentation,
    pub navigation: Navigation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub suggestion_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub relevant_flight_params: FlightParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightParams {
    pub sky_id: String,
    pub entity_id: String,
}

impl From<AirportSuggestion> for AirportOption {
    fn from(raw: AirportSuggestion) -> Self {
        let params = raw.navigation.relevant_flight_params;
        Self {
            label: raw.presentation.suggestion_title,
            sky_id: params.sky_id,
            entity_id: params.entity_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: Option<bool>,
    // Usually a string, occasionally a list of validation objects.
    pub message: Option<serde_json::Value>,
    pub data: Option<SearchData>,
}

impl SearchResponse {
    pub fn message_text(&self) -> Option<String> {
        match self.message.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchData {
    pub itineraries: Option<Vec<Itinerary>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leg(departure: &str, arrival: &str) -> Leg {
        Leg {
            departure: Some(departure.to_string()),
            arrival: Some(arrival.to_string()),
            ..Leg::default()
        }
    }

    #[test]
    fn suggestion_maps_to_airport_option() {
        let raw: AirportSuggestion = serde_json::from_value(json!({
            "presentation": { "suggestionTitle": "New York John F. Kennedy (JFK)" },
            "navigation": {
                "relevantFlightParams": { "skyId": "JFK", "entityId": "95565058" }
            }
        }))
        .unwrap();

        assert_eq!(
            AirportOption::from(raw),
            AirportOption {
                label: "New York John F. Kennedy (JFK)".to_string(),
                sky_id: "JFK".to_string(),
                entity_id: "95565058".to_string(),
            }
        );
    }

    #[test]
    fn itinerary_parses_api_shape() {
        let it: Itinerary = serde_json::from_value(json!({
            "id": "13554-2406010800--32171-0-13416-2406011125",
            "price": { "raw": 180.4, "formatted": "$181" },
            "legs": [{
                "origin": { "id": "JFK", "name": "New York John F. Kennedy" },
                "destination": { "id": "LAX", "name": "Los Angeles International" },
                "durationInMinutes": 385,
                "stopCount": 0,
                "departure": "2024-06-01T08:00:00",
                "arrival": "2024-06-01T11:25:00",
                "carriers": {
                    "marketing": [{ "id": -32171, "name": "JetBlue", "logoUrl": "https://logos/B6.png" }]
                },
                "segments": [{
                    "origin": { "flightPlaceId": "JFK", "name": "New York John F. Kennedy", "type": "Airport" },
                    "destination": { "flightPlaceId": "LAX", "name": "Los Angeles International", "type": "Airport" },
                    "flightNumber": "23"
                }]
            }]
        }))
        .unwrap();

        let leg = it.first_leg().unwrap();
        assert_eq!(it.price.raw, Some(180.4));
        assert_eq!(it.price.formatted.as_deref(), Some("$181"));
        assert_eq!(leg.carriers.marketing[0].name, "JetBlue");
        assert_eq!(leg.segments[0].origin.id, "JFK");
        assert_eq!(leg.segments[0].origin.kind, "Airport");
        assert_eq!(leg.duration_label().as_deref(), Some("3 hr 25 min"));
        assert_eq!(leg.stops_label(), "Nonstop");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let it: Itinerary = serde_json::from_value(json!({ "legs": [{}] })).unwrap();
        let leg = it.first_leg().unwrap();
        assert_eq!(it.price, Price::default());
        assert_eq!(it.price.raw, None);
        assert_eq!(leg.elapsed(), None);
        assert_eq!(leg.duration_label(), None);
    }

    #[test]
    fn elapsed_spans_midnight() {
        let l = leg("2024-06-01T22:50:00", "2024-06-02T01:55:00");
        assert_eq!(l.elapsed(), Some(chrono::Duration::minutes(185)));
        assert_eq!(l.duration_label().as_deref(), Some("3 hr 5 min"));
    }

    #[test]
    fn stops_label_pluralizes() {
        let mut l = Leg::default();
        l.stop_count = 2;
        assert_eq!(l.stops_label(), "2 stop(s)");
    }

    #[test]
    fn query_drops_return_date_for_oneway() {
        let jfk = AirportOption {
            label: "JFK".into(),
            sky_id: "JFK".into(),
            entity_id: "95565058".into(),
        };
        let lax = AirportOption {
            label: "LAX".into(),
            sky_id: "LAX".into(),
            entity_id: "95673635".into(),
        };
        let q = SearchQuery::new(&jfk, &lax, "2024-06-01", Some("2024-06-08"), TripType::Oneway);
        assert_eq!(q.return_date, None);

        let q = SearchQuery::new(&jfk, &lax, "2024-06-01", Some("2024-06-08"), TripType::Roundtrip);
        assert_eq!(q.return_date.as_deref(), Some("2024-06-08"));
        assert_eq!(q.destination_entity_id, "95673635");
    }

    #[test]
    fn trip_type_round_trips_as_raw_string() {
        assert_eq!(TripType::parse(TripType::Roundtrip.as_str()), Some(TripType::Roundtrip));
        assert_eq!(TripType::parse("multicity"), None);
        assert_eq!(TripType::Oneway.toggled(), TripType::Roundtrip);
    }
}
