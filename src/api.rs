use crate::config::ApiConfig;
use crate::error::SearchError;
use crate::models::{AirportOption, AirportResponse, Itinerary, SearchQuery, SearchResponse};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

// Fixed search parameters. Single economy adult, priced in USD for the US market.
const CABIN_CLASS: &str = "economy";
const ADULTS: &str = "1";
const SORT_BY: &str = "best";
const CURRENCY: &str = "USD";
const MARKET: &str = "en-US";
const COUNTRY_CODE: &str = "US";
const LOCALE: &str = "en-US";

/// The two remote calls the app makes. Implemented by [`SkyScrapperClient`]
/// and by fakes in tests.
#[async_trait]
pub trait FlightApi: Send + Sync {
    /// Autocomplete suggestions for `query`, in server order.
    async fn search_airport(&self, query: &str) -> Result<Vec<AirportOption>, SearchError>;

    /// Itineraries for the outbound leg of `query`. Empty means no results.
    async fn search_flights(&self, query: &SearchQuery) -> Result<Vec<Itinerary>, SearchError>;
}

pub struct SkyScrapperClient {
    client: Client,
    config: ApiConfig,
}

impl SkyScrapperClient {
    pub fn new(config: ApiConfig) -> Result<Self, SearchError> {
        Self::with_builder(Client::builder(), config)
    }

    fn with_builder(builder: ClientBuilder, config: ApiConfig) -> Result<Self, SearchError> {
        let client = builder
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        if config.key.is_empty() {
            warn!("No API key configured; requests will be rejected upstream.");
        }
        Ok(Self { client, config })
    }

    fn get(&self, url: String) -> RequestBuilder {
        self.client
            .get(url)
            .header("X-RapidAPI-Key", &self.config.key)
            .header("X-RapidAPI-Host", &self.config.host)
    }
}

#[async_trait]
impl FlightApi for SkyScrapperClient {
    async fn search_airport(&self, query: &str) -> Result<Vec<AirportOption>, SearchError> {
        let url = format!("{}/searchAirport", self.config.airports_base_url);
        let res: AirportResponse = fetch_json(self.get(url).query(&airport_params(query))).await?;

        Ok(res.data.into_iter().map(AirportOption::from).collect())
    }

    async fn search_flights(&self, query: &SearchQuery) -> Result<Vec<Itinerary>, SearchError> {
        let url = format!("{}/searchFlights", self.config.flights_base_url);
        let res: SearchResponse = fetch_json(self.get(url).query(&search_params(query))).await?;
        itineraries_from(res)
    }
}

pub fn airport_params(query: &str) -> Vec<(&'static str, String)> {
    vec![("query", query.to_string()), ("locale", LOCALE.to_string())]
}

/// Query string for `searchFlights`. Only the outbound date is sent; the
/// endpoint prices one-way legs, so `return_date` never goes on the wire.
pub fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    vec![
        ("originSkyId", query.origin_sky_id.clone()),
        ("destinationSkyId", query.destination_sky_id.clone()),
        ("originEntityId", query.origin_entity_id.clone()),
        ("destinationEntityId", query.destination_entity_id.clone()),
        ("date", query.departure_date.clone()),
        ("cabinClass", CABIN_CLASS.to_string()),
        ("adults", ADULTS.to_string()),
        ("sortBy", SORT_BY.to_string()),
        ("currency", CURRENCY.to_string()),
        ("market", MARKET.to_string()),
        ("countryCode", COUNTRY_CODE.to_string()),
    ]
}

async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, SearchError> {
    let res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(SearchError::Upstream(format!(
            "Request failed with status code {}",
            status.as_u16()
        )));
    }
    Ok(res.json::<T>().await?)
}

/// Applies the search endpoint's response contract.
///
/// An explicit `status: false` is an error carrying the server message. A
/// body without `data.itineraries` is treated the same as an empty result.
pub fn itineraries_from(res: SearchResponse) -> Result<Vec<Itinerary>, SearchError> {
    if res.status == Some(false) {
        return Err(SearchError::Upstream(
            res.message_text()
                .unwrap_or_else(|| "Unknown API error".to_string()),
        ));
    }

    let itineraries = res
        .data
        .and_then(|d| d.itineraries)
        .unwrap_or_default();
    debug!("Search returned {} itineraries", itineraries.len());
    Ok(itineraries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripType;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn parse(body: serde_json::Value) -> Result<Vec<Itinerary>, SearchError> {
        itineraries_from(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn status_false_surfaces_server_message() {
        let err = parse(json!({ "status": false, "message": "Invalid market" })).unwrap_err();
        assert!(matches!(err, SearchError::Upstream(ref m) if m == "Invalid market"));
    }

    #[test]
    fn status_false_without_message_is_generic() {
        let err = parse(json!({ "status": false })).unwrap_err();
        assert_eq!(err.user_message(), "Unknown API error");
    }

    #[test]
    fn structured_message_is_stringified() {
        let err = parse(json!({ "status": false, "message": [{ "date": "in the past" }] }))
            .unwrap_err();
        assert_eq!(err.user_message(), r#"[{"date":"in the past"}]"#);
    }

    #[test]
    fn missing_itineraries_is_empty_not_error() {
        assert!(parse(json!({ "status": true, "data": {} })).unwrap().is_empty());
        assert!(parse(json!({ "status": true })).unwrap().is_empty());
        assert!(parse(json!({})).unwrap().is_empty());
    }

    #[test]
    fn itineraries_preserve_server_order() {
        let flights = parse(json!({
            "status": true,
            "data": { "itineraries": [
                { "id": "a", "price": { "raw": 250.0, "formatted": "$250" }, "legs": [] },
                { "id": "b", "price": { "raw": 180.0, "formatted": "$180" }, "legs": [] }
            ]}
        }))
        .unwrap();
        let ids: Vec<_> = flights.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(SkyScrapperClient::new(ApiConfig::default()).is_ok());
    }

    fn roundtrip_query() -> SearchQuery {
        let jfk = AirportOption {
            label: "New York John F. Kennedy".into(),
            sky_id: "JFK".into(),
            entity_id: "95565058".into(),
        };
        let lax = AirportOption {
            label: "Los Angeles International".into(),
            sky_id: "LAX".into(),
            entity_id: "95673635".into(),
        };
        SearchQuery::new(&jfk, &lax, "2024-06-01", Some("2024-06-08"), TripType::Roundtrip)
    }

    /// Answers one request with `status_line` and hands back the raw request head.
    async fn serve_once(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (base_url, handle)
    }

    fn client_for(base_url: &str) -> SkyScrapperClient {
        // A proxy from the environment would never reach the local listener.
        let config = ApiConfig {
            key: "test-key".into(),
            host: "sky-scrapper.p.rapidapi.com".into(),
            flights_base_url: base_url.to_string(),
            airports_base_url: base_url.to_string(),
            timeout_seconds: 5,
        };
        SkyScrapperClient::with_builder(Client::builder().no_proxy(), config).unwrap()
    }

    #[test]
    fn search_params_are_fixed_and_outbound_only() {
        let params = search_params(&roundtrip_query());
        let expected: Vec<(&str, String)> = [
            ("originSkyId", "JFK"),
            ("destinationSkyId", "LAX"),
            ("originEntityId", "95565058"),
            ("destinationEntityId", "95673635"),
            ("date", "2024-06-01"),
            ("cabinClass", "economy"),
            ("adults", "1"),
            ("sortBy", "best"),
            ("currency", "USD"),
            ("market", "en-US"),
            ("countryCode", "US"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
        assert_eq!(params, expected);
        assert!(params.iter().all(|(k, _)| *k != "returnDate"));
    }

    #[test]
    fn airport_params_carry_locale() {
        assert_eq!(
            airport_params("new york"),
            [("query", "new york".to_string()), ("locale", "en-US".to_string())]
        );
    }

    #[tokio::test]
    async fn flight_search_sends_headers_and_maps_server_error() {
        let (base_url, server) = serve_once("500 Internal Server Error").await;
        let client = client_for(&base_url);

        let err = client.search_flights(&roundtrip_query()).await.unwrap_err();
        assert!(
            matches!(err, SearchError::Upstream(ref m) if m == "Request failed with status code 500"),
            "{err:?}"
        );

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /searchflights?"), "{request}");
        for pair in [
            "originskyid=jfk",
            "destinationskyid=lax",
            "date=2024-06-01",
            "cabinclass=economy",
            "adults=1",
            "sortby=best",
            "currency=usd",
            "market=en-us",
            "countrycode=us",
        ] {
            assert!(request.contains(pair), "missing {pair} in {request}");
        }
        assert!(!request.contains("returndate"));
        assert!(request.contains("x-rapidapi-key: test-key"));
        assert!(request.contains("x-rapidapi-host: sky-scrapper.p.rapidapi.com"));
    }

    #[tokio::test]
    async fn airport_lookup_maps_not_found() {
        let (base_url, server) = serve_once("404 Not Found").await;
        let client = client_for(&base_url);

        let err = client.search_airport("jfk").await.unwrap_err();
        assert_eq!(err.user_message(), "Request failed with status code 404");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /searchAirport?query=jfk&locale=en-US "), "{request}");
        assert!(request.to_lowercase().contains("x-rapidapi-key: test-key"));
    }
}
