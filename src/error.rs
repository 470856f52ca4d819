use thiserror::Error;

pub const FETCH_FAILED: &str = "Failed to fetch flights";
pub const NO_FLIGHTS: &str = "No flights found";

#[derive(Error, Debug)]
pub enum SearchError {
    /// Required form input missing or malformed. No request was made.
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status or an explicit `status: false` body.
    #[error("{0}")]
    Upstream(String),

    #[error("No flights found")]
    EmptyResult,

    #[error("Discarding malformed stored value for '{key}': {source}")]
    PersistenceParse {
        key: String,
        source: serde_json::Error,
    },
}

impl SearchError {
    /// Text shown in the results area for a failed search.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Validation(msg) | SearchError::Upstream(msg) => msg.clone(),
            SearchError::EmptyResult => NO_FLIGHTS.to_string(),
            SearchError::Network(_) | SearchError::PersistenceParse { .. } => {
                FETCH_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages() {
        assert_eq!(
            SearchError::Upstream("Invalid market".into()).user_message(),
            "Invalid market"
        );
        assert_eq!(SearchError::EmptyResult.user_message(), "No flights found");
        assert_eq!(
            SearchError::Validation("All fields are required".into()).to_string(),
            "All fields are required"
        );
    }
}
