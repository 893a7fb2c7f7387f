//! Candidate movies and the eligible pool.

use serde::{Deserialize, Serialize};

/// Stable catalog key (the TMDB id).
pub type ExternalId = i64;

/// Immutable catalog entry as seen by the schedulers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMovie {
    /// Persistent row id in the catalog; the pool is ordered by it.
    pub catalog_id: i64,
    pub external_id: ExternalId,
    #[serde(default)]
    pub title: String,
    /// Absent or non-positive means "not rated yet".
    #[serde(default)]
    pub rating: Option<f64>,
}

impl CandidateMovie {
    pub fn new(external_id: ExternalId, rating: f64) -> Self {
        Self {
            catalog_id: external_id,
            external_id,
            title: String::new(),
            rating: Some(rating),
        }
    }

    pub fn with_catalog_id(mut self, catalog_id: i64) -> Self {
        self.catalog_id = catalog_id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_eligible(&self) -> bool {
        self.rating.is_some_and(|r| r > 0.0)
    }

    /// Rating as used by the gap heuristic; 0 when absent.
    pub fn rating_value(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}

/// Rated movies in a reproducible order: ascending catalog id, then external id.
///
/// Shuffles depend on input order, so every caller builds its pool here.
pub fn eligible_pool(catalog: &[CandidateMovie]) -> Vec<CandidateMovie> {
    let mut pool: Vec<CandidateMovie> = catalog.iter().filter(|m| m.is_eligible()).cloned().collect();
    pool.sort_by_key(|m| (m.catalog_id, m.external_id));
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility() {
        assert!(CandidateMovie::new(1, 7.5).is_eligible());
        assert!(!CandidateMovie::new(2, 0.0).is_eligible());
        assert!(!CandidateMovie::new(3, -1.0).is_eligible());
        assert!(!CandidateMovie::new(4, f64::NAN).is_eligible());

        let mut unrated = CandidateMovie::new(5, 1.0);
        unrated.rating = None;
        assert!(!unrated.is_eligible());
        assert_eq!(unrated.rating_value(), 0.0);
    }

    #[test]
    fn test_pool_is_filtered_and_sorted() {
        let catalog = vec![
            CandidateMovie::new(550, 8.8).with_catalog_id(3),
            CandidateMovie::new(155, 9.0).with_catalog_id(1),
            CandidateMovie::new(13, 0.0).with_catalog_id(2),
            CandidateMovie::new(680, 8.9).with_catalog_id(2),
        ];
        let ids: Vec<_> = eligible_pool(&catalog).iter().map(|m| m.external_id).collect();
        assert_eq!(ids, vec![155, 680, 550]);
    }

    #[test]
    fn test_json_defaults_for_missing_fields() {
        let movie: CandidateMovie = serde_json::from_str(r#"{"catalog_id":4,"external_id":550}"#).unwrap();
        assert_eq!(movie.title, "");
        assert_eq!(movie.rating, None);
        assert!(!movie.is_eligible());

        let rated = CandidateMovie::new(155, 9.0).with_title("The Dark Knight");
        let back: CandidateMovie = serde_json::from_str(&serde_json::to_string(&rated).unwrap()).unwrap();
        assert_eq!(back, rated);
    }
}
