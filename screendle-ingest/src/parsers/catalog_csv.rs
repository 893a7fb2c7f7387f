//! Movie catalog CSV export.
//!
//! Header row required; columns are matched by name, case-insensitively:
//!   id,tmdb_id,title,imdb_rating
//! `tmdb_id` is mandatory. `id` defaults to `tmdb_id`. Missing or "N/A"
//! ratings are kept as unrated.

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use screendle_core::CandidateMovie;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::types::ParsedRows;

struct Columns {
    id: Option<usize>,
    tmdb_id: usize,
    title: Option<usize>,
    rating: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let Some(tmdb_id) = find(&["tmdb_id", "tmdbid", "external_id"]) else {
            bail!("catalog CSV has no tmdb_id column (headers: {:?})", headers.iter().collect::<Vec<_>>());
        };
        Ok(Self {
            id: find(&["id", "catalog_id"]),
            tmdb_id,
            title: find(&["title"]),
            rating: find(&["imdb_rating", "rating"]),
        })
    }
}

pub(crate) fn parse_rating(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("n/a") {
        return None;
    }
    raw.parse::<f64>().ok().filter(|r| r.is_finite())
}

fn parse_reader<R: Read>(rdr: R) -> Result<ParsedRows<CandidateMovie>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let cols = Columns::from_headers(rdr.headers().context("reading CSV header")?)?;
    let mut out = ParsedRows::default();

    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.with_context(|| format!("reading CSV row {row}"))?;

        let Some(tmdb_id) = record.get(cols.tmdb_id).and_then(|s| s.parse::<i64>().ok()) else {
            debug!(row, "skipping catalog row without a numeric tmdb_id");
            out.skip(row, "missing or non-numeric tmdb_id");
            continue;
        };

        let catalog_id = cols
            .id
            .and_then(|c| record.get(c))
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(tmdb_id);
        let title = cols.title.and_then(|c| record.get(c)).unwrap_or("").to_string();
        let rating = cols.rating.and_then(|c| record.get(c)).and_then(parse_rating);

        out.records.push(CandidateMovie {
            catalog_id,
            external_id: tmdb_id,
            title,
            rating,
        });
    }

    Ok(out)
}

/// Parse a catalog CSV file.
pub fn parse_catalog_csv(path: impl AsRef<Path>) -> Result<ParsedRows<CandidateMovie>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_reader(file).with_context(|| format!("parsing {}", path.display()))
}

/// Parse catalog CSV text.
pub fn parse_catalog_csv_str(text: &str) -> Result<ParsedRows<CandidateMovie>> {
    parse_reader(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_catalog() {
        let text = "\
id,tmdb_id,title,imdb_rating
1,155,The Dark Knight,9.0
2,238,The Godfather,9.2
3,550,\"Fight Club, The\",N/A
4,680,Pulp Fiction,
";
        let parsed = parse_catalog_csv_str(text).unwrap();
        assert_eq!(parsed.records.len(), 4);
        assert!(parsed.skipped.is_empty());

        let godfather = &parsed.records[1];
        assert_eq!(godfather.catalog_id, 2);
        assert_eq!(godfather.external_id, 238);
        assert_eq!(godfather.rating, Some(9.2));

        assert_eq!(parsed.records[2].title, "Fight Club, The");
        assert_eq!(parsed.records[2].rating, None);
        assert_eq!(parsed.records[3].rating, None);
        assert!(!parsed.records[3].is_eligible());
    }

    #[test]
    fn test_columns_by_name_and_default_id() {
        let text = "IMDB_RATING,Title,TMDB_ID\n8.5,Se7en,807\n7.1,Broken,abc\n";
        let parsed = parse_catalog_csv_str(text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].catalog_id, 807);
        assert_eq!(parsed.records[0].title, "Se7en");
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].row, 2);
    }

    #[test]
    fn test_missing_tmdb_column_is_an_error() {
        assert!(parse_catalog_csv_str("id,title\n1,Alien\n").is_err());
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(" 7.4 "), Some(7.4));
        assert_eq!(parse_rating("N/A"), None);
        assert_eq!(parse_rating("NaN"), None);
        assert_eq!(parse_rating(""), None);
    }
}
