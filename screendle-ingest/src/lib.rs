//! screendle-ingest: catalog and schedule exports into scheduler types.

pub mod types;
pub mod parsers;

pub use types::{ParsedRows, RowIssue};
pub use parsers::catalog_csv::{parse_catalog_csv, parse_catalog_csv_str};
pub use parsers::d1_export::{classic_from_rows, extract_d1_rows, movies_from_rows, scales_from_rows};
