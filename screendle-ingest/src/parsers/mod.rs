pub mod catalog_csv;
pub mod d1_export;
