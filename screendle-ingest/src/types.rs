use serde::{Deserialize, Serialize};

/// A row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based data row (header excluded).
    pub row: usize,
    pub reason: String,
}

/// Parser output: the records that made it plus why the rest did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRows<T> {
    pub records: Vec<T>,
    pub skipped: Vec<RowIssue>,
}

impl<T> Default for ParsedRows<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> ParsedRows<T> {
    pub fn skip(&mut self, row: usize, reason: impl Into<String>) {
        self.skipped.push(RowIssue {
            row,
            reason: reason.into(),
        });
    }
}
