use crate::error::{NormalizeError, Result};

/// An in-memory table: a named header plus rows of string cells.
///
/// Every row has exactly `columns.len()` cells; constructors and stage
/// functions keep that shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Index of `column`, or a schema error naming the table.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| {
            NormalizeError::Schema(format!(
                "table '{}' has no column '{}' (columns: {})",
                self.name,
                column,
                self.columns.join(", ")
            ))
        })
    }

    /// Iterate one column's cells in row order.
    pub fn column_values<'a>(&'a self, column: &str) -> Result<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(NormalizeError::Schema(format!(
                "row with {} cells pushed into '{}' which has {} columns",
                row.len(),
                self.name,
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::with_rows(
            "sample",
            vec!["id".into(), "name".into()],
            vec![
                vec!["1".into(), "a".into()],
                vec!["2".into(), "b".into()],
            ],
        )
    }

    #[test]
    fn column_lookup_and_values() {
        let table = sample();
        assert_eq!(table.column_index("name"), Some(1));
        let names: Vec<&str> = table.column_values("name").unwrap().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn missing_column_is_schema_error() {
        let table = sample();
        let err = table.require_column("nope").unwrap_err();
        assert!(matches!(err, NormalizeError::Schema(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut table = sample();
        assert!(table.push_row(vec!["3".into()]).is_err());
        assert!(table.push_row(vec!["3".into(), "c".into()]).is_ok());
        assert_eq!(table.len(), 3);
    }
}
