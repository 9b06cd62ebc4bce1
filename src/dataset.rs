use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One parsed row: column name to scalar value, in parse order
pub type Row = Map<String, Value>;

/// Rows parsed from the first sheet of an uploaded file
///
/// The column set is taken from the first row. Later rows may omit keys,
/// which is treated as an empty cell. Serializes as a plain JSON array of
/// objects so its fingerprint matches what the parser produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabularDataset {
    rows: Vec<Row>,
}

impl TabularDataset {
    /// Wraps already parsed rows
    ///
    /// # Arguments
    /// * `rows` - Rows in sheet order
    ///
    /// # Examples
    /// ```
    /// use sheet_summary::dataset::TabularDataset;
    /// use serde_json::json;
    ///
    /// let rows = vec![json!({"Name": "Alice", "Age": 30}).as_object().unwrap().clone()];
    /// let dataset = TabularDataset::new(rows);
    /// assert_eq!(dataset.columns(), vec!["Name", "Age"]);
    /// ```
    pub fn new(rows: Vec<Row>) -> Self {
        TabularDataset { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first row, in order
    ///
    /// # Returns
    /// * `Vec<&str>` - Empty when the dataset has no rows
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Raw value of a cell, `None` when the row or key is absent
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Display text of a cell
    ///
    /// Strings are rendered without quotes, numbers and booleans through their
    /// usual formatting. Null, nested values and missing cells render as an
    /// empty string.
    pub fn cell_text(&self, row: usize, column: &str) -> String {
        match self.value(row, column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }
}

impl From<Vec<Row>> for TabularDataset {
    fn from(rows: Vec<Row>) -> Self {
        TabularDataset::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(value: Value) -> TabularDataset {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn columns_follow_first_row_order() {
        let d = dataset(json!([
            {"Zeta": 1, "Alpha": 2, "Mid": 3},
            {"Alpha": 5}
        ]));
        assert_eq!(d.columns(), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn missing_and_null_cells_render_empty() {
        let d = dataset(json!([
            {"A": "x", "B": null},
            {"A": "y"}
        ]));
        assert_eq!(d.cell_text(0, "B"), "");
        assert_eq!(d.cell_text(1, "B"), "");
        assert_eq!(d.cell_text(5, "A"), "");
    }

    #[test]
    fn scalars_render_like_display() {
        let d = dataset(json!([{"n": 0, "f": 2.5, "b": false, "s": "text"}]));
        assert_eq!(d.cell_text(0, "n"), "0");
        assert_eq!(d.cell_text(0, "f"), "2.5");
        assert_eq!(d.cell_text(0, "b"), "false");
        assert_eq!(d.cell_text(0, "s"), "text");
    }

    #[test]
    fn serializes_as_plain_array() {
        let d = dataset(json!([{"A": 1}]));
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"[{"A":1}]"#);
        assert!(TabularDataset::default().columns().is_empty());
    }
}
