use crate::dataset::TabularDataset;

/// Summary returned for a dataset with no rows
pub const NO_DATA_SUMMARY: &str = "No data available";

/// Number of rows shown in the preview section
pub const PREVIEW_ROWS: usize = 5;

/// Build a plain-text summary of a dataset without any external tooling
///
/// The summary lists the row count, the column count and names taken from
/// the first row, and a preview of the first rows with values separated by
/// `" | "`. Missing cells render as empty strings.
///
/// # Arguments
/// * `dataset` - Parsed rows to summarize
///
/// # Returns
/// * `String` - Multi-line summary, or [`NO_DATA_SUMMARY`] for zero rows
///
/// # Examples
/// ```
/// use sheet_summary::dataset::TabularDataset;
/// use sheet_summary::local::basic_summary;
///
/// let dataset: TabularDataset =
///     serde_json::from_str(r#"[{"Name": "Alice", "Age": 30}]"#).unwrap();
/// let summary = basic_summary(&dataset);
/// assert!(summary.starts_with("Number of rows: 1\nNumber of columns: 2"));
/// ```
pub fn basic_summary(dataset: &TabularDataset) -> String {
    if dataset.is_empty() {
        return NO_DATA_SUMMARY.to_string();
    }

    let columns = dataset.columns();
    let mut lines = Vec::with_capacity(5 + PREVIEW_ROWS);

    lines.push(format!("Number of rows: {}", dataset.len()));
    lines.push(format!("Number of columns: {}", columns.len()));
    lines.push("Columns:".to_string());
    lines.push(columns.join(", "));

    lines.push(format!("First {} rows:", PREVIEW_ROWS));
    for index in 0..dataset.len().min(PREVIEW_ROWS) {
        let values: Vec<String> = columns
            .iter()
            .map(|column| dataset.cell_text(index, column))
            .collect();
        lines.push(format!("{}: {}", index + 1, values.join(" | ")));
    }

    lines.join("\n")
}
