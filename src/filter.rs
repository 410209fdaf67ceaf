//! Color filtering of fetched test records.

use crate::model::TestRecord;

/// Keeps the records whose color equals one of `wanted`, ignoring case.
///
/// Order of `records` is preserved. An empty `wanted` list matches nothing.
pub fn filter_by_colors<S: AsRef<str>>(records: &[TestRecord], wanted: &[S]) -> Vec<TestRecord> {
    let wanted: Vec<String> = wanted.iter().map(|c| c.as_ref().to_lowercase()).collect();

    records
        .iter()
        .filter(|record| {
            let color = record.color.to_lowercase();
            wanted.iter().any(|w| *w == color)
        })
        .cloned()
        .collect()
}

/// Splits a comma-separated color list, trimming blanks.
pub fn parse_color_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
