//! Table rendering for formatted output.

use console::measure_text_width;

use crate::package::PackageRecord;
use crate::scan::ScanReport;
use crate::update::{Outcome, UpdateOutcomeSet};

/// A box-drawn table.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    column_widths: Vec<usize>,
}

impl Table {
    /// Create a new table with the given headers.
    pub fn new(headers: Vec<&str>) -> Self {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let column_widths = headers.iter().map(|h| measure_text_width(h)).collect();

        Self {
            headers,
            rows: Vec::new(),
            column_widths,
        }
    }

    /// Add a row to the table.
    pub fn add_row<S: AsRef<str>>(&mut self, row: &[S]) {
        let row: Vec<String> = row.iter().map(|s| s.as_ref().to_string()).collect();

        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = self.column_widths.get_mut(i) {
                *width = (*width).max(measure_text_width(cell));
            }
        }

        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the table as a string.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(self.render_border('┌', '┬', '┐'));
        lines.push(self.render_row(&self.headers));
        lines.push(self.render_border('├', '┼', '┤'));
        for row in &self.rows {
            lines.push(self.render_row(row));
        }
        lines.push(self.render_border('└', '┴', '┘'));
        lines.join("\n")
    }

    fn render_border(&self, left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = self
            .column_widths
            .iter()
            .map(|width| "─".repeat(width + 2))
            .collect();
        format!("{}{}{}", left, segments.join(&mid.to_string()), right)
    }

    fn render_row(&self, row: &[String]) -> String {
        let mut s = String::from("│");

        for (i, width) in self.column_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            // Pad by display width so styled or wide cells still line up.
            let pad = width.saturating_sub(measure_text_width(cell));
            s.push(' ');
            s.push_str(cell);
            s.push_str(&" ".repeat(pad));
            s.push_str(" │");
        }

        s
    }
}

/// Scan results, one row per record.
pub fn package_table(records: &[PackageRecord]) -> Table {
    let mut table = Table::new(vec!["Name", "Id", "Installed", "Available", "Source"]);
    for record in records {
        let source = if record.interactive_required {
            format!("{} (interactive)", record.source)
        } else {
            record.source.to_string()
        };
        table.add_row(&[
            record.name.as_str(),
            record.id.as_str(),
            record.installed_version.as_str(),
            record.available_version.as_str(),
            source.as_str(),
        ]);
    }
    table
}

/// Per-source status from a scan.
pub fn source_table(report: &ScanReport) -> Table {
    let mut table = Table::new(vec!["Source", "Status", "Records"]);
    for adapter in &report.adapters {
        table.add_row(&[
            adapter.name.clone(),
            adapter.status.to_string(),
            adapter.records.to_string(),
        ]);
    }
    table
}

/// Outcome per requested identifier, grouped by bucket.
pub fn outcome_table(outcomes: &UpdateOutcomeSet) -> Table {
    let mut table = Table::new(vec!["Package", "Outcome"]);
    for outcome in Outcome::ALL {
        for id in outcomes.bucket(outcome) {
            table.add_row(&[id.as_str(), outcome.title()]);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Source;

    #[test]
    fn empty_table_still_has_header() {
        let table = Table::new(vec!["A", "B"]);
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);

        let output = table.render();
        assert!(output.contains("A"));
        assert!(output.contains("B"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn columns_widen_to_fit_cells() {
        let mut table = Table::new(vec!["A"]);
        table.add_row(&["longer_value"]);

        let output = table.render();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], format!("┌{}┐", "─".repeat(14)));
        assert_eq!(lines[3], "│ longer_value │");
    }

    #[test]
    fn missing_cells_render_blank() {
        let mut table = Table::new(vec!["A", "B", "C"]);
        table.add_row(&["only", "two"]);

        let output = table.render();
        assert!(output.contains("│ only │ two │   │"));
        assert!(output.contains("┬"));
        assert!(output.contains("┼"));
        assert!(output.contains("┴"));
    }

    #[test]
    fn styled_cells_align_by_display_width() {
        let styled = console::style("ok").green().force_styling(true).to_string();
        let mut table = Table::new(vec!["Status"]);
        table.add_row(&[styled]);

        let output = table.render();
        let widths: Vec<_> = output.lines().map(measure_text_width).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn package_table_marks_interactive_rows() {
        let rows = vec![
            PackageRecord::new("Vendor.App", "App", Source::PrimaryPm)
                .with_installed("1.0")
                .with_available("2.0"),
            PackageRecord::new("Other.Tool", "Tool", Source::PrimaryPm)
                .with_installed("3.0")
                .with_available("3.1")
                .interactive(),
        ];

        let table = package_table(&rows);
        assert_eq!(table.row_count(), 2);
        let output = table.render();
        assert!(output.contains("Vendor.App"));
        assert!(output.contains("winget (interactive)"));
    }

    #[test]
    fn outcome_table_follows_bucket_order() {
        let mut outcomes = UpdateOutcomeSet::new();
        outcomes.record("Broken.App", Outcome::Failed);
        outcomes.record("Vendor.App", Outcome::Updated);

        let output = outcome_table(&outcomes).render();
        let updated = output.find("Vendor.App").unwrap();
        let failed = output.find("Broken.App").unwrap();
        assert!(updated < failed);
    }
}
