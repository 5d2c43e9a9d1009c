//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_table: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_table {
                OutputFormat::Tsv
            } else {
                OutputFormat::Text
            }
        }
        other => other,
    }
}

/// Serialize `value` as JSON or YAML; `None` for the tabular and text formats
pub fn serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).into_diagnostic().map(Some),
        OutputFormat::Yaml => serde_yml::to_string(value).into_diagnostic().map(Some),
        _ => Ok(None),
    }
}

/// Rows of cells with a header, rendered per output format
#[derive(Debug, Clone, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Boxed text table
    pub fn to_text(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.header.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        builder.build().with(Style::rounded()).to_string()
    }

    /// Delimited table with a header line
    pub fn to_delimited(&self, delimiter: u8) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());
        writer.write_record(&self.header).into_diagnostic()?;
        for row in &self.rows {
            writer.write_record(row).into_diagnostic()?;
        }
        let bytes = writer.into_inner().into_diagnostic()?;
        String::from_utf8(bytes).into_diagnostic()
    }

    /// Render for a tabular format; JSON and YAML are handled by [`serialized`]
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match effective_format(format, true) {
            OutputFormat::Csv => self.to_delimited(b','),
            OutputFormat::Tsv => self.to_delimited(b'\t'),
            _ => Ok(self.to_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut table = Table::new(["name", "ppk"]);
        table.push_row(["cavity, 1", "1.330"]);
        table.push_row(["cavity 2", "0.870"]);
        table
    }

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Tsv);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Text);
        assert_eq!(effective_format(OutputFormat::Json, true), OutputFormat::Json);
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = sample_table().render(OutputFormat::Csv).unwrap();
        assert_eq!(csv, "name,ppk\n\"cavity, 1\",1.330\ncavity 2,0.870\n");
    }

    #[test]
    fn test_tsv_is_default_for_tables() {
        let tsv = sample_table().render(OutputFormat::Auto).unwrap();
        assert!(tsv.starts_with("name\tppk\n"));
    }

    #[test]
    fn test_text_table_contains_cells() {
        let text = sample_table().render(OutputFormat::Text).unwrap();
        assert!(text.contains("cavity 2"));
        assert!(text.contains("0.870"));
    }

    #[test]
    fn test_serialized_skips_tabular_formats() {
        assert!(serialized(&[1, 2], OutputFormat::Csv).unwrap().is_none());
        let json = serialized(&[1, 2], OutputFormat::Json).unwrap().unwrap();
        assert!(json.contains('1'));
    }
}
