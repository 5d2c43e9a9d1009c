//! Sample containers - single vectors and ordered named groups
//!
//! Batch operations take a [`Sample`] and match on it instead of guessing
//! the shape of the data at runtime.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::core::error::{Result, StatsError};

/// One sample or an ordered collection of named samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sample {
    /// A single vector of observations
    Single(Vec<f64>),
    /// Named samples (cavities, lots, ...) in insertion order
    Grouped(GroupedSample),
}

impl From<Vec<f64>> for Sample {
    fn from(values: Vec<f64>) -> Self {
        Sample::Single(values)
    }
}

impl From<GroupedSample> for Sample {
    fn from(groups: GroupedSample) -> Self {
        Sample::Grouped(groups)
    }
}

/// Ordered mapping from group name to observations
///
/// Names are unique; inserting an existing name appends to that group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedSample {
    groups: Vec<(String, Vec<f64>)>,
}

impl GroupedSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to a group, creating it at the end if new
    pub fn extend_group(&mut self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) {
        let name = name.into();
        match self.groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(values),
            None => self.groups.push((name, values.into_iter().collect())),
        }
    }

    /// Append a single observation to a group
    pub fn push(&mut self, name: &str, value: f64) {
        match self.groups.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.push(value),
            None => self.groups.push((name.to_string(), vec![value])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.groups
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.groups.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All observations concatenated in group order
    pub fn flatten(&self) -> Vec<f64> {
        self.groups.iter().flat_map(|(_, v)| v.iter().copied()).collect()
    }

    /// Build from a wide CSV: every column is a group, empty cells are skipped
    pub fn from_wide_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut grouped = GroupedSample::new();
        for name in &headers {
            if grouped.get(name).is_some() {
                return Err(StatsError::config(format!("duplicate column '{}'", name)));
            }
            grouped.extend_group(name.clone(), std::iter::empty());
        }

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for (col, cell) in record.iter().enumerate() {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let value = parse_cell(cell, row + 2, &headers[col])?;
                grouped.groups[col].1.push(value);
            }
        }

        Ok(grouped)
    }
}

/// Long-form table: one observation per row, category and value in named columns
#[derive(Debug, Clone)]
pub struct LongTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LongTable {
    /// Read a headed CSV
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn column_index(&self, key: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == key)
            .ok_or_else(|| StatsError::config(format!("column '{}' not found", key)))
    }

    /// Values of one numeric column
    pub fn column(&self, key: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(key)?;
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(idx).is_some_and(|c| !c.is_empty()))
            .map(|(i, row)| parse_cell(&row[idx], i + 2, key))
            .collect()
    }

    /// Group `value_key` by `category_key`, categories in first-appearance order
    pub fn group_by(&self, category_key: &str, value_key: &str) -> Result<GroupedSample> {
        let cat_idx = self.column_index(category_key)?;
        let val_idx = self.column_index(value_key)?;

        let mut grouped = GroupedSample::new();
        for (i, row) in self.rows.iter().enumerate() {
            let (Some(category), Some(cell)) = (row.get(cat_idx), row.get(val_idx)) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            grouped.push(category, parse_cell(cell, i + 2, value_key)?);
        }
        Ok(grouped)
    }
}

fn parse_cell(cell: &str, line: usize, column: &str) -> Result<f64> {
    cell.parse::<f64>().map_err(|_| {
        StatsError::config(format!(
            "line {}: '{}' in column '{}' is not a number",
            line, cell, column
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_preserves_insertion_order() {
        let mut g = GroupedSample::new();
        g.extend_group("zeta", [1.0, 2.0]);
        g.extend_group("alpha", [3.0]);
        g.push("zeta", 4.0);

        let names: Vec<&str> = g.names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(g.get("zeta").unwrap(), &[1.0, 2.0, 4.0]);
        assert_eq!(g.flatten(), vec![1.0, 2.0, 4.0, 3.0]);
    }

    #[test]
    fn test_wide_csv_ragged_columns() {
        let data = "cav1,cav2\n1.0,2.0\n1.5,\n";
        let g = GroupedSample::from_wide_csv(data.as_bytes()).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.get("cav1").unwrap(), &[1.0, 1.5]);
        assert_eq!(g.get("cav2").unwrap(), &[2.0]);
    }

    #[test]
    fn test_wide_csv_bad_number() {
        let data = "a\n1.0\nabc\n";
        let err = GroupedSample::from_wide_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_long_table_group_by() {
        let data = "variable,value\nB,1.0\nA,2.0\nB,3.0\n";
        let table = LongTable::from_csv(data.as_bytes()).unwrap();
        let g = table.group_by("variable", "value").unwrap();
        let names: Vec<&str> = g.names().collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(g.get("B").unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn test_long_table_missing_column() {
        let table = LongTable::from_csv("a,b\n1,2\n".as_bytes()).unwrap();
        assert!(table.group_by("cat", "b").unwrap_err().is_configuration());
        assert_eq!(table.column("b").unwrap(), vec![2.0]);
    }
}
