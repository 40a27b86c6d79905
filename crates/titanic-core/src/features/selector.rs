//! Column selection shared by training and inference.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TitanicError};
use crate::types::{Dataset, Value};

/// The selected feature columns of a dataset, in selector order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl FeatureFrame {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the column at position `idx`, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[idx])
    }
}

/// Selects a fixed, ordered list of columns from a dataset.
///
/// Holds no fitted state, so the same instance guarantees identical feature
/// layout at fit and predict time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelector {
    columns: Vec<String>,
}

impl ColumnSelector {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Extracts the configured columns from every record.
    ///
    /// Fails with [`TitanicError::MissingColumn`] naming every absent column
    /// if any record lacks one; no partial frame is returned.
    pub fn transform(&self, dataset: &Dataset) -> Result<FeatureFrame> {
        let mut missing: Vec<String> = Vec::new();
        for record in dataset.records() {
            for column in &self.columns {
                if !record.contains_key(column) && !missing.contains(column) {
                    missing.push(column.clone());
                }
            }
        }
        if !missing.is_empty() {
            // Keep selector order in the report.
            missing.sort_by_key(|m| self.columns.iter().position(|c| c == m));
            return Err(TitanicError::MissingColumn { columns: missing });
        }

        let rows = dataset
            .records()
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(FeatureFrame {
            columns: self.columns.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    fn dataset() -> Dataset {
        let mut a = Record::new();
        a.insert("Sex".into(), "male".into());
        a.insert("Pclass".into(), 3.into());
        a.insert("Age".into(), 22.into());
        let mut b = Record::new();
        b.insert("Sex".into(), "female".into());
        b.insert("Pclass".into(), 1.into());
        b.insert("Age".into(), Value::Null);
        Dataset::new(vec![a, b])
    }

    #[test]
    fn transform_keeps_selector_order() {
        let selector = ColumnSelector::new(["Sex", "Pclass"]);
        let frame = selector.transform(&dataset()).unwrap();

        assert_eq!(frame.columns(), ["Sex", "Pclass"]);
        assert_eq!(frame.rows()[0], vec![Value::from("male"), Value::Number(3.0)]);
        assert_eq!(frame.rows()[1], vec![Value::from("female"), Value::Number(1.0)]);
    }

    #[test]
    fn transform_reports_all_missing_columns() {
        let selector = ColumnSelector::new(["Fare", "Sex", "Embarked"]);
        let err = selector.transform(&dataset()).unwrap_err();

        match err {
            TitanicError::MissingColumn { columns } => {
                assert_eq!(columns, vec!["Fare".to_string(), "Embarked".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transform_empty_dataset_yields_empty_frame() {
        let selector = ColumnSelector::new(["Sex"]);
        let frame = selector.transform(&Dataset::default()).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.columns(), ["Sex"]);
    }

    #[test]
    fn column_values_iterates_by_position() {
        let frame = ColumnSelector::new(["Pclass"]).transform(&dataset()).unwrap();
        let values: Vec<f64> = frame.column_values(0).filter_map(Value::as_f64).collect();
        assert_eq!(values, vec![3.0, 1.0]);
    }
}
