use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::error::{Result, TitanicError};

/// A single row: column name to cell value.
pub type Record = BTreeMap<String, Value>;

/// Binary class labels, one per record.
pub type Labels = Vec<u8>;

/// An ordered sequence of records sharing one column set.
///
/// Serializes as a plain JSON array of objects, which is also the payload
/// shape accepted by the prediction endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Wraps already-built records. Column uniformity is not checked here;
    /// see [`Dataset::validate_uniform`].
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Column names of the first record, in sorted order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.records
            .first()
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if every record carries `name`. An empty dataset has no columns.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.contains_key(name))
    }

    /// All values of one column, in record order.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        self.records.iter().map(|r| r.get(name)).collect()
    }

    /// Checks that every record has exactly the column set of the first one.
    pub fn validate_uniform(&self) -> Result<()> {
        let Some(first) = self.records.first() else {
            return Ok(());
        };
        let expected: BTreeSet<&String> = first.keys().collect();

        for (row, record) in self.records.iter().enumerate().skip(1) {
            let actual: BTreeSet<&String> = record.keys().collect();
            if actual != expected {
                let missing: Vec<&str> = expected
                    .difference(&actual)
                    .map(|s| s.as_str())
                    .collect();
                let extra: Vec<&str> = actual
                    .difference(&expected)
                    .map(|s| s.as_str())
                    .collect();
                return Err(TitanicError::InvalidDataset(format!(
                    "record {row} has a different column set (missing {missing:?}, extra {extra:?})"
                )));
            }
        }
        Ok(())
    }

    /// Removes `label_column` from every record and parses it into 0/1 labels.
    pub fn split_label(&self, label_column: &str) -> Result<(Dataset, Labels)> {
        if !self.has_column(label_column) {
            return Err(TitanicError::MissingColumn {
                columns: vec![label_column.to_string()],
            });
        }

        let mut features = Vec::with_capacity(self.records.len());
        let mut labels = Vec::with_capacity(self.records.len());

        for (row, record) in self.records.iter().enumerate() {
            let mut record = record.clone();
            let value = record.remove(label_column).unwrap_or_default();
            labels.push(parse_label(row, &value)?);
            features.push(record);
        }

        Ok((Dataset::new(features), labels))
    }

    /// A copy holding the records at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        indices.iter().map(|&i| self.records[i].clone()).collect()
    }

    /// A copy of the dataset with `name` dropped from every record.
    /// Records without the column are left unchanged.
    #[must_use]
    pub fn without_column(&self, name: &str) -> Dataset {
        let records = self
            .records
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.remove(name);
                r
            })
            .collect();
        Dataset::new(records)
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn parse_label(row: usize, value: &Value) -> Result<u8> {
    let parsed = match value {
        Value::Number(n) if *n == 0.0 => Some(0),
        Value::Number(n) if *n == 1.0 => Some(1),
        Value::Text(s) => match s.trim() {
            "0" => Some(0),
            "1" => Some(1),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| TitanicError::InvalidLabel {
        row,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn passengers() -> Dataset {
        Dataset::new(vec![
            record(&[
                ("Pclass", 3.into()),
                ("Sex", "male".into()),
                ("Survived", 0.into()),
            ]),
            record(&[
                ("Pclass", 1.into()),
                ("Sex", "female".into()),
                ("Survived", 1.into()),
            ]),
        ])
    }

    #[test]
    fn split_label_removes_column() {
        let (features, labels) = passengers().split_label("Survived").unwrap();
        assert_eq!(labels, vec![0, 1]);
        assert_eq!(features.columns(), vec!["Pclass", "Sex"]);
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn split_label_missing_column() {
        let err = passengers().split_label("Target").unwrap_err();
        assert!(matches!(err, TitanicError::MissingColumn { columns } if columns == ["Target"]));
    }

    #[test]
    fn split_label_rejects_non_binary() {
        let mut ds = passengers();
        ds.push(record(&[
            ("Pclass", 2.into()),
            ("Sex", "male".into()),
            ("Survived", 2.into()),
        ]));
        let err = ds.split_label("Survived").unwrap_err();
        assert!(matches!(err, TitanicError::InvalidLabel { row: 2, .. }));
    }

    #[test]
    fn text_labels_are_accepted() {
        let ds = Dataset::new(vec![
            record(&[("y", "1".into())]),
            record(&[("y", " 0".into())]),
        ]);
        let (_, labels) = ds.split_label("y").unwrap();
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn select_rows_follows_index_order() {
        let ds: Dataset = (0..4i64)
            .map(|i| {
                let mut r = Record::new();
                r.insert("Pclass".into(), i.into());
                r
            })
            .collect();
        let picked = ds.select_rows(&[3, 1, 1]);
        let values: Vec<f64> = picked
            .column("Pclass")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_f64())
            .collect();
        assert_eq!(values, vec![3.0, 1.0, 1.0]);
    }

    #[test]
    fn validate_uniform_detects_ragged_records() {
        let mut ds = passengers();
        assert!(ds.validate_uniform().is_ok());

        ds.push(record(&[("Pclass", 2.into())]));
        let err = ds.validate_uniform().unwrap_err();
        assert!(matches!(err, TitanicError::InvalidDataset(_)));
    }

    #[test]
    fn without_column_drops_label_when_present() {
        let ds = passengers().without_column("Survived");
        assert!(!ds.has_column("Survived"));
        assert!(ds.has_column("Sex"));

        let unchanged = ds.without_column("Survived");
        assert_eq!(unchanged, ds);
    }

    #[test]
    fn deserializes_from_json_array() {
        let ds: Dataset =
            serde_json::from_str(r#"[{"Pclass": 3, "Sex": "male"}, {"Pclass": 1, "Sex": null}]"#)
                .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[1]["Sex"], Value::Null);
        assert_eq!(ds.column("Pclass").unwrap().len(), 2);
    }
}
