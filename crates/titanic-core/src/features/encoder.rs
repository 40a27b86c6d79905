//! Imputation and encoding of selected columns into a numeric matrix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::selector::FeatureFrame;
use crate::error::{Result, TitanicError};
use crate::types::Value;

/// How a single selected column is turned into numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnEncoding {
    /// Passed through; nulls replaced by the most frequent value.
    Numeric { fill: f64 },
    /// One-hot encoded with the first category dropped; nulls replaced by
    /// the most frequent category.
    Categorical { categories: Vec<String>, fill: String },
}

impl ColumnEncoding {
    fn width(&self) -> usize {
        match self {
            Self::Numeric { .. } => 1,
            Self::Categorical { categories, .. } => categories.len().saturating_sub(1),
        }
    }
}

/// Per-column encoders learned from training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<(String, ColumnEncoding)>,
}

impl FeatureEncoder {
    /// Learns an encoding for every column of `frame`.
    ///
    /// A column is numeric when all its non-null values are numbers,
    /// categorical otherwise. Entirely null columns are rejected.
    pub fn fit(frame: &FeatureFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(frame.columns().len());

        for (idx, name) in frame.columns().iter().enumerate() {
            let present: Vec<&Value> = frame.column_values(idx).filter(|v| !v.is_null()).collect();
            if present.is_empty() {
                return Err(TitanicError::InvalidTrainingData(format!(
                    "column {name:?} has no non-null values"
                )));
            }

            let encoding = if present.iter().all(|v| v.as_f64().is_some()) {
                let values: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
                ColumnEncoding::Numeric {
                    fill: most_frequent_number(values),
                }
            } else {
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for v in &present {
                    *counts.entry(v.to_string()).or_default() += 1;
                }
                let fill = most_frequent_key(&counts);
                ColumnEncoding::Categorical {
                    categories: counts.into_keys().collect(),
                    fill,
                }
            };

            tracing::debug!(column = %name, ?encoding, "fitted column encoding");
            columns.push((name.clone(), encoding));
        }

        Ok(Self { columns })
    }

    /// Number of numeric features produced per row.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.columns.iter().map(|(_, e)| e.width()).sum()
    }

    /// Names of the produced features, e.g. `Pclass` or `Sex=male`.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features());
        for (name, encoding) in &self.columns {
            match encoding {
                ColumnEncoding::Numeric { .. } => names.push(name.clone()),
                ColumnEncoding::Categorical { categories, .. } => {
                    names.extend(categories.iter().skip(1).map(|c| format!("{name}={c}")));
                }
            }
        }
        names
    }

    #[must_use]
    pub fn encodings(&self) -> &[(String, ColumnEncoding)] {
        &self.columns
    }

    /// Encodes every row of `frame`. The frame must carry the same columns,
    /// in the same order, as the one the encoder was fitted on.
    pub fn transform(&self, frame: &FeatureFrame) -> Result<Vec<Vec<f64>>> {
        let expected: Vec<&str> = self.columns.iter().map(|(n, _)| n.as_str()).collect();
        if frame.columns().iter().map(String::as_str).ne(expected.iter().copied()) {
            return Err(TitanicError::InvalidDataset(format!(
                "feature columns {:?} do not match the fitted columns {expected:?}",
                frame.columns()
            )));
        }

        let width = self.n_features();
        frame
            .rows()
            .iter()
            .map(|row| {
                let mut out = Vec::with_capacity(width);
                for ((name, encoding), value) in self.columns.iter().zip(row) {
                    encode_value(name, encoding, value, &mut out)?;
                }
                Ok(out)
            })
            .collect()
    }
}

fn encode_value(
    name: &str,
    encoding: &ColumnEncoding,
    value: &Value,
    out: &mut Vec<f64>,
) -> Result<()> {
    match encoding {
        ColumnEncoding::Numeric { fill } => {
            let n = match value {
                Value::Null => *fill,
                Value::Number(n) => *n,
                Value::Text(s) => {
                    return Err(TitanicError::InvalidDataset(format!(
                        "column {name:?} expects numbers, got {s:?}"
                    )));
                }
            };
            out.push(n);
        }
        ColumnEncoding::Categorical { categories, fill } => {
            let key = match value {
                Value::Null => fill.clone(),
                other => other.to_string(),
            };
            let Ok(idx) = categories.binary_search(&key) else {
                return Err(TitanicError::UnknownCategory {
                    column: name.to_string(),
                    value: key,
                });
            };
            out.extend((1..categories.len()).map(|i| if i == idx { 1.0 } else { 0.0 }));
        }
    }
    Ok(())
}

/// Most frequent value; ties go to the smallest.
fn most_frequent_number(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);

    let mut best = values[0];
    let mut best_count = 0;
    let mut i = 0;
    while i < values.len() {
        let mut j = i;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        if j - i > best_count {
            best_count = j - i;
            best = values[i];
        }
        i = j;
    }
    best
}

/// Most frequent key; ties go to the lexicographically smallest.
fn most_frequent_key(counts: &BTreeMap<String, usize>) -> String {
    let mut best: Option<(&String, usize)> = None;
    for (key, &count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(k, _)| k.clone()).unwrap_or_default()
}
