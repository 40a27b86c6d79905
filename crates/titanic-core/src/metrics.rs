//! Classification scores produced by `evaluate`.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Metric name to score, kept in the order the scores were computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    entries: Vec<(String, f64)>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an earlier score of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accuracy, precision, recall, F1 and MSE of binary predictions.
    ///
    /// Ratios with a zero denominator are reported as `0.0`. The caller
    /// guarantees both slices have the same non-zero length.
    #[must_use]
    pub fn binary(predicted: &[u8], truth: &[u8]) -> Self {
        let counts = Confusion::count(predicted, truth);
        let n = predicted.len() as f64;

        let accuracy = (counts.tp + counts.tn) as f64 / n;
        let precision = ratio(counts.tp, counts.tp + counts.fp);
        let recall = ratio(counts.tp, counts.tp + counts.fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let mse = (counts.fp + counts.fn_) as f64 / n;

        let mut metrics = Self::new();
        metrics.insert("accuracy", accuracy);
        metrics.insert("precision", precision);
        metrics.insert("recall", recall);
        metrics.insert("f1", f1);
        metrics.insert("mse", mse);
        metrics
    }

    /// Per-metric mean over several score sets, in the order of the first set.
    /// A metric missing from any set is left out.
    #[must_use]
    pub fn mean(sets: &[Metrics]) -> Self {
        let mut out = Self::new();
        let Some(first) = sets.first() else {
            return out;
        };
        for (name, _) in first.iter() {
            let values: Option<Vec<f64>> = sets.iter().map(|m| m.get(name)).collect();
            if let Some(values) = values {
                out.insert(name, values.iter().sum::<f64>() / values.len() as f64);
            }
        }
        out
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{name}: {value:.4}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Confusion {
    tp: usize,
    tn: usize,
    fp: usize,
    fn_: usize,
}

impl Confusion {
    fn count(predicted: &[u8], truth: &[u8]) -> Self {
        let mut c = Self::default();
        for (&p, &t) in predicted.iter().zip(truth) {
            match (p, t) {
                (1, 1) => c.tp += 1,
                (1, _) => c.fp += 1,
                (_, 1) => c.fn_ += 1,
                _ => c.tn += 1,
            }
        }
        c
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
