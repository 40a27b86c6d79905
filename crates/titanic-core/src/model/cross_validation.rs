//! Stratified k-fold cross-validation.

use oorandom::Rand64;
use tracing::debug;

use super::TitanicModel;
use crate::error::{Result, TitanicError};
use crate::metrics::Metrics;
use crate::types::Dataset;

/// Default number of folds.
pub const DEFAULT_FOLDS: usize = 5;

impl TitanicModel {
    /// Scores this model's configuration by k-fold cross-validation.
    ///
    /// Each fold is held out once while a fresh model with the same
    /// parameters and columns is fit on the rest; the result is the mean of
    /// the per-fold [`Metrics`]. Folds are stratified by label and shuffled
    /// with the model seed. `self` is neither read for fitted state nor
    /// modified.
    pub fn cross_validate(
        &self,
        features: &Dataset,
        labels: &[u8],
        folds: usize,
    ) -> Result<Metrics> {
        if folds < 2 {
            return Err(TitanicError::InvalidParams(format!(
                "cross-validation needs at least 2 folds, got {folds}"
            )));
        }
        if features.len() != labels.len() {
            return Err(TitanicError::InvalidTrainingData(format!(
                "{} records but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some((row, bad)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
            return Err(TitanicError::InvalidLabel {
                row,
                value: bad.to_string(),
            });
        }
        let positives = labels.iter().filter(|&&l| l == 1).count();
        let smallest_class = positives.min(labels.len() - positives);
        if smallest_class < folds {
            return Err(TitanicError::InvalidTrainingData(format!(
                "{folds}-fold cross-validation needs at least {folds} records of each class, \
                 the smallest class has {smallest_class}"
            )));
        }

        let assignment = stratified_folds(labels, folds, self.params.seed);
        let mut scores = Vec::with_capacity(folds);
        for (k, held_out) in assignment.iter().enumerate() {
            let train: Vec<usize> = assignment
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != k)
                .flat_map(|(_, fold)| fold.iter().copied())
                .collect();
            let train_labels: Vec<u8> = train.iter().map(|&i| labels[i]).collect();
            let test_labels: Vec<u8> = held_out.iter().map(|&i| labels[i]).collect();

            let mut model = TitanicModel::new(self.params, self.selector.clone())?;
            model.fit(&features.select_rows(&train), &train_labels)?;
            let fold_metrics = model.evaluate(&features.select_rows(held_out), &test_labels)?;
            debug!(fold = k, size = held_out.len(), metrics = %fold_metrics, "scored fold");
            scores.push(fold_metrics);
        }

        Ok(Metrics::mean(&scores))
    }
}

/// Splits record indices into `folds` groups with the class balance of
/// `labels`. Each class is shuffled with `seed` and dealt round-robin, so
/// fold sizes differ by at most one.
pub(crate) fn stratified_folds(labels: &[u8], folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = Rand64::new(u128::from(seed));
    let mut out = vec![Vec::new(); folds];
    let mut slot = 0;

    for class in [0u8, 1] {
        let mut members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        for i in (1..members.len()).rev() {
            let j = rng.rand_range(0..(i as u64 + 1)) as usize;
            members.swap(i, j);
        }
        for idx in members {
            out[slot % folds].push(idx);
            slot += 1;
        }
    }

    for fold in &mut out {
        fold.sort_unstable();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelParams;
    use crate::types::Record;

    fn passenger(pclass: i64, sex: &str) -> Record {
        let mut r = Record::new();
        r.insert("Pclass".into(), pclass.into());
        r.insert("Sex".into(), sex.into());
        r
    }

    fn training_set(n: usize) -> (Dataset, Vec<u8>) {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let female = i % 2 == 0;
            records.push(passenger(1 + (i % 3) as i64, if female { "female" } else { "male" }));
            labels.push(u8::from(female));
        }
        (Dataset::new(records), labels)
    }

    #[test]
    fn folds_partition_indices_and_keep_class_balance() {
        let labels: Vec<u8> = (0..23).map(|i| u8::from(i % 3 == 0)).collect();
        let folds = stratified_folds(&labels, 5, 42);

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());

        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
        for fold in &folds {
            assert!(fold.iter().any(|&i| labels[i] == 1));
            assert!(fold.iter().any(|&i| labels[i] == 0));
        }
    }

    #[test]
    fn folds_are_reproducible_per_seed() {
        let labels: Vec<u8> = (0..20).map(|i| u8::from(i % 2 == 0)).collect();
        assert_eq!(stratified_folds(&labels, 4, 1), stratified_folds(&labels, 4, 1));
        assert_ne!(stratified_folds(&labels, 4, 1), stratified_folds(&labels, 4, 2));
    }

    #[test]
    fn separable_data_scores_perfectly() {
        let (features, labels) = training_set(30);
        let model = TitanicModel::with_defaults(ModelParams::new(10)).unwrap();

        let metrics = model.cross_validate(&features, &labels, DEFAULT_FOLDS).unwrap();
        let names: Vec<&str> = metrics.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["accuracy", "precision", "recall", "f1", "mse"]);
        assert_eq!(metrics.get("accuracy"), Some(1.0));
        assert_eq!(metrics.get("mse"), Some(0.0));
        assert!(!model.is_fitted());
    }

    #[test]
    fn rejects_bad_fold_counts() {
        let (features, labels) = training_set(6);
        let model = TitanicModel::with_defaults(ModelParams::new(5)).unwrap();

        assert!(matches!(
            model.cross_validate(&features, &labels, 1),
            Err(TitanicError::InvalidParams(_))
        ));
        assert!(matches!(
            model.cross_validate(&features, &labels, 4),
            Err(TitanicError::InvalidTrainingData(_))
        ));
        assert!(matches!(
            model.cross_validate(&features, &labels[..5], 2),
            Err(TitanicError::InvalidTrainingData(_))
        ));
    }
}
