//! The survival model: column selection, encoding and a random forest,
//! fitted and used as one unit.

mod cross_validation;
pub mod params;

use std::path::Path;

use tracing::info;

use crate::error::{Result, TitanicError};
use crate::features::{ColumnSelector, FeatureEncoder};
use crate::forest::RandomForest;
use crate::metrics::Metrics;
use crate::persist;
use crate::types::Dataset;

pub use cross_validation::DEFAULT_FOLDS;
pub use params::{ModelParams, DEFAULT_N_TREES, DEFAULT_SEED};

/// Default feature columns.
pub const DEFAULT_FEATURES: &[&str] = &["Pclass", "Sex"];
/// Default label column.
pub const DEFAULT_LABEL: &str = "Survived";

/// State that only exists once the model has been fit or loaded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fitted {
    pub(crate) encoder: FeatureEncoder,
    pub(crate) forest: RandomForest,
}

/// A tree-ensemble classifier together with the column selection it was
/// trained with.
///
/// A freshly constructed model is unfit; [`TitanicModel::fit`] or
/// [`TitanicModel::load`] make it usable for prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct TitanicModel {
    params: ModelParams,
    selector: ColumnSelector,
    fitted: Option<Fitted>,
}

impl TitanicModel {
    /// Creates an unfit model after validating `params`.
    pub fn new(params: ModelParams, selector: ColumnSelector) -> Result<Self> {
        params.validate()?;
        if selector.columns().is_empty() {
            return Err(TitanicError::InvalidParams(
                "at least one feature column is required".into(),
            ));
        }
        Ok(Self {
            params,
            selector,
            fitted: None,
        })
    }

    /// An unfit model over [`DEFAULT_FEATURES`].
    pub fn with_defaults(params: ModelParams) -> Result<Self> {
        Self::new(params, ColumnSelector::new(DEFAULT_FEATURES.iter().copied()))
    }

    pub(crate) fn from_parts(params: ModelParams, selector: ColumnSelector, fitted: Fitted) -> Self {
        Self {
            params,
            selector,
            fitted: Some(fitted),
        }
    }

    #[must_use]
    pub fn params(&self) -> ModelParams {
        self.params
    }

    #[must_use]
    pub fn selector(&self) -> &ColumnSelector {
        &self.selector
    }

    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        self.selector.columns()
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub(crate) fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(TitanicError::ModelNotFitted)
    }

    /// Fits the model, replacing any previously fitted state.
    ///
    /// On error the model keeps whatever state it had before the call.
    pub fn fit(&mut self, features: &Dataset, labels: &[u8]) -> Result<()> {
        if features.len() != labels.len() {
            return Err(TitanicError::InvalidTrainingData(format!(
                "{} records but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(TitanicError::InvalidTrainingData(
                "training set is empty".into(),
            ));
        }
        if let Some((row, bad)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
            return Err(TitanicError::InvalidLabel {
                row,
                value: bad.to_string(),
            });
        }
        let positives = labels.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(TitanicError::InvalidTrainingData(
                "labels must contain both classes".into(),
            ));
        }

        let frame = self.selector.transform(features)?;
        let encoder = FeatureEncoder::fit(&frame)?;
        let rows = encoder.transform(&frame)?;
        let forest = RandomForest::fit(&rows, labels, &self.params.forest_config());

        info!(
            records = features.len(),
            features = ?encoder.feature_names(),
            n_trees = forest.n_trees(),
            "fitted model"
        );
        self.fitted = Some(Fitted { encoder, forest });
        Ok(())
    }

    /// Positive-class probability for every record, in input order.
    pub fn predict_proba(&self, features: &Dataset) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;
        let frame = self.selector.transform(features)?;
        let rows = fitted.encoder.transform(&frame)?;
        Ok(rows.iter().map(|r| fitted.forest.predict_proba(r)).collect())
    }

    /// Predicted 0/1 label for every record, in input order.
    pub fn predict(&self, features: &Dataset) -> Result<Vec<u8>> {
        let fitted = self.fitted()?;
        let frame = self.selector.transform(features)?;
        let rows = fitted.encoder.transform(&frame)?;
        Ok(rows.iter().map(|r| fitted.forest.predict(r)).collect())
    }

    /// Scores predictions on `features` against `labels`. Does not mutate the model.
    pub fn evaluate(&self, features: &Dataset, labels: &[u8]) -> Result<Metrics> {
        self.fitted()?;
        if features.len() != labels.len() {
            return Err(TitanicError::InvalidDataset(format!(
                "{} records but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(TitanicError::InvalidDataset(
                "evaluation set is empty".into(),
            ));
        }
        if let Some((row, bad)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
            return Err(TitanicError::InvalidLabel {
                row,
                value: bad.to_string(),
            });
        }

        let predicted = self.predict(features)?;
        Ok(Metrics::binary(&predicted, labels))
    }

    /// Writes the fitted model to `path` atomically, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = persist::encode(self)?;
        persist::write_atomic(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "saved model");
        Ok(())
    }

    /// Reads a fitted model previously written by [`TitanicModel::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = persist::read_artifact(path)?;
        let model = persist::decode(&bytes)?;
        info!(
            path = %path.display(),
            n_trees = model.params.n_trees,
            features = ?model.feature_columns(),
            "loaded model"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, Value};

    fn passenger(pclass: i64, sex: &str) -> Record {
        let mut r = Record::new();
        r.insert("Pclass".into(), pclass.into());
        r.insert("Sex".into(), sex.into());
        r.insert("Name".into(), Value::from("anon"));
        r
    }

    /// Women survive, men do not.
    fn training_set() -> (Dataset, Vec<u8>) {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let pclass = 1 + (i % 3);
            if i % 2 == 0 {
                records.push(passenger(pclass, "female"));
                labels.push(1);
            } else {
                records.push(passenger(pclass, "male"));
                labels.push(0);
            }
        }
        (Dataset::new(records), labels)
    }

    fn fitted_model() -> TitanicModel {
        let (features, labels) = training_set();
        let mut model = TitanicModel::with_defaults(ModelParams::new(25)).unwrap();
        model.fit(&features, &labels).unwrap();
        model
    }

    #[test]
    fn construct_rejects_zero_trees() {
        let err = TitanicModel::with_defaults(ModelParams::new(0)).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidParams(_)));
    }

    #[test]
    fn construct_rejects_empty_selector() {
        let err = TitanicModel::new(ModelParams::default(), ColumnSelector::new(Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, TitanicError::InvalidParams(_)));
    }

    #[test]
    fn unfit_model_refuses_every_operation() {
        let model = TitanicModel::with_defaults(ModelParams::default()).unwrap();
        let (features, labels) = training_set();
        let dir = tempfile::tempdir().unwrap();

        assert!(!model.is_fitted());
        assert!(matches!(model.predict(&features), Err(TitanicError::ModelNotFitted)));
        assert!(matches!(model.predict_proba(&features), Err(TitanicError::ModelNotFitted)));
        assert!(matches!(
            model.evaluate(&features, &labels),
            Err(TitanicError::ModelNotFitted)
        ));
        assert!(matches!(
            model.save(dir.path().join("model.bin")),
            Err(TitanicError::ModelNotFitted)
        ));
        assert!(!dir.path().join("model.bin").exists());
    }

    #[test]
    fn fit_rejects_length_mismatch() {
        let (features, mut labels) = training_set();
        labels.pop();
        let mut model = TitanicModel::with_defaults(ModelParams::new(5)).unwrap();
        let err = model.fit(&features, &labels).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidTrainingData(_)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn fit_rejects_single_class() {
        let (features, _) = training_set();
        let labels = vec![1; features.len()];
        let mut model = TitanicModel::with_defaults(ModelParams::new(5)).unwrap();
        let err = model.fit(&features, &labels).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidTrainingData(_)));
    }

    #[test]
    fn missing_column_is_reported_by_fit_predict_and_evaluate() {
        let (features, labels) = training_set();
        let without_sex = features.without_column("Sex");

        let mut model = TitanicModel::with_defaults(ModelParams::new(5)).unwrap();
        let err = model.fit(&without_sex, &labels).unwrap_err();
        assert!(matches!(err, TitanicError::MissingColumn { .. }));
        assert!(!model.is_fitted());

        let model = fitted_model();
        assert!(matches!(
            model.predict(&without_sex),
            Err(TitanicError::MissingColumn { .. })
        ));
        assert!(matches!(
            model.evaluate(&without_sex, &labels),
            Err(TitanicError::MissingColumn { .. })
        ));
    }

    #[test]
    fn failed_refit_keeps_previous_state() {
        let mut model = fitted_model();
        let before = model.clone();
        let (features, labels) = training_set();

        let _ = model.fit(&features.without_column("Pclass"), &labels);
        assert_eq!(model, before);
    }

    #[test]
    fn predict_preserves_length_and_order() {
        let model = fitted_model();
        let input = Dataset::new(vec![
            passenger(3, "male"),
            passenger(1, "female"),
            passenger(2, "male"),
            passenger(2, "female"),
            passenger(1, "male"),
        ]);

        let predictions = model.predict(&input).unwrap();
        assert_eq!(predictions, vec![0, 1, 0, 1, 0]);

        let probabilities = model.predict_proba(&input).unwrap();
        assert_eq!(probabilities.len(), 5);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn predict_on_empty_dataset_is_empty() {
        let model = fitted_model();
        assert!(model.predict(&Dataset::default()).unwrap().is_empty());
    }

    #[test]
    fn evaluate_scores_three_of_four() {
        let model = fitted_model();
        let validation = Dataset::new(vec![
            passenger(1, "female"),
            passenger(3, "male"),
            passenger(2, "female"),
            passenger(2, "female"),
        ]);
        assert_eq!(model.predict(&validation).unwrap(), vec![1, 0, 1, 1]);

        let metrics = model.evaluate(&validation, &[1, 0, 0, 1]).unwrap();
        assert_eq!(metrics.get("accuracy"), Some(0.75));
    }

    #[test]
    fn evaluate_is_repeatable() {
        let model = fitted_model();
        let (features, labels) = training_set();

        let first = model.evaluate(&features, &labels).unwrap();
        let second = model.evaluate(&features, &labels).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn evaluate_rejects_length_mismatch() {
        let model = fitted_model();
        let (features, _) = training_set();
        let err = model.evaluate(&features, &[1, 0]).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidDataset(_)));
    }

    #[test]
    fn refit_overwrites_previous_state() {
        let mut model = fitted_model();
        let (features, labels) = training_set();
        let flipped: Vec<u8> = labels.iter().map(|l| 1 - l).collect();

        model.fit(&features, &flipped).unwrap();
        let predictions = model
            .predict(&Dataset::new(vec![passenger(1, "female")]))
            .unwrap();
        assert_eq!(predictions, vec![0]);
    }

    #[test]
    fn train_save_load_predict_four_records() {
        let features = Dataset::new(vec![
            passenger(3, "male"),
            passenger(1, "female"),
            passenger(3, "male"),
            passenger(2, "female"),
        ]);
        let labels = [0, 1, 0, 1];
        let mut model = TitanicModel::with_defaults(ModelParams::new(10)).unwrap();
        model.fit(&features, &labels).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        model.save(&path).unwrap();
        assert!(path.exists());

        let loaded = TitanicModel::load(&path).unwrap();
        let predictions = loaded.predict(&features).unwrap();
        assert_eq!(predictions.len(), 4);
        assert!(predictions.iter().all(|&p| p <= 1));
        assert_eq!(predictions, model.predict(&features).unwrap());
    }
}
