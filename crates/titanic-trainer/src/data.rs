//! Dataset loading from CSV and JSON files.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use titanic_core::{Dataset, Record, Result, TitanicError, Value};

/// On-disk dataset encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Header row followed by one record per line.
    Csv,
    /// A JSON array of objects.
    Json,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(TitanicError::InvalidDataset(format!(
                "unsupported dataset format for {} (expected .csv or .json)",
                path.display()
            ))),
        }
    }
}

/// Loads a dataset and checks that all records share one column set.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let format = DatasetFormat::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);

    let dataset = match format {
        DatasetFormat::Csv => read_csv(reader)?,
        DatasetFormat::Json => read_json(reader)?,
    };
    dataset.validate_uniform()?;

    tracing::info!(
        path = %path.display(),
        records = dataset.len(),
        columns = ?dataset.columns(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Parses CSV with a header row. Empty cells become [`Value::Null`].
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(TitanicError::InvalidDataset(format!(
            "duplicate column {dup:?} in CSV header"
        )));
    }

    let mut dataset = Dataset::default();
    for row in csv_reader.records() {
        let row = row.map_err(csv_error)?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, field)| (name.clone(), Value::from_field(field)))
            .collect();
        dataset.push(record);
    }
    Ok(dataset)
}

/// Parses a JSON array of flat objects.
pub fn read_json<R: Read>(reader: R) -> Result<Dataset> {
    serde_json::from_reader(reader)
        .map_err(|e| TitanicError::InvalidDataset(format!("malformed JSON dataset: {e}")))
}

fn csv_error(err: csv::Error) -> TitanicError {
    TitanicError::InvalidDataset(format!("malformed CSV: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age
1,0,3,\"Braund, Mr. Owen Harris\",male,22
2,1,1,\"Cumings, Mrs. John Bradley\",female,38
3,1,3,\"Heikkinen, Miss. Laina\",female,
";

    #[test]
    fn reads_csv_with_quoted_fields_and_blanks() {
        let ds = read_csv(CSV.as_bytes()).unwrap();

        assert_eq!(ds.len(), 3);
        let first = &ds.records()[0];
        assert_eq!(first["Name"], Value::from("Braund, Mr. Owen Harris"));
        assert_eq!(first["Pclass"], Value::Number(3.0));
        assert_eq!(ds.records()[2]["Age"], Value::Null);
    }

    #[test]
    fn ragged_csv_is_rejected() {
        let err = read_csv("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidDataset(_)));
    }

    #[test]
    fn duplicate_header_is_rejected() {
        let err = read_csv("a,a\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidDataset(_)));
    }

    #[test]
    fn reads_json_array() {
        let ds = read_json(r#"[{"Pclass": 1, "Sex": "female"}]"#.as_bytes()).unwrap();
        assert_eq!(ds.columns(), vec!["Pclass", "Sex"]);
    }

    #[test]
    fn json_object_is_rejected() {
        let err = read_json(r#"{"Pclass": 1}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidDataset(_)));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(DatasetFormat::from_path(Path::new("train.CSV")).unwrap(), DatasetFormat::Csv);
        assert_eq!(DatasetFormat::from_path(Path::new("x.json")).unwrap(), DatasetFormat::Json);
        assert!(DatasetFormat::from_path(Path::new("x.parquet")).is_err());
    }

    #[test]
    fn load_dataset_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, CSV).unwrap();

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 3);

        let missing = load_dataset(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(missing, TitanicError::Io(_)));
    }

    #[test]
    fn load_dataset_rejects_ragged_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"[{"a": 1, "b": 2}, {"a": 3}]"#).unwrap();

        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, TitanicError::InvalidDataset(_)));
    }
}
