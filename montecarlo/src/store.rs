use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

/// Variance estimates for every learning rate of one correlation sweep.
///
/// Learning rates are strictly ascending and each one has exactly one
/// variance vector of `ndim` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceTable {
    rho: f64,
    alphas: Vec<f64>,
    variances: Vec<Array1<f64>>,
}

impl VarianceTable {
    /// Creates an empty table for the correlation `rho`.
    pub fn new(rho: f64) -> Self {
        Self {
            rho,
            alphas: Vec::new(),
            variances: Vec::new(),
        }
    }

    /// Builds a table from parallel sequences, checking they line up.
    ///
    /// # Errors
    /// `ExperimentError::Format` if the lengths differ, the rows have
    /// different widths or the learning rates aren't ascending.
    pub fn from_parts(rho: f64, alphas: Vec<f64>, variances: Vec<Array1<f64>>) -> Result<Self> {
        check_parts(&alphas, &variances)?;

        Ok(Self {
            rho,
            alphas,
            variances,
        })
    }

    /// Appends the estimate for the next learning rate.
    ///
    /// # Errors
    /// `ExperimentError::Format` if `alpha` is not greater than the last one
    /// or `variance` has a different width than the previous rows.
    pub fn push(&mut self, alpha: f64, variance: Array1<f64>) -> Result<()> {
        if let Some(&last) = self.alphas.last() {
            if !(alpha > last) {
                return Err(ExperimentError::Format(format!(
                    "alpha ({alpha}) must be greater than the previous one ({last})"
                )));
            }
        }

        if let Some(first) = self.variances.first() {
            if first.len() != variance.len() {
                return Err(ExperimentError::Format(format!(
                    "variance has {} entries, expected {}",
                    variance.len(),
                    first.len()
                )));
            }
        }

        self.alphas.push(alpha);
        self.variances.push(variance);
        Ok(())
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn variances(&self) -> &[Array1<f64>] {
        &self.variances
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    /// Iterates `(alpha, variance)` pairs in ascending alpha order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, ArrayView1<'_, f64>)> {
        self.alphas.iter().copied().zip(self.variances.iter().map(|v| v.view()))
    }
}

/// Writes and reads `VarianceTable`s, one JSON file per correlation, inside a
/// single directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// The file holding the results for the correlation `rho`,
    /// e.g. `variances_(-0_7).json`.
    pub fn path_for(&self, rho: f64) -> PathBuf {
        self.dir.join(format!("variances_({}).json", rho_token(rho)))
    }

    /// Saves `table` to `path_for(table.rho())`, replacing any previous file.
    ///
    /// # Returns
    /// The path written to.
    pub fn save(&self, table: &VarianceTable) -> Result<PathBuf> {
        let path = self.path_for(table.rho());
        save(&path, table.alphas(), table.variances())?;
        Ok(path)
    }

    /// Loads the table previously saved for the correlation `rho`.
    pub fn load(&self, rho: f64) -> Result<VarianceTable> {
        let (alphas, variances) = load(self.path_for(rho))?;
        VarianceTable::from_parts(rho, alphas, variances)
    }
}

/// The filesystem safe rendering of a correlation: its decimal form with the
/// decimal point replaced by an underscore.
pub fn rho_token(rho: f64) -> String {
    rho.to_string().replace('.', "_")
}

#[derive(Serialize)]
struct RecordOut<'a> {
    alphas: &'a [f64],
    variances: Vec<Vec<f64>>,
}

// Non-finite values are written as `null` by serde_json and read back as NaN.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordIn {
    alphas: Vec<f64>,
    variances: Vec<Vec<Option<f64>>>,
}

/// Writes `{"alphas": [...], "variances": [[...], ...]}` to `path`,
/// overwriting it if it exists.
///
/// A NaN or infinite variance is written as `null`, JSON has no token for
/// it. The reference schedule does produce these: at its largest learning
/// rates a few repetitions diverge and the whole row becomes `null`. Readers
/// other than `load` have to map `null` to NaN themselves.
///
/// # Errors
/// `ExperimentError::Format` if the sequences don't line up, in which case
/// nothing is written. `ExperimentError::Io` if the file can't be written.
pub fn save<P: AsRef<Path>>(path: P, alphas: &[f64], variances: &[Array1<f64>]) -> Result<()> {
    check_parts(alphas, variances)?;

    let record = RecordOut {
        alphas,
        variances: variances.iter().map(|v| v.to_vec()).collect(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &record).map_err(|e| {
        if e.is_io() {
            ExperimentError::Io(e.into())
        } else {
            ExperimentError::Format(e.to_string())
        }
    })?;
    writer.flush()?;

    Ok(())
}

/// Reads back what `save` wrote, in the same order.
///
/// # Errors
/// `ExperimentError::Io` if the file can't be read, `ExperimentError::Format`
/// if it isn't well formed: invalid JSON, missing or unknown keys, or
/// sequences that don't line up.
pub fn load<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, Vec<Array1<f64>>)> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let record: RecordIn = serde_json::from_str(&content)
        .map_err(|e| ExperimentError::Format(format!("'{}': {e}", path.display())))?;

    let variances: Vec<Array1<f64>> = record
        .variances
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        .collect();

    check_parts(&record.alphas, &variances)?;
    Ok((record.alphas, variances))
}

fn check_parts(alphas: &[f64], variances: &[Array1<f64>]) -> Result<()> {
    if alphas.len() != variances.len() {
        return Err(ExperimentError::Format(format!(
            "{} alphas but {} variances",
            alphas.len(),
            variances.len()
        )));
    }

    if let Some(first) = variances.first() {
        if let Some((i, row)) = variances.iter().enumerate().find(|(_, v)| v.len() != first.len()) {
            return Err(ExperimentError::Format(format!(
                "variances[{i}] has {} entries, expected {}",
                row.len(),
                first.len()
            )));
        }
    }

    if let Some(i) = alphas.windows(2).position(|pair| !(pair[1] > pair[0])) {
        return Err(ExperimentError::Format(format!(
            "alphas[{}] ({}) is not greater than alphas[{i}] ({})",
            i + 1,
            alphas[i + 1],
            alphas[i]
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use tempfile::TempDir;

    use super::*;

    fn sample_table() -> VarianceTable {
        let mut table = VarianceTable::new(-0.7);
        table.push(0.00001, array![1.0e-7, 2.5e-8]).unwrap();
        table.push(0.0007, array![0.1 + 0.2, 1.0 / 3.0]).unwrap();
        table.push(0.128, array![std::f64::consts::PI, 6.02214076e23]).unwrap();
        table
    }

    #[test]
    fn token_replaces_the_decimal_point() {
        assert_eq!(rho_token(-0.7), "-0_7");
        assert_eq!(rho_token(0.3), "0_3");

        let store = ResultStore::new("out");
        assert_eq!(store.path_for(0.7), Path::new("out").join("variances_(0_7).json"));
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());
        let table = sample_table();

        let path = store.save(&table).unwrap();
        assert_eq!(path, dir.path().join("variances_(-0_7).json"));

        let loaded = store.load(-0.7).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn file_has_exactly_two_keys() {
        let dir = TempDir::new().unwrap();
        let path = ResultStore::new(dir.path()).save(&sample_table()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(object["alphas"].as_array().unwrap().len(), 3);
        assert_eq!(object["variances"][1].as_array().unwrap().len(), 2);
    }

    #[test]
    fn save_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");

        save(&path, &[0.1, 0.2], &[array![1.0], array![2.0]]).unwrap();
        save(&path, &[0.3], &[array![3.0]]).unwrap();

        let (alphas, variances) = load(&path).unwrap();
        assert_eq!(alphas, [0.3]);
        assert_eq!(variances, [array![3.0]]);
    }

    #[test]
    fn save_into_missing_directory_is_io() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("table.json");

        let err = save(&path, &[0.1], &[array![1.0]]).unwrap_err();
        assert!(matches!(err, ExperimentError::Io(_)));
    }

    #[test]
    fn save_rejects_mismatched_lengths_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");

        let err = save(&path, &[0.1, 0.2], &[array![1.0]]).unwrap_err();
        assert!(matches!(err, ExperimentError::Format(_)));
        assert!(!path.exists());
    }

    #[test]
    fn load_missing_file_is_io() {
        let dir = TempDir::new().unwrap();

        let err = load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ExperimentError::Io(_)));
    }

    #[test]
    fn load_malformed_files_is_format() {
        let dir = TempDir::new().unwrap();
        let cases = [
            ("not_json", "{ alphas: "),
            ("missing_key", r#"{ "alphas": [0.1] }"#),
            ("extra_key", r#"{ "alphas": [0.1], "variances": [[1.0]], "rho": 0.3 }"#),
            ("lengths", r#"{ "alphas": [0.1, 0.2], "variances": [[1.0]] }"#),
            ("ragged", r#"{ "alphas": [0.1, 0.2], "variances": [[1.0, 2.0], [1.0]] }"#),
            ("unsorted", r#"{ "alphas": [0.2, 0.1], "variances": [[1.0], [2.0]] }"#),
            ("strings", r#"{ "alphas": ["0.1"], "variances": [[1.0]] }"#),
        ];

        for (name, content) in cases {
            let path = dir.path().join(format!("{name}.json"));
            fs::write(&path, content).unwrap();

            let err = load(&path).unwrap_err();
            assert!(matches!(err, ExperimentError::Format(_)), "{name}: {err}");
        }
    }

    #[test]
    fn non_finite_variances_come_back_as_nan() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diverged.json");

        save(&path, &[0.5, 1.0], &[array![0.1, 0.2], array![f64::INFINITY, f64::NAN]]).unwrap();
        let (alphas, variances) = load(&path).unwrap();

        assert_eq!(alphas, [0.5, 1.0]);
        assert_eq!(variances[0], array![0.1, 0.2]);
        assert!(variances[1].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn diverged_rows_are_written_as_null() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diverged.json");

        save(&path, &[0.1, 0.128], &[array![f64::NAN, 1.0], array![f64::NAN, f64::NEG_INFINITY]])
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"alphas":[0.1,0.128],"variances":[[null,1.0],[null,null]]}"#
        );
    }

    #[test]
    fn push_keeps_the_table_ordered() {
        let mut table = VarianceTable::new(0.3);
        table.push(0.01, array![1.0, 2.0]).unwrap();

        assert!(table.push(0.01, array![1.0, 2.0]).is_err());
        assert!(table.push(0.001, array![1.0, 2.0]).is_err());
        assert!(table.push(0.1, array![1.0]).is_err());

        table.push(0.1, array![3.0, 4.0]).unwrap();
        let alphas: Vec<_> = table.iter().map(|(alpha, _)| alpha).collect();
        assert_eq!(alphas, [0.01, 0.1]);
    }
}
