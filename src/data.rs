//! Indexed dataset helpers.
//!
//! The training loop addresses patterns by index. Any row may be absent; the loop
//! skips an index whose input or target row is missing, so partially filled
//! collections are valid datasets.

use std::io;
use std::path::Path;

use rand::Rng;

use crate::{Error, Result};

/// An indexable collection of numeric row vectors, any of which may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    rows: Vec<Option<Vec<f64>>>,
}

impl Rows {
    /// Dense rows; every index is present.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self {
            rows: rows.into_iter().map(Some).collect(),
        }
    }

    pub fn from_sparse(rows: Vec<Option<Vec<f64>>>) -> Self {
        Self { rows }
    }

    /// Number of indices, present or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `idx`, or `None` if it is absent or out of range.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&[f64]> {
        self.rows.get(idx).and_then(|r| r.as_deref())
    }

    /// Present rows with their index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64])> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_deref().map(|r| (i, r)))
    }

    /// Read headerless comma-separated rows. Every cell must parse as `f64`.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record =
                record.map_err(|e| Error::InvalidData(format!("csv row {line}: {e}")))?;
            let row = record
                .iter()
                .map(|cell| {
                    cell.parse::<f64>().map_err(|_| {
                        Error::InvalidData(format!("csv row {line}: cannot parse {cell:?}"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(Some(row));
        }
        Ok(Self { rows })
    }

    /// Load a CSV file; see [`Rows::from_csv_reader`].
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(io::BufReader::new(file))
    }

    /// Per-column z-score over the present rows.
    ///
    /// Uses the sample standard deviation (`n - 1`). Columns with zero (or
    /// undefined) spread are only centred. All present rows must have the same
    /// width.
    pub fn normalized(&self) -> Result<Rows> {
        let Some((_, first)) = self.iter().next() else {
            return Ok(self.clone());
        };
        let width = first.len();
        if let Some((i, row)) = self.iter().find(|(_, r)| r.len() != width) {
            return Err(Error::InvalidData(format!(
                "row {i} has len {}, expected {width}",
                row.len()
            )));
        }

        let n = self.iter().count() as f64;
        let mut means = vec![0.0; width];
        for (_, row) in self.iter() {
            for (m, &v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut sds = vec![0.0; width];
        for (_, row) in self.iter() {
            for ((s, &v), &m) in sds.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut sds {
            *s = (*s / (n - 1.0)).sqrt();
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.as_ref().map(|row| {
                    row.iter()
                        .zip(means.iter().zip(&sds))
                        .map(|(&v, (&m, &sd))| {
                            if sd.is_finite() && sd > 0.0 {
                                (v - m) / sd
                            } else {
                                v - m
                            }
                        })
                        .collect()
                })
            })
            .collect();
        Ok(Rows { rows })
    }
}

impl From<Vec<Vec<f64>>> for Rows {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Rows::from_rows(rows)
    }
}

/// A supervised dataset: input rows and target rows sharing one index space.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Rows,
    targets: Rows,
}

impl Dataset {
    /// Pair input and target rows. Both must cover the same number of indices.
    pub fn new(inputs: Rows, targets: Rows) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }
        Ok(Self { inputs, targets })
    }

    /// Build a dense dataset from per-sample rows (copies).
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        Self::new(Rows::from_rows(inputs.to_vec()), Rows::from_rows(targets.to_vec()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn inputs(&self) -> &Rows {
        &self.inputs
    }

    #[inline]
    pub fn targets(&self) -> &Rows {
        &self.targets
    }

    #[inline]
    pub fn input(&self, idx: usize) -> Option<&[f64]> {
        self.inputs.get(idx)
    }

    #[inline]
    pub fn target(&self, idx: usize) -> Option<&[f64]> {
        self.targets.get(idx)
    }

    /// Input and target of pattern `idx`, if both are present.
    #[inline]
    pub fn pair(&self, idx: usize) -> Option<(&[f64], &[f64])> {
        Some((self.input(idx)?, self.target(idx)?))
    }

    /// Randomly hold out `100 - train_percent` percent of the patterns.
    ///
    /// `floor(len * (100 - train_percent) / 100)` patterns, picked with a
    /// Fisher–Yates shuffle, form the validation set (re-indexed from 0 in the
    /// order they were drawn). The remaining patterns keep their original relative
    /// order and form the training set. Returns `(train, validation)`.
    pub fn split<R: Rng + ?Sized>(&self, train_percent: u32, rng: &mut R) -> Result<(Self, Self)> {
        if train_percent > 100 {
            return Err(Error::InvalidData(format!(
                "train percent must be in 0..=100, got {train_percent}"
            )));
        }

        let n = self.len();
        let held_out = n * (100 - train_percent as usize) / 100;

        let mut order: Vec<usize> = (0..n).collect();
        shuffle_indices(&mut order, rng);
        let (val_idx, train_idx) = order.split_at_mut(held_out);
        train_idx.sort_unstable();

        Ok((self.select(train_idx), self.select(val_idx)))
    }

    fn select(&self, indices: &[usize]) -> Self {
        let pick = |rows: &Rows| Rows {
            rows: indices.iter().map(|&i| rows.rows[i].clone()).collect(),
        };
        Self {
            inputs: pick(&self.inputs),
            targets: pick(&self.targets),
        }
    }
}

/// In-place Fisher–Yates shuffle.
///
/// Walks from the last index down to 1, swapping each position with a uniformly
/// chosen index in `[0, i]`.
pub fn shuffle_indices<R: Rng + ?Sized>(indices: &mut [usize], rng: &mut R) {
    for i in (1..indices.len()).rev() {
        let j = rng.gen_range(0..=i);
        indices.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn indexed(n: usize) -> Dataset {
        let xs: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let ys: Vec<Vec<f64>> = (0..n).map(|i| vec![(i * 10) as f64]).collect();
        Dataset::from_rows(&xs, &ys).unwrap()
    }

    #[test]
    fn dataset_requires_matching_lengths() {
        let err = Dataset::from_rows(&[vec![0.0], vec![1.0]], &[vec![0.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn absent_rows_are_reported_as_none() {
        let inputs = Rows::from_sparse(vec![Some(vec![1.0]), None, Some(vec![3.0])]);
        let targets = Rows::from_sparse(vec![Some(vec![0.0]), Some(vec![1.0]), None]);
        let data = Dataset::new(inputs, targets).unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.pair(0), Some((&[1.0][..], &[0.0][..])));
        assert_eq!(data.pair(1), None);
        assert_eq!(data.pair(2), None);
        assert_eq!(data.pair(3), None);
        assert_eq!(data.inputs().iter().count(), 2);
    }

    #[test]
    fn csv_rows_parse_as_numbers() {
        let text = "0,0\n0, 1\n1,0\n1,1\n";
        let rows = Rows::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.get(1), Some(&[0.0, 1.0][..]));
        assert_eq!(rows.get(3), Some(&[1.0, 1.0][..]));
    }

    #[test]
    fn csv_rejects_non_numeric_cells() {
        let err = Rows::from_csv_reader("1,2\n3,x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn missing_csv_file_is_io_error() {
        let err = Rows::load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn normalized_columns_have_zero_mean_unit_sd() {
        let rows = Rows::from_rows(vec![
            vec![1.0, 5.0],
            vec![2.0, 5.0],
            vec![3.0, 5.0],
            vec![6.0, 5.0],
        ]);
        let norm = rows.normalized().unwrap();

        let col: Vec<f64> = norm.iter().map(|(_, r)| r[0]).collect();
        let mean = col.iter().sum::<f64>() / 4.0;
        let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / 3.0;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);

        // Constant column: centred only.
        assert!(norm.iter().all(|(_, r)| r[1] == 0.0));
    }

    #[test]
    fn normalized_rejects_ragged_rows() {
        let rows = Rows::from_rows(vec![vec![1.0, 2.0], vec![1.0]]);
        assert!(matches!(rows.normalized(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn split_sizes_and_order() {
        let data = indexed(10);
        let mut rng = StdRng::seed_from_u64(0);
        let (train, val) = data.split(70, &mut rng).unwrap();
        assert_eq!(val.len(), 3);
        assert_eq!(train.len(), 7);

        let train_ids: Vec<f64> = train.inputs().iter().map(|(_, r)| r[0]).collect();
        assert!(train_ids.windows(2).all(|w| w[0] < w[1]));

        let mut all: Vec<f64> = train_ids
            .iter()
            .copied()
            .chain(val.inputs().iter().map(|(_, r)| r[0]))
            .collect();
        all.sort_by(f64::total_cmp);
        assert_eq!(all, (0..10).map(|i| i as f64).collect::<Vec<_>>());

        // Targets travel with their inputs.
        for i in 0..val.len() {
            let (x, y) = val.pair(i).unwrap();
            assert_eq!(y[0], x[0] * 10.0);
        }
    }

    #[test]
    fn split_edges() {
        let data = indexed(5);
        let mut rng = StdRng::seed_from_u64(1);
        let (train, val) = data.split(100, &mut rng).unwrap();
        assert_eq!((train.len(), val.len()), (5, 0));
        assert_eq!(train, data);

        let (train, val) = data.split(0, &mut rng).unwrap();
        assert_eq!((train.len(), val.len()), (0, 5));

        assert!(matches!(data.split(101, &mut rng), Err(Error::InvalidData(_))));
    }

    #[test]
    fn shuffle_positions_are_roughly_uniform() {
        const N: usize = 4;
        const TRIALS: usize = 20_000;
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [[0usize; N]; N];
        for _ in 0..TRIALS {
            let mut idx: Vec<usize> = (0..N).collect();
            shuffle_indices(&mut idx, &mut rng);
            for (pos, &v) in idx.iter().enumerate() {
                counts[pos][v] += 1;
            }
        }

        let expected = TRIALS / N;
        for row in counts {
            for c in row {
                assert!(c.abs_diff(expected) < 400, "count {c} vs {expected}");
            }
        }
    }

    proptest! {
        #[test]
        fn shuffle_is_a_permutation(n in 0usize..64, seed in any::<u64>()) {
            let mut idx: Vec<usize> = (0..n).collect();
            shuffle_indices(&mut idx, &mut StdRng::seed_from_u64(seed));
            idx.sort_unstable();
            prop_assert_eq!(idx, (0..n).collect::<Vec<_>>());
        }
    }
}
