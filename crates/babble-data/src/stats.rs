//! Per-feature standardisation.

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::DataError;

/// Mean and (population) standard deviation of every feature column.
///
/// Columns with zero deviation get a deviation of 1, so constant
/// features normalise to 0 instead of NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureStats {
    mean: Array1<f32>,
    std: Array1<f32>,
}

impl FeatureStats {
    /// Fit on `features`, one row per item.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`] if `features` has no rows.
    pub fn fit(features: ArrayView2<'_, f32>) -> Result<Self, DataError> {
        let mean = features
            .mean_axis(Axis(0))
            .ok_or(DataError::EmptyDataset)?;
        let std = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 { 1.0 } else { s });
        Ok(Self { mean, std })
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Per-feature mean.
    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    /// Per-feature deviation, never zero.
    pub fn std(&self) -> &Array1<f32> {
        &self.std
    }

    /// `(x - mean) / std`, column by column.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::FeatureMismatch`] if `features` has a
    /// different number of columns than the fitted split.
    pub fn normalise(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f32>, DataError> {
        if features.ncols() != self.n_features() {
            return Err(DataError::FeatureMismatch {
                expected: self.n_features(),
                found: features.ncols(),
            });
        }
        Ok((&features - &self.mean) / &self.std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fits_population_moments() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let stats = FeatureStats::fit(x.view()).unwrap();
        assert_eq!(stats.mean(), &array![2.0, 5.0]);
        // Second column is constant: deviation replaced by 1.
        assert_eq!(stats.std(), &array![1.0, 1.0]);
        assert_eq!(
            stats.normalise(x.view()).unwrap(),
            array![[-1.0, 0.0], [1.0, 0.0]]
        );
    }

    #[test]
    fn applies_training_moments_to_other_splits() {
        let train = array![[0.0], [4.0]];
        let stats = FeatureStats::fit(train.view()).unwrap();
        let valid = array![[6.0], [2.0], [-2.0]];
        assert_eq!(
            stats.normalise(valid.view()).unwrap(),
            array![[2.0], [0.0], [-2.0]]
        );
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let x = Array2::<f32>::zeros((0, 3));
        assert_eq!(FeatureStats::fit(x.view()), Err(DataError::EmptyDataset));
    }

    #[test]
    fn column_count_must_match() {
        let stats = FeatureStats::fit(array![[1.0, 2.0]].view()).unwrap();
        let err = stats.normalise(array![[1.0, 2.0, 3.0]].view()).unwrap_err();
        assert_eq!(
            err,
            DataError::FeatureMismatch {
                expected: 2,
                found: 3
            }
        );
    }
}
