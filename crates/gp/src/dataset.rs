use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Training data for a multi-fidelity GP model.
///
/// Each lower fidelity level is registered under an index, 0 being the
/// lowest fidelity. The highest fidelity dataset is registered without
/// an index. Registering a level twice replaces its data.
///
/// ```
/// use mfbox_gp::MultiFidelityDataset;
/// use ndarray::array;
///
/// let dataset = MultiFidelityDataset::new()
///     .set_training_values(&array![[0.], [0.5], [1.]], &array![1., 2., 3.], Some(0))
///     .set_training_values(&array![[0.], [1.]], &array![0.9, 3.1], None);
/// assert_eq!(2, dataset.n_levels());
/// ```
#[derive(Clone, Debug, Default)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct MultiFidelityDataset<F: Float> {
    lofi: BTreeMap<usize, (Array2<F>, Array1<F>)>,
    hifi: Option<(Array2<F>, Array1<F>)>,
}

impl<F: Float> MultiFidelityDataset<F> {
    /// An empty dataset
    pub fn new() -> Self {
        MultiFidelityDataset {
            lofi: BTreeMap::new(),
            hifi: None,
        }
    }

    /// Register training data at the given fidelity level.
    ///
    /// `level` indexes lower fidelities from 0 (lowest); `None` registers
    /// the highest fidelity data. Previously registered data at the same
    /// level is replaced.
    ///
    /// Inconsistent x and y row counts are reported at training time.
    pub fn set_training_values(
        mut self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        level: Option<usize>,
    ) -> Self {
        match level {
            Some(lvl) => {
                self.lofi.insert(lvl, (x.to_owned(), y.to_owned()));
            }
            None => self.hifi = Some((x.to_owned(), y.to_owned())),
        }
        self
    }

    /// Total number of fidelity levels including the highest one
    pub fn n_levels(&self) -> usize {
        self.lofi.len() + usize::from(self.hifi.is_some())
    }

    /// Returns the registered datasets ordered from lowest to highest fidelity.
    ///
    /// Fails when the highest fidelity data is missing, when lower fidelity
    /// indices are not contiguous from 0, when x and y row counts disagree
    /// at some level or when levels do not share the same input dimension.
    pub(crate) fn ordered_levels(&self) -> Result<Vec<(&Array2<F>, &Array1<F>)>> {
        let (x_hi, y_hi) = self.hifi.as_ref().ok_or_else(|| {
            GpError::MissingHighFidelityError(
                "no dataset registered with level=None".to_string(),
            )
        })?;

        let mut levels = Vec::with_capacity(self.lofi.len() + 1);
        for (expected, (lvl, (x, y))) in self.lofi.iter().enumerate() {
            if *lvl != expected {
                return Err(GpError::InvalidValueError(format!(
                    "fidelity levels should be contiguous from 0, missing level {expected}"
                )));
            }
            levels.push((x, y));
        }
        levels.push((x_hi, y_hi));

        let nx = x_hi.ncols();
        for (lvl, (x, y)) in levels.iter().enumerate() {
            if x.nrows() != y.len() {
                return Err(GpError::InvalidValueError(format!(
                    "level {} has {} x rows and {} y values",
                    lvl,
                    x.nrows(),
                    y.len()
                )));
            }
            if x.ncols() != nx {
                return Err(GpError::DimensionMismatchError(format!(
                    "level {} has {} input dimensions while highest fidelity has {}",
                    lvl,
                    x.ncols(),
                    nx
                )));
            }
        }
        Ok(levels)
    }
}
