use crate::SamplingMethod;
use linfa::Float;
use ndarray::{s, Array, Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_stats::QuantileExt;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// The FullFactorial design consists of all possible combinations
/// of levels for all components within the design space.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct FullFactorial<F: Float> {
    /// Design space definition:
    /// the ith row is the [lower_bound, upper_bound] of xi, the ith component of a sample x
    xlimits: Array2<F>,
    /// Whether the grid is truncated to return exactly the requested number of samples
    clip: bool,
}

impl<F: Float> FullFactorial<F> {
    /// Constructor given a design space as a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use mfbox_doe::FullFactorial;
    /// use ndarray::arr2;
    ///
    /// let doe = FullFactorial::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        FullFactorial {
            xlimits: xlimits.to_owned(),
            clip: false,
        }
    }

    /// Sets whether the generated grid is truncated to exactly `ns` points.
    ///
    /// As the number of levels per component is chosen as evenly as possible,
    /// the grid size is the smallest product of levels greater than or equal to
    /// the requested number of samples; with `clip` the extra points are dropped.
    pub fn clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }
}

impl<F: Float> SamplingMethod<F> for FullFactorial<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        //! the number of levels by component is choosen as evenly as possible
        let nx = self.xlimits.nrows();
        let weights: Array1<F> = Array1::ones(nx) / F::cast(nx);
        let mut num_list: Array1<usize> = Array::ones(nx);

        while num_list.fold(1, |acc, n| acc * n) < ns {
            let w: Array1<F> = &num_list.mapv(|v| F::cast(v)) / F::cast(num_list.sum());
            let ind = (&weights - &w).argmax().unwrap();
            num_list[ind] += 1;
        }
        let nrows = num_list.fold(1, |acc, n| acc * n);
        let mut doe = Array2::<F>::zeros((nrows, nx));

        let mut level_repeat = nrows;
        let mut range_repeat = 1;
        for j in 0..nx {
            let n = num_list[j];
            level_repeat /= n;
            let mut chunk = Array1::zeros(level_repeat * n);
            for i in 0..n {
                let fill = if n > 1 {
                    F::cast(i) / F::cast(n - 1)
                } else {
                    F::cast(i)
                };
                chunk
                    .slice_mut(s![i * level_repeat..(i + 1) * level_repeat])
                    .assign(&Array1::from_elem(level_repeat, fill));
            }
            for k in 0..range_repeat {
                doe.slice_mut(s![n * level_repeat * k..n * level_repeat * (k + 1), j])
                    .assign(&chunk);
            }
            range_repeat *= n;
        }
        if self.clip {
            doe.slice(s![0..ns, ..]).to_owned()
        } else {
            doe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, array};

    #[test]
    fn test_ffact() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let expected = array![
            [5., 0.],
            [5., 0.5],
            [5., 1.],
            [7.5, 0.],
            [7.5, 0.5],
            [7.5, 1.],
            [10., 0.],
            [10., 0.5],
            [10., 1.],
        ];
        let actual = FullFactorial::new(&xlimits).sample(9);
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-6);
    }

    #[test]
    fn test_ffact_clipped() {
        // grid is 3x3, clipping keeps the first 7 rows
        let xlimits = arr2(&[[0., 1.], [0., 1.]]);
        let actual = FullFactorial::new(&xlimits).clip(true).sample(7);
        let expected = array![
            [0., 0.],
            [0., 0.5],
            [0., 1.],
            [0.5, 0.],
            [0.5, 0.5],
            [0.5, 1.],
            [1., 0.],
        ];
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-6);
    }

    #[test]
    fn test_ffact_unclipped_returns_whole_grid() {
        let xlimits = arr2(&[[0., 1.], [0., 1.]]);
        // 7 requested, levels are [3, 3], full grid has 9 points
        let actual = FullFactorial::new(&xlimits).sample(7);
        assert_eq!(9, actual.nrows());
    }

    #[test]
    fn test_ffact_exact_grid_in_3d() {
        // 100 points in 3d yield levels [5, 5, 4], an exact fit
        let xlimits = arr2(&[[-1., 1.], [-1., 1.], [-1., 1.]]);
        let actual = FullFactorial::new(&xlimits).clip(true).sample(100);
        assert_eq!(100, actual.nrows());
        for row in actual.rows() {
            for v in row {
                assert!(*v >= -1. && *v <= 1.);
            }
        }
    }
}
