use crate::SamplingMethod;
use crate::utils::pdist;
use linfa::Float;
use ndarray::{s, Array, Array2, ArrayBase, Data, Ix2, ShapeBuilder};
use ndarray_rand::{
    rand::seq::SliceRandom, rand::Rng, rand::SeedableRng, rand_distr::Uniform, RandomExt,
};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
use std::sync::{Arc, RwLock};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Kinds of Latin Hypercube Design
#[derive(Clone, Debug, Default, Copy)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum LhsKind {
    /// sample is choosen randomly within its latin hypercube intervals
    Classic,
    /// sample is the middle of its latin hypercube intervals
    #[default]
    Centered,
    /// distance between points is maximized over a few random draws
    Maximin,
    /// sample is the middle of its latin hypercube intervals and distance between points is maximized
    CenteredMaximin,
}

type RngRef<R> = Arc<RwLock<R>>;

/// The LHS design is built as follows: each dimension space is divided into ns sections
/// where ns is the number of sampling points, and one point is selected in each section.
/// The selection method gives different kinds of LHS (see [LhsKind]).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Lhs<F: Float, R: Rng> {
    /// Sampling space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of x
    xlimits: Array2<F>,
    /// The requested kind of LHS
    kind: LhsKind,
    /// Random generator used for reproducibility
    rng: RngRef<R>,
}

/// LHS with default random generator
impl<F: Float> Lhs<F, Xoshiro256Plus> {
    /// Constructor given a design space as a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use mfbox_doe::Lhs;
    /// use ndarray::arr2;
    ///
    /// let doe = Lhs::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for Lhs<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        match &self.kind {
            LhsKind::Classic => self._classic_lhs(ns),
            LhsKind::Centered => self._centered_lhs(ns),
            LhsKind::Maximin => self._maximin_lhs(ns, false, 5),
            LhsKind::CenteredMaximin => self._maximin_lhs(ns, true, 5),
        }
    }
}

impl<F: Float, R: Rng> Lhs<F, R> {
    /// Constructor with given design space and random generator.
    /// * `xlimits`: (nx, 2) matrix where nx is the dimension of the samples and the ith row
    ///   is the definition interval of the ith component of x.
    /// * `rng`: random generator used for interval shuffling
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Lhs {
            xlimits: xlimits.to_owned(),
            kind: LhsKind::default(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the kind of LHS
    pub fn kind(mut self, kind: LhsKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Lhs<F, R2> {
        Lhs {
            xlimits: self.xlimits,
            kind: self.kind,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    fn _classic_lhs(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let cut = Array::linspace(0., 1., ns + 1);

        let mut rng = self.rng.write().unwrap();
        let rnd = Array::random_using((ns, nx).f(), Uniform::new(0., 1.), &mut *rng);
        let a = cut.slice(s![..ns]).to_owned();
        let b = cut.slice(s![1..(ns + 1)]);
        let c = &b - &a;
        let mut rdpoints = Array::zeros((ns, nx).f());
        for j in 0..nx {
            let d = rnd.column(j).to_owned() * &c + &a;
            rdpoints.column_mut(j).assign(&d)
        }
        let mut lhs = Array::zeros((ns, nx).f());
        for j in 0..nx {
            let mut colj = rdpoints.column_mut(j);
            colj.as_slice_mut().unwrap().shuffle(&mut *rng);
            lhs.column_mut(j).assign(&colj);
        }
        lhs.mapv(|v| F::cast(v))
    }

    fn _centered_lhs(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let cut = Array::linspace(0., 1., ns + 1);

        let a = cut.slice(s![..ns]).to_owned();
        let b = cut.slice(s![1..(ns + 1)]);
        let mut c = (a + b) / 2.;
        let mut lhs = Array::zeros((ns, nx).f());

        let mut rng = self.rng.write().unwrap();
        for j in 0..nx {
            c.as_slice_mut().unwrap().shuffle(&mut *rng);
            lhs.column_mut(j).assign(&c);
        }
        lhs.mapv(|v| F::cast(v))
    }

    fn _maximin_lhs(&self, ns: usize, centered: bool, max_iters: usize) -> Array2<F> {
        let mut lhs = if centered {
            self._centered_lhs(ns)
        } else {
            self._classic_lhs(ns)
        };
        let mut max_dist = *pdist(&lhs).min().unwrap();
        let mut lhs_maximin = lhs;
        for _ in 0..max_iters - 1 {
            if centered {
                lhs = self._centered_lhs(ns);
            } else {
                lhs = self._classic_lhs(ns);
            }
            let d_min = *pdist(&lhs).min().unwrap();
            if max_dist < d_min {
                max_dist = d_min;
                std::mem::swap(&mut lhs_maximin, &mut lhs)
            }
        }
        lhs_maximin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_abs_diff_ne};
    use ndarray::arr2;

    #[test]
    fn test_lhs_same_seed_same_design() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let s1 = Lhs::new(&xlimits)
            .kind(LhsKind::Classic)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(20);
        let s2 = Lhs::new(&xlimits)
            .kind(LhsKind::Classic)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(20);
        assert_abs_diff_eq!(s1, s2, epsilon = 1e-12);
    }

    #[test]
    fn test_lhs_stratification() {
        // one point per 1/ns slice in each dimension
        let xlimits = arr2(&[[0., 1.], [0., 1.], [0., 1.]]);
        let ns = 50;
        let lhs = Lhs::new(&xlimits)
            .kind(LhsKind::Classic)
            .with_rng(Xoshiro256Plus::seed_from_u64(0))
            .sample(ns);
        for j in 0..3 {
            let mut col: Vec<f64> = lhs.column(j).to_vec();
            col.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for (i, v) in col.iter().enumerate() {
                assert!(*v >= i as f64 / ns as f64);
                assert!(*v <= (i + 1) as f64 / ns as f64);
            }
        }
    }

    #[test]
    fn test_centered_lhs_uses_interval_middles() {
        let xlimits = arr2(&[[0., 1.]]);
        let ns = 5;
        let lhs = Lhs::new(&xlimits)
            .kind(LhsKind::Centered)
            .with_rng(Xoshiro256Plus::seed_from_u64(0))
            .sample(ns);
        let mut col: Vec<f64> = lhs.column(0).to_vec();
        col.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_abs_diff_eq!(
            Array::from_vec(col),
            Array::from_vec(vec![0.1, 0.3, 0.5, 0.7, 0.9]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_within_bounds() {
        let xlimits = arr2(&[[5., 10.], [-1., 1.]]);
        let lhs = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(30);
        for row in lhs.rows() {
            assert!(row[0] >= 5. && row[0] <= 10.);
            assert!(row[1] >= -1. && row[1] <= 1.);
        }
    }

    #[test]
    fn test_no_duplicate() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let lhs = Lhs::new(&xlimits).with_rng(Xoshiro256Plus::seed_from_u64(42));

        let sample1 = lhs.sample(5);
        let sample2 = lhs.sample(5);
        assert_abs_diff_ne!(sample1, sample2);
    }

    #[test]
    fn test_maximin_is_still_an_lhs() {
        let xlimits = arr2(&[[0., 1.], [0., 1.]]);
        let ns = 10;
        let lhs = Lhs::new(&xlimits)
            .kind(LhsKind::Maximin)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(ns);
        for j in 0..2 {
            let mut col: Vec<f64> = lhs.column(j).to_vec();
            col.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for (i, v) in col.iter().enumerate() {
                assert!(*v >= i as f64 / ns as f64 && *v <= (i + 1) as f64 / ns as f64);
            }
        }
    }
}
