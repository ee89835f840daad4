use crate::correlation_models::{CorrelationModel, SquaredExponentialCorr};
use crate::dataset::MultiFidelityDataset;
use crate::errors::{GpError, Result};
use crate::mean_models::{ConstantMean, RegressionModel};
use crate::optimization::{into_f64, optimize_params, prepare_multistart, CobylaParams};
use crate::parameters::{MfkParams, MfkValidParams, ThetaTuning};
use crate::utils::{pairwise_differences, DiffMatrix, Scaling};

use linfa::dataset::Dataset;
use linfa::prelude::Fit;
use linfa::{Float, ParamGuard};
use linfa_linalg::{cholesky::*, qr::*, svd::*, triangular::*};
use linfa_pls::PlsRegression;
use log::{debug, warn};
use ndarray::{concatenate, s, Array, Array1, Array2, ArrayBase, Axis, Data, Ix2, Zip};
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Number of internal hyperparameter optimization restarts
pub const GP_OPTIM_N_START: usize = 10;
/// Min number of likelihood evaluations during hyperparameter optimization
pub const GP_COBYLA_MIN_EVAL: usize = 25;
/// Max number of likelihood evaluations during hyperparameter optimization
pub const GP_COBYLA_MAX_EVAL: usize = 1000;

/// Internal parameters computed by the GLS resolution at one fidelity level
#[derive(Debug, Default)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct LevelInnerParams<F: Float> {
    /// Process variance in scaled space
    pub(crate) sigma2: F,
    /// Generalized least-squares regression weights;
    /// for levels > 0 the first weight is the scale factor rho
    pub(crate) beta: Array2<F>,
    /// Correlation weights of the residual term
    pub(crate) gamma: Array2<F>,
    /// Lower Cholesky factor of the correlation matrix R
    pub(crate) r_chol: Array2<F>,
    /// Solution of R.ft = F where F is the regression matrix
    pub(crate) ft: Array2<F>,
    /// R upper factor of the QR decomposition of ft
    pub(crate) ft_qr_r: Array2<F>,
}

impl<F: Float> Clone for LevelInnerParams<F> {
    fn clone(&self) -> Self {
        LevelInnerParams {
            sigma2: self.sigma2,
            beta: self.beta.to_owned(),
            gamma: self.gamma.to_owned(),
            r_chol: self.r_chol.to_owned(),
            ft: self.ft.to_owned(),
            ft_qr_r: self.ft_qr_r.to_owned(),
        }
    }
}

/// The trained model of one fidelity level
#[derive(Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct LevelParams<F: Float> {
    /// Correlation lengthscales
    pub(crate) theta: Array1<F>,
    /// Reduced likelihood value at theta
    pub(crate) likelihood: F,
    /// GLS byproducts
    pub(crate) inner: LevelInnerParams<F>,
    /// Scaled training inputs of the level
    pub(crate) xt_norm: Array2<F>,
}

impl<F: Float> Clone for LevelParams<F> {
    fn clone(&self) -> Self {
        LevelParams {
            theta: self.theta.to_owned(),
            likelihood: self.likelihood,
            inner: self.inner.clone(),
            xt_norm: self.xt_norm.to_owned(),
        }
    }
}

/// A multi-fidelity kriging surrogate implemented as a recursive co-kriging model.
///
/// Fidelity levels are fitted from the lowest to the highest. Level 0 is an
/// ordinary kriging model. At each subsequent level the regression matrix is
/// augmented with the previous level posterior mean evaluated at the level
/// training points, so that the scale factor rho between levels is estimated
/// by generalized least squares jointly with the polynomial trend.
///
/// With a single fidelity level the model degenerates to ordinary kriging.
///
/// Reference: Le Gratiet, L. (2013). "Multi-fidelity Gaussian process regression
/// for computer experiments."
///
/// ```no_run
/// use mfbox_gp::{MfKriging, MultiFidelityDataset};
/// use ndarray::{array, Array1, Array2, Axis};
///
/// // low fidelity is a biased version of the high fidelity function
/// let xt_hf = array![[0.], [0.4], [0.6], [1.]];
/// let yt_hf = array![3.02, 0.11, -0.14, 15.83];
/// let xt_lf = array![[0.], [0.25], [0.5], [0.75], [1.]];
/// let yt_lf = array![-8.48, -4.25, -2.79, 1.03, 7.91];
///
/// let dataset = MultiFidelityDataset::new()
///     .set_training_values(&xt_lf, &yt_lf, Some(0))
///     .set_training_values(&xt_hf, &yt_hf, None);
/// let model = MfKriging::params().fit(&dataset).expect("MFK fit");
/// let y = model.predict(&array![[0.5]]).expect("prediction");
/// ```
#[derive(Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize, Mean: Serialize, Corr: Serialize",
        deserialize = "F: Deserialize<'de>, Mean: Deserialize<'de>, Corr: Deserialize<'de>"
    ))
)]
pub struct MultiFidelityGp<F: Float, Mean: RegressionModel<F>, Corr: CorrelationModel<F>> {
    /// Per fidelity level trained parameters, lowest fidelity first
    levels: Vec<LevelParams<F>>,
    /// Weights in case of kpls dimension reduction coming from PLS regression (orig_dim, kpls_dim)
    w_star: Array2<F>,
    /// Input scaling, common to all levels
    x_scaling: Scaling<F>,
    /// Output scaling, common to all levels
    y_scaling: Scaling<F>,
    /// Highest fidelity training data
    training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    params: MfkValidParams<F, Mean, Corr>,
}

/// Multi-fidelity kriging with a constant mean and a squared exponential correlation model
pub type MfKriging = MultiFidelityGp<f64, ConstantMean, SquaredExponentialCorr>;

impl<F: Float> MultiFidelityGp<F, ConstantMean, SquaredExponentialCorr> {
    /// MFK model parameters with default mean and correlation models
    pub fn params() -> MfkParams<F, ConstantMean, SquaredExponentialCorr> {
        MfkParams::new(ConstantMean(), SquaredExponentialCorr())
    }
}

impl<F: Float, Mean: RegressionModel<F>, Corr: CorrelationModel<F>> Clone
    for MultiFidelityGp<F, Mean, Corr>
{
    fn clone(&self) -> Self {
        MultiFidelityGp {
            levels: self.levels.clone(),
            w_star: self.w_star.to_owned(),
            x_scaling: self.x_scaling.clone(),
            y_scaling: self.y_scaling.clone(),
            training_data: self.training_data.clone(),
            params: self.params.clone(),
        }
    }
}

impl<F: Float, Mean: RegressionModel<F>, Corr: CorrelationModel<F>> fmt::Display
    for MultiFidelityGp<F, Mean, Corr>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let thetas = self
            .levels
            .iter()
            .map(|l| format!("{}", l.theta))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "MFK(mean={}, corr={}, levels={}, theta=[{}])",
            self.params.mean(),
            self.params.corr(),
            self.levels.len(),
            thetas
        )
    }
}

impl<F: Float, Mean: RegressionModel<F>, Corr: CorrelationModel<F>>
    MultiFidelityGp<F, Mean, Corr>
{
    /// MFK model parameters with given mean and correlation models
    pub fn params_with<NewMean: RegressionModel<F>, NewCorr: CorrelationModel<F>>(
        mean: NewMean,
        corr: NewCorr,
    ) -> MfkParams<F, NewMean, NewCorr> {
        MfkParams::new(mean, corr)
    }

    /// Number of fidelity levels of the model
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Optimized correlation lengthscales at the given fidelity level
    /// (0 is the lowest fidelity).
    pub fn theta(&self, level: usize) -> &Array1<F> {
        &self.levels[level].theta
    }

    /// Reduced likelihood value reached at the given fidelity level
    pub fn likelihood(&self, level: usize) -> F {
        self.levels[level].likelihood
    }

    /// Estimated scale factors between successive fidelity levels,
    /// one value per level above the lowest.
    pub fn rho(&self) -> Array1<F> {
        self.levels[1..]
            .iter()
            .map(|l| l.inner.beta[[0, 0]])
            .collect()
    }

    /// Highest fidelity training data this model was fitted with
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.x_scaling.mean.len(), 1)
    }

    fn check_input_dim(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        let nx = self.x_scaling.mean.len();
        if x.ncols() != nx {
            return Err(GpError::DimensionMismatchError(format!(
                "query points have {} components while the model expects {}",
                x.ncols(),
                nx
            )));
        }
        Ok(())
    }

    /// Predict highest fidelity output values at n given `x` points of nx components
    /// specified as a (n, nx) matrix. Returns n scalar output values.
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input_dim(x)?;
        let xnorm = self.x_scaling.apply(x);
        let y_ = predict_scaled_mean(
            &self.levels,
            self.params.mean(),
            self.params.corr(),
            &self.w_star,
            &xnorm,
        );
        Ok((&y_ * &self.y_scaling.std + &self.y_scaling.mean).remove_axis(Axis(1)))
    }

    /// Predict highest fidelity output variances at n given `x` points of nx components
    /// specified as a (n, nx) matrix. Returns n variance values.
    ///
    /// The variance recursion accumulates the level variances scaled by the
    /// squared inter-level scale factors.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input_dim(x)?;
        let xnorm = self.x_scaling.apply(x);
        let n = xnorm.nrows();

        let mut mean_prev: Option<Array2<F>> = None;
        let mut var: Option<Array1<F>> = None;
        for level in self.levels.iter() {
            let corr = self._compute_correlation(level, &xnorm);
            let f_poly = self.params.mean().value(&xnorm);
            let f = match &mean_prev {
                None => f_poly,
                Some(prev) => concatenate![Axis(1), prev.view(), f_poly.view()],
            };

            let (rt, u) = self._compute_rt_u(level, &f, &corr)?;
            let mut mse = Array::ones(n) - rt.mapv(|v| v * v).sum_axis(Axis(0))
                + u.mapv(|v: F| v * v).sum_axis(Axis(0));
            mse.mapv_inplace(|v| level.inner.sigma2 * v);

            var = Some(match var.take() {
                None => mse,
                Some(prev) => {
                    let rho = level.inner.beta[[0, 0]];
                    prev.mapv(|v| rho * rho * v) + mse
                }
            });
            mean_prev = Some(&f.dot(&level.inner.beta) + &corr.dot(&level.inner.gamma));
        }

        // levels is never empty after a successful fit
        let mut var = var.unwrap();
        var.mapv_inplace(|v| v * self.y_scaling.std[0] * self.y_scaling.std[0]);
        // Variance might be slightly negative depending on
        // machine precision: set to zero in that case
        Ok(var.mapv(|v| if v < F::zero() { F::zero() } else { v }))
    }

    /// Predict derivatives of the highest fidelity output wrt the `kx`th component
    /// at n given `x` points specified as a (n, nx) matrix. Returns n derivative values.
    ///
    /// The derivative recursion mirrors the mean one: at each level the trend and
    /// correlation terms are differentiated and the previous level derivative is
    /// scaled by the inter-level scale factor.
    pub fn predict_derivatives(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        kx: usize,
    ) -> Result<Array1<F>> {
        self.check_input_dim(x)?;
        if kx >= x.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "derivative direction {} out of bounds, input dimension is {}",
                kx,
                x.ncols()
            )));
        }
        let xnorm = self.x_scaling.apply(x);
        let mut drv = Array1::zeros(x.nrows());

        Zip::from(&mut drv).and(xnorm.rows()).for_each(|di, xi| {
            let mut mean_prev = F::zero();
            let mut deriv_prev = F::zero();
            for (lvl, level) in self.levels.iter().enumerate() {
                let (r, dr) = self.params.corr().valjac(
                    &xi,
                    &level.xt_norm,
                    &level.theta,
                    &self.w_star,
                );
                let f_poly = self.params.mean().value(&xi.view().insert_axis(Axis(0)));
                let df = self.params.mean().jacobian(&xi);

                let (m0, d0, beta_poly) = if lvl == 0 {
                    (F::zero(), F::zero(), level.inner.beta.slice(s![0.., ..]))
                } else {
                    let rho = level.inner.beta[[0, 0]];
                    (
                        rho * mean_prev,
                        rho * deriv_prev,
                        level.inner.beta.slice(s![1.., ..]),
                    )
                };
                let m = m0
                    + f_poly.dot(&beta_poly)[[0, 0]]
                    + r.t().dot(&level.inner.gamma)[[0, 0]];
                let d = d0
                    + df.t().row(kx).dot(&beta_poly)[0]
                    + dr.column(kx).dot(&level.inner.gamma)[0];
                mean_prev = m;
                deriv_prev = d;
            }
            *di = deriv_prev;
        });

        Ok(drv.mapv(|v| v * self.y_scaling.std[0] / self.x_scaling.std[kx]))
    }

    /// Predict derivatives of the highest fidelity output at n given `x` points.
    /// Returns a (n, nx) matrix of output derivatives wrt each of the nx components.
    pub fn predict_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let mut drv = Array2::<F>::zeros((x.nrows(), x.ncols()));
        for kx in 0..x.ncols() {
            drv.column_mut(kx).assign(&self.predict_derivatives(x, kx)?);
        }
        Ok(drv)
    }

    /// Correlation vector between query points and the level training points
    fn _compute_correlation(
        &self,
        level: &LevelParams<F>,
        xnorm: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let dx = pairwise_differences(xnorm, &level.xt_norm);
        let r = self.params.corr().value(&dx, &level.theta, &self.w_star);
        r.into_shape((xnorm.nrows(), level.xt_norm.nrows())).unwrap()
    }

    /// Compute `rt` and `u` terms of the level variance given the regression
    /// matrix `f` and the correlation vector `corr` at query points
    fn _compute_rt_u(
        &self,
        level: &LevelParams<F>,
        f: &Array2<F>,
        corr: &Array2<F>,
    ) -> Result<(Array2<F>, Array2<F>)> {
        let inners = &level.inner;

        let corr_t = corr.t().to_owned();
        let rt = inners.r_chol.solve_triangular(&corr_t, UPLO::Lower)?;

        let rhs = inners.ft.t().dot(&rt) - f.t();
        let u = inners.ft_qr_r.t().solve_triangular(&rhs, UPLO::Lower)?;
        Ok((rt, u))
    }
}

impl<F: Float, Mean: RegressionModel<F>, Corr: CorrelationModel<F>> MfkParams<F, Mean, Corr> {
    /// Fit the multi-fidelity model on the given dataset after checking parameters.
    pub fn fit(&self, dataset: &MultiFidelityDataset<F>) -> Result<MultiFidelityGp<F, Mean, Corr>> {
        let checked = self.check_ref()?;
        checked.fit(dataset)
    }
}

impl<F: Float, Mean: RegressionModel<F>, Corr: CorrelationModel<F>> MfkValidParams<F, Mean, Corr> {
    /// Fit the multi-fidelity model using maximum likelihood estimation at each
    /// fidelity level, from the lowest fidelity to the highest one.
    pub fn fit(&self, dataset: &MultiFidelityDataset<F>) -> Result<MultiFidelityGp<F, Mean, Corr>> {
        let level_data = dataset.ordered_levels()?;
        let (x_hi, y_hi) = level_data[level_data.len() - 1];

        if let Some(d) = self.kpls_dim() {
            if *d > x_hi.ncols() {
                return Err(GpError::InvalidValueError(format!(
                    "Dimension reduction {} should be smaller than actual \
                        training input dimensions {}",
                    d,
                    x_hi.ncols()
                )));
            }
        }

        let dim = if let Some(n_components) = self.kpls_dim() {
            *n_components
        } else {
            x_hi.ncols()
        };

        // Initial guess for theta, shared by all levels
        let init = self.theta_tuning().init();
        let theta0_dim = init.len();
        let theta0 = if theta0_dim == 1 {
            Array1::from_elem(dim, init[0])
        } else if theta0_dim == dim {
            init.to_owned()
        } else {
            return Err(GpError::InvalidValueError(format!(
                "Initial guess for theta should be either 1-dim or dim of xtrain ({dim}), got {theta0_dim}"
            )));
        };

        // Scaling factors are computed over all levels stacked so that every
        // level lives in the same scaled space
        let xs = level_data.iter().map(|(x, _)| x.view()).collect::<Vec<_>>();
        let x_all = concatenate(Axis(0), &xs)?;
        let ys = level_data
            .iter()
            .map(|(_, y)| y.view().insert_axis(Axis(1)))
            .collect::<Vec<_>>();
        let y_all = concatenate(Axis(0), &ys)?;

        let x_scaling = match self.xlimits() {
            Some(xlimits) => {
                if xlimits.nrows() != x_hi.ncols() {
                    return Err(GpError::DimensionMismatchError(format!(
                        "xlimits has {} rows while training inputs have {} components",
                        xlimits.nrows(),
                        x_hi.ncols()
                    )));
                }
                Scaling::from_xlimits(xlimits)
            }
            None => Scaling::from_data(&x_all),
        };
        let y_scaling = Scaling::from_data(&y_all);

        let mut w_star = Array2::eye(x_hi.ncols());
        if let Some(n_components) = self.kpls_dim() {
            let ds = Dataset::new(x_all.to_owned(), y_all.to_owned());
            w_star = PlsRegression::params(*n_components).fit(&ds).map_or_else(
                |e| match e {
                    linfa_pls::PlsError::PowerMethodConstantResidualError() => {
                        Ok(Array2::zeros((x_all.ncols(), *n_components)))
                    }
                    err => Err(err),
                },
                |v| Ok(v.rotations().0.to_owned()),
            )?;
        };

        let mut levels: Vec<LevelParams<F>> = Vec::with_capacity(level_data.len());
        for (lvl, (x, y)) in level_data.iter().enumerate() {
            let xt_norm = x_scaling.apply(x);
            let yt_norm = y_scaling.apply(&y.view().insert_axis(Axis(1)));

            let f_poly = self.mean().value(&xt_norm);
            let fx = if lvl == 0 {
                f_poly
            } else {
                // augment the regression matrix with the previous level
                // posterior mean so that rho is estimated by GLS
                let m_prev =
                    predict_scaled_mean(&levels, self.mean(), self.corr(), &w_star, &xt_norm);
                concatenate![Axis(1), m_prev.view(), f_poly.view()]
            };
            if xt_norm.nrows() < fx.ncols() {
                return Err(GpError::InvalidValueError(format!(
                    "level {} has {} points, not enough to estimate {} regression weights",
                    lvl,
                    xt_norm.nrows(),
                    fx.ncols()
                )));
            }

            let x_distances = DiffMatrix::new(&xt_norm);
            if x_distances.d.nrows() > 0 {
                let sums = x_distances
                    .d
                    .mapv(|v| num_traits::float::Float::abs(v))
                    .sum_axis(Axis(1));
                if *sums.min().unwrap() == F::zero() {
                    warn!(
                        "multiple x input features have the same value at level {lvl} (at least same row twice)"
                    );
                }
            }

            let level = self.fit_level(lvl, &theta0, fx, x_distances, xt_norm, yt_norm, &w_star)?;
            debug!(
                "level {} fitted: theta={}, likelihood={}",
                lvl, level.theta, level.likelihood
            );
            levels.push(level);
        }

        Ok(MultiFidelityGp {
            levels,
            w_star,
            x_scaling,
            y_scaling,
            training_data: (x_hi.to_owned(), y_hi.to_owned()),
            params: self.clone(),
        })
    }

    /// Estimate theta at one fidelity level by likelihood maximization
    /// and compute the level GLS byproducts at the optimum.
    #[allow(clippy::too_many_arguments)]
    fn fit_level(
        &self,
        lvl: usize,
        theta0: &Array1<F>,
        fx: Array2<F>,
        x_distances: DiffMatrix<F>,
        xt_norm: Array2<F>,
        yt_norm: Array2<F>,
        w_star: &Array2<F>,
    ) -> Result<LevelParams<F>> {
        let opt_theta = match self.theta_tuning() {
            ThetaTuning::Fixed(init) => {
                // Easy path no optimization
                if init.len() == 1 {
                    Array1::from_elem(w_star.ncols(), init[0])
                } else {
                    init.to_owned()
                }
            }
            ThetaTuning::Full { init: _, bounds } => {
                let base: f64 = 10.;
                let objfn = |x: &[f64], _gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
                    let theta = x
                        .iter()
                        .map(|v| F::cast(base.powf(*v)))
                        .collect::<Array1<_>>();
                    for v in theta.iter() {
                        // check theta as optimizer may return nan values
                        if v.is_nan() {
                            // shortcut return worst value wrt to rlf minimization
                            return f64::INFINITY;
                        }
                    }
                    let rxx = self.corr().value(&x_distances.d, &theta, w_star);
                    match reduced_likelihood(&fx, rxx, &x_distances, &yt_norm, self.nugget()) {
                        Ok(r) => -into_f64(&r.0),
                        Err(_) => f64::INFINITY,
                    }
                };

                let bounds_dim = bounds.len();
                let bounds = if bounds_dim == 1 {
                    vec![bounds[0]; w_star.ncols()]
                } else if bounds_dim == w_star.ncols() {
                    bounds.to_vec()
                } else {
                    return Err(GpError::InvalidValueError(format!(
                        "Bounds for theta should be either 1-dim or dim of xtrain ({}), got {}",
                        w_star.ncols(),
                        bounds_dim
                    )));
                };

                let (theta_inits, bounds) =
                    prepare_multistart(self.n_start(), theta0, &bounds);
                debug!(
                    "level {lvl}: optimize with multistart theta = {theta_inits:?} and bounds = {bounds:?}"
                );
                let now = Instant::now();
                let opt_params = (0..theta_inits.nrows())
                    .into_par_iter()
                    .map(|i| {
                        optimize_params(
                            objfn,
                            &theta_inits.row(i).to_owned(),
                            &bounds,
                            CobylaParams {
                                maxeval: (10 * theta_inits.ncols())
                                    .clamp(GP_COBYLA_MIN_EVAL, self.max_eval()),
                                ..CobylaParams::default()
                            },
                        )
                    })
                    .reduce(
                        || (f64::INFINITY, Array::ones((theta_inits.ncols(),))),
                        |a, b| if b.0 < a.0 { b } else { a },
                    );
                debug!("level {lvl}: elapsed optim = {:?}", now.elapsed().as_millis());
                opt_params.1.mapv(|v| F::cast(base.powf(v)))
            }
        };

        let rxx = self.corr().value(&x_distances.d, &opt_theta, w_star);
        let (lkh, inner) = reduced_likelihood(&fx, rxx, &x_distances, &yt_norm, self.nugget())?;
        Ok(LevelParams {
            theta: opt_theta,
            likelihood: lkh,
            inner,
            xt_norm,
        })
    }
}

/// Recurse the posterior mean through already fitted levels at the given
/// scaled points, returning scaled values as a (n, 1) matrix.
fn predict_scaled_mean<F, Mean, Corr>(
    levels: &[LevelParams<F>],
    mean: &Mean,
    corr: &Corr,
    w_star: &Array2<F>,
    xnorm: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F>
where
    F: Float,
    Mean: RegressionModel<F>,
    Corr: CorrelationModel<F>,
{
    let mut m: Option<Array2<F>> = None;
    for level in levels {
        let dx = pairwise_differences(xnorm, &level.xt_norm);
        let r = corr
            .value(&dx, &level.theta, w_star)
            .into_shape((xnorm.nrows(), level.xt_norm.nrows()))
            .unwrap();
        let f_poly = mean.value(xnorm);
        let f = match &m {
            None => f_poly,
            Some(prev) => concatenate![Axis(1), prev.view(), f_poly.view()],
        };
        m = Some(&f.dot(&level.inner.beta) + &r.dot(&level.inner.gamma));
    }
    // levels is never empty after a successful fit
    m.unwrap()
}

/// Compute reduced likelihood function
/// fx: regression factors at level x samples,
/// rxx: correlation factors at level x samples,
/// x_distances: pairwise distances between level x samples
/// yt: scaled output training values as a (n, 1) matrix
/// nugget: factor to improve numerical stability
fn reduced_likelihood<F: Float>(
    fx: &ArrayBase<impl Data<Elem = F>, Ix2>,
    rxx: ArrayBase<impl Data<Elem = F>, Ix2>,
    x_distances: &DiffMatrix<F>,
    yt: &Array2<F>,
    nugget: F,
) -> Result<(F, LevelInnerParams<F>)> {
    // Set up R
    let mut r_mx: Array2<F> = Array2::<F>::eye(x_distances.n_obs).mapv(|v| v + v * nugget);
    for (i, ij) in x_distances.d_indices.outer_iter().enumerate() {
        r_mx[[ij[0], ij[1]]] = rxx[[i, 0]];
        r_mx[[ij[1], ij[0]]] = rxx[[i, 0]];
    }
    // R cholesky decomposition
    let r_chol = r_mx.cholesky()?;
    // Solve generalized least squared problem
    let ft = r_chol.solve_triangular(fx, UPLO::Lower)?;
    let (ft_qr_q, ft_qr_r) = ft.qr()?.into_decomp();

    // Check whether we have an ill-conditionned problem
    let (_, sv_qr_r, _) = ft_qr_r.svd(false, false)?;
    let cond_ft = sv_qr_r[sv_qr_r.len() - 1] / sv_qr_r[0];
    if cond_ft < F::cast(1e-10) {
        let (_, sv_f, _) = fx.svd(false, false)?;
        let cond_fx = sv_f[0] / sv_f[sv_f.len() - 1];
        if cond_fx > F::cast(1e15) {
            return Err(GpError::LikelihoodComputationError(
                "F is too ill conditioned. Poor combination \
                of regression model and observations."
                    .to_string(),
            ));
        } else {
            // ft is too ill conditioned, get out (try different theta)
            return Err(GpError::LikelihoodComputationError(
                "ft is too ill conditioned, try another theta again".to_string(),
            ));
        }
    }
    let yt_solved = r_chol.solve_triangular(yt, UPLO::Lower)?;

    let beta = ft_qr_r.solve_triangular_into(ft_qr_q.t().dot(&yt_solved), UPLO::Upper)?;
    let resid = yt_solved - ft.dot(&beta);
    let resid_sqr = resid.mapv(|v| v * v).sum_axis(Axis(0));

    let gamma = r_chol.t().solve_triangular_into(resid, UPLO::Upper)?;
    // The determinant of R is equal to the squared product of
    // the diagonal elements of its Cholesky decomposition r_chol
    let n_obs: F = F::cast(x_distances.n_obs);

    let logdet = r_chol.diag().mapv(|v: F| v.log10()).sum() * F::cast(2.) / n_obs;

    // Reduced likelihood
    let sigma2 = resid_sqr / n_obs;
    let reduced_likelihood = -n_obs * (sigma2.sum().log10() + logdet);

    Ok((
        reduced_likelihood,
        LevelInnerParams {
            sigma2: sigma2[0],
            beta,
            gamma,
            r_chol,
            ft,
            ft_qr_r,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, array, Array, Axis};

    fn forrester(x: &Array2<f64>) -> Array1<f64> {
        x.column(0)
            .mapv(|v| (6. * v - 2.).powi(2) * (12. * v - 4.).sin())
    }

    fn forrester_lofi(x: &Array2<f64>) -> Array1<f64> {
        let y = forrester(x);
        0.5 * &y + x.column(0).mapv(|v| 10. * (v - 0.5)) - 5.
    }

    fn forrester_dataset() -> MultiFidelityDataset<f64> {
        let xt_hifi = arr2(&[[0.], [0.4], [0.6], [1.]]);
        let xt_lofi = Array::linspace(0., 1., 11).insert_axis(Axis(1));
        MultiFidelityDataset::new()
            .set_training_values(&xt_lofi, &forrester_lofi(&xt_lofi), Some(0))
            .set_training_values(&xt_hifi, &forrester(&xt_hifi), None)
    }

    #[test]
    fn test_mfk_forrester_interpolation() {
        let dataset = forrester_dataset();
        let model = MfKriging::params()
            .n_start(5)
            .fit(&dataset)
            .expect("MFK fit");
        assert_eq!(2, model.n_levels());

        let (xt, yt) = model.training_data();
        let preds = model.predict(xt).expect("prediction");
        assert_abs_diff_eq!(yt, &preds, epsilon = 1e-3);

        // variance collapses at training points
        let vars = model.predict_var(xt).expect("variance");
        assert_abs_diff_eq!(Array1::<f64>::zeros(xt.nrows()), vars, epsilon = 1e-3);
    }

    #[test]
    fn test_mfk_forrester_accuracy() {
        let dataset = forrester_dataset();
        let model = MfKriging::params()
            .n_start(5)
            .fit(&dataset)
            .expect("MFK fit");

        let xe = Array::linspace(0., 1., 101).insert_axis(Axis(1));
        let ye = forrester(&xe);
        let preds = model.predict(&xe).expect("prediction");
        let err = (&preds - &ye).mapv(|v| v * v).sum().sqrt() / ye.mapv(|v| v * v).sum().sqrt();
        assert!(err < 0.5, "relative error too large: {err}");
    }

    #[test]
    fn test_mfk_single_fidelity() {
        // with a single level the model is an ordinary kriging
        let xt = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0]]);
        let yt = xt.column(0).mapv(|v: f64| (v - 3.5) * v.sin());
        let dataset = MultiFidelityDataset::new().set_training_values(&xt, &yt, None);
        let model = MfKriging::params()
            .n_start(5)
            .fit(&dataset)
            .expect("kriging fit");
        assert_eq!(1, model.n_levels());
        assert_eq!(0, model.rho().len());

        let preds = model.predict(&xt).expect("prediction");
        assert_abs_diff_eq!(yt, preds, epsilon = 1e-4);
    }

    #[test]
    fn test_mfk_fixed_theta() {
        let dataset = forrester_dataset();
        let model = MfKriging::params()
            .theta_tuning(ThetaTuning::Fixed(array![1.5]))
            .fit(&dataset)
            .expect("MFK fit");
        assert_abs_diff_eq!(&array![1.5], model.theta(0));
        assert_abs_diff_eq!(&array![1.5], model.theta(1));
    }

    #[test]
    fn test_mfk_missing_hifi() {
        let dataset = MultiFidelityDataset::new().set_training_values(
            &arr2(&[[0.], [1.]]),
            &array![0., 1.],
            Some(0),
        );
        assert!(matches!(
            MfKriging::params().fit(&dataset),
            Err(GpError::MissingHighFidelityError(_))
        ));
    }

    #[test]
    fn test_mfk_query_dim_mismatch() {
        let dataset = forrester_dataset();
        let model = MfKriging::params().n_start(2).fit(&dataset).expect("MFK fit");
        assert!(matches!(
            model.predict(&arr2(&[[0.5, 0.5]])),
            Err(GpError::DimensionMismatchError(_))
        ));
        assert!(matches!(
            model.predict_derivatives(&arr2(&[[0.5]]), 1),
            Err(GpError::InvalidValueError(_))
        ));
    }

    #[test]
    fn test_mfk_derivatives_vs_finite_diff() {
        // 2d quadratic, lofi is an affine transform of hifi
        let hifi = |x: &Array2<f64>| x.mapv(|v| v * v).sum_axis(Axis(1));
        let xt = arr2(&[
            [-8., -6.],
            [-5., 4.],
            [-1., -9.],
            [0., 0.],
            [2., 7.],
            [4., -3.],
            [6., 8.],
            [9., -7.],
            [-9., 9.],
            [7., 1.],
            [-3., -2.],
            [5., -8.],
            [8., 5.],
            [-6., 2.],
            [1., 6.],
            [3., -5.],
            [-7., 7.],
            [-2., -4.],
            [-4., 8.],
            [9., 3.],
        ]);
        let yt_hifi = hifi(&xt);
        let yt_lofi = 2. * &yt_hifi + 2.;
        let dataset = MultiFidelityDataset::new()
            .set_training_values(&xt, &yt_lofi, Some(0))
            .set_training_values(&xt, &yt_hifi, None);
        let model = MfKriging::params()
            .n_start(2)
            .fit(&dataset)
            .expect("MFK fit");

        let xe = arr2(&[[0.5, -1.5], [3.2, 2.1], [-4.5, 6.3]]);
        let grads = model.predict_gradients(&xe).expect("gradients");
        let h = 1e-4;
        for kx in 0..2 {
            let drv = model.predict_derivatives(&xe, kx).expect("derivatives");
            assert_abs_diff_eq!(grads.column(kx).to_owned(), drv, epsilon = 1e-12);
            let mut xp = xe.to_owned();
            let mut xm = xe.to_owned();
            xp.column_mut(kx).mapv_inplace(|v| v + h);
            xm.column_mut(kx).mapv_inplace(|v| v - h);
            let fd = (model.predict(&xp).unwrap() - model.predict(&xm).unwrap()) / (2. * h);
            assert_abs_diff_eq!(fd, drv, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_mfk_kpls_dim_reduction() {
        // output only varies along the x0 + x1 direction,
        // a single PLS component is enough
        let xt = arr2(&[
            [0., 0.],
            [1., 0.],
            [0., 2.],
            [2., 1.],
            [1., 3.],
            [3., 2.],
            [2., 4.],
            [4., 3.],
            [3., 5.],
            [5., 4.],
            [4., 6.],
            [6., 5.],
        ]);
        let yt_hifi = xt.sum_axis(Axis(1));
        let yt_lofi = 2. * &yt_hifi + 2.;
        let dataset = MultiFidelityDataset::new()
            .set_training_values(&xt, &yt_lofi, Some(0))
            .set_training_values(&xt, &yt_hifi, None);
        let model = MfKriging::params()
            .kpls_dim(Some(1))
            .n_start(3)
            .fit(&dataset)
            .expect("MFK fit with PLS");

        // hyperparameters live in the reduced space
        assert_eq!(1, model.theta(0).len());
        assert_eq!(1, model.theta(1).len());

        let preds = model.predict(&xt).expect("prediction");
        assert_abs_diff_eq!(yt_hifi, preds, epsilon = 1e-3);

        let pred = model.predict(&arr2(&[[2.5, 2.5]])).expect("prediction");
        assert_abs_diff_eq!(5., pred[0], epsilon = 0.3);
    }

    #[test]
    fn test_mfk_rho_recovery() {
        // hifi and lofi are linearly related, rho should recover the slope inverse
        let xt = Array::linspace(0., 1., 10).insert_axis(Axis(1));
        let yt_hifi = xt.column(0).mapv(|v: f64| (4. * v).sin() + v);
        let yt_lofi = 2. * &yt_hifi + 2.;
        let dataset = MultiFidelityDataset::new()
            .set_training_values(&xt, &yt_lofi, Some(0))
            .set_training_values(&xt, &yt_hifi, None);
        let model = MfKriging::params()
            .n_start(3)
            .fit(&dataset)
            .expect("MFK fit");
        let rho = model.rho();
        assert_eq!(1, rho.len());
        // scaled-space rho differs from 0.5 by the level output scalings,
        // here common to both levels so the prediction must still match hifi
        let preds = model.predict(&xt).expect("prediction");
        assert_abs_diff_eq!(yt_hifi, preds, epsilon = 1e-4);
    }
}
