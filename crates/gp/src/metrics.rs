//! Accuracy metrics for trained surrogate models.
//!
//! The main metric is the relative root-mean-square error of predictions
//! against reference values, `||pred - truth||_2 / ||truth||_2`. It falls
//! back to the absolute root-mean-square error when the reference values
//! are all close to zero.

use crate::algorithm::MultiFidelityGp;
use crate::correlation_models::CorrelationModel;
use crate::errors::Result;
use crate::mean_models::RegressionModel;
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};

/// Below this reference norm the error is reported as absolute RMSE
const RMS_DENOM_EPS: f64 = 1e-12;

/// Relative root-mean-square distance between two value vectors,
/// absolute root-mean-square when the reference norm vanishes.
pub fn relative_rms<F: Float>(
    pred: &ArrayBase<impl Data<Elem = F>, Ix1>,
    truth: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    let diff_norm = (pred - truth).mapv(|v| v * v).sum().sqrt();
    let truth_norm = truth.mapv(|v| v * v).sum().sqrt();
    if truth_norm < F::cast(RMS_DENOM_EPS) {
        (diff_norm * diff_norm / F::cast(truth.len())).sqrt()
    } else {
        diff_norm / truth_norm
    }
}

/// Relative RMS error of model predictions against reference outputs `ye`
/// at points `xe`.
pub fn rms_error<F, Mean, Corr>(
    model: &MultiFidelityGp<F, Mean, Corr>,
    xe: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ye: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<F>
where
    F: Float,
    Mean: RegressionModel<F>,
    Corr: CorrelationModel<F>,
{
    let preds = model.predict(xe)?;
    Ok(relative_rms(&preds, ye))
}

/// Relative RMS error of model derivative predictions along the `kx`th
/// component against reference derivatives `dye` at points `xe`.
pub fn rms_derivative_error<F, Mean, Corr>(
    model: &MultiFidelityGp<F, Mean, Corr>,
    xe: &ArrayBase<impl Data<Elem = F>, Ix2>,
    dye: &ArrayBase<impl Data<Elem = F>, Ix1>,
    kx: usize,
) -> Result<F>
where
    F: Float,
    Mean: RegressionModel<F>,
    Corr: CorrelationModel<F>,
{
    let drvs = model.predict_derivatives(xe, kx)?;
    Ok(relative_rms(&drvs, dye))
}

/// Relative RMS error of the model on its own highest fidelity training data.
/// An interpolating model scores close to zero.
pub fn training_rms_error<F, Mean, Corr>(model: &MultiFidelityGp<F, Mean, Corr>) -> Result<F>
where
    F: Float,
    Mean: RegressionModel<F>,
    Corr: CorrelationModel<F>,
{
    let (xt, yt) = model.training_data();
    let preds = model.predict(xt)?;
    Ok(relative_rms(&preds, yt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MfKriging, MultiFidelityDataset};
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, array};

    #[test]
    fn test_relative_rms() {
        let truth = array![3., 4.];
        assert_abs_diff_eq!(0., relative_rms(&truth, &truth), epsilon = 1e-12);
        // ||pred - truth|| = 5, ||truth|| = 5
        let pred = array![0., 0.];
        assert_abs_diff_eq!(1., relative_rms(&pred, &truth), epsilon = 1e-12);
    }

    #[test]
    fn test_relative_rms_zero_reference() {
        let truth = array![0., 0., 0., 0.];
        let pred = array![1., -1., 1., -1.];
        // absolute RMSE fallback
        assert_abs_diff_eq!(1., relative_rms(&pred, &truth), epsilon = 1e-12);
    }

    #[test]
    fn test_training_rms_error() {
        let xt = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0]]);
        let yt = xt.column(0).mapv(|v: f64| v * v.sin());
        let dataset = MultiFidelityDataset::new().set_training_values(&xt, &yt, None);
        let model = MfKriging::params()
            .n_start(3)
            .fit(&dataset)
            .expect("kriging fit");
        let err = training_rms_error(&model).expect("training error");
        assert!(err < 1e-3, "training error too large: {err}");
    }
}
