//! End-to-end multi-fidelity kriging scenarios: sample a design of
//! experiments, evaluate an analytic function at two fidelity levels,
//! train and check prediction accuracy at held-out points.

use mfbox::doe::{FullFactorial, Lhs, SamplingMethod};
use mfbox::gp::metrics::{rms_derivative_error, rms_error, training_rms_error};
use mfbox::gp::{MfKriging, MultiFidelityDataset};
use mfbox::problems::{Problem, Sphere, TensorProduct, TensorProductKind};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// The low fidelity source is a biased affine transform of the
/// high fidelity function
fn lofi(y: &Array1<f64>) -> Array1<f64> {
    2. * y + 2.
}

#[test]
fn test_mfk_tensor_product_full_factorial() {
    let _ = env_logger::builder().is_test(true).try_init();
    for kind in [
        TensorProductKind::Exp,
        TensorProductKind::Tanh,
        TensorProductKind::Cos,
    ] {
        let prob = TensorProduct::new(3, kind);
        let xlimits: Array2<f64> = prob.xlimits();

        let xt = FullFactorial::new(&xlimits).clip(true).sample(100);
        let yt = prob.eval(&xt);
        let dataset = MultiFidelityDataset::new()
            .set_training_values(&xt, &lofi(&yt), Some(0))
            .set_training_values(&xt, &yt, None);

        let model = MfKriging::params()
            .theta_init(Array1::from_elem(3, 1e-2))
            .n_start(2)
            .xlimits(&xlimits)
            .fit(&dataset)
            .expect("MFK fit");

        let xe = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(100);
        let ye = prob.eval(&xe);

        let train_err = training_rms_error(&model).expect("training error");
        let eval_err = rms_error(&model, &xe, &ye).expect("eval error");
        assert!(
            train_err < 1.0,
            "training error too large for {kind:?}: {train_err}"
        );
        assert!(
            eval_err < 1.0,
            "evaluation error too large for {kind:?}: {eval_err}"
        );
    }
}

#[test]
fn test_mfk_derivatives_sphere_lhs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let prob = Sphere::new(3);
    let xlimits: Array2<f64> = prob.xlimits();

    let xt = Lhs::new(&xlimits)
        .with_rng(Xoshiro256Plus::seed_from_u64(0))
        .sample(500);
    let yt = prob.eval(&xt);
    let dataset = MultiFidelityDataset::new()
        .set_training_values(&xt, &lofi(&yt), Some(0))
        .set_training_values(&xt, &yt, None);

    // 500-point levels: keep the hyperparameter optimization budget small
    let model = MfKriging::params()
        .theta_init(Array1::from_elem(3, 1e-2))
        .n_start(1)
        .max_eval(25)
        .xlimits(&xlimits)
        .fit(&dataset)
        .expect("MFK fit");

    let xe = Lhs::new(&xlimits)
        .with_rng(Xoshiro256Plus::seed_from_u64(1))
        .sample(100);
    for kx in 0..2 {
        let dye = prob.eval_derivative(&xe, kx);
        let err = rms_derivative_error(&model, &xe, &dye, kx).expect("derivative error");
        assert!(
            err < 0.1,
            "derivative error too large along component {kx}: {err}"
        );
    }
}
