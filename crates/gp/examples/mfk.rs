//! Multi-fidelity kriging on the 1-d Forrester function:
//! 4 expensive high fidelity points helped by 11 cheap low fidelity ones.

use mfbox_gp::{MfKriging, MultiFidelityDataset};
use ndarray::{arr2, Array, Array1, Array2, Axis};

fn hifi(x: &Array2<f64>) -> Array1<f64> {
    x.column(0)
        .mapv(|v| (6. * v - 2.).powi(2) * (12. * v - 4.).sin())
}

fn lofi(x: &Array2<f64>) -> Array1<f64> {
    let y = hifi(x);
    0.5 * &y + x.column(0).mapv(|v| 10. * (v - 0.5)) - 5.
}

fn main() {
    env_logger::init();

    let xt_hifi = arr2(&[[0.], [0.4], [0.6], [1.]]);
    let xt_lofi = Array::linspace(0., 1., 11).insert_axis(Axis(1));

    let dataset = MultiFidelityDataset::new()
        .set_training_values(&xt_lofi, &lofi(&xt_lofi), Some(0))
        .set_training_values(&xt_hifi, &hifi(&xt_hifi), None);
    let model = MfKriging::params().fit(&dataset).expect("MFK fit");
    println!("trained: {model}");

    let x = Array::linspace(0., 1., 21).insert_axis(Axis(1));
    let preds = model.predict(&x).expect("prediction");
    let vars = model.predict_var(&x).expect("variance");
    let drvs = model.predict_derivatives(&x, 0).expect("derivatives");

    println!("{:>8} {:>10} {:>10} {:>10} {:>10}", "x", "hifi", "pred", "var", "dpred");
    for i in 0..x.nrows() {
        println!(
            "{:8.3} {:10.4} {:10.4} {:10.4} {:10.4}",
            x[[i, 0]],
            hifi(&x)[i],
            preds[i],
            vars[i],
            drvs[i]
        );
    }
}
