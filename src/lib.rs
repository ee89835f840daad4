//! `mfbox` is a toolbox for multi-fidelity gaussian process surrogate modeling,
//! a Rust port of the [SMT MFK application](https://smt.readthedocs.io/en/latest/_src_docs/applications/mfk.html).
//!
//! It gathers three crates:
//! * [`doe`]: sampling methods to generate design of experiments
//!   (Latin hypercube, full-factorial, random),
//! * [`problems`]: analytic test functions with derivatives,
//! * [`gp`]: the multi-fidelity kriging model itself.
//!
//! ```no_run
//! use mfbox::doe::{Lhs, SamplingMethod};
//! use mfbox::gp::{MfKriging, MultiFidelityDataset};
//! use mfbox::problems::{Problem, Sphere};
//! use ndarray::Array2;
//!
//! let prob = Sphere::new(2);
//! let xlimits: Array2<f64> = prob.xlimits();
//! let xt = Lhs::new(&xlimits).sample(50);
//! let yt = prob.eval(&xt);
//! // cheaper biased information source
//! let yt_lofi = 2. * &yt + 2.;
//!
//! let dataset = MultiFidelityDataset::new()
//!     .set_training_values(&xt, &yt_lofi, Some(0))
//!     .set_training_values(&xt, &yt, None);
//! let model = MfKriging::params().fit(&dataset).expect("MFK fit");
//! let preds = model.predict(&xt).expect("prediction");
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub use mfbox_doe as doe;
pub use mfbox_gp as gp;
pub use mfbox_problems as problems;
