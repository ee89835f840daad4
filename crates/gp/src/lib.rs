//! This library implements multi-fidelity [Kriging](https://en.wikipedia.org/wiki/Kriging)
//! (aka MFK) surrogate models, a port of the
//! [SMT MFK application](https://smt.readthedocs.io/en/latest/_src_docs/applications/mfk.html).
//!
//! A multi-fidelity model blends cheap low-fidelity evaluations of a function
//! with a few expensive high-fidelity ones using the recursive co-kriging
//! formulation of Le Gratiet: the lowest fidelity level is an ordinary kriging
//! model, and each subsequent level models the residual with respect to the
//! previous level posterior mean, the scale factor between levels being
//! estimated by generalized least squares jointly with the polynomial trend.
//!
//! MFK methods are implemented by [MultiFidelityGp] parameterized by [MfkParams]
//! and trained on a [MultiFidelityDataset]. With a single fidelity level the
//! model is an ordinary kriging model.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod correlation_models;
mod dataset;
mod errors;
pub mod mean_models;
pub mod metrics;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use dataset::*;
pub use errors::*;
pub use parameters::*;
pub use utils::DiffMatrix;
