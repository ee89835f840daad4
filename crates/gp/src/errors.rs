use thiserror::Error;

/// A result type for multi-fidelity GP training and prediction
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using a [`MultiFidelityGp`](crate::MultiFidelityGp) model
#[derive(Error, Debug)]
pub enum GpError {
    /// When likelihood computation fails
    #[error("Likelihood computation error: {0}")]
    LikelihoodComputationError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When PLS regression fails
    #[error("PLS error: {0}")]
    PlsError(#[from] linfa_pls::PlsError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When array shapes are inconsistent
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
    /// When training is requested without a highest-fidelity dataset
    #[error("Missing highest fidelity dataset: {0}")]
    MissingHighFidelityError(String),
    /// When fidelity datasets do not share the same input dimension
    #[error("Fidelity dimension mismatch: {0}")]
    DimensionMismatchError(String),
    /// When an error is due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
