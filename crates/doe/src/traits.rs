use linfa::Float;
use ndarray::Array2;

/// Sampling method allowing to generate a DoE in a given sample space.
///
/// A sampling method generates a set of `ns` samples within the sample space
/// `[lower_bound_xi, upper_bound_xi]^nx` of `R^nx` where `nx` is the dimension
/// of the sample space: x = (x_i) with i in [1, nx].
pub trait SamplingMethod<F: Float> {
    /// Returns the bounds of the sample space as a (nx, 2) matrix
    /// where the ith row is the interval of the ith component of a sample.
    fn sampling_space(&self) -> &Array2<F>;

    /// Generates samples belonging to the `[0., 1.]^nx` hypercube.
    ///
    /// The result is an (ns, nx) matrix, except for grid-based methods which
    /// may return more rows than requested (see [FullFactorial](crate::FullFactorial)).
    fn normalized_sample(&self, ns: usize) -> Array2<F>;

    /// Generates samples belonging to `[lower_bound_xi, upper_bound_xi]^nx`,
    /// where bounds are the values returned by `sampling_space`.
    fn sample(&self, ns: usize) -> Array2<F> {
        let xlimits = self.sampling_space();
        let lower = xlimits.column(0);
        let scaler = &xlimits.column(1) - &lower;
        self.normalized_sample(ns) * scaler + lower
    }
}
