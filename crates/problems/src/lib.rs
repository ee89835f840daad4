/*!
This library implements analytic test functions used to benchmark surrogate models,
a port of a subset of [SMT problems](https://smt.readthedocs.io/en/latest/_src_docs/problems.html).

A problem owns its design space bounds and can be evaluated at a set of points,
either for its value or for its partial derivative along a given coordinate.

Example:
```
use mfbox_problems::{Problem, Sphere};
use ndarray::array;

let prob = Sphere::new(2);
let x = array![[1., 2.], [0., 0.]];
let y = prob.eval(&x);               // [5., 0.]
let dy0 = prob.eval_derivative(&x, 0); // [2., 0.]
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod sphere;
mod tensor_product;

pub use sphere::*;
pub use tensor_product::*;

use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

/// An analytic test function defined on a rectangular design space.
pub trait Problem<F: Float> {
    /// Returns the problem design space as a (nx, 2) matrix
    /// \[\[lower bound, upper bound\], ...\]
    fn xlimits(&self) -> Array2<F>;

    /// Evaluates the function at the given (n, nx) points, returning n values.
    fn eval(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F>;

    /// Evaluates the partial derivative along the `kx`th coordinate
    /// at the given (n, nx) points, returning n values.
    fn eval_derivative(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>, kx: usize) -> Array1<F>;
}
