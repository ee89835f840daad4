use crate::Problem;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};

/// The sphere function `f(x) = sum(x_i^2)` on `[-10, 10]^ndim`.
#[derive(Clone, Debug)]
pub struct Sphere {
    ndim: usize,
}

impl Sphere {
    /// Constructor given the problem dimension.
    pub fn new(ndim: usize) -> Self {
        Sphere { ndim }
    }

    /// Problem dimension
    pub fn ndim(&self) -> usize {
        self.ndim
    }
}

impl<F: Float> Problem<F> for Sphere {
    fn xlimits(&self) -> Array2<F> {
        let mut xlimits = Array2::zeros((self.ndim, 2));
        xlimits.column_mut(0).fill(F::cast(-10.));
        xlimits.column_mut(1).fill(F::cast(10.));
        xlimits
    }

    fn eval(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        x.mapv(|v| v * v).sum_axis(Axis(1))
    }

    fn eval_derivative(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>, kx: usize) -> Array1<F> {
        x.column(kx).mapv(|v| F::cast(2.) * v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_sphere() {
        let prob = Sphere::new(3);
        let x = array![[1., 2., 3.], [0., 0., 0.], [-1., 1., -1.]];
        assert_abs_diff_eq!(array![14., 0., 3.], prob.eval(&x), epsilon = 1e-12);
        assert_abs_diff_eq!(
            array![2., 0., -2.],
            prob.eval_derivative(&x, 0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            array![6., 0., -2.],
            prob.eval_derivative(&x, 2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sphere_xlimits() {
        let prob = Sphere::new(2);
        let lim: Array2<f64> = prob.xlimits();
        assert_abs_diff_eq!(array![[-10., 10.], [-10., 10.]], lim, epsilon = 1e-12);
    }
}
