use crate::Problem;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2, Zip};

/// The univariate factor of a [TensorProduct] problem.
#[derive(Clone, Copy, Debug)]
pub enum TensorProductKind {
    /// `f(x) = prod exp(x_i)`
    Exp,
    /// `f(x) = prod tanh(x_i)`
    Tanh,
    /// `f(x) = prod cos(a * pi * x_i)`
    Cos,
}

/// A tensor-product test function `f(x) = prod g(x_i)` on `[-1, 1]^ndim`,
/// where `g` is a univariate factor given by [TensorProductKind].
#[derive(Clone, Debug)]
pub struct TensorProduct {
    ndim: usize,
    kind: TensorProductKind,
    /// frequency factor of the Cos kind
    a: f64,
}

impl TensorProduct {
    /// Constructor given the problem dimension and the univariate factor.
    pub fn new(ndim: usize, kind: TensorProductKind) -> Self {
        TensorProduct { ndim, kind, a: 1. }
    }

    /// Problem dimension
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    fn factor<F: Float>(&self, v: F) -> F {
        match self.kind {
            TensorProductKind::Exp => v.exp(),
            TensorProductKind::Tanh => v.tanh(),
            TensorProductKind::Cos => (F::cast(self.a) * F::cast(std::f64::consts::PI) * v).cos(),
        }
    }

    fn factor_derivative<F: Float>(&self, v: F) -> F {
        match self.kind {
            TensorProductKind::Exp => v.exp(),
            TensorProductKind::Tanh => {
                let t = v.tanh();
                F::one() - t * t
            }
            TensorProductKind::Cos => {
                let apx = F::cast(self.a) * F::cast(std::f64::consts::PI);
                -apx * (apx * v).sin()
            }
        }
    }
}

impl<F: Float> Problem<F> for TensorProduct {
    fn xlimits(&self) -> Array2<F> {
        let mut xlimits = Array2::zeros((self.ndim, 2));
        xlimits.column_mut(0).fill(F::cast(-1.));
        xlimits.column_mut(1).fill(F::one());
        xlimits
    }

    fn eval(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        let mut y = Array1::zeros(x.nrows());
        Zip::from(&mut y).and(x.rows()).for_each(|yi, xi| {
            *yi = xi.fold(F::one(), |acc, &v| acc * self.factor(v));
        });
        y
    }

    fn eval_derivative(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>, kx: usize) -> Array1<F> {
        let mut dy = Array1::zeros(x.nrows());
        Zip::from(&mut dy).and(x.rows()).for_each(|dyi, xi| {
            let rest = xi
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != kx)
                .fold(F::one(), |acc, (_, &v)| acc * self.factor(v));
            *dyi = self.factor_derivative(xi[kx]) * rest;
        });
        dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_tensor_product_exp() {
        let prob = TensorProduct::new(3, TensorProductKind::Exp);
        let x = array![[0., 0., 0.], [1., 1., 1.]];
        assert_abs_diff_eq!(
            array![1., (3f64).exp()],
            prob.eval(&x),
            epsilon = 1e-12
        );
        // d/dx0 of exp(x0+x1+x2) is the function itself
        assert_abs_diff_eq!(
            array![1., (3f64).exp()],
            prob.eval_derivative(&x, 0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tensor_product_tanh() {
        let prob = TensorProduct::new(2, TensorProductKind::Tanh);
        let x = array![[0.5, -0.5]];
        let t = 0.5f64.tanh();
        assert_abs_diff_eq!(array![-t * t], prob.eval(&x), epsilon = 1e-12);
        assert_abs_diff_eq!(
            array![(1. - t * t) * (-t)],
            prob.eval_derivative(&x, 0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tensor_product_cos() {
        let prob = TensorProduct::new(2, TensorProductKind::Cos);
        let x = array![[0., 0.], [1., 0.]];
        assert_abs_diff_eq!(array![1., -1.], prob.eval(&x), epsilon = 1e-12);
        // derivative of cos(pi x) is -pi sin(pi x), zero at integers
        assert_abs_diff_eq!(
            array![0., 0.],
            prob.eval_derivative(&x, 0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_tensor_product_derivative_finite_diff() {
        let prob = TensorProduct::new(3, TensorProductKind::Tanh);
        let x = array![[0.3, -0.7, 0.1]];
        let h = 1e-6;
        for kx in 0..3 {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[[0, kx]] += h;
            xm[[0, kx]] -= h;
            let fd = (prob.eval(&xp)[0] - prob.eval(&xm)[0]) / (2. * h);
            let an = prob.eval_derivative(&x, kx)[0];
            assert_abs_diff_eq!(fd, an, epsilon = 1e-6);
        }
    }
}
