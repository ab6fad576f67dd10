//! Linear algebra utilities in functional style
//!
//! Thin wrappers over `ndarray` used by the density builders. The
//! transpose-multiply is written out by hand so its summation order is fixed
//! regardless of which matrix-multiplication backend `ndarray` links.

use ndarray::{Array1, Array2, ArrayView2};

/// Type alias for matrix (2D array)
pub type Matrix = Array2<f64>;

/// Type alias for vector (1D array)
pub type Vector = Array1<f64>;

/// Creates a zero matrix of given dimensions
pub fn zeros(rows: usize, cols: usize) -> Matrix {
    Array2::zeros((rows, cols))
}

/// Computes `transpose(c) * c` for a row-major coefficient block
///
/// Rows of `c` are orbitals, columns are basis functions, so the result is
/// `ncols x ncols`. Each entry is summed over rows in ascending order and the
/// upper triangle is mirrored, giving an exactly symmetric matrix that is
/// bit-identical across calls.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use orbital_density::linalg::gram;
/// let c = array![[1.0, 2.0], [3.0, 4.0]];
/// let p = gram(c.view());
/// assert_eq!(p[[0, 1]], 1.0 * 2.0 + 3.0 * 4.0);
/// assert_eq!(p[[1, 0]], p[[0, 1]]);
/// ```
pub fn gram(c: ArrayView2<f64>) -> Matrix {
    let (n_rows, n) = c.dim();
    let mut p = zeros(n, n);

    for mu in 0..n {
        for nu in mu..n {
            let mut sum = 0.0;
            for i in 0..n_rows {
                sum += c[[i, mu]] * c[[i, nu]];
            }
            p[[mu, nu]] = sum;
            p[[nu, mu]] = sum;
        }
    }

    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gram_matches_dot() {
        let c = Array2::from_shape_vec((2, 3), vec![
            0.5, -1.0, 2.0,
            1.5, 0.25, -0.75,
        ]).unwrap();

        let p = gram(c.view());
        let reference = c.t().dot(&c);

        assert_eq!(p.dim(), (3, 3));
        for (a, b) in p.iter().zip(reference.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gram_is_exactly_symmetric() {
        let c = Array2::from_shape_vec((3, 3), vec![
            0.1, 0.7, -0.3,
            0.9, -0.2, 0.4,
            -0.6, 0.8, 0.05,
        ]).unwrap();

        let p = gram(c.view());
        assert_eq!(p, p.t());
    }

    #[test]
    fn test_gram_of_empty_rows_is_zero() {
        let c = zeros(0, 4);
        let p = gram(c.view());
        assert_eq!(p.dim(), (4, 4));
        assert_eq!(p, zeros(4, 4));
    }

    #[test]
    fn test_gram_is_repeatable() {
        let c = Array2::from_shape_fn((4, 5), |(i, j)| ((i * 7 + j * 3) as f64).sin());
        assert_eq!(gram(c.view()), gram(c.view()));
    }
}
