//! LU factorization with partial pivoting, cached for repeated solves.

use crate::Float;

use super::base::Matrix;

/// Factorization failed: the matrix is numerically singular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Singular;

/// Permuted LU factors of a square matrix.
///
/// The factors are computed once and the permutation is stored alongside, so
/// `A x = b` can be solved repeatedly with two triangular substitutions and
/// no refactorization.
#[derive(Clone, Debug)]
pub struct Lu {
    /// L (below the diagonal, unit diagonal implied) and U packed together.
    lu: Matrix,
    perm: Vec<usize>,
}

impl Lu {
    /// Factorize `a`. Returns [`Singular`] if a pivot vanishes.
    pub fn factor(a: &Matrix) -> Result<Lu, Singular> {
        let n = a.nrows();
        assert_eq!(n, a.ncols(), "LU factorization requires a square matrix");

        let mut lu = a.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // pivot
            let mut pivot_row = k;
            let mut pivot_val = lu[(k, k)].abs();
            for i in (k + 1)..n {
                let val = lu[(i, k)].abs();
                if val > pivot_val {
                    pivot_val = val;
                    pivot_row = i;
                }
            }
            if pivot_val == 0.0 {
                return Err(Singular);
            }
            if pivot_row != k {
                for j in 0..n {
                    let tmp = lu[(k, j)];
                    lu[(k, j)] = lu[(pivot_row, j)];
                    lu[(pivot_row, j)] = tmp;
                }
                perm.swap(k, pivot_row);
            }
            // Eliminate below the pivot
            let akk = lu[(k, k)];
            for i in (k + 1)..n {
                let factor = lu[(i, k)] / akk;
                lu[(i, k)] = factor;
                for j in (k + 1)..n {
                    lu[(i, j)] -= factor * lu[(k, j)];
                }
            }
        }

        Ok(Lu { lu, perm })
    }

    /// Solve `A x = b`, returning x.
    pub fn solve(&self, b: &[Float]) -> Vec<Float> {
        let n = self.perm.len();
        assert_eq!(
            b.len(),
            n,
            "dimension mismatch in solve: A is {}x{}, b has length {}",
            n,
            n,
            b.len()
        );
        let mut x = vec![0.0; n];
        // Forward solve L y = P b
        for i in 0..n {
            let mut sum = b[self.perm[i]];
            for k in 0..i {
                sum -= self.lu[(i, k)] * x[k];
            }
            x[i] = sum;
        }
        // Backward solve U x = y
        for i in (0..n).rev() {
            let mut sum = x[i];
            for k in (i + 1)..n {
                sum -= self.lu[(i, k)] * x[k];
            }
            x[i] = sum / self.lu[(i, i)];
        }
        x
    }

    /// In-place solve: overwrites `b` with `x`.
    pub fn solve_mut(&self, b: &mut [Float]) {
        let x = self.solve(b);
        b.copy_from_slice(&x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_full_2x2() {
        // A = [[3, 2],[1, 4]], b = [5, 6] -> x = [0.8, 1.3]
        let a = Matrix::from_rows(&[&[3.0, 2.0], &[1.0, 4.0]]);
        let lu = Lu::factor(&a).unwrap();
        let x = lu.solve(&[5.0, 6.0]);
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn solve_3x3_reuses_factors() {
        let a = Matrix::from_rows(&[&[2.0, 1.0, -1.0], &[-3.0, -1.0, 2.0], &[-2.0, 1.0, 2.0]]);
        let lu = Lu::factor(&a).unwrap();
        let x = lu.solve(&[8.0, -11.0, -3.0]);
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
        assert!((x[2] + 1.0).abs() < 1e-12);
        // Second solve with the same factors
        let mut b = vec![1.0, 0.0, 0.0];
        lu.solve_mut(&mut b);
        for i in 0..3 {
            let mut row = 0.0;
            for j in 0..3 {
                row += a[(i, j)] * b[j];
            }
            let expected = if i == 0 { 1.0 } else { 0.0 };
            assert!((row - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn singular_matrix_is_reported() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert_eq!(Lu::factor(&a).unwrap_err(), Singular);
    }

    #[test]
    fn identity_solve_is_identity() {
        let lu = Lu::factor(&Matrix::identity(4)).unwrap();
        let b = vec![1.0, -2.0, 3.0, -4.0];
        assert_eq!(lu.solve(&b), b);
    }
}
