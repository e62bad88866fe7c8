//! Coefficient tables for the registered methods.

use crate::{Float, matrix::Matrix};

use super::{ButcherTableau, Method};

/// First nonzero diagonal entry of A, or zero for explicit tableaus. Used as
/// the diagonal weight of the embedded update and error formula.
fn first_implicit_diag(a: &Matrix) -> Float {
    (0..a.nrows())
        .map(|i| a[(i, i)])
        .find(|&v| v != 0.0)
        .unwrap_or(0.0)
}

/// Build the tableau of a registered method.
pub(super) fn coefficients(method: Method) -> ButcherTableau {
    let one_third = 1.0 / 3.0;
    let one_six = 1.0 / 6.0;

    let sqrt3 = (3.0 as Float).sqrt();
    let sqrt5 = (5.0 as Float).sqrt();
    let sqrt6 = (6.0 as Float).sqrt();
    let sqrt15 = (15.0 as Float).sqrt();

    let (a, b, b2, c, order, order2, fsal): (
        Matrix,
        Vec<Float>,
        Vec<Float>,
        Vec<Float>,
        usize,
        usize,
        bool,
    ) = match method {
        Method::ExplicitEuler => (
            Matrix::from_rows(&[&[0.0]]),
            vec![1.0],
            vec![],
            vec![0.0],
            1,
            0,
            false,
        ),

        Method::RungeKutta4 => (
            Matrix::from_rows(&[
                &[0.0, 0.0, 0.0, 0.0],
                &[0.5, 0.0, 0.0, 0.0],
                &[0.0, 0.5, 0.0, 0.0],
                &[0.0, 0.0, 1.0, 0.0],
            ]),
            vec![one_six, one_third, one_third, one_six],
            vec![],
            vec![0.0, 0.5, 0.5, 1.0],
            4,
            0,
            false,
        ),

        Method::BogackiShampine32 => (
            Matrix::from_rows(&[
                &[0.0, 0.0, 0.0, 0.0],
                &[0.5, 0.0, 0.0, 0.0],
                &[0.0, 0.75, 0.0, 0.0],
                &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
            ]),
            vec![2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
            vec![7.0 / 24.0, 0.25, 1.0 / 3.0, 1.0 / 8.0],
            vec![0.0, 0.5, 0.75, 1.0],
            3,
            2,
            true,
        ),

        Method::CashKarp54 => (
            Matrix::from_rows(&[
                &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
                &[3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0, 0.0],
                &[-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0, 0.0],
                &[
                    1631.0 / 55296.0,
                    175.0 / 512.0,
                    575.0 / 13824.0,
                    44275.0 / 110592.0,
                    253.0 / 4096.0,
                    0.0,
                ],
            ]),
            vec![
                37.0 / 378.0,
                0.0,
                250.0 / 621.0,
                125.0 / 594.0,
                0.0,
                512.0 / 1771.0,
            ],
            vec![
                2825.0 / 27648.0,
                0.0,
                18575.0 / 48384.0,
                13525.0 / 55296.0,
                277.0 / 14336.0,
                1.0 / 4.0,
            ],
            vec![0.0, 0.2, 0.3, 0.6, 1.0, 7.0 / 8.0],
            5,
            4,
            false,
        ),

        Method::DormandPrince54 => (
            Matrix::from_rows(&[
                &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0, 0.0],
                &[
                    19372.0 / 6561.0,
                    -25360.0 / 2187.0,
                    64448.0 / 6561.0,
                    -212.0 / 729.0,
                    0.0,
                    0.0,
                    0.0,
                ],
                &[
                    9017.0 / 3168.0,
                    -355.0 / 33.0,
                    46732.0 / 5247.0,
                    49.0 / 176.0,
                    -5103.0 / 18656.0,
                    0.0,
                    0.0,
                ],
                &[
                    35.0 / 384.0,
                    0.0,
                    500.0 / 1113.0,
                    125.0 / 192.0,
                    -2187.0 / 6784.0,
                    11.0 / 84.0,
                    0.0,
                ],
            ]),
            vec![
                35.0 / 384.0,
                0.0,
                500.0 / 1113.0,
                125.0 / 192.0,
                -2187.0 / 6784.0,
                11.0 / 84.0,
                0.0,
            ],
            vec![
                5179.0 / 57600.0,
                0.0,
                7571.0 / 16695.0,
                393.0 / 640.0,
                -92097.0 / 339200.0,
                187.0 / 2100.0,
                1.0 / 40.0,
            ],
            vec![0.0, 0.2, 0.3, 0.8, 8.0 / 9.0, 1.0, 1.0],
            5,
            4,
            true,
        ),

        Method::Fehlberg54 => (
            Matrix::from_rows(&[
                &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[1.0 / 4.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                &[3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0, 0.0],
                &[
                    1932.0 / 2197.0,
                    -7200.0 / 2197.0,
                    7296.0 / 2197.0,
                    0.0,
                    0.0,
                    0.0,
                ],
                &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0, 0.0],
                &[
                    -8.0 / 27.0,
                    2.0,
                    -3544.0 / 2565.0,
                    1859.0 / 4104.0,
                    -11.0 / 40.0,
                    0.0,
                ],
            ]),
            vec![
                16.0 / 135.0,
                0.0,
                6656.0 / 12825.0,
                28561.0 / 56430.0,
                -9.0 / 50.0,
                2.0 / 55.0,
            ],
            vec![
                25.0 / 216.0,
                0.0,
                1408.0 / 2565.0,
                2197.0 / 4104.0,
                -1.0 / 5.0,
                0.0,
            ],
            vec![0.0, 0.25, 0.375, 12.0 / 13.0, 1.0, 0.5],
            5,
            4,
            false,
        ),

        // IMPLICIT METHODS:
        Method::ImplicitEuler => (
            Matrix::from_rows(&[&[1.0]]),
            vec![1.0],
            vec![],
            vec![1.0],
            1,
            0,
            false,
        ),

        Method::ImplicitMidpoint => (
            Matrix::from_rows(&[&[0.5]]),
            vec![1.0],
            vec![],
            vec![0.5],
            2,
            0,
            false,
        ),

        Method::LobattoIIIA21 => (
            Matrix::from_rows(&[&[0.0, 0.0], &[0.5, 0.5]]),
            vec![0.5, 0.5],
            vec![0.25, 0.75],
            vec![0.0, 1.0],
            2,
            1,
            false,
        ),

        Method::LobattoIIIC21 => (
            Matrix::from_rows(&[&[0.5, -0.5], &[0.5, 0.5]]),
            vec![0.5, 0.5],
            vec![1.0 / 3.0, 2.0 / 3.0],
            vec![0.0, 1.0],
            2,
            1,
            false,
        ),

        Method::RadauIA32 => (
            Matrix::from_rows(&[&[1.0 / 4.0, -1.0 / 4.0], &[1.0 / 4.0, 5.0 / 12.0]]),
            vec![1.0 / 4.0, 3.0 / 4.0],
            vec![],
            vec![0.0, 2.0 / 3.0],
            3,
            0,
            false,
        ),

        Method::RadauIIA32 => (
            Matrix::from_rows(&[&[5.0 / 12.0, -1.0 / 12.0], &[3.0 / 4.0, 1.0 / 4.0]]),
            vec![3.0 / 4.0, 1.0 / 4.0],
            vec![],
            vec![1.0 / 3.0, 1.0],
            3,
            0,
            false,
        ),

        Method::LobattoIIIA43 => (
            Matrix::from_rows(&[
                &[0.0, 0.0, 0.0],
                &[5.0 / 24.0, 1.0 / 3.0, -1.0 / 24.0],
                &[1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            ]),
            vec![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            vec![-0.5, 2.0, -0.5],
            vec![0.0, 0.5, 1.0],
            4,
            3,
            true,
        ),

        Method::LobattoIIIC43 => (
            Matrix::from_rows(&[
                &[1.0 / 6.0, -1.0 / 3.0, 1.0 / 6.0],
                &[1.0 / 6.0, 5.0 / 12.0, -1.0 / 12.0],
                &[1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            ]),
            vec![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            vec![-0.5, 2.0, -0.5],
            vec![0.0, 0.5, 1.0],
            4,
            3,
            false,
        ),

        Method::GaussLegendre42 => (
            Matrix::from_rows(&[
                &[0.25, 0.25 - sqrt3 / 6.0],
                &[0.25 + sqrt3 / 6.0, 0.25],
            ]),
            vec![0.5, 0.5],
            vec![0.5 + 0.5 * sqrt3, 0.5 - 0.5 * sqrt3],
            vec![0.5 - sqrt3 / 6.0, 0.5 + sqrt3 / 6.0],
            4,
            2,
            false,
        ),

        Method::RadauIA54 => (
            Matrix::from_rows(&[
                &[1.0 / 9.0, (-1.0 - sqrt6) / 18.0, (-1.0 + sqrt6) / 18.0],
                &[
                    1.0 / 9.0,
                    (88.0 + 7.0 * sqrt6) / 360.0,
                    (88.0 - 43.0 * sqrt6) / 360.0,
                ],
                &[
                    1.0 / 9.0,
                    (88.0 + 43.0 * sqrt6) / 360.0,
                    (88.0 - 7.0 * sqrt6) / 360.0,
                ],
            ]),
            vec![1.0 / 9.0, (16.0 + sqrt6) / 36.0, (16.0 - sqrt6) / 36.0],
            vec![],
            vec![0.0, (6.0 - sqrt6) / 10.0, (6.0 + sqrt6) / 10.0],
            5,
            0,
            false,
        ),

        Method::RadauIIA54 => (
            Matrix::from_rows(&[
                &[
                    (88.0 - 7.0 * sqrt6) / 360.0,
                    (296.0 - 169.0 * sqrt6) / 1800.0,
                    (-2.0 + 3.0 * sqrt6) / 225.0,
                ],
                &[
                    (296.0 + 169.0 * sqrt6) / 1800.0,
                    (88.0 + 7.0 * sqrt6) / 360.0,
                    (-2.0 - 3.0 * sqrt6) / 225.0,
                ],
                &[(16.0 - sqrt6) / 36.0, (16.0 + sqrt6) / 36.0, 1.0 / 9.0],
            ]),
            vec![(16.0 - sqrt6) / 36.0, (16.0 + sqrt6) / 36.0, 1.0 / 9.0],
            vec![],
            vec![(4.0 - sqrt6) / 10.0, (4.0 + sqrt6) / 10.0, 1.0],
            5,
            0,
            false,
        ),

        Method::GaussLegendre63 => (
            Matrix::from_rows(&[
                &[
                    5.0 / 36.0,
                    2.0 / 9.0 - sqrt15 / 15.0,
                    5.0 / 36.0 - sqrt15 / 30.0,
                ],
                &[5.0 / 36.0 + sqrt15 / 24.0, 2.0 / 9.0, 5.0 / 36.0 - sqrt15 / 24.0],
                &[
                    5.0 / 36.0 + sqrt15 / 30.0,
                    2.0 / 9.0 + sqrt15 / 15.0,
                    5.0 / 36.0,
                ],
            ]),
            vec![5.0 / 18.0, 4.0 / 9.0, 5.0 / 18.0],
            vec![-5.0 / 6.0, 8.0 / 3.0, -5.0 / 6.0],
            vec![0.5 - sqrt15 / 10.0, 0.5, 0.5 + sqrt15 / 10.0],
            6,
            3,
            false,
        ),

        Method::LobattoIIIA65 => {
            let a1 = 11.0 / 120.0;
            let a2 = 25.0 / 120.0;
            let a3 = sqrt5 / 120.0;
            let a4 = 1.0 / 120.0;
            (
                Matrix::from_rows(&[
                    &[0.0, 0.0, 0.0, 0.0],
                    &[a1 + a3, a2 - a3, a2 - 13.0 * a3, -a4 + a3],
                    &[a1 - a3, a2 + 13.0 * a3, a2 + a3, -a4 - a3],
                    &[1.0 / 12.0, 5.0 / 12.0, 5.0 / 12.0, 1.0 / 12.0],
                ]),
                vec![1.0 / 12.0, 5.0 / 12.0, 5.0 / 12.0, 1.0 / 12.0],
                vec![],
                vec![0.0, 0.5 - sqrt5 / 10.0, 0.5 + sqrt5 / 10.0, 1.0],
                6,
                0,
                false,
            )
        }

        Method::LobattoIIIC65 => {
            let a1 = 1.0 / 12.0;
            let a2 = sqrt5 / 12.0;
            let a3 = 0.25;
            let a4 = 1.0 / 6.0;
            let a5 = sqrt5 / 60.0;
            (
                Matrix::from_rows(&[
                    &[a1, -a2, a2, -a1],
                    &[a1, a3, a4 - 7.0 * a5, a5],
                    &[a1, a4 + 7.0 * a5, a3, -a5],
                    &[a1, 5.0 * a1, 5.0 * a1, a1],
                ]),
                vec![a1, 5.0 * a1, 5.0 * a1, a1],
                vec![],
                vec![0.0, 0.5 - sqrt5 / 10.0, 0.5 + sqrt5 / 10.0, 1.0],
                6,
                0,
                false,
            )
        }
    };

    let gamma = first_implicit_diag(&a);
    ButcherTableau {
        name: method.name(),
        a,
        b,
        b2,
        c,
        order,
        order2,
        fsal,
        gamma,
    }
}
