//! Simplified Newton iteration for the coupled IRK stage system.
//!
//! The stages are defined as the root of `R(Y) = Y - dt*(A (x) I)*F(Y)` with
//! the i-th block of `F` evaluated at `(t + c_i*dt, y + Y_i)`. The Jacobian
//! is evaluated once per rebuild and the LU factors of the iteration matrix
//! are reused across iterations instead of refactoring every time.

use crate::{
    Float,
    error::Error,
    matrix::{Lu, Matrix},
    ode::ODE,
    output::Counters,
    settings::NewtonSettings,
    tableau::ButcherTableau,
};

/// How a stage solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonOutcome {
    /// Residual or increment dropped below its tolerance.
    Success,
    /// Increments started growing between iterations.
    IncrementDiverge,
    /// The iteration limit was reached without convergence.
    MaxitExceeded,
}

/// Result of one stage solve.
#[derive(Debug, Clone, Copy)]
pub struct NewtonStats {
    pub outcome: NewtonOutcome,
    /// Iterations taken.
    pub iters: usize,
    /// Squared norm of the final residual.
    pub res2: Float,
}

/// Cached factorizations of the stage iteration matrix `I - dt*(A (x) J)`
/// and of the error-estimate matrix `I - gamma*dt*J`, together with the
/// refresh policy.
///
/// Owned exclusively by one step attempt: built when the Newton solve
/// starts, refreshed wholesale every `refresh_jac` inner iterations, and
/// reused (never refactored) by the error estimator afterwards.
pub struct IterationMatrix {
    stage_lu: Lu,
    err_lu: Lu,
    refresh_jac: usize,
}

impl IterationMatrix {
    /// Evaluate the Jacobian at `(t, y)` and factorize both systems.
    pub fn build<F: ODE>(
        f: &F,
        t: Float,
        y: &[Float],
        dt: Float,
        tableau: &ButcherTableau,
        refresh_jac: usize,
        count: &mut Counters,
    ) -> Result<Self, Error> {
        let (stage_lu, err_lu) = factorize(f, t, y, dt, tableau, count)?;
        Ok(Self {
            stage_lu,
            err_lu,
            refresh_jac,
        })
    }

    /// Replace both cached factorizations with fresh ones.
    pub fn rebuild<F: ODE>(
        &mut self,
        f: &F,
        t: Float,
        y: &[Float],
        dt: Float,
        tableau: &ButcherTableau,
        count: &mut Counters,
    ) -> Result<(), Error> {
        let (stage_lu, err_lu) = factorize(f, t, y, dt, tableau, count)?;
        self.stage_lu = stage_lu;
        self.err_lu = err_lu;
        Ok(())
    }

    /// Iterations between refreshes.
    pub fn refresh_interval(&self) -> usize {
        self.refresh_jac
    }

    /// Solve `(I - dt*(A (x) J)) x = b` in place with the cached factors.
    pub fn solve_stage_mut(&self, b: &mut [Float]) {
        self.stage_lu.solve_mut(b);
    }

    /// Solve `(I - gamma*dt*J) x = b` in place with the cached factors.
    pub fn solve_error_mut(&self, b: &mut [Float]) {
        self.err_lu.solve_mut(b);
    }
}

fn factorize<F: ODE>(
    f: &F,
    t: Float,
    y: &[Float],
    dt: Float,
    tableau: &ButcherTableau,
    count: &mut Counters,
) -> Result<(Lu, Lu), Error> {
    let neq = y.len();
    let ns = tableau.stages();
    let nn = ns * neq;

    let mut jac = Matrix::zeros(neq, neq);
    f.jac(t, y, &mut jac);
    count.jac_evals += 1;

    // Stage system: I - dt * kron(A, J)
    let mut m = Matrix::zeros(nn, nn);
    for i in 0..ns {
        for j in 0..ns {
            let w = dt * tableau.a[(i, j)];
            if w == 0.0 {
                continue;
            }
            for r in 0..neq {
                for c in 0..neq {
                    m[(i * neq + r, j * neq + c)] = -w * jac[(r, c)];
                }
            }
        }
    }
    for k in 0..nn {
        m[(k, k)] += 1.0;
    }
    let stage_lu =
        Lu::factor(&m).map_err(|_| Error::SingularIterationMatrix { t, dt })?;

    // Error-estimate system: I - gamma*dt * J
    let g = tableau.gamma * dt;
    let mut e = Matrix::zeros(neq, neq);
    for r in 0..neq {
        for c in 0..neq {
            e[(r, c)] = -g * jac[(r, c)];
        }
        e[(r, r)] += 1.0;
    }
    let err_lu = Lu::factor(&e).map_err(|_| Error::SingularIterationMatrix { t, dt })?;

    Ok((stage_lu, err_lu))
}

/// Residual of the stage system: `r = Y - dt*(A (x) I)*F(Y)`.
///
/// `ys` and `ks` are caller-provided scratch of length `neq` and `ns*neq`.
/// Pure apart from counting the `ns` derivative evaluations.
pub(crate) fn stage_residual<F: ODE>(
    f: &F,
    t: Float,
    y: &[Float],
    dt: Float,
    tableau: &ButcherTableau,
    yy: &[Float],
    ys: &mut [Float],
    ks: &mut [Float],
    r: &mut [Float],
    count: &mut Counters,
) {
    let neq = y.len();
    let ns = tableau.stages();

    for i in 0..ns {
        for k in 0..neq {
            ys[k] = y[k] + yy[i * neq + k];
        }
        f.ode(t + tableau.c[i] * dt, ys, &mut ks[i * neq..(i + 1) * neq]);
    }
    count.fun_evals += ns;

    for i in 0..ns {
        for k in 0..neq {
            let mut acc = yy[i * neq + k];
            for j in 0..ns {
                let aij = tableau.a[(i, j)];
                if aij != 0.0 {
                    acc -= dt * aij * ks[j * neq + k];
                }
            }
            r[i * neq + k] = acc;
        }
    }
}

/// Drive the stacked stage vector `yy` to a root of the stage residual.
///
/// `yy` is resized to `ns*neq` and zeroed here; the iteration matrix must
/// have been built for the same `(t, y, dt)`. The damped update uses
/// `step = 1/sqrt(1 + ||R||^2)`, and divergence is declared from the
/// contraction rate of the increments, not an absolute threshold.
pub fn solve_stages<F: ODE>(
    f: &F,
    t: Float,
    y: &[Float],
    dt: Float,
    tableau: &ButcherTableau,
    settings: &NewtonSettings,
    im: &mut IterationMatrix,
    yy: &mut Vec<Float>,
    count: &mut Counters,
) -> Result<NewtonStats, Error> {
    let neq = y.len();
    let ns = tableau.stages();
    let nn = ns * neq;

    yy.clear();
    yy.resize(nn, 0.0);

    let mut ys = vec![0.0; neq];
    let mut ks = vec![0.0; nn];
    let mut r = vec![0.0; nn];
    let mut dy = vec![0.0; nn];

    stage_residual(f, t, y, dt, tableau, yy, &mut ys, &mut ks, &mut r, count);
    let mut rnorm2 = dot(&r, &r);
    let mut step = 1.0 / (1.0 + rnorm2).sqrt();

    let rtol2 = settings.tol * settings.tol;
    let xtol2 = settings.dx_delta * settings.dx_delta;
    let mut xnorm2_prev: Float = 0.0;
    let mut xnorm2: Float = 0.0;

    let mut outcome = NewtonOutcome::MaxitExceeded;
    let mut iters: usize = 1;
    while iters < settings.maxit {
        for k in 0..nn {
            dy[k] = -r[k];
        }
        im.solve_stage_mut(&mut dy);

        xnorm2_prev = xnorm2;
        xnorm2 = dot(&dy, &dy);
        if iters > 1 && xnorm2_prev < 0.81 * xnorm2 {
            outcome = NewtonOutcome::IncrementDiverge;
            break;
        }

        for k in 0..nn {
            yy[k] += step * dy[k];
        }
        stage_residual(f, t, y, dt, tableau, yy, &mut ys, &mut ks, &mut r, count);
        rnorm2 = dot(&r, &r);
        if rnorm2 < rtol2 || xnorm2 < xtol2 {
            outcome = NewtonOutcome::Success;
            break;
        }
        step = 1.0 / (1.0 + rnorm2).sqrt();

        if iters % im.refresh_interval() == 0 {
            im.rebuild(f, t, y, dt, tableau, count)?;
        }
        iters += 1;
    }

    Ok(NewtonStats {
        outcome,
        iters,
        res2: rnorm2,
    })
}

fn dot(a: &[Float], b: &[Float]) -> Float {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay;

    impl ODE for Decay {
        fn ode(&self, _x: Float, y: &[Float], dydx: &mut [Float]) {
            dydx[0] = -y[0];
        }

        fn jac(&self, _x: Float, _y: &[Float], j: &mut Matrix) {
            j[(0, 0)] = -1.0;
        }
    }

    fn implicit_euler() -> ButcherTableau {
        ButcherTableau {
            name: "IMPLICIT_EULER",
            a: Matrix::from_rows(&[&[1.0]]),
            b: vec![1.0],
            b2: vec![],
            c: vec![1.0],
            order: 1,
            order2: 0,
            fsal: false,
            gamma: 1.0,
        }
    }

    fn degenerate_explicit() -> ButcherTableau {
        ButcherTableau {
            name: "DEGENERATE_EXPLICIT",
            a: Matrix::from_rows(&[&[0.0, 0.0], &[0.0, 0.0]]),
            b: vec![0.5, 0.5],
            b2: vec![],
            c: vec![0.0, 0.0],
            order: 1,
            order2: 0,
            fsal: false,
            gamma: 0.0,
        }
    }

    #[test]
    fn residual_norm_below_tolerance_on_success() {
        let tab = implicit_euler();
        let settings = NewtonSettings::default();
        let mut count = Counters::default();
        let y = [1.0];
        let mut im =
            IterationMatrix::build(&Decay, 0.0, &y, 0.1, &tab, settings.refresh_jac, &mut count)
                .unwrap();
        let mut yy = Vec::new();
        let stats =
            solve_stages(&Decay, 0.0, &y, 0.1, &tab, &settings, &mut im, &mut yy, &mut count)
                .unwrap();
        assert_eq!(stats.outcome, NewtonOutcome::Success);
        assert!(stats.res2.sqrt() <= settings.tol || stats.res2 < settings.tol * settings.tol);
        // Implicit Euler stage: Y = -dt*(y + Y) => Y = -dt*y/(1 + dt)
        let expected = -0.1 / 1.1;
        assert!((yy[0] - expected).abs() < 1e-6);
        assert!(count.jac_evals >= 1);
        assert!(count.fun_evals >= 2);
    }

    #[test]
    fn zero_a_matrix_converges_in_one_iteration() {
        // With A = 0 the iteration matrix reduces to the identity and the
        // residual starts at zero, so the solver must stop after exactly
        // one iteration.
        let tab = degenerate_explicit();
        let settings = NewtonSettings::default();
        let mut count = Counters::default();
        let y = [2.0];
        let mut im =
            IterationMatrix::build(&Decay, 0.0, &y, 0.5, &tab, settings.refresh_jac, &mut count)
                .unwrap();
        let mut yy = Vec::new();
        let stats =
            solve_stages(&Decay, 0.0, &y, 0.5, &tab, &settings, &mut im, &mut yy, &mut count)
                .unwrap();
        assert_eq!(stats.outcome, NewtonOutcome::Success);
        assert_eq!(stats.iters, 1);
        assert_eq!(stats.res2, 0.0);
        assert!(yy.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn iteration_limit_is_reported() {
        let tab = implicit_euler();
        let settings = NewtonSettings::builder().maxit(2).tol(0.0).dx_delta(0.0).build();
        let mut count = Counters::default();
        let y = [1.0];
        let mut im =
            IterationMatrix::build(&Decay, 0.0, &y, 0.1, &tab, settings.refresh_jac, &mut count)
                .unwrap();
        let mut yy = Vec::new();
        let stats =
            solve_stages(&Decay, 0.0, &y, 0.1, &tab, &settings, &mut im, &mut yy, &mut count)
                .unwrap();
        assert_eq!(stats.outcome, NewtonOutcome::MaxitExceeded);
    }
}
