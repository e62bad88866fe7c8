//! Generic adaptive time integration for implicit Runge-Kutta methods.
//!
//! One step attempt solves the coupled stage system with simplified Newton
//! iteration, forms the update from the main and embedded weights, estimates
//! the local error on the cached factorization, and accepts or rejects the
//! step. Newton failures and excess local error shrink the step and retry;
//! only budget exhaustion and genuine numerical breakdown end a run early.

use std::time::Instant;

use crate::{
    Float,
    controller::{self, StepHistory},
    diagnostics::{Diagnostics, Event, RejectCause},
    error::Error,
    matrix::Lu,
    newton::{self, IterationMatrix, NewtonOutcome},
    ode::ODE,
    output::{Counters, Recorder, RkOutput},
    settings::Settings,
    status::Status,
    tableau::{ButcherTableau, Method, Registry},
};

/// Integrate `y' = f(t, y)` from `t0` to `t1` with the given tableau.
///
/// Configuration problems (inconsistent tableau, empty interval, zero
/// budgets) are rejected with `Err` before any stepping. Once stepping has
/// begun the run always produces an [`RkOutput`]; fatal numerical errors are
/// carried in [`RkOutput::error`] with the partial trajectory intact.
pub fn irk<F, D>(
    f: &F,
    t0: Float,
    t1: Float,
    y0: &[Float],
    tableau: &ButcherTableau,
    settings: &Settings,
    mut diag: Option<&mut D>,
) -> Result<RkOutput, Vec<Error>>
where
    F: ODE,
    D: Diagnostics,
{
    // --- Input validation ---
    let mut errors: Vec<Error> = Vec::new();

    if !tableau.is_consistent() {
        errors.push(Error::InvalidTableau(tableau.name));
    }
    if settings.adaptive && !tableau.has_embedded() {
        errors.push(Error::AdaptiveRequiresEmbedded(tableau.name));
    }
    if settings.nmax == 0 {
        errors.push(Error::NMaxMustBePositive(0));
    }
    if settings.newton.maxit == 0 {
        errors.push(Error::NewtonMaxIterMustBePositive(0));
    }
    if settings.newton.refresh_jac == 0 {
        errors.push(Error::RefreshJacMustBePositive(0));
    }
    if settings.rtol <= 0.0 {
        errors.push(Error::ToleranceMustBePositive(settings.rtol));
    }
    if settings.atol <= 0.0 {
        errors.push(Error::ToleranceMustBePositive(settings.atol));
    }
    if t1 <= t0 {
        errors.push(Error::InvalidInterval(t0, t1));
    }
    let mut dt = settings.h0.unwrap_or(1e-6);
    if dt <= 0.0 {
        errors.push(Error::InvalidStepSize(dt));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // The update weights are d = A^{-T} b (and d2 = A^{-T} b2): the stages
    // carry dt*(A (x) I)*k, so the b-weighted sum of the k's becomes the
    // d-weighted sum of the stages.
    let (d_weights, d2_weights) = match Lu::factor(&tableau.a.transpose()) {
        Ok(at_lu) => {
            let d = at_lu.solve(&tableau.b);
            let d2 = if tableau.has_embedded() {
                at_lu.solve(&tableau.b2)
            } else {
                Vec::new()
            };
            (d, d2)
        }
        Err(_) => return Err(vec![Error::SingularMethodMatrix(tableau.name)]),
    };

    // --- Initialization ---
    let start = Instant::now();
    let neq = y0.len();
    let ns = tableau.stages();

    if t0 + dt > t1 {
        dt = t1 - t0;
    }

    let mut t = t0;
    let mut y = y0.to_vec();
    let mut yy: Vec<Float> = vec![0.0; ns * neq];

    let mut count = Counters::default();
    let mut recorder = Recorder::new(settings.sample_interval);
    let mut history = StepHistory::new(dt);
    let mut status = Status::Success;
    let mut fatal: Option<Error> = None;
    let mut consecutive_rejects: usize = 0;

    // Scratch for the update and error estimate
    let mut delta_y = vec![0.0; neq];
    let mut delta_alt = vec![0.0; neq];
    let mut y_new = vec![0.0; neq];
    let mut err_est = vec![0.0; neq];
    let mut f0 = vec![0.0; neq];
    let mut yp = vec![0.0; neq];

    recorder.sample(t, &y, &yy, &err_est, 0.0);

    // --- Main loop ---
    'main: while t < t1 {
        // Never overshoot the target time.
        if t + dt > t1 {
            dt = t1 - t;
        }

        count.attempts += 1;
        if count.attempts > settings.nmax {
            status = Status::MaxStepsExceeded;
            break;
        }

        // ****************  Resolve the stages  ****************
        let mut im = match IterationMatrix::build(
            f,
            t,
            &y,
            dt,
            tableau,
            settings.newton.refresh_jac,
            &mut count,
        ) {
            Ok(im) => im,
            Err(e) => {
                status = Status::GeneralError;
                fatal = Some(e);
                break;
            }
        };
        let stats = match newton::solve_stages(
            f,
            t,
            &y,
            dt,
            tableau,
            &settings.newton,
            &mut im,
            &mut yy,
            &mut count,
        ) {
            Ok(stats) => stats,
            Err(e) => {
                status = Status::GeneralError;
                fatal = Some(e);
                break;
            }
        };

        if stats.outcome != NewtonOutcome::Success {
            count.newton_rejects += 1;
            let cause = match stats.outcome {
                NewtonOutcome::IncrementDiverge => {
                    count.newton_diverge += 1;
                    RejectCause::NewtonDiverged
                }
                _ => {
                    count.newton_maxit += 1;
                    RejectCause::NewtonMaxit
                }
            };
            if !settings.adaptive {
                // Nothing to retry with at a constant step size.
                status = Status::GeneralError;
                fatal = Some(Error::NewtonFailedFixedStep { t, dt });
                break;
            }
            if let Some(d) = diag.as_deref_mut() {
                d.event(&Event::StepRejected { t, dt, cause });
            }
            dt *= 0.5;
            consecutive_rejects += 1;
            continue 'main;
        }
        count.newton_success += 1;

        // ****************  Construct the update  ****************
        for k in 0..neq {
            delta_y[k] = 0.0;
            for i in 0..ns {
                delta_y[k] += d_weights[i] * yy[i * neq + k];
            }
            y_new[k] = y[k] + delta_y[k];
        }

        // ****************  Estimate the local error  ****************
        let mut err = 0.0;
        if settings.adaptive {
            let gam = tableau.gamma * dt;
            for k in 0..neq {
                delta_alt[k] = 0.0;
                for i in 0..ns {
                    delta_alt[k] += d2_weights[i] * yy[i * neq + k];
                }
            }
            f.ode(t, &y, &mut f0);
            count.fun_evals += 1;
            // (I - gamma*dt*J) e = dt*(embedded update - main update)
            for k in 0..neq {
                err_est[k] = dt * (gam * f0[k] + delta_alt[k] - delta_y[k]);
            }
            im.solve_error_mut(&mut err_est);
            if settings.refined_error {
                // One extra evaluation at the perturbed state sharpens the
                // estimate; same factorization, no refactor.
                for k in 0..neq {
                    yp[k] = y[k] + err_est[k];
                }
                f.ode(t, &yp, &mut f0);
                count.fun_evals += 1;
                for k in 0..neq {
                    err_est[k] = dt * (gam * f0[k] + delta_alt[k] - delta_y[k]);
                }
                im.solve_error_mut(&mut err_est);
            }

            let mut err_tot = 0.0;
            for k in 0..neq {
                let sc = settings.atol + settings.rtol * y[k].abs().max(y_new[k].abs());
                let e = err_est[k] / sc;
                err_tot += e * e;
            }
            err = (err_tot / neq as Float).sqrt();
            if err < Float::EPSILON {
                err = Float::EPSILON;
            }
        }

        let reject_err = settings.adaptive && err > 1.0;
        if reject_err {
            count.error_rejects += 1;
            consecutive_rejects += 1;
            if let Some(d) = diag.as_deref_mut() {
                d.event(&Event::StepRejected {
                    t,
                    dt,
                    cause: RejectCause::ErrorTooLarge,
                });
            }
        }

        // ****************  Find the next dt  ****************
        history.push(dt, err);
        let mut new_dt = dt;
        if settings.adaptive {
            let min_order = tableau.order.min(tableau.order2);
            match controller::next_step_size(
                dt,
                err,
                history.prev_err(),
                min_order,
                stats.iters,
                consecutive_rejects,
                settings,
            ) {
                Ok(h) => new_dt = h,
                Err(e) => {
                    status = Status::GeneralError;
                    fatal = Some(e);
                    break;
                }
            }
        }

        // ****************  Commit accepted steps  ****************
        if !reject_err {
            y.copy_from_slice(&y_new);
            t += dt;
            count.accepted += 1;
            consecutive_rejects = 0;

            recorder.sample(t, &y, &yy, &err_est, err);
            if let Some(d) = diag.as_deref_mut() {
                d.event(&Event::StepAccepted {
                    step: count.accepted,
                    t,
                    dt,
                    err,
                    newton_iters: stats.iters,
                });
                if settings.out_interval > 0 && count.accepted % settings.out_interval == 0 {
                    d.event(&summary(&count, start));
                }
            }
        }

        if settings.adaptive {
            dt = new_dt;
        }
    }

    if let Some(d) = diag.as_deref_mut() {
        d.event(&summary(&count, start));
    }

    Ok(recorder.finish(t, y, count, status, fatal, start.elapsed()))
}

fn summary(count: &Counters, start: Instant) -> Event {
    let accept_frac = if count.attempts > 0 {
        count.accepted as Float / count.attempts as Float
    } else {
        0.0
    };
    Event::Summary {
        attempts: count.attempts,
        accepted: count.accepted,
        accept_frac,
        elapsed: start.elapsed(),
    }
}

/// Time-integrate a given ODE from `t0` to `t1`, starting at `y0`, with a
/// registered method.
///
/// Convenience wrapper around [`irk`]: looks the method up in a fresh
/// [`Registry`], disables adaptive stepping (with a warning) when the method
/// has no embedded weights, and tightens the Newton residual tolerance to at
/// most a tenth of the step tolerances.
pub fn odeint<F, D>(
    f: &F,
    t0: Float,
    t1: Float,
    y0: &[Float],
    method: Method,
    mut settings: Settings,
    diag: Option<&mut D>,
) -> Result<RkOutput, Vec<Error>>
where
    F: ODE,
    D: Diagnostics,
{
    let registry = Registry::new();
    let tableau = registry.get(method);

    if settings.adaptive && !tableau.has_embedded() {
        log::warn!(
            "method {} has no embedded weights; disabling adaptive step size",
            tableau.name
        );
        settings.adaptive = false;
    }
    settings.newton.tol = settings
        .newton
        .tol
        .min(0.1 * settings.atol.min(settings.rtol));

    irk(f, t0, t1, y0, tableau, &settings, diag)
}
