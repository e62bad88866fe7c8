//! A library of implicit Runge-Kutta (IRK) methods for solving stiff initial
//! value problems (IVPs) for ordinary differential equations (ODEs).

mod controller;
mod error;
mod irk;
mod matrix;
mod ode;
mod output;
mod settings;
mod status;

pub mod diagnostics;
pub mod newton;
pub mod tableau;

pub use diagnostics::{Diagnostics, Event, LogDiagnostics, NopDiagnostics, RejectCause};
pub use error::Error;
pub use irk::{irk, odeint};
pub use matrix::Matrix;
pub use ode::ODE;
pub use output::{Counters, RkOutput};
pub use settings::{NewtonSettings, Settings};
pub use status::Status;
pub use tableau::{ButcherTableau, Method, Registry};

// Prevent selecting two incompatible float precision features at once.
#[cfg(all(feature = "f32", feature = "f64"))]
compile_error!(
    "features 'f32' and 'f64' cannot both be enabled; pick exactly one Float precision feature"
);

/// Change this to f64 or f32 as desired.
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f64")]
pub type Float = f64;
