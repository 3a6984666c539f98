//! gp-physics: gas flow physics for gaspower.
//!
//! Provides:
//! - Natural gas equation of state (pressure <-> density)
//! - Pipe friction factors (laminar, transitional spline, Swamee-Jain, Colebrook)
//! - `BalanceLaw` trait and the isothermal Euler equations
//! - The implicit box scheme that discretizes a balance law on one pipe interval
//!
//! # Architecture
//!
//! Pipes hold an `IsothermalEuler` instance configured with their diameter and
//! roughness. Every physical quantity comes with a hand-written derivative;
//! the tests compare each one against central finite differences.
//!
//! # Example
//!
//! ```
//! use gp_physics::{BalanceLaw, IsothermalEuler};
//! use nalgebra::Vector2;
//!
//! let law = IsothermalEuler::new(0.5, 1e-5).unwrap();
//! let state = law.state_from_p_qvol_bar(&Vector2::new(60.0, 100.0));
//! let back = law.p_qvol_bar(&state);
//! assert!((back[0] - 60.0).abs() < 1e-10);
//! ```

pub mod balance_law;
pub mod error;
pub mod friction;
pub mod gas;
pub mod isothermal_euler;
pub mod scheme;

// Re-exports for ergonomics
pub use balance_law::BalanceLaw;
pub use error::{PhysicsError, PhysicsResult};
pub use friction::Friction;
pub use isothermal_euler::IsothermalEuler;
pub use scheme::{BoxStates, ImplicitBoxScheme};
