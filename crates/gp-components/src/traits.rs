//! Capability facets of network components.
//!
//! A component implements the facets it needs:
//! - [`Stateful`]: owns a slice of the global state vector
//! - [`Equation`]: writes residuals and their derivatives
//! - [`Controllable`]: reads a slice of the control vector
//! - [`Constrainable`]: contributes inequality constraints
//! - [`Switchable`]: reads a slice of the switch vector
//!
//! Equations are written at rows of the global residual that the component
//! owns. A gas node owns no states but writes at the boundary rows of its
//! attached gas edges, so `Equation` does not require `Stateful`.

use gp_core::InitialValue;
use gp_solver::MatrixHandler;
use nalgebra::DVector;

use crate::component::GasPowerNet;
use crate::error::ComponentResult;
use crate::indices::IndexRange;

/// Everything an equation may read while the Newton solver iterates.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub net: &'a GasPowerNet,
    pub last_time: f64,
    pub new_time: f64,
    pub last_state: &'a DVector<f64>,
    pub new_state: &'a DVector<f64>,
    pub controls: &'a DVector<f64>,
    pub switches: &'a DVector<f64>,
}

impl Step<'_> {
    pub fn delta_t(&self) -> f64 {
        self.new_time - self.last_time
    }
}

pub trait Stateful {
    fn number_of_states(&self) -> usize;

    fn state_indices(&self) -> &IndexRange;
    fn state_indices_mut(&mut self) -> &mut IndexRange;

    /// Reserve `[next_free, next_free + number_of_states())` and return its end.
    fn set_indices(&mut self, next_free: usize) -> usize {
        let count = self.number_of_states();
        self.state_indices_mut().reserve(next_free, count)
    }

    fn start_state_index(&self) -> usize {
        self.state_indices().start()
    }

    fn after_state_index(&self) -> usize {
        self.state_indices().after()
    }

    /// Write the initial state of this component into `new_state`.
    fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialValue<2>,
    ) -> ComponentResult<()>;
}

pub trait Equation {
    /// Write the residual rows owned by this component.
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>);

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>);

    fn d_evaluate_d_last_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>);

    /// Runs once per time step before the first Newton iteration.
    fn prepare_timestep(&mut self, _last_time: f64, _new_time: f64) -> ComponentResult<()> {
        Ok(())
    }
}

pub trait Controllable {
    fn number_of_controls(&self) -> usize;

    fn control_indices(&self) -> &IndexRange;
    fn control_indices_mut(&mut self) -> &mut IndexRange;

    fn set_control_indices(&mut self, next_free: usize) -> usize {
        let count = self.number_of_controls();
        self.control_indices_mut().reserve(next_free, count)
    }

    /// Write the scheduled controls at `time` into `controls`.
    fn set_controls(&self, controls: &mut DVector<f64>, time: f64) -> ComponentResult<()>;

    /// Jacobian of this component's residual rows with respect to its controls.
    fn d_evaluate_d_control(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>);
}

pub trait Constrainable {
    fn number_of_constraints(&self) -> usize;

    fn constraint_indices(&self) -> &IndexRange;
    fn constraint_indices_mut(&mut self) -> &mut IndexRange;

    fn set_constraint_indices(&mut self, next_free: usize) -> usize {
        let count = self.number_of_constraints();
        self.constraint_indices_mut().reserve(next_free, count)
    }

    fn evaluate_constraint(&self, constraints: &mut DVector<f64>, step: &Step<'_>);

    fn d_evaluate_constraint_d_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>);
}

pub trait Switchable {
    fn number_of_switches(&self) -> usize;

    fn switch_indices(&self) -> &IndexRange;
    fn switch_indices_mut(&mut self) -> &mut IndexRange;

    fn set_switch_indices(&mut self, next_free: usize) -> usize {
        let count = self.number_of_switches();
        self.switch_indices_mut().reserve(next_free, count)
    }

    /// Write the switch positions at `time` into `switches`.
    fn set_switches(&self, switches: &mut DVector<f64>, time: f64) -> ComponentResult<()>;
}
