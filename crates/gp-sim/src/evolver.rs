//! Time evolution of a network problem.

use gp_components::{InitialConditions, NetworkProblem};
use gp_solver::{NewtonOutcome, NewtonSolver, SolveOptions, Timestep};
use nalgebra::DVector;
use tracing::{info, warn};

use crate::config::{SimConfig, SolverConfig};
use crate::error::{SimError, SimResult};
use crate::timedata::Timedata;

/// Record of a run: the initial state followed by one state per step.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub times: Vec<f64>,
    /// State snapshots
    pub states: Vec<DVector<f64>>,
    /// Newton outcome of each step; one shorter than `times`.
    pub outcomes: Vec<NewtonOutcome>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn last_state(&self) -> Option<&DVector<f64>> {
        self.states.last()
    }
}

/// Steps a network problem through a [`Timedata`] grid.
///
/// The Newton solver, and with it the Jacobian pattern and its
/// factorization, lives as long as the evolver.
#[derive(Debug)]
pub struct TimeEvolver {
    solver: NewtonSolver,
    use_full_jacobian: bool,
    rebuild_jacobian_every_step: bool,
}

impl TimeEvolver {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            solver: NewtonSolver::new(config.newton_config()),
            use_full_jacobian: config.use_full_jacobian,
            rebuild_jacobian_every_step: config.rebuild_jacobian_every_step,
        }
    }

    pub fn solver(&self) -> &NewtonSolver {
        &self.solver
    }

    /// Run from the initial values over every step of `timedata`.
    ///
    /// A step that fails numerically or does not converge aborts the run.
    pub fn simulate(
        &mut self,
        problem: &mut NetworkProblem,
        initial: &InitialConditions,
        timedata: &Timedata,
    ) -> SimResult<SimRecord> {
        let mut state = DVector::zeros(problem.number_of_states());
        problem.set_initial_values(&mut state, initial)?;

        let mut record = SimRecord {
            times: vec![timedata.start()],
            states: vec![state.clone()],
            outcomes: Vec::with_capacity(timedata.number_of_steps()),
        };

        let mut new_jacobian_structure = true;
        for (last_time, new_time) in timedata.steps() {
            problem.prepare_timestep(last_time, new_time)?;

            let last_state = state.clone();
            let step = Timestep {
                last_time,
                new_time,
                last_state: &last_state,
            };
            let options = SolveOptions {
                new_jacobian_structure: new_jacobian_structure || self.rebuild_jacobian_every_step,
                use_full_jacobian: self.use_full_jacobian,
            };
            let outcome = self.solver.solve(&mut state, &*problem, &step, options)?;
            new_jacobian_structure = false;

            if !outcome.success {
                warn!(
                    "no convergence at t = {new_time}: residual {:.3e} after {} iterations",
                    outcome.residual, outcome.used_iterations
                );
                return Err(SimError::NotConverged {
                    time: new_time,
                    residual: outcome.residual,
                    iterations: outcome.used_iterations,
                });
            }
            info!(
                "t = {new_time}: residual {:.3e} after {} iterations",
                outcome.residual, outcome.used_iterations
            );

            record.times.push(new_time);
            record.states.push(state.clone());
            record.outcomes.push(outcome);
        }
        Ok(record)
    }
}

/// Validate `config`, seed the stochastic loads and run.
pub fn run_simulation(
    config: &SimConfig,
    problem: &mut NetworkProblem,
    initial: &InitialConditions,
) -> SimResult<SimRecord> {
    config.validate()?;
    problem.seed_stochastic(config.seed);
    let timedata = Timedata::from_config(&config.time)?;
    TimeEvolver::new(&config.solver).simulate(problem, initial, &timedata)
}
