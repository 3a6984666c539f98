//! Buses of the power grid.
//!
//! Every bus holds `(V, phi)`: voltage magnitude and phase angle. With the
//! shunt admittance `(G, B)` of the bus and the admittances `(G_ik, B_ik)`
//! of the transmission lines to its neighbours `k`, the injected power is
//!
//! ```text
//! P = G V^2 + sum_k V V_k (G_ik cos(phi - phi_k) + B_ik sin(phi - phi_k))
//! Q = -B V^2 + sum_k V V_k (G_ik sin(phi - phi_k) - B_ik cos(phi - phi_k))
//! ```
//!
//! A bus fixes two of `(P, Q, V, phi)`, depending on its kind.

use gp_core::{BoundaryValue, ControlValue, InitialValue};
use gp_solver::MatrixHandler;
use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{ComponentError, ComponentResult};
use crate::indices::IndexRange;
use crate::stochastic::{euler_maruyama_oup_relative, stable_number_of_oup_steps};
use crate::traits::{Equation, Stateful, Step, Switchable};

/// A transmission line as seen from one of its ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coupling {
    /// State index of the neighbour's voltage. Its phase follows.
    pub neighbor_start: usize,
    pub g: f64,
    pub b: f64,
}

/// Boundary values together with their value at the current step.
#[derive(Debug, Clone)]
pub struct Targets {
    values: BoundaryValue<2>,
    current: [f64; 2],
}

impl Targets {
    pub fn new(values: BoundaryValue<2>) -> Self {
        Self {
            values,
            current: [f64::NAN; 2],
        }
    }

    fn load(&mut self, time: f64) -> ComponentResult<()> {
        self.current = self.values.at(time)?;
        Ok(())
    }
}

/// Parameters of a load whose `(P, Q)` fluctuate around the boundary values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OupParameters {
    pub sigma_p: f64,
    pub theta_p: f64,
    pub sigma_q: f64,
    pub theta_q: f64,
    pub number_of_stochastic_steps: usize,
    /// Bound `a` on `theta * h`, with `0 < a < 2`.
    pub stability_parameter: f64,
}

#[derive(Debug, Clone)]
pub struct StochasticLoad {
    means: BoundaryValue<2>,
    parameters: OupParameters,
    current: Option<[f64; 2]>,
    rng: StdRng,
}

impl StochasticLoad {
    pub fn new(
        means: BoundaryValue<2>,
        parameters: OupParameters,
        seed: u64,
    ) -> ComponentResult<Self> {
        // Validates the stability parameter and the step count up front.
        stable_number_of_oup_steps(
            parameters.stability_parameter,
            parameters.theta_p,
            0.0,
            parameters.number_of_stochastic_steps,
        )?;
        Ok(Self {
            means,
            parameters,
            current: None,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Restart the process from the boundary values with a fresh generator.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.current = None;
    }

    /// The `(P, Q)` drawn for the current step.
    pub fn current(&self) -> Option<[f64; 2]> {
        self.current
    }

    fn advance(&mut self, last_time: f64, new_time: f64) -> ComponentResult<()> {
        let start = match self.current {
            Some(current) => current,
            None => self.means.at(last_time)?,
        };
        let [mean_p, mean_q] = self.means.at(new_time)?;
        let delta_t = new_time - last_time;
        let params = self.parameters;

        let steps_p = stable_number_of_oup_steps(
            params.stability_parameter,
            params.theta_p,
            delta_t,
            params.number_of_stochastic_steps,
        )?;
        let p = euler_maruyama_oup_relative(
            start[0],
            params.theta_p,
            mean_p,
            delta_t,
            params.sigma_p,
            &mut self.rng,
            steps_p,
        );
        let steps_q = stable_number_of_oup_steps(
            params.stability_parameter,
            params.theta_q,
            delta_t,
            params.number_of_stochastic_steps,
        )?;
        let q = euler_maruyama_oup_relative(
            start[1],
            params.theta_q,
            mean_q,
            delta_t,
            params.sigma_q,
            &mut self.rng,
            steps_q,
        );
        self.current = Some([p, q]);
        Ok(())
    }
}

/// A plant that runs as a PV bus while its switch is on and as a slack bus
/// otherwise.
#[derive(Debug, Clone)]
pub struct SwitchedPlant {
    /// `(V, phi)` in slack mode.
    pub vphi: Targets,
    /// `(P, V)` in PV mode.
    pub pv: Targets,
    pub schedule: ControlValue<1>,
}

#[derive(Debug, Clone)]
pub enum PowerNodeKind {
    /// Fixes `(P, Q)`.
    Pq(Targets),
    /// Fixes `(P, V)`.
    Pv(Targets),
    /// Slack bus, fixes `(V, phi)`.
    Vphi(Targets),
    StochasticPq(Box<StochasticLoad>),
    SwitchedPowerplant(Box<SwitchedPlant>),
    /// Gas-fired plant fixing `(V, phi)` like a slack bus. Its active power
    /// is drawn from the gas side through a [`crate::GasPowerConnection`].
    ExternalPowerplant(Targets),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pq,
    Pv,
    Vphi,
}

#[derive(Debug, Clone)]
pub struct PowerNode {
    g: f64,
    b: f64,
    kind: PowerNodeKind,
    couplings: Vec<Coupling>,
    indices: IndexRange,
    switch_indices: IndexRange,
}

impl PowerNode {
    pub fn new(g: f64, b: f64, kind: PowerNodeKind) -> Self {
        Self {
            g,
            b,
            kind,
            couplings: Vec::new(),
            indices: IndexRange::new("state"),
            switch_indices: IndexRange::new("switch"),
        }
    }

    pub fn pq(g: f64, b: f64, boundary: BoundaryValue<2>) -> Self {
        Self::new(g, b, PowerNodeKind::Pq(Targets::new(boundary)))
    }

    pub fn pv(g: f64, b: f64, boundary: BoundaryValue<2>) -> Self {
        Self::new(g, b, PowerNodeKind::Pv(Targets::new(boundary)))
    }

    pub fn vphi(g: f64, b: f64, boundary: BoundaryValue<2>) -> Self {
        Self::new(g, b, PowerNodeKind::Vphi(Targets::new(boundary)))
    }

    pub fn external_powerplant(g: f64, b: f64, boundary: BoundaryValue<2>) -> Self {
        Self::new(g, b, PowerNodeKind::ExternalPowerplant(Targets::new(boundary)))
    }

    pub fn stochastic_pq(g: f64, b: f64, load: StochasticLoad) -> Self {
        Self::new(g, b, PowerNodeKind::StochasticPq(Box::new(load)))
    }

    pub fn switched_powerplant(
        g: f64,
        b: f64,
        vphi: BoundaryValue<2>,
        pv: BoundaryValue<2>,
        schedule: ControlValue<1>,
    ) -> Self {
        let plant = SwitchedPlant {
            vphi: Targets::new(vphi),
            pv: Targets::new(pv),
            schedule,
        };
        Self::new(g, b, PowerNodeKind::SwitchedPowerplant(Box::new(plant)))
    }

    pub fn kind(&self) -> &PowerNodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut PowerNodeKind {
        &mut self.kind
    }

    pub fn couplings(&self) -> &[Coupling] {
        &self.couplings
    }

    /// Wire the bus to its neighbours. Needs the neighbours' state indices.
    pub fn setup(&mut self, couplings: Vec<Coupling>) {
        self.couplings = couplings;
    }

    fn voltage(&self, state: &DVector<f64>) -> (f64, f64) {
        let start = self.start_state_index();
        (state[start], state[start + 1])
    }

    pub fn p(&self, state: &DVector<f64>) -> f64 {
        let (v, phi) = self.voltage(state);
        let mut p = self.g * v * v;
        for c in &self.couplings {
            let (v_k, phi_k) = (state[c.neighbor_start], state[c.neighbor_start + 1]);
            let (sin, cos) = (phi - phi_k).sin_cos();
            p += v * v_k * (c.g * cos + c.b * sin);
        }
        p
    }

    pub fn q(&self, state: &DVector<f64>) -> f64 {
        let (v, phi) = self.voltage(state);
        let mut q = -self.b * v * v;
        for c in &self.couplings {
            let (v_k, phi_k) = (state[c.neighbor_start], state[c.neighbor_start + 1]);
            let (sin, cos) = (phi - phi_k).sin_cos();
            q += v * v_k * (c.g * sin - c.b * cos);
        }
        q
    }

    /// Add `dP/dstate` to row `row`.
    pub fn add_p_derivative(
        &self,
        row: usize,
        jacobian: &mut dyn MatrixHandler,
        state: &DVector<f64>,
    ) {
        let start = self.start_state_index();
        let (v, phi) = self.voltage(state);
        let mut dp_dv = 2.0 * self.g * v;
        let mut dp_dphi = 0.0;
        for c in &self.couplings {
            let (v_k, phi_k) = (state[c.neighbor_start], state[c.neighbor_start + 1]);
            let (sin, cos) = (phi - phi_k).sin_cos();
            dp_dv += v_k * (c.g * cos + c.b * sin);
            dp_dphi += v * v_k * (-c.g * sin + c.b * cos);
            jacobian.add_to_coefficient(row, c.neighbor_start, v * (c.g * cos + c.b * sin));
            let dp_dphi_k = v * v_k * (c.g * sin - c.b * cos);
            jacobian.add_to_coefficient(row, c.neighbor_start + 1, dp_dphi_k);
        }
        jacobian.add_to_coefficient(row, start, dp_dv);
        jacobian.add_to_coefficient(row, start + 1, dp_dphi);
    }

    /// Add `dQ/dstate` to row `row`.
    pub fn add_q_derivative(
        &self,
        row: usize,
        jacobian: &mut dyn MatrixHandler,
        state: &DVector<f64>,
    ) {
        let start = self.start_state_index();
        let (v, phi) = self.voltage(state);
        let mut dq_dv = -2.0 * self.b * v;
        let mut dq_dphi = 0.0;
        for c in &self.couplings {
            let (v_k, phi_k) = (state[c.neighbor_start], state[c.neighbor_start + 1]);
            let (sin, cos) = (phi - phi_k).sin_cos();
            dq_dv += v_k * (c.g * sin - c.b * cos);
            dq_dphi += v * v_k * (c.g * cos + c.b * sin);
            jacobian.add_to_coefficient(row, c.neighbor_start, v * (c.g * sin - c.b * cos));
            let dq_dphi_k = -v * v_k * (c.g * cos + c.b * sin);
            jacobian.add_to_coefficient(row, c.neighbor_start + 1, dq_dphi_k);
        }
        jacobian.add_to_coefficient(row, start, dq_dv);
        jacobian.add_to_coefficient(row, start + 1, dq_dphi);
    }

    /// Equation mode and its two target values at the current step.
    fn mode(&self, switches: &DVector<f64>) -> (Mode, [f64; 2]) {
        match &self.kind {
            PowerNodeKind::Pq(t) => (Mode::Pq, t.current),
            PowerNodeKind::Pv(t) => (Mode::Pv, t.current),
            PowerNodeKind::Vphi(t) | PowerNodeKind::ExternalPowerplant(t) => {
                (Mode::Vphi, t.current)
            }
            PowerNodeKind::StochasticPq(load) => (Mode::Pq, load.current.unwrap_or([f64::NAN; 2])),
            PowerNodeKind::SwitchedPowerplant(plant) => {
                if switches[self.switch_indices.start()] != 0.0 {
                    (Mode::Pv, plant.pv.current)
                } else {
                    (Mode::Vphi, plant.vphi.current)
                }
            }
        }
    }
}

impl Stateful for PowerNode {
    fn number_of_states(&self) -> usize {
        2
    }

    fn state_indices(&self) -> &IndexRange {
        &self.indices
    }

    fn state_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.indices
    }

    /// `initial` holds `(V, phi)`; its first sample is used.
    fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialValue<2>,
    ) -> ComponentResult<()> {
        let start = self.start_state_index();
        let [v, phi] = initial.at(initial.first_argument())?;
        new_state[start] = v;
        new_state[start + 1] = phi;
        Ok(())
    }
}

impl Equation for PowerNode {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        let start = self.start_state_index();
        let state = step.new_state;
        let (v, phi) = self.voltage(state);
        let (mode, [first, second]) = self.mode(step.switches);
        let (r0, r1) = match mode {
            Mode::Pq => (self.p(state) - first, self.q(state) - second),
            Mode::Pv => (self.p(state) - first, v - second),
            Mode::Vphi => (v - first, phi - second),
        };
        rootvalues[start] = r0;
        rootvalues[start + 1] = r1;
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        let start = self.start_state_index();
        let state = step.new_state;
        match self.mode(step.switches).0 {
            Mode::Pq => {
                self.add_p_derivative(start, jacobian, state);
                self.add_q_derivative(start + 1, jacobian, state);
            }
            Mode::Pv => {
                self.add_p_derivative(start, jacobian, state);
                jacobian.add_to_coefficient(start + 1, start, 1.0);
            }
            Mode::Vphi => {
                jacobian.add_to_coefficient(start, start, 1.0);
                jacobian.add_to_coefficient(start + 1, start + 1, 1.0);
            }
        }
    }

    fn d_evaluate_d_last_state(&self, _jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {}

    fn prepare_timestep(&mut self, last_time: f64, new_time: f64) -> ComponentResult<()> {
        match &mut self.kind {
            PowerNodeKind::Pq(t)
            | PowerNodeKind::Pv(t)
            | PowerNodeKind::Vphi(t)
            | PowerNodeKind::ExternalPowerplant(t) => t.load(new_time),
            PowerNodeKind::StochasticPq(load) => load.advance(last_time, new_time),
            PowerNodeKind::SwitchedPowerplant(plant) => {
                plant.vphi.load(new_time)?;
                plant.pv.load(new_time)
            }
        }
    }
}

impl Switchable for PowerNode {
    fn number_of_switches(&self) -> usize {
        match self.kind {
            PowerNodeKind::SwitchedPowerplant(_) => 1,
            _ => 0,
        }
    }

    fn switch_indices(&self) -> &IndexRange {
        &self.switch_indices
    }

    fn switch_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.switch_indices
    }

    fn set_switches(&self, switches: &mut DVector<f64>, time: f64) -> ComponentResult<()> {
        if let PowerNodeKind::SwitchedPowerplant(plant) = &self.kind {
            let [on] = plant.schedule.at(time)?;
            if !on.is_finite() {
                return Err(ComponentError::configuration(format!(
                    "switch value at t = {time} is not finite"
                )));
            }
            switches[self.switch_indices.start()] = on;
        }
        Ok(())
    }
}
