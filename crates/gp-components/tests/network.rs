//! Whole-network checks: derivatives, assembly strategies, wiring errors and
//! a Newton solve.

use gp_components::{
    CompressorStation, ComponentError, ControlValve, GasNode, GasPowerConnection, GasPowerNet,
    InitialConditions, NetworkProblem, OupParameters, Pipe, PowerNode, ShortPipe, StochasticLoad,
    TransmissionLine,
};
use gp_core::{BoundaryValue, ControlValue, InitialValue, NodeId};
use gp_solver::jacobian::{assembled_jacobian, problem_difference_jacobian};
use gp_solver::{
    InPlaceHandler, MatrixHandler, NewtonConfig, NewtonSolver, Problem, SolveOptions, Timestep,
    TripletHandler,
};
use nalgebra::{DMatrix, DVector};

fn constant<const N: usize>(value: [f64; N]) -> BoundaryValue<N> {
    BoundaryValue::constant(value)
}

fn gas(net: &mut GasPowerNet, name: &str, node: GasNode) -> NodeId {
    net.new_node(name, node.into()).unwrap()
}

fn bus(net: &mut GasPowerNet, name: &str, node: PowerNode) -> NodeId {
    net.new_node(name, node.into()).unwrap()
}

/// Every component kind in one net.
///
/// ```text
/// source --pipe--> junction --valve--> mid --comp--> outlet
///                     |                 \--s2--> offtake
///                     c1
///                     v
///                  gasplant --l5-- load
///
///                   slack --l1-- load --l2-- plant --l3-- slack
///                                 \--l4-- noisy
/// ```
fn mixed_network() -> (NetworkProblem, InitialConditions) {
    let mut net = GasPowerNet::new();
    let source = gas(&mut net, "source", GasNode::source(constant([20.0])));
    let junction = gas(&mut net, "junction", GasNode::inner());
    let mid = gas(&mut net, "mid", GasNode::inner());
    let outlet = gas(&mut net, "outlet", GasNode::pressure_boundary(constant([58.0])));
    let offtake = gas(&mut net, "offtake", GasNode::constraint_sink(constant([3.0])));

    let slack = bus(&mut net, "slack", PowerNode::vphi(0.01, -0.02, constant([1.0, 0.0])));
    let gasplant = bus(
        &mut net,
        "gasplant",
        PowerNode::external_powerplant(0.0, 0.0, constant([1.01, 0.0])),
    );
    let load = bus(&mut net, "load", PowerNode::pq(0.0, 0.0, constant([-0.5, -0.2])));
    let plant = bus(
        &mut net,
        "plant",
        PowerNode::switched_powerplant(
            0.0,
            0.0,
            constant([1.02, 0.0]),
            constant([0.8, 1.02]),
            ControlValue::constant([1.0]),
        ),
    );
    let parameters = OupParameters {
        sigma_p: 0.1,
        theta_p: 0.5,
        sigma_q: 0.1,
        theta_q: 0.5,
        number_of_stochastic_steps: 10,
        stability_parameter: 1.0,
    };
    let noisy_load = StochasticLoad::new(constant([-0.3, -0.1]), parameters, 11).unwrap();
    let noisy = bus(&mut net, "noisy", PowerNode::stochastic_pq(0.0, 0.0, noisy_load));

    let pipe = Pipe::new(10_000.0, 0.5, 1e-5, 2_000.0).unwrap();
    net.make_edge_between("pipe", source, junction, pipe.into()).unwrap();
    net.make_edge_between(
        "valve",
        junction,
        mid,
        ControlValve::new(ControlValue::constant([1.5])).into(),
    )
    .unwrap();
    net.make_edge_between(
        "comp",
        mid,
        outlet,
        CompressorStation::new(ControlValue::constant([0.5])).into(),
    )
    .unwrap();
    net.make_edge_between("s2", mid, offtake, ShortPipe::new().into()).unwrap();
    net.make_edge_between("c1", junction, gasplant, GasPowerConnection::new(2.0, 1.5).into())
        .unwrap();
    for (name, a, b) in [
        ("l1", slack, load),
        ("l2", load, plant),
        ("l3", plant, slack),
        ("l4", load, noisy),
        ("l5", gasplant, load),
    ] {
        net.make_edge_between(name, a, b, TransmissionLine::new(1.0, -10.0).into())
            .unwrap();
    }

    let mut initial = InitialConditions::new();
    initial.insert(
        "pipe".into(),
        InitialValue::new([(0.0, [62.0, 20.0]), (10_000.0, [60.0, 19.0])]).unwrap(),
    );
    initial.insert("valve".into(), InitialValue::constant([60.0, 15.0]));
    initial.insert("comp".into(), InitialValue::constant([58.5, 12.0]));
    initial.insert("s2".into(), InitialValue::constant([58.5, 3.0]));
    initial.insert("c1".into(), InitialValue::constant([60.0, 4.0]));
    initial.insert("slack".into(), InitialValue::constant([1.0, 0.0]));
    initial.insert("gasplant".into(), InitialValue::constant([1.01, 0.0]));
    initial.insert("load".into(), InitialValue::constant([0.97, -0.03]));
    initial.insert("plant".into(), InitialValue::constant([1.02, 0.02]));
    initial.insert("noisy".into(), InitialValue::constant([0.96, -0.04]));

    (NetworkProblem::new(net).unwrap(), initial)
}

fn initial_state(problem: &NetworkProblem, initial: &InitialConditions) -> DVector<f64> {
    let mut state = DVector::zeros(problem.number_of_states());
    problem.set_initial_values(&mut state, initial).unwrap();
    state
}

/// A state away from the initial one, so no residual row is trivially zero.
fn perturbed(state: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        state.len(),
        state
            .iter()
            .enumerate()
            .map(|(i, x)| x * (1.0 + 0.01 * ((i % 7) as f64 - 3.0) / 3.0)),
    )
}

fn assert_close(analytic: &DMatrix<f64>, numeric: &DMatrix<f64>, tolerance: f64) {
    assert_eq!(analytic.shape(), numeric.shape());
    for i in 0..analytic.nrows() {
        for j in 0..analytic.ncols() {
            let (a, n) = (analytic[(i, j)], numeric[(i, j)]);
            assert!(
                (a - n).abs() <= tolerance * (1.0 + a.abs()),
                "entry ({i}, {j}): analytic {a}, finite difference {n}"
            );
        }
    }
}

#[test]
fn state_count_adds_up() {
    let (problem, _) = mixed_network();
    // pipe 2 * 6, valve 4, compressor 4, short pipe 4, connection 2, five buses 2 each
    assert_eq!(problem.number_of_states(), 12 + 4 + 4 + 4 + 2 + 10);
    assert_eq!(problem.number_of_controls(), 2);
    assert_eq!(problem.number_of_constraints(), 1);
    assert_eq!(problem.number_of_switches(), 1);
}

#[test]
fn every_row_is_written() {
    let (mut problem, initial) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = initial_state(&problem, &initial);
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };
    let mut rootvalues = DVector::from_element(last.len(), f64::NAN);
    problem.evaluate(&mut rootvalues, &step, &perturbed(&last));
    assert!(rootvalues.iter().all(|r| r.is_finite()));
}

#[test]
fn network_jacobian_matches_finite_differences() {
    let (mut problem, initial) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = initial_state(&problem, &initial);
    let new_state = perturbed(&last);
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };

    let analytic = DMatrix::from(&assembled_jacobian(&problem, &step, &new_state));
    let numeric = problem_difference_jacobian(&problem, &step, &new_state, 1e-6);
    assert_close(&analytic, &numeric, 1e-4);
}

#[test]
fn last_state_jacobian_matches_finite_differences() {
    let (mut problem, initial) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = initial_state(&problem, &initial);
    let new_state = perturbed(&last);
    let n = last.len();

    let mut handler = TripletHandler::new(n, n);
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };
    problem.d_evaluate_d_last_state(&mut handler, &step, &new_state);
    let analytic = DMatrix::from(&handler.into_matrix());

    let numeric = gp_solver::jacobian::central_difference_jacobian(
        &last,
        |x| {
            let step = Timestep {
                last_time: 0.0,
                new_time: 60.0,
                last_state: x,
            };
            let mut rootvalues = DVector::zeros(n);
            problem.evaluate(&mut rootvalues, &step, &new_state);
            rootvalues
        },
        1e-6,
    );
    assert_close(&analytic, &numeric, 1e-5);
}

#[test]
fn in_place_refresh_matches_a_triplet_rebuild() {
    let (mut problem, initial) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = initial_state(&problem, &initial);
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };

    let mut matrix = assembled_jacobian(&problem, &step, &last);
    let moved = perturbed(&last);
    let mut handler = InPlaceHandler::new(&mut matrix);
    problem.d_evaluate_d_new_state(&mut handler, &step, &moved);
    handler.finalize().unwrap();

    let rebuilt = DMatrix::from(&assembled_jacobian(&problem, &step, &moved));
    let refreshed = DMatrix::from(&matrix);
    assert!((&refreshed - &rebuilt).abs().max() <= 1e-12 * rebuilt.abs().max());
}

#[test]
fn control_jacobian_matches_finite_differences() {
    let (mut problem, initial) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = initial_state(&problem, &initial);
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };

    let n = last.len();
    let mut handler = TripletHandler::new(n, problem.number_of_controls());
    problem.d_evaluate_d_control(&mut handler, &step, &last);
    let column = DMatrix::from(&handler.into_matrix());

    // Valve residual p0 - p1 - u, compressor residual p0 - p1 + u.
    assert_eq!(column.iter().filter(|&&v| v != 0.0).count(), 2);
    assert_eq!(column.column(0).sum(), -1.0);
    assert_eq!(column.column(1).sum(), 1.0);
}

#[test]
fn compressor_boost_comes_from_its_schedule() {
    let (mut problem, _) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    assert_eq!(problem.controls().as_slice(), &[1.5, 0.5]);
}

#[test]
fn constraint_reads_the_offtake_pressure() {
    let (mut problem, initial) = mixed_network();
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = initial_state(&problem, &initial);
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };

    let mut constraints = DVector::zeros(problem.number_of_constraints());
    problem.evaluate_constraints(&mut constraints, &step, &last);
    assert_eq!(constraints[0], 58.5);

    let n = last.len();
    let mut handler = TripletHandler::new(problem.number_of_constraints(), n);
    problem.d_evaluate_constraints_d_state(&mut handler, &step, &last);
    let row = DMatrix::from(&handler.into_matrix());
    assert_eq!(row.sum(), 1.0);
}

#[test]
fn connection_must_end_at_an_external_powerplant() {
    for end in [
        PowerNode::pq(0.0, 0.0, constant([-0.5, -0.2])),
        PowerNode::vphi(0.0, 0.0, constant([1.0, 0.0])),
    ] {
        let mut net = GasPowerNet::new();
        let source = gas(&mut net, "source", GasNode::source(constant([1.0])));
        let end = bus(&mut net, "end", end);
        net.make_edge_between("c1", source, end, GasPowerConnection::new(2.0, 1.5).into())
            .unwrap();
        let err = NetworkProblem::new(net).unwrap_err();
        assert!(matches!(err, ComponentError::Configuration { .. }), "{err}");
        assert!(err.to_string().contains("external powerplant"), "{err}");
    }
}

#[test]
fn external_powerplant_needs_a_gas_feed() {
    let mut net = GasPowerNet::new();
    let plant = bus(
        &mut net,
        "gasplant",
        PowerNode::external_powerplant(0.0, 0.0, constant([1.0, 0.0])),
    );
    let load = bus(&mut net, "load", PowerNode::pq(0.0, 0.0, constant([-0.5, -0.2])));
    net.make_edge_between("line", plant, load, TransmissionLine::new(1.0, -10.0).into())
        .unwrap();
    let err = NetworkProblem::new(net).unwrap_err();
    assert!(matches!(err, ComponentError::Configuration { .. }), "{err}");
    assert!(err.to_string().contains("gasplant"), "{err}");
}

#[test]
fn pipe_between_power_nodes_is_rejected() {
    let mut net = GasPowerNet::new();
    let a = bus(&mut net, "a", PowerNode::vphi(0.0, 0.0, constant([1.0, 0.0])));
    let b = bus(&mut net, "b", PowerNode::pq(0.0, 0.0, constant([-0.5, -0.2])));
    let pipe = Pipe::new(1_000.0, 0.5, 1e-5, 100.0).unwrap();
    net.make_edge_between("pipe", a, b, pipe.into()).unwrap();
    assert!(NetworkProblem::new(net).is_err());
}

#[test]
fn newton_solves_a_gas_line() {
    let mut net = GasPowerNet::new();
    let source = gas(&mut net, "source", GasNode::source(constant([5.0])));
    let outlet = gas(&mut net, "outlet", GasNode::pressure_boundary(constant([60.0])));
    let pipe = Pipe::new(10_000.0, 0.5, 1e-5, 1_000.0).unwrap();
    net.make_edge_between("pipe", source, outlet, pipe.into()).unwrap();
    let mut problem = NetworkProblem::new(net).unwrap();

    let mut initial = InitialConditions::new();
    initial.insert("pipe".into(), InitialValue::constant([60.0, 5.0]));
    let last = initial_state(&problem, &initial);
    problem.prepare_timestep(0.0, 60.0).unwrap();

    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };
    let mut solver = NewtonSolver::new(NewtonConfig {
        tolerance: 1e-6,
        ..NewtonConfig::default()
    });
    let mut state = last.clone();
    let options = SolveOptions {
        new_jacobian_structure: true,
        use_full_jacobian: true,
    };
    let outcome = solver.solve(&mut state, &problem, &step, options).unwrap();
    assert!(outcome.success, "{outcome:?}");

    // 11 points: q at the start, rho at the end.
    assert!((state[1] - 5.0).abs() < 1e-6);
    let outlet_pressure = gp_physics::gas::p(state[20]) / gp_physics::gas::BAR;
    assert!((outlet_pressure - 60.0).abs() < 1e-6);
}

#[test]
fn plant_switching_to_pv_rebuilds_the_jacobian() {
    let mut net = GasPowerNet::new();
    let slack = bus(&mut net, "slack", PowerNode::vphi(0.0, 0.0, constant([1.0, 0.0])));
    let plant = bus(
        &mut net,
        "plant",
        PowerNode::switched_powerplant(
            0.0,
            0.0,
            constant([1.02, 0.0]),
            constant([0.5, 1.02]),
            ControlValue::new([(0.0, [0.0]), (60.0, [0.0]), (120.0, [1.0])]).unwrap(),
        ),
    );
    net.make_edge_between("line", slack, plant, TransmissionLine::new(1.0, -10.0).into())
        .unwrap();
    let mut problem = NetworkProblem::new(net).unwrap();

    let mut initial = InitialConditions::new();
    initial.insert("slack".into(), InitialValue::constant([1.0, 0.0]));
    initial.insert("plant".into(), InitialValue::constant([1.0, 0.0]));
    let mut state = initial_state(&problem, &initial);
    let mut solver = NewtonSolver::new(NewtonConfig {
        tolerance: 1e-10,
        ..NewtonConfig::default()
    });

    // Slack mode at t = 60: every bus only touches its own diagonal.
    problem.prepare_timestep(0.0, 60.0).unwrap();
    let last = state.clone();
    let step = Timestep {
        last_time: 0.0,
        new_time: 60.0,
        last_state: &last,
    };
    let fresh = SolveOptions {
        new_jacobian_structure: true,
        use_full_jacobian: true,
    };
    let outcome = solver.solve(&mut state, &problem, &step, fresh).unwrap();
    assert!(outcome.success, "{outcome:?}");
    assert_eq!(solver.number_of_nonzeros(), 4);
    assert!((state[2] - 1.02).abs() < 1e-12 && state[3].abs() < 1e-12);

    // PV mode at t = 120: the plant's P row reaches into the slack columns.
    problem.prepare_timestep(60.0, 120.0).unwrap();
    assert_eq!(problem.switches()[0], 1.0);
    let last = state.clone();
    let step = Timestep {
        last_time: 60.0,
        new_time: 120.0,
        last_state: &last,
    };
    let reuse = SolveOptions {
        new_jacobian_structure: false,
        use_full_jacobian: true,
    };
    let outcome = solver.solve(&mut state, &problem, &step, reuse).unwrap();
    assert!(outcome.success, "{outcome:?}");
    assert_eq!(solver.number_of_nonzeros(), 7);
    assert_eq!(solver.factorization().number_of_analyses(), 2);
    assert!((state[2] - 1.02).abs() < 1e-10);

    let mut rootvalues = DVector::zeros(state.len());
    problem.evaluate(&mut rootvalues, &step, &state);
    assert!(rootvalues.amax() < 1e-10);
}
