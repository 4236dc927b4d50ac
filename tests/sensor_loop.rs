//! End-to-end tests driving the node and synapse models through the
//! reference harness.

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grid_snn::generator;
use grid_snn::harness::Harness;
use grid_snn::nodes::{FreqSensor, HermSensor, IafAlpha, Node};
use grid_snn::status::{self, StatusDict};
use grid_snn::synapses::{StdpAlphaSynapse, StdpSynapse, Synapse};
use grid_snn::time::TimeGrid;

const SEED: u64 = 42;

fn ms_to_step(t: f64, resolution: f64) -> i64 {
    (t / resolution) as i64
}

#[test]
fn freq_sensor_follows_poisson_encoding() {
    let resolution = 0.1;
    let grid = TimeGrid::build(resolution, 10).unwrap();
    let mut net = Harness::new(grid);
    let sensor = net
        .add_node(Box::new(FreqSensor::new(FreqSensor::recordables())))
        .unwrap();
    net.enable_logging(sensor);

    let duration = 500.0;
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);

    // periodic integration-window markers on receptor 1
    for t in generator::periodic_train(1.0, 50.0, duration).unwrap() {
        net.schedule_spike(sensor, 1, 1.0, ms_to_step(t, resolution))
            .unwrap();
    }
    // irregular encoding spikes on receptor 2
    for t in generator::poisson_train(0.05, duration, &mut rng).unwrap() {
        net.schedule_spike(sensor, 2, 1.0, ms_to_step(t, resolution))
            .unwrap();
    }
    // a slowly varying input current feeding the reconstruction
    for t in generator::periodic_train(0.0, 10.0, duration).unwrap() {
        net.schedule_current(sensor, 50.0, ms_to_step(t, resolution))
            .unwrap();
    }

    net.run_slices(500);

    let logger = net.node(sensor).logger();
    assert_eq!(logger.steps().len(), 5000);
    // the membrane trace stays finite throughout
    let v_m_column = logger
        .names()
        .iter()
        .position(|name| name == "V_m")
        .unwrap();
    assert!(logger.rows().iter().all(|row| row[v_m_column].is_finite()));

    // recorded detector spikes are in non-decreasing time order
    let times: Vec<f64> = net
        .node(sensor)
        .history()
        .entries()
        .map(|e| e.time())
        .collect();
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn sensor_variants_agree_on_shared_dynamics() {
    // without current input the reconstruction traces stay at zero and the
    // real and complex sensors reduce to the same gate/membrane dynamics
    let resolution = 0.1;
    let grid = TimeGrid::build(resolution, 10).unwrap();
    let mut net = Harness::new(grid);
    let freq = net
        .add_node(Box::new(FreqSensor::new(FreqSensor::recordables())))
        .unwrap();
    let herm = net
        .add_node(Box::new(HermSensor::new(HermSensor::recordables())))
        .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    for t in generator::poisson_train(0.02, 300.0, &mut rng).unwrap() {
        for node in [freq, herm] {
            net.schedule_spike(node, 2, 1.0, ms_to_step(t, resolution))
                .unwrap();
        }
    }
    net.run_slices(300);

    assert_relative_eq!(
        net.node(freq).get_recordable("V_m").unwrap(),
        net.node(herm).get_recordable("V_m").unwrap(),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        net.node(freq).get_recordable("gate").unwrap(),
        net.node(herm).get_recordable("gate").unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn stdp_pair_learns_within_bounds() {
    let grid = TimeGrid::build(0.1, 10).unwrap();
    let mut net = Harness::new(grid);
    let recordables = IafAlpha::recordables();
    let source = net
        .add_node(Box::new(IafAlpha::new(recordables.clone())))
        .unwrap();
    let target = net.add_node(Box::new(IafAlpha::new(recordables))).unwrap();

    let plastic = net
        .connect(Box::new(
            StdpSynapse::build(source, target, 5.0, 10, 1).unwrap(),
        ))
        .unwrap();

    // a silent alpha-rule synapse observing the same pair
    let mut silent = StdpAlphaSynapse::build(source, target, 5.0, 10, 2).unwrap();
    let mut d = StatusDict::new();
    status::insert_bool(&mut d, "emit", false);
    silent.set_status(&d).unwrap();
    let silent = net.connect(Box::new(silent)).unwrap();

    for k in 0..40 {
        net.schedule_spike(source, 1, 1.0e5, 5 + 50 * k).unwrap();
        net.schedule_spike(target, 2, 1.0e5, 20 + 50 * k).unwrap();
    }
    net.run_slices(250);

    let plastic_weight = net.synapse(plastic).core().weight();
    assert!(plastic_weight != 5.0);
    assert!((0.0..=100.0).contains(&plastic_weight));

    // the silent synapse learned too, despite never forwarding anything
    let silent_weight = net.synapse(silent).core().weight();
    assert!(silent_weight != 5.0);
    assert!((0.0..=100.0).contains(&silent_weight));
}

#[test]
fn rescaled_forwarding_reaches_the_target() {
    let grid = TimeGrid::build(0.1, 10).unwrap();
    let mut net = Harness::new(grid);
    let recordables = IafAlpha::recordables();
    let source = net
        .add_node(Box::new(IafAlpha::new(recordables.clone())))
        .unwrap();
    let target = net.add_node(Box::new(IafAlpha::new(recordables))).unwrap();

    let mut synapse = StdpSynapse::build(source, target, 5.0, 10, 1).unwrap();
    let mut d = StatusDict::new();
    status::insert_f64(&mut d, "scale", 100.0);
    synapse.set_status(&d).unwrap();
    net.connect(Box::new(synapse)).unwrap();

    net.schedule_spike(source, 1, 1.0e5, 5).unwrap();
    net.run_slices(20);

    assert!(net.node(source).history().last_spike() > 0.0);
    assert!(net.node(target).get_recordable("I_syn").unwrap() != 0.0);
}
