use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rstest::rstest;
use winch_hardware::SimulatedRig;
use winch_traits::{Direction, EncoderInput, MotorDriver};

fn collect_edges(rig: &SimulatedRig, channel: usize) -> Arc<Mutex<Vec<(bool, bool)>>> {
    let edges = Arc::new(Mutex::new(Vec::new()));
    let sink = edges.clone();
    let mut input = rig.encoder_input(channel).expect("channel exists");
    input
        .register(Box::new(move |a, b| {
            sink.lock().unwrap().push((a, b));
        }))
        .expect("register");
    edges
}

#[rstest]
#[case(Direction::Forward, (true, true))]
#[case(Direction::Backward, (true, false))]
fn emits_edges_matching_direction(#[case] direction: Direction, #[case] expected: (bool, bool)) {
    let rig = SimulatedRig::new(1);
    let edges = collect_edges(&rig, 0);
    let mut driver = rig.driver();

    driver.set_speed(0, 0.5).expect("set_speed");
    driver.run(0, direction).expect("run");
    thread::sleep(Duration::from_millis(60));

    let seen = edges.lock().unwrap().clone();
    assert!(!seen.is_empty(), "rig produced no edges");
    assert!(seen.iter().all(|&e| e == expected));
}

#[test]
fn zero_duty_emits_nothing() {
    let rig = SimulatedRig::new(1);
    let edges = collect_edges(&rig, 0);
    let mut driver = rig.driver();

    driver.set_speed(0, 0.0).expect("set_speed");
    driver.run(0, Direction::Forward).expect("run");
    thread::sleep(Duration::from_millis(40));

    assert!(edges.lock().unwrap().is_empty());
}

#[test]
fn channels_are_independent() {
    let rig = SimulatedRig::new(2);
    let edges0 = collect_edges(&rig, 0);
    let edges1 = collect_edges(&rig, 1);
    let mut driver = rig.driver();

    driver.set_speed(0, 0.5).expect("set_speed");
    driver.run(0, Direction::Forward).expect("run");
    // Channel 1 never commanded: stays silent.
    thread::sleep(Duration::from_millis(60));

    assert!(!edges0.lock().unwrap().is_empty());
    assert!(edges1.lock().unwrap().is_empty());
}

#[test]
fn unknown_channel_is_rejected() {
    let rig = SimulatedRig::new(1);
    let mut driver = rig.driver();
    assert!(driver.set_speed(5, 0.5).is_err());
    assert!(driver.run(5, Direction::Forward).is_err());
    assert!(rig.encoder_input(5).is_none());
}

#[test]
fn second_registration_is_rejected() {
    let rig = SimulatedRig::new(1);
    let mut input = rig.encoder_input(0).expect("channel exists");
    input.register(Box::new(|_, _| {})).expect("first register");
    assert!(input.register(Box::new(|_, _| {})).is_err());
}
