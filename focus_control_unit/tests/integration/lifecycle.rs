//! Integration test: controller lifecycle across setup, run and stop.

use std::sync::Arc;
use std::thread;

use focus_common::flc::FlcConfig;
use focus_control_unit::controller::FocusController;
use focus_control_unit::error::{ConfigurationError, FlcError};
use focus_control_unit::state::{ControllerState, LifecycleEvent};

#[test]
fn full_lifecycle() {
    let mut flc = FocusController::with_defaults();
    assert_eq!(flc.state(), ControllerState::Unconfigured);

    flc.setup().unwrap();
    assert_eq!(flc.state(), ControllerState::Configured);

    for d in [5.0, 15.0, 25.0, 35.0] {
        flc.run(d, 50000.0).unwrap();
    }
    assert_eq!(flc.state(), ControllerState::Running);
    let last = flc.last_output().unwrap();

    flc.stop().unwrap();
    assert_eq!(flc.state(), ControllerState::Stopped);
    assert_eq!(flc.last_output(), Some(last));
}

#[test]
fn every_violation_names_state_and_operation() {
    let mut flc = FocusController::with_defaults();
    assert_eq!(
        flc.run(1.0, 30000.0),
        Err(FlcError::LifecycleViolation {
            state: ControllerState::Unconfigured,
            operation: LifecycleEvent::Run,
        })
    );

    flc.setup().unwrap();
    assert_eq!(
        flc.setup(),
        Err(FlcError::LifecycleViolation {
            state: ControllerState::Configured,
            operation: LifecycleEvent::Setup,
        })
    );

    flc.stop().unwrap();
    for result in [flc.setup(), flc.stop(), flc.run(1.0, 30000.0).map(drop)] {
        assert!(matches!(
            result,
            Err(FlcError::LifecycleViolation {
                state: ControllerState::Stopped,
                ..
            })
        ));
    }
    assert_eq!(flc.state(), ControllerState::Stopped);
}

#[test]
fn rejected_setup_can_be_retried_on_a_new_controller() {
    let mut config = FlcConfig::default();
    config.rules[3].when[1].term = "Medium".to_string();
    let mut bad = FocusController::new(config);
    let err = bad.setup().unwrap_err();
    assert!(matches!(
        err,
        FlcError::Configuration(ConfigurationError::UnknownTerm { rule: 3, .. })
    ));
    assert!(err.to_string().contains("Medium"));
    assert_eq!(bad.state(), ControllerState::Unconfigured);
    assert!(bad.run(10.0, 25000.0).is_err());

    let mut good = FocusController::with_defaults();
    assert!(good.setup().is_ok());
}

#[test]
fn shared_engine_evaluates_concurrently() {
    let mut flc = FocusController::with_defaults();
    flc.setup().unwrap();
    let expected = flc.run(45.0, 79000.0).unwrap();
    let engine = flc.shared_engine().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let inference = engine.infer(&[45.0, 79000.0]).unwrap();
                inference.aggregate.to_vec()
            })
        })
        .collect();

    let trace = flc.trace(45.0, 79000.0).unwrap();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), trace.aggregate);
    }
    assert_eq!(trace.centroid, Some(expected));
}
