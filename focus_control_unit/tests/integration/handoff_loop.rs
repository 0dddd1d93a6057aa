//! Integration test: sensing thread → input slot → control loop → actuator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use focus_common::flc::FlcConfig;
use focus_control_unit::controller::{Evaluation, FocusController};
use focus_control_unit::cycle::{Actuator, ControlLoop, SensorSample};
use focus_control_unit::handoff::InputSlot;
use focus_control_unit::state::ControllerState;

/// Records commanded voltages into shared storage.
#[derive(Clone, Default)]
struct SharedRecorder {
    voltages: Arc<Mutex<Vec<f64>>>,
}

impl Actuator for SharedRecorder {
    fn command(&mut self, _sample: &SensorSample, evaluation: &Evaluation) {
        self.voltages.lock().unwrap().push(evaluation.voltage);
    }
}

fn fast_config() -> FlcConfig {
    let mut config = FlcConfig::default();
    config.controller.cycle_time_us = 500;
    config
}

#[test]
fn loop_tracks_the_latest_sample() {
    let slot = Arc::new(InputSlot::new());
    let recorder = SharedRecorder::default();
    let mut control = ControlLoop::new(
        FocusController::new(fast_config()),
        Arc::clone(&slot),
        recorder.clone(),
    )
    .unwrap();

    // No sample yet: cycles run, nothing is commanded.
    control.run_for(3).unwrap();
    assert_eq!(control.stats().cycle_count, 3);
    assert!(recorder.voltages.lock().unwrap().is_empty());

    slot.publish(SensorSample {
        distance: 10.0,
        beam_width: 25000.0,
    });
    control.run_for(2).unwrap();

    slot.publish(SensorSample {
        distance: 45.0,
        beam_width: 79000.0,
    });
    control.run_for(1).unwrap();

    let voltages = recorder.voltages.lock().unwrap().clone();
    assert_eq!(voltages.len(), 3);
    assert_eq!(voltages[0], voltages[1]);
    assert!((voltages[0] - 2.0).abs() < 1e-9);
    assert!((voltages[2] - 5.6).abs() < 1e-9);

    assert_eq!(control.controller().state(), ControllerState::Running);
    let stats = control.shutdown().unwrap();
    assert_eq!(stats.cycle_count, 6);
    assert_eq!(stats.commands, 3);
}

#[test]
fn producer_thread_feeds_the_loop_until_drained() {
    let slot = Arc::new(InputSlot::new());
    let finished = Arc::new(AtomicBool::new(false));
    let recorder = SharedRecorder::default();

    let producer = {
        let slot = Arc::clone(&slot);
        let finished = Arc::clone(&finished);
        thread::spawn(move || {
            for i in 0..20 {
                slot.publish(SensorSample {
                    distance: f64::from(i) * 2.5,
                    beam_width: 25000.0 + f64::from(i) * 2700.0,
                });
                thread::sleep(Duration::from_micros(300));
            }
            finished.store(true, Ordering::Release);
        })
    };

    let mut control = ControlLoop::new(
        FocusController::new(fast_config()),
        Arc::clone(&slot),
        recorder.clone(),
    )
    .unwrap();

    let mut drained = false;
    control
        .run_until(Some(10_000), || {
            if drained {
                return true;
            }
            drained = finished.load(Ordering::Acquire);
            false
        })
        .unwrap();
    producer.join().unwrap();

    let voltages = recorder.voltages.lock().unwrap().clone();
    assert!(!voltages.is_empty());
    assert!(voltages.iter().all(|v| (2.0..=6.0).contains(v)));

    // The final sample (47.5 cm, 76300 px) was delivered before the loop ended.
    let mut reference = FocusController::new(fast_config());
    reference.setup().unwrap();
    let expected = reference.run(47.5, 76300.0).unwrap();
    assert_eq!(*voltages.last().unwrap(), expected);

    // Every published value was either taken or overwritten.
    assert_eq!(slot.published(), 20);
    assert!(slot.overwritten() < 20);
}
