//! Integration test: reference scenarios of the dynamic-focus deployment.
//!
//! Output levels {2, 4, 6} V, nine-rule AND grid.

use focus_common::flc::{
    Combinator, ConditionConfig, FlcConfig, OutputLevels, RuleConfig, ZeroSumFallback,
};
use focus_control_unit::controller::FocusController;
use focus_control_unit::error::ClampFlags;

const EPS: f64 = 1e-9;

fn configured(levels: OutputLevels) -> FocusController {
    let mut flc = FocusController::new(FlcConfig::dynamic_focus(levels));
    flc.setup().unwrap();
    flc
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn near_target_with_small_beam_drives_low() {
    let mut flc = configured(OutputLevels::TWO_FOUR_SIX);
    // Near 0.6 and Far 0.4 against Large 1: only Low is activated.
    let e = flc.evaluate(10.0, 25000.0).unwrap();
    assert_close(e.voltage, 2.0);
    assert!(e.clamped.is_empty());
    assert!(!e.fallback);
}

#[test]
fn far_target_with_wide_beam_leans_high() {
    let mut flc = configured(OutputLevels::TWO_FOUR_SIX);
    // Aggregate [0, 0.2, 0.8] → (4·0.2 + 6·0.8) / 1.0.
    let volts = flc.run(45.0, 79000.0).unwrap();
    assert_close(volts, 5.6);
}

#[test]
fn distance_at_universe_minimum() {
    let mut flc = configured(OutputLevels::TWO_FOUR_SIX);
    // Near ∧ XX-Large fires Mid fully.
    assert_close(flc.run(0.0, 79000.0).unwrap(), 4.0);
}

#[test]
fn out_of_range_distance_behaves_as_boundary() {
    let mut flc = configured(OutputLevels::TWO_FOUR_SIX);
    let clamped = flc.evaluate(-5.0, 79000.0).unwrap();
    let boundary = flc.evaluate(0.0, 79000.0).unwrap();
    assert_close(clamped.voltage, 4.0);
    assert_eq!(clamped.voltage, boundary.voltage);
    assert_eq!(clamped.clamped, ClampFlags::DISTANCE_BELOW_MIN);
    assert!(boundary.clamped.is_empty());
}

#[test]
fn no_rule_fires_uses_fallback() {
    let mut config = FlcConfig::default();
    config.controller.zero_sum_fallback = ZeroSumFallback::HoldLast;
    config.rules = vec![RuleConfig {
        combinator: Combinator::And,
        when: vec![
            ConditionConfig::new("distance", "Near"),
            ConditionConfig::new("beam_width", "Large"),
        ],
        then: "Low".to_string(),
    }];
    let mut flc = FocusController::new(config);
    flc.setup().unwrap();

    // Near(50) = 0: nothing fires, no prior output → midpoint.
    let first = flc.evaluate(50.0, 79000.0).unwrap();
    assert!(first.fallback);
    assert_close(first.voltage, 4.0);
    assert!(first.voltage.is_finite());

    assert_close(flc.run(10.0, 25000.0).unwrap(), 2.0);
    let held = flc.evaluate(50.0, 79000.0).unwrap();
    assert!(held.fallback);
    assert_close(held.voltage, 2.0);
}

#[test]
fn zero_one_two_levels_map_the_same_rule_surface() {
    let mut low = configured(OutputLevels::ZERO_ONE_TWO);
    let mut high = configured(OutputLevels::TWO_FOUR_SIX);
    // {0,1,2} is {2,4,6} shifted by 2 and halved.
    for (d, w) in [(10.0, 25000.0), (45.0, 79000.0), (30.0, 50000.0), (17.5, 61000.0)] {
        let a = low.run(d, w).unwrap();
        let b = high.run(d, w).unwrap();
        assert_close(a, (b - 2.0) / 2.0);
    }
}

#[test]
fn output_stays_within_universe_bounds() {
    let mut flc = configured(OutputLevels::TWO_FOUR_SIX);
    for d in (-10..=60).step_by(3) {
        for w in (20_000..=85_000).step_by(3_500) {
            let v = flc.run(f64::from(d), f64::from(w)).unwrap();
            assert!((2.0..=6.0).contains(&v), "({d}, {w}) → {v}");
        }
    }
}

#[test]
fn evaluation_is_deterministic() {
    let mut a = configured(OutputLevels::TWO_FOUR_SIX);
    let mut b = configured(OutputLevels::TWO_FOUR_SIX);
    for (d, w) in [(12.3, 45678.0), (49.9, 26000.0), (25.0, 50000.0)] {
        assert_eq!(a.run(d, w).unwrap(), b.run(d, w).unwrap());
        assert_eq!(a.run(d, w).unwrap(), a.run(d, w).unwrap());
    }
}

#[test]
fn or_combinator_changes_the_surface() {
    let mut config = FlcConfig::default();
    for rule in &mut config.rules {
        rule.combinator = Combinator::Or;
    }
    let mut or = FocusController::new(config);
    or.setup().unwrap();
    let mut and = configured(OutputLevels::TWO_FOUR_SIX);

    // Near fully true, Large fully true: OR also fires every Near-row and
    // Large-column rule.
    let or_v = or.run(0.0, 25000.0).unwrap();
    let and_v = and.run(0.0, 25000.0).unwrap();
    assert_close(and_v, 2.0);
    assert!(or_v > and_v, "OR {or_v} vs AND {and_v}");
}
