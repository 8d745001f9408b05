use scriptsync_core::{
    data::Keyframe,
    engine::{Engine, PlaybackState},
    error::SyncError,
    outputs::CoreEvent,
    parse_funscript_json,
    settings::Settings,
    Config, InterpolationModel,
};
use scriptsync_test_fixtures::scripts;
use serde_json::json;

#[test]
fn every_fixture_either_loads_or_reports_invalid_script() {
    for name in scripts::keys() {
        let text = scripts::json(&name).unwrap();
        match parse_funscript_json(&text) {
            Ok(bundle) => assert!(!bundle.main.is_empty(), "{name}"),
            Err(err) => assert_eq!(err.category(), "script", "{name}: {err}"),
        }
    }
}

#[test]
fn ramp_fixture_ignores_extra_keys() {
    let bundle = parse_funscript_json(&scripts::json("ramp").unwrap()).unwrap();
    assert_eq!(
        bundle.main.keyframes(),
        &[Keyframe::new(0, 0.0), Keyframe::new(1_000, 100.0)]
    );
    assert!(bundle.vibrate.is_none());
    assert!(bundle.rotate.is_none());
}

#[test]
fn inverted_fixture_flips_positions() {
    let bundle = parse_funscript_json(&scripts::json("inverted-ramp").unwrap()).unwrap();
    assert_eq!(
        bundle.main.keyframes(),
        &[Keyframe::new(0, 100.0), Keyframe::new(1_000, 0.0)]
    );
}

#[test]
fn unsorted_fixture_is_sorted_clamped_and_truncated() {
    let bundle = parse_funscript_json(&scripts::json("unsorted").unwrap()).unwrap();
    assert_eq!(
        bundle.main.keyframes(),
        &[
            Keyframe::new(0, 0.0),
            Keyframe::new(300, 100.0),
            Keyframe::new(600, 40.0),
            Keyframe::new(900, 0.0),
        ]
    );
}

#[test]
fn multi_axis_fixture_drops_malformed_rotate_axis() {
    let bundle = parse_funscript_json(&scripts::json("multi-axis").unwrap()).unwrap();
    assert_eq!(bundle.main.len(), 3);
    assert_eq!(bundle.vibrate.as_ref().map(|t| t.len()), Some(2));
    assert!(bundle.rotate.is_none());
}

#[test]
fn bridge_envelope_is_unwrapped() {
    let bundle = parse_funscript_json(&scripts::json("bridge-envelope").unwrap()).unwrap();
    assert_eq!(bundle.main.get(1), Some(Keyframe::new(200, 100.0)));
}

#[test]
fn bridge_error_becomes_invalid_script() {
    let err = parse_funscript_json(&scripts::json("bridge-error").unwrap()).unwrap_err();
    assert!(matches!(err, SyncError::InvalidScript { ref reason } if reason.contains("not found")));
    assert!(!err.is_recoverable());
}

#[test]
fn malformed_input_degrades_to_no_script() {
    let mut eng = Engine::new(Config::default());
    eng.load_script_json(&scripts::json("ramp").unwrap()).unwrap();
    for bad in [
        "not json",
        "[]",
        r#"{"actions": []}"#,
        r#"{"actions": [{"at": "zero", "pos": 1}]}"#,
        r#"{"actions": [{"at": 0}]}"#,
        r#"{"metadata": {}}"#,
    ] {
        assert!(eng.load_script_json(bad).is_err(), "{bad}");
        assert!(eng.script().is_none());
        let out = eng.play(0, 0);
        assert!(out.events.is_empty());
        assert!(eng.tick(50).is_empty());
        assert_eq!(eng.state(), PlaybackState::Idle);
    }
}

#[test]
fn loading_announces_axes() {
    let mut eng = Engine::new(Config::default());
    let out = eng
        .load_script_json(&scripts::json("multi-axis").unwrap())
        .unwrap();
    assert_eq!(
        out.events,
        vec![CoreEvent::ScriptLoaded {
            main_len: 3,
            has_vibrate: true,
            has_rotate: false,
        }]
    );
}

#[test]
fn settings_snapshot_overrides_config() {
    let settings = Settings::from_json(&json!({
        "latency": "120",
        "updateRate": 40,
        "interpolationType": "PCHIP",
        "intensity": 0.8,
        "enableSpeedLimit": "true",
        "speedLimitCount": 250,
        "fallbackVibrate": true,
        "fallbackRotateGain": "0.5",
        "unrelated": [1, 2, 3]
    }))
    .unwrap();
    let cfg = settings.merge_over(Config::default());
    assert_eq!(cfg.offset_ms, -120);
    assert_eq!(cfg.update_rate_hz, 40);
    assert_eq!(cfg.tick_interval_ms(), 25);
    assert_eq!(cfg.interpolation, InterpolationModel::Pchip);
    assert_eq!(cfg.gain, 0.8);
    assert!(cfg.speed_limit_enabled);
    assert_eq!(cfg.speed_limit_units_per_second, 250.0);
    assert!(cfg.fallback_vibration);
    assert!(!cfg.fallback_rotation);
    assert_eq!(cfg.fallback_rotate_gain, 0.5);
}

#[test]
fn settings_must_be_an_object() {
    let err = Settings::from_json(&json!([1, 2])).unwrap_err();
    assert_eq!(err.category(), "config");
}
