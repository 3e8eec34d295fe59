//! Integration tests for hourly, temperature-compensated monitoring.
//!
//! The monitor loop runs against a [`VirtualClock`], so a day of hourly
//! readings completes instantly and every sleep is observable.

use crate::mock_hw::{
    MemoryStore, NoDelay, RecordingSink, ScriptedAdc, ScriptedTemperature, VirtualClock,
};

use ecprobe::app::events::AppEvent;
use ecprobe::app::monitor::{MAX_SLEEP_SLICE_MS, Monitor, MonitorState, TemperatureSource};
use ecprobe::app::ports::Clock;
use ecprobe::config::{CalibrationConfig, READING_INTERVAL_MS, SamplingConfig};
use ecprobe::error::{ConfigError, SensorError};

const HOUR_MS: u64 = READING_INTERVAL_MS;

fn field_config() -> CalibrationConfig {
    CalibrationConfig::new(SamplingConfig::default(), 4.0, -223.6)
}

// ── Single readings ───────────────────────────────────────────

#[test]
fn warm_water_is_compensated_once() {
    let mut monitor = Monitor::new(field_config());
    let reading = monitor
        .read_once(
            &mut ScriptedAdc::constant(1800),
            &mut ScriptedTemperature(Some(35.0)),
            &mut NoDelay,
        )
        .unwrap();

    assert_eq!(reading.raw_average, 1800.0);
    assert!((reading.ec_raw - 6976.4).abs() < 0.01);
    assert!((reading.ec_compensated - 5813.667).abs() < 0.01);
    assert_eq!(reading.temperature_source, TemperatureSource::Live);
    assert!(reading.is_live_compensated());
}

#[test]
fn missing_temperature_falls_back_to_reference() {
    let mut monitor = Monitor::new(field_config());
    let reading = monitor
        .read_once(
            &mut ScriptedAdc::constant(1800),
            &mut ScriptedTemperature(None),
            &mut NoDelay,
        )
        .unwrap();

    assert_eq!(reading.temperature_c, 25.0);
    assert_eq!(reading.temperature_source, TemperatureSource::Fallback);
    assert_eq!(reading.ec_compensated, reading.ec_raw);
}

#[test]
fn implausible_temperature_is_treated_as_unavailable() {
    let mut monitor = Monitor::new(field_config());
    let reading = monitor
        .read_once(
            &mut ScriptedAdc::constant(1800),
            &mut ScriptedTemperature(Some(150.0)),
            &mut NoDelay,
        )
        .unwrap();

    assert_eq!(reading.temperature_source, TemperatureSource::Fallback);
}

#[test]
fn dead_probe_reports_sensor_error() {
    let mut monitor = Monitor::new(field_config());
    let err = monitor
        .read_once(
            &mut ScriptedAdc::failing(),
            &mut ScriptedTemperature(Some(25.0)),
            &mut NoDelay,
        )
        .unwrap_err();

    assert_eq!(err, SensorError::AllSamplesFailed);
    assert_eq!(monitor.state(), MonitorState::Faulted);
    assert_eq!(monitor.failed_readings(), 1);
}

#[test]
fn reading_uses_configured_sample_count() {
    let mut config = field_config();
    config.samples = 7;
    let mut adc = ScriptedAdc::constant(100);

    Monitor::new(config)
        .read_once(&mut adc, &mut ScriptedTemperature(None), &mut NoDelay)
        .unwrap();

    assert_eq!(adc.reads, 7);
}

// ── Configuration loading ─────────────────────────────────────

#[test]
fn missing_calibration_fails_fast() {
    let store = MemoryStore::new();
    assert_eq!(Monitor::from_store(&store).err(), Some(ConfigError::Missing));
}

#[test]
fn lone_slope_is_rejected() {
    let store = MemoryStore::with_json(r#"{ "slope": 4.0 }"#);
    assert!(matches!(
        Monitor::load_config(&store),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn lone_intercept_is_rejected() {
    let store = MemoryStore::with_json(r#"{ "intercept": -223.6 }"#);
    assert!(matches!(
        Monitor::load_config(&store),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn garbage_file_is_corrupted() {
    let store = MemoryStore::with_json("slope=4");
    assert_eq!(
        Monitor::load_config(&store).err(),
        Some(ConfigError::Corrupted)
    );
}

#[test]
fn sampling_fields_default_when_omitted() {
    let store = MemoryStore::with_json(r#"{ "slope": 4.0, "intercept": -223.6 }"#);
    let config = Monitor::load_config(&store).unwrap();
    assert_eq!(config.sampling(), SamplingConfig::default());
}

// ── Scheduled loop ────────────────────────────────────────────

#[test]
fn one_reading_per_hour_plus_the_first() {
    const HOURS: u64 = 24;
    let mut clock = VirtualClock::new();
    let stop = clock.stop_at(HOURS * HOUR_MS + 500);
    let store = MemoryStore::with_config(&field_config());
    let mut monitor = Monitor::from_store(&store).unwrap();
    let mut sink = RecordingSink::new();

    let end = monitor.run_forever(
        &mut ScriptedAdc::constant(1800),
        &mut ScriptedTemperature(Some(25.0)),
        &mut NoDelay,
        &mut clock,
        &stop,
        &mut sink,
    );

    assert_eq!(end, MonitorState::Stopped);
    let readings = sink.readings();
    assert_eq!(readings.len() as u64, HOURS + 1);
    for (i, (ts, _)) in readings.iter().enumerate() {
        assert_eq!(*ts, i as u64 * HOUR_MS);
    }
    assert_eq!(monitor.readings_taken(), HOURS + 1);

    // Monitoring never writes the calibration back.
    assert_eq!(store.saves, 0);
}

#[test]
fn sleeps_are_sliced_so_stop_is_noticed_promptly() {
    let mut clock = VirtualClock::new();
    let stop = clock.stop_at(HOUR_MS / 2);
    let mut sink = RecordingSink::new();

    Monitor::new(field_config()).run_forever(
        &mut ScriptedAdc::constant(1800),
        &mut ScriptedTemperature(None),
        &mut NoDelay,
        &mut clock,
        &stop,
        &mut sink,
    );

    assert!(clock.longest_sleep_ms <= MAX_SLEEP_SLICE_MS);
    assert!(clock.now_ms() < HOUR_MS / 2 + MAX_SLEEP_SLICE_MS);
    assert_eq!(sink.readings().len(), 1);
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::Stopped { readings_taken: 1 })
    ));
}

#[test]
fn failed_reading_does_not_end_the_loop() {
    let config = field_config();
    let samples = usize::from(config.samples);
    let mut adc = ScriptedAdc::constant(1800);
    adc.push_repeated(Err(SensorError::AdcReadFailed), samples);

    let mut clock = VirtualClock::new();
    let stop = clock.stop_at(2 * HOUR_MS + 500);
    let mut sink = RecordingSink::new();
    let mut monitor = Monitor::new(config);

    monitor.run_forever(
        &mut adc,
        &mut ScriptedTemperature(Some(25.0)),
        &mut NoDelay,
        &mut clock,
        &stop,
        &mut sink,
    );

    assert_eq!(sink.failures(), 1);
    let readings = sink.readings();
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].0, HOUR_MS);
    assert_eq!(monitor.failed_readings(), 1);
    assert_eq!(monitor.state(), MonitorState::Stopped);
}

#[test]
fn stop_before_start_still_reports_cleanly() {
    let mut clock = VirtualClock::new();
    let stop = clock.stop_at(0);
    let mut sink = RecordingSink::new();
    let mut adc = ScriptedAdc::constant(1800);

    let end = Monitor::new(field_config()).run_forever(
        &mut adc,
        &mut ScriptedTemperature(None),
        &mut NoDelay,
        &mut clock,
        &stop,
        &mut sink,
    );

    assert_eq!(end, MonitorState::Stopped);
    assert_eq!(adc.reads, 0);
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::Stopped { readings_taken: 0 }]
    ));
}

#[test]
fn custom_interval_is_honoured() {
    let mut clock = VirtualClock::new();
    let stop = clock.stop_at(10 * 60_000 + 1);
    let mut sink = RecordingSink::new();

    Monitor::new(field_config())
        .with_interval_ms(60_000)
        .run_forever(
            &mut ScriptedAdc::constant(1800),
            &mut ScriptedTemperature(None),
            &mut NoDelay,
            &mut clock,
            &stop,
            &mut sink,
        );

    assert_eq!(sink.readings().len(), 11);
}
