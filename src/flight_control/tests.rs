use super::{
    FlightPhase, GlideComputer, PhaseClassifier, PhaseEdge, PhaseEdgeDetector, Supervisor,
    air_data::AirDataComputer,
    common::geo::GeoPoint,
    events::FlightEvent,
    slow_derived::{Throttle, teammate_info},
    stage::{Access, Field, PIPELINE, Stage},
    statistics::FlightStatistics,
    task::{ObservationZone, TaskPlan, TaskPoint},
    working_band::WorkingBand,
};
use crate::airspace::{AltitudeLimit, Boundary, Hazard, HazardClass, HazardId, SeaLevel, VerticalBand};
use crate::blackboard::Fix;
use crate::keychain::Keychain;
use crate::settings::{AirDataSettings, ComputerSettings, FlightPhaseSettings, WorkingBandSettings};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use strum::IntoEnumIterator;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

const HOME: GeoPoint = GeoPoint::new(47.0, 8.0);

fn t(ms: i64) -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000, 0).unwrap() + TimeDelta::milliseconds(ms) }

#[allow(clippy::cast_possible_truncation)]
fn fix(secs: f64, speed: f64, altitude: f64) -> Fix {
    Fix::new(t((secs * 1000.0).round() as i64))
        .with_location(HOME.offset(0.0, speed * secs))
        .with_gps_altitude(altitude)
        .with_ground_velocity(speed, 0.0)
}

fn keychain(settings: &ComputerSettings, plan: Option<TaskPlan>, hazards: Vec<Hazard>) -> Keychain {
    Keychain::new(settings, plan, hazards, &SeaLevel)
}

fn computer() -> (GlideComputer, Keychain) {
    let settings = ComputerSettings::default();
    let keys = keychain(&settings, None, Vec::new());
    (GlideComputer::new(settings, keys.clone()), keys)
}

fn drain(rx: &mut broadcast::Receiver<FlightEvent>) -> Vec<FlightEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

#[test]
fn test_pipeline_reads_only_earlier_writes() {
    assert_eq!(Stage::iter().count(), PIPELINE.len());
    assert!(Stage::iter().all(|s| PIPELINE.contains(&s)));

    for (i, stage) in PIPELINE.iter().enumerate() {
        for access in stage.reads() {
            match *access {
                Access::Current(field) => assert!(
                    field.is_input() || PIPELINE[..i].iter().any(|s| s.writes().contains(&field)),
                    "{stage} reads {field} before it is written"
                ),
                Access::Prior(field) => assert!(
                    field.is_input() || PIPELINE.iter().any(|s| s.writes().contains(&field)),
                    "{stage} reads prior {field} nobody writes"
                ),
            }
        }
    }
    for field in Field::iter() {
        let writers = PIPELINE.iter().filter(|s| s.writes().contains(&field)).count();
        let expected = usize::from(!field.is_input());
        assert_eq!(writers, expected, "{field} has {writers} writers");
    }
    assert_eq!(PIPELINE.last(), Some(&Stage::Publish));
}

#[test]
fn test_phase_edges_fire_once() {
    let settings = FlightPhaseSettings::default();
    let mut classifier = PhaseClassifier::new(settings);
    let mut edges = PhaseEdgeDetector::default();
    let mut fired = Vec::new();
    for s in 0..60 {
        let speed = if s < 40 { 20.0 } else { 0.0 };
        let phase = classifier.update(t(s * 1000), Some(speed), Some(0.0));
        fired.extend(edges.update(phase));
        // same classification fed twice
        fired.extend(edges.update(phase));
    }
    assert_eq!(fired, vec![PhaseEdge::Takeoff]);
    assert_eq!(classifier.phase(), FlightPhase::Flying);
}

#[test]
fn test_phase_needs_sustained_condition() {
    let mut classifier = PhaseClassifier::new(FlightPhaseSettings::default());
    // gusty taxiing: fast samples interrupted by slow ones never reach the dwell time
    for s in 0..60 {
        let speed = if s % 8 == 7 { 7.0 } else { 12.0 };
        assert_eq!(classifier.update(t(s * 1000), Some(speed), None), FlightPhase::NotFlying);
    }
    // a strong climb alone is enough
    for s in 60..71 {
        classifier.update(t(s * 1000), Some(0.0), Some(4.0));
    }
    assert_eq!(classifier.phase(), FlightPhase::Flying);
    // missing speed neither advances nor cancels
    assert_eq!(classifier.update(t(100_000), None, None), FlightPhase::Flying);
}

#[test]
fn test_time_warp_resets_phase_dwell() {
    let mut classifier = PhaseClassifier::new(FlightPhaseSettings::default());
    classifier.update(t(0), Some(20.0), None);
    classifier.update(t(8_000), Some(20.0), None);
    classifier.reset_timers();
    assert_eq!(classifier.update(t(11_000), Some(20.0), None), FlightPhase::NotFlying);
    assert_eq!(classifier.update(t(21_000), Some(20.0), None), FlightPhase::Flying);
}

#[test]
fn test_takeoff_and_landing_through_computer() {
    let (mut gc, keys) = computer();
    let mut rx = keys.events().subscribe();
    for s in 0..100 {
        let speed = if (5..40).contains(&s) { 20.0 } else { 0.0 };
        gc.on_fix(fix(f64::from(s), speed, 500.0), false);
    }
    let events = drain(&mut rx);
    let takeoffs = events.iter().filter(|e| matches!(e, FlightEvent::Takeoff { .. })).count();
    let landings: Vec<_> = events.iter().filter(|e| matches!(e, FlightEvent::Landing { .. })).collect();
    assert_eq!(takeoffs, 1);
    assert_eq!(landings.len(), 1);
    assert!(matches!(landings[0], FlightEvent::Landing { time, .. } if *time == t(70_000)));

    let stats = &gc.derived().statistics;
    assert_eq!(stats.takeoff_time, Some(t(15_000)));
    assert_eq!(stats.landing_time, Some(t(70_000)));
    assert_eq!(stats.flight_time, TimeDelta::seconds(54));
    assert_eq!(gc.derived().phase, FlightPhase::NotFlying);
}

#[test]
fn test_missing_inputs_degrade_gracefully() {
    let (mut gc, keys) = computer();
    assert!(gc.on_fix(Fix::new(t(0)), false));
    let snapshot = keys.blackboard().read();
    let derived = &snapshot.derived;
    assert_eq!(derived.version, 1);
    assert_eq!(derived.time, Some(t(0)));
    assert!(derived.local_time.is_some());
    assert_eq!(derived.air.vertical_speed, None);
    assert_eq!(derived.air.wind, None);
    assert!(derived.working_band.is_none());
    assert!(derived.task.is_none());
    assert!(derived.teammate.is_none());

    // the idle path copes without a position as well
    gc.on_idle_at(true, t(0));
    assert_eq!(keys.blackboard().version(), 2);
    assert!(keys.blackboard().read().derived.trace.is_empty());
}

#[test]
fn test_idle_requests_are_rate_limited() {
    let (mut gc, _keys) = computer();
    let requests = (0..20).filter(|i| gc.on_fix(fix(f64::from(*i) * 0.1, 20.0, 800.0), false)).count();
    assert_eq!(requests, 4);
}

#[test]
fn test_duplicate_fix_ignored_unless_forced() {
    let (mut gc, keys) = computer();
    gc.on_fix(fix(0.0, 20.0, 800.0), false);
    assert_eq!(keys.blackboard().version(), 1);
    assert!(!gc.on_fix(fix(0.0, 20.0, 800.0), false));
    assert_eq!(keys.blackboard().version(), 1);
    gc.on_fix(fix(0.0, 20.0, 800.0), true);
    assert_eq!(keys.blackboard().version(), 2);
}

#[test]
fn test_time_warp_resets_history() {
    let (mut gc, keys) = computer();
    let mut rx = keys.events().subscribe();
    for s in 0..30 {
        if gc.on_fix(fix(f64::from(s), 20.0, 800.0), false) {
            gc.on_idle_at(false, t(i64::from(s) * 1000));
        }
    }
    assert_eq!(gc.derived().trace.len(), 30);
    assert!(gc.derived().statistics.takeoff_time.is_some());
    assert!(gc.derived().vario_scale.is_some());

    gc.on_fix(fix(3.0, 20.0, 800.0), false);
    let derived = gc.derived();
    assert_eq!(derived.time_warps, 1);
    assert!(derived.trace.is_empty());
    assert!(derived.statistics.takeoff_time.is_none());
    assert_eq!(derived.phase, FlightPhase::Flying);
    assert!(drain(&mut rx).iter().any(|e| matches!(e, FlightEvent::TimeWarp { from, to } if *from == t(29_000) && *to == t(3_000))));

    // history grows again right after the warp
    gc.on_idle_at(false, t(3_000));
    assert_eq!(gc.derived().trace.len(), 1);
}

#[test]
fn test_ack_expiry_surfaces_without_fixes() {
    let settings = ComputerSettings::default();
    let zone = Hazard {
        id: HazardId(1),
        name: "Around".into(),
        class: HazardClass::Restricted,
        boundary: Boundary::Circle { center: HOME, radius: 1_000.0 },
        band: VerticalBand { base: AltitudeLimit::msl(0.0), top: AltitudeLimit::msl(3_000.0) },
    };
    let keys = keychain(&settings, None, vec![zone]);
    let mut gc = GlideComputer::new(settings, keys.clone());
    assert!(gc.on_fix(fix(0.0, 20.0, 1_000.0), false));
    gc.on_idle_at(true, t(0));
    assert_eq!(keys.blackboard().read().derived.alerts, vec![HazardId(1)]);

    assert!(keys.warnings().write(|m| m.ack_inside(HazardId(1), t(0))));
    gc.on_idle_at(false, t(10_000));
    assert!(keys.blackboard().read().derived.alerts.is_empty());
    assert_eq!(keys.blackboard().read().derived.warnings.len(), 1);

    gc.on_idle_at(false, t(31_000));
    assert_eq!(keys.blackboard().read().derived.alerts, vec![HazardId(1)]);
}

#[test]
fn test_task_events_and_auto_advance() {
    let settings = ComputerSettings::default();
    let plan = TaskPlan::new(vec![
        TaskPoint::new("Start", HOME, ObservationZone::Cylinder { radius: 490.0 }),
        TaskPoint::new("Goal", HOME.offset(0.0, 2_000.0), ObservationZone::Cylinder { radius: 310.0 }),
    ])
    .unwrap();
    let keys = keychain(&settings, Some(plan), Vec::new());
    let mut gc = GlideComputer::new(settings, keys.clone());
    let mut rx = keys.events().subscribe();
    // 20 m/s north from home: first fix outside the start at 25 s (500 m), goal zone at 85 s
    for s in 0..100 {
        gc.on_fix(fix(f64::from(s), 20.0, 800.0), false);
    }
    let events: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| !matches!(e, FlightEvent::Takeoff { .. }))
        .collect();
    assert!(matches!(&events[0], FlightEvent::ZoneEntry { index: 0, name, .. } if name == "Start"));
    assert!(matches!(events[1], FlightEvent::TaskStart { time } if time == t(25_000)));
    assert!(matches!(&events[2], FlightEvent::ZoneEntry { index: 1, name, time } if name == "Goal" && *time == t(85_000)));
    assert!(matches!(events[3], FlightEvent::TaskFinish { .. }));
    let task = gc.derived().task.as_ref().unwrap();
    assert!(task.finished);
    assert_eq!(task.active_index, 1);
}

#[test]
fn test_slow_values_are_throttled() {
    let (mut gc, _keys) = computer();
    gc.on_fix(fix(0.0, 20.0, 800.0), false);
    assert!(gc.derived().teammate.is_none());
    gc.set_teammate_position(HOME.offset(90.0, 1_000.0), t(500));
    gc.on_fix(fix(1.0, 20.0, 800.0), false);
    assert!(gc.derived().teammate.is_none());
    gc.on_fix(fix(10.0, 20.0, 800.0), false);
    let mate = gc.derived().teammate.unwrap();
    assert!(mate.range > 1_000.0);
    assert!((mate.age - TimeDelta::milliseconds(9_500)).abs() < TimeDelta::milliseconds(1));
}

#[test]
fn test_teammate_times_out() {
    let report = super::slow_derived::TeammateReport { location: HOME, time: t(0) };
    let own = Some(HOME.offset(180.0, 500.0));
    let timeout = TimeDelta::seconds(120);
    let info = teammate_info(own, Some(report), t(60_000), timeout).unwrap();
    assert!((info.bearing - 0.0).abs() < 0.01 || (info.bearing - 360.0).abs() < 0.01);
    assert!((info.range - 500.0).abs() < 0.5);
    assert!(teammate_info(own, Some(report), t(121_000), timeout).is_none());
    assert!(teammate_info(None, Some(report), t(1_000), timeout).is_none());

    let mut throttle = Throttle::default();
    assert!(throttle.ready(t(0), timeout));
    assert!(!throttle.ready(t(1_000), timeout));
    assert!(throttle.ready(t(120_000), timeout));
}

#[test]
fn test_air_data_prefers_external_vario_and_estimates_wind() {
    let mut air = AirDataComputer::default();
    let settings = AirDataSettings { vario_gain: 1.0, wind_gain: 1.0 };
    let first = Fix::new(t(0)).with_gps_altitude(1_000.0).with_ground_velocity(20.0, 0.0).with_air_velocity(25.0, 0.0);
    let data = air.update(&first, &settings);
    assert_eq!(data.vertical_speed, None);
    // 5 m/s headwind from the north
    let wind = data.wind.unwrap();
    assert!((wind.y() + 5.0).abs() < 1e-9 && wind.x().abs() < 1e-9);
    assert!(data.wind_from().is_some_and(|from| from.abs() < 1e-6 || (from - 360.0).abs() < 1e-6));

    let second = Fix::new(t(2_000)).with_gps_altitude(1_004.0).with_air_velocity(25.0, 0.0);
    let data = air.update(&second, &settings);
    assert_eq!(data.vertical_speed, Some(2.0));
    assert!(data.wind.is_none());
    assert_eq!(data.te_vario, Some(2.0));

    let third = Fix::new(t(3_000)).with_gps_altitude(1_010.0).with_vario(-1.0);
    assert_eq!(air.update(&third, &settings).vertical_speed, Some(-1.0));
}

#[test]
fn test_working_band_follows_statistics() {
    let settings = WorkingBandSettings { safety_height: 300.0 };
    let mut stats = FlightStatistics::default();
    assert!(WorkingBand::compute(Some(900.0), &stats, &settings).is_none());
    stats.begin(t(0), Some(HOME), Some(500.0));
    stats.accumulate(t(1_000), Some(HOME), Some(1_800.0));
    let band = WorkingBand::compute(Some(1_450.0), &stats, &settings).unwrap();
    assert!((band.floor - 800.0).abs() < f64::EPSILON);
    assert!((band.ceiling - 1_800.0).abs() < f64::EPSILON);
    assert!((band.fraction - 0.65).abs() < 1e-9);
}

#[tokio::test]
async fn test_supervisor_processes_fixes_until_stream_closes() {
    let (gc, keys) = computer();
    let (supervisor, feeds) = Supervisor::new(gc, CancellationToken::new());
    let handle = tokio::spawn(supervisor.run());
    for s in 0..5 {
        feeds.fixes.send(fix(f64::from(s), 20.0, 800.0)).await.unwrap();
    }
    drop(feeds);
    let gc = handle.await.unwrap();
    assert_eq!(keys.blackboard().read().fix.map(|f| f.time()), Some(t(4_000)));
    assert!(gc.derived().version >= 6);
    assert_eq!(gc.derived().trace.len(), 5);
}

#[tokio::test]
async fn test_supervisor_stops_on_cancel() {
    let (gc, keys) = computer();
    let cancel = CancellationToken::new();
    let (supervisor, _feeds) = Supervisor::new(gc, cancel.clone());
    cancel.cancel();
    let gc = supervisor.run().await;
    assert_eq!(gc.derived().version, 1);
    assert_eq!(keys.blackboard().version(), 1);
}
