use super::{
    AircraftState, AirspaceWarningManager, AltitudeLimit, Boundary, Hazard, HazardClass, HazardGeometryError,
    HazardId, HazardRegister, SeaLevel, VerticalBand, WarningState,
};
use crate::flight_control::common::{
    geo::{FlatProjection, GeoPoint},
    polar::GlidePolar,
    vec2d::Vec2D,
};
use crate::settings::{AirspaceSettings, ProjectionMode};
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};

fn origin() -> GeoPoint { GeoPoint::new(47.0, 8.0) }

fn local(x: f64, y: f64) -> GeoPoint { FlatProjection::new(origin()).unproject(Vec2D::new(x, y)) }

fn t(s: i64) -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(s) }

fn band(base: f64, top: f64) -> VerticalBand {
    VerticalBand { base: AltitudeLimit::msl(base), top: AltitudeLimit::msl(top) }
}

/// Axis-aligned rectangle in local metres around [`origin`].
fn rect(id: u32, (x0, y0): (f64, f64), (x1, y1): (f64, f64), band: VerticalBand) -> Hazard {
    Hazard {
        id: HazardId(id),
        name: format!("R{id}"),
        class: HazardClass::Restricted,
        boundary: Boundary::Polygon(vec![local(x0, y0), local(x1, y0), local(x1, y1), local(x0, y1)]),
        band,
    }
}

fn aircraft(location: GeoPoint, altitude: f64, ground_speed: f64, track: f64) -> AircraftState {
    AircraftState { location, altitude: Some(altitude), ground_speed, track, vertical_speed: Some(0.0) }
}

fn manager(hazards: Vec<Hazard>, settings: AirspaceSettings) -> AirspaceWarningManager {
    let utc = FixedOffset::east_opt(0).unwrap();
    AirspaceWarningManager::new(HazardRegister::new(hazards, &SeaLevel), settings, GlidePolar::default(), utc)
}

/// Hazard whose southern edge lies 200 m north of the origin.
fn ahead() -> Hazard { rect(1, (-500.0, 200.0), (500.0, 1200.0), band(0.0, 3000.0)) }

#[test]
fn test_intercept_ahead_is_near() {
    let mut mgr = manager(vec![ahead()], AirspaceSettings::default());
    mgr.update(Some(&aircraft(origin(), 1000.0, 5.0, 0.0)), t(0), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Near);
    let solution = record.solution().unwrap();
    assert!((solution.distance - 200.0).abs() < 0.5, "distance {}", solution.distance);
    assert!((solution.time - TimeDelta::seconds(40)).abs() < TimeDelta::milliseconds(100));
    assert_eq!(mgr.alerts(t(0)), vec![HazardId(1)]);
}

#[test]
fn test_beyond_horizon_is_clear() {
    let settings = AirspaceSettings { horizon_distance: 500.0, ..AirspaceSettings::default() };
    let far = rect(1, (-500.0, 600.0), (500.0, 1600.0), band(0.0, 3000.0));
    let mut mgr = manager(vec![far], settings);
    mgr.update(Some(&aircraft(origin(), 1000.0, 5.0, 0.0)), t(0), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Clear);
    assert!(record.solution().is_none());
    assert!(mgr.alerts(t(0)).is_empty());
}

fn climbing(altitude: f64, ground_speed: f64, vertical_speed: f64) -> AircraftState {
    AircraftState { vertical_speed: Some(vertical_speed), ..aircraft(origin(), altitude, ground_speed, 0.0) }
}

#[test]
fn test_climb_into_band_over_outline() {
    // outline starts 200 m ahead, band reached (base - buffer = 1070 m) after 35 s of climb
    let deep = rect(1, (-500.0, 200.0), (500.0, 5000.0), band(1100.0, 3000.0));
    let mut mgr = manager(vec![deep], AirspaceSettings::default());
    mgr.update(Some(&climbing(1000.0, 10.0, 2.0)), t(0), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Near);
    let solution = record.solution().unwrap();
    assert!((solution.distance - 350.0).abs() < 0.5, "distance {}", solution.distance);
    assert!((solution.time - TimeDelta::seconds(35)).abs() < TimeDelta::milliseconds(100));
    assert!((solution.altitude.unwrap() - 1070.0).abs() < 0.1);
}

#[test]
fn test_band_entry_before_exit_edge() {
    let shallow = rect(1, (-500.0, 200.0), (500.0, 1200.0), band(1100.0, 3000.0));
    let mut mgr = manager(vec![shallow], AirspaceSettings::default());
    mgr.update(Some(&climbing(1000.0, 10.0, 1.0)), t(0), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Near);
    let solution = record.solution().unwrap();
    assert!((solution.distance - 700.0).abs() < 0.5, "distance {}", solution.distance);
    assert!((solution.time - TimeDelta::seconds(70)).abs() < TimeDelta::milliseconds(100));
}

#[test]
fn test_descent_into_band_from_above() {
    let around = rect(1, (-500.0, -500.0), (500.0, 500.0), band(0.0, 800.0));
    let mut mgr = manager(vec![around.clone()], AirspaceSettings::default());
    mgr.update(Some(&climbing(1000.0, 10.0, -5.0)), t(0), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Near);
    assert!((record.solution().unwrap().distance - 340.0).abs() < 0.5);

    // too shallow: the outline is left before the band is reached
    let mut shallow = manager(vec![around], AirspaceSettings::default());
    shallow.update(Some(&climbing(1000.0, 10.0, -2.0)), t(0), true);
    let record = shallow.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Clear);
    assert!(record.solution().is_none());
}

#[test]
fn test_intercept_bounded_by_horizon_time() {
    let near = rect(1, (-500.0, 300.0), (500.0, 1300.0), band(0.0, 3000.0));
    let settings = AirspaceSettings { horizon_time_s: 100.0, ..AirspaceSettings::default() };
    let mut mgr = manager(vec![near.clone()], settings);
    mgr.update(Some(&aircraft(origin(), 1000.0, 2.0, 0.0)), t(0), true);
    assert!(mgr.record(HazardId(1)).unwrap().solution().is_none());

    let mut faster = manager(vec![near], settings);
    faster.update(Some(&aircraft(origin(), 1000.0, 4.0, 0.0)), t(0), true);
    let solution = faster.record(HazardId(1)).unwrap().solution().copied().unwrap();
    assert!((solution.distance - 300.0).abs() < 0.5);
}

#[test]
fn test_boundary_counts_as_inside() {
    let edge = rect(1, (-500.0, 0.0), (500.0, 1000.0), band(0.0, 3000.0));
    let mut mgr = manager(vec![edge], AirspaceSettings::default());
    mgr.update(Some(&aircraft(origin(), 1000.0, 20.0, 180.0)), t(0), true);
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Inside);
}

#[test]
fn test_slow_aircraft_has_no_solution() {
    let mut mgr = manager(vec![ahead()], AirspaceSettings::default());
    mgr.update(Some(&aircraft(origin(), 1000.0, 0.5, 0.0)), t(0), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Clear);
    assert!(record.solution().is_none());
}

#[test]
fn test_band_outside_reach_is_irrelevant() {
    let high = rect(1, (-500.0, 200.0), (500.0, 1200.0), band(3000.0, 4000.0));
    let mut mgr = manager(vec![high], AirspaceSettings::default());
    let summary = mgr.update(Some(&aircraft(origin(), 1000.0, 5.0, 0.0)), t(0), true);
    assert_eq!(summary.evaluated, 1);
    assert!(mgr.is_empty());
}

#[test]
fn test_glide_path_projection_reaches_lower_band() {
    let low = rect(1, (-500.0, 200.0), (500.0, 1200.0), band(0.0, 950.0));
    let state = aircraft(origin(), 1000.0, 5.0, 0.0);

    let mut track = manager(vec![low.clone()], AirspaceSettings::default());
    track.update(Some(&state), t(0), true);
    assert!(track.record(HazardId(1)).is_none());

    let settings = AirspaceSettings { projection: ProjectionMode::GlidePath, ..AirspaceSettings::default() };
    let mut glide = manager(vec![low], settings);
    glide.update(Some(&state), t(0), true);
    let record = glide.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Near);
    let altitude = record.solution().and_then(|s| s.altitude).unwrap();
    assert!(altitude < 1000.0 && altitude <= 980.0, "projected altitude {altitude}");
}

#[test]
fn test_ack_inside_lasts_for_duration() {
    let around = rect(1, (-500.0, -500.0), (500.0, 500.0), band(0.0, 3000.0));
    let mut mgr = manager(vec![around], AirspaceSettings::default());
    let state = aircraft(origin(), 1000.0, 20.0, 90.0);
    mgr.update(Some(&state), t(0), true);
    assert_eq!(mgr.alerts(t(0)), vec![HazardId(1)]);

    assert!(mgr.ack_inside(HazardId(1), t(0)));
    mgr.update(Some(&state), t(10), false);
    assert!(mgr.alerts(t(10)).is_empty());
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Inside);

    mgr.update(Some(&state), t(31), false);
    assert_eq!(mgr.alerts(t(31)), vec![HazardId(1)]);
    assert!(!mgr.ack_inside(HazardId(99), t(31)));
}

#[test]
fn test_escalation_requires_new_ack() {
    let settings = AirspaceSettings { ack_duration_s: 600.0, ..AirspaceSettings::default() };
    let mut mgr = manager(vec![ahead()], settings);
    let approaching = aircraft(origin(), 1000.0, 5.0, 0.0);
    mgr.update(Some(&approaching), t(0), true);
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Near);
    mgr.ack_warning(HazardId(1), t(0));
    mgr.ack_inside(HazardId(1), t(0));
    assert!(mgr.alerts(t(1)).is_empty());

    let inside = aircraft(local(0.0, 300.0), 1000.0, 5.0, 0.0);
    mgr.update(Some(&inside), t(20), false);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Inside);
    assert_eq!(record.ack_inside().expiry(), None);
    assert!(record.ack_warning().expiry().is_some());
    assert_eq!(mgr.alerts(t(20)), vec![HazardId(1)]);

    // back to NEAR: the warning acknowledgement still holds
    mgr.update(Some(&approaching), t(40), false);
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Near);
    assert!(mgr.alerts(t(40)).is_empty());
}

#[test]
fn test_clear_record_passes_near_before_inside() {
    let mut mgr = manager(vec![ahead()], AirspaceSettings::default());
    // flying away: relevant but no intercept
    mgr.update(Some(&aircraft(origin(), 1000.0, 20.0, 180.0)), t(0), true);
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Clear);

    let inside = aircraft(local(0.0, 300.0), 1000.0, 20.0, 180.0);
    mgr.update(Some(&inside), t(1), false);
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Near);
    mgr.update(Some(&inside), t(2), false);
    assert_eq!(mgr.record(HazardId(1)).unwrap().state(), WarningState::Inside);
}

#[test]
fn test_prune_and_recreate_forgets_acks() {
    let mut mgr = manager(vec![ahead()], AirspaceSettings::default());
    let near = aircraft(origin(), 1000.0, 20.0, 180.0);
    mgr.update(Some(&near), t(0), true);
    assert!(mgr.ack_day(HazardId(1), t(0)));
    let expiry = mgr.record(HazardId(1)).unwrap().ack_day().expiry().unwrap();
    assert_eq!(expiry, Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());

    let away = aircraft(local(0.0, -10_000.0), 1000.0, 20.0, 180.0);
    mgr.update(Some(&away), t(10), false);
    let record = mgr.record(HazardId(1)).expect("kept while the day acknowledgement lasts");
    assert!(!record.is_relevant());

    let next_day = expiry + TimeDelta::seconds(1);
    let summary = mgr.update(Some(&away), next_day, false);
    assert_eq!(summary.pruned, 1);
    assert!(mgr.record(HazardId(1)).is_none());

    mgr.update(Some(&near), next_day + TimeDelta::seconds(1), true);
    let record = mgr.record(HazardId(1)).unwrap();
    assert_eq!(record.state(), WarningState::Clear);
    assert_eq!(record.ack_day().expiry(), None);
    assert_eq!(record.ack_warning().expiry(), None);
}

#[test]
fn test_ack_day_uses_local_midnight() {
    let mut mgr = AirspaceWarningManager::new(
        HazardRegister::new(vec![ahead()], &SeaLevel),
        AirspaceSettings::default(),
        GlidePolar::default(),
        FixedOffset::east_opt(2 * 3600).unwrap(),
    );
    let late = Utc.with_ymd_and_hms(2024, 5, 1, 21, 30, 0).unwrap();
    mgr.update(Some(&aircraft(origin(), 1000.0, 5.0, 0.0)), late, true);
    mgr.ack_day(HazardId(1), late);
    let expiry = mgr.record(HazardId(1)).unwrap().ack_day().expiry();
    assert_eq!(expiry, Some(Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap()));
}

#[test]
fn test_invalid_geometry_is_skipped() {
    let mut broken = ahead();
    broken.id = HazardId(2);
    broken.boundary = Boundary::Polygon(vec![local(0.0, 100.0), local(10.0, 100.0)]);
    let mut inverted = ahead();
    inverted.id = HazardId(3);
    inverted.band = band(2000.0, 1000.0);
    let circle = Hazard {
        id: HazardId(4),
        name: "C".into(),
        class: HazardClass::Danger,
        boundary: Boundary::Circle { center: origin(), radius: 0.0 },
        band: band(0.0, 3000.0),
    };
    assert_eq!(broken.validate(), Err(HazardGeometryError::TooFewVertices(HazardId(2))));
    assert_eq!(inverted.validate(), Err(HazardGeometryError::InvertedBand(HazardId(3))));
    assert_eq!(circle.validate(), Err(HazardGeometryError::NonPositiveRadius(HazardId(4))));

    let mut mgr = manager(vec![ahead(), broken, inverted, circle], AirspaceSettings::default());
    assert_eq!(mgr.register().len(), 1);
    assert_eq!(mgr.register().rejected().len(), 3);
    mgr.update(Some(&aircraft(origin(), 1000.0, 5.0, 0.0)), t(0), true);
    assert_eq!(mgr.len(), 1);
    assert!(mgr.record(HazardId(1)).is_some());
}

#[test]
fn test_agl_band_resolved_once() {
    let mut hazard = ahead();
    hazard.band = VerticalBand { base: AltitudeLimit::agl(0.0), top: AltitudeLimit::agl(500.0) };
    let register = HazardRegister::new(vec![hazard], &|_: &GeoPoint| Some(700.0));
    let entry = register.get(HazardId(1)).unwrap();
    assert!((entry.base() - 700.0).abs() < f64::EPSILON);
    assert!((entry.top() - 1200.0).abs() < f64::EPSILON);
}

#[test]
fn test_overlapping_hazards_get_own_records() {
    let first = rect(1, (-500.0, -500.0), (500.0, 500.0), band(0.0, 3000.0));
    let mut second = rect(2, (-200.0, -200.0), (800.0, 800.0), band(0.0, 3000.0));
    second.class = HazardClass::Prohibited;
    let mut mgr = manager(vec![first, second], AirspaceSettings::default());
    mgr.update(Some(&aircraft(origin(), 1000.0, 20.0, 0.0)), t(0), true);
    assert_eq!(mgr.len(), 2);
    assert!(mgr.records().all(|r| r.state() == WarningState::Inside));
    assert_eq!(mgr.alerts(t(0)), vec![HazardId(2), HazardId(1)]);
    mgr.ack_inside(HazardId(2), t(0));
    assert_eq!(mgr.alerts(t(1)), vec![HazardId(1)]);
}

#[test]
fn test_incremental_pass_respects_budget() {
    let settings = AirspaceSettings { incremental_budget: 2, ..AirspaceSettings::default() };
    let hazards = (0..5)
        .map(|i| {
            let x = f64::from(i) * 1500.0 - 3000.0;
            rect(i, (x, 1000.0), (x + 500.0, 1500.0), band(0.0, 3000.0))
        })
        .collect();
    let mut mgr = manager(hazards, settings);
    let state = aircraft(origin(), 1000.0, 20.0, 180.0);
    let first = mgr.update(Some(&state), t(0), false);
    assert_eq!(first.evaluated, 2);
    assert_eq!(mgr.len(), 2);
    // two records plus the next two unseen hazards
    let second = mgr.update(Some(&state), t(1), false);
    assert_eq!(second.evaluated, 4);
    assert_eq!(mgr.len(), 4);
    let exhaustive = mgr.update(Some(&state), t(2), true);
    assert_eq!(exhaustive.evaluated, 5);
}

#[test]
fn test_set_hazards_keeps_surviving_records() {
    let other = rect(2, (-500.0, -1200.0), (500.0, -200.0), band(0.0, 3000.0));
    let mut mgr = manager(vec![ahead(), other], AirspaceSettings::default());
    mgr.update(Some(&aircraft(origin(), 1000.0, 5.0, 0.0)), t(0), true);
    assert_eq!(mgr.len(), 2);
    mgr.ack_warning(HazardId(1), t(0));

    let replacement = rect(3, (2000.0, 0.0), (2500.0, 500.0), band(0.0, 3000.0));
    mgr.set_hazards(vec![ahead(), replacement], &SeaLevel);
    assert_eq!(mgr.len(), 1);
    assert!(mgr.record(HazardId(1)).unwrap().ack_warning().expiry().is_some());
    assert!(mgr.record(HazardId(2)).is_none());
}

#[test]
fn test_no_aircraft_only_prunes() {
    let mut mgr = manager(vec![ahead()], AirspaceSettings::default());
    let summary = mgr.update(None, t(0), true);
    assert_eq!(summary.evaluated, 0);
    assert!(mgr.is_empty());
}
