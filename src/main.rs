#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
use chrono::{TimeDelta, Utc};
use glide_computer::airspace::{AltitudeLimit, Boundary, Hazard, HazardClass, HazardId, SeaLevel, VerticalBand};
use glide_computer::blackboard::{Blackboard, Fix};
use glide_computer::flight_control::{
    GlideComputer, Supervisor,
    common::geo::GeoPoint,
    events::FlightEvent,
    task::{ObservationZone, TaskPlan, TaskPoint},
};
use glide_computer::keychain::Keychain;
use glide_computer::settings::ComputerSettings;
use glide_computer::{error, info, log, warn};
use std::{env, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Wall-clock pause between two synthetic fixes.
const FIX_PERIOD: Duration = Duration::from_millis(20);
/// Simulated time between two synthetic fixes.
const FIX_STEP: TimeDelta = TimeDelta::seconds(1);
/// Every how many published versions the reader prints a status line.
const REPORT_EVERY: u64 = 20;

const HOME: GeoPoint = GeoPoint::new(47.0, 8.0);

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let settings = settings_from_env();
    let demo_secs = env::var("GLIDE_DEMO_SECONDS").ok().and_then(|v| v.parse::<i64>().ok()).unwrap_or(900);

    let plan = match demo_task() {
        Ok(plan) => Some(plan),
        Err(e) => {
            error!("Demo task rejected: {e}");
            None
        }
    };
    let keychain = Keychain::new(&settings, plan, demo_hazards(), &SeaLevel);
    let cancel = CancellationToken::new();

    let computer = GlideComputer::new(settings, keychain.clone());
    let (supervisor, feeds) = Supervisor::new(computer, cancel.clone());
    let supervisor_handle = tokio::spawn(supervisor.run());
    let reader_handle = tokio::spawn(report(keychain.blackboard(), cancel.clone()));
    let event_handle = tokio::spawn(listen(keychain.events().subscribe(), cancel.clone()));

    let start = Utc::now();
    for second in 0..demo_secs {
        let fix = synthetic_fix(start, second);
        if feeds.fixes.send(fix).await.is_err() {
            warn!("Supervisor stopped accepting fixes");
            break;
        }
        tokio::time::sleep(FIX_PERIOD).await;
    }
    drop(feeds);

    match supervisor_handle.await {
        Ok(computer) => {
            let stats = &computer.derived().statistics;
            info!(
                "Flight time {}s, {:.1} km flown, {} time warps",
                stats.flight_time.num_seconds(),
                stats.distance_flown / 1000.0,
                computer.derived().time_warps
            );
        }
        Err(e) => error!("Supervisor task failed: {e}"),
    }
    cancel.cancel();
    let _ = tokio::join!(reader_handle, event_handle);
}

/// Default settings with a few environment overrides.
fn settings_from_env() -> ComputerSettings {
    let mut settings = ComputerSettings::default();
    if let Some(offset) = env::var("GLIDE_UTC_OFFSET").ok().and_then(|v| v.parse::<i32>().ok()) {
        settings.utc_offset_minutes = offset;
    }
    if let Some(mc) = env::var("GLIDE_MAC_CREADY").ok().and_then(|v| v.parse::<f64>().ok()) {
        settings.airspace.mac_cready = mc;
    }
    settings
}

fn demo_task() -> Result<TaskPlan, glide_computer::flight_control::task::TaskPlanError> {
    let turn = HOME.offset(20.0, 6_000.0);
    TaskPlan::new(vec![
        TaskPoint::new("Home", HOME, ObservationZone::Cylinder { radius: 1_000.0 }),
        TaskPoint::new("Ridge", turn, ObservationZone::Cylinder { radius: 500.0 }),
        TaskPoint::new("Finish", HOME, ObservationZone::Line { length: 1_000.0 }),
    ])
}

fn demo_hazards() -> Vec<Hazard> {
    let corner = HOME.offset(0.0, 4_000.0).offset(270.0, 1_000.0);
    vec![
        Hazard {
            id: HazardId(1),
            name: "TMA North".into(),
            class: HazardClass::Controlled,
            boundary: Boundary::Polygon(vec![
                corner,
                corner.offset(90.0, 2_000.0),
                corner.offset(90.0, 2_000.0).offset(0.0, 2_000.0),
                corner.offset(0.0, 2_000.0),
            ]),
            band: VerticalBand { base: AltitudeLimit::msl(1_000.0), top: AltitudeLimit::msl(3_000.0) },
        },
        Hazard {
            id: HazardId(2),
            name: "Range East".into(),
            class: HazardClass::Danger,
            boundary: Boundary::Circle { center: HOME.offset(80.0, 3_000.0), radius: 800.0 },
            band: VerticalBand { base: AltitudeLimit::agl(0.0), top: AltitudeLimit::msl(2_000.0) },
        },
    ]
}

/// A fix of the demo flight: a takeoff roll northwards, a climb, a glide through the task
/// area and a landing back home.
#[allow(clippy::cast_precision_loss)]
fn synthetic_fix(start: chrono::DateTime<Utc>, second: i64) -> Fix {
    let t = second as f64;
    let (speed, climb) = match second {
        0..30 => (t, 0.0),
        30..300 => (25.0, 1.5),
        300..800 => (28.0, -0.6),
        _ => (0.0, 0.0),
    };
    let track = if second < 420 { 20.0 } else { 200.0 };
    let distance = if second < 420 { 25.0 * t } else { 25.0 * (840.0 - t).max(0.0) };
    let altitude = 500.0 + 1.5 * (t.min(300.0) - 30.0).max(0.0) - 0.6 * (t.min(800.0) - 300.0).max(0.0);
    Fix::new(start + FIX_STEP * i32::try_from(second).unwrap_or(i32::MAX))
        .with_location(HOME.offset(20.0, distance))
        .with_gps_altitude(altitude.max(500.0))
        .with_ground_velocity(speed, track)
        .with_air_velocity(speed + 2.0, track)
        .with_vario(climb)
}

/// Prints a status line every few published snapshots.
async fn report(blackboard: Arc<Blackboard>, cancel: CancellationToken) {
    let mut rx = blackboard.subscribe();
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&rx.borrow_and_update());
                let derived = &snapshot.derived;
                if derived.version % REPORT_EVERY != 0 {
                    continue;
                }
                let altitude = snapshot.fix.and_then(|f| f.altitude()).unwrap_or(f64::NAN);
                log!(
                    "v{} {} alt {:.0} m, vs {:.1} m/s, {} warnings, alerts {:?}",
                    derived.version,
                    derived.phase,
                    altitude,
                    derived.air.vertical_speed.unwrap_or(0.0),
                    derived.warnings.len(),
                    derived.alerts,
                );
            }
        }
    }
}

async fn listen(mut rx: broadcast::Receiver<FlightEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Ok(event) => info!("Event: {event:?}"),
                Err(broadcast::error::RecvError::Lagged(n)) => warn!("Event listener lagged by {n}"),
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
