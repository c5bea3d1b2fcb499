use crate::blackboard::Fix;
use crate::flight_control::common::vec2d::Vec2D;
use crate::settings::AirDataSettings;
use chrono::{DateTime, Utc};

const GRAVITY: f64 = 9.81;

/// Vertical and air-mass quantities of one cycle. `None` marks an unavailable value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AirData {
    /// Vertical speed in m/s, positive up.
    pub vertical_speed: Option<f64>,
    /// Kinetic energy expressed as height, `TAS² / 2g`, in metres.
    pub energy_height: Option<f64>,
    /// Vertical speed compensated for energy exchange, in m/s.
    pub te_vario: Option<f64>,
    /// Wind vector in m/s (the direction the air moves to).
    pub wind: Option<Vec2D<f64>>,
}

impl AirData {
    /// Direction the wind blows from, in degrees.
    pub fn wind_from(&self) -> Option<f64> { self.wind.map(|w| (-w).bearing()) }
}

/// Stateful estimator behind the air-data stage.
#[derive(Debug, Clone, Default)]
pub struct AirDataComputer {
    last_altitude: Option<(DateTime<Utc>, f64)>,
    last_energy: Option<(DateTime<Utc>, f64)>,
    vertical_speed: Option<f64>,
    wind: Option<Vec2D<f64>>,
}

impl AirDataComputer {
    /// Computes the air data for `fix`.
    ///
    /// The external vario wins over the differentiated altitude. The wind estimate keeps its
    /// last filtered value while airspeed or heading are missing, but is reported unavailable
    /// for that cycle.
    #[allow(clippy::cast_precision_loss)]
    pub fn update(&mut self, fix: &Fix, settings: &AirDataSettings) -> AirData {
        let time = fix.time();

        let derived_vs = match (fix.altitude(), self.last_altitude) {
            (Some(alt), Some((t0, alt0))) => {
                let dt = (time - t0).num_milliseconds() as f64 / 1000.0;
                (dt > 0.0).then(|| (alt - alt0) / dt)
            }
            _ => None,
        };
        if let Some(alt) = fix.altitude() {
            self.last_altitude = Some((time, alt));
        }
        self.vertical_speed = match (fix.vario(), derived_vs) {
            (Some(vario), _) => Some(vario),
            (None, Some(raw)) => Some(low_pass(self.vertical_speed, raw, settings.vario_gain)),
            (None, None) if fix.altitude().is_none() => None,
            (None, None) => self.vertical_speed,
        };

        let energy_height = fix.airspeed().map(|tas| tas * tas / (2.0 * GRAVITY));
        let te_vario = match (self.vertical_speed, energy_height, self.last_energy) {
            (Some(vs), Some(eh), Some((t0, eh0))) => {
                let dt = (time - t0).num_milliseconds() as f64 / 1000.0;
                (dt > 0.0).then(|| vs + (eh - eh0) / dt)
            }
            _ => None,
        };
        self.last_energy = energy_height.map(|eh| (time, eh));

        let wind = match (fix.ground_velocity(), fix.air_velocity()) {
            (Some(ground), Some(air)) => {
                let raw = ground - air;
                let filtered = match self.wind {
                    Some(prev) => prev + (raw - prev) * settings.wind_gain,
                    None => raw,
                };
                self.wind = Some(filtered);
                Some(filtered)
            }
            _ => None,
        };

        AirData { vertical_speed: self.vertical_speed, energy_height, te_vario, wind }
    }

    /// Forgets all history. Called after a time warp.
    pub fn reset(&mut self) { *self = Self::default(); }
}

fn low_pass(previous: Option<f64>, sample: f64, gain: f64) -> f64 {
    match previous {
        Some(prev) => prev + (sample - prev) * gain.clamp(0.0, 1.0),
        None => sample,
    }
}
