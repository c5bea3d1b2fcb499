/// Quadratic sink polar of the aircraft, `sink(v) = a·v² + b·v + c` with `v` in m/s and the
/// sink rate positive downwards.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GlidePolar {
    a: f64,
    b: f64,
    c: f64,
}

impl GlidePolar {
    pub const fn new(a: f64, b: f64, c: f64) -> Self { Self { a, b, c } }

    /// Sink rate in m/s at airspeed `v`.
    pub fn sink(&self, v: f64) -> f64 { self.a * v * v + self.b * v + self.c }

    /// Speed to fly for a given `MacCready` setting, clamped to be non-negative.
    ///
    /// Minimises `(sink(v) + mc) / v`, whose derivative vanishes at `v = sqrt((c + mc) / a)`.
    pub fn speed_to_fly(&self, mc: f64) -> Option<f64> {
        if self.a <= 0.0 {
            return None;
        }
        let radicand = (self.c + mc.max(0.0)) / self.a;
        (radicand > 0.0).then(|| radicand.sqrt())
    }

    /// Still-air glide ratio flown at the speed to fly for `mc`.
    pub fn glide_ratio(&self, mc: f64) -> Option<f64> {
        let v = self.speed_to_fly(mc)?;
        let sink = self.sink(v);
        (sink > 0.0).then(|| v / sink)
    }
}

impl Default for GlidePolar {
    /// A 15 m standard class glider at moderate wing loading.
    fn default() -> Self { Self::new(0.001_96, -0.086_2, 1.55) }
}
