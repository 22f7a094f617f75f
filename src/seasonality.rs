use std::f64::consts::TAU;

/// Multiplicative seasonal factor for a calendar month (1-12):
/// `1 + amplitude * sin(2π(m − 1)/12 + phase)`.
pub fn seasonal_factor(amplitude: f64, phase: f64, month: u32) -> f64 {
    let angle = TAU * (month as f64 - 1.0) / 12.0 + phase;
    1.0 + amplitude * angle.sin()
}

/// The twelve factors of a department's seasonal curve, January first.
pub fn seasonal_curve(amplitude: f64, phase: f64) -> [f64; 12] {
    let mut curve = [0.0; 12];
    for (i, factor) in curve.iter_mut().enumerate() {
        *factor = seasonal_factor(amplitude, phase, i as u32 + 1);
    }
    curve
}

pub fn seasonal_bounds(amplitude: f64) -> (f64, f64) {
    (1.0 - amplitude, 1.0 + amplitude)
}
