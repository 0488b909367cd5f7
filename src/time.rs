//! Simulation clock and solar direction.
//!
//! The clock accumulates frame time into a monotonic elapsed value with
//! an explicit reset and a display cap; the solar helpers derive a sun
//! direction from the calendar date for the animated day/night mode.

use chrono::{DateTime, Datelike, Utc};
use nalgebra::Vector3;

pub const SOLAR_DECLINATION_MAX: f64 = -23.45;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Reported elapsed time freezes here; the simulation pauses with it.
pub const DISPLAY_CAP_SECONDS: f64 = 60.0;

/// Monotonic elapsed-seconds source for the whole simulation.
///
/// Advanced once per frame from the frame's stable dt, so the value
/// tracks wall-clock playback rather than frame count. `reset` moves
/// the zero point to now and discards everything accumulated so far.
pub struct SimulationClock {
    elapsed: f64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    pub fn tick(&mut self, dt: f64) {
        if dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Elapsed value for display and simulation, frozen at the cap.
    pub fn display_elapsed(&self) -> f64 {
        self.elapsed.min(DISPLAY_CAP_SECONDS)
    }

    pub fn at_cap(&self) -> bool {
        self.elapsed >= DISPLAY_CAP_SECONDS
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Sun direction in the inertial frame for a calendar date.
///
/// Declination from the day-of-year cosine approximation, right
/// ascension from the day offset against the March equinox. Good to a
/// couple of degrees, which is all the shading needs.
pub fn sun_direction(timestamp: DateTime<Utc>) -> Vector3<f64> {
    let day_of_year = timestamp.ordinal() as f64;
    let declination: f64 =
        SOLAR_DECLINATION_MAX * ((360.0 / DAYS_PER_YEAR) * (day_of_year + 10.0)).to_radians().cos();
    let decl_rad = declination.to_radians();
    let sun_ra = ((day_of_year - 80.0) * 360.0 / DAYS_PER_YEAR).to_radians();
    Vector3::new(
        decl_rad.cos() * sun_ra.cos(),
        decl_rad.sin(),
        -decl_rad.cos() * sun_ra.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clock_accumulates_and_resets() {
        let mut clock = SimulationClock::new();
        clock.tick(1.5);
        clock.tick(0.5);
        assert!((clock.elapsed() - 2.0).abs() < 1e-12);
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.at_cap());
    }

    #[test]
    fn clock_ignores_non_positive_dt() {
        let mut clock = SimulationClock::new();
        clock.tick(1.0);
        clock.tick(-0.25);
        clock.tick(0.0);
        assert!((clock.elapsed() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display_value_freezes_at_cap() {
        let mut clock = SimulationClock::new();
        clock.tick(59.0);
        assert!(!clock.at_cap());
        assert!((clock.display_elapsed() - 59.0).abs() < 1e-12);
        clock.tick(5.0);
        assert!(clock.at_cap());
        assert_eq!(clock.display_elapsed(), DISPLAY_CAP_SECONDS);
        assert!(clock.elapsed() > DISPLAY_CAP_SECONDS);
    }

    #[test]
    fn sun_direction_is_unit_length() {
        for month in [1, 4, 7, 10] {
            let t = Utc.with_ymd_and_hms(2024, month, 15, 12, 0, 0).unwrap();
            let sun = sun_direction(t);
            assert!((sun.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn solstice_declinations_have_opposite_signs() {
        let june = sun_direction(Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap());
        let december = sun_direction(Utc.with_ymd_and_hms(2024, 12, 21, 0, 0, 0).unwrap());
        assert!(june.y > 0.3, "June sun should sit north of the equator");
        assert!(december.y < -0.3, "December sun should sit south of the equator");
    }
}
