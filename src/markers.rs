//! Scheduled surface event markers.
//!
//! Each valid dataset record becomes one marker fixed to the globe
//! surface with a `[time, time + 5 s]` visible window. Opacity is swept
//! once per frame as a pure function of elapsed time, so seeking the
//! clock anywhere reproduces the exact same state.

use nalgebra::Vector3;

use crate::data::EventRecord;
use crate::geo;
use crate::GLOBE_RADIUS;

/// How long a marker stays visible once its window opens.
pub const MARKER_VISIBLE_WINDOW: f64 = 5.0;
/// Width of the fade-in and fade-out ramps at the window edges.
pub const MARKER_FADE_EDGE: f64 = 0.2;
/// Radial offset keeping markers clear of the globe surface.
pub const MARKER_SURFACE_OFFSET: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum RejectedRecord {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl std::fmt::Display for RejectedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectedRecord::LatitudeOutOfRange(lat) => {
                write!(f, "latitude {} outside [-90, 90]", lat)
            }
            RejectedRecord::LongitudeOutOfRange(lon) => {
                write!(f, "longitude {} outside [-180, 180]", lon)
            }
        }
    }
}

pub struct Marker {
    pub position: Vector3<f64>,
    pub glow_at: f64,
    pub fade_at: f64,
    pub opacity: f32,
}

/// Opacity of a marker window at elapsed time `t`.
///
/// Piecewise linear and continuous: a 0.2 s ramp up when the window
/// opens, full opacity through the middle, a 0.2 s ramp down against
/// the closing edge, zero outside.
pub fn glow_opacity(t: f64, glow_at: f64, fade_at: f64) -> f32 {
    if t < glow_at {
        0.0
    } else if t < glow_at + MARKER_FADE_EDGE {
        ((t - glow_at) / MARKER_FADE_EDGE) as f32
    } else if t < fade_at - MARKER_FADE_EDGE {
        1.0
    } else if t < fade_at {
        ((fade_at - t) / MARKER_FADE_EDGE) as f32
    } else {
        0.0
    }
}

/// Owns every marker created from the event stream.
///
/// Ingestion appends; the per-frame sweep only rewrites opacity fields.
/// Markers are never removed, they just stay invisible outside their
/// window.
pub struct MarkerRegistry {
    markers: Vec<Marker>,
    rejected: usize,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self {
            markers: Vec::new(),
            rejected: 0,
        }
    }

    pub fn ingest(&mut self, record: &EventRecord) -> Result<(), RejectedRecord> {
        if !(-90.0..=90.0).contains(&record.latitude) {
            self.rejected += 1;
            return Err(RejectedRecord::LatitudeOutOfRange(record.latitude));
        }
        if !(-180.0..=180.0).contains(&record.longitude) {
            self.rejected += 1;
            return Err(RejectedRecord::LongitudeOutOfRange(record.longitude));
        }

        let surface = geo::project(record.latitude, record.longitude, GLOBE_RADIUS);
        self.markers.push(Marker {
            position: geo::offset_outward(surface, MARKER_SURFACE_OFFSET),
            glow_at: record.time,
            fade_at: record.time + MARKER_VISIBLE_WINDOW,
            opacity: 0.0,
        });
        Ok(())
    }

    /// Rewrite every marker's opacity from the elapsed time.
    ///
    /// Stateless with respect to previous sweeps; calling with the same
    /// `t` twice, or after seeking backward, yields identical results.
    pub fn advance(&mut self, elapsed: f64) {
        for marker in &mut self.markers {
            marker.opacity = glow_opacity(elapsed, marker.glow_at, marker.fade_at);
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(latitude: f64, longitude: f64, time: f64) -> EventRecord {
        EventRecord {
            latitude,
            longitude,
            time,
        }
    }

    const EPS: f32 = 1e-6;

    #[test]
    fn opacity_hits_the_window_boundary_values() {
        let (glow_at, fade_at) = (10.0, 15.0);
        assert!(glow_opacity(9.999, glow_at, fade_at) < EPS);
        assert!(glow_opacity(10.0, glow_at, fade_at) < EPS);
        assert!((glow_opacity(10.2, glow_at, fade_at) - 1.0).abs() < EPS);
        assert!((glow_opacity(12.5, glow_at, fade_at) - 1.0).abs() < EPS);
        assert!((glow_opacity(14.8, glow_at, fade_at) - 1.0).abs() < EPS);
        assert!(glow_opacity(15.0, glow_at, fade_at) < EPS);
        assert!(glow_opacity(20.0, glow_at, fade_at) < EPS);
    }

    #[test]
    fn opacity_is_continuous_across_segment_joins() {
        let (glow_at, fade_at) = (10.0, 15.0);
        let step = 1e-4;
        let mut t = 9.5;
        let mut prev = glow_opacity(t, glow_at, fade_at);
        while t < 15.5 {
            t += step;
            let next = glow_opacity(t, glow_at, fade_at);
            // A piecewise-linear function with slope 1/0.2 can move at
            // most step/0.2 per step.
            assert!(
                (next - prev).abs() <= (step / MARKER_FADE_EDGE) as f32 + EPS,
                "discontinuity near t={t}"
            );
            prev = next;
        }
    }

    #[test]
    fn opacity_ramps_are_linear() {
        let (glow_at, fade_at) = (0.0, 5.0);
        assert!((glow_opacity(0.1, glow_at, fade_at) - 0.5).abs() < EPS);
        assert!((glow_opacity(4.9, glow_at, fade_at) - 0.5).abs() < EPS);
    }

    #[test]
    fn advance_is_idempotent() {
        let mut registry = MarkerRegistry::new();
        for i in 0..100 {
            registry
                .ingest(&record(-80.0 + i as f64, i as f64 - 50.0, i as f64 * 0.3))
                .unwrap();
        }
        registry.advance(40.0);
        let first: Vec<f32> = registry.markers().iter().map(|m| m.opacity).collect();
        registry.advance(40.0);
        let second: Vec<f32> = registry.markers().iter().map(|m| m.opacity).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn seeking_backward_matches_forward_playback() {
        let mut registry = MarkerRegistry::new();
        registry.ingest(&record(10.0, 20.0, 12.0)).unwrap();
        registry.advance(12.1);
        let forward = registry.markers()[0].opacity;
        registry.advance(50.0);
        registry.advance(12.1);
        assert_eq!(registry.markers()[0].opacity, forward);
    }

    #[test]
    fn out_of_range_records_are_rejected() {
        let mut registry = MarkerRegistry::new();
        assert_eq!(
            registry.ingest(&record(91.0, 0.0, 1.0)),
            Err(RejectedRecord::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            registry.ingest(&record(0.0, 200.0, 1.0)),
            Err(RejectedRecord::LongitudeOutOfRange(200.0))
        );
        assert!(registry.is_empty());
        assert_eq!(registry.rejected(), 2);
    }

    #[test]
    fn valid_record_produces_one_marker_with_fixed_window() {
        let mut registry = MarkerRegistry::new();
        registry.ingest(&record(45.0, -93.0, 10.0)).unwrap();
        assert_eq!(registry.len(), 1);
        let marker = &registry.markers()[0];
        assert_eq!(marker.glow_at, 10.0);
        assert_eq!(marker.fade_at, 15.0);
        let radius = marker.position.norm();
        assert!((radius - (GLOBE_RADIUS + MARKER_SURFACE_OFFSET)).abs() < 1e-9);
    }

    #[test]
    fn range_boundaries_are_accepted() {
        let mut registry = MarkerRegistry::new();
        registry.ingest(&record(90.0, 180.0, 0.0)).unwrap();
        registry.ingest(&record(-90.0, -180.0, 0.0)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.rejected(), 0);
    }
}
