//! Geographic coordinate projection.
//!
//! Maps (latitude, longitude) pairs onto the globe's local Cartesian
//! frame. The frame puts +y through the north pole and the prime
//! meridian on the +x axis; longitude enters negated so that eastward
//! longitudes land on the correct side of the surface texture.

use nalgebra::Vector3;

/// Project a geographic coordinate onto a sphere of the given radius.
///
/// Total over `lat ∈ [-90, 90]`, `lon ∈ [-180, 180]`; range validation
/// is the caller's job.
pub fn project(lat_deg: f64, lon_deg: f64, radius: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    Vector3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.sin(),
        radius * lat.cos() * (-lon).sin(),
    )
}

/// Push a surface point radially outward by `offset` units.
pub fn offset_outward(point: Vector3<f64>, offset: f64) -> Vector3<f64> {
    point + point.normalize() * offset
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn projection_preserves_radius() {
        for &(lat, lon) in &[
            (0.0, 0.0),
            (45.0, -93.0),
            (-90.0, 0.0),
            (90.0, 180.0),
            (-33.9, 151.2),
            (12.34, -123.45),
        ] {
            let p = project(lat, lon, 2.0);
            assert!(
                (p.norm() - 2.0).abs() < EPS,
                "radius drifted for ({lat}, {lon}): {}",
                p.norm()
            );
        }
    }

    #[test]
    fn origin_of_coordinates_lands_on_prime_meridian_axis() {
        let p = project(0.0, 0.0, 2.0);
        assert!((p.x - 2.0).abs() < EPS);
        assert!(p.y.abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn north_pole_lands_on_polar_axis() {
        let p = project(90.0, 0.0, 2.0);
        assert!(p.x.abs() < EPS);
        assert!((p.y - 2.0).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn eastward_longitude_maps_to_negative_z() {
        let p = project(0.0, 90.0, 1.0);
        assert!(p.x.abs() < EPS);
        assert!(p.y.abs() < EPS);
        assert!((p.z - (-1.0)).abs() < EPS);
    }

    #[test]
    fn outward_offset_extends_radius() {
        let p = offset_outward(project(45.0, 45.0, 2.0), 0.01);
        assert!((p.norm() - 2.01).abs() < EPS);
    }
}
