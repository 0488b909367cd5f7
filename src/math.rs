//! 3D rotation helpers for the globe view.
//!
//! Rotation matrices for the globe spin, drag-based camera rotation,
//! and point transforms used by the marker overlay.

use nalgebra::{Matrix3, Vector3};

pub fn rotate_point_matrix(x: f64, y: f64, z: f64, rot: &Matrix3<f64>) -> (f64, f64, f64) {
    let v = rot * Vector3::new(x, y, z);
    (v.x, v.y, v.z)
}

/// Rotation about the globe's polar (y) axis by `angle` radians.
pub fn spin_matrix(angle: f64) -> Matrix3<f64> {
    let (s, c) = (angle.sin(), angle.cos());
    Matrix3::new(
        c, 0.0, s,
        0.0, 1.0, 0.0,
        -s, 0.0, c,
    )
}

pub fn rotation_from_drag(dx: f64, dy: f64) -> Matrix3<f64> {
    let rot_y = Matrix3::new(
        dx.cos(), 0.0, dx.sin(),
        0.0, 1.0, 0.0,
        -dx.sin(), 0.0, dx.cos(),
    );
    let rot_x = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, dy.cos(), -dy.sin(),
        0.0, dy.sin(), dy.cos(),
    );
    rot_x * rot_y
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-12;

    #[test]
    fn spin_quarter_turn_moves_x_axis() {
        let rot = spin_matrix(FRAC_PI_2);
        let (x, y, z) = rotate_point_matrix(1.0, 0.0, 0.0, &rot);
        assert!(x.abs() < EPS);
        assert!(y.abs() < EPS);
        assert!((z - (-1.0)).abs() < EPS);
    }

    #[test]
    fn spin_preserves_polar_axis() {
        let rot = spin_matrix(1.234);
        let (x, y, z) = rotate_point_matrix(0.0, 1.0, 0.0, &rot);
        assert!(x.abs() < EPS);
        assert!((y - 1.0).abs() < EPS);
        assert!(z.abs() < EPS);
    }

    #[test]
    fn drag_rotation_is_orthonormal() {
        let rot = rotation_from_drag(0.3, -0.7);
        let should_be_identity = rot * rot.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!((should_be_identity[(i, j)] - expect).abs() < EPS);
            }
        }
    }
}
