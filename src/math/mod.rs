//! Mathematical utilities for stringer-panel calculations

pub mod mcft;
pub mod stringer;

use nalgebra::{Matrix2, Matrix3, Matrix6, SMatrix, Vector3};
use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

pub type Mat2 = Matrix2<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;
/// 6x6 matrix for a stringer's global stiffness (3 nodes x 2 DoFs)
pub type Mat6 = Matrix6<f64>;
/// 2x3 static equilibrium matrix of a stringer
pub type Mat23 = SMatrix<f64, 2, 3>;
/// 3x6 axial-to-global transformation of a stringer
pub type Mat36 = SMatrix<f64, 3, 6>;

/// Trigonometric results smaller than this are numerical noise
pub const TRIG_NOISE: f64 = 1e-6;

/// Returned by [`tangent`] where the tangent is unbounded
pub const TAN_SENTINEL: f64 = 1e10;

fn snap(value: f64) -> f64 {
    if value.abs() < TRIG_NOISE {
        0.0
    } else {
        value
    }
}

/// Direction cosine and sine of an angle, with noise snapped to zero
pub fn direction_cosines(angle: f64) -> (f64, f64) {
    (snap(angle.cos()), snap(angle.sin()))
}

/// Tangent of an angle.
///
/// At 90° and 270° the cosine snaps to zero and the sentinel is returned
/// instead of an infinite value.
pub fn tangent(angle: f64) -> f64 {
    let (cos, sin) = direction_cosines(angle);
    if cos == 0.0 {
        return TAN_SENTINEL;
    }
    snap(sin / cos)
}

/// Principal strains (ε1, ε2) from Mohr's circle, ε1 the more tensile
pub fn principal_strains(ex: f64, ey: f64, gxy: f64) -> (f64, f64) {
    if gxy == 0.0 {
        return (ex.max(ey), ex.min(ey));
    }
    let center = (ex + ey) / 2.0;
    let radius = (((ex - ey) / 2.0).powi(2) + (gxy / 2.0).powi(2)).sqrt();
    (center + radius, center - radius)
}

/// Principal strain angle θ in [0, π/2) used for crack geometry and
/// reinforcement slopes.
pub fn strain_angle(ex: f64, ey: f64, gxy: f64) -> f64 {
    if gxy == 0.0 {
        return 0.0;
    }
    if ex == ey {
        return FRAC_PI_4;
    }
    let theta = 0.5 * (gxy / (ey - ex)).atan();
    if theta < 0.0 {
        theta + FRAC_PI_2
    } else {
        theta
    }
}

/// Angle from the x axis to the ε1 direction
pub fn principal_direction(ex: f64, ey: f64, gxy: f64) -> f64 {
    0.5 * gxy.atan2(ex - ey)
}

/// Engineering strain transformation from x/y to axes rotated by `psi`.
///
/// Maps [εx, εy, γxy] to [ε1, ε2, γ12].
pub fn strain_transformation(psi: f64) -> Mat3 {
    let (c, s) = direction_cosines(psi);
    Mat3::new(
        c * c,
        s * s,
        c * s,
        s * s,
        c * c,
        -c * s,
        -2.0 * c * s,
        2.0 * c * s,
        c * c - s * s,
    )
}

/// Largest absolute entry-wise difference of two 3x3 matrices
pub fn max_abs_diff(a: &Mat3, b: &Mat3) -> f64 {
    (a - b).abs().max()
}
