//! Vector/matrix algebra and PRNG shared by the whole ray-tracing kernel.

mod matrix;
mod random;

pub use matrix::Matrix3;
pub use random::ExprRandomState;

/// 3-component Cartesian vector. Reuses the teacher's math crate rather than
/// hand-rolling vector algebra.
pub type Vec3 = glam::DVec3;

/// Relative tolerance used by the kernel's `==`-with-slack comparisons.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Compares two values for equality within a relative tolerance, falling
/// back to absolute tolerance near zero.
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    let diff = (a - b).abs();
    if diff <= epsilon {
        return true;
    }
    diff <= epsilon * a.abs().max(b.abs())
}

/// Compares two vectors component-wise within a relative tolerance.
pub fn vec3_approx_eq(a: Vec3, b: Vec3, epsilon: f64) -> bool {
    approx_eq(a.x, b.x, epsilon) && approx_eq(a.y, b.y, epsilon) && approx_eq(a.z, b.z, epsilon)
}

/// Converts degrees to radians, matching `RZ::deg2rad`'s wrap-to-`[-pi,pi)`
/// normalization rather than a bare multiply.
pub fn deg2rad(deg: f64) -> f64 {
    let rad = (deg / 180.0 + 1.0) * std::f64::consts::PI;
    rad - 2.0 * std::f64::consts::PI * (rad / (2.0 * std::f64::consts::PI)).floor()
        - std::f64::consts::PI
}

/// Converts radians to degrees, the inverse normalization of [`deg2rad`].
pub fn rad2deg(rad: f64) -> f64 {
    let deg = (rad / std::f64::consts::PI + 1.0) * 180.0;
    deg - 360.0 * (rad / 360.0).floor() - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deg_rad_round_trip() {
        for deg in [-179.0, -90.0, 0.0, 45.0, 90.0, 179.0] {
            let back = rad2deg(deg2rad(deg));
            assert!(approx_eq(back, deg, 1e-9), "{back} != {deg}");
        }
    }

    #[test]
    fn approx_eq_handles_zero() {
        assert!(approx_eq(0.0, 1e-13, 1e-9));
        assert!(!approx_eq(0.0, 1e-3, 1e-9));
    }
}
