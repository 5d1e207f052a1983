use ot_beam::Ray;
use ot_frame::{FrameId, FrameTree};
use ot_math::Vec3;

fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3) {
    let up = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let u = axis.cross(up).normalize();
    let v = axis.cross(u).normalize();
    (u, v)
}

fn disc_points(radius: f64, n: usize) -> Vec<(f64, f64)> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let frac = (i as f64 + 0.5) / n as f64;
            let r = radius * frac.sqrt();
            let theta = i as f64 * golden_angle;
            (r * theta.cos(), r * theta.sin())
        })
        .collect()
}

/// A bundle of parallel rays sampling a circular aperture of `radius`
/// centered at `origin`, all traveling along `direction`.
pub fn collimated_beam(origin: Vec3, direction: Vec3, radius: f64, n: usize) -> Vec<Ray> {
    let direction = direction.normalize();
    let (u, v) = orthonormal_basis(direction);
    disc_points(radius, n)
        .into_iter()
        .map(|(x, y)| Ray { origin: origin + u * x + v * y, direction, ..Default::default() })
        .collect()
}

/// Rays emanating from a circular aperture of `radius` centered at `origin`
/// perpendicular to `direction`, all converging onto the point `focus`.
/// Used to exercise imaging elements with a known target focal ratio.
pub fn focused_beam(origin: Vec3, direction: Vec3, radius: f64, focus: Vec3, n: usize) -> Vec<Ray> {
    let direction = direction.normalize();
    let (u, v) = orthonormal_basis(direction);
    disc_points(radius, n)
        .into_iter()
        .map(|(x, y)| {
            let p = origin + u * x + v * y;
            let dir = (focus - p).normalize();
            Ray { origin: p, direction: dir, ..Default::default() }
        })
        .collect()
}

/// Rays from a single `origin` diverging within a cone of `half_angle_rad`
/// around `axis`, as used to model an extended, diffuse source illuminating
/// a wide field rather than a single point at infinity.
pub fn cone_beam(origin: Vec3, axis: Vec3, half_angle_rad: f64, n: usize) -> Vec<Ray> {
    let axis = axis.normalize();
    let (u, v) = orthonormal_basis(axis);
    let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let frac = (i as f64 + 0.5) / n as f64;
            let theta = frac.sqrt() * half_angle_rad;
            let phi = i as f64 * golden_angle;
            let dir = axis * theta.cos() + (u * phi.cos() + v * phi.sin()) * theta.sin();
            Ray { origin, direction: dir.normalize(), ..Default::default() }
        })
        .collect()
}

/// Lifts rays expressed in the local frame `id` into the world frame,
/// transforming origins as points and directions as free vectors.
pub fn to_world_frame(rays: &mut [Ray], tree: &FrameTree, id: FrameId) -> Result<(), ot_frame::FrameError> {
    for ray in rays.iter_mut() {
        ray.origin = tree.from_relative(id, ray.origin)?;
        ray.direction = tree.from_relative_vec(id, ray.direction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collimated_rays_share_direction() {
        let rays = collimated_beam(Vec3::ZERO, Vec3::Z, 1.0, 32);
        assert_eq!(rays.len(), 32);
        for r in &rays {
            assert!((r.direction - Vec3::Z).length() < 1e-9);
            assert!(r.origin.x * r.origin.x + r.origin.y * r.origin.y <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn focused_rays_converge() {
        let focus = Vec3::new(0.0, 0.0, 10.0);
        let rays = focused_beam(Vec3::ZERO, Vec3::Z, 1.0, focus, 16);
        for r in &rays {
            let t = (focus.z - r.origin.z) / r.direction.z;
            let hit = r.origin + r.direction * t;
            assert!((hit - focus).length() < 1e-6);
        }
    }

    #[test]
    fn cone_beam_directions_stay_within_half_angle() {
        let rays = cone_beam(Vec3::ZERO, Vec3::Z, 0.2, 16);
        for r in &rays {
            let cos_angle = r.direction.dot(Vec3::Z);
            assert!(cos_angle >= 0.2f64.cos() - 1e-9);
        }
    }
}
