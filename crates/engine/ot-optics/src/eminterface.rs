use ot_beam::RayBeamSlice;
use ot_math::Vec3;

/// Electromagnetic behavior attached to a surface. Unlike [`crate::SurfaceShape`]
/// these mutate a ray's direction/amplitude at the hit point rather than just
/// finding it, so they take the hit normal and the local ray state.
#[derive(Debug, Clone, Copy)]
pub enum EMInterface {
    /// Refracting boundary, Snell's law with the two bounding indices.
    Dielectric { n1: f64, n2: f64 },
    Mirror,
    /// Terminates the ray: marks it vignetted rather than intercepted. Only
    /// correct for a true beam stop; a detector that should *record* a ray
    /// rather than discard it wants [`EMInterface::Detector`] instead.
    Absorber,
    /// Blocks light where `blocks(x, y)` is true, otherwise passes through
    /// unmodified (`n1 == n2`, no bend).
    Mask,
    /// Thin-lens paraxial ray-transfer approximation: bends the transverse
    /// angle by `-position/f`, independent of angle of incidence. Not part
    /// of the original component catalog; supplements it.
    IdealLens { focal_length: f64 },
    /// A passive capture surface: the ray keeps going through unchanged.
    /// Pairs with [`crate::OpticalSurface::record_hits`] so a detector
    /// accumulates hits without vignetting the rays that land on it.
    Detector,
}

/// Outcome of applying an [`EMInterface`] to a single ray at a hit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayAction {
    /// Ray continues with the returned direction.
    Continue,
    /// Ray is blocked (vignetted) and must not propagate further.
    Block,
}

impl EMInterface {
    /// Applies this interface to a ray hitting at local-frame `hit` with
    /// unit `normal`, given its current unit `direction` and the refractive
    /// index of the medium it arrived through. Returns the new direction,
    /// the refractive index of the medium it leaves into, and whether the
    /// ray should continue or be blocked. Only [`EMInterface::Dielectric`]
    /// changes the index; every other interface passes `ref_ndx` through
    /// unchanged.
    pub fn transmit(&self, hit: Vec3, normal: Vec3, direction: Vec3, ref_ndx: f64) -> (Vec3, f64, RayAction) {
        match *self {
            EMInterface::Dielectric { n1, n2 } => (refract(direction, normal, n1, n2), n2, RayAction::Continue),
            EMInterface::Mirror => (reflect(direction, normal), ref_ndx, RayAction::Continue),
            EMInterface::Absorber => (direction, ref_ndx, RayAction::Block),
            EMInterface::Mask => {
                if self.blocks(hit.x, hit.y) {
                    (direction, ref_ndx, RayAction::Block)
                } else {
                    (direction, ref_ndx, RayAction::Continue)
                }
            }
            EMInterface::IdealLens { focal_length } => {
                (ideal_lens_transfer(hit, direction, focal_length), ref_ndx, RayAction::Continue)
            }
            EMInterface::Detector => (direction, ref_ndx, RayAction::Continue),
        }
    }

    /// Applies this interface to every ray named by `slice` in `beam`,
    /// mutating direction, refractive index and cumulative optical path
    /// length in place, and pruning blocked rays.
    pub fn transmit_beam(&self, beam: &mut ot_beam::RayBeam, slice: RayBeamSlice) {
        for i in slice.iter() {
            if !beam.is_intercepted(i) {
                continue;
            }
            let hit = beam.destination(i);
            let normal = beam.normal(i);
            let dir = beam.direction(i);
            let ref_ndx = beam.ref_ndx(i);
            beam.set_cum_opt_length(i, beam.cum_opt_length(i) + beam.length(i) * ref_ndx);
            let (new_dir, new_ref_ndx, action) = self.transmit(hit, normal, dir, ref_ndx);
            match action {
                RayAction::Continue => {
                    beam.set_direction(i, new_dir);
                    beam.set_origin(i, hit);
                    beam.set_ref_ndx(i, new_ref_ndx);
                }
                RayAction::Block => beam.prune(i),
            }
        }
    }

    /// A [`Mask`](EMInterface::Mask) currently always blocks; real masks get
    /// their blocking pattern from a [`crate::TransmissionMap`] composed at
    /// the boundary level instead (see [`crate::MediumBoundary`]).
    fn blocks(&self, _x: f64, _y: f64) -> bool {
        matches!(self, EMInterface::Mask)
    }
}

fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Vector form of Snell's law; falls back to total internal reflection when
/// the discriminant goes negative.
fn refract(direction: Vec3, normal: Vec3, n1: f64, n2: f64) -> Vec3 {
    let eta = n1 / n2;
    let mut n = normal;
    let mut cos_i = -direction.dot(n);
    if cos_i < 0.0 {
        n = -n;
        cos_i = -cos_i;
    }
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return reflect(direction, n);
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    direction * eta + n * (eta * cos_i - cos_t)
}

/// Paraxial ray-transfer matrix `[1 0; -1/f 1]` applied in each transverse
/// plane independently, then renormalized so the result stays a unit ray
/// direction at the new angle.
fn ideal_lens_transfer(hit: Vec3, direction: Vec3, focal_length: f64) -> Vec3 {
    if direction.z.abs() < 1e-15 {
        return direction;
    }
    let ux = direction.x / direction.z;
    let uy = direction.y / direction.z;
    let new_ux = ux - hit.x / focal_length;
    let new_uy = uy - hit.y / focal_length;
    let sign = direction.z.signum();
    Vec3::new(new_ux, new_uy, sign).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_reflects_normal_incidence() {
        let dir = Vec3::new(0.0, 0.0, 1.0);
        let normal = Vec3::new(0.0, 0.0, -1.0);
        let out = reflect(dir, normal);
        assert!((out - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-9);
    }

    #[test]
    fn dielectric_matched_indices_passes_straight() {
        let dir = Vec3::new(0.3, 0.0, 1.0).normalize();
        let normal = Vec3::new(0.0, 0.0, -1.0);
        let out = refract(dir, normal, 1.0, 1.0);
        assert!((out - dir).length() < 1e-9);
    }

    #[test]
    fn ideal_lens_focuses_parallel_ray_through_focal_point() {
        let f = 2.0;
        let hit = Vec3::new(1.0, 0.0, 0.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        let out_dir = ideal_lens_transfer(hit, dir, f);
        let focus = hit + out_dir * (f / out_dir.z);
        assert!(focus.x.abs() < 1e-6);
        assert!(focus.y.abs() < 1e-6);
    }

    #[test]
    fn absorber_blocks() {
        let iface = EMInterface::Absorber;
        let (_, _, action) = iface.transmit(Vec3::ZERO, Vec3::Z, Vec3::Z, 1.0);
        assert_eq!(action, RayAction::Block);
    }

    #[test]
    fn detector_passes_through_without_blocking() {
        let iface = EMInterface::Detector;
        let dir = Vec3::new(0.3, 0.0, 1.0).normalize();
        let (out_dir, out_ndx, action) = iface.transmit(Vec3::ZERO, Vec3::Z, dir, 1.0);
        assert_eq!(action, RayAction::Continue);
        assert!((out_dir - dir).length() < 1e-12);
        assert_eq!(out_ndx, 1.0);
    }

    #[test]
    fn dielectric_advances_ref_ndx_to_n2() {
        let iface = EMInterface::Dielectric { n1: 1.0, n2: 1.5 };
        let dir = Vec3::new(0.0, 0.0, 1.0);
        let normal = Vec3::new(0.0, 0.0, -1.0);
        let (_, out_ndx, action) = iface.transmit(Vec3::ZERO, normal, dir, 1.0);
        assert_eq!(action, RayAction::Continue);
        assert_eq!(out_ndx, 1.5);
    }
}
