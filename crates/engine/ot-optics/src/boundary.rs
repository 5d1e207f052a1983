use crate::eminterface::{EMInterface, RayAction};
use crate::surface_shape::{Intercept, SurfaceShape};
use ot_math::Vec3;

/// Optional transmission/absorption map overlaid on a boundary, sampled at
/// the local-frame hit coordinates. Supplements the EM interface catalog
/// with spatially-varying attenuation (apodized stops, gradient filters).
#[derive(Debug, Clone)]
pub struct TransmissionMap {
    width: usize,
    height: usize,
    half_extent: f64,
    samples: Vec<f64>,
}

impl TransmissionMap {
    pub fn uniform(width: usize, height: usize, half_extent: f64, value: f64) -> Self {
        Self { width, height, half_extent, samples: vec![value; width * height] }
    }

    pub fn set(&mut self, col: usize, row: usize, value: f64) {
        self.samples[row * self.width + col] = value;
    }

    /// Nearest-sample transmittance in `[0, 1]` at local coordinates
    /// `(x, y)`; points outside the map extent are fully opaque.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        if x.abs() > self.half_extent || y.abs() > self.half_extent {
            return 0.0;
        }
        let u = ((x / self.half_extent + 1.0) * 0.5 * (self.width - 1) as f64).round() as usize;
        let v = ((y / self.half_extent + 1.0) * 0.5 * (self.height - 1) as f64).round() as usize;
        self.samples[v.min(self.height - 1) * self.width + u.min(self.width - 1)]
    }
}

/// A shape paired with the interface that acts on rays crossing it, plus
/// the bookkeeping the tracer needs: whether it participates in both-way
/// (non-sequential) tracing, whether it is unbounded, and an optional
/// transmission map layered on top of the interface.
#[derive(Debug, Clone)]
pub struct MediumBoundary {
    shape: SurfaceShape,
    interface: EMInterface,
    reversible: bool,
    transmission: Option<TransmissionMap>,
}

impl MediumBoundary {
    pub fn new(shape: SurfaceShape, interface: EMInterface) -> Self {
        Self { shape, interface, reversible: true, transmission: None }
    }

    pub fn with_reversible(mut self, reversible: bool) -> Self {
        self.reversible = reversible;
        self
    }

    pub fn with_transmission_map(mut self, map: TransmissionMap) -> Self {
        self.transmission = Some(map);
        self
    }

    pub fn shape(&self) -> &SurfaceShape {
        &self.shape
    }

    pub fn interface(&self) -> &EMInterface {
        &self.interface
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.shape, SurfaceShape::InfinitePlane)
    }

    pub fn reversible(&self) -> bool {
        self.reversible
    }

    /// Finds the forward intersection with this boundary's shape, in the
    /// boundary's local frame.
    pub fn cast(&self, origin: Vec3, dir: Vec3) -> Option<Intercept> {
        self.shape.intercept(origin, dir)
    }

    /// Applies the interface (and any transmission map) to a ray hitting at
    /// `hit`/`normal` with incoming `direction` and refractive index
    /// `ref_ndx`. Returns the new direction, the refractive index of the
    /// medium beyond the boundary, and whether the ray continues.
    pub fn transmit(&self, hit: Vec3, normal: Vec3, direction: Vec3, ref_ndx: f64) -> (Vec3, f64, RayAction) {
        if let Some(map) = &self.transmission {
            let t = map.sample(hit.x, hit.y);
            if t <= 0.0 {
                return (direction, ref_ndx, RayAction::Block);
            }
        }
        self.interface.transmit(hit, normal, direction, ref_ndx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_delegates_to_shape() {
        let boundary = MediumBoundary::new(SurfaceShape::Circular { radius: 1.0 }, EMInterface::Mirror);
        let hit = boundary.cast(Vec3::new(0.0, 0.0, -1.0), Vec3::Z);
        assert!(hit.is_some());
    }

    #[test]
    fn transmission_map_blocks_outside_extent() {
        let map = TransmissionMap::uniform(4, 4, 1.0, 1.0);
        let boundary = MediumBoundary::new(SurfaceShape::Circular { radius: 5.0 }, EMInterface::Mirror)
            .with_transmission_map(map);
        let (_, _, action) = boundary.transmit(Vec3::new(2.0, 0.0, 0.0), Vec3::Z, Vec3::Z, 1.0);
        assert_eq!(action, RayAction::Block);
    }

    #[test]
    fn infinite_plane_flagged() {
        let boundary = MediumBoundary::new(SurfaceShape::InfinitePlane, EMInterface::Absorber);
        assert!(boundary.is_infinite());
    }
}
