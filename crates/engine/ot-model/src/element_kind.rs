use ot_frame::FrameId;
use ot_optics::{EMInterface, Element, MediumBoundary, OpticalElement, OpticalSurface, PropertyValue, SurfaceShape};

use crate::ModelError;

/// Built-in element catalog. A composite model's custom element definitions
/// (`registerCustomElements` in the original build pipeline) would extend
/// this with recipe-defined kinds; this kernel ships only the primitive
/// catalog used by the seed scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    FlatMirror,
    SphericalMirror,
    ParabolicMirror,
    ConicLens,
    IdealLens,
    Detector,
    Stop,
}

impl ElementKind {
    pub fn from_name(name: &str) -> Result<Self, ModelError> {
        Ok(match name {
            "FlatMirror" => ElementKind::FlatMirror,
            "SphericalMirror" => ElementKind::SphericalMirror,
            "ParabolicMirror" => ElementKind::ParabolicMirror,
            "ConicLens" => ElementKind::ConicLens,
            "IdealLens" => ElementKind::IdealLens,
            "Detector" => ElementKind::Detector,
            "Stop" => ElementKind::Stop,
            other => return Err(ModelError::UnknownElementKind(other.to_string())),
        })
    }

    /// Names of the surfaces [`ElementKind::build_optical`] will push, in
    /// order. Known before geometry is built, so optical paths can resolve
    /// element names into surface tags during `createElements`/
    /// `exposeOpticalPaths`, well before `assignEverything` fixes values.
    pub fn surface_names(self) -> &'static [&'static str] {
        match self {
            ElementKind::FlatMirror | ElementKind::SphericalMirror | ElementKind::ParabolicMirror => &["reflective"],
            ElementKind::ConicLens => &["front"],
            ElementKind::IdealLens => &["principalPlane"],
            ElementKind::Stop => &["stop"],
            ElementKind::Detector => &["ccd"],
        }
    }

    /// Registers this kind's default property schema on a freshly created
    /// [`Element`], before any recipe expression overwrites the values.
    pub fn seed_properties(self, element: &mut Element) {
        match self {
            ElementKind::FlatMirror | ElementKind::Stop => {
                element.register_property("radius", PropertyValue::Real(0.5));
            }
            ElementKind::SphericalMirror => {
                element.register_property("radius", PropertyValue::Real(0.5));
                element.register_property("curvatureRadius", PropertyValue::Real(2.0));
            }
            ElementKind::ParabolicMirror => {
                element.register_property("radius", PropertyValue::Real(0.5));
                element.register_property("focalLength", PropertyValue::Real(1.0));
            }
            ElementKind::ConicLens => {
                element.register_property("radius", PropertyValue::Real(0.5));
                element.register_property("curvatureRadius", PropertyValue::Real(2.0));
                element.register_property("conicConstant", PropertyValue::Real(0.0));
                element.register_property("n1", PropertyValue::Real(1.0));
                element.register_property("n2", PropertyValue::Real(1.5));
            }
            ElementKind::IdealLens => {
                element.register_property("radius", PropertyValue::Real(0.5));
                element.register_property("focalLength", PropertyValue::Real(1.0));
            }
            ElementKind::Detector => {
                element.register_property("width", PropertyValue::Real(0.05));
                element.register_property("height", PropertyValue::Real(0.05));
            }
        }
    }

    /// Builds the optical surfaces for this kind from `element`'s current
    /// (by now expression-resolved) property values. Called once at the end
    /// of `build()`: geometry is fixed from the values properties hold at
    /// that point, rather than reactively rebuilt on every later dof change
    /// (see `DESIGN.md`, "property-driven geometry").
    pub fn build_optical(self, element: Element, frame: FrameId) -> OpticalElement {
        let mut oe = OpticalElement::new(element);
        let radius = |oe: &OpticalElement, name: &str, default: f64| {
            if oe.element.has_property(name) {
                oe.element.get(name).as_real()
            } else {
                default
            }
        };
        match self {
            ElementKind::FlatMirror => {
                let r = radius(&oe, "radius", 0.5);
                oe.push_surface(OpticalSurface::new(
                    "reflective",
                    frame,
                    MediumBoundary::new(SurfaceShape::Circular { radius: r }, EMInterface::Mirror),
                ));
            }
            ElementKind::SphericalMirror => {
                let r = radius(&oe, "radius", 0.5);
                let curv = radius(&oe, "curvatureRadius", 2.0);
                oe.push_surface(OpticalSurface::new(
                    "reflective",
                    frame,
                    MediumBoundary::new(
                        SurfaceShape::SphericalCap { radius_of_curvature: curv, aperture_radius: r },
                        EMInterface::Mirror,
                    ),
                ));
            }
            ElementKind::ParabolicMirror => {
                let r = radius(&oe, "radius", 0.5);
                let focal = radius(&oe, "focalLength", 1.0);
                oe.push_surface(OpticalSurface::new(
                    "reflective",
                    frame,
                    MediumBoundary::new(
                        SurfaceShape::ParabolicCap { radius_of_curvature: 2.0 * focal, aperture_radius: r },
                        EMInterface::Mirror,
                    ),
                ));
            }
            ElementKind::ConicLens => {
                let r = radius(&oe, "radius", 0.5);
                let curv = radius(&oe, "curvatureRadius", 2.0);
                let k = radius(&oe, "conicConstant", 0.0);
                let n1 = radius(&oe, "n1", 1.0);
                let n2 = radius(&oe, "n2", 1.5);
                oe.push_surface(OpticalSurface::new(
                    "front",
                    frame,
                    MediumBoundary::new(
                        SurfaceShape::ConicCap { radius_of_curvature: curv, conic_constant: k, aperture_radius: r },
                        EMInterface::Dielectric { n1, n2 },
                    ),
                ));
            }
            ElementKind::IdealLens => {
                let r = radius(&oe, "radius", 0.5);
                let focal = radius(&oe, "focalLength", 1.0);
                oe.push_surface(OpticalSurface::new(
                    "principalPlane",
                    frame,
                    MediumBoundary::new(SurfaceShape::Circular { radius: r }, EMInterface::IdealLens { focal_length: focal }),
                ));
            }
            ElementKind::Stop => {
                let r = radius(&oe, "radius", 0.5);
                oe.push_surface(OpticalSurface::new(
                    "stop",
                    frame,
                    MediumBoundary::new(SurfaceShape::Circular { radius: r }, EMInterface::Absorber),
                ));
            }
            ElementKind::Detector => {
                oe.push_surface(OpticalSurface::new(
                    "ccd",
                    frame,
                    MediumBoundary::new(SurfaceShape::InfinitePlane, EMInterface::Detector),
                ));
                oe.surfaces_mut()[0].record_hits = true;
            }
        }
        oe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ot_frame::FrameTree;

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(ElementKind::from_name("Wat").is_err());
    }

    #[test]
    fn conic_lens_has_front_surface() {
        let tree = FrameTree::new();
        let mut element = Element::new("lens1", tree.root());
        ElementKind::ConicLens.seed_properties(&mut element);
        let oe = ElementKind::ConicLens.build_optical(element, tree.root());
        assert!(oe.surface("front").is_some());
    }
}
