use std::collections::BTreeMap;

use ot_frame::FrameId;

use crate::boundary::MediumBoundary;

/// A typed property value, mirroring the discriminated variant catalog an
/// element exposes to the expression layer and to recipe files.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Undefined,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
}

impl PropertyValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, PropertyValue::Undefined)
    }

    pub fn as_real(&self) -> f64 {
        match self {
            PropertyValue::Integer(v) => *v as f64,
            PropertyValue::Real(v) => *v,
            PropertyValue::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            PropertyValue::Integer(v) => *v != 0,
            PropertyValue::Real(v) => *v != 0.0,
            PropertyValue::Boolean(v) => *v,
            _ => false,
        }
    }
}

/// A node in the element tree: owns a reference frame, zero or more named
/// ports (other frames siblings can plug into), a set of typed properties,
/// and child elements. Generic over the optical behaviour an element adds on
/// top (an [`OpticalElement`] attaches surfaces; purely mechanical elements
/// use [`Element`] alone).
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    parent_frame: FrameId,
    ports: BTreeMap<String, FrameId>,
    properties: BTreeMap<String, PropertyValue>,
    sorted_properties: Vec<String>,
    children: Vec<String>,
    hidden: u32,
}

impl Element {
    pub fn new(name: impl Into<String>, parent_frame: FrameId) -> Self {
        Self {
            name: name.into(),
            parent_frame,
            ports: BTreeMap::new(),
            properties: BTreeMap::new(),
            sorted_properties: Vec::new(),
            children: Vec::new(),
            hidden: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_frame(&self) -> FrameId {
        self.parent_frame
    }

    pub fn hidden(&self) -> u32 {
        self.hidden
    }

    pub fn set_hidden(&mut self, count: u32) {
        self.hidden = count;
    }

    /// Registers a port frame other elements can be plugged into. Ports are
    /// distinct from child elements: a port is a frame, a child is the
    /// element hanging off of it.
    pub fn add_port(&mut self, name: impl Into<String>, frame: FrameId) {
        self.ports.insert(name.into(), frame);
    }

    pub fn port(&self, name: &str) -> Option<FrameId> {
        self.ports.get(name).copied()
    }

    pub fn ports(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }

    pub fn push_child(&mut self, name: impl Into<String>) {
        self.children.push(name.into());
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn register_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        if !self.properties.contains_key(&name) {
            self.sorted_properties.push(name.clone());
        }
        self.properties.insert(name, value);
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn get(&self, name: &str) -> PropertyValue {
        self.properties.get(name).cloned().unwrap_or(PropertyValue::Undefined)
    }

    /// Sets a property and returns whether the key already existed.
    pub fn set(&mut self, name: &str, value: PropertyValue) -> bool {
        if let Some(slot) = self.properties.get_mut(name) {
            *slot = value;
            true
        } else {
            false
        }
    }

    pub fn sorted_properties(&self) -> &[String] {
        &self.sorted_properties
    }
}

/// Per-surface hit cache and per-ray-generation statistics for an
/// [`OpticalElement`]'s surface.
#[derive(Debug, Clone, Default)]
pub struct SurfaceStats {
    pub intercepted: u64,
    pub vignetted: u64,
    pub pruned: u64,
}

/// A single optical interface within an [`OpticalElement`], identified by
/// name, with its own boundary and an optional hit/statistics cache.
#[derive(Debug, Clone)]
pub struct OpticalSurface {
    pub name: String,
    pub frame: FrameId,
    pub boundary: MediumBoundary,
    pub record_hits: bool,
    hits: Vec<ot_math::Vec3>,
    statistics: BTreeMap<u32, SurfaceStats>,
}

impl OpticalSurface {
    pub fn new(name: impl Into<String>, frame: FrameId, boundary: MediumBoundary) -> Self {
        Self {
            name: name.into(),
            frame,
            boundary,
            record_hits: false,
            hits: Vec::new(),
            statistics: BTreeMap::new(),
        }
    }

    pub fn clear_cache(&mut self) {
        self.hits.clear();
    }

    pub fn clear_statistics(&mut self) {
        self.statistics.clear();
    }

    pub fn record_hit(&mut self, p: ot_math::Vec3) {
        if self.record_hits {
            self.hits.push(p);
        }
    }

    pub fn hits(&self) -> &[ot_math::Vec3] {
        &self.hits
    }

    pub fn statistics_for(&mut self, generation: u32) -> &mut SurfaceStats {
        self.statistics.entry(generation).or_default()
    }
}

/// An ordered sequence of named surfaces a ray is expected to traverse, used
/// to report per-surface hit/direction arrays along a fixed path through a
/// composite element.
#[derive(Debug, Clone, Default)]
pub struct OpticalPath {
    sequence: Vec<String>,
}

impl OpticalPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, surface_name: impl Into<String>) {
        self.sequence.push(surface_name.into());
    }

    pub fn surfaces(&self) -> &[String] {
        &self.sequence
    }
}

/// An [`Element`] that additionally owns optical surfaces and exposes an
/// internal path through them.
#[derive(Debug, Clone)]
pub struct OpticalElement {
    pub element: Element,
    surfaces: Vec<OpticalSurface>,
    internal_path: OpticalPath,
}

impl OpticalElement {
    pub fn new(element: Element) -> Self {
        Self { element, surfaces: Vec::new(), internal_path: OpticalPath::new() }
    }

    pub fn push_surface(&mut self, surface: OpticalSurface) {
        self.internal_path.push(surface.name.clone());
        self.surfaces.push(surface);
    }

    pub fn surfaces(&self) -> &[OpticalSurface] {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut [OpticalSurface] {
        &mut self.surfaces
    }

    pub fn surface(&self, name: &str) -> Option<&OpticalSurface> {
        self.surfaces.iter().find(|s| s.name == name)
    }

    pub fn surface_mut(&mut self, name: &str) -> Option<&mut OpticalSurface> {
        self.surfaces.iter_mut().find(|s| s.name == name)
    }

    pub fn internal_path(&self) -> &OpticalPath {
        &self.internal_path
    }

    pub fn clear_hits(&mut self) {
        for surface in &mut self.surfaces {
            surface.clear_cache();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eminterface::EMInterface;
    use crate::surface_shape::SurfaceShape;
    use ot_frame::FrameTree;

    #[test]
    fn property_round_trip() {
        let tree = FrameTree::new();
        let mut el = Element::new("lens1", tree.root());
        el.register_property("focalLength", PropertyValue::Real(1.5));
        assert!(el.has_property("focalLength"));
        assert_eq!(el.get("focalLength").as_real(), 1.5);
        assert!(el.set("focalLength", PropertyValue::Real(2.0)));
        assert_eq!(el.get("focalLength").as_real(), 2.0);
        assert!(!el.set("missing", PropertyValue::Real(0.0)));
    }

    #[test]
    fn optical_element_tracks_surfaces_by_name() {
        let tree = FrameTree::new();
        let element = Element::new("reflector", tree.root());
        let mut optical = OpticalElement::new(element);
        let boundary = MediumBoundary::new(SurfaceShape::Circular { radius: 1.0 }, EMInterface::Mirror);
        optical.push_surface(OpticalSurface::new("front", tree.root(), boundary));
        assert!(optical.surface("front").is_some());
        assert_eq!(optical.internal_path().surfaces(), &["front".to_string()]);
    }
}
