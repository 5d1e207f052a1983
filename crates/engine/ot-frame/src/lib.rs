//! Reference-frame tree: a dependency-ordered tree of affine frames with
//! lazy recomputation of global poses.

use ot_math::{Matrix3, Vec3};
use std::collections::HashMap;
use thiserror::Error;

/// Persisted type-id layout from the source project's `ReferenceFrame.h`.
pub mod type_id {
    pub const WORLD: u32 = 0x0000;
    pub const ROTATION: u32 = 0x1000;
    pub const TRANSLATION: u32 = 0x1001;
    pub const TRIPOD: u32 = 0x1002;
}

/// Opaque handle into a [`FrameTree`] arena. Stable across `recalculate()`
/// calls; only invalidated by removing the frame it names (frames are never
/// removed individually in this kernel, only with the owning model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("reference frame is not yet calculated; call recalculate() on an ancestor first")]
    NotCalculated,
    #[error("no axis named {0:?} on this frame")]
    UnknownAxis(String),
    #[error("no point named {0:?} on this frame")]
    UnknownPoint(String),
    #[error("rotation axis must be non-zero")]
    DegenerateAxis,
}

#[derive(Debug, Clone)]
struct NamedVector {
    relative: Vec3,
    absolute: Vec3,
}

/// Per-kind local parameters that `recalculate_frame` consumes to derive a
/// new global center/orientation from the parent's pose.
#[derive(Debug, Clone)]
pub enum FrameKind {
    /// The tree root, or a frame optionally linked to copy another frame's
    /// pose verbatim (used for detached sub-trees sharing a world anchor).
    World { linked: Option<FrameId> },
    Rotation { axis: Vec3, theta_rad: f64 },
    Translation { offset: Vec3 },
    /// Simplified three-leg tripod: each leg is a scalar length measured
    /// from a fixed base triangle in the parent frame; orientation is
    /// derived from the resulting plane normal. Not core to the tracer.
    Tripod {
        base: [Vec3; 3],
        leg_lengths: [f64; 3],
    },
}

impl FrameKind {
    pub fn type_id(&self) -> u32 {
        match self {
            FrameKind::World { .. } => type_id::WORLD,
            FrameKind::Rotation { .. } => type_id::ROTATION,
            FrameKind::Translation { .. } => type_id::TRANSLATION,
            FrameKind::Tripod { .. } => type_id::TRIPOD,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FrameKind::World { .. } => "World",
            FrameKind::Rotation { .. } => "Rotation",
            FrameKind::Translation { .. } => "Translation",
            FrameKind::Tripod { .. } => "Tripod",
        }
    }
}

struct FrameNode {
    name: String,
    parent: Option<FrameId>,
    children: Vec<FrameId>,
    kind: FrameKind,
    center: Vec3,
    orientation: Matrix3,
    calculated: bool,
    axes: Vec<NamedVector>,
    points: Vec<NamedVector>,
    axis_index: HashMap<String, usize>,
    point_index: HashMap<String, usize>,
}

/// Arena owning the whole frame tree. A `ReferenceFrame` in the source
/// project owns a raw pointer to its parent/children; here every frame is a
/// [`FrameId`] into this arena, which sidesteps aliasing a mutable tree
/// would otherwise require `Rc<RefCell<_>>` for.
pub struct FrameTree {
    nodes: Vec<FrameNode>,
    root: FrameId,
}

impl FrameTree {
    /// Creates a new tree with a single `World` root named `"World"`.
    pub fn new() -> Self {
        let root = FrameNode {
            name: "World".to_string(),
            parent: None,
            children: Vec::new(),
            kind: FrameKind::World { linked: None },
            center: Vec3::ZERO,
            orientation: Matrix3::identity(),
            calculated: true,
            axes: Vec::new(),
            points: Vec::new(),
            axis_index: HashMap::new(),
            point_index: HashMap::new(),
        };
        Self {
            nodes: vec![root],
            root: FrameId(0),
        }
    }

    pub fn root(&self) -> FrameId {
        self.root
    }

    /// Inserts a new frame under `parent`, uncalculated until the next
    /// `recalculate()` reaches it.
    pub fn insert(&mut self, name: impl Into<String>, parent: FrameId, kind: FrameKind) -> FrameId {
        let id = FrameId(self.nodes.len());
        self.nodes.push(FrameNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
            center: Vec3::ZERO,
            orientation: Matrix3::identity(),
            calculated: false,
            axes: Vec::new(),
            points: Vec::new(),
            axis_index: HashMap::new(),
            point_index: HashMap::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: FrameId) -> &FrameNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: FrameId) -> &mut FrameNode {
        &mut self.nodes[id.0]
    }

    pub fn name(&self, id: FrameId) -> &str {
        &self.node(id).name
    }

    pub fn parent(&self, id: FrameId) -> Option<FrameId> {
        self.node(id).parent
    }

    pub fn children(&self, id: FrameId) -> &[FrameId] {
        &self.node(id).children
    }

    pub fn type_id(&self, id: FrameId) -> u32 {
        self.node(id).kind.type_id()
    }

    pub fn is_calculated(&self, id: FrameId) -> bool {
        self.node(id).calculated
    }

    pub fn center(&self, id: FrameId) -> Result<Vec3, FrameError> {
        let n = self.node(id);
        if !n.calculated {
            return Err(FrameError::NotCalculated);
        }
        Ok(n.center)
    }

    pub fn orientation(&self, id: FrameId) -> Result<Matrix3, FrameError> {
        let n = self.node(id);
        if !n.calculated {
            return Err(FrameError::NotCalculated);
        }
        Ok(n.orientation)
    }

    pub fn e_x(&self, id: FrameId) -> Result<Vec3, FrameError> {
        Ok(self.orientation(id)?.transpose().rows[0])
    }

    pub fn e_y(&self, id: FrameId) -> Result<Vec3, FrameError> {
        Ok(self.orientation(id)?.transpose().rows[1])
    }

    pub fn e_z(&self, id: FrameId) -> Result<Vec3, FrameError> {
        Ok(self.orientation(id)?.transpose().rows[2])
    }

    /// Sets the rotation angle (radians) and/or axis of a `Rotation` frame.
    /// Does not recalculate; callers must invoke [`FrameTree::recalculate`].
    pub fn set_rotation(&mut self, id: FrameId, axis: Vec3, theta_rad: f64) -> Result<(), FrameError> {
        if axis.length_squared() < 1e-18 {
            return Err(FrameError::DegenerateAxis);
        }
        if let FrameKind::Rotation { axis: a, theta_rad: t } = &mut self.node_mut(id).kind {
            *a = axis.normalize();
            *t = theta_rad;
            Ok(())
        } else {
            Err(FrameError::DegenerateAxis)
        }
    }

    /// Sets the translation offset of a `Translation` frame. Does not
    /// recalculate.
    pub fn set_translation(&mut self, id: FrameId, offset: Vec3) {
        if let FrameKind::Translation { offset: o } = &mut self.node_mut(id).kind {
            *o = offset;
        }
    }

    pub fn add_axis(&mut self, id: FrameId, name: impl Into<String>, relative: Vec3) -> usize {
        let name = name.into();
        let node = self.node_mut(id);
        if let Some(&idx) = node.axis_index.get(&name) {
            node.axes[idx].relative = relative;
            return idx;
        }
        let idx = node.axes.len();
        node.axes.push(NamedVector {
            relative,
            absolute: Vec3::ZERO,
        });
        node.axis_index.insert(name, idx);
        idx
    }

    pub fn add_point(&mut self, id: FrameId, name: impl Into<String>, relative: Vec3) -> usize {
        let name = name.into();
        let node = self.node_mut(id);
        if let Some(&idx) = node.point_index.get(&name) {
            node.points[idx].relative = relative;
            return idx;
        }
        let idx = node.points.len();
        node.points.push(NamedVector {
            relative,
            absolute: Vec3::ZERO,
        });
        node.point_index.insert(name, idx);
        idx
    }

    pub fn axis_index(&self, id: FrameId, name: &str) -> Option<usize> {
        self.node(id).axis_index.get(name).copied()
    }

    pub fn point_index(&self, id: FrameId, name: &str) -> Option<usize> {
        self.node(id).point_index.get(name).copied()
    }

    pub fn axis(&self, id: FrameId, name: &str) -> Result<Vec3, FrameError> {
        let node = self.node(id);
        if !node.calculated {
            return Err(FrameError::NotCalculated);
        }
        let idx = node
            .axis_index
            .get(name)
            .ok_or_else(|| FrameError::UnknownAxis(name.to_string()))?;
        Ok(node.axes[*idx].absolute)
    }

    pub fn point(&self, id: FrameId, name: &str) -> Result<Vec3, FrameError> {
        let node = self.node(id);
        if !node.calculated {
            return Err(FrameError::NotCalculated);
        }
        let idx = node
            .point_index
            .get(name)
            .ok_or_else(|| FrameError::UnknownPoint(name.to_string()))?;
        Ok(node.points[*idx].absolute)
    }

    pub fn to_relative(&self, id: FrameId, absv: Vec3) -> Result<Vec3, FrameError> {
        let o = self.orientation(id)?;
        let c = self.center(id)?;
        Ok(o.transpose() * (absv - c))
    }

    pub fn from_relative(&self, id: FrameId, relv: Vec3) -> Result<Vec3, FrameError> {
        let o = self.orientation(id)?;
        let c = self.center(id)?;
        Ok(o * relv + c)
    }

    pub fn to_relative_vec(&self, id: FrameId, absv: Vec3) -> Result<Vec3, FrameError> {
        Ok(self.orientation(id)?.transpose() * absv)
    }

    pub fn from_relative_vec(&self, id: FrameId, relv: Vec3) -> Result<Vec3, FrameError> {
        Ok(self.orientation(id)? * relv)
    }

    /// Recomputes `id`'s own pose from its parent, then its entire subtree,
    /// depth-first in child insertion order. See `FrameTree::recalculate_frame`.
    pub fn recalculate(&mut self, id: FrameId) {
        self.recalculate_frame(id);
        self.recalculate_vectors(id);
        self.node_mut(id).calculated = true;
        let children = self.node(id).children.clone();
        for child in children {
            self.recalculate(child);
        }
    }

    /// Recomputes every strict descendant of `id`, leaving `id` itself
    /// untouched.
    pub fn recalculate_children(&mut self, id: FrameId) {
        let children = self.node(id).children.clone();
        for child in children {
            self.recalculate(child);
        }
    }

    fn recalculate_frame(&mut self, id: FrameId) {
        let parent = match self.node(id).parent {
            Some(p) => p,
            None => return, // root: pose is fixed at construction
        };
        let parent_center = self.node(parent).center;
        let parent_orientation = self.node(parent).orientation;

        let (center, orientation) = match &self.node(id).kind {
            FrameKind::World { linked: Some(target) } => {
                let target = *target;
                (self.node(target).center, self.node(target).orientation)
            }
            FrameKind::World { linked: None } => (Vec3::ZERO, Matrix3::identity()),
            FrameKind::Translation { offset } => {
                (parent_center + parent_orientation * *offset, parent_orientation)
            }
            FrameKind::Rotation { axis, theta_rad } => {
                (parent_center, parent_orientation * Matrix3::rot(*axis, *theta_rad))
            }
            FrameKind::Tripod { base, leg_lengths } => {
                // Elevate each base vertex along the parent's Z by its leg
                // length; orientation follows the plane through the three
                // elevated points.
                let tips: Vec<Vec3> = base
                    .iter()
                    .zip(leg_lengths.iter())
                    .map(|(b, l)| *b + Vec3::Z * *l)
                    .collect();
                let centroid = (tips[0] + tips[1] + tips[2]) / 3.0;
                let normal = (tips[1] - tips[0]).cross(tips[2] - tips[0]).normalize_or_zero();
                let normal = if normal.length_squared() < 1e-18 { Vec3::Z } else { normal };
                let x_axis = (tips[0] - centroid).normalize_or_zero();
                let x_axis = if x_axis.length_squared() < 1e-18 { Vec3::X } else { x_axis };
                let y_axis = normal.cross(x_axis).normalize_or_zero();
                (
                    parent_center + parent_orientation * centroid,
                    parent_orientation * Matrix3::new(x_axis, y_axis, normal),
                )
            }
        };

        let node = self.node_mut(id);
        node.center = center;
        node.orientation = orientation;
    }

    fn recalculate_vectors(&mut self, id: FrameId) {
        let node = self.node_mut(id);
        let orientation = node.orientation;
        let center = node.center;
        for axis in &mut node.axes {
            axis.absolute = orientation * axis.relative;
        }
        for point in &mut node.points {
            point.absolute = orientation * point.relative + center;
        }
    }
}

impl Default for FrameTree {
    fn default() -> Self {
        Self::new()
    }
}
