use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ot_beam::{Ray, SurfaceTag};
use ot_expr::{DependencyGraph, ModelParam};
use ot_frame::{FrameId, FrameTree};
use ot_math::ExprRandomState;
use ot_optics::OpticalElement;
use ot_tracer::RayTracingEngine;

use crate::caster::ModelCaster;
use crate::ctx::ModelEvalContext;
use crate::ModelError;

/// Result of tracing a beam through an optical path: the surviving rays in
/// world coordinates, in whatever order the engine last produced them.
#[derive(Debug, Clone)]
pub struct TraceReport {
    pub rays: Vec<Ray>,
}

/// A fully built optomechanical model: frame tree, optical elements and
/// their surfaces, the dof/param/local dependency network, and the
/// optical paths available to trace. Produced by [`crate::builder::build`].
pub struct TopLevelModel {
    pub(crate) frames: Rc<RefCell<FrameTree>>,
    pub(crate) world: FrameId,
    pub(crate) elements: Rc<RefCell<HashMap<String, OpticalElement>>>,
    pub(crate) tag_to_key: HashMap<SurfaceTag, (String, String)>,
    pub(crate) path_tags: HashMap<String, Vec<SurfaceTag>>,
    pub(crate) exposed_ports: HashMap<String, FrameId>,
    pub(crate) dofs: HashMap<String, ModelParam>,
    pub(crate) params: HashMap<String, ModelParam>,
    pub(crate) locals: Rc<RefCell<HashMap<String, f64>>>,
    pub(crate) graph: DependencyGraph,
    pub(crate) rand_state: ExprRandomState,
}

impl TopLevelModel {
    pub fn world(&self) -> FrameId {
        self.world
    }

    pub fn frames(&self) -> Rc<RefCell<FrameTree>> {
        self.frames.clone()
    }

    pub fn elements(&self) -> Rc<RefCell<HashMap<String, OpticalElement>>> {
        self.elements.clone()
    }

    pub fn dof(&self, name: &str) -> Result<f64, ModelError> {
        self.dofs.get(name).map(|p| p.value).ok_or_else(|| ModelError::UnknownDof(name.to_string()))
    }

    pub fn param(&self, name: &str) -> Result<f64, ModelError> {
        self.params.get(name).map(|p| p.value).ok_or_else(|| ModelError::UnknownParam(name.to_string()))
    }

    pub fn dofs(&self) -> impl Iterator<Item = &str> {
        self.dofs.keys().map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.path_tags.keys().map(String::as_str)
    }

    pub fn exposed_port(&self, external_name: &str) -> Option<FrameId> {
        self.exposed_ports.get(external_name).copied()
    }

    pub fn local(&self, name: &str) -> Option<f64> {
        self.locals.borrow().get(name).copied()
    }

    /// Reseeds the random state backing a model's `randu`/`randn` recipe
    /// expressions, and re-propagates every expression that reads them.
    pub fn reseed(&mut self, seed: u64) -> Result<(), ModelError> {
        self.rand_state = ExprRandomState::new(seed);
        let mut ctx = ModelEvalContext {
            dofs: &self.dofs,
            params: &self.params,
            locals: self.locals.clone(),
            rand_state: &mut self.rand_state,
        };
        self.graph.assign_all(&mut ctx)?;
        self.frames.borrow_mut().recalculate(self.world);
        Ok(())
    }

    pub fn set_dof(&mut self, name: &str, value: f64) -> Result<(), ModelError> {
        {
            let dof = self.dofs.get_mut(name).ok_or_else(|| ModelError::UnknownDof(name.to_string()))?;
            if !dof.test(value) {
                return Err(ModelError::OutOfRange { name: name.to_string(), value });
            }
            dof.value = value;
        }
        self.propagate(&[name.to_string()])
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ModelError> {
        {
            let param = self.params.get_mut(name).ok_or_else(|| ModelError::UnknownParam(name.to_string()))?;
            if !param.test(value) {
                return Err(ModelError::OutOfRange { name: name.to_string(), value });
            }
            param.value = value;
        }
        self.propagate(&[name.to_string()])
    }

    fn propagate(&mut self, changed: &[String]) -> Result<(), ModelError> {
        let mut ctx = ModelEvalContext {
            dofs: &self.dofs,
            params: &self.params,
            locals: self.locals.clone(),
            rand_state: &mut self.rand_state,
        };
        self.graph.propagate(changed, &mut ctx)?;
        self.frames.borrow_mut().recalculate(self.world);
        Ok(())
    }

    /// Traces `rays` sequentially through every surface along `path`, in
    /// the order the path's elements were listed when the model was built.
    pub fn trace(&self, path: &str, rays: Vec<Ray>, keep_pruned: bool) -> Result<TraceReport, ModelError> {
        let tags = self.path_tags.get(path).ok_or_else(|| ModelError::UnknownPath(path.to_string()))?;

        let mut engine = RayTracingEngine::new();
        engine.push_rays(rays);
        let mut caster =
            ModelCaster { frames: self.frames.clone(), elements: self.elements.clone(), tag_to_key: self.tag_to_key.clone() };

        for &tag in tags {
            engine.cast_to(tag, &mut caster, false);
            engine.transmit_through(tag, &mut caster, keep_pruned);
            engine.update_origins();
        }

        Ok(TraceReport { rays: engine.get_rays(keep_pruned).to_vec() })
    }
}
