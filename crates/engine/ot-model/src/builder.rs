use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ot_beam::SurfaceTag;
use ot_expr::{ComponentParamEvaluator, DependencyGraph, FastevalEvaluator, ModelParam};
use ot_frame::{FrameId, FrameKind, FrameTree};
use ot_math::{ExprRandomState, Vec3};
use ot_optics::{Element, OpticalElement, PropertyValue};

use crate::ctx::ModelEvalContext;
use crate::element_kind::ElementKind;
use crate::recipe::{RecipeContext, RecipeFrameStep};
use crate::toplevel::TopLevelModel;
use crate::ModelError;

/// Builds a [`TopLevelModel`] from a [`RecipeContext`], in the same broad
/// stages as the source project's composite-model build pipeline:
/// register dofs/params, create frames, create elements, compile every
/// expression into the dependency graph, assign everything once, then fix
/// each element's optical geometry from its now-resolved properties.
pub fn build(recipe: &RecipeContext, seed: u64) -> Result<TopLevelModel, ModelError> {
    let dofs: HashMap<String, ModelParam> =
        recipe.dofs.iter().map(|p| (p.name.clone(), ModelParam::new(p.default, p.min, p.max))).collect();
    let params: HashMap<String, ModelParam> =
        recipe.params.iter().map(|p| (p.name.clone(), ModelParam::new(p.default, p.min, p.max))).collect();
    let locals: Rc<RefCell<HashMap<String, f64>>> =
        Rc::new(RefCell::new(recipe.locals.keys().map(|name| (name.clone(), 0.0)).collect()));

    let mut known_symbols: Vec<String> = dofs.keys().cloned().collect();
    known_symbols.extend(params.keys().cloned());
    known_symbols.extend(recipe.locals.keys().cloned());

    let mut graph = DependencyGraph::new();

    // Locals first: frames and element properties may read them, but they
    // never read frames or properties back, so this order alone makes the
    // single `assign_all` pass below correct.
    for (name, expr) in &recipe.locals {
        let evaluator = FastevalEvaluator::compile(expr, &known_symbols)?;
        let locals_slot = locals.clone();
        let produced_name = name.clone();
        let apply_name = name.clone();
        graph.register(
            ComponentParamEvaluator::new(
                Box::new(evaluator),
                Box::new(move |v| {
                    locals_slot.borrow_mut().insert(apply_name.clone(), v);
                }),
            )
            .with_produces(produced_name),
        );
    }

    let frames = Rc::new(RefCell::new(FrameTree::new()));
    let world = frames.borrow().root();
    let mut frame_by_name: HashMap<String, FrameId> = HashMap::new();
    frame_by_name.insert("world".to_string(), world);

    for step in &recipe.frames {
        let parent = *frame_by_name.get(step.parent()).ok_or_else(|| ModelError::UnknownFrame(step.parent().to_string()))?;
        match step {
            RecipeFrameStep::Rotation { name, axis, angle_deg, .. } => {
                let id = frames.borrow_mut().insert(name.clone(), parent, FrameKind::Rotation { axis: Vec3::from(*axis), theta_rad: 0.0 });
                frame_by_name.insert(name.clone(), id);

                let evaluator = FastevalEvaluator::compile(angle_deg, &known_symbols)?;
                let tree = frames.clone();
                let axis = Vec3::from(*axis);
                graph.register(ComponentParamEvaluator::new(
                    Box::new(evaluator),
                    Box::new(move |deg| {
                        let _ = tree.borrow_mut().set_rotation(id, axis, deg.to_radians());
                    }),
                ));
            }
            RecipeFrameStep::Translation { name, offset, .. } => {
                let id = frames.borrow_mut().insert(name.clone(), parent, FrameKind::Translation { offset: Vec3::ZERO });
                frame_by_name.insert(name.clone(), id);

                let shared = Rc::new(RefCell::new(Vec3::ZERO));
                for (axis_idx, expr) in offset.iter().enumerate() {
                    let evaluator = FastevalEvaluator::compile(expr, &known_symbols)?;
                    let tree = frames.clone();
                    let shared = shared.clone();
                    graph.register(ComponentParamEvaluator::new(
                        Box::new(evaluator),
                        Box::new(move |v| {
                            {
                                let mut slot = shared.borrow_mut();
                                match axis_idx {
                                    0 => slot.x = v,
                                    1 => slot.y = v,
                                    _ => slot.z = v,
                                }
                            }
                            tree.borrow_mut().set_translation(id, *shared.borrow());
                        }),
                    ));
                }
            }
        }
    }

    let raw_elements: Rc<RefCell<HashMap<String, Element>>> = Rc::new(RefCell::new(HashMap::new()));
    let mut element_kinds: HashMap<String, ElementKind> = HashMap::new();
    let mut element_order: Vec<String> = Vec::new();

    for step in &recipe.elements {
        let kind = ElementKind::from_name(&step.kind)?;
        let frame = *frame_by_name.get(&step.frame).ok_or_else(|| ModelError::UnknownFrame(step.frame.clone()))?;
        let mut element = Element::new(step.name.clone(), frame);
        kind.seed_properties(&mut element);

        for (prop_name, expr) in &step.properties {
            if !element.has_property(prop_name) {
                element.register_property(prop_name.clone(), PropertyValue::Real(0.0));
            }
            let evaluator = FastevalEvaluator::compile(expr, &known_symbols)?;
            let elems = raw_elements.clone();
            let ename = step.name.clone();
            let pname = prop_name.clone();
            graph.register(ComponentParamEvaluator::new(
                Box::new(evaluator),
                Box::new(move |v| {
                    if let Some(el) = elems.borrow_mut().get_mut(&ename) {
                        el.set(&pname, PropertyValue::Real(v));
                    }
                }),
            ));
        }

        raw_elements.borrow_mut().insert(step.name.clone(), element);
        element_kinds.insert(step.name.clone(), kind);
        element_order.push(step.name.clone());
    }

    // Surface tags can be assigned from the kind catalog alone, well before
    // geometry exists: every kind has a fixed, known surface name list.
    let mut tag_to_key: HashMap<SurfaceTag, (String, String)> = HashMap::new();
    let mut key_to_tag: HashMap<(String, String), SurfaceTag> = HashMap::new();
    let mut next_tag: SurfaceTag = 0;
    for ename in &element_order {
        let kind = element_kinds[ename];
        for surface_name in kind.surface_names() {
            let tag = next_tag;
            next_tag += 1;
            tag_to_key.insert(tag, (ename.clone(), surface_name.to_string()));
            key_to_tag.insert((ename.clone(), surface_name.to_string()), tag);
        }
    }

    let mut path_tags: HashMap<String, Vec<SurfaceTag>> = HashMap::new();
    for path in &recipe.paths {
        let mut tags = Vec::new();
        for ename in &path.elements {
            let kind = *element_kinds.get(ename).ok_or_else(|| ModelError::UnknownElement(ename.clone()))?;
            for surface_name in kind.surface_names() {
                tags.push(key_to_tag[&(ename.clone(), surface_name.to_string())]);
            }
        }
        path_tags.insert(path.name.clone(), tags);
    }

    let mut exposed_ports: HashMap<String, FrameId> = HashMap::new();
    for port in &recipe.exposed_ports {
        let frame = *frame_by_name.get(&port.frame).ok_or_else(|| ModelError::UnknownFrame(port.frame.clone()))?;
        exposed_ports.insert(port.external_name.clone(), frame);
    }

    let mut rand_state = ExprRandomState::new(seed);
    {
        let mut ctx = ModelEvalContext { dofs: &dofs, params: &params, locals: locals.clone(), rand_state: &mut rand_state };
        graph.assign_all(&mut ctx)?;
    }
    frames.borrow_mut().recalculate(world);

    let mut elements: HashMap<String, OpticalElement> = HashMap::new();
    let mut raw = raw_elements.borrow_mut();
    for ename in &element_order {
        let element = raw.remove(ename).expect("every created element has a raw entry");
        let frame = element.parent_frame();
        let kind = element_kinds[ename];
        elements.insert(ename.clone(), kind.build_optical(element, frame));
    }
    drop(raw);

    Ok(TopLevelModel {
        frames,
        world,
        elements: Rc::new(RefCell::new(elements)),
        tag_to_key,
        path_tags,
        exposed_ports,
        dofs,
        params,
        locals,
        graph,
        rand_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{RecipeElementStep, RecipeOpticalPath, RecipeParameter};
    use std::collections::BTreeMap;

    #[test]
    fn builds_minimal_model_with_one_mirror() {
        let mut recipe = RecipeContext::default();
        recipe.dofs.push(RecipeParameter { name: "tilt".to_string(), default: 0.0, min: -45.0, max: 45.0 });
        recipe.frames.push(RecipeFrameStep::Rotation {
            name: "mirrorFrame".to_string(),
            parent: "world".to_string(),
            axis: [1.0, 0.0, 0.0],
            angle_deg: "tilt".to_string(),
        });
        let mut properties = BTreeMap::new();
        properties.insert("radius".to_string(), "0.3".to_string());
        recipe.elements.push(RecipeElementStep {
            name: "m1".to_string(),
            kind: "FlatMirror".to_string(),
            frame: "mirrorFrame".to_string(),
            properties,
        });
        recipe.paths.push(RecipeOpticalPath { name: "main".to_string(), elements: vec!["m1".to_string()] });

        let model = build(&recipe, 1).unwrap();
        assert_eq!(model.dof("tilt").unwrap(), 0.0);
        assert!(model.paths().any(|p| p == "main"));
        let elements = model.elements();
        assert!(elements.borrow().get("m1").unwrap().surface("reflective").is_some());
    }

    #[test]
    fn set_dof_rotates_frame() {
        let mut recipe = RecipeContext::default();
        recipe.dofs.push(RecipeParameter { name: "tilt".to_string(), default: 0.0, min: -45.0, max: 45.0 });
        recipe.frames.push(RecipeFrameStep::Rotation {
            name: "mirrorFrame".to_string(),
            parent: "world".to_string(),
            axis: [0.0, 1.0, 0.0],
            angle_deg: "tilt".to_string(),
        });
        let mut model = build(&recipe, 1).unwrap();
        model.set_dof("tilt", 30.0).unwrap();
        assert_eq!(model.dof("tilt").unwrap(), 30.0);
    }
}
