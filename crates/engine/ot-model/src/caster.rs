use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ot_beam::{RayBeam, SurfaceTag};
use ot_frame::FrameTree;
use ot_optics::{OpticalElement, RayAction};
use ot_tracer::SurfaceCaster;

/// Bridges `ot-tracer`'s generic cast/transmit cycle to a concrete model:
/// looks up which element and surface a tag names, transforms the relevant
/// rays into that surface's local frame, and delegates the geometric and
/// electromagnetic work to `ot-optics`.
pub struct ModelCaster {
    pub frames: Rc<RefCell<FrameTree>>,
    pub elements: Rc<RefCell<HashMap<String, OpticalElement>>>,
    pub tag_to_key: HashMap<SurfaceTag, (String, String)>,
}

impl SurfaceCaster for ModelCaster {
    fn cast(&mut self, surface: SurfaceTag, beam: &mut RayBeam) {
        let Some((element_name, surface_name)) = self.tag_to_key.get(&surface) else { return };
        let tree = self.frames.borrow();
        let elements = self.elements.borrow();
        let Some(oe) = elements.get(element_name) else { return };
        let Some(surf) = oe.surface(surface_name) else { return };
        let frame = surf.frame;

        beam.uni_intercept_all();
        for i in 0..beam.count() {
            if !beam.has_ray(i) {
                continue;
            }
            let (Ok(origin_l), Ok(dir_l)) =
                (tree.to_relative(frame, beam.origin(i)), tree.to_relative_vec(frame, beam.direction(i)))
            else {
                continue;
            };
            match surf.boundary.cast(origin_l, dir_l) {
                Some(hit) => {
                    let (Ok(dest_w), Ok(normal_w)) =
                        (tree.from_relative(frame, hit.hit), tree.from_relative_vec(frame, hit.normal))
                    else {
                        continue;
                    };
                    beam.set_destination(i, dest_w);
                    beam.set_normal(i, normal_w);
                    beam.set_length(i, hit.t * beam.direction(i).length());
                    beam.intercept(i);
                }
                None => beam.prune(i),
            }
        }
    }

    fn transmit(&mut self, surface: SurfaceTag, beam: &mut RayBeam) {
        let Some((element_name, surface_name)) = self.tag_to_key.get(&surface) else { return };
        let tree = self.frames.borrow();
        let mut elements = self.elements.borrow_mut();
        let Some(oe) = elements.get_mut(element_name) else { return };
        let Some(surf) = oe.surface_mut(surface_name) else { return };
        let frame = surf.frame;

        for i in 0..beam.count() {
            if !beam.is_intercepted(i) {
                continue;
            }
            let dest = beam.destination(i);
            let (Ok(hit_l), Ok(normal_l), Ok(dir_l)) = (
                tree.to_relative(frame, dest),
                tree.to_relative_vec(frame, beam.normal(i)),
                tree.to_relative_vec(frame, beam.direction(i)),
            ) else {
                continue;
            };

            let ref_ndx = beam.ref_ndx(i);
            let (new_dir_l, new_ref_ndx, action) = surf.boundary.transmit(hit_l, normal_l, dir_l, ref_ndx);
            surf.record_hit(hit_l);
            let stats = surf.statistics_for(beam.id(i));

            match action {
                RayAction::Continue => {
                    stats.intercepted += 1;
                    beam.set_cum_opt_length(i, beam.cum_opt_length(i) + beam.length(i) * ref_ndx);
                    beam.set_ref_ndx(i, new_ref_ndx);
                    if let Ok(new_dir_w) = tree.from_relative_vec(frame, new_dir_l) {
                        beam.set_direction(i, new_dir_w);
                        beam.set_origin(i, dest);
                    }
                }
                RayAction::Block => {
                    stats.vignetted += 1;
                    beam.prune(i);
                }
            }
        }
    }
}
