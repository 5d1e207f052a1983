use ot_beam::{Ray, RayBeam, RayBeamSlice, SurfaceTag};
use std::time::Instant;

use crate::listener::{NullListener, RayListener, StageKind};

/// Performs the geometric work the engine doesn't know how to do itself:
/// finding where a beam's rays hit a surface (`cast`) and applying that
/// surface's electromagnetic behaviour (`transmit`). Implemented by the
/// model layer, which knows how frames and optical surfaces map onto
/// `SurfaceTag`s; kept out of this crate so the driver loop below has no
/// dependency on `ot-optics`.
pub trait SurfaceCaster {
    /// Computes intersections for every still-alive ray in the beam against
    /// `surface`, writing `destination`/`normal`/`length` and marking
    /// intercepted rays via `beam.intercept(i)`.
    fn cast(&mut self, surface: SurfaceTag, beam: &mut RayBeam);

    /// Applies `surface`'s interface to every intercepted ray, updating
    /// direction/origin in place and pruning blocked rays.
    fn transmit(&mut self, surface: SurfaceTag, beam: &mut RayBeam);
}

/// Owns the active ray list and working beam and drives the cast/transmit
/// cycle. One engine instance is reused across an entire trace run; `clear`
/// resets it between independent beams.
pub struct RayTracingEngine {
    rays: Vec<Ray>,
    rays_dirty: bool,
    beam: Option<RayBeam>,
    beam_dirty: bool,
    notification_pending: bool,

    stage_name: String,
    curr_stage: usize,
    num_stages: usize,

    listener: Box<dyn RayListener>,
    start: Option<Instant>,
}

impl Default for RayTracingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RayTracingEngine {
    pub fn new() -> Self {
        Self {
            rays: Vec::new(),
            rays_dirty: false,
            beam: None,
            beam_dirty: true,
            notification_pending: false,
            stage_name: String::new(),
            curr_stage: 0,
            num_stages: 0,
            listener: Box::new(NullListener),
            start: None,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn RayListener>) {
        self.listener = listener;
    }

    pub fn beam(&self) -> Option<&RayBeam> {
        self.beam.as_ref()
    }

    pub fn beam_mut(&mut self) -> Option<&mut RayBeam> {
        self.beam.as_mut()
    }

    pub fn set_current_stage(&mut self, name: impl Into<String>, current: usize, total: usize) {
        self.stage_name = name.into();
        self.curr_stage = current;
        self.num_stages = total;
    }

    /// Discards the ray list and working beam.
    pub fn clear(&mut self) {
        self.rays.clear();
        self.rays_dirty = false;
        self.beam = None;
        self.beam_dirty = true;
    }

    pub fn set_main_beam(&mut self, beam: RayBeam) {
        self.beam = Some(beam);
        self.beam_dirty = false;
    }

    pub fn push_ray(&mut self, ray: Ray) {
        self.rays.push(ray);
        self.rays_dirty = true;
        self.beam_dirty = true;
    }

    pub fn push_rays(&mut self, rays: impl IntoIterator<Item = Ray>) {
        self.rays.extend(rays);
        self.rays_dirty = true;
        self.beam_dirty = true;
    }

    /// Rebuilds the working beam's origins/directions from the ray list,
    /// allocating it fresh if needed. Equivalent to `toBeam()`.
    fn to_beam(&mut self, non_sequential: bool) {
        let n = self.rays.len() as u64;
        let mut beam = RayBeam::new(n, non_sequential);
        let _ = beam.allocate(n);
        for (i, ray) in self.rays.iter().enumerate() {
            let i = i as u64;
            beam.set_origin(i, ray.origin);
            beam.set_direction(i, ray.direction);
            beam.set_length(i, ray.length);
            beam.set_cum_opt_length(i, ray.cum_opt_length);
            beam.set_wavelength(i, ray.wavelength);
            beam.set_ref_ndx(i, ray.ref_ndx);
            beam.set_id(i, ray.id);
            if ray.chief {
                beam.set_chief_ray(i);
            }
        }
        self.beam = Some(beam);
        self.beam_dirty = false;
        self.rays_dirty = false;
    }

    /// Rebuilds the ray list from the working beam's destinations and
    /// directions. Equivalent to `toRays(keepPruned)`.
    fn to_rays(&mut self, keep_pruned: bool) {
        self.rays.clear();
        let Some(beam) = &self.beam else { return };
        for i in 0..beam.count() {
            if !beam.has_ray(i) {
                continue;
            }
            if !keep_pruned && !beam.is_intercepted(i) {
                continue;
            }
            self.rays.push(Ray {
                origin: beam.destination(i),
                direction: beam.direction(i),
                length: beam.length(i),
                cum_opt_length: beam.cum_opt_length(i),
                wavelength: beam.wavelength(i),
                ref_ndx: beam.ref_ndx(i),
                id: beam.id(i),
                chief: beam.is_chief(i),
                intercepted: beam.is_intercepted(i),
            });
        }
    }

    /// Ensures the working beam reflects the current ray list, rebuilding
    /// it if the rays changed since the last cast, then casts against
    /// `surface`.
    pub fn cast_to(&mut self, surface: SurfaceTag, caster: &mut dyn SurfaceCaster, non_sequential: bool) {
        if self.beam.is_none() || self.rays_dirty {
            self.to_beam(non_sequential);
        }
        if let Some(beam) = &mut self.beam {
            caster.cast(surface, beam);
        }
    }

    pub fn update_origins(&mut self) {
        if let Some(beam) = &mut self.beam {
            beam.update_origins();
        }
    }

    /// Applies `surface`'s interface to the working beam, refreshes the ray
    /// list from what's left, and clears pending per-surface destination
    /// state so a later `cast_to` starts clean.
    pub fn transmit_through(&mut self, surface: SurfaceTag, caster: &mut dyn SurfaceCaster, keep_pruned: bool) {
        if let Some(beam) = &mut self.beam {
            caster.transmit(surface, beam);
        }
        self.to_rays(keep_pruned);
        self.beam_dirty = true;
    }

    /// Returns the current ray list, rebuilding it from the beam first if
    /// the beam has live state the ray list hasn't absorbed yet.
    pub fn get_rays(&mut self, keep_pruned: bool) -> &[Ray] {
        if self.beam_dirty && self.beam.is_some() {
            self.to_rays(keep_pruned);
        }
        &self.rays
    }

    pub fn whole_slice(&self) -> RayBeamSlice {
        RayBeamSlice::whole(self.beam.as_ref().map(RayBeam::count).unwrap_or(0))
    }

    pub fn tick(&mut self) {
        self.start = Some(Instant::now());
    }

    pub fn tack(&self) -> u64 {
        self.start.map(|t| t.elapsed().as_micros() as u64).unwrap_or(0)
    }

    pub fn notification_pending(&self) -> bool {
        self.notification_pending
    }

    pub fn clear_pending_notifications(&mut self) {
        self.notification_pending = false;
    }

    pub fn cancelled(&self) -> bool {
        self.listener.cancelled()
    }

    pub fn stage_progress(&mut self, stage: StageKind, num: u32, total: u32) {
        let name = self.stage_name.clone();
        self.listener.stage_progress(stage, &name, num, total);
        self.notification_pending = true;
    }

    pub fn ray_progress(&mut self, num: u64, total: u64) {
        let interval = self.listener.ray_notify_interval();
        if interval != 0 && num % interval == 0 {
            self.listener.ray_progress(num, total);
            self.notification_pending = true;
        }
    }
}
