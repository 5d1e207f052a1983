mod beam_gen;
mod engine;
mod footprint;
mod listener;

pub use beam_gen::{collimated_beam, cone_beam, focused_beam, to_world_frame};
pub use engine::{RayTracingEngine, SurfaceCaster};
pub use footprint::Footprint;
pub use listener::{NullListener, RayListener, StageKind};
