mod boundary;
mod element;
mod eminterface;
mod surface_shape;

pub use boundary::{MediumBoundary, TransmissionMap};
pub use element::{Element, OpticalElement, OpticalPath, OpticalSurface, PropertyValue, SurfaceStats};
pub use eminterface::{EMInterface, RayAction};
pub use surface_shape::{Intercept, SurfaceShape};
