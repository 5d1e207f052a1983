//! Recipe loading and top-level model construction: turns a declarative
//! [`RecipeContext`] into a live [`TopLevelModel`] with a resolved frame
//! tree, built optical surfaces, and a dependency graph wiring dofs and
//! params to every expression that reads them.

mod builder;
mod caster;
mod ctx;
mod element_kind;
mod recipe;
mod toplevel;

use thiserror::Error;

pub use builder::build;
pub use element_kind::ElementKind;
pub use recipe::{RecipeContext, RecipeElementStep, RecipeExposedPort, RecipeFrameStep, RecipeOpticalPath, RecipeParameter};
pub use toplevel::{TopLevelModel, TraceReport};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown element kind {0:?}")]
    UnknownElementKind(String),
    #[error("unknown frame {0:?}")]
    UnknownFrame(String),
    #[error("unknown element {0:?}")]
    UnknownElement(String),
    #[error("unknown dof {0:?}")]
    UnknownDof(String),
    #[error("unknown param {0:?}")]
    UnknownParam(String),
    #[error("unknown optical path {0:?}")]
    UnknownPath(String),
    #[error(transparent)]
    Expr(#[from] ot_expr::EvalError),
    #[error(transparent)]
    Frame(#[from] ot_frame::FrameError),
    #[error(transparent)]
    Beam(#[from] ot_beam::BeamError),
    #[error("value {value} is out of range for {name:?}")]
    OutOfRange { name: String, value: f64 },
}
