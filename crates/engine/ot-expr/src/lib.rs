mod evaluator;
mod graph;
mod param;

pub use evaluator::{EvalContext, EvalError, Evaluator, FastevalEvaluator};
pub use graph::{ComponentParamEvaluator, DependencyGraph};
pub use param::ModelParam;
