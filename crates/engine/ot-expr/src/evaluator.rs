use fasteval::{Compiler, Evaler, Instruction, Slab};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to parse expression {expr:?}: {reason}")]
    Parse { expr: String, reason: String },
    #[error("failed to evaluate expression: {0}")]
    Eval(String),
}

/// Supplies variable values and custom function calls during evaluation of
/// an [`Evaluator`]. Kept as a trait object so the expression layer never
/// needs to know about frames, elements, or the random state that back
/// individual symbols.
pub trait EvalContext {
    fn resolve(&mut self, name: &str) -> Option<f64>;
    fn call(&mut self, name: &str, args: &[f64]) -> Option<f64>;
}

/// A compiled expression that can be re-evaluated cheaply and reports which
/// symbol names it reads, so a [`crate::DependencyGraph`] can wire up
/// propagation without re-parsing.
pub trait Evaluator: std::fmt::Debug {
    fn dependencies(&self) -> &[String];
    fn evaluate(&self, ctx: &mut dyn EvalContext) -> Result<f64, EvalError>;
}

/// Expression backend built on `fasteval`. Dependencies are harvested with
/// a dry-run evaluation against a recording namespace rather than by
/// inspecting the parse tree, since `fasteval`'s compiled `Instruction`
/// does not expose its variable set directly.
#[derive(Debug)]
pub struct FastevalEvaluator {
    expr_string: String,
    compiled: Instruction,
    slab: Slab,
    dependencies: Vec<String>,
}

impl FastevalEvaluator {
    /// Compiles `expr`, recording which of `known_symbols` it references.
    pub fn compile(expr: &str, known_symbols: &[String]) -> Result<Self, EvalError> {
        let parser = fasteval::Parser::new();
        let mut slab = Slab::new();
        let compiled = parser
            .parse(expr, &mut slab.ps)
            .map_err(|e| EvalError::Parse { expr: expr.to_string(), reason: e.to_string() })?
            .from(&slab.ps)
            .compile(&slab.ps, &mut slab.cs);

        let mut dependencies = Vec::new();
        {
            let mut recorder = |name: &str, args: Vec<f64>| -> Option<f64> {
                if args.is_empty() && known_symbols.iter().any(|s| s == name) && !dependencies.contains(&name.to_string()) {
                    dependencies.push(name.to_string());
                }
                Some(1.0)
            };
            // Errors here (e.g. an unrecognized custom function) don't matter;
            // only which known symbols got probed does.
            let _ = compiled.eval(&slab, &mut recorder);
        }

        Ok(Self { expr_string: expr.to_string(), compiled, slab, dependencies })
    }

    pub fn expr_string(&self) -> &str {
        &self.expr_string
    }
}

impl Evaluator for FastevalEvaluator {
    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn evaluate(&self, ctx: &mut dyn EvalContext) -> Result<f64, EvalError> {
        let mut ns = |name: &str, args: Vec<f64>| -> Option<f64> {
            if args.is_empty() {
                ctx.resolve(name)
            } else {
                ctx.call(name, &args)
            }
        };
        self.compiled.eval(&self.slab, &mut ns).map_err(|e| EvalError::Eval(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapContext(HashMap<String, f64>);
    impl EvalContext for MapContext {
        fn resolve(&mut self, name: &str) -> Option<f64> {
            self.0.get(name).copied()
        }
        fn call(&mut self, name: &str, args: &[f64]) -> Option<f64> {
            match name {
                "max" if args.len() == 2 => Some(args[0].max(args[1])),
                _ => None,
            }
        }
    }

    #[test]
    fn harvests_known_dependencies_only() {
        let known = vec!["foo".to_string(), "bar".to_string()];
        let ev = FastevalEvaluator::compile("foo * 2 + bar - sin(1)", &known).unwrap();
        assert_eq!(ev.dependencies().len(), 2);
        assert!(ev.dependencies().contains(&"foo".to_string()));
        assert!(ev.dependencies().contains(&"bar".to_string()));
    }

    #[test]
    fn evaluates_against_context() {
        let known = vec!["x".to_string()];
        let ev = FastevalEvaluator::compile("x * x + 1", &known).unwrap();
        let mut ctx = MapContext(HashMap::from([("x".to_string(), 3.0)]));
        assert_eq!(ev.evaluate(&mut ctx).unwrap(), 10.0);
    }

    #[test]
    fn calls_custom_function() {
        let known: Vec<String> = vec![];
        let ev = FastevalEvaluator::compile("max(2, 5)", &known).unwrap();
        let mut ctx = MapContext(HashMap::new());
        assert_eq!(ev.evaluate(&mut ctx).unwrap(), 5.0);
    }
}
