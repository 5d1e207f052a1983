use std::collections::{HashMap, HashSet, VecDeque};

use crate::evaluator::{EvalContext, EvalError, Evaluator};

/// Ties a compiled [`Evaluator`] to the side effect of writing its result
/// somewhere in the model (a frame's rotation angle, an element's property,
/// a local variable's slot). The side effect is an opaque closure so this
/// crate never needs to know about frames or elements.
pub struct ComponentParamEvaluator {
    evaluator: Box<dyn Evaluator>,
    apply: Box<dyn FnMut(f64)>,
    /// Symbol name this evaluator's result is published under, if any other
    /// expression in the graph may depend on it (e.g. a local variable).
    produces: Option<String>,
}

impl std::fmt::Debug for ComponentParamEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentParamEvaluator")
            .field("evaluator", &self.evaluator)
            .field("produces", &self.produces)
            .finish()
    }
}

impl ComponentParamEvaluator {
    pub fn new(evaluator: Box<dyn Evaluator>, apply: Box<dyn FnMut(f64)>) -> Self {
        Self { evaluator, apply, produces: None }
    }

    pub fn with_produces(mut self, name: impl Into<String>) -> Self {
        self.produces = Some(name.into());
        self
    }

    pub fn dependencies(&self) -> &[String] {
        self.evaluator.dependencies()
    }

    /// Evaluates the expression and applies the result to the model,
    /// returning the value that was applied.
    pub fn assign(&mut self, ctx: &mut dyn EvalContext) -> Result<f64, EvalError> {
        let value = self.evaluator.evaluate(ctx)?;
        (self.apply)(value);
        Ok(value)
    }
}

/// Breadth-first dependency propagation network over a set of
/// [`ComponentParamEvaluator`]s. Registering an evaluator indexes it by the
/// symbol names it reads; [`DependencyGraph::propagate`] walks outward from
/// a changed set of names, re-running every evaluator that reads a changed
/// (or newly-produced) name exactly once per propagation pass.
#[derive(Default)]
pub struct DependencyGraph {
    evaluators: Vec<ComponentParamEvaluator>,
    by_symbol: HashMap<String, Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, evaluator: ComponentParamEvaluator) -> usize {
        let idx = self.evaluators.len();
        for dep in evaluator.dependencies() {
            self.by_symbol.entry(dep.clone()).or_default().push(idx);
        }
        self.evaluators.push(evaluator);
        idx
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Re-evaluates every expression transitively reachable from `changed`,
    /// in breadth-first order, applying each to the model as it goes.
    /// Returns the names that were (re)produced along the way.
    pub fn propagate(&mut self, changed: &[String], ctx: &mut dyn EvalContext) -> Result<Vec<String>, EvalError> {
        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut queued: HashSet<usize> = HashSet::new();

        for name in changed {
            if let Some(indices) = self.by_symbol.get(name) {
                for &i in indices {
                    if queued.insert(i) {
                        queue.push_back(i);
                    }
                }
            }
        }

        let mut produced = Vec::new();
        while let Some(i) = queue.pop_front() {
            self.evaluators[i].assign(ctx)?;
            if let Some(name) = self.evaluators[i].produces.clone() {
                produced.push(name.clone());
                if let Some(indices) = self.by_symbol.get(&name) {
                    for &j in indices {
                        if queued.insert(j) {
                            queue.push_back(j);
                        }
                    }
                }
            }
        }
        Ok(produced)
    }

    /// Re-evaluates every expression in registration order, regardless of
    /// dependency, used for the full `assignEverything` pass at model build
    /// time.
    pub fn assign_all(&mut self, ctx: &mut dyn EvalContext) -> Result<(), EvalError> {
        for evaluator in &mut self.evaluators {
            evaluator.assign(ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::FastevalEvaluator;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    struct MapContext(HashMap<String, f64>);
    impl EvalContext for MapContext {
        fn resolve(&mut self, name: &str) -> Option<f64> {
            self.0.get(name).copied()
        }
        fn call(&mut self, _name: &str, _args: &[f64]) -> Option<f64> {
            None
        }
    }

    #[test]
    fn propagation_chains_through_produced_symbols() {
        // Both evaluators read and write the same shared table, so "b"
        // sees whatever "a" just produced within a single propagation pass.
        let values = Rc::new(RefCell::new(HashMap::from([("dof".to_string(), 2.0)])));

        struct SharedContext(Rc<RefCell<HashMap<String, f64>>>);
        impl EvalContext for SharedContext {
            fn resolve(&mut self, name: &str) -> Option<f64> {
                self.0.borrow().get(name).copied()
            }
            fn call(&mut self, _name: &str, _args: &[f64]) -> Option<f64> {
                None
            }
        }

        let mut graph = DependencyGraph::new();

        let a = FastevalEvaluator::compile("dof * 3", &["dof".to_string()]).unwrap();
        let values_a = values.clone();
        graph.register(
            ComponentParamEvaluator::new(Box::new(a), Box::new(move |v| { values_a.borrow_mut().insert("a".to_string(), v); }))
                .with_produces("a"),
        );

        let b = FastevalEvaluator::compile("a + 1", &["a".to_string()]).unwrap();
        let values_b = values.clone();
        graph.register(ComponentParamEvaluator::new(Box::new(b), Box::new(move |v| { values_b.borrow_mut().insert("b".to_string(), v); })));

        let mut ctx = SharedContext(values.clone());
        graph.propagate(&["dof".to_string()], &mut ctx).unwrap();

        assert_eq!(values.borrow()["a"], 6.0);
        assert_eq!(values.borrow()["b"], 7.0);
    }
}
