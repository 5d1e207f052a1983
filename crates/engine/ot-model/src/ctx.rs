use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ot_expr::{EvalContext, ModelParam};
use ot_math::ExprRandomState;

/// Resolves dof/param/local names and the `randu`/`randn` custom functions
/// during expression evaluation. Locals shadow dofs, which shadow params,
/// matching how nested scopes resolve names in the source recipe format.
pub(crate) struct ModelEvalContext<'a> {
    pub dofs: &'a HashMap<String, ModelParam>,
    pub params: &'a HashMap<String, ModelParam>,
    pub locals: Rc<RefCell<HashMap<String, f64>>>,
    pub rand_state: &'a mut ExprRandomState,
}

impl EvalContext for ModelEvalContext<'_> {
    fn resolve(&mut self, name: &str) -> Option<f64> {
        if let Some(v) = self.locals.borrow().get(name) {
            return Some(*v);
        }
        if let Some(p) = self.dofs.get(name) {
            return Some(p.value);
        }
        if let Some(p) = self.params.get(name) {
            return Some(p.value);
        }
        None
    }

    fn call(&mut self, name: &str, args: &[f64]) -> Option<f64> {
        match (name, args) {
            ("randu", []) => Some(self.rand_state.randu()),
            ("randn", []) => Some(self.rand_state.randn()),
            _ => None,
        }
    }
}
