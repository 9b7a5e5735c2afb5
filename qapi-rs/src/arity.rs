//! Arity matching between supplied arguments and declared parameters.

use crate::registry::ParameterSpec;

/// Required (non-variadic) and optional (variadic) parameter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub required: usize,
    pub optional: usize,
}

impl Arity {
    pub fn of(parameters: &[ParameterSpec]) -> Self {
        let optional = parameters.iter().filter(|p| p.tag.variadic).count();
        Self {
            required: parameters.len() - optional,
            optional,
        }
    }
}

/// Whether `arg_count` positional arguments can be bound as given.
///
/// Holds when the count equals the parameter count, or lies between the
/// required count and required + optional. With `unbounded_variadic`, any
/// declared variadic parameter lifts the upper bound.
pub fn fits(arg_count: usize, parameters: &[ParameterSpec], unbounded_variadic: bool) -> bool {
    let Arity { required, optional } = Arity::of(parameters);

    if arg_count == parameters.len() {
        return true;
    }
    if arg_count < required {
        return false;
    }
    if unbounded_variadic && optional > 0 {
        return true;
    }
    arg_count <= required + optional
}
