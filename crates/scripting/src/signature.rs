//! Parameter signatures shared by programs and built-ins

use progs_core::TypeDescriptor;
use std::fmt;

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Ordered parameter list, or the "accepts any" escape hatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameters {
    Positional(Vec<Parameter>),
    /// Any number of arguments of any type, bound as a collection named `args`
    AcceptsAny,
}

impl Parameters {
    pub fn none() -> Self {
        Parameters::Positional(Vec::new())
    }

    /// Positional parameters from bare types, named `arg1`, `arg2`, ...
    pub fn from_types(types: &[TypeDescriptor]) -> Self {
        Parameters::Positional(
            types
                .iter()
                .enumerate()
                .map(|(i, ty)| Parameter::new(format!("arg{}", i + 1), ty.clone()))
                .collect(),
        )
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Parameters::Positional(parameters) => Some(parameters.len()),
            Parameters::AcceptsAny => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn types(&self) -> Vec<TypeDescriptor> {
        match self {
            Parameters::Positional(parameters) => parameters.iter().map(|p| p.ty.clone()).collect(),
            Parameters::AcceptsAny => Vec::new(),
        }
    }

    /// Same parameter types in the same order, names ignored
    pub fn same_signature(&self, other: &Parameters) -> bool {
        match (self, other) {
            (Parameters::AcceptsAny, Parameters::AcceptsAny) => true,
            (Parameters::Positional(_), Parameters::Positional(_)) => self.types() == other.types(),
            _ => false,
        }
    }

    /// Ordered pairwise compatibility check
    pub fn matches(&self, args: &[TypeDescriptor]) -> bool {
        self.match_cost(args).is_some()
    }

    /// Ranking cost of binding `args`, `None` if they do not fit
    ///
    /// Each argument costs 0 for an exact match, 1 when a Literal argument
    /// fills a plain parameter of the same type, and 2 for any other
    /// compatible widening. "Accepts any" signatures rank below every
    /// positional match of the same arity.
    pub fn match_cost(&self, args: &[TypeDescriptor]) -> Option<u32> {
        match self {
            Parameters::AcceptsAny => Some(2 * args.len() as u32 + 1),
            Parameters::Positional(parameters) => {
                if parameters.len() != args.len() {
                    return None;
                }
                parameters
                    .iter()
                    .zip(args)
                    .map(|(parameter, arg)| argument_cost(arg, &parameter.ty))
                    .sum()
            }
        }
    }
}

fn argument_cost(arg: &TypeDescriptor, parameter: &TypeDescriptor) -> Option<u32> {
    if !arg.compatible_with(parameter) {
        return None;
    }
    if arg == parameter {
        Some(0)
    } else if arg.clone().without_literal() == *parameter {
        Some(1)
    } else {
        Some(2)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameters::AcceptsAny => f.write_str("..."),
            Parameters::Positional(parameters) => {
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", parameter.ty, parameter.name)?;
                }
                Ok(())
            }
        }
    }
}
