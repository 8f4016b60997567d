//! Program catalog and overload resolution
//!
//! Built-ins and compiled user programs share one namespace. A call site
//! names a function and supplies argument types; [`ProgramCatalog::resolve`]
//! picks the single cheapest overload or reports why none fits.

use crate::builtins::{BuiltinCatalog, BuiltinDefinition};
use crate::context::ExecutionLimits;
use crate::program::Program;
use crate::signature::Parameters;
use crate::statement::{BuiltinCall, Function, ProgramCall};
use crate::value::Value;
use crate::{Result, ScriptError};
use parking_lot::RwLock;
use progs_core::{IdGenerator, ProgramId, TypeDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// A resolved call target
#[derive(Debug, Clone)]
pub enum Callable {
    Builtin(Arc<BuiltinDefinition>),
    Program(Arc<Program>),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::Builtin(definition) => &definition.name,
            Callable::Program(program) => program.name(),
        }
    }

    pub fn parameters(&self) -> &Parameters {
        match self {
            Callable::Builtin(definition) => &definition.parameters,
            Callable::Program(program) => program.parameters(),
        }
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        match self {
            Callable::Builtin(definition) => &definition.returns,
            Callable::Program(program) => program.return_type(),
        }
    }
}

fn describe_call(name: &str, arg_types: &[TypeDescriptor]) -> String {
    let args: Vec<String> = arg_types.iter().map(TypeDescriptor::describe).collect();
    format!("{}({})", name, args.join(", "))
}

/// Catalog of every callable function
#[derive(Debug)]
pub struct ProgramCatalog {
    builtins: BuiltinCatalog,
    programs: RwLock<HashMap<String, Vec<Arc<Program>>>>,
    ids: IdGenerator,
}

impl ProgramCatalog {
    pub fn new(builtins: BuiltinCatalog) -> Self {
        tracing::info!(
            "Program catalog created with {} built-in overloads",
            builtins.overload_count()
        );
        Self {
            builtins,
            programs: RwLock::new(HashMap::new()),
            ids: IdGenerator::new(),
        }
    }

    pub fn builtins(&self) -> &BuiltinCatalog {
        &self.builtins
    }

    /// Add a compiled program, assigning an id if it has none
    ///
    /// A program with the same id replaces the earlier one. A different
    /// program with the same name and parameter types is rejected.
    pub fn add_program(&self, mut program: Program) -> Result<Arc<Program>> {
        if !program.is_compiled() {
            return Err(ScriptError::NotCompiled(program.name().to_string()));
        }

        let id = match program.id() {
            Some(id) => {
                self.ids.observe(id);
                id
            }
            None => {
                let id = self.ids.next_id();
                program.set_id(id);
                id
            }
        };

        let key = program.name().to_lowercase();
        let mut programs = self.programs.write();
        let clashes = programs.get(&key).is_some_and(|overloads| {
            overloads.iter().any(|existing| {
                existing.id() != Some(id)
                    && existing.parameters().same_signature(program.parameters())
            })
        });
        if clashes {
            return Err(ScriptError::Compile(format!(
                "A program named {} with parameters ({}) already exists",
                program.name(),
                program.parameters()
            )));
        }

        // A replacement may move its name, so drop the old copy wherever it lives
        for overloads in programs.values_mut() {
            overloads.retain(|existing| existing.id() != Some(id));
        }
        programs.retain(|_, overloads| !overloads.is_empty());

        tracing::debug!("Added program {} as {}", program.name(), id);
        let program = Arc::new(program);
        programs.entry(key).or_default().push(program.clone());
        Ok(program)
    }

    pub fn remove_program(&self, id: ProgramId) -> Option<Arc<Program>> {
        let mut programs = self.programs.write();
        let mut removed = None;
        for overloads in programs.values_mut() {
            if let Some(index) = overloads.iter().position(|program| program.id() == Some(id)) {
                removed = Some(overloads.remove(index));
                break;
            }
        }
        programs.retain(|_, overloads| !overloads.is_empty());
        removed
    }

    pub fn program(&self, id: ProgramId) -> Option<Arc<Program>> {
        self.programs
            .read()
            .values()
            .flatten()
            .find(|program| program.id() == Some(id))
            .cloned()
    }

    pub fn programs_named(&self, name: &str) -> Vec<Arc<Program>> {
        self.programs
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn program_count(&self) -> usize {
        self.programs.read().values().map(Vec::len).sum()
    }

    /// Every built-in and program called `name`
    pub fn candidates(&self, name: &str) -> Vec<Callable> {
        let mut candidates: Vec<Callable> = self
            .builtins
            .overloads(name)
            .iter()
            .cloned()
            .map(Callable::Builtin)
            .collect();
        candidates.extend(self.programs_named(name).into_iter().map(Callable::Program));
        candidates
    }

    /// Pick the overload of `name` that best fits `arg_types`
    ///
    /// Candidates are ranked by [`Parameters::match_cost`]; a tie for the
    /// lowest cost is an ambiguous call.
    pub fn resolve(&self, name: &str, arg_types: &[TypeDescriptor]) -> Result<Callable> {
        let mut best: Vec<(u32, Callable)> = Vec::new();
        for candidate in self.candidates(name) {
            let Some(cost) = candidate.parameters().match_cost(arg_types) else {
                continue;
            };
            match best.first() {
                Some((best_cost, _)) if cost > *best_cost => {}
                Some((best_cost, _)) if cost == *best_cost => best.push((cost, candidate)),
                _ => best = vec![(cost, candidate)],
            }
        }

        let call = describe_call(name, arg_types);
        match best.len() {
            0 => {
                tracing::debug!("No overload for {}", call);
                Err(ScriptError::UnknownFunction(call))
            }
            1 => {
                let (cost, callable) = best.remove(0);
                tracing::debug!(
                    "Resolved {} to {}({}) at cost {}",
                    call,
                    callable.name(),
                    callable.parameters(),
                    cost
                );
                Ok(callable)
            }
            _ => {
                tracing::debug!("{} matches {} overloads equally well", call, best.len());
                Err(ScriptError::AmbiguousCall(call))
            }
        }
    }

    /// Resolve `name` for `args` and build the call node
    pub fn build_call(
        &self,
        name: &str,
        args: Vec<Box<dyn Function>>,
    ) -> Result<Box<dyn Function>> {
        let arg_types: Vec<TypeDescriptor> = args.iter().map(|arg| arg.return_type()).collect();
        Ok(match self.resolve(name, &arg_types)? {
            Callable::Builtin(definition) => Box::new(BuiltinCall::new(definition, args)),
            Callable::Program(program) => Box::new(ProgramCall::new(program, args)),
        })
    }

    /// Resolve on the runtime types of `args` and run the chosen overload
    pub fn call(&self, name: &str, args: &[Value], limits: ExecutionLimits) -> Result<Value> {
        let arg_types: Vec<TypeDescriptor> = args.iter().map(Value::prog_type).collect();
        match self.resolve(name, &arg_types)? {
            Callable::Builtin(definition) => definition.invoke(args),
            Callable::Program(program) => program.execute_with(args, limits),
        }
    }
}
