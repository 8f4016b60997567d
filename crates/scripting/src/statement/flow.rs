//! Control-flow statements

use super::{expect_type, Function, Statement, StatementResult, TypeChecker};
use crate::context::ExecutionContext;
use crate::value::Value;
use crate::{Result, ScriptError};
use progs_core::{ContainerShape, TypeDescriptor};

type CheckResult = std::result::Result<(), String>;

fn evaluate_condition(condition: &dyn Function, ctx: &mut ExecutionContext) -> Result<bool> {
    let value = condition.evaluate(ctx)?;
    value.as_bool().ok_or_else(|| {
        ScriptError::runtime(format!(
            "Condition evaluated to {} instead of Boolean",
            value.prog_type()
        ))
    })
}

fn evaluate_number(function: &dyn Function, ctx: &mut ExecutionContext) -> Result<f64> {
    let value = function.evaluate(ctx)?;
    match value.as_number() {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(ScriptError::runtime(format!("Expected a finite Number, got {}", value))),
    }
}

/// Sequence of statements in their own scope
#[derive(Debug)]
pub struct Block {
    statements: Vec<Box<dyn Statement>>,
}

impl Block {
    pub fn new(statements: Vec<Box<dyn Statement>>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Statement for Block {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        ctx.variables.push_scope();
        let mut result = StatementResult::Normal;
        for statement in &self.statements {
            if let Err(err) = ctx.tick() {
                result = err.into();
                break;
            }
            result = statement.execute(ctx);
            if !result.is_normal() {
                break;
            }
        }
        ctx.variables.pop_scope();
        result
    }

    fn is_return_or_contains_return_on_all_branches(&self) -> bool {
        self.statements
            .iter()
            .any(|statement| statement.is_return_or_contains_return_on_all_branches())
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        checker.push_scope();
        let result = self.statements.iter().try_for_each(|statement| statement.check(checker));
        checker.pop_scope();
        result
    }
}

/// `if` / `else if` / `else`
#[derive(Debug)]
pub struct If {
    branches: Vec<(Box<dyn Function>, Box<dyn Statement>)>,
    otherwise: Option<Box<dyn Statement>>,
}

impl If {
    pub fn new(condition: Box<dyn Function>, body: Box<dyn Statement>) -> Self {
        Self {
            branches: vec![(condition, body)],
            otherwise: None,
        }
    }

    pub fn else_if(mut self, condition: Box<dyn Function>, body: Box<dyn Statement>) -> Self {
        self.branches.push((condition, body));
        self
    }

    pub fn otherwise(mut self, body: Box<dyn Statement>) -> Self {
        self.otherwise = Some(body);
        self
    }
}

impl Statement for If {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        for (condition, body) in &self.branches {
            match evaluate_condition(condition.as_ref(), ctx) {
                Ok(true) => return body.execute(ctx),
                Ok(false) => {}
                Err(err) => return err.into(),
            }
        }
        match &self.otherwise {
            Some(body) => body.execute(ctx),
            None => StatementResult::Normal,
        }
    }

    fn is_return_or_contains_return_on_all_branches(&self) -> bool {
        let Some(otherwise) = &self.otherwise else {
            return false;
        };
        otherwise.is_return_or_contains_return_on_all_branches()
            && self
                .branches
                .iter()
                .all(|(_, body)| body.is_return_or_contains_return_on_all_branches())
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        for (condition, body) in &self.branches {
            condition.check(checker)?;
            expect_type(condition.as_ref(), &TypeDescriptor::BOOLEAN, "If condition")?;
            body.check(checker)?;
        }
        match &self.otherwise {
            Some(body) => body.check(checker),
            None => Ok(()),
        }
    }
}

/// Loop while a condition holds
#[derive(Debug)]
pub struct While {
    condition: Box<dyn Function>,
    body: Box<dyn Statement>,
}

impl While {
    pub fn new(condition: Box<dyn Function>, body: Box<dyn Statement>) -> Self {
        Self { condition, body }
    }
}

impl Statement for While {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        loop {
            if let Err(err) = ctx.tick() {
                return err.into();
            }
            match evaluate_condition(self.condition.as_ref(), ctx) {
                Ok(true) => {}
                Ok(false) => return StatementResult::Normal,
                Err(err) => return err.into(),
            }
            match self.body.execute(ctx) {
                StatementResult::Normal | StatementResult::Continue => {}
                StatementResult::Break => return StatementResult::Normal,
                other => return other,
            }
        }
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        self.condition.check(checker)?;
        expect_type(self.condition.as_ref(), &TypeDescriptor::BOOLEAN, "While condition")?;
        checker.in_loop(|checker| self.body.check(checker))
    }
}

/// Iterate over the items of a collection
#[derive(Debug)]
pub struct ForEach {
    variable: String,
    variable_type: TypeDescriptor,
    collection: Box<dyn Function>,
    body: Box<dyn Statement>,
}

impl ForEach {
    pub fn new(
        variable: impl Into<String>,
        variable_type: TypeDescriptor,
        collection: Box<dyn Function>,
        body: Box<dyn Statement>,
    ) -> Self {
        Self {
            variable: variable.into(),
            variable_type: variable_type.without_literal(),
            collection,
            body,
        }
    }

    fn items(&self, ctx: &mut ExecutionContext) -> Result<Vec<Value>> {
        match self.collection.evaluate(ctx)? {
            Value::Collection(collection) => Ok(collection.into_values()),
            Value::Null(_) => Err(ScriptError::runtime("Cannot iterate over a null collection")),
            other => Err(ScriptError::runtime(format!(
                "Cannot iterate over {}",
                other.prog_type()
            ))),
        }
    }
}

impl Statement for ForEach {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        let items = match self.items(ctx) {
            Ok(items) => items,
            Err(err) => return err.into(),
        };

        for item in items {
            if let Err(err) = ctx.tick() {
                return err.into();
            }
            if !item.prog_type().compatible_with(&self.variable_type) {
                return StatementResult::Error(format!(
                    "Item {} does not fit loop variable {} of type {}",
                    item, self.variable, self.variable_type
                ));
            }

            ctx.variables.push_scope();
            ctx.variables.declare_typed(&self.variable, self.variable_type.clone(), item);
            let result = self.body.execute(ctx);
            ctx.variables.pop_scope();

            match result {
                StatementResult::Normal | StatementResult::Continue => {}
                StatementResult::Break => break,
                other => return other,
            }
        }
        StatementResult::Normal
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        self.collection.check(checker)?;
        let source = self.collection.return_type();
        if source.shape() != ContainerShape::Collection {
            return Err(format!("ForEach needs a Collection, not {}", source));
        }
        if let Some(element) = source.element() {
            let element = element.clone().without_literal();
            if !element.is_bare() && !element.compatible_with(&self.variable_type) {
                return Err(format!(
                    "Loop variable {} of type {} cannot hold {}",
                    self.variable, self.variable_type, element
                ));
            }
        }

        checker.push_scope();
        let result = checker
            .declare(&self.variable, self.variable_type.clone())
            .and_then(|_| checker.in_loop(|checker| self.body.check(checker)));
        checker.pop_scope();
        result
    }
}

/// Count a Number variable from one bound to another, both inclusive
#[derive(Debug)]
pub struct ForRange {
    variable: String,
    from: Box<dyn Function>,
    to: Box<dyn Function>,
    body: Box<dyn Statement>,
}

impl ForRange {
    pub fn new(
        variable: impl Into<String>,
        from: Box<dyn Function>,
        to: Box<dyn Function>,
        body: Box<dyn Statement>,
    ) -> Self {
        Self {
            variable: variable.into(),
            from,
            to,
            body,
        }
    }
}

impl Statement for ForRange {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        let bounds = evaluate_number(self.from.as_ref(), ctx)
            .and_then(|from| Ok((from, evaluate_number(self.to.as_ref(), ctx)?)));
        let (from, to) = match bounds {
            Ok(bounds) => bounds,
            Err(err) => return err.into(),
        };

        // Counting in integers keeps the loop moving past 2^53
        let mut step: u64 = 0;
        loop {
            let current = from + step as f64;
            if current > to {
                break;
            }
            if let Err(err) = ctx.tick() {
                return err.into();
            }
            ctx.variables.push_scope();
            ctx.variables.declare(&self.variable, Value::Number(current));
            let result = self.body.execute(ctx);
            ctx.variables.pop_scope();

            match result {
                StatementResult::Normal | StatementResult::Continue => {}
                StatementResult::Break => break,
                other => return other,
            }
            step += 1;
        }
        StatementResult::Normal
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        self.from.check(checker)?;
        self.to.check(checker)?;
        expect_type(self.from.as_ref(), &TypeDescriptor::NUMBER, "Range start")?;
        expect_type(self.to.as_ref(), &TypeDescriptor::NUMBER, "Range end")?;

        checker.push_scope();
        let result = checker
            .declare(&self.variable, TypeDescriptor::NUMBER)
            .and_then(|_| checker.in_loop(|checker| self.body.check(checker)));
        checker.pop_scope();
        result
    }
}

/// Pick the first case equal to the subject; no fall-through
#[derive(Debug)]
pub struct Switch {
    subject: Box<dyn Function>,
    cases: Vec<(Value, Box<dyn Statement>)>,
    default: Option<Box<dyn Statement>>,
}

impl Switch {
    pub fn new(subject: Box<dyn Function>) -> Self {
        Self {
            subject,
            cases: Vec::new(),
            default: None,
        }
    }

    pub fn case(mut self, value: Value, body: Box<dyn Statement>) -> Self {
        self.cases.push((value, body));
        self
    }

    pub fn default(mut self, body: Box<dyn Statement>) -> Self {
        self.default = Some(body);
        self
    }
}

impl Statement for Switch {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        let subject = match self.subject.evaluate(ctx) {
            Ok(subject) => subject,
            Err(err) => return err.into(),
        };

        let body = self
            .cases
            .iter()
            .find(|(value, _)| *value == subject)
            .map(|(_, body)| body)
            .or(self.default.as_ref());

        match body.map(|body| body.execute(ctx)) {
            None | Some(StatementResult::Break) => StatementResult::Normal,
            Some(other) => other,
        }
    }

    fn is_return_or_contains_return_on_all_branches(&self) -> bool {
        let Some(default) = &self.default else {
            return false;
        };
        default.is_return_or_contains_return_on_all_branches()
            && self
                .cases
                .iter()
                .all(|(_, body)| body.is_return_or_contains_return_on_all_branches())
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        self.subject.check(checker)?;
        let subject = self.subject.return_type().without_literal();
        for (value, body) in &self.cases {
            if !value.prog_type().compatible_with(&subject) {
                return Err(format!("Case {} cannot match a {}", value, subject));
            }
            checker.in_switch(|checker| body.check(checker))?;
        }
        match &self.default {
            Some(body) => checker.in_switch(|checker| body.check(checker)),
            None => Ok(()),
        }
    }
}

/// Leave the program
#[derive(Debug)]
pub struct Return {
    value: Option<Box<dyn Function>>,
}

impl Return {
    pub fn value(value: Box<dyn Function>) -> Self {
        Self { value: Some(value) }
    }

    pub fn void() -> Self {
        Self { value: None }
    }
}

impl Statement for Return {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        match &self.value {
            None => StatementResult::Return(None),
            Some(function) => match function.evaluate(ctx) {
                Ok(value) => StatementResult::Return(Some(value)),
                Err(err) => err.into(),
            },
        }
    }

    fn is_return_or_contains_return_on_all_branches(&self) -> bool {
        true
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        let expected = checker.return_type().clone().without_literal();
        match &self.value {
            None if expected.is_void() => Ok(()),
            None => Err(format!("Return needs a value of type {}", expected)),
            Some(_) if expected.is_void() => {
                Err("A Void program cannot return a value".to_string())
            }
            Some(function) => {
                function.check(checker)?;
                expect_type(function.as_ref(), &expected, "Return value")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Break;

impl Statement for Break {
    fn execute(&self, _ctx: &mut ExecutionContext) -> StatementResult {
        StatementResult::Break
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        if checker.can_break() {
            Ok(())
        } else {
            Err("Break outside of a loop or switch".to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Continue;

impl Statement for Continue {
    fn execute(&self, _ctx: &mut ExecutionContext) -> StatementResult {
        StatementResult::Continue
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        if checker.can_continue() {
            Ok(())
        } else {
            Err("Continue outside of a loop".to_string())
        }
    }
}
