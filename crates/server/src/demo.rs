//! Demonstration programs
//!
//! Statement trees are assembled directly; the host has no source parser.

use progs_core::{ElementKind, TypeDescriptor};
use progs_scripting::statement::{
    Assign, Block, Constant, Declare, DotReference, ForRange, Return, VariableReference, While,
};
use progs_scripting::{DotReferenceRegistry, Function, Program, ProgramCatalog, Result, Value};

fn text(value: &str) -> Box<dyn Function> {
    Box::new(Constant::literal(Value::from(value)))
}

fn number(value: f64) -> Box<dyn Function> {
    Box::new(Constant::literal(Value::Number(value)))
}

fn variable(name: &str, ty: TypeDescriptor) -> Box<dyn Function> {
    Box::new(VariableReference::new(name, ty))
}

fn character() -> TypeDescriptor {
    TypeDescriptor::scalar(ElementKind::Character)
}

/// `Text greet(Character who)`: "Hello, <name>!"
fn greet(registry: &DotReferenceRegistry, catalog: &ProgramCatalog) -> Result<Program> {
    let name = DotReference::new(registry, variable("who", character()), "Name")?;
    let tail = catalog.build_call("add", vec![Box::new(name), text("!")])?;
    let greeting = catalog.build_call("add", vec![text("Hello, "), tail])?;

    Ok(Program::builder("greet")
        .category("Demo")
        .parameter("who", character())
        .returns(TypeDescriptor::TEXT)
        .body(Box::new(Return::value(greeting)))
        .build())
}

/// `Number sumto(Number n)`: 1 + 2 + ... + n
fn sum_to(catalog: &ProgramCatalog) -> Result<Program> {
    let total = || variable("total", TypeDescriptor::NUMBER);
    let step = catalog.build_call("add", vec![total(), variable("i", TypeDescriptor::NUMBER)])?;

    Ok(Program::builder("sumto")
        .category("Demo")
        .parameter("n", TypeDescriptor::NUMBER)
        .returns(TypeDescriptor::NUMBER)
        .body(Box::new(Block::new(vec![
            Box::new(Declare::new("total", TypeDescriptor::NUMBER, Some(number(0.0)))),
            Box::new(ForRange::new(
                "i",
                number(1.0),
                variable("n", TypeDescriptor::NUMBER),
                Box::new(Assign::new("total", step)),
            )),
            Box::new(Return::value(total())),
        ])))
        .build())
}

/// `Boolean honour(Character who, Number amount)`: stores the reputation register variable
fn honour(catalog: &ProgramCatalog) -> Result<Program> {
    let store = catalog.build_call(
        "setregister",
        vec![
            variable("who", character()),
            text("reputation"),
            variable("amount", TypeDescriptor::NUMBER),
        ],
    )?;

    Ok(Program::builder("honour")
        .category("Demo")
        .parameter("who", character())
        .parameter("amount", TypeDescriptor::NUMBER)
        .returns(TypeDescriptor::BOOLEAN)
        .body(Box::new(Return::value(store)))
        .build())
}

/// `Void spin()`: never terminates on its own
fn spin() -> Program {
    Program::builder("spin")
        .category("Demo")
        .body(Box::new(While::new(
            Box::new(Constant::literal(Value::Boolean(true))),
            Box::new(Block::new(vec![])),
        )))
        .build()
}

/// Every demonstration program, not yet compiled
pub fn programs(registry: &DotReferenceRegistry, catalog: &ProgramCatalog) -> Result<Vec<Program>> {
    Ok(vec![greet(registry, catalog)?, sum_to(catalog)?, honour(catalog)?, spin()])
}
