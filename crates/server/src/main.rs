//! Progs - scripting engine host
//!
//! Runs the startup phase (registry, catalogue, register) and executes the
//! demonstration programs under the configured budgets.

mod demo;
mod runner;
mod world;

use anyhow::Context;
use progs_config::EngineConfig;
use progs_core::{ElementKind, TypeDescriptor};
use progs_register::VariableRegister;
use progs_scripting::{
    BuiltinCatalog, DotReferenceRegistryBuilder, Gender, HostObject, ProgramCatalog, Value,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use world::Character;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = EngineConfig::load_default();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Progs host starting up...");
    match loaded {
        Ok(_) => info!("✓ Configuration loaded from {}", progs_config::DEFAULT_CONFIG_PATH),
        Err(e) => {
            warn!("⚠️  Failed to load {}: {}", progs_config::DEFAULT_CONFIG_PATH, e);
            warn!("   Using default configuration");
        }
    }
    config.display();

    // Startup phase: everything below is frozen before the first program runs
    let mut registry =
        DotReferenceRegistryBuilder::with_builtin_kinds().context("registering value kinds")?;
    registry
        .register_host::<Character>(ElementKind::Character)
        .context("registering characters")?;
    let registry = registry.build();

    let register = Arc::new(VariableRegister::new());
    register.register_variable(
        ElementKind::Character,
        TypeDescriptor::NUMBER,
        "reputation",
        Value::Number(0.0),
    );

    let mut builtins = BuiltinCatalog::new();
    progs_register::install_builtins(&mut builtins, Arc::clone(&register));
    let catalog = Arc::new(ProgramCatalog::new(builtins));

    for mut program in demo::programs(&registry, &catalog).context("building demo programs")? {
        if !program.compile() {
            if config.log_compile_errors {
                error!(
                    "Program {} failed to compile: {}",
                    program.name(),
                    program.compile_error().unwrap_or("unknown error")
                );
            }
            continue;
        }
        let program = catalog.add_program(program)?;
        info!("✓ Compiled {} ({})", program.name(), program.parameters());
    }

    let bob: Arc<dyn HostObject> = Arc::new(Character::new(1, "Bob", Gender::Male, 3));
    let runs: Vec<(&str, Vec<Value>)> = vec![
        ("greet", vec![Value::Host(Arc::clone(&bob))]),
        ("sumto", vec![Value::Number(10.0)]),
        ("honour", vec![Value::Host(Arc::clone(&bob)), Value::Number(42.0)]),
        ("spin", vec![]),
    ];

    for (name, args) in runs {
        let catalog = Arc::clone(&catalog);
        let timeout = config.execution_timeout();
        match runner::execute_bounded(catalog, name, args, config.limits(), timeout).await {
            Ok(value) => info!("{} -> {}", name, value),
            Err(e) => warn!("{} aborted: {:#}", name, e),
        }
    }

    if let Some(reputation) = register.get_value(bob.as_ref(), "reputation") {
        info!("{}'s reputation is now {}", bob.name(), reputation);
    }

    info!("👋 Progs host shutting down");
    Ok(())
}
