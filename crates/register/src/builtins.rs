//! Script access to the variable register

use crate::register::VariableRegister;
use progs_core::TypeDescriptor;
use progs_scripting::{
    BuiltinCatalog, BuiltinDefinition, HostObject, Parameter, Parameters, Result, ScriptError,
        Value,
};
use std::sync::Arc;

const CATEGORY: &str = "Register";

/// Add `getregister` and `setregister` to `catalog`
///
/// `getregister(thing, name)` returns the variable's value on `thing`, or a
/// null when the variable is not registered for its kind.
/// `setregister(thing, name, value)` returns whether the value was stored.
pub fn install_builtins(catalog: &mut BuiltinCatalog, register: Arc<VariableRegister>) {
    let reader = Arc::clone(&register);
    catalog.register(BuiltinDefinition::new(
        "getregister",
        Parameters::Positional(vec![
            Parameter::new("thing", TypeDescriptor::REFERENCE_TYPE),
            Parameter::new("name", TypeDescriptor::TEXT),
        ]),
        TypeDescriptor::COLLECTION_ITEM,
        CATEGORY,
        "Reads a builder-declared register variable from a thing.",
        Arc::new(move |args: &[Value]| {
            let object = thing(args, "getregister")?;
            let name = arg(args, 1)?.as_text().unwrap_or_default();
            Ok(reader
                .get_value(object.as_ref(), name)
                .unwrap_or_else(|| Value::null(TypeDescriptor::COLLECTION_ITEM)))
        }),
    ));

    let writer = register;
    catalog.register(BuiltinDefinition::new(
        "setregister",
        Parameters::Positional(vec![
            Parameter::new("thing", TypeDescriptor::REFERENCE_TYPE),
            Parameter::new("name", TypeDescriptor::TEXT),
            Parameter::new("value", TypeDescriptor::COLLECTION_ITEM),
        ]),
        TypeDescriptor::BOOLEAN,
        CATEGORY,
        "Stores a value in a builder-declared register variable on a thing. \
         Returns false if the variable is unknown or the value has the wrong type.",
        Arc::new(move |args: &[Value]| {
            let object = thing(args, "setregister")?;
            let name = arg(args, 1)?.as_text().unwrap_or_default();
            let value = arg(args, 2)?.clone();
            Ok(Value::Boolean(writer.set_value(object.as_ref(), name, value)))
        }),
    ));

    tracing::debug!("Installed register built-ins");
}

fn arg(args: &[Value], index: usize) -> Result<&Value> {
    args.get(index)
        .ok_or_else(|| ScriptError::runtime(format!("Missing argument {}", index + 1)))
}

fn thing<'a>(args: &'a [Value], function: &str) -> Result<&'a Arc<dyn HostObject>> {
    arg(args, 0)?
        .as_host()
        .ok_or_else(|| ScriptError::runtime(format!("{} called on a null thing", function)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::tests::TestCharacter;
    use progs_core::ElementKind;
    use progs_scripting::ProgramCatalog;

    fn setup() -> (Arc<VariableRegister>, ProgramCatalog) {
        let register = Arc::new(VariableRegister::new());
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "reputation",
            Value::Number(0.0),
        );

        let mut builtins = BuiltinCatalog::new();
        install_builtins(&mut builtins, Arc::clone(&register));
        (register, ProgramCatalog::new(builtins))
    }

    fn bob() -> Value {
        let character: Arc<dyn HostObject> = Arc::new(TestCharacter { id: 11 });
        Value::Host(character)
    }

    #[test]
    fn test_get_and_set_through_catalog() {
        let (register, catalog) = setup();
        let limits = Default::default();

        let stored = catalog
            .call("setregister", &[bob(), "Reputation".into(), Value::Number(42.0)], limits)
            .unwrap();
        assert_eq!(stored, Value::Boolean(true));
        assert_eq!(
            register.get_value_by_id(ElementKind::Character, 11, "reputation"),
            Some(Value::Number(42.0))
        );

        let read = catalog.call("getregister", &[bob(), "reputation".into()], limits).unwrap();
        assert_eq!(read, Value::Number(42.0));
    }

    #[test]
    fn test_failures_are_routine() {
        let (_, catalog) = setup();
        let limits = Default::default();

        let wrong_type = catalog
            .call("setregister", &[bob(), "reputation".into(), "high".into()], limits)
            .unwrap();
        assert_eq!(wrong_type, Value::Boolean(false));

        let unknown = catalog.call("getregister", &[bob(), "karma".into()], limits).unwrap();
        assert!(unknown.is_null());
    }

    #[test]
    fn test_short_argument_list_is_an_error() {
        let mut builtins = BuiltinCatalog::empty();
        install_builtins(&mut builtins, Arc::new(VariableRegister::new()));

        let get = &builtins.overloads("getregister")[0];
        assert!(matches!(get.invoke(&[bob()]), Err(ScriptError::Runtime(_))));
        assert!(get.invoke(&[]).is_err());

        let set = &builtins.overloads("setregister")[0];
        assert!(matches!(set.invoke(&[bob(), "reputation".into()]), Err(ScriptError::Runtime(_))));
    }

    #[test]
    fn test_null_thing_is_a_runtime_error() {
        let (_, catalog) = setup();
        let result = catalog.call(
            "getregister",
            &[Value::null(TypeDescriptor::scalar(ElementKind::Character)), "reputation".into()],
            Default::default(),
        );
        assert!(result.is_err());
    }
}
