// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use bloblang::unstable::ExtensionFcn;
use bloblang::*;

fn check_example(owner: &str, example: &Example) -> Result<()> {
    let mapping = match Mapping::parse(owner, &example.mapping) {
        Ok(m) => m,
        Err(e) => bail!("example of `{owner}` failed to parse: {e}\n{}", example.mapping),
    };
    for (input, output) in &example.results {
        let got = match mapping.exec(&Value::from_json_str(input)?) {
            Ok(v) => v,
            Err(e) => bail!("example of `{owner}` failed on {input}: {e}"),
        };
        // Bytes results are compared through their JSON form.
        let got = Value::from_json_str(&serde_json::to_string(&got)?)?;
        let want = Value::from_json_str(output)?;
        if got != want {
            bail!(
                "example of `{owner}` on {input}\n  mapping: {}\n  got:  {got}\n  want: {want}",
                example.mapping
            );
        }
    }
    Ok(())
}

#[test]
fn function_examples_hold() -> Result<()> {
    let registry = Registry::with_builtins()?;
    for spec in registry.function_docs_all() {
        for example in &spec.examples {
            if spec.impure {
                // Only check that the example parses.
                Mapping::parse(&spec.name, &example.mapping)?;
                continue;
            }
            check_example(&spec.name, example)?;
        }
    }
    Ok(())
}

#[test]
fn method_examples_hold() -> Result<()> {
    let registry = Registry::with_builtins()?;
    let mut checked = 0;
    for spec in registry.method_docs_all() {
        for example in spec.all_examples() {
            check_example(&spec.name, example)?;
            checked += example.results.len();
        }
    }
    assert!(checked > 50, "only {checked} example results");
    Ok(())
}

#[test]
fn impure_functions_are_flagged() -> Result<()> {
    let registry = Registry::with_builtins()?;
    for name in ["env", "hostname", "now", "timestamp_unix", "uuid_v4", "random_int"] {
        let Some(spec) = registry.function(name) else {
            bail!("missing function `{name}`");
        };
        assert!(spec.impure, "`{name}` should be impure");
    }
    for name in ["deleted", "range", "meta", "throw"] {
        let Some(spec) = registry.function(name) else {
            bail!("missing function `{name}`");
        };
        assert!(!spec.impure, "`{name}` should be pure");
    }

    let pure = registry.only_pure();
    assert!(pure.function("now").is_none());
    assert!(pure.function("deleted").is_some());
    Ok(())
}

#[test]
fn duplicate_names_are_rejected() -> Result<()> {
    let mut registry = Registry::with_builtins()?;
    let noop: ExtensionFcn = Rc::new(|_: &[Value]| -> Result<Value> { Ok(Value::Null) });
    let r = registry.register_extension("deleted", FunctionCategory::General, "", &[], noop);
    assert_eq!(
        r,
        Err(RegistryError::AlreadyExists {
            name: "deleted".to_string(),
            registry: "function".to_string(),
        })
    );
    Ok(())
}

#[test]
fn invalid_names_are_rejected() {
    let mut registry = Registry::new();
    for name in ["", "9lives", "with-dash", "has space"] {
        let noop: ExtensionFcn = Rc::new(|_: &[Value]| -> Result<Value> { Ok(Value::Null) });
        let r = registry.register_extension(name, FunctionCategory::General, "", &[], noop);
        assert!(
            matches!(r, Err(RegistryError::InvalidName { .. })),
            "`{name}` was accepted"
        );
    }
    assert!(registry.function_docs_all().is_empty());
}

fn with_double() -> Result<Environment> {
    let mut registry = Registry::with_builtins()?;
    let double: ExtensionFcn = Rc::new(|args: &[Value]| -> Result<Value> {
        let n = args[0].as_number()?;
        Ok(Value::from(n.mul(&Number::from(2))))
    });
    registry.register_extension(
        "double",
        FunctionCategory::General,
        "Doubles a number.",
        &["n"],
        double,
    )?;
    Ok(Environment::with_registry(registry))
}

#[test]
fn extension_functions_are_callable() -> Result<()> {
    let env = with_double()?;
    let mapping = env.parse_mapping("ext", "root.twice = double(this.n)")?;
    let out = mapping.exec(&Value::from_json_str(r#"{"n":4}"#)?)?;
    assert_eq!(out, Value::from_json_str(r#"{"twice":8}"#)?);

    let spec = env.registry().function("double");
    assert_eq!(spec.map(|s| s.arity()), Some((1, Some(1))));

    // The default environment does not see it.
    let e = Mapping::parse("ext", "root = double(1)").err();
    assert_eq!(
        e.map(|e| e.message),
        Some("unrecognised function `double`".to_string())
    );
    Ok(())
}

#[test]
fn extension_failures_name_the_function() -> Result<()> {
    let env = with_double()?;
    let mapping = env.parse_mapping("ext", "root = double(this.n)")?;
    let Err(e) = mapping.exec(&Value::from_json_str(r#"{"n":"four"}"#)?) else {
        bail!("doubling a string succeeded");
    };
    assert_eq!(e.kind(), ErrorKind::Function);
    assert_eq!(e.message(), "`double` failed: not a number");
    let pos = e.position();
    assert_eq!((pos.line, pos.col), (1, 8));
    Ok(())
}

#[test]
fn extension_arity_is_checked_when_parsing() -> Result<()> {
    let env = with_double()?;
    let Err(e) = env.parse_mapping("ext", "root = double()") else {
        bail!("missing argument accepted");
    };
    assert_eq!(e.message, "`double` expects 1 argument, got 0");
    assert_eq!((e.line, e.col), (1, 8));
    Ok(())
}

#[test]
fn removed_functions_fail_to_parse() -> Result<()> {
    let env = Environment::new().without_functions(&["hostname", "env"]);
    assert!(env.registry().function("hostname").is_none());
    assert!(env.registry().function("now").is_some());
    let Err(e) = env.parse_mapping("restricted", "root.host = hostname()") else {
        bail!("removed function accepted");
    };
    assert_eq!(e.message, "unrecognised function `hostname`");
    assert_eq!(e.col, 13);

    let registry = Registry::with_builtins()?.without_methods(&["uppercase"]);
    let env = Environment::with_registry(registry);
    assert!(env.parse_mapping("m", "root = this.uppercase()").is_err());
    assert!(env.parse_mapping("m", "root = this.lowercase()").is_ok());
    Ok(())
}

#[test]
fn docs_leave_out_hidden_and_deprecated() -> Result<()> {
    let registry = Registry::with_builtins()?;
    let names = |specs: Vec<FunctionSpec>| specs.into_iter().map(|s| s.name).collect::<Vec<_>>();

    let documented = names(registry.function_docs());
    assert!(documented.contains(&"deleted".to_string()));
    assert!(!documented.contains(&"var".to_string()));
    assert!(!documented.contains(&"timestamp".to_string()));

    let all = names(registry.function_docs_all());
    assert!(all.contains(&"var".to_string()));
    assert!(all.contains(&"timestamp".to_string()));

    let methods: Vec<String> = registry.method_docs().into_iter().map(|s| s.name).collect();
    assert!(methods.contains(&"uppercase".to_string()));
    assert!(!methods.contains(&"upper".to_string()));
    assert!(!methods.contains(&"replace".to_string()));
    Ok(())
}

#[test]
fn category_listings() -> Result<()> {
    let registry = Registry::with_builtins()?;
    let message: Vec<String> = registry
        .functions_for_category(FunctionCategory::Message)
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert!(message.contains(&"meta".to_string()));
    assert!(message.contains(&"batch_index".to_string()));
    assert!(!message.contains(&"now".to_string()));

    // `contains` is listed twice with a description per category.
    let strings = registry.methods_for_category(MethodCategory::Strings);
    let Some(contains) = strings.iter().find(|s| s.name == "contains") else {
        bail!("`contains` is not a string method");
    };
    assert_eq!(contains.description, "Checks whether a string contains a substring.");
    let objects = registry.methods_for_category(MethodCategory::ObjectAndArray);
    let Some(contains) = objects.iter().find(|s| s.name == "contains") else {
        bail!("`contains` is not an object method");
    };
    assert!(contains.description.starts_with("Checks whether an array contains"));

    let general: Vec<String> = registry
        .general_methods()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert!(general.contains(&"catch".to_string()));
    assert!(!general.contains(&"upper".to_string()));
    assert!(!general.contains(&"contains".to_string()));

    assert_eq!(FunctionCategory::Message.to_string(), "Message Info");
    assert_eq!(MethodCategory::ObjectAndArray.name(), "Object & Array Manipulation");
    assert_eq!(MethodCategory::Encoding.name(), "Encoding and Encryption");
    Ok(())
}

#[test]
fn docs_serialize_without_implementations() -> Result<()> {
    let registry = Registry::with_builtins()?;
    let Some(range) = registry.function("range") else {
        bail!("missing `range`");
    };
    let json = serde_json::to_value(range.as_ref())?;
    assert_eq!(json["name"], "range");
    assert_eq!(json["category"], "General");
    assert_eq!(json["status"], "stable");
    assert!(json.get("fcn").is_none());
    assert_eq!(json["params"].as_array().map(|p| p.len()), Some(3));
    Ok(())
}

#[test]
fn deprecated_calls_are_linted() {
    assert_eq!(
        lint_mapping(r#"root = this.replace("a", "b")"#),
        vec![Lint {
            line: 1,
            column: 13,
            message: "method `replace` is deprecated".to_string(),
        }]
    );
    assert_eq!(
        lint_mapping("root.a = 1\nroot.b = timestamp()"),
        vec![Lint {
            line: 2,
            column: 10,
            message: "function `timestamp` is deprecated".to_string(),
        }]
    );
    assert!(lint_mapping(r#"root = this.replace_all("a", "b")"#).is_empty());
}

#[test]
fn parse_failures_are_linted() -> Result<()> {
    let lints = lint_mapping("root = this.foo\nroot.bar = this.(");
    assert_eq!(lints.len(), 1);
    assert_eq!((lints[0].line, lints[0].column), (2, 18));

    let env = with_double()?;
    assert!(lint_mapping_with(&env, "root = double(2)").is_empty());
    assert_eq!(lint_mapping("root = double(2)").len(), 1);
    Ok(())
}
