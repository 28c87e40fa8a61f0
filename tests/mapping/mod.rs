// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{anyhow, bail, Result};
use bloblang::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use test_generator::test_resources;
use walkdir::WalkDir;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
enum Mode {
    #[default]
    Map,
    Mutate,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    mapping: String,
    #[serde(default)]
    input: Value,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    mode: Mode,
    want_result: Option<Value>,
    #[serde(default)]
    want_deleted: bool,
    want_metadata: Option<BTreeMap<String, String>>,
    error: Option<String>,
    skip: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn run_case(case: &TestCase) -> Result<()> {
    let mapping = Mapping::parse(&case.note, &case.mapping)?;
    let mut message = Message::new(case.input.clone());
    message.metadata = case.metadata.clone();
    let mut batch = [message];

    let result = match case.mode {
        Mode::Map => mapping.map_part(0, &batch),
        Mode::Mutate => mapping.mutate_part(0, &mut batch).map(|kept| match kept {
            true => Some(batch[0].clone()),
            false => None,
        }),
    };

    match (result, &case.error) {
        (Ok(output), None) => {
            match (&output, case.want_deleted) {
                (None, true) => return Ok(()),
                (Some(m), true) => bail!("expected the message to be deleted, got {}", m.value),
                (None, false) => bail!("message was unexpectedly deleted"),
                (Some(_), false) => (),
            }
            let output = output.ok_or_else(|| anyhow!("missing output"))?;
            if let Some(want) = &case.want_result {
                if &output.value != want {
                    bail!(
                        "result mismatch\n  got: {}\n want: {}",
                        output.value,
                        want
                    );
                }
            }
            if let Some(want) = &case.want_metadata {
                assert_eq!(&output.metadata, want, "metadata mismatch");
            }
        }
        (Ok(output), Some(e)) => bail!("expected error `{e}`, got {output:?}"),
        (Err(actual), None) => bail!("{}", mapping.describe_error(&actual)),
        (Err(actual), Some(expected)) => {
            let actual = actual.to_string();
            if !actual.contains(expected.as_str()) {
                bail!("Error message\n`{actual}`\ndoes not contain `{expected}`");
            }
        }
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");

    for case in &test.cases {
        print!("case {} ", case.note);
        if case.skip == Some(true) {
            println!("skipped");
            continue;
        }
        run_case(case)?;
        println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
fn run_mapping_tests() -> Result<()> {
    let mut nfailures = 0;
    for entry in WalkDir::new("tests/mapping/cases") {
        let entry = entry?;
        let path = entry.path().to_string_lossy();
        if !path.ends_with(".yaml") {
            continue;
        }
        if let Err(e) = yaml_test_impl(&path) {
            println!("failed {path}: {e}");
            nfailures += 1;
        }
    }
    assert_eq!(nfailures, 0, "{nfailures} yaml file(s) failed");
    Ok(())
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let Some(file) = env::args().find(|a| a.ends_with(".yaml")) else {
        bail!("missing yaml test file");
    };

    yaml_test(file.as_str())
}

#[test_resources("tests/mapping/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

fn json(s: &str) -> Value {
    Value::from_json_str(s).unwrap()
}

#[test]
fn mapping_reads_the_original_input() -> Result<()> {
    let mapping = Mapping::parse("swap", "root.a = this.b\nroot.b = this.a")?;
    let input = json(r#"{"a":1,"b":2}"#);
    assert_eq!(mapping.exec(&input)?, json(r#"{"a":2,"b":1}"#));
    Ok(())
}

#[test]
fn mutation_observes_earlier_writes() -> Result<()> {
    let mapping = Mapping::parse("swap", "root.a = this.b\nroot.b = this.a")?;
    let mut doc = json(r#"{"a":1,"b":2}"#);
    mapping.exec_mut(&mut doc)?;
    assert_eq!(doc, json(r#"{"a":2,"b":2}"#));
    Ok(())
}

#[test]
fn mapping_leaves_the_input_untouched() -> Result<()> {
    let mapping = Mapping::parse(
        "copy",
        "root = this\nroot.nested.added = true\nroot.list = this.list.append(4)",
    )?;
    let input = json(r#"{"nested":{"x":1},"list":[1,2,3]}"#);
    let before = input.clone();
    let output = mapping.exec(&input)?;
    assert_eq!(input, before);
    assert_eq!(
        output,
        json(r#"{"nested":{"x":1,"added":true},"list":[1,2,3,4]}"#)
    );
    Ok(())
}

#[test]
fn deleted_removes_the_key() -> Result<()> {
    let mapping = Mapping::parse("delete", "root.a = this.a\nroot.b = deleted()")?;
    assert_eq!(mapping.exec(&json(r#"{"a":1,"b":2}"#))?, json(r#"{"a":1}"#));
    Ok(())
}

#[test]
fn catch_replaces_a_missing_field() -> Result<()> {
    let with_catch = Mapping::parse("catch", "root.x = this.missing.catch(42)")?;
    assert_eq!(with_catch.exec(&json("{}"))?, json(r#"{"x":42}"#));

    let without = Mapping::parse("no-catch", "root.x = this.missing")?;
    match without.exec(&json("{}")) {
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::FieldNotFound);
            assert_eq!(e.message(), "field `this.missing` not found");
            assert_eq!((e.position().line, e.position().col), (1, 10));
        }
        Ok(v) => bail!("expected an error, got {v}"),
    }
    Ok(())
}

#[test]
fn execution_is_deterministic() -> Result<()> {
    let mapping = Mapping::parse(
        "det",
        r#"root.keys = this.keys()
root.total = this.values().sum()
root.doubled = this.map_each(kv -> kv.value * 2)"#,
    )?;
    let input = json(r#"{"z":1,"a":2,"m":3}"#);
    let first = mapping.exec(&input)?;
    for _ in 0..10 {
        assert_eq!(mapping.exec(&input)?.to_json_str()?, first.to_json_str()?);
    }
    Ok(())
}

#[test]
fn filter_keeps_order() -> Result<()> {
    let mapping = Mapping::parse("filter", "root = this.filter(n -> n % 2 == 0)")?;
    let out = mapping.exec(&json("[8,3,6,1,2,9,4]"))?;
    assert_eq!(out, json("[8,6,2,4]"));
    Ok(())
}

#[test]
fn identity_round_trips() -> Result<()> {
    let identity = Mapping::parse("identity", "root = this")?;
    let input = json(r#"{"s":"x","n":1.5,"i":-3,"b":true,"z":null,"a":[1,{"k":[]}],"o":{}}"#);
    let once = identity.exec(&input)?;
    let reparsed = Value::from_json_str(&once.to_json_str()?)?;
    let twice = identity.exec(&reparsed)?;
    assert_eq!(once, input);
    assert_eq!(twice, once);
    Ok(())
}

#[test]
fn deleting_root_drops_the_message() -> Result<()> {
    let mapping = Mapping::parse("drop", "root = if this.spam { deleted() } else { this }")?;
    let batch = [Message::new(json(r#"{"spam":true}"#))];
    assert_eq!(mapping.map_part(0, &batch)?, None);
    assert_eq!(mapping.exec(&json(r#"{"spam":true}"#))?, Value::Deleted);

    let mut batch = [Message::new(json(r#"{"spam":false}"#))];
    assert!(mapping.mutate_part(0, &mut batch)?);
    assert_eq!(batch[0].value, json(r#"{"spam":false}"#));
    Ok(())
}

#[test]
fn batch_functions_see_the_whole_batch() -> Result<()> {
    let mapping = Mapping::parse(
        "batch",
        r#"root.index = batch_index()
root.size = batch_size()
root.first = json("id").from(0)
root.next = this.id.from(1)"#,
    )?;
    let batch = [
        Message::new(json(r#"{"id":"a"}"#)),
        Message::new(json(r#"{"id":"b"}"#)),
    ];
    let out = mapping.map_part(1, &batch)?.ok_or_else(|| anyhow!("dropped"))?;
    assert_eq!(
        out.value,
        json(r#"{"index":1,"size":2,"first":"a","next":"b"}"#)
    );

    // A batch of one has no message at index 1.
    match mapping.map_part(0, &batch[..1]) {
        Ok(m) => bail!("expected an error, got {m:?}"),
        Err(e) => assert!(
            e.to_string()
                .contains("`from` failed: message index 1 exceeds the batch size of 1"),
            "{e}"
        ),
    }
    Ok(())
}

#[test]
fn index_outside_the_batch_is_an_error() -> Result<()> {
    let mapping = Mapping::parse("oob", "root = this")?;
    let batch = [Message::new(json("{}"))];
    match mapping.map_part(3, &batch) {
        Ok(m) => bail!("expected an error, got {m:?}"),
        Err(e) => assert!(e.message().contains("exceeds the batch size of 1"), "{e}"),
    }
    Ok(())
}

#[test]
fn metadata_is_copied_and_rewritten() -> Result<()> {
    let mapping = Mapping::parse(
        "meta",
        r#"meta topic = "out-" + meta("topic")
meta partition = 3
meta drop_me = deleted()
root.original = meta("topic")"#,
    )?;
    let batch = [Message::new(json("{}"))
        .with_metadata("topic", "in")
        .with_metadata("drop_me", "x")];

    let out = mapping.map_part(0, &batch)?.ok_or_else(|| anyhow!("dropped"))?;
    assert_eq!(out.value, json(r#"{"original":"in"}"#));
    assert_eq!(out.metadata.get("topic").map(String::as_str), Some("out-in"));
    assert_eq!(out.metadata.get("partition").map(String::as_str), Some("3"));
    assert!(!out.metadata.contains_key("drop_me"));
    // The input message keeps its metadata.
    assert_eq!(batch[0].metadata.get("topic").map(String::as_str), Some("in"));
    Ok(())
}

#[test]
fn errors_render_against_the_source() -> Result<()> {
    let mapping = Mapping::parse("render.blobl", "root.a = 1\nroot.b = this.nope.uppercase()")?;
    let e = match mapping.exec(&json("{}")) {
        Ok(v) => bail!("expected an error, got {v}"),
        Err(e) => e,
    };
    let rendered = mapping.describe_error(&e);
    assert!(rendered.contains("render.blobl:2:10"), "{rendered}");
    assert!(rendered.contains("field `this.nope` not found"), "{rendered}");
    Ok(())
}

#[test]
fn user_errors_from_throw() -> Result<()> {
    let mapping = Mapping::parse(
        "throw",
        r#"root = if this.ok { this } else { throw("not ok") }"#,
    )?;
    match mapping.exec(&json(r#"{"ok":false}"#)) {
        Ok(v) => bail!("expected an error, got {v}"),
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::User);
            assert_eq!(e.message(), "not ok");
        }
    }
    Ok(())
}

#[test]
fn mappings_load_from_files() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("bloblang-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("upper.blobl");
    std::fs::write(&path, "root.name = this.name.uppercase()\n")?;

    let mapping = Mapping::from_file(&path)?;
    assert_eq!(mapping.exec(&json(r#"{"name":"x"}"#))?, json(r#"{"name":"X"}"#));

    std::fs::write(&path, "root.name = this.name.uppercase(\n")?;
    match Mapping::from_file(&path) {
        Ok(_) => bail!("broken mapping parsed"),
        Err(e) => assert!(e.to_string().contains("upper.blobl:2:1"), "{e}"),
    }
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn hostname_is_resolved_once() -> Result<()> {
    let mapping = Mapping::parse("host", "root = hostname()")?;
    let first = mapping.exec(&json("{}")).map_err(|e| e.to_string());
    env::set_var("HOSTNAME", "changed-after-first-use");
    let second = mapping.exec(&json("{}")).map_err(|e| e.to_string());
    assert_eq!(first, second);
    Ok(())
}
