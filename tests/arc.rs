// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "arc")]

use lazy_static::lazy_static;
use std::thread;

use bloblang::*;

// Ensure that compiled artifacts can be shared across threads.
lazy_static! {
    static ref VALUE: Value = Value::Null;
    static ref MAPPING: Mapping = match Mapping::parse(
        "shared",
        "root.id = this.id.uppercase()\nroot.index = batch_index()",
    ) {
        Ok(m) => m,
        Err(e) => panic!("{e}"),
    };
    static ref ENVIRONMENT: Environment = Environment::new().only_pure();
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn compiled_types_are_send_and_sync() {
    assert_send_sync::<Mapping>();
    assert_send_sync::<Field>();
    assert_send_sync::<Environment>();
    assert_send_sync::<Registry>();
    assert_send_sync::<Value>();
    assert_send_sync::<Message>();
}

#[test]
fn shared_mapping() -> anyhow::Result<()> {
    let handles: Vec<_> = (0..4)
        .map(|n| {
            thread::spawn(move || {
                let input = Value::from_json_str(&format!(r#"{{"id":"doc-{n}"}}"#))?;
                let out = MAPPING.exec(&input)?;
                anyhow::Ok(out)
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let out = match handle.join() {
            Ok(r) => r?,
            Err(_) => anyhow::bail!("mapping thread panicked"),
        };
        assert_eq!(out["id"], Value::from(format!("DOC-{n}")));
        assert_eq!(out["index"], Value::from(0));
    }
    assert!(VALUE.is_null());
    Ok(())
}

#[test]
fn shared_environment() -> anyhow::Result<()> {
    let field = thread::spawn(|| ENVIRONMENT.parse_field("${! this.name }-${! batch_size() }"))
        .join()
        .map_err(|_| anyhow::anyhow!("parsing thread panicked"))??;

    let batch = [Message::new(Value::from_json_str(r#"{"name":"x"}"#)?)];
    assert_eq!(field.string(0, &batch), "x-1");
    assert!(ENVIRONMENT.parse_mapping("impure", "root = now()").is_err());
    Ok(())
}
