use std::hint::black_box;

use bloblang::{Field, Mapping, Message, Value};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

fn mapping(source: &str) -> Mapping {
    Mapping::parse("bench.blobl", source).unwrap()
}

fn document(n: usize) -> Value {
    let items = (0..n)
        .map(|i| json!({"id": format!("item-{i}"), "price": i as f64 * 1.5, "tags": ["a", "b"]}))
        .collect::<Vec<_>>();
    Value::from_json_str(&json!({"user": {"name": "admin"}, "items": items}).to_string()).unwrap()
}

fn simple_mappings(c: &mut Criterion) {
    let input = document(4);

    c.bench_function("copy a field", |b| {
        let m = mapping("root.name = this.user.name");
        b.iter(|| m.exec(black_box(&input)).unwrap())
    });

    c.bench_function("method chain", |b| {
        let m = mapping(r#"root.name = this.user.name.uppercase().replace_all("A", "4").length()"#);
        b.iter(|| m.exec(black_box(&input)).unwrap())
    });

    c.bench_function("mutate in place", |b| {
        let m = mapping("root.user.name = this.user.name.uppercase()\nroot.items = deleted()");
        b.iter(|| {
            let mut doc = input.clone();
            m.exec_mut(black_box(&mut doc)).unwrap();
            doc
        })
    });
}

fn array_mappings(c: &mut Criterion) {
    let mut group = c.benchmark_group("array mappings");
    for size in [16, 128, 1024].iter() {
        let input = document(*size);

        group.bench_with_input(BenchmarkId::new("map_each", size), size, |b, _| {
            let m = mapping("root.ids = this.items.map_each(item -> item.id.uppercase())");
            b.iter(|| m.exec(black_box(&input)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("filter and sum", size), size, |b, _| {
            let m = mapping(
                "root.total = this.items.filter(item -> item.price > 10).map_each(item -> item.price).sum()",
            );
            b.iter(|| m.exec(black_box(&input)).unwrap())
        });
    }
    group.finish();
}

fn parsing(c: &mut Criterion) {
    let source = r#"
root.id = this.id.string().catch("unknown")
root.name = this.user.name.trim().lowercase()
root.tags = this.tags.filter(t -> t != "internal").sort()
root.kind = match this.kind {
  "a" => "first"
  "b" => "second"
  _ => "other"
}
meta topic = "out"
"#;
    c.bench_function("parse mapping", |b| {
        b.iter(|| Mapping::parse("bench.blobl", black_box(source)).unwrap())
    });
}

fn interpolation(c: &mut Criterion) {
    let field =
        Field::parse("${! this.user.name }-${! batch_index() }-${! meta(\"topic\") }").unwrap();
    let batch = vec![Message::new(document(1)).with_metadata("topic", "events")];
    c.bench_function("interpolate field", |b| {
        b.iter(|| field.string(0, black_box(&batch)))
    });
}

criterion_group!(
    benches,
    simple_mappings,
    array_mappings,
    parsing,
    interpolation
);
criterion_main!(benches);
