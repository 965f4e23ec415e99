use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgdao::{
    Field, Query, STOP_PREFIX, Value, expand_array_params, flatten_row, renumber_placeholders,
    start_prefix,
};

/// Build a joined row with `n` prefixed sub-entities of four columns each:
/// id, text, [prefix__e0_, id, name, created, _prefix__end], ...
fn build_joined_row(n: usize) -> (Vec<Field>, Vec<Value>) {
    let mut fields = vec![Field::new("id"), Field::new("text")];
    let mut values = vec![Value::Int(1), Value::text("root")];
    for i in 0..n {
        fields.push(Field::new(start_prefix(&format!("e{i}_"))));
        values.push(Value::text(""));
        for col in ["id", "name", "created"] {
            fields.push(Field::new(col));
            values.push(Value::text(format!("{col}{i}")));
        }
        fields.push(Field::new(STOP_PREFIX));
        values.push(Value::text(""));
    }
    (fields, values)
}

fn bench_flatten_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten/flatten_row");

    for n in [0, 1, 5, 20] {
        let row = build_joined_row(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &row, |b, (fields, values)| {
            b.iter(|| black_box(flatten_row(fields, values)));
        });
    }

    group.finish();
}

fn bench_renumber(c: &mut Criterion) {
    let mut group = c.benchmark_group("params/renumber_placeholders");

    for n in [1, 10, 100] {
        let sql = (1..=n)
            .map(|i| format!("col{i} = ${i}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        group.bench_with_input(BenchmarkId::from_parameter(n), &sql, |b, sql| {
            b.iter(|| black_box(renumber_placeholders(sql, 7)));
        });
    }

    group.finish();
}

fn bench_expand_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("params/expand_array_params");

    for n in [5, 20, 100, 500] {
        let existing = vec![Value::Int(0); 3];
        let values: Vec<Value> = (0..n).map(Value::Int).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| black_box(expand_array_params(existing.as_slice(), values.iter().cloned())));
        });
    }

    group.finish();
}

fn bench_query_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("query/compose");

    for n in [1, 5, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut q = Query::new("bench", "SELECT * FROM t WHERE a = $1").bind(1_i64);
                for i in 0..n {
                    q = q.append(Query::new("f", " AND b = $1 AND c = $2").bind(i as i64).bind("x"));
                }
                q = q.push(" AND id IN (").push_array(0..n as i64).push(")");
                black_box(q.validate())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_flatten_row,
    bench_renumber,
    bench_expand_array,
    bench_query_compose
);
criterion_main!(benches);
