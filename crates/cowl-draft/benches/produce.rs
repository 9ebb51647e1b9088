use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use cowl_draft::produce;
use cowl_graph::{Heap, Value};
use cowl_test_utils::{selection, wide_tree};

fn bench_no_op_produce(c: &mut Criterion) {
    c.bench_function("produce_no_op_wide_tree", |b| {
        b.iter_batched(
            || {
                let mut heap = Heap::new();
                let root = wide_tree(&mut heap, 4, 4);
                (heap, root)
            },
            |(mut heap, root)| black_box(produce(&mut heap, Value::Node(root), |_, _| Ok(None))),
            BatchSize::SmallInput,
        )
    });
}

fn bench_deep_write(c: &mut Criterion) {
    c.bench_function("produce_deep_write_wide_tree", |b| {
        b.iter_batched(
            || {
                let mut heap = Heap::new();
                let root = wide_tree(&mut heap, 4, 4);
                (heap, root)
            },
            |(mut heap, root)| {
                black_box(produce(&mut heap, Value::Node(root), |s, d| {
                    let mut node = d;
                    for _ in 0..4 {
                        node = s.child(node, "c0")?;
                    }
                    s.set(node, "depth", Value::from(-1))?;
                    Ok(None)
                }))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_shared_write(c: &mut Criterion) {
    c.bench_function("produce_shared_item_write", |b| {
        b.iter_batched(
            || {
                let mut heap = Heap::new();
                let fixture = selection(&mut heap);
                (heap, fixture.root)
            },
            |(mut heap, root)| {
                black_box(produce(&mut heap, Value::Node(root), |s, d| {
                    let all = s.child(d, "all")?;
                    let item = s.child(all, 2usize)?;
                    s.set(item, "value", Value::from(6))?;
                    Ok(None)
                }))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_no_op_produce, bench_deep_write, bench_shared_write);
criterion_main!(benches);
