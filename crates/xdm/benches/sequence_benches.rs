use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quarry_xdm::simple_node::{attr, doc, elem, text};
use quarry_xdm::{
    AtomicValue, GroupSpec, GroupedSequence, OrderSpec, OrderedSequence, Sequence, SimpleNode,
    ValueSequence, XdmContext, XdmItem as I, XdmNode, XdmType,
};
use std::hint::black_box;

fn pseudo_random(n: usize) -> Vec<i64> {
    let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            i64::try_from(x % 10_000).unwrap_or_default()
        })
        .collect()
}

fn build_sample_document(sections: usize, items: usize) -> SimpleNode {
    let mut root = elem("root");
    for s in 0..sections {
        let mut section = elem("section").attr(attr("name", &format!("s{s}")));
        for i in 0..items {
            section = section.child(
                elem("item")
                    .attr(attr("id", &format!("item-{s}-{i}")))
                    .child(text(&format!("value {}", i % 7))),
            );
        }
        root = root.child(section);
    }
    doc().child(root).build()
}

fn benchmark_order_by(c: &mut Criterion) {
    let ctx = XdmContext::default();
    let mut group = c.benchmark_group("sequence/order_by");
    for size in [100usize, 1_000, 10_000] {
        let values = pseudo_random(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| {
                let mut seq = OrderedSequence::new(
                    vec![OrderSpec::new(|i: &I<SimpleNode>| Ok(i.atomize()))],
                    &ctx,
                );
                for v in values {
                    seq.add(AtomicValue::integer(*v).into()).expect("add failure");
                }
                black_box(seq.iterate().expect("sort failure").count());
            });
        });
    }
    group.finish();
}

fn benchmark_group_by(c: &mut Criterion) {
    let ctx = XdmContext::default();
    let mut group = c.benchmark_group("sequence/group_by");
    for size in [100usize, 1_000, 10_000] {
        let values: Vec<AtomicValue> = pseudo_random(size)
            .into_iter()
            .enumerate()
            .map(|(i, v)| match i % 3 {
                0 => AtomicValue::integer(v % 50),
                1 => AtomicValue::parse(&format!("{}.0", v % 50), XdmType::Decimal).expect("decimal"),
                _ => AtomicValue::string(format!("k{}", v % 50)),
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| {
                let mut seq = GroupedSequence::new(
                    vec![GroupSpec::new(|i: &I<SimpleNode>| Ok(i.atomize()))],
                    &ctx,
                );
                for v in values {
                    seq.add(I::Atomic(v.clone())).expect("add failure");
                }
                black_box(seq.group_count());
            });
        });
    }
    group.finish();
}

fn benchmark_document_order(c: &mut Criterion) {
    let document = build_sample_document(10, 50);
    let mut nodes: Vec<SimpleNode> = Vec::new();
    for section in document.children()[0].children() {
        nodes.extend(section.children());
    }
    nodes.reverse();
    let dupes: Vec<SimpleNode> = nodes.iter().step_by(3).cloned().collect();
    c.bench_function("sequence/document_order_dedup", |b| {
        b.iter(|| {
            let mut seq = ValueSequence::new();
            seq.add_all(nodes.iter().chain(&dupes).cloned().map(I::Node))
                .expect("add failure");
            black_box(seq.iterate().expect("iterate failure").count());
        });
    });
}

criterion_group!(benches, benchmark_order_by, benchmark_group_by, benchmark_document_order);
criterion_main!(benches);
