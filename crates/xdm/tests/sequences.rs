use proptest::prelude::*;
use quarry_xdm::simple_node::{attr, doc, elem, text};
use quarry_xdm::{
    AtomicValue, Cardinality, Error, ErrorCode, GroupSpec, GroupedSequence, NodeStore, OrderSpec,
    OrderedSequence, Sequence, SequenceState, SimpleNode, SimpleStore, ValueSequence, XdmContext,
    XdmItem, XdmNode, XdmType, registry,
};
use rstest::{fixture, rstest};

type Item = XdmItem<SimpleNode>;

#[fixture]
fn tree() -> SimpleNode {
    // <root id="r"><a>1</a><b>2</b><c>3</c></root>
    doc()
        .child(
            elem("root")
                .attr(attr("id", "r"))
                .child(elem("a").child(text("1")))
                .child(elem("b").child(text("2")))
                .child(elem("c").child(text("3"))),
        )
        .build()
}

fn names(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|i| match i {
            XdmItem::Node(n) => n.name().map(|q| q.local).unwrap_or_else(|| n.string_value()),
            XdmItem::Atomic(a) => a.to_lexical(),
        })
        .collect()
}

fn first_key(item: &Item) -> Result<Vec<AtomicValue>, Error> {
    Ok(item.atomize())
}

#[rstest]
fn ordered_keys_sort_stably() {
    let ctx = XdmContext::default();
    let mut keys = [3, 1, 2, 1].into_iter();
    let mut seq = OrderedSequence::new(
        vec![OrderSpec::new(move |_: &Item| {
            Ok(keys.next().map(AtomicValue::integer).into_iter().collect())
        })],
        &ctx,
    );
    for label in ["x", "y", "z", "w"] {
        seq.add(AtomicValue::string(label).into()).unwrap();
    }
    let got: Vec<String> = seq.iterate().unwrap().map(Item::string_value).collect();
    assert_eq!(got, ["y", "w", "z", "x"]);
}

#[rstest]
fn ordered_descending_with_secondary_key() {
    let ctx = XdmContext::default();
    let specs = vec![
        OrderSpec::new(|i: &Item| Ok(vec![AtomicValue::integer(i64::from(i.string_value().len() > 1))]))
            .descending(),
        OrderSpec::new(first_key),
    ];
    let mut seq = OrderedSequence::new(specs, &ctx);
    seq.add_all(["b", "aa", "a", "cc"].map(|s| Item::from(AtomicValue::string(s)))).unwrap();
    let got: Vec<String> = seq.iterate().unwrap().map(Item::string_value).collect();
    assert_eq!(got, ["aa", "cc", "a", "b"]);
}

#[rstest]
fn key_callbacks_run_once_per_item() {
    let ctx = XdmContext::default();
    let mut calls = 0;
    {
        let mut seq = OrderedSequence::new(
            vec![OrderSpec::new(|i: &Item| {
                calls += 1;
                Ok(i.atomize())
            })],
            &ctx,
        );
        for n in [5, 4, 3, 2, 1] {
            seq.add(AtomicValue::integer(n).into()).unwrap();
        }
        let _ = seq.iterate().unwrap();
        let _ = seq.iterate().unwrap();
    }
    assert_eq!(calls, 5);
}

#[rstest]
fn group_by_keeps_bucket_creation_order() {
    let ctx = XdmContext::default();
    let mut seq = GroupedSequence::new(vec![GroupSpec::new(first_key)], &ctx);
    for s in ["a", "b", "a"] {
        seq.add(AtomicValue::string(s).into()).unwrap();
    }
    assert_eq!(seq.group_count(), 2);
    let groups: Vec<Vec<String>> = seq
        .groups()
        .map(|g| g.items.iter().map(|i| i.string_value()).collect())
        .collect();
    assert_eq!(groups, vec![vec!["a", "a"], vec!["b"]]);
    let flat: Vec<String> = seq.iterate().unwrap().map(Item::string_value).collect();
    assert_eq!(flat, ["a", "a", "b"]);
    let inserted: Vec<String> = seq.unordered_iterate().map(Item::string_value).collect();
    assert_eq!(inserted, ["a", "b", "a"]);
}

#[rstest]
fn group_by_untyped_node_values(tree: SimpleNode) {
    let ctx = XdmContext::default();
    let root = tree.children()[0].clone();
    let mut seq = GroupedSequence::new(vec![GroupSpec::new(first_key)], &ctx);
    for child in root.children() {
        seq.add(XdmItem::Node(child)).unwrap();
    }
    seq.add(AtomicValue::string("2").into()).unwrap();
    assert_eq!(seq.group_count(), 3);
    assert_eq!(seq.groups().nth(1).map(|g| g.items.len()), Some(2));
}

#[rstest]
fn node_sequences_read_in_document_order(tree: SimpleNode) {
    let root = tree.children()[0].clone();
    let kids = root.children();
    let mut seq = ValueSequence::new();
    for n in [&kids[2], &kids[0], &kids[2], &kids[1], &root.attributes()[0]] {
        seq.add(XdmItem::Node(n.clone())).unwrap();
    }
    let unordered: Vec<Item> = seq.unordered_iterate().cloned().collect();
    assert_eq!(names(&unordered), ["c", "a", "c", "b", "id"]);
    let ordered: Vec<Item> = seq.iterate().unwrap().cloned().collect();
    assert_eq!(names(&ordered), ["id", "a", "b", "c"]);
    assert_eq!(seq.len(), 4);
    assert_eq!(seq.item_type(), XdmType::Node);
}

#[rstest]
fn keep_unordered_only_drops_duplicates(tree: SimpleNode) {
    let kids = tree.children()[0].children();
    let mut seq = ValueSequence::new();
    seq.keep_unordered(true);
    seq.add_all([&kids[2], &kids[0], &kids[2]].map(|n| XdmItem::Node(n.clone()))).unwrap();
    let got: Vec<Item> = seq.iterate().unwrap().cloned().collect();
    assert_eq!(names(&got), ["c", "a"]);
}

#[rstest]
fn mixed_sequences_keep_insertion_order(tree: SimpleNode) {
    let kids = tree.children()[0].children();
    let mut seq = ValueSequence::new();
    seq.add(XdmItem::Node(kids[1].clone())).unwrap();
    seq.add(AtomicValue::integer(7).into()).unwrap();
    seq.add(XdmItem::Node(kids[0].clone())).unwrap();
    let got: Vec<Item> = seq.iterate().unwrap().cloned().collect();
    assert_eq!(names(&got), ["b", "7", "a"]);
    assert_eq!(seq.item_type(), XdmType::Item);
}

#[rstest]
fn frozen_sequences_reject_items() {
    let mut seq: ValueSequence<SimpleNode> = ValueSequence::new();
    seq.add(AtomicValue::integer(1).into()).unwrap();
    seq.freeze();
    assert_eq!(seq.state(), SequenceState::Frozen);
    let err = seq.add(AtomicValue::integer(2).into()).unwrap_err();
    assert!(err.is_internal());
    assert_eq!(seq.len(), 1);
}

#[rstest]
fn subsequence_window() {
    let mut seq: ValueSequence<SimpleNode> = (1..=6).map(|i| Item::from(AtomicValue::integer(i))).collect();
    let mut sub = seq.subsequence(2, Some(3)).unwrap();
    assert_eq!(sub.len(), 3);
    assert_eq!(sub.item_at(0).unwrap().map(Item::string_value).as_deref(), Some("3"));
    assert!(sub.add(AtomicValue::integer(0).into()).is_err());
    assert_eq!(seq.subsequence(10, None).unwrap().cardinality(), Cardinality::Empty);
    let rev: Vec<String> = seq.iterate_in_reverse().unwrap().map(Item::string_value).collect();
    assert_eq!(rev.first().map(String::as_str), Some("6"));
}

#[rstest]
#[case(vec![], Ok(false))]
#[case(vec![AtomicValue::string("")], Ok(false))]
#[case(vec![AtomicValue::double(f64::NAN)], Ok(false))]
#[case(vec![AtomicValue::integer(3)], Ok(true))]
#[case(vec![AtomicValue::integer(1), AtomicValue::integer(2)], Err(ErrorCode::FORG0006))]
fn effective_boolean_values(#[case] values: Vec<AtomicValue>, #[case] expected: Result<bool, ErrorCode>) {
    let seq: ValueSequence<SimpleNode> = values.into_iter().map(Item::from).collect();
    assert_eq!(seq.effective_boolean().map_err(|e| e.code), expected);
}

#[rstest]
fn node_collection_materializes_transient_nodes() {
    let store = SimpleStore::new();
    let scratch = elem("tmp").child(elem("x")).transient().build();
    let x = scratch.children()[0].clone();
    let mut seq = ValueSequence::new();
    seq.add_all([x.clone(), scratch.clone(), x].map(XdmItem::Node)).unwrap();

    let coll = seq.to_node_collection(&store).unwrap();
    assert_eq!(coll.len(), 2);
    assert!(coll.iter().all(|n| n.is_persistent()));
    assert!(!coll.contains(&scratch));
    assert_eq!(coll.get(0).and_then(|n| n.name()).map(|q| q.local).as_deref(), Some("tmp"));
    assert_eq!(store.materialized_trees(), 1);
    assert!(seq.unordered_iterate().filter_map(Item::as_node).all(|n| n.is_persistent()));

    let back = ValueSequence::from_node_collection(coll.clone());
    assert_eq!(back.len(), coll.len());
    assert_eq!(back.item_type(), XdmType::Node);
}

#[rstest]
fn persistent_nodes_keep_identity(tree: SimpleNode) {
    let store = SimpleStore::new();
    let kids = tree.children()[0].children();
    let mut seq = ValueSequence::new();
    seq.add_all(kids.iter().rev().cloned().map(XdmItem::Node)).unwrap();
    let coll = seq.to_node_collection(&store).unwrap();
    assert_eq!(coll.into_vec(), kids);
    assert_eq!(store.materialized_trees(), 0);
}

#[rstest]
fn node_collection_rejects_atomics_before_materializing() {
    let store = SimpleStore::new();
    let scratch = elem("tmp").child(elem("x")).transient().build();
    let x = scratch.children()[0].clone();
    let mut seq = ValueSequence::new();
    seq.add(XdmItem::Node(x.clone())).unwrap();
    seq.add(AtomicValue::integer(1).into()).unwrap();
    let before: Vec<Item> = seq.unordered_iterate().cloned().collect();

    let err = seq.to_node_collection(&store).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
    assert_eq!(store.materialized_trees(), 0);
    let after: Vec<Item> = seq.unordered_iterate().cloned().collect();
    assert_eq!(after, before);
    assert!(!x.is_persistent());
}

#[rstest]
fn nodes_from_separate_trees_have_no_document_order(tree: SimpleNode) {
    let first = elem("first")
        .child(elem("a00"))
        .child(elem("a01"))
        .child(elem("a02"))
        .build();
    let kids = first.children();
    let stranger = tree.children()[0].children()[0].clone();
    let mut seq = ValueSequence::new();
    seq.add_all(kids.iter().rev().cloned().map(XdmItem::Node)).unwrap();
    seq.add(XdmItem::Node(stranger)).unwrap();
    let before: Vec<Item> = seq.unordered_iterate().cloned().collect();

    let err = seq.iterate().unwrap_err();
    assert_eq!(err.code, ErrorCode::FOER0000);
    let after: Vec<Item> = seq.unordered_iterate().cloned().collect();
    assert_eq!(names(&after), names(&before));
    assert_eq!(seq.clone().into_items().unwrap_err().code, ErrorCode::FOER0000);

    let mut single = ValueSequence::new();
    single.add_all(kids.iter().rev().cloned().map(XdmItem::Node)).unwrap();
    let got: Vec<Item> = single.into_items().unwrap();
    assert_eq!(names(&got), ["a00", "a01", "a02"]);
}

#[rstest]
fn store_order_defaults_to_node_order(tree: SimpleNode) {
    let store = SimpleStore::new();
    let kids = tree.children()[0].children();
    assert_eq!(store.node_order(&kids[0], &kids[1]).unwrap(), core::cmp::Ordering::Less);
    let other = elem("other").build();
    let err = store.node_order(&kids[0], &other).unwrap_err();
    assert_eq!(err.code, ErrorCode::FOER0000);
}

fn atomic_strategy() -> impl Strategy<Value = AtomicValue> {
    prop_oneof![
        any::<i64>().prop_map(AtomicValue::integer),
        any::<f64>().prop_map(AtomicValue::double),
        "[a-z]{0,4}".prop_map(AtomicValue::string),
        "[a-z]{0,4}".prop_map(AtomicValue::untyped),
        any::<bool>().prop_map(AtomicValue::Boolean),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[rstest]
    fn sequence_invariants(values in prop::collection::vec(atomic_strategy(), 0..8)) {
        let mut seq: ValueSequence<SimpleNode> = ValueSequence::new();
        let mut expected: Option<XdmType> = None;
        for v in values {
            let t = v.xdm_type();
            expected = Some(match expected {
                None => t,
                Some(e) => registry().common_supertype(e, t).unwrap(),
            });
            seq.add(v.into()).unwrap();
            prop_assert!(!(seq.is_empty() && seq.has_one()));
            prop_assert_eq!(seq.has_many(), seq.len() > 1);
            prop_assert_eq!(seq.cardinality(), Cardinality::of(seq.len()));
            prop_assert_eq!(seq.item_type(), expected.unwrap_or(XdmType::Empty));
        }
        prop_assert_eq!(seq.item_type(), expected.unwrap_or(XdmType::Empty));
    }

    #[rstest]
    fn ordered_output_is_sorted(values in prop::collection::vec(any::<i32>(), 0..40)) {
        let ctx = XdmContext::default();
        let mut seq = OrderedSequence::new(vec![OrderSpec::new(first_key)], &ctx);
        for v in &values {
            seq.add(AtomicValue::integer(i64::from(*v)).into()).unwrap();
        }
        let got: Vec<i64> = seq
            .iterate()
            .unwrap()
            .map(|i| i.string_value().parse().unwrap())
            .collect();
        let mut want: Vec<i64> = values.iter().map(|v| i64::from(*v)).collect();
        want.sort_unstable();
        prop_assert_eq!(got, want);
    }
}
