//! Functional tests for the observable guarantees of `produce`.
//!
//! Core guarantees exercised here:
//! - A recipe that changes nothing returns the base node itself.
//! - Untouched subtrees are shared with the base; written paths are not.
//! - The base graph is never altered, whatever the recipe does.
//! - A changed node shared by several parents is realized exactly once and
//!   reached through every parent in the result.
//! - Cyclic graphs are drafted and finalized without looping forever.
//! - Depth of the graph is bounded by memory, not by the call stack.
//! - A recipe may replace the result only if it left the draft untouched.
//! - Re-entering with a live draft reuses the active session.

use cowl_draft::{produce, DraftError, Session};
use cowl_graph::{Heap, Key, NodeId, Value};
use cowl_test_utils::{aliased, chain, node_at, node_at_index, ring, selection, shared_child};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn number(heap: &Heap, node: NodeId, key: &str) -> Value {
    heap.get(node, key).unwrap()
}

/// Tenet: an edit that changes nothing returns the base by identity.
#[test]
fn no_op_recipe_returns_base() {
    init_tracing();
    let mut heap = Heap::new();
    let fixture = shared_child(&mut heap);
    let before = heap.len();

    let result = produce(&mut heap, Value::Node(fixture.root), |_, _| Ok(None)).unwrap();
    assert_eq!(result, Value::Node(fixture.root));
    assert_eq!(heap.len(), before);
}

/// Tenet: reading, and writing back what was read, is still a no-op.
#[test]
fn read_only_recipe_returns_base() {
    let mut heap = Heap::new();
    let fixture = selection(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let all = s.child(d, "all")?;
        let third = s.child(all, 2usize)?;
        let value = s.get(third, "value")?;
        s.set(third, "value", value)?;
        let selected = s.get(d, "selected")?;
        s.set(d, "selected", selected)?;
        Ok(None)
    })
    .unwrap();

    assert_eq!(result, Value::Node(fixture.root));
}

/// Tenet: the selection scenario. Editing `all[2]` must show up through
/// `selected[0]`, while every untouched item stays shared with the base.
#[test]
fn selection_edit_is_visible_through_every_alias() {
    init_tracing();
    let mut heap = Heap::new();
    let fixture = selection(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let all = s.child(d, "all")?;
        let third = s.child(all, 2usize)?;
        s.set(third, "value", Value::from(6))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    assert_ne!(result, fixture.root);

    let all = node_at(&heap, result, "all");
    let selected = node_at(&heap, result, "selected");
    assert_eq!(node_at_index(&heap, all, 0), fixture.items[0]);
    assert_ne!(node_at_index(&heap, all, 2), fixture.items[2]);
    assert_eq!(node_at_index(&heap, selected, 1), fixture.items[4]);
    assert_ne!(node_at_index(&heap, selected, 0), fixture.items[2]);
    assert_eq!(node_at_index(&heap, all, 2), node_at_index(&heap, selected, 0));

    assert_eq!(number(&heap, node_at_index(&heap, all, 2), "value"), Value::from(6));
    assert_eq!(number(&heap, fixture.items[2], "value"), Value::from(3));
}

/// Tenet: untouched siblings keep their identity; written paths do not.
#[test]
fn structural_sharing_and_copy_isolation() {
    let mut heap = Heap::new();
    let fixture = selection(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let all = s.child(d, "all")?;
        let first = s.child(all, 0usize)?;
        s.set(first, "value", Value::from(10))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let all = node_at(&heap, result, "all");
    assert_ne!(all, fixture.all);
    assert_ne!(node_at_index(&heap, all, 0), fixture.items[0]);
    for index in 1..5 {
        assert_eq!(node_at_index(&heap, all, index), fixture.items[index]);
    }
    // `items[0]` is not selected, so `selected` is shared as a whole
    assert_eq!(node_at(&heap, result, "selected"), fixture.selected);

    assert_eq!(number(&heap, fixture.items[0], "value"), Value::from(1));
    assert_eq!(node_at_index(&heap, fixture.all, 0), fixture.items[0]);
}

/// Tenet: `base.A.child === base.B.child === X` stays a single node in the result.
#[test]
fn shared_child_is_realized_once() {
    init_tracing();
    let mut heap = Heap::new();
    let fixture = shared_child(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let a = s.child(d, "A")?;
        let child = s.child(a, "child")?;
        s.set(child, "value", Value::from(1))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let via_a = node_at(&heap, node_at(&heap, result, "A"), "child");
    let via_b = node_at(&heap, node_at(&heap, result, "B"), "child");
    assert_eq!(via_a, via_b);
    assert_ne!(via_a, fixture.x);
    assert_eq!(number(&heap, via_a, "value"), Value::from(1));

    assert_eq!(number(&heap, node_at(&heap, fixture.b, "child"), "value"), Value::from(0));
    assert_eq!(node_at(&heap, fixture.root, "B"), fixture.b);
}

/// Tenet: the parent never read by the recipe is still copied and rewired.
#[test]
fn unread_parent_is_drafted_by_propagation() {
    let mut heap = Heap::new();
    let fixture = shared_child(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let b = s.child(d, "B")?;
        let child = s.child(b, "child")?;
        s.set(child, "value", Value::from(2))?;
        let a_draft = s.registry().draft(fixture.a).expect("A drafted");
        assert!(s.is_modified(a_draft)?);
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let a = node_at(&heap, result, "A");
    assert_ne!(a, fixture.a);
    assert_eq!(heap.get(a, "label").unwrap(), Value::from("a"));
    assert_eq!(number(&heap, node_at(&heap, a, "child"), "value"), Value::from(2));
}

/// Tenet: a true two-node cycle survives drafting and finalization.
#[test]
fn ring_edit_keeps_cycle_closed() {
    init_tracing();
    let mut heap = Heap::new();
    let fixture = ring(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let a = s.child(d, "head")?;
        let b = s.child(a, "next")?;
        s.set(b, "name", Value::from("b2"))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let a = node_at(&heap, result, "head");
    let b = node_at(&heap, a, "next");
    assert_ne!(a, fixture.a);
    assert_ne!(b, fixture.b);
    assert_eq!(node_at(&heap, b, "next"), a);
    assert_eq!(heap.get(b, "name").unwrap(), Value::from("b2"));

    assert_eq!(heap.get(fixture.b, "name").unwrap(), Value::from("b"));
    assert_eq!(node_at(&heap, fixture.b, "next"), fixture.a);
    assert_eq!(node_at(&heap, fixture.a, "next"), fixture.b);
}

/// Tenet: an item reachable directly, through an aliasing list, and holding
/// a back-pointer to the root is edited consistently everywhere.
#[test]
fn aliased_item_with_back_pointer() {
    let mut heap = Heap::new();
    let fixture = aliased(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let aliases = s.child(d, "aliases")?;
        let item = s.child(aliases, 0usize)?;
        s.set(item, "value", Value::from(2))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let item = node_at(&heap, result, "item");
    let aliases = node_at(&heap, result, "aliases");
    assert_eq!(node_at_index(&heap, aliases, 0), item);
    assert_eq!(node_at(&heap, item, "owner"), result);
    assert_eq!(number(&heap, item, "value"), Value::from(2));

    assert_eq!(number(&heap, fixture.item, "value"), Value::from(1));
    assert_eq!(node_at(&heap, fixture.item, "owner"), fixture.root);
    assert_eq!(node_at_index(&heap, fixture.aliases, 0), fixture.item);
}

/// Tenet: modifying the draft and returning something else is ambiguous.
#[test]
fn modified_draft_with_replacement_conflicts() {
    let mut heap = Heap::new();
    let base = heap.alloc_record().unwrap();
    let other = heap.alloc_record().unwrap();
    heap.set(other, "other", Value::from(true)).unwrap();

    let err = produce(&mut heap, Value::Node(base), |s, d| {
        s.set(d, "x", Value::from(1))?;
        Ok(Some(Value::Node(other)))
    })
    .unwrap_err();

    assert!(matches!(err, DraftError::ConflictingResult));
    assert!(err.is_recoverable());
    assert!(!heap.body(base).unwrap().contains_key(&Key::from("x")));
}

/// Tenet: a replacement from an unmodified draft is returned verbatim.
#[test]
fn replacement_is_returned_verbatim() {
    let mut heap = Heap::new();
    let base = heap.alloc_record().unwrap();
    heap.set(base, "a", Value::from(1)).unwrap();
    let other = heap.alloc_record().unwrap();
    heap.set(other, "other", Value::from(true)).unwrap();

    let result = produce(&mut heap, Value::Node(base), |_, _| Ok(Some(Value::Node(other)))).unwrap();
    assert_eq!(result, Value::Node(other));
    assert!(!heap.body(other).unwrap().contains_key(&Key::from("a")));

    let scalar = produce(&mut heap, Value::Node(base), |_, _| Ok(Some(Value::from("done")))).unwrap();
    assert_eq!(scalar, Value::from("done"));
}

/// Tenet: a replacement built inside the recipe is finalized, not merged.
#[test]
fn fresh_replacement_is_finalized() {
    let mut heap = Heap::new();
    let base = heap.alloc_record().unwrap();
    heap.set(base, "a", Value::from(1)).unwrap();

    let result = produce(&mut heap, Value::Node(base), |s, d| {
        let fresh = s.alloc_record()?;
        let mut body = s.heap().body(fresh)?.clone();
        body.set("other".into(), Value::from(true))?;
        body.set("base".into(), Value::Draft(d))?;
        let replacement = s.alloc(body)?;
        Ok(Some(Value::Node(replacement)))
    })
    .unwrap()
    .as_node()
    .unwrap();

    assert_eq!(heap.get(result, "other").unwrap(), Value::from(true));
    assert_eq!(heap.get(result, "base").unwrap(), Value::Node(base));
    assert!(heap.get(result, "a").unwrap().is_null());
    assert!(heap.is_frozen(result));
}

/// Tenet: re-entering with a live draft runs against the same session.
#[test]
fn reentrant_produce_reuses_session() {
    let mut heap = Heap::new();
    let fixture = shared_child(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let tag = s.tag();
        let tracked = s.registry().len();
        let a = s.child(d, "A")?;

        let inner = s.produce(Value::Draft(a), |inner: &mut Session<'_>, draft| {
            assert_eq!(inner.tag(), tag);
            assert_eq!(inner.registry().len(), tracked);
            assert_eq!(draft, a);
            inner.set(draft, "label", Value::from("A!"))?;
            Ok(None)
        })?;

        assert_eq!(inner, Value::Draft(a));
        assert!(s.is_modified(a)?);
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    assert_eq!(heap.get(node_at(&heap, result, "A"), "label").unwrap(), Value::from("A!"));
    assert_eq!(heap.get(fixture.a, "label").unwrap(), Value::from("a"));
}

/// Tenet: a nested produce over a plain node yields a finished node that
/// the outer recipe can store.
#[test]
fn nested_produce_over_node() {
    let mut heap = Heap::new();
    let base = heap.alloc_record().unwrap();
    let template = heap.alloc_record().unwrap();
    heap.set(template, "kind", Value::from("template")).unwrap();

    let result = produce(&mut heap, Value::Node(base), |s, d| {
        let outer_tag = s.tag();
        let made = s.produce(Value::Node(template), |inner, draft| {
            assert_ne!(inner.tag(), outer_tag);
            inner.set(draft, "kind", Value::from("instance"))?;
            Ok(None)
        })?;
        s.set(d, "made", made)?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let made = node_at(&heap, result, "made");
    assert_ne!(made, template);
    assert_eq!(heap.get(made, "kind").unwrap(), Value::from("instance"));
    assert_eq!(heap.get(template, "kind").unwrap(), Value::from("template"));
}

/// Tenet: deleting a field yields a new node without it; the base keeps it.
#[test]
fn deletion_leaves_base_intact() {
    let mut heap = Heap::new();
    let base = heap.alloc_record().unwrap();
    heap.set(base, "field", Value::from(1)).unwrap();
    heap.set(base, "keep", Value::from(2)).unwrap();

    let result = produce(&mut heap, Value::Node(base), |s, d| {
        s.delete(d, "field")?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    assert_ne!(result, base);
    assert_eq!(heap.body(result).unwrap().keys(), vec![Key::from("keep")]);
    assert_eq!(heap.get(base, "field").unwrap(), Value::from(1));
}

/// Tenet: deleting a shared child from one parent leaves the other intact.
#[test]
fn deleting_one_alias_keeps_the_other() {
    let mut heap = Heap::new();
    let fixture = shared_child(&mut heap);

    let result = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let a = s.child(d, "A")?;
        s.delete(a, "child")?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let a = node_at(&heap, result, "A");
    assert!(heap.get(a, "child").unwrap().is_null());
    assert_eq!(node_at(&heap, result, "B"), fixture.b);
    assert_eq!(node_at(&heap, fixture.a, "child"), fixture.x);
}

/// Tenet: a finished result is a valid base for the next edit.
#[test]
fn results_chain_into_new_edits() {
    let mut heap = Heap::new();
    let fixture = shared_child(&mut heap);

    let first = produce(&mut heap, Value::Node(fixture.root), |s, d| {
        let a = s.child(d, "A")?;
        let child = s.child(a, "child")?;
        s.set(child, "value", Value::from(1))?;
        Ok(None)
    })
    .unwrap();

    let second = produce(&mut heap, first.clone(), |s, d| {
        let b = s.child(d, "B")?;
        let child = s.child(b, "child")?;
        s.set(child, "value", Value::from(2))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let first = first.as_node().unwrap();
    let via_a = node_at(&heap, node_at(&heap, second, "A"), "child");
    let via_b = node_at(&heap, node_at(&heap, second, "B"), "child");
    assert_eq!(via_a, via_b);
    assert_eq!(number(&heap, via_a, "value"), Value::from(2));
    assert_eq!(number(&heap, node_at(&heap, node_at(&heap, first, "A"), "child"), "value"), Value::from(1));
}

/// Tenet: a write at the end of a very long chain finalizes without recursion.
#[test]
fn deep_chain_finalizes() {
    const DEPTH: usize = 10_000;
    let mut heap = Heap::new();
    let nodes = chain(&mut heap, DEPTH);
    let head = nodes[0];
    let tail = nodes[DEPTH - 1];

    let result = produce(&mut heap, Value::Node(head), |s, d| {
        let mut node = d;
        for _ in 1..DEPTH {
            node = s.child(node, "next")?;
        }
        s.set(node, "value", Value::from("end"))?;
        Ok(None)
    })
    .unwrap()
    .as_node()
    .unwrap();

    let base: std::collections::HashSet<NodeId> = nodes.iter().copied().collect();
    let mut node = result;
    let mut depth = 1;
    while let Some(next) = heap.get(node, "next").unwrap().as_node() {
        assert!(!base.contains(&node), "every node on the written path is new");
        node = next;
        depth += 1;
    }
    assert_eq!(depth, DEPTH);
    assert_ne!(node, tail);
    assert_eq!(number(&heap, node, "value"), Value::from("end"));
    assert_eq!(number(&heap, tail, "value"), Value::from((DEPTH - 1) as f64));
    assert!(heap.is_frozen(node));
}
