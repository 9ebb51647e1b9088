//! Testing utilities for cowl workspace
//!
//! Graph fixtures shared by the unit, integration and bench targets.

#![allow(missing_docs)]

use cowl_graph::{Heap, NodeBody, NodeId, ShallowCopy, Value};
use std::sync::Arc;

/// `root.a.child` and `root.b.child` are the same node `x`
#[derive(Debug, Clone, Copy)]
pub struct SharedChild {
    pub root: NodeId,
    pub a: NodeId,
    pub b: NodeId,
    pub x: NodeId,
}

pub fn shared_child(heap: &mut Heap) -> SharedChild {
    let x = heap.alloc_record().unwrap();
    heap.set(x, "value", Value::from(0)).unwrap();
    let a = heap.alloc_record().unwrap();
    heap.set(a, "child", Value::Node(x)).unwrap();
    heap.set(a, "label", Value::from("a")).unwrap();
    let b = heap.alloc_record().unwrap();
    heap.set(b, "child", Value::Node(x)).unwrap();
    heap.set(b, "label", Value::from("b")).unwrap();
    let root = heap.alloc_record().unwrap();
    heap.set(root, "A", Value::Node(a)).unwrap();
    heap.set(root, "B", Value::Node(b)).unwrap();
    SharedChild { root, a, b, x }
}

/// Five `{value: n}` items in `all`, with `selected = [all[2], all[4]]`
#[derive(Debug, Clone)]
pub struct Selection {
    pub root: NodeId,
    pub all: NodeId,
    pub selected: NodeId,
    pub items: Vec<NodeId>,
}

pub fn selection(heap: &mut Heap) -> Selection {
    let items: Vec<NodeId> = (1..=5)
        .map(|n| {
            let item = heap.alloc_record().unwrap();
            heap.set(item, "value", Value::from(n)).unwrap();
            item
        })
        .collect();
    let all = heap.alloc(NodeBody::List(items.iter().copied().map(Value::Node).collect())).unwrap();
    let selected = heap.alloc(NodeBody::List(vec![Value::Node(items[2]), Value::Node(items[4])])).unwrap();
    let root = heap.alloc_record().unwrap();
    heap.set(root, "all", Value::Node(all)).unwrap();
    heap.set(root, "selected", Value::Node(selected)).unwrap();
    Selection {
        root,
        all,
        selected,
        items,
    }
}

/// `a.next = b`, `b.next = a`, and `root.head = a`
#[derive(Debug, Clone, Copy)]
pub struct Ring {
    pub root: NodeId,
    pub a: NodeId,
    pub b: NodeId,
}

pub fn ring(heap: &mut Heap) -> Ring {
    let a = heap.alloc_record().unwrap();
    let b = heap.alloc_record().unwrap();
    heap.set(a, "name", Value::from("a")).unwrap();
    heap.set(b, "name", Value::from("b")).unwrap();
    heap.set(a, "next", Value::Node(b)).unwrap();
    heap.set(b, "next", Value::Node(a)).unwrap();
    let root = heap.alloc_record().unwrap();
    heap.set(root, "head", Value::Node(a)).unwrap();
    Ring { root, a, b }
}

/// `root.item` and `root.aliases[0]` are the same node, which refers back to `root`
#[derive(Debug, Clone, Copy)]
pub struct Aliased {
    pub root: NodeId,
    pub item: NodeId,
    pub aliases: NodeId,
}

pub fn aliased(heap: &mut Heap) -> Aliased {
    let root = heap.alloc_record().unwrap();
    let item = heap.alloc_record().unwrap();
    heap.set(item, "value", Value::from(1)).unwrap();
    heap.set(item, "owner", Value::Node(root)).unwrap();
    let aliases = heap.alloc(NodeBody::List(vec![Value::Node(item)])).unwrap();
    heap.set(root, "item", Value::Node(item)).unwrap();
    heap.set(root, "aliases", Value::Node(aliases)).unwrap();
    Aliased { root, item, aliases }
}

/// `root.a.x` and `root.b` are the same node `x`
#[derive(Debug, Clone, Copy)]
pub struct Detachable {
    pub root: NodeId,
    pub a: NodeId,
    pub x: NodeId,
}

pub fn detachable(heap: &mut Heap) -> Detachable {
    let x = heap.alloc_record().unwrap();
    heap.set(x, "v", Value::from(0)).unwrap();
    let a = heap.alloc_record().unwrap();
    heap.set(a, "x", Value::Node(x)).unwrap();
    let root = heap.alloc_record().unwrap();
    heap.set(root, "a", Value::Node(a)).unwrap();
    heap.set(root, "b", Value::Node(x)).unwrap();
    Detachable { root, a, x }
}

/// Linked list of `len` records joined by `next`, head first
pub fn chain(heap: &mut Heap, len: usize) -> Vec<NodeId> {
    let mut nodes = Vec::with_capacity(len);
    let mut next = Value::Null;
    for n in (0..len).rev() {
        let node = heap.alloc_record().unwrap();
        heap.set(node, "value", Value::from(n as f64)).unwrap();
        heap.set(node, "next", next).unwrap();
        next = Value::Node(node);
        nodes.push(node);
    }
    nodes.reverse();
    nodes
}

/// Copy strategy marking copies with a `copied` generation counter
#[derive(Debug, Default)]
pub struct TaskCopier;

impl ShallowCopy for TaskCopier {
    fn shallow_copy(&self, body: &NodeBody) -> NodeBody {
        let mut copy = body.clone();
        let generation = body
            .get(&"copies".into())
            .ok()
            .flatten()
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let _ = copy.set("copies".into(), Value::from(generation + 1.0));
        copy
    }
}

pub fn task(heap: &mut Heap, name: &str, done: bool) -> NodeId {
    let mut body = NodeBody::record();
    body.set("name".into(), Value::from(name)).unwrap();
    body.set("done".into(), Value::from(done)).unwrap();
    heap.alloc_with_copier(body, Arc::new(TaskCopier)).unwrap()
}

/// List of two tasks, the second already done
pub fn task_list(heap: &mut Heap) -> (NodeId, NodeId, NodeId) {
    let first = task(heap, "test", false);
    let second = task(heap, "test 2", true);
    let list = heap.alloc(NodeBody::List(vec![Value::Node(first), Value::Node(second)])).unwrap();
    (list, first, second)
}

/// Balanced record tree of `depth` levels with `fanout` children each
pub fn wide_tree(heap: &mut Heap, depth: usize, fanout: usize) -> NodeId {
    let node = heap.alloc_record().unwrap();
    heap.set(node, "depth", Value::from(depth as f64)).unwrap();
    if depth > 0 {
        for i in 0..fanout {
            let child = wide_tree(heap, depth - 1, fanout);
            heap.set(node, format!("c{i}"), Value::Node(child)).unwrap();
        }
    }
    node
}

/// Read `node.key` as a node handle
pub fn node_at(heap: &Heap, node: NodeId, key: &str) -> NodeId {
    heap.get(node, key).unwrap().as_node().unwrap()
}

/// Read `list[index]` as a node handle
pub fn node_at_index(heap: &Heap, list: NodeId, index: usize) -> NodeId {
    heap.get(list, index).unwrap().as_node().unwrap()
}
