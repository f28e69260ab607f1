//! State and effect hooks driven through a real root.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{Log, LoggingHost, html, memory_root};
use proptest::prelude::*;
use spark_fiber::host::memory::MemoryHost;
use spark_fiber::{
    Child, Cleanup, Component, Dispatch, Element, Hooks, ReconcileError, ReconcilerConfig, Result, UnmountCleanup,
    create_root_with_config, deps,
};

/// Shared slot a component publishes its dispatcher into.
type Slot<S> = Rc<RefCell<Option<Dispatch<S>>>>;

// =============================================================================
// State
// =============================================================================

struct Counter {
    slot: Slot<i32>,
    renders: Rc<Cell<usize>>,
}

impl Component for Counter {
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        self.renders.set(self.renders.get() + 1);
        let (count, set_count) = hooks.use_state(0)?;
        *self.slot.borrow_mut() = Some(set_count);
        Ok(Element::host("span").child(count).into())
    }
}

fn counter() -> (Counter, Slot<i32>, Rc<Cell<usize>>) {
    let slot: Slot<i32> = Rc::default();
    let renders = Rc::new(Cell::new(0));
    let component = Counter {
        slot: slot.clone(),
        renders: renders.clone(),
    };
    (component, slot, renders)
}

fn dispatcher<S>(slot: &Slot<S>) -> Dispatch<S> {
    slot.borrow().clone().unwrap()
}

#[test]
fn test_external_dispatch_rerenders() {
    let (root, _) = memory_root();
    let (component, slot, renders) = counter();
    root.render(Element::component(component)).unwrap();
    assert_eq!(html(&root), "<span>0</span>");

    dispatcher(&slot).set(5).unwrap();
    assert_eq!(html(&root), "<span>5</span>");

    dispatcher(&slot).update(|n| n * 2).unwrap();
    assert_eq!(html(&root), "<span>10</span>");
    assert_eq!(renders.get(), 3);
}

#[test]
fn test_dispatch_identity_is_stable() {
    let (root, _) = memory_root();
    let (component, slot, _) = counter();
    root.render(Element::component(component)).unwrap();
    let first = dispatcher(&slot);

    first.set(1).unwrap();
    let second = dispatcher(&slot);

    assert!(first.ptr_eq(&second));
}

#[test]
fn test_dispatch_after_unmount_is_ignored() {
    let (root, _) = memory_root();
    let (component, slot, renders) = counter();
    root.render(Element::component(component)).unwrap();
    let set = dispatcher(&slot);

    root.unmount().unwrap();
    set.set(7).unwrap();

    assert_eq!(renders.get(), 1);
    assert_eq!(html(&root), "");
    assert_eq!(root.fiber_count().unwrap(), 1);
}

#[test]
fn test_dispatch_after_root_dropped_is_ignored() {
    let (root, _) = memory_root();
    let (component, slot, _) = counter();
    root.render(Element::component(component)).unwrap();
    let set = dispatcher(&slot);

    drop(root);
    assert!(set.set(1).is_ok());
}

#[derive(Debug, Clone)]
enum Op {
    Set(i32),
    Add(i32),
    Mul(i32),
}

impl Op {
    fn apply(&self, n: i32) -> i32 {
        match self {
            Op::Set(v) => *v,
            Op::Add(v) => n.wrapping_add(*v),
            Op::Mul(v) => n.wrapping_mul(*v),
        }
    }
}

/// Dispatches every op from its mount effect.
struct Batch {
    ops: Rc<Vec<Op>>,
    renders: Rc<Cell<usize>>,
}

impl Component for Batch {
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        self.renders.set(self.renders.get() + 1);
        let (value, set_value) = hooks.use_state(1i32)?;
        let ops = self.ops.clone();
        hooks.use_effect(
            move || {
                for op in ops.iter() {
                    let op = op.clone();
                    let _ = set_value.update(move |n| op.apply(*n));
                }
                None
            },
            deps![],
        )?;
        Ok(Child::from(value))
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-50i32..50).prop_map(Op::Set),
        (-50i32..50).prop_map(Op::Add),
        (-3i32..4).prop_map(Op::Mul),
    ]
}

proptest! {
    #[test]
    fn test_updates_from_effect_batch_into_one_pass(ops in proptest::collection::vec(op(), 1..10)) {
        let (root, _) = memory_root();
        let renders = Rc::new(Cell::new(0));
        let expected = ops.iter().fold(1i32, |n, op| op.apply(n));

        root.render(Element::component(Batch {
            ops: Rc::new(ops),
            renders: renders.clone(),
        }))
        .unwrap();

        prop_assert_eq!(renders.get(), 2);
        prop_assert_eq!(html(&root), expected.to_string());
    }
}

// =============================================================================
// Effects
// =============================================================================

struct Parent {
    log: Log,
}

struct Leaf {
    log: Log,
}

fn logged_effect(hooks: &mut Hooks<'_>, log: &Log, name: &'static str) -> Result<()> {
    let log = log.clone();
    hooks.use_effect(
        move || {
            log.push(format!("create {name}"));
            let cleanup: Cleanup = Box::new(move || log.push(format!("destroy {name}")));
            Some(cleanup)
        },
        None,
    )
}

impl Component for Parent {
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        logged_effect(hooks, &self.log, "parent")?;
        Ok(Element::component(Leaf { log: self.log.clone() }).into())
    }
}

impl Component for Leaf {
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        logged_effect(hooks, &self.log, "leaf")?;
        Ok(Element::host("i").into())
    }
}

#[test]
fn test_effect_order_across_renders() {
    let (root, _) = memory_root();
    let log = Log::default();

    root.render(Element::component(Parent { log: log.clone() })).unwrap();
    assert_eq!(log.take(), vec!["create leaf", "create parent"]);

    root.render(Element::component(Parent { log: log.clone() })).unwrap();
    assert_eq!(
        log.take(),
        vec!["destroy leaf", "destroy parent", "create leaf", "create parent"]
    );

    root.unmount().unwrap();
    assert_eq!(log.take(), vec!["destroy parent", "destroy leaf"]);
}

struct Watcher {
    dep: Rc<Cell<i32>>,
    log: Log,
}

impl Component for Watcher {
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        let dep = self.dep.get();
        let log = self.log.clone();
        hooks.use_effect(
            move || {
                log.push(format!("run {dep}"));
                let cleanup: Cleanup = Box::new(move || log.push(format!("clean {dep}")));
                Some(cleanup)
            },
            deps![dep],
        )?;
        Ok(Child::Empty)
    }
}

#[test]
fn test_effect_runs_only_when_deps_change() {
    let (root, _) = memory_root();
    let dep = Rc::new(Cell::new(1));
    let log = Log::default();
    let watcher = || {
        Element::component(Watcher {
            dep: dep.clone(),
            log: log.clone(),
        })
    };

    root.render(watcher()).unwrap();
    root.render(watcher()).unwrap();
    assert_eq!(log.take(), vec!["run 1"]);

    dep.set(2);
    root.render(watcher()).unwrap();
    assert_eq!(log.take(), vec!["clean 1", "run 2"]);

    root.render(watcher()).unwrap();
    assert!(log.take().is_empty());
}

fn cleanup_order(timing: UnmountCleanup) -> Vec<String> {
    common::init_tracing();
    let log = Log::default();
    let mut inner = MemoryHost::new();
    let container = inner.create_container();
    let host = LoggingHost {
        inner,
        log: log.clone(),
    };
    let root = create_root_with_config(host, container, ReconcilerConfig::new().with_unmount_cleanup(timing));

    root.render(Element::component(Leaf { log: log.clone() })).unwrap();
    log.take();
    root.unmount().unwrap();
    log.take()
}

#[test]
fn test_unmount_cleanup_runs_before_host_removal_by_default() {
    assert_eq!(cleanup_order(UnmountCleanup::default()), vec!["destroy leaf", "remove_child"]);
}

#[test]
fn test_deferred_unmount_cleanup_runs_after_host_removal() {
    assert_eq!(cleanup_order(UnmountCleanup::Deferred), vec!["remove_child", "destroy leaf"]);
}

#[test]
fn test_deleted_host_subtree_destroys_every_component_before_removal() {
    let log = Log::default();
    let mut inner = MemoryHost::new();
    let container = inner.create_container();
    let host = LoggingHost {
        inner,
        log: log.clone(),
    };
    let root = create_root_with_config(host, container, ReconcilerConfig::new());

    let section = Element::host("section")
        .child(Element::component(Parent { log: log.clone() }))
        .child(Element::component(Leaf { log: log.clone() }));
    root.render(Element::host("main").child(section)).unwrap();
    log.take();

    root.render(Element::host("main")).unwrap();

    // One removal for `section`, after the whole subtree is cleaned up
    assert_eq!(
        log.take(),
        vec!["destroy parent", "destroy leaf", "destroy leaf", "remove_child"]
    );
}

// =============================================================================
// Misuse
// =============================================================================

struct Conditional {
    extra: Rc<Cell<bool>>,
}

impl Component for Conditional {
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        let (a, _) = hooks.use_state(1)?;
        if self.extra.get() {
            hooks.use_state(2)?;
        }
        Ok(Child::from(a))
    }
}

#[test]
fn test_conditional_hook_is_reported() {
    let (root, _) = memory_root();
    let extra = Rc::new(Cell::new(false));
    root.render(Element::component(Conditional { extra: extra.clone() })).unwrap();

    extra.set(true);
    let err = root
        .render(Element::component(Conditional { extra: extra.clone() }))
        .unwrap_err();

    assert!(err.is_hook_error());
    assert!(matches!(
        err,
        ReconcileError::HookMismatch {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert_eq!(html(&root), "1");

    // Back to the first hook sequence, the root renders again
    extra.set(false);
    root.render(Element::component(Conditional { extra })).unwrap();
    assert_eq!(html(&root), "1");
}

fn runaway(hooks: &mut Hooks<'_>) -> Result<Child> {
    let (n, set_n) = hooks.use_state(0)?;
    hooks.use_effect(
        move || {
            let _ = set_n.update(|n| n + 1);
            None
        },
        None,
    )?;
    Ok(Child::from(n))
}

#[test]
fn test_runaway_updates_hit_the_limit() {
    common::init_tracing();
    let mut host = MemoryHost::new();
    let container = host.create_container();
    let root = create_root_with_config(host, container, ReconcilerConfig::new().with_max_nested_updates(5));

    let err = root.render(Element::component(runaway)).unwrap_err();

    assert!(matches!(err, ReconcileError::NestedUpdateLimit { limit: 5 }));
    assert!(!root.is_rendering());
    // Five passes committed: the mount and four re-renders
    let shown = root.with_host(|h| h.to_html(container)).unwrap();
    assert_eq!(shown, "4");
}
