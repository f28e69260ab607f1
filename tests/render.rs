//! Host operations issued by mounts, updates, and unmounts.

mod common;

use common::{html, memory_root, op_names, structural_ops};
use spark_fiber::{CommitStats, Element};

#[test]
fn test_mount_builds_subtree_then_attaches_once() {
    let (root, _) = memory_root();

    root.render(Element::host("div").child("a")).unwrap();

    assert_eq!(
        op_names(&root),
        vec!["create_text_instance", "create_instance", "append_initial_child", "append_child"]
    );
    assert_eq!(html(&root), "<div>a</div>");
    assert_eq!(
        root.last_commit().unwrap(),
        CommitStats {
            created: 2,
            reused: 0,
            placements: 1,
            updates: 0,
            deletions: 0,
            host_removals: 0,
        }
    );
    // root, div, text
    assert_eq!(root.fiber_count().unwrap(), 3);
}

#[test]
fn test_text_change_is_a_text_update() {
    let (root, _) = memory_root();
    root.render(Element::host("div").child("a")).unwrap();
    op_names(&root);

    root.render(Element::host("div").child("b")).unwrap();

    assert_eq!(op_names(&root), vec!["commit_text_update"]);
    assert_eq!(html(&root), "<div>b</div>");
    let stats = root.last_commit().unwrap();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.updates, 1);
}

#[test]
fn test_attribute_change_is_an_update() {
    let (root, _) = memory_root();
    root.render(Element::host("div").attr("id", "x").child("a")).unwrap();
    op_names(&root);

    root.render(Element::host("div").attr("id", "y").child("a")).unwrap();

    assert_eq!(op_names(&root), vec!["commit_update"]);
    assert_eq!(html(&root), "<div id=\"y\">a</div>");
}

#[test]
fn test_identical_render_issues_nothing() {
    let (root, _) = memory_root();
    root.render(Element::host("div").attr("id", "x").child("a")).unwrap();
    op_names(&root);

    root.render(Element::host("div").attr("id", "x").child("a")).unwrap();

    assert!(op_names(&root).is_empty());
    assert_eq!(root.fiber_count().unwrap(), 3);
}

#[test]
fn test_type_change_replaces_node() {
    let (root, _) = memory_root();
    root.render(Element::host("div").child("a")).unwrap();
    op_names(&root);

    root.render(Element::host("span").child("a")).unwrap();

    assert_eq!(structural_ops(&root), vec!["append_child", "remove_child"]);
    assert_eq!(html(&root), "<span>a</span>");

    let stats = root.last_commit().unwrap();
    assert_eq!(stats.deletions, 1);
    assert_eq!(stats.host_removals, 1);
    // Old div and text are reclaimed
    assert_eq!(root.fiber_count().unwrap(), 3);
}

#[test]
fn test_keyed_insert_in_middle_uses_anchor() {
    let (root, _) = memory_root();
    let list = |keys: &[&str]| {
        Element::host("ul").children(keys.iter().map(|k| Element::host("li").key(k).child(*k)))
    };
    root.render(list(&["a", "c"])).unwrap();
    op_names(&root);

    root.render(list(&["a", "b", "c"])).unwrap();

    assert_eq!(structural_ops(&root), vec!["insert_before"]);
    assert_eq!(html(&root), "<ul><li>a</li><li>b</li><li>c</li></ul>");
}

#[test]
fn test_component_children_attach_to_nearest_host() {
    fn row(_: &mut spark_fiber::Hooks<'_>) -> spark_fiber::Result<spark_fiber::Child> {
        Ok(vec![Element::host("td").child("1"), Element::host("td").child("2")].into())
    }

    let (root, _) = memory_root();
    root.render(Element::host("tr").child(Element::component(row))).unwrap();
    assert_eq!(html(&root), "<tr><td>1</td><td>2</td></tr>");

    // The new sibling shifts the unkeyed component to index 1, so it remounts
    root.render(
        Element::host("tr")
            .child(Element::host("th").key("h").child("h"))
            .child(Element::component(row)),
    )
    .unwrap();
    assert_eq!(html(&root), "<tr><th>h</th><td>1</td><td>2</td></tr>");
    assert_eq!(root.last_commit().unwrap().host_removals, 2);
}

#[test]
fn test_unmount_removes_everything() {
    let (root, _) = memory_root();
    root.render(
        Element::host("div")
            .child(Element::host("p").child("one"))
            .child(Element::host("p").child("two")),
    )
    .unwrap();
    op_names(&root);

    root.unmount().unwrap();

    // Only the top-level node needs a removal
    assert_eq!(op_names(&root), vec!["remove_child"]);
    assert_eq!(html(&root), "");
    assert_eq!(root.fiber_count().unwrap(), 1);
}

#[test]
fn test_numbers_and_empty_children() {
    let (root, _) = memory_root();
    root.render(
        Element::host("p")
            .child(42)
            .child(None::<&str>)
            .child(()),
    )
    .unwrap();
    assert_eq!(html(&root), "<p>42</p>");
}
