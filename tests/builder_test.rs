//! Tests for TreeBuilder: prefix merging, label placement, package refresh

use std::sync::Arc;

use loadertree::domain::{
    Loader, LoaderRef, LoaderTree, Snapshot, TreeBuilder, UnitChain, SNAPSHOT_ROOT,
};
use loadertree::infrastructure::ModuleLoader;
use loadertree::util::testing;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn loader(name: &str, parent: Option<&LoaderRef>, packages: &[&str]) -> LoaderRef {
    ModuleLoader::with_packages(name, parent.cloned(), strings(packages))
}

fn label_of(tree: &LoaderTree, path: &[&LoaderRef]) -> Option<String> {
    let idx = node_at(tree, path);
    tree.get(idx).unwrap().label().map(str::to_string)
}

/// Follows `path` (root-most first) from the sentinel root.
fn node_at(tree: &LoaderTree, path: &[&LoaderRef]) -> generational_arena::Index {
    let mut idx = tree.root();
    for loader in path {
        idx = tree
            .child_for(idx, loader)
            .unwrap_or_else(|| panic!("no node for {}", loader.name()));
    }
    idx
}

#[test]
fn given_two_chains_sharing_root_when_folding_then_single_shared_branch() {
    testing::init_test_setup();
    // Arrange: [A(leaf), B(root)] for T1 and [C(leaf), B(root)] for T2
    let b = loader("B", None, &[]);
    let a = loader("A", Some(&b), &[]);
    let c = loader("C", Some(&b), &[]);
    let snapshot = Snapshot::new(vec![
        UnitChain::new("T1", vec![a.clone(), b.clone()]),
        UnitChain::new("T2", vec![c.clone(), b.clone()]),
    ]);

    // Act
    let tree = TreeBuilder::new().build(&snapshot);

    // Assert
    let root = tree.get(tree.root()).unwrap();
    assert_eq!(root.name(), SNAPSHOT_ROOT);
    assert_eq!(root.child_count(), 1);

    let b_idx = node_at(&tree, &[&b]);
    assert_eq!(tree.get(b_idx).unwrap().child_count(), 2);
    // fold order decides the winner; here T1 is folded first
    assert_eq!(label_of(&tree, &[&b]), Some("T1".to_string()));
    assert_eq!(label_of(&tree, &[&b, &a]), None);
    assert_eq!(label_of(&tree, &[&b, &c]), None);
    assert_eq!(tree.len(), 4);
}

#[test]
fn given_reversed_unit_order_when_folding_then_other_unit_labels_shared_root() {
    let b = loader("B", None, &[]);
    let a = loader("A", Some(&b), &[]);
    let c = loader("C", Some(&b), &[]);
    let snapshot = Snapshot::new(vec![
        UnitChain::new("T2", vec![c.clone(), b.clone()]),
        UnitChain::new("T1", vec![a.clone(), b.clone()]),
    ]);

    let tree = TreeBuilder::new().build(&snapshot);

    assert_eq!(label_of(&tree, &[&b]), Some("T2".to_string()));
}

#[test]
fn given_chains_diverging_midway_when_folding_then_one_node_per_shared_depth() {
    // boot <- platform <- app1, boot <- platform <- app2, boot <- other
    let boot = loader("boot", None, &[]);
    let platform = loader("platform", Some(&boot), &[]);
    let app1 = loader("app", Some(&platform), &[]);
    let app2 = loader("app", Some(&platform), &[]);
    let other = loader("other", Some(&boot), &[]);
    let snapshot = Snapshot::new(vec![
        UnitChain::new("t1", vec![app1.clone(), platform.clone(), boot.clone()]),
        UnitChain::new("t2", vec![app2.clone(), platform.clone(), boot.clone()]),
        UnitChain::new("t3", vec![other.clone(), boot.clone()]),
    ]);

    let tree = TreeBuilder::new().build(&snapshot);

    assert_eq!(tree.get(tree.root()).unwrap().child_count(), 1);
    assert_eq!(tree.get(node_at(&tree, &[&boot])).unwrap().child_count(), 2);
    // same display name, different identity: two nodes
    assert_eq!(
        tree.get(node_at(&tree, &[&boot, &platform]))
            .unwrap()
            .child_count(),
        2
    );
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.depth(), 4);
}

#[test]
fn given_fresh_chain_of_three_when_folding_then_only_root_most_is_labeled() {
    let outer = loader("outer", None, &[]);
    let middle = loader("middle", Some(&outer), &[]);
    let leaf = loader("leaf", Some(&middle), &[]);
    let mut tree = LoaderTree::new(SNAPSHOT_ROOT);

    TreeBuilder::new().fold_chain(
        &mut tree,
        "worker-1",
        &[leaf.clone(), middle.clone(), outer.clone()],
    );

    assert_eq!(label_of(&tree, &[&outer]), Some("worker-1".to_string()));
    assert_eq!(label_of(&tree, &[&outer, &middle]), None);
    assert_eq!(label_of(&tree, &[&outer, &middle, &leaf]), None);
}

#[test]
fn given_labeled_node_when_folding_other_units_through_it_then_label_unchanged() {
    let outer = loader("outer", None, &[]);
    let leaf = loader("leaf", Some(&outer), &[]);
    let deeper = loader("deeper", Some(&leaf), &[]);
    let builder = TreeBuilder::new();
    let mut tree = LoaderTree::new(SNAPSHOT_ROOT);

    builder.fold_chain(&mut tree, "first", &[leaf.clone(), outer.clone()]);
    builder.fold_chain(&mut tree, "second", &[leaf.clone(), outer.clone()]);
    builder.fold_chain(
        &mut tree,
        "third",
        &[deeper.clone(), leaf.clone(), outer.clone()],
    );

    assert_eq!(label_of(&tree, &[&outer]), Some("first".to_string()));
    assert_eq!(label_of(&tree, &[&outer, &leaf]), None);
    // created by a deeper step of a fold, so never labeled
    assert_eq!(label_of(&tree, &[&outer, &leaf, &deeper]), None);
}

#[test]
fn given_empty_chain_when_folding_then_no_op() {
    let snapshot = Snapshot::new(vec![UnitChain::new("idle", Vec::new())]);

    let tree = TreeBuilder::new().build(&snapshot);

    assert_eq!(tree.len(), 1);
    assert!(tree.is_empty());
}

#[test]
fn given_package_change_when_refolding_then_list_is_exact_new_snapshot() {
    let concrete = ModuleLoader::with_packages(
        "app",
        None,
        strings(&["com.example.web", "com.example", "org.gone"]),
    );
    let app: LoaderRef = concrete.clone();
    let builder = TreeBuilder::new();
    let mut tree = LoaderTree::new(SNAPSHOT_ROOT);

    builder.fold_chain(&mut tree, "main", &[app.clone()]);
    let idx = node_at(&tree, &[&app]);
    assert_eq!(
        tree.get(idx).unwrap().packages(),
        strings(&["com.example", "org.gone", "com.example.web"]).as_slice()
    );

    concrete.undefine_package("org.gone");
    concrete.define_package("com.example.api.v2");
    builder.fold_chain(&mut tree, "main", &[app.clone()]);

    assert_eq!(
        tree.get(idx).unwrap().packages(),
        strings(&["com.example", "com.example.web", "com.example.api.v2"]).as_slice()
    );
}

#[test]
fn given_reused_ancestor_when_folding_then_ancestor_packages_refreshed_too() {
    let concrete_boot = ModuleLoader::with_packages("boot", None, strings(&["java.lang"]));
    let boot: LoaderRef = concrete_boot.clone();
    let app = loader("app", Some(&boot), &[]);
    let builder = TreeBuilder::new();
    let mut tree = LoaderTree::new(SNAPSHOT_ROOT);

    builder.fold_chain(&mut tree, "main", &[boot.clone()]);
    concrete_boot.define_package("java.util");
    builder.fold_chain(&mut tree, "worker", &[app.clone(), boot.clone()]);

    let idx = node_at(&tree, &[&boot]);
    assert_eq!(
        tree.get(idx).unwrap().packages(),
        strings(&["java.lang", "java.util"]).as_slice()
    );
}

#[test]
fn given_same_loader_instance_when_keyed_then_tree_holds_handle() {
    let app = loader("app", None, &[]);
    let before = Arc::strong_count(&app);

    let tree = TreeBuilder::new().build(&Snapshot::new(vec![UnitChain::new(
        "main",
        vec![app.clone()],
    )]));

    assert_eq!(Arc::strong_count(&app), before + 1);
    drop(tree);
    assert_eq!(Arc::strong_count(&app), before);
}
