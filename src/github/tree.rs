// src/github/tree.rs
// =============================================================================
// Rebuilds the directory hierarchy from GitHub's flat tree listing.
//
// GitHub's recursive tree endpoint returns entries like:
//   src            (tree)
//   src/main.rs    (blob)
//   README.md      (blob)
// in no particular order. We turn that into nested nodes.
//
// How it works:
// 1. Sort: directories first, then by full path
//    (so every directory is seen before anything inside it)
// 2. Walk the sorted list once, remembering each node by its path
// 3. Attach every node to its parent; if the parent was never listed
//    (partial/truncated listings), keep the node at the root instead
//    of dropping it
//
// Rust concepts:
// - Arena: nodes live in a Vec and refer to children by index, which avoids
//   fighting the borrow checker over mutable references into a tree
// - HashMap: path -> arena index lookup
// =============================================================================

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::{EntryKind, TreeEntry};

/// A node of the rebuilt tree
///
/// `children` is `Some` for directories (even empty ones) and `None` for
/// files and submodules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }
}

// Directories before everything else, then lexicographic by full path
fn entry_order(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    b.kind
        .is_directory()
        .cmp(&a.kind.is_directory())
        .then_with(|| a.path.cmp(&b.path))
}

// Splits "a/b/c.txt" into ("a/b", "c.txt"), and "c.txt" into ("", "c.txt")
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}

struct ArenaNode {
    node: TreeNode,
    child_ids: Vec<usize>,
}

// Builds the hierarchy and returns the root-level nodes
//
// Guarantees:
//   - every input entry appears exactly once in the output
//   - the output does not depend on the input order
pub fn build_tree(entries: &[TreeEntry]) -> Vec<TreeNode> {
    let mut sorted: Vec<&TreeEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| entry_order(a, b));

    let mut arena: Vec<ArenaNode> = Vec::with_capacity(sorted.len());
    let mut by_path: HashMap<&str, usize> = HashMap::with_capacity(sorted.len());
    let mut roots: Vec<usize> = Vec::new();

    for entry in sorted {
        let (parent_path, name) = split_path(&entry.path);

        let id = arena.len();
        arena.push(ArenaNode {
            node: TreeNode {
                name: name.to_string(),
                path: entry.path.clone(),
                kind: entry.kind,
                sha: entry.sha.clone(),
                size: entry.size,
                children: entry.kind.is_directory().then(Vec::new),
            },
            child_ids: Vec::new(),
        });
        by_path.insert(entry.path.as_str(), id);

        // Only a directory can adopt children; anything else is an orphan
        let parent = by_path
            .get(parent_path)
            .copied()
            .filter(|&p| p != id && arena[p].node.kind.is_directory());

        match parent {
            Some(p) if !parent_path.is_empty() => arena[p].child_ids.push(id),
            _ => roots.push(id),
        }
    }

    // Move nodes out of the arena, depth first
    let mut slots: Vec<Option<ArenaNode>> = arena.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|id| assemble(&mut slots, id))
        .collect()
}

fn assemble(slots: &mut [Option<ArenaNode>], id: usize) -> Option<TreeNode> {
    let ArenaNode { mut node, child_ids } = slots[id].take()?;

    if let Some(children) = node.children.as_mut() {
        children.extend(child_ids.into_iter().filter_map(|c| assemble(slots, c)));
    }

    Some(node)
}

/// All file paths (non-directories) in display order
pub fn flatten_files(nodes: &[TreeNode]) -> Vec<&TreeNode> {
    let mut files = Vec::new();
    collect_files(nodes, &mut files);
    files
}

fn collect_files<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a TreeNode>) {
    for node in nodes {
        match &node.children {
            Some(children) => collect_files(children, out),
            None => out.push(node),
        }
    }
}

/// Looks up a node by its full path
pub fn find_node<'a>(nodes: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.path == path {
            return Some(node);
        }
        // Only descend into directories that are real ancestors of `path`
        let inside = path
            .strip_prefix(node.path.as_str())
            .is_some_and(|rest| rest.starts_with('/'));
        if let (true, Some(children)) = (inside, &node.children) {
            if let Some(found) = find_node(children, path) {
                return Some(found);
            }
        }
    }
    None
}

/// Draws the tree with box characters, one node per line
pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut out = String::new();
    render_level(nodes, "", &mut out);
    out
}

fn render_level(nodes: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        let suffix = if node.is_directory() { "/" } else { "" };

        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&node.name);
        out.push_str(suffix);
        out.push('\n');

        if let Some(children) = &node.children {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_level(children, &child_prefix, out);
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not build the tree with references between nodes?
//    - A parent would need a mutable reference to its children while we still
//      hold references into the same Vec; the borrow checker rejects that
//    - Indices into a Vec (an "arena") have no such problem
//
// 2. What does Option::take() do in assemble()?
//    - Moves the value out and leaves None behind
//    - Each arena slot is consumed exactly once, so no node is cloned
//
// 3. Why sort before building?
//    - "src" sorts before "src/main.rs", so a parent directory is always
//      registered before its children are looked up
//    - Directories first means no file is processed before a directory that
//      could contain it
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str) -> TreeEntry {
        TreeEntry::new(path, EntryKind::Blob, format!("sha-{}", path))
    }

    fn dir(path: &str) -> TreeEntry {
        TreeEntry::new(path, EntryKind::Tree, format!("sha-{}", path))
    }

    fn all_paths(nodes: &[TreeNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.path.clone());
            if let Some(children) = &node.children {
                all_paths(children, out);
            }
        }
    }

    fn sample() -> Vec<TreeEntry> {
        vec![
            blob("src/main.rs"),
            blob("README.md"),
            dir("src"),
            dir("src/github"),
            blob("src/github/mod.rs"),
            blob("Cargo.toml"),
            dir("docs"),
        ]
    }

    #[test]
    fn test_directory_ordering() {
        let tree = build_tree(&[blob("z.txt"), dir("a"), blob("m.txt")]);
        let names: Vec<_> = tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(names, vec!["a", "m.txt", "z.txt"]);
    }

    #[test]
    fn test_nesting_and_children_containers() {
        let tree = build_tree(&sample());
        let roots: Vec<_> = tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(roots, vec!["docs", "src", "Cargo.toml", "README.md"]);

        // Empty directory still has a children container
        assert_eq!(tree[0].children, Some(vec![]));

        let src = &tree[1];
        let src_children: Vec<_> = src
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|n| n.path.as_str())
            .collect();
        assert_eq!(src_children, vec!["src/github", "src/main.rs"]);

        // Files never have one
        assert_eq!(tree[2].children, None);
        assert_eq!(tree[2].name, "Cargo.toml");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = sample();
        let mut reversed = sample();
        reversed.reverse();
        let mut rotated = sample();
        rotated.rotate_left(3);

        let expected = build_tree(&forward);
        assert_eq!(build_tree(&reversed), expected);
        assert_eq!(build_tree(&rotated), expected);
    }

    #[test]
    fn test_every_entry_appears_exactly_once() {
        let entries = sample();
        let tree = build_tree(&entries);

        let mut seen = Vec::new();
        all_paths(&tree, &mut seen);
        seen.sort();

        let mut expected: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let tree = build_tree(&[blob("a/b/c.txt")]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].path, "a/b/c.txt");
        assert_eq!(tree[0].name, "c.txt");
    }

    #[test]
    fn test_orphan_with_partial_ancestors() {
        // "a" is listed but "a/b" is not
        let tree = build_tree(&[dir("a"), blob("a/b/c.txt"), blob("a/d.txt")]);
        let roots: Vec<_> = tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(roots, vec!["a", "a/b/c.txt"]);
        assert_eq!(tree[0].children.as_ref().unwrap()[0].path, "a/d.txt");
    }

    #[test]
    fn test_submodule_is_a_leaf() {
        let tree = build_tree(&[
            dir("vendor"),
            TreeEntry::new("vendor/lib", EntryKind::Commit, "c1"),
        ]);
        let child = &tree[0].children.as_ref().unwrap()[0];
        assert_eq!(child.kind, EntryKind::Commit);
        assert!(!child.is_directory());
    }

    #[test]
    fn test_empty_listing() {
        assert!(build_tree(&[]).is_empty());
    }

    #[test]
    fn test_flatten_and_find() {
        let tree = build_tree(&sample());
        let files: Vec<_> = flatten_files(&tree).iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            files,
            vec!["src/github/mod.rs", "src/main.rs", "Cargo.toml", "README.md"]
        );

        assert_eq!(find_node(&tree, "src/github/mod.rs").unwrap().name, "mod.rs");
        assert!(find_node(&tree, "src/nope.rs").is_none());
    }

    #[test]
    fn test_find_node_respects_path_boundaries() {
        let tree = build_tree(&[
            dir("src"),
            blob("src/lib.rs"),
            dir("srcx"),
            blob("srcx/lib.rs"),
            blob("srcfile.txt"),
        ]);
        assert_eq!(find_node(&tree, "srcx/lib.rs").unwrap().path, "srcx/lib.rs");
        assert_eq!(find_node(&tree, "srcfile.txt").unwrap().path, "srcfile.txt");
        assert_eq!(find_node(&tree, "src/lib.rs").unwrap().path, "src/lib.rs");
        assert!(find_node(&tree, "src/x/lib.rs").is_none());

        // An orphan kept at the root is found even though its ancestor exists
        let tree = build_tree(&[dir("a"), blob("a/b/c.txt")]);
        assert_eq!(find_node(&tree, "a/b/c.txt").unwrap().name, "c.txt");
    }

    #[test]
    fn test_render_tree() {
        let tree = build_tree(&[dir("src"), blob("src/lib.rs"), blob("README.md")]);
        assert_eq!(
            render_tree(&tree),
            "├── src/\n│   └── lib.rs\n└── README.md\n"
        );
    }
}
