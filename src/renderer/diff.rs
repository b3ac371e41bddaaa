//! Sequence diff - Reorders a parent's children from one node list to another.
//!
//! A four-pointer diff in the style of udomdiff: both lists are trimmed
//! from the front and the back, the cheap shapes (append, removal, single
//! swap, reversed pair) are handled directly, and everything else falls
//! back to a map of new positions.
//!
//! # Algorithm
//!
//! `a` is the current list (attached, contiguous), `b` the wanted one.
//! Every node of `b` that is also in `a` is moved, never recreated. Nodes
//! of `a` missing from `b` are removed or replaced.
//!
//! 1. Range of `a` exhausted: insert what is left of `b` before the node
//!    following the processed prefix (or after the old range).
//! 2. Range of `b` exhausted: remove what is left of `a`, except nodes
//!    that still appear in `b`.
//! 3. Common prefix / common suffix: skip.
//! 4. One node left on each side: replace it, or insert when the old node
//!    is still needed somewhere else.
//! 5. Reversed pair at the boundaries: two moves.
//! 6. Otherwise look the old head up in the map of new positions. If it
//!    starts a run of nodes already in the right order that is longer than
//!    the gap in front of it, insert the gap before it; else replace it by
//!    the next wanted node.

use std::collections::HashMap;

use log::trace;

use crate::error::TreeError;
use crate::tree::TargetTree;
use crate::types::NodeId;

/// Reorder `parent`'s children so that the run currently holding `a`
/// holds `b` instead.
pub fn diff<T: TargetTree + ?Sized>(
    tree: &T,
    parent: NodeId,
    a: &[NodeId],
    b: &[NodeId],
) -> Result<(), TreeError> {
    let mut a = a.to_vec();
    let b_length = b.len();
    let mut a_end = a.len();
    let mut b_end = b_length;
    let mut a_start = 0;
    let mut b_start = 0;

    let Some(&last) = a.last() else {
        for &node in b {
            trace!("diff: append {}", node);
            tree.append_child(parent, node)?;
        }
        return Ok(());
    };
    let after = tree.next_sibling(last);
    let mut map: Option<HashMap<NodeId, usize>> = None;

    while a_start < a_end || b_start < b_end {
        if a_end == a_start {
            // append
            let node = if b_end < b_length {
                if b_start > 0 {
                    tree.next_sibling(b[b_start - 1])
                } else {
                    Some(b[b_end - b_start])
                }
            } else {
                after
            };
            while b_start < b_end {
                trace!("diff: insert {} before {:?}", b[b_start], node);
                tree.insert_before(parent, b[b_start], node)?;
                b_start += 1;
            }
        } else if b_end == b_start {
            // remove
            while a_start < a_end {
                let pending = map.as_ref().is_some_and(|m| m.contains_key(&a[a_start]));
                if !pending {
                    trace!("diff: remove {}", a[a_start]);
                    tree.remove_child(parent, a[a_start])?;
                }
                a_start += 1;
            }
        } else if a[a_start] == b[b_start] {
            // common prefix
            a_start += 1;
            b_start += 1;
        } else if a[a_end - 1] == b[b_end - 1] {
            // common suffix
            a_end -= 1;
            b_end -= 1;
        } else if a_end - a_start == 1 && b_end - b_start == 1 {
            // single swap
            let pending = map.as_ref().is_some_and(|m| m.contains_key(&a[a_start]));
            if pending || tree.parent(a[a_start]) != Some(parent) {
                let reference = if b_end < b_length { Some(b[b_end]) } else { after };
                trace!("diff: insert {} before {:?}", b[b_start], reference);
                tree.insert_before(parent, b[b_start], reference)?;
            } else {
                trace!("diff: replace {} with {}", a[a_start], b[b_start]);
                tree.replace_child(parent, b[b_start], a[a_start])?;
            }
            break;
        } else if a[a_start] == b[b_end - 1] && b[b_start] == a[a_end - 1] {
            // reversed pair
            a_end -= 1;
            let node = tree.next_sibling(a[a_end]);
            let first = tree.next_sibling(a[a_start]);
            trace!("diff: swap {} and {}", b[b_start], a[a_start]);
            tree.insert_before(parent, b[b_start], first)?;
            b_start += 1;
            a_start += 1;
            b_end -= 1;
            tree.insert_before(parent, b[b_end], node)?;
            a[a_end] = b[b_end];
        } else {
            // map of new positions
            let map = map.get_or_insert_with(|| (b_start..b_end).map(|i| (b[i], i)).collect());
            match map.get(&a[a_start]).copied() {
                Some(index) if b_start < index && index < b_end => {
                    let mut i = a_start;
                    let mut sequence = 1;
                    loop {
                        i += 1;
                        if i >= a_end || i >= b_end {
                            break;
                        }
                        if map.get(&a[i]) != Some(&(index + sequence)) {
                            break;
                        }
                        sequence += 1;
                    }

                    if sequence > index - b_start {
                        let node = a[a_start];
                        while b_start < index {
                            trace!("diff: insert {} before {}", b[b_start], node);
                            tree.insert_before(parent, b[b_start], Some(node))?;
                            b_start += 1;
                        }
                    } else {
                        trace!("diff: replace {} with {}", a[a_start], b[b_start]);
                        tree.replace_child(parent, b[b_start], a[a_start])?;
                        b_start += 1;
                        a_start += 1;
                    }
                }
                Some(_) => a_start += 1,
                None => {
                    trace!("diff: remove {}", a[a_start]);
                    tree.remove_child(parent, a[a_start])?;
                    a_start += 1;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;

    /// Attach `count` text nodes ("0", "1", ...) under the root.
    fn setup(count: usize) -> (Document, Vec<NodeId>) {
        let doc = Document::new();
        let nodes: Vec<NodeId> = (0..count).map(|i| doc.create_text(&i.to_string())).collect();
        for &n in &nodes {
            doc.append_child(doc.root(), n).unwrap();
        }
        doc.clear_mutations();
        (doc, nodes)
    }

    fn run(doc: &Document, a: &[NodeId], b: &[NodeId]) {
        diff(doc, doc.root(), a, b).unwrap();
        assert_eq!(doc.children(doc.root()), b.to_vec(), "children should match the new list");
    }

    #[test]
    fn test_identical_lists_do_nothing() {
        let (doc, n) = setup(4);
        run(&doc, &n, &n);
        assert_eq!(doc.counts().structural(), 0);
    }

    #[test]
    fn test_append_single() {
        let (doc, n) = setup(3);
        let d = doc.create_text("d");
        run(&doc, &n, &[n[0], n[1], n[2], d]);
        let counts = doc.counts();
        assert_eq!(counts.inserts, 1);
        assert_eq!(counts.removes + counts.replaces, 0);
    }

    #[test]
    fn test_prepend_and_insert_middle() {
        let (doc, n) = setup(3);
        let x = doc.create_text("x");
        let y = doc.create_text("y");
        run(&doc, &n, &[x, n[0], y, n[1], n[2]]);
        assert_eq!(doc.counts().inserts, 2);
        assert_eq!(doc.counts().removes, 0);
    }

    #[test]
    fn test_remove_tail_and_middle() {
        let (doc, n) = setup(5);
        run(&doc, &n, &[n[0], n[2], n[3]]);
        assert_eq!(doc.counts().removes, 2);
        assert_eq!(doc.counts().inserts, 0);
    }

    #[test]
    fn test_reverse_pair() {
        let (doc, n) = setup(2);
        run(&doc, &n, &[n[1], n[0]]);
        assert!(doc.counts().structural() <= 2);
        assert_eq!(doc.counts().creates, 0);
    }

    #[test]
    fn test_swap_ends_of_longer_list() {
        let (doc, n) = setup(5);
        run(&doc, &n, &[n[4], n[1], n[2], n[3], n[0]]);
        assert!(doc.counts().structural() <= 2);
    }

    #[test]
    fn test_full_reverse() {
        let (doc, n) = setup(6);
        let reversed: Vec<NodeId> = n.iter().rev().copied().collect();
        run(&doc, &n, &reversed);
        assert_eq!(doc.counts().removes, 0, "moves only, nothing removed");
    }

    #[test]
    fn test_single_replacement() {
        let (doc, n) = setup(3);
        let x = doc.create_text("x");
        run(&doc, &n, &[n[0], x, n[2]]);
        assert_eq!(doc.counts().replaces, 1);
        assert_eq!(doc.parent(n[1]), None);
    }

    #[test]
    fn test_shuffle_with_new_and_removed() {
        let (doc, n) = setup(6);
        let x = doc.create_text("x");
        let y = doc.create_text("y");
        run(&doc, &n, &[n[3], x, n[0], n[5], y, n[1]]);
        assert_eq!(doc.parent(n[2]), None);
        assert_eq!(doc.parent(n[4]), None);
    }

    #[test]
    fn test_keeps_siblings_outside_the_run() {
        let doc = Document::new();
        let root = doc.root();
        let before = doc.create_marker("before");
        let a0 = doc.create_text("a0");
        let a1 = doc.create_text("a1");
        let tail = doc.create_marker("after");
        for n in [before, a0, a1, tail] {
            doc.append_child(root, n).unwrap();
        }
        let b0 = doc.create_text("b0");

        diff(&doc, root, &[a0, a1], &[a1, b0, a0]).unwrap();
        assert_eq!(doc.children(root), vec![before, a1, b0, a0, tail]);
    }

    #[test]
    fn test_empty_old_appends() {
        let doc = Document::new();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        diff(&doc, doc.root(), &[], &[a, b]).unwrap();
        assert_eq!(doc.children(doc.root()), vec![a, b]);
    }
}
