//! List reconciliation - Flatten a sequence and morph the old run into it.
//!
//! Old nodes are claimed by the new items in four passes, each only
//! looking at what earlier passes left unclaimed:
//!
//! 1. identity: a passed-through node claims itself
//! 2. equal text: a text item claims an old text node with the same content
//! 3. position: an item claims the old node at its index when compatible
//!    (text for text, same tag for an element)
//! 4. same tag: an element item claims the first remaining element with its tag
//!
//! Claimed nodes are patched in place, unclaimed items are created, and
//! the sequence diff moves everything into order. Old nodes nobody
//! claimed are removed and released.

use std::collections::HashSet;

use log::debug;

use super::diff::diff;
use super::rendered::Rendered;
use super::Renderer;
use crate::error::{RenderError, Result};
use crate::primitives::{ElementSpec, View};
use crate::tree::TargetTree;
use crate::types::NodeId;

/// A flattened sequence item.
#[derive(Debug)]
pub(crate) enum Item {
    Text(String),
    Node(NodeId),
    Element(ElementSpec),
}

impl<T: TargetTree + 'static> Renderer<T> {
    /// Reconcile `container`'s region, currently holding `previous`, with a
    /// sequence of values.
    pub fn reconcile(
        &self,
        container: NodeId,
        items: Vec<View>,
        previous: Option<Rendered>,
    ) -> Result<Rendered> {
        self.patch_view(container, View::Sequence(items), previous)
    }

    /// Flatten nested sequences, drop empty values and sample reactive
    /// ones. Reading a reactive item subscribes the enclosing computation.
    pub(crate) fn flatten(&self, views: Vec<View>) -> Vec<Item> {
        let mut items = Vec::with_capacity(views.len());
        flatten_into(views, &mut items);
        items
    }

    pub(crate) fn reconcile_items(
        &self,
        container: NodeId,
        items: Vec<Item>,
        old: &[NodeId],
    ) -> Result<Rendered> {
        let tree = self.tree();
        let mut claimed = vec![false; old.len()];
        let mut owner: Vec<Option<usize>> = vec![None; items.len()];
        let mut tags: Vec<Option<String>> = Vec::with_capacity(items.len());
        for item in &items {
            tags.push(match item {
                Item::Element(spec) => Some(self.tag_for(spec)?),
                _ => None,
            });
        }

        // identity
        for (j, item) in items.iter().enumerate() {
            if let Item::Node(node) = item {
                if let Some(i) = old.iter().position(|o| o == node) {
                    if !claimed[i] {
                        claimed[i] = true;
                        owner[j] = Some(i);
                    }
                }
            }
        }

        // equal text
        for (j, item) in items.iter().enumerate() {
            let Item::Text(text) = item else { continue };
            if owner[j].is_some() {
                continue;
            }
            let found = (0..old.len()).find(|&i| {
                !claimed[i] && tree.is_text(old[i]) && tree.text(old[i]).as_deref() == Some(text.as_str())
            });
            if let Some(i) = found {
                claimed[i] = true;
                owner[j] = Some(i);
            }
        }

        // position
        for (j, item) in items.iter().enumerate() {
            if owner[j].is_some() || j >= old.len() || claimed[j] {
                continue;
            }
            let compatible = match item {
                Item::Text(_) => tree.is_text(old[j]),
                Item::Element(_) => tags[j].as_deref().is_some_and(|tag| tree.is_same_element(old[j], tag)),
                Item::Node(_) => false,
            };
            if compatible {
                claimed[j] = true;
                owner[j] = Some(j);
            }
        }

        // same tag
        for j in 0..items.len() {
            let Some(tag) = tags[j].as_deref() else { continue };
            if owner[j].is_some() {
                continue;
            }
            if let Some(i) = (0..old.len()).find(|&i| !claimed[i] && tree.is_same_element(old[i], tag)) {
                claimed[i] = true;
                owner[j] = Some(i);
            }
        }

        let mut seen = HashSet::with_capacity(items.len());
        let mut wanted = Vec::with_capacity(items.len());
        for (item, owner) in items.into_iter().zip(owner) {
            let node = match (item, owner) {
                (Item::Node(node), _) => {
                    if !tree.contains(node) {
                        return Err(RenderError::UnknownNode(node));
                    }
                    node
                }
                (Item::Text(text), Some(i)) => {
                    let node = old[i];
                    if tree.text(node).as_deref() != Some(text.as_str()) {
                        tree.set_text(node, &text)?;
                    }
                    node
                }
                (Item::Text(text), None) => tree.create_text(&text),
                (Item::Element(spec), Some(i)) => {
                    self.update(old[i], spec)?;
                    old[i]
                }
                (Item::Element(spec), None) => self.materialize_in(Some(container), spec)?,
            };
            if !seen.insert(node) {
                return Err(RenderError::DuplicateNode(node));
            }
            wanted.push(node);
        }

        let inserted: Vec<NodeId> = wanted
            .iter()
            .copied()
            .filter(|&node| tree.parent(node) != Some(container))
            .collect();
        diff(tree.as_ref(), container, old, &wanted)?;

        let stale: Vec<NodeId> = old.iter().copied().filter(|n| !seen.contains(n)).collect();
        self.discard(container, &stale)?;
        self.notify_inserted(&inserted);
        debug!(
            "reconcile {}: {} old, {} new, {} dropped",
            container,
            old.len(),
            wanted.len(),
            stale.len()
        );
        Ok(Rendered::List(wanted))
    }
}

fn flatten_into(views: Vec<View>, items: &mut Vec<Item>) {
    for view in views {
        match view {
            View::Text(text) => items.push(Item::Text(text)),
            View::Empty(_) => {}
            View::Reactive(getter) => flatten_into(vec![getter()], items),
            View::Sequence(nested) => flatten_into(nested, items),
            View::Node(node) => items.push(Item::Node(node)),
            View::Element(spec) => items.push(Item::Element(spec)),
        }
    }
}
