//! Mount API - Own a patched region for its whole lifetime.
//!
//! Mounting runs the first patch inside an effect scope, so every reactive
//! slot and binding created on the way belongs to the mount. The returned
//! [`MountHandle`] tears it all down again.
//!
//! # Example
//!
//! ```ignore
//! use spark_patch::pipeline::mount;
//!
//! let handle = mount(&renderer, doc.root(), element("main").child(view))?;
//!
//! // Later
//! handle.unmount(); // stops reactivity and removes the nodes
//! ```

use log::{debug, warn};
use spark_signals::effect_scope;

use crate::error::{RenderError, Result};
use crate::primitives::{Cleanup, View};
use crate::renderer::{Renderer, Rendered};
use crate::tree::TargetTree;
use crate::types::NodeId;

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`].
///
/// Dropping the handle stops reactivity but leaves the nodes in place;
/// [`MountHandle::unmount`] also removes them.
pub struct MountHandle {
    container: NodeId,
    result: Rendered,
    stop_scope: Option<Cleanup>,
    teardown: Option<Cleanup>,
}

impl MountHandle {
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Result of the mounted patch.
    pub fn result(&self) -> &Rendered {
        &self.result
    }

    /// Nodes currently owned by the mount.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.result.nodes()
    }

    pub fn is_mounted(&self) -> bool {
        self.stop_scope.is_some()
    }

    /// Stop every reactive slot and binding, then remove and release the
    /// mounted nodes.
    pub fn unmount(mut self) {
        self.stop();
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    fn stop(&mut self) {
        crate::renderer::stop_slots(&self.result);
        if let Some(stop) = self.stop_scope.take() {
            stop();
        }
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Patch `value` into `container` (appended after its current children)
/// and return a handle owning the result.
///
/// A failing first patch stops whatever it had already bound and returns
/// the error.
pub fn mount<T: TargetTree + 'static>(
    renderer: &Renderer<T>,
    container: NodeId,
    value: impl Into<View>,
) -> Result<MountHandle> {
    let value = value.into();

    let scope = effect_scope(false);
    let run_renderer = renderer.clone();
    let outcome = scope.run(move || run_renderer.patch(container, value, None));

    let result = match outcome {
        Some(Ok(result)) => result,
        Some(Err(err)) => {
            warn!("mount into {} failed: {}", container, err);
            scope.stop();
            return Err(err);
        }
        None => return Err(RenderError::ScopeInactive(container)),
    };
    debug!("mounted {:?} into {}", result, container);

    let teardown_renderer = renderer.clone();
    let teardown_result = result.clone();
    let teardown: Cleanup = Box::new(move || {
        let nodes = teardown_result.nodes();
        if let Err(err) = teardown_renderer.discard(container, &nodes) {
            warn!("unmount from {} failed: {}", container, err);
        }
    });

    // slots re-run outside the scope create their bindings outside it too
    let freeze_renderer = renderer.clone();
    let freeze_result = result.clone();
    let stop_scope: Cleanup = Box::new(move || {
        scope.stop();
        for node in freeze_result.nodes() {
            freeze_renderer.freeze(node);
        }
    });

    Ok(MountHandle {
        container,
        result,
        stop_scope: Some(stop_scope),
        teardown: Some(teardown),
    })
}

/// Unmount and clean up.
pub fn unmount(handle: MountHandle) {
    handle.unmount();
}

impl<T: TargetTree + 'static> Renderer<T> {
    /// See [`mount`].
    pub fn mount(&self, container: NodeId, value: impl Into<View>) -> Result<MountHandle> {
        mount(self, container, value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::primitives::element;
    use crate::tree::Document;
    use spark_signals::signal;
    use std::rc::Rc;

    fn setup() -> (Rc<Document>, Renderer<Document>) {
        let doc = Rc::new(Document::new());
        let renderer = Renderer::new(doc.clone(), RenderConfig::default());
        (doc, renderer)
    }

    #[test]
    fn test_mount_and_unmount() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let handle = renderer.mount(root, element("main").child("hello")).unwrap();
        assert_eq!(doc.inner_html(root), "<main>hello</main>");
        assert!(handle.is_mounted());

        let main = handle.nodes()[0];
        handle.unmount();
        assert!(doc.children(root).is_empty());
        assert!(!renderer.is_tracked(main));
    }

    #[test]
    fn test_unmount_stops_reactivity() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let count = signal(0);
        let c = count.clone();
        let handle = mount(&renderer, root, View::reactive(move || c.get().to_string())).unwrap();
        let node = handle.nodes()[0];
        count.set(1);
        assert_eq!(doc.text(node).as_deref(), Some("1"));

        handle.unmount();
        doc.clear_mutations();
        count.set(2);
        assert_eq!(doc.counts().total(), 0, "no writes after unmount");
    }

    #[test]
    fn test_drop_keeps_nodes() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let title = signal(String::from("a"));
        {
            let _handle = mount(&renderer, root, element("p").attr("title", title.clone())).unwrap();
        }
        assert_eq!(doc.children(root).len(), 1, "dropping a handle leaves the nodes");
        let p = doc.children(root)[0];
        title.set(String::from("b"));
        assert_eq!(doc.attribute(p, "title").as_deref(), Some("a"), "bindings stopped");
    }

    #[test]
    fn test_failed_mount_returns_error() {
        let (doc, renderer) = setup();
        let result = mount(&renderer, doc.root(), element(""));
        assert!(result.is_err());
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn test_mount_attaches_to_enclosing_scope() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let title = signal(String::from("a"));
        let outer = effect_scope(false);
        let t = title.clone();
        let r = renderer.clone();
        let handle = outer
            .run(move || mount(&r, root, element("p").attr("title", t)).unwrap())
            .unwrap();
        let p = handle.nodes()[0];

        title.set(String::from("b"));
        assert_eq!(doc.attribute(p, "title").as_deref(), Some("b"));

        outer.stop();
        title.set(String::from("c"));
        assert_eq!(doc.attribute(p, "title").as_deref(), Some("b"), "outer stop reaches the mount");
        handle.unmount();
        assert!(doc.children(root).is_empty());
    }

    #[test]
    fn test_drop_stops_bindings_created_by_reruns() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let mode = signal(String::from("light"));
        let title = signal(String::from("a"));
        let (m, t) = (mode.clone(), title.clone());
        let handle = mount(
            &renderer,
            root,
            View::reactive(move || element("p").attr("data-mode", m.get()).attr("title", t.clone())),
        )
        .unwrap();
        let p = handle.nodes()[0];

        mode.set(String::from("dark"));
        title.set(String::from("b"));
        assert_eq!(doc.attribute(p, "title").as_deref(), Some("b"));

        drop(handle);
        title.set(String::from("c"));
        mode.set(String::from("light"));
        assert_eq!(doc.attribute(p, "title").as_deref(), Some("b"));
        assert_eq!(doc.attribute(p, "data-mode").as_deref(), Some("dark"));
        assert_eq!(doc.children(root), vec![p]);
    }
}
