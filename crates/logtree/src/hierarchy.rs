//! Logger hierarchy and namespace resolution
//!
//! Loggers live in a dot-separated namespace tree. Requesting `"a.b.c"`
//! before `"a"` must still produce a correct tree, so ancestors that have
//! only been seen as a prefix are held as placeholders and promoted to real
//! nodes when they are finally requested by name:
//!
//! ```text
//! logger("a.b.c")      a.b.c ─► root          ("a.b", "a" are placeholders)
//! logger("a.b")        a.b.c ─► a.b ─► root   ("a.b" promoted, child fixed)
//! logger("a")          a.b.c ─► a.b ─► a ─► root
//! ```
//!
//! Nodes are stored in an arena and addressed by [`NodeId`]; parent links
//! are ids, so promotion rewrites identifiers rather than references. The
//! registry lives behind a `parking_lot::RwLock`, which serializes
//! placeholder promotion from concurrent callers and keeps dispatch
//! read-mostly.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{LogError, LogResult};
use crate::level::Level;
use crate::logger::Logger;
use crate::proxy::ProxyClient;
use crate::record::Processor;
use crate::sink::Sink;

/// Stable arena index of a logger node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// One named node in the tree.
pub(crate) struct Node {
    pub(crate) name: String,
    /// `None` only for the root
    pub(crate) parent: Option<NodeId>,
    /// `None` = inherit from the nearest configured ancestor
    pub(crate) level: Option<Level>,
    pub(crate) sinks: Vec<Arc<dyn Sink>>,
    pub(crate) processors: Vec<Processor>,
    pub(crate) propagate: bool,
}

/// What a dotted name currently maps to.
enum NameSlot {
    /// A real, dispatchable node
    Real(NodeId),
    /// Stand-in for an ancestor that has only been seen as a prefix;
    /// holds the nodes waiting for it to be created
    Placeholder(Vec<NodeId>),
}

/// Name→node registry plus the node arena.
pub(crate) struct Registry {
    nodes: Vec<Node>,
    by_name: HashMap<String, NameSlot>,
    root: NodeId,
    default_processors: Vec<Processor>,
}

impl Registry {
    fn new() -> Self {
        let root = Node {
            name: "root".to_string(),
            parent: None,
            level: Some(Level::INFO),
            sinks: Vec::new(),
            processors: Vec::new(),
            propagate: true,
        };
        Self {
            nodes: vec![root],
            by_name: HashMap::new(),
            root: NodeId(0),
            default_processors: Vec::new(),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn add_default_processor(&mut self, processor: Processor) {
        self.default_processors.push(processor);
    }

    /// Id of the real node registered under `name`, if one exists.
    pub(crate) fn lookup(&self, name: &str) -> Option<NodeId> {
        match self.by_name.get(name) {
            Some(NameSlot::Real(id)) => Some(*id),
            _ => None,
        }
    }

    /// Look up or create the node for `name`, maintaining parent links for
    /// the whole affected subtree.
    pub(crate) fn resolve(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.lookup(name) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: None,
            level: None,
            sinks: Vec::new(),
            // The *current* default processors attach at creation time;
            // defaults added later never retroattach.
            processors: self.default_processors.clone(),
            propagate: true,
        });

        let waiting = match self.by_name.insert(name.to_string(), NameSlot::Real(id)) {
            Some(NameSlot::Placeholder(waiting)) => waiting,
            _ => Vec::new(),
        };

        self.fix_parents(name, id);
        self.fix_children(name, id, &waiting);

        id
    }

    /// Walk the dotted prefixes of `name` outward, registering `id` with
    /// placeholders along the way, until a real ancestor (or the root) is
    /// found to become the parent.
    fn fix_parents(&mut self, name: &str, id: NodeId) {
        let mut parent = None;
        let mut key = name;

        while let Some(idx) = key.rfind('.') {
            key = &key[..idx];
            match self.by_name.entry(key.to_string()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(NameSlot::Placeholder(vec![id]));
                }
                Entry::Occupied(mut occupied) => match occupied.get_mut() {
                    NameSlot::Placeholder(waiting) => waiting.push(id),
                    NameSlot::Real(ancestor) => {
                        parent = Some(*ancestor);
                        break;
                    }
                },
            }
        }

        self.nodes[id.0].parent = Some(parent.unwrap_or(self.root));
    }

    /// Re-parent the placeholder's waiting nodes under the newly created
    /// node — except those whose parent already resolved to a node nested
    /// below `name`, which must not be yanked upward.
    fn fix_children(&mut self, name: &str, id: NodeId, waiting: &[NodeId]) {
        for &child in waiting {
            let correctly_nested = match self.nodes[child.0].parent {
                Some(parent) => is_strictly_below(&self.nodes[parent.0].name, name),
                None => false,
            };
            if !correctly_nested {
                self.nodes[child.0].parent = Some(id);
            }
        }
    }

    /// Nearest configured level from `id` up to the root.
    pub(crate) fn effective_level(&self, id: NodeId) -> Option<Level> {
        let mut cur = Some(id);
        while let Some(node_id) = cur {
            let node = &self.nodes[node_id.0];
            if node.level.is_some() {
                return node.level;
            }
            cur = node.parent;
        }
        None
    }

    /// Snapshot of every sink the record will be offered to, in dispatch
    /// order: the origin's sinks, then each ancestor's while `propagate`
    /// holds.
    pub(crate) fn dispatch_sinks(&self, id: NodeId) -> Vec<Arc<dyn Sink>> {
        let mut sinks = Vec::new();
        let mut cur = Some(id);
        while let Some(node_id) = cur {
            let node = &self.nodes[node_id.0];
            sinks.extend(node.sinks.iter().cloned());
            if !node.propagate {
                break;
            }
            cur = node.parent;
        }
        sinks
    }

    /// Snapshot of a node's processor chain.
    pub(crate) fn processors(&self, id: NodeId) -> Vec<Processor> {
        self.nodes[id.0].processors.clone()
    }

    /// Every attached sink, deduplicated by identity (a sink shared between
    /// loggers appears once).
    fn distinct_sinks(&self) -> Vec<Arc<dyn Sink>> {
        let mut seen: Vec<*const ()> = Vec::new();
        let mut sinks = Vec::new();
        for node in &self.nodes {
            for sink in &node.sinks {
                let ptr = Arc::as_ptr(sink) as *const ();
                if !seen.contains(&ptr) {
                    seen.push(ptr);
                    sinks.push(sink.clone());
                }
            }
        }
        sinks
    }
}

/// True when `name` is nested strictly below `ancestor` in the dotted
/// namespace.
fn is_strictly_below(name: &str, ancestor: &str) -> bool {
    name.len() > ancestor.len()
        && name.starts_with(ancestor)
        && name.as_bytes()[ancestor.len()] == b'.'
}

/// Shared state behind every [`Hierarchy`] and [`Logger`] handle.
pub(crate) struct Shared {
    pub(crate) registry: RwLock<Registry>,
    pub(crate) proxy: RwLock<Option<ProxyClient>>,
}

/// Registry + root owning all loggers for one logging domain.
///
/// Cheap to clone; clones share the same tree. One hierarchy is typically
/// constructed at startup and threaded through the application, with
/// [`crate::default_hierarchy`] available as the process-wide instance.
#[derive(Clone)]
pub struct Hierarchy {
    pub(crate) shared: Arc<Shared>,
}

impl Hierarchy {
    /// Create an empty hierarchy. The root logger is real from the start
    /// and defaults to level INFO.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: RwLock::new(Registry::new()),
                proxy: RwLock::new(None),
            }),
        }
    }

    /// The root logger.
    pub fn root(&self) -> Logger {
        let root = self.shared.registry.read().root();
        self.handle(root)
    }

    /// Return a stable logger for a dotted name, creating intermediate
    /// structure as needed. The empty name returns the root.
    ///
    /// Requesting the same name twice always yields the same node.
    ///
    /// # Errors
    ///
    /// `LogError::InvalidName` when the name has an empty path segment
    /// (leading/trailing dot, `".."`).
    pub fn logger(&self, name: &str) -> LogResult<Logger> {
        if name.is_empty() {
            return Ok(self.root());
        }
        if name.split('.').any(|segment| segment.is_empty()) {
            return Err(LogError::InvalidName(name.to_string()));
        }
        // Fast path: dispatch-time lookups of existing loggers stay on the
        // read lock.
        if let Some(id) = self.shared.registry.read().lookup(name) {
            return Ok(self.handle(id));
        }
        let id = self.shared.registry.write().resolve(name);
        Ok(self.handle(id))
    }

    /// Attach a processor applied to every logger created from now on.
    /// Already-created loggers are unaffected.
    pub fn add_default_processor(&self, processor: Processor) {
        self.shared
            .registry
            .write()
            .add_default_processor(processor);
    }

    /// Attach an explicit outbound proxy client. Every record that passes
    /// its origin gate is also shipped over the proxy from now on.
    pub fn set_proxy(&self, client: ProxyClient) {
        *self.shared.proxy.write() = Some(client);
    }

    /// Attach a proxy client discovered from the environment.
    ///
    /// # Errors
    ///
    /// `LogError::ProxyUnavailable` when no endpoint is published;
    /// `LogError::Io` when connecting to the published endpoint fails.
    pub fn enable_proxy(&self) -> LogResult<()> {
        let client = ProxyClient::from_env()?;
        self.set_proxy(client);
        Ok(())
    }

    /// Call [`Sink::reset`] once on every distinct attached sink.
    ///
    /// This is the maintenance sweep to run after external log rotation.
    /// Every sink is attempted; the first error is returned afterwards.
    pub fn reset_sinks(&self) -> io::Result<()> {
        let sinks = self.shared.registry.read().distinct_sinks();
        let mut first_err = None;
        for sink in sinks {
            if let Err(err) = sink.reset() {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn handle(&self, id: NodeId) -> Logger {
        let name = self.shared.registry.read().node(id).name.clone();
        Logger::new(self.shared.clone(), id, name)
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}
