//! The commit graph and its traversal algorithms.
//!
//! [`CommitGraph`] stores commits in a [`HashMap`] and maintains a
//! forward-edge index (`children`) alongside the parent links recorded in
//! each commit. Root commits (those with no parents) are tracked separately.
//!
//! # Invariants
//!
//! - The graph is acyclic: commits are content addressed, so a commit can
//!   only name parents that existed before it.
//! - After [`CommitGraph::load`] every parent reference resolves.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use arbor_store::{Contents, ObjectDb};
use arbor_types::{ObjectId, Timestamp};
use tracing::debug;

use crate::error::{DagError, DagResult};
use crate::node::CommitInfo;

/// History reachable from a set of head commits.
///
/// The graph is a derived structure: it can always be rebuilt from the
/// object store with [`load`](CommitGraph::load).
#[derive(Clone, Debug, Default)]
pub struct CommitGraph {
    /// All commits, keyed by their ObjectId.
    nodes: HashMap<ObjectId, CommitInfo>,
    /// Forward-edge index: parent -> children.
    children: HashMap<ObjectId, Vec<ObjectId>>,
    /// Commits with no parents.
    roots: Vec<ObjectId>,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk parent links from `heads` and load every reachable commit.
    pub async fn load<V: Contents>(db: &ObjectDb<V>, heads: &[ObjectId]) -> DagResult<Self> {
        let mut graph = Self::new();
        let mut queue: VecDeque<ObjectId> = heads.iter().copied().collect();
        let mut seen: HashSet<ObjectId> = heads.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            let commit = db
                .read_commit(&id)
                .await?
                .ok_or(DagError::CommitNotFound(id))?;
            for parent in &commit.parents {
                if seen.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
            graph.insert(CommitInfo::new(id, commit));
        }

        graph.validate()?;
        debug!(
            heads = heads.len(),
            commits = graph.len(),
            roots = graph.roots.len(),
            "loaded commit graph"
        );
        Ok(graph)
    }

    /// Total number of commits in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.nodes.contains_key(id)
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Record a commit. Re-adding a known commit is a no-op.
    fn insert(&mut self, info: CommitInfo) {
        if self.nodes.contains_key(&info.id) {
            return;
        }
        for parent in &info.parents {
            self.children.entry(*parent).or_default().push(info.id);
        }
        if info.is_root() {
            self.roots.push(info.id);
        }
        self.nodes.insert(info.id, info);
    }

    /// Check that every parent reference resolves.
    pub fn validate(&self) -> DagResult<()> {
        for info in self.nodes.values() {
            for parent in &info.parents {
                if !self.nodes.contains_key(parent) {
                    return Err(DagError::DanglingParent {
                        commit: info.id,
                        parent: *parent,
                    });
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    pub fn get(&self, id: &ObjectId) -> Option<&CommitInfo> {
        self.nodes.get(id)
    }

    /// All root commits, oldest first.
    pub fn roots(&self) -> Vec<&CommitInfo> {
        let mut roots: Vec<&CommitInfo> =
            self.roots.iter().filter_map(|id| self.nodes.get(id)).collect();
        roots.sort_by_key(|c| (c.timestamp(), c.id));
        roots
    }

    /// Direct children of a commit within the graph.
    pub fn children(&self, id: &ObjectId) -> &[ObjectId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // ---------------------------------------------------------------
    // Ancestry
    // ---------------------------------------------------------------

    /// All proper ancestors of a commit (BFS upward).
    ///
    /// Returns an empty vec if the commit is not in the graph.
    pub fn ancestors(&self, id: &ObjectId) -> Vec<&CommitInfo> {
        let mut set = self.closure(id);
        set.remove(id);
        let mut result: Vec<&CommitInfo> = set.iter().filter_map(|a| self.nodes.get(a)).collect();
        result.sort_by_key(|c| Reverse((c.timestamp(), c.id)));
        result
    }

    /// Returns `true` if `ancestor` is `descendant` or reachable from it
    /// through parent links.
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> bool {
        if !self.nodes.contains_key(ancestor) || !self.nodes.contains_key(descendant) {
            return false;
        }
        if ancestor == descendant {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([*descendant]);
        while let Some(current) = queue.pop_front() {
            let Some(info) = self.nodes.get(&current) else {
                continue;
            };
            for parent in &info.parents {
                if parent == ancestor {
                    return true;
                }
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }
        false
    }

    /// The commit and all its ancestors.
    fn closure(&self, id: &ObjectId) -> HashSet<ObjectId> {
        let mut visited = HashSet::new();
        if !self.nodes.contains_key(id) {
            return visited;
        }
        let mut queue = VecDeque::from([*id]);
        visited.insert(*id);
        while let Some(current) = queue.pop_front() {
            if let Some(info) = self.nodes.get(&current) {
                for parent in &info.parents {
                    if visited.insert(*parent) {
                        queue.push_back(*parent);
                    }
                }
            }
        }
        visited
    }

    // ---------------------------------------------------------------
    // Common ancestor
    // ---------------------------------------------------------------

    /// Find a lowest common ancestor of two commits.
    ///
    /// Common ancestors are the commits reachable from both sides (each side
    /// included). The lowest ones are those that are not a proper ancestor
    /// of another common ancestor. Criss-cross histories can have several;
    /// the newest by timestamp wins, then the greater key.
    pub fn common_ancestor(&self, a: &ObjectId, b: &ObjectId) -> Option<&CommitInfo> {
        self.lowest_common_ancestors(a, b)
            .into_iter()
            .max_by_key(|c| (c.timestamp(), c.id))
    }

    /// All lowest common ancestors of two commits, newest first.
    pub fn lowest_common_ancestors(&self, a: &ObjectId, b: &ObjectId) -> Vec<&CommitInfo> {
        if !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return Vec::new();
        }
        if a == b {
            return self.nodes.get(a).into_iter().collect();
        }

        let ancestors_a = self.closure(a);
        let ancestors_b = self.closure(b);
        let common: HashSet<ObjectId> = ancestors_a.intersection(&ancestors_b).copied().collect();

        // Everything strictly above a common ancestor is dominated by it.
        let mut dominated = HashSet::new();
        let mut queue: VecDeque<ObjectId> = common
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .flat_map(|info| info.parents.iter().copied())
            .collect();
        while let Some(current) = queue.pop_front() {
            if !dominated.insert(current) {
                continue;
            }
            if let Some(info) = self.nodes.get(&current) {
                queue.extend(info.parents.iter().copied());
            }
        }

        let mut lowest: Vec<&CommitInfo> = common
            .iter()
            .filter(|id| !dominated.contains(*id))
            .filter_map(|id| self.nodes.get(id))
            .collect();
        lowest.sort_by_key(|c| Reverse((c.timestamp(), c.id)));
        lowest
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    /// Commits reachable from `head`, newest first.
    ///
    /// A commit is listed only after every reachable commit that names it
    /// as a parent. Among commits that are ready at the same time, the
    /// newest timestamp goes first.
    pub fn history(&self, head: &ObjectId) -> Vec<&CommitInfo> {
        let reachable = self.closure(head);

        // Pending children per commit, restricted to the reachable set.
        let mut pending: HashMap<ObjectId, usize> = HashMap::new();
        for id in &reachable {
            if let Some(info) = self.nodes.get(id) {
                for parent in &info.parents {
                    *pending.entry(*parent).or_default() += 1;
                }
            }
        }

        let mut ready: BinaryHeap<(Timestamp, ObjectId)> = BinaryHeap::new();
        if let Some(info) = self.nodes.get(head) {
            ready.push((info.timestamp(), info.id));
        }

        let mut result = Vec::with_capacity(reachable.len());
        while let Some((_, id)) = ready.pop() {
            let Some(info) = self.nodes.get(&id) else {
                continue;
            };
            result.push(info);
            for parent in &info.parents {
                if let Some(count) = pending.get_mut(parent) {
                    *count -= 1;
                    if *count == 0 {
                        if let Some(p) = self.nodes.get(parent) {
                            ready.push((p.timestamp(), p.id));
                        }
                    }
                }
            }
        }
        result
    }
}
