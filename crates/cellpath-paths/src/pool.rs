//! Fixed-capacity search node storage with epoch-based lazy invalidation.

/// Link value meaning "no node".
pub(crate) const NONE: u32 = u32::MAX;

/// Where a node stands in the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    Unvisited,
    Open,
    Closed,
}

/// Per-cell search bookkeeping. Only meaningful while `epoch` matches the
/// pool's current epoch.
#[derive(Debug, Clone)]
pub(crate) struct SearchNode {
    pub(crate) epoch: u32,
    pub(crate) parent: u32,
    /// Accumulated edge cost from the start.
    pub(crate) g: f32,
    /// `g` plus the heuristic estimate; the open-set key.
    pub(crate) f: f32,
    pub(crate) heap_index: u32,
    /// Push order within the run, used to break `f` ties.
    pub(crate) seq: u32,
    pub(crate) closed: bool,
    pub(crate) is_goal: bool,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            epoch: 0,
            parent: NONE,
            g: f32::INFINITY,
            f: f32::INFINITY,
            heap_index: NONE,
            seq: 0,
            closed: false,
            is_goal: false,
        }
    }
}

impl SearchNode {
    /// Forget everything from earlier runs and stamp with `epoch`.
    /// `is_goal` survives: goals are marked before nodes are touched.
    #[inline]
    fn reuse(&mut self, epoch: u32) {
        self.epoch = epoch;
        self.parent = NONE;
        self.g = f32::INFINITY;
        self.f = f32::INFINITY;
        self.heap_index = NONE;
        self.closed = false;
    }

    #[inline]
    pub(crate) fn state(&self) -> NodeState {
        if self.heap_index != NONE {
            NodeState::Open
        } else if self.closed {
            NodeState::Closed
        } else {
            NodeState::Unvisited
        }
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<usize> {
        (self.parent != NONE).then_some(self.parent as usize)
    }
}

/// One [`SearchNode`] per cell of the largest grid the engine accepts,
/// allocated once.
///
/// Instead of clearing every node before a run, the pool advances an epoch
/// counter and nodes are reset the first time a run touches them. When the
/// counter would pass `limit`, all nodes are rewritten with epoch 0 and
/// counting restarts at 1.
pub(crate) struct NodePool {
    pub(crate) nodes: Vec<SearchNode>,
    epoch: u32,
    limit: u32,
}

impl NodePool {
    pub(crate) fn new(capacity: usize, limit: u32) -> Self {
        Self {
            nodes: vec![SearchNode::default(); capacity],
            epoch: 0,
            limit,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Start a new run. Returns `true` if a full reset was needed first.
    pub(crate) fn advance(&mut self) -> bool {
        if self.epoch >= self.limit {
            self.reset();
            self.epoch = 1;
            return true;
        }
        self.epoch += 1;
        false
    }

    /// Rewrite every node with epoch 0 and restart the counter.
    pub(crate) fn reset(&mut self) {
        for n in self.nodes.iter_mut() {
            n.reuse(0);
            n.is_goal = false;
        }
        self.epoch = 0;
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> &SearchNode {
        &self.nodes[idx]
    }

    /// Whether `idx` was touched during the current run.
    #[inline]
    pub(crate) fn is_current(&self, idx: usize) -> bool {
        self.nodes[idx].epoch == self.epoch
    }

    /// Bring `idx` into the current run, resetting it if it is stale.
    #[inline]
    pub(crate) fn touch(&mut self, idx: usize) -> &mut SearchNode {
        let epoch = self.epoch;
        let n = &mut self.nodes[idx];
        if n.epoch != epoch {
            n.reuse(epoch);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_resets_stale_nodes_only() {
        let mut pool = NodePool::new(4, 100);
        pool.advance();
        {
            let n = pool.touch(2);
            n.g = 3.0;
            n.parent = 1;
        }
        // Same epoch: untouched.
        assert_eq!(pool.touch(2).g, 3.0);
        assert!(pool.is_current(2));
        assert!(!pool.is_current(3));

        pool.advance();
        assert!(!pool.is_current(2));
        // Stale value still stored until touched.
        assert_eq!(pool.get(2).g, 3.0);
        let n = pool.touch(2);
        assert_eq!(n.g, f32::INFINITY);
        assert_eq!(n.parent(), None);
        assert_eq!(n.state(), NodeState::Unvisited);
    }

    #[test]
    fn advance_resets_at_limit() {
        let mut pool = NodePool::new(3, 2);
        assert!(!pool.advance());
        assert_eq!(pool.epoch(), 1);
        pool.touch(0).g = 1.0;
        assert!(!pool.advance());
        assert_eq!(pool.epoch(), 2);
        pool.touch(1).g = 2.0;
        assert!(pool.advance());
        assert_eq!(pool.epoch(), 1);
        // Node 0 was stamped with epoch 1 before the reset; it must not
        // look current now.
        assert!(!pool.is_current(0));
        assert_eq!(pool.get(0).epoch, 0);
        assert_eq!(pool.get(1).g, f32::INFINITY);
    }

    #[test]
    fn state_follows_heap_and_closed_flags() {
        let mut n = SearchNode::default();
        assert_eq!(n.state(), NodeState::Unvisited);
        n.heap_index = 0;
        assert_eq!(n.state(), NodeState::Open);
        n.heap_index = NONE;
        n.closed = true;
        assert_eq!(n.state(), NodeState::Closed);
    }
}
