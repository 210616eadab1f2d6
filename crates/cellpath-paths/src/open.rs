//! Binary min-heap over node indices with in-place decrease-key.
//!
//! Each node records its own position in the heap (`heap_index`), so an
//! improved node can be sifted up without searching the array.

use crate::pool::{NONE, SearchNode};

/// Open set of the current run, ordered by `f` then by push order.
pub(crate) struct OpenSet {
    heap: Vec<u32>,
    next_seq: u32,
}

/// Strict ordering used by the heap: lower `f` first, then earlier push.
#[inline]
fn precedes(a: &SearchNode, b: &SearchNode) -> bool {
    a.f < b.f || (a.f == b.f && a.seq < b.seq)
}

impl OpenSet {
    /// An empty open set able to hold `capacity` nodes without growing.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Drop all entries and restart push numbering. Nodes left behind keep
    /// a stale `heap_index` that the next touch clears.
    pub(crate) fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Insert node `idx`, whose `f` is already set.
    pub(crate) fn push(&mut self, nodes: &mut [SearchNode], idx: usize) {
        let pos = self.heap.len();
        let n = &mut nodes[idx];
        n.seq = self.next_seq;
        n.heap_index = pos as u32;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(idx as u32);
        self.sift_up(nodes, pos);
    }

    /// Restore order after node `idx` had its `f` lowered.
    pub(crate) fn decrease_key(&mut self, nodes: &mut [SearchNode], idx: usize) {
        let pos = nodes[idx].heap_index;
        debug_assert!(pos != NONE, "decrease_key on a node that is not open");
        self.sift_up(nodes, pos as usize);
    }

    /// Remove and return the node with the smallest key.
    pub(crate) fn pop_min(&mut self, nodes: &mut [SearchNode]) -> Option<usize> {
        let last = self.heap.pop()?;
        let min = if self.heap.is_empty() {
            last
        } else {
            let min = self.heap[0];
            self.heap[0] = last;
            nodes[last as usize].heap_index = 0;
            self.sift_down(nodes, 0);
            min
        };
        nodes[min as usize].heap_index = NONE;
        Some(min as usize)
    }

    fn sift_up(&mut self, nodes: &mut [SearchNode], mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            let (child_idx, parent_idx) = (self.heap[pos], self.heap[parent]);
            if !precedes(&nodes[child_idx as usize], &nodes[parent_idx as usize]) {
                break;
            }
            self.swap(nodes, pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, nodes: &mut [SearchNode], mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len
                && precedes(
                    &nodes[self.heap[left] as usize],
                    &nodes[self.heap[smallest] as usize],
                )
            {
                smallest = left;
            }
            if right < len
                && precedes(
                    &nodes[self.heap[right] as usize],
                    &nodes[self.heap[smallest] as usize],
                )
            {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(nodes, pos, smallest);
            pos = smallest;
        }
    }

    #[inline]
    fn swap(&mut self, nodes: &mut [SearchNode], a: usize, b: usize) {
        self.heap.swap(a, b);
        nodes[self.heap[a] as usize].heap_index = a as u32;
        nodes[self.heap[b] as usize].heap_index = b as u32;
    }
}
