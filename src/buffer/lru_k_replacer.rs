//! LRU-K replacement policy.
//!
//! Tracks up to the last `k` access timestamps per frame and evicts the
//! evictable frame with the largest backward k-distance (missing history
//! counts as infinite), breaking ties by the earliest recorded access.
//!
//! The ordering is materialized as a doubly linked list over an arena keyed
//! by frame id (index links, no owning pointers). From the head: frames with
//! a full k-history ordered by increasing k-distance, then frames with fewer
//! than k accesses ordered so the oldest first access sits nearest the tail.
//! Eviction scans backwards from the tail and takes the first evictable node.

use log::trace;
use std::collections::{HashMap, VecDeque};

use crate::common::config::FrameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Unknown,
    Lookup,
    Scan,
    Index,
}

#[derive(Debug)]
struct LRUKNode {
    /// Last `k` access timestamps, oldest first.
    history: VecDeque<u64>,
    is_evictable: bool,
    prev: Option<FrameId>,
    next: Option<FrameId>,
}

impl LRUKNode {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            is_evictable: false,
            prev: None,
            next: None,
        }
    }

    fn earliest_access(&self) -> u64 {
        *self.history.front().expect("node has no access history")
    }
}

pub struct LRUKReplacer {
    node_store: HashMap<FrameId, LRUKNode>,
    head: Option<FrameId>,
    tail: Option<FrameId>,
    current_timestamp: u64,
    /// Number of evictable frames.
    curr_size: usize,
    replacer_size: usize,
    k: usize,
}

impl LRUKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "k must be positive");
        Self {
            node_store: HashMap::new(),
            head: None,
            tail: None,
            current_timestamp: 0,
            curr_size: 0,
            replacer_size: num_frames,
            k,
        }
    }

    /// Evicts the frame with the largest backward k-distance among evictable
    /// frames. Returns `None` when no frame is evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        if self.curr_size == 0 {
            return None;
        }

        let mut cursor = self.tail;
        while let Some(fid) = cursor {
            let (is_evictable, prev) = {
                let node = &self.node_store[&fid];
                (node.is_evictable, node.prev)
            };
            if is_evictable {
                self.unlink(fid);
                self.node_store.remove(&fid);
                self.curr_size -= 1;
                trace!("evicted frame {}", fid);
                return Some(fid);
            }
            cursor = prev;
        }
        panic!("replacer size is {} but no frame is evictable", self.curr_size);
    }

    /// Records an access to `frame_id` and repositions it in the list.
    pub fn record_access(&mut self, frame_id: FrameId, _access_type: AccessType) {
        assert!(
            frame_id < self.replacer_size,
            "frame id {} out of range",
            frame_id
        );

        if self.node_store.contains_key(&frame_id) {
            self.unlink(frame_id);
        } else {
            self.node_store.insert(frame_id, LRUKNode::new());
        }

        let ts = self.current_timestamp;
        self.current_timestamp += 1;
        {
            let node = self.node_store.get_mut(&frame_id).unwrap();
            node.history.push_back(ts);
            if node.history.len() > self.k {
                node.history.pop_front();
            }
        }

        let position = self.find_insert_position(frame_id);
        self.insert_before(frame_id, position);
    }

    /// Marks a frame evictable or pinned, adjusting the evictable count.
    pub fn set_evictable(&mut self, frame_id: FrameId, set_evictable: bool) {
        assert!(
            frame_id < self.replacer_size,
            "frame id {} out of range",
            frame_id
        );
        let Some(node) = self.node_store.get_mut(&frame_id) else {
            return;
        };
        if set_evictable && !node.is_evictable {
            self.curr_size += 1;
        } else if !set_evictable && node.is_evictable {
            self.curr_size -= 1;
        }
        node.is_evictable = set_evictable;
    }

    /// Removes a frame outright. No-op for unknown frames; panics on an
    /// attempt to remove a non-evictable frame.
    pub fn remove(&mut self, frame_id: FrameId) {
        let Some(node) = self.node_store.get(&frame_id) else {
            return;
        };
        if !node.is_evictable {
            panic!("frame {} is non-evictable", frame_id);
        }
        self.unlink(frame_id);
        self.node_store.remove(&frame_id);
        self.curr_size -= 1;
    }

    pub fn size(&self) -> usize {
        self.curr_size
    }

    /// Finds the node to insert `frame_id` before; `None` means append at
    /// the tail.
    fn find_insert_position(&self, frame_id: FrameId) -> Option<FrameId> {
        let node = &self.node_store[&frame_id];
        let mut cursor = self.head;

        if node.history.len() < self.k {
            // Walk past the full-history run, then order by earliest access
            // so older first-accesses sit closer to the tail.
            while let Some(fid) = cursor {
                let cur = &self.node_store[&fid];
                if cur.history.len() < self.k && cur.earliest_access() < node.earliest_access() {
                    return Some(fid);
                }
                cursor = cur.next;
            }
        } else {
            // Stay within the full-history run, ordered by increasing
            // backward k-distance toward the tail.
            while let Some(fid) = cursor {
                let cur = &self.node_store[&fid];
                if cur.history.len() < self.k {
                    return Some(fid);
                }
                if cur.earliest_access() <= node.earliest_access() {
                    return Some(fid);
                }
                cursor = cur.next;
            }
        }
        None
    }

    fn insert_before(&mut self, frame_id: FrameId, position: Option<FrameId>) {
        match position {
            Some(next_fid) => {
                let prev_fid = self.node_store[&next_fid].prev;
                self.node_store.get_mut(&frame_id).unwrap().prev = prev_fid;
                self.node_store.get_mut(&frame_id).unwrap().next = Some(next_fid);
                self.node_store.get_mut(&next_fid).unwrap().prev = Some(frame_id);
                match prev_fid {
                    Some(p) => self.node_store.get_mut(&p).unwrap().next = Some(frame_id),
                    None => self.head = Some(frame_id),
                }
            }
            None => {
                let old_tail = self.tail;
                self.node_store.get_mut(&frame_id).unwrap().prev = old_tail;
                self.node_store.get_mut(&frame_id).unwrap().next = None;
                match old_tail {
                    Some(t) => self.node_store.get_mut(&t).unwrap().next = Some(frame_id),
                    None => self.head = Some(frame_id),
                }
                self.tail = Some(frame_id);
            }
        }
    }

    fn unlink(&mut self, frame_id: FrameId) {
        let (prev, next) = {
            let node = &self.node_store[&frame_id];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_store.get_mut(&p).unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_store.get_mut(&n).unwrap().prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_store.get_mut(&frame_id).unwrap();
        node.prev = None;
        node.next = None;
    }
}
