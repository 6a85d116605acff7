use super::entry::CacheEntry;
use super::error::CacheError;
use super::stats::CacheStats;
use crate::content::ContentId;
use std::collections::HashMap;
use std::fmt;

/// Invoked once per evicted id, before the entry leaves the cache.
pub type EvictionCallback = Box<dyn FnMut(&ContentId) + Send>;

/// Which ARC list an id currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Resident, inserted but not hit since.
    T1,
    /// Resident, hit at least once after insertion.
    T2,
    /// Ghost of an entry evicted from `T1`.
    B1,
    /// Ghost of an entry evicted from `T2`.
    B2,
}

impl ListKind {
    fn slot(self) -> usize {
        match self {
            ListKind::T1 => 0,
            ListKind::T2 => 1,
            ListKind::B1 => 2,
            ListKind::B2 => 3,
        }
    }

    pub fn is_resident(self) -> bool {
        matches!(self, ListKind::T1 | ListKind::T2)
    }
}

struct Node {
    id: ContentId,
    size: usize,
    list: ListKind,
    // None for ghosts.
    entry: Option<CacheEntry>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Intrusive list header: `head` is the oldest node, `tail` the newest.
#[derive(Debug, Clone, Copy, Default)]
struct List {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    bytes: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    ghost_hits: u64,
    insertions: u64,
    evictions: u64,
    rejections: u64,
}

/// Byte-bounded adaptive replacement cache of decoded rectangles.
///
/// All four ARC lists thread through one arena of nodes, so an id is stored
/// once no matter which list holds it, and ghost nodes carry no pixels.
/// Only `T1` and `T2` bytes count against `capacity`.
pub struct AdaptiveCache {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<ContentId, usize>,
    lists: [List; 4],
    capacity: usize,
    /// Adaptive byte target for `T1`.
    p: usize,
    on_evict: Option<EvictionCallback>,
    counters: Counters,
}

impl AdaptiveCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            lists: [List::default(); 4],
            capacity,
            p: 0,
            on_evict: None,
            counters: Counters::default(),
        }
    }

    pub fn with_eviction_callback(capacity: usize, callback: EvictionCallback) -> Self {
        let mut cache = Self::new(capacity);
        cache.on_evict = Some(callback);
        cache
    }

    /// Looks up a resident entry, promoting it to the MRU end of `T2`.
    pub fn lookup(&mut self, id: &ContentId) -> Option<&CacheEntry> {
        let idx = match self.index.get(id) {
            Some(&idx) => idx,
            None => {
                self.counters.misses += 1;
                return None;
            }
        };

        let list = self.node(idx).list;
        if !list.is_resident() {
            self.counters.misses += 1;
            self.counters.ghost_hits += 1;
            return None;
        }

        self.unlink(idx);
        self.link_back(idx, ListKind::T2);
        self.counters.hits += 1;
        self.node(idx).entry.as_ref()
    }

    /// Returns a resident entry without touching recency.
    pub fn peek(&self, id: &ContentId) -> Option<&CacheEntry> {
        let idx = *self.index.get(id)?;
        self.node(idx).entry.as_ref()
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.peek(id).is_some()
    }

    /// Inserts an entry, evicting as needed to stay within capacity.
    ///
    /// Entries that could never fit are rejected and leave the cache
    /// untouched. Re-inserting a resident id replaces its pixels in place
    /// of the old ones without reporting an eviction.
    pub fn insert(&mut self, id: ContentId, entry: CacheEntry) -> Result<(), CacheError> {
        let size = entry.byte_size();
        if size == 0 {
            self.counters.rejections += 1;
            return Err(CacheError::EmptyEntry);
        }
        if size > self.capacity {
            self.counters.rejections += 1;
            return Err(CacheError::EntryTooLarge {
                size,
                capacity: self.capacity,
            });
        }

        let mut from_b2 = false;
        let target = match self.index.get(&id).copied() {
            Some(idx) => {
                let node = self.node(idx);
                let (list, ghost_size) = (node.list, node.size);
                match list {
                    ListKind::T1 | ListKind::T2 => {}
                    ListKind::B1 => {
                        self.p = (self.p + ghost_size).min(self.capacity);
                    }
                    ListKind::B2 => {
                        self.p = self.p.saturating_sub(ghost_size);
                        from_b2 = true;
                    }
                }
                self.detach(idx);
                ListKind::T2
            }
            None => ListKind::T1,
        };

        while self.used_bytes() + size > self.capacity {
            if !self.replace(from_b2) {
                break;
            }
        }

        let idx = self.alloc(Node {
            id,
            size,
            list: target,
            entry: Some(entry),
            prev: None,
            next: None,
        });
        self.index.insert(id, idx);
        self.link_back(idx, target);
        self.counters.insertions += 1;

        self.trim_ghosts();
        Ok(())
    }

    /// Drops every entry and ghost. Not an eviction: no callbacks fire.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.lists = [List::default(); 4];
        self.p = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pixel bytes currently resident in `T1` and `T2`.
    pub fn used_bytes(&self) -> usize {
        self.list(ListKind::T1).bytes + self.list(ListKind::T2).bytes
    }

    pub fn target_t1_bytes(&self) -> usize {
        self.p
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.list(ListKind::T1).len + self.list(ListKind::T2).len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The list currently holding `id`, ghosts included.
    pub fn list_of(&self, id: &ContentId) -> Option<ListKind> {
        self.index.get(id).map(|&idx| self.node(idx).list)
    }

    pub fn list_len(&self, kind: ListKind) -> usize {
        self.list(kind).len
    }

    pub fn list_bytes(&self, kind: ListKind) -> usize {
        self.list(kind).bytes
    }

    /// Ids in `kind`, oldest first.
    pub fn ids(&self, kind: ListKind) -> Vec<ContentId> {
        let mut out = Vec::with_capacity(self.list(kind).len);
        let mut cursor = self.list(kind).head;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            out.push(node.id);
            cursor = node.next;
        }
        out
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            used_bytes: self.used_bytes(),
            capacity: self.capacity,
            target_t1_bytes: self.p,
            t1_len: self.list_len(ListKind::T1),
            t2_len: self.list_len(ListKind::T2),
            b1_len: self.list_len(ListKind::B1),
            b2_len: self.list_len(ListKind::B2),
            hits: self.counters.hits,
            misses: self.counters.misses,
            ghost_hits: self.counters.ghost_hits,
            insertions: self.counters.insertions,
            evictions: self.counters.evictions,
            rejections: self.counters.rejections,
        }
    }

    /// Evicts one resident entry into its ghost list.
    ///
    /// Returns false when nothing is resident.
    fn replace(&mut self, from_b2: bool) -> bool {
        let t1 = self.list(ListKind::T1);
        let t2 = self.list(ListKind::T2);
        if t1.len == 0 && t2.len == 0 {
            return false;
        }

        let evict_t1 = t1.len > 0
            && (t2.len == 0 || t1.bytes > self.p || (from_b2 && t1.bytes == self.p));
        let (source, ghost) = if evict_t1 {
            (ListKind::T1, ListKind::B1)
        } else {
            (ListKind::T2, ListKind::B2)
        };

        let Some(victim) = self.list(source).head else {
            return false;
        };
        let id = self.node(victim).id;

        if let Some(callback) = self.on_evict.as_mut() {
            callback(&id);
        }

        self.unlink(victim);
        if let Some(node) = self.nodes[victim].as_mut() {
            node.entry = None;
        }
        self.link_back(victim, ghost);
        self.counters.evictions += 1;
        true
    }

    /// Bounds ghost history to one capacity worth of bytes, dropping the
    /// oldest ghost of the heavier list first.
    fn trim_ghosts(&mut self) {
        loop {
            let b1 = self.list(ListKind::B1);
            let b2 = self.list(ListKind::B2);
            if b1.bytes + b2.bytes <= self.capacity {
                break;
            }
            let victim = if b1.bytes >= b2.bytes { b1.head } else { b2.head };
            match victim {
                Some(idx) => self.detach(idx),
                None => break,
            }
        }
    }

    fn list(&self, kind: ListKind) -> List {
        self.lists[kind.slot()]
    }

    fn node(&self, idx: usize) -> &Node {
        match self.nodes[idx].as_ref() {
            Some(node) => node,
            None => unreachable!("arena slot {} referenced after release", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        match self.nodes[idx].as_mut() {
            Some(node) => node,
            None => unreachable!("arena slot {} referenced after release", idx),
        }
    }

    fn alloc(&mut self, node: Node) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Unlinks a node and releases its arena slot and index entry.
    fn detach(&mut self, idx: usize) {
        self.unlink(idx);
        if let Some(node) = self.nodes[idx].take() {
            self.index.remove(&node.id);
        }
        self.free.push(idx);
    }

    fn link_back(&mut self, idx: usize, kind: ListKind) {
        let slot = kind.slot();
        let old_tail = self.lists[slot].tail;
        let size = {
            let node = self.node_mut(idx);
            node.list = kind;
            node.prev = old_tail;
            node.next = None;
            node.size
        };

        match old_tail {
            Some(tail) => self.node_mut(tail).next = Some(idx),
            None => self.lists[slot].head = Some(idx),
        }

        let list = &mut self.lists[slot];
        list.tail = Some(idx);
        list.len += 1;
        list.bytes += size;
    }

    fn unlink(&mut self, idx: usize) {
        let (kind, prev, next, size) = {
            let node = self.node(idx);
            (node.list, node.prev, node.next, node.size)
        };
        let slot = kind.slot();

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.lists[slot].head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.lists[slot].tail = prev,
        }

        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;

        let list = &mut self.lists[slot];
        list.len -= 1;
        list.bytes -= size;
    }
}

impl fmt::Debug for AdaptiveCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveCache")
            .field("capacity", &self.capacity)
            .field("used_bytes", &self.used_bytes())
            .field("p", &self.p)
            .field("t1", &self.list_len(ListKind::T1))
            .field("t2", &self.list_len(ListKind::T2))
            .field("b1", &self.list_len(ListKind::B1))
            .field("b2", &self.list_len(ListKind::B2))
            .finish()
    }
}
