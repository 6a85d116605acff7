use crate::constants::DEFAULT_MAX_ALIASES;
use crate::content::ContentId;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// What the server believes about one id on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// No record; the client may or may not hold it.
    Unknown,
    /// The client asked for it (or it was seeded); the next send is an init.
    Requested,
    /// An init was sent and no eviction has been reported since.
    Known,
}

/// Per-connection record of which content the client holds.
///
/// `known` and `requested` are disjoint. Aliases map a canonical id to the
/// observed id the client actually stored the content under; they are
/// capped and dropped oldest first.
#[derive(Debug)]
pub struct PeerSyncState {
    known: HashSet<ContentId>,
    requested: HashSet<ContentId>,
    aliases: HashMap<ContentId, ContentId>,
    // canonical ids in the order their aliases were learned
    alias_order: VecDeque<ContentId>,
    // observed id -> canonical ids aliased to it
    alias_targets: HashMap<ContentId, Vec<ContentId>>,
    max_aliases: usize,
}

impl PeerSyncState {
    pub fn new() -> Self {
        Self::with_max_aliases(DEFAULT_MAX_ALIASES)
    }

    pub fn with_max_aliases(max_aliases: usize) -> Self {
        Self {
            known: HashSet::new(),
            requested: HashSet::new(),
            aliases: HashMap::new(),
            alias_order: VecDeque::new(),
            alias_targets: HashMap::new(),
            max_aliases: max_aliases.max(1),
        }
    }

    pub fn state(&self, id: &ContentId) -> SyncState {
        if self.known.contains(id) {
            SyncState::Known
        } else if self.requested.contains(id) {
            SyncState::Requested
        } else {
            SyncState::Unknown
        }
    }

    pub fn is_known(&self, id: &ContentId) -> bool {
        self.known.contains(id)
    }

    /// The observed id learned for `canonical`, if any.
    pub fn alias_for(&self, canonical: &ContentId) -> Option<ContentId> {
        self.aliases.get(canonical).copied()
    }

    /// The client asked for `id`.
    ///
    /// A query for an id believed `Known` means the client lost it without
    /// the eviction reaching us; it is demoted so the next send is an init.
    /// A query naming an observed id requests the canonical ids aliased to
    /// it, since inits are only ever sent under a canonical id.
    pub fn on_query(&mut self, id: ContentId) {
        if let Some(canonicals) = self.alias_targets.get(&id).cloned() {
            self.known.remove(&id);
            for canonical in canonicals {
                debug!("Query for observed id {}, requesting {}", id, canonical);
                self.known.remove(&canonical);
                self.requested.insert(canonical);
            }
            return;
        }

        if self.known.remove(&id) {
            debug!("Query for known id {}, resending", id);
        }
        self.requested.insert(id);
    }

    /// Moves an `Unknown` id to `Requested` ahead of its init.
    ///
    /// Returns false and leaves the state alone for any other state.
    pub fn seed(&mut self, id: ContentId) -> bool {
        if self.state(&id) != SyncState::Unknown {
            return false;
        }
        self.requested.insert(id);
        true
    }

    /// Records that an init for `id` has been queued for sending.
    pub fn mark_init_sent(&mut self, id: ContentId) {
        self.requested.remove(&id);
        self.known.insert(id);
    }

    /// The client evicted `id`. Aliases pointing at it are forgotten.
    pub fn on_eviction(&mut self, id: &ContentId) {
        self.known.remove(id);
        if let Some(canonicals) = self.alias_targets.remove(id) {
            for canonical in canonicals {
                self.aliases.remove(&canonical);
                self.alias_order.retain(|c| *c != canonical);
            }
        }
    }

    /// The client decoded `canonical` to pixels hashing to `observed`.
    ///
    /// From now on the client addresses that content by `observed`, so a
    /// `Known` canonical id hands its state to the observed one. Returns
    /// false if the ids are equal and nothing was learned.
    pub fn on_hash_report(&mut self, canonical: ContentId, observed: ContentId) -> bool {
        if canonical == observed {
            return false;
        }

        self.record_alias(canonical, observed);

        if self.known.remove(&canonical) {
            self.requested.remove(&observed);
            self.known.insert(observed);
        }

        debug!("Learned alias {} -> {}", canonical, observed);
        true
    }

    fn record_alias(&mut self, canonical: ContentId, observed: ContentId) {
        if let Some(previous) = self.aliases.insert(canonical, observed) {
            self.unlink_target(&previous, &canonical);
            self.alias_order.retain(|c| *c != canonical);
        }
        self.alias_order.push_back(canonical);
        self.alias_targets
            .entry(observed)
            .or_default()
            .push(canonical);

        while self.aliases.len() > self.max_aliases {
            let Some(oldest) = self.alias_order.pop_front() else {
                break;
            };
            if let Some(target) = self.aliases.remove(&oldest) {
                self.unlink_target(&target, &oldest);
            }
        }
    }

    fn unlink_target(&mut self, observed: &ContentId, canonical: &ContentId) {
        if let Some(canonicals) = self.alias_targets.get_mut(observed) {
            canonicals.retain(|c| c != canonical);
            if canonicals.is_empty() {
                self.alias_targets.remove(observed);
            }
        }
    }

    pub fn known_len(&self) -> usize {
        self.known.len()
    }

    pub fn requested_len(&self) -> usize {
        self.requested.len()
    }

    pub fn alias_len(&self) -> usize {
        self.aliases.len()
    }

    /// Forgets everything, as on connection teardown.
    pub fn reset(&mut self) {
        self.known.clear();
        self.requested.clear();
        self.aliases.clear();
        self.alias_order.clear();
        self.alias_targets.clear();
    }
}

impl Default for PeerSyncState {
    fn default() -> Self {
        Self::new()
    }
}
