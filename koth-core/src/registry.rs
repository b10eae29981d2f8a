//! Tournament registry
//!
//! One instance per tournament id. The registry is a plain context object;
//! callers that share it across threads wrap it in their own lock.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::player::Player;
use crate::tournament::{Role, Tournament};

#[derive(Default)]
pub struct TournamentRegistry {
    instances: FxHashMap<u64, Arc<Tournament>>,
}

impl TournamentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> Option<Arc<Tournament>> {
        self.instances.get(&id).cloned()
    }

    /// Fetch the instance for `id`, creating it for `role` on first use.
    /// On a hit the role and roster are ignored.
    pub fn get_or_create(&mut self, id: u64, role: Role, roster: &[Player]) -> Arc<Tournament> {
        self.instances
            .entry(id)
            .or_insert_with(|| {
                tracing::info!("Creating {:?} tournament {} with {} players", role, id, roster.len());
                Arc::new(Tournament::new(id, role, roster))
            })
            .clone()
    }

    pub fn remove(&mut self, id: u64) -> Option<Arc<Tournament>> {
        self.instances.remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
