//! Namespaced graph store
//!
//! Holds one [`NamespaceGraph`] per brand namespace. Reads against unknown
//! namespaces or entities return empty results rather than errors.

use crate::graph::NamespaceGraph;
use brandmem_core::{KGTriplet, Namespace, TripletId};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Relationship traversal per brand namespace
#[derive(Debug, Default)]
pub struct BrandGraphStore {
    graphs: RwLock<HashMap<Namespace, NamespaceGraph>>,
}

impl BrandGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoned locks are recovered.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Namespace, NamespaceGraph>> {
        self.graphs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Namespace, NamespaceGraph>> {
        self.graphs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a triplet as an edge of its namespace's graph; same id overwrites
    pub fn add_triplet(&self, triplet: KGTriplet) {
        let ns = triplet.brand_namespace.clone();
        let id = triplet.id.clone();
        let replaced = self.write().entry(ns.clone()).or_default().insert(triplet);
        debug!(
            "{} triplet {} in graph {}",
            if replaced { "Replaced" } else { "Added" },
            id,
            ns
        );
    }

    /// Distinct triplets reachable from `entity` within `max_hops`, in either direction
    pub fn get_neighbors(&self, namespace: &Namespace, entity: &str, max_hops: usize) -> Vec<KGTriplet> {
        self.read()
            .get(namespace)
            .map(|g| g.neighbors(entity, max_hops))
            .unwrap_or_default()
    }

    /// Simple directed paths from `source` to `target` of at most `max_length` edges
    pub fn find_paths(
        &self,
        namespace: &Namespace,
        source: &str,
        target: &str,
        max_length: usize,
    ) -> Vec<Vec<KGTriplet>> {
        self.read()
            .get(namespace)
            .map(|g| g.paths(source, target, max_length))
            .unwrap_or_default()
    }

    pub fn get_triplet(&self, namespace: &Namespace, id: &TripletId) -> Option<KGTriplet> {
        self.read().get(namespace).and_then(|g| g.get(id).cloned())
    }

    pub fn get_all_triplets(&self, namespace: &Namespace) -> Vec<KGTriplet> {
        self.read()
            .get(namespace)
            .map(|g| g.triplets())
            .unwrap_or_default()
    }

    pub fn get_entities(&self, namespace: &Namespace) -> BTreeSet<String> {
        self.read()
            .get(namespace)
            .map(|g| g.entities())
            .unwrap_or_default()
    }

    /// Unique predicate labels of a namespace
    pub fn get_predicates(&self, namespace: &Namespace) -> BTreeSet<String> {
        self.read()
            .get(namespace)
            .map(|g| g.predicates())
            .unwrap_or_default()
    }

    pub fn entity_count(&self, namespace: &Namespace) -> usize {
        self.read().get(namespace).map_or(0, |g| g.entity_count())
    }

    pub fn triplet_count(&self, namespace: &Namespace) -> usize {
        self.read().get(namespace).map_or(0, |g| g.triplet_count())
    }

    /// Namespaces that have at least one triplet, sorted
    pub fn namespaces(&self) -> Vec<Namespace> {
        let mut names: Vec<Namespace> = self.read().keys().cloned().collect();
        names.sort();
        names
    }
}
