//! Per-destination route table
//!
//! Every node keeps a bounded list of candidate routes per destination,
//! sorted ascending by fitness (lower cost first). The table is owned
//! exclusively by its node; other nodes influence it only through route
//! replies processed by that node's own handler.

use crate::types::{NodeId, Result, RoutingError, MAX_DESTINATIONS, MAX_PATH_NODES, MAX_ROUTES_PER_DEST};
use core::cmp::Ordering;
use heapless::{FnvIndexMap, Vec};
use serde::{Deserialize, Serialize};

/// Fitness sentinel for a route whose cost has not been evaluated yet
pub const FITNESS_UNKNOWN: f32 = 1e9;

/// One known path from the owning node to a destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Node identifiers from source to destination, hop order
    pub path: Vec<NodeId, MAX_PATH_NODES>,
    /// Scalar cost, lower is better
    pub fitness: f32,
    /// Number of hops (`path.len() - 1`, fixed at creation)
    pub hop_count: u8,
    /// Aggregate link quality along the path, refreshed by `reoptimize`
    pub link_quality: f32,
    /// Estimated energy cost of the path, refreshed by `reoptimize`
    pub energy_cost: f32,
    /// Timestamp of creation or last refresh (ms), drives expiry
    pub last_update_ms: u64,
}

impl RouteInfo {
    /// Build a route from a discovered path.
    ///
    /// Link quality and energy cost start at zero and are filled in by the
    /// next optimizer pass.
    pub fn from_path(path: Vec<NodeId, MAX_PATH_NODES>, fitness: f32, now_ms: u64) -> Self {
        let hop_count = path.len().saturating_sub(1) as u8;
        Self {
            path,
            fitness,
            hop_count,
            link_quality: 0.0,
            energy_cost: 0.0,
            last_update_ms: now_ms,
        }
    }

    /// Destination of this route (last path entry)
    pub fn destination(&self) -> Option<NodeId> {
        self.path.last().copied()
    }
}

fn by_fitness(a: &RouteInfo, b: &RouteInfo) -> Ordering {
    a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal)
}

/// Bounded, fitness-sorted route table: destination -> candidate routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: FnvIndexMap<u32, Vec<RouteInfo, MAX_ROUTES_PER_DEST>, MAX_DESTINATIONS>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate route for `dest`, keeping at most `max_routes`
    /// entries sorted ascending by fitness. The worst entries beyond the
    /// bound are discarded. Identical paths from separate discovery runs
    /// may coexist; only the size bound limits growth.
    pub fn upsert(&mut self, dest: NodeId, route: RouteInfo, max_routes: usize) -> Result<()> {
        let key = dest.as_u32();
        if !self.routes.contains_key(&key) {
            self.routes
                .insert(key, Vec::new())
                .map_err(|_| RoutingError::BufferFull)?;
        }
        let entries = match self.routes.get_mut(&key) {
            Some(entries) => entries,
            None => return Err(RoutingError::BufferFull),
        };

        if entries.is_full() {
            // Sorted invariant holds, so the last entry is the worst.
            match entries.last() {
                Some(worst) if route.fitness < worst.fitness => {
                    entries.pop();
                }
                _ => return Ok(()), // would be truncated right away
            }
        }
        // Cannot fail: a slot was freed above if necessary
        let _ = entries.push(route);
        entries.sort_unstable_by(by_fitness);
        entries.truncate(max_routes);
        Ok(())
    }

    /// Best (lowest fitness) route for `dest`, if any
    pub fn select_best(&self, dest: NodeId) -> Option<&RouteInfo> {
        self.routes.get(&dest.as_u32()).and_then(|r| r.first())
    }

    /// Recompute every stored route with `refresh`, then restore the
    /// sorted invariant per destination. Runs before the expiry sweep in
    /// each maintenance cycle so expiry sees freshly aged routes.
    pub fn reoptimize<F>(&mut self, mut refresh: F)
    where
        F: FnMut(&mut RouteInfo),
    {
        for (_, entries) in self.routes.iter_mut() {
            for route in entries.iter_mut() {
                refresh(route);
            }
            entries.sort_unstable_by(by_fitness);
        }
    }

    /// Drop every route older than `timeout_ms`; destinations left with no
    /// routes are removed entirely (the table never holds empty lists).
    pub fn expire_sweep(&mut self, now_ms: u64, timeout_ms: u64) {
        for (_, entries) in self.routes.iter_mut() {
            entries.retain(|route| now_ms.saturating_sub(route.last_update_ms) <= timeout_ms);
        }
        self.routes.retain(|_, entries| !entries.is_empty());
    }

    /// All routes stored for `dest`
    pub fn routes_for(&self, dest: NodeId) -> Option<&[RouteInfo]> {
        self.routes.get(&dest.as_u32()).map(|r| r.as_slice())
    }

    /// Number of destinations with at least one route
    pub fn destination_count(&self) -> usize {
        self.routes.len()
    }

    /// Total number of stored routes
    pub fn route_count(&self) -> usize {
        self.routes.iter().map(|(_, r)| r.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path_ids: &[u32], fitness: f32, now_ms: u64) -> RouteInfo {
        let mut path = Vec::new();
        for &id in path_ids {
            path.push(NodeId::new(id)).unwrap();
        }
        RouteInfo::from_path(path, fitness, now_ms)
    }

    #[test]
    fn test_hop_count_derived_from_path() {
        let r = route(&[0, 1, 2], 1.0, 0);
        assert_eq!(r.hop_count, 2);
        assert_eq!(r.destination(), Some(NodeId::new(2)));
    }

    #[test]
    fn test_bounded_and_sorted() {
        // maxRoutesPerDestination=2, fitness 5, 3, 8 -> exactly {3, 5}
        let mut table = RouteTable::new();
        let dest = NodeId::new(9);
        table.upsert(dest, route(&[0, 9], 5.0, 0), 2).unwrap();
        table.upsert(dest, route(&[0, 1, 9], 3.0, 0), 2).unwrap();
        table.upsert(dest, route(&[0, 2, 9], 8.0, 0), 2).unwrap();

        let stored = table.routes_for(dest).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].fitness, 3.0);
        assert_eq!(stored[1].fitness, 5.0);
    }

    #[test]
    fn test_sorted_after_every_upsert() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(5);
        for (i, fitness) in [7.0, 2.0, 9.0, 4.0, 1.0].iter().enumerate() {
            table
                .upsert(dest, route(&[0, i as u32 + 10, 5], *fitness, 0), 4)
                .unwrap();
            let stored = table.routes_for(dest).unwrap();
            assert!(stored.len() <= 4);
            for pair in stored.windows(2) {
                assert!(pair[0].fitness <= pair[1].fitness);
            }
        }
    }

    #[test]
    fn test_select_best_is_lowest_fitness() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(3);
        assert!(table.select_best(dest).is_none());

        table.upsert(dest, route(&[0, 3], 6.0, 0), 3).unwrap();
        table.upsert(dest, route(&[0, 1, 3], 2.5, 0), 3).unwrap();
        assert_eq!(table.select_best(dest).unwrap().fitness, 2.5);
    }

    #[test]
    fn test_duplicate_paths_coexist() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(3);
        table.upsert(dest, route(&[0, 3], 6.0, 0), 3).unwrap();
        table.upsert(dest, route(&[0, 3], 4.0, 100), 3).unwrap();
        assert_eq!(table.routes_for(dest).unwrap().len(), 2);
    }

    #[test]
    fn test_expiry_boundary() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(2);
        table.upsert(dest, route(&[0, 2], 1.0, 1000), 3).unwrap();

        // Present at exactly t0 + timeout, absent just after
        table.expire_sweep(1000 + 500, 500);
        assert!(table.select_best(dest).is_some());

        table.expire_sweep(1000 + 501, 500);
        assert!(table.select_best(dest).is_none());
        assert_eq!(table.destination_count(), 0);
    }

    #[test]
    fn test_expiry_keeps_fresh_routes() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(2);
        table.upsert(dest, route(&[0, 2], 1.0, 0), 3).unwrap();
        table.upsert(dest, route(&[0, 1, 2], 2.0, 900), 3).unwrap();

        table.expire_sweep(1000, 500);
        let stored = table.routes_for(dest).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].last_update_ms, 900);
    }

    #[test]
    fn test_reoptimize_resorts() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(4);
        table.upsert(dest, route(&[0, 4], 1.0, 0), 3).unwrap();
        table.upsert(dest, route(&[0, 1, 4], 2.0, 0), 3).unwrap();

        // Invert the costs: the two-hop route becomes the better one
        table.reoptimize(|r| {
            r.fitness = if r.hop_count == 1 { 9.0 } else { 0.5 };
        });
        assert_eq!(table.select_best(dest).unwrap().hop_count, 2);
    }

    #[test]
    fn test_full_capacity_keeps_best() {
        let mut table = RouteTable::new();
        let dest = NodeId::new(8);
        for i in 0..MAX_ROUTES_PER_DEST {
            table
                .upsert(dest, route(&[0, i as u32 + 20, 8], i as f32, 0), MAX_ROUTES_PER_DEST)
                .unwrap();
        }
        // Worse than everything stored: rejected
        table
            .upsert(dest, route(&[0, 30, 8], 100.0, 0), MAX_ROUTES_PER_DEST)
            .unwrap();
        assert_eq!(table.routes_for(dest).unwrap().len(), MAX_ROUTES_PER_DEST);
        assert!(table
            .routes_for(dest)
            .unwrap()
            .iter()
            .all(|r| r.fitness < 100.0));

        // Better than the worst: evicts it
        table
            .upsert(dest, route(&[0, 31, 8], 0.5, 0), MAX_ROUTES_PER_DEST)
            .unwrap();
        let stored = table.routes_for(dest).unwrap();
        assert_eq!(stored.len(), MAX_ROUTES_PER_DEST);
        assert_eq!(stored[1].fitness, 0.5);
    }
}
