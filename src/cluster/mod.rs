//! Density-based neighbor selection.
//!
//! Neighbors are described by a (distance to target, transmission errors, free capacity) feature
//! vector, normalized per dimension and clustered with [`Dbscan`]. Clusters are then scored by
//! how close their centroid sits to an ideal vector and the best one is returned.

use std::net::Ipv4Addr;

use tracing::{debug, trace};

use crate::{
    config::SelectionConfig,
    core::{address::is_unicast_destination, address::Position, traits::Clock},
    table::{RouteFlag, RoutingEntry, RoutingTable},
};

mod dbscan;
mod normalize;

pub use dbscan::{distance, Clustering, Dbscan, Label};
pub use normalize::min_max_normalize;

/// The number of features describing a neighbor.
pub const FEATURES: usize = 3;

/// A neighbor's feature vector.
pub type FeatureVector = [f64; FEATURES];

impl<C: Clock> RoutingTable<C> {
    /// Selects the subset of neighbors best suited to forward towards the target position.
    ///
    /// Candidates are the valid or in-search routes to unicast destinations at most
    /// [`max_hops`](SelectionConfig::max_hops) away. They are clustered with the supplied
    /// neighborhood radius (over normalized features) and density threshold, and the members of
    /// the best scoring cluster are returned. If no cluster forms, every candidate is returned;
    /// the result is only empty if there are no candidates.
    pub fn select_neighbor_cluster(
        &mut self,
        target: Position,
        epsilon: f64,
        min_pts: usize,
    ) -> Vec<Ipv4Addr> {
        self.purge();

        let (addrs, mut points): (Vec<Ipv4Addr>, Vec<FeatureVector>) = self
            .iter()
            .filter(|entry| is_candidate(entry, self.selection_config()))
            .map(|entry| (entry.destination(), features(entry, target)))
            .unzip();

        if let Err(e) = min_max_normalize(&mut points) {
            trace!("neighbor selection: {e}");
            return Vec::new();
        }

        let clustering = Dbscan::new(epsilon, min_pts).fit(&points);
        let best = best_cluster(&clustering, &points, self.selection_config());

        debug!(
            "found {} clusters from {} candidates, best cluster has {} members",
            clustering.cluster_count(),
            points.len(),
            best.map_or(0, |id| clustering.members(id).count())
        );

        match best {
            Some(id) => clustering.members(id).map(|i| addrs[i]).collect(),
            // Too sparse to cluster, fall back to all the candidates.
            None => addrs,
        }
    }
}

/// Returns `true` if the route's destination may be selected as a neighbor.
pub fn is_candidate(entry: &RoutingEntry, config: &SelectionConfig) -> bool {
    is_unicast_destination(entry.destination(), config.broadcast_mask)
        && entry.flag() != RouteFlag::Invalid
        && entry.hops() <= config.max_hops
}

/// Computes the raw (distance to target, tx errors, free capacity) feature vector of a route.
pub fn features(entry: &RoutingEntry, target: Position) -> FeatureVector {
    [
        target.distance(&entry.position()),
        f64::from(entry.tx_errors()),
        f64::from(entry.free_space()),
    ]
}

/// Computes the mean of the points.
pub fn centroid<'a, I>(points: I) -> Option<FeatureVector>
where
    I: IntoIterator<Item = &'a FeatureVector>,
{
    let mut sum = [0.0; FEATURES];
    let mut n = 0usize;

    for point in points {
        for d in 0..FEATURES {
            sum[d] += point[d];
        }
        n += 1;
    }

    if n == 0 {
        return None;
    }

    Some(sum.map(|s| s / n as f64))
}

/// Scores a centroid by its weighted squared distance to the ideal vector, lower is better.
pub fn score(centroid: &FeatureVector, config: &SelectionConfig) -> f64 {
    centroid
        .iter()
        .zip(config.ideal.iter())
        .zip(config.weights.iter())
        .map(|((c, ideal), weight)| weight * (c - ideal) * (c - ideal))
        .sum()
}

/// Returns the identifier of the best scoring cluster, `None` if there are no clusters.
///
/// Ties go to the lowest identifier.
pub fn best_cluster(
    clustering: &Clustering,
    points: &[FeatureVector],
    config: &SelectionConfig,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for id in 0..clustering.cluster_count() {
        let Some(centroid) = centroid(clustering.members(id).map(|i| &points[i])) else {
            continue;
        };

        let score = score(&centroid, config);
        trace!("cluster {id} scores {score}");

        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((id, score));
        }
    }

    best.map(|(id, _)| id)
}
