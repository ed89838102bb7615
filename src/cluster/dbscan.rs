use std::collections::VecDeque;

/// The outcome of clustering a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// The point isn't density-reachable from any core point.
    Noise,
    /// The point belongs to the cluster with this identifier.
    Cluster(usize),
}

/// The labels assigned to a set of points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    labels: Vec<Label>,
    clusters: usize,
}

impl Clustering {
    /// Returns the label of each point, in the order the points were supplied.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Returns the number of clusters found, their identifiers are `0..cluster_count`.
    pub fn cluster_count(&self) -> usize {
        self.clusters
    }

    /// Returns the indices of the points in the cluster, in ascending order.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(move |(_, &label)| label == Label::Cluster(cluster))
            .map(|(i, _)| i)
    }

    /// Returns `true` if every point is noise.
    pub fn is_all_noise(&self) -> bool {
        self.clusters == 0
    }
}

/// Density-based clustering (DBSCAN) over points in an `N`-dimensional euclidean space.
///
/// A point is a core point if its neighborhood (the points within `epsilon` of it, itself
/// included) holds at least `min_pts` points. Counting the point itself means a pair of points
/// within `epsilon` of each other forms a cluster with `min_pts = 2`; a threshold over the other
/// points alone would need `min_pts = 1` for that.
/// Clusters grow transitively through chains of core points; points reachable only from a
/// core point's neighborhood join as border points, the rest are noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    epsilon: f64,
    min_pts: usize,
}

impl Dbscan {
    /// Creates a new clusterer with the neighborhood radius and the density threshold.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Clusters the points. Cluster identifiers are assigned in the order the clusters are
    /// discovered, scanning the points in order.
    pub fn fit<const N: usize>(&self, points: &[[f64; N]]) -> Clustering {
        // `None` marks points not yet visited.
        let mut labels: Vec<Option<Label>> = vec![None; points.len()];
        let mut cluster = 0;

        for i in 0..points.len() {
            if labels[i].is_some() {
                continue;
            }

            let neighbors = self.region_query(points, i);
            if !self.is_core(&neighbors) {
                // Might still be claimed as a border point by a later cluster.
                labels[i] = Some(Label::Noise);
                continue;
            }

            let mut processed = vec![false; points.len()];
            let mut queue: VecDeque<usize> = neighbors.into();
            queue.push_back(i);

            while let Some(p) = queue.pop_front() {
                if processed[p] {
                    continue;
                }
                processed[p] = true;

                // Points claimed by an earlier cluster keep their label.
                if matches!(labels[p], None | Some(Label::Noise)) {
                    labels[p] = Some(Label::Cluster(cluster));
                }

                let neighbors = self.region_query(points, p);
                if self.is_core(&neighbors) {
                    queue.extend(neighbors.into_iter().filter(|&q| !processed[q]));
                }
            }

            cluster += 1;
        }

        Clustering {
            // Every point is visited by the outer loop.
            labels: labels
                .into_iter()
                .map(|label| label.unwrap_or(Label::Noise))
                .collect(),
            clusters: cluster,
        }
    }

    // The neighborhood counts the point itself on top of the neighbors returned by the region
    // query.
    fn is_core(&self, neighbors: &[usize]) -> bool {
        neighbors.len() + 1 >= self.min_pts
    }

    // Returns the indices of the other points within epsilon of the point at `idx`.
    fn region_query<const N: usize>(&self, points: &[[f64; N]], idx: usize) -> Vec<usize> {
        let origin = &points[idx];

        points
            .iter()
            .enumerate()
            .filter(|&(i, point)| i != idx && distance(origin, point) <= self.epsilon)
            .map(|(i, _)| i)
            .collect()
    }
}

/// The euclidean distance between two points.
pub fn distance<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
