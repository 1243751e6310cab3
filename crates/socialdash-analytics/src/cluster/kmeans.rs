//! Lloyd's k-means with k-means++ seeding and multiple restarts.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AnalyticsError;

pub const DEFAULT_CLUSTERS: usize = 3;
pub const DEFAULT_SEED: u64 = 42;

/// k-means parameters. [`Default`] gives the dashboard's fixed setup:
/// 3 clusters, 10 restarts, seed 42.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    pub k: usize,
    /// Independent k-means++ initializations; the lowest-inertia run wins.
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on total squared centroid movement, relative to
    /// the mean per-feature variance of the data.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            k: DEFAULT_CLUSTERS,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit<const D: usize> {
    /// Cluster index per input point, in `0..k`.
    pub labels: Vec<usize>,
    pub centroids: Vec<[f64; D]>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeans {
    /// Partition `points` into `k` clusters.
    ///
    /// Deterministic for a fixed seed and fixed point order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] for zero `k`, `n_init` or
    /// `max_iter`, and [`AnalyticsError::InsufficientClusterData`] when there
    /// are fewer distinct points than clusters.
    pub fn fit<const D: usize>(&self, points: &[[f64; D]]) -> Result<KMeansFit<D>, AnalyticsError> {
        if self.k == 0 || self.n_init == 0 || self.max_iter == 0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "k, n_init and max_iter must be positive (k={}, n_init={}, max_iter={})",
                self.k, self.n_init, self.max_iter
            )));
        }

        let distinct = count_distinct(points);
        if distinct < self.k {
            return Err(AnalyticsError::InsufficientClusterData {
                distinct,
                k: self.k,
            });
        }

        let tol = self.tol * mean_variance(points);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit<D>> = None;

        for run in 0..self.n_init {
            let initial = init_plus_plus(points, self.k, &mut rng);
            let fit = self.lloyd(points, initial, tol);
            tracing::trace!(
                run,
                inertia = fit.inertia,
                iterations = fit.iterations,
                "k-means run finished"
            );
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or_else(|| AnalyticsError::InvalidParameter("n_init must be positive".to_string()))
    }

    fn lloyd<const D: usize>(
        &self,
        points: &[[f64; D]],
        mut centroids: Vec<[f64; D]>,
        tol: f64,
    ) -> KMeansFit<D> {
        let k = centroids.len();
        let mut labels = vec![0usize; points.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            assign(points, &centroids, &mut labels);
            let updated = update_centroids(points, &mut labels, k);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centroids = updated;
            if shift <= tol {
                break;
            }
        }

        assign(points, &centroids, &mut labels);
        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// Number of distinct points, treating `-0.0` and `0.0` as equal.
pub(crate) fn count_distinct<const D: usize>(points: &[[f64; D]]) -> usize {
    points
        .iter()
        .map(|p| p.map(|v| (v + 0.0).to_bits()))
        .collect::<HashSet<[u64; D]>>()
        .len()
}

fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[allow(clippy::cast_precision_loss)]
fn mean_variance<const D: usize>(points: &[[f64; D]]) -> f64 {
    if points.is_empty() || D == 0 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mut total = 0.0;
    for d in 0..D {
        let mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
        total += points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n;
    }
    total / D as f64
}

/// k-means++ seeding: first centroid uniform, each next one drawn with
/// probability proportional to its squared distance from the nearest chosen
/// centroid.
fn init_plus_plus<const D: usize>(
    points: &[[f64; D]],
    k: usize,
    rng: &mut StdRng,
) -> Vec<[f64; D]> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..n)]);

    let mut min_d2: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_d2.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let fallback = min_d2.iter().rposition(|d| *d > 0.0).unwrap_or(0);
            min_d2
                .iter()
                .position(|d| {
                    target -= d;
                    *d > 0.0 && target < 0.0
                })
                .unwrap_or(fallback)
        } else {
            rng.random_range(0..n)
        };

        let centroid = points[chosen];
        for (d2, p) in min_d2.iter_mut().zip(points) {
            *d2 = d2.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Assign each point to its nearest centroid; ties go to the lower index.
fn assign<const D: usize>(points: &[[f64; D]], centroids: &[[f64; D]], labels: &mut [usize]) {
    for (label, point) in labels.iter_mut().zip(points) {
        let mut best = 0;
        let mut best_d2 = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let d2 = squared_distance(point, centroid);
            if d2 < best_d2 {
                best = c;
                best_d2 = d2;
            }
        }
        *label = best;
    }
}

/// Recompute centroids as member means. An empty cluster takes over the
/// point farthest from its centroid (from a cluster with more than one
/// member), and `labels` is updated to match.
fn update_centroids<const D: usize>(
    points: &[[f64; D]],
    labels: &mut [usize],
    k: usize,
) -> Vec<[f64; D]> {
    let mut sums = vec![[0.0; D]; k];
    let mut counts = vec![0usize; k];
    for (p, &l) in points.iter().zip(labels.iter()) {
        counts[l] += 1;
        for d in 0..D {
            sums[l][d] += p[d];
        }
    }

    for empty in 0..k {
        if counts[empty] != 0 {
            continue;
        }
        let farthest = points
            .iter()
            .enumerate()
            .filter(|(i, _)| counts[labels[*i]] > 1)
            .map(|(i, p)| {
                let l = labels[i];
                (i, squared_distance(p, &mean(&sums[l], counts[l])))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((i, _)) = farthest {
            let from = labels[i];
            counts[from] -= 1;
            for d in 0..D {
                sums[from][d] -= points[i][d];
            }
            counts[empty] = 1;
            sums[empty] = points[i];
            labels[i] = empty;
        }
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, &count)| mean(sum, count))
        .collect()
}

fn mean<const D: usize>(sum: &[f64; D], count: usize) -> [f64; D] {
    if count == 0 {
        return *sum;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    sum.map(|v| v / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three tight, well separated blobs of four points each.
    fn blobs() -> Vec<[f64; 2]> {
        let centers = [[0.0, 0.0], [10.0, 10.0], [-10.0, 10.0]];
        let offsets = [[0.1, 0.0], [-0.1, 0.0], [0.0, 0.1], [0.0, -0.1]];
        centers
            .iter()
            .flat_map(|c| offsets.iter().map(move |o| [c[0] + o[0], c[1] + o[1]]))
            .collect()
    }

    #[test]
    fn recovers_separated_blobs() {
        let points = blobs();
        let fit = KMeans::default().fit(&points).expect("fit");

        assert_eq!(fit.labels.len(), points.len());
        for blob in fit.labels.chunks(4) {
            assert!(blob.iter().all(|&l| l == blob[0]), "blob split: {blob:?}");
        }
        let distinct: HashSet<usize> = fit.labels.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
        assert!(fit.inertia < 1.0, "inertia {}", fit.inertia);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let points = blobs();
        let a = KMeans::default().fit(&points).unwrap();
        let b = KMeans::default().fit(&points).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn labels_stay_in_range() {
        let points: Vec<[f64; 1]> = (0..20).map(|i| [f64::from(i * i)]).collect();
        let fit = KMeans::default().fit(&points).unwrap();
        assert!(fit.labels.iter().all(|&l| l < 3));
        assert_eq!(fit.centroids.len(), 3);
        assert!(fit.inertia >= 0.0);
    }

    #[test]
    fn fewer_distinct_points_than_clusters_fails() {
        let points = [[1.0, 1.0], [1.0, 1.0], [2.0, 2.0], [2.0, 2.0]];
        let err = KMeans::default().fit(&points).unwrap_err();
        assert!(
            matches!(
                err,
                AnalyticsError::InsufficientClusterData { distinct: 2, k: 3 }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn two_rows_fail() {
        let points = [[1.0], [2.0]];
        assert!(KMeans::default().fit(&points).is_err());
    }

    #[test]
    fn exactly_k_distinct_points_get_distinct_labels() {
        let points = [[0.0], [5.0], [9.0]];
        let fit = KMeans::default().fit(&points).unwrap();
        let distinct: HashSet<usize> = fit.labels.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn zero_k_is_invalid() {
        let km = KMeans {
            k: 0,
            ..KMeans::default()
        };
        let err = km.fit(&[[1.0], [2.0]]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
    }

    #[test]
    fn more_restarts_never_increase_inertia() {
        let points: Vec<[f64; 2]> = (0..30)
            .map(|i| {
                let x = f64::from(i);
                [x.sin() * 5.0 + x * 0.3, x.cos() * 3.0]
            })
            .collect();
        let single = KMeans {
            n_init: 1,
            ..KMeans::default()
        }
        .fit(&points)
        .unwrap();
        let many = KMeans::default().fit(&points).unwrap();
        assert!(many.inertia <= single.inertia + 1e-9);
    }

    #[test]
    fn count_distinct_treats_signed_zero_as_equal() {
        assert_eq!(count_distinct(&[[0.0], [-0.0], [1.0]]), 2);
    }

    #[test]
    fn empty_cluster_is_reseeded() {
        // Centroid 2 owns no point after assignment; it must steal one.
        let points = [[0.0], [1.0], [10.0], [11.0]];
        let mut labels = vec![0, 0, 1, 1];
        let centroids = update_centroids(&points, &mut labels, 3);
        let used: HashSet<usize> = labels.iter().copied().collect();
        assert_eq!(used.len(), 3);
        assert_eq!(centroids.len(), 3);
    }
}
