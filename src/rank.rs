//! Within-bin ranks for dot-histogram layout.

use crate::models::HistogramPoint;
use ahash::AHashMap;
use std::hash::Hash;

/// Something that can be stacked inside a histogram bin.
pub trait Ranked {
    /// Value the stacking order is derived from.
    fn rank_value(&self) -> f64;
    fn set_rank(&mut self, rank: usize);
}

impl Ranked for HistogramPoint {
    fn rank_value(&self) -> f64 {
        self.value
    }

    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

/// Annotate every point with its rank inside its bin.
///
/// Points sharing a bin id get ranks `0..k` by ascending value; equal values keep their input
/// order. The slice is neither reordered nor shortened, and re-running on unchanged input
/// assigns the same ranks.
pub fn assign_ranks<T, K, F>(points: &mut [T], bin_id_of: F)
where
    T: Ranked,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut bins: AHashMap<K, Vec<usize>> = AHashMap::new();
    for (i, p) in points.iter().enumerate() {
        bins.entry(bin_id_of(p)).or_default().push(i);
    }
    for mut members in bins.into_values() {
        // stable: ties stay in input order
        members.sort_by(|&a, &b| points[a].rank_value().total_cmp(&points[b].rank_value()));
        for (rank, i) in members.into_iter().enumerate() {
            points[i].set_rank(rank);
        }
    }
}

/// Rank the histogram points by their bin label.
pub fn rank_histogram(points: &mut [HistogramPoint]) {
    assign_ranks(points, |p| p.bin.clone());
}
