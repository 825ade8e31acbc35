use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use tracing::debug;

/// Outcome of settling one turn.
#[derive(Debug, Clone)]
pub struct Settlement<K, P> {
    /// Updated score of every player.
    pub scores: HashMap<K, f64>,
    /// Targets that were not reached this turn, in their original order.
    pub remaining: Vec<P>,
    /// Distinct positions whose targets were consumed this turn.
    pub consumed: Vec<P>,
}

/// Settles the scores of one turn.
///
/// Every player standing on a cell holding at least one target earns one point.
/// When `k` players share such a cell, each of them then loses `(k - 1) / N`
/// points where `N` is the total number of players. All targets on a reached
/// cell are consumed, duplicates included.
///
/// Positions can be coordinates or raw cell indices, as long as players and
/// targets use the same representation. Players missing from `scores` start
/// from zero.
pub fn settle<K, P>(
    positions: &HashMap<K, P>,
    scores: &HashMap<K, f64>,
    targets: &[P],
) -> Settlement<K, P>
where
    K: Eq + Hash + Clone,
    P: Eq + Hash + Clone,
{
    let mut scores = scores.clone();
    let (remaining, consumed) = settle_in_place(positions, &mut scores, targets);
    Settlement {
        scores,
        remaining,
        consumed,
    }
}

/// Same as [`settle`], but updates `scores` directly.
///
/// Returns the remaining targets and the consumed positions.
pub fn settle_in_place<K, P>(
    positions: &HashMap<K, P>,
    scores: &mut HashMap<K, f64>,
    targets: &[P],
) -> (Vec<P>, Vec<P>)
where
    K: Eq + Hash + Clone,
    P: Eq + Hash + Clone,
{
    let total_players = positions.len() as f64;
    let target_cells: HashSet<&P> = targets.iter().collect();

    // Count players on every reached target before anyone is paid.
    let mut occupancy: HashMap<&P, usize> = HashMap::new();
    for position in positions.values() {
        if target_cells.contains(position) {
            *occupancy.entry(position).or_insert(0) += 1;
        }
    }

    for (name, position) in positions {
        if let Some(&sharing) = occupancy.get(position) {
            let gain = 1.0 - (sharing - 1) as f64 / total_players;
            *scores.entry(name.clone()).or_insert(0.0) += gain;
        }
    }

    let mut consumed = Vec::with_capacity(occupancy.len());
    let mut seen: HashSet<&P> = HashSet::with_capacity(occupancy.len());
    let mut remaining = Vec::with_capacity(targets.len());
    for target in targets {
        if occupancy.contains_key(target) {
            if seen.insert(target) {
                consumed.push(target.clone());
            }
        } else {
            remaining.push(target.clone());
        }
    }

    debug!(
        players = positions.len(),
        consumed = consumed.len(),
        remaining = remaining.len(),
        "settled turn"
    );
    (remaining, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    const EPSILON: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    fn named<V: Clone>(values: &[V]) -> HashMap<String, V> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("p{i}"), v.clone()))
            .collect()
    }

    #[test]
    fn single_player_on_target_gets_full_point() {
        let positions = named(&[5usize, 4]);
        let scores = named(&[0.0, 5.0]);

        let settlement = settle(&positions, &scores, &[4usize, 1]);

        assert_close(settlement.scores["p0"], 0.0);
        assert_close(settlement.scores["p1"], 6.0);
        assert_eq!(settlement.remaining, vec![1]);
        assert_eq!(settlement.consumed, vec![4]);
    }

    #[test]
    fn two_players_sharing_split_the_point() {
        let positions = named(&[3usize, 3]);
        let scores = named(&[0.0, 0.0]);

        let settlement = settle(&positions, &scores, &[3usize]);

        assert_close(settlement.scores["p0"], 0.5);
        assert_close(settlement.scores["p1"], 0.5);
        assert!(settlement.remaining.is_empty());
    }

    #[test]
    fn three_players_with_coordinates() {
        let positions = named(&[Position::new(1, 1), Position::new(1, 5), Position::new(1, 5)]);
        let scores = named(&[0.5, 1.0 / 3.0, 4.0 / 3.0]);
        let targets = [Position::new(1, 1), Position::new(1, 5)];

        let settlement = settle(&positions, &scores, &targets);

        assert_close(settlement.scores["p0"], 1.5);
        assert_close(settlement.scores["p1"], 1.0);
        assert_close(settlement.scores["p2"], 2.0);
        assert!(settlement.remaining.is_empty());
        assert_eq!(settlement.consumed, targets.to_vec());
    }

    #[test]
    fn four_players_mixed_outcomes() {
        let positions = named(&[2usize, 2, 3, 4]);
        let scores = named(&[0.5, 0.75, 1.0, 0.0]);

        let settlement = settle(&positions, &scores, &[2usize, 4, 1]);

        assert_close(settlement.scores["p0"], 1.25);
        assert_close(settlement.scores["p1"], 1.5);
        assert_close(settlement.scores["p2"], 1.0);
        assert_close(settlement.scores["p3"], 1.0);
        assert_eq!(settlement.remaining, vec![1]);
        assert_eq!(settlement.consumed, vec![2, 4]);
    }

    #[test]
    fn duplicate_targets_are_consumed_together_without_extra_points() {
        let positions = named(&[7usize, 0]);
        let scores = named(&[0.0, 0.0]);

        let settlement = settle(&positions, &scores, &[9usize, 7, 3, 7, 9]);

        assert_close(settlement.scores["p0"], 1.0);
        assert_close(settlement.scores["p1"], 0.0);
        assert_eq!(settlement.remaining, vec![9, 3, 9]);
        assert_eq!(settlement.consumed, vec![7]);
    }

    #[test]
    fn no_player_on_target_changes_nothing() {
        let positions = named(&[0usize, 1, 2]);
        let scores = named(&[1.0, 2.0, 3.0]);

        let settlement = settle(&positions, &scores, &[5usize, 6]);

        assert_eq!(settlement.scores, scores);
        assert_eq!(settlement.remaining, vec![5, 6]);
        assert!(settlement.consumed.is_empty());
    }

    #[test]
    fn in_place_updates_callers_scores() {
        let positions = named(&[Position::new(0, 0), Position::new(0, 0)]);
        let mut scores = HashMap::new();

        let (remaining, consumed) =
            settle_in_place(&positions, &mut scores, &[Position::new(0, 0)]);

        assert!(remaining.is_empty());
        assert_eq!(consumed, vec![Position::new(0, 0)]);
        assert_close(scores["p0"], 0.5);
        assert_close(scores["p1"], 0.5);
    }

    #[test]
    fn group_total_matches_split_formula() {
        // Three of five players share one cell: each nets 1 - 2/5.
        let positions = named(&[1usize, 1, 1, 8, 9]);
        let scores = named(&[0.0; 5]);

        let settlement = settle(&positions, &scores, &[1usize]);

        let total: f64 = settlement.scores.values().sum();
        assert_close(total, 3.0 - 3.0 * 2.0 / 5.0);
        assert_close(settlement.scores["p2"], 0.6);
    }

    #[test]
    fn no_players_is_a_no_op() {
        let positions: HashMap<String, usize> = HashMap::new();
        let settlement = settle(&positions, &HashMap::new(), &[1usize, 2]);
        assert!(settlement.scores.is_empty());
        assert_eq!(settlement.remaining, vec![1, 2]);
    }
}
