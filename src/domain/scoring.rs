//! Running mean of review scores per catalog item.
//!
//! Only the aggregate (mean, count) is kept on the catalog item, so a score must be
//! folded in exactly once per published review. Published reviews are the audit
//! trail: replaying their scores must reproduce the stored mean.

/// Folds one new score into `(mean, count)`.
pub fn apply_score(mean: f64, count: i64, new_score: i32) -> (f64, i64) {
    let count = count.max(0);
    let new_count = count + 1;
    let new_mean = (mean * count as f64 + f64::from(new_score)) / new_count as f64;
    (new_mean, new_count)
}

/// Recomputes `(mean, count)` from a sequence of published scores.
pub fn replay_mean<I>(scores: I) -> (f64, i64)
where
    I: IntoIterator<Item = i32>,
{
    scores
        .into_iter()
        .fold((0.0, 0), |(mean, count), s| apply_score(mean, count, s))
}

/// Whether a stored mean agrees with a replayed one.
pub fn means_agree(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_score_becomes_mean() {
        assert_eq!(apply_score(0.0, 0, 4), (4.0, 1));
    }

    #[test]
    fn incremental_mean_matches_arithmetic_mean() {
        let scores = [5, 3, 4, 1, 2, 5, 5, 4];
        let (mean, count) = replay_mean(scores);
        let expected = scores.iter().sum::<i32>() as f64 / scores.len() as f64;
        assert_eq!(count, scores.len() as i64);
        assert!(means_agree(mean, expected), "{} vs {}", mean, expected);
    }

    #[test]
    fn incremental_step_matches_formula() {
        let (mean, count) = apply_score(3.5, 2, 5);
        assert_eq!(count, 3);
        assert!(means_agree(mean, (3.5 * 2.0 + 5.0) / 3.0));
    }

    #[test]
    fn empty_replay_is_zero() {
        assert_eq!(replay_mean(std::iter::empty()), (0.0, 0));
    }
}
