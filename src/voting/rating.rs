use crate::models::{Vote, VoteValue};
use crate::voting::ChartRow;

const STAR_BUCKETS: usize = 5;

pub fn calculate_results(votes: &[Vote]) -> (String, Vec<ChartRow>) {
    let total_votes = votes.len() as u64;
    let mut distribution = [0u64; STAR_BUCKETS];
    let mut sum = 0.0;

    for vote in votes {
        let stars = star_value(&vote.value);

        // Non-numeric values still count towards the divisor
        sum += stars.unwrap_or(0.0);

        if let Some(bucket) = stars.and_then(bucket_index) {
            distribution[bucket] += 1;
        }
    }

    let summary = if votes.is_empty() {
        "No votes yet".to_string()
    } else {
        format!("Average: {} / 5", one_decimal(sum / total_votes as f64))
    };

    let rows = distribution
        .iter()
        .enumerate()
        .map(|(idx, count)| ChartRow {
            label: format!("{} Stars", idx + 1),
            value: *count as f64,
            total: total_votes,
        })
        .collect();

    (summary, rows)
}

fn star_value(value: &VoteValue) -> Option<f64> {
    match value {
        VoteValue::Rating(stars) => *stars,
        // A rank map on a rating poll is not a number
        VoteValue::Ranking(_) => None,
    }
}

fn bucket_index(stars: f64) -> Option<usize> {
    if stars.fract() == 0.0 && (1.0..=STAR_BUCKETS as f64).contains(&stars) {
        Some(stars as usize - 1)
    } else {
        None
    }
}

// Rounds the exact binary value, so 1.15 (stored as 1.1499...) gives "1.1".
// Only exact ties such as 2.25 round away from zero.
fn one_decimal(value: f64) -> String {
    let exact_tie = (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0;
    if exact_tie {
        format!("{:.1}", value + 0.05 * value.signum())
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(values: Vec<VoteValue>) -> Vec<Vote> {
        values
            .into_iter()
            .map(|value| Vote::new("poll".to_string(), None, value))
            .collect()
    }

    fn histogram(rows: &[ChartRow]) -> Vec<f64> {
        rows.iter().map(|row| row.value).collect()
    }

    #[test]
    fn no_votes_yields_five_empty_buckets() {
        let (summary, rows) = calculate_results(&[]);
        assert_eq!(summary, "No votes yet");
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.value == 0.0 && row.total == 0));
        assert_eq!(rows[0].label, "1 Stars");
        assert_eq!(rows[4].label, "5 Stars");
    }

    #[test]
    fn mean_and_histogram_for_two_four_four() {
        let votes = votes(vec![
            VoteValue::rating(2),
            VoteValue::rating(4),
            VoteValue::rating(4),
        ]);
        let (summary, rows) = calculate_results(&votes);

        assert_eq!(summary, "Average: 3.3 / 5");
        assert_eq!(histogram(&rows), vec![0.0, 1.0, 0.0, 2.0, 0.0]);
        assert!(rows.iter().all(|row| row.total == 3));
    }

    #[test]
    fn non_numeric_values_count_as_zero_in_the_mean() {
        let votes = votes(vec![
            VoteValue::rating(5),
            VoteValue::Rating(None),
            VoteValue::Ranking(vec![("0".to_string(), Some(1.0))]),
        ]);
        let (summary, rows) = calculate_results(&votes);

        // 5 / 3
        assert_eq!(summary, "Average: 1.7 / 5");
        assert_eq!(histogram(&rows), vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(rows.iter().all(|row| row.total == 3));
    }

    #[test]
    fn out_of_range_values_skip_the_histogram_but_not_the_mean() {
        let votes = votes(vec![
            VoteValue::rating(7),
            VoteValue::rating(0),
            VoteValue::Rating(Some(3.5)),
            VoteValue::rating(3),
        ]);
        let (summary, rows) = calculate_results(&votes);

        // (7 + 0 + 3.5 + 3) / 4 = 3.375
        assert_eq!(summary, "Average: 3.4 / 5");
        assert_eq!(histogram(&rows), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(rows.iter().all(|row| row.total == 4));
    }

    #[test]
    fn exact_halves_round_up() {
        assert_eq!(one_decimal(2.25), "2.3");
        assert_eq!(one_decimal(0.75), "0.8");
        assert_eq!(one_decimal(4.0), "4.0");
        assert_eq!(one_decimal(10.0 / 3.0), "3.3");
    }

    #[test]
    fn near_halves_follow_the_stored_value() {
        // 23 / 20 is stored just below 1.15
        assert_eq!(one_decimal(23.0 / 20.0), "1.1");
        assert_eq!(one_decimal(1.05), "1.1");
    }
}
