use crate::models::{Poll, Vote, VoteValue};
use crate::voting::ChartRow;
use std::cmp::Ordering;
use std::collections::HashMap;

pub fn calculate_results(poll: &Poll, votes: &[Vote]) -> (String, Vec<ChartRow>) {
    let num_options = poll.options.len();

    // Every option starts at zero so it shows up even if nobody ranked it
    let mut scores = vec![0.0f64; poll.options.len()];
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (idx, option) in poll.options.iter().enumerate() {
        position.entry(option.id.as_str()).or_insert(idx);
    }

    for vote in votes {
        let VoteValue::Ranking(ranks) = &vote.value else {
            continue;
        };

        for (option_id, rank) in ranks {
            let Some(&idx) = position.get(option_id.as_str()) else {
                continue;
            };
            if let Some(points) = rank.and_then(|r| points_for_rank(r, num_options)) {
                scores[idx] += points;
            }
        }
    }

    // Stable sort on a fresh index list keeps the poll's order for ties
    let mut order: Vec<usize> = (0..poll.options.len()).collect();
    order.sort_by(|a, b| scores[*b].partial_cmp(&scores[*a]).unwrap_or(Ordering::Equal));

    // Max possible score for an option is if everyone ranked it first
    let max_points = (votes.len() * num_options) as u64;

    let rows = order
        .into_iter()
        .map(|idx| ChartRow {
            label: poll.options[idx].text.clone(),
            value: scores[idx],
            total: max_points,
        })
        .collect();

    let summary = format!(
        "Rankings based on Borda Count (Rank 1 = {} pts)",
        num_options
    );

    (summary, rows)
}

/// Rank 1 is worth `num_options` points, rank `num_options` is worth 1.
/// A fractional rank in range earns fractional points; out-of-range ranks earn nothing.
fn points_for_rank(rank: f64, num_options: usize) -> Option<f64> {
    let num_options = num_options as f64;
    if rank < 1.0 || rank > num_options {
        return None;
    }
    Some(num_options - rank + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PollOption;
    use chrono::Utc;

    fn poll_with(ids: &[&str]) -> Poll {
        Poll {
            id: "poll".to_string(),
            event_id: "event".to_string(),
            question: "Pick".to_string(),
            kind: crate::models::PollKind::Ranking,
            options: ids
                .iter()
                .map(|id| PollOption {
                    id: id.to_string(),
                    text: id.to_string(),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    fn vote(ranks: &[(&str, i64)]) -> Vote {
        Vote::new(
            "poll".to_string(),
            None,
            VoteValue::ranking(ranks.iter().map(|(id, rank)| (*id, *rank))),
        )
    }

    fn scored(rows: &[ChartRow]) -> Vec<(&str, f64)> {
        rows.iter().map(|row| (row.label.as_str(), row.value)).collect()
    }

    #[test]
    fn borda_example_keeps_option_order_for_ties() {
        let poll = poll_with(&["A", "B", "C"]);
        let votes = vec![
            vote(&[("A", 1), ("B", 2), ("C", 3)]),
            vote(&[("A", 2), ("B", 1), ("C", 3)]),
        ];

        let (summary, rows) = calculate_results(&poll, &votes);

        assert_eq!(summary, "Rankings based on Borda Count (Rank 1 = 3 pts)");
        assert_eq!(scored(&rows), vec![("A", 5.0), ("B", 5.0), ("C", 2.0)]);
        assert!(rows.iter().all(|row| row.total == 6));
    }

    #[test]
    fn higher_scores_come_first() {
        let poll = poll_with(&["A", "B", "C"]);
        let votes = vec![vote(&[("C", 1), ("B", 2), ("A", 3)])];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(scored(&rows), vec![("C", 3.0), ("B", 2.0), ("A", 1.0)]);
    }

    #[test]
    fn unknown_option_ids_are_ignored() {
        let poll = poll_with(&["A", "B"]);
        let votes = vec![vote(&[("A", 1), ("Z", 2)])];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(scored(&rows), vec![("A", 2.0), ("B", 0.0)]);
        assert!(rows.iter().all(|row| row.label != "Z"));
    }

    #[test]
    fn out_of_range_ranks_score_nothing() {
        let poll = poll_with(&["A", "B"]);
        let votes = vec![vote(&[("A", 0), ("B", 99)]), vote(&[("A", -1)])];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(scored(&rows), vec![("A", 0.0), ("B", 0.0)]);
        assert!(rows.iter().all(|row| row.total == 4));
    }

    #[test]
    fn missing_ranks_score_nothing_and_fractional_ranks_score_fractions() {
        let poll = poll_with(&["A", "B", "C"]);
        let votes = vec![Vote::new(
            "poll".to_string(),
            None,
            VoteValue::Ranking(vec![
                ("A".to_string(), None),
                ("B".to_string(), Some(1.5)),
                ("C".to_string(), Some(0.5)),
            ]),
        )];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(scored(&rows), vec![("B", 2.5), ("A", 0.0), ("C", 0.0)]);
        assert!(rows.iter().all(|row| row.total == 3));
    }

    #[test]
    fn rating_payloads_on_a_ranking_poll_count_only_towards_total() {
        let poll = poll_with(&["A", "B"]);
        let votes = vec![Vote::new("poll".to_string(), None, VoteValue::rating(1))];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(scored(&rows), vec![("A", 0.0), ("B", 0.0)]);
        assert!(rows.iter().all(|row| row.total == 2));
    }

    #[test]
    fn partial_ballots_are_processed_entry_by_entry() {
        let poll = poll_with(&["A", "B", "C"]);
        let votes = vec![vote(&[("B", 1)]), vote(&[("A", 1), ("B", 1), ("C", 1)])];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(scored(&rows), vec![("B", 6.0), ("A", 3.0), ("C", 3.0)]);
    }

    #[test]
    fn zero_votes_keeps_every_option() {
        let poll = poll_with(&["A", "B", "C"]);

        let (summary, rows) = calculate_results(&poll, &[]);
        assert_eq!(summary, "Rankings based on Borda Count (Rank 1 = 3 pts)");
        assert_eq!(scored(&rows), vec![("A", 0.0), ("B", 0.0), ("C", 0.0)]);
        assert!(rows.iter().all(|row| row.total == 0));
    }

    #[test]
    fn zero_options_yields_no_rows() {
        let poll = poll_with(&[]);
        let (_, rows) = calculate_results(&poll, &[vote(&[("A", 1)])]);
        assert!(rows.is_empty());
    }

    #[test]
    fn first_place_vote_never_lowers_a_score() {
        let poll = poll_with(&["A", "B", "C"]);
        let mut votes = vec![
            vote(&[("B", 1), ("C", 2), ("A", 3)]),
            vote(&[("C", 1), ("B", 2)]),
        ];
        let (_, before) = calculate_results(&poll, &votes);

        votes.push(vote(&[("A", 1)]));
        let (_, after) = calculate_results(&poll, &votes);

        let score = |rows: &[ChartRow], label: &str| {
            rows.iter().find(|row| row.label == label).map(|row| row.value)
        };
        assert!(score(&after, "A") > score(&before, "A"));
        for label in ["B", "C"] {
            assert!(score(&after, label) >= score(&before, label));
        }
    }

    #[test]
    fn canonical_option_order_is_untouched() {
        let poll = poll_with(&["A", "B"]);
        let votes = vec![vote(&[("B", 1), ("A", 2)])];

        let (_, rows) = calculate_results(&poll, &votes);
        assert_eq!(rows[0].label, "B");
        assert_eq!(poll.options[0].id, "A");
    }

    #[test]
    fn repeated_zero_vote_aggregation_is_deterministic() {
        let poll = poll_with(&["A", "B"]);
        assert_eq!(calculate_results(&poll, &[]), calculate_results(&poll, &[]));
    }
}
