use std::time::Instant;

use crate::aggregate::{
    aggregate, aggregate_par, aggregate_with_deadline, records, Coverage, ProbabilityTable,
    Tally, TallySource,
};
use crate::board::{BoardState, Placement, Racer, Spectator};
use crate::combos::Enumerator;
use crate::error::EngineError;
use crate::rank::{finish_order, FinishOrder};

const N: u8 = 16;
const TOL: f64 = 1e-9;

fn place(racer: Racer, cell: u8, stack: u8) -> Placement {
    Placement { racer, cell, stack }
}

fn two_racers() -> BoardState {
    BoardState::new(N, &[place(Racer::Red, 3, 0), place(Racer::Blue, 4, 0)], &[]).unwrap()
}

fn full_field() -> BoardState {
    BoardState::new(
        N,
        &[
            place(Racer::Red, 0, 0),
            place(Racer::Blue, 0, 1),
            place(Racer::Green, 1, 0),
            place(Racer::Yellow, 2, 0),
            place(Racer::Orange, 2, 1),
        ],
        &[(3, Spectator::Advance), (5, Spectator::Retreat)],
    )
    .unwrap()
}

fn assert_normalized(t: &ProbabilityTable) {
    let n = t.ranks.len();
    for row in &t.ranks {
        assert_eq!(row.percent.len(), n);
        let sum: f64 = row.percent.iter().sum();
        assert!((sum - 100.0).abs() < TOL, "{} row sums to {sum}", row.racer);
    }
    for rank in 0..n {
        let sum: f64 = t.ranks.iter().map(|r| r.percent[rank]).sum();
        assert!((sum - 100.0).abs() < TOL, "rank {rank} column sums to {sum}");
    }
    let sum: f64 = t.orders.iter().map(|o| o.percent).sum();
    assert!((sum - 100.0).abs() < TOL, "orders sum to {sum}");
}

#[test]
fn two_racer_scenario_is_exact() {
    let b = two_racers();
    let e = Enumerator::new(&[Racer::Red, Racer::Blue], u64::MAX).unwrap();
    let t = aggregate(&b, &e).unwrap();

    assert_eq!(t.coverage, Coverage::Exact);
    assert_eq!(t.combinations, 18);
    assert_normalized(&t);

    // Blue leads in 11 of 18 combinations, Red in 7.
    let blue_first = FinishOrder::new(vec![Racer::Blue, Racer::Red]);
    let red_first = FinishOrder::new(vec![Racer::Red, Racer::Blue]);
    assert_eq!(t.orders.len(), 2);
    assert_eq!(t.orders[0].order, blue_first);
    assert_eq!(t.orders[0].count, 11);
    assert_eq!(t.orders[1].count, 7);
    assert!((t.order_percent(&red_first).unwrap() - 700.0 / 18.0).abs() < TOL);
    assert!((t.rank_percent(Racer::Blue, 0).unwrap() - 1100.0 / 18.0).abs() < TOL);
    assert!((t.rank_percent(Racer::Red, 1).unwrap() - 1100.0 / 18.0).abs() < TOL);
}

#[test]
fn no_remaining_racers_reports_current_order_with_certainty() {
    let b = full_field();
    let e = Enumerator::new(&[], 1).unwrap();
    let t = aggregate(&b, &e).unwrap();

    assert_eq!(t.coverage, Coverage::Exact);
    assert_eq!(t.combinations, 1);
    assert_eq!(t.orders.len(), 1);
    assert_eq!(t.orders[0].order, finish_order(&b));
    assert!((t.orders[0].percent - 100.0).abs() < TOL);
    assert_normalized(&t);
}

#[test]
fn parallel_matches_sequential_for_full_field() {
    let b = full_field();
    let e = Enumerator::new(&Racer::ALL, u64::MAX).unwrap();
    let seq = aggregate(&b, &e).unwrap();
    let par = aggregate_par(&b, &e).unwrap();

    assert_eq!(seq.combinations, 29_160);
    assert_eq!(seq, par);
    assert_normalized(&seq);
}

#[test]
fn orders_are_sorted_most_likely_first() {
    let b = full_field();
    let e = Enumerator::new(&[Racer::Red, Racer::Green, Racer::Orange], u64::MAX).unwrap();
    let t = aggregate(&b, &e).unwrap();
    assert!(t.orders.windows(2).all(|w| w[0].count >= w[1].count));
    assert_eq!(t.most_likely(), t.orders.first());
    let counted: u64 = t.orders.iter().map(|o| o.count).sum();
    assert_eq!(counted, t.combinations);
}

#[test]
fn expired_deadline_yields_partial_report() {
    let b = two_racers();
    let e = Enumerator::new(&[Racer::Red, Racer::Blue], u64::MAX).unwrap();
    for parallel in [false, true] {
        let t = aggregate_with_deadline(&b, &e, Instant::now(), parallel).unwrap();
        assert_eq!(
            t.coverage,
            Coverage::Partial {
                processed: 0,
                total: 18
            }
        );
        assert!(!t.coverage.is_exact());
        assert!(t.orders.is_empty());
    }
}

#[test]
fn generous_deadline_is_still_exact() {
    let b = two_racers();
    let e = Enumerator::new(&[Racer::Red, Racer::Blue], u64::MAX).unwrap();
    let later = Instant::now() + std::time::Duration::from_secs(3600);
    let t = aggregate_with_deadline(&b, &e, later, true).unwrap();
    assert_eq!(t, aggregate(&b, &e).unwrap());
}

#[test]
fn exact_and_sampled_tallies_do_not_merge() {
    let racers = vec![Racer::Red, Racer::Blue];
    let exact = Tally::new(TallySource::Enumerated, racers.clone());
    let sampled = Tally::new(TallySource::Sampled, racers.clone());
    assert!(matches!(
        exact.clone().merge(sampled),
        Err(EngineError::MixedCoverage)
    ));

    let mut a = Tally::new(TallySource::Enumerated, racers.clone());
    a.record(FinishOrder::new(vec![Racer::Red, Racer::Blue]));
    let mut b = Tally::new(TallySource::Enumerated, racers);
    b.record(FinishOrder::new(vec![Racer::Blue, Racer::Red]));
    b.record(FinishOrder::new(vec![Racer::Red, Racer::Blue]));
    let merged = a.merge(b).unwrap();
    assert_eq!(merged.total(), 3);
    let t = merged.into_table(Coverage::Exact);
    assert_eq!(t.orders[0].count, 2);
    assert_eq!(t.ranks[0].counts, vec![2, 1]);
}

#[test]
fn records_report_final_positions_and_order() {
    let b = two_racers();
    let e = Enumerator::new(&[Racer::Red, Racer::Blue], u64::MAX).unwrap();
    let all: Vec<_> = records(&b, &e).collect::<Result<_, _>>().unwrap();
    assert_eq!(all.len(), 18);

    // Index 0: Red rolls 1 onto Blue, then Blue rolls 1 carrying Red to cell 5.
    let first = &all[0];
    assert_eq!(first.index, 0);
    assert_eq!(first.order.racers(), &[Racer::Red, Racer::Blue]);
    assert_eq!(first.finals, vec![place(Racer::Red, 5, 1), place(Racer::Blue, 5, 0)]);

    let leaders_blue = all
        .iter()
        .filter(|r| r.order.leader() == Some(Racer::Blue))
        .count();
    assert_eq!(leaders_blue, 11);
}
