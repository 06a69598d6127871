use crate::board::{BoardState, Placement, Position, Racer, Spectator};
use crate::combos::Enumerator;
use crate::resolve::{apply, apply_all, landing, ApplyError, Landing, Move};

const N: u8 = 16;

fn place(racer: Racer, cell: u8, stack: u8) -> Placement {
    Placement { racer, cell, stack }
}

fn board(placements: &[Placement], spectators: &[(u8, Spectator)]) -> BoardState {
    BoardState::new(N, placements, spectators).unwrap()
}

fn pos(cell: u8, stack: u8) -> Option<Position> {
    Some(Position { cell, stack })
}

/// Every placed racer appears exactly once and stacks rebuild cleanly.
fn assert_invariants(before: &BoardState, after: &BoardState) {
    assert_eq!(after.racers(), before.racers());
    let rebuilt = BoardState::new(after.track_len(), &after.placements(), &[]).unwrap();
    for r in after.racers() {
        assert_eq!(rebuilt.position(r), after.position(r));
    }
}

#[test]
fn advance_tile_pushes_group_one_cell_forward() {
    let b = board(&[place(Racer::Red, 5, 0)], &[(7, Spectator::Advance)]);
    let next = apply(&b, Move::new(Racer::Red, 2)).unwrap();
    assert_eq!(next.position(Racer::Red), pos(8, 0));
}

#[test]
fn retreat_tile_slides_group_underneath() {
    let b = board(
        &[place(Racer::Red, 5, 0), place(Racer::Blue, 6, 0)],
        &[(7, Spectator::Retreat)],
    );
    let next = apply(&b, Move::new(Racer::Red, 2)).unwrap();
    assert_eq!(next.position(Racer::Red), pos(6, 0));
    assert_eq!(next.position(Racer::Blue), pos(6, 1));
}

#[test]
fn retreat_keeps_group_order_and_lifts_existing_stack() {
    let b = board(
        &[
            place(Racer::Red, 2, 0),
            place(Racer::Blue, 2, 1),
            place(Racer::Green, 2, 2),
            place(Racer::Yellow, 4, 0),
            place(Racer::Orange, 4, 1),
        ],
        &[(5, Spectator::Retreat)],
    );
    let next = apply(&b, Move::new(Racer::Blue, 3)).unwrap();
    assert_eq!(
        next.stack(4),
        &[Racer::Blue, Racer::Green, Racer::Yellow, Racer::Orange]
    );
    assert_eq!(next.stack(2), &[Racer::Red]);
    assert_invariants(&b, &next);
}

#[test]
fn retreat_onto_own_cell_goes_under_what_stayed_behind() {
    let b = board(
        &[place(Racer::Red, 5, 0), place(Racer::Blue, 5, 1)],
        &[(6, Spectator::Retreat)],
    );
    let next = apply(&b, Move::new(Racer::Blue, 1)).unwrap();
    assert_eq!(next.stack(5), &[Racer::Blue, Racer::Red]);
}

#[test]
fn advance_lands_on_top() {
    let b = board(
        &[place(Racer::Red, 1, 0), place(Racer::Blue, 4, 0)],
        &[(3, Spectator::Advance)],
    );
    let next = apply(&b, Move::new(Racer::Red, 2)).unwrap();
    assert_eq!(next.stack(4), &[Racer::Blue, Racer::Red]);
}

#[test]
fn group_carry_applies_at_the_start_cell() {
    let b = board(
        &[
            place(Racer::Red, 0, 0),
            place(Racer::Blue, 0, 1),
            place(Racer::Green, 0, 2),
        ],
        &[],
    );
    let next = apply(&b, Move::new(Racer::Red, 2)).unwrap();
    assert!(next.stack(0).is_empty());
    assert_eq!(next.stack(2), &[Racer::Red, Racer::Blue, Racer::Green]);

    let next = apply(&b, Move::new(Racer::Blue, 1)).unwrap();
    assert_eq!(next.stack(0), &[Racer::Red]);
    assert_eq!(next.stack(1), &[Racer::Blue, Racer::Green]);
}

#[test]
fn moving_group_lands_on_existing_stack() {
    let b = board(
        &[
            place(Racer::Red, 3, 0),
            place(Racer::Blue, 3, 1),
            place(Racer::Green, 5, 0),
        ],
        &[],
    );
    let next = apply(&b, Move::new(Racer::Red, 2)).unwrap();
    assert_eq!(next.stack(5), &[Racer::Green, Racer::Red, Racer::Blue]);
    assert!(next.stack(3).is_empty());
}

#[test]
fn destination_clamps_to_finish() {
    let b = board(&[place(Racer::Red, N - 1, 0)], &[]);
    let next = apply(&b, Move::new(Racer::Red, 3)).unwrap();
    assert_eq!(next.position(Racer::Red), pos(N, 0));

    // Rolling again from the finish stays there.
    let again = apply(&next, Move::new(Racer::Red, 3)).unwrap();
    assert_eq!(again.position(Racer::Red), pos(N, 0));
}

#[test]
fn advance_next_to_finish_clamps() {
    let b = board(&[place(Racer::Red, N - 3, 0)], &[(N - 1, Spectator::Advance)]);
    assert_eq!(
        landing(&b, N - 3, 2),
        Landing {
            cell: N,
            underneath: false
        }
    );
}

#[test]
fn retreat_from_first_cell_returns_to_start_underneath() {
    let b = board(
        &[place(Racer::Red, 0, 0), place(Racer::Blue, 0, 1)],
        &[(1, Spectator::Retreat)],
    );
    let next = apply(&b, Move::new(Racer::Blue, 1)).unwrap();
    assert_eq!(next.stack(0), &[Racer::Blue, Racer::Red]);
}

#[test]
fn apply_leaves_input_untouched() {
    let b = board(&[place(Racer::Red, 3, 0), place(Racer::Blue, 3, 1)], &[]);
    let snapshot = b.clone();
    let _ = apply(&b, Move::new(Racer::Red, 3)).unwrap();
    assert_eq!(b, snapshot);
}

#[test]
fn apply_all_chains_moves() {
    let b = board(&[place(Racer::Red, 3, 0), place(Racer::Blue, 4, 0)], &[]);
    let end = apply_all(&b, &[Move::new(Racer::Red, 1), Move::new(Racer::Blue, 2)]).unwrap();
    // Red landed on Blue and was carried along.
    assert_eq!(end.stack(6), &[Racer::Blue, Racer::Red]);
}

#[test]
fn unknown_racer_and_bad_die_are_errors() {
    let b = board(&[place(Racer::Red, 3, 0)], &[]);
    assert_eq!(
        apply(&b, Move::new(Racer::Green, 1)).unwrap_err(),
        ApplyError::UnknownRacer {
            racer: Racer::Green
        }
    );
    for die in [0, 4] {
        assert_eq!(
            apply(&b, Move::new(Racer::Red, die)).unwrap_err(),
            ApplyError::InvalidDie { die }
        );
    }
}

#[test]
fn conservation_and_contiguity_over_every_combination() {
    let b = board(
        &[
            place(Racer::Red, 0, 0),
            place(Racer::Blue, 0, 1),
            place(Racer::Green, 2, 0),
            place(Racer::Yellow, 3, 0),
            place(Racer::Orange, 3, 1),
        ],
        &[(4, Spectator::Retreat), (6, Spectator::Advance)],
    );
    let e = Enumerator::new(&[Racer::Red, Racer::Green, Racer::Orange], u64::MAX).unwrap();
    for combo in &e {
        let mut state = b.clone();
        for mv in combo {
            state = apply(&state, mv).unwrap();
            assert_invariants(&b, &state);
        }
    }
}
