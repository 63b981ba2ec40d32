use proptest::prelude::*;
use strumline_core::chart::{Lane, Note, Side};
use strumline_core::gameplay::hit_window::{HitWindow, Rating};
use strumline_core::gameplay::judge::{HoldEnd, JudgeMachine, MissKind, ReleaseOutcome};

fn spawned(mut notes: Vec<Note>) -> Vec<Note> {
    for note in &mut notes {
        note.mark_spawned();
    }
    notes
}

fn tap(time: f64, lane: Lane) -> Note {
    Note::new(time, lane, 0.0, Side::Player)
}

#[test]
fn test_tap_ratings_by_timing() {
    for (pos, expected) in [(1040.0, Some(Rating::Sick)), (1090.0, Some(Rating::Good)), (1200.0, None)] {
        let mut notes = spawned(vec![tap(1000.0, Lane::Left)]);
        let mut judge = JudgeMachine::default();
        let result = judge.judge_input(Lane::Left, pos, &mut notes);
        assert_eq!(result.map(|r| r.rating), expected, "press at {pos}");
        assert_eq!(notes[0].was_hit(), expected.is_some());
    }
}

#[test]
fn test_unhit_note_auto_misses_after_widest_window() {
    let mut notes = spawned(vec![tap(1000.0, Lane::Left)]);
    let mut judge = JudgeMachine::default();

    assert!(judge.judge_input(Lane::Left, 1200.0, &mut notes).is_none());
    assert!(judge.check_misses(1180.0, &mut notes).is_empty());
    assert!(!notes[0].too_late());

    let misses = judge.check_misses(1181.0, &mut notes);
    assert_eq!(misses.len(), 1);
    assert_eq!(misses[0].kind, MissKind::Late);
    assert!(notes[0].too_late());
    assert!(!notes[0].was_hit());
}

#[test]
fn test_closest_note_in_lane_wins() {
    let mut notes = spawned(vec![
        tap(900.0, Lane::Down),
        tap(1000.0, Lane::Left),
        tap(1010.0, Lane::Down),
    ]);
    let mut judge = JudgeMachine::default();

    let result = judge.judge_input(Lane::Down, 980.0, &mut notes).unwrap();
    assert_eq!(result.note_index, 2);
    assert_eq!(result.delta, -30.0);

    // The hit note is no longer a candidate.
    let result = judge.judge_input(Lane::Down, 980.0, &mut notes).unwrap();
    assert_eq!(result.note_index, 0);
    assert_eq!(result.rating, Rating::Good);
}

#[test]
fn test_empty_lane_and_unspawned_notes_are_ignored() {
    let mut notes = vec![tap(1000.0, Lane::Up)];
    let mut judge = JudgeMachine::default();
    assert!(judge.judge_input(Lane::Right, 1000.0, &mut notes).is_none());
    assert!(judge.judge_input(Lane::Up, 1000.0, &mut notes).is_none());
    assert!(!notes[0].was_hit());
}

#[test]
fn test_opponent_notes_are_not_player_candidates() {
    let mut notes = spawned(vec![Note::new(1000.0, Lane::Left, 0.0, Side::Opponent)]);
    let mut judge = JudgeMachine::default();
    assert!(judge.judge_input(Lane::Left, 1000.0, &mut notes).is_none());
    assert!(judge.check_misses(5000.0, &mut notes).is_empty());
}

#[test]
fn test_miss_note_is_idempotent() {
    let mut notes = spawned(vec![tap(1000.0, Lane::Left)]);
    let mut judge = JudgeMachine::default();
    assert!(judge.miss_note(0, MissKind::Late, 1300.0, &mut notes).is_some());
    assert!(judge.miss_note(0, MissKind::Late, 1400.0, &mut notes).is_none());
    assert!(judge.check_misses(2000.0, &mut notes).is_empty());
}

#[test]
fn test_hold_held_to_end_completes() {
    let mut notes = spawned(vec![Note::new(2000.0, Lane::Up, 1000.0, Side::Player)]);
    let mut judge = JudgeMachine::default();

    let hit = judge.judge_input(Lane::Up, 2000.0, &mut notes).unwrap();
    assert!(hit.is_hold);
    assert!(notes[0].is_being_held());
    assert_eq!(judge.active_hold(Side::Player, Lane::Up), Some(0));

    assert!(judge.update_holds(2999.0, &mut notes).is_empty());
    let done = judge.update_holds(3000.0, &mut notes);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].end, HoldEnd::Completed);
    assert!(notes[0].hold_end_passed());
    assert!(!notes[0].is_being_held());
    assert_eq!(judge.active_hold(Side::Player, Lane::Up), None);

    // Letting go afterwards is free.
    assert!(judge.release_hold(Lane::Up, 3050.0, &mut notes).is_none());
    assert!(judge.check_misses(6000.0, &mut notes).is_empty());
}

#[test]
fn test_early_hold_release_is_one_miss() {
    let mut notes = spawned(vec![Note::new(2000.0, Lane::Up, 1000.0, Side::Player)]);
    let mut judge = JudgeMachine::default();
    judge.judge_input(Lane::Up, 2000.0, &mut notes).unwrap();

    let outcome = judge.release_hold(Lane::Up, 2400.0, &mut notes);
    let Some(ReleaseOutcome::Early(miss)) = outcome else {
        panic!("expected an early release, got {outcome:?}");
    };
    assert_eq!(miss.kind, MissKind::EarlyRelease);
    assert_eq!(miss.delta, -600.0);
    assert_eq!(judge.active_hold(Side::Player, Lane::Up), None);
    assert!(notes[0].was_hit());
    assert!(!notes[0].too_late());
    assert!(notes[0].hold_dropped());

    assert!(judge.release_hold(Lane::Up, 2500.0, &mut notes).is_none());
    assert!(judge.miss_note(0, MissKind::EarlyRelease, 2500.0, &mut notes).is_none());
    assert!(judge.update_holds(3000.0, &mut notes).is_empty());
}

#[test]
fn test_release_near_end_is_clean() {
    let mut notes = spawned(vec![Note::new(2000.0, Lane::Up, 1000.0, Side::Player)]);
    let mut judge = JudgeMachine::default();
    judge.judge_input(Lane::Up, 2000.0, &mut notes).unwrap();

    let outcome = judge.release_hold(Lane::Up, 2900.0, &mut notes);
    assert!(matches!(outcome, Some(ReleaseOutcome::Clean(h)) if h.end == HoldEnd::Released));
    assert!(notes[0].hold_released());
    assert!(!notes[0].hold_dropped());
}

#[test]
fn test_auto_hit_is_perfect_and_runs_holds() {
    let mut notes = spawned(vec![
        Note::new(500.0, Lane::Left, 0.0, Side::Opponent),
        Note::new(700.0, Lane::Right, 300.0, Side::Opponent),
        tap(700.0, Lane::Right),
    ]);
    let mut judge = JudgeMachine::default();

    assert!(judge.auto_hit(Side::Opponent, 499.0, &mut notes).is_empty());
    let hits = judge.auto_hit(Side::Opponent, 500.0, &mut notes);
    assert_eq!(hits.len(), 1);
    assert_eq!((hits[0].rating, hits[0].delta), (Rating::Sick, 0.0));

    let hits = judge.auto_hit(Side::Opponent, 720.0, &mut notes);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].note_index, 1);
    assert!(hits[0].is_hold);
    assert_eq!(judge.active_hold(Side::Opponent, Lane::Right), Some(1));
    assert!(!notes[2].was_hit());

    let released = judge.release_all(Side::Opponent, &mut notes);
    assert_eq!(released.len(), 1);
    assert_eq!(judge.active_hold_count(), 0);
}

#[test]
fn test_auto_hit_reaches_notes_older_than_the_window() {
    let mut notes = spawned(vec![
        Note::new(100.0, Lane::Down, 0.0, Side::Opponent),
        tap(200.0, Lane::Left),
        Note::new(300.0, Lane::Up, 0.0, Side::Opponent),
        Note::new(5000.0, Lane::Up, 0.0, Side::Opponent),
    ]);
    let mut judge = JudgeMachine::default();

    let hits = judge.auto_hit(Side::Opponent, 1000.0, &mut notes);
    assert_eq!(hits.iter().map(|h| h.note_index).collect::<Vec<_>>(), vec![0, 2]);
    assert!(!notes[1].was_hit());
    assert!(judge.auto_hit(Side::Opponent, 1500.0, &mut notes).is_empty());

    let hits = judge.auto_hit(Side::Player, 1500.0, &mut notes);
    assert_eq!(hits.len(), 1);
    assert_eq!((hits[0].note_index, hits[0].delta), (1, 0.0));
    assert!(judge.check_misses(1500.0, &mut notes).is_empty());
}

#[test]
fn test_custom_window_changes_miss_cutoff() {
    let window = HitWindow::from_thresholds([20.0, 40.0, 60.0, 80.0]).unwrap();
    let mut notes = spawned(vec![tap(1000.0, Lane::Left)]);
    let mut judge = JudgeMachine::new(window);
    assert!(judge.judge_input(Lane::Left, 1090.0, &mut notes).is_none());
    assert_eq!(judge.check_misses(1081.0, &mut notes).len(), 1);
}

proptest! {
    #[test]
    fn hit_and_late_stay_exclusive(
        times in prop::collection::vec(0u32..5_000, 1..40),
        presses in prop::collection::vec((0u32..6_000, 0usize..4), 0..60),
    ) {
        let mut notes: Vec<Note> = times
            .iter()
            .enumerate()
            .map(|(i, &t)| Note::new(f64::from(t), Lane::ALL[i % 4], if i % 3 == 0 { 200.0 } else { 0.0 }, Side::Player))
            .collect();
        strumline_core::chart::sort_notes(&mut notes);
        let mut notes = spawned(notes);
        let mut judge = JudgeMachine::default();

        let mut presses = presses;
        presses.sort();
        let mut history: Vec<(bool, bool)> = vec![(false, false); notes.len()];
        for (t, lane) in presses {
            let pos = f64::from(t);
            judge.judge_input(Lane::ALL[lane], pos, &mut notes);
            judge.update_holds(pos, &mut notes);
            judge.release_hold(Lane::ALL[lane], pos + 50.0, &mut notes);
            judge.check_misses(pos, &mut notes);
            for (i, note) in notes.iter().enumerate() {
                prop_assert!(!(note.was_hit() && note.too_late()));
                let (hit, late) = history[i];
                prop_assert!(!hit || note.was_hit());
                prop_assert!(!late || note.too_late());
                history[i] = (note.was_hit(), note.too_late());
            }
        }
    }
}
