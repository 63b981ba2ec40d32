use approx::assert_relative_eq;
use strumline_core::chart::{Lane, Note, Side};
use strumline_core::gameplay::scheduler::{NoteScheduler, ScrollConfig, StrumLayout};
use strumline_core::presentation::{HeadlessFactory, VisualKind, VisualState};

fn scheduler(multiplier: f64, bpm: f64, speed: f64) -> NoteScheduler {
    let config = ScrollConfig {
        scroll_multiplier: multiplier,
        ..ScrollConfig::default()
    };
    NoteScheduler::new(config, StrumLayout::default(), bpm, speed)
}

#[test]
fn test_scroll_offset() {
    let scheduler = scheduler(0.3, 100.0, 1.0);
    assert_relative_eq!(scheduler.offset_for(500.0, 0.0), 150.0);
}

#[test]
fn test_bpm_and_speed_changes_apply_immediately() {
    let mut scheduler = scheduler(0.3, 100.0, 1.0);
    scheduler.set_bpm(200.0);
    assert_relative_eq!(scheduler.offset_for(500.0, 0.0), 300.0);
    scheduler.set_speed(2.0);
    assert_relative_eq!(scheduler.offset_for(500.0, 0.0), 600.0);
    assert_relative_eq!(scheduler.spawn_lead_ms(), 1000.0);

    scheduler.set_speed(0.0);
    assert_relative_eq!(scheduler.spawn_lead_ms(), 1000.0);
}

#[test]
fn test_spawn_window() {
    let mut scheduler = scheduler(0.45, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![
        Note::new(0.0, Lane::Left, 0.0, Side::Player),
        Note::new(1_900.0, Lane::Down, 0.0, Side::Opponent),
        Note::new(2_000.0, Lane::Up, 0.0, Side::Player),
        Note::new(2_100.0, Lane::Right, 0.0, Side::Player),
    ];

    let spawned = scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory);
    assert_eq!(spawned, vec![0, 1, 2]);
    assert!(!notes[3].spawned());
    assert_eq!(factory.live_count(), 3);

    // Already spawned notes are not spawned twice.
    let spawned = scheduler.spawn_notes_in_range(100.0, &mut notes, &mut factory);
    assert_eq!(spawned, vec![3]);
    assert_eq!(factory.created_count(), 4);
}

#[test]
fn test_notes_far_behind_are_never_spawned() {
    let mut scheduler = scheduler(0.45, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![Note::new(0.0, Lane::Left, 0.0, Side::Player)];
    assert!(scheduler
        .spawn_notes_in_range(1_600.0, &mut notes, &mut factory)
        .is_empty());
    assert!(!notes[0].spawned());
}

#[test]
fn test_positions_follow_song_time() {
    let mut scheduler = scheduler(0.3, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![Note::new(500.0, Lane::Up, 0.0, Side::Player)];
    scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory);

    let head = scheduler.head_handle(0).unwrap();
    let target = StrumLayout::default().target(Side::Player, Lane::Up);
    assert_relative_eq!(factory.get(head).unwrap().position.y, target.y + 150.0);

    scheduler.update_note_positions(400.0, &notes, &mut factory);
    assert_relative_eq!(factory.get(head).unwrap().position.y, target.y + 30.0, epsilon = 1e-4);
    assert_relative_eq!(factory.get(head).unwrap().position.x, target.x);
}

#[test]
fn test_hold_segments_are_eaten_in_order_while_held() {
    // 1000ms sustain at 0.32px/ms is 320px: ten 32px pieces.
    let mut scheduler = scheduler(0.32, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![Note::new(1_000.0, Lane::Down, 1_000.0, Side::Player)];
    scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory);

    let segments = scheduler.segment_handles(0);
    assert_eq!(segments.len(), 10);
    let last = factory.get(segments[9]).unwrap();
    assert!(matches!(last.kind, VisualKind::HoldEnd { lane: Lane::Down, side: Side::Player }));

    // Not held: nothing is eaten.
    assert_eq!(scheduler.update_active_holds(1_500.0, &mut notes, &mut factory), 0);

    notes[0].mark_hit();
    notes[0].begin_hold();
    scheduler.hide_head(0, &mut factory);
    assert_eq!(scheduler.head_handle(0), None);

    // Pieces start every 100ms; at 1250ms the tops of pieces 0, 1 and 2 have crossed.
    assert_eq!(scheduler.update_active_holds(1_250.0, &mut notes, &mut factory), 3);
    assert_eq!(notes[0].hold_segments_destroyed(), 3);
    assert!(factory.get(segments[2]).is_none());
    assert!(factory.get(segments[3]).is_some());

    assert_eq!(scheduler.update_active_holds(2_000.0, &mut notes, &mut factory), 7);
    assert!(scheduler.segment_handles(0).is_empty());
}

#[test]
fn test_short_hold_gets_one_piece() {
    let mut scheduler = scheduler(0.45, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![Note::new(100.0, Lane::Left, 10.0, Side::Opponent)];
    scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory);
    assert_eq!(scheduler.segment_handles(0).len(), 1);
}

#[test]
fn test_huge_sustain_is_capped() {
    let mut scheduler = scheduler(0.45, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![Note::new(100.0, Lane::Left, 1e12, Side::Player)];
    scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory);

    let max = ScrollConfig::default().max_hold_segments as usize;
    assert_eq!(scheduler.segment_handles(0).len(), max);
    assert_eq!(factory.created_count(), max as u64 + 1);
}

#[test]
fn test_dim_release_purge_and_teardown() {
    let mut scheduler = scheduler(0.45, 100.0, 1.0);
    let mut factory = HeadlessFactory::new();
    let mut notes = vec![
        Note::new(100.0, Lane::Left, 0.0, Side::Player),
        Note::new(200.0, Lane::Down, 300.0, Side::Player),
        Note::new(1_000.0, Lane::Up, 0.0, Side::Player),
    ];
    scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory);
    // 300ms at 0.45px/ms is 135px: five pieces.
    assert_eq!(factory.live_count(), 1 + 1 + 5 + 1);

    let head = scheduler.head_handle(0).unwrap();
    scheduler.dim(0, &mut factory);
    assert_eq!(factory.get(head).unwrap().state, VisualState::MISSED);

    assert!(scheduler.release(1, &mut factory));
    assert!(!scheduler.release(1, &mut factory));
    assert_eq!(factory.live_count(), 2);

    notes[0].mark_too_late();
    assert_eq!(scheduler.purge_passed(1_600.0, &notes, &mut factory), 0);
    assert_eq!(scheduler.purge_passed(1_601.0, &notes, &mut factory), 1);
    assert_eq!(scheduler.active_count(), 1);

    assert_eq!(scheduler.teardown(&mut factory), 1);
    assert_eq!(scheduler.teardown(&mut factory), 0);
    assert_eq!(factory.live_count(), 0);
    assert!(scheduler.spawn_notes_in_range(0.0, &mut notes, &mut factory).is_empty());
}
