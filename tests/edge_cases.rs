//! Edge case and boundary condition tests for actions, queues and keys

use std::thread;

use wac_robot::actions::{motion_components, shutdown_sequence, GRID_CELLS, MAX_MOTION};
use wac_robot::{Action, ActionKind, CommandQueue, Key, Pattern};

// ============================================================================
// Clamping Properties
// ============================================================================

#[test]
fn color_render_matches_clamped_value() {
    for v in [-1_000, -256, -1, 0, 1, 127, 254, 255, 256, 10_000, i32::MIN, i32::MAX] {
        let clamped = v.clamp(0, 255);
        assert_eq!(
            Action::set_color(v, v, v).render(),
            Action::set_color(clamped, clamped, clamped).render(),
            "value {v}"
        );
    }
}

#[test]
fn motion_forward_minus_reverse_is_clamped_value() {
    for v in -250..=250 {
        let (forward, reverse) = motion_components(v);
        assert!(forward == 0 || reverse == 0, "both nonzero for {v}");
        assert_eq!(
            i32::from(forward) - i32::from(reverse),
            v.clamp(-MAX_MOTION, MAX_MOTION)
        );
    }
}

#[test]
fn motion_extremes() {
    assert_eq!(Action::set_motion(i32::MIN, i32::MAX).render(), vec![0, 100, 100, 0]);
    assert_eq!(Action::set_motion(0, 0).render(), vec![0, 0, 0, 0]);
}

#[test]
fn tone_boundaries() {
    assert_eq!(Action::tone(0).render(), vec![0, 0]);
    assert_eq!(Action::tone(65_535).render(), vec![0xFF, 0xFF]);
    assert_eq!(Action::tone(u32::MAX).render(), vec![0xFF, 0xFF]);
    assert_eq!(Action::tone_off(), Action::tone(0));
}

#[test]
fn empty_text_is_just_the_tag() {
    assert_eq!(Action::display_text("").render(), vec![0x01]);
}

#[test]
fn pattern_payload_is_always_full_grid() {
    for lit in [0, 1, 24, 25, 26, 1_000] {
        let payload = Action::display_pattern(Pattern::progress(lit)).render();
        assert_eq!(payload.len(), GRID_CELLS + 1);
        assert_eq!(payload[0], 0x02);
        assert_eq!(
            payload[1..].iter().filter(|&&c| c == 1).count(),
            lit.min(GRID_CELLS)
        );
    }
}

#[test]
fn wait_has_no_target() {
    let wait = Action::wait(0);
    assert_eq!(wait.kind(), ActionKind::Wait);
    assert!(wait.target().is_none());
}

// ============================================================================
// Queue Boundaries
// ============================================================================

#[test]
fn capacity_one_queue() {
    let queue = CommandQueue::with_capacity("tiny", 1);
    queue.set_color(1, 1, 1, 100);

    // The trailing wait did not fit.
    assert_eq!(queue.pending(), vec![Action::set_color(1, 1, 1)]);
    assert_eq!(queue.dropped(), 1);
}

#[test]
fn append_exactly_capacity_then_one_more() {
    let queue = CommandQueue::with_capacity("q", 10);
    for i in 0..10 {
        assert!(queue.push(Action::set_color(i, 0, 0)));
    }
    assert!(!queue.push(Action::set_color(99, 0, 0)));
    assert_eq!(queue.len(), 10);

    let drained: Vec<_> = std::iter::from_fn(|| queue.pop().ok().flatten()).collect();
    let expected: Vec<_> = (0..10).map(|i| Action::set_color(i, 0, 0)).collect();
    assert_eq!(drained, expected);
}

#[test]
fn restore_twice_is_idempotent() {
    let queue = CommandQueue::new("q");
    queue.display_text("hello", 100).save();
    queue.clear(true);

    queue.restore();
    let once = queue.pending();
    queue.restore();
    assert_eq!(queue.pending(), once);
    assert_eq!(once, vec![Action::display_text("hello"), Action::wait(100)]);
}

#[test]
fn save_empty_then_restore_empties() {
    let queue = CommandQueue::new("q");
    queue.save();
    queue.stop(0);
    queue.restore();
    assert!(queue.is_empty());
}

#[test]
fn clear_immediate_with_concurrent_producers() {
    let queue = CommandQueue::new("main");
    let producers: Vec<_> = (0..4)
        .map(|n| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let _ = queue.push(Action::set_color(n, i, 0));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    queue.clear(true);
    assert_eq!(queue.pending(), shutdown_sequence().to_vec());
}

// ============================================================================
// Key Set
// ============================================================================

#[test]
fn every_letter_and_digit_is_bindable() {
    for c in ('a'..='z').chain('0'..='9') {
        let key = Key::parse(&c.to_string()).unwrap();
        assert_eq!(key.to_string(), c.to_string());
    }
}

#[test]
fn key_names_are_case_insensitive() {
    assert_eq!(Key::parse("UP").unwrap(), Key::parse("up").unwrap());
    assert_eq!(Key::parse("Button_A").unwrap(), Key::BUTTON_A);
}

#[test]
fn punctuation_and_function_keys_rejected() {
    for name in [" ", "-", "f12", "esc", "tab", "ü", "aa"] {
        assert!(Key::parse(name).is_err(), "{name:?} should be rejected");
    }
}

#[test]
fn keys_round_trip_through_display() {
    for key in [Key::UP, Key::DOWN, Key::LEFT, Key::RIGHT, Key::BUTTON_A, Key::BUTTON_B] {
        assert_eq!(Key::parse(&key.to_string()).unwrap(), key);
    }
}
