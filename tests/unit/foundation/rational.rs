use super::*;

fn r(n: i64, d: i64) -> Rational {
    Rational::new(n, d)
}

#[test]
fn construction_normalizes() {
    assert_eq!(r(2, 4), r(1, 2));
    assert_eq!(r(-2, -4), r(1, 2));
    assert_eq!(r(2, -4), r(-1, 2));
    assert_eq!(r(0, 7), Rational::ZERO);
    assert_eq!(r(5, 0), Rational::ZERO);
}

#[test]
fn normalized_values_hash_equal() {
    use std::collections::HashSet;
    let mut set = HashSet::new();
    set.insert(r(1, 2));
    assert!(set.contains(&r(3, 6)));
}

#[test]
fn ordering_is_exact_across_denominators() {
    assert!(r(1, 3) < r(1, 2));
    assert!(r(1001, 30000) > r(1, 30));
    assert!(r(-1, 2) < Rational::ZERO);
    assert!(r(1, 1) < Rational::MAX);
}

#[test]
fn arithmetic_stays_reduced() {
    assert_eq!(r(1, 6) + r(1, 3), r(1, 2));
    assert_eq!(r(1, 2) - r(1, 2), Rational::ZERO);
    assert_eq!(r(2, 3) * r(3, 4), r(1, 2));
    assert_eq!(-r(1, 2), r(-1, 2));
}

#[test]
fn ntsc_timebase_stays_exact_far_down_the_timeline() {
    // One hour of 30000/1001 fps frames, accumulated one at a time in
    // chunks, still lands exactly on a frame boundary.
    let tb = r(1001, 30000);
    let mut t = Rational::ZERO;
    for _ in 0..3600 {
        t = t + tb * Rational::from(30);
    }
    assert_eq!(t, tb * Rational::from(108_000));
    assert_eq!(t.snapped_to_timebase(tb), t);
}

#[test]
fn snap_floors_to_frame_start() {
    let tb = r(1, 30);
    assert_eq!(r(1, 29).snapped_to_timebase(tb), r(1, 30));
    assert_eq!(r(1, 30).snapped_to_timebase(tb), r(1, 30));
    assert_eq!(r(59, 60).snapped_to_timebase(tb), r(29, 30));
    assert_eq!(Rational::ZERO.snapped_to_timebase(tb), Rational::ZERO);
}

#[test]
fn snap_floors_negative_times_downward() {
    let tb = r(1, 30);
    assert_eq!(r(-1, 60).snapped_to_timebase(tb), r(-1, 30));
}

#[test]
fn snap_with_invalid_timebase_is_identity() {
    assert_eq!(r(7, 13).snapped_to_timebase(Rational::ZERO), r(7, 13));
}

#[test]
fn max_saturates_instead_of_wrapping() {
    assert_eq!(Rational::MAX + Rational::from(1), Rational::MAX);
    assert!(Rational::MAX > r(i64::MAX - 1, 1));
}

#[test]
fn display_shows_reduced_form() {
    assert_eq!(r(2, 4).to_string(), "1/2");
    assert_eq!(Rational::ZERO.to_string(), "0/1");
}
