use crate::*;
use std::cmp::Ordering;

// -------------------- compare_versions --------------------

#[test]
fn digits_compare_one_character_at_a_time() {
    // Legacy behavior: "9" beats "10" because '9' > '1'.
    assert_eq!(compare_versions("9", "10"), Ordering::Greater);
    assert_eq!(compare_versions("10", "9"), Ordering::Less);
    assert_eq!(compare_versions("4.10.0", "4.9.0"), Ordering::Less);
}

#[test]
fn longer_label_wins_when_prefix_matches() {
    assert_eq!(compare_versions("4.6", "4.6.1"), Ordering::Less);
    assert_eq!(compare_versions("4.6.1f1", "4.6.1"), Ordering::Greater);
}

#[test]
fn letters_compare_by_byte_value() {
    assert_eq!(compare_versions("5.0.0p1", "5.0.0f1"), Ordering::Greater);
    assert_eq!(compare_versions("5.0.0b9", "5.0.0f1"), Ordering::Less);
}

#[test]
fn first_deciding_position_wins() {
    assert_eq!(compare_versions("4.7.0f1", "4.6.9p9"), Ordering::Greater);
    assert_eq!(compare_versions("3.9.9", "4.0.0"), Ordering::Less);
}

#[test]
fn punctuation_differences_do_not_decide() {
    assert_eq!(compare_versions("4.6", "4-6"), Ordering::Equal);
    assert_eq!(compare_versions("4.6", "4-7"), Ordering::Less);
}

#[test]
fn identical_labels_are_equal() {
    assert_eq!(compare_versions("4.6.1f1", "4.6.1f1"), Ordering::Equal);
    assert_eq!(compare_versions("", ""), Ordering::Equal);
}

// -------------------- newest_label --------------------

#[test]
fn newest_of_nine_and_ten_is_nine() {
    assert_eq!(newest_label(["9", "10"]), Some("9"));
    assert_eq!(newest_label(["10", "9"]), Some("9"));
}

#[test]
fn newest_picks_maximum_label() {
    let labels = ["4.5.0f6", "4.6.1f1", "4.6.0b20", "3.5.7"];
    assert_eq!(newest_label(labels), Some("4.6.1f1"));
}

#[test]
fn newest_of_nothing_is_none() {
    assert_eq!(newest_label(std::iter::empty::<&str>()), None);
}

#[test]
fn ties_keep_the_first_label() {
    let labels = ["4.6", "4-6"];
    assert_eq!(newest_label(labels), Some("4.6"));
}
