//! Substitution distance and positional slicing.
//!
//! These are the two pure functions behind the barcode safety invariant:
//! no two live barcodes may be closer than the configured minimum
//! substitution distance. [`substitution_distance`] is the exact check;
//! [`slices`] feeds the inverted index that lets the store avoid running
//! the exact check against the whole population.

use crate::{BarcodeError, BarcodeResult, SLICE_WIDTH};

/// Counts the positions at which `a` and `b` differ (Hamming distance
/// restricted to substitutions).
///
/// Comparison is case-sensitive; operational callers almost always want
/// [`substitution_distance_ci`] instead.
///
/// # Errors
///
/// Returns [`BarcodeError::LengthMismatch`] if the inputs have different
/// lengths. Unequal lengths indicate a logic error upstream (barcodes are
/// fixed-width), so this fails loudly rather than returning a sentinel.
pub fn substitution_distance(a: &str, b: &str) -> BarcodeResult<usize> {
    let left = a.chars().count();
    let right = b.chars().count();
    if left != right {
        return Err(BarcodeError::LengthMismatch { left, right });
    }

    Ok(a.chars().zip(b.chars()).filter(|(x, y)| x != y).count())
}

/// Case-insensitive [`substitution_distance`]: both operands are
/// lowercased before comparing.
///
/// This is the operational variant. Barcode matching must tolerate case
/// drift from input devices, so every distance decision in the safety gate
/// goes through a case-folded comparison.
///
/// # Errors
///
/// Returns [`BarcodeError::LengthMismatch`] if the inputs have different
/// lengths.
pub fn substitution_distance_ci(a: &str, b: &str) -> BarcodeResult<usize> {
    substitution_distance(&a.to_lowercase(), &b.to_lowercase())
}

/// Case-insensitive substitution distance that stops scanning once the
/// running count exceeds `threshold`.
///
/// The returned value is exact while it is `<= threshold`; any value
/// `> threshold` only means "exceeds the threshold" and must not be used
/// as a distance. Callers that only need a threshold check (the safety
/// gate) must use this variant: once the answer is determined there is no
/// point finishing the scan.
///
/// # Errors
///
/// Returns [`BarcodeError::LengthMismatch`] if the inputs have different
/// lengths.
pub fn bounded_distance(a: &str, b: &str, threshold: usize) -> BarcodeResult<usize> {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let left = a.chars().count();
    let right = b.chars().count();
    if left != right {
        return Err(BarcodeError::LengthMismatch { left, right });
    }

    let mut count = 0;
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            count += 1;
            if count > threshold {
                break;
            }
        }
    }

    Ok(count)
}

/// Decomposes a barcode into its overlapping positional slices.
///
/// A barcode of length `L` yields `L - SLICE_WIDTH + 1` slices; slice `i`
/// (1-based) is `"{i}:{window}"` where the window is the
/// [`SLICE_WIDTH`]-character substring starting at position `i`. Input is
/// case-folded so slices of case variants coincide.
///
/// Returns `None` for input shorter than the slice width (including the
/// empty string): such a barcode *has no* slices, which is distinct from
/// having an empty slice set and is indexed separately by the store.
///
/// Two barcodes closer than minimum distance 3 must agree on at least one
/// aligned window of width 2 (pigeonhole over 8 positions), so a slice-set
/// intersection is a sound pre-filter: disjoint slice sets guarantee the
/// exact distance is at least the minimum.
pub fn slices(barcode: &str) -> Option<Vec<String>> {
    let folded = barcode.to_lowercase();
    let chars: Vec<char> = folded.chars().collect();
    if chars.len() < SLICE_WIDTH {
        return None;
    }

    Some(
        (0..=chars.len() - SLICE_WIDTH)
            .map(|i| {
                let window: String = chars[i..i + SLICE_WIDTH].iter().collect();
                format!("{}:{}", i + 1, window)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_slice(a: &str, b: &str) -> bool {
        let sa = slices(a).unwrap();
        let sb = slices(b).unwrap();
        sa.iter().any(|s| sb.contains(s))
    }

    #[test]
    fn test_distance_zero_for_equal() {
        assert_eq!(substitution_distance("44665544", "44665544").unwrap(), 0);
        assert_eq!(substitution_distance("", "").unwrap(), 0);
    }

    #[test]
    fn test_distance_counts_mismatches() {
        assert_eq!(substitution_distance("00000000", "00000012").unwrap(), 2);
        assert_eq!(substitution_distance("00000000", "00000123").unwrap(), 3);
        assert_eq!(substitution_distance("abcdefgh", "hgfedcba").unwrap(), 8);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            ("00000000", "00000012"),
            ("abcd1234", "abcd1243"),
            ("44665544", "44665544"),
        ];
        for (a, b) in pairs {
            assert_eq!(
                substitution_distance(a, b).unwrap(),
                substitution_distance(b, a).unwrap()
            );
        }
    }

    #[test]
    fn test_distance_rejects_unequal_lengths() {
        match substitution_distance("1234567", "12345678") {
            Err(BarcodeError::LengthMismatch { left: 7, right: 8 }) => {}
            other => panic!("expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_distance_ci_folds_case() {
        assert_eq!(substitution_distance_ci("ABCD1234", "abcd1234").unwrap(), 0);
        assert_eq!(substitution_distance("ABCD1234", "abcd1234").unwrap(), 4);
    }

    #[test]
    fn test_bounded_distance_exact_when_under_threshold() {
        // <= threshold means the value is the exact distance
        assert_eq!(bounded_distance("00000012", "00000000", 3).unwrap(), 2);
        assert_eq!(bounded_distance("00000123", "00000000", 3).unwrap(), 3);
    }

    #[test]
    fn test_bounded_distance_short_circuits() {
        // Exact distance is 8, but scanning stops at threshold + 1.
        assert_eq!(bounded_distance("abcdefgh", "hgfedcba", 2).unwrap(), 3);
    }

    #[test]
    fn test_bounded_distance_soundness() {
        // When the bounded result exceeds the threshold, so does the exact
        // distance; when it doesn't, the two agree.
        let pairs = [
            ("00000000", "00000000"),
            ("00000000", "00000012"),
            ("00000000", "00000123"),
            ("00000000", "00123456"),
            ("abcdefgh", "hgfedcba"),
        ];
        for threshold in 0..4 {
            for (a, b) in pairs {
                let bounded = bounded_distance(a, b, threshold).unwrap();
                let exact = substitution_distance(a, b).unwrap();
                if bounded <= threshold {
                    assert_eq!(bounded, exact, "{a} vs {b} @ {threshold}");
                } else {
                    assert!(exact > threshold, "{a} vs {b} @ {threshold}");
                }
            }
        }
    }

    #[test]
    fn test_bounded_distance_rejects_unequal_lengths() {
        assert!(matches!(
            bounded_distance("123", "12", 1),
            Err(BarcodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_slices_of_eight_character_barcode() {
        let got = slices("44665544").unwrap();
        assert_eq!(
            got,
            vec!["1:44", "2:46", "3:66", "4:65", "5:55", "6:54", "7:44"]
        );
    }

    #[test]
    fn test_slices_fold_case() {
        assert_eq!(slices("ABCD1234"), slices("abcd1234"));
    }

    #[test]
    fn test_slices_absent_for_short_input() {
        assert_eq!(slices(""), None);
        assert_eq!(slices("a"), None);
        assert_eq!(slices("ab"), Some(vec!["1:ab".to_string()]));
    }

    #[test]
    fn test_close_barcodes_share_a_slice() {
        // distance 2 < minimum distance 3: the pre-filter must keep this pair
        assert_eq!(substitution_distance("00000000", "00000012").unwrap(), 2);
        assert!(shared_slice("00000000", "00000012"));
    }

    #[test]
    fn test_pigeonhole_holds_for_all_three_substitution_variants() {
        // Three substitutions destroy at most six of the seven aligned
        // windows, so every distance-3 pair still shares a slice. This is
        // the tight case: the bound in MAX_MINIMUM_DISTANCE says four
        // substitutions can destroy all seven.
        let base = "abcdefgh";
        for i in 0..8 {
            for j in (i + 1)..8 {
                for k in (j + 1)..8 {
                    let mut chars: Vec<char> = base.chars().collect();
                    chars[i] = 'z';
                    chars[j] = 'z';
                    chars[k] = 'z';
                    let variant: String = chars.iter().collect();
                    assert!(
                        shared_slice(base, &variant),
                        "no shared slice for {variant}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_four_spread_substitutions_can_evade_the_prefilter() {
        // Mutating every other position leaves no aligned window intact:
        // the pre-filter is blind to this pair, which is why minimum
        // distances above MAX_MINIMUM_DISTANCE are rejected upstream.
        assert_eq!(substitution_distance("abcdefgh", "azczezgz").unwrap(), 4);
        assert!(!shared_slice("abcdefgh", "azczezgz"));
    }

    #[test]
    fn test_pigeonhole_holds_for_all_two_substitution_variants() {
        // Mutating any two positions of an 8-character barcode always leaves
        // an aligned window of width 2 intact.
        let base = "abcdefgh";
        for i in 0..8 {
            for j in (i + 1)..8 {
                let mut chars: Vec<char> = base.chars().collect();
                chars[i] = 'z';
                chars[j] = 'z';
                let variant: String = chars.iter().collect();
                assert!(
                    shared_slice(base, &variant),
                    "no shared slice for {variant}"
                );
            }
        }
    }
}
