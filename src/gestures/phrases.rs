// src/gestures/phrases.rs
//! Static mapping from committed code sequences to phrases

/// Returned for an empty detected-gesture sequence
pub const UNKNOWN_GESTURE: &str = "Unknown gesture";

/// Known sequences and the phrases they translate to.
/// Single-code entries are the common standalone signs; multi-code entries
/// cover the short combinations the translator page teaches.
const PHRASE_TABLE: &[(&[&str], &str)] = &[
    (&["A"], "Yes"),
    (&["B"], "Hello"),
    (&["L"], "Good"),
    (&["O"], "OK"),
    (&["V"], "Peace"),
    (&["W"], "Water"),
    (&["Y"], "I love you"),
    (&["A", "B"], "Yes, hello"),
    (&["B", "L"], "Hello, good to see you"),
    (&["B", "Y"], "Hello, I love you"),
    (&["L", "A"], "Good, yes"),
    (&["O", "L"], "All good"),
    (&["V", "B"], "Peace, hello"),
    (&["W", "O"], "Water, please"),
];

/// Translate a committed code sequence
///
/// Exact table matches win; anything else non-empty is spelled out so the
/// user still sees what was recognized.
pub fn phrase_for_sequence(codes: &[String]) -> String {
    if codes.is_empty() {
        return UNKNOWN_GESTURE.to_string();
    }

    for (sequence, phrase) in PHRASE_TABLE {
        if sequence.len() == codes.len()
            && sequence.iter().zip(codes.iter()).all(|(a, b)| a == b)
        {
            return (*phrase).to_string();
        }
    }

    codes.concat()
}
