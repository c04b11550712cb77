// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., C_K7NP3X for caption sessions)
//!
//! Benefits:
//! - No ambiguous characters (excludes I, L, O, U)
//! - Case-insensitive
//! - ~1 billion combinations per entity type (32^6)
//! - Easy to read, type, and communicate verbally
//!
//! User and profile IDs are UUIDs (they mirror the auth provider's primary
//! keys) and are generated with the uuid crate, not here.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Caption session (C_)
    CaptionSession,
    /// Caption segment (S_)
    CaptionSegment,
    /// WebSocket connection (N_)
    Connection,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::CaptionSession => "C",
            EntityPrefix::CaptionSegment => "S",
            EntityPrefix::Connection => "N",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Returns
/// A string in format "PREFIX_XXXXXX" (e.g., "C_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

/// Generate a raw Crockford Base32 string without prefix
/// Useful for filenames or other non-entity identifiers
#[allow(dead_code)]
pub fn generate_raw_id(length: usize) -> String {
    generate_crockford_string(length)
}

// ============================================================================
// Convenience functions for each entity type
// ============================================================================

/// Generate a caption session ID (C_XXXXXX)
pub fn generate_session_id() -> String {
    generate_id(EntityPrefix::CaptionSession)
}

/// Generate a caption segment ID (S_XXXXXX)
pub fn generate_segment_id() -> String {
    generate_id(EntityPrefix::CaptionSegment)
}

/// Generate a connection ID (N_XXXXXX)
pub fn generate_connection_id() -> String {
    generate_id(EntityPrefix::Connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let session_id = generate_session_id();
        assert!(session_id.starts_with("C_"));
        assert_eq!(session_id.len(), 8); // "C_" + 6 chars

        let segment_id = generate_segment_id();
        assert!(segment_id.starts_with("S_"));
        assert_eq!(segment_id.len(), 8);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_session_id();
        let random_part = &id[2..]; // Skip "C_"

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }

        // Verify no ambiguous characters
        assert!(!random_part.contains('I'));
        assert!(!random_part.contains('L'));
        assert!(!random_part.contains('O'));
        assert!(!random_part.contains('U'));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_session_id();
            assert!(ids.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_all_prefixes() {
        assert!(generate_session_id().starts_with("C_"));
        assert!(generate_segment_id().starts_with("S_"));
        assert!(generate_connection_id().starts_with("N_"));
    }

    #[test]
    fn test_raw_id() {
        let raw = generate_raw_id(8);
        assert_eq!(raw.len(), 8);
        assert!(!raw.contains('_')); // No prefix separator
    }
}
