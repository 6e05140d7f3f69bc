//! Fuzz-style property tests for the chunk section codec
//!
//! The section payload of a chunk frame is length-delimited binary data that
//! crosses a trust boundary in proxy deployments, so the decoder must reject
//! malformed input with an error instead of panicking or over-allocating.
//!
//! Critical properties:
//! - Decoder never panics on arbitrary input
//! - Valid sections always roundtrip through encode/decode
//! - Re-encoding a decoded payload reproduces it byte for byte
//! - State mapping touches only sections that actually change

use proptest::prelude::*;
use veilcraft_core::BlockStateId;
use veilcraft_net::section::SECTION_CELLS;
use veilcraft_net::{decode_sections, encode_sections, ChunkSection};

/// Deterministic pseudo-random state array with a bounded palette.
fn states_from_seed(seed: u64, palette_size: u32) -> Vec<BlockStateId> {
    (0..SECTION_CELLS)
        .map(|i| {
            let mixed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add((i as u64).wrapping_mul(1442695040888963407));
            BlockStateId((mixed >> 33) as u32 % palette_size)
        })
        .collect()
}

proptest! {
    /// Property: Arbitrary bytes don't crash the decoder
    ///
    /// For any random byte sequence and section count, decode_sections
    /// either returns sections or an error. It must never panic.
    #[test]
    fn arbitrary_bytes_dont_crash(
        random_bytes in prop::collection::vec(any::<u8>(), 0..4096),
        count in 0usize..32,
    ) {
        let _ = decode_sections(&random_bytes, count);
    }

    /// Property: Truncating a valid payload never crashes the decoder
    ///
    /// Truncation is the common corruption mode for length-delimited
    /// framing; every prefix must decode cleanly or error cleanly.
    #[test]
    fn truncated_payloads_dont_crash(
        seed in any::<u64>(),
        palette_size in 1u32..512,
        keep in 0usize..256,
    ) {
        let section = ChunkSection::from_states(&states_from_seed(seed, palette_size), 100);
        let encoded = encode_sections(&[section]);
        let truncated = &encoded[..keep.min(encoded.len())];
        let _ = decode_sections(truncated, 1);
    }

    /// Property: Valid sections always roundtrip
    ///
    /// Encoding then decoding any section built from states must yield the
    /// same per-cell states and non-empty count.
    #[test]
    fn sections_roundtrip(
        seed in any::<u64>(),
        palette_size in 1u32..512,
        non_empty in 0u16..4096,
    ) {
        let states = states_from_seed(seed, palette_size);
        let section = ChunkSection::from_states(&states, non_empty);
        let encoded = encode_sections(&[section]);
        let decoded = decode_sections(&encoded, 1).expect("self-produced payload decodes");
        prop_assert_eq!(decoded.len(), 1);
        prop_assert_eq!(decoded[0].non_empty_count, non_empty);
        for (i, state) in states.iter().enumerate() {
            prop_assert_eq!(decoded[0].state_at(i), *state);
        }
    }

    /// Property: Re-encoding a decoded payload is byte-stable
    ///
    /// An untouched chunk must reach the client with its original bytes, so
    /// decode followed by encode has to be the identity on valid payloads.
    #[test]
    fn reencode_is_byte_stable(
        seed in any::<u64>(),
        palette_size in 1u32..512,
    ) {
        let section = ChunkSection::from_states(&states_from_seed(seed, palette_size), 64);
        let encoded = encode_sections(&[section]);
        let decoded = decode_sections(&encoded, 1).expect("self-produced payload decodes");
        prop_assert_eq!(encode_sections(&decoded), encoded);
    }

    /// Property: An identity mapping reports no change
    ///
    /// map_states must only report `true` when some cell actually changed,
    /// because that flag decides whether the payload is re-encoded.
    #[test]
    fn identity_mapping_reports_unchanged(
        seed in any::<u64>(),
        palette_size in 1u32..512,
    ) {
        let mut section = ChunkSection::from_states(&states_from_seed(seed, palette_size), 64);
        prop_assert!(!section.map_states(|_| None));
    }

    /// Property: Mapping a palette value remaps every matching cell
    #[test]
    fn mapping_rewrites_all_matching_cells(
        seed in any::<u64>(),
        palette_size in 2u32..512,
    ) {
        let states = states_from_seed(seed, palette_size);
        let mut section = ChunkSection::from_states(&states, 64);
        let target = BlockStateId(0);
        let replacement = BlockStateId(palette_size);

        let changed = section.map_states(|s| (s == target).then_some(replacement));
        prop_assert_eq!(changed, states.contains(&target));
        for (i, state) in states.iter().enumerate() {
            let expected = if *state == target { replacement } else { *state };
            prop_assert_eq!(section.state_at(i), expected);
        }
    }
}
