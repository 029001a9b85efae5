//! Property-based tests for the wire codecs.

use proptest::prelude::*;

use driftsync_core::metadata::chunk_count;
use driftsync_core::{CHUNK_SIZE, ControlReply, Metadata, Packet};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn packet_roundtrip(
        identifier in "[A-Za-z0-9_-]{1,16}",
        position in 0u64..1_000_000,
        payload in proptest::collection::vec(any::<u8>(), 0..8192),
    ) {
        let packet = Packet::new(identifier, position, payload).unwrap();
        let frame = packet.encode().unwrap();

        let len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
        prop_assert_eq!(frame.len(), 4 + len);

        let decoded = Packet::decode(&frame[4..]).unwrap();
        prop_assert_eq!(&decoded, &packet);
    }

    #[test]
    fn metadata_roundtrip(
        name in "[A-Za-z0-9._-]{1,64}",
        size in 0u64..(1u64 << 50),
    ) {
        let metadata = Metadata::new(name, size).unwrap();
        let decoded = Metadata::decode(&metadata.encode().unwrap()).unwrap();
        prop_assert_eq!(&decoded, &metadata);
    }

    #[test]
    fn chunk_count_matches_ceiling_division(size in 0u64..(1u64 << 50)) {
        let expected = if size == 0 { 0 } else { (size - 1) / CHUNK_SIZE + 1 };
        prop_assert_eq!(chunk_count(size), expected);
    }

    #[test]
    fn chunk_lens_sum_to_size(size in 1u64..(1u64 << 32)) {
        let metadata = Metadata::new("f.bin", size).unwrap();
        let total: u64 = (0..metadata.total_chunks)
            .map(|p| metadata.chunk_len(p))
            .sum();
        prop_assert_eq!(total, size);

        // Every chunk but the last is full-sized.
        for p in 0..metadata.total_chunks.saturating_sub(1) {
            prop_assert_eq!(metadata.chunk_len(p), CHUNK_SIZE);
        }
    }

    #[test]
    fn missing_packets_reply_roundtrip(
        positions in proptest::collection::btree_set(0u64..100_000, 0..64),
    ) {
        let reply = ControlReply::MissingPackets(positions.into_iter().collect());
        let decoded = ControlReply::decode(&reply.encode()).unwrap();
        prop_assert_eq!(&decoded, &reply);
    }
}
