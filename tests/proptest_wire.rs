//! Property tests for the wire parser: arbitrary bytes must never panic
//! and malformed packets must always be rejected.

use proptest::prelude::*;

use dhcpv4_client::wire::{MAGIC_COOKIE, Message, OPT_END, OPTIONS_OFFSET, OptionsIter};

proptest! {
    #[test]
    fn parse_never_panics_on_arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        if let Ok((_, region)) = Message::parse(&data) {
            // Walking the option stream must be panic-free too.
            let mut iter = OptionsIter::new(region);
            for item in iter.by_ref() {
                let _ = item;
            }
            let _ = iter.terminated();
        }
    }

    #[test]
    fn short_packets_always_rejected(data in proptest::collection::vec(any::<u8>(), 0..OPTIONS_OFFSET)) {
        prop_assert!(Message::parse(&data).is_err());
    }

    #[test]
    fn bad_magic_cookie_always_rejected(
        mut data in proptest::collection::vec(any::<u8>(), OPTIONS_OFFSET..400),
        corrupt in 0usize..4,
    ) {
        data[236..240].copy_from_slice(&MAGIC_COOKIE);
        data[236 + corrupt] ^= 0xff;
        prop_assert!(Message::parse(&data).is_err());
    }

    #[test]
    fn header_fields_roundtrip(
        xid in any::<u32>(),
        secs in any::<u16>(),
        flags in any::<u16>(),
        mac in any::<[u8; 6]>(),
    ) {
        let mut msg = Message::new_request(xid, &mac);
        msg.secs = secs;
        msg.flags = flags;
        let bytes = msg.encode();
        let (parsed, region) = Message::parse(&bytes).unwrap();
        prop_assert_eq!(parsed.xid, xid);
        prop_assert_eq!(parsed.secs, secs);
        prop_assert_eq!(parsed.flags, flags);
        prop_assert_eq!(&parsed.chaddr[..6], &mac[..]);
        // No options were added, so the region is just the END marker.
        prop_assert_eq!(region, &[OPT_END][..]);
    }

    #[test]
    fn stream_without_end_never_terminates(
        opts in proptest::collection::vec((1u8..255, proptest::collection::vec(any::<u8>(), 0..20)), 0..8),
    ) {
        // Hand-build a TLV region with no END marker.
        let mut region = Vec::new();
        for (code, data) in &opts {
            region.push(*code);
            region.push(data.len() as u8);
            region.extend_from_slice(data);
        }
        let mut iter = OptionsIter::new(&region);
        for item in iter.by_ref() {
            let _ = item;
        }
        prop_assert!(!iter.terminated());
    }
}
