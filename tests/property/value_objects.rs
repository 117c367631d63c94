// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Value Objects

use bigip_network::domain::{FullPath, IpAddressWithCidr, VlanId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_vlan_id_accepts_exactly_1_to_4094(id in -10_000i64..10_000) {
        prop_assert_eq!(VlanId::new(id).is_ok(), (1..=4094).contains(&id));
    }

    #[test]
    fn prop_full_path_from_parts(
        partition in "[A-Za-z_][A-Za-z0-9_.-]{0,30}",
        short in "[A-Za-z0-9_][A-Za-z0-9_.:-]{0,60}",
    ) {
        let path = FullPath::from_parts(&partition, &short).unwrap();
        prop_assert_eq!(path.partition(), partition.as_str());
        prop_assert_eq!(path.short_name(), short.as_str());
        prop_assert!(!path.to_uri_segment().contains('/'));
    }

    #[test]
    fn prop_cidr_display_parses_back(
        octets in any::<[u8; 4]>(),
        prefix in 0u8..=32,
    ) {
        let raw = format!("{}.{}.{}.{}/{}", octets[0], octets[1], octets[2], octets[3], prefix);
        let parsed = IpAddressWithCidr::new(&raw).unwrap();
        prop_assert_eq!(parsed.prefix_length(), prefix);
        prop_assert_eq!(IpAddressWithCidr::new(&parsed.to_string()).unwrap(), parsed);
    }

    #[test]
    fn prop_cidr_requires_prefix(octets in any::<[u8; 4]>()) {
        let raw = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
        prop_assert!(IpAddressWithCidr::new(&raw).is_err());
    }
}
