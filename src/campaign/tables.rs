//! Predefined private-range subnet tables

use crate::network::Subnet;

/// Common 10.0.0.0/8 subnets used by home routers, VPNs and labs
pub const CLASS_A_COMMON: &[Subnet] = &[
    Subnet::new(10, 0, 0),
    Subnet::new(10, 0, 1),
    Subnet::new(10, 0, 2),
    Subnet::new(10, 0, 10),
    Subnet::new(10, 1, 0),
    Subnet::new(10, 1, 1),
    Subnet::new(10, 1, 10),
    Subnet::new(10, 10, 0),
    Subnet::new(10, 10, 1),
    Subnet::new(10, 10, 10),
    Subnet::new(10, 100, 0),
    Subnet::new(10, 100, 1),
];

/// Common 172.16.0.0/12 subnets, including Docker's default bridges
pub const CLASS_B_COMMON: &[Subnet] = &[
    Subnet::new(172, 16, 0),
    Subnet::new(172, 16, 1),
    Subnet::new(172, 16, 10),
    Subnet::new(172, 17, 0),
    Subnet::new(172, 18, 0),
    Subnet::new(172, 19, 0),
    Subnet::new(172, 20, 0),
    Subnet::new(172, 20, 10),
    Subnet::new(172, 31, 0),
    Subnet::new(172, 31, 255),
];

/// Common 192.168.0.0/16 subnets shipped as router defaults
pub const CLASS_C_COMMON: &[Subnet] = &[
    Subnet::new(192, 168, 0),
    Subnet::new(192, 168, 1),
    Subnet::new(192, 168, 2),
    Subnet::new(192, 168, 3),
    Subnet::new(192, 168, 4),
    Subnet::new(192, 168, 5),
    Subnet::new(192, 168, 8),
    Subnet::new(192, 168, 10),
    Subnet::new(192, 168, 11),
    Subnet::new(192, 168, 20),
    Subnet::new(192, 168, 31),
    Subnet::new(192, 168, 50),
    Subnet::new(192, 168, 88),
    Subnet::new(192, 168, 100),
    Subnet::new(192, 168, 123),
    Subnet::new(192, 168, 178),
    Subnet::new(192, 168, 254),
];

/// A handful of the most likely subnets for a fast first look
pub const QUICK_SCAN: &[Subnet] = &[
    Subnet::new(192, 168, 0),
    Subnet::new(192, 168, 1),
    Subnet::new(192, 168, 50),
    Subnet::new(10, 0, 0),
    Subnet::new(172, 16, 0),
];

/// Default /16 for the full sweep
pub const FULL_SWEEP_BASE: [u8; 2] = [192, 168];

/// All 256 /24 subnets under `base.0.0/16`
pub fn full_sweep(base: [u8; 2]) -> Vec<Subnet> {
    (0..=255u8).map(|c| Subnet::new(base[0], base[1], c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tables_are_private_and_unique() {
        for table in [CLASS_A_COMMON, CLASS_B_COMMON, CLASS_C_COMMON, QUICK_SCAN] {
            let unique: HashSet<_> = table.iter().collect();
            assert_eq!(unique.len(), table.len(), "duplicate subnet in table");
            assert!(table.iter().all(Subnet::is_private));
        }
    }

    #[test]
    fn test_class_tables_stay_in_their_block() {
        assert!(CLASS_A_COMMON.iter().all(|s| s.octets()[0] == 10));
        assert!(CLASS_B_COMMON
            .iter()
            .all(|s| s.octets()[0] == 172 && (16..=31).contains(&s.octets()[1])));
        assert!(CLASS_C_COMMON.iter().all(|s| s.octets()[..2] == [192, 168]));
    }

    #[test]
    fn test_full_sweep() {
        let subnets = full_sweep(FULL_SWEEP_BASE);
        assert_eq!(subnets.len(), 256);
        assert_eq!(subnets[0], Subnet::new(192, 168, 0));
        assert_eq!(subnets[255], Subnet::new(192, 168, 255));
    }
}
