//! Display helpers for identifiers and impact values.

use primitive_types::U256;

use super::value_objects::{Address, HumanId};

fn truncate_hex(full: &str, keep: usize) -> String {
    if full.len() <= keep + 2 {
        return full.to_string();
    }
    format!("{}...{}", &full[..keep + 2], &full[full.len() - keep..])
}

/// `0x1234ab...cdef56` style address.
pub fn format_address(address: &Address, keep: usize) -> String {
    truncate_hex(&address.to_string(), keep)
}

/// `0x12345678...9abcdef0` style human id.
pub fn format_human_id(human_id: &HumanId, keep: usize) -> String {
    truncate_hex(&human_id.to_string(), keep)
}

/// Fixed-point rendering of an on-chain integer with `decimals` places,
/// trailing zeros trimmed.
pub fn format_impact_value(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    let places = decimals as usize;
    if places == 0 {
        return digits;
    }

    let (integer, fraction) = if digits.len() > places {
        let (int, frac) = digits.split_at(digits.len() - places);
        (int.to_string(), frac.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = places))
    };

    match fraction.trim_end_matches('0') {
        "" => integer,
        trimmed => format!("{}.{}", integer, trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address() {
        let addr: Address = "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap();
        assert_eq!(format_address(&addr, 6), "0x123456...345678");
        assert_eq!(format_address(&addr, 40), addr.to_string());
    }

    #[test]
    fn test_format_human_id() {
        let id = HumanId::from([0xabu8; 32]);
        assert_eq!(format_human_id(&id, 8), "0xabababab...abababab");
    }

    #[test]
    fn test_format_impact_value() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_impact_value(one_and_half, 18), "1.5");
        assert_eq!(format_impact_value(U256::from(2_000u64), 3), "2");
        assert_eq!(format_impact_value(U256::from(5u64), 3), "0.005");
        assert_eq!(format_impact_value(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_format_impact_value_beyond_u256_digits() {
        assert_eq!(format_impact_value(U256::from(5u64), 80), format!("0.{}5", "0".repeat(79)));
        assert_eq!(format_impact_value(U256::zero(), 78), "0");
        assert_eq!(format_impact_value(U256::MAX, 78), format!("0.{}", U256::MAX));
        assert_eq!(format_impact_value(U256::from(10u64), 200), format!("0.{}1", "0".repeat(198)));
    }
}
