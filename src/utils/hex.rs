//! Hexadecimal-string-to-int helper.

/// The error type for hex string conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An [`std::num::ParseIntError`].
    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),
}

type Result<T> = std::result::Result<T, Error>;

/// Parse an 8-or-fewer digit hex string into an `i32`, keeping the bit
/// pattern (so `FFFFFFFF` comes back as -1, not an overflow).
pub fn hex2int(hex: &str) -> Result<i32> {
    Ok(u32::from_str_radix(hex, 16)? as i32)
}

#[cfg(test)]
mod tests {
    use super::hex2int;

    #[test]
    fn parses_plain_values() {
        assert_eq!(hex2int("00A1").unwrap(), 161);
        assert_eq!(hex2int("0").unwrap(), 0);
    }

    #[test]
    fn keeps_the_bit_pattern() {
        assert_eq!(hex2int("FFFFFFFF").unwrap(), -1);
        assert_eq!(hex2int("C3C3C3C3").unwrap(), 0xC3C3C3C3u32 as i32);
    }

    #[test]
    fn rejects_junk() {
        assert!(hex2int("XYZ").is_err());
        assert!(hex2int("123456789").is_err());
    }
}
