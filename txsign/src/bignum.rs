//! Minimal unsigned 256-bit arithmetic for ABI words.
//!
//! Only what the decoders need: big-endian load/store, bit length,
//! checked add/mul and decimal rendering with a fixed-point position.

use core::cmp::Ordering;

/// 256-bit unsigned integer, little-endian 64-bit limbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const MAX: U256 = U256([u64::MAX; 4]);

    pub fn from_u64(v: u64) -> Self {
        U256([v, 0, 0, 0])
    }

    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let start = 32 - (i + 1) * 8;
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[start..start + 8]);
            *limb = u64::from_be_bytes(word);
        }
        U256(limbs)
    }

    /// Loads a big-endian number of at most 32 bytes, left-padding with zeros.
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(bytes);
        Some(Self::from_be_bytes(&padded))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, limb) in self.0.iter().enumerate() {
            let start = 32 - (i + 1) * 8;
            out[start..start + 8].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&l| l == 0)
    }

    /// Position of the highest set bit plus one; 0 for zero.
    pub fn bit_count(&self) -> u32 {
        for i in (0..4).rev() {
            if self.0[i] != 0 {
                return (i as u32) * 64 + (64 - self.0[i].leading_zeros());
            }
        }
        0
    }

    /// The value as u32, if it fits.
    pub fn to_u32(&self) -> Option<u32> {
        if self.bit_count() > 32 {
            None
        } else {
            Some(self.0[0] as u32)
        }
    }

    pub fn checked_add(&self, other: &U256) -> Option<U256> {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for (i, limb) in out.iter_mut().enumerate() {
            let sum = self.0[i] as u128 + other.0[i] as u128 + carry;
            *limb = sum as u64;
            carry = sum >> 64;
        }
        if carry != 0 {
            None
        } else {
            Some(U256(out))
        }
    }

    pub fn checked_mul(&self, other: &U256) -> Option<U256> {
        let mut wide = [0u64; 8];
        for i in 0..4 {
            let mut carry = 0u128;
            for j in 0..4 {
                let cur = wide[i + j] as u128 + (self.0[i] as u128) * (other.0[j] as u128) + carry;
                wide[i + j] = cur as u64;
                carry = cur >> 64;
            }
            wide[i + 4] = carry as u64;
        }
        if wide[4..].iter().any(|&l| l != 0) {
            return None;
        }
        Some(U256([wide[0], wide[1], wide[2], wide[3]]))
    }

    /// Divides by a small divisor, returning quotient and remainder.
    pub fn div_rem_u64(&self, divisor: u64) -> (U256, u64) {
        debug_assert!(divisor != 0);
        let mut out = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            out[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        (U256(out), rem as u64)
    }

    /// Base-10 digits, most significant first.
    pub fn to_decimal(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut digits = Vec::with_capacity(78);
        let mut n = *self;
        while !n.is_zero() {
            let (q, r) = n.div_rem_u64(10);
            digits.push(b'0' + r as u8);
            n = q;
        }
        digits.reverse();
        // Only ASCII digits were pushed.
        String::from_utf8(digits).unwrap_or_default()
    }

    /// Renders the value with a decimal point `decimals` places from the
    /// right. Trailing fractional zeros are dropped, and so is the point
    /// when nothing remains after it.
    pub fn to_fixed_point(&self, decimals: u32) -> String {
        let digits = self.to_decimal();
        let decimals = decimals as usize;
        if decimals == 0 {
            return digits;
        }

        let (int_part, frac_part) = if digits.len() > decimals {
            let split = digits.len() - decimals;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            let mut frac = "0".repeat(decimals - digits.len());
            frac.push_str(&digits);
            ("0".to_string(), frac)
        };

        let frac_trimmed = frac_part.trim_end_matches('0');
        if frac_trimmed.is_empty() {
            int_part
        } else {
            format!("{}.{}", int_part, frac_trimmed)
        }
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_roundtrip_and_bits() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        bytes[0] = 0x80;
        let n = U256::from_be_bytes(&bytes);
        assert_eq!(n.to_be_bytes(), bytes);
        assert_eq!(n.bit_count(), 256);
        assert_eq!(U256::from_u64(1).bit_count(), 1);
        assert_eq!(U256::ZERO.bit_count(), 0);
    }

    #[test]
    fn test_fits_u32() {
        assert_eq!(U256::from_u64(0xffff_ffff).to_u32(), Some(0xffff_ffff));
        assert_eq!(U256::from_u64(0x1_0000_0000).to_u32(), None);
    }

    #[test]
    fn test_decimal_of_max() {
        assert_eq!(
            U256::MAX.to_decimal(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn test_fixed_point() {
        let one_eth = U256::from_u64(1_000_000_000_000_000_000);
        assert_eq!(one_eth.to_fixed_point(18), "1");
        assert_eq!(U256::from_u64(1_500_000_000_000_000_000).to_fixed_point(18), "1.5");
        assert_eq!(U256::from_u64(1_000_000_000).to_fixed_point(18), "0.000000001");
        assert_eq!(U256::from_u64(0).to_fixed_point(6), "0");
        assert_eq!(U256::from_u64(1234).to_fixed_point(0), "1234");
    }

    #[test]
    fn test_checked_mul_overflow() {
        let a = U256::from_u64(u64::MAX);
        let sq = a.checked_mul(&a).unwrap();
        assert_eq!(sq.bit_count(), 128);
        assert!(U256::MAX.checked_mul(&U256::from_u64(2)).is_none());
        assert!(U256::MAX.checked_add(&U256::from_u64(1)).is_none());
        assert!(U256::from_u64(3) < U256::from_u64(4));
    }
}
