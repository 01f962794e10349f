// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

/// A 16 bit value split across a coarse and a fine DMX channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoarseFine {
    pub coarse: u8,
    pub fine: u8,
}

/// Splits a 16 bit value into its coarse and fine bytes.
#[inline]
pub fn encode16(value: u16) -> CoarseFine {
    CoarseFine {
        coarse: (value / 256) as u8,
        fine: (value % 256) as u8,
    }
}

/// Joins coarse and fine bytes back into a 16 bit value.
#[inline]
pub fn decode16(coarse: u8, fine: u8) -> u16 {
    u16::from(coarse) * 256 + u16::from(fine)
}

/// Scales a normalized value in [0, 1] to the 16 bit range. Values outside the
/// range are clamped, and the result is truncated rather than rounded.
#[inline]
pub fn normalized_to_u16(normalized: f64) -> u16 {
    if normalized.is_nan() {
        return 0;
    }
    (normalized.clamp(0.0, 1.0) * f64::from(u16::MAX)) as u16
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode16() {
        assert_eq!(CoarseFine { coarse: 0, fine: 0 }, encode16(0));
        assert_eq!(CoarseFine { coarse: 0, fine: 255 }, encode16(255));
        assert_eq!(CoarseFine { coarse: 1, fine: 0 }, encode16(256));
        assert_eq!(CoarseFine { coarse: 127, fine: 255 }, encode16(32767));
        assert_eq!(
            CoarseFine {
                coarse: 255,
                fine: 255
            },
            encode16(65535)
        );
    }

    #[test]
    fn test_decode_inverts_encode() {
        for value in 0..=u16::MAX {
            let CoarseFine { coarse, fine } = encode16(value);
            assert_eq!(value, decode16(coarse, fine));
        }
    }

    #[test]
    fn test_normalized_to_u16() {
        assert_eq!(0, normalized_to_u16(0.0));
        assert_eq!(32767, normalized_to_u16(0.5));
        assert_eq!(65535, normalized_to_u16(1.0));
        assert_eq!(0, normalized_to_u16(-0.25));
        assert_eq!(65535, normalized_to_u16(1.5));
        assert_eq!(0, normalized_to_u16(f64::NAN));
    }
}
