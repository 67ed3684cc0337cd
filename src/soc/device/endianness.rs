pub const WORD_BYTES: usize = 4;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    #[inline(always)]
    pub fn decode_word(self, bytes: [u8; WORD_BYTES]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    #[inline(always)]
    pub fn encode_word(self, value: u32) -> [u8; WORD_BYTES] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_byte_order_follows_endianness() {
        assert_eq!(Endianness::Little.encode_word(0x1122_3344), [0x44, 0x33, 0x22, 0x11]);
        assert_eq!(Endianness::Big.encode_word(0x1122_3344), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(
            Endianness::Big.decode_word([0xDE, 0xAD, 0xBE, 0xEF]),
            0xDEAD_BEEF
        );
        assert_eq!(
            Endianness::Little.decode_word([0xEF, 0xBE, 0xAD, 0xDE]),
            0xDEAD_BEEF
        );
    }
}
