//! Packed (cartridge) layout
//!
//! Each of the 32 cartridge slots holds one voice in 128 bytes. Small
//! parameters share bytes; the unused high bits of those shared bytes are
//! kept as `XXnn` placeholder keys so a cartridge can be rebuilt bit for bit.
//!
//! Slot layout:
//! - Bytes 0-101: six 17-byte operator blocks, operator 6 first
//! - Bytes 102-117: 16 voice-global bytes
//! - Bytes 118-127: name

use nom::bytes::complete::take;
use nom::multi::count;
use nom::IResult;
use tracing::warn;

use super::{read_name, write_name, CARTRIDGE_VOICE_COUNT, NAME_LEN, PACKED_VOICE_LEN};
use crate::voice::fields::{operator_key, OPERATOR_COUNT};
use crate::voice::{Voice, VoiceParams};
use crate::{Result, VolcaError};

/// Length of one packed operator block
pub const OPERATOR_BLOCK_LEN: usize = 17;

/// Offset of the voice-global block within a slot
pub const GLOBAL_OFFSET: usize = OPERATOR_BLOCK_LEN * OPERATOR_COUNT;

/// Offset of the name within a slot
pub const NAME_OFFSET: usize = GLOBAL_OFFSET + 16;

/// One parameter's position inside a packed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// Byte offset relative to the start of the block
    pub offset: usize,
    /// Field name (operator field or global key)
    pub key: &'static str,
    /// Position of the lowest bit
    pub shift: u8,
    /// Number of bits
    pub width: u8,
}

impl BitField {
    /// Parameter occupying a whole byte
    pub const fn byte(offset: usize, key: &'static str) -> Self {
        Self {
            offset,
            key,
            shift: 0,
            width: 8,
        }
    }

    /// Parameter occupying `width` bits starting at bit `shift`
    pub const fn bits(offset: usize, key: &'static str, shift: u8, width: u8) -> Self {
        Self {
            offset,
            key,
            shift,
            width,
        }
    }

    /// Mask of the value before shifting
    pub fn mask(&self) -> u8 {
        if self.width >= 8 {
            0xFF
        } else {
            (1u8 << self.width) - 1
        }
    }

    /// Read this field out of `block`.
    pub fn extract(&self, block: &[u8]) -> u8 {
        (block[self.offset] >> self.shift) & self.mask()
    }

    /// OR `value` into `block`, masked to the field width.
    pub fn insert(&self, block: &mut [u8], value: u8) {
        block[self.offset] |= (value & self.mask()) << self.shift;
    }
}

/// Operator block, relative to the block start
pub const OPERATOR_LAYOUT: [BitField; 24] = [
    BitField::byte(0, "EGR1"),
    BitField::byte(1, "EGR2"),
    BitField::byte(2, "EGR3"),
    BitField::byte(3, "EGR4"),
    BitField::byte(4, "EGL1"),
    BitField::byte(5, "EGL2"),
    BitField::byte(6, "EGL3"),
    BitField::byte(7, "EGL4"),
    BitField::byte(8, "LSBP"),
    BitField::byte(9, "LSLD"),
    BitField::byte(10, "LSRD"),
    BitField::bits(11, "XX11", 4, 3),
    BitField::bits(11, "LSRC", 2, 2),
    BitField::bits(11, "LSLC", 0, 2),
    BitField::bits(12, "DETU", 3, 4),
    BitField::bits(12, "ORS", 0, 3),
    BitField::bits(13, "XX13", 5, 2),
    BitField::bits(13, "KVS", 2, 3),
    BitField::bits(13, "AMS", 0, 2),
    BitField::byte(14, "OLVL"),
    BitField::bits(15, "XX15", 6, 1),
    BitField::bits(15, "FREC", 1, 5),
    BitField::bits(15, "OSCM", 0, 1),
    BitField::byte(16, "FREF"),
];

/// Voice-global block, relative to [`GLOBAL_OFFSET`]
pub const GLOBAL_LAYOUT: [BitField; 21] = [
    BitField::byte(0, "ALL.PTR1"),
    BitField::byte(1, "ALL.PTR2"),
    BitField::byte(2, "ALL.PTR3"),
    BitField::byte(3, "ALL.PTR4"),
    BitField::byte(4, "ALL.PTL1"),
    BitField::byte(5, "ALL.PTL2"),
    BitField::byte(6, "ALL.PTL3"),
    BitField::byte(7, "ALL.PTL4"),
    BitField::bits(8, "XX08", 5, 2),
    BitField::bits(8, "ALGO", 0, 5),
    BitField::bits(9, "XX09", 4, 3),
    BitField::bits(9, "ALL.OKS", 3, 1),
    BitField::bits(9, "ALL.FDBK", 0, 3),
    BitField::byte(10, "LFOR"),
    BitField::byte(11, "ALL.LFOD"),
    BitField::byte(12, "LPMD"),
    BitField::byte(13, "ALL.LAMD"),
    BitField::bits(14, "ALL.MSP", 4, 3),
    BitField::bits(14, "ALL.LFOW", 1, 3),
    BitField::bits(14, "ALL.LFOK", 0, 1),
    BitField::byte(15, "ALL.TRSP"),
];

fn operator_offset(index: usize) -> usize {
    OPERATOR_BLOCK_LEN * (OPERATOR_COUNT - 1 - index)
}

/// Width in bits of the packed field behind `key`.
///
/// Accepts operator keys (`OP3.FREC`) and global keys (`ALGO`,
/// `ALL.LFOW`). Returns `None` for keys the packed layout does not carry.
#[cfg(test)]
pub(crate) fn bit_width(key: &str) -> Option<u8> {
    if let Some(field) = GLOBAL_LAYOUT.iter().find(|f| f.key == key) {
        return Some(field.width);
    }

    let (prefix, name) = key.split_once('.')?;
    let number: usize = prefix.strip_prefix("OP")?.parse().ok()?;
    if !(1..=OPERATOR_COUNT).contains(&number) {
        return None;
    }
    OPERATOR_LAYOUT
        .iter()
        .find(|f| f.key == name)
        .map(|f| f.width)
}

fn slots(input: &[u8]) -> IResult<&[u8], Vec<&[u8]>> {
    count(take(PACKED_VOICE_LEN), CARTRIDGE_VOICE_COUNT)(input)
}

/// Split a cartridge payload into its 32 voice slots.
pub fn split_slots(payload: &[u8]) -> Result<Vec<&[u8]>> {
    slots(payload)
        .map(|(_, slots)| slots)
        .map_err(|_| VolcaError::TruncatedInput {
            expected: PACKED_VOICE_LEN * CARTRIDGE_VOICE_COUNT,
            actual: payload.len(),
        })
}

/// Decode one 128-byte slot, including the reserved placeholder keys.
pub fn decode_voice(slot: &[u8]) -> Result<Voice> {
    if slot.len() < PACKED_VOICE_LEN {
        return Err(VolcaError::TruncatedInput {
            expected: PACKED_VOICE_LEN,
            actual: slot.len(),
        });
    }

    let mut params = VoiceParams::new();

    for index in 0..OPERATOR_COUNT {
        let start = operator_offset(index);
        let block = &slot[start..start + OPERATOR_BLOCK_LEN];
        for field in &OPERATOR_LAYOUT {
            params.insert(operator_key(index + 1, field.key), field.extract(block));
        }
    }

    let global = &slot[GLOBAL_OFFSET..NAME_OFFSET];
    for field in &GLOBAL_LAYOUT {
        params.insert(field.key.to_string(), field.extract(global));
    }

    let name = read_name(&slot[NAME_OFFSET..NAME_OFFSET + NAME_LEN]);

    Ok(Voice::new(name, params))
}

/// Encode one voice into a 128-byte slot, overwriting what it held.
///
/// Absent keys encode as 0. Values wider than their field are masked.
pub fn encode_voice(voice: &Voice, slot: &mut [u8]) -> Result<()> {
    if slot.len() < PACKED_VOICE_LEN {
        return Err(VolcaError::TruncatedInput {
            expected: PACKED_VOICE_LEN,
            actual: slot.len(),
        });
    }
    slot[..PACKED_VOICE_LEN].fill(0);

    for index in 0..OPERATOR_COUNT {
        let start = operator_offset(index);
        let block = &mut slot[start..start + OPERATOR_BLOCK_LEN];
        for field in &OPERATOR_LAYOUT {
            let key = operator_key(index + 1, field.key);
            insert_checked(field, block, &key, voice.param(&key));
        }
    }

    let global = &mut slot[GLOBAL_OFFSET..NAME_OFFSET];
    for field in &GLOBAL_LAYOUT {
        insert_checked(field, global, field.key, voice.param(field.key));
    }

    write_name(&mut slot[NAME_OFFSET..NAME_OFFSET + NAME_LEN], voice.name());
    Ok(())
}

fn insert_checked(field: &BitField, block: &mut [u8], key: &str, value: u8) {
    if value & !field.mask() != 0 {
        warn!(
            "{} = {} does not fit in {} bits, storing {}",
            key,
            value,
            field.width,
            value & field.mask()
        );
    }
    field.insert(block, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::fields::{packed_keys, OPERATOR_FIELDS, OPERATOR_RESERVED_FIELDS};

    #[test]
    fn test_layout_offsets() {
        assert_eq!(GLOBAL_OFFSET, 102);
        assert_eq!(NAME_OFFSET, 118);
        assert_eq!(NAME_OFFSET + NAME_LEN, PACKED_VOICE_LEN);
    }

    #[test]
    fn test_fields_fit_their_bytes() {
        for (layout, len) in [
            (&OPERATOR_LAYOUT[..], OPERATOR_BLOCK_LEN),
            (&GLOBAL_LAYOUT[..], NAME_OFFSET - GLOBAL_OFFSET),
        ] {
            let mut used = vec![0u8; len];
            for field in layout {
                assert!(field.offset < len, "{} out of block", field.key);
                assert!(field.shift + field.width <= 8, "{} overflows", field.key);
                let bits = field.mask() << field.shift;
                assert_eq!(used[field.offset] & bits, 0, "{} overlaps", field.key);
                used[field.offset] |= bits;
            }
        }
    }

    #[test]
    fn test_layout_names_every_operator_field() {
        for name in OPERATOR_FIELDS.iter().chain(OPERATOR_RESERVED_FIELDS.iter()) {
            assert!(
                OPERATOR_LAYOUT.iter().any(|f| f.key == *name),
                "{name} missing"
            );
        }
        assert_eq!(OPERATOR_LAYOUT.len(), 21 + 3);
    }

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width("ALGO"), Some(5));
        assert_eq!(bit_width("ALL.OKS"), Some(1));
        assert_eq!(bit_width("ALL.TRSP"), Some(8));
        assert_eq!(bit_width("OP1.FREC"), Some(5));
        assert_eq!(bit_width("OP6.XX15"), Some(1));
        assert_eq!(bit_width("OP6.EGR1"), Some(8));
        assert_eq!(bit_width("OP7.EGR1"), None);
        assert_eq!(bit_width("NAME"), None);
        assert_eq!(bit_width("ALL.NOPE"), None);
    }

    #[test]
    fn test_decode_known_bits() {
        let mut slot = [0u8; PACKED_VOICE_LEN];
        // Operator 6 block comes first
        slot[11] = 0b0101_1110; // XX11=5 LSRC=3 LSLC=2
        slot[12] = 0b0011_1101; // DETU=7 ORS=5
        slot[15] = 0b0100_0111; // XX15=1 FREC=3 OSCM=1
        slot[GLOBAL_OFFSET + 8] = 0b0101_1111; // XX08=2 ALGO=31
        slot[GLOBAL_OFFSET + 9] = 0b0011_1010; // XX09=3 OKS=1 FDBK=2
        slot[GLOBAL_OFFSET + 14] = 0b0011_0101; // MSP=3 LFOW=2 LFOK=1

        let voice = decode_voice(&slot).unwrap();
        assert_eq!(voice.get("OP6.XX11"), Some(5));
        assert_eq!(voice.get("OP6.LSRC"), Some(3));
        assert_eq!(voice.get("OP6.LSLC"), Some(2));
        assert_eq!(voice.get("OP6.DETU"), Some(7));
        assert_eq!(voice.get("OP6.ORS"), Some(5));
        assert_eq!(voice.get("OP6.XX15"), Some(1));
        assert_eq!(voice.get("OP6.FREC"), Some(3));
        assert_eq!(voice.get("OP6.OSCM"), Some(1));
        assert_eq!(voice.get("OP1.LSRC"), Some(0));
        assert_eq!(voice.get("XX08"), Some(2));
        assert_eq!(voice.get("ALGO"), Some(31));
        assert_eq!(voice.get("XX09"), Some(3));
        assert_eq!(voice.get("ALL.OKS"), Some(1));
        assert_eq!(voice.get("ALL.FDBK"), Some(2));
        assert_eq!(voice.get("ALL.MSP"), Some(3));
        assert_eq!(voice.get("ALL.LFOW"), Some(2));
        assert_eq!(voice.get("ALL.LFOK"), Some(1));
    }

    #[test]
    fn test_decode_complete_key_set() {
        let voice = decode_voice(&[0u8; PACKED_VOICE_LEN]).unwrap();
        let keys = packed_keys();
        assert!(voice.has_keys(&keys));
        assert_eq!(voice.params().len(), keys.len());
    }

    #[test]
    fn test_reversed_operator_order() {
        let mut slot = [0u8; PACKED_VOICE_LEN];
        slot[operator_offset(0)] = 11; // OP1.EGR1, last block
        slot[0] = 66; // OP6.EGR1
        let voice = decode_voice(&slot).unwrap();
        assert_eq!(operator_offset(0), 85);
        assert_eq!(voice.get("OP1.EGR1"), Some(11));
        assert_eq!(voice.get("OP6.EGR1"), Some(66));
    }

    #[test]
    fn test_reserved_bits_round_trip() {
        // All seven low bits set: every shared byte is fully covered by
        // named fields plus reserved placeholders
        let mut slot = [0x7Fu8; PACKED_VOICE_LEN];
        slot[NAME_OFFSET..].copy_from_slice(b"CARTVOICE ");

        let voice = decode_voice(&slot).unwrap();
        assert_eq!(voice.get("OP2.XX13"), Some(3));
        assert_eq!(voice.get("XX09"), Some(7));

        let mut encoded = [0u8; PACKED_VOICE_LEN];
        encode_voice(&voice, &mut encoded).unwrap();
        assert_eq!(encoded, slot);
    }

    #[test]
    fn test_decode_all_ones_in_range() {
        let voice = decode_voice(&[0xFFu8; PACKED_VOICE_LEN]).unwrap();
        assert_eq!(voice.get("OP1.LSLC"), Some(3));
        assert_eq!(voice.get("OP1.XX11"), Some(7));
        assert_eq!(voice.get("OP1.FREC"), Some(31));
        assert_eq!(voice.get("ALGO"), Some(31));
        assert_eq!(voice.get("XX08"), Some(3));
        assert_eq!(voice.get("OP4.EGR1"), Some(0xFF));

        for (key, &value) in voice.params() {
            let width = bit_width(key).unwrap();
            assert!(u32::from(value) < 1 << width, "{key} = {value}");
        }
    }

    #[test]
    fn test_encode_masks_oversized_values() {
        let mut params = VoiceParams::new();
        params.insert("ALGO".to_string(), 0xFF);
        params.insert("OP6.OSCM".to_string(), 3);
        let voice = Voice::new("", params);

        let mut slot = [0u8; PACKED_VOICE_LEN];
        encode_voice(&voice, &mut slot).unwrap();
        assert_eq!(slot[GLOBAL_OFFSET + 8], 0x1F);
        assert_eq!(slot[15], 0x01);
    }

    #[test]
    fn test_encode_overwrites_dirty_slot() {
        let mut params = VoiceParams::new();
        params.insert("ALGO".to_string(), 4);
        params.insert("OP2.DETU".to_string(), 9);
        let voice = Voice::new("DIRTY", params);

        let mut clean = [0u8; PACKED_VOICE_LEN];
        encode_voice(&voice, &mut clean).unwrap();
        let mut dirty = [0xFFu8; PACKED_VOICE_LEN];
        encode_voice(&voice, &mut dirty).unwrap();
        assert_eq!(dirty, clean);
        assert_eq!(dirty[GLOBAL_OFFSET + 8], 4);
    }

    #[test]
    fn test_encode_short_slot() {
        let mut slot = [0u8; 100];
        assert!(matches!(
            encode_voice(&Voice::default(), &mut slot),
            Err(VolcaError::TruncatedInput {
                expected: 128,
                actual: 100
            })
        ));
    }

    #[test]
    fn test_split_slots() {
        let payload: Vec<u8> = (0..PACKED_VOICE_LEN * CARTRIDGE_VOICE_COUNT)
            .map(|i| (i / PACKED_VOICE_LEN) as u8)
            .collect();
        let slots = split_slots(&payload).unwrap();
        assert_eq!(slots.len(), 32);
        assert!(slots[0].iter().all(|&b| b == 0));
        assert!(slots[31].iter().all(|&b| b == 31));

        assert!(matches!(
            split_slots(&payload[..4000]),
            Err(VolcaError::TruncatedInput {
                expected: 4096,
                actual: 4000
            })
        ));
    }

    #[test]
    fn test_decode_short_slot() {
        assert!(matches!(
            decode_voice(&[0u8; 127]),
            Err(VolcaError::TruncatedInput {
                expected: 128,
                actual: 127
            })
        ));
    }
}
