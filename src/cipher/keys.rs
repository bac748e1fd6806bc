//! Fixed device keys.
//!
//! The plotter firmware expects each encrypted command field to be sealed
//! with a specific 128-bit key. Only the two pen-move keys are used by the
//! current command set. The other six have no assigned command.

use super::CipherKey;

pub const KEY0: CipherKey = CipherKey::new([0x272D_6C37, 0x342A_6173, 0x3663_255B, 0x2B26_5A4D]);
pub const KEY1: CipherKey = CipherKey::new([0x7D31_6E22, 0x4A4A_7133, 0x5A3C_5C5F, 0x7861_3A61]);
pub const KEY2: CipherKey = CipherKey::new([0x4730_2A23, 0x5D31_482F, 0x3B25_7A61, 0x3671_382F]);
pub const KEY3: CipherKey = CipherKey::new([0x303F_6863, 0x7164_6D30, 0x4769_457B, 0x6D34_2569]);
pub const KEY4: CipherKey = CipherKey::new([0x4535_6650, 0x3A38_6D69, 0x575A_7037, 0x335F_357D]);
pub const KEY5: CipherKey = CipherKey::new([0x343A_2148, 0x614F_3925, 0x753F_6953, 0x4746_3626]);
pub const KEY6: CipherKey = CipherKey::new([0x3F62_626D, 0x7E55_5F44, 0x7E29_425A, 0x5224_6268]);
pub const KEY7: CipherKey = CipherKey::new([0x4730_2A23, 0x342A_6173, 0x4769_457B, 0x335F_357D]);

/// All device keys, indexed by slot.
pub const ALL_KEYS: [CipherKey; 8] = [KEY0, KEY1, KEY2, KEY3, KEY4, KEY5, KEY6, KEY7];

/// Key for move-with-pen-raised commands.
pub const PEN_UP_KEY: CipherKey = KEY2;

/// Key for move-with-pen-lowered commands.
pub const PEN_DOWN_KEY: CipherKey = KEY3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_keys_differ() {
        assert_ne!(PEN_UP_KEY, PEN_DOWN_KEY);
    }

    #[test]
    fn test_table_order() {
        assert_eq!(ALL_KEYS[2], PEN_UP_KEY);
        assert_eq!(ALL_KEYS[3], PEN_DOWN_KEY);
        assert_eq!(ALL_KEYS[7].words()[0], KEY2.words()[0]);
    }
}
