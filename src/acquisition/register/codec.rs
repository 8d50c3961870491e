//! Conversion between `f32` values and the 32-bit words of the absolute-value registers.
//!
//! Writes use the plain IEEE-754 bit pattern. Reads treat bit 31 as a sign flag kept apart
//! from the 31 magnitude bits: the magnitude is reinterpreted as an IEEE-754 value and
//! negated when the flag is set. Only the gain and shutter absolute registers are read
//! this way.

const SIGN_FLAG: u32 = 0x8000_0000;
const MAGNITUDE_MASK: u32 = 0x7FFF_FFFF;

/// Encodes a value for a register write.
pub fn encode(value: f32) -> u32 {
    u32::from_be_bytes(value.to_be_bytes())
}

/// Decodes a register word read from an absolute-value register.
pub fn decode(word: u32) -> f32 {
    let magnitude = f32::from_bits(word & MAGNITUDE_MASK);
    if word & SIGN_FLAG != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Encodes a value as the big-endian byte payload of a register.
pub fn encode_bytes(value: f32) -> [u8; 4] {
    encode(value).to_be_bytes()
}

/// Decodes a big-endian register payload.
pub fn decode_bytes(bytes: [u8; 4]) -> f32 {
    decode(u32::from_be_bytes(bytes))
}
