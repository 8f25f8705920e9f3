//! IrDA SIR frame check sequence (CRC-16/X.25).
//!
//! SIR frames carry a 16-bit FCS computed with the reflected CCITT
//! polynomial `0x8408`, initial value `0xFFFF`, and a final complement. The
//! FCS is transmitted low byte first. Running the CRC over a frame including
//! its FCS leaves the constant residue [`GOOD_FCS16`].

/// Initial FCS register value
pub const INIT_FCS16: u16 = 0xFFFF;

/// Residue left after running the CRC over data followed by its FCS
pub const GOOD_FCS16: u16 = 0xF0B8;

const POLY: u16 = 0x8408;

static FCS16_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Fold `data` into a running FCS register.
#[inline]
pub fn update(fcs: u16, data: &[u8]) -> u16 {
    data.iter().fold(fcs, |fcs, &byte| {
        (fcs >> 8) ^ FCS16_TABLE[((fcs ^ byte as u16) & 0xFF) as usize]
    })
}

/// Compute the FCS to append to `data`.
#[inline]
pub fn compute(data: &[u8]) -> u16 {
    !update(INIT_FCS16, data)
}

/// Check a frame whose last two bytes are its FCS.
pub fn is_valid(frame: &[u8]) -> bool {
    frame.len() >= 2 && update(INIT_FCS16, frame) == GOOD_FCS16
}

/// Write `data` followed by its FCS into `out`. Returns the bytes written,
/// or `None` when `out` is too short.
pub fn append(data: &[u8], out: &mut [u8]) -> Option<usize> {
    let total = data.len() + 2;
    if out.len() < total {
        return None;
    }
    out[..data.len()].copy_from_slice(data);
    out[data.len()..total].copy_from_slice(&compute(data).to_le_bytes());
    Some(total)
}
