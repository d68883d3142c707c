use std::sync::OnceLock;

/// Scope of a checksum computation. The bits select which parts of an
/// entity are folded in, so a topology-only checksum can be computed
/// independently of annotations and constraint data.
pub const CRC_REACTIONNETWORK: u32 = 1;
pub const CRC_CONSTRAINTS: u32 = 2;
pub const CRC_ALL_ANNOTATIONS: u32 = 512;
pub const CRC_EVERYTHING: u32 = 1024 - 1;

static CRC_TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn crc_table() -> &'static [u32; 256] {
    CRC_TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (n, entry) in table.iter_mut().enumerate() {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 == 1 {
                    0xEDB8_8320 ^ (c >> 1)
                } else {
                    c >> 1
                };
            }
            *entry = c;
        }
        table
    })
}

/// Folds `data` into a running CRC-32 (reflected, polynomial
/// 0xEDB88320). Chaining calls is equivalent to one call over the
/// concatenated input; the initial value is 0.
pub fn update_crc32(data: &[u8], crc: u32) -> u32 {
    let table = crc_table();
    let mut c = crc ^ 0xFFFF_FFFF;
    for &b in data {
        c = table[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}
