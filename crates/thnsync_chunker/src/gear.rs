//! Gear table and rolling hash.

/// Gear values for the rolling hash, indexed by input byte.
///
/// The table is fixed: changing any entry changes every chunk boundary and
/// therefore every chunk id produced by previous releases.
pub const GEAR_TABLE: [u32; 256] = [
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
    0x1f3d_5b79, 0x2a8e_0e5b, 0x3b19_0f6d, 0x4c2a_7b91, 0x5ddc_9e13, 0x6eed_f721, 0x712b_0c9f, 0x8a1d_2b45,
];

/// Advances the rolling hash by one byte.
#[inline]
pub fn roll(hash: u32, byte: u8) -> u32 {
    (hash << 1) ^ GEAR_TABLE[byte as usize]
}
