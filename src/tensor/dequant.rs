//! Block dequantization for the GGUF quantized layouts
//!
//! Each layout is a fixed-size block of `BLOCK_BYTES` bytes decoding to
//! `BLOCK_SIZE` f32 values. Blocks are independent, so whole tensors are
//! decoded in parallel with Rayon.

use crate::error::{GgufError, GgufResult};
use rayon::prelude::*;

/// A fixed-size quantized block format
pub trait BlockFormat {
    /// ggml type name
    const NAME: &'static str;
    /// Elements per block
    const BLOCK_SIZE: usize;
    /// Bytes per block
    const BLOCK_BYTES: usize;

    /// Decode one block; `block.len() == BLOCK_BYTES`, `out.len() == BLOCK_SIZE`
    fn dequantize_block(block: &[u8], out: &mut [f32]);
}

/// Decode a run of whole blocks into f32 values
pub fn dequantize_blocks<F: BlockFormat>(data: &[u8]) -> GgufResult<Vec<f32>> {
    if data.len() % F::BLOCK_BYTES != 0 {
        return Err(GgufError::InvalidTensorShape(format!(
            "{} data of {} bytes is not a whole number of {}-byte blocks",
            F::NAME,
            data.len(),
            F::BLOCK_BYTES
        )));
    }

    let blocks = data.len() / F::BLOCK_BYTES;
    let mut result = vec![0.0f32; blocks * F::BLOCK_SIZE];

    result
        .par_chunks_mut(F::BLOCK_SIZE)
        .zip(data.par_chunks(F::BLOCK_BYTES))
        .for_each(|(out, block)| F::dequantize_block(block, out));

    Ok(result)
}

#[inline]
fn f16_at(bytes: &[u8], offset: usize) -> f32 {
    half::f16::from_bits(u16::from_le_bytes([bytes[offset], bytes[offset + 1]])).to_f32()
}

/// 6-bit scale and min of sub-block `j` from the packed 12-byte K-quant table
#[inline]
fn scale_min_k4(j: usize, scales: &[u8]) -> (u8, u8) {
    if j < 4 {
        (scales[j] & 63, scales[j + 4] & 63)
    } else {
        (
            (scales[j + 4] & 0x0F) | ((scales[j - 4] >> 6) << 4),
            (scales[j + 4] >> 4) | ((scales[j] >> 6) << 4),
        )
    }
}

/// `d: f16, qs: [i8; 32]`, value = d * q
pub struct Q8_0;

impl BlockFormat for Q8_0 {
    const NAME: &'static str = "Q8_0";
    const BLOCK_SIZE: usize = 32;
    const BLOCK_BYTES: usize = 34;

    fn dequantize_block(block: &[u8], out: &mut [f32]) {
        let d = f16_at(block, 0);
        for (o, &q) in out.iter_mut().zip(&block[2..34]) {
            *o = d * (q as i8) as f32;
        }
    }
}

/// `d: f16, m: f16, qs: [u8; 16]`, value = d * nibble + m
pub struct Q4_1;

impl BlockFormat for Q4_1 {
    const NAME: &'static str = "Q4_1";
    const BLOCK_SIZE: usize = 32;
    const BLOCK_BYTES: usize = 20;

    fn dequantize_block(block: &[u8], out: &mut [f32]) {
        let d = f16_at(block, 0);
        let m = f16_at(block, 2);
        let qs = &block[4..20];
        for (j, &q) in qs.iter().enumerate() {
            out[j] = d * (q & 0x0F) as f32 + m;
            out[j + 16] = d * (q >> 4) as f32 + m;
        }
    }
}

/// `d, dmin: f16, scales: [u8; 12], qs: [u8; 128]`
///
/// Eight sub-blocks of 32 values with 6-bit scales and mins.
pub struct Q4K;

impl BlockFormat for Q4K {
    const NAME: &'static str = "Q4_K";
    const BLOCK_SIZE: usize = 256;
    const BLOCK_BYTES: usize = 144;

    fn dequantize_block(block: &[u8], out: &mut [f32]) {
        let d = f16_at(block, 0);
        let dmin = f16_at(block, 2);
        let scales = &block[4..16];
        let qs = &block[16..144];

        for chunk in 0..4 {
            let q = &qs[chunk * 32..chunk * 32 + 32];
            let (sc1, m1) = scale_min_k4(2 * chunk, scales);
            let (sc2, m2) = scale_min_k4(2 * chunk + 1, scales);
            let (d1, min1) = (d * sc1 as f32, dmin * m1 as f32);
            let (d2, min2) = (d * sc2 as f32, dmin * m2 as f32);

            let base = chunk * 64;
            for l in 0..32 {
                out[base + l] = d1 * (q[l] & 0x0F) as f32 - min1;
                out[base + 32 + l] = d2 * (q[l] >> 4) as f32 - min2;
            }
        }
    }
}

/// `d, dmin: f16, scales: [u8; 12], qh: [u8; 32], qs: [u8; 128]`
///
/// Q4_K plus one high bit per value taken from `qh`.
pub struct Q5K;

impl BlockFormat for Q5K {
    const NAME: &'static str = "Q5_K";
    const BLOCK_SIZE: usize = 256;
    const BLOCK_BYTES: usize = 176;

    fn dequantize_block(block: &[u8], out: &mut [f32]) {
        let d = f16_at(block, 0);
        let dmin = f16_at(block, 2);
        let scales = &block[4..16];
        let qh = &block[16..48];
        let qs = &block[48..176];

        for chunk in 0..4 {
            let ql = &qs[chunk * 32..chunk * 32 + 32];
            let (u1, u2) = (1u8 << (2 * chunk), 2u8 << (2 * chunk));
            let (sc1, m1) = scale_min_k4(2 * chunk, scales);
            let (sc2, m2) = scale_min_k4(2 * chunk + 1, scales);
            let (d1, min1) = (d * sc1 as f32, dmin * m1 as f32);
            let (d2, min2) = (d * sc2 as f32, dmin * m2 as f32);

            let base = chunk * 64;
            for l in 0..32 {
                let hi1 = if qh[l] & u1 != 0 { 16 } else { 0 };
                let hi2 = if qh[l] & u2 != 0 { 16 } else { 0 };
                out[base + l] = d1 * ((ql[l] & 0x0F) + hi1) as f32 - min1;
                out[base + 32 + l] = d2 * ((ql[l] >> 4) + hi2) as f32 - min2;
            }
        }
    }
}

/// `ql: [u8; 128], qh: [u8; 64], scales: [i8; 16], d: f16`
///
/// 6-bit values centred on 32, one signed 8-bit scale per 16 values.
pub struct Q6K;

impl BlockFormat for Q6K {
    const NAME: &'static str = "Q6_K";
    const BLOCK_SIZE: usize = 256;
    const BLOCK_BYTES: usize = 210;

    fn dequantize_block(block: &[u8], out: &mut [f32]) {
        let d = f16_at(block, 208);

        for half in 0..2 {
            let ql = &block[half * 64..half * 64 + 64];
            let qh = &block[128 + half * 32..128 + half * 32 + 32];
            let sc = &block[192 + half * 8..192 + half * 8 + 8];
            let base = half * 128;

            for l in 0..32 {
                let is = l / 16;
                let q1 = ((ql[l] & 0x0F) | ((qh[l] & 3) << 4)) as i32 - 32;
                let q2 = ((ql[l + 32] & 0x0F) | (((qh[l] >> 2) & 3) << 4)) as i32 - 32;
                let q3 = ((ql[l] >> 4) | (((qh[l] >> 4) & 3) << 4)) as i32 - 32;
                let q4 = ((ql[l + 32] >> 4) | (((qh[l] >> 6) & 3) << 4)) as i32 - 32;

                out[base + l] = d * (sc[is] as i8) as f32 * q1 as f32;
                out[base + l + 32] = d * (sc[is + 2] as i8) as f32 * q2 as f32;
                out[base + l + 64] = d * (sc[is + 4] as i8) as f32 * q3 as f32;
                out[base + l + 96] = d * (sc[is + 6] as i8) as f32 * q4 as f32;
            }
        }
    }
}
