// Half-precision encoding rounds to nearest with ties to even. Finite values
// beyond the half range and infinities saturate to ±65504; NaN stays a quiet
// NaN. Bytes are native-endian.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const F16_MAX: f32 = 65504.0;
pub const F16_MIN_POSITIVE: f32 = 6.103_515_6e-5;

const F16_MAX_BITS: u16 = 0x7bff;
const F16_QUIET_NAN: u16 = 0x7e00;
const F16_SUBNORMAL_UNIT: f32 = 5.960_464_5e-8; // 2^-24

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    Float32,
    #[default]
    Float16,
}

impl StorageFormat {
    pub fn bytes_per_scalar(self) -> usize {
        self.codec().bytes_per_scalar()
    }

    pub fn codec(self) -> &'static dyn StorageCodec {
        match self {
            StorageFormat::Float32 => &Float32Codec,
            StorageFormat::Float16 => &Float16Codec,
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFormat::Float32 => f.write_str("float32"),
            StorageFormat::Float16 => f.write_str("float16"),
        }
    }
}

pub trait StorageCodec: Send + Sync {
    fn format(&self) -> StorageFormat;

    fn bytes_per_scalar(&self) -> usize;

    fn encode(&self, src: &[f32], dst: &mut [u8]);

    fn decode(&self, src: &[u8], dst: &mut [f32]);
}

struct Float32Codec;

impl StorageCodec for Float32Codec {
    fn format(&self) -> StorageFormat {
        StorageFormat::Float32
    }

    fn bytes_per_scalar(&self) -> usize {
        4
    }

    fn encode(&self, src: &[f32], dst: &mut [u8]) {
        dst.copy_from_slice(bytemuck::cast_slice(src));
    }

    fn decode(&self, src: &[u8], dst: &mut [f32]) {
        assert_eq!(src.len(), dst.len() * 4, "float32 decode size mismatch");
        for (value, chunk) in dst.iter_mut().zip(src.chunks_exact(4)) {
            *value = bytemuck::pod_read_unaligned(chunk);
        }
    }
}

struct Float16Codec;

impl StorageCodec for Float16Codec {
    fn format(&self) -> StorageFormat {
        StorageFormat::Float16
    }

    fn bytes_per_scalar(&self) -> usize {
        2
    }

    fn encode(&self, src: &[f32], dst: &mut [u8]) {
        assert_eq!(dst.len(), src.len() * 2, "float16 encode size mismatch");
        for (chunk, value) in dst.chunks_exact_mut(2).zip(src) {
            chunk.copy_from_slice(&f32_to_f16_bits(*value).to_ne_bytes());
        }
    }

    fn decode(&self, src: &[u8], dst: &mut [f32]) {
        assert_eq!(src.len(), dst.len() * 2, "float16 decode size mismatch");
        for (value, chunk) in dst.iter_mut().zip(src.chunks_exact(2)) {
            *value = f16_bits_to_f32(bytemuck::pod_read_unaligned(chunk));
        }
    }
}

pub fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x007f_ffff;

    if exp == 0xff {
        return if mant != 0 {
            sign | F16_QUIET_NAN
        } else {
            sign | F16_MAX_BITS
        };
    }

    let half_exp = exp - 127 + 15;
    if half_exp >= 0x1f {
        return sign | F16_MAX_BITS;
    }

    if half_exp <= 0 {
        // Result is subnormal or zero. 2^-25 and below round to zero.
        if half_exp < -10 {
            return sign;
        }
        let m = mant | 0x0080_0000;
        let shift = (14 - half_exp) as u32;
        let mut half_m = m >> shift;
        let rem = m & ((1 << shift) - 1);
        let halfway = 1 << (shift - 1);
        if rem > halfway || (rem == halfway && half_m & 1 == 1) {
            half_m += 1;
        }
        // A carry out of the mantissa lands on the smallest normal, which is
        // the correct encoding.
        return sign | half_m as u16;
    }

    let mut out = ((half_exp as u32) << 10) | (mant >> 13);
    let rem = mant & 0x1fff;
    if rem > 0x1000 || (rem == 0x1000 && out & 1 == 1) {
        out += 1;
    }
    if out >= 0x7c00 {
        return sign | F16_MAX_BITS;
    }
    sign | out as u16
}

pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = ((bits & 0x8000) as u32) << 16;
    let exp = ((bits >> 10) & 0x1f) as u32;
    let mant = (bits & 0x03ff) as u32;
    match exp {
        0 => {
            let magnitude = mant as f32 * F16_SUBNORMAL_UNIT;
            if sign != 0 {
                -magnitude
            } else {
                magnitude
            }
        }
        0x1f => {
            if mant == 0 {
                f32::from_bits(sign | 0x7f80_0000)
            } else {
                f32::from_bits(sign | 0x7fc0_0000 | (mant << 13))
            }
        }
        _ => f32::from_bits(sign | ((exp + 112) << 23) | (mant << 13)),
    }
}

// Shape of a rectangular block of rows in memory. `row_bytes` may exceed the
// packed row size when rows are padded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanarLayout {
    pub width: usize,
    pub height: usize,
    pub row_bytes: usize,
}

impl PlanarLayout {
    pub fn packed(width: usize, height: usize, channels: usize, bytes_per_scalar: usize) -> Self {
        Self {
            width,
            height,
            row_bytes: width * channels * bytes_per_scalar,
        }
    }

    pub(crate) fn required_len(&self, packed_row: usize) -> usize {
        if self.height == 0 {
            0
        } else {
            (self.height - 1) * self.row_bytes + packed_row
        }
    }
}

// Converts interleaved `channels`-wide cells between `f32` and a storage
// format. Size and stride mismatches are invariant violations and panic.
#[derive(Clone, Copy)]
pub struct PrecisionConverter {
    codec: &'static dyn StorageCodec,
    channels: usize,
}

impl fmt::Debug for PrecisionConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecisionConverter")
            .field("format", &self.codec.format())
            .field("channels", &self.channels)
            .finish()
    }
}

impl PrecisionConverter {
    pub fn new(format: StorageFormat, channels: usize) -> Self {
        assert!(channels > 0, "channels must be > 0");
        Self {
            codec: format.codec(),
            channels,
        }
    }

    pub fn format(&self) -> StorageFormat {
        self.codec.format()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn to_storage(&self, values: &[f32], width: usize, height: usize) -> Vec<u8> {
        assert_eq!(
            values.len(),
            width * height * self.channels,
            "value count does not match {width}x{height}x{}",
            self.channels
        );
        let src = PlanarLayout::packed(width, height, self.channels, 4);
        let dst = PlanarLayout::packed(width, height, self.channels, self.codec.bytes_per_scalar());
        let mut out = vec![0u8; dst.row_bytes * height];
        self.encode_rows(bytemuck::cast_slice(values), src, &mut out, dst);
        out
    }

    pub fn from_storage(&self, bytes: &[u8], width: usize, height: usize) -> Vec<f32> {
        let src = PlanarLayout::packed(width, height, self.channels, self.codec.bytes_per_scalar());
        assert_eq!(
            bytes.len(),
            src.row_bytes * height,
            "storage byte count does not match {width}x{height}x{}",
            self.channels
        );
        let dst = PlanarLayout::packed(width, height, self.channels, 4);
        let mut out = vec![0.0f32; width * height * self.channels];
        self.decode_rows(bytes, src, bytemuck::cast_slice_mut(&mut out), dst);
        out
    }

    pub fn encode_rows(&self, src: &[u8], src_layout: PlanarLayout, dst: &mut [u8], dst_layout: PlanarLayout) {
        let row_scalars = self.check_layouts(src_layout, dst_layout);
        let src_row = row_scalars * 4;
        let dst_row = row_scalars * self.codec.bytes_per_scalar();
        assert!(src_layout.row_bytes >= src_row, "source stride shorter than row");
        assert!(dst_layout.row_bytes >= dst_row, "destination stride shorter than row");
        assert!(src.len() >= src_layout.required_len(src_row), "source buffer too small");
        assert!(dst.len() >= dst_layout.required_len(dst_row), "destination buffer too small");
        let mut scratch = vec![0.0f32; row_scalars];
        for y in 0..src_layout.height {
            let src_start = y * src_layout.row_bytes;
            let dst_start = y * dst_layout.row_bytes;
            Float32Codec.decode(&src[src_start..src_start + src_row], &mut scratch);
            self.codec
                .encode(&scratch, &mut dst[dst_start..dst_start + dst_row]);
        }
    }

    pub fn decode_rows(&self, src: &[u8], src_layout: PlanarLayout, dst: &mut [u8], dst_layout: PlanarLayout) {
        let row_scalars = self.check_layouts(src_layout, dst_layout);
        let src_row = row_scalars * self.codec.bytes_per_scalar();
        let dst_row = row_scalars * 4;
        assert!(src_layout.row_bytes >= src_row, "source stride shorter than row");
        assert!(dst_layout.row_bytes >= dst_row, "destination stride shorter than row");
        assert!(src.len() >= src_layout.required_len(src_row), "source buffer too small");
        assert!(dst.len() >= dst_layout.required_len(dst_row), "destination buffer too small");
        let mut scratch = vec![0.0f32; row_scalars];
        for y in 0..src_layout.height {
            let src_start = y * src_layout.row_bytes;
            let dst_start = y * dst_layout.row_bytes;
            self.codec
                .decode(&src[src_start..src_start + src_row], &mut scratch);
            Float32Codec.encode(&scratch, &mut dst[dst_start..dst_start + dst_row]);
        }
    }

    fn check_layouts(&self, src: PlanarLayout, dst: PlanarLayout) -> usize {
        assert_eq!(
            (src.width, src.height),
            (dst.width, dst.height),
            "conversion layouts disagree on extent"
        );
        src.width * self.channels
    }
}
