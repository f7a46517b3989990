//! Planar YUV to interleaved RGB conversion.
//!
//! The camera planes are first packed into NV21 (full Y plane followed by
//! interleaved V/U pairs), then expanded to RGB with full-range BT.601
//! coefficients, the same range JPEG/JFIF uses.

use super::EncodingError;
use crate::capture::{Plane, RawFrame};

/// Packs the frame's three planes into an NV21 buffer.
pub fn to_nv21(frame: &RawFrame) -> Result<Vec<u8>, EncodingError> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    if width == 0 || height == 0 {
        return Err(EncodingError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        });
    }
    let chroma_w = width.div_ceil(2);
    let chroma_h = height.div_ceil(2);

    check_plane("Y", frame.y_plane(), width, height)?;
    check_plane("U", frame.u_plane(), chroma_w, chroma_h)?;
    check_plane("V", frame.v_plane(), chroma_w, chroma_h)?;

    let mut nv21 = Vec::with_capacity(width * height + 2 * chroma_w * chroma_h);
    let y = frame.y_plane();
    for row in 0..height {
        nv21.extend((0..width).map(|col| y.sample(col, row)));
    }

    let (u, v) = (frame.u_plane(), frame.v_plane());
    for row in 0..chroma_h {
        for col in 0..chroma_w {
            nv21.push(v.sample(col, row));
            nv21.push(u.sample(col, row));
        }
    }

    Ok(nv21)
}

/// Expands an NV21 buffer into packed 8-bit RGB.
pub fn nv21_to_rgb(nv21: &[u8], width: usize, height: usize) -> Result<Vec<u8>, EncodingError> {
    let chroma_w = width.div_ceil(2);
    let chroma_h = height.div_ceil(2);
    let expected = width * height + 2 * chroma_w * chroma_h;
    if nv21.len() < expected {
        return Err(EncodingError::PlaneTooShort {
            plane: "NV21",
            expected,
            actual: nv21.len(),
        });
    }

    let (luma, vu) = nv21.split_at(width * height);
    let mut rgb = Vec::with_capacity(width * height * 3);

    for row in 0..height {
        let vu_row = (row / 2) * chroma_w * 2;
        for col in 0..width {
            let idx = vu_row + (col / 2) * 2;
            let (r, g, b) = ycbcr_to_rgb(luma[row * width + col], vu[idx + 1], vu[idx]);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    Ok(rgb)
}

/// Full-range BT.601 conversion of a single sample.
#[inline]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let cb = cb as f32 - 128.0;
    let cr = cr as f32 - 128.0;

    let r = y + 1.402 * cr;
    let g = y - 0.344_136 * cb - 0.714_136 * cr;
    let b = y + 1.772 * cb;

    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn check_plane(
    name: &'static str,
    plane: &Plane,
    cols: usize,
    rows: usize,
) -> Result<(), EncodingError> {
    let expected = plane
        .required_len(cols, rows)
        .ok_or(EncodingError::StrideOverflow { plane: name })?;
    if plane.data().len() < expected {
        return Err(EncodingError::PlaneTooShort {
            plane: name,
            expected,
            actual: plane.data().len(),
        });
    }
    Ok(())
}
