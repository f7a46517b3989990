//! Raw camera frame with planar YUV 4:2:0 buffers.
//!
//! A [`RawFrame`] is lent to the pipeline by the camera. Whoever holds it
//! last releases it: the release hook runs exactly once, when the frame is
//! closed or dropped, on every path.

use std::time::Instant;

/// Callback returning a frame buffer to its owner.
pub type ReleaseHook = Box<dyn FnOnce() + Send + 'static>;

/// One plane of a planar image.
#[derive(Clone)]
pub struct Plane {
    data: Vec<u8>,
    row_stride: usize,
    pixel_stride: usize,
}

impl Plane {
    /// Creates a plane with explicit strides.
    pub fn new(data: Vec<u8>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride: pixel_stride.max(1),
        }
    }

    /// Creates a tightly packed plane (`pixel_stride == 1`).
    pub fn packed(data: Vec<u8>, width: usize) -> Self {
        Self::new(data, width, 1)
    }

    /// Returns the raw plane bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Distance in bytes between the starts of two consecutive rows.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Distance in bytes between two horizontally adjacent samples.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Bytes needed to address a `cols` x `rows` sample grid, or `None`
    /// if the strides overflow the address space.
    pub fn required_len(&self, cols: usize, rows: usize) -> Option<usize> {
        if cols == 0 || rows == 0 {
            return Some(0);
        }
        let last_row = (rows - 1).checked_mul(self.row_stride)?;
        let last_col = (cols - 1).checked_mul(self.pixel_stride)?;
        last_row.checked_add(last_col)?.checked_add(1)
    }

    /// Returns the sample at column `x`, row `y`.
    ///
    /// Callers check bounds once with [`Plane::required_len`].
    #[inline]
    pub(crate) fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.row_stride + x * self.pixel_stride]
    }
}

/// A single camera frame in YUV 4:2:0 layout.
///
/// Owns the release hook of the underlying camera buffer. The hook fires
/// once when the frame is [closed](RawFrame::close) or dropped, whichever
/// comes first.
pub struct RawFrame {
    y: Plane,
    u: Plane,
    v: Plane,
    width: u32,
    height: u32,
    timestamp: Instant,
    sequence: u64,
    release: Option<ReleaseHook>,
}

impl RawFrame {
    /// Creates a new frame from its three planes.
    pub fn new(y: Plane, u: Plane, v: Plane, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            y,
            u,
            v,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
            release: None,
        }
    }

    /// Creates a frame from a contiguous I420 buffer (Y, then U, then V).
    ///
    /// Short buffers are accepted; the missing tail surfaces as an
    /// encoding error later.
    pub fn from_i420(data: &[u8], width: u32, height: u32, sequence: u64) -> Self {
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);

        let y_end = (w * h).min(data.len());
        let u_end = (y_end + cw * ch).min(data.len());
        let v_end = (u_end + cw * ch).min(data.len());

        Self::new(
            Plane::packed(data[..y_end].to_vec(), w),
            Plane::packed(data[y_end..u_end].to_vec(), cw),
            Plane::packed(data[u_end..v_end].to_vec(), cw),
            width,
            height,
            sequence,
        )
    }

    /// Attaches the hook that returns the buffer to the camera.
    pub fn with_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    /// Luminance plane.
    #[inline]
    pub fn y_plane(&self) -> &Plane {
        &self.y
    }

    /// Blue-difference chroma plane.
    #[inline]
    pub fn u_plane(&self) -> &Plane {
        &self.u
    }

    /// Red-difference chroma plane.
    #[inline]
    pub fn v_plane(&self) -> &Plane {
        &self.v
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the buffer to the camera.
    pub fn close(mut self) {
        self.release_buffer();
    }

    fn release_buffer(&mut self) {
        if let Some(hook) = self.release.take() {
            hook();
        }
    }
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        self.release_buffer();
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("y_bytes", &self.y.data.len())
            .field("u_bytes", &self.u.data.len())
            .field("v_bytes", &self.v.data.len())
            .field("releasable", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_frame(counter: &Arc<AtomicUsize>) -> RawFrame {
        let counter = Arc::clone(counter);
        RawFrame::from_i420(&[0u8; 6], 2, 2, 1).with_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_from_i420_splits_planes() {
        let data: Vec<u8> = (0..24).collect();
        let frame = RawFrame::from_i420(&data, 4, 4, 7);

        assert_eq!(frame.y_plane().data().len(), 16);
        assert_eq!(frame.u_plane().data(), &[16, 17, 18, 19]);
        assert_eq!(frame.v_plane().data(), &[20, 21, 22, 23]);
        assert_eq!(frame.sequence(), 7);
    }

    #[test]
    fn test_from_i420_short_buffer() {
        let frame = RawFrame::from_i420(&[1, 2, 3], 4, 4, 1);
        assert_eq!(frame.y_plane().data().len(), 3);
        assert!(frame.u_plane().data().is_empty());
        assert!(frame.v_plane().data().is_empty());
    }

    #[test]
    fn test_close_releases_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        counting_frame(&counter).close();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let _frame = counting_frame(&counter);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plane_required_len() {
        let plane = Plane::new(vec![0; 64], 16, 2);
        assert_eq!(plane.required_len(4, 3), Some(2 * 16 + 3 * 2 + 1));
        assert_eq!(plane.required_len(0, 3), Some(0));
    }
}
