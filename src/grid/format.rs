// src/grid/format.rs
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{ConvertError, Result};
use super::extent::Extent;

/// Size of the fixed grid header: two i32 dimensions and four f32 bounds.
pub const HEADER_LEN: usize = 24;

const SAMPLE_LEN: usize = std::mem::size_of::<f32>();

/// Header of a SARndbox grid file.
///
/// `x_min`/`y_max` hold the raster's upper-left corner and `x_max`/`y_min` the
/// lower-right corner. There is no CRS, the extent alone anchors the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    pub cols: i32,
    pub rows: i32,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl GridHeader {
    pub fn new(cols: usize, rows: usize, extent: &Extent) -> Result<Self> {
        let invalid = || ConvertError::InvalidDimensions { cols: cols as i64, rows: rows as i64 };
        let cols = i32::try_from(cols).map_err(|_| invalid())?;
        let rows = i32::try_from(rows).map_err(|_| invalid())?;

        let header = Self {
            cols,
            rows,
            x_min: extent.x_min as f32,
            y_min: extent.y_min as f32,
            x_max: extent.x_max as f32,
            y_max: extent.y_max as f32,
        };
        header.sample_count()?;
        Ok(header)
    }

    /// Number of payload samples (`cols * rows`), rejecting non-positive or overflowing dimensions.
    pub fn sample_count(&self) -> Result<usize> {
        let invalid = || ConvertError::InvalidDimensions { cols: self.cols as i64, rows: self.rows as i64 };
        if self.cols <= 0 || self.rows <= 0 {
            return Err(invalid());
        }
        (self.cols as usize)
            .checked_mul(self.rows as usize)
            .filter(|n| n.checked_mul(SAMPLE_LEN).and_then(|b| b.checked_add(HEADER_LEN)).is_some())
            .ok_or_else(invalid)
    }

    /// Total size in bytes of a grid file carrying this header.
    pub fn expected_file_len(&self) -> Result<usize> {
        Ok(HEADER_LEN + self.sample_count()? * SAMPLE_LEN)
    }

    pub fn extent(&self) -> Extent {
        Extent {
            x_min: self.x_min as f64,
            y_min: self.y_min as f64,
            x_max: self.x_max as f64,
            y_max: self.y_max as f64,
        }
    }
}

/// A decoded grid file: header plus row-major elevation samples.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFile {
    pub header: GridHeader,
    pub payload: Vec<f32>,
}

impl GridFile {
    pub fn new(header: GridHeader, payload: Vec<f32>) -> Result<Self> {
        check_payload_len(&header, &payload)?;
        Ok(Self { header, payload })
    }

    pub fn encode(&self) -> Result<Bytes> {
        encode(&self.header, &self.payload)
    }

    pub fn cols(&self) -> usize {
        self.header.cols as usize
    }

    pub fn rows(&self) -> usize {
        self.header.rows as usize
    }
}

fn check_payload_len(header: &GridHeader, payload: &[f32]) -> Result<()> {
    if payload.len() != header.sample_count()? {
        return Err(ConvertError::SizeMismatch {
            cols: header.cols,
            rows: header.rows,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Serialize header and payload. All fields are little-endian regardless of host.
pub fn encode(header: &GridHeader, payload: &[f32]) -> Result<Bytes> {
    check_payload_len(header, payload)?;

    let mut buf = BytesMut::with_capacity(header.expected_file_len()?);
    buf.put_i32_le(header.cols);
    buf.put_i32_le(header.rows);
    buf.put_f32_le(header.x_min);
    buf.put_f32_le(header.y_min);
    buf.put_f32_le(header.x_max);
    buf.put_f32_le(header.y_max);
    for &v in payload {
        buf.put_f32_le(v);
    }

    Ok(buf.freeze())
}

pub fn decode(data: &[u8]) -> Result<GridFile> {
    if data.len() < HEADER_LEN {
        return Err(ConvertError::TruncatedHeader(data.len()));
    }

    let mut buf = data;
    let header = GridHeader {
        cols: buf.get_i32_le(),
        rows: buf.get_i32_le(),
        x_min: buf.get_f32_le(),
        y_min: buf.get_f32_le(),
        x_max: buf.get_f32_le(),
        y_max: buf.get_f32_le(),
    };

    let n = header.sample_count()?;
    let expected = n * SAMPLE_LEN;
    let available = buf.remaining();
    if available % SAMPLE_LEN != 0 || available < expected {
        return Err(ConvertError::TruncatedPayload { available, expected });
    }
    if available > expected {
        warn!("ignoring {} trailing bytes after grid payload", available - expected);
    }

    let mut payload = Vec::with_capacity(n);
    for _ in 0..n {
        payload.push(buf.get_f32_le());
    }

    Ok(GridFile { header, payload })
}
