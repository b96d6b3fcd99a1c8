//! Page slicing and pagination parameter normalization.
//!
//! Untrusted `page`/`limit` values never produce an error: anything unusable
//! falls back to the defaults and oversized limits are clamped.

use album_types::{PaginatedPhotos, PaginationMeta, PaginationParams, Photo};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 12;
pub const MAX_LIMIT: u32 = 50;

/// A raw pagination value as it arrived from the outside world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawParam<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
}

impl<'a> From<&'a str> for RawParam<'a> {
    fn from(s: &'a str) -> Self {
        RawParam::Text(s)
    }
}

impl From<i64> for RawParam<'_> {
    fn from(n: i64) -> Self {
        RawParam::Int(n)
    }
}

impl From<u32> for RawParam<'_> {
    fn from(n: u32) -> Self {
        RawParam::Int(i64::from(n))
    }
}

impl From<f64> for RawParam<'_> {
    fn from(n: f64) -> Self {
        RawParam::Float(n)
    }
}

impl RawParam<'_> {
    /// Integer value, if the input denotes one.
    fn as_integer(&self) -> Option<i64> {
        match *self {
            RawParam::Text(s) => parse_integer(s),
            RawParam::Int(n) => Some(n),
            RawParam::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    // `as` saturates at the i64 bounds
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }
}

/// Parse an optionally signed decimal integer. Digit strings too large for
/// an i64 saturate instead of being treated as garbage.
fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match s.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) if negative => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Normalize untrusted page/limit input into safe bounds.
pub fn normalize(page: Option<RawParam<'_>>, limit: Option<RawParam<'_>>) -> PaginationParams {
    let page = match page.and_then(|p| p.as_integer()) {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => DEFAULT_PAGE,
    };

    let limit = match limit.and_then(|l| l.as_integer()) {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX).min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    };

    PaginationParams { page, limit }
}

/// Convenience wrapper for query-string values.
pub fn normalize_query(page: Option<&str>, limit: Option<&str>) -> PaginationParams {
    normalize(page.map(RawParam::Text), limit.map(RawParam::Text))
}

/// Slice one page out of the catalog and describe it.
pub fn paginate(params: PaginationParams, photos: &[Photo]) -> PaginatedPhotos {
    let page = params.page.max(1);
    let limit = params.limit.max(1) as usize;
    let total = photos.len();
    let total_pages = total.div_ceil(limit);

    let offset = (page as usize - 1).saturating_mul(limit);
    let slice = photos
        .get(offset..)
        .map(|rest| &rest[..rest.len().min(limit)])
        .unwrap_or(&[]);

    PaginatedPhotos {
        photos: slice.to_vec(),
        pagination: PaginationMeta {
            page,
            limit: limit as u32,
            total,
            total_pages,
            has_more: (page as usize) < total_pages,
            has_previous: page > 1,
        },
    }
}
