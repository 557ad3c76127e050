//! # Strip Splitting
//!
//! Splits a monochrome bitmap into height-bounded horizontal strips so
//! the printer's limited internal buffer is never overrun by one write.
//!
//! ## Algorithm
//!
//! From `top = 0`, repeatedly take `min(strip_rows, remaining)` rows until
//! `top` reaches the bitmap height. For any `height ≥ 1` and
//! `strip_rows ≥ 1`:
//!
//! - strip heights sum exactly to the bitmap height
//! - the final strip's height is `height % strip_rows` when nonzero,
//!   else `strip_rows`
//! - strip count is `ceil(height / strip_rows)`
//!
//! Extraction is strictly sequential: each strip reads from the same
//! source and strip order must match transmission order.

use std::path::{Path, PathBuf};

use crate::error::PapershotError;
use crate::render::MonoBitmap;

/// One height-bounded horizontal band of the full bitmap.
#[derive(Debug, Clone)]
pub struct Strip {
    /// Position in transmission order, starting at 0
    pub index: usize,

    /// First row of this strip within the full bitmap
    pub top: u32,

    /// Rows in this strip (≤ the configured maximum)
    pub height: u32,

    /// The strip's pixel data
    pub bitmap: MonoBitmap,

    /// Spooled artifact, when persisted via [`split_to_files`]
    pub path: Option<PathBuf>,
}

/// Split `bitmap` into strips of at most `strip_rows` rows.
///
/// ## Errors
///
/// `EmptyBitmap` for a zero-width or zero-height bitmap, `NoStrips` if
/// splitting produced nothing, and `Config` for `strip_rows == 0`.
pub fn split(bitmap: &MonoBitmap, strip_rows: u32) -> Result<Vec<Strip>, PapershotError> {
    if strip_rows == 0 {
        return Err(PapershotError::Config(
            "strip_rows must be at least 1".to_string(),
        ));
    }
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(PapershotError::EmptyBitmap {
            width: bitmap.width(),
            height: bitmap.height(),
        });
    }

    let mut strips = Vec::with_capacity((bitmap.height() as usize).div_ceil(strip_rows as usize));
    let mut top = 0;
    while top < bitmap.height() {
        let height = strip_rows.min(bitmap.height() - top);
        strips.push(Strip {
            index: strips.len(),
            top,
            height,
            bitmap: bitmap.crop_rows(top, height),
            path: None,
        });
        top += height;
    }

    if strips.is_empty() {
        return Err(PapershotError::NoStrips);
    }
    log::debug!(
        "split {}x{} bitmap into {} strips of ≤{} rows",
        bitmap.width(),
        bitmap.height(),
        strips.len(),
        strip_rows
    );
    Ok(strips)
}

/// Split and spool each strip as `<stem>_<top>.png` next to the processed
/// bitmap, recording the path on the strip.
pub fn split_to_files(
    bitmap: &MonoBitmap,
    strip_rows: u32,
    spool_path: &Path,
) -> Result<Vec<Strip>, PapershotError> {
    let mut strips = split(bitmap, strip_rows)?;
    let stem = spool_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string());
    let dir = spool_path.parent().unwrap_or_else(|| Path::new("."));

    for strip in &mut strips {
        let path = dir.join(format!("{}_{}.png", stem, strip.top));
        strip.bitmap.save_png(&path)?;
        strip.path = Some(path);
    }
    Ok(strips)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_100_rows_at_24() {
        let strips = split(&MonoBitmap::new(512, 100), 24).unwrap();
        let heights: Vec<u32> = strips.iter().map(|s| s.height).collect();
        let tops: Vec<u32> = strips.iter().map(|s| s.top).collect();
        assert_eq!(heights, vec![24, 24, 24, 24, 4]);
        assert_eq!(tops, vec![0, 24, 48, 72, 96]);
    }

    #[test]
    fn test_heights_sum_and_count() {
        for (height, strip_rows) in [(1, 1), (1, 24), (24, 24), (25, 24), (48, 24), (1000, 7)] {
            let strips = split(&MonoBitmap::new(8, height), strip_rows).unwrap();
            let sum: u32 = strips.iter().map(|s| s.height).sum();
            assert_eq!(sum, height, "heights must sum to {}", height);
            assert_eq!(
                strips.len(),
                (height as usize).div_ceil(strip_rows as usize),
                "count must be ceil({}/{})",
                height,
                strip_rows
            );
        }
    }

    #[test]
    fn test_last_strip_height_rule() {
        // height % strip_rows nonzero -> remainder
        let strips = split(&MonoBitmap::new(8, 50), 24).unwrap();
        assert_eq!(strips.last().unwrap().height, 2);
        // height % strip_rows == 0 -> full strip_rows
        let strips = split(&MonoBitmap::new(8, 48), 24).unwrap();
        assert_eq!(strips.last().unwrap().height, 24);
    }

    #[test]
    fn test_tops_strictly_increase() {
        let strips = split(&MonoBitmap::new(8, 100), 7).unwrap();
        for pair in strips.windows(2) {
            assert!(pair[1].top > pair[0].top);
            assert_eq!(pair[1].top, pair[0].top + pair[0].height);
        }
        for (i, strip) in strips.iter().enumerate() {
            assert_eq!(strip.index, i);
        }
    }

    #[test]
    fn test_strip_carries_its_rows() {
        let mut bitmap = MonoBitmap::new(8, 48);
        bitmap.set(3, 30, true);
        let strips = split(&bitmap, 24).unwrap();
        assert!(!strips[0].bitmap.get(3, 6));
        assert!(strips[1].bitmap.get(3, 6)); // row 30 = strip 1, local row 6
    }

    #[test]
    fn test_zero_height_is_empty_bitmap_error() {
        let err = split(&MonoBitmap::new(8, 0), 24).unwrap_err();
        assert!(matches!(
            err,
            PapershotError::EmptyBitmap { width: 8, height: 0 }
        ));
    }

    #[test]
    fn test_zero_width_is_empty_bitmap_error() {
        let err = split(&MonoBitmap::new(0, 10), 24).unwrap_err();
        assert!(matches!(
            err,
            PapershotError::EmptyBitmap { width: 0, height: 10 }
        ));
    }

    #[test]
    fn test_zero_strip_rows_is_config_error() {
        let err = split(&MonoBitmap::new(8, 10), 0).unwrap_err();
        assert!(matches!(err, PapershotError::Config(_)));
    }

    #[test]
    fn test_split_to_files_spools_each_strip() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("job-test.png");
        let strips = split_to_files(&MonoBitmap::new(16, 50), 24, &spool).unwrap();

        assert_eq!(strips.len(), 3);
        for strip in &strips {
            let path = strip.path.as_ref().unwrap();
            assert!(path.exists());
            assert_eq!(
                path.file_name().unwrap().to_string_lossy(),
                format!("job-test_{}.png", strip.top)
            );
            let loaded = MonoBitmap::load_png(path).unwrap();
            assert_eq!(loaded.height(), strip.height);
        }
    }
}
