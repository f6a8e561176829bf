use super::grid_layout::GridSpec;
use crate::tools::ProbeError;
use serde::Serialize;

/// 縮圖預設最大寬度
pub const DEFAULT_MAX_THUMBNAIL_WIDTH: u32 = 640;
/// 標題列高度
pub const HEADER_HEIGHT: u32 = 80;
/// 縮圖間距
pub const GUTTER: u32 = 10;

/// 縮圖與畫布尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbnailGeometry {
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub header_height: u32,
    pub gutter: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl ThumbnailGeometry {
    /// 擷取引擎使用的尺寸字串 `WxH`
    #[must_use]
    pub fn size_string(&self) -> String {
        format!("{}x{}", self.thumb_width, self.thumb_height)
    }
}

/// 計算縮圖尺寸與畫布大小
///
/// 縮圖寬度不超過原始寬度（不放大），高度無條件進位
pub fn calculate_geometry(
    width: u32,
    height: u32,
    max_width: u32,
    grid: GridSpec,
) -> Result<ThumbnailGeometry, ProbeError> {
    if width == 0 || height == 0 {
        return Err(ProbeError::InvalidDimensions { width, height });
    }

    let thumb_width = max_width.max(1).min(width);
    let thumb_height = (u64::from(thumb_width) * u64::from(height)).div_ceil(u64::from(width));
    let invalid = || ProbeError::InvalidDimensions { width, height };
    let thumb_height = u32::try_from(thumb_height).map_err(|_| invalid())?;

    let columns = u64::from(grid.columns);
    let rows = u64::from(grid.rows);
    let gutter = u64::from(GUTTER);
    let canvas_width = columns * u64::from(thumb_width) + gutter * (columns + 1);
    let canvas_height =
        rows * u64::from(thumb_height) + u64::from(HEADER_HEIGHT) + gutter * (rows + 1);
    let canvas_width = u32::try_from(canvas_width).map_err(|_| invalid())?;
    let canvas_height = u32::try_from(canvas_height).map_err(|_| invalid())?;

    Ok(ThumbnailGeometry {
        thumb_width,
        thumb_height,
        header_height: HEADER_HEIGHT,
        gutter: GUTTER,
        canvas_width,
        canvas_height,
    })
}
