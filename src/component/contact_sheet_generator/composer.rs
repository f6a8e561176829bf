use super::frame_reader::FrameFile;
use super::geometry::ThumbnailGeometry;
use super::grid_layout::GridSpec;
use crate::tools::{VideoMetadata, format_duration, format_size};
use ab_glyph::{FontRef, InvalidFont, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// 編譯時嵌入的字型
const FONT_DATA: &[u8] = include_bytes!("../../data/DejaVuSans-Bold.ttf");

const BACKGROUND: Rgba<u8> = Rgba([0x34, 0x2c, 0x37, 0xff]);
const TEXT_COLOR: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const BADGE_COLOR: Rgba<u8> = Rgba([0xd8, 0x1b, 0x7a, 0xff]);

const BADGE_WIDTH: u32 = 180;
const BADGE_HEIGHT: u32 = 40;

const FILENAME_FONT_SIZE: f32 = 40.0;
const META_FONT_SIZE: f32 = 26.0;
const RESOLUTION_FONT_SIZE: f32 = 30.0;
const BADGE_FONT_SIZE: f32 = 30.0;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("無法載入字型: {0}")]
    Font(#[from] InvalidFont),
    #[error("無法解碼第 {index} 張縮圖: {source}")]
    Decode {
        index: u32,
        #[source]
        source: ImageError,
    },
    #[error("無法編碼預覽圖: {0}")]
    Encode(#[source] ImageError),
}

/// 預覽圖的描述資訊（交給後續儲存使用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSheetInfo {
    /// 不含副檔名的檔名
    pub filename: String,
    pub metadata: VideoMetadata,
    pub grid: GridSpec,
    pub geometry: ThumbnailGeometry,
    /// 請求擷取的張數
    pub frame_count: u32,
    /// 實際繪製的張數
    pub frames_drawn: u32,
}

/// 合成結果
#[derive(Debug)]
pub struct ComposedSheet {
    pub png: Vec<u8>,
    pub frames_drawn: u32,
}

/// 預覽圖合成器
pub struct ContactSheetComposer {
    font: FontRef<'static>,
}

impl ContactSheetComposer {
    pub fn new() -> Result<Self, CompositionError> {
        Ok(Self {
            font: FontRef::try_from_slice(FONT_DATA)?,
        })
    }

    /// 繪製預覽圖並編碼為 PNG
    ///
    /// 縮圖依 `sequence_index` 放入對應格子，缺少的格子留白
    pub fn compose(
        &self,
        info: &ContactSheetInfo,
        frames: &[FrameFile],
    ) -> Result<ComposedSheet, CompositionError> {
        let geometry = &info.geometry;
        let grid = info.grid;

        let mut canvas =
            RgbaImage::from_pixel(geometry.canvas_width, geometry.canvas_height, BACKGROUND);
        self.draw_header(&mut canvas, info);

        let mut cells: HashMap<u32, &FrameFile> = HashMap::with_capacity(frames.len());
        for frame in frames {
            if frame.sequence_index >= grid.cell_count() {
                warn!("縮圖索引超出網格範圍，略過: {}", frame.sequence_index);
                continue;
            }
            cells.entry(frame.sequence_index).or_insert(frame);
        }

        let mut frames_drawn = 0;
        for i in 0..grid.rows {
            for j in 0..grid.columns {
                let index = i * grid.columns + j;
                let Some(frame) = cells.get(&index) else {
                    continue;
                };

                let x = j * (geometry.thumb_width + geometry.gutter);
                let y = geometry.header_height
                    + (index / grid.columns) * (geometry.thumb_height + geometry.gutter);

                let thumbnail = decode_thumbnail(frame, geometry)?;
                imageops::overlay(&mut canvas, &thumbnail, i64::from(x), i64::from(y));
                self.draw_badge(&mut canvas, x, y, geometry, &frame.timestamp_label);
                frames_drawn += 1;
            }
        }

        debug!(
            "合成預覽圖 {}x{}，繪製 {} 張縮圖",
            geometry.canvas_width, geometry.canvas_height, frames_drawn
        );

        Ok(ComposedSheet {
            png: encode_png(canvas)?,
            frames_drawn,
        })
    }

    fn draw_header(&self, canvas: &mut RgbaImage, info: &ContactSheetInfo) {
        let width = info.geometry.canvas_width as i32;
        let metadata = &info.metadata;

        draw_text_mut(
            canvas,
            TEXT_COLOR,
            12,
            16,
            PxScale::from(FILENAME_FONT_SIZE),
            &self.font,
            &info.filename,
        );
        draw_text_mut(
            canvas,
            TEXT_COLOR,
            width - 160,
            6,
            PxScale::from(META_FONT_SIZE),
            &self.font,
            &format_duration(metadata.duration_seconds),
        );
        draw_text_mut(
            canvas,
            TEXT_COLOR,
            width - 160,
            44,
            PxScale::from(META_FONT_SIZE),
            &self.font,
            &format_size(metadata.byte_size),
        );
        draw_text_mut(
            canvas,
            TEXT_COLOR,
            width - 400,
            4,
            PxScale::from(RESOLUTION_FONT_SIZE),
            &self.font,
            &resolution_label(metadata.width, metadata.height),
        );
    }

    /// 縮圖右下角的時間標籤
    fn draw_badge(
        &self,
        canvas: &mut RgbaImage,
        x: u32,
        y: u32,
        geometry: &ThumbnailGeometry,
        label: &str,
    ) {
        let badge_width = BADGE_WIDTH.min(geometry.thumb_width);
        let badge_height = BADGE_HEIGHT.min(geometry.thumb_height);
        let badge_x = (x + geometry.thumb_width - badge_width) as i32;
        let badge_y = (y + geometry.thumb_height - badge_height) as i32;

        draw_filled_rect_mut(
            canvas,
            Rect::at(badge_x, badge_y).of_size(badge_width, badge_height),
            BADGE_COLOR,
        );

        let scale = PxScale::from(BADGE_FONT_SIZE);
        let (text_width, text_height) = text_size(scale, &self.font, label);
        let text_x = badge_x + (badge_width as i32 - text_width as i32) / 2;
        let text_y = badge_y + (badge_height as i32 - text_height as i32) / 2;
        draw_text_mut(canvas, TEXT_COLOR, text_x, text_y, scale, &self.font, label);
    }
}

/// 解析度標籤，例如 `1920×1080`
#[must_use]
pub fn resolution_label(width: u32, height: u32) -> String {
    format!("{width}×{height}")
}

fn decode_thumbnail(
    frame: &FrameFile,
    geometry: &ThumbnailGeometry,
) -> Result<RgbaImage, CompositionError> {
    let image = image::load_from_memory(&frame.bytes).map_err(|source| {
        CompositionError::Decode {
            index: frame.sequence_index,
            source,
        }
    })?;

    let image = if image.width() == geometry.thumb_width && image.height() == geometry.thumb_height
    {
        image
    } else {
        image.resize_exact(
            geometry.thumb_width,
            geometry.thumb_height,
            FilterType::Triangle,
        )
    };

    Ok(image.to_rgba8())
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>, CompositionError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(CompositionError::Encode)?;
    Ok(bytes)
}
