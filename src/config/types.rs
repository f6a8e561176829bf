use crate::component::contact_sheet_generator::{
    ContactSheetOptions, DEFAULT_MAX_THUMBNAIL_WIDTH, PipelineConfig,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MAX_RECENT_PATHS: usize = 10;

/// 預覽圖設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSheetSettings {
    /// 縮圖最大寬度
    pub max_thumbnail_width: u32,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// 合成後是否刪除暫存目錄
    pub clean_workspace: bool,
    /// 預覽圖輸出資料夾，未設定時輸出到影片所在資料夾
    pub output_directory: Option<PathBuf>,
}

impl Default for ContactSheetSettings {
    fn default() -> Self {
        Self {
            max_thumbnail_width: DEFAULT_MAX_THUMBNAIL_WIDTH,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            clean_workspace: true,
            output_directory: None,
        }
    }
}

impl ContactSheetSettings {
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_thumbnail_width: self.max_thumbnail_width,
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffprobe_path: self.ffprobe_path.clone(),
        }
    }

    #[must_use]
    pub fn options(&self, generate: bool) -> ContactSheetOptions {
        ContactSheetOptions {
            generate,
            clean_workspace: self.clean_workspace,
            frame_count: None,
        }
    }
}

/// 使用者設定（settings.json）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub recent_paths: Vec<String>,
    pub contact_sheet: ContactSheetSettings,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}
