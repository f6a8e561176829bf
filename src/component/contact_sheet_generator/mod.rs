//! 影片預覽圖生成元件
//!
//! 流程：
//! A. 取得影片資訊（ffprobe）
//! B. 依寬高比選取網格並計算縮圖尺寸
//! C. 重建工作目錄並擷取縮圖（ffmpeg）
//! D. 讀取縮圖並依索引排序
//! E. 合成為附標題的預覽圖（PNG）

mod composer;
mod error;
mod frame_extractor;
mod frame_naming;
mod frame_reader;
mod geometry;
mod grid_layout;
mod main;
mod pipeline;
mod workspace;

pub use composer::{
    ComposedSheet, CompositionError, ContactSheetComposer, ContactSheetInfo, resolution_label,
};
pub use error::{ContactSheetError, PipelineError, PipelineStage};
pub use frame_extractor::{
    CaptureEvent, CaptureRequest, ExtractionError, FfmpegCaptureEngine, FrameCaptureEngine,
    capture_timestamps, extract_frames,
};
pub use frame_naming::{
    FRAME_FILE_PATTERN, FRAME_NAME_VERSION, ParsedFrameName, frame_file_name, parse_frame_name,
    render_frame_name,
};
pub use frame_reader::{FrameFile, read_frames};
pub use geometry::{
    DEFAULT_MAX_THUMBNAIL_WIDTH, GUTTER, HEADER_HEIGHT, ThumbnailGeometry, calculate_geometry,
};
pub use grid_layout::{GridSpec, select_grid};
pub use main::{ContactSheetGenerator, GenerationMode};
pub use pipeline::{ContactSheet, ContactSheetOptions, ContactSheetPipeline, PipelineConfig};
pub use workspace::{
    WORKSPACE_SUFFIX, WorkspaceError, WorkspaceLease, WorkspaceLocks, ensure_clean,
    ensure_reserved, remove as remove_workspace, workspace_path_for,
};
