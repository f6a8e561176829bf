use super::composer::{ContactSheetComposer, ContactSheetInfo};
use super::error::{ContactSheetError, PipelineError, PipelineStage};
use super::frame_extractor::{
    CaptureRequest, FfmpegCaptureEngine, FrameCaptureEngine, extract_frames,
};
use super::frame_naming::FRAME_FILE_PATTERN;
use super::frame_reader::read_frames;
use super::geometry::{DEFAULT_MAX_THUMBNAIL_WIDTH, calculate_geometry};
use super::grid_layout::select_grid;
use super::workspace::{self, WorkspaceLocks};
use crate::tools::{FfprobeInspector, MediaInspector, probe_metadata};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 流程設定，由呼叫端明確傳入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_thumbnail_width: u32,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_thumbnail_width: DEFAULT_MAX_THUMBNAIL_WIDTH,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// 單次執行的選項
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSheetOptions {
    /// 為 false 時直接讀取既有的工作目錄
    pub generate: bool,
    /// 合成成功後刪除工作目錄
    pub clean_workspace: bool,
    /// 擷取張數，預設為網格格數（超過時以格數為上限）
    pub frame_count: Option<u32>,
}

impl Default for ContactSheetOptions {
    fn default() -> Self {
        Self {
            generate: true,
            clean_workspace: true,
            frame_count: None,
        }
    }
}

/// 完成的預覽圖
#[derive(Debug, Clone)]
pub struct ContactSheet {
    pub png: Vec<u8>,
    pub info: ContactSheetInfo,
}

impl ContactSheet {
    /// `data:image/png;base64,...`
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

type StageObserver = Box<dyn Fn(PipelineStage) + Send + Sync>;

/// 影片預覽圖流程
///
/// Probing → LayoutReady →
/// [Generating → Extracting → Reading → Composing → Cleaning] 或
/// [ReadingExisting → Composing] → Done，任一步失敗即進入 Failed
pub struct ContactSheetPipeline {
    config: PipelineConfig,
    inspector: Box<dyn MediaInspector>,
    engine: Box<dyn FrameCaptureEngine>,
    locks: WorkspaceLocks,
    observer: Option<StageObserver>,
}

impl ContactSheetPipeline {
    pub fn new(
        config: PipelineConfig,
        inspector: impl MediaInspector + 'static,
        engine: impl FrameCaptureEngine + 'static,
    ) -> Self {
        Self {
            config,
            inspector: Box::new(inspector),
            engine: Box::new(engine),
            locks: WorkspaceLocks::new(),
            observer: None,
        }
    }

    /// 使用 ffprobe / ffmpeg
    #[must_use]
    pub fn with_ffmpeg(config: PipelineConfig) -> Self {
        let inspector = FfprobeInspector::new(config.ffprobe_path.clone());
        let engine = FfmpegCaptureEngine::new(config.ffmpeg_path.clone());
        Self::new(config, inspector, engine)
    }

    /// 每次進入新階段時呼叫
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(PipelineStage) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// 共用同一組工作目錄鎖（多個流程實例並行時使用）
    #[must_use]
    pub fn with_locks(mut self, locks: WorkspaceLocks) -> Self {
        self.locks = locks;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(
        &self,
        source: &Path,
        options: &ContactSheetOptions,
    ) -> Result<ContactSheet, PipelineError> {
        let mut tracker = StageTracker::new(self.observer.as_deref());
        match self.run_stages(source, options, &mut tracker) {
            Ok(sheet) => {
                tracker.enter(PipelineStage::Done);
                Ok(sheet)
            }
            Err(source_error) => {
                let stage = tracker.current;
                tracker.enter(PipelineStage::Failed);
                warn!("預覽圖流程於{stage}階段失敗: {source_error}");
                Err(PipelineError {
                    stage,
                    source: source_error,
                })
            }
        }
    }

    fn run_stages(
        &self,
        source: &Path,
        options: &ContactSheetOptions,
        tracker: &mut StageTracker<'_>,
    ) -> Result<ContactSheet, ContactSheetError> {
        tracker.enter(PipelineStage::Probing);
        let metadata = probe_metadata(self.inspector.as_ref(), source)?;

        tracker.enter(PipelineStage::LayoutReady);
        let grid = select_grid(f64::from(metadata.width) / f64::from(metadata.height.max(1)));
        let geometry = calculate_geometry(
            metadata.width,
            metadata.height,
            self.config.max_thumbnail_width,
            grid,
        )?;
        let frame_count = resolve_frame_count(options.frame_count, grid.cell_count());
        let workspace_path = workspace::workspace_path_for(source)?;
        let _lease = self.locks.try_acquire(&workspace_path)?;

        info!(
            "{}: {}x{}，{} 列 {} 欄，縮圖 {}",
            source.display(),
            metadata.width,
            metadata.height,
            grid.rows,
            grid.columns,
            geometry.size_string()
        );

        let frames = if options.generate {
            tracker.enter(PipelineStage::Generating);
            workspace::ensure_clean(&workspace_path)?;

            tracker.enter(PipelineStage::Extracting);
            extract_frames(
                self.engine.as_ref(),
                CaptureRequest {
                    source: source.to_path_buf(),
                    output_dir: workspace_path.clone(),
                    filename_pattern: FRAME_FILE_PATTERN.to_string(),
                    count: frame_count,
                    size: geometry.size_string(),
                    duration_seconds: metadata.duration_seconds,
                },
            )?;

            tracker.enter(PipelineStage::Reading);
            read_frames(&workspace_path)?
        } else {
            tracker.enter(PipelineStage::ReadingExisting);
            workspace::ensure_reserved(&workspace_path)?;
            read_frames(&workspace_path)?
        };

        tracker.enter(PipelineStage::Composing);
        let mut info = ContactSheetInfo {
            filename: display_name(source),
            metadata,
            grid,
            geometry,
            frame_count,
            frames_drawn: 0,
        };
        let composed = ContactSheetComposer::new()?.compose(&info, &frames)?;
        info.frames_drawn = composed.frames_drawn;

        if options.generate && options.clean_workspace {
            tracker.enter(PipelineStage::Cleaning);
            workspace::remove(&workspace_path)?;
        }

        Ok(ContactSheet {
            png: composed.png,
            info,
        })
    }
}

/// 呼叫端指定的張數不得超過網格格數
fn resolve_frame_count(requested: Option<u32>, cells: u32) -> u32 {
    match requested {
        Some(count) if count > cells => {
            warn!("擷取張數 {count} 超過網格格數 {cells}，改為 {cells}");
            cells
        }
        Some(count) => count,
        None => cells,
    }
}

/// 不含副檔名的檔名
fn display_name(source: &Path) -> String {
    source
        .file_stem()
        .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string())
}

struct StageTracker<'a> {
    current: PipelineStage,
    observer: Option<&'a (dyn Fn(PipelineStage) + Send + Sync)>,
}

impl<'a> StageTracker<'a> {
    fn new(observer: Option<&'a (dyn Fn(PipelineStage) + Send + Sync)>) -> Self {
        Self {
            current: PipelineStage::Idle,
            observer,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.current = stage;
        if let Some(observer) = self.observer {
            observer(stage);
        }
    }
}
