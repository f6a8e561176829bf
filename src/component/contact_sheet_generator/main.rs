use super::error::PipelineStage;
use super::pipeline::{ContactSheet, ContactSheetPipeline};
use crate::config::Config;
use crate::tools::{format_duration, format_size, save_contact_sheet, validate_file_exists};
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 執行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// 重新擷取縮圖
    Generate,
    /// 直接使用工作目錄裡既有的縮圖
    FromWorkspace,
}

/// 預覽圖生成器（互動介面）
pub struct ContactSheetGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl ContactSheetGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 回傳處理過的影片路徑
    pub fn run(&self, mode: GenerationMode) -> Result<PathBuf> {
        println!("{}", style("=== 影片預覽圖生成 ===").cyan().bold());

        let video_path = PathBuf::from(self.prompt_video_path()?);
        validate_file_exists(&video_path)?;

        let settings = &self.config.settings.contact_sheet;
        let mut options = settings.options(mode == GenerationMode::Generate);
        if options.generate {
            options.clean_workspace = Confirm::new()
                .with_prompt("合成完成後刪除暫存縮圖？")
                .default(settings.clean_workspace)
                .interact()?;
        }

        if self.shutdown_signal.load(Ordering::SeqCst) {
            bail!("收到中斷訊號，取消處理");
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("  {spinner:.cyan} {msg}")?);
        spinner.enable_steady_tick(Duration::from_millis(120));

        let progress = spinner.clone();
        let pipeline = ContactSheetPipeline::with_ffmpeg(settings.pipeline_config())
            .with_observer(move |stage| match stage {
                PipelineStage::Done | PipelineStage::Failed => progress.finish_and_clear(),
                stage => progress.set_message(format!("{stage}...")),
            });

        let sheet = match pipeline.run(&video_path, &options) {
            Ok(sheet) => sheet,
            Err(e) => {
                error!("處理影片失敗 {}: {e}", video_path.display());
                println!("  {} {}", style("✗").red(), e);
                return Err(e.into());
            }
        };

        self.print_summary(&sheet);

        let output_dir = self.output_directory(&video_path);
        let saved = save_contact_sheet(&output_dir, &sheet)
            .with_context(|| format!("無法儲存預覽圖到 {}", output_dir.display()))?;

        println!(
            "  {} 預覽圖已建立: {}",
            style("✓").green(),
            saved.image_path.display()
        );
        info!("預覽圖 {} 已建立: {}", saved.id, saved.image_path.display());

        Ok(video_path)
    }

    fn prompt_video_path(&self) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt("請輸入影片檔案路徑");
        if let Some(recent) = self.config.settings.recent_paths.first() {
            input = input.default(recent.clone());
        }
        let path = input.interact_text()?;
        Ok(path.trim().to_string())
    }

    fn output_directory(&self, video_path: &Path) -> PathBuf {
        self.config
            .settings
            .contact_sheet
            .output_directory
            .clone()
            .unwrap_or_else(|| video_path.parent().unwrap_or(Path::new(".")).to_path_buf())
    }

    fn print_summary(&self, sheet: &ContactSheet) {
        let info = &sheet.info;
        println!(
            "  {} {}, {}, {}x{}",
            style("影片").dim(),
            format_duration(info.metadata.duration_seconds),
            format_size(info.metadata.byte_size),
            info.metadata.width,
            info.metadata.height
        );
        println!(
            "  {} {} 列 x {} 欄，縮圖 {}，繪製 {}/{} 張",
            style("版面").dim(),
            info.grid.rows,
            info.grid.columns,
            info.geometry.size_string(),
            info.frames_drawn,
            info.frame_count
        );

        if info.frames_drawn < info.frame_count {
            println!(
                "  {} 縮圖少於預期，空白格子保留",
                style("⚠").yellow()
            );
        }
    }
}
