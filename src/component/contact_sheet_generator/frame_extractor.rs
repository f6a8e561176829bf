use super::frame_naming::render_frame_name;
use log::{debug, error, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use thiserror::Error;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("擷取引擎回報錯誤: {0}")]
    Engine(String),
    #[error("擷取引擎未回報結果即結束")]
    Disconnected,
}

/// 擷取請求
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    /// 含 `%timestamp%` 與 `%index%` 的檔名模板
    pub filename_pattern: String,
    pub count: u32,
    /// `WxH`
    pub size: String,
    pub duration_seconds: f64,
}

/// 擷取引擎的完成通知，每次請求只會送出一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    End,
    Error(String),
}

/// 外部縮圖擷取引擎
///
/// 呼叫後立即返回接收端，引擎完成時送出 `End`，失敗時送出 `Error`
pub trait FrameCaptureEngine: Send + Sync {
    fn capture(&self, request: CaptureRequest) -> Receiver<CaptureEvent>;
}

/// 擷取縮圖並等待引擎完成
///
/// 只接收第一個事件，不重試也不設逾時
pub fn extract_frames(
    engine: &dyn FrameCaptureEngine,
    request: CaptureRequest,
) -> Result<(), ExtractionError> {
    info!(
        "開始擷取 {} 張縮圖 ({}): {}",
        request.count,
        request.size,
        request.source.display()
    );

    let events = engine.capture(request);
    match events.recv() {
        Ok(CaptureEvent::End) => {
            info!("縮圖擷取完成");
            Ok(())
        }
        Ok(CaptureEvent::Error(cause)) => {
            error!("縮圖擷取失敗: {cause}");
            Err(ExtractionError::Engine(cause))
        }
        Err(_) => Err(ExtractionError::Disconnected),
    }
}

/// 在影片長度內均勻分布的擷取時間點，不含頭尾
#[must_use]
pub fn capture_timestamps(duration_seconds: f64, count: u32) -> Vec<f64> {
    if count == 0 || !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Vec::new();
    }

    let slots = f64::from(count + 1);
    (1..=count)
        .map(|i| duration_seconds * f64::from(i) / slots)
        .collect()
}

/// 使用 ffmpeg 的擷取引擎
///
/// 在獨立執行緒上以 rayon 平行擷取，每張縮圖一個 ffmpeg 程序
#[derive(Debug, Clone)]
pub struct FfmpegCaptureEngine {
    ffmpeg_path: PathBuf,
}

impl FfmpegCaptureEngine {
    #[must_use]
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl Default for FfmpegCaptureEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FrameCaptureEngine for FfmpegCaptureEngine {
    fn capture(&self, request: CaptureRequest) -> Receiver<CaptureEvent> {
        let (sender, receiver) = mpsc::channel();
        let ffmpeg_path = self.ffmpeg_path.clone();
        let fallback = sender.clone();

        let spawned = thread::Builder::new()
            .name("frame-capture".to_string())
            .spawn(move || run_capture(&ffmpeg_path, &request, &sender));

        if let Err(e) = spawned {
            let _ = fallback.send(CaptureEvent::Error(format!("無法啟動擷取執行緒: {e}")));
        }

        receiver
    }
}

fn run_capture(ffmpeg_path: &Path, request: &CaptureRequest, sender: &Sender<CaptureEvent>) {
    let event = match capture_all(ffmpeg_path, request) {
        Ok(()) => CaptureEvent::End,
        Err(cause) => CaptureEvent::Error(cause),
    };
    let _ = sender.send(event);
}

fn capture_all(ffmpeg_path: &Path, request: &CaptureRequest) -> Result<(), String> {
    let (width, height) =
        parse_size(&request.size).ok_or_else(|| format!("尺寸格式錯誤: {}", request.size))?;
    let timestamps = capture_timestamps(request.duration_seconds, request.count);
    if timestamps.len() != request.count as usize {
        return Err(format!(
            "影片長度無效 ({})，無法擷取 {} 張縮圖",
            request.duration_seconds, request.count
        ));
    }

    let failures: Vec<String> = timestamps
        .par_iter()
        .enumerate()
        .filter_map(|(index, &timestamp)| {
            let file_name = render_frame_name(&request.filename_pattern, timestamp, index as u32);
            let output_path = request.output_dir.join(file_name);
            capture_one(ffmpeg_path, &request.source, timestamp, width, height, &output_path)
                .err()
                .map(|e| format!("[{index}] {e}"))
        })
        .collect();

    match failures.first() {
        None => Ok(()),
        Some(first) => Err(format!(
            "{} / {} 張縮圖擷取失敗，第一個錯誤: {first}",
            failures.len(),
            timestamps.len()
        )),
    }
}

/// 擷取單一縮圖（兩段式 seek）
///
/// 1. `-ss` 在 `-i` 前：快速跳轉到最近的關鍵幀
/// 2. `-ss` 在 `-i` 後：解碼到目標時間點
fn capture_one(
    ffmpeg_path: &Path,
    source: &Path,
    timestamp: f64,
    width: u32,
    height: u32,
    output_path: &Path,
) -> Result<(), String> {
    let args = build_capture_args(source, timestamp, width, height, output_path);
    debug!("ffmpeg {}", args.join(" "));

    let output = Command::new(ffmpeg_path)
        .args(&args)
        .output()
        .map_err(|e| format!("無法執行 ffmpeg: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffmpeg 擷取縮圖失敗: {}", stderr.trim()));
    }

    if !output_path.exists() {
        return Err(format!("縮圖檔案未建立: {}", output_path.display()));
    }

    Ok(())
}

fn build_capture_args(
    source: &Path,
    timestamp: f64,
    width: u32,
    height: u32,
    output_path: &Path,
) -> Vec<String> {
    let t0 = (timestamp - SEEK_MARGIN).max(0.0);
    let delta = timestamp - t0;

    let mut args = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if t0 > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{t0:.3}"));
    }

    args.push("-i".to_string());
    args.push(source.to_string_lossy().to_string());

    if delta > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{delta:.3}"));
    }

    args.extend([
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-threads".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        format!("scale={width}:{height}"),
        "-y".to_string(),
        output_path.to_string_lossy().to_string(),
    ]);

    args
}

fn parse_size(size: &str) -> Option<(u32, u32)> {
    let (width, height) = size.split_once('x')?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
