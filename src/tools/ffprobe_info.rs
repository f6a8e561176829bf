use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// 影片資訊（每次執行只取得一次）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub duration_seconds: f64,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("檔案不存在: {}", .0.display())]
    NotFound(PathBuf),
    #[error("無法執行 ffprobe: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffprobe 執行失敗: {0}")]
    Engine(String),
    #[error("無法解析 ffprobe 輸出: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("找不到視訊串流: {}", .0.display())]
    NoVideoStream(PathBuf),
    #[error("無法取得影片{0}")]
    MissingField(&'static str),
    #[error("影片解析度無效: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// 串流描述，依 `codec_type` 分類
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDescriptor {
    Video {
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<f64>,
    },
    Audio,
    Other {
        codec_type: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatBlock {
    pub duration: Option<f64>,
    pub size: Option<u64>,
}

/// 媒體檢查結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub streams: Vec<StreamDescriptor>,
    pub format: FormatBlock,
}

impl ProbeReport {
    /// 第一個視訊串流
    #[must_use]
    pub fn first_video_stream(&self) -> Option<&StreamDescriptor> {
        self.streams
            .iter()
            .find(|s| matches!(s, StreamDescriptor::Video { .. }))
    }

    /// 解析 ffprobe 的 JSON 輸出
    pub fn from_ffprobe_json(json: &str) -> Result<Self, ProbeError> {
        let probe: FfprobeOutput = serde_json::from_str(json)?;

        let streams = probe
            .streams
            .unwrap_or_default()
            .into_iter()
            .map(StreamInfo::into_descriptor)
            .collect();

        let format = probe.format.map_or_else(FormatBlock::default, |f| FormatBlock {
            duration: f.duration.and_then(|d| d.as_f64()),
            size: f.size.and_then(|s| s.as_f64()).map(|s| s as u64),
        });

        Ok(Self { streams, format })
    }
}

/// 媒體檢查介面
pub trait MediaInspector: Send + Sync {
    fn inspect(&self, path: &Path) -> Result<ProbeReport, ProbeError>;
}

/// 使用 ffprobe 的媒體檢查
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe_path: PathBuf,
}

impl FfprobeInspector {
    #[must_use]
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaInspector for FfprobeInspector {
    fn inspect(&self, path: &Path) -> Result<ProbeReport, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Engine(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }

        ProbeReport::from_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// 取得影片資訊
///
/// 選取第一個視訊串流的解析度；長度優先取 format，其次取串流；
/// 大小優先取 format，其次取檔案本身大小
pub fn probe_metadata(
    inspector: &dyn MediaInspector,
    path: &Path,
) -> Result<VideoMetadata, ProbeError> {
    if !path.is_file() {
        return Err(ProbeError::NotFound(path.to_path_buf()));
    }

    let report = inspector.inspect(path)?;

    let Some(StreamDescriptor::Video {
        width,
        height,
        duration: stream_duration,
    }) = report.first_video_stream()
    else {
        return Err(ProbeError::NoVideoStream(path.to_path_buf()));
    };

    let width = width.ok_or(ProbeError::MissingField("寬度"))?;
    let height = height.ok_or(ProbeError::MissingField("高度"))?;

    let duration_seconds = report
        .format
        .duration
        .or(*stream_duration)
        .ok_or(ProbeError::MissingField("長度"))?;

    let byte_size = match report.format.size {
        Some(size) => size,
        None => std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|_| ProbeError::MissingField("大小"))?,
    };

    debug!(
        "影片資訊 {}: {:.2}s, {} bytes, {}x{}",
        path.display(),
        duration_seconds,
        byte_size,
        width,
        height
    );

    Ok(VideoMetadata {
        duration_seconds,
        byte_size,
        width,
        height,
    })
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<Numeric>,
    size: Option<Numeric>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<Numeric>,
}

impl StreamInfo {
    fn into_descriptor(self) -> StreamDescriptor {
        match self.codec_type.as_deref() {
            Some("video") => StreamDescriptor::Video {
                width: self.width,
                height: self.height,
                duration: self.duration.and_then(|d| d.as_f64()),
            },
            Some("audio") => StreamDescriptor::Audio,
            other => StreamDescriptor::Other {
                codec_type: other.unwrap_or_default().to_string(),
            },
        }
    }
}

/// ffprobe 的數值欄位通常是字串（"125.000000"），也接受數字
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|n| n.is_finite())
    }
}
