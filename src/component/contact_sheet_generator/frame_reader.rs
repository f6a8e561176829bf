use super::frame_naming::parse_frame_name;
use super::workspace::WorkspaceError;
use crate::tools::format_duration;
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// 已擷取的縮圖
#[derive(Clone)]
pub struct FrameFile {
    pub sequence_index: u32,
    pub timestamp_seconds: f64,
    /// 顯示在縮圖角落的時間標籤（`HhMmSs`）
    pub timestamp_label: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FrameFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameFile")
            .field("sequence_index", &self.sequence_index)
            .field("timestamp_seconds", &self.timestamp_seconds)
            .field("timestamp_label", &self.timestamp_label)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// 讀取工作目錄內的縮圖，依索引排序
///
/// 不符合檔名格式的項目直接略過；空目錄回傳空列表
pub fn read_frames(workspace: &Path) -> Result<Vec<FrameFile>, WorkspaceError> {
    let entries =
        fs::read_dir(workspace).map_err(|e| WorkspaceError::io("讀取工作目錄", workspace, e))?;

    let mut candidates: Vec<(PathBuf, u32, f64)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::io("讀取工作目錄", workspace, e))?;
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        let parsed = entry
            .file_name()
            .to_str()
            .and_then(parse_frame_name);

        match parsed {
            Some(parsed) if is_file => {
                candidates.push((entry.path(), parsed.sequence_index, parsed.timestamp_seconds));
            }
            _ => debug!("略過非縮圖項目: {}", entry.path().display()),
        }
    }

    let mut frames = candidates
        .into_par_iter()
        .map(|(path, sequence_index, timestamp_seconds)| {
            let bytes = fs::read(&path).map_err(|e| WorkspaceError::io("讀取縮圖", &path, e))?;
            Ok(FrameFile {
                sequence_index,
                timestamp_seconds,
                timestamp_label: format_duration(timestamp_seconds),
                bytes,
            })
        })
        .collect::<Result<Vec<_>, WorkspaceError>>()?;

    frames.sort_by_key(|frame| frame.sequence_index);
    debug!("讀取 {} 張縮圖: {}", frames.len(), workspace.display());
    Ok(frames)
}
