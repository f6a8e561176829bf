use super::composer::CompositionError;
use super::frame_extractor::ExtractionError;
use super::workspace::WorkspaceError;
use crate::tools::ProbeError;
use std::fmt;
use thiserror::Error;

/// 流程階段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,
    Probing,
    LayoutReady,
    Generating,
    Extracting,
    Reading,
    ReadingExisting,
    Composing,
    Cleaning,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "待命",
            Self::Probing => "讀取影片資訊",
            Self::LayoutReady => "計算版面",
            Self::Generating => "準備工作目錄",
            Self::Extracting => "擷取縮圖",
            Self::Reading => "讀取縮圖",
            Self::ReadingExisting => "讀取既有縮圖",
            Self::Composing => "合成預覽圖",
            Self::Cleaning => "清理工作目錄",
            Self::Done => "完成",
            Self::Failed => "失敗",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ContactSheetError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// 帶有失敗階段的錯誤
#[derive(Debug, Error)]
#[error("{stage}階段失敗: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: ContactSheetError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_pipeline_error_message_names_stage() {
        let err = PipelineError {
            stage: PipelineStage::Probing,
            source: ProbeError::NoVideoStream(PathBuf::from("/a.mp3")).into(),
        };
        assert_eq!(err.to_string(), "讀取影片資訊階段失敗: 找不到視訊串流: /a.mp3");
    }
}
