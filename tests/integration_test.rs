//! 整合測試 - 以假的媒體檢查與擷取引擎驗證完整流程
//!
//! 不需要 ffmpeg，縮圖檔案由測試引擎直接寫入工作目錄

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use image::{GenericImageView, Rgb, RgbImage};
use video_contact_sheet::component::contact_sheet_generator::{
    CaptureEvent, CaptureRequest, ContactSheetError, ContactSheetOptions, ContactSheetPipeline,
    FrameCaptureEngine, PipelineConfig, PipelineStage, WorkspaceError, WorkspaceLocks,
    capture_timestamps, frame_file_name, render_frame_name, resolution_label, workspace_path_for,
};
use video_contact_sheet::tools::{
    FormatBlock, MediaInspector, ProbeError, ProbeReport, StreamDescriptor, format_duration,
    format_size,
};

const VIDEO_SIZE: u64 = 52_428_800;

/// 固定回傳 1920x1080、125 秒的影片資訊
struct FakeInspector {
    streams: Vec<StreamDescriptor>,
}

impl FakeInspector {
    fn full_hd() -> Self {
        Self {
            streams: vec![
                StreamDescriptor::Audio,
                StreamDescriptor::Video {
                    width: Some(1920),
                    height: Some(1080),
                    duration: Some(125.0),
                },
            ],
        }
    }

    fn audio_only() -> Self {
        Self {
            streams: vec![StreamDescriptor::Audio],
        }
    }
}

impl MediaInspector for FakeInspector {
    fn inspect(&self, _path: &Path) -> Result<ProbeReport, ProbeError> {
        Ok(ProbeReport {
            streams: self.streams.clone(),
            format: FormatBlock {
                duration: Some(125.0),
                size: Some(VIDEO_SIZE),
            },
        })
    }
}

/// 依請求寫入單色縮圖後回報完成
#[derive(Clone, Default)]
struct FrameWritingEngine {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CaptureRequest>>>,
}

impl FrameCaptureEngine for FrameWritingEngine {
    fn capture(&self, request: CaptureRequest) -> Receiver<CaptureEvent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel();

        let timestamps = capture_timestamps(request.duration_seconds, request.count);
        for (index, timestamp) in timestamps.iter().enumerate() {
            let name = render_frame_name(&request.filename_pattern, *timestamp, index as u32);
            write_frame(&request.output_dir.join(name), [40, 160, 90]);
        }

        self.requests.lock().unwrap().push(request);
        sender.send(CaptureEvent::End).unwrap();
        receiver
    }
}

/// 寫入部分縮圖後回報錯誤
struct FailingEngine;

impl FrameCaptureEngine for FailingEngine {
    fn capture(&self, request: CaptureRequest) -> Receiver<CaptureEvent> {
        let (sender, receiver) = mpsc::channel();
        write_frame(&request.output_dir.join(frame_file_name(4.0, 0)), [200, 0, 0]);
        sender
            .send(CaptureEvent::Error("decoder exploded".to_string()))
            .unwrap();
        receiver
    }
}

fn write_frame(path: &Path, color: [u8; 3]) {
    RgbImage::from_pixel(32, 18, Rgb(color)).save(path).unwrap();
}

fn create_video(dir: &Path) -> PathBuf {
    let video = dir.join("holiday.mp4");
    fs::write(&video, b"not really a video").unwrap();
    video
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        max_thumbnail_width: 160,
        ..PipelineConfig::default()
    }
}

fn recording_observer() -> (Arc<Mutex<Vec<PipelineStage>>>, impl Fn(PipelineStage) + Send + Sync) {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stages);
    (stages, move |stage| sink.lock().unwrap().push(stage))
}

#[test]
fn test_generate_contact_sheet_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let engine = FrameWritingEngine::default();
    let (stages, observer) = recording_observer();

    let pipeline = ContactSheetPipeline::new(small_config(), FakeInspector::full_hd(), engine.clone())
        .with_observer(observer);
    let sheet = pipeline
        .run(&video, &ContactSheetOptions::default())
        .unwrap();

    assert_eq!(sheet.info.grid.rows, 7);
    assert_eq!(sheet.info.grid.columns, 4);
    assert_eq!(sheet.info.frame_count, 28);
    assert_eq!(sheet.info.frames_drawn, 28);
    assert_eq!(sheet.info.filename, "holiday");
    assert_eq!(sheet.info.metadata.byte_size, VIDEO_SIZE);
    assert_eq!(sheet.info.geometry.size_string(), "160x90");
    assert_eq!(format_duration(sheet.info.metadata.duration_seconds), "2m5s");
    assert_eq!(format_size(sheet.info.metadata.byte_size), "50MB");
    assert_eq!(
        resolution_label(sheet.info.metadata.width, sheet.info.metadata.height),
        "1920×1080"
    );

    let requests = engine.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].count, 28);
    assert_eq!(requests[0].size, "160x90");
    assert_eq!(requests[0].output_dir, workspace_path_for(&video).unwrap());

    let image = image::load_from_memory(&sheet.png).unwrap();
    assert_eq!(
        image.dimensions(),
        (sheet.info.geometry.canvas_width, sheet.info.geometry.canvas_height)
    );

    assert!(!workspace_path_for(&video).unwrap().exists());
    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            PipelineStage::Probing,
            PipelineStage::LayoutReady,
            PipelineStage::Generating,
            PipelineStage::Extracting,
            PipelineStage::Reading,
            PipelineStage::Composing,
            PipelineStage::Cleaning,
            PipelineStage::Done,
        ]
    );
}

#[test]
fn test_keep_workspace_when_cleanup_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let pipeline = ContactSheetPipeline::new(
        small_config(),
        FakeInspector::full_hd(),
        FrameWritingEngine::default(),
    );

    let options = ContactSheetOptions {
        clean_workspace: false,
        ..ContactSheetOptions::default()
    };
    pipeline.run(&video, &options).unwrap();

    let workspace = workspace_path_for(&video).unwrap();
    assert_eq!(fs::read_dir(&workspace).unwrap().count(), 28);
}

#[test]
fn test_regenerate_replaces_stale_frames() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let workspace = workspace_path_for(&video).unwrap();
    fs::create_dir(&workspace).unwrap();
    let stale = workspace.join(frame_file_name(999.0, 27));
    write_frame(&stale, [0, 0, 0]);
    fs::write(workspace.join("notes.txt"), "leftover").unwrap();

    let pipeline = ContactSheetPipeline::new(
        small_config(),
        FakeInspector::full_hd(),
        FrameWritingEngine::default(),
    );
    let options = ContactSheetOptions {
        clean_workspace: false,
        frame_count: Some(3),
        ..ContactSheetOptions::default()
    };
    let sheet = pipeline.run(&video, &options).unwrap();

    assert_eq!(sheet.info.frames_drawn, 3);
    assert!(!stale.exists());
    assert!(!workspace.join("notes.txt").exists());
}

#[test]
fn test_compose_from_existing_workspace() {
    const COLORS: [[u8; 3]; 5] = [
        [220, 40, 40],
        [40, 200, 60],
        [30, 60, 220],
        [230, 210, 30],
        [20, 200, 210],
    ];

    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let workspace = workspace_path_for(&video).unwrap();
    fs::create_dir(&workspace).unwrap();
    // 寫入順序與索引順序不同
    for index in [3, 0, 4, 1, 2] {
        write_frame(
            &workspace.join(frame_file_name(f64::from(index) * 10.0 + 5.0, index)),
            COLORS[index as usize],
        );
    }
    fs::write(workspace.join("thumb-old.png"), b"ignored").unwrap();
    let before = snapshot(&workspace);

    let engine = FrameWritingEngine::default();
    let (stages, observer) = recording_observer();
    let pipeline = ContactSheetPipeline::new(small_config(), FakeInspector::full_hd(), engine.clone())
        .with_observer(observer);

    let options = ContactSheetOptions {
        generate: false,
        ..ContactSheetOptions::default()
    };
    let sheet = pipeline.run(&video, &options).unwrap();

    assert_eq!(sheet.info.frames_drawn, 5);
    assert_eq!(sheet.info.frame_count, 28);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert_eq!(snapshot(&workspace), before);
    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            PipelineStage::Probing,
            PipelineStage::LayoutReady,
            PipelineStage::ReadingExisting,
            PipelineStage::Composing,
            PipelineStage::Done,
        ]
    );

    // 第 i 格左上角應為第 i 張縮圖的顏色（時間標籤在縮圖下緣）
    let image = image::load_from_memory(&sheet.png).unwrap().to_rgb8();
    let geometry = sheet.info.geometry;
    let columns = sheet.info.grid.columns;
    for (index, expected) in COLORS.iter().enumerate() {
        let index = index as u32;
        let x = (index % columns) * (geometry.thumb_width + geometry.gutter) + 4;
        let y = geometry.header_height
            + (index / columns) * (geometry.thumb_height + geometry.gutter)
            + 4;
        let actual = image.get_pixel(x, y).0;
        for channel in 0..3 {
            assert!(
                actual[channel].abs_diff(expected[channel]) <= 2,
                "第 {index} 格顏色不符: {actual:?} != {expected:?}"
            );
        }
    }
}

/// 工作目錄內容（檔名與位元組）
fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().to_string(),
                fs::read(entry.path()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_compose_from_missing_workspace_fails_while_reading() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let pipeline = ContactSheetPipeline::new(
        small_config(),
        FakeInspector::full_hd(),
        FrameWritingEngine::default(),
    );

    let options = ContactSheetOptions {
        generate: false,
        ..ContactSheetOptions::default()
    };
    let err = pipeline.run(&video, &options).unwrap_err();

    assert_eq!(err.stage, PipelineStage::ReadingExisting);
    assert!(matches!(
        err.source,
        ContactSheetError::Workspace(WorkspaceError::Io { .. })
    ));
}

#[test]
fn test_extraction_failure_keeps_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let (stages, observer) = recording_observer();
    let pipeline = ContactSheetPipeline::new(small_config(), FakeInspector::full_hd(), FailingEngine)
        .with_observer(observer);

    let err = pipeline
        .run(&video, &ContactSheetOptions::default())
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Extracting);
    assert!(err.to_string().contains("decoder exploded"));

    let workspace = workspace_path_for(&video).unwrap();
    assert!(workspace.join(frame_file_name(4.0, 0)).exists());

    let stages = stages.lock().unwrap();
    assert_eq!(stages.last(), Some(&PipelineStage::Failed));
    assert!(!stages.contains(&PipelineStage::Cleaning));
    assert!(!stages.contains(&PipelineStage::Composing));
}

#[test]
fn test_source_without_video_stream_fails_while_probing() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let engine = FrameWritingEngine::default();
    let pipeline =
        ContactSheetPipeline::new(small_config(), FakeInspector::audio_only(), engine.clone());

    let err = pipeline
        .run(&video, &ContactSheetOptions::default())
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Probing);
    assert!(matches!(
        err.source,
        ContactSheetError::Probe(ProbeError::NoVideoStream(_))
    ));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert!(!workspace_path_for(&video).unwrap().exists());
}

#[test]
fn test_missing_source_fails_while_probing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ContactSheetPipeline::new(
        small_config(),
        FakeInspector::full_hd(),
        FrameWritingEngine::default(),
    );

    let err = pipeline
        .run(&dir.path().join("missing.mp4"), &ContactSheetOptions::default())
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Probing);
    assert!(matches!(
        err.source,
        ContactSheetError::Probe(ProbeError::NotFound(_))
    ));
}

#[test]
fn test_busy_workspace_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let locks = WorkspaceLocks::new();
    let engine = FrameWritingEngine::default();
    let pipeline = ContactSheetPipeline::new(small_config(), FakeInspector::full_hd(), engine.clone())
        .with_locks(locks.clone());

    let lease = locks
        .try_acquire(&workspace_path_for(&video).unwrap())
        .unwrap();
    let err = pipeline
        .run(&video, &ContactSheetOptions::default())
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::LayoutReady);
    assert!(matches!(
        err.source,
        ContactSheetError::Workspace(WorkspaceError::Busy(_))
    ));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);

    drop(lease);
    assert!(pipeline.run(&video, &ContactSheetOptions::default()).is_ok());
    assert!(!locks.is_held(&workspace_path_for(&video).unwrap()));
}

#[test]
fn test_data_uri_encodes_png() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(dir.path());
    let pipeline = ContactSheetPipeline::new(
        small_config(),
        FakeInspector::full_hd(),
        FrameWritingEngine::default(),
    );

    let options = ContactSheetOptions {
        frame_count: Some(1),
        ..ContactSheetOptions::default()
    };
    let sheet = pipeline.run(&video, &options).unwrap();

    // PNG 檔頭的 base64
    assert!(sheet.to_data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
}
