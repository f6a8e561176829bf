mod ffprobe_info;
mod format;
mod image_store;
mod path_validator;

pub use ffprobe_info::{
    FfprobeInspector, FormatBlock, MediaInspector, ProbeError, ProbeReport, StreamDescriptor,
    VideoMetadata, probe_metadata,
};
pub use format::{format_duration, format_size};
pub use image_store::{SavedContactSheet, save_contact_sheet};
pub use path_validator::{ensure_directory_exists, validate_file_exists};
