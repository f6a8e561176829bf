//! 縮圖檔名格式（v1）
//!
//! `thumb-v1-[<秒數，三位小數>]-[<四位數索引，從 0 開始>].png`
//!
//! 例：`thumb-v1-[12.500]-[0003].png` 代表第 4 張縮圖，擷取於 12.5 秒。
//! 不符合格式的檔名不是本流程的產物，解析時直接略過。

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// 目前產生與接受的檔名版本，其他版本的縮圖一律略過
pub const FRAME_NAME_VERSION: u32 = 1;

/// 交給擷取引擎的檔名模板（版本號須與 `FRAME_NAME_VERSION` 一致）
pub const FRAME_FILE_PATTERN: &str = "thumb-v1-[%timestamp%]-[%index%].png";

const TIMESTAMP_TOKEN: &str = "%timestamp%";
const INDEX_TOKEN: &str = "%index%";

static REGEX_FRAME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^thumb-v(\d+)-\[(\d+(?:\.\d+)?)\]-\[(\d+)\]\.png$").expect("Invalid regex")
});

/// 從檔名解析出的資訊
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedFrameName {
    pub timestamp_seconds: f64,
    pub sequence_index: u32,
}

/// 依模板產生檔名
#[must_use]
pub fn render_frame_name(pattern: &str, timestamp_seconds: f64, sequence_index: u32) -> String {
    pattern
        .replace(TIMESTAMP_TOKEN, &format!("{timestamp_seconds:.3}"))
        .replace(INDEX_TOKEN, &format!("{sequence_index:04}"))
}

/// 產生 v1 格式的檔名
#[must_use]
pub fn frame_file_name(timestamp_seconds: f64, sequence_index: u32) -> String {
    render_frame_name(FRAME_FILE_PATTERN, timestamp_seconds, sequence_index)
}

#[must_use]
pub fn parse_frame_name(file_name: &str) -> Option<ParsedFrameName> {
    let captures = REGEX_FRAME_NAME.captures(file_name)?;
    let version: u32 = captures.get(1)?.as_str().parse().ok()?;
    if version != FRAME_NAME_VERSION {
        debug!("略過不同版本的縮圖檔名: {file_name}");
        return None;
    }
    let timestamp_seconds = captures.get(2)?.as_str().parse().ok()?;
    let sequence_index = captures.get(3)?.as_str().parse().ok()?;

    Some(ParsedFrameName {
        timestamp_seconds,
        sequence_index,
    })
}
