use crate::component::contact_sheet_generator::ContactSheet;
use crate::tools::ensure_directory_exists;
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 已儲存的預覽圖
#[derive(Debug, Clone)]
pub struct SavedContactSheet {
    pub id: Uuid,
    pub image_path: PathBuf,
    pub info_path: PathBuf,
}

/// 儲存預覽圖與描述資訊
///
/// 輸出 `<id>.png` 與 `<id>.json`，id 供後續與檔案記錄關聯
pub fn save_contact_sheet(output_dir: &Path, sheet: &ContactSheet) -> Result<SavedContactSheet> {
    ensure_directory_exists(output_dir)?;

    let id = Uuid::new_v4();
    let image_path = output_dir.join(format!("{id}.png"));
    let info_path = output_dir.join(format!("{id}.json"));

    fs::write(&image_path, &sheet.png)
        .with_context(|| format!("無法寫入預覽圖: {}", image_path.display()))?;

    let info = serde_json::to_string_pretty(&sheet.info).context("無法序列化預覽圖資訊")?;
    fs::write(&info_path, info)
        .with_context(|| format!("無法寫入預覽圖資訊: {}", info_path.display()))?;

    info!("預覽圖已儲存: {}", image_path.display());

    Ok(SavedContactSheet {
        id,
        image_path,
        info_path,
    })
}
