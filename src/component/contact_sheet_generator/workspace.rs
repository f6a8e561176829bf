//! 暫存工作目錄管理
//!
//! 工作目錄固定位於來源影片旁：`<影片所在資料夾>/<影片檔名>.thumbtemp`。
//! 所有操作都會先檢查路徑結尾是否為保留名稱，避免誤刪其他資料夾。

use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// 工作目錄保留後綴
pub const WORKSPACE_SUFFIX: &str = ".thumbtemp";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("拒絕操作非工作目錄的路徑: {}", .0.display())]
    UnreservedPath(PathBuf),
    #[error("無法推算工作目錄: {}", .0.display())]
    NoParent(PathBuf),
    #[error("工作目錄正被另一個任務使用: {}", .0.display())]
    Busy(PathBuf),
    #[error("{action} 失敗 {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// 取得來源影片對應的工作目錄
pub fn workspace_path_for(source: &Path) -> Result<PathBuf, WorkspaceError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| WorkspaceError::NoParent(source.to_path_buf()))?;
    let parent = source.parent().unwrap_or(Path::new("."));

    let mut name = file_name.to_os_string();
    name.push(WORKSPACE_SUFFIX);
    Ok(parent.join(name))
}

/// 路徑最後一段必須以保留後綴結尾，且不能只有後綴本身
pub fn ensure_reserved(path: &Path) -> Result<(), WorkspaceError> {
    let reserved = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > WORKSPACE_SUFFIX.len() && n.ends_with(WORKSPACE_SUFFIX));

    if reserved {
        Ok(())
    } else {
        Err(WorkspaceError::UnreservedPath(path.to_path_buf()))
    }
}

/// 確保工作目錄為全新、空白的狀態
///
/// 已存在則整個刪除後重建；刪除失敗即中止，不會進入殘留的目錄
pub fn ensure_clean(path: &Path) -> Result<(), WorkspaceError> {
    ensure_reserved(path)?;

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            debug!("工作目錄已存在，將刪除: {}", path.display());
            fs::remove_dir_all(path).map_err(|e| WorkspaceError::io("刪除工作目錄", path, e))?;
        }
        Ok(_) => {
            warn!("工作目錄位置被檔案佔用，將刪除: {}", path.display());
            fs::remove_file(path).map_err(|e| WorkspaceError::io("刪除檔案", path, e))?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(WorkspaceError::io("讀取工作目錄", path, e)),
    }

    fs::create_dir_all(path).map_err(|e| WorkspaceError::io("建立工作目錄", path, e))?;
    debug!("工作目錄已建立: {}", path.display());
    Ok(())
}

/// 刪除工作目錄，不存在時視為成功
pub fn remove(path: &Path) -> Result<(), WorkspaceError> {
    ensure_reserved(path)?;

    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("工作目錄已清理: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WorkspaceError::io("刪除工作目錄", path, e)),
    }
}

/// 同一行程內的工作目錄獨占鎖
///
/// 同一來源影片同時只能有一個任務執行
#[derive(Debug, Clone, Default)]
pub struct WorkspaceLocks {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl WorkspaceLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, path: &Path) -> Result<WorkspaceLease, WorkspaceError> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(path.to_path_buf()) {
            return Err(WorkspaceError::Busy(path.to_path_buf()));
        }

        Ok(WorkspaceLease {
            path: path.to_path_buf(),
            held: Arc::clone(&self.held),
        })
    }

    #[must_use]
    pub fn is_held(&self, path: &Path) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }
}

/// 持有期間獨占工作目錄，drop 時釋放
#[derive(Debug)]
pub struct WorkspaceLease {
    path: PathBuf,
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl WorkspaceLease {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}
