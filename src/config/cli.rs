use crate::domain::ports::Storage;
use crate::utils::error::{RedistributionError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// 以輸出目錄為根的檔案存取
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 檔名來自標案 id 等外部輸入，只接受留在根目錄內的相對路徑
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(RedistributionError::InvalidConfigValueError {
                field: "storage key".to_string(),
                value: key.to_string(),
                reason: "Must be a relative path inside the output directory".to_string(),
            });
        }
        Ok(self.base_path.join(relative))
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, data)?;
        tracing::debug!("Wrote {} byte(s) to {}", data.len(), full_path.display());
        Ok(())
    }
}
