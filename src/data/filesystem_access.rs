//! Per-user directories used to look up model weights.
use std::path::PathBuf;

#[derive(Debug)]
pub enum FsAccess {
    Cache,
    Current,
}

impl FsAccess {
    /// Retrieves the base path for the specified directory type, optionally appending the `ped_detect` subdirectory.
    fn get_path(&self, raw: bool) -> anyhow::Result<PathBuf> {
        let base_path = match self {
            FsAccess::Cache => dirs::cache_dir(),
            FsAccess::Current => std::env::current_dir().ok(),
        };

        let mut path = base_path.ok_or_else(|| {
            anyhow::anyhow!("Unsupported operating system. Supported OS: Linux, MacOS, Windows.")
        })?;

        if !raw {
            path.push("ped_detect");
        }
        Ok(path)
    }

    /// Returns the raw path for the directory without adding the `ped_detect` subdirectory.
    ///
    /// Examples:
    /// `~/.cache`, the working directory.
    pub fn raw_path(&self) -> anyhow::Result<PathBuf> {
        self.get_path(true)
    }

    /// Path to the `ped_detect` directory with the provided subdirectories appended.
    /// Nothing is created on disk.
    ///
    /// Examples:
    /// `~/.cache/ped_detect/models`.
    pub fn path_with_subs(&self, subs: &[&str]) -> anyhow::Result<PathBuf> {
        let mut d = self.get_path(false)?;
        for sub in subs {
            d.push(sub);
        }
        Ok(d)
    }
}
