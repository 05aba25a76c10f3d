//! Output workspace of a single compile.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use crate::error::{LatexError, LatexResult};

/// Auxiliary files removed after a successful compile.
pub const AUX_EXTENSIONS: &[&str] = &[
    ".aux",
    ".log",
    ".out",
    ".toc",
    ".synctex.gz",
    ".nav",
    ".snm",
    ".fls",
    ".fdb_latexmk",
    ".bbl",
    ".blg",
];

/// Where a compile writes, derived from the requested output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Absolute output directory; also the compiler's working directory.
    pub dir: PathBuf,
    /// Job name: the output file name without its extension.
    pub name: String,
}

impl Job {
    /// Derive the job from an output path such as `out/report.pdf`.
    ///
    /// A path without a parent uses the current directory. Relative
    /// directories are made absolute since the compiler runs inside them.
    pub fn from_output_path(path: &Path) -> LatexResult<Self> {
        if path.as_os_str().is_empty() {
            return Err(LatexError::EmptyOutputPath);
        }
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| LatexError::InvalidOutputPath(path.to_path_buf()))?;

        let cwd = std::env::current_dir()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
            _ => cwd,
        };

        Ok(Self { dir, name })
    }

    /// Path of the produced PDF.
    pub fn pdf_path(&self) -> PathBuf {
        self.artifact(".pdf")
    }

    /// `<dir>/<name><suffix>`.
    pub fn artifact(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }

    /// Create the output directory if needed.
    pub fn prepare(&self) -> LatexResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Write the source to `<dir>/<name>-<random>.tex`.
    ///
    /// The file is deleted when the returned path is dropped.
    pub fn write_source(&self, source: &[u8]) -> LatexResult<TempPath> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", self.name))
            .suffix(".tex")
            .tempfile_in(&self.dir)?;
        file.write_all(source)?;
        file.flush()?;
        let path = file.into_temp_path();
        debug!("Wrote source to {}", path.display());
        Ok(path)
    }

    /// Remove auxiliary files left by the compiler. Returns how many were removed.
    pub fn cleanup_aux_files(&self) -> usize {
        let mut removed = 0;
        for ext in AUX_EXTENSIONS {
            if std::fs::remove_file(self.artifact(ext)).is_ok() {
                removed += 1;
            }
        }
        debug!("Removed {} auxiliary file(s) for {}", removed, self.name);
        removed
    }
}
