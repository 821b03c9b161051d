//! Per-symbol CSV export.
//!
//! One file per symbol: `{output_dir}/{SYMBOL}.csv`, written to a `.tmp`
//! sibling and renamed into place so consumers never read a half-written
//! file.

use mdp_core::DailyBar;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes extracted daily bars to disk.
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write all bars for one symbol, replacing any previous export.
    pub fn write_symbol(&self, symbol: &str, bars: &[DailyBar]) -> Result<PathBuf, csv::Error> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(format!("{symbol}.csv"));
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp_path)?;
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            e
        })?;
        Ok(path)
    }
}
