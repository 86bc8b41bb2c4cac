use std::io::Write;
use std::path::PathBuf;

use sa_core::orchestrator::SignalSink;
use sa_core::report::ScreenReport;
use sa_core::{Result, ScreenError};
use tracing::info;

/// Writes the report as pretty JSON to a file, or to stdout when `path` is
/// `None`. `bare` drops the envelope and writes only the signal/series list.
#[derive(Debug, Clone, Default)]
pub struct JsonSink {
    pub path: Option<PathBuf>,
    pub bare: bool,
}

impl JsonSink {
    pub fn stdout(bare: bool) -> Self {
        Self { path: None, bare }
    }

    pub fn file(path: impl Into<PathBuf>, bare: bool) -> Self {
        Self {
            path: Some(path.into()),
            bare,
        }
    }
}

impl SignalSink for JsonSink {
    fn emit(&mut self, report: &ScreenReport) -> Result<()> {
        let value = report.to_json(self.bare)?;
        match &self.path {
            Some(path) => {
                let io_err = |source: std::io::Error| ScreenError::Io {
                    path: path.clone(),
                    source,
                };
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(io_err)?;
                }
                let mut buf = serde_json::to_vec_pretty(&value)?;
                buf.push(b'\n');
                std::fs::write(path, buf).map_err(io_err)?;
                info!(path = %path.display(), entries = report.output.len(), "report written");
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                serde_json::to_writer_pretty(&mut lock, &value)?;
                writeln!(lock).map_err(|source| ScreenError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
            }
        }
        Ok(())
    }
}
