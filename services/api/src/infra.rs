use attendance_tally::config::parse_assumed_year;
use attendance_tally::workflows::attendance::{
    has_text_extension, RunContext, RunNotice, UploadedFile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) context: Arc<RunContext>,
}

pub(crate) fn parse_year(raw: &str) -> Result<i32, String> {
    parse_assumed_year(raw).map_err(|err| err.to_string())
}

fn is_text_log(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| has_text_extension(&name.to_string_lossy()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Files read from disk plus the notices raised while reading them.
#[derive(Debug, Default)]
pub(crate) struct LoadedUploads {
    pub(crate) files: Vec<UploadedFile>,
    pub(crate) notices: Vec<RunNotice>,
}

impl LoadedUploads {
    fn push_file(&mut self, path: &Path) -> io::Result<()> {
        let name = display_name(path);
        let bytes = fs::read(path)?;
        match UploadedFile::from_bytes(name, bytes) {
            Ok(file) => {
                debug!(file = %file.filename, "log loaded");
                self.files.push(file);
            }
            Err(notice) => {
                warn!(path = %path.display(), "log is not valid UTF-8; skipping");
                self.notices.push(notice);
            }
        }
        Ok(())
    }
}

/// Reads `.txt` logs from files and directories (non-recursive, sorted by
/// name). Missing paths are fatal; wrong extensions and undecodable content
/// only produce notices.
pub(crate) fn load_uploads(paths: &[PathBuf]) -> io::Result<LoadedUploads> {
    let mut loaded = LoadedUploads::default();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<io::Result<_>>()?;
            entries.retain(|entry| entry.is_file() && is_text_log(entry));
            entries.sort();
            for entry in entries {
                loaded.push_file(&entry)?;
            }
        } else if is_text_log(path) {
            loaded.push_file(path)?;
        } else {
            warn!(path = %path.display(), "not a .txt log; skipping");
            loaded.notices.push(RunNotice::UnsupportedExtension {
                file: display_name(path),
            });
        }
    }

    Ok(loaded)
}
