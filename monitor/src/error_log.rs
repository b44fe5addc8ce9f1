use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use common::DaemonRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErrorLogError {
    #[error("error de E/S en {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no se pudo serializar el registro: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destino de solo-append para los registros que dispararon un error.
pub trait ErrorSink: Send + Sync {
    fn append(&self, record: &DaemonRecord) -> Result<(), ErrorLogError>;
}

/// Un `DaemonRecord` en JSON por línea.
///
/// Sin límite crece para siempre; con `max_bytes` el archivo lleno se mueve
/// a `<nombre>.1` (pisando la generación anterior) antes de escribir.
#[derive(Debug, Clone)]
pub struct JsonlErrorLog {
    path: PathBuf,
    max_bytes: Option<u64>,
}

impl JsonlErrorLog {
    pub fn new(path: impl Into<PathBuf>, max_bytes: Option<u64>) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotate_if_full(&self) -> io::Result<()> {
        let Some(max) = self.max_bytes else {
            return Ok(());
        };

        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() >= max => fs::rename(&self.path, rotated_path(&self.path)),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl ErrorSink for JsonlErrorLog {
    fn append(&self, record: &DaemonRecord) -> Result<(), ErrorLogError> {
        let io_err = |source: io::Error| ErrorLogError::Io {
            path: self.path.clone(),
            source,
        };

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        self.rotate_if_full().map_err(io_err)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(&line).map_err(io_err)?;

        Ok(())
    }
}

fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}
