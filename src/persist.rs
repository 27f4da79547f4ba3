//! Durable storage for the last-used preview geometry.
//!
//! The engine debounces [`crate::effects::Effect::PersistGeometry`] emission;
//! hosts apply each emitted effect here, so one store write coalesces an
//! entire drag.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::geometry::RectPx;

#[derive(Debug)]
pub struct GeometryStore {
    path: PathBuf,
}

impl GeometryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the remembered geometry. A missing or unreadable file is a fresh
    /// start, not an error.
    pub fn load(&self) -> Option<RectPx> {
        let bytes = fs::read(&self.path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn save(&self, rect: RectPx) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(&rect).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}
