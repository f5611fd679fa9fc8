//! Scoped access to source locations.
//!
//! A [`Lease`] is returned by [`Lease::acquire`] and keeps the location open
//! until it is dropped. The timeline builder holds one only while it decodes a
//! source; the playback engine holds one per segment for as long as that
//! segment is scheduled on the output.

use crate::error::ResourceAccessError;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host mechanism that grants and revokes access to a storage location.
pub trait LocationAccess: Send + Sync {
    fn start_accessing(&self, location: &Path) -> Result<(), ResourceAccessError>;
    fn stop_accessing(&self, location: &Path);
}

/// Plain filesystem access: a location is accessible when it can be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemAccess;

impl LocationAccess for FileSystemAccess {
    fn start_accessing(&self, location: &Path) -> Result<(), ResourceAccessError> {
        if !location.exists() {
            return Err(ResourceAccessError::Missing {
                path: location.to_path_buf(),
            });
        }
        File::open(location)
            .map(|_| ())
            .map_err(|e| ResourceAccessError::Denied {
                path: location.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn stop_accessing(&self, _location: &Path) {}
}

/// Access to one location, released when dropped.
pub struct Lease {
    access: Arc<dyn LocationAccess>,
    location: PathBuf,
}

impl Lease {
    pub fn acquire(
        access: &Arc<dyn LocationAccess>,
        location: &Path,
    ) -> Result<Self, ResourceAccessError> {
        access.start_accessing(location)?;
        log::debug!("Lease acquired: {}", location.display());
        Ok(Self {
            access: Arc::clone(access),
            location: location.to_path_buf(),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.access.stop_accessing(&self.location);
        log::debug!("Lease released: {}", self.location.display());
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("location", &self.location)
            .finish()
    }
}
