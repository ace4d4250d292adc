use std::{
    fs::File,
    path::{Path, PathBuf},
};

use memmap2::Mmap;
use sakubiki_common::{Result, error::Error};

/// A file mapped read-only into memory.
///
/// The bytes are valid for as long as the `MappedFile` is alive. Empty files
/// are represented without a mapping, since a zero-length mapping cannot be
/// created.
///
/// Changes made to the file by other processes while it is mapped may become
/// visible through the slice. Truncating the file underneath a live mapping
/// is undefined behavior at the OS level.
pub struct MappedFile {
    path: PathBuf,
    map: Option<Mmap>,
}

impl MappedFile {
    /// Opens and maps the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`sakubiki_common::error::ErrorKind::Io`] naming the path if
    /// the file cannot be opened or mapped.
    pub fn open(path: impl AsRef<Path>) -> Result<MappedFile> {
        let path = path.as_ref();
        let context = || path.display().to_string();
        let file = File::open(path).map_err(|e| Error::io(context(), e))?;
        let metadata = file.metadata().map_err(|e| Error::io(context(), e))?;
        if !metadata.is_file() {
            return Err(Error::invalid_arg("path", format!("{} is not a file", context())));
        }
        let len = usize::try_from(metadata.len())
            .map_err(|_| Error::invalid_arg("path", format!("{} is too large to map", context())))?;

        let map = if len == 0 {
            None
        } else {
            // The file is opened read-only and the map is never written through.
            let map = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(context(), e))?;
            Some(map)
        };
        log::trace!("mapped {} ({len} bytes)", path.display());
        Ok(MappedFile {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::ops::Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}
