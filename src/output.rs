use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

/// A file written next to its destination and renamed over it once complete.
///
/// Dropping it without calling `persist` removes the temporary file, so a failed encode never
/// leaves a partial image behind.
pub struct AtomicFile {
    dest: PathBuf,
    tmp: PathBuf,
    file: Option<File>,
    persisted: bool,
}

fn temporary_sibling(dest: &Path) -> io::Result<PathBuf> {
    let name = dest.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} does not name a file", dest.display()),
        )
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(format!(".{}.tmp", process::id()));
    Ok(dest.with_file_name(tmp_name))
}

impl AtomicFile {
    pub fn create<P: AsRef<Path>>(dest: P) -> io::Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        let tmp = temporary_sibling(&dest)?;
        let file = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
        debug!("output: staging {} in {}", dest.display(), tmp.display());
        Ok(AtomicFile {
            dest,
            tmp,
            file: Some(file),
            persisted: false,
        })
    }

    pub fn temporary_path(&self) -> &Path {
        &self.tmp
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "output already closed"))
    }

    /// Syncs the data and moves it onto the destination path.
    pub fn persist(mut self) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        fs::rename(&self.tmp, &self.dest)?;
        self.persisted = true;
        Ok(())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        self.file.take();
        if let Err(e) = fs::remove_file(&self.tmp) {
            warn!("output: cannot remove {}: {}", self.tmp.display(), e);
        } else {
            debug!("output: discarded {}", self.tmp.display());
        }
    }
}
