//! stream/io.rs
//! Normalized input: positioned-read sources + output sink helpers.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::constants::OUTPUT_BUFFER_SIZE;
use crate::types::StreamError;

/// Byte-addressable, read-only record source.
///
/// Reads are positioned: there is no shared cursor, so any number of workers
/// may read disjoint (or overlapping) ranges concurrently.
pub trait RecordSource: Send + Sync {
    /// Total size in bytes, fixed when the source was opened.
    fn len(&self) -> u64;

    /// Fill `buf` from `offset`. Fails with `UnexpectedEof` past the end.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()>;

    /// Base file name, used by inference to break ties.
    fn name(&self) -> Option<&str> {
        None
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical input abstraction
pub enum InputSource {
    File(PathBuf),
    Memory { bytes: Vec<u8>, name: Option<String> },
    /// Non-seekable input (e.g. stdin); spooled into memory on open.
    Reader(Box<dyn Read + Send>),
}

/// Normalize an input into a positioned-read source.
pub fn open_input(src: InputSource) -> Result<Box<dyn RecordSource>, StreamError> {
    let source: Box<dyn RecordSource> = match src {
        InputSource::File(path) => Box::new(FileSource::open(path)?),
        InputSource::Memory { bytes, name } => Box::new(MemorySource::new(bytes, name)),
        InputSource::Reader(mut r) => {
            let mut buf = Vec::new();
            r.read_to_end(&mut buf)?;
            Box::new(MemorySource::new(buf, None))
        }
    };
    Ok(source)
}

// ================= File =================

#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: u64,
    name: Option<String>,
    path: PathBuf,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| StreamError::Open {
            path: path.clone(),
            source,
        })?;
        let len = file.metadata()?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        Ok(Self { file, len, name, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    #[cfg(unix)]
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_exact_at(&self, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        while !buf.is_empty() {
            match self.file.seek_read(buf, offset) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// ================= Memory =================

#[derive(Debug, Clone)]
pub struct MemorySource {
    bytes: Bytes,
    name: Option<String>,
}

impl MemorySource {
    pub fn new(bytes: impl Into<Bytes>, name: Option<String>) -> Self {
        Self { bytes: bytes.into(), name }
    }
}

impl RecordSource for MemorySource {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let start = usize::try_from(offset).map_err(|_| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let end = start
            .checked_add(buf.len())
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buf.copy_from_slice(&self.bytes[start..end]);
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// ================= Output =================

/// Buffered document sink.
///
/// `flush_each` forces a flush after every document, for interactive
/// filtering where matches are sparse.
pub struct DocumentWriter<W: Write> {
    out: BufWriter<W>,
    flush_each: bool,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(sink: W, flush_each: bool) -> Self {
        Self {
            out: BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, sink),
            flush_each,
        }
    }

    /// Write one document followed by a newline.
    pub fn write_document(&mut self, doc: &[u8]) -> io::Result<()> {
        self.out.write_all(doc)?;
        self.out.write_all(b"\n")?;
        if self.flush_each {
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn write_count(&mut self, count: u64) -> io::Result<()> {
        writeln!(self.out, "{count}")
    }

    pub fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Drop whatever is still buffered without writing it to the sink.
    pub fn discard(self) {
        let (_sink, _unflushed) = self.out.into_parts();
    }
}
