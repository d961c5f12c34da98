//! Region archive files, one per exported region.
//!
//! An archive starts with a fixed header of `Region::BUFFER_SIZE` slots, one per chunk column of
//! the region, laid out in [`RegionChunk::to_index`] order. A slot is a big-endian `u32` pair:
//! the first sector of the column and how many sectors it spans. Sectors are `SECTOR_SIZE`
//! bytes long and the header itself fills the first two, so a zero start sector marks an
//! absent column and a file holding no columns is exactly `HEADER_SIZE` bytes.
//!
//! Column payloads are bincode encoded and wrapped in an lz4 frame. Reads look the slot up,
//! read its sectors and decode them. Decoding stops at the end of the lz4 frame, so the zero
//! padding of the last sector is never looked at.
//!
//! A column rewritten with a payload that still fits its sectors is stored in place. A larger
//! one is appended at the end of the file and its previous sectors are left unused.
//! Header changes stay in memory until [`RegionArchive::save_header`].
use std::{io::SeekFrom, path::Path};

use async_fs::{File, OpenOptions};
use futures_lite::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use thiserror::Error;
use tracing::trace;
use voxmap_core::coords::{Region, RegionChunk};

mod writer;
pub use writer::{ArchiveConfig, ArchiveRegionWriter, CHUNK_STAGES, ChunkColumn, ColumnEntry};

/// Size, in bytes, of each sector within the archive.
const SECTOR_SIZE: usize = 4096;
/// Size, in bytes, of each index within the archive.
const SECTOR_INDEX_SIZE: usize = 4 + 4; // 4 bytes for offset and another 4 for sectors
/// Size, in bytes, of header section of the archive.
const HEADER_SIZE: usize = SECTOR_INDEX_SIZE * Region::BUFFER_SIZE;

/// Failures while reading or writing a [`RegionArchive`].
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file couldn't be opened, read, written or seeked.
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    /// A stored column isn't a valid bincode payload.
    #[error("Failed to decode: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// A column couldn't be bincode encoded.
    #[error("Failed to encode: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The lz4 frame couldn't be written or read back.
    #[error("Failed to compress: {0}")]
    Compress(#[from] lz4_flex::frame::Error),
    /// Header doesn't have `HEADER_SIZE` bytes, so the file is truncated or not an archive.
    #[error("Invalid header size: {0}")]
    HeaderInvalid(usize),
    /// A column couldn't be placed in the archive.
    #[error("Failed to write: {0}")]
    Write(String),
}

/// Header slot of a single column.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
struct SectorIndex {
    /// First sector of the column. Zero when the column is absent.
    offset: u32,
    /// Sectors reserved for the column.
    sectors: u32,
}

impl SectorIndex {
    /// Sector zero belongs to the header, so no column can start there.
    #[inline]
    fn is_empty(&self) -> bool {
        self.offset == 0
    }

    /// Byte position of the column within the file.
    #[inline]
    fn seek_offset(&self) -> u64 {
        debug_assert_ne!(self.offset, 0);

        self.offset as u64 * SECTOR_SIZE as u64
    }

    /// Bytes reserved for the column, padding included.
    fn bytes_count(&self) -> usize {
        Self::sector_to_bytes(self.sectors)
    }

    /// Sectors needed by a payload of the given length.
    #[inline]
    fn sectors_count(bytes: usize) -> u32 {
        bytes.div_ceil(SECTOR_SIZE) as u32
    }

    /// Slot for a payload starting at the given file position, which must be sector aligned.
    fn from_seek_position(
        seek_position: u64,
        needed_sectors: u32,
    ) -> Result<SectorIndex, ArchiveError> {
        if seek_position % SECTOR_SIZE as u64 != 0 {
            return Err(ArchiveError::Write(format!(
                "Invalid seek position: {seek_position}. It should be in blocks of {SECTOR_SIZE}"
            )));
        }

        let offset = u32::try_from(seek_position / SECTOR_SIZE as u64)
            .map_err(|_| ArchiveError::Write(format!("Archive is full at {seek_position}")))?;

        Ok(Self {
            offset,
            sectors: needed_sectors,
        })
    }

    /// Encodes the slot as it's stored in the header.
    #[inline]
    fn as_bytes(&self) -> [u8; SECTOR_INDEX_SIZE] {
        ((self.offset as u64) << 32 | self.sectors as u64).to_be_bytes()
    }

    fn from_bytes(bytes: [u8; SECTOR_INDEX_SIZE]) -> Self {
        let i = u64::from_be_bytes(bytes);
        Self {
            offset: (i >> 32) as u32,
            sectors: (i & 0xFFFF_FFFF) as u32,
        }
    }

    #[inline]
    fn sector_to_bytes(sectors: u32) -> usize {
        sectors as usize * SECTOR_SIZE
    }
}

/// In-memory copy of the archive header. Changes only reach the file through
/// [`RegionArchive::save_header`].
#[derive(Default)]
struct Header {
    /// One slot per column, in [`RegionChunk::to_index`] order.
    sectors: Vec<SectorIndex>,
    /// Set when a slot changed since the header was last loaded or saved.
    dirty: bool,
}

impl Header {
    /// Header of an archive without columns.
    fn new() -> Self {
        Self {
            sectors: vec![Default::default(); Region::BUFFER_SIZE],
            dirty: false,
        }
    }

    /// Parses the header block read from the beginning of an archive file.
    fn de(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() != HEADER_SIZE {
            return Err(ArchiveError::HeaderInvalid(bytes.len()));
        }

        let sectors = bytes
            .chunks_exact(SECTOR_INDEX_SIZE)
            .map(|index| {
                let mut buffer = [0u8; SECTOR_INDEX_SIZE];
                buffer.copy_from_slice(index);
                SectorIndex::from_bytes(buffer)
            })
            .collect::<Vec<_>>();

        Ok(Self {
            sectors,
            dirty: false,
        })
    }

    /// Encodes every slot back to the on-disk header block.
    fn ser(&self) -> Result<Vec<u8>, ArchiveError> {
        let bytes = self
            .sectors
            .iter()
            .flat_map(SectorIndex::as_bytes)
            .collect::<Vec<_>>();

        if bytes.len() != HEADER_SIZE {
            Err(ArchiveError::HeaderInvalid(bytes.len()))
        } else {
            Ok(bytes)
        }
    }

    fn get_index(&self, chunk: RegionChunk) -> SectorIndex {
        self.sectors[chunk.to_index()]
    }

    /// Replaces the slot of the given column and marks the header for saving.
    fn set_index(&mut self, chunk: RegionChunk, index: SectorIndex) {
        self.sectors[chunk.to_index()] = index;
        self.dirty = true;
    }
}

/// Chunk columns of a single region, stored in one file. See the crate docs for the layout.
pub struct RegionArchive<T> {
    header: Header,
    file_handler: File,
    _pd: std::marker::PhantomData<T>,
}

impl<T> RegionArchive<T> {
    /// Opens the archive at the given path, keeping its columns.
    ///
    /// Missing parent directories are created. A missing or empty file becomes an archive with
    /// an empty header.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        Self::open_with(path.as_ref(), false).await
    }

    /// Creates a new archive at the given path, discarding any existing content.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        Self::open_with(path.as_ref(), true).await
    }

    async fn open_with(path: &Path, truncate: bool) -> Result<Self, ArchiveError> {
        if let Some(parent_dir) = path.parent() {
            async_fs::create_dir_all(parent_dir).await?;
        }

        trace!("Opening archive {path:?}. Truncate: {truncate}");

        let mut file_handler = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(truncate)
            .create(true)
            .open(path)
            .await?;

        let file_len = file_handler.seek(SeekFrom::End(0)).await?;

        let header = if file_len > 0 {
            let mut bytes = vec![0u8; HEADER_SIZE];
            file_handler.seek(SeekFrom::Start(0)).await?;
            file_handler.read_exact(&mut bytes).await?;
            Header::de(&bytes)?
        } else {
            let mut header = Header::new();
            header.dirty = true;
            header
        };

        let mut archive = Self {
            header,
            file_handler,
            _pd: Default::default(),
        };

        if archive.is_header_dirty() {
            archive.save_header().await?;
        }

        Ok(archive)
    }

    /// Writes the in-memory header to the file.
    ///
    /// [`RegionArchive::write`] doesn't do it, so call this once after the last column.
    pub async fn save_header(&mut self) -> Result<(), ArchiveError> {
        let bytes = self.header.ser()?;
        self.file_handler.seek(SeekFrom::Start(0)).await?;
        self.file_handler.write_all(&bytes).await?;
        self.file_handler.flush().await?;
        self.header.dirty = false;

        Ok(())
    }

    /// Checks if the header was modified since it was last saved or loaded.
    pub fn is_header_dirty(&self) -> bool {
        self.header.dirty
    }

    /// Checks if there is a column stored at the given local chunk.
    pub fn contains(&self, chunk: RegionChunk) -> bool {
        !self.header.get_index(chunk).is_empty()
    }
}

impl<T> RegionArchive<T>
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    /// Decodes the column stored at the given local chunk, if any.
    pub async fn read(&mut self, chunk: RegionChunk) -> Result<Option<T>, ArchiveError> {
        let index = self.header.get_index(chunk);

        if index.is_empty() {
            return Ok(None);
        }

        let mut buffer = vec![0u8; index.bytes_count()];

        self.file_handler
            .seek(SeekFrom::Start(index.seek_offset()))
            .await?;

        self.file_handler.read_exact(&mut buffer).await?;

        // Neither lz4_flex nor bincode are async, so the whole column is buffered first.
        let mut frame = lz4_flex::frame::FrameDecoder::new(&*buffer);
        let value: T =
            bincode::serde::decode_from_std_read(&mut frame, bincode::config::standard())?;

        Ok(Some(value))
    }

    /// Reads every stored column, in index order.
    pub async fn read_all(&mut self) -> Result<Vec<(RegionChunk, T)>, ArchiveError> {
        let mut values = vec![];

        for chunk in RegionChunk::all() {
            if let Some(value) = self.read(chunk).await? {
                values.push((chunk, value));
            }
        }

        Ok(values)
    }

    /// Stores the given column at the given local chunk, reusing its sectors when the new
    /// payload fits them.
    pub async fn write(&mut self, chunk: RegionChunk, value: &T) -> Result<(), ArchiveError> {
        let mut compressed = Vec::with_capacity(64 * 1024);
        let mut frame = lz4_flex::frame::FrameEncoder::new(&mut compressed);
        bincode::serde::encode_into_std_write(value, &mut frame, bincode::config::standard())?;
        frame.finish()?;

        let index = self.header.get_index(chunk);
        let needed_sectors = SectorIndex::sectors_count(compressed.len());

        let index = if index.is_empty() || needed_sectors > index.sectors {
            self.append(needed_sectors).await?
        } else {
            index
        };

        if index.is_empty() {
            return Err(ArchiveError::Write(format!(
                "No sectors available for column {chunk}"
            )));
        }

        compressed.resize(SectorIndex::sector_to_bytes(needed_sectors), 0);

        self.header.set_index(chunk, index);
        self.file_handler
            .seek(SeekFrom::Start(index.seek_offset()))
            .await?;
        self.file_handler.write_all(&compressed).await?;
        self.file_handler.flush().await?;

        Ok(())
    }

    /// Reserves the given number of sectors at the end of the file.
    async fn append(&mut self, needed_sectors: u32) -> Result<SectorIndex, ArchiveError> {
        let seek_position = self.file_handler.seek(SeekFrom::End(0)).await?;

        SectorIndex::from_seek_position(seek_position, needed_sectors)
    }
}
