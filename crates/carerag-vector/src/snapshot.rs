//! Two-artifact snapshot of a vector store.
//!
//! `index.bin` holds the raw vectors behind a small header
//! (`CRVI`, format version, dimension, count; all little-endian).
//! `data.json` holds the parallel texts and metadata plus the blake3
//! checksum of `index.bin`, which ties the two files together.
//! Each file is written to a uniquely named temp file in the same
//! directory, synced, and renamed into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use carerag_core::error::{Error, Result};
use carerag_core::types::ChunkMetadata;

use crate::index::FlatL2Index;

pub const INDEX_FILE: &str = "index.bin";
pub const DATA_FILE: &str = "data.json";

const MAGIC: &[u8; 4] = b"CRVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Everything a store needs to come back to the state it was saved in.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub index: FlatL2Index,
    pub texts: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct DataFileRef<'a> {
    dimension: usize,
    texts: &'a [String],
    metadata: &'a [ChunkMetadata],
    checksum: String,
    saved_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct DataFile {
    dimension: usize,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
    checksum: String,
    saved_at: DateTime<Utc>,
}

pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

pub fn data_path(dir: &Path) -> PathBuf {
    dir.join(DATA_FILE)
}

/// True when both artifacts are present.
pub fn exists(dir: &Path) -> bool {
    index_path(dir).is_file() && data_path(dir).is_file()
}

pub fn save(
    dir: &Path,
    index: &FlatL2Index,
    texts: &[String],
    metadata: &[ChunkMetadata],
) -> Result<()> {
    if texts.len() != index.len() || metadata.len() != index.len() {
        return Err(Error::Operation(format!(
            "store out of lock-step: {} vectors, {} texts, {} metadata",
            index.len(),
            texts.len(),
            metadata.len()
        )));
    }

    let bytes = encode_index(index);
    let checksum = blake3::hash(&bytes).to_hex().to_string();
    let data = DataFileRef {
        dimension: index.dim(),
        texts,
        metadata,
        checksum,
        saved_at: Utc::now(),
    };
    let json = serde_json::to_vec_pretty(&data)?;

    fs::create_dir_all(dir)?;
    write_atomic(dir, &index_path(dir), &bytes)?;
    write_atomic(dir, &data_path(dir), &json)?;

    info!(
        dir = %dir.display(),
        vectors = index.len(),
        bytes = bytes.len(),
        checksum = %data.checksum,
        "saved vector store snapshot"
    );
    Ok(())
}

/// `Ok(None)` when the snapshot is absent or only half present.
pub fn load(dir: &Path) -> Result<Option<Snapshot>> {
    let (index_file, data_file) = (index_path(dir), data_path(dir));
    match (index_file.is_file(), data_file.is_file()) {
        (true, true) => {}
        (false, false) => {
            debug!(dir = %dir.display(), "no snapshot found");
            return Ok(None);
        }
        _ => {
            info!(dir = %dir.display(), "partial snapshot found; ignoring it");
            return Ok(None);
        }
    }

    let bytes = fs::read(&index_file)?;
    let data: DataFile = serde_json::from_slice(&fs::read(&data_file)?)
        .map_err(|e| Error::SnapshotCorrupt(format!("{}: {e}", data_file.display())))?;

    let checksum = blake3::hash(&bytes).to_hex().to_string();
    if checksum != data.checksum {
        return Err(Error::SnapshotCorrupt(format!(
            "checksum mismatch: {} records {}, {} hashes to {}",
            DATA_FILE, data.checksum, INDEX_FILE, checksum
        )));
    }

    let index = decode_index(&bytes)?;
    if index.dim() != data.dimension {
        return Err(Error::SnapshotCorrupt(format!(
            "{} has dimension {}, {} records {}",
            INDEX_FILE,
            index.dim(),
            DATA_FILE,
            data.dimension
        )));
    }
    if data.texts.len() != index.len() || data.metadata.len() != index.len() {
        return Err(Error::SnapshotCorrupt(format!(
            "{} vectors, {} texts, {} metadata",
            index.len(),
            data.texts.len(),
            data.metadata.len()
        )));
    }

    Ok(Some(Snapshot {
        index,
        texts: data.texts,
        metadata: data.metadata,
        saved_at: data.saved_at,
    }))
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn encode_index(index: &FlatL2Index) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + index.as_slice().len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(index.dim() as u32).to_le_bytes());
    out.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for x in index.as_slice() {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

fn decode_index(bytes: &[u8]) -> Result<FlatL2Index> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::SnapshotCorrupt(format!("{INDEX_FILE} is truncated")));
    }
    if &bytes[0..4] != MAGIC {
        return Err(Error::SnapshotCorrupt(format!("{INDEX_FILE} has a bad magic header")));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(Error::SnapshotCorrupt(format!(
            "unsupported {INDEX_FILE} format version {version}"
        )));
    }
    let dim = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[12..HEADER_LEN]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let body = &bytes[HEADER_LEN..];
    let expected = count.checked_mul(dim).and_then(|n| n.checked_mul(4));
    if expected != Some(body.len()) {
        return Err(Error::SnapshotCorrupt(format!(
            "{INDEX_FILE} holds {} bytes of vectors, header promises {count} x {dim}",
            body.len()
        )));
    }

    let data = body
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    FlatL2Index::from_raw(dim, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (FlatL2Index, Vec<String>, Vec<ChunkMetadata>) {
        let mut index = FlatL2Index::new(2);
        index.add(&[0.25, -1.5]).unwrap();
        index.add(&[3.0, 0.0]).unwrap();
        let texts = vec!["first".to_string(), "second".to_string()];
        let metadata = vec![ChunkMetadata::new("a"), ChunkMetadata::custom()];
        (index, texts, metadata)
    }

    #[test]
    fn header_layout_is_stable() {
        let (index, _, _) = sample();
        let bytes = encode_index(&index);
        assert_eq!(&bytes[0..4], b"CRVI");
        assert_eq!(bytes.len(), HEADER_LEN + 2 * 2 * 4);
        assert_eq!(decode_index(&bytes).unwrap(), index);
    }

    #[test]
    fn save_then_load_restores_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (index, texts, metadata) = sample();
        save(dir.path(), &index, &texts, &metadata).unwrap();
        assert!(exists(dir.path()));

        let snap = load(dir.path()).unwrap().expect("snapshot present");
        assert_eq!(snap.index, index);
        assert_eq!(snap.texts, texts);
        assert_eq!(snap.metadata, metadata);
    }

    #[test]
    fn missing_or_partial_snapshot_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).unwrap().is_none());

        let (index, texts, metadata) = sample();
        save(dir.path(), &index, &texts, &metadata).unwrap();
        fs::remove_file(data_path(dir.path())).unwrap();
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn tampered_index_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let (index, texts, metadata) = sample();
        save(dir.path(), &index, &texts, &metadata).unwrap();

        let mut bytes = fs::read(index_path(dir.path())).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(index_path(dir.path()), bytes).unwrap();

        assert!(matches!(load(dir.path()), Err(Error::SnapshotCorrupt(_))));
    }

    #[test]
    fn bad_magic_and_truncation_are_corrupt() {
        assert!(decode_index(b"CRV").is_err());
        let (index, _, _) = sample();
        let mut bytes = encode_index(&index);
        bytes[0] = b'X';
        assert!(matches!(decode_index(&bytes), Err(Error::SnapshotCorrupt(_))));
        let mut bytes = encode_index(&index);
        bytes.pop();
        assert!(matches!(decode_index(&bytes), Err(Error::SnapshotCorrupt(_))));
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let (index, texts, metadata) = sample();
        save(dir.path(), &index, &texts, &metadata).unwrap();
        save(dir.path(), &index, &texts, &metadata).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![DATA_FILE, INDEX_FILE]);
    }

    #[test]
    fn refuses_to_save_out_of_step_state() {
        let dir = tempfile::tempdir().unwrap();
        let (index, texts, _) = sample();
        assert!(save(dir.path(), &index, &texts, &[]).is_err());
        assert!(!exists(dir.path()));
    }
}
