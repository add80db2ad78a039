//! Save/restore for the plant engine.
//!
//! Wire layout: 4-byte magic, u16 format version, u32 CRC32 of the
//! compressed body, then an lz4-compressed postcard image of the engine.
//! File writes go through a temp file and an atomic rename so a crashed
//! save never corrupts the previous one. A restored engine steps
//! bit-identically to the original.

use fourloop_core::Engine;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// File magic: four-loop plant save.
pub const MAGIC: [u8; 4] = *b"FLPS";

/// Current format version. Bump on any breaking state-schema change.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("not a plant save (bad magic)")]
    BadMagic,

    #[error("unsupported save version {found} (supported: {supported})")]
    VersionMismatch { found: u16, supported: u16 },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("truncated save: {0} bytes")]
    Truncated(usize),

    #[error("state codec failed: {0}")]
    Codec(#[from] postcard::Error),

    #[error("decompress failed: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Serialize the engine to the versioned wire format.
pub fn save_engine(engine: &Engine) -> Result<Vec<u8>, SaveError> {
    let body = postcard::to_allocvec(engine)?;
    let compressed = lz4_flex::compress_prepend_size(&body);
    let crc = crc32fast::hash(&compressed);

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Restore an engine from bytes produced by [`save_engine`].
pub fn load_engine(bytes: &[u8]) -> Result<Engine, SaveError> {
    if bytes.len() < HEADER_LEN {
        return Err(SaveError::Truncated(bytes.len()));
    }
    if bytes[0..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            found: version,
            supported: FORMAT_VERSION,
        });
    }
    let stored = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let compressed = &bytes[HEADER_LEN..];
    let computed = crc32fast::hash(compressed);
    if stored != computed {
        return Err(SaveError::ChecksumMismatch { stored, computed });
    }
    let body = lz4_flex::decompress_size_prepended(compressed)?;
    Ok(postcard::from_bytes(&body)?)
}

/// Write a save atomically: temp file in the target directory, then rename.
pub fn save_to_path(engine: &Engine, path: &Path) -> Result<(), SaveError> {
    let bytes = save_engine(engine)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "plant-save".into())
    ));
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<Engine, SaveError> {
    let bytes = std::fs::read(path)?;
    load_engine(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourloop_core::{InitialCondition, OperatorInputs};

    const DT: f64 = 10.0 / 3600.0;

    #[test]
    fn round_trip_preserves_stepping() {
        let mut a = Engine::new(InitialCondition::HotFullPower);
        for _ in 0..30 {
            a.step(DT, &OperatorInputs::none()).unwrap();
        }
        let bytes = save_engine(&a).unwrap();
        let mut b = load_engine(&bytes).unwrap();

        for _ in 0..30 {
            let ra = a.step(DT, &OperatorInputs::none()).unwrap();
            let rb = b.step(DT, &OperatorInputs::none()).unwrap();
            assert_eq!(
                ra.snapshot.rcs_pressure_psia.to_bits(),
                rb.snapshot.rcs_pressure_psia.to_bits()
            );
            assert_eq!(
                ra.snapshot.total_primary_mass_lb.to_bits(),
                rb.snapshot.total_primary_mass_lb.to_bits()
            );
            assert_eq!(
                ra.snapshot.t_avg_f.to_bits(),
                rb.snapshot.t_avg_f.to_bits()
            );
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let engine = Engine::new(InitialCondition::ColdShutdownSolid);
        let mut bytes = save_engine(&engine).unwrap();
        bytes[0] = b'X';
        assert!(matches!(load_engine(&bytes), Err(SaveError::BadMagic)));
    }

    #[test]
    fn rejects_wrong_version() {
        let engine = Engine::new(InitialCondition::ColdShutdownSolid);
        let mut bytes = save_engine(&engine).unwrap();
        bytes[4] = 0xFF;
        assert!(matches!(
            load_engine(&bytes),
            Err(SaveError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn detects_corruption() {
        let engine = Engine::new(InitialCondition::ColdShutdownSolid);
        let mut bytes = save_engine(&engine).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x5A;
        assert!(matches!(
            load_engine(&bytes),
            Err(SaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn truncated_input_is_reported() {
        assert!(matches!(load_engine(&[1, 2, 3]), Err(SaveError::Truncated(3))));
    }

    #[test]
    fn atomic_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plant.flps");
        let mut engine = Engine::new(InitialCondition::HotStandby);
        for _ in 0..5 {
            engine.step(DT, &OperatorInputs::none()).unwrap();
        }
        save_to_path(&engine, &path).unwrap();
        let restored = load_from_path(&path).unwrap();
        assert_eq!(
            restored.snapshot().sim_time_hr.to_bits(),
            engine.snapshot().sim_time_hr.to_bits()
        );
        // No temp file left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
