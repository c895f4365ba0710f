//! # Persistence Framing Module
//!
//! The on-disk contract for a saved recording: a one-byte compression flag
//! followed by the serialized recording payload. This writer emits flag `0`
//! (uncompressed JSON); readers must honor the flag-then-payload framing and
//! reject flags they do not understand. Object-graph versioning beyond the
//! flag is a concern for the tools that own the files.

use std::io::{Read, Write};

use log::debug;

use crate::error::PersistError;
use crate::timeline::Recording;

/// Flag byte for an uncompressed JSON payload.
pub const FLAG_UNCOMPRESSED: u8 = 0;

/// Writes the flag byte and the serialized recording.
pub fn save<W: Write>(recording: &Recording, writer: &mut W) -> Result<(), PersistError> {
    writer.write_all(&[FLAG_UNCOMPRESSED])?;
    serde_json::to_writer(&mut *writer, recording)?;
    writer.flush()?;
    debug!("persist: saved recording ({} sections)", recording.sections().len());
    Ok(())
}

/// Reads the flag byte, then the payload it announces.
pub fn load<R: Read>(reader: &mut R) -> Result<Recording, PersistError> {
    let mut flag = [0u8; 1];
    match reader.read_exact(&mut flag) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(PersistError::MissingFlag);
        }
        Err(e) => return Err(e.into()),
    }
    match flag[0] {
        FLAG_UNCOMPRESSED => Ok(serde_json::from_reader(reader)?),
        other => Err(PersistError::UnsupportedCompression(other)),
    }
}
