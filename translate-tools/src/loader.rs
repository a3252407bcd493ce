/// Violations of the DOS 3.3 binary file format.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HeaderError {
    #[error("missing DOS 3.3 file header")]
    Missing,

    #[error("invalid DOS 3.3 file header")]
    Invalid,
}

/// Parses a DOS 3.3 binary file: a 4-byte header `start_lo, start_hi,
/// size_lo, size_hi` followed by exactly `size` payload bytes. The payload
/// must fit below the top of the 16-bit address space.
pub fn parse_dos33(bytes: &[u8]) -> Result<(u16, Vec<u8>), HeaderError> {
    if bytes.len() < 4 {
        return Err(HeaderError::Missing);
    }
    let start = u16::from_le_bytes([bytes[0], bytes[1]]);
    let size = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
    if size > 0x10000 - start as usize || size != bytes.len() - 4 {
        return Err(HeaderError::Invalid);
    }
    Ok((start, bytes[4..].to_vec()))
}
