//! Content fingerprint of the raw document bytes.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::StatementGuardError;
use crate::StatementGuardResult;

/// Lowercase hex SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Read the whole file. A failure here aborts the analysis.
pub fn read_document<P: AsRef<Path>>(path: P) -> StatementGuardResult<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| StatementGuardError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn fingerprint_file<P: AsRef<Path>>(path: P) -> StatementGuardResult<String> {
    Ok(fingerprint(&read_document(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_matches_bytes() {
        let path = std::env::temp_dir().join("statement_guard_fingerprint_test.bin");
        std::fs::write(&path, b"%PDF-1.7 sample").unwrap();
        let from_file = fingerprint_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(from_file, fingerprint(b"%PDF-1.7 sample"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            fingerprint_file("/no/such/statement.pdf"),
            Err(StatementGuardError::Io { .. })
        ));
    }
}
