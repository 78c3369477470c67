//! Content fingerprinting
//!
//! A fingerprint is the first 64 bits of a BLAKE3 digest, rendered as 16
//! lowercase hex characters. It is the content-addressed key for every
//! archived file and the filename stem inside the archive.

use crate::error::{CoreError, CoreResult};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Read buffer for streaming hashes
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Number of hex characters in a fingerprint
pub const FINGERPRINT_LEN: usize = 16;

/// 64-bit content fingerprint, 16 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse a fingerprint from its hex form
    pub fn parse(s: &str) -> CoreResult<Self> {
        if s.len() == FINGERPRINT_LEN
            && s.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::Invalid(format!("not a fingerprint: {s:?}")))
        }
    }

    /// Fingerprint of an in-memory buffer
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = blake3::hash(bytes);
        Self::from_digest(&digest)
    }

    fn from_digest(digest: &blake3::Hash) -> Self {
        let mut s = String::with_capacity(FINGERPRINT_LEN);
        for byte in &digest.as_bytes()[..FINGERPRINT_LEN / 2] {
            s.push_str(&format!("{byte:02x}"));
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-hex-character directory bucket for derived artifacts
    pub fn bucket(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Streaming file hasher
///
/// Shells out to a `b3sum` binary when one is on the PATH and falls back to
/// the in-process implementation; both produce the same fingerprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHasher;

static B3SUM_AVAILABLE: OnceCell<bool> = OnceCell::new();

impl FileHasher {
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint a file without loading it whole
    pub async fn hash_file(&self, path: &Path) -> CoreResult<Fingerprint> {
        if Self::b3sum_available() {
            match Self::hash_with_b3sum(path).await {
                Ok(fp) => return Ok(fp),
                Err(e) => {
                    tracing::debug!("b3sum failed for {}, falling back: {}", path.display(), e);
                }
            }
        }
        Self::hash_in_process(path).await
    }

    fn b3sum_available() -> bool {
        *B3SUM_AVAILABLE.get_or_init(|| {
            std::process::Command::new("b3sum")
                .arg("--version")
                .output()
                .map(|out| out.status.success())
                .unwrap_or(false)
        })
    }

    async fn hash_with_b3sum(path: &Path) -> CoreResult<Fingerprint> {
        let output = Command::new("b3sum")
            .arg("--no-names")
            .arg(path)
            .output()
            .await?;
        if !output.status.success() {
            return Err(CoreError::hash(format!(
                "b3sum exited with {}",
                output.status
            )));
        }
        let hex = String::from_utf8_lossy(&output.stdout);
        let hex = hex.trim();
        if hex.len() < FINGERPRINT_LEN {
            return Err(CoreError::hash("b3sum produced a short digest"));
        }
        Fingerprint::parse(&hex[..FINGERPRINT_LEN])
    }

    async fn hash_in_process(path: &Path) -> CoreResult<Fingerprint> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| CoreError::hash(format!("open {}: {e}", path.display())))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

        loop {
            let bytes_read = file
                .read(&mut buffer)
                .await
                .map_err(|e| CoreError::hash(format!("read {}: {e}", path.display())))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Fingerprint::from_digest(&hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_of_bytes_is_sixteen_lowercase_hex() {
        let fp = Fingerprint::of_bytes(b"test content");
        assert_eq!(fp.as_str().len(), FINGERPRINT_LEN);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fingerprint_matches_blake3_prefix() {
        let full = blake3::hash(b"test content").to_hex();
        let fp = Fingerprint::of_bytes(b"test content");
        assert_eq!(fp.as_str(), &full.as_str()[..FINGERPRINT_LEN]);
    }

    #[test]
    fn parse_rejects_uppercase_and_short_input() {
        assert!(Fingerprint::parse("ABCDEF0123456789").is_err());
        assert!(Fingerprint::parse("abc").is_err());
        assert!(Fingerprint::parse("0123456789abcdef").is_ok());
    }

    #[test]
    fn bucket_is_first_two_characters() {
        let fp = Fingerprint::parse("ab23456789abcdef").unwrap();
        assert_eq!(fp.bucket(), "ab");
    }

    #[tokio::test]
    async fn streaming_hash_matches_buffer_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        let data = vec![7u8; 200_000];
        tokio::fs::write(&path, &data).await.unwrap();

        let streamed = FileHasher::hash_in_process(&path).await.unwrap();
        assert_eq!(streamed, Fingerprint::of_bytes(&data));
    }
}
