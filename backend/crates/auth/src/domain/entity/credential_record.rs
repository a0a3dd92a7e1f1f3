//! Credential Record Entity
//!
//! On-disk layout of one record, with no header, version or checksum:
//!
//! ```text
//! <username bytes> '\n' <32 hash bytes> <16 salt bytes> '\n'
//! ```
//!
//! Hash and salt are raw bytes and may themselves contain `\n`, so only the
//! username is newline-delimited; the rest is read by length.

use platform::password::{HASH_LEN, PasswordDigest, SALT_LEN, Salt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::domain::value_object::user_name::UserName;
use crate::error::{AuthError, AuthResult};

/// Bytes after the username delimiter: hash, salt, trailing newline
const BODY_LEN: usize = HASH_LEN + SALT_LEN + 1;

/// One username → (hash, salt) entry
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    username: Vec<u8>,
    hash: PasswordDigest,
    salt: Salt,
}

impl CredentialRecord {
    pub fn new(username: &UserName, hash: PasswordDigest, salt: Salt) -> Self {
        Self {
            username: username.as_bytes().to_vec(),
            hash,
            salt,
        }
    }

    /// Byte-exact username comparison
    pub fn matches(&self, name: &UserName) -> bool {
        self.username == name.as_bytes()
    }

    pub fn username_bytes(&self) -> &[u8] {
        &self.username
    }

    pub fn hash(&self) -> &PasswordDigest {
        &self.hash
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Total encoded size
    pub fn encoded_len(&self) -> usize {
        self.username.len() + 1 + BODY_LEN
    }

    /// Serialize in the on-disk layout
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.username);
        out.push(b'\n');
        out.extend_from_slice(self.hash.as_bytes());
        out.extend_from_slice(self.salt.as_bytes());
        out.push(b'\n');
        out
    }
}

/// A record together with the byte offset it starts at
#[derive(Debug, Clone)]
pub struct LocatedRecord {
    pub offset: u64,
    pub record: CredentialRecord,
}

impl LocatedRecord {
    /// Offset of the 48 hash+salt bytes
    pub fn hash_offset(&self) -> u64 {
        self.offset + self.record.username.len() as u64 + 1
    }
}

/// Sequential reader over a credential store
///
/// Works over any buffered async reader: an open file, or an in-memory
/// copy of one (`&[u8]`).
pub struct RecordScanner<R> {
    reader: R,
    offset: u64,
}

impl<R> RecordScanner<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    /// Read the next record
    ///
    /// ## Returns
    /// - `Ok(Some(_))` for a complete record
    /// - `Ok(None)` when the data ends exactly on a record boundary
    /// - `Err(AuthError::CorruptRecord)` when it ends anywhere else, or the
    ///   trailing delimiter is not `\n`
    pub async fn next_record(&mut self) -> AuthResult<Option<LocatedRecord>> {
        let start = self.offset;

        let mut username = Vec::new();
        let read = self.reader.read_until(b'\n', &mut username).await?;
        if read == 0 {
            return Ok(None);
        }
        if username.pop() != Some(b'\n') {
            return Err(AuthError::CorruptRecord { offset: start });
        }

        let mut body = [0u8; BODY_LEN];
        self.reader
            .read_exact(&mut body)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => AuthError::CorruptRecord { offset: start },
                _ => AuthError::Io(e),
            })?;
        if body[BODY_LEN - 1] != b'\n' {
            return Err(AuthError::CorruptRecord { offset: start });
        }

        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&body[..HASH_LEN]);
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&body[HASH_LEN..HASH_LEN + SALT_LEN]);

        self.offset = start + read as u64 + BODY_LEN as u64;

        Ok(Some(LocatedRecord {
            offset: start,
            record: CredentialRecord {
                username,
                hash: PasswordDigest::from_bytes(hash),
                salt: Salt::from_bytes(salt),
            },
        }))
    }

    /// Scan forward to the first record named `name`
    pub async fn find(&mut self, name: &UserName) -> AuthResult<Option<LocatedRecord>> {
        while let Some(located) = self.next_record().await? {
            if located.record.matches(name) {
                return Ok(Some(located));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, fill: u8) -> CredentialRecord {
        CredentialRecord::new(
            &UserName::new(name).unwrap(),
            PasswordDigest::from_bytes([fill; HASH_LEN]),
            Salt::from_bytes([fill.wrapping_add(1); SALT_LEN]),
        )
    }

    #[test]
    fn test_encode_layout() {
        let bytes = record("bob", 0xaa).encode();
        assert_eq!(bytes.len(), 3 + 1 + 32 + 16 + 1);
        assert_eq!(&bytes[..4], b"bob\n");
        assert!(bytes[4..36].iter().all(|&b| b == 0xaa));
        assert!(bytes[36..52].iter().all(|&b| b == 0xab));
        assert_eq!(bytes[52], b'\n');
    }

    #[tokio::test]
    async fn test_scan_multiple_records_with_offsets() {
        let mut data = record("alice", 1).encode();
        // hash bytes equal to '\n' must not confuse the reader
        data.extend(record("bob", b'\n').encode());

        let mut scanner = RecordScanner::new(&data[..]);
        let first = scanner.next_record().await.unwrap().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.record.username_bytes(), b"alice");
        assert_eq!(first.hash_offset(), 6);

        let second = scanner.next_record().await.unwrap().unwrap();
        assert_eq!(second.offset, first.record.encoded_len() as u64);
        assert_eq!(second.record.username_bytes(), b"bob");
        assert_eq!(second.record.hash().as_bytes(), &[b'\n'; HASH_LEN]);

        assert!(scanner.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_input_is_clean_end() {
        let mut scanner = RecordScanner::new(&b""[..]);
        assert!(scanner.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_truncated_body_is_corrupt() {
        let data = record("alice", 1).encode();
        for cut in [1, 6, 20, data.len() - 1] {
            let mut scanner = RecordScanner::new(&data[..cut]);
            let err = scanner.next_record().await.unwrap_err();
            assert!(
                matches!(err, AuthError::CorruptRecord { offset: 0 }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_truncated_second_record_reports_its_offset() {
        let mut data = record("alice", 1).encode();
        let first_len = data.len() as u64;
        data.extend_from_slice(b"bob\n\x01\x02");

        let mut scanner = RecordScanner::new(&data[..]);
        assert!(scanner.next_record().await.unwrap().is_some());
        let err = scanner.next_record().await.unwrap_err();
        assert!(matches!(err, AuthError::CorruptRecord { offset } if offset == first_len));
    }

    #[tokio::test]
    async fn test_bad_trailing_byte_is_corrupt() {
        let mut data = record("alice", 1).encode();
        let last = data.len() - 1;
        data[last] = b'x';

        let mut scanner = RecordScanner::new(&data[..]);
        assert!(matches!(
            scanner.next_record().await,
            Err(AuthError::CorruptRecord { offset: 0 })
        ));
    }

    #[tokio::test]
    async fn test_find_is_exact_match() {
        let mut data = record("Alice", 1).encode();
        data.extend(record("alice", 2).encode());

        let mut scanner = RecordScanner::new(&data[..]);
        let found = scanner
            .find(&UserName::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.record.hash().as_bytes(), &[2u8; HASH_LEN]);

        let mut scanner = RecordScanner::new(&data[..]);
        assert!(
            scanner
                .find(&UserName::new("ALICE").unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }
}
