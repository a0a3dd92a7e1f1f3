//! File-backed Credential Store
//!
//! Every operation opens the store file fresh and closes it before
//! returning; no handle, index or cache survives between calls.
//!
//! ## Writes
//! - New users are appended (the file is created on first add).
//! - A password change rewrites the whole file through a sibling temporary
//!   file and an atomic rename. The new content differs from the old only in
//!   the 48 hash+salt bytes of the changed record, so offsets and length are
//!   preserved while a crash leaves either the old or the new file, never a
//!   record with a new hash and an old salt.
//!
//! ## Concurrency
//! There is no locking. `add_user` checks then appends, and
//! `change_password` reads then renames; an external writer running between
//! the two steps can produce a duplicate user or have its write lost. The
//! server is the only intended writer.

use std::io;
use std::path::{Path, PathBuf};

use platform::password::{ClearTextPassword, HASH_LEN, SALT_LEN};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufReader};

use crate::domain::entity::credential_record::{CredentialRecord, LocatedRecord, RecordScanner};
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{user_name::UserName, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Credential store backed by a single flat file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_error(&self, source: io::Error) -> AuthError {
        AuthError::StoreOpen {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Linear scan from the start of a freshly opened file
    async fn find(&self, name: &UserName) -> AuthResult<Option<LocatedRecord>> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| self.open_error(e))?;
        let mut scanner = RecordScanner::new(BufReader::new(file));
        scanner.find(name).await
    }

    /// Write `contents` to a temporary file, sync it, and rename it over the store
    ///
    /// The temporary file takes the store's permissions before any record
    /// is written to it.
    async fn replace_atomically(&self, contents: &[u8]) -> AuthResult<()> {
        let tmp = self.temp_path();
        let permissions = fs::metadata(&self.path)
            .await
            .map_err(|e| self.open_error(e))?
            .permissions();

        let mut file = File::create(&tmp).await.map_err(|e| self.open_error(e))?;
        if let Err(e) = file.set_permissions(permissions).await {
            drop(file);
            let _ = fs::remove_file(&tmp).await;
            return Err(AuthError::Io(e));
        }
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AuthError::Io(e));
        }
        Ok(())
    }
}

impl CredentialRepository for FileCredentialStore {
    async fn lookup(&self, name: &UserName) -> AuthResult<Option<CredentialRecord>> {
        Ok(self.find(name).await?.map(|located| located.record))
    }

    async fn user_exists(&self, name: &UserName) -> AuthResult<bool> {
        Ok(self.find(name).await?.is_some())
    }

    async fn verify_password(
        &self,
        name: &UserName,
        password: &ClearTextPassword,
    ) -> AuthResult<bool> {
        let Some(located) = self.find(name).await? else {
            return Ok(false);
        };
        let record = located.record;
        Ok(password.verify(record.hash(), record.salt())?)
    }

    async fn add_user(&self, name: &UserName, password: &RawPassword) -> AuthResult<bool> {
        match self.find(name).await {
            Ok(Some(_)) => {
                tracing::debug!(user = %name, "User already exists, nothing appended");
                return Ok(false);
            }
            Ok(None) => {}
            // First user: the append below creates the file
            Err(AuthError::StoreOpen { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let (hash, salt) = password.inner().hash(None)?;
        let record = CredentialRecord::new(name, hash, salt);

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| self.open_error(e))?;
        file.write_all(&record.encode()).await?;
        file.flush().await?;
        file.sync_data().await?;

        tracing::info!(user = %name, path = %self.path.display(), "User added");
        Ok(true)
    }

    async fn change_password(&self, name: &UserName, password: &RawPassword) -> AuthResult<bool> {
        let mut contents = fs::read(&self.path).await.map_err(|e| self.open_error(e))?;

        let located = RecordScanner::new(&contents[..]).find(name).await?;
        let Some(located) = located else {
            tracing::debug!(user = %name, "Password change for unknown user");
            return Ok(false);
        };

        let (hash, salt) = password.inner().hash(None)?;

        let start = located.hash_offset() as usize;
        contents[start..start + HASH_LEN].copy_from_slice(hash.as_bytes());
        contents[start + HASH_LEN..start + HASH_LEN + SALT_LEN].copy_from_slice(salt.as_bytes());

        self.replace_atomically(&contents).await?;

        tracing::info!(user = %name, "Password changed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("passwd"))
    }

    fn name(s: &str) -> UserName {
        UserName::new(s).unwrap()
    }

    fn raw(s: &str) -> RawPassword {
        RawPassword::new(s).unwrap()
    }

    fn clear(s: &str) -> ClearTextPassword {
        ClearTextPassword::new(s)
    }

    async fn count_records(store: &FileCredentialStore, user: &UserName) -> usize {
        let bytes = fs::read(store.path()).await.unwrap();
        let mut scanner = RecordScanner::new(&bytes[..]);
        let mut count = 0;
        while let Some(located) = scanner.next_record().await.unwrap() {
            if located.record.matches(user) {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_add_then_verify() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.add_user(&name("alice"), &raw("wonderland")).await.unwrap());

        assert!(store.user_exists(&name("alice")).await.unwrap());
        assert!(store.verify_password(&name("alice"), &clear("wonderland")).await.unwrap());
        assert!(!store.verify_password(&name("alice"), &clear("wonderland!")).await.unwrap());
        assert!(!store.verify_password(&name("alice"), &clear("")).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add_user(&name("alice"), &raw("wonderland")).await.unwrap();

        assert!(!store.user_exists(&name("bob")).await.unwrap());
        assert!(!store.verify_password(&name("bob"), &clear("wonderland")).await.unwrap());
        assert!(store.lookup(&name("bob")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_returns_stored_salt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add_user(&name("alice"), &raw("wonderland")).await.unwrap();

        let record = store.lookup(&name("alice")).await.unwrap().unwrap();
        let (digest, _) = clear("wonderland")
            .hash(Some(record.salt().as_bytes()))
            .unwrap();
        assert!(digest.matches(record.hash()));
    }

    #[tokio::test]
    async fn test_add_user_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.add_user(&name("alice"), &raw("first")).await.unwrap());
        let len = fs::metadata(store.path()).await.unwrap().len();

        assert!(!store.add_user(&name("alice"), &raw("second")).await.unwrap());
        assert_eq!(fs::metadata(store.path()).await.unwrap().len(), len);
        assert_eq!(count_records(&store, &name("alice")).await, 1);

        // first write wins
        assert!(store.verify_password(&name("alice"), &clear("first")).await.unwrap());
        assert!(!store.verify_password(&name("alice"), &clear("second")).await.unwrap());
    }

    #[tokio::test]
    async fn test_change_password() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add_user(&name("alice"), &raw("old-pass")).await.unwrap();
        store.add_user(&name("bob"), &raw("builder")).await.unwrap();
        store.add_user(&name("carol"), &raw("singer")).await.unwrap();

        let before = fs::read(store.path()).await.unwrap();
        let alice = store.lookup(&name("alice")).await.unwrap().unwrap();

        assert!(store.change_password(&name("bob"), &raw("new-pass")).await.unwrap());

        let after = fs::read(store.path()).await.unwrap();
        assert_eq!(before.len(), after.len());

        assert!(!store.verify_password(&name("bob"), &clear("builder")).await.unwrap());
        assert!(store.verify_password(&name("bob"), &clear("new-pass")).await.unwrap());

        // Only bob's hash+salt bytes differ
        let hash_start = alice.encoded_len() + "bob\n".len();
        let hash_end = hash_start + HASH_LEN + SALT_LEN;
        assert_eq!(before[..hash_start], after[..hash_start]);
        assert_eq!(before[hash_end..], after[hash_end..]);
        assert_ne!(before[hash_start..hash_end], after[hash_start..hash_end]);

        assert!(store.verify_password(&name("alice"), &clear("old-pass")).await.unwrap());
        assert!(store.verify_password(&name("carol"), &clear("singer")).await.unwrap());
        assert!(!dir.path().join("passwd.tmp").exists());
    }

    #[tokio::test]
    async fn test_change_password_unknown_user_leaves_file_identical() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add_user(&name("alice"), &raw("wonderland")).await.unwrap();
        let before = fs::read(store.path()).await.unwrap();

        assert!(!store.change_password(&name("mallory"), &raw("x")).await.unwrap());

        assert_eq!(fs::read(store.path()).await.unwrap(), before);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_change_password_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add_user(&name("alice"), &raw("wonderland")).await.unwrap();
        fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o600))
            .await
            .unwrap();

        assert!(store.change_password(&name("alice"), &raw("looking-glass")).await.unwrap());

        let mode = fs::metadata(store.path()).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_missing_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(matches!(
            store.user_exists(&name("alice")).await,
            Err(AuthError::StoreOpen { .. })
        ));
        assert!(matches!(
            store.verify_password(&name("alice"), &clear("x")).await,
            Err(AuthError::StoreOpen { .. })
        ));
        assert!(matches!(
            store.change_password(&name("alice"), &raw("x")).await,
            Err(AuthError::StoreOpen { .. })
        ));

        // add_user creates the file
        assert!(store.add_user(&name("alice"), &raw("x")).await.unwrap());
        assert!(store.user_exists(&name("alice")).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_store_is_not_absence() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add_user(&name("alice"), &raw("wonderland")).await.unwrap();

        let mut bytes = fs::read(store.path()).await.unwrap();
        bytes.extend_from_slice(b"bob\n\x00\x01\x02");
        fs::write(store.path(), &bytes).await.unwrap();

        // alice sits before the damage and is still found
        assert!(store.user_exists(&name("alice")).await.unwrap());

        let offset = (bytes.len() - 7) as u64;
        let err = store.user_exists(&name("nobody")).await.unwrap_err();
        assert!(matches!(err, AuthError::CorruptRecord { offset: o } if o == offset));

        let err = store.add_user(&name("nobody"), &raw("x")).await.unwrap_err();
        assert!(matches!(err, AuthError::CorruptRecord { .. }));
        assert_eq!(fs::read(store.path()).await.unwrap(), bytes);
    }
}
