//! On-disk persistence of the session cookie.
//!
//! Stores the `Cookie` header captured after login at `~/.chatline/session`
//! so later runs can reuse the server session. The file holds a single line.

use std::fs;
use std::path::{Path, PathBuf};

use chatline_core::{ChatError, ChatResult};

/// Session cookie file manager.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default location (`~/.chatline/session`).
    pub fn default_location() -> ChatResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| ChatError::Other("cannot determine home directory".into()))?;
        Ok(Self::new(home.join(".chatline").join("session")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored cookie header, if any.
    pub fn load(&self) -> ChatResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let cookie = content.trim();
        if cookie.is_empty() {
            return Ok(None);
        }
        Ok(Some(cookie.to_string()))
    }

    /// Store a cookie header, replacing any previous one.
    pub fn save(&self, cookie: &str) -> ChatResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
                }
            }
        }

        fs::write(&self.path, format!("{}\n", cookie.trim()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Forget the stored cookie. Returns whether anything was removed.
    pub fn clear(&self) -> ChatResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("nested").join("session"))
    }

    #[test]
    fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("session=session-123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("session=session-123"));
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("session=old").unwrap();
        store.save("session=new").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("session=new"));
    }

    #[test]
    fn blank_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("   ").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.clear().unwrap());
        store.save("session=abc").unwrap();
        assert!(store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("session=abc").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
