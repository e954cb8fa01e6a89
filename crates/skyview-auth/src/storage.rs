use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::AuthError;
use crate::types::{Session, User};

/// Fixed key the profile record is stored under
pub const PROFILE_KEY: &str = "weatherAppUser";

/// Session store: owns the current user and the mirrored provider session.
///
/// The user profile is persisted as JSON in `<dir>/weatherAppUser.json`;
/// the session is only held in memory. No staleness or expiry checks are
/// done here; session validity is the identity provider's business.
pub struct SessionStore {
    path: PathBuf,
    user: RwLock<Option<User>>,
    session: RwLock<Option<Session>>,
    restoring: AtomicBool,
}

impl SessionStore {
    /// Create a store persisting under `dir`. Reports `is_restoring()` until
    /// `restore()` runs.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.json", PROFILE_KEY)),
            user: RwLock::new(None),
            session: RwLock::new(None),
            restoring: AtomicBool::new(true),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted profile, if present and well-formed, as the
    /// current user. Always ends the restoring phase.
    pub fn restore(&self) -> Option<User> {
        let restored = match fs::read_to_string(&self.path) {
            Ok(json) => match serde_json::from_str::<User>(&json) {
                Ok(user) => {
                    tracing::info!("Restored profile for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed profile record: {}", e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read profile record: {}", e);
                None
            }
        };

        *self.user.write() = restored.clone();
        self.restoring.store(false, Ordering::SeqCst);
        restored
    }

    /// Make `user` current and write it to disk, overwriting any prior record.
    ///
    /// The in-memory user is set even when the write fails.
    pub fn persist(&self, user: &User) -> Result<(), AuthError> {
        *self.user.write() = Some(user.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::Storage(format!("Failed to create profile directory: {}", e)))?;
        }

        let json = serde_json::to_string(user)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize profile: {}", e)))?;

        fs::write(&self.path, json)
            .map_err(|e| AuthError::Storage(format!("Failed to write profile: {}", e)))?;

        tracing::debug!("Persisted profile to {:?}", self.path);
        Ok(())
    }

    /// Forget the current user and remove the persisted record.
    pub fn clear(&self) -> Result<(), AuthError> {
        *self.user.write() = None;

        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| AuthError::Storage(format!("Failed to delete profile: {}", e)))?;
            tracing::info!("Cleared persisted profile");
        }

        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    /// True until `restore()` has completed
    pub fn is_restoring(&self) -> bool {
        self.restoring.load(Ordering::SeqCst)
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn set_session(&self, session: Option<Session>) {
        *self.session.write() = session;
    }

    /// Whether the provider currently reports a live session
    pub fn has_session(&self) -> bool {
        self.session.read().is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("path", &self.path)
            .field("has_user", &self.user.read().is_some())
            .field("has_session", &self.has_session())
            .finish()
    }
}
