//! Signing-secret resolution with lazy, race-safe generation.
//!
//! Resolution order: configured secret, persisted secret file, freshly
//! generated secret. A generated secret is written with create-new
//! semantics (staged, then hard-linked into place); if another process
//! published first, its value wins and is read back. Within the process
//! the resolved secret is cached in a `OnceCell`, so concurrent first use
//! observes exactly one value.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::TryRngCore;
use tracing::{info, warn};
use uuid::Uuid;

use super::token::TokenError;

const GENERATED_SECRET_LEN: usize = 64;

#[derive(Debug)]
pub struct SecretStore {
    configured: Option<Vec<u8>>,
    path: Option<PathBuf>,
    resolved: OnceCell<Vec<u8>>,
}

impl SecretStore {
    pub fn new(configured: Option<Vec<u8>>, path: Option<PathBuf>) -> Self {
        Self {
            configured: configured.filter(|s| !s.is_empty()),
            path,
            resolved: OnceCell::new(),
        }
    }

    /// Store with a fixed secret; never touches the filesystem.
    pub fn fixed(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(Some(secret.into()), None)
    }

    /// Resolve the signing secret, generating and persisting one on first use.
    pub fn secret(&self) -> Result<&[u8], TokenError> {
        self.resolved
            .get_or_try_init(|| self.resolve())
            .map(Vec::as_slice)
    }

    fn resolve(&self) -> Result<Vec<u8>, TokenError> {
        if let Some(secret) = &self.configured {
            return Ok(secret.clone());
        }

        match &self.path {
            Some(path) => match read_secret(path)? {
                Some(secret) => Ok(secret),
                None => persist_new_secret(path),
            },
            None => {
                warn!("no signing secret configured; using an ephemeral generated secret");
                generate()
            }
        }
    }
}

fn generate() -> Result<Vec<u8>, TokenError> {
    let mut secret = vec![0u8; GENERATED_SECRET_LEN];
    OsRng
        .try_fill_bytes(&mut secret)
        .map_err(|e| TokenError::Config(format!("failed to generate signing secret: {e}")))?;
    Ok(secret)
}

fn read_secret(path: &Path) -> Result<Option<Vec<u8>>, TokenError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                return Err(TokenError::Config(format!(
                    "signing secret file {} is empty",
                    path.display()
                )));
            }
            STANDARD
                .decode(trimmed)
                .map(Some)
                .map_err(|e| TokenError::Config(format!("signing secret file is not base64: {e}")))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TokenError::Config(format!(
            "failed to read signing secret {}: {e}",
            path.display()
        ))),
    }
}

/// Publish a new secret without clobbering a concurrent writer.
///
/// The secret is fully written to a private temp file and then hard-linked
/// into place; the link fails with `AlreadyExists` if another writer won,
/// in which case the winner's value is read back. Readers never observe a
/// partially written file.
fn persist_new_secret(path: &Path) -> Result<Vec<u8>, TokenError> {
    let secret = generate()?;
    let staging = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));

    let staged = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staging)
        .and_then(|mut file| {
            file.write_all(STANDARD.encode(&secret).as_bytes())?;
            file.sync_all()
        });
    if let Err(e) = staged {
        let _ = fs::remove_file(&staging);
        return Err(TokenError::Config(format!(
            "failed to stage signing secret next to {}: {e}",
            path.display()
        )));
    }

    let linked = fs::hard_link(&staging, path);
    let _ = fs::remove_file(&staging);

    match linked {
        Ok(()) => {
            info!(path = %path.display(), "generated and persisted a new signing secret");
            Ok(secret)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => read_secret(path)?.ok_or_else(|| {
            TokenError::Config("signing secret file vanished during creation".to_string())
        }),
        Err(e) => Err(TokenError::Config(format!(
            "failed to persist signing secret {}: {e}",
            path.display()
        ))),
    }
}
