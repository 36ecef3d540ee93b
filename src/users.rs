//! Static user list and credential checks.
//!
//! In memory-only mode the built-in users carry plaintext passwords. With
//! autosave the list comes from `users.txt`, one `username,sha256hex` per
//! line, and login hashes the supplied password before comparing.

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::store::StoreError;

const BUILTIN_USERS: &[(&str, &str)] = &[("user", "123456"), ("ali", "@G00dPassw0rd")];

/// Stored secret for one user.
pub enum Credential {
    Plain(Zeroizing<String>),
    /// Lower-case hex SHA-256 of the password.
    Sha256(Zeroizing<String>),
}

impl Credential {
    /// Constant-time check of a supplied password.
    pub fn verify(&self, password: &str) -> bool {
        match self {
            Self::Plain(stored) => ct_str_eq(stored, password),
            Self::Sha256(stored) => {
                let supplied = Zeroizing::new(hash_password(password));
                ct_str_eq(stored, &supplied)
            }
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Credential::Plain(..)"),
            Self::Sha256(_) => f.write_str("Credential::Sha256(..)"),
        }
    }
}

/// Hex-encoded SHA-256 digest of `password`.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn ct_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).unwrap_u8() == 1
}

/// Known users, read once at startup.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, Credential>,
}

impl UserDirectory {
    /// The two accounts available without a users file.
    pub fn builtin() -> Self {
        let users = BUILTIN_USERS
            .iter()
            .map(|(name, pass)| {
                (
                    name.to_string(),
                    Credential::Plain(Zeroizing::new(pass.to_string())),
                )
            })
            .collect();
        Self { users }
    }

    /// Parse a users file. Blank lines are skipped.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, StoreError> {
        let mut users = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, hash) = line
                .split_once(',')
                .filter(|(name, hash)| !name.is_empty() && !hash.contains(','))
                .ok_or(StoreError::MalformedUsers { line: idx + 1 })?;
            users.insert(
                name.trim().to_string(),
                Credential::Sha256(Zeroizing::new(hash.trim().to_ascii_lowercase())),
            );
        }
        tracing::debug!(count = users.len(), "User directory parsed");
        Ok(Self { users })
    }

    /// Write `(username, password)` pairs as a hashed users file.
    pub fn save(path: &Path, accounts: &[(&str, &str)]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = String::new();
        for (name, password) in accounts {
            content.push_str(name);
            content.push(',');
            content.push_str(&hash_password(password));
            content.push('\n');
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// True when `username` exists and `password` matches its credential.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|credential| credential.verify(password))
    }
}
