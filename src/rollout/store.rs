//! Flag store backends.

use crate::error::StorageError;
use crate::rollout::flag::{FeatureFlag, UserOverride};
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::collections::HashMap;
use std::path::Path;

const TREE_FLAGS: &str = "feature_flags";
const TREE_OVERRIDES: &str = "user_overrides";

/// Persisted flag configuration and per-user overrides.
pub trait FlagStore: Send + Sync {
    fn get_flag(&self, flag_name: &str) -> Result<Option<FeatureFlag>, StorageError>;
    fn put_flag(&self, flag: &FeatureFlag) -> Result<(), StorageError>;
    fn list_flags(&self) -> Result<Vec<FeatureFlag>, StorageError>;

    fn get_override(
        &self,
        user_id: &str,
        flag_name: &str,
    ) -> Result<Option<UserOverride>, StorageError>;
    fn put_override(&self, user_override: &UserOverride) -> Result<(), StorageError>;
    fn remove_override(&self, user_id: &str, flag_name: &str) -> Result<(), StorageError>;
}

/// Process-local store, used by tests and as a backend when no database is configured.
#[derive(Default)]
pub struct InMemoryFlagStore {
    flags: RwLock<HashMap<String, FeatureFlag>>,
    overrides: RwLock<HashMap<(String, String), UserOverride>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for InMemoryFlagStore {
    fn get_flag(&self, flag_name: &str) -> Result<Option<FeatureFlag>, StorageError> {
        Ok(self.flags.read().get(flag_name).cloned())
    }

    fn put_flag(&self, flag: &FeatureFlag) -> Result<(), StorageError> {
        self.flags.write().insert(flag.name.clone(), flag.clone());
        Ok(())
    }

    fn list_flags(&self) -> Result<Vec<FeatureFlag>, StorageError> {
        let mut flags: Vec<FeatureFlag> = self.flags.read().values().cloned().collect();
        flags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(flags)
    }

    fn get_override(
        &self,
        user_id: &str,
        flag_name: &str,
    ) -> Result<Option<UserOverride>, StorageError> {
        Ok(self
            .overrides
            .read()
            .get(&(user_id.to_string(), flag_name.to_string()))
            .cloned())
    }

    fn put_override(&self, user_override: &UserOverride) -> Result<(), StorageError> {
        self.overrides.write().insert(
            (
                user_override.user_id.clone(),
                user_override.flag_name.clone(),
            ),
            user_override.clone(),
        );
        Ok(())
    }

    fn remove_override(&self, user_id: &str, flag_name: &str) -> Result<(), StorageError> {
        self.overrides
            .write()
            .remove(&(user_id.to_string(), flag_name.to_string()));
        Ok(())
    }
}

/// Sled-backed flag store with one tree per table.
#[derive(Clone)]
pub struct SledFlagStore {
    db: Db,
    flags: Tree,
    overrides: Tree,
}

impl SledFlagStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self, StorageError> {
        let flags = db.open_tree(TREE_FLAGS)?;
        let overrides = db.open_tree(TREE_OVERRIDES)?;
        Ok(Self {
            db,
            flags,
            overrides,
        })
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn override_key(user_id: &str, flag_name: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(user_id.len() + flag_name.len() + 1);
        key.extend_from_slice(user_id.as_bytes());
        key.push(0);
        key.extend_from_slice(flag_name.as_bytes());
        key
    }
}

impl FlagStore for SledFlagStore {
    fn get_flag(&self, flag_name: &str) -> Result<Option<FeatureFlag>, StorageError> {
        let Some(raw) = self.flags.get(flag_name.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn put_flag(&self, flag: &FeatureFlag) -> Result<(), StorageError> {
        let value = serde_json::to_vec(flag)?;
        self.flags.insert(flag.name.as_bytes(), value)?;
        Ok(())
    }

    fn list_flags(&self) -> Result<Vec<FeatureFlag>, StorageError> {
        let mut out = Vec::new();
        for item in self.flags.iter() {
            let (_, value) = item?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn get_override(
        &self,
        user_id: &str,
        flag_name: &str,
    ) -> Result<Option<UserOverride>, StorageError> {
        let key = Self::override_key(user_id, flag_name);
        let Some(raw) = self.overrides.get(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn put_override(&self, user_override: &UserOverride) -> Result<(), StorageError> {
        let key = Self::override_key(&user_override.user_id, &user_override.flag_name);
        let value = serde_json::to_vec(user_override)?;
        self.overrides.insert(key, value)?;
        Ok(())
    }

    fn remove_override(&self, user_id: &str, flag_name: &str) -> Result<(), StorageError> {
        self.overrides
            .remove(Self::override_key(user_id, flag_name))?;
        Ok(())
    }
}
