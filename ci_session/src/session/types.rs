use std::fmt;

use crate::php::{PhpArray, PhpKey, PhpValue, decode_session, encode_session};
use crate::utils::gen_random_string;

use super::errors::SessionError;

/// Timestamp CodeIgniter uses to decide when to regenerate the session id.
pub const CI_LAST_REGENERATE_KEY: &str = "__ci_last_regenerate";

/// Flash and tempdata bookkeeping shared with CodeIgniter.
pub const CI_VARS_KEY: &str = "__ci_vars";

const SESSION_ID_MAX_LEN: usize = 128;
const SESSION_ID_RANDOM_BYTES: usize = 32;

/// Session identifier, safe to embed in a file name.
///
/// Ids arrive from cookies and end up in a path, so anything but
/// `[A-Za-z0-9_,-]` is rejected. The comma appears in CodeIgniter ids
/// generated with `sid_bits_per_character = 6`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(token: &str) -> Result<Self, SessionError> {
        if token.is_empty() {
            return Err(SessionError::InvalidArgument(
                "No Session Id provided".to_string(),
            ));
        }
        if token.len() > SESSION_ID_MAX_LEN {
            return Err(SessionError::InvalidArgument(
                "Session Id too long".to_string(),
            ));
        }
        if !token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b','))
        {
            return Err(SessionError::InvalidArgument(
                "Session Id contains invalid characters".to_string(),
            ));
        }
        Ok(Self(token.to_string()))
    }

    pub(crate) fn generate() -> Result<Self, SessionError> {
        Ok(Self(gen_random_string(SESSION_ID_RANDOM_BYTES)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The top-level variables of a session, in the order PHP wrote them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionData {
    entries: Vec<(String, PhpValue)>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(payload: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        Ok(Self {
            entries: decode_session(payload)?,
        })
    }

    pub fn encode(&self) -> Result<String, SessionError> {
        Ok(encode_session(self.iter())?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<PhpValue>) -> Option<PhpValue> {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key.to_string(), value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PhpValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PhpValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `__ci_last_regenerate`, when present and an integer.
    pub fn last_regenerate(&self) -> Option<i64> {
        self.get(CI_LAST_REGENERATE_KEY)
            .and_then(|v| v.as_int().ok())
    }

    /// Snapshot of `__ci_vars`; empty if no flash operation has run yet.
    pub fn ci_vars(&self) -> Result<CiVars, SessionError> {
        match self.get(CI_VARS_KEY) {
            Some(value) => Ok(CiVars(value.as_array()?.clone())),
            None => Ok(CiVars::default()),
        }
    }

    /// Merges one marker into `__ci_vars`, creating it on first use and
    /// leaving every other key's marker untouched.
    pub(crate) fn merge_ci_var(&mut self, key: &str, mark: CiVarMark) -> Result<(), SessionError> {
        let mut vars = self.ci_vars()?;
        vars.merge(key, mark);
        self.insert(CI_VARS_KEY, vars.0);
        Ok(())
    }

    /// Drops the marker for `key`, if `__ci_vars` exists at all.
    pub(crate) fn unmark_ci_var(&mut self, key: &str) -> Result<(), SessionError> {
        if !self.contains_key(CI_VARS_KEY) {
            return Ok(());
        }
        let mut vars = self.ci_vars()?;
        vars.remove(key);
        self.insert(CI_VARS_KEY, vars.0);
        Ok(())
    }
}

/// Lifecycle marker of one `__ci_vars` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiVarMark {
    /// Flash value set during this request.
    New,
    /// Flash value already read.
    Old,
    /// Tempdata, valid until the given Unix timestamp.
    ExpiresAt(i64),
}

impl CiVarMark {
    fn from_php(value: &PhpValue) -> Option<Self> {
        match value {
            PhpValue::String(s) if s == "new" => Some(Self::New),
            PhpValue::String(s) if s == "old" => Some(Self::Old),
            PhpValue::Int(ts) => Some(Self::ExpiresAt(*ts)),
            _ => None,
        }
    }
}

impl From<CiVarMark> for PhpValue {
    fn from(mark: CiVarMark) -> Self {
        match mark {
            CiVarMark::New => PhpValue::from("new"),
            CiVarMark::Old => PhpValue::from("old"),
            CiVarMark::ExpiresAt(ts) => PhpValue::Int(ts),
        }
    }
}

/// View over the `__ci_vars` array.
///
/// Entries this crate does not understand are carried along untouched so
/// CodeIgniter still sees them after a write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CiVars(PhpArray);

impl CiVars {
    pub fn mark(&self, key: &str) -> Option<CiVarMark> {
        self.0.get_str(key).and_then(CiVarMark::from_php)
    }

    pub fn merge(&mut self, key: &str, mark: CiVarMark) {
        self.0.insert(key, mark);
    }

    pub fn remove(&mut self, key: &str) -> Option<CiVarMark> {
        self.0
            .remove(&PhpKey::from(key))
            .as_ref()
            .and_then(CiVarMark::from_php)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys marked as flash data, either state.
    pub fn flash_keys(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, v)| {
                matches!(
                    CiVarMark::from_php(v),
                    Some(CiVarMark::New | CiVarMark::Old)
                )
            })
            .map(|(k, _)| k.to_string())
            .collect()
    }
}
