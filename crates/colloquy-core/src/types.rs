use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ColloquyError;

// =============================================================================
// Sessions
// =============================================================================

/// Opaque identifier of a remote chat session.
///
/// The remote store decides the format. Numeric ids are accepted on the wire
/// and normalised to their decimal string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
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

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => SessionId(s),
            RawId::Number(n) => SessionId(n.to_string()),
        })
    }
}

/// A named, independently scoped conversation as listed by the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(default)]
    pub name: String,
    /// Soft-delete marker. Tombstoned sessions are never listed locally.
    #[serde(default, alias = "isDeleted")]
    pub is_deleted: bool,
}

impl Session {
    pub fn new(id: impl Into<SessionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_deleted: false,
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// One entry of a transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Heuristic marker: the service probably could not answer from its
    /// knowledge. Always set on failure apologies.
    #[serde(default, alias = "outOfContext")]
    pub out_of_context: bool,
}

impl Message {
    /// A message typed (or dictated) by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            out_of_context: false,
        }
    }

    /// A reply from the service.
    pub fn bot(text: impl Into<String>, out_of_context: bool) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            out_of_context,
        }
    }
}

// =============================================================================
// Locales
// =============================================================================

/// Speech locales offered to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "hi-IN")]
    HiIn,
    #[serde(rename = "gu-IN")]
    GuIn,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::EnUs, Locale::HiIn, Locale::GuIn];

    /// BCP 47 tag handed to the speech recognizer.
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::HiIn => "hi-IN",
            Locale::GuIn => "gu-IN",
        }
    }

    /// Human-readable language name.
    pub fn label(&self) -> &'static str {
        match self {
            Locale::EnUs => "English",
            Locale::HiIn => "Hindi",
            Locale::GuIn => "Gujarati",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = ColloquyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Locale::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ColloquyError::UnknownLocale(wanted.to_string()))
    }
}

// =============================================================================
// Notices
// =============================================================================

/// Category of a user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// The remote store or answering service could not be reached.
    RemoteUnavailable,
    /// Speech input is not supported on this platform.
    CapabilityUnavailable,
    /// Informational, no failure involved.
    Info,
}

/// A message surfaced to the user outside the transcript.
#[derive(Clone, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Local>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Local::now(),
        }
    }
}
