use std::{
    fmt,
    str::FromStr,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Length of the hexadecimal form of a [`RecordId`].
pub const RECORD_ID_LEN: usize = 24;

/// RecordId
///
/// Twelve-byte document identifier, rendered as 24 lowercase hex characters.
/// Layout: 4-byte big-endian seconds, 5 bytes fixed per process, 3-byte counter,
/// so ids minted by one process sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS, ToSchema, sqlx::Type)]
#[sqlx(transparent)]
#[ts(export)]
pub struct RecordId(String);

// Per-process bytes and counter seed, both drawn from a v4 UUID.
static PROCESS_BYTES: LazyLock<[u8; 5]> = LazyLock::new(|| {
    let bytes = Uuid::new_v4().into_bytes();
    [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]
});

static COUNTER: LazyLock<AtomicU32> = LazyLock::new(|| {
    let bytes = Uuid::new_v4().into_bytes();
    AtomicU32::new(u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]]))
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("identifier must be {RECORD_ID_LEN} hexadecimal characters")]
pub struct InvalidRecordId;

impl RecordId {
    /// Mints a fresh identifier.
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut raw = [0u8; 12];
        raw[..4].copy_from_slice(&seconds.to_be_bytes());
        raw[4..9].copy_from_slice(&*PROCESS_BYTES);
        raw[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        RecordId(raw.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// True when `raw` has the shape of an identifier (24 hex digits, any case).
    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == RECORD_ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if Self::is_well_formed(raw) {
            Ok(RecordId(raw.to_ascii_lowercase()))
        } else {
            Err(InvalidRecordId)
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
