//! Time-ordered 64-bit ids.
//!
//! Layout, most significant bit first: 42 bits of milliseconds since
//! [`EPOCH`], 5 bits worker id, 5 bits process id, 12 bits increment. Ids
//! minted by one generator are strictly increasing, which feeds rely on to
//! order posts created in the same millisecond.

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error as _, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use time::{Duration, UtcDateTime, macros::utc_datetime};

pub const EPOCH: UtcDateTime = utc_datetime!(2025-01-01 00:00);

const TIMESTAMP_BITS: u32 = 42;
const WORKER_ID_BITS: u32 = 5;
const PROCESS_ID_BITS: u32 = 5;
const INCREMENT_BITS: u32 = 12;

const INCREMENT_SHIFT: u32 = 0;
const PROCESS_ID_SHIFT: u32 = INCREMENT_SHIFT + INCREMENT_BITS;
const WORKER_ID_SHIFT: u32 = PROCESS_ID_SHIFT + PROCESS_ID_BITS;
const TIMESTAMP_SHIFT: u32 = WORKER_ID_SHIFT + WORKER_ID_BITS;

const fn mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeError {
    #[error("Time {0} is before the snowflake epoch")]
    BeforeEpoch(UtcDateTime),
    #[error("Snowflake timestamps ran out of bits")]
    TimestampOverflow,
}

/// Declares a small id part that knows its own bit width.
macro_rules! id_part {
    ($(#[$meta:meta])* $name:ident, $bits:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(u8);

        impl $name {
            #[allow(clippy::cast_possible_truncation)]
            pub const MAX: u8 = mask($bits) as u8;

            #[must_use]
            pub fn new(id: u8) -> Option<Self> {
                (id <= Self::MAX).then_some(Self(id))
            }

            #[must_use]
            pub fn get(self) -> u8 {
                self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let id = u8::deserialize(deserializer)?;
                Self::new(id).ok_or_else(|| {
                    D::Error::invalid_value(
                        Unexpected::Unsigned(id.into()),
                        &concat!(stringify!($name), " of at most 31"),
                    )
                })
            }
        }
    };
}

id_part!(
    /// Distinguishes machines sharing one database.
    WorkerId,
    WORKER_ID_BITS
);
id_part!(
    /// Distinguishes processes on one machine.
    ProcessId,
    PROCESS_ID_BITS
);

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Snowflake(u64);

impl Snowflake {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Milliseconds since [`EPOCH`].
    #[must_use]
    pub fn millis(self) -> u64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    // The masks keep every part within its width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn worker_id(self) -> WorkerId {
        WorkerId(((self.0 >> WORKER_ID_SHIFT) & mask(WORKER_ID_BITS)) as u8)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn process_id(self) -> ProcessId {
        ProcessId(((self.0 >> PROCESS_ID_SHIFT) & mask(PROCESS_ID_BITS)) as u8)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn increment(self) -> u16 {
        ((self.0 >> INCREMENT_SHIFT) & mask(INCREMENT_BITS)) as u16
    }

    /// When the id was minted, to the millisecond.
    #[must_use]
    pub fn created_at(self) -> UtcDateTime {
        // 42 bits always fit into an i64.
        EPOCH + Duration::milliseconds(self.millis().cast_signed())
    }

    fn from_parts(millis: u64, worker_id: WorkerId, process_id: ProcessId, increment: u16) -> Self {
        Self(
            millis << TIMESTAMP_SHIFT
                | u64::from(worker_id.0) << WORKER_ID_SHIFT
                | u64::from(process_id.0) << PROCESS_ID_SHIFT
                | u64::from(increment) << INCREMENT_SHIFT,
        )
    }
}

impl Display for Snowflake {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(value: Snowflake) -> Self {
        value.0
    }
}

fn millis_since_epoch(time: UtcDateTime) -> Result<u64, SnowflakeError> {
    let millis = u64::try_from((time - EPOCH).whole_milliseconds())
        .map_err(|_| SnowflakeError::BeforeEpoch(time))?;
    if millis > mask(TIMESTAMP_BITS) {
        return Err(SnowflakeError::TimestampOverflow);
    }
    Ok(millis)
}

/// Mints strictly increasing snowflakes for one worker/process pair.
///
/// If the clock stalls or steps backwards the generator keeps counting on
/// its last timestamp, moving on to the next millisecond once the increment
/// space is used up.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct SnowflakeGenerator {
    worker_id: WorkerId,
    process_id: ProcessId,
    last: Option<(u64, u16)>,
}

impl SnowflakeGenerator {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            worker_id,
            process_id,
            last: None,
        }
    }

    pub fn generate_at(&mut self, time: UtcDateTime) -> Result<Snowflake, SnowflakeError> {
        let now = millis_since_epoch(time)?;

        let (millis, increment) = match self.last {
            Some((last_millis, last_increment)) if now <= last_millis => {
                if u64::from(last_increment) < mask(INCREMENT_BITS) {
                    (last_millis, last_increment + 1)
                } else if last_millis < mask(TIMESTAMP_BITS) {
                    (last_millis + 1, 0)
                } else {
                    return Err(SnowflakeError::TimestampOverflow);
                }
            }
            _ => (now, 0),
        };

        self.last = Some((millis, increment));
        Ok(Snowflake::from_parts(
            millis,
            self.worker_id,
            self.process_id,
            increment,
        ))
    }

    pub fn generate(&mut self) -> Result<Snowflake, SnowflakeError> {
        self.generate_at(UtcDateTime::now())
    }
}
