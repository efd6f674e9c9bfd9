//! Snowflake ID Generator
//!
//! Twitter-style distributed unique ID generation, plus the serde helpers
//! used to put IDs on the wire as strings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch (2015-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1420070400000;

const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Snowflake ID generator
///
/// Layout: 42 bits of milliseconds since `epoch`, 5 bits machine, 5 bits
/// node, 12 bits sequence. Safe to share between threads.
pub struct SnowflakeGenerator {
    machine_id: u64,
    node_id: u64,
    epoch: u64,
    /// Last issued `(elapsed_millis << 12) | sequence`
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self::with_epoch(machine_id, node_id, DEFAULT_EPOCH)
    }

    /// Create a generator counting from a custom epoch (milliseconds)
    pub fn with_epoch(machine_id: u64, node_id: u64, epoch: u64) -> Self {
        Self {
            machine_id: machine_id & 0x1F, // 5 bits
            node_id: node_id & 0x1F,       // 5 bits
            epoch,
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    ///
    /// IDs are strictly increasing per generator. Once the 4096 sequence
    /// numbers of a millisecond are used up, this spins until the clock
    /// moves on. A clock that steps backwards keeps counting from the last
    /// issued millisecond.
    pub fn generate(&self) -> i64 {
        let mut last = self.state.load(Ordering::Acquire);
        loop {
            let elapsed = self.current_timestamp().saturating_sub(self.epoch);
            let last_elapsed = last >> SEQUENCE_BITS;
            let last_sequence = last & SEQUENCE_MASK;

            let (elapsed, sequence) = if elapsed > last_elapsed {
                (elapsed, 0)
            } else if last_sequence < SEQUENCE_MASK {
                (last_elapsed, last_sequence + 1)
            } else {
                std::hint::spin_loop();
                last = self.state.load(Ordering::Acquire);
                continue;
            };

            let next = (elapsed << SEQUENCE_BITS) | sequence;
            match self
                .state
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let id = (elapsed << 22)
                        | (self.machine_id << 17)
                        | (self.node_id << 12)
                        | sequence;
                    return id as i64;
                }
                Err(current) => last = current,
            }
        }
    }

    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch)
    }
}

/// Serialize IDs as JSON strings; accept strings or numbers on input.
pub mod id_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Num(i64),
    }

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Num(n) => Ok(n),
            RawId::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }

    /// Same encoding for optional IDs
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(id: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
            match id {
                Some(id) => serializer.collect_str(id),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<i64>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "crate::shared::snowflake::id_string")] i64);

            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
        }
    }
}
