//! Serde support for [`PrimeSieve`] (requires the `serde` feature).
//!
//! A sieve serializes as its computed segment count followed by the
//! computed words, so an expensively computed sieve can be snapshotted and
//! restored without resieving. Thread configuration is not serialized; a
//! deserialized sieve uses auto-detected threads.
//!
//! # Examples
//!
//! ```
//! use segsieve::PrimeSieve;
//!
//! let mut sieve = PrimeSieve::computed_to(1_000_000);
//! let json = serde_json::to_string(&sieve).unwrap();
//!
//! let mut restored: PrimeSieve = serde_json::from_str(&json).unwrap();
//! assert_eq!(restored.computed_bound(), sieve.computed_bound());
//! assert!(restored.is_prime(999_983));
//! ```

use core::fmt;

use serde::{
    de::{self, Deserializer, MapAccess, SeqAccess, Visitor},
    ser::{SerializeStruct, Serializer},
    Deserialize, Serialize,
};

use crate::{layout::WORDS_PER_SEG, sieve::PrimeSieve};

impl Serialize for PrimeSieve {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = serializer.serialize_struct("PrimeSieve", 2)?;
        st.serialize_field("segments", &(self.segs_computed() as u64))?;
        st.serialize_field("words", self.computed_words())?;
        st.end()
    }
}

impl<'de> Deserialize<'de> for PrimeSieve {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct("PrimeSieve", &["segments", "words"], SieveVisitor)
    }
}

struct SieveVisitor;

impl<'de> Visitor<'de> for SieveVisitor {
    type Value = PrimeSieve;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a PrimeSieve with fields `segments` and `words`")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let segments: u64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let words: Vec<u64> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        rebuild(segments, words)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut segments: Option<u64> = None;
        let mut words: Option<Vec<u64>> = None;
        while let Some(key) = map.next_key::<Field>()? {
            match key {
                Field::Segments => {
                    if segments.replace(map.next_value()?).is_some() {
                        return Err(de::Error::duplicate_field("segments"));
                    }
                }
                Field::Words => {
                    if words.replace(map.next_value()?).is_some() {
                        return Err(de::Error::duplicate_field("words"));
                    }
                }
            }
        }
        let segments = segments.ok_or_else(|| de::Error::missing_field("segments"))?;
        let words = words.ok_or_else(|| de::Error::missing_field("words"))?;
        rebuild(segments, words)
    }
}

enum Field {
    Segments,
    Words,
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldVisitor;

        impl Visitor<'_> for FieldVisitor {
            type Value = Field;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("`segments` or `words`")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Field, E> {
                match v {
                    "segments" => Ok(Field::Segments),
                    "words" => Ok(Field::Words),
                    _ => Err(de::Error::unknown_field(v, &["segments", "words"])),
                }
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

fn rebuild<E: de::Error>(segments: u64, words: Vec<u64>) -> Result<PrimeSieve, E> {
    let segs = usize::try_from(segments)
        .ok()
        .filter(|s| s.checked_mul(WORDS_PER_SEG) == Some(words.len()))
        .ok_or_else(|| {
            de::Error::custom(format_args!(
                "word count {} does not match {segments} segments",
                words.len()
            ))
        })?;
    PrimeSieve::from_computed_words(segs, &words)
        .map_err(|oom| de::Error::custom(format_args!("{oom}")))
}
