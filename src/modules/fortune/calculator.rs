//! Deterministic daily fortune.
//!
//! The three inputs are encoded into fixed-width bytes, hashed with
//! SHA-256, and the digest seeds a PRNG that draws one outcome. Same
//! inputs on the same day always give the same fortune.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Date, OffsetDateTime, UtcOffset};

/// ABO blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    A,
    B,
    O,
    AB,
}

impl BloodType {
    pub const ALL: [BloodType; 4] = [BloodType::A, BloodType::B, BloodType::O, BloodType::AB];

    pub fn as_str(self) -> &'static str {
        match self {
            BloodType::A => "A",
            BloodType::B => "B",
            BloodType::O => "O",
            BloodType::AB => "AB",
        }
    }

    /// Stable byte used in the seed; never reorder.
    fn tag(self) -> u8 {
        match self {
            BloodType::A => 0,
            BloodType::B => 1,
            BloodType::O => 2,
            BloodType::AB => 3,
        }
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BloodType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|blood_type| blood_type.as_str() == value)
            .ok_or_else(|| format!("\"{value}\" is not a valid choice."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fortune {
    GreatLuck,
    MiddleLuck,
    SmallLuck,
}

impl Fortune {
    /// Outcomes in draw order.
    pub const ALL: [Fortune; 3] = [Fortune::GreatLuck, Fortune::MiddleLuck, Fortune::SmallLuck];

    /// Omikuji label.
    pub fn label(self) -> &'static str {
        match self {
            Fortune::GreatLuck => "大吉",
            Fortune::MiddleLuck => "中吉",
            Fortune::SmallLuck => "小吉",
        }
    }
}

/// 32-byte PRNG seed for the given inputs.
pub fn seed(birth_date: Date, blood_type: BloodType, current_date: Date) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(encode_date(current_date));
    hasher.update(encode_date(birth_date));
    hasher.update([blood_type.tag()]);
    hasher.finalize().into()
}

/// Draw the fortune for `birth_date` and `blood_type` on `current_date`.
pub fn fortune(birth_date: Date, blood_type: BloodType, current_date: Date) -> Fortune {
    let mut rng = StdRng::from_seed(seed(birth_date, blood_type, current_date));
    Fortune::ALL[rng.random_range(0..Fortune::ALL.len())]
}

/// Calendar date right now at `offset`.
pub fn today(offset: UtcOffset) -> Date {
    OffsetDateTime::now_utc().to_offset(offset).date()
}

fn encode_date(date: Date) -> [u8; 6] {
    let year = date.year().to_be_bytes();
    [
        year[0],
        year[1],
        year[2],
        year[3],
        u8::from(date.month()),
        date.day(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use time::macros::date;

    #[test]
    fn same_day_same_fortune() {
        let birth = date!(2000-01-01);
        let today = date!(2024-06-15);

        let first = fortune(birth, BloodType::A, today);
        for _ in 0..10 {
            assert_eq!(fortune(birth, BloodType::A, today), first);
        }
    }

    #[test]
    fn seed_depends_on_every_input() {
        let birth = date!(2000-01-01);
        let today = date!(2024-06-15);
        let base = seed(birth, BloodType::A, today);

        assert_ne!(base, seed(birth, BloodType::AB, today));
        assert_ne!(base, seed(date!(2000-01-02), BloodType::A, today));
        assert_ne!(base, seed(birth, BloodType::A, date!(2024-06-16)));
        // Swapping the two dates is a different key.
        assert_ne!(seed(today, BloodType::A, birth), base);
    }

    #[test]
    fn fortune_varies_across_days() {
        let birth = date!(2000-01-01);
        let mut day = date!(2024-01-01);
        let mut seen = HashSet::new();

        for _ in 0..60 {
            seen.insert(fortune(birth, BloodType::O, day));
            day = day.next_day().unwrap();
        }

        assert_eq!(seen.len(), Fortune::ALL.len());
    }

    #[test]
    fn blood_type_parses_exact_names() {
        assert_eq!("AB".parse::<BloodType>(), Ok(BloodType::AB));
        assert_eq!(
            "ab".parse::<BloodType>(),
            Err("\"ab\" is not a valid choice.".to_string())
        );
    }

    #[test]
    fn fortune_serializes_snake_case_with_label() {
        assert_eq!(
            serde_json::to_value(Fortune::GreatLuck).unwrap(),
            serde_json::json!("great_luck")
        );
        assert_eq!(Fortune::SmallLuck.label(), "小吉");
    }
}
