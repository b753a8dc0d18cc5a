//! Business identifiers: VINs, truck/trailer/load numbers and licenses.

use super::catalog::STATE_CODES;
use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// VIN alphabet; I, O and Q are never used.
pub const VIN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";
pub const VIN_LENGTH: usize = 17;

/// Monotonic counter scoped to one seeding run.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    current: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next value, starting at 1.
    pub fn next_value(&mut self) -> u64 {
        self.current += 1;
        self.current
    }
}

/// Two-digit model-year code used in truck numbers.
///
/// 2000–2009 map to `year - 1980` (2006 -> "26"); every other year uses its
/// last two digits.
pub fn year_suffix(year: i32) -> String {
    if (2000..=2009).contains(&year) {
        format!("{:02}", year - 1980)
    } else {
        format!("{:02}", year.rem_euclid(100))
    }
}

/// `2006, 7, true` -> `2607A`; `2022, 3, false` -> `2203`.
pub fn truck_number(model_year: i32, purchase_seq: u64, automatic: bool) -> String {
    let mut number = format!("{}{:02}", year_suffix(model_year), purchase_seq);
    if automatic {
        number.push('A');
    }
    number
}

pub fn trailer_number(seq: u64) -> String {
    format!("TRL{:05}", seq)
}

/// `LD` + `yymm` of the pickup month + six-digit run sequence.
pub fn load_number(pickup_month: NaiveDate, seq: u64) -> String {
    format!(
        "LD{:02}{:02}{:06}",
        pickup_month.year().rem_euclid(100),
        pickup_month.month(),
        seq
    )
}

/// Issues identifiers for one run and remembers every VIN it handed out.
#[derive(Debug, Default)]
pub struct IdentityEncoder {
    issued_vins: HashSet<String>,
    purchases: SequenceCounter,
    trailers: SequenceCounter,
    loads: SequenceCounter,
}

impl IdentityEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a VIN not issued earlier in this run.
    pub fn vin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        loop {
            let candidate: String = (0..VIN_LENGTH)
                .map(|_| VIN_ALPHABET[rng.gen_range(0..VIN_ALPHABET.len())] as char)
                .collect();
            if self.issued_vins.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Truck number using the run-wide purchase sequence.
    pub fn next_truck_number(&mut self, model_year: i32, automatic: bool) -> String {
        truck_number(model_year, self.purchases.next_value(), automatic)
    }

    pub fn next_trailer_number(&mut self) -> String {
        trailer_number(self.trailers.next_value())
    }

    pub fn next_load_number(&mut self, pickup_month: NaiveDate) -> String {
        load_number(pickup_month, self.loads.next_value())
    }

    /// Returns `(state, license_number)`.
    pub fn license<R: Rng + ?Sized>(&self, rng: &mut R) -> (String, String) {
        let state = STATE_CODES.choose(rng).copied().unwrap_or("TX");
        let body: u32 = rng.gen_range(0..10_000_000);
        (state.to_string(), format!("{state}{body:07}"))
    }

    pub fn issued_vin_count(&self) -> usize {
        self.issued_vins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case(2006, 7, true, "2607A")]
    #[case(2022, 3, false, "2203")]
    #[case(2000, 1, false, "2001")]
    #[case(2009, 12, true, "2912A")]
    #[case(2010, 4, false, "1004")]
    #[case(2024, 115, true, "24115A")]
    fn truck_numbers(
        #[case] year: i32,
        #[case] seq: u64,
        #[case] automatic: bool,
        #[case] expected: &str,
    ) {
        assert_eq!(truck_number(year, seq, automatic), expected);
    }

    #[test]
    fn vins_use_restricted_alphabet_and_never_repeat() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut encoder = IdentityEncoder::new();
        let vins: Vec<String> = (0..2_000).map(|_| encoder.vin(&mut rng)).collect();

        assert_eq!(encoder.issued_vin_count(), 2_000);
        for vin in &vins {
            assert_eq!(vin.len(), VIN_LENGTH);
            assert!(!vin.contains(['I', 'O', 'Q']));
            assert!(vin.bytes().all(|b| VIN_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn sequences_are_run_wide() {
        let mut encoder = IdentityEncoder::new();
        assert_eq!(encoder.next_truck_number(2022, false), "2201");
        assert_eq!(encoder.next_truck_number(2006, true), "2602A");
        assert_eq!(encoder.next_trailer_number(), "TRL00001");
        assert_eq!(encoder.next_trailer_number(), "TRL00002");

        let march = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(encoder.next_load_number(march), "LD2403000001");
    }

    #[test]
    fn license_has_state_prefix_and_seven_digits() {
        let mut rng = StdRng::seed_from_u64(11);
        let encoder = IdentityEncoder::new();
        let (state, number) = encoder.license(&mut rng);
        assert_eq!(state.len(), 2);
        assert!(number.starts_with(&state));
        assert_eq!(number.len(), 9);
        assert!(number[2..].chars().all(|c| c.is_ascii_digit()));
    }
}
