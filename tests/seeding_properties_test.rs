//! Property-based tests for allocation and the open-load quota.

use std::collections::HashMap;

use fleet_seeder::seeding::synthesizer::LoadStatus;
use fleet_seeder::seeding::identity::truck_number;
use fleet_seeder::seeding::{allocate, company_for_partition, LoadQuotaEnforcer};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn allocation_conserves_the_total(total in 0u64..200_000, partitions in 1usize..300) {
        let shares = allocate(total, partitions).unwrap();

        prop_assert_eq!(shares.len(), partitions);
        prop_assert_eq!(shares.iter().sum::<u64>(), total);

        let max = *shares.iter().max().unwrap();
        let min = *shares.iter().min().unwrap();
        prop_assert!(max - min <= 1);
        // larger shares come first
        prop_assert!(shares.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn partitions_always_map_to_a_company(
        companies in 1usize..10,
        extra in 0usize..60,
    ) {
        let partitions = companies + extra;
        let mut previous = 1;
        for i in 1..=partitions {
            let c = company_for_partition(i, partitions, companies).unwrap();
            prop_assert!((1..=companies).contains(&c));
            prop_assert!(c >= previous, "companies are assigned in contiguous blocks");
            previous = c;
        }
        prop_assert_eq!(previous, companies);
    }

    #[test]
    fn quota_caps_open_loads_without_dropping_any(
        proposals in prop::collection::vec((1i32..6, 1u32..4, any::<bool>()), 0..600),
        cap in 0u32..15,
    ) {
        let mut quota = LoadQuotaEnforcer::new(cap);
        let mut proposed_open: HashMap<(i32, u32), u32> = HashMap::new();
        let mut admitted_open: HashMap<(i32, u32), u32> = HashMap::new();
        let mut emitted = 0usize;

        for (terminal, month, open) in &proposals {
            let proposed = if *open { LoadStatus::Open } else { LoadStatus::Covered };
            if *open {
                *proposed_open.entry((*terminal, *month)).or_default() += 1;
            }
            let status = quota.admit(*terminal, 2024, *month, proposed);
            if status == LoadStatus::Open {
                *admitted_open.entry((*terminal, *month)).or_default() += 1;
            }
            if !*open {
                prop_assert_eq!(status, LoadStatus::Covered);
            }
            emitted += 1;
        }

        prop_assert_eq!(emitted, proposals.len());
        prop_assert!(admitted_open.values().all(|&n| n <= cap));

        let overflow: u64 = proposed_open
            .values()
            .map(|&n| u64::from(n.saturating_sub(cap)))
            .sum();
        prop_assert_eq!(quota.downgraded(), overflow);
    }

    #[test]
    fn truck_numbers_encode_year_sequence_and_transmission(
        year in 2000i32..2030,
        seq in 1u64..100,
        automatic in any::<bool>(),
    ) {
        let number = truck_number(year, seq, automatic);
        prop_assert_eq!(number.ends_with('A'), automatic);
        let digits = number.trim_end_matches('A');
        prop_assert_eq!(digits.len(), 4);
        prop_assert_eq!(&digits[2..], format!("{:02}", seq));
    }
}
