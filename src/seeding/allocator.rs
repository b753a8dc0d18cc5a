//! Even distribution of entity totals over terminals.

use crate::errors::ServiceError;

/// Splits `total` into `partitions` shares that differ by at most one.
///
/// The first `total % partitions` shares receive the extra unit.
pub fn allocate(total: u64, partitions: usize) -> Result<Vec<u64>, ServiceError> {
    if partitions == 0 {
        return Err(ServiceError::ValidationError(
            "cannot allocate across zero partitions".to_string(),
        ));
    }

    let n = partitions as u64;
    let base = total / n;
    let remainder = total % n;

    Ok((0..n)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// Maps a 1-based partition index to a 1-based company index.
///
/// Partition `i` belongs to company `ceil(i / (partitions / companies))`,
/// using real division and clamped to `1..=companies` so a partition count
/// that is not a multiple of the company count still lands in range.
pub fn company_for_partition(
    partition: usize,
    partitions: usize,
    companies: usize,
) -> Result<usize, ServiceError> {
    if partitions == 0 || companies == 0 {
        return Err(ServiceError::ValidationError(
            "partition and company counts must be positive".to_string(),
        ));
    }
    if partition == 0 || partition > partitions {
        return Err(ServiceError::ValidationError(format!(
            "partition {partition} outside 1..={partitions}"
        )));
    }

    let per_company = partitions as f64 / companies as f64;
    let company = (partition as f64 / per_company).ceil() as usize;

    Ok(company.clamp(1, companies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn reference_split_of_trucks() {
        let shares = allocate(700, 27).unwrap();
        assert_eq!(shares.len(), 27);
        assert!(shares[..25].iter().all(|&s| s == 26));
        assert!(shares[25..].iter().all(|&s| s == 25));
        assert_eq!(shares.iter().sum::<u64>(), 700);
    }

    #[test]
    fn fewer_items_than_partitions() {
        assert_eq!(allocate(2, 4).unwrap(), vec![1, 1, 0, 0]);
        assert_eq!(allocate(0, 3).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn zero_partitions_is_rejected() {
        assert_matches!(allocate(10, 0), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn partitions_map_to_companies_in_blocks() {
        let companies: Vec<usize> = (1..=27)
            .map(|i| company_for_partition(i, 27, 3).unwrap())
            .collect();
        assert!(companies[..9].iter().all(|&c| c == 1));
        assert!(companies[9..18].iter().all(|&c| c == 2));
        assert!(companies[18..].iter().all(|&c| c == 3));
    }

    #[test]
    fn uneven_partition_counts_stay_in_range() {
        for partitions in 3..40 {
            let mut seen = std::collections::BTreeSet::new();
            for i in 1..=partitions {
                let c = company_for_partition(i, partitions, 3).unwrap();
                assert!((1..=3).contains(&c));
                seen.insert(c);
            }
            assert_eq!(seen.len(), 3, "every company gets a terminal for {partitions}");
        }
    }

    #[test]
    fn out_of_range_partition_is_rejected() {
        assert_matches!(
            company_for_partition(0, 27, 3),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            company_for_partition(28, 27, 3),
            Err(ServiceError::ValidationError(_))
        );
    }
}
