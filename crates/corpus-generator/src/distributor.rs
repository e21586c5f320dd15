//! Folder assignment.
//!
//! `folder_of` is a pure function of its arguments: proportional assignment
//! is arithmetic on the index, and the gaussian / exponential shapes draw from
//! the item's own `Folder` stream, so the result never depends on which
//! worker asks or when.

use crate::seeder::{ItemSeeder, Stream};
use corpus_core::Distribution;
use rand::Rng;

/// Folder number in `1..=folders` for the 1-based `index` out of `total`.
pub fn folder_of(
    index: u64,
    total: u64,
    folders: u32,
    kind: Distribution,
    seeder: &ItemSeeder,
) -> u32 {
    if folders <= 1 {
        return 1;
    }
    match kind {
        Distribution::Proportional => proportional(index, total, folders),
        Distribution::Gaussian => {
            let mut rng = seeder.rng_for(Stream::Folder, index);
            gaussian(&mut rng, folders)
        }
        Distribution::Exponential => {
            let mut rng = seeder.rng_for(Stream::Folder, index);
            exponential(&mut rng, folders)
        }
    }
}

/// Contiguous ranges: the first `total % folders` folders hold one extra item.
fn proportional(index: u64, total: u64, folders: u32) -> u32 {
    let folders = folders as u64;
    let k = index.saturating_sub(1).min(total.saturating_sub(1));
    let base = total / folders;
    let extra = total % folders;
    let boundary = extra * (base + 1);
    let folder = if k < boundary {
        k / (base + 1)
    } else {
        // base > 0 here: with base == 0 the boundary equals total
        extra + (k - boundary) / base
    };
    (folder + 1) as u32
}

/// Normal draw centred on the middle folder, sd = folders / 6, clamped.
fn gaussian<R: Rng>(rng: &mut R, folders: u32) -> u32 {
    let mean = (folders as f64 + 1.0) / 2.0;
    let sd = (folders as f64 / 6.0).max(0.5);
    let value = mean + sd * standard_normal(rng);
    clamp_folder(value.round(), folders)
}

/// Exponential decay with rate 5 / folders, so ~99% of the mass lands
/// inside the folder range and folder 1 is the most populated.
fn exponential<R: Rng>(rng: &mut R, folders: u32) -> u32 {
    let lambda = 5.0 / folders as f64;
    // gen::<f64>() is in [0, 1); 1 - u is in (0, 1] so ln never sees zero
    let u: f64 = 1.0 - rng.gen::<f64>();
    let value = -u.ln() / lambda;
    clamp_folder(value.floor() + 1.0, folders)
}

/// Box-Muller transform.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn clamp_folder(value: f64, folders: u32) -> u32 {
    if value.is_nan() || value < 1.0 {
        1
    } else if value > folders as f64 {
        folders
    } else {
        value as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(total: u64, folders: u32, kind: Distribution, seed: u64) -> Vec<u64> {
        let seeder = ItemSeeder::new(seed);
        let mut counts = vec![0u64; folders as usize];
        for index in 1..=total {
            let folder = folder_of(index, total, folders, kind, &seeder);
            assert!((1..=folders).contains(&folder), "folder {folder} out of range");
            counts[(folder - 1) as usize] += 1;
        }
        counts
    }

    #[test]
    fn test_proportional_within_one_of_even_share() {
        for (total, folders) in [(10, 10), (11, 3), (100, 7), (5, 8), (1, 1), (1000, 999)] {
            let counts = counts(total, folders, Distribution::Proportional, 0);
            assert_eq!(counts.iter().sum::<u64>(), total);
            let floor = total / folders as u64;
            for (i, c) in counts.iter().enumerate() {
                assert!(
                    *c == floor || *c == floor + 1,
                    "total={total} folders={folders} folder {} got {c}",
                    i + 1
                );
            }
            // the extra items go to the first folders
            let extra = (total % folders as u64) as usize;
            assert!(counts[..extra].iter().all(|c| *c == floor + 1));
        }
    }

    #[test]
    fn test_proportional_is_contiguous() {
        let seeder = ItemSeeder::new(0);
        let folders: Vec<u32> = (1..=11)
            .map(|i| folder_of(i, 11, 3, Distribution::Proportional, &seeder))
            .collect();
        assert_eq!(folders, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn test_ten_items_ten_folders() {
        let seeder = ItemSeeder::new(42);
        for i in 1..=10 {
            assert_eq!(
                folder_of(i, 10, 10, Distribution::Proportional, &seeder),
                i as u32
            );
        }
    }

    #[test]
    fn test_gaussian_is_deterministic_and_centred() {
        let a = counts(5000, 9, Distribution::Gaussian, 42);
        let b = counts(5000, 9, Distribution::Gaussian, 42);
        assert_eq!(a, b);
        let centre = a[4];
        assert!(centre > a[0] && centre > a[8]);
    }

    #[test]
    fn test_exponential_favours_low_folders() {
        let c = counts(5000, 10, Distribution::Exponential, 7);
        assert!(c[0] > c[4]);
        assert!(c[4] > c[9] || c[9] == 0);
        assert_eq!(c, counts(5000, 10, Distribution::Exponential, 7));
    }

    #[test]
    fn test_single_folder_always_one() {
        let c = counts(5000, 1, Distribution::Exponential, 3);
        assert_eq!(c, vec![5000]);
    }

    #[test]
    fn test_seed_changes_shaped_assignment() {
        assert_ne!(
            counts(500, 10, Distribution::Gaussian, 1),
            counts(500, 10, Distribution::Gaussian, 2)
        );
    }
}
