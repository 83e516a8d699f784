//! Seeding and storage statistics use-cases.
//!
//! # Responsibility
//! - Generate deterministic demo groups and write them in one batch.
//! - Remove seeded or user-created groups.
//! - Report row counts.
//!
//! # Invariants
//! - Seed counts outside `1..=max_seed_count` are rejected before any
//!   storage call.
//! - The same generator seed always produces the same batch.
//! - Generated years stay inside the configured validation range.

use crate::model::group::{Genre, NewMusicGroup};
use crate::repo::admin_repo::{AdminRepository, DbInfo, SeedGroup};
use crate::repo::common::RepoError;
use crate::validation::ValidationRules;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Default upper bound for one seed request.
pub const DEFAULT_MAX_SEED_COUNT: u32 = 1000;
const DEFAULT_GENERATOR_SEED: u64 = 0x5EED_0F_6D0C;

const GROUP_ADJECTIVES: &[&str] = &[
    "Electric", "Midnight", "Crimson", "Silent", "Velvet", "Iron", "Golden", "Hollow", "Wild",
    "Northern",
];
const GROUP_NOUNS: &[&str] = &[
    "Owls", "Rivers", "Engines", "Saints", "Horizon", "Lanterns", "Wolves", "Echoes", "Harbor",
    "Riders",
];
const ALBUM_WORDS: &[&str] = &[
    "Dawn", "Static", "Ashes", "Tide", "Glass", "Ember", "Signal", "Orbit", "Dust", "Bloom",
];
const FIRST_NAMES: &[&str] = &[
    "Anna", "Erik", "Maja", "Lars", "Sofia", "Nils", "Elsa", "Oskar", "Ida", "Johan",
];
const LAST_NAMES: &[&str] = &[
    "Berg", "Lind", "Holm", "Strand", "Dahl", "Falk", "Ek", "Sund", "Wall", "Nyberg",
];

/// Service error for admin use-cases.
#[derive(Debug)]
pub enum AdminServiceError {
    /// Requested seed count is zero or above the configured limit.
    InvalidSeedCount { requested: u32, max: u32 },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AdminServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSeedCount { requested, max } => {
                write!(f, "seed count must be between 1 and {max}, got {requested}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AdminServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidSeedCount { .. } => None,
        }
    }
}

impl From<RepoError> for AdminServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Deterministic generator for demo groups.
#[derive(Debug, Clone)]
pub struct SeedGenerator {
    rng: StdRng,
    rules: ValidationRules,
}

impl SeedGenerator {
    pub fn new(seed: u64, rules: ValidationRules) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            rules,
        }
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Uniform year in `low..=high`; `low` when the range is empty.
    fn year(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Generates one group with 1-5 albums and 2-4 artists.
    pub fn next_group(&mut self) -> SeedGroup {
        let min_year = self.rules.min_year;
        let max_year = self.rules.max_year;

        let name = format!("{} {}", self.pick(GROUP_ADJECTIVES), self.pick(GROUP_NOUNS));
        let established_year = self.year(min_year, max_year);
        let genre = Genre::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Genre::Rock);

        let album_count = self.rng.gen_range(1..=5);
        let albums = (0..album_count)
            .map(|_| {
                let title = format!("{} {}", self.pick(ALBUM_WORDS), self.pick(ALBUM_WORDS));
                let release_year = self.year(established_year, max_year);
                let copies_sold = self.rng.gen_range(1_000..=5_000_000);
                (title, release_year, copies_sold)
            })
            .collect();

        let artist_count = self.rng.gen_range(2..=4);
        let artists = (0..artist_count)
            .map(|_| {
                let first_name = self.pick(FIRST_NAMES).to_string();
                let last_name = self.pick(LAST_NAMES).to_string();
                let birth_day = self.rng.gen_bool(0.75).then(|| {
                    format!(
                        "{:04}-{:02}-{:02}",
                        self.year(min_year, established_year),
                        self.rng.gen_range(1..=12),
                        self.rng.gen_range(1..=28)
                    )
                });
                (first_name, last_name, birth_day)
            })
            .collect();

        SeedGroup {
            group: NewMusicGroup {
                name,
                established_year,
                genre,
                seeded: true,
            },
            albums,
            artists,
        }
    }

    /// Generates `count` groups.
    pub fn batch(&mut self, count: u32) -> Vec<SeedGroup> {
        (0..count).map(|_| self.next_group()).collect()
    }
}

/// Admin facade over an admin repository.
pub struct AdminService<R: AdminRepository> {
    repo: R,
    rules: ValidationRules,
    max_seed_count: u32,
    generator_seed: u64,
}

impl<R: AdminRepository> AdminService<R> {
    /// Creates a service using default rules and limits.
    pub fn new(repo: R) -> Self {
        Self::with_limits(repo, ValidationRules::default(), DEFAULT_MAX_SEED_COUNT)
    }

    pub fn with_limits(repo: R, rules: ValidationRules, max_seed_count: u32) -> Self {
        Self {
            repo,
            rules,
            max_seed_count,
            generator_seed: DEFAULT_GENERATOR_SEED,
        }
    }

    /// Replaces the generator seed used by later `seed` calls.
    pub fn with_generator_seed(mut self, seed: u64) -> Self {
        self.generator_seed = seed;
        self
    }

    /// Writes `count` generated groups; returns the number written.
    pub fn seed(&self, count: u32) -> Result<u64, AdminServiceError> {
        self.check_count(count)?;
        let started_at = Instant::now();
        let batch = SeedGenerator::new(self.generator_seed, self.rules).batch(count);
        let written = self.repo.insert_seed_batch(&batch)?;
        info!(
            "event=seed module=service status=ok groups={} duration_ms={}",
            written,
            started_at.elapsed().as_millis()
        );
        Ok(written)
    }

    /// Removes seeded (`true`) or user-created (`false`) groups.
    pub fn remove_seeds(&self, seeded: bool) -> Result<u64, AdminServiceError> {
        let removed = self.repo.remove_groups(seeded)?;
        info!(
            "event=seed_remove module=service status=ok seeded={} groups={}",
            seeded, removed
        );
        Ok(removed)
    }

    /// Optionally clears both kinds of groups, then seeds `count` new ones.
    pub fn reseed(&self, count: u32, remove_existing: bool) -> Result<DbInfo, AdminServiceError> {
        self.check_count(count)?;
        if remove_existing {
            self.remove_seeds(true)?;
            self.remove_seeds(false)?;
        }
        self.seed(count)?;
        self.info()
    }

    pub fn info(&self) -> Result<DbInfo, AdminServiceError> {
        Ok(self.repo.info()?)
    }

    fn check_count(&self, count: u32) -> Result<(), AdminServiceError> {
        if count == 0 || count > self.max_seed_count {
            return Err(AdminServiceError::InvalidSeedCount {
                requested: count,
                max: self.max_seed_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SeedGenerator;
    use crate::validation::ValidationRules;

    #[test]
    fn same_seed_produces_same_batch() {
        let rules = ValidationRules::default();
        let first = SeedGenerator::new(42, rules).batch(5);
        let second = SeedGenerator::new(42, rules).batch(5);
        assert_eq!(first, second);
    }

    #[test]
    fn generated_years_respect_rules() {
        let rules = ValidationRules {
            min_year: 1960,
            max_year: 1970,
        };
        for seed in SeedGenerator::new(7, rules).batch(50) {
            let year = seed.group.established_year;
            assert!((1960..=1970).contains(&year));
            assert!(seed.group.seeded);
            assert!((1..=5).contains(&seed.albums.len()));
            assert!((2..=4).contains(&seed.artists.len()));
            for (_, release_year, copies_sold) in &seed.albums {
                assert!((year..=1970).contains(release_year));
                assert!(*copies_sold > 0);
            }
        }
    }
}
