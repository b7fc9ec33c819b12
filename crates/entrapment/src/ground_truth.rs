//! Ground-truth membership for an entrapment experiment.
//!
//! A PrEST-style experiment spikes one of two protein pools ("A" or "B") or
//! both into a sample, and searches the spectra against a database holding
//! both pools plus a set of random proteins that were never added. Proteins
//! from the pools in the vial are truly present; everything else identified
//! is a false positive.

use crate::Error;
use fnv::FnvHashSet;
use serde::Serialize;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Vial {
    A,
    B,
    AB,
}

impl FromStr for Vial {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Vial::A),
            "B" => Ok(Vial::B),
            "AB" => Ok(Vial::AB),
            _ => Err(Error::InvalidVial(s.into())),
        }
    }
}

impl std::fmt::Display for Vial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vial::A => f.write_str("A"),
            Vial::B => f.write_str("B"),
            Vial::AB => f.write_str("AB"),
        }
    }
}

/// Accessions of the three sub-databases that make up the search space
#[derive(Clone, Debug, Default)]
pub struct Pools {
    pub a: Vec<String>,
    pub b: Vec<String>,
    pub random: Vec<String>,
}

impl Pools {
    /// Size of the searched database, independent of the vial
    pub fn total(&self) -> usize {
        self.a.len() + self.b.len() + self.random.len()
    }

    /// Build the ground truth for proteins spiked into `vial`
    pub fn present(&self, vial: Vial) -> GroundTruthIndex {
        match vial {
            Vial::A => GroundTruthIndex::new([&self.a]),
            Vial::B => GroundTruthIndex::new([&self.b]),
            Vial::AB => GroundTruthIndex::new([&self.a, &self.b]),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupStatus {
    pub any_present: bool,
    pub any_absent: bool,
}

/// Set of protein accessions known to be present in the sample
#[derive(Clone, Debug, Default)]
pub struct GroundTruthIndex {
    present: FnvHashSet<String>,
    // Number of accessions supplied, duplicates included
    count: usize,
}

impl GroundTruthIndex {
    pub fn new<'a, I>(pools: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec<String>>,
    {
        let mut present = FnvHashSet::default();
        let mut count = 0;
        for pool in pools {
            count += pool.len();
            present.extend(pool.iter().cloned());
        }
        Self { present, count }
    }

    /// Number of present proteins, as supplied by the reference pools
    pub fn present_count(&self) -> usize {
        self.count
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.present.contains(accession)
    }

    /// Test every member of a protein group independently. Mixed groups
    /// report both flags, and empty groups report neither.
    pub fn group_status<S: AsRef<str>>(&self, group: &[S]) -> GroupStatus {
        group
            .iter()
            .fold(GroupStatus::default(), |mut status, accession| {
                match self.contains(accession.as_ref()) {
                    true => status.any_present = true,
                    false => status.any_absent = true,
                }
                status
            })
    }
}
