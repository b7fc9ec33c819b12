//! Entrapment FDR estimation
//!
//! Rather than modelling false positives through decoy competition, the
//! entrapment FDR counts them directly: any identified protein group that
//! does not contain a protein known to be in the sample is a false positive.
//! The resulting curve is compared against the q-values reported by the
//! search engine, after scaling those by the fraction of the database that
//! is absent from the sample.

use crate::ground_truth::{GroundTruthIndex, GroupStatus};
use crate::results::ResultRecord;
use crate::Error;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunningCounts {
    pub true_positives: usize,
    pub false_positives: usize,
}

impl Default for RunningCounts {
    /// False positives start at 1, so the first FDR is never 0/0 and an FDR
    /// of 0 is never reported before a false positive has been observed
    fn default() -> Self {
        Self {
            true_positives: 0,
            false_positives: 1,
        }
    }
}

impl RunningCounts {
    /// Presence wins: a group containing any present protein is a true
    /// positive, even if it also contains absent proteins
    fn update(&mut self, status: GroupStatus) {
        if status.any_present {
            self.true_positives += 1;
        } else if status.any_absent {
            self.false_positives += 1;
        }
    }

    pub fn fdr(&self) -> f64 {
        self.false_positives as f64 / (self.true_positives + self.false_positives) as f64
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives
    }
}

/// Per-record calibration curve, in the order records were supplied
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Calibration {
    /// Reported q-values, scaled by the absence prior
    pub scaled_q: Vec<f64>,
    /// Entrapment FDR at each position
    pub raw_fdr: Vec<f64>,
    /// Entrapment FDR after conversion to q-values
    pub entrapment_q: Vec<f64>,
    pub counts: Vec<RunningCounts>,
}

impl Calibration {
    pub fn len(&self) -> usize {
        self.entrapment_q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrapment_q.is_empty()
    }
}

pub struct EntrapmentEstimator<'a> {
    index: &'a GroundTruthIndex,
    pi_a: f64,
}

impl<'a> EntrapmentEstimator<'a> {
    /// Compute the absence prior `1 - present / total` for the database
    pub fn new(index: &'a GroundTruthIndex, total_proteins: usize) -> Result<Self, Error> {
        let present = index.present_count();
        if total_proteins == 0 || present == 0 || present >= total_proteins {
            return Err(Error::DegeneratePrior {
                present,
                total: total_proteins,
            });
        }
        let pi_a = 1.0 - present as f64 / total_proteins as f64;
        log::info!(
            "{} of {} database proteins present, pi_A = {:.4}",
            present,
            total_proteins,
            pi_a
        );
        Ok(Self { index, pi_a })
    }

    pub fn pi_a(&self) -> f64 {
        self.pi_a
    }

    /// Estimate the entrapment FDR at every position of `records`.
    ///
    /// # Invariants
    /// * `records` must be ordered by significance (e.g. best identification
    ///   is first); they are not re-sorted
    pub fn estimate(&self, records: &[ResultRecord]) -> Calibration {
        // Lookups are independent of each other, the running counts are not
        let status = records
            .par_iter()
            .map(|record| self.index.group_status(record.proteins.accessions()))
            .collect::<Vec<_>>();

        let mut calibration = Calibration {
            scaled_q: Vec::with_capacity(records.len()),
            raw_fdr: Vec::with_capacity(records.len()),
            entrapment_q: Vec::new(),
            counts: Vec::with_capacity(records.len()),
        };

        let mut counts = RunningCounts::default();
        let mut unmatched = 0;
        for (record, status) in records.iter().zip(status) {
            if !status.any_present && !status.any_absent {
                unmatched += 1;
            }
            counts.update(status);
            calibration.raw_fdr.push(counts.fdr());
            calibration.scaled_q.push(self.pi_a * record.q_value);
            calibration.counts.push(counts);
        }

        if unmatched > 0 {
            log::warn!("{} records did not contain any protein", unmatched);
        }

        calibration.entrapment_q = fdrs_to_qvalues(&calibration.raw_fdr);
        calibration
    }
}

/// Convert FDRs to q-values: the q-value at each position is the minimum FDR
/// at that position or any later (less stringent) one.
/// `q = fdr[::-1].cummin()[::-1]`
pub fn fdrs_to_qvalues(fdrs: &[f64]) -> Vec<f64> {
    let mut q = fdrs.to_vec();
    let mut q_min = f64::INFINITY;
    for fdr in q.iter_mut().rev() {
        q_min = q_min.min(*fdr);
        *fdr = q_min;
    }
    q
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub threshold: f64,
    /// Number of records with a scaled reported q-value below `threshold`
    pub reported_significant: usize,
    /// Number of records with an entrapment q-value below `threshold`
    pub observed_significant: usize,
    /// Entrapment q-value of the last record passing the reported threshold
    pub observed_fdr_at_reported: Option<f64>,
}

impl Summary {
    pub fn new(calibration: &Calibration, threshold: f64) -> Self {
        let reported_significant = calibration
            .scaled_q
            .iter()
            .filter(|&&q| q < threshold)
            .count();
        let observed_significant = calibration
            .entrapment_q
            .iter()
            .filter(|&&q| q < threshold)
            .count();
        let observed_fdr_at_reported = calibration
            .scaled_q
            .iter()
            .rposition(|&q| q < threshold)
            .map(|ix| calibration.entrapment_q[ix]);

        Self {
            threshold,
            reported_significant,
            observed_significant,
            observed_fdr_at_reported,
        }
    }
}
