//! Properties of the entrapment FDR curve over arbitrary result lists

use entrapment_core::entrapment::{fdrs_to_qvalues, EntrapmentEstimator, RunningCounts};
use entrapment_core::ground_truth::{Pools, Vial};
use entrapment_core::results::{ProteinGroup, ResultRecord};
use quickcheck_macros::quickcheck;

fn pools() -> Pools {
    Pools {
        a: (0..20).map(|i| format!("HPRR_A{i}")).collect(),
        b: (0..20).map(|i| format!("HPRR_B{i}")).collect(),
        random: (0..60).map(|i| format!("HPRR_R{i}")).collect(),
    }
}

/// Map arbitrary bytes onto protein groups drawn from all three pools
fn mk_records(groups: &[Vec<u8>]) -> Vec<ResultRecord> {
    let pools = pools();
    let all = pools
        .a
        .iter()
        .chain(&pools.b)
        .chain(&pools.random)
        .collect::<Vec<_>>();

    groups
        .iter()
        .enumerate()
        .map(|(ix, group)| ResultRecord {
            proteins: ProteinGroup(
                group
                    .iter()
                    .take(4)
                    .map(|&b| all[b as usize % all.len()].clone())
                    .collect(),
            ),
            q_value: (ix as f64 / groups.len() as f64).min(1.0),
        })
        .collect()
}

#[quickcheck]
fn entrapment_q_is_monotonic(groups: Vec<Vec<u8>>, vial: u8) -> bool {
    let vial = [Vial::A, Vial::B, Vial::AB][vial as usize % 3];
    let pools = pools();
    let index = pools.present(vial);
    let estimator = EntrapmentEstimator::new(&index, pools.total()).unwrap();
    let calibration = estimator.estimate(&mk_records(&groups));

    calibration.len() == groups.len()
        && calibration.scaled_q.len() == groups.len()
        && calibration.counts.len() == groups.len()
        && calibration.entrapment_q.windows(2).all(|w| w[0] <= w[1])
        && calibration
            .entrapment_q
            .iter()
            .zip(&calibration.raw_fdr)
            .all(|(q, fdr)| q <= fdr)
}

#[quickcheck]
fn counts_step_by_at_most_one(groups: Vec<Vec<u8>>) -> bool {
    let pools = pools();
    let index = pools.present(Vial::A);
    let estimator = EntrapmentEstimator::new(&index, pools.total()).unwrap();
    let calibration = estimator.estimate(&mk_records(&groups));

    let mut last = RunningCounts::default();
    calibration.counts.iter().all(|&counts| {
        let tp = counts.true_positives - last.true_positives;
        let fp = counts.false_positives - last.false_positives;
        last = counts;
        counts.false_positives >= 1 && tp + fp <= 1
    })
}

#[quickcheck]
fn correction_is_idempotent(fdrs: Vec<f64>) -> bool {
    let fdrs = fdrs
        .into_iter()
        .filter(|f| f.is_finite())
        .collect::<Vec<_>>();
    let once = fdrs_to_qvalues(&fdrs);
    fdrs_to_qvalues(&once) == once
}
