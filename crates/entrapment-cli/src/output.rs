use entrapment_core::entrapment::{Calibration, Summary};
use entrapment_core::ground_truth::GroundTruthIndex;
use entrapment_core::results::ResultRecord;
use serde::Serialize;

use crate::input::Settings;
use crate::runner::Runner;

#[derive(Serialize)]
pub struct SummaryOutput<'a> {
    pub settings: &'a Settings,
    pub pi_a: f64,
    pub present_proteins: usize,
    pub total_proteins: usize,
    pub records: usize,
    #[serde(flatten)]
    pub summary: &'a Summary,
}

/// Threshold as a percentage, without floating point noise (0.07 -> "7")
fn percent(threshold: f64) -> String {
    let percent = (threshold * 100.0 * 1E6).round() / 1E6;
    ryu::Buffer::new()
        .format(percent)
        .trim_end_matches(".0")
        .to_string()
}

/// Summary statistics, as printed at the end of a run
pub fn summary_lines(summary: &Summary) -> Vec<String> {
    let percent = percent(summary.threshold);
    let observed = match summary.observed_fdr_at_reported {
        Some(fdr) => fdr.to_string(),
        None => "NA".into(),
    };
    vec![
        format!(
            "#significant protein groups Reported {}% FDR: {}",
            percent, summary.reported_significant
        ),
        format!(
            "#significant protein groups Observed {}% FDR: {}",
            percent, summary.observed_significant
        ),
        format!("Observed FDR at reported {}% FDR: {}", percent, observed),
    ]
}

impl Runner {
    pub fn serialize_record(
        &self,
        record: &ResultRecord,
        calibration: &Calibration,
        ix: usize,
    ) -> csv::ByteRecord {
        let counts = calibration.counts[ix];
        let mut row = csv::ByteRecord::new();
        row.push_field(record.proteins.to_string().as_bytes());
        row.push_field(ryu::Buffer::new().format(record.q_value).as_bytes());
        row.push_field(ryu::Buffer::new().format(calibration.scaled_q[ix]).as_bytes());
        row.push_field(ryu::Buffer::new().format(calibration.raw_fdr[ix]).as_bytes());
        row.push_field(ryu::Buffer::new().format(calibration.entrapment_q[ix]).as_bytes());
        row.push_field(itoa::Buffer::new().format(counts.true_positives).as_bytes());
        row.push_field(itoa::Buffer::new().format(counts.false_positives).as_bytes());
        row
    }

    pub fn write_calibration(&self, calibration: &Calibration) -> anyhow::Result<String> {
        let path = self.make_path("results.entrapment.tsv");

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(vec![]);

        let headers = csv::ByteRecord::from(vec![
            "proteins",
            "reported_q",
            "scaled_q",
            "entrapment_fdr",
            "entrapment_q",
            "true_positives",
            "false_positives",
        ]);

        wtr.write_byte_record(&headers)?;
        for (ix, record) in self.records.iter().enumerate() {
            wtr.write_byte_record(&self.serialize_record(record, calibration, ix))?;
        }
        wtr.flush()?;

        let bytes = wtr.into_inner()?;
        std::fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }

    pub fn write_summary(
        &self,
        summary: &Summary,
        pi_a: f64,
        index: &GroundTruthIndex,
    ) -> anyhow::Result<String> {
        let path = self.make_path("results.entrapment.json");
        let output = SummaryOutput {
            settings: &self.settings,
            pi_a,
            present_proteins: index.present_count(),
            total_proteins: self.pools.total(),
            records: self.records.len(),
            summary,
        };
        let bytes = serde_json::to_vec_pretty(&output)?;
        std::fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percent_label() {
        assert_eq!(percent(0.05), "5");
        assert_eq!(percent(0.07), "7");
        assert_eq!(percent(0.001), "0.1");
        assert_eq!(percent(0.015), "1.5");
    }

    #[test]
    fn print_summary() {
        let summary = Summary {
            threshold: 0.07,
            reported_significant: 12,
            observed_significant: 9,
            observed_fdr_at_reported: Some(0.25),
        };
        assert_eq!(
            summary_lines(&summary),
            vec![
                "#significant protein groups Reported 7% FDR: 12",
                "#significant protein groups Observed 7% FDR: 9",
                "Observed FDR at reported 7% FDR: 0.25",
            ]
        );

        let summary = Summary {
            observed_fdr_at_reported: None,
            ..summary
        };
        assert_eq!(
            summary_lines(&summary)[2],
            "Observed FDR at reported 7% FDR: NA"
        );
    }
}
