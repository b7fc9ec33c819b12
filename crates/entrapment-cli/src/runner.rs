use super::input::Settings;
use anyhow::Context;
use entrapment_core::entrapment::{Calibration, EntrapmentEstimator, Summary};
use entrapment_core::ground_truth::{GroundTruthIndex, Pools};
use entrapment_core::results::ResultRecord;
use log::info;
use std::path::PathBuf;
use std::time::Instant;
// HTML report specific imports
use maud::{html, PreEscaped};
use report_builder::{plots::plot_scatter, Report, ReportSection};

pub struct Runner {
    pub settings: Settings,
    pub pools: Pools,
    pub records: Vec<ResultRecord>,
    start: Instant,
}

/// Log-scaled axes are not defined at zero
const LOG_OFFSET: f64 = 1E-20;
/// Slope of the dashed guide lines around `y = x` in calibration plots
const MARGIN: f64 = 1.5;
const GUIDE_POINTS: usize = 100;

/// `y = x`, `y = MARGIN * x` and `y = x / MARGIN`, sampled evenly over `[lo, hi]`
fn guide_lines(lo: f64, hi: f64) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let step = (hi - lo) / (GUIDE_POINTS - 1) as f64;
    let x = (0..GUIDE_POINTS)
        .map(|i| lo + step * i as f64)
        .collect::<Vec<_>>();
    let y = vec![
        x.clone(),
        x.iter().map(|v| v * MARGIN).collect(),
        x.iter().map(|v| v / MARGIN).collect(),
    ];
    (vec![x.clone(), x.clone(), x], y)
}

impl Runner {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let start = Instant::now();

        let read_pool = |path: &str| {
            entrapment_core::read_fasta(path)
                .with_context(|| format!("Failed to read proteins from `{}`", path))
        };
        let pools = Pools {
            a: read_pool(settings.pool_a.as_str())?,
            b: read_pool(settings.pool_b.as_str())?,
            random: read_pool(settings.pool_random.as_str())?,
        };
        info!(
            "read {} pool A, {} pool B and {} random proteins",
            pools.a.len(),
            pools.b.len(),
            pools.random.len()
        );

        let records = entrapment_core::read_results(&settings.results_path).with_context(|| {
            format!(
                "Failed to read search results from `{}`",
                settings.results_path
            )
        })?;
        info!(
            "read {} protein groups from {} in {:#?}",
            records.len(),
            settings.results_path,
            start.elapsed()
        );

        Ok(Self {
            settings,
            pools,
            records,
            start,
        })
    }

    pub fn make_path<S: AsRef<str>>(&self, name: S) -> PathBuf {
        self.settings.output_directory.join(name.as_ref())
    }

    pub fn run(&self) -> anyhow::Result<Summary> {
        let index = self.pools.present(self.settings.vial);
        let estimator = EntrapmentEstimator::new(&index, self.pools.total())
            .with_context(|| format!("Failed to calibrate vial {}", self.settings.vial))?;

        let calibration = estimator.estimate(&self.records);
        let summary = Summary::new(&calibration, self.settings.threshold);
        info!(
            "{} protein groups pass {} reported FDR, {} pass entrapment FDR",
            summary.reported_significant, self.settings.threshold, summary.observed_significant
        );

        let mut outputs = vec![self.write_summary(&summary, estimator.pi_a(), &index)?];
        if self.settings.write_tsv {
            outputs.push(self.write_calibration(&calibration)?);
        }
        if self.settings.write_report {
            outputs.push(self.write_report(&calibration, &summary, &index)?);
        }

        for path in outputs {
            info!("wrote {}", path);
        }
        info!("finished in {:#?}", self.start.elapsed());

        Ok(summary)
    }

    fn write_report(
        &self,
        calibration: &Calibration,
        summary: &Summary,
        index: &GroundTruthIndex,
    ) -> anyhow::Result<String> {
        let path = self.make_path("results.entrapment.report.html");
        let scatter = |x: Vec<Vec<f64>>, y: Vec<Vec<f64>>, title: &str, xlabel: &str, ylabel: &str| {
            let labels = vec![
                "Entrapment".to_string(),
                "y = x".to_string(),
                format!("y = {}x", MARGIN),
                format!("y = x/{}", MARGIN),
            ];
            plot_scatter(&x, &y, labels, title, xlabel, ylabel)
                .map_err(|e| anyhow::anyhow!("Failed to plot `{}`: {:?}", title, e))
        };

        // Create a new report
        let mut report = Report::new(
            "Entrapment",
            &self.settings.version,
            None,
            "Entrapment FDR Report",
        );

        /* Section 1: Overview */
        {
            let mut intro_section = ReportSection::new("Results Overview");
            intro_section.add_content(html! {
                "Reported q-values of " (self.settings.results_path) " compared against the entrapment FDR of vial " (self.settings.vial.to_string()) "."
            });

            let table = html! {
                table {
                    tr { td { "Protein groups" } td { (calibration.len()) } }
                    tr { td { "Present proteins" } td { (index.present_count()) } }
                    tr { td { "Database proteins" } td { (self.pools.total()) } }
                    tr { td { "Significant at reported FDR < " (summary.threshold) } td { (summary.reported_significant) } }
                    tr { td { "Significant at entrapment FDR < " (summary.threshold) } td { (summary.observed_significant) } }
                    tr {
                        td { "Entrapment FDR at reported FDR < " (summary.threshold) }
                        td {
                            @match summary.observed_fdr_at_reported {
                                Some(fdr) => { (fdr) }
                                None => { "NA" }
                            }
                        }
                    }
                }
            };
            intro_section.add_content(table);
            report.add_section(intro_section);
        }

        /* Section 2: Calibration */
        {
            let mut calibration_section = ReportSection::new("Calibration");
            calibration_section.add_content(html! {
                "Reported q-values are scaled by the fraction of the database that is absent from the sample. A well-calibrated search engine follows the diagonal, and should stay within the dashed lines."
            });

            let (gx, gy) = guide_lines(0.0, 1.0);
            let all = scatter(
                [vec![calibration.scaled_q.clone()], gx].concat(),
                [vec![calibration.entrapment_q.clone()], gy].concat(),
                "Calibration (all)",
                "Decoy FDR",
                "Entrapment FDR",
            )?;
            calibration_section.add_plot(all);

            let (zoom_x, zoom_y): (Vec<f64>, Vec<f64>) = calibration
                .scaled_q
                .iter()
                .zip(&calibration.entrapment_q)
                .filter(|&(&x, &y)| x <= 0.1 && y <= 0.1)
                .map(|(&x, &y)| (x, y))
                .unzip();
            let (gx, gy) = guide_lines(0.0, 0.1);
            let zoom = scatter(
                [vec![zoom_x], gx].concat(),
                [vec![zoom_y], gy].concat(),
                "Calibration (zoom)",
                "Decoy FDR",
                "Entrapment FDR",
            )?;
            calibration_section.add_plot(zoom);

            let (log_x, log_y): (Vec<f64>, Vec<f64>) = calibration
                .scaled_q
                .iter()
                .zip(&calibration.entrapment_q)
                .map(|(&x, &y)| (x + LOG_OFFSET, y + LOG_OFFSET))
                .filter(|&(x, y)| (1E-3..=1E-1).contains(&x) && (1E-3..=1E-1).contains(&y))
                .map(|(x, y)| (x.log10(), y.log10()))
                .unzip();
            let (gx, gy) = guide_lines(1E-3, 1E-1);
            let log10 = |series: Vec<Vec<f64>>| -> Vec<Vec<f64>> {
                series
                    .into_iter()
                    .map(|s| s.into_iter().map(f64::log10).collect())
                    .collect()
            };
            let loglog = scatter(
                [vec![log_x], log10(gx)].concat(),
                [vec![log_y], log10(gy)].concat(),
                "Calibration (log-log)",
                "log10 Decoy FDR",
                "log10 Entrapment FDR",
            )?;
            calibration_section.add_plot(loglog);

            report.add_section(calibration_section);
        }

        /* Section 3: Performance */
        {
            let mut performance_section = ReportSection::new("Performance");
            performance_section.add_content(html! {
                "Number of protein groups reported at each entrapment FDR. The horizontal line marks the number of proteins present in the sample, the vertical line the FDR threshold."
            });

            let present = index.present_count() as f64;
            let max_y = ((present / 100.0).floor() + 1.0) * 100.0;
            let (x, y): (Vec<f64>, Vec<f64>) = calibration
                .entrapment_q
                .iter()
                .zip(&calibration.counts)
                .filter(|&(&q, _)| q <= 0.1)
                .map(|(&q, counts)| (q, counts.total() as f64))
                .unzip();

            let performance = plot_scatter(
                &vec![
                    x,
                    vec![summary.threshold, summary.threshold],
                    vec![0.0, 0.1],
                ],
                &vec![y, vec![0.0, max_y], vec![present, present]],
                vec![
                    "Entrapment".to_string(),
                    "Threshold".to_string(),
                    "Present proteins".to_string(),
                ],
                "Performance",
                "Entrapment FDR",
                "Number of protein groups",
            )
            .map_err(|e| anyhow::anyhow!("Failed to plot `Performance`: {:?}", e))?;
            performance_section.add_plot(performance);

            report.add_section(performance_section);
        }

        /* Section 4: Configuration */
        {
            let mut config_section = ReportSection::new("Configuration");
            config_section.add_content(html! {
                style {
                    ".code-container {
                        background-color: #f5f5f5;
                        padding: 10px;
                        border-radius: 5px;
                        overflow-x: auto;
                        font-family: monospace;
                        white-space: pre-wrap;
                    }"
                }
                div class="code-container" {
                    pre {
                        code { (PreEscaped(serde_json::to_string_pretty(&self.settings)?)) }
                    }
                }
            });
            report.add_section(config_section);
        }

        // Save the report to HTML file
        report.save_to_file(&path.display().to_string())?;

        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dense_guide_lines() {
        let (x, y) = guide_lines(0.0, 0.1);
        assert_eq!(x.len(), 3);
        assert_eq!(y.len(), 3);
        for (x, y) in x.iter().zip(&y) {
            assert_eq!(x.len(), GUIDE_POINTS);
            assert_eq!(y.len(), GUIDE_POINTS);
        }
        assert_eq!(x[0][0], 0.0);
        assert!((x[0][GUIDE_POINTS - 1] - 0.1).abs() < 1E-12);
        assert!(x[0].windows(2).all(|w| w[0] < w[1]));

        let last = GUIDE_POINTS - 1;
        assert_eq!(y[0][last], x[0][last]);
        assert!((y[1][last] - 0.1 * MARGIN).abs() < 1E-12);
        assert!((y[2][last] - 0.1 / MARGIN).abs() < 1E-12);
    }
}
