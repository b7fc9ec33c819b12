use anyhow::{ensure, Context};
use clap::{value_parser, Arg, ArgMatches, Command, ValueHint};
use entrapment_core::ground_truth::Vial;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const POOL_A: &str = "prest_pool_a.fasta";
pub const POOL_B: &str = "prest_pool_b.fasta";
pub const POOL_RANDOM: &str = "prest_1000_random.fasta";

/// Command-line surface of the `entrapment` binary
pub fn command() -> Command {
    Command::new("entrapment")
        .version(clap::crate_version!())
        .author("Michael Lazear <michaellazear92@gmail.com>")
        .about("Calibrate reported protein-group q-values against an entrapment FDR")
        .arg(
            Arg::new("results")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path to tab-separated results: a header line, followed by \
                     `<protein group>\\t<q-value>` rows ordered by significance",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("vial")
                .required(true)
                .ignore_case(true)
                .value_parser(["A", "B", "AB"])
                .help("Which pools were spiked into the sample"),
        )
        .arg(
            Arg::new("parameters")
                .long("parameters")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to configuration parameters (JSON file)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("pool_a")
                .long("pool-a")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("FASTA file of pool A proteins (default: prest_pool_a.fasta)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("pool_b")
                .long("pool-b")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("FASTA file of pool B proteins (default: prest_pool_b.fasta)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("pool_random")
                .long("pool-random")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "FASTA file of entrapment proteins never added to the sample \
                     (default: prest_1000_random.fasta)",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_directory")
                .short('o')
                .long("output_directory")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path where calibration results will be written. \
                     Overrides the directory specified in the configuration file.",
                )
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .value_parser(value_parser!(f64))
                .help("FDR threshold used for the summary statistics (default = 0.05)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .action(clap::ArgAction::SetTrue)
                .help("Write an HTML calibration report"),
        )
        .arg(
            Arg::new("no-tsv")
                .long("no-tsv")
                .action(clap::ArgAction::SetTrue)
                .help("Don't write per-record calibration output"),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
}

#[derive(Serialize, Clone, Debug)]
/// Actual run parameters - may include overrides or default values not set by user
pub struct Settings {
    pub version: String,
    pub results_path: String,
    pub vial: Vial,
    pub pool_a: String,
    pub pool_b: String,
    pub pool_random: String,
    pub threshold: f64,
    pub write_report: bool,
    pub write_tsv: bool,

    #[serde(skip_serializing)]
    pub output_directory: PathBuf,
}

#[derive(Deserialize, Default, Debug)]
/// Input parameters deserialized from JSON file
pub struct Input {
    pool_a: Option<String>,
    pool_b: Option<String>,
    pool_random: Option<String>,
    threshold: Option<f64>,
    output_directory: Option<String>,
    write_report: Option<bool>,
    write_tsv: Option<bool>,

    #[serde(skip)]
    results_path: Option<String>,
    #[serde(skip)]
    vial: Option<String>,
}

impl Input {
    pub fn from_arguments(matches: ArgMatches) -> anyhow::Result<Self> {
        let mut input = match matches.get_one::<String>("parameters") {
            Some(path) => Input::load(path)
                .with_context(|| format!("Failed to read parameters from `{path}`"))?,
            None => Input::default(),
        };

        input.results_path = matches.get_one::<String>("results").cloned();
        input.vial = matches.get_one::<String>("vial").cloned();

        // Handle JSON configuration overrides
        if let Some(pool_a) = matches.get_one::<String>("pool_a") {
            log::trace!("overriding `pool_a` parameter.");
            input.pool_a = Some(pool_a.into());
        }
        if let Some(pool_b) = matches.get_one::<String>("pool_b") {
            log::trace!("overriding `pool_b` parameter.");
            input.pool_b = Some(pool_b.into());
        }
        if let Some(pool_random) = matches.get_one::<String>("pool_random") {
            log::trace!("overriding `pool_random` parameter.");
            input.pool_random = Some(pool_random.into());
        }
        if let Some(output_directory) = matches.get_one::<String>("output_directory") {
            log::trace!("overriding `output_directory` parameter.");
            input.output_directory = Some(output_directory.into());
        }
        if let Some(threshold) = matches.get_one::<f64>("threshold").copied() {
            log::trace!("overriding `threshold` parameter.");
            input.threshold = Some(threshold);
        }
        if matches.get_flag("report") {
            input.write_report = Some(true);
        }
        if matches.get_flag("no-tsv") {
            input.write_tsv = Some(false);
        }

        Ok(input)
    }

    pub fn load<S: AsRef<str>>(path: S) -> anyhow::Result<Self> {
        entrapment_core::read_json(path.as_ref()).map_err(anyhow::Error::from)
    }

    /// Set the positional arguments normally supplied on the command line
    pub fn with_results<S: Into<String>>(mut self, results_path: S, vial: S) -> Self {
        self.results_path = Some(results_path.into());
        self.vial = Some(vial.into());
        self
    }

    pub fn with_pools<S: Into<String>>(mut self, pool_a: S, pool_b: S, pool_random: S) -> Self {
        self.pool_a = Some(pool_a.into());
        self.pool_b = Some(pool_b.into());
        self.pool_random = Some(pool_random.into());
        self
    }

    pub fn with_output_directory<S: Into<String>>(mut self, output_directory: S) -> Self {
        self.output_directory = Some(output_directory.into());
        self
    }

    pub fn build(self) -> anyhow::Result<Settings> {
        let results_path = self
            .results_path
            .context("a results file must be provided")?;
        let vial = self
            .vial
            .context("a vial must be provided")?
            .parse::<Vial>()?;

        let threshold = self.threshold.unwrap_or(0.05);
        ensure!(
            threshold > 0.0 && threshold < 1.0,
            "`threshold` must be between 0 and 1, got {}",
            threshold
        );
        if threshold > 0.1 {
            log::warn!(
                "`threshold` is higher than expected ({}), plots are limited to FDRs below 0.1",
                threshold
            );
        }

        let output_directory = match self.output_directory {
            Some(path) => {
                let path = PathBuf::from(path);
                std::fs::create_dir_all(&path).with_context(|| {
                    format!("Failed to create output directory `{}`", path.display())
                })?;
                path
            }
            None => std::env::current_dir()?,
        };

        Ok(Settings {
            version: clap::crate_version!().into(),
            results_path,
            vial,
            pool_a: self.pool_a.unwrap_or_else(|| POOL_A.into()),
            pool_b: self.pool_b.unwrap_or_else(|| POOL_B.into()),
            pool_random: self.pool_random.unwrap_or_else(|| POOL_RANDOM.into()),
            threshold,
            write_report: self.write_report.unwrap_or(false),
            write_tsv: self.write_tsv.unwrap_or(true),
            output_directory,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let settings = Input::default()
            .with_results("results.tsv", "ab")
            .build()?;
        assert_eq!(settings.vial, Vial::AB);
        assert_eq!(settings.pool_a, POOL_A);
        assert_eq!(settings.pool_b, POOL_B);
        assert_eq!(settings.pool_random, POOL_RANDOM);
        assert_eq!(settings.threshold, 0.05);
        assert!(settings.write_tsv);
        assert!(!settings.write_report);
        Ok(())
    }

    #[test]
    fn json_parameters() -> anyhow::Result<()> {
        let input: Input = serde_json::from_str(
            r#"{ "pool_a": "a.fasta", "threshold": 0.01, "write_report": true }"#,
        )?;
        let settings = input.with_results("results.tsv", "A").build()?;
        assert_eq!(settings.pool_a, "a.fasta");
        assert_eq!(settings.pool_b, POOL_B);
        assert_eq!(settings.threshold, 0.01);
        assert!(settings.write_report);
        Ok(())
    }

    #[test]
    fn reject_invalid() {
        assert!(Input::default().build().is_err());
        assert!(Input::default().with_results("results.tsv", "C").build().is_err());

        let input: Input = serde_json::from_str(r#"{ "threshold": 1.5 }"#).unwrap();
        assert!(input.with_results("results.tsv", "A").build().is_err());
    }

    #[test]
    fn command_line_vial() -> anyhow::Result<()> {
        let matches = command().try_get_matches_from(["entrapment", "r.tsv", "ab"])?;
        let settings = Input::from_arguments(matches)?.build()?;
        assert_eq!(settings.vial, Vial::AB);
        assert_eq!(settings.results_path, "r.tsv");

        let err = command()
            .try_get_matches_from(["entrapment", "r.tsv", "C"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        Ok(())
    }

    #[test]
    fn command_line_argument_count() {
        let err = command()
            .try_get_matches_from(["entrapment", "r.tsv"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        assert!(command()
            .try_get_matches_from(["entrapment", "r.tsv", "a", "extra"])
            .is_err());
        assert!(command().try_get_matches_from(["entrapment"]).is_err());
    }

    #[test]
    fn command_line_overrides() -> anyhow::Result<()> {
        let matches = command().try_get_matches_from([
            "entrapment",
            "r.tsv",
            "b",
            "--pool-a",
            "a.fasta",
            "--threshold",
            "0.01",
            "--report",
            "--no-tsv",
        ])?;
        let settings = Input::from_arguments(matches)?.build()?;
        assert_eq!(settings.vial, Vial::B);
        assert_eq!(settings.pool_a, "a.fasta");
        assert_eq!(settings.pool_b, POOL_B);
        assert_eq!(settings.threshold, 0.01);
        assert!(settings.write_report);
        assert!(!settings.write_tsv);
        Ok(())
    }
}
