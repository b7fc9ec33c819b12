pub mod entrapment;
pub mod fasta;
pub mod ground_truth;
pub mod results;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Error {
    Io(PathBuf, std::io::Error),
    Csv(csv::Error),
    /// Non-numeric q-value on the given (1-based) line
    Parse { line: u64, value: String },
    /// Q-value outside of [0, 1] on the given (1-based) line
    QValueRange { line: u64, value: f64 },
    /// Row without a q-value column on the given (1-based) line
    MissingColumn { line: u64 },
    Json(serde_json::Error),
    InvalidVial(String),
    /// `present` out of `total` proteins does not yield a usable absence prior
    DegeneratePrior { present: usize, total: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            Self::Csv(e) => write!(f, "{}", e),
            Self::Parse { line, value } => {
                write!(f, "line {}: could not parse q-value `{}`", line, value)
            }
            Self::QValueRange { line, value } => {
                write!(f, "line {}: q-value {} is outside of [0, 1]", line, value)
            }
            Self::MissingColumn { line } => {
                write!(f, "line {}: expected `<proteins>\\t<q-value>`", line)
            }
            Self::Json(e) => write!(f, "{}", e),
            Self::InvalidVial(s) => {
                write!(f, "invalid vial `{}`, expected one of 'A', 'B' or 'AB'", s)
            }
            Self::DegeneratePrior { present, total } => write!(
                f,
                "cannot estimate entrapment FDR with {} present proteins out of {} in the database",
                present, total
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(residual: csv::Error) -> Self {
        Self::Csv(residual)
    }
}

fn open<P: AsRef<Path>>(path: P) -> Result<BufReader<File>, Error> {
    let path = path.as_ref();
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::Io(path.into(), e))
}

/// Read all protein accessions from a FASTA file
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    fasta::accessions(open(path)?).map_err(|e| Error::Io(path.into(), e))
}

/// Read a tab-separated results file, in the order it was written
pub fn read_results<P: AsRef<Path>>(path: P) -> Result<Vec<results::ResultRecord>, Error> {
    results::parse(open(path)?)
}

pub fn read_json<P, T>(path: P) -> Result<T, Error>
where
    P: AsRef<Path>,
    T: for<'de> serde::Deserialize<'de>,
{
    serde_json::from_reader(open(path)?).map_err(Error::Json)
}
