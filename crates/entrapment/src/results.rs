use crate::Error;
use itertools::Itertools;
use serde::Serialize;
use std::io::Read;

/// Proteins reported together as a single, ambiguous identification
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProteinGroup(pub Vec<String>);

impl ProteinGroup {
    /// Decode the comma-joined wire representation of a protein group
    pub fn decode(s: &str) -> Self {
        Self(
            s.split(',')
                .filter(|acc| !acc.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn accessions(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ProteinGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}

/// A single reported identification
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRecord {
    pub proteins: ProteinGroup,
    pub q_value: f64,
}

/// Parse a tab-separated results file: one header line, followed by rows of
/// `<protein group>\t<q-value>`. Additional columns are ignored.
///
/// # Invariants
/// * Row order is preserved - it is the significance ranking of the search
///   engine that produced the file
pub fn parse<R: Read>(rdr: R) -> Result<Vec<ResultRecord>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(rdr);

    let mut records = Vec::new();
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let (proteins, q) = match (record.get(0), record.get(1)) {
            (Some(proteins), Some(q)) => (proteins, q),
            _ => return Err(Error::MissingColumn { line }),
        };
        let q_value = q.trim().parse::<f64>().map_err(|_| Error::Parse {
            line,
            value: q.into(),
        })?;
        if !(0.0..=1.0).contains(&q_value) {
            return Err(Error::QValueRange {
                line,
                value: q_value,
            });
        }

        records.push(ResultRecord {
            proteins: ProteinGroup::decode(proteins),
            q_value,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_group() {
        let group = ProteinGroup::decode("p1,p2,p3");
        assert_eq!(group.accessions(), &["p1", "p2", "p3"]);
        assert_eq!(group.to_string(), "p1,p2,p3");

        let group = ProteinGroup::decode("p2,p1");
        assert_eq!(group.accessions(), &["p2", "p1"]);

        assert!(ProteinGroup::decode("").is_empty());
    }

    #[test]
    fn parse_results() -> Result<(), Error> {
        let contents = "protein id\tq-value\tposterior_error_prob\n\
                        p1\t0.01\t0.001\n\
                        p3,p4\t0.02\n\
                        p2\t0.03\t0.5\textra\n";
        let records = parse(contents.as_bytes())?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].proteins.accessions(), &["p1"]);
        assert_eq!(records[1].proteins.accessions(), &["p3", "p4"]);
        assert_eq!(records[2].q_value, 0.03);
        Ok(())
    }

    #[test]
    fn empty_group_is_kept() -> Result<(), Error> {
        let contents = "protein id\tq-value\np1\t0.01\n\t0.02\np2\t0.03\n";
        let records = parse(contents.as_bytes())?;
        assert_eq!(records.len(), 3);
        assert!(records[1].proteins.is_empty());
        assert_eq!(records[1].q_value, 0.02);
        Ok(())
    }

    #[test]
    fn header_only() -> Result<(), Error> {
        assert!(parse("protein id\tq-value\n".as_bytes())?.is_empty());
        assert!(parse("".as_bytes())?.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_q_value() {
        let contents = "protein id\tq-value\np1\t0.01\np2\tNA\n";
        match parse(contents.as_bytes()) {
            Err(Error::Parse { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "NA");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_q_value() {
        let contents = "protein id\tq-value\np1\t1.5\n";
        assert!(matches!(
            parse(contents.as_bytes()),
            Err(Error::QValueRange { line: 2, .. })
        ));
    }

    #[test]
    fn missing_q_value() {
        let contents = "protein id\tq-value\np1\n";
        assert!(matches!(
            parse(contents.as_bytes()),
            Err(Error::MissingColumn { line: 2 })
        ));
    }
}
