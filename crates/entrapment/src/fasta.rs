use std::io::BufRead;

/// Collect the accession of every record in a FASTA stream.
///
/// The accession is the header text directly following `>`, up to the
/// first whitespace. Sequence lines are skipped, and headers without an
/// accession are ignored.
pub fn accessions<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut accessions = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(header) = line.trim_end().strip_prefix('>') {
            if let Some(acc) = header
                .split(|c: char| c.is_ascii_whitespace())
                .next()
                .filter(|acc| !acc.is_empty())
            {
                accessions.push(acc.to_string());
            }
        }
    }
    Ok(accessions)
}

#[cfg(test)]
mod test {
    use super::*;

    const FASTA: &str = r#"
>sp|Q99536|VAT1_HUMAN Synaptic vesicle membrane protein VAT-1 homolog OS=Homo sapiens
MSDEREVAEAATGEDASSPPPKTEAASDPQHPAASEGAAAAAASPPLLRCLVLTGFGGYD
KVKLQSRPAAPPAPGPGQLTLRLRACGLNFADLMARQGLYDRLPPLPVTPGMEGAGVVIA
>HPRR1234567
MADEEK
>
PEPTIDE
> HPRR0000001 space before accession
PEPTIDE
>HPRR7654321
"#;

    #[test]
    fn parse_accessions() -> std::io::Result<()> {
        let acc = accessions(FASTA.as_bytes())?;
        assert_eq!(
            acc,
            vec!["sp|Q99536|VAT1_HUMAN", "HPRR1234567", "HPRR7654321"]
        );
        Ok(())
    }

    #[test]
    fn empty_stream() -> std::io::Result<()> {
        assert!(accessions("".as_bytes())?.is_empty());
        assert!(accessions("MADEEK\nPEPTIDE\n".as_bytes())?.is_empty());
        Ok(())
    }
}
