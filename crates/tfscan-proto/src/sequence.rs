//! Sequence normalizer: turns pasted text (plain residues or FASTA) into a
//! `NormalizedSequence`.
//!
//! Only the single-header convention is understood: a leading `>` line is
//! taken as the record name and everything after the first line break is
//! passed through verbatim.  Multi-line FASTA bodies keep their line breaks;
//! the scanning service sees exactly what was typed.

/// First character of a FASTA header line.
pub const FASTA_SENTINEL: char = '>';

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedSequence {
    /// Header text without the sentinel, when the input was FASTA.
    pub display_name: Option<String>,
    /// Residue text as typed, never including the header line.
    pub raw_residues: String,
}

impl NormalizedSequence {
    /// True when there is anything to send to the scanner.
    pub fn is_scannable(&self) -> bool {
        !self.raw_residues.is_empty()
    }

    /// Non-whitespace characters in the body (display only).
    pub fn residue_count(&self) -> usize {
        self.raw_residues
            .chars()
            .filter(|c| !c.is_whitespace())
            .count()
    }

    /// The body still contains line breaks, e.g. a wrapped FASTA record.
    pub fn has_wrapped_body(&self) -> bool {
        self.raw_residues.trim_end().contains('\n')
    }
}

/// Parse raw editor text.  Never fails.
pub fn normalize(raw: &str) -> NormalizedSequence {
    if !raw.starts_with(FASTA_SENTINEL) {
        return NormalizedSequence {
            display_name: None,
            raw_residues: raw.to_string(),
        };
    }

    let (header, body) = match raw.split_once('\n') {
        Some((header, body)) => (header, body),
        None => (raw, ""),
    };
    let name = header[FASTA_SENTINEL.len_utf8()..].trim();

    NormalizedSequence {
        display_name: Some(name.to_string()),
        raw_residues: body.to_string(),
    }
}
