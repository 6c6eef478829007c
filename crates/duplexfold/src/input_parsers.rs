use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Cursor};
use std::path::Path;

use anyhow::{anyhow, Result};
use paste::paste;
use ahash::AHashSet;
use log::warn;
use colored::*;

use df_structure::RnaSequence;

/// One FASTA-like record: header, sequence, and an optional constraint
/// line over the `. b x p` alphabet.
#[derive(Debug, Clone)]
pub struct SequenceRecord {
    pub header: Option<String>,
    pub sequence: RnaSequence,
    pub constraint: Option<String>,
}

impl SequenceRecord {
    /// The record id: the first word of the header without '>', or a
    /// fallback name.
    pub fn id(&self) -> &str {
        self.header
            .as_deref()
            .and_then(|h| h.trim_start_matches('>').split_whitespace().next())
            .unwrap_or("unnamed")
    }
}

fn is_constraint_line(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| matches!(c, '.' | 'b' | 'x' | 'p' | ':' | '-' | ',') || c.is_ascii_digit())
}

/// Core parsing logic shared by all adapters: a stream of FASTA-like
/// records, each a header line, one sequence line, and an optional
/// constraint line.
fn parse_fasta_records<R: BufRead>(reader: R) -> Result<Vec<SequenceRecord>> {
    let mut records: Vec<SequenceRecord> = Vec::new();
    let mut header: Option<String> = None;
    let mut sequence: Option<String> = None;
    let mut constraint: Option<String> = None;

    let mut flush = |header: &mut Option<String>,
                     sequence: &mut Option<String>,
                     constraint: &mut Option<String>,
                     records: &mut Vec<SequenceRecord>|
     -> Result<()> {
        if let Some(seq) = sequence.take() {
            let name = header.clone().unwrap_or_default();
            let id = name.trim_start_matches('>').split_whitespace().next().unwrap_or("unnamed");
            records.push(SequenceRecord {
                header: header.take(),
                sequence: RnaSequence::from_lossy(id, &seq),
                constraint: constraint.take(),
            });
        } else if header.is_some() {
            return Err(anyhow!("Header without sequence line"));
        }
        Ok(())
    };

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('>') {
            flush(&mut header, &mut sequence, &mut constraint, &mut records)?;
            header = Some(line.to_string());
        } else if sequence.is_none() {
            sequence = Some(line.split_whitespace().next().unwrap().to_string());
        } else if constraint.is_none() && is_constraint_line(line) {
            constraint = Some(line.split_whitespace().next().unwrap().to_string());
        } else {
            // next unnamed record
            flush(&mut header, &mut sequence, &mut constraint, &mut records)?;
            sequence = Some(line.split_whitespace().next().unwrap().to_string());
        }
    }
    flush(&mut header, &mut sequence, &mut constraint, &mut records)?;

    if records.is_empty() {
        return Err(anyhow!("Missing sequence line"));
    }

    let mut seen = AHashSet::new();
    for record in &records {
        if !seen.insert(record.id().to_string()) {
            warn!("{} duplicate record id '{}'", "WARNING:".red(), record.id());
        }
    }
    Ok(records)
}

// ============================================================
//  Base parser functions (single- and multi-record variants)
// ============================================================

pub fn read_fasta_record<R: BufRead>(reader: R) -> Result<SequenceRecord> {
    let mut records = parse_fasta_records(reader)?;
    if records.len() > 1 {
        warn!(
            "{} input holds {} records, using the first one",
            "WARNING:".red(),
            records.len()
        );
    }
    Ok(records.swap_remove(0))
}

pub fn read_fasta_records<R: BufRead>(reader: R) -> Result<Vec<SequenceRecord>> {
    parse_fasta_records(reader)
}

// ============================================================
//  Macro generating file/string/stdin/input helpers
// ============================================================

/// Generate input adapters for a base parser function
/// `fn base<R: BufRead>(R) -> Result<T>`.
///
/// This expands into:
/// - `base_string(&str)`
/// - `base_file<P: AsRef<Path>>(P)`
/// - `base_stdin()`
/// - `base_input(&str)`  (dispatches "-" -> stdin, otherwise -> file)
macro_rules! define_input_variants {
    ($base:ident, $ret:ty) => {
        paste! {
            /// Read from a string buffer.
            pub fn [<$base _string>](s: &str) -> $ret {
                $base(Cursor::new(s))
            }

            /// Read from a file path.
            pub fn [<$base _file>]<P: AsRef<Path>>(path: P) -> $ret {
                let reader = BufReader::new(File::open(path)?);
                $base(reader)
            }

            /// Read from stdin.
            pub fn [<$base _stdin>]() -> $ret {
                let reader = BufReader::new(stdin());
                $base(reader)
            }

            /// Read either from stdin ("-") or a file path.
            pub fn [<$base _input>](s: &str) -> $ret {
                if s == "-" {
                    [<$base _stdin>]()
                } else {
                    [<$base _file>](s)
                }
            }
        }
    };
}

define_input_variants!(read_fasta_record, Result<SequenceRecord>);
define_input_variants!(read_fasta_records, Result<Vec<SequenceRecord>>);

// ============================================================
//  Position ruler for pretty terminal output
// ============================================================

pub fn ruler(len: usize) -> String {
    let mut s = String::new();
    let mut c = 0;
    for i in 0..=len {
        if i % 10 == 0 {
            let t = format!("{}", i / 10);
            c = t.len() - 1;
            s.push_str(&t);
            continue;
        } else if c > 0 {
            c -= 1;
            continue;
        }
        if i % 10 == 5 {
            s.push(',');
        } else {
            s.push('.');
        }
    }
    s
}

// ============================================================
//  Unit tests
// ============================================================
