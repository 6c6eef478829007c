use std::fmt;
use std::io;
use std::io::BufRead;
use std::sync::Arc;

use log::info;
use log::warn;
use colored::*;

use df_structure::AccessibilityConstraint;
use df_structure::RnaSequence;
use df_structure::{Energy, kcal_to_e};

use crate::Accessibility;
use crate::ED_UPPER_BOUND;
use crate::accessibility::EdMatrix;
use crate::accessibility::check_indices;

/// Value semantics of an accessibility text stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessibilityStreamMode {
    /// Unpaired probabilities in [0,1], converted via ED = -RT ln(p).
    UnpairedProbabilities,
    /// ED values in kcal/mol, >= 0.
    EdValues,
}

#[derive(Debug)]
pub enum AccessibilityError {
    Io(io::Error),
    MissingHeader,
    BadLengthHeader(String),
    NonConsecutiveRow { expected: usize, found: usize },
    BadValue { row: usize, column: usize, value: String },
    MissingRows { parsed: usize, expected: usize },
    UnsupportedConstraint,
}

impl fmt::Display for AccessibilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessibilityError::Io(e) => write!(f, "I/O error: {}", e),
            AccessibilityError::MissingHeader => {
                write!(f, "First line is no header line starting with '#'")
            }
            AccessibilityError::BadLengthHeader(line) => {
                write!(f, "'{}' is no proper window lengths header", line)
            }
            AccessibilityError::NonConsecutiveRow { expected, found } => {
                write!(f, "Non-consecutive row {} where {} was expected", found, expected)
            }
            AccessibilityError::BadValue { row, column, value } => {
                write!(f, "Row {}: the {}. value '{}' is not usable", row, column, value)
            }
            AccessibilityError::MissingRows { parsed, expected } => {
                write!(f, "Only {} rows parsed but {} expected", parsed, expected)
            }
            AccessibilityError::UnsupportedConstraint => {
                write!(f, "Accessibility constraints are not supported for direct accessibility input")
            }
        }
    }
}

impl std::error::Error for AccessibilityError {}

impl From<io::Error> for AccessibilityError {
    fn from(e: io::Error) -> Self {
        AccessibilityError::Io(e)
    }
}


/// Accessibility loaded from an RNAplfold-like text stream: one header
/// line, one window lengths line `#i$ l=1 2 ... L`, then one row per
/// sequence position j = 1..N holding min(j, L) values.
pub struct AccessibilityFromStream {
    sequence: Arc<RnaSequence>,
    max_length: usize,
    constraint: AccessibilityConstraint,
    ed: EdMatrix,
}

impl AccessibilityFromStream {
    /// Parses the stream. A max_length of 0 defaults to the sequence
    /// length; when the stream exposes a smaller window than requested,
    /// the effective max_length is lowered to it.
    pub fn from_reader<R: BufRead>(
        sequence: Arc<RnaSequence>,
        max_length: usize,
        constraint: AccessibilityConstraint,
        reader: R,
        mode: AccessibilityStreamMode,
        rt: f64,
    ) -> Result<Self, AccessibilityError> {
        if !constraint.is_empty() {
            return Err(AccessibilityError::UnsupportedConstraint);
        }
        let n = sequence.len();
        let requested = if max_length == 0 { n } else { max_length.min(n) };

        let mut lines = reader.lines().filter(|l| {
            l.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(true)
        });

        // header line
        let header = lines.next().ok_or(AccessibilityError::MissingHeader)??;
        if !header.trim_start().starts_with('#') {
            return Err(AccessibilityError::MissingHeader);
        }

        // window lengths line: the last number is the available maximum
        let lengths = lines.next().ok_or_else(|| {
            AccessibilityError::BadLengthHeader(String::new())
        })??;
        let avail = parse_length_header(&lengths)
            .ok_or_else(|| AccessibilityError::BadLengthHeader(lengths.clone()))?;

        let max_length = if avail < requested {
            info!(
                "available maximal window length {} of sequence '{}' is smaller than {} : reducing",
                avail,
                sequence.id(),
                requested
            );
            avail
        } else {
            requested
        };

        let mut ed = EdMatrix::new(n, max_length);

        let mut last_j = 0usize;
        for line in lines {
            let line = line?;
            let mut tokens = line.split_whitespace();
            let j_token = match tokens.next() {
                Some(t) => t,
                None => continue,
            };
            let j: usize = j_token.parse().map_err(|_| AccessibilityError::BadValue {
                row: last_j + 1,
                column: 0,
                value: j_token.to_string(),
            })?;
            if j > n {
                warn!(
                    "{} more accessibility rows than sequence '{}' is long; ignoring the rest",
                    "WARNING:".red(),
                    sequence.id()
                );
                last_j = n;
                break;
            }
            if j != last_j + 1 {
                return Err(AccessibilityError::NonConsecutiveRow {
                    expected: last_j + 1,
                    found: j,
                });
            }

            for l in 1..=max_length.min(j) {
                let token = tokens.next().ok_or(AccessibilityError::BadValue {
                    row: j,
                    column: l,
                    value: String::new(),
                })?;
                let value: f64 = token.parse().map_err(|_| AccessibilityError::BadValue {
                    row: j,
                    column: l,
                    value: token.to_string(),
                })?;
                let cell = match mode {
                    AccessibilityStreamMode::UnpairedProbabilities => {
                        if !(0.0..=1.0).contains(&value) {
                            return Err(AccessibilityError::BadValue {
                                row: j,
                                column: l,
                                value: token.to_string(),
                            });
                        }
                        if value > 0.0 {
                            ED_UPPER_BOUND.min(kcal_to_e(-rt * value.ln()))
                        } else {
                            ED_UPPER_BOUND
                        }
                    }
                    AccessibilityStreamMode::EdValues => {
                        if value < 0.0 {
                            return Err(AccessibilityError::BadValue {
                                row: j,
                                column: l,
                                value: token.to_string(),
                            });
                        }
                        ED_UPPER_BOUND.min(kcal_to_e(value))
                    }
                };
                ed.set(j - l, j - 1, cell);
            }
            last_j = j;
        }

        if last_j < n {
            return Err(AccessibilityError::MissingRows { parsed: last_j, expected: n });
        }

        Ok(AccessibilityFromStream { sequence, max_length, constraint, ed })
    }
}

/// Extracts the largest window length from a `#i$ l=1 2 ... L` line.
fn parse_length_header(line: &str) -> Option<usize> {
    let line = line.trim();
    if !line.starts_with('#') || !line.contains("l=") {
        return None;
    }
    let rest = line.split_once("l=")?.1;
    let mut last = None;
    let mut expected = 1usize;
    for token in rest.split_whitespace() {
        let v: usize = token.parse().ok()?;
        if v != expected {
            return None;
        }
        expected += 1;
        last = Some(v);
    }
    last
}

impl Accessibility for AccessibilityFromStream {
    fn sequence(&self) -> &Arc<RnaSequence> {
        &self.sequence
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn constraint(&self) -> &AccessibilityConstraint {
        &self.constraint
    }

    fn get_ed(&self, from: usize, to: usize) -> Energy {
        check_indices(self.sequence.len(), from, to);
        if to - from + 1 > self.max_length {
            return ED_UPPER_BOUND;
        }
        if !self.constraint.is_accessible(from) || !self.constraint.is_accessible(to) {
            return ED_UPPER_BOUND;
        }
        self.ed.get(from, to)
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) const SEQ: &str = "uaugacugacuggcgcgcguacugacguga";

    // RNAplfold output for SEQ, window size 10
    pub(crate) const ACC_STRING: &str = "\
#unpaired probabilities
 #i$	l=1	2	3	4	5	6	7	8	9	10
1	0.9949492	NA	NA	NA	NA	NA	NA	NA	NA	NA
2	0.9949079	0.9941056	NA	NA	NA	NA	NA	NA	NA	NA
3	0.9554214	0.9518663	0.9511048	NA	NA	NA	NA	NA	NA	NA
4	0.9165814	0.9122866	0.9090283	0.9083552	NA	NA	NA	NA	NA	NA
5	0.998999	0.915609	0.9117766	0.9085215	0.9079146	NA	NA	NA	NA	NA
6	0.8549929	0.8541667	0.8448852	0.8431375	0.8398829	0.8393024	NA	NA	NA	NA
7	0.9161161	0.8446519	0.8438282	0.8348281	0.8330847	0.8313335	0.8307534	NA	NA	NA
8	0.9830043	0.9081378	0.8373899	0.8365669	0.8278368	0.8262157	0.824465	0.824227	NA	NA
9	0.997844	0.9813391	0.9065023	0.8358459	0.8350237	0.8264586	0.8260226	0.8242721	0.8241441	NA
10	0.9906155	0.9893027	0.9730023	0.8981675	0.8275292	0.8267074	0.8218168	0.8213811	0.8196307	0.8195027
11	0.9941335	0.9851103	0.9839263	0.9676888	0.8928559	0.8222774	0.8222198	0.8180557	0.817621	0.8176206
12	0.8690241	0.8654449	0.8566608	0.8554815	0.839264	0.8380446	0.8219215	0.821864	0.8177102	0.8174872
13	0.9107177	0.8531571	0.8517984	0.8431146	0.8419464	0.8257519	0.8253962	0.8198182	0.8197612	0.8156254
14	0.7755244	0.747624	0.7155972	0.7144589	0.706254	0.7052549	0.7036699	0.7033524	0.6977753	0.6977266
15	0.8058957	0.7601865	0.7326016	0.7027262	0.7016679	0.6982151	0.6972195	0.6956395	0.6954189	0.695329
16	0.02191314	0.01959841	0.01791968	0.01723728	0.01616173	0.01612733	0.01540904	0.01538624	0.01534086	0.01533351
17	0.006584845	0.004112372	0.003121421	0.002703536	0.00256851	0.002078218	0.002074677	0.00146262	0.001459626	0.001442846
18	0.06644609	0.003804626	0.002098785	0.001559709	0.001266798	0.001193299	0.001136074	0.001133916	0.0005256679	0.0005240971
19	0.111588	0.06519989	0.002731614	0.001196305	0.0006678619	0.0006216257	0.0005496343	0.0004939404	0.0004923591	0.0004805025
20	0.218612	0.1112393	0.06492555	0.002594459	0.001065674	0.0005483276	0.000508408	0.0004408385	0.0003950237	0.0003935838
21	0.9994454	0.2185816	0.1112115	0.06489999	0.002569867	0.001041783	0.0005260561	0.0004874071	0.000420591	0.0003755812
22	0.9989273	0.9985739	0.2182373	0.110926	0.06462868	0.002470349	0.0009426092	0.0004363855	0.000398409	0.0003850587
23	0.9710494	0.970038	0.9696895	0.1893656	0.1088858	0.06258917	0.002455754	0.0009280366	0.0004343271	0.0003963808
24	0.9250563	0.9249602	0.9243959	0.9240502	0.1446156	0.06419723	0.06149891	0.001366442	0.0008949269	0.0004013865
25	0.2210327	0.1460893	0.1460065	0.1454443	0.1450991	0.1446134	0.06419553	0.06149747	0.001365021	0.0008935096
26	0.004788834	0.004701346	0.004555013	0.004523588	0.004243178	0.003900484	0.003612546	0.003570138	0.0008844166	0.0008689095
27	0.001313809	0.001162996	0.001158495	0.001102602	0.001085606	0.001015911	0.0006740694	0.0004613423	0.0004217853	0.0003974838
28	0.003579508	0.001248483	0.001151334	0.001146998	0.00109294	0.001076138	0.001006977	0.0006660441	0.0004544384	0.0004200339
29	0.02706842	0.002727444	0.001208356	0.001115501	0.001111228	0.001059088	0.001043366	0.001003024	0.0006621005	0.0004513765
30	0.9980056	0.02520127	0.002719133	0.001206888	0.001114084	0.001109818	0.001057748	0.001043013	0.001002708	0.0006617864
";

    pub(crate) fn fixture(mode: AccessibilityStreamMode) -> AccessibilityFromStream {
        let rna = Arc::new(RnaSequence::new("test", SEQ).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        AccessibilityFromStream::from_reader(
            rna,
            10,
            constraint,
            Cursor::new(ACC_STRING),
            mode,
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_probabilities() {
        let acc = fixture(AccessibilityStreamMode::UnpairedProbabilities);
        assert_eq!(acc.max_length(), 10);
        assert_eq!(acc.get_ed(29, 29), 0);
        assert_eq!(acc.get_ed(20, 29), 732);
        assert_eq!(acc.get_ed(0, 29), ED_UPPER_BOUND);
    }

    #[test]
    fn test_window_shrinks_to_stream() {
        let rna = Arc::new(RnaSequence::new("test", SEQ).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        let acc = AccessibilityFromStream::from_reader(
            rna,
            20,
            constraint,
            Cursor::new(ACC_STRING),
            AccessibilityStreamMode::UnpairedProbabilities,
            1.0,
        )
        .unwrap();
        assert_eq!(acc.max_length(), 10);
        assert_eq!(acc.get_ed(10, 29), ED_UPPER_BOUND);
    }

    #[test]
    fn test_sequence_too_long() {
        let double = format!("{}{}", SEQ, SEQ);
        let rna = Arc::new(RnaSequence::new("tooLong", &double).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        let result = AccessibilityFromStream::from_reader(
            rna,
            10,
            constraint,
            Cursor::new(ACC_STRING),
            AccessibilityStreamMode::UnpairedProbabilities,
            1.0,
        );
        assert!(matches!(result, Err(AccessibilityError::MissingRows { parsed: 30, expected: 60 })));
    }

    #[test]
    fn test_non_consecutive_rows() {
        let broken = ACC_STRING.replace("\n3\t", "\n4\t");
        let rna = Arc::new(RnaSequence::new("test", SEQ).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        let result = AccessibilityFromStream::from_reader(
            rna,
            10,
            constraint,
            Cursor::new(broken),
            AccessibilityStreamMode::UnpairedProbabilities,
            1.0,
        );
        assert!(matches!(
            result,
            Err(AccessibilityError::NonConsecutiveRow { expected: 3, found: 4 })
        ));
    }

    #[test]
    fn test_constraint_unsupported() {
        let rna = Arc::new(RnaSequence::new("test", SEQ).unwrap());
        let constraint = AccessibilityConstraint::from_string(rna.len(), "b:1-2", 0).unwrap();
        let result = AccessibilityFromStream::from_reader(
            rna,
            10,
            constraint,
            Cursor::new(ACC_STRING),
            AccessibilityStreamMode::UnpairedProbabilities,
            1.0,
        );
        assert!(matches!(result, Err(AccessibilityError::UnsupportedConstraint)));
    }

    #[test]
    fn test_decompose_by_max_ed_fixture() {
        // probabilities read as plain ED values
        let acc = fixture(AccessibilityStreamMode::EdValues);
        assert_eq!(acc.decompose_by_max_ed(8, 5, 1).to_string(), "5-5,11-18,24-29");
        assert_eq!(acc.decompose_by_max_ed(8, 5, 2).to_string(), "11-18,24-29");
        assert_eq!(acc.decompose_by_max_ed(8, 5, 7).to_string(), "11-18");
    }

    #[test]
    fn test_decompose_by_threshold() {
        let acc = fixture(AccessibilityStreamMode::EdValues);
        let mut ranges: df_structure::IndexRangeList = "0-29".parse().unwrap();
        // single-position EDs are the first column; threshold at 0.5 kcal
        acc.decompose_by_threshold(&mut ranges, 50);
        for r in ranges.iter() {
            for i in r.from..=r.to {
                assert!(acc.get_ed(i, i) <= 50);
            }
        }
        // positions above the threshold are dropped, e.g. row 1 (0.99 -> 99)
        assert!(!ranges.covers(0));
        assert!(ranges.covers(15)); // row 16: 0.0219 -> 2
    }

    #[test]
    fn test_roundtrip_probabilities() {
        let acc = fixture(AccessibilityStreamMode::UnpairedProbabilities);
        let mut buffer = Vec::new();
        acc.write_plfold_text(&mut buffer, 1.0, true).unwrap();

        let rna = Arc::new(RnaSequence::new("test", SEQ).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        let acc2 = AccessibilityFromStream::from_reader(
            rna,
            10,
            constraint,
            Cursor::new(buffer),
            AccessibilityStreamMode::UnpairedProbabilities,
            1.0,
        )
        .unwrap();

        for j in 0usize..30 {
            for i in j.saturating_sub(9)..=j {
                assert_eq!(acc.get_ed(i, j), acc2.get_ed(i, j), "mismatch at ({},{})", i, j);
            }
        }
    }

    #[test]
    fn test_roundtrip_ed_values() {
        let acc = fixture(AccessibilityStreamMode::EdValues);
        let mut buffer = Vec::new();
        acc.write_plfold_text(&mut buffer, 1.0, false).unwrap();

        let rna = Arc::new(RnaSequence::new("test", SEQ).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        let acc2 = AccessibilityFromStream::from_reader(
            rna,
            10,
            constraint,
            Cursor::new(buffer),
            AccessibilityStreamMode::EdValues,
            1.0,
        )
        .unwrap();

        for j in 0usize..30 {
            for i in j.saturating_sub(9)..=j {
                assert_eq!(acc.get_ed(i, j), acc2.get_ed(i, j), "mismatch at ({},{})", i, j);
            }
        }
    }
}
