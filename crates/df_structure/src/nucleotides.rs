use std::fmt;
use std::borrow::Borrow;
use std::ops::Deref;

use log::warn;
use colored::*;


#[derive(Debug)]
pub enum SequenceError {
    Plain(String),
    InvalidChar(char),
    Separator(char),
    EmptySequence,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Plain(s) => {
                write!(f, "ERROR: {}", s)
            }
            SequenceError::InvalidChar(c) => {
                write!(f, "Unsupported nucleotide: '{}'", c)
            }
            SequenceError::Separator(c) => {
                write!(f, "Unexpected strand separation character '{}'", c)
            }
            SequenceError::EmptySequence => {
                write!(f, "Empty sequence")
            }
        }
    }
}

impl std::error::Error for SequenceError {}


/// Nucleotide codes: N=0, A=1, C=2, G=3, U=4. N never pairs.
#[derive(Clone, Hash, Copy, Debug, Eq, PartialEq)]
pub enum Base { N = 0, A = 1, C = 2, G = 3, U = 4 }
pub const BCOUNT: usize = 5; // 5 Base variants for tables.

impl TryFrom<char> for Base {
    type Error = SequenceError;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'U' | 'T' => Ok(Base::U),
            'N' => Ok(Base::N),
            '&' | '+' => Err(SequenceError::Separator(c)),
            _ => Err(SequenceError::InvalidChar(c)),
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::U => 'U',
            Base::N => 'N',
        };
        write!(f, "{}", c)
    }
}


#[derive(Clone, Hash, Debug, Eq, PartialEq)]
pub struct NucleotideVec(pub Vec<Base>);

impl Deref for NucleotideVec {
    type Target = [Base];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<[Base]> for NucleotideVec {
    fn borrow(&self) -> &[Base] {
        &self.0
    }
}

impl TryFrom<&str> for NucleotideVec {
    type Error = SequenceError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut vec = Vec::with_capacity(s.len());
        for c in s.chars() {
            vec.push(Base::try_from(c)?);
        }
        Ok(NucleotideVec(vec))
    }
}

impl fmt::Display for NucleotideVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.0 {
            write!(f, "{}", base)?;
        }
        Ok(())
    }
}

impl NucleotideVec {
    pub fn from_lossy(s: &str) -> Self {
        let vec = s.chars().map(|c| {
            Base::try_from(c).unwrap_or_else(|e| {
                warn!("{} {} -> converted to 'N'", "WARNING:".red(), e);
                Base::N
            })
        }).collect();
        NucleotideVec(vec)
    }
}

const PAIR_LOOKUP: [[PairTypeRNA; BCOUNT]; BCOUNT] = {
    use Base::*;
    use PairTypeRNA::*;
    let mut table = [[NN; BCOUNT]; BCOUNT];
    table[A as usize][U as usize] = AU;
    table[U as usize][A as usize] = UA;
    table[C as usize][G as usize] = CG;
    table[G as usize][C as usize] = GC;
    table[G as usize][U as usize] = GU;
    table[U as usize][G as usize] = UG;
    table
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PairTypeRNA { AU, UA, CG, GC, GU, UG, NN }
pub const PCOUNT: usize = 7; // 7 Pair variants for tables.

impl From<(Base, Base)> for PairTypeRNA {
    fn from(pair: (Base, Base)) -> Self {
        PAIR_LOOKUP[pair.0 as usize][pair.1 as usize]
    }
}

impl fmt::Display for PairTypeRNA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PairTypeRNA::AU => "A-U",
            PairTypeRNA::UA => "U-A",
            PairTypeRNA::CG => "C-G",
            PairTypeRNA::GC => "G-C",
            PairTypeRNA::GU => "G-U",
            PairTypeRNA::UG => "U-G",
            PairTypeRNA::NN => "N-N",
        };
        write!(f, "{}", s)
    }
}

impl PairTypeRNA {
    pub fn is_ru(&self) -> bool {
       matches!(self
            , PairTypeRNA::GU | PairTypeRNA::UG
            | PairTypeRNA::AU | PairTypeRNA::UA)
    }

    pub fn is_wcf(&self) -> bool {
       matches!(self
            , PairTypeRNA::GC | PairTypeRNA::CG
            | PairTypeRNA::AU | PairTypeRNA::UA)
    }

    pub fn is_wobble(&self) -> bool {
       matches!(self, PairTypeRNA::GU | PairTypeRNA::UG)
    }

    pub fn can_pair(&self) -> bool {
       self != &PairTypeRNA::NN
    }

    pub fn invert(&self) -> PairTypeRNA {
        use PairTypeRNA::*;
        match self {
            AU => UA,
            UA => AU,
            CG => GC,
            GC => CG,
            GU => UG,
            UG => GU,
            NN => NN,
        }
    }
}


/// An immutable, named nucleotide sequence holding both its string form
/// and its encoded form. The two are always of equal length.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RnaSequence {
    id: String,
    string: String,
    codes: NucleotideVec,
}

impl RnaSequence {
    pub fn new(id: &str, sequence: &str) -> Result<Self, SequenceError> {
        if sequence.is_empty() {
            return Err(SequenceError::EmptySequence);
        }
        let codes = NucleotideVec::try_from(sequence)?;
        Ok(RnaSequence {
            id: id.to_string(),
            string: sequence.to_string(),
            codes,
        })
    }

    /// Like [`RnaSequence::new`], but unknown characters become 'N' with a
    /// warning instead of an error.
    pub fn from_lossy(id: &str, sequence: &str) -> Self {
        let codes = NucleotideVec::from_lossy(sequence);
        let string = codes.to_string();
        RnaSequence { id: id.to_string(), string, codes }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_str(&self) -> &str {
        &self.string
    }

    pub fn bases(&self) -> &[Base] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Mirror index: i -> len-1-i.
    pub fn reversed_index(&self, i: usize) -> usize {
        assert!(i < self.len(), "index {} out of range for sequence of length {}", i, self.len());
        self.len() - 1 - i
    }

    /// A new sequence reading this one 3'->5', keeping the id.
    pub fn reversed(&self) -> RnaSequence {
        let string: String = self.string.chars().rev().collect();
        let codes = NucleotideVec(self.codes.iter().rev().copied().collect());
        RnaSequence { id: self.id.clone(), string, codes }
    }
}

impl fmt::Display for RnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use Base::*;

    #[test]
    fn test_base_codes() {
        assert_eq!(N as usize, 0);
        assert_eq!(A as usize, 1);
        assert_eq!(C as usize, 2);
        assert_eq!(G as usize, 3);
        assert_eq!(U as usize, 4);
    }

    #[test]
    fn test_base_from_char() {
        assert_eq!(Base::try_from('a').unwrap(), A);
        assert_eq!(Base::try_from('T').unwrap(), U);
        assert!(matches!(Base::try_from('&'), Err(SequenceError::Separator('&'))));
        assert!(matches!(Base::try_from('x'), Err(SequenceError::InvalidChar('x'))));
    }

    #[test]
    fn test_pair_types() {
        assert_eq!(PairTypeRNA::from((A, U)), PairTypeRNA::AU);
        assert_eq!(PairTypeRNA::from((G, U)), PairTypeRNA::GU);
        assert_eq!(PairTypeRNA::from((A, G)), PairTypeRNA::NN);
        assert_eq!(PairTypeRNA::from((N, U)), PairTypeRNA::NN);
        assert!(PairTypeRNA::AU.can_pair());
        assert!(!PairTypeRNA::NN.can_pair());
        assert_eq!(PairTypeRNA::GU.invert(), PairTypeRNA::UG);
    }

    #[test]
    fn test_sequence_construction() {
        let seq = RnaSequence::new("test", "ACGU").unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.as_str(), "ACGU");
        assert_eq!(seq.bases()[3], U);
        assert_eq!(seq.as_str().len(), seq.bases().len());
        assert!(RnaSequence::new("test", "").is_err());
        assert!(RnaSequence::new("test", "ACXU").is_err());
    }

    #[test]
    fn test_sequence_lossy() {
        let seq = RnaSequence::from_lossy("test", "ACXU");
        assert_eq!(seq.as_str(), "ACNU");
    }

    #[test]
    fn test_reversed_index() {
        let seq = RnaSequence::new("test", "ACGU").unwrap();
        assert_eq!(seq.reversed_index(0), 3);
        assert_eq!(seq.reversed_index(3), 0);
        let rev = seq.reversed();
        assert_eq!(rev.as_str(), "UGCA");
        assert_eq!(rev.id(), "test");
    }
}
