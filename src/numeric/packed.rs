//! Bit-packed number storage.
//!
//! A [`PackedNumber`] is a flags word plus a variable-length word buffer.
//! Flag layout (low bit first):
//!
//! | bits  | meaning                                              |
//! |-------|------------------------------------------------------|
//! | 0     | complex                                              |
//! | 1     | inexact                                              |
//! | 2-3   | radix (binary, octal, decimal, hex)                  |
//! | 4     | real part stored zipped (denominator 1 omitted)      |
//! | 5     | imaginary part stored zipped                         |
//! | 6-13  | NaN/Inf tags: low nibble real, high nibble imaginary |
//! | 14-21 | number of stored words                               |
//!
//! Every part logically occupies two slots: numerator and denominator for
//! exact parts, float bits and display width for inexact ones. Exact
//! integers drop the denominator slot and tagged parts store nothing.

use super::{NanInf, Number, Part, Radix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberFlags(u32);

impl NumberFlags {
    const COMPLEX: u32 = 1 << 0;
    const INEXACT: u32 = 1 << 1;
    const RADIX_SHIFT: u32 = 2;
    const REAL_ZIP: u32 = 1 << 4;
    const IMAG_ZIP: u32 = 1 << 5;
    const NANINF_SHIFT: u32 = 6;
    const SIZE_SHIFT: u32 = 14;

    pub fn from_bits(bits: u32) -> Self {
        NumberFlags(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_complex(self) -> bool {
        self.0 & Self::COMPLEX != 0
    }

    pub fn is_inexact(self) -> bool {
        self.0 & Self::INEXACT != 0
    }

    pub fn radix(self) -> Radix {
        Radix::from_bits(self.0 >> Self::RADIX_SHIFT)
    }

    pub fn real_zipped(self) -> bool {
        self.0 & Self::REAL_ZIP != 0
    }

    pub fn imag_zipped(self) -> bool {
        self.0 & Self::IMAG_ZIP != 0
    }

    pub fn real_tag(self) -> Option<NanInf> {
        NanInf::from_bits(self.0 >> Self::NANINF_SHIFT)
    }

    pub fn imag_tag(self) -> Option<NanInf> {
        NanInf::from_bits(self.0 >> (Self::NANINF_SHIFT + 4))
    }

    /// Stored word count recorded in the flags.
    pub fn size(self) -> usize {
        ((self.0 >> Self::SIZE_SHIFT) & 0xff) as usize
    }

    fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        }
    }
}

/// Number of words a part occupies given its flags.
fn part_len(tag: Option<NanInf>, inexact: bool, zipped: bool) -> usize {
    match (tag, inexact, zipped) {
        (Some(_), _, _) => 0,
        (None, false, true) => 1,
        _ => 2,
    }
}

/// Word count implied by the flags alone.
pub fn encoded_len(flags: NumberFlags) -> usize {
    let real = part_len(flags.real_tag(), flags.is_inexact(), flags.real_zipped());
    let imag = if flags.is_complex() {
        part_len(flags.imag_tag(), flags.is_inexact(), flags.imag_zipped())
    } else {
        0
    };
    real + imag
}

/// A number as stored in the object graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedNumber {
    flags: NumberFlags,
    words: Box<[u64]>,
}

impl PackedNumber {
    /// Packs a number into its minimal encoding.
    pub fn zip(number: &Number) -> Self {
        let mut flags = NumberFlags::default();
        flags.set(NumberFlags::COMPLEX, number.is_complex());
        flags.set(NumberFlags::INEXACT, !number.is_exact());
        flags.0 |= number.radix().bits() << NumberFlags::RADIX_SHIFT;

        let mut words = Vec::with_capacity(4);
        let real_zip = push_part(&mut words, number.real());
        flags.set(NumberFlags::REAL_ZIP, real_zip);
        if let Part::NanInf(tag) = number.real() {
            flags.0 |= tag.bits() << NumberFlags::NANINF_SHIFT;
        }
        if let Some(imag) = number.imag() {
            let imag_zip = push_part(&mut words, imag);
            flags.set(NumberFlags::IMAG_ZIP, imag_zip);
            if let Part::NanInf(tag) = imag {
                flags.0 |= tag.bits() << (NumberFlags::NANINF_SHIFT + 4);
            }
        }
        flags.0 |= (words.len() as u32) << NumberFlags::SIZE_SHIFT;

        PackedNumber {
            flags,
            words: words.into_boxed_slice(),
        }
    }

    /// Expands back into a computable number.
    pub fn unzip(&self) -> Number {
        let slots = self.slots();
        let real = read_part(self.flags.real_tag(), self.flags.is_inexact(), slots[0], slots[1]);
        let imag = self
            .flags
            .is_complex()
            .then(|| read_part(self.flags.imag_tag(), self.flags.is_inexact(), slots[2], slots[3]));
        Number::new(self.flags.radix(), real, imag)
    }

    /// The canonical four-slot layout with zipped denominators restored.
    pub fn slots(&self) -> [u64; 4] {
        let mut slots = [0u64; 4];
        let mut words = self.words.iter().copied();
        let mut fill = |offset: usize, tag: Option<NanInf>, zipped: bool| match part_len(
            tag,
            self.flags.is_inexact(),
            zipped,
        ) {
            0 => {}
            1 => {
                slots[offset] = words.next().unwrap_or(0);
                slots[offset + 1] = 1;
            }
            _ => {
                slots[offset] = words.next().unwrap_or(0);
                slots[offset + 1] = words.next().unwrap_or(0);
            }
        };
        fill(0, self.flags.real_tag(), self.flags.real_zipped());
        if self.flags.is_complex() {
            fill(2, self.flags.imag_tag(), self.flags.imag_zipped());
        }
        slots
    }

    pub fn flags(&self) -> NumberFlags {
        self.flags
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl From<Number> for PackedNumber {
    fn from(number: Number) -> Self {
        PackedNumber::zip(&number)
    }
}

/// Appends a part's words; returns whether it was zipped.
fn push_part(words: &mut Vec<u64>, part: Part) -> bool {
    match part {
        Part::Exact {
            numerator,
            denominator: 1,
        } => {
            words.push(numerator as u64);
            true
        }
        Part::Exact {
            numerator,
            denominator,
        } => {
            words.push(numerator as u64);
            words.push(denominator);
            false
        }
        Part::Inexact { value, width } => {
            words.push(value.to_bits());
            words.push(width);
            false
        }
        Part::NanInf(_) => false,
    }
}

fn read_part(tag: Option<NanInf>, inexact: bool, first: u64, second: u64) -> Part {
    match tag {
        Some(tag) => Part::NanInf(tag),
        None if inexact => Part::Inexact {
            value: f64::from_bits(first),
            width: second,
        },
        None => Part::Exact {
            numerator: first as i64,
            denominator: second,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::parse_number;

    fn packed(text: &str) -> PackedNumber {
        PackedNumber::zip(&parse_number(text).unwrap())
    }

    #[test]
    fn exact_integer_is_zipped_to_one_word() {
        let p = packed("-12");
        assert!(p.flags().real_zipped());
        assert!(!p.flags().is_inexact());
        assert_eq!(p.words().len(), 1);
        assert_eq!(p.slots(), [(-12i64) as u64, 1, 0, 0]);
        assert_eq!(encoded_len(p.flags()), 1);
    }

    #[test]
    fn sizes_match_flags() {
        for (text, len) in [("1/3", 2), ("2.5", 2), ("1+2i", 2), ("1/2+1i", 3), ("+inf.0", 0), ("1.0+inf.0i", 2)] {
            let p = packed(text);
            assert_eq!(p.words().len(), len, "{}", text);
            assert_eq!(encoded_len(p.flags()), len, "{}", text);
            assert_eq!(p.flags().size(), len, "{}", text);
        }
    }

    #[test]
    fn tags_use_separate_nibbles() {
        let p = packed("-inf.0+nan.0i");
        assert_eq!(p.flags().real_tag(), Some(NanInf::NegativeInf));
        assert_eq!(p.flags().imag_tag(), Some(NanInf::PositiveNan));
    }

    #[test]
    fn unzip_restores_radix_and_width() {
        let n = parse_number("#x1f").unwrap();
        assert_eq!(PackedNumber::zip(&n).unzip(), n);
        assert_eq!(PackedNumber::zip(&n).flags().radix(), Radix::Hex);
        let f = parse_number("1.250").unwrap();
        assert_eq!(PackedNumber::zip(&f).unzip().to_string(), "1.250");
    }
}
