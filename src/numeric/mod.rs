//! # Numeric Tower
//!
//! Exact rationals, inexact floats, signed NaN/Infinity tags and rectangular
//! complex numbers built from them.
//!
//! ## Representation
//!
//! Active computation uses the fully expanded [`Number`] struct: a radix, a
//! real [`Part`] and an optional imaginary [`Part`]. Values stored in the
//! object graph use the bit-packed [`packed::PackedNumber`]; arithmetic always
//! unzips, computes, and zips the result again.
//!
//! ## Invariants
//!
//! - Exact parts are GCD-reduced with a positive denominator.
//! - A number is either wholly exact or wholly inexact: if any part is inexact
//!   (or tagged NaN/Inf) every magnitude part is stored as a float.
//! - A tagged part carries no magnitude, and a float part is always finite.
//! - An exact zero imaginary part is dropped, leaving a real number.

use std::cmp::Ordering;
use std::fmt;

use crate::errors::{division_by_zero, type_mismatch, SchemeError};

pub mod packed;
mod parse;

pub use packed::{NumberFlags, PackedNumber};
pub use parse::parse_number;

/// Largest decimal width that still yields a denominator representable as `i64`.
const MAX_EXACT_WIDTH: u32 = 18;

// ============================================================================
// RADIX AND NAN/INF TAGS
// ============================================================================

/// Radix a number literal was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix {
    Binary,
    Octal,
    #[default]
    Decimal,
    Hex,
}

impl Radix {
    pub const fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    pub(crate) const fn bits(self) -> u32 {
        match self {
            Radix::Binary => 0,
            Radix::Octal => 1,
            Radix::Decimal => 2,
            Radix::Hex => 3,
        }
    }

    pub(crate) const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Radix::Binary,
            1 => Radix::Octal,
            2 => Radix::Decimal,
            _ => Radix::Hex,
        }
    }

    /// Radix of a combined result: shared radix if equal, decimal otherwise.
    fn combine(self, other: Radix) -> Radix {
        if self == other {
            self
        } else {
            Radix::Decimal
        }
    }
}

/// Signed NaN / Infinity marker stored instead of a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NanInf {
    PositiveNan,
    PositiveInf,
    NegativeNan,
    NegativeInf,
}

impl NanInf {
    pub(crate) const fn bits(self) -> u32 {
        match self {
            NanInf::PositiveNan => 1 << 0,
            NanInf::PositiveInf => 1 << 1,
            NanInf::NegativeNan => 1 << 2,
            NanInf::NegativeInf => 1 << 3,
        }
    }

    pub(crate) const fn from_bits(bits: u32) -> Option<Self> {
        match bits & 0x0f {
            0b0001 => Some(NanInf::PositiveNan),
            0b0010 => Some(NanInf::PositiveInf),
            0b0100 => Some(NanInf::NegativeNan),
            0b1000 => Some(NanInf::NegativeInf),
            _ => None,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, NanInf::PositiveNan | NanInf::NegativeNan)
    }

    pub fn is_negative(self) -> bool {
        matches!(self, NanInf::NegativeNan | NanInf::NegativeInf)
    }

    pub fn negate(self) -> Self {
        match self {
            NanInf::PositiveNan => NanInf::NegativeNan,
            NanInf::PositiveInf => NanInf::NegativeInf,
            NanInf::NegativeNan => NanInf::PositiveNan,
            NanInf::NegativeInf => NanInf::PositiveInf,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            NanInf::PositiveNan => f64::NAN,
            NanInf::NegativeNan => -f64::NAN,
            NanInf::PositiveInf => f64::INFINITY,
            NanInf::NegativeInf => f64::NEG_INFINITY,
        }
    }

    fn from_f64(value: f64) -> Self {
        match (value.is_nan(), value.is_sign_negative()) {
            (true, false) => NanInf::PositiveNan,
            (true, true) => NanInf::NegativeNan,
            (false, false) => NanInf::PositiveInf,
            (false, true) => NanInf::NegativeInf,
        }
    }
}

/// The four arithmetic operations, used for dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub const fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }
}

// ============================================================================
// PARTS
// ============================================================================

/// One real component of a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Part {
    /// Reduced rational with a positive denominator.
    Exact { numerator: i64, denominator: u64 },
    /// Finite float plus the number of decimal digits it was written with.
    Inexact { value: f64, width: u64 },
    NanInf(NanInf),
}

impl Part {
    pub const ZERO: Part = Part::Exact {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: Part = Part::Exact {
        numerator: 1,
        denominator: 1,
    };

    pub fn integer(value: i64) -> Part {
        Part::Exact {
            numerator: value,
            denominator: 1,
        }
    }

    /// Builds a reduced exact rational; `None` when the denominator is zero.
    pub fn rational(numerator: i64, denominator: i64) -> Option<Part> {
        if denominator == 0 {
            return None;
        }
        Some(reduce(numerator as i128, denominator as i128))
    }

    /// Builds a float part, tagging non-finite values.
    pub fn float(value: f64, width: u64) -> Part {
        if value.is_finite() {
            Part::Inexact { value, width }
        } else {
            Part::NanInf(NanInf::from_f64(value))
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Part::Exact { .. })
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Part::Exact { numerator, .. } => numerator == 0,
            Part::Inexact { value, .. } => value == 0.0,
            Part::NanInf(_) => false,
        }
    }

    pub fn is_negative(&self) -> bool {
        match *self {
            Part::Exact { numerator, .. } => numerator < 0,
            Part::Inexact { value, .. } => value < 0.0,
            Part::NanInf(tag) => tag.is_negative(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Part::Exact {
                numerator,
                denominator,
            } => numerator as f64 / denominator as f64,
            Part::Inexact { value, .. } => value,
            Part::NanInf(tag) => tag.to_f64(),
        }
    }

    /// Exact parts become floats of width 0; other parts are unchanged.
    pub fn to_inexact(self) -> Part {
        match self {
            Part::Exact { .. } => Part::float(self.to_f64(), 0),
            other => other,
        }
    }

    /// Converts a float to `n / 10^w` and reduces it. `None` for tags and
    /// for values outside the exact range.
    pub fn to_exact(self) -> Option<Part> {
        match self {
            Part::Exact { .. } => Some(self),
            Part::NanInf(_) => None,
            Part::Inexact { value, width } => {
                let width = (width as u32).max(fraction_digits(value)).min(MAX_EXACT_WIDTH);
                let scale = 10i128.pow(width);
                let scaled = (value * scale as f64).round();
                if scaled.abs() >= i128::MAX as f64 {
                    return None;
                }
                Some(reduce(scaled as i128, scale)).filter(Part::is_exact)
            }
        }
    }

    pub fn negate(self) -> Part {
        match self {
            Part::Exact {
                numerator,
                denominator,
            } => match numerator.checked_neg() {
                Some(numerator) => Part::Exact {
                    numerator,
                    denominator,
                },
                None => reduce(-(numerator as i128), denominator as i128),
            },
            Part::Inexact { value, width } => Part::Inexact {
                value: -value,
                width,
            },
            Part::NanInf(tag) => Part::NanInf(tag.negate()),
        }
    }

    /// Applies one arithmetic step with exactness promotion.
    pub fn combine(self, op: Op, other: Part) -> Result<Part, SchemeError> {
        if op == Op::Div && other.is_zero() {
            return Err(division_by_zero(op.symbol()));
        }
        match (self, other) {
            (Part::NanInf(_), _) | (_, Part::NanInf(_)) => Ok(combine_tags(op, self, other)),
            (
                Part::Exact {
                    numerator: a,
                    denominator: b,
                },
                Part::Exact {
                    numerator: c,
                    denominator: d,
                },
            ) => Ok(combine_exact(op, (a, b), (c, d))),
            _ => Ok(combine_inexact(op, self.to_inexact(), other.to_inexact())),
        }
    }

    fn width(&self) -> u64 {
        match *self {
            Part::Inexact { width, .. } => width,
            _ => 0,
        }
    }
}

/// Euclidean greatest common divisor.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduces `numerator / denominator` (denominator non-zero). Results that do
/// not fit the exact representation are promoted to inexact.
fn reduce(numerator: i128, denominator: i128) -> Part {
    debug_assert!(denominator != 0);
    let (mut n, mut d) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    if n == 0 {
        return Part::ZERO;
    }
    let g = gcd(n.unsigned_abs(), d as u128) as i128;
    n /= g;
    d /= g;
    match (i64::try_from(n), u64::try_from(d)) {
        (Ok(numerator), Ok(denominator)) => Part::Exact {
            numerator,
            denominator,
        },
        _ => Part::float(n as f64 / d as f64, 0),
    }
}

fn combine_exact(op: Op, (a, b): (i64, u64), (c, d): (i64, u64)) -> Part {
    let (a, b, c, d) = (a as i128, b as i128, c as i128, d as i128);
    if matches!(op, Op::Add | Op::Sub) {
        if a == 0 {
            return reduce(if op == Op::Sub { -c } else { c }, d);
        }
        if c == 0 {
            return reduce(a, b);
        }
    }
    let checked = match op {
        Op::Add => a
            .checked_mul(d)
            .zip(c.checked_mul(b))
            .and_then(|(x, y)| x.checked_add(y))
            .zip(b.checked_mul(d)),
        Op::Sub => a
            .checked_mul(d)
            .zip(c.checked_mul(b))
            .and_then(|(x, y)| x.checked_sub(y))
            .zip(b.checked_mul(d)),
        Op::Mul => a.checked_mul(c).zip(b.checked_mul(d)),
        Op::Div => a.checked_mul(d).zip(b.checked_mul(c)),
    };
    match checked {
        Some((n, m)) => reduce(n, m),
        None => {
            let x = a as f64 / b as f64;
            let y = c as f64 / d as f64;
            combine_inexact(op, Part::float(x, 0), Part::float(y, 0))
        }
    }
}

fn combine_inexact(op: Op, lhs: Part, rhs: Part) -> Part {
    let width = lhs.width().max(rhs.width());
    let (x, y) = (lhs.to_f64(), rhs.to_f64());
    let value = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div => x / y,
    };
    Part::float(value, width)
}

/// At least one side is tagged. Two tags collapse to `+nan.0`.
fn combine_tags(op: Op, lhs: Part, rhs: Part) -> Part {
    match (lhs, rhs) {
        (Part::NanInf(_), Part::NanInf(_)) => Part::NanInf(NanInf::PositiveNan),
        (Part::NanInf(tag), other) => match op {
            Op::Add | Op::Sub => Part::NanInf(tag),
            Op::Mul if other.is_zero() => Part::NanInf(NanInf::PositiveNan),
            Op::Mul | Op::Div if other.is_negative() => Part::NanInf(tag.negate()),
            Op::Mul | Op::Div => Part::NanInf(tag),
        },
        (other, Part::NanInf(tag)) => match op {
            Op::Add => Part::NanInf(tag),
            Op::Sub => Part::NanInf(tag.negate()),
            Op::Mul if other.is_zero() => Part::NanInf(NanInf::PositiveNan),
            Op::Mul if other.is_negative() => Part::NanInf(tag.negate()),
            Op::Mul => Part::NanInf(tag),
            Op::Div if tag.is_nan() => Part::NanInf(tag),
            Op::Div => Part::Inexact {
                value: 0.0,
                width: other.width(),
            },
        },
        _ => unreachable!("combine_tags requires a tagged operand"),
    }
}

/// Number of fractional digits in the shortest round-trip rendering of `value`.
fn fraction_digits(value: f64) -> u32 {
    let text = format!("{}", value);
    text.split_once('.')
        .map(|(_, fraction)| fraction.len() as u32)
        .unwrap_or(0)
}

// ============================================================================
// NUMBERS
// ============================================================================

/// Fully expanded number used for computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number {
    radix: Radix,
    real: Part,
    imag: Option<Part>,
}

impl Number {
    pub fn integer(value: i64) -> Number {
        Number::from_part(Part::integer(value))
    }

    pub fn rational(numerator: i64, denominator: i64) -> Option<Number> {
        Part::rational(numerator, denominator).map(Number::from_part)
    }

    pub fn float(value: f64) -> Number {
        Number::from_part(Part::float(value, 0))
    }

    pub fn from_part(real: Part) -> Number {
        Number::new(Radix::Decimal, real, None)
    }

    pub fn complex(real: Part, imag: Part) -> Number {
        Number::new(Radix::Decimal, real, Some(imag))
    }

    /// Builds a number and restores the invariants listed in the module docs.
    pub fn new(radix: Radix, real: Part, imag: Option<Part>) -> Number {
        let imag = match imag {
            Some(part) if part == Part::ZERO => None,
            other => other,
        };
        let inexact = !real.is_exact() || imag.is_some_and(|part| !part.is_exact());
        if inexact {
            Number {
                radix,
                real: real.to_inexact(),
                imag: imag.map(Part::to_inexact),
            }
        } else {
            Number { radix, real, imag }
        }
    }

    pub fn with_radix(self, radix: Radix) -> Number {
        Number { radix, ..self }
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    pub fn real(&self) -> Part {
        self.real
    }

    pub fn imag(&self) -> Option<Part> {
        self.imag
    }

    pub fn is_complex(&self) -> bool {
        self.imag.is_some()
    }

    pub fn is_exact(&self) -> bool {
        self.real.is_exact() && self.imag.map_or(true, |part| part.is_exact())
    }

    pub fn is_zero(&self) -> bool {
        self.real.is_zero() && self.imag.map_or(true, |part| part.is_zero())
    }

    /// Returns the integer value for exact integers.
    pub fn as_integer(&self) -> Option<i64> {
        match (self.real, self.imag) {
            (
                Part::Exact {
                    numerator,
                    denominator: 1,
                },
                None,
            ) => Some(numerator),
            _ => None,
        }
    }

    pub fn to_inexact(self) -> Number {
        Number::new(
            self.radix,
            self.real.to_inexact(),
            self.imag.map(Part::to_inexact),
        )
    }

    pub fn to_exact(self) -> Result<Number, SchemeError> {
        let unrepresentable =
            || type_mismatch("inexact->exact", 0, &self.to_string(), "exactly representable number");
        let real = self.real.to_exact().ok_or_else(unrepresentable)?;
        let imag = match self.imag {
            Some(part) => Some(part.to_exact().ok_or_else(unrepresentable)?),
            None => None,
        };
        Ok(Number::new(self.radix, real, imag))
    }

    pub fn negate(self) -> Number {
        Number::new(self.radix, self.real.negate(), self.imag.map(Part::negate))
    }

    /// One binary arithmetic step.
    pub fn combine(self, op: Op, other: Number) -> Result<Number, SchemeError> {
        let radix = self.radix.combine(other.radix);
        let (a, b) = (self.real, self.imag.unwrap_or(Part::ZERO));
        let (c, d) = (other.real, other.imag.unwrap_or(Part::ZERO));
        let complex = self.is_complex() || other.is_complex();

        if !complex {
            return Ok(Number::new(radix, a.combine(op, c)?, None));
        }

        match op {
            Op::Add | Op::Sub => Ok(Number::new(radix, a.combine(op, c)?, Some(b.combine(op, d)?))),
            Op::Mul => {
                let real = a.combine(Op::Mul, c)?.combine(Op::Sub, b.combine(Op::Mul, d)?)?;
                let imag = a.combine(Op::Mul, d)?.combine(Op::Add, b.combine(Op::Mul, c)?)?;
                Ok(Number::new(radix, real, Some(imag)))
            }
            Op::Div => {
                if other.is_zero() {
                    return Err(division_by_zero(op.symbol()));
                }
                if other.imag.is_none() {
                    return Ok(Number::new(radix, a.combine(Op::Div, c)?, Some(b.combine(Op::Div, c)?)));
                }
                let denominator = c.combine(Op::Mul, c)?.combine(Op::Add, d.combine(Op::Mul, d)?)?;
                let real = a.combine(Op::Mul, c)?.combine(Op::Add, b.combine(Op::Mul, d)?)?;
                let imag = b.combine(Op::Mul, c)?.combine(Op::Sub, a.combine(Op::Mul, d)?)?;
                Ok(Number::new(
                    radix,
                    real.combine(Op::Div, denominator)?,
                    Some(imag.combine(Op::Div, denominator)?),
                ))
            }
        }
    }

    /// Numeric equality (`=`); complex numbers compare part-wise.
    pub fn num_eq(&self, other: &Number) -> bool {
        let imag_eq = match (self.imag, other.imag) {
            (None, None) => true,
            (x, y) => compare_parts(&x.unwrap_or(Part::ZERO), &y.unwrap_or(Part::ZERO))
                == Some(Ordering::Equal),
        };
        imag_eq && compare_parts(&self.real, &other.real) == Some(Ordering::Equal)
    }

    /// Ordering of real numbers; `None` for complex operands or NaN.
    pub fn compare(&self, other: &Number) -> Option<Ordering> {
        if self.is_complex() || other.is_complex() {
            return None;
        }
        compare_parts(&self.real, &other.real)
    }

    /// `eqv?`-style equality: same exactness and same value.
    pub fn eqv(&self, other: &Number) -> bool {
        self.is_exact() == other.is_exact() && self.num_eq(other)
    }
}

fn compare_parts(lhs: &Part, rhs: &Part) -> Option<Ordering> {
    match (*lhs, *rhs) {
        (
            Part::Exact {
                numerator: a,
                denominator: b,
            },
            Part::Exact {
                numerator: c,
                denominator: d,
            },
        ) => Some((a as i128 * d as i128).cmp(&(c as i128 * b as i128))),
        _ => lhs.to_f64().partial_cmp(&rhs.to_f64()),
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Part::Exact {
                numerator,
                denominator: 1,
            } => write!(f, "{}", numerator),
            Part::Exact {
                numerator,
                denominator,
            } => write!(f, "{}/{}", numerator, denominator),
            Part::Inexact { value, width } => {
                let text = format!("{}", value);
                let (whole, fraction) = text.split_once('.').unwrap_or((&text, ""));
                let digits = (width as usize).max(fraction.len()).max(1);
                write!(f, "{}.{:0<digits$}", whole, fraction, digits = digits)
            }
            Part::NanInf(NanInf::PositiveNan) => write!(f, "+nan.0"),
            Part::NanInf(NanInf::NegativeNan) => write!(f, "-nan.0"),
            Part::NanInf(NanInf::PositiveInf) => write!(f, "+inf.0"),
            Part::NanInf(NanInf::NegativeInf) => write!(f, "-inf.0"),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.real)?;
        let Some(imag) = self.imag else {
            return Ok(());
        };
        let text = imag.to_string();
        if text.starts_with('-') || text.starts_with('+') {
            write!(f, "{}i", text)
        } else {
            write!(f, "+{}i", text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(n: i64, d: i64) -> Number {
        Number::rational(n, d).unwrap()
    }

    #[test]
    fn rationals_are_reduced_with_positive_denominator() {
        assert_eq!(
            Part::rational(6, -4),
            Some(Part::Exact {
                numerator: -3,
                denominator: 2
            })
        );
        assert_eq!(Part::rational(1, 0), None);
    }

    #[test]
    fn exact_addition_cross_multiplies() {
        let sum = exact(1, 2).combine(Op::Add, exact(1, 3)).unwrap();
        assert_eq!(sum, exact(5, 6));
        assert_eq!(sum.to_string(), "5/6");
    }

    #[test]
    fn zero_operand_short_circuits() {
        assert_eq!(Number::integer(0).combine(Op::Add, exact(2, 4)).unwrap(), exact(1, 2));
        assert_eq!(Number::integer(0).combine(Op::Sub, exact(1, 2)).unwrap(), exact(-1, 2));
    }

    #[test]
    fn inexact_operand_promotes_and_keeps_width() {
        let a = Number::from_part(Part::Inexact {
            value: 1.25,
            width: 2,
        });
        let result = a.combine(Op::Add, Number::integer(2)).unwrap();
        assert!(!result.is_exact());
        assert_eq!(result.to_string(), "3.25");
        let padded = Number::from_part(Part::Inexact { value: 1.5, width: 3 });
        assert_eq!(padded.to_string(), "1.500");
    }

    #[test]
    fn division_by_exact_or_float_zero_fails() {
        assert!(Number::integer(1).combine(Op::Div, Number::integer(0)).is_err());
        assert!(Number::integer(1).combine(Op::Div, Number::float(0.0)).is_err());
    }

    #[test]
    fn overflow_promotes_to_inexact() {
        let big = Number::integer(i64::MAX);
        let result = big.combine(Op::Mul, big).unwrap();
        assert!(!result.is_exact());
    }

    #[test]
    fn tags_propagate_and_collapse() {
        let inf = Number::from_part(Part::NanInf(NanInf::PositiveInf));
        let ninf = Number::from_part(Part::NanInf(NanInf::NegativeInf));
        assert_eq!(inf.combine(Op::Add, Number::integer(1)).unwrap().to_string(), "+inf.0");
        assert_eq!(Number::integer(1).combine(Op::Sub, inf).unwrap().to_string(), "-inf.0");
        assert_eq!(inf.combine(Op::Add, ninf).unwrap().to_string(), "+nan.0");
        assert_eq!(Number::integer(1).combine(Op::Div, inf).unwrap().to_string(), "0.0");
    }

    #[test]
    fn complex_arithmetic() {
        let i = Number::complex(Part::ZERO, Part::ONE);
        let minus_one = i.combine(Op::Mul, i).unwrap();
        assert_eq!(minus_one, Number::integer(-1));
        assert!(!minus_one.is_complex());

        let z = Number::complex(Part::integer(1), Part::integer(2));
        assert_eq!(z.combine(Op::Add, Number::integer(1)).unwrap().to_string(), "2+2i");
        assert_eq!(z.combine(Op::Div, z).unwrap(), Number::integer(1));
    }

    #[test]
    fn inexact_to_exact_uses_width() {
        let quarter = Number::from_part(Part::Inexact {
            value: 0.25,
            width: 2,
        });
        assert_eq!(quarter.to_exact().unwrap(), exact(1, 4));
        let nan = Number::from_part(Part::NanInf(NanInf::PositiveNan));
        assert!(nan.to_exact().is_err());
        assert!(Number::float(1e30).to_exact().is_err());
        assert_eq!(Number::float(-1e18).to_exact().unwrap(), Number::integer(-1_000_000_000_000_000_000));
    }

    #[test]
    fn comparison() {
        assert_eq!(exact(1, 3).compare(&exact(1, 2)), Some(Ordering::Less));
        assert_eq!(Number::float(2.0).compare(&Number::integer(2)), Some(Ordering::Equal));
        assert!(Number::integer(2).num_eq(&Number::float(2.0)));
        assert!(!Number::integer(2).eqv(&Number::float(2.0)));
    }
}
