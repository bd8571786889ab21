//! Number literal recognition.
//!
//! Accepts optional `#x #o #b #d` radix and `#e #i` exactness prefixes
//! (in either order), then an integer, a rational `n/d`, a decimal float,
//! one of `+inf.0 -inf.0 +nan.0 -nan.0`, a rectangular complex `a+bi`, or a
//! pure imaginary `bi`.
//! Anything else is not a number and the reader treats it as a symbol.

use super::{NanInf, Number, Part, Radix};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Exactness {
    Exact,
    Inexact,
}

/// Parses `text` as a number literal, returning `None` when it is not one.
pub fn parse_number(text: &str) -> Option<Number> {
    let mut radix = None;
    let mut exactness = None;
    let mut body = text;

    while let Some(rest) = body.strip_prefix('#') {
        let mut chars = rest.chars();
        let marker = chars.next()?.to_ascii_lowercase();
        match marker {
            'x' | 'o' | 'b' | 'd' if radix.is_none() => {
                radix = Some(match marker {
                    'x' => Radix::Hex,
                    'o' => Radix::Octal,
                    'b' => Radix::Binary,
                    _ => Radix::Decimal,
                });
            }
            'e' | 'i' if exactness.is_none() => {
                exactness = Some(if marker == 'e' {
                    Exactness::Exact
                } else {
                    Exactness::Inexact
                });
            }
            _ => return None,
        }
        body = chars.as_str();
    }

    let radix = radix.unwrap_or_default();
    let number = parse_complex(body, radix).or_else(|| {
        parse_real(body, radix).map(|real| Number::new(radix, real, None))
    })?;

    match exactness {
        Some(Exactness::Exact) => number.to_exact().ok(),
        Some(Exactness::Inexact) => Some(number.to_inexact()),
        None => Some(number),
    }
}

fn parse_complex(body: &str, radix: Radix) -> Option<Number> {
    let body = body.strip_suffix('i')?;
    let split = imaginary_start(body, radix);
    let (real_text, imag_text) = body.split_at(split);

    let imag = match imag_text {
        "+" => Part::ONE,
        "-" => Part::integer(-1),
        text if text.starts_with('+') || text.starts_with('-') => parse_real(text, radix)?,
        text if real_text.is_empty() => parse_real(text, radix)?,
        _ => return None,
    };
    let real = if real_text.is_empty() {
        Part::ZERO
    } else {
        parse_real(real_text, radix)?
    };
    Some(Number::new(radix, real, Some(imag)))
}

/// Byte offset of the sign that begins the imaginary part (0 if none).
fn imaginary_start(body: &str, radix: Radix) -> usize {
    let bytes = body.as_bytes();
    (1..bytes.len())
        .rev()
        .find(|&i| {
            let sign = bytes[i] == b'+' || bytes[i] == b'-';
            let exponent = radix == Radix::Decimal && matches!(bytes[i - 1], b'e' | b'E');
            sign && !exponent
        })
        .unwrap_or(0)
}

fn parse_real(text: &str, radix: Radix) -> Option<Part> {
    match text {
        "+inf.0" => return Some(Part::NanInf(NanInf::PositiveInf)),
        "-inf.0" => return Some(Part::NanInf(NanInf::NegativeInf)),
        "+nan.0" => return Some(Part::NanInf(NanInf::PositiveNan)),
        "-nan.0" => return Some(Part::NanInf(NanInf::NegativeNan)),
        _ => {}
    }

    if let Some((numerator, denominator)) = text.split_once('/') {
        let numerator = parse_integer(numerator, radix)?;
        let denominator = parse_unsigned(denominator, radix)?;
        return Part::rational(numerator, denominator);
    }

    if radix == Radix::Decimal && text.contains(['.', 'e', 'E']) {
        return parse_decimal(text);
    }

    match parse_integer(text, radix) {
        Some(value) => Some(Part::integer(value)),
        None if radix == Radix::Decimal && is_digits(unsigned(text), radix) => {
            text.parse::<f64>().ok().map(|value| Part::float(value, 0))
        }
        None => None,
    }
}

fn parse_decimal(text: &str) -> Option<Part> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(index) => (&text[..index], Some(&text[index + 1..])),
        None => (text, None),
    };
    let (whole, fraction) = unsigned(mantissa)
        .split_once('.')
        .unwrap_or((unsigned(mantissa), ""));
    let whole_ok = whole.is_empty() || is_digits(whole, Radix::Decimal);
    let fraction_ok = fraction.is_empty() || is_digits(fraction, Radix::Decimal);
    if !whole_ok || !fraction_ok || (whole.is_empty() && fraction.is_empty()) {
        return None;
    }
    if let Some(exponent) = exponent {
        if !is_digits(unsigned(exponent), Radix::Decimal) {
            return None;
        }
    }
    let value = text.parse::<f64>().ok()?;
    Some(Part::float(value, fraction.len() as u64))
}

fn parse_integer(text: &str, radix: Radix) -> Option<i64> {
    if !is_digits(unsigned(text), radix) {
        return None;
    }
    i64::from_str_radix(text, radix.base()).ok()
}

fn parse_unsigned(text: &str, radix: Radix) -> Option<i64> {
    if !is_digits(text, radix) {
        return None;
    }
    i64::from_str_radix(text, radix.base()).ok()
}

fn unsigned(text: &str) -> &str {
    text.strip_prefix(['+', '-']).unwrap_or(text)
}

fn is_digits(text: &str, radix: Radix) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_digit(radix.base()))
}
