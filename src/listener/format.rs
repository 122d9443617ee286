//! Bounded rendering of engine log messages.
//!
//! The engine logs with printf-style templates. Messages are rendered into at most
//! [`MAX_LOG_MESSAGE_LEN`]` - 1` bytes of text, the same bound a 1024-byte `vsnprintf`
//! buffer gives; anything longer is cut at a character boundary.

use std::fmt::{self, Write};

/// Size of the log message buffer, including the terminator the engine would write.
pub const MAX_LOG_MESSAGE_LEN: usize = 1024;

/// One already-typed argument for a log template.
///
/// Integers keep their source width so unsigned and hex conversions of negative values
/// wrap the way a C `int` or `long long` would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogArg<'a> {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Float(f64),
    Char(char),
    Str(&'a str),
}

macro_rules! log_arg_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for LogArg<'_> {
                fn from(value: $source) -> Self {
                    LogArg::$variant(value as $target)
                }
            }
        )+
    };
}

log_arg_from!(I32, i32, i8, i16, i32);
log_arg_from!(I64, i64, i64, isize);
log_arg_from!(U32, u32, u8, u16, u32);
log_arg_from!(U64, u64, u64, usize);
log_arg_from!(Float, f64, f32, f64);

impl From<char> for LogArg<'_> {
    fn from(value: char) -> Self {
        LogArg::Char(value)
    }
}

impl<'a> From<&'a str> for LogArg<'a> {
    fn from(value: &'a str) -> Self {
        LogArg::Str(value)
    }
}

impl LogArg<'_> {
    fn as_i64(&self) -> i64 {
        match *self {
            LogArg::I32(v) => i64::from(v),
            LogArg::I64(v) => v,
            LogArg::U32(v) => i64::from(v as i32),
            LogArg::U64(v) => v as i64,
            LogArg::Float(v) => v as i64,
            LogArg::Char(v) => i64::from(u32::from(v)),
            LogArg::Str(_) => 0,
        }
    }

    /// Unsigned reinterpretation at the argument's own width.
    fn as_u64(&self) -> u64 {
        match *self {
            LogArg::I32(v) => u64::from(v as u32),
            LogArg::I64(v) => v as u64,
            LogArg::U32(v) => u64::from(v),
            LogArg::U64(v) => v,
            LogArg::Float(v) => v as u64,
            LogArg::Char(v) => u64::from(u32::from(v)),
            LogArg::Str(_) => 0,
        }
    }

    fn as_f64(&self) -> f64 {
        match *self {
            LogArg::I32(v) => f64::from(v),
            LogArg::I64(v) => v as f64,
            LogArg::U32(v) => f64::from(v),
            LogArg::U64(v) => v as f64,
            LogArg::Float(v) => v,
            LogArg::Char(v) => f64::from(u32::from(v)),
            LogArg::Str(_) => 0.0,
        }
    }

    fn as_char(&self) -> char {
        match *self {
            LogArg::Char(c) => c,
            LogArg::Str(s) => s.chars().next().unwrap_or('?'),
            LogArg::Float(_) => '?',
            _ => u32::try_from(self.as_u64()).ok().and_then(char::from_u32).unwrap_or('?'),
        }
    }

    fn as_text(&self) -> String {
        match *self {
            LogArg::Str(s) => s.to_string(),
            LogArg::I32(v) => v.to_string(),
            LogArg::I64(v) => v.to_string(),
            LogArg::U32(v) => v.to_string(),
            LogArg::U64(v) => v.to_string(),
            LogArg::Float(v) => v.to_string(),
            LogArg::Char(c) => c.to_string(),
        }
    }
}

/// A [`fmt::Write`] sink that silently stops accepting text at a byte limit.
#[derive(Debug)]
pub struct BoundedMessage {
    text: String,
    limit: usize,
    truncated: bool,
}

impl BoundedMessage {
    /// Sink sized for engine log messages.
    pub fn new() -> Self {
        Self::with_limit(MAX_LOG_MESSAGE_LEN - 1)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { text: String::with_capacity(limit.min(MAX_LOG_MESSAGE_LEN)), limit, truncated: false }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl Default for BoundedMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for BoundedMessage {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.limit - self.text.len();
        if s.len() <= room {
            self.text.push_str(s);
        } else {
            let mut cut = room;
            while !s.is_char_boundary(cut) {
                cut -= 1;
            }
            self.text.push_str(&s[..cut]);
            self.truncated = true;
        }
        // Never report an error: truncation is expected
        Ok(())
    }
}

/// Render Rust format arguments into a bounded message.
pub fn render_args(args: fmt::Arguments<'_>) -> String {
    let mut message = BoundedMessage::new();
    let _ = message.write_fmt(args);
    message.into_string()
}

/// Render a printf-style template with typed arguments into a bounded message.
///
/// Supports the `d i u x X o c s f F e E g G p %` conversions with `-`, `0`, `+`, space
/// and `#` flags, width and precision (either of which may be `*`, taken from the next
/// argument), and the usual length modifiers (ignored because arguments are already
/// typed). Arguments are consumed in order; a missing argument leaves its conversion out
/// of the output and extra arguments are ignored.
pub fn render_template(template: &str, args: &[LogArg<'_>]) -> String {
    let mut message = BoundedMessage::new();
    let mut args = args.iter();
    let mut chars = template.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if message.is_truncated() {
            break;
        }
        if c != '%' {
            let _ = message.write_char(c);
            continue;
        }

        let mut directive = Directive::default();

        while let Some(&(_, flag)) = chars.peek() {
            match flag {
                '-' => directive.left = true,
                '0' => directive.zero = true,
                '+' => directive.plus = true,
                ' ' => directive.space = true,
                '#' => directive.alternate = true,
                _ => break,
            }
            chars.next();
        }

        if let Some(&(_, '*')) = chars.peek() {
            chars.next();
            let width = args.next().map_or(0, LogArg::as_i64);
            // A negative width argument means left alignment
            if width < 0 {
                directive.left = true;
            }
            directive.width = clamp_len(width.unsigned_abs());
        } else {
            directive.width = clamp_len(parse_digits(&mut chars));
        }

        if let Some(&(_, '.')) = chars.peek() {
            chars.next();
            directive.precision = if let Some(&(_, '*')) = chars.peek() {
                chars.next();
                let precision = args.next().map_or(0, LogArg::as_i64);
                u64::try_from(precision).ok().map(clamp_len)
            } else {
                Some(clamp_len(parse_digits(&mut chars)))
            };
        }

        while let Some(&(_, modifier)) = chars.peek() {
            if matches!(modifier, 'h' | 'l' | 'L' | 'q' | 'j' | 'z' | 't') {
                chars.next();
            } else {
                break;
            }
        }

        let Some((end, conversion)) = chars.next() else {
            // Dangling conversion at the end of the template
            let _ = message.write_str(&template[start..]);
            break;
        };

        if conversion == '%' {
            let _ = message.write_char('%');
            continue;
        }

        if !"diuxXocsfFeEgGp".contains(conversion) {
            let _ = message.write_str(&template[start..end + conversion.len_utf8()]);
            continue;
        }

        if let Some(arg) = args.next() {
            let _ = directive.write(&mut message, conversion, arg);
        }
    }

    message.into_string()
}

fn parse_digits(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> u64 {
    let mut value = 0u64;
    while let Some(&(_, digit)) = chars.peek() {
        let Some(d) = digit.to_digit(10) else { break };
        value = value.saturating_mul(10).saturating_add(u64::from(d));
        chars.next();
    }
    value
}

fn clamp_len(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX).min(MAX_LOG_MESSAGE_LEN)
}

#[derive(Debug, Default)]
struct Directive {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

impl Directive {
    fn write(&self, out: &mut BoundedMessage, conversion: char, arg: &LogArg<'_>) -> fmt::Result {
        let integer = matches!(conversion, 'd' | 'i' | 'u' | 'x' | 'X' | 'o');
        let mut zero_pad = self.zero && !(integer && self.precision.is_some());

        let (sign, body) = match conversion {
            'd' | 'i' => {
                let value = arg.as_i64();
                (self.sign(value < 0), self.digits(value.unsigned_abs().to_string()))
            }
            'u' => (String::new(), self.digits(arg.as_u64().to_string())),
            'x' | 'X' => {
                let value = arg.as_u64();
                let digits = match conversion {
                    'x' => format!("{value:x}"),
                    _ => format!("{value:X}"),
                };
                let prefix = match (self.alternate && value != 0, conversion) {
                    (false, _) => "",
                    (true, 'x') => "0x",
                    (true, _) => "0X",
                };
                (prefix.to_string(), self.digits(digits))
            }
            'o' => {
                let body = self.digits(format!("{:o}", arg.as_u64()));
                if self.alternate && !body.starts_with('0') {
                    (String::new(), format!("0{body}"))
                } else {
                    (String::new(), body)
                }
            }
            'p' => ("0x".to_string(), format!("{:x}", arg.as_u64())),
            'c' => {
                zero_pad = false;
                (String::new(), arg.as_char().to_string())
            }
            's' => {
                zero_pad = false;
                let text = arg.as_text();
                let text = match self.precision {
                    Some(max) => text.chars().take(max).collect(),
                    None => text,
                };
                (String::new(), text)
            }
            'e' | 'E' | 'g' | 'G' | 'f' | 'F' => {
                let value = arg.as_f64();
                let upper = conversion.is_ascii_uppercase();
                let sign = self.sign(value.is_sign_negative());
                let magnitude = value.abs();

                let body = if !magnitude.is_finite() {
                    zero_pad = false;
                    let text = if magnitude.is_nan() { "nan" } else { "inf" };
                    if upper { text.to_ascii_uppercase() } else { text.to_string() }
                } else {
                    let precision = self.precision.unwrap_or(6);
                    match conversion {
                        'e' | 'E' => exponent_form(magnitude, precision, upper),
                        'g' | 'G' => general_form(magnitude, precision, upper, self.alternate),
                        _ => format!("{magnitude:.precision$}"),
                    }
                };
                (sign, body)
            }
            _ => (String::new(), String::new()),
        };

        let len = sign.chars().count() + body.chars().count();
        let pad = self.width.saturating_sub(len);

        if self.left {
            out.write_str(&sign)?;
            out.write_str(&body)?;
            write_repeated(out, ' ', pad)
        } else if zero_pad {
            out.write_str(&sign)?;
            write_repeated(out, '0', pad)?;
            out.write_str(&body)
        } else {
            write_repeated(out, ' ', pad)?;
            out.write_str(&sign)?;
            out.write_str(&body)
        }
    }

    fn sign(&self, negative: bool) -> String {
        if negative {
            "-".to_string()
        } else if self.plus {
            "+".to_string()
        } else if self.space {
            " ".to_string()
        } else {
            String::new()
        }
    }

    /// Apply integer precision as a minimum digit count. Zero with precision zero is empty.
    fn digits(&self, digits: String) -> String {
        match self.precision {
            Some(0) if digits == "0" => String::new(),
            Some(min) if digits.len() < min => format!("{digits:0>min$}"),
            _ => digits,
        }
    }
}

/// `d.ddde±dd` with at least two exponent digits.
fn exponent_form(value: f64, precision: usize, upper: bool) -> String {
    let rendered = format!("{value:.precision$e}");
    let (mantissa, exponent) = split_exponent(&rendered);
    let marker = if upper { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{marker}{sign}{:02}", exponent.unsigned_abs())
}

fn split_exponent(rendered: &str) -> (&str, i32) {
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (rendered, 0),
    }
}

/// `%g`: fixed or exponent form depending on the decimal exponent, trailing zeros removed
/// unless `#` is set.
fn general_form(value: f64, precision: usize, upper: bool, alternate: bool) -> String {
    let significant = precision.max(1);
    let rounded = format!("{value:.prec$e}", prec = significant - 1);
    let (_, exponent) = split_exponent(&rounded);

    if exponent < -4 || exponent >= significant as i32 {
        let rendered = exponent_form(value, significant - 1, upper);
        if alternate {
            return rendered;
        }
        let marker = if upper { 'E' } else { 'e' };
        match rendered.split_once(marker) {
            Some((mantissa, rest)) => format!("{}{marker}{rest}", strip_fraction_zeros(mantissa)),
            None => rendered,
        }
    } else {
        let decimals = (significant as i32 - 1 - exponent).max(0) as usize;
        let rendered = format!("{value:.decimals$}");
        if alternate { rendered } else { strip_fraction_zeros(&rendered).to_string() }
    }
}

fn strip_fraction_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn write_repeated(out: &mut BoundedMessage, c: char, count: usize) -> fmt::Result {
    for _ in 0..count {
        if out.is_truncated() {
            break;
        }
        out.write_char(c)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_common_conversions() {
        let rendered = render_template(
            "Received %d packets (%u lost) from %s: 0x%08x %c %.2f%%",
            &[
                LogArg::from(-12i32),
                LogArg::from(3u32),
                LogArg::from("host"),
                LogArg::from(0xBEEFu32),
                LogArg::from('!'),
                LogArg::from(99.5f64),
            ],
        );
        assert_eq!(rendered, "Received -12 packets (3 lost) from host: 0x0000beef ! 99.50%");
    }

    #[test]
    fn width_and_alignment() {
        assert_eq!(render_template("[%5d]", &[LogArg::from(42)]), "[   42]");
        assert_eq!(render_template("[%-5d]", &[LogArg::from(42)]), "[42   ]");
        assert_eq!(render_template("[%05d]", &[LogArg::from(-42)]), "[-0042]");
        assert_eq!(render_template("[%+d]", &[LogArg::from(7)]), "[+7]");
        assert_eq!(render_template("[%#x]", &[LogArg::from(255u32)]), "[0xff]");
        assert_eq!(render_template("[%.3s]", &[LogArg::Str("abcdef")]), "[abc]");
    }

    #[test]
    fn length_modifiers_are_accepted() {
        assert_eq!(
            render_template("%ld %llu %zu %hd", &[
                LogArg::from(-1i64),
                LogArg::from(2u64),
                LogArg::from(3usize),
                LogArg::from(4i16)
            ]),
            "-1 2 3 4"
        );
    }

    #[test]
    fn unsigned_conversions_wrap_at_argument_width() {
        assert_eq!(render_template("%x", &[LogArg::from(-1i32)]), "ffffffff");
        assert_eq!(render_template("%X", &[LogArg::from(-2i32)]), "FFFFFFFE");
        assert_eq!(render_template("%u", &[LogArg::from(-1i32)]), "4294967295");
        assert_eq!(render_template("%o", &[LogArg::from(-1i8)]), "37777777777");
        assert_eq!(render_template("%llx", &[LogArg::from(-1i64)]), "ffffffffffffffff");
        assert_eq!(render_template("%d", &[LogArg::from(u32::MAX)]), "-1");
        assert_eq!(render_template("%lld", &[LogArg::from(u64::MAX)]), "-1");
    }

    #[test]
    fn integer_precision_is_minimum_digits() {
        assert_eq!(render_template("%.3d", &[LogArg::from(7)]), "007");
        assert_eq!(render_template("%.3d", &[LogArg::from(-7)]), "-007");
        assert_eq!(render_template("[%.0d]", &[LogArg::from(0)]), "[]");
        assert_eq!(render_template("[%05.3d]", &[LogArg::from(7)]), "[  007]");
        assert_eq!(render_template("%.4x", &[LogArg::from(0xABu32)]), "00ab");
        assert_eq!(render_template("%#o %#o", &[LogArg::from(8u32), LogArg::from(0u32)]), "010 0");
        assert_eq!(render_template("%#x", &[LogArg::from(0u32)]), "0");
    }

    #[test]
    fn exponent_form_has_signed_two_digit_exponent() {
        assert_eq!(render_template("%e", &[LogArg::from(150.0)]), "1.500000e+02");
        assert_eq!(render_template("%e", &[LogArg::from(0.0)]), "0.000000e+00");
        assert_eq!(render_template("%.2e", &[LogArg::from(-1234.5)]), "-1.23e+03");
        assert_eq!(render_template("%E", &[LogArg::from(0.00012)]), "1.200000E-04");
        assert_eq!(render_template("%.1e", &[LogArg::from(1e100)]), "1.0e+100");
        assert_eq!(render_template("[%12.3e]", &[LogArg::from(5.0)]), "[   5.000e+00]");
    }

    #[test]
    fn general_form_picks_shortest_representation() {
        assert_eq!(render_template("%g", &[LogArg::from(0.1 + 0.2)]), "0.3");
        assert_eq!(render_template("%g", &[LogArg::from(100000.0)]), "100000");
        assert_eq!(render_template("%g", &[LogArg::from(1000000.0)]), "1e+06");
        assert_eq!(render_template("%g", &[LogArg::from(123456789.0)]), "1.23457e+08");
        assert_eq!(render_template("%g", &[LogArg::from(0.0001)]), "0.0001");
        assert_eq!(render_template("%g", &[LogArg::from(0.00001)]), "1e-05");
        assert_eq!(render_template("%g", &[LogArg::from(0.0)]), "0");
        assert_eq!(render_template("%G", &[LogArg::from(1e20)]), "1E+20");
        assert_eq!(render_template("%.3g", &[LogArg::from(3.14159)]), "3.14");
        assert_eq!(render_template("%#g", &[LogArg::from(1.5)]), "1.50000");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(render_template("%f", &[LogArg::from(f64::INFINITY)]), "inf");
        assert_eq!(render_template("%F", &[LogArg::from(f64::NEG_INFINITY)]), "-INF");
        assert_eq!(render_template("[%05f]", &[LogArg::from(f64::NAN)]), "[  nan]");
    }

    #[test]
    fn star_width_and_precision_consume_arguments() {
        assert_eq!(render_template("%.*s", &[LogArg::from(3), LogArg::from("abcdef")]), "abc");
        assert_eq!(render_template("[%*d]", &[LogArg::from(5), LogArg::from(42)]), "[   42]");
        assert_eq!(render_template("[%*d]", &[LogArg::from(-4), LogArg::from(7)]), "[7   ]");
        assert_eq!(
            render_template("[%*.*f] %s", &[
                LogArg::from(8),
                LogArg::from(2),
                LogArg::from(3.14159),
                LogArg::from("done")
            ]),
            "[    3.14] done"
        );
        assert_eq!(render_template("%.*d", &[LogArg::from(-1), LogArg::from(5)]), "5");
    }

    #[test]
    fn missing_and_extra_arguments() {
        assert_eq!(render_template("a=%d b=%d", &[LogArg::from(1)]), "a=1 b=");
        assert_eq!(render_template("plain", &[LogArg::from(1)]), "plain");
        assert_eq!(render_template("trailing %", &[]), "trailing %");
        assert_eq!(render_template("odd %y here", &[]), "odd %y here");
    }

    #[test]
    fn long_messages_are_truncated_to_bound() {
        let long = "x".repeat(4000);
        let rendered = render_template("%s", &[LogArg::Str(&long)]);
        assert_eq!(rendered.len(), MAX_LOG_MESSAGE_LEN - 1);

        let rendered = render_args(format_args!("{}", long));
        assert_eq!(rendered.len(), MAX_LOG_MESSAGE_LEN - 1);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut message = BoundedMessage::with_limit(5);
        message.write_str("abcdé").unwrap();
        assert_eq!(message.as_str(), "abcd");
        assert!(message.is_truncated());
    }

    proptest! {
        #[test]
        fn prop_rendered_length_never_exceeds_bound(
            template in ".{0,2048}",
            text in ".{0,2048}",
            number in any::<i64>(),
        ) {
            let rendered = render_template(&template, &[LogArg::Str(&text), LogArg::I64(number)]);
            prop_assert!(rendered.len() < MAX_LOG_MESSAGE_LEN);
        }

        #[test]
        fn prop_plain_text_passes_through(text in "[a-zA-Z0-9 .,:]{0,512}") {
            prop_assert_eq!(render_template(&text, &[]), text);
        }
    }
}
