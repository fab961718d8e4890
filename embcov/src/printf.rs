//! A small `printf` for status output on targets without `core::fmt` budget.
//!
//! Supported conversions are `%u %d %x %X %c %s %%` with an optional `0` flag,
//! a decimal width and an `l` length modifier. Integers without `l` are cut to
//! 32 bits. Nothing here allocates; output goes byte by byte to a [`Console`].
//!
//! ```
//! use embcov::cprintf;
//!
//! let mut out = Vec::new();
//! cprintf!(out, "%08x: %s\n", 0x2au32, "main.gcda");
//! assert_eq!(out, b"0000002a: main.gcda\n");
//! ```

/// Something that accepts one output byte at a time.
pub trait Console {
    fn put(&mut self, byte: u8);

    fn put_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put(byte);
        }
    }
}

/// Console backed by a plain function, usually a UART `putchar`.
#[derive(Clone, Copy)]
pub struct FnConsole(pub fn(u8));

impl Console for FnConsole {
    fn put(&mut self, byte: u8) {
        (self.0)(byte)
    }
}

impl<C: Console + ?Sized> Console for &mut C {
    fn put(&mut self, byte: u8) {
        (**self).put(byte)
    }
}

#[cfg(feature = "alloc")]
impl Console for alloc::vec::Vec<u8> {
    fn put(&mut self, byte: u8) {
        self.push(byte);
    }

    fn put_all(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Process stdout. Write errors are dropped, there is nobody to report them to.
#[cfg(feature = "std")]
#[derive(Default, Clone, Copy)]
pub struct StdoutConsole;

#[cfg(feature = "std")]
impl Console for StdoutConsole {
    fn put(&mut self, byte: u8) {
        self.put_all(&[byte]);
    }

    fn put_all(&mut self, bytes: &[u8]) {
        use std::io::Write;

        let _ = std::io::stdout().lock().write_all(bytes);
    }
}

/// One argument of [`format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Unsigned(u64),
    Signed(i64),
    Char(u8),
    Str(&'a [u8]),
}

impl Arg<'_> {
    fn as_u64(&self) -> u64 {
        match *self {
            Arg::Unsigned(v) => v,
            Arg::Signed(v) => v as u64,
            Arg::Char(c) => c as u64,
            Arg::Str(_) => 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Arg::Str(s) => s,
            _ => &[],
        }
    }
}

macro_rules! impl_arg_from {
    ( $variant:ident, $target:ty, $( $ty:ty ),+ ) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::$variant(value as $target)
                }
            }
        )+
    };
}

impl_arg_from!(Unsigned, u64, u16, u32, u64, usize);
impl_arg_from!(Signed, i64, i16, i32, i64, isize);

impl From<u8> for Arg<'_> {
    fn from(value: u8) -> Self {
        Arg::Char(value)
    }
}

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Char(value as u8)
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Arg::Str(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value.as_bytes())
    }
}

/// Digits of a u64 plus sign.
const DIGITS: usize = 21;

struct Number {
    buf: [u8; DIGITS],
    start: usize,
    negative: bool,
}

impl Number {
    fn new(mut value: u64, base: u64, upper: bool, negative: bool) -> Self {
        let alphabet: &[u8; 16] = if upper {
            b"0123456789ABCDEF"
        } else {
            b"0123456789abcdef"
        };
        let mut buf = [0; DIGITS];
        let mut start = DIGITS;
        loop {
            start -= 1;
            buf[start] = alphabet[(value % base) as usize];
            value /= base;
            if value == 0 {
                break;
            }
        }
        Number {
            buf,
            start,
            negative,
        }
    }

    fn digits(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    fn len(&self) -> usize {
        self.digits().len() + self.negative as usize
    }
}

fn pad<C: Console + ?Sized>(console: &mut C, fill: u8, count: usize) {
    for _ in 0..count {
        console.put(fill);
    }
}

fn put_number<C: Console + ?Sized>(console: &mut C, number: &Number, width: usize, zero: bool) {
    // Padding always goes in front of the sign, `%05d` of -3 is `000-3`.
    let padding = width.saturating_sub(number.len());
    pad(console, if zero { b'0' } else { b' ' }, padding);
    if number.negative {
        console.put(b'-');
    }
    console.put_all(number.digits());
}

/// Formats `fmt` with `args` onto `console`.
///
/// Missing arguments print as `0` or as an empty string. Unknown conversions
/// print nothing and consume no argument. A format ending right after `%` stops.
pub fn format<C: Console + ?Sized>(console: &mut C, fmt: &[u8], args: &[Arg<'_>]) {
    let mut fmt = fmt.iter().copied();
    let mut args = args.iter();
    let missing = Arg::Unsigned(0);

    while let Some(ch) = fmt.next() {
        if ch != b'%' {
            console.put(ch);
            continue;
        }

        let mut ch = fmt.next();
        let zero = ch == Some(b'0');
        if zero {
            ch = fmt.next();
        }
        let mut width = 0usize;
        while let Some(digit @ b'0'..=b'9') = ch {
            width = width.saturating_mul(10).saturating_add((digit - b'0') as usize);
            ch = fmt.next();
        }
        let long = ch == Some(b'l');
        if long {
            ch = fmt.next();
        }

        let conversion = match ch {
            Some(conversion) => conversion,
            None => return,
        };

        match conversion {
            b'u' | b'x' | b'X' => {
                let mut value = args.next().unwrap_or(&missing).as_u64();
                if !long {
                    value = value as u32 as u64;
                }
                let base = if conversion == b'u' { 10 } else { 16 };
                let number = Number::new(value, base, conversion == b'X', false);
                put_number(console, &number, width, zero);
            }
            b'd' => {
                let raw = args.next().unwrap_or(&missing).as_u64() as i64;
                let value = if long { raw } else { raw as i32 as i64 };
                let number = Number::new(value.unsigned_abs(), 10, false, value < 0);
                put_number(console, &number, width, zero);
            }
            b'c' => console.put(args.next().unwrap_or(&missing).as_u64() as u8),
            b's' => {
                let text = args.next().map_or(&[][..], Arg::as_bytes);
                pad(console, b' ', width.saturating_sub(text.len()));
                console.put_all(text);
            }
            b'%' => console.put(b'%'),
            _ => {}
        }
    }
}

/// `printf` onto a [`Console`]: `cprintf!(console, "fmt", args...)`.
///
/// Arguments are converted with `Arg::from`, the format may be a `&str` or bytes.
#[macro_export]
macro_rules! cprintf {
    ( $console:expr, $fmt:expr $(, $arg:expr )* $(,)? ) => {
        $crate::printf::format(
            &mut $console,
            ::core::convert::AsRef::<[u8]>::as_ref($fmt),
            &[ $( $crate::printf::Arg::from($arg) ),* ],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(fmt: &str, args: &[Arg<'_>]) -> String {
        let mut out = Vec::new();
        format(&mut out, fmt.as_bytes(), args);
        String::from_utf8(out).unwrap()
    }

    #[test_log::test]
    fn test_integers() {
        assert_eq!(render("%u", &[Arg::Unsigned(42)]), "42");
        assert_eq!(render("%d", &[Arg::Signed(-17)]), "-17");
        assert_eq!(render("%x/%X", &[255u32.into(), 255u32.into()]), "ff/FF");
        assert_eq!(render("%u", &[Arg::Unsigned(0)]), "0");
    }

    #[test_log::test]
    fn test_width_and_zero_padding() {
        assert_eq!(render("%08x:", &[Arg::Unsigned(0x10)]), "00000010:");
        assert_eq!(render("%02x ", &[Arg::Unsigned(7)]), "07 ");
        assert_eq!(render("%5d|", &[Arg::Signed(-3)]), "   -3|");
        assert_eq!(render("%05d|", &[Arg::Signed(-3)]), "000-3|");
        assert_eq!(render("%03ld|", &[Arg::Signed(-42)]), "-42|");
        assert_eq!(render("%6s|", &["ab".into()]), "    ab|");
        assert_eq!(render("%2u", &[Arg::Unsigned(12345)]), "12345");
    }

    #[test_log::test]
    fn test_long_modifier() {
        let big = 0x1_0000_0002u64;
        assert_eq!(render("%x", &[big.into()]), "2");
        assert_eq!(render("%lx", &[big.into()]), "100000002");
        assert_eq!(render("%d", &[Arg::Signed(0xffff_ffff)]), "-1");
        assert_eq!(render("%ld", &[Arg::Signed(i64::MIN)]), "-9223372036854775808");
    }

    #[test_log::test]
    fn test_misc_conversions() {
        assert_eq!(render("%c%c", &['o'.into(), b'k'.into()]), "ok");
        assert_eq!(render("100%%", &[]), "100%");
        assert_eq!(render("a%qb", &[Arg::Unsigned(1)]), "ab");
        assert_eq!(render("a%q%u", &[Arg::Unsigned(1)]), "a1");
    }

    #[test_log::test]
    fn test_truncated_format_and_missing_args() {
        assert_eq!(render("abc%", &[]), "abc");
        assert_eq!(render("abc%08", &[]), "abc");
        assert_eq!(render("[%u][%s]", &[]), "[0][]");
    }

    #[test_log::test]
    fn test_macro() {
        let mut out = Vec::new();
        crate::cprintf!(out, "Emitting %d bytes for %s\n", 20u32, b"a.gcda");
        assert_eq!(out, b"Emitting 20 bytes for a.gcda\n");
    }
}
