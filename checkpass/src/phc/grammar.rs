//! Hand-written scanner shared by the codec and the per-scheme recognizers.
//!
//! Every predicate accepts ASCII bytes only, so a slice ending where a
//! predicate stops is always on a `char` boundary.

/// Forward-only cursor over a hash string.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn is_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Consume `literal` if the remaining input starts with it.
    pub(crate) fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume the longest run of bytes satisfying `accept`.
    pub(crate) fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Consume one run of `accept` bytes whose length lies in `min..=max`.
    ///
    /// Nothing is consumed when the run is too short or too long.
    pub(crate) fn take_run(
        &mut self,
        min: usize,
        max: usize,
        accept: impl Fn(u8) -> bool,
    ) -> Option<&'a str> {
        let start = self.pos;
        let run = self.take_while(accept);
        if (min..=max).contains(&run.len()) {
            Some(run)
        } else {
            self.pos = start;
            None
        }
    }

    /// Consume exactly `count` bytes satisfying `accept`, leaving the rest.
    pub(crate) fn take_exact(&mut self, count: usize, accept: impl Fn(u8) -> bool) -> Option<&'a str> {
        let bytes = self.rest().as_bytes();
        if bytes.len() < count || !bytes[..count].iter().all(|&b| accept(b)) {
            return None;
        }
        let start = self.pos;
        self.pos += count;
        Some(&self.input[start..self.pos])
    }

    /// Consume `0|[1-9][0-9]*`.
    pub(crate) fn uint(&mut self) -> Option<&'a str> {
        match self.peek() {
            Some(b'0') => self.take_exact(1, is_digit),
            Some(b'1'..=b'9') => Some(self.take_while(is_digit)),
            _ => None,
        }
    }

    /// Consume `key=<uint>` and return the digits.
    pub(crate) fn uint_param(&mut self, key: &str) -> Option<&'a str> {
        let start = self.pos;
        if self.eat(key) && self.eat("=") {
            if let Some(digits) = self.uint() {
                return Some(digits);
            }
        }
        self.pos = start;
        None
    }
}

pub(crate) fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

pub(crate) fn is_hex(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'f')
}

/// `[a-z0-9-]`, the alphabet of identifiers and parameter keys.
pub(crate) fn is_name(b: u8) -> bool {
    matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-')
}

/// Standard base64 alphabet without padding.
pub(crate) fn is_b64(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Characters allowed in an opaque parameter value.
pub(crate) fn is_value(b: u8) -> bool {
    is_b64(b) || b == b'.' || b == b'-'
}

/// The `./0-9A-Za-z` alphabet of crypt(3) hashes.
pub(crate) fn is_crypt64(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'/'
}

/// `0|-?[1-9][0-9]*`
pub(crate) fn is_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    match digits.as_bytes() {
        [b'0'] => digits.len() == text.len(),
        [b'1'..=b'9', tail @ ..] => tail.iter().all(|&b| is_digit(b)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_rejects_leading_zero_runs() {
        let mut cursor = Cursor::new("012");
        assert_eq!(cursor.uint(), Some("0"));
        assert_eq!(cursor.rest(), "12");

        let mut cursor = Cursor::new("120$");
        assert_eq!(cursor.uint(), Some("120"));
        assert!(cursor.eat("$"));
        assert!(cursor.is_end());

        assert_eq!(Cursor::new("-1").uint(), None);
    }

    #[test]
    fn test_uint_param_restores_position_on_failure() {
        let mut cursor = Cursor::new("ln=x");
        assert_eq!(cursor.uint_param("ln"), None);
        assert_eq!(cursor.rest(), "ln=x");
        assert_eq!(Cursor::new("r=8").uint_param("r"), Some("8"));
    }

    #[test]
    fn test_take_run_bounds() {
        let mut cursor = Cursor::new("abcdef$");
        assert_eq!(cursor.take_run(1, 3, is_name), None);
        assert_eq!(cursor.rest(), "abcdef$");
        assert_eq!(cursor.take_run(1, 32, is_name), Some("abcdef"));
    }

    #[test]
    fn test_take_exact_stops_at_non_ascii() {
        let mut cursor = Cursor::new("ab\u{e9}");
        assert_eq!(cursor.take_exact(3, is_crypt64), None);
        assert_eq!(cursor.take_exact(2, is_crypt64), Some("ab"));
    }

    #[test]
    fn test_is_decimal() {
        assert!(is_decimal("0"));
        assert!(is_decimal("19"));
        assert!(is_decimal("-7"));
        assert!(!is_decimal("-0"));
        assert!(!is_decimal("007"));
        assert!(!is_decimal(""));
        assert!(!is_decimal("-"));
        assert!(!is_decimal("1a"));
    }
}
