use std::fmt;

use crate::errors::HashError;

/// Value of one `newhash` keyword option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(value) => value.fmt(f),
            OptionValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<u8> for OptionValue {
    fn from(value: u8) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Keyword options for hash generation.
///
/// Keys are unique; setting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one option.
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Add or replace one option in place.
    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Reject any key outside `allowed`.
    ///
    /// # Errors
    /// * `InvalidArgument` - An unknown key was supplied
    pub fn ensure_only(&self, allowed: &[&str]) -> Result<(), HashError> {
        match self.keys().find(|key| !allowed.contains(key)) {
            Some(key) => Err(HashError::InvalidArgument(format!("unknown key: {key:?}"))),
            None => Ok(()),
        }
    }

    /// Read an integer option.
    ///
    /// # Errors
    /// * `InvalidArgument` - The option holds text
    pub fn int(&self, key: &str) -> Result<Option<i64>, HashError> {
        match self.get(key) {
            None => Ok(None),
            Some(OptionValue::Int(value)) => Ok(Some(*value)),
            Some(OptionValue::Text(value)) => Err(HashError::InvalidArgument(format!(
                "{key} must be an integer, got {value:?}"
            ))),
        }
    }

    /// Read a text option.
    ///
    /// # Errors
    /// * `InvalidArgument` - The option holds an integer
    pub fn text(&self, key: &str) -> Result<Option<&str>, HashError> {
        match self.get(key) {
            None => Ok(None),
            Some(OptionValue::Text(value)) => Ok(Some(value.as_str())),
            Some(OptionValue::Int(value)) => Err(HashError::InvalidArgument(format!(
                "{key} must be text, got {value}"
            ))),
        }
    }
}

/// Narrow an integer option or parameter into `range`.
///
/// # Errors
/// * `OutOfRange` - Value lies outside `range` or does not fit the target type
pub(crate) fn bounded<T>(
    param: &str,
    value: i64,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, HashError>
where
    T: TryFrom<i64> + PartialOrd + fmt::Display + Copy,
{
    let out_of_range =
        || HashError::out_of_range(param, value, format!("{}..={}", range.start(), range.end()));
    let narrowed = T::try_from(value).map_err(|_| out_of_range())?;
    if range.contains(&narrowed) {
        Ok(narrowed)
    } else {
        Err(out_of_range())
    }
}

/// One password-hashing scheme: recognizer plus adapter over its primitive.
///
/// Every method has an explicit "not supported" default so a scheme only
/// implements the capabilities it has.
pub trait Scheme: Send + Sync {
    /// Stable scheme name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this scheme generates hashes for algorithm `id`.
    fn provide(&self, _id: &str) -> bool {
        false
    }

    /// Whether `hash` matches this scheme's grammar.
    ///
    /// A cheap syntactic filter; never fails.
    fn understand(&self, _hash: &str) -> bool {
        false
    }

    /// Verify `password` against `hash`.
    ///
    /// # Returns
    /// True if the password matches, false on a definite mismatch
    ///
    /// # Errors
    /// * `Format` - Hash is malformed or internally inconsistent
    /// * `OutOfRange` - A parameter lies outside the scheme's legal domain
    fn checkpass(&self, _password: &[u8], _hash: &str) -> Result<bool, HashError> {
        Err(HashError::UnsupportedAlgorithm(format!(
            "{} verification",
            self.name()
        )))
    }

    /// Generate a freshly salted hash of `password` for algorithm `id`.
    ///
    /// All options are validated before any salt is drawn.
    ///
    /// # Errors
    /// * `InvalidArgument` - Unknown option or wrongly typed value
    /// * `OutOfRange` - Option value outside the scheme's legal domain
    fn newhash(&self, _password: &[u8], id: &str, _options: &Options) -> Result<String, HashError> {
        Err(HashError::UnsupportedAlgorithm(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Scheme for Bare {
        fn name(&self) -> &'static str {
            "bare"
        }
    }

    #[test]
    fn test_default_capabilities_are_empty() {
        assert!(!Bare.provide("bare"));
        assert!(!Bare.understand("$bare$"));
        assert!(matches!(
            Bare.checkpass(b"x", "$bare$"),
            Err(HashError::UnsupportedAlgorithm(_))
        ));
        assert_eq!(
            Bare.newhash(b"x", "bare", &Options::new()),
            Err(HashError::UnsupportedAlgorithm("bare".to_string()))
        );
    }

    #[test]
    fn test_options_replace_and_lookup() {
        let options = Options::new()
            .with("rounds", 10)
            .with("ident", "2y")
            .with("rounds", 12);

        assert_eq!(options.keys().collect::<Vec<_>>(), vec!["rounds", "ident"]);
        assert_eq!(options.int("rounds"), Ok(Some(12)));
        assert_eq!(options.text("ident"), Ok(Some("2y")));
        assert_eq!(options.int("missing"), Ok(None));
        assert!(matches!(options.int("ident"), Err(HashError::InvalidArgument(_))));
        assert!(matches!(options.text("rounds"), Err(HashError::InvalidArgument(_))));
    }

    #[test]
    fn test_ensure_only_names_unknown_key() {
        let options = Options::new().with("rounds", 4).with("cost", 4);
        assert_eq!(options.ensure_only(&["rounds", "cost"]), Ok(()));
        assert_eq!(
            options.ensure_only(&["rounds"]),
            Err(HashError::InvalidArgument("unknown key: \"cost\"".to_string()))
        );
    }

    #[test]
    fn test_bounded() {
        assert_eq!(bounded::<u32>("i", 1024, 1..=u32::MAX), Ok(1024));
        assert!(bounded::<u32>("i", 0, 1..=u32::MAX)
            .expect_err("zero accepted")
            .is_out_of_range());
        assert!(bounded::<u32>("i", 4_294_967_296, 1..=u32::MAX)
            .expect_err("overflow accepted")
            .is_out_of_range());
        assert!(bounded::<u8>("ln", -1, 1..=63)
            .expect_err("negative accepted")
            .is_out_of_range());
    }
}
