use once_cell::sync::Lazy;

use crate::errors::HashError;
use crate::phc::grammar;
use crate::registry::Registry;
use crate::scheme::bounded;
use crate::scheme::Options;

static DEFAULT: Lazy<Checkpass> = Lazy::new(Checkpass::default);

/// Verification and generation front end over one registry.
#[derive(Debug, Default)]
pub struct Checkpass {
    registry: Registry,
}

impl Checkpass {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Verify a password against a stored hash of any supported scheme.
    ///
    /// # Arguments
    /// * `password` - Plaintext password bytes
    /// * `hash` - Stored hash string
    ///
    /// # Returns
    /// True if the password matches, false on a mismatch
    ///
    /// # Errors
    /// * `Format` - No scheme understands `hash`, or it is malformed
    /// * `OutOfRange` - A stored parameter lies outside its legal domain
    pub fn checkpass(&self, password: impl AsRef<[u8]>, hash: &str) -> Result<bool, HashError> {
        let scheme = self.registry.resolve_by_string(hash)?;
        let matched = scheme.checkpass(password.as_ref(), hash)?;
        tracing::debug!(scheme = scheme.name(), matched, "password checked");
        Ok(matched)
    }

    /// Name of the scheme that owns `hash`, without verifying anything.
    ///
    /// # Errors
    /// * `Format` - No scheme understands `hash`
    pub fn identify(&self, hash: &str) -> Result<&'static str, HashError> {
        self.registry
            .resolve_by_string(hash)
            .map(|scheme| scheme.name())
    }

    /// Generate a new hash of `password`.
    ///
    /// Exactly one of `pref` (OpenBSD-style `bcrypt,12` shorthand) or `id`
    /// must be given. `options` apply to `id` only.
    ///
    /// # Arguments
    /// * `password` - Plaintext password bytes
    /// * `pref` - `name[,cost]` with name `bcrypt` or `blowfish`, cost `a` or 4..=31
    /// * `id` - Algorithm identifier such as `argon2i` or `pbkdf2-sha256`
    /// * `options` - Scheme-specific keyword options
    ///
    /// # Returns
    /// Freshly salted hash string in the scheme's canonical form
    ///
    /// # Errors
    /// * `InvalidArgument` - Both or neither of `pref`/`id`, options with `pref`, or a bad option
    /// * `UnsupportedAlgorithm` - No scheme generates the requested algorithm
    /// * `OutOfRange` - A cost or option lies outside its legal domain
    pub fn newhash(
        &self,
        password: impl AsRef<[u8]>,
        pref: Option<&str>,
        id: Option<&str>,
        options: &Options,
    ) -> Result<String, HashError> {
        let password = password.as_ref();
        match (pref, id) {
            (Some(_), Some(_)) => Err(HashError::InvalidArgument(
                "pref and id are mutually exclusive".to_string(),
            )),
            (None, None) => Err(HashError::InvalidArgument(
                "either pref or id is required".to_string(),
            )),
            (Some(pref), None) => {
                if let Some(key) = options.keys().next() {
                    return Err(HashError::InvalidArgument(format!(
                        "pref takes no options, got {key:?}"
                    )));
                }
                let options = pref_options(pref)?;
                self.registry
                    .resolve_by_id("bcrypt")?
                    .newhash(password, "bcrypt", &options)
            }
            (None, Some(id)) => self.registry.resolve_by_id(id)?.newhash(password, id, options),
        }
    }
}

/// Translate `name[,cost]` into bcrypt options producing a `$2b$` hash.
fn pref_options(pref: &str) -> Result<Options, HashError> {
    let (name, cost) = match pref.split_once(',') {
        Some((name, cost)) => (name, Some(cost)),
        None => (pref, None),
    };
    if name != "bcrypt" && name != "blowfish" {
        return Err(HashError::UnsupportedAlgorithm(name.to_string()));
    }

    let options = Options::new().with("ident", "2b");
    match cost {
        None | Some("a") => Ok(options),
        Some(cost) if grammar::is_decimal(cost) => {
            let rounds = cost
                .parse::<i64>()
                .map_err(|_| HashError::out_of_range("cost", cost, "4..=31"))?;
            Ok(options.with("rounds", bounded::<u32>("cost", rounds, 4..=31)?))
        }
        Some(cost) => Err(HashError::InvalidArgument(format!(
            "unknown cost {cost:?} in pref {pref:?}"
        ))),
    }
}

/// Verify `password` against `hash` with the standard registry.
///
/// # Errors
/// See [`Checkpass::checkpass`].
pub fn checkpass(password: impl AsRef<[u8]>, hash: &str) -> Result<bool, HashError> {
    DEFAULT.checkpass(password, hash)
}

/// Generate a hash with the standard registry.
///
/// # Errors
/// See [`Checkpass::newhash`].
pub fn newhash(
    password: impl AsRef<[u8]>,
    pref: Option<&str>,
    id: Option<&str>,
    options: &Options,
) -> Result<String, HashError> {
    DEFAULT.newhash(password, pref, id, options)
}
