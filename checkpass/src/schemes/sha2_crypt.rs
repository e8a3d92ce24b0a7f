use base64::alphabet;
use base64::engine::GeneralPurpose;
use base64::engine::GeneralPurposeConfig;
use base64::Engine;
use pwhash::HashSetup;
use subtle::ConstantTimeEq;

use crate::backend::Handle;
use crate::defaults::Sha2CryptDefaults;
use crate::errors::FormatError;
use crate::errors::HashError;
use crate::phc::grammar;
use crate::phc::grammar::Cursor;
use crate::salt::random_salt;
use crate::scheme::bounded;
use crate::scheme::Options;
use crate::scheme::Scheme;

pub const NAME: &str = "sha2-crypt";

const MIN_ROUNDS: u32 = 1_000;
const MAX_ROUNDS: u32 = 999_999_999;
const MAX_SALT_CHARS: usize = 16;
/// Random bytes behind a 16-character generated salt.
const SALT_BYTES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Sha256,
    Sha512,
}

impl Family {
    fn from_id(id: &str) -> Option<Self> {
        match id {
            "sha256" | "sha256-crypt" => Some(Family::Sha256),
            "sha512" | "sha512-crypt" => Some(Family::Sha512),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Family::Sha256 => "5",
            Family::Sha512 => "6",
        }
    }

    fn checksum_chars(self) -> usize {
        match self {
            Family::Sha256 => 43,
            Family::Sha512 => 86,
        }
    }

    /// Checksum segment for `salt` and `rounds`; `None` means the implicit 5000.
    #[allow(deprecated)]
    fn checksum(self, password: &[u8], salt: &str, rounds: Option<u32>) -> Result<String, HashError> {
        let setup = HashSetup {
            salt: Some(salt),
            rounds,
        };
        let full = match self {
            Family::Sha256 => pwhash::sha256_crypt::hash_with(setup, password),
            Family::Sha512 => pwhash::sha512_crypt::hash_with(setup, password),
        }
        .map_err(|e| HashError::Crypto(e.to_string()))?;
        full.rsplit('$')
            .next()
            .map(str::to_string)
            .ok_or_else(|| HashError::Crypto(format!("unexpected {NAME} output")))
    }
}

struct Stored<'a> {
    family: Family,
    rounds: Option<&'a str>,
    salt: &'a str,
    checksum: &'a str,
}

/// `$5$` or `$6$`, optional `rounds=N$`, salt of up to 16 chars, checksum.
fn parse(hash: &str) -> Option<Stored<'_>> {
    let mut cursor = Cursor::new(hash);
    let family = if cursor.eat("$5$") {
        Family::Sha256
    } else if cursor.eat("$6$") {
        Family::Sha512
    } else {
        return None;
    };
    let rounds = match cursor.uint_param("rounds") {
        Some(digits) if cursor.eat("$") => Some(digits),
        Some(_) => return None,
        None => None,
    };
    let salt = cursor.take_run(0, MAX_SALT_CHARS, grammar::is_crypt64)?;
    if !cursor.eat("$") {
        return None;
    }
    let checksum = cursor.take_exact(family.checksum_chars(), grammar::is_crypt64)?;
    cursor.is_end().then_some(Stored {
        family,
        rounds,
        salt,
        checksum,
    })
}

struct Backend {
    salt_codec: GeneralPurpose,
}

impl Backend {
    fn load() -> Result<Self, HashError> {
        let config = GeneralPurposeConfig::new().with_encode_padding(false);
        Ok(Self {
            salt_codec: GeneralPurpose::new(&alphabet::CRYPT, config),
        })
    }

    fn fresh_salt(&self) -> Result<String, HashError> {
        Ok(self.salt_codec.encode(random_salt(SALT_BYTES)?))
    }
}

/// SHA-crypt (`$5$` SHA-256 and `$6$` SHA-512) as glibc implements it.
pub struct Sha2Crypt {
    defaults: Sha2CryptDefaults,
    backend: Handle<Backend>,
}

impl Sha2Crypt {
    pub fn new(defaults: Sha2CryptDefaults) -> Self {
        Self {
            defaults,
            backend: Handle::new(NAME),
        }
    }
}

impl Default for Sha2Crypt {
    fn default() -> Self {
        Self::new(Sha2CryptDefaults::default())
    }
}

impl Scheme for Sha2Crypt {
    fn name(&self) -> &'static str {
        NAME
    }

    fn provide(&self, id: &str) -> bool {
        Family::from_id(id).is_some()
    }

    fn understand(&self, hash: &str) -> bool {
        parse(hash).is_some()
    }

    fn checkpass(&self, password: &[u8], hash: &str) -> Result<bool, HashError> {
        let stored = parse(hash).ok_or_else(|| FormatError::Unrecognized(hash.to_string()))?;
        // Stored rounds are clamped into range the way glibc does.
        let rounds = stored
            .rounds
            .map(|digits| {
                digits
                    .parse::<u64>()
                    .map(|value| value.clamp(u64::from(MIN_ROUNDS), u64::from(MAX_ROUNDS)) as u32)
                    .map_err(|_| HashError::out_of_range("rounds", digits, "a 64-bit integer"))
            })
            .transpose()?;

        let computed = stored.family.checksum(password, stored.salt, rounds)?;
        Ok(computed.as_bytes().ct_eq(stored.checksum.as_bytes()).into())
    }

    fn newhash(&self, password: &[u8], id: &str, options: &Options) -> Result<String, HashError> {
        let family = Family::from_id(id).ok_or_else(|| HashError::UnsupportedAlgorithm(id.to_string()))?;
        options.ensure_only(&["rounds"])?;
        let rounds = match options.int("rounds")? {
            Some(value) => Some(value),
            None => self.defaults.rounds.map(i64::from),
        };
        let rounds = rounds
            .map(|value| bounded::<u32>("rounds", value, MIN_ROUNDS..=MAX_ROUNDS))
            .transpose()?;

        let salt = self.backend.get_or_try_init(Backend::load)?.fresh_salt()?;
        let checksum = family.checksum(password, &salt, rounds)?;

        tracing::debug!(id, rounds, "generated sha2-crypt hash");
        Ok(match rounds {
            Some(rounds) => format!("${}$rounds={}${}${}", family.tag(), rounds, salt, checksum),
            None => format!("${}${}${}", family.tag(), salt, checksum),
        })
    }
}
