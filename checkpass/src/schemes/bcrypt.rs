use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::GeneralPurpose;
use base64::engine::GeneralPurposeConfig;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::backend::Handle;
use crate::defaults::BcryptDefaults;
use crate::errors::FormatError;
use crate::errors::HashError;
use crate::phc::grammar;
use crate::phc::grammar::Cursor;
use crate::salt::random_salt;
use crate::scheme::bounded;
use crate::scheme::Options;
use crate::scheme::Scheme;

pub const NAME: &str = "bcrypt";

const SALT_CHARS: usize = 22;
/// Salt plus checksum after the `$2x$NN$` prefix.
const BODY_CHARS: usize = 53;
const MAX_PASSWORD_BYTES: usize = 72;
const IDENTS: [&str; 5] = ["2", "2a", "2b", "2x", "2y"];

struct Parts<'a> {
    cost: &'a str,
    body: &'a str,
}

/// `$2[abxy]?$NN$` followed by 53 characters of the bcrypt alphabet.
fn parse(hash: &str) -> Option<Parts<'_>> {
    let mut cursor = Cursor::new(hash);
    if !cursor.eat("$2") {
        return None;
    }
    cursor.take_run(0, 1, |b| matches!(b, b'a' | b'b' | b'x' | b'y'))?;
    if !cursor.eat("$") {
        return None;
    }
    let cost = cursor.take_exact(2, grammar::is_digit)?;
    if !cursor.eat("$") {
        return None;
    }
    let body = cursor.take_exact(BODY_CHARS, grammar::is_crypt64)?;
    cursor.is_end().then_some(Parts { cost, body })
}

struct Backend {
    salt_codec: GeneralPurpose,
}

impl Backend {
    fn load() -> Result<Self, HashError> {
        let config = GeneralPurposeConfig::new()
            .with_encode_padding(false)
            .with_decode_allow_trailing_bits(true)
            .with_decode_padding_mode(DecodePaddingMode::RequireNone);
        Ok(Self {
            salt_codec: GeneralPurpose::new(&alphabet::BCRYPT, config),
        })
    }

    fn decode_salt(&self, encoded: &str) -> Result<[u8; 16], HashError> {
        self.salt_codec
            .decode(encoded)
            .ok()
            .and_then(|bytes| <[u8; 16]>::try_from(bytes).ok())
            .ok_or_else(|| FormatError::InvalidBase64(encoded.to_string()).into())
    }

    /// Full `$2b$NN$` hash for a raw 16-byte salt.
    fn digest(&self, password: &[u8], cost: u32, salt: [u8; 16]) -> Result<String, HashError> {
        bcrypt::hash_with_salt(password, cost, salt)
            .map(|parts| parts.format_for_version(bcrypt::Version::TwoB))
            .map_err(|e| HashError::Crypto(e.to_string()))
    }
}

/// OpenBSD bcrypt, ids `bcrypt` and `blowfish`.
///
/// Verification truncates passwords to 72 bytes like every other
/// implementation does; generation refuses them instead.
pub struct Bcrypt {
    defaults: BcryptDefaults,
    backend: Handle<Backend>,
}

impl Bcrypt {
    pub fn new(defaults: BcryptDefaults) -> Self {
        Self {
            defaults,
            backend: Handle::new(NAME),
        }
    }

    fn backend(&self) -> Result<&Backend, HashError> {
        self.backend.get_or_try_init(Backend::load)
    }
}

impl Default for Bcrypt {
    fn default() -> Self {
        Self::new(BcryptDefaults::default())
    }
}

impl Scheme for Bcrypt {
    fn name(&self) -> &'static str {
        NAME
    }

    fn provide(&self, id: &str) -> bool {
        id == "bcrypt" || id == "blowfish"
    }

    fn understand(&self, hash: &str) -> bool {
        parse(hash).is_some()
    }

    fn checkpass(&self, password: &[u8], hash: &str) -> Result<bool, HashError> {
        let parts = parse(hash).ok_or_else(|| FormatError::Unrecognized(hash.to_string()))?;
        let cost = parts
            .cost
            .parse::<i64>()
            .map_err(|_| FormatError::Unrecognized(hash.to_string()))?;
        let cost = bounded::<u32>("cost", cost, 4..=31)?;

        let backend = self.backend()?;
        let salt = backend.decode_salt(&parts.body[..SALT_CHARS])?;
        let password = &password[..password.len().min(MAX_PASSWORD_BYTES)];
        let computed = backend.digest(password, cost, salt)?;

        let computed = &computed.as_bytes()[computed.len() - BODY_CHARS..];
        Ok(computed.ct_eq(parts.body.as_bytes()).into())
    }

    fn newhash(&self, password: &[u8], id: &str, options: &Options) -> Result<String, HashError> {
        if !self.provide(id) {
            return Err(HashError::UnsupportedAlgorithm(id.to_string()));
        }
        options.ensure_only(&["rounds", "ident"])?;

        let cost = options
            .int("rounds")?
            .unwrap_or_else(|| i64::from(self.defaults.cost));
        let cost = bounded::<u32>("rounds", cost, 4..=31)?;
        let ident = options.text("ident")?.unwrap_or(&self.defaults.ident);
        if !IDENTS.contains(&ident) {
            return Err(HashError::InvalidArgument(format!(
                "unknown bcrypt ident {ident:?}"
            )));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::out_of_range(
                "password length",
                password.len(),
                format!("at most {MAX_PASSWORD_BYTES} bytes"),
            ));
        }

        let salt = <[u8; 16]>::try_from(random_salt(16)?)
            .map_err(|_| HashError::Rng("short salt".to_string()))?;
        let encoded = self.backend()?.digest(password, cost, salt)?;
        let rest = encoded
            .strip_prefix("$2b$")
            .ok_or_else(|| HashError::Crypto(format!("unexpected bcrypt output {encoded:?}")))?;

        tracing::debug!(cost, ident, "generated bcrypt hash");
        Ok(format!("${ident}${rest}"))
    }
}
