use sha1::Sha1;
use sha2::Sha256;
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::defaults::Pbkdf2Defaults;
use crate::errors::FormatError;
use crate::errors::HashError;
use crate::phc;
use crate::phc::grammar;
use crate::phc::grammar::Cursor;
use crate::salt::random_salt;
use crate::scheme::bounded;
use crate::scheme::Options;
use crate::scheme::Scheme;

pub const NAME: &str = "pbkdf2";

const SALT_BYTES: usize = 16;

/// HMAC digest behind one `pbkdf2-*` id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Digest {
    Sha1,
    Sha256,
    Sha512,
}

impl Digest {
    fn from_id(id: &str) -> Option<Self> {
        match id {
            "pbkdf2-sha1" => Some(Digest::Sha1),
            "pbkdf2-sha256" => Some(Digest::Sha256),
            "pbkdf2-sha512" => Some(Digest::Sha512),
            _ => None,
        }
    }

    fn id(self) -> &'static str {
        match self {
            Digest::Sha1 => "pbkdf2-sha1",
            Digest::Sha256 => "pbkdf2-sha256",
            Digest::Sha512 => "pbkdf2-sha512",
        }
    }

    fn output_len(self) -> usize {
        match self {
            Digest::Sha1 => 20,
            Digest::Sha256 => 32,
            Digest::Sha512 => 64,
        }
    }

    fn derive(self, password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
        match self {
            Digest::Sha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, rounds, out),
            Digest::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, out),
            Digest::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, out),
        }
    }
}

/// `$pbkdf2-sha(1|256|512)$i=N$salt$checksum`
fn recognize(hash: &str) -> bool {
    let mut cursor = Cursor::new(hash);
    let prefix = cursor.eat("$pbkdf2-sha")
        && (cursor.eat("1") || cursor.eat("256") || cursor.eat("512"))
        && cursor.eat("$")
        && cursor.uint_param("i").is_some()
        && cursor.eat("$");
    if !prefix {
        return false;
    }
    cursor.take_while(grammar::is_b64);
    if !cursor.eat("$") {
        return false;
    }
    cursor.take_while(grammar::is_b64);
    cursor.is_end()
}

/// PBKDF2-HMAC with SHA-1, SHA-256 or SHA-512.
pub struct Pbkdf2 {
    defaults: Pbkdf2Defaults,
}

impl Pbkdf2 {
    pub fn new(defaults: Pbkdf2Defaults) -> Self {
        Self { defaults }
    }
}

impl Default for Pbkdf2 {
    fn default() -> Self {
        Self::new(Pbkdf2Defaults::default())
    }
}

impl Scheme for Pbkdf2 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn provide(&self, id: &str) -> bool {
        Digest::from_id(id).is_some()
    }

    fn understand(&self, hash: &str) -> bool {
        recognize(hash)
    }

    fn checkpass(&self, password: &[u8], hash: &str) -> Result<bool, HashError> {
        if !recognize(hash) {
            return Err(FormatError::Unrecognized(hash.to_string()).into());
        }
        let parsed = phc::decode(hash)?;
        let digest = Digest::from_id(&parsed.id).ok_or_else(|| FormatError::UnexpectedId {
            scheme: NAME,
            id: parsed.id.clone(),
        })?;
        let rounds = match parsed.integer_params(NAME, &["i"])?[..] {
            [rounds] => bounded::<u32>("i", rounds, 1..=u32::MAX)?,
            _ => return Err(FormatError::Unrecognized(hash.to_string()).into()),
        };
        if parsed.checksum.is_empty() {
            return Err(FormatError::EmptyChecksum { scheme: NAME }.into());
        }

        let mut computed = vec![0u8; parsed.checksum.len()];
        digest.derive(password, &parsed.salt, rounds, &mut computed);
        Ok(bool::from(computed.ct_eq(&parsed.checksum)) && phc::canonical_checksum(hash))
    }

    fn newhash(&self, password: &[u8], id: &str, options: &Options) -> Result<String, HashError> {
        let digest = Digest::from_id(id).ok_or_else(|| HashError::UnsupportedAlgorithm(id.to_string()))?;
        options.ensure_only(&["rounds"])?;
        let rounds = options
            .int("rounds")?
            .unwrap_or_else(|| i64::from(self.defaults.rounds));
        let rounds = bounded::<u32>("rounds", rounds, 1..=u32::MAX)?;

        let salt = random_salt(SALT_BYTES)?;
        let mut checksum = vec![0u8; digest.output_len()];
        digest.derive(password, &salt, rounds, &mut checksum);

        tracing::debug!(id = digest.id(), rounds, "generated pbkdf2 hash");
        Ok(phc::encode(digest.id(), &[("i", rounds.into())], &salt, &checksum))
    }
}
