use sha1::Digest;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::defaults::ScryptDefaults;
use crate::errors::FormatError;
use crate::errors::HashError;
use crate::phc;
use crate::phc::grammar;
use crate::phc::grammar::Cursor;
use crate::phc::ParsedHash;
use crate::salt::random_salt;
use crate::scheme::bounded;
use crate::scheme::Options;
use crate::scheme::Scheme;

pub const NAME: &str = "scrypt";

const SALT_BYTES: usize = 32;
const OUTPUT_BYTES: usize = 32;
/// Largest working set `128 * r * 2^ln` a hash may ask for.
const MAX_MEMORY_BYTES: u128 = 1 << 32;
/// Hex length of an old-style gem salt.
const OLD_STYLE_SALT_CHARS: usize = 40;
const OLD_STYLE_OUTPUT_BYTES: usize = 256;

/// `$scrypt$ln=N,r=N,p=N$salt$checksum`
fn recognize_structured(hash: &str) -> bool {
    let mut cursor = Cursor::new(hash);
    let prefix = cursor.eat("$scrypt$")
        && cursor.uint_param("ln").is_some()
        && cursor.eat(",")
        && cursor.uint_param("r").is_some()
        && cursor.eat(",")
        && cursor.uint_param("p").is_some()
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

/// Fields of the scrypt gem layout `N$r$p$salt$checksum`.
struct Legacy<'a> {
    n: &'a str,
    r: &'a str,
    p: &'a str,
    salt: &'a str,
    checksum: &'a str,
}

fn parse_legacy(hash: &str) -> Option<Legacy<'_>> {
    let mut cursor = Cursor::new(hash);
    let mut fields = [""; 5];
    for (index, field) in fields.iter_mut().enumerate() {
        if index > 0 && !cursor.eat("$") {
            return None;
        }
        *field = cursor.take_run(1, usize::MAX, grammar::is_hex)?;
    }
    let [n, r, p, salt, checksum] = fields;
    cursor.is_end().then_some(Legacy {
        n,
        r,
        p,
        salt,
        checksum,
    })
}

fn cost_params(ln: u8, r: u32, p: u32) -> Result<scrypt::Params, HashError> {
    let memory = (128 * u128::from(r)) << ln;
    if memory > MAX_MEMORY_BYTES {
        return Err(HashError::out_of_range(
            "128 * r * 2^ln",
            memory,
            format!("at most {MAX_MEMORY_BYTES} bytes"),
        ));
    }
    scrypt::Params::new(ln, r, p, OUTPUT_BYTES).map_err(|_| {
        HashError::out_of_range("ln,r,p", format!("{ln},{r},{p}"), "a combination accepted by scrypt")
    })
}

fn derive(password: &[u8], salt: &[u8], params: &scrypt::Params, out: &mut [u8]) -> Result<(), HashError> {
    scrypt::scrypt(password, salt, params, out).map_err(|e| HashError::Crypto(e.to_string()))
}

/// Parse one hex cost field of the gem layout into `1..=u32::MAX`.
fn hex_u32(param: &str, field: &str) -> Result<u32, HashError> {
    let out_of_range = || HashError::out_of_range(param, field, "1..=ffffffff (hex)");
    let value = u32::from_str_radix(field, 16).map_err(|_| out_of_range())?;
    if value == 0 {
        return Err(out_of_range());
    }
    Ok(value)
}

fn checkpass_structured(password: &[u8], hash: &str, parsed: &ParsedHash) -> Result<bool, HashError> {
    let (ln, r, p) = match parsed.integer_params(NAME, &["ln", "r", "p"])?[..] {
        [ln, r, p] => (ln, r, p),
        _ => return Err(FormatError::NotStructured(parsed.encode()).into()),
    };
    let ln = bounded::<u8>("ln", ln, 1..=63)?;
    let r = bounded::<u32>("r", r, 1..=u32::MAX)?;
    let p = bounded::<u32>("p", p, 1..=u32::MAX)?;
    if parsed.checksum.is_empty() {
        return Err(FormatError::EmptyChecksum { scheme: NAME }.into());
    }

    let mut computed = vec![0u8; parsed.checksum.len()];
    derive(password, &parsed.salt, &cost_params(ln, r, p)?, &mut computed)?;
    Ok(bool::from(computed.ct_eq(&parsed.checksum)) && phc::canonical_checksum(hash))
}

fn checkpass_legacy(password: &[u8], hash: &str, legacy: &Legacy<'_>) -> Result<bool, HashError> {
    let n = u64::from_str_radix(legacy.n, 16)
        .map_err(|_| HashError::out_of_range("N", legacy.n, "a 64-bit hex integer"))?;
    if n < 2 || !n.is_power_of_two() {
        return Err(HashError::out_of_range("N", n, "a power of two >= 2"));
    }
    let ln = bounded::<u8>("ln", i64::from(n.trailing_zeros()), 1..=63)?;
    let r = hex_u32("r", legacy.r)?;
    let p = hex_u32("p", legacy.p)?;
    let params = cost_params(ln, r, p)?;

    if legacy.salt.len() == OLD_STYLE_SALT_CHARS {
        // The old gem salted with the whole cost prefix as text and stored
        // a SHA-1 of the raw output.
        let salt = &hash[..hash.len() - legacy.checksum.len() - 1];
        let mut output = vec![0u8; OLD_STYLE_OUTPUT_BYTES];
        derive(password, salt.as_bytes(), &params, &mut output)?;
        let computed = hex::encode(Sha1::digest(&output));
        return Ok(computed.as_bytes().ct_eq(legacy.checksum.as_bytes()).into());
    }

    let mut salt = legacy.salt;
    while let Some(rest) = salt.strip_prefix("00") {
        salt = rest;
    }
    let salt = hex::decode(salt).map_err(|_| FormatError::InvalidHex(legacy.salt.to_string()))?;
    let expected =
        hex::decode(legacy.checksum).map_err(|_| FormatError::InvalidHex(legacy.checksum.to_string()))?;

    let mut computed = vec![0u8; expected.len()];
    derive(password, &salt, &params, &mut computed)?;
    Ok(computed.ct_eq(&expected).into())
}

/// scrypt in the structured layout, plus verification of the scrypt gem's
/// hex layout.
pub struct Scrypt {
    defaults: ScryptDefaults,
}

impl Scrypt {
    pub fn new(defaults: ScryptDefaults) -> Self {
        Self { defaults }
    }
}

impl Default for Scrypt {
    fn default() -> Self {
        Self::new(ScryptDefaults::default())
    }
}

impl Scheme for Scrypt {
    fn name(&self) -> &'static str {
        NAME
    }

    fn provide(&self, id: &str) -> bool {
        id == NAME
    }

    fn understand(&self, hash: &str) -> bool {
        recognize_structured(hash) || parse_legacy(hash).is_some()
    }

    fn checkpass(&self, password: &[u8], hash: &str) -> Result<bool, HashError> {
        if recognize_structured(hash) {
            return checkpass_structured(password, hash, &phc::decode(hash)?);
        }
        match parse_legacy(hash) {
            Some(legacy) => checkpass_legacy(password, hash, &legacy),
            None => Err(FormatError::Unrecognized(hash.to_string()).into()),
        }
    }

    fn newhash(&self, password: &[u8], id: &str, options: &Options) -> Result<String, HashError> {
        if !self.provide(id) {
            return Err(HashError::UnsupportedAlgorithm(id.to_string()));
        }
        options.ensure_only(&["ln", "r", "p"])?;

        let option = |key: &str, default: u32| -> Result<i64, HashError> {
            Ok(options.int(key)?.unwrap_or_else(|| i64::from(default)))
        };
        let ln = bounded::<u8>("ln", option("ln", self.defaults.ln)?, 1..=63)?;
        let r = bounded::<u32>("r", option("r", self.defaults.r)?, 1..=u32::MAX)?;
        let p = bounded::<u32>("p", option("p", self.defaults.p)?, 1..=u32::MAX)?;
        let params = cost_params(ln, r, p)?;

        let salt = random_salt(SALT_BYTES)?;
        let mut checksum = vec![0u8; OUTPUT_BYTES];
        derive(password, &salt, &params, &mut checksum)?;

        tracing::debug!(ln, r, p, "generated scrypt hash");
        Ok(phc::encode(
            NAME,
            &[("ln", u32::from(ln).into()), ("r", r.into()), ("p", p.into())],
            &salt,
            &checksum,
        ))
    }
}
