use ::argon2::Algorithm;
use ::argon2::Params;
use ::argon2::Version;
use subtle::ConstantTimeEq;

use crate::defaults::Argon2Defaults;
use crate::errors::FormatError;
use crate::errors::HashError;
use crate::phc;
use crate::phc::b64;
use crate::phc::grammar;
use crate::phc::grammar::Cursor;
use crate::salt::random_salt;
use crate::scheme::bounded;
use crate::scheme::Options;
use crate::scheme::Scheme;

pub const NAME: &str = "argon2";

const MAX_P_COST: u32 = 0x00ff_ffff;
/// Largest `m` in KiB a hash may ask for (4 GiB).
const MAX_M_KIB: u32 = 1 << 22;
const MAX_M_COST: u32 = MAX_M_KIB.trailing_zeros();
const MIN_SALT_BYTES: usize = 8;
const MIN_CHECKSUM_BYTES: usize = 4;
const SALT_BYTES: usize = 16;
const OUTPUT_BYTES: usize = 32;

/// Argon2 parameters and material of one stored hash.
#[derive(Debug)]
struct Stored {
    algorithm: Algorithm,
    version: Version,
    m: u32,
    t: u32,
    p: u32,
    salt: Vec<u8>,
    checksum: Vec<u8>,
}

fn variant(cursor: &mut Cursor<'_>) -> Option<Algorithm> {
    if cursor.eat("id") {
        Some(Algorithm::Argon2id)
    } else if cursor.eat("i") {
        Some(Algorithm::Argon2i)
    } else if cursor.eat("d") {
        Some(Algorithm::Argon2d)
    } else {
        None
    }
}

/// `$argon2{i,d,id}[$v=19]$m=N,t=N,p=N$salt$checksum`
fn recognize(hash: &str) -> bool {
    let mut cursor = Cursor::new(hash);
    if !cursor.eat("$argon2") || variant(&mut cursor).is_none() {
        return false;
    }
    cursor.eat("$v=19");
    cursor.eat("$")
        && cursor.uint_param("m").is_some()
        && cursor.eat(",")
        && cursor.uint_param("t").is_some()
        && cursor.eat(",")
        && cursor.uint_param("p").is_some()
        && cursor.eat("$")
        && cursor.take_run(1, usize::MAX, grammar::is_b64).is_some()
        && cursor.eat("$")
        && cursor.take_run(1, usize::MAX, grammar::is_b64).is_some()
        && cursor.is_end()
}

fn parse(hash: &str) -> Result<Stored, HashError> {
    if !recognize(hash) {
        return Err(FormatError::Unrecognized(hash.to_string()).into());
    }
    let unrecognized = || FormatError::Unrecognized(hash.to_string());
    let (variant, rest) = hash[1..].split_once('$').ok_or_else(unrecognized)?;
    let (version, rest) = match rest.strip_prefix("v=19$") {
        Some(rest) => (Version::V0x13, rest),
        None => (Version::V0x10, rest),
    };

    let parsed = phc::decode(&format!("${variant}${rest}"))?;
    let algorithm = match parsed.id.as_str() {
        "argon2i" => Algorithm::Argon2i,
        "argon2d" => Algorithm::Argon2d,
        "argon2id" => Algorithm::Argon2id,
        other => {
            return Err(FormatError::UnexpectedId {
                scheme: NAME,
                id: other.to_string(),
            }
            .into())
        }
    };
    let (m, t, p) = match parsed.integer_params(NAME, &["m", "t", "p"])?[..] {
        [m, t, p] => (m, t, p),
        _ => return Err(unrecognized().into()),
    };

    let m = bounded::<u32>("m", m, 1..=MAX_M_KIB)?;
    let t = bounded::<u32>("t", t, 1..=u32::MAX)?;
    let p = bounded::<u32>("p", p, 1..=MAX_P_COST)?;
    check_memory(m, p)?;
    if parsed.salt.len() < MIN_SALT_BYTES {
        return Err(HashError::out_of_range(
            "salt length",
            parsed.salt.len(),
            format!("at least {MIN_SALT_BYTES} bytes"),
        ));
    }
    if parsed.checksum.len() < MIN_CHECKSUM_BYTES {
        return Err(HashError::out_of_range(
            "checksum length",
            parsed.checksum.len(),
            format!("at least {MIN_CHECKSUM_BYTES} bytes"),
        ));
    }

    Ok(Stored {
        algorithm,
        version,
        m,
        t,
        p,
        salt: parsed.salt,
        checksum: parsed.checksum,
    })
}

fn check_memory(m: u32, p: u32) -> Result<(), HashError> {
    let floor = 8 * u64::from(p);
    if u64::from(m) < floor {
        return Err(HashError::out_of_range("m", m, format!(">= 8 * p = {floor}")));
    }
    Ok(())
}

fn derive(
    algorithm: Algorithm,
    version: Version,
    params: Params,
    password: &[u8],
    salt: &[u8],
    out: &mut [u8],
) -> Result<(), HashError> {
    ::argon2::Argon2::new(algorithm, version, params)
        .hash_password_into(password, salt, out)
        .map_err(|e| HashError::Crypto(e.to_string()))
}

/// Argon2 over the RustCrypto implementation.
///
/// Verifies all three variants and both versions; generates `argon2i` v1.3.
pub struct Argon2 {
    defaults: Argon2Defaults,
}

impl Argon2 {
    pub fn new(defaults: Argon2Defaults) -> Self {
        Self { defaults }
    }
}

impl Default for Argon2 {
    fn default() -> Self {
        Self::new(Argon2Defaults::default())
    }
}

impl Scheme for Argon2 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn provide(&self, id: &str) -> bool {
        id == "argon2i"
    }

    fn understand(&self, hash: &str) -> bool {
        recognize(hash)
    }

    fn checkpass(&self, password: &[u8], hash: &str) -> Result<bool, HashError> {
        let stored = parse(hash)?;
        let params = Params::new(stored.m, stored.t, stored.p, Some(stored.checksum.len()))
            .map_err(|e| {
                let value = format!("{},{},{}", stored.m, stored.t, stored.p);
                HashError::out_of_range("m,t,p", value, e.to_string())
            })?;

        let mut computed = vec![0u8; stored.checksum.len()];
        derive(stored.algorithm, stored.version, params, password, &stored.salt, &mut computed)?;
        Ok(bool::from(computed.ct_eq(&stored.checksum)) && phc::canonical_checksum(hash))
    }

    fn newhash(&self, password: &[u8], id: &str, options: &Options) -> Result<String, HashError> {
        if !self.provide(id) {
            return Err(HashError::UnsupportedAlgorithm(id.to_string()));
        }
        options.ensure_only(&["m_cost", "t_cost", "p_cost"])?;

        let option = |key: &str, default: u32| -> Result<i64, HashError> {
            Ok(options.int(key)?.unwrap_or_else(|| i64::from(default)))
        };
        let m_cost = bounded::<u32>("m_cost", option("m_cost", self.defaults.m_cost)?, 1..=MAX_M_COST)?;
        let t = bounded::<u32>("t_cost", option("t_cost", self.defaults.t_cost)?, 1..=u32::MAX)?;
        let p = bounded::<u32>("p_cost", option("p_cost", self.defaults.p_cost)?, 1..=MAX_P_COST)?;
        let m = 1u32 << m_cost;
        check_memory(m, p)?;
        let params = Params::new(m, t, p, Some(OUTPUT_BYTES))
            .map_err(|e| HashError::Crypto(e.to_string()))?;

        let salt = random_salt(SALT_BYTES)?;
        let mut checksum = vec![0u8; OUTPUT_BYTES];
        derive(Algorithm::Argon2i, Version::V0x13, params, password, &salt, &mut checksum)?;

        tracing::debug!(m, t, p, "generated argon2i hash");
        Ok(format!(
            "$argon2i$v=19${}${}${}",
            phc::encode_params(&[("m", m.into()), ("t", t.into()), ("p", p.into())]),
            b64::encode(&salt),
            b64::encode(&checksum)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V10: &str = "$argon2i$m=65536,t=2,p=1$c29tZXNhbHQ$9sTbSlTio3Biev89thdrlKKiCaYsjjYVJxGAL3swxpQ";
    const V13: &str = "$argon2i$v=19$m=65536,t=2,p=1$c29tZXNhbHQ$wWKIMhR9lyDFvRz9YTZweHKfbftvj+qf+YFY4NeBbtA";

    #[test]
    fn test_understand() {
        let argon2 = Argon2::default();
        assert!(argon2.understand(V10));
        assert!(argon2.understand(V13));
        assert!(argon2.understand("$argon2id$v=19$m=8,t=1,p=1$AAAAAAAAAAA$AAAAAA"));
        assert!(!argon2.understand("$argon2x$m=8,t=1,p=1$AAAAAAAAAAA$AAAAAA"));
        assert!(!argon2.understand("$argon2i$t=1,m=8,p=1$AAAAAAAAAAA$AAAAAA"));
        assert!(!argon2.understand("$argon2i$m=08,t=1,p=1$AAAAAAAAAAA$AAAAAA"));
        assert!(!argon2.understand("$argon2i$m=8,t=1,p=1$AAAAAAAAAAA$"));
        assert!(!argon2.understand("$argon2i$v=19m=8,t=1,p=1$AAAAAAAAAAA$AAAAAA"));
    }

    #[test]
    fn test_checkpass_both_versions() {
        let argon2 = Argon2::default();
        assert_eq!(argon2.checkpass(b"password", V10), Ok(true));
        assert_eq!(argon2.checkpass(b"password", V13), Ok(true));
        assert_eq!(argon2.checkpass(b"passwore", V13), Ok(false));
    }

    #[test]
    fn test_version_is_bound_into_checksum() {
        let swapped = V10.replacen("$argon2i$", "$argon2i$v=19$", 1);
        assert_eq!(Argon2::default().checkpass(b"password", &swapped), Ok(false));
    }

    #[test]
    fn test_checkpass_noncanonical_checksum() {
        let argon2 = Argon2::default();
        let hash = V13.replace("NeBbtA", "NeBbtB");
        assert_eq!(argon2.checkpass(b"password", &hash), Ok(false));
    }

    #[test]
    fn test_checkpass_range_errors() {
        let argon2 = Argon2::default();
        for hash in [
            "$argon2i$m=7,t=1,p=1$c29tZXNhbHQ$AAAAAA",
            "$argon2i$m=15,t=1,p=2$c29tZXNhbHQ$AAAAAA",
            "$argon2i$m=8,t=0,p=1$c29tZXNhbHQ$AAAAAA",
            "$argon2i$m=8,t=8589934592,p=1$c29tZXNhbHQ$AAAAAA",
            "$argon2i$m=65536,t=1,p=16777216$c29tZXNhbHQ$AAAAAA",
            "$argon2i$m=8,t=1,p=1$c2FsdA$AAAAAA",
            "$argon2i$m=8,t=1,p=1$c29tZXNhbHQ$AAA",
            "$argon2i$m=4194305,t=1,p=1$c29tZXNhbHQ$AAAAAA",
            "$argon2i$m=4294967295,t=1,p=1$c29tZXNhbHQ$AAAAAA",
        ] {
            let error = argon2.checkpass(b"x", hash).expect_err(hash);
            assert!(error.is_out_of_range(), "{hash:?} gave {error:?}");
        }
    }

    #[test]
    fn test_checkpass_rejects_missing_separator() {
        let error = Argon2::default()
            .checkpass(b"password", "$argon2i$v=19$m=65536,t=2,p=1c29tZXNhbHQ$wWKIMhR9lyDFvRz9YTZweHKfbftvj+qf+YFY4NeBbtA")
            .expect_err("malformed hash accepted");
        assert!(error.is_format());
    }

    #[test]
    fn test_newhash_round_trip() {
        let argon2 = Argon2::default();
        let options = Options::new().with("m_cost", 8).with("t_cost", 1);

        let hash = argon2
            .newhash(b"secret", "argon2i", &options)
            .expect("Failed to hash");
        assert!(hash.starts_with("$argon2i$v=19$m=256,t=1,p=1$"));
        assert_eq!(argon2.checkpass(b"secret", &hash), Ok(true));
        assert_eq!(argon2.checkpass(b"secreT", &hash), Ok(false));
    }

    #[test]
    fn test_newhash_rejects_invalid_options() {
        let argon2 = Argon2::default();
        assert!(argon2
            .newhash(b"x", "argon2i", &Options::new().with("m_cost", 23))
            .expect_err("m_cost 23 accepted")
            .is_out_of_range());
        assert!(argon2
            .newhash(b"x", "argon2i", &Options::new().with("m_cost", 3).with("p_cost", 2))
            .expect_err("m below 8p accepted")
            .is_out_of_range());
        assert!(matches!(
            argon2.newhash(b"x", "argon2id", &Options::new()),
            Err(HashError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            argon2.newhash(b"x", "argon2i", &Options::new().with("rounds", 3)),
            Err(HashError::InvalidArgument(_))
        ));
    }
}
