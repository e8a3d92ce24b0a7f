use serde::Deserialize;

/// Generation defaults applied when `newhash` omits an option.
///
/// Deserializable so a host can load it from configuration; every field
/// falls back to its built-in value when absent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Defaults {
    pub bcrypt: BcryptDefaults,
    pub argon2: Argon2Defaults,
    pub scrypt: ScryptDefaults,
    pub pbkdf2: Pbkdf2Defaults,
    pub sha2_crypt: Sha2CryptDefaults,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BcryptDefaults {
    /// Cost factor, 4..=31
    pub cost: u32,
    /// Version tag written into new hashes
    pub ident: String,
}

impl Default for BcryptDefaults {
    fn default() -> Self {
        Self {
            cost: 12,
            ident: "2b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Argon2Defaults {
    /// Memory as a power of two in KiB
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for Argon2Defaults {
    fn default() -> Self {
        Self {
            m_cost: 12,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScryptDefaults {
    pub ln: u32,
    pub r: u32,
    pub p: u32,
}

impl Default for ScryptDefaults {
    fn default() -> Self {
        Self { ln: 8, r: 8, p: 1 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Pbkdf2Defaults {
    pub rounds: u32,
}

impl Default for Pbkdf2Defaults {
    fn default() -> Self {
        Self { rounds: 1024 }
    }
}

/// `rounds: None` writes no `rounds=` segment, meaning 5000.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Sha2CryptDefaults {
    pub rounds: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let defaults: Defaults = serde_json::from_str(r#"{"bcrypt": {"cost": 10}, "scrypt": {"ln": 14}}"#)
            .expect("Failed to deserialize defaults");

        assert_eq!(defaults.bcrypt.cost, 10);
        assert_eq!(defaults.bcrypt.ident, "2b");
        assert_eq!(defaults.scrypt, ScryptDefaults { ln: 14, r: 8, p: 1 });
        assert_eq!(defaults.pbkdf2.rounds, 1024);
        assert_eq!(defaults.sha2_crypt.rounds, None);
    }
}
