use std::fmt;

use crate::defaults::Defaults;
use crate::errors::FormatError;
use crate::errors::HashError;
use crate::scheme::Scheme;
use crate::schemes::Argon2;
use crate::schemes::Bcrypt;
use crate::schemes::Pbkdf2;
use crate::schemes::Scrypt;
use crate::schemes::Sha2Crypt;

/// Ordered, immutable list of schemes.
///
/// Registration order is the tie-break: the first scheme that claims an id or
/// a hash string wins.
pub struct Registry {
    schemes: Vec<Box<dyn Scheme>>,
}

impl Registry {
    /// Create a registry over `schemes`, in priority order.
    pub fn new(schemes: Vec<Box<dyn Scheme>>) -> Self {
        Self { schemes }
    }

    /// The built-in schemes with their built-in generation defaults.
    pub fn standard() -> Self {
        Self::with_defaults(&Defaults::default())
    }

    /// The built-in schemes, generating with `defaults`.
    ///
    /// Order: bcrypt, argon2, scrypt, pbkdf2, sha2-crypt.
    pub fn with_defaults(defaults: &Defaults) -> Self {
        Self::new(vec![
            Box::new(Bcrypt::new(defaults.bcrypt.clone())),
            Box::new(Argon2::new(defaults.argon2.clone())),
            Box::new(Scrypt::new(defaults.scrypt.clone())),
            Box::new(Pbkdf2::new(defaults.pbkdf2.clone())),
            Box::new(Sha2Crypt::new(defaults.sha2_crypt.clone())),
        ])
    }

    /// Scheme names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.schemes.iter().map(|scheme| scheme.name()).collect()
    }

    /// Find the scheme that generates algorithm `id`.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - No registered scheme provides `id`
    pub fn resolve_by_id(&self, id: &str) -> Result<&dyn Scheme, HashError> {
        match self.schemes.iter().find(|scheme| scheme.provide(id)) {
            Some(scheme) => {
                tracing::debug!(id, scheme = scheme.name(), "resolved algorithm id");
                Ok(scheme.as_ref())
            }
            None => {
                tracing::debug!(id, "no scheme provides algorithm id");
                Err(HashError::UnsupportedAlgorithm(id.to_string()))
            }
        }
    }

    /// Find the scheme whose grammar matches `hash`.
    ///
    /// # Errors
    /// * `Format` - No registered scheme understands `hash`
    pub fn resolve_by_string(&self, hash: &str) -> Result<&dyn Scheme, HashError> {
        match self.schemes.iter().find(|scheme| scheme.understand(hash)) {
            Some(scheme) => {
                tracing::debug!(scheme = scheme.name(), "resolved hash string");
                Ok(scheme.as_ref())
            }
            None => {
                tracing::warn!(length = hash.len(), "unrecognized password hash");
                Err(FormatError::Unrecognized(hash.to_string()).into())
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::scheme::Options;

    // Define mocks in the test module using mockall
    mock! {
        pub TestScheme {}

        impl Scheme for TestScheme {
            fn name(&self) -> &'static str;
            fn provide(&self, id: &str) -> bool;
            fn understand(&self, hash: &str) -> bool;
            fn checkpass(&self, password: &[u8], hash: &str) -> Result<bool, HashError>;
            fn newhash(&self, password: &[u8], id: &str, options: &Options) -> Result<String, HashError>;
        }
    }

    fn stub(name: &'static str, ids: &'static [&'static str], prefix: &'static str) -> Box<dyn Scheme> {
        let mut scheme = MockTestScheme::new();
        scheme.expect_name().return_const(name);
        scheme.expect_provide().returning(move |id| ids.iter().any(|known| *known == id));
        scheme
            .expect_understand()
            .returning(move |hash| hash.starts_with(prefix));
        Box::new(scheme)
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            Registry::standard().names(),
            vec!["bcrypt", "argon2", "scrypt", "pbkdf2", "sha2-crypt"]
        );
    }

    #[test]
    fn test_first_registered_scheme_wins() {
        let registry = Registry::new(vec![
            stub("first", &["shared"], "$x"),
            stub("second", &["shared", "own"], "$x$"),
        ]);

        let by_id = registry.resolve_by_id("shared").expect("Failed to resolve");
        assert_eq!(by_id.name(), "first");
        let by_id = registry.resolve_by_id("own").expect("Failed to resolve");
        assert_eq!(by_id.name(), "second");

        let by_string = registry.resolve_by_string("$x$abc").expect("Failed to resolve");
        assert_eq!(by_string.name(), "first");
    }

    #[test]
    fn test_resolution_failures() {
        let registry = Registry::new(vec![stub("only", &["only"], "$only$")]);

        assert_eq!(
            registry.resolve_by_id("md5").err(),
            Some(HashError::UnsupportedAlgorithm("md5".to_string()))
        );
        assert_eq!(
            registry.resolve_by_string("$1$abc$def").err(),
            Some(HashError::Format(FormatError::Unrecognized("$1$abc$def".to_string())))
        );
        assert!(Registry::new(Vec::new()).resolve_by_id("bcrypt").is_err());
    }

    #[test]
    fn test_standard_resolves_every_alias() {
        let registry = Registry::standard();
        for (id, scheme) in [
            ("bcrypt", "bcrypt"),
            ("blowfish", "bcrypt"),
            ("argon2i", "argon2"),
            ("scrypt", "scrypt"),
            ("pbkdf2-sha1", "pbkdf2"),
            ("pbkdf2-sha256", "pbkdf2"),
            ("pbkdf2-sha512", "pbkdf2"),
            ("sha256", "sha2-crypt"),
            ("sha512", "sha2-crypt"),
            ("sha256-crypt", "sha2-crypt"),
            ("sha512-crypt", "sha2-crypt"),
        ] {
            let resolved = registry.resolve_by_id(id).expect(id);
            assert_eq!(resolved.name(), scheme, "{id}");
        }
        assert!(registry.resolve_by_id("argon2id").is_err());
    }
}
