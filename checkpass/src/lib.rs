//! Password hash interoperability library
//!
//! Verifies passwords against hashes produced by other systems and generates
//! new ones, across several schemes:
//! - bcrypt (`$2a$`, `$2b$`, `$2y$`, ...)
//! - Argon2 (`$argon2i$`, `$argon2d$`, `$argon2id$`)
//! - scrypt (structured `$scrypt$` and the scrypt gem's hex layout)
//! - PBKDF2 with SHA-1, SHA-256 or SHA-512
//! - SHA-crypt (`$5$`, `$6$`)
//!
//! The owning scheme is found from the shape of the hash string alone. A
//! malformed or out-of-range hash is an error, never a silent `false`.
//!
//! # Examples
//!
//! ## Verifying a password
//! ```
//! let hash = "$pbkdf2-sha1$i=4096$c2FsdA$SwB5AbdlSJq+rUnZJvch0GWkKcE";
//! assert!(checkpass::checkpass("password", hash).unwrap());
//! assert!(!checkpass::checkpass("hunter2", hash).unwrap());
//! ```
//!
//! ## Generating a hash
//! ```
//! use checkpass::Options;
//!
//! let options = Options::new().with("rounds", 2048);
//! let hash = checkpass::newhash("password", None, Some("pbkdf2-sha256"), &options).unwrap();
//! assert!(hash.starts_with("$pbkdf2-sha256$i=2048$"));
//! assert!(checkpass::checkpass("password", &hash).unwrap());
//! ```
//!
//! ## Custom defaults
//! ```
//! use checkpass::{Checkpass, Defaults, Options, Registry};
//!
//! let mut defaults = Defaults::default();
//! defaults.bcrypt.cost = 4;
//! let api = Checkpass::new(Registry::with_defaults(&defaults));
//!
//! let hash = api.newhash("password", None, Some("bcrypt"), &Options::new()).unwrap();
//! assert!(hash.starts_with("$2b$04$"));
//! assert_eq!(api.identify(&hash).unwrap(), "bcrypt");
//! ```

pub mod api;
mod backend;
pub mod defaults;
pub mod errors;
pub mod phc;
pub mod registry;
mod salt;
pub mod scheme;
pub mod schemes;

// Re-export commonly used items
pub use api::checkpass;
pub use api::newhash;
pub use api::Checkpass;
pub use defaults::Defaults;
pub use errors::FormatError;
pub use errors::HashError;
pub use phc::ParsedHash;
pub use registry::Registry;
pub use scheme::OptionValue;
pub use scheme::Options;
pub use scheme::Scheme;
