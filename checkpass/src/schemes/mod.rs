//! Built-in scheme adapters.
//!
//! Each module pairs a recognizer for its hash layout with an adapter over
//! one primitive crate.

pub mod argon2;
pub mod bcrypt;
pub mod pbkdf2;
pub mod scrypt;
pub mod sha2_crypt;

pub use self::argon2::Argon2;
pub use self::bcrypt::Bcrypt;
pub use self::pbkdf2::Pbkdf2;
pub use self::scrypt::Scrypt;
pub use self::sha2_crypt::Sha2Crypt;
