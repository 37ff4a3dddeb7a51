//! Rivet: the Rust row persistence kit.
//!
//! Row structs derive [`Entity`] to map onto a table. The operations
//! ([`InsertOperation`], [`UpdateOperation`], [`DeleteOperation`],
//! [`SaveOperation`] and [`SelectOperation`]) run parameterized statements
//! against any [`Executor`] and follow the cascade rules declared on the
//! fields holding related rows.
//!
//! ```rust,ignore
//! #[derive(Entity, Default)]
//! #[rivet(name = "accounts")]
//! struct Account {
//!     #[rivet(primary_key, auto_increment)]
//!     id: i64,
//!     name: String,
//!     #[rivet(cascade(all, foreign_key = "account_id"))]
//!     profiles: Vec<Profile>,
//! }
//!
//! account.save(&mut connection).await?;
//! ```
pub use rivet_core::*;
pub use rivet_macros::*;
