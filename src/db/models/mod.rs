//! Database models split into separate files.
//! This module re-exports individual model modules so imports like
//! `use crate::db::models::*;` work everywhere.

pub mod account;
pub mod campaign;
pub mod ids;
pub mod invite;
pub mod order;
pub mod permission;
pub mod profile;
pub mod share;

pub use self::account::*;
pub use self::campaign::*;
pub use self::ids::*;
pub use self::invite::*;
pub use self::order::*;
pub use self::permission::*;
pub use self::profile::*;
pub use self::share::*;
