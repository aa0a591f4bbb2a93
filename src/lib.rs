//! Core library for editing mission archives (`.miz`).
//! Provides a lossless codec for the Lua table literals stored inside the archive, the
//! archive container itself, and a validated object model over the decoded mission.

pub mod coord;
pub mod encoding;
mod error;
pub mod mission;
mod miz;
pub mod parking;
pub mod progress;
pub mod sltp;
pub mod statics;
pub mod validator;
pub mod value;

pub use error::{Error, IdKind, Result};
pub use mission::{Category, Mission, Side};
pub use miz::{ManifestEntry, Miz, MizOptions};
pub use value::{LuaKey, LuaNumber, LuaTable, LuaValue};
