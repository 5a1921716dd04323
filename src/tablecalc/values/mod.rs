//! The expression value model: the closed [`Val`] type, its coercions,
//! comparison rules and date/duration text handling.

pub mod compare;
pub mod datetime;
pub mod value;

pub use compare::{compare, equal, CaseSensitivity};
pub use value::Val;
