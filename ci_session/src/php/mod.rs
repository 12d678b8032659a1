//! Codec for PHP's native serialization format.
//!
//! CodeIgniter stores sessions using PHP's `php` session serialize handler,
//! which writes each session variable as `name|` followed by the variable's
//! `serialize()` form. Both layers are implemented here over the closed
//! [`PhpValue`] type.

mod decode;
mod encode;
mod errors;
mod types;

pub use decode::{decode_session, unserialize};
pub use encode::{encode_session, serialize};
pub use errors::PhpError;
pub use types::{PhpArray, PhpKey, PhpValue};
