//! Text conversions shared by the value layer and the expression scanner
//!
//! Numeric literal parsing is used both for literal tokens and for
//! string-to-number coercion, so the two always agree.

mod case;
mod number;

pub use case::{big_camel_case, camel_case, first_upper, split_path, underline_case};
pub use number::{parse_float, parse_int, NumberParts};
