//! Parsing of HTML into an arena-backed DOM

mod dom;
mod parsing;
#[cfg(test)]
mod tests;

pub use dom::*;
pub use parsing::{decode_entities, parse, ParseError, MAX_NESTING};
