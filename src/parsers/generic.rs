use super::{FileInput, ParseResult, Parser};
use crate::error::ParseOutcome;

/// Fallback for extensions the registry doesn't recognize. Produces no
/// symbols or references — the file is still recorded as a `File` row by
/// the persister, just with nothing beneath it.
pub struct GenericParser;

impl Parser for GenericParser {
    fn parse(&self, _input: &FileInput) -> ParseOutcome<ParseResult> {
        Ok(ParseResult::default())
    }
}
