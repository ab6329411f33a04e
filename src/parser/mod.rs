use std::io::Read;

use crate::error::{ParserError, ParserErrorWithBytes};
use crate::models::MrtRecord;

#[macro_use]
pub mod utils;
pub mod bgp;
pub mod bmp;
pub mod filter;
pub mod iters;
pub mod mrt;
pub mod rislive;
pub mod rpki;

pub(crate) use self::utils::*;
pub(crate) use bgp::attributes::AttributeParser;
pub(crate) use mrt::{parse_bgp4mp, parse_table_dump_message, parse_table_dump_v2_message};

pub use filter::{Filter, Filterable, IpVersion, PrefixMatchType};
pub use mrt::mrt_elem::{BgpElem, ElemType, Elementor};
pub use mrt::mrt_record::{
    chunk_mrt_record, parse_common_header, parse_mrt_body, parse_mrt_record, try_parse_common_header,
    try_parse_mrt_record, try_parse_mrt_record_with_buffer, RawMrtRecord,
};

/// Runtime options that tweak how a [BgpkitParser] behaves while iterating.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Whether to log recoverable parsing issues (truncated/unsupported messages) via `log::warn!`.
    pub show_warnings: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            show_warnings: true,
        }
    }
}

/// The main parser struct driving the MRT/BGP data parsing process.
///
/// `BgpkitParser` is generic over any reader that implements [Read], so it works the same
/// whether the underlying data comes from a local file, a remote HTTP(S) URL, or an
/// already-open byte stream. Construct one with [BgpkitParser::new] for local/remote paths, or
/// [BgpkitParser::from_reader] to wrap an arbitrary reader.
///
/// See the [crate]-level documentation for usage examples.
pub struct BgpkitParser<R> {
    reader: R,
    filters: Vec<Filter>,
    options: ParserOptions,
    /// When set, unrecoverable malformed records are dumped to `mrt_core_dump` for offline
    /// inspection instead of being silently discarded.
    core_dump: bool,
    /// Reused across [BgpkitParser::next_record] calls to avoid reallocating per record.
    buffer: Vec<u8>,
}

impl<R> BgpkitParser<R> {
    /// Wraps an existing reader. Use this when the input isn't a local path or URL that
    /// [BgpkitParser::new] can open directly, e.g. data piped over a socket or read from memory.
    pub fn from_reader(reader: R) -> Self {
        BgpkitParser {
            reader,
            filters: vec![],
            options: ParserOptions::default(),
            core_dump: false,
            buffer: vec![],
        }
    }

    /// Adds a filter to the parser, returning the updated parser for chaining.
    ///
    /// See the [filter] module documentation for the available filter types and syntax.
    pub fn add_filter(mut self, filter_type: &str, filter_value: &str) -> Result<Self, ParserError> {
        let filter = Filter::new(filter_type, filter_value)?;
        self.filters.push(filter);
        Ok(self)
    }

    /// Disables warning log messages for recoverable parsing issues.
    pub fn disable_warnings(mut self) -> Self {
        self.options.show_warnings = false;
        self
    }

    /// Enables core-dumping: unrecoverable malformed records are written to `mrt_core_dump`.
    pub fn enable_core_dump(mut self) -> Self {
        self.core_dump = true;
        self
    }
}

impl<R: Read> BgpkitParser<R> {
    /// Parses and returns the next [MrtRecord] from the underlying reader.
    ///
    /// Returns [ParserError::EofExpected] wrapped in [ParserErrorWithBytes] once the reader is
    /// exhausted at a record boundary -- this is the normal, non-error end of iteration.
    pub fn next_record(&mut self) -> Result<MrtRecord, ParserErrorWithBytes> {
        match try_parse_mrt_record_with_buffer(&mut self.reader, &mut self.buffer) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(ParserErrorWithBytes {
                error: ParserError::EofExpected,
                bytes: None,
            }),
            Err(error) => Err(ParserErrorWithBytes {
                error,
                bytes: Some(self.buffer.clone()),
            }),
        }
    }
}

#[cfg(feature = "oneio")]
impl BgpkitParser<Box<dyn Read>> {
    /// Creates a new parser reading from a local file path or a remote URL.
    ///
    /// Remote paths are downloaded and decompressed on the fly (gzip/bzip2/plain, depending on
    /// the crate's enabled features) via [oneio].
    pub fn new(path: &str) -> Result<BgpkitParser<Box<dyn Read>>, ParserError> {
        let reader = oneio::get_reader(path)?;
        Ok(BgpkitParser::from_reader(reader))
    }

    /// Creates a new parser reading from a remote URL, caching the downloaded file under
    /// `cache_dir` so that subsequent calls with the same URL reuse the cached copy.
    pub fn new_cached(
        path: &str,
        cache_dir: &str,
    ) -> Result<BgpkitParser<Box<dyn Read>>, ParserError> {
        let reader = oneio::get_cache_reader(path, cache_dir, false)?;
        Ok(BgpkitParser::from_reader(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_reader_empty() {
        let mut parser = BgpkitParser::from_reader(Cursor::new(vec![]));
        let result = parser.next_record();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err().error,
            ParserError::EofExpected
        ));
    }

    #[test]
    fn test_add_filter_chaining() {
        let parser = BgpkitParser::from_reader(Cursor::new(vec![]))
            .add_filter("origin_asn", "13335")
            .unwrap()
            .add_filter("type", "a")
            .unwrap();
        assert_eq!(parser.filters.len(), 2);
    }

    #[test]
    fn test_add_filter_invalid() {
        let result =
            BgpkitParser::from_reader(Cursor::new(vec![])).add_filter("not_a_filter", "x");
        assert!(result.is_err());
    }
}
