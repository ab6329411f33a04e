/*!
Default iterator implementations that log and skip errors.

These are the iterators used by [IntoIterator] and [BgpkitParser::into_record_iter] /
[BgpkitParser::into_elem_iter]. Parsing errors are logged via the `log` crate and the
offending record is skipped, optionally dumped to `mrt_core_dump` when `core_dump` is
enabled on the parser. Callers that need to observe errors directly should use the
`fallible` iterators instead.
*/
use crate::error::ParserError;
use crate::models::*;
use crate::parser::BgpkitParser;
use crate::{Elementor, Filterable};
use log::{error, warn};
use std::io::Read;

/// Default iterator over MRT records. Parsing errors are logged and skipped.
pub struct RecordIterator<R> {
    parser: BgpkitParser<R>,
    elementor: Elementor,
}

impl<R> RecordIterator<R> {
    pub(crate) fn new(parser: BgpkitParser<R>) -> Self {
        RecordIterator {
            parser,
            elementor: Elementor::new(),
        }
    }
}

impl<R: Read> Iterator for RecordIterator<R> {
    type Item = MrtRecord;

    fn next(&mut self) -> Option<MrtRecord> {
        loop {
            let record = match self.parser.next_record() {
                Ok(record) => record,
                Err(e) => match e.error {
                    ParserError::TruncatedMsg(err_str) | ParserError::Unsupported(err_str) => {
                        if self.parser.options.show_warnings {
                            warn!("parser warn: {}", err_str);
                        }
                        continue;
                    }
                    ParserError::UnrecognizedMrtType(t) => {
                        if self.parser.options.show_warnings {
                            warn!("parser warn: unrecognized MRT type {t}");
                        }
                        continue;
                    }
                    ParserError::UnsupportedMrtType { mrt_type, subtype } => {
                        if self.parser.options.show_warnings {
                            warn!("parser warn: unsupported MRT type {mrt_type:?} subtype {subtype}");
                        }
                        continue;
                    }
                    ParserError::UnrecognizedEnumVariant { type_name, value } => {
                        if self.parser.options.show_warnings {
                            warn!("parser warn: {value} is not a recognized {type_name} variant");
                        }
                        continue;
                    }
                    ParserError::ParseError(err_str) => {
                        error!("parser error: {}", err_str);
                        if self.parser.core_dump {
                            if let Some(bytes) = e.bytes {
                                std::fs::write("mrt_core_dump", bytes)
                                    .expect("Unable to write to mrt_core_dump");
                            }
                            return None;
                        }
                        continue;
                    }
                    ParserError::EofExpected => return None,
                    ParserError::IoError(err) | ParserError::EofError(err) => {
                        error!("{:?}", err);
                        if self.parser.core_dump {
                            if let Some(bytes) = e.bytes {
                                std::fs::write("mrt_core_dump", bytes)
                                    .expect("Unable to write to mrt_core_dump");
                            }
                        }
                        return None;
                    }
                    #[cfg(feature = "oneio")]
                    ParserError::OneIoError(_) => return None,
                    ParserError::FilterError(_) => return None,
                },
            };

            if self.parser.filters.is_empty() {
                return Some(record);
            }

            // PeerIndexTable never matches element-level filters but must still be
            // consumed by the elementor so subsequent RIB entries can resolve peers.
            if let MrtMessage::TableDumpV2Message(TableDumpV2Message::PeerIndexTable(_)) =
                &record.message
            {
                let _ = self.elementor.record_to_elems(record.clone());
                return Some(record);
            }

            let elems = self.elementor.record_to_elems(record.clone());
            if elems.iter().any(|elem| elem.match_filters(&self.parser.filters)) {
                return Some(record);
            }
            // record does not produce any elem matching the filters, skip it
        }
    }
}

/// Default iterator over [BgpElem]s. Parsing errors are logged and skipped.
pub struct ElemIterator<R> {
    cache_elems: Vec<BgpElem>,
    record_iter: RecordIterator<R>,
    elementor: Elementor,
}

impl<R> ElemIterator<R> {
    pub(crate) fn new(parser: BgpkitParser<R>) -> Self {
        ElemIterator {
            record_iter: RecordIterator::new(parser),
            cache_elems: vec![],
            elementor: Elementor::new(),
        }
    }
}

impl<R: Read> Iterator for ElemIterator<R> {
    type Item = BgpElem;

    fn next(&mut self) -> Option<BgpElem> {
        loop {
            if let Some(elem) = self.cache_elems.pop() {
                if elem.match_filters(&self.record_iter.parser.filters) {
                    return Some(elem);
                }
                continue;
            }

            let record = self.record_iter.next()?;
            let mut elems = self.elementor.record_to_elems(record);
            if elems.is_empty() {
                continue;
            }
            // reverse so that `pop` yields elems in their original order
            elems.reverse();
            self.cache_elems = elems;
        }
    }
}
