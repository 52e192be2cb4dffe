use crate::book::Book;
use crate::{dispatch, xml, Result};
use flate2::bufread::GzDecoder;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Parser)]
#[grammar = "gnucash.pest"]
pub struct ValueParser;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decoder knobs. Both checks are on by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Compare `gnc:count-data` declarations against what was decoded.
    pub verify_counts: bool,
    /// Reject transactions whose split values do not sum to zero.
    pub verify_balance: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            verify_counts: true,
            verify_balance: true,
        }
    }
}

/// Decodes a book from a file, gzip-compressed or not.
///
/// The file stays open only for the duration of the decode.
pub fn parse_file(path: &Path, options: Option<Options>) -> Result<Book> {
    log::debug!("decoding {}", path.display());
    parse_reader(BufReader::new(File::open(path)?), options)
}

/// Decodes a book from a reader, gzip-compressed or not.
pub fn parse_reader<R: BufRead>(mut reader: R, options: Option<Options>) -> Result<Book> {
    let options = options.unwrap_or_default();
    if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
        log::debug!("gzip compressed input");
        return decode(BufReader::new(GzDecoder::new(reader)), &options);
    }
    decode(reader, &options)
}

fn decode<R: BufRead>(reader: R, options: &Options) -> Result<Book> {
    let document = xml::read_document(reader)?;
    dispatch::decode(&document, options)
}

pub fn parse(input: &str, options: Option<Options>) -> Result<Book> {
    parse_reader(input.as_bytes(), options)
}
