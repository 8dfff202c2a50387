use std::io::BufRead;
use lazy_static::lazy_static;
use regex::Regex;
use crate::error::{ParseError, TraceError};

/// Prefixes of lines which carry no reference, such as the `==pid==` banner valgrind's lackey tool
/// prints around its output
pub const COMMENT_PREFIXES: [&str; 2] = ["==", "#"];

lazy_static! {
    // Deliberately loose, so failures can be narrowed down to the field at fault
    static ref REFERENCE_LINE: Regex = Regex::new(
        r"^\s*(?P<kind>\S+)\s+(?P<address>[^,\s]+)(?:,(?P<length>[^\s]*))?\s*$"
    ).unwrap();
}

/// The kind of a trace reference, as written by lackey
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `I`
    Instruction,
    /// `L`
    Read,
    /// `S`
    Write,
    /// `M`, a load followed by a store to the same location
    ReadModifyWrite,
}

impl ReferenceKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(ReferenceKind::Instruction),
            "L" => Some(ReferenceKind::Read),
            "S" => Some(ReferenceKind::Write),
            "M" => Some(ReferenceKind::ReadModifyWrite),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            ReferenceKind::Instruction => 'I',
            ReferenceKind::Read => 'L',
            ReferenceKind::Write => 'S',
            ReferenceKind::ReadModifyWrite => 'M',
        }
    }
}

/// One memory reference from a trace: `length` bytes starting at `address`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub address: u64,
    pub length: u64,
}

impl Reference {
    pub fn new(kind: ReferenceKind, address: u64, length: u64) -> Self {
        Self { kind, address, length }
    }
}

/// Whether a line should be skipped without producing a reference
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || COMMENT_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix))
}

/// Parses a single trace line of the form `<kind> <hex-address>[,<decimal-length>]`
///
/// Comment and blank lines produce `Ok(None)`. The address may carry a `0x` prefix, and the length
/// defaults to 1 when it is omitted or empty.
///
/// # Arguments
///
/// * `line`: The raw line, with or without its trailing newline
///
/// returns: Result<Option<Reference>, ParseError>
///
/// # Examples
///
/// ```
/// use hierlib::reference::{parse_reference, Reference, ReferenceKind};
/// let reference = parse_reference(" L 0421dbe0,8").unwrap();
/// assert_eq!(reference, Some(Reference::new(ReferenceKind::Read, 0x0421dbe0, 8)));
/// assert_eq!(parse_reference("==1234== Memcheck").unwrap(), None);
/// ```
pub fn parse_reference(line: &str) -> Result<Option<Reference>, ParseError> {
    if is_comment(line) {
        return Ok(None);
    }
    let captures = REFERENCE_LINE.captures(line).ok_or(ParseError::MalformedLine)?;
    let code = &captures["kind"];
    let kind = ReferenceKind::from_code(code)
        .ok_or_else(|| ParseError::UnknownReferenceKind(code.to_string()))?;
    let address = parse_address(&captures["address"])?;
    let length = match captures.name("length").map(|m| m.as_str()) {
        None | Some("") => 1,
        Some(text) if text.starts_with('+') => return Err(ParseError::MalformedLine),
        Some(text) => match text.parse::<u64>() {
            Ok(0) | Err(_) => return Err(ParseError::MalformedLine),
            Ok(length) => length,
        },
    };
    Ok(Some(Reference { kind, address, length }))
}

/// Parses a hexadecimal address, with or without a `0x`/`0X` prefix
///
/// # Examples
///
/// ```
/// use hierlib::reference::parse_address;
/// assert_eq!(parse_address("0X0000000A"), Ok(10));
/// assert!(parse_address("0xg").is_err());
/// ```
pub fn parse_address(text: &str) -> Result<u64, ParseError> {
    let digits = text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    // from_str_radix would otherwise take a sign
    if digits.starts_with('+') {
        return Err(ParseError::UnparsableAddress(text.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| ParseError::UnparsableAddress(text.to_string()))
}

/// Lazily parses references out of a line oriented trace
///
/// Comment lines are skipped silently. Lines which fail to parse are yielded as errors carrying
/// their (1-based) line number and raw content, including lines which aren't valid UTF-8, and iteration carries on after them. Memory use is
/// bounded by the longest line, not the length of the trace.
pub struct TraceReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line: 0,
        }
    }

    /// The number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Reference, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TraceError::Io(e))),
            }
            self.line += 1;
            let raw = match std::str::from_utf8(&self.buffer) {
                Ok(text) => text.trim_end_matches(['\n', '\r']),
                Err(_) => return Some(Err(TraceError::Parse {
                    line: self.line,
                    raw: String::from_utf8_lossy(&self.buffer).trim_end_matches(['\n', '\r']).to_string(),
                    source: ParseError::MalformedLine,
                })),
            };
            match parse_reference(raw) {
                Ok(Some(reference)) => return Some(Ok(reference)),
                Ok(None) => continue,
                Err(source) => return Some(Err(TraceError::Parse {
                    line: self.line,
                    raw: raw.to_string(),
                    source,
                })),
            }
        }
    }
}
