//! JSON serializer adapter for mod data values.
//!
//! # Responsibility
//! - Convert between a mod's typed value and a byte stream.
//! - Keep format details out of registry and lifecycle code.
//!
//! # Invariants
//! - An absent stream decodes to `Ok(None)`, never to an error.
//! - Malformed content is `CodecError::Json`, distinct from absence.
//! - Unknown fields are ignored on decode; types opt into defaults for
//!   missing fields with `#[serde(default)]`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufReader, BufWriter, Read, Write};

pub type CodecResult<T> = Result<T, CodecError>;

/// Encode/decode failure for one fragment stream.
#[derive(Debug)]
pub enum CodecError {
    /// Underlying stream failed.
    Io(std::io::Error),
    /// Content is not a valid encoding of the declared type.
    Json(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "stream error: {err}"),
            Self::Json(err) => write!(f, "decode error: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        // serde_json reports stream failures through its own error type.
        if value.is_io() {
            return Self::Io(std::io::Error::from(value));
        }
        Self::Json(value)
    }
}

/// Writes `value` to `writer`.
pub fn encode<T, W>(writer: W, value: &T) -> CodecResult<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Reads one value from `reader`; `None` means no data is present.
pub fn decode<T, R>(reader: Option<R>) -> CodecResult<Option<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let Some(reader) = reader else {
        return Ok(None);
    };
    let value = serde_json::from_reader(BufReader::new(reader))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, CodecError};
    use serde::{Deserialize, Serialize};
    use std::io::{self, Cursor, Write};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Progress {
        level: u32,
        #[serde(default)]
        unlocked: Vec<String>,
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn absent_stream_decodes_to_none() {
        let decoded: Option<Progress> = decode(None::<Cursor<Vec<u8>>>).expect("absent decode");
        assert!(decoded.is_none());
    }

    #[test]
    fn decode_ignores_unknown_and_defaults_missing_fields() {
        let raw = br#"{"level": 4, "added_in_v2": true}"#;
        let decoded: Progress = decode(Some(&raw[..]))
            .expect("tolerant decode")
            .expect("value present");
        assert_eq!(
            decoded,
            Progress {
                level: 4,
                unlocked: vec![],
            }
        );
    }

    #[test]
    fn malformed_content_is_a_json_error() {
        let err = decode::<Progress, _>(Some(&b"{not json"[..])).expect_err("malformed");
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn failing_writer_is_an_io_error() {
        let value = Progress {
            level: 1,
            unlocked: vec!["a".to_string()],
        };
        let err = encode(BrokenWriter, &value).expect_err("write must fail");
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[test]
    fn encoded_value_reads_back_equal() {
        let value = Progress {
            level: 9,
            unlocked: vec!["north".to_string(), "south".to_string()],
        };
        let mut buffer = Vec::new();
        encode(&mut buffer, &value).expect("encode");
        let decoded: Progress = decode(Some(buffer.as_slice()))
            .expect("decode")
            .expect("value present");
        assert_eq!(decoded, value);
    }
}
