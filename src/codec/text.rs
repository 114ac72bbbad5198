//! `text/plain` encoder.

use super::{CodecError, ContentFormat, Encoded, PayloadWriter, Representation, MAX_PAYLOAD_LEN};

/// Render the plain-text form of `value`.
pub fn encode_text<R: Representation>(value: &R) -> Result<Encoded, CodecError> {
    let mut writer = PayloadWriter::new();
    match value.write_text(&mut writer) {
        Ok(()) => Ok(writer.finish(ContentFormat::PlainText)),
        Err(_) if writer.overflowed() => Err(CodecError::EncodingOverflow {
            limit: MAX_PAYLOAD_LEN,
        }),
        Err(e) => Err(CodecError::Serialize(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Line(String);

    impl Representation for Line {
        type Document = ();

        fn write_text<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
            write!(out, "{}", self.0)
        }

        fn document(&self) -> Self::Document {}
    }

    #[test]
    fn test_text_exact_bytes() {
        let encoded = encode_text(&Line("hello".into())).unwrap();
        assert_eq!(encoded.as_bytes(), b"hello");
        assert_eq!(encoded.format(), ContentFormat::PlainText);
    }

    #[test]
    fn test_text_overflow_is_an_error() {
        let result = encode_text(&Line("x".repeat(MAX_PAYLOAD_LEN + 1)));
        assert_eq!(
            result,
            Err(CodecError::EncodingOverflow {
                limit: MAX_PAYLOAD_LEN
            })
        );
    }
}
