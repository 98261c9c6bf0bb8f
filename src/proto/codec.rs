use bytes::{Buf, BytesMut};
use std::{fmt::Write, io};
use tokio_util::codec::{Decoder, Encoder};

use crate::proto::command::Command;

/// Line terminator appended to every command.
pub const TERMINATOR: &str = "\r\n";

/// Longest accepted response line, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Line framing for the XDM1000 SCPI dialect.
///
/// Commands go out as ASCII text terminated by CRLF. Responses are single
/// lines terminated by LF (usually CRLF); bytes outside of ASCII are dropped
/// and surrounding whitespace is stripped.
#[derive(Default)]
pub struct ScpiCodec {
    // Position up to which the read buffer was already searched for LF.
    next_index: usize,
}

impl ScpiCodec {
    fn line_too_long() -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response line exceeds {} bytes", MAX_LINE_LENGTH),
        )
    }

    fn convert_line(raw: &[u8]) -> String {
        raw.iter()
            .filter(|b| b.is_ascii())
            .map(|b| *b as char)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

impl Decoder for ScpiCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let offset = src[self.next_index..].iter().position(|b| *b == b'\n');
        match offset {
            Some(n) => {
                let end = self.next_index + n;
                self.next_index = 0;
                // Allow for the CR of a CRLF terminator
                if end > MAX_LINE_LENGTH + 1 {
                    src.clear();
                    return Err(Self::line_too_long());
                }
                let line = src.split_to(end + 1);
                Ok(Some(Self::convert_line(&line[..end])))
            }
            None if src.len() > MAX_LINE_LENGTH + 1 => {
                self.next_index = 0;
                src.clear();
                Err(Self::line_too_long())
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                // Unterminated trailing data is handed out as a last line.
                self.next_index = 0;
                let line = Self::convert_line(src.chunk());
                src.clear();
                Ok(Some(line))
            }
        }
    }
}

impl Encoder<Command> for ScpiCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.to_string();
        if !line.is_ascii() || line.contains(['\r', '\n']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Command is not a single ASCII line: {:?}", line),
            ));
        }
        dst.reserve(line.len() + TERMINATOR.len());
        write!(dst, "{}{}", line, TERMINATOR).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::MeasurementMode;

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = ScpiCodec::default();
        let mut buf = BytesMut::new();
        codec
            .encode(Command::Configure(MeasurementMode::Resistance), &mut buf)
            .unwrap();
        codec.encode(Command::Measure, &mut buf).unwrap();
        assert_eq!(&buf[..], b"CONF:RES\r\nMEAS?\r\n");
    }

    #[test]
    fn test_encode_rejects_embedded_newline() {
        let mut codec = ScpiCodec::default();
        let mut buf = BytesMut::new();
        assert!(codec.encode(Command::from("MEAS?\r\n*RST"), &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_lines() {
        let mut codec = ScpiCodec::default();
        let mut buf = BytesMut::from(&b"1.234"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"56E+00\r\n-2.0\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("1.23456E+00".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("-2.0".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_drops_non_ascii() {
        let mut codec = ScpiCodec::default();
        let mut buf = BytesMut::from(&b"\xffOWON,XDM1041\xfe,1543210 \r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("OWON,XDM1041,1543210".to_string())
        );
    }

    #[test]
    fn test_decode_rejects_overlong_line() {
        let mut codec = ScpiCodec::default();
        let mut buf = BytesMut::from(&[b'9'; MAX_LINE_LENGTH][..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"9");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"9");
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(buf.is_empty());

        let mut line = vec![b'1'; MAX_LINE_LENGTH + 1];
        line.extend_from_slice(b"\r\n");
        let mut buf = BytesMut::from(&line[..]);
        assert!(codec.decode(&mut buf).is_err());

        let mut line = vec![b'1'; MAX_LINE_LENGTH];
        line.extend_from_slice(b"\r\n");
        let mut buf = BytesMut::from(&line[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap().map(|l| l.len()),
            Some(MAX_LINE_LENGTH)
        );
    }

    #[test]
    fn test_decode_eof_flushes_remainder() {
        let mut codec = ScpiCodec::default();
        let mut buf = BytesMut::from(&b"OVLD"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("OVLD".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }
}
