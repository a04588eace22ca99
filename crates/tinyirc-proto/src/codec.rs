//! Line framing codec for tokio transports.
//!
//! Inbound bytes are split on `\n` with an optional preceding `\r` stripped;
//! an incomplete trailing fragment stays in the buffer for the next read.
//! Outbound messages are serialized with a CRLF terminator.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::Message;

/// Framing codec: decodes raw lines, encodes [`Message`]s.
#[derive(Debug, Default)]
pub struct LineCodec {
    // Scan resume offset, so a long fragment is not rescanned per read.
    next_index: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, std::io::Error> {
        let Some(pos) = src[self.next_index..].iter().position(|&b| b == b'\n') else {
            self.next_index = src.len();
            return Ok(None);
        };

        let mut line = src.split_to(self.next_index + pos + 1);
        self.next_index = 0;
        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

impl Encoder<&Message> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, msg: &Message, dst: &mut BytesMut) -> Result<(), std::io::Error> {
        let line = msg.to_string();
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

impl Encoder<Message> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), std::io::Error> {
        self.encode(&msg, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = codec.decode(buf).unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_crlf_and_bare_lf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"NICK apa\r\nUSER apa * * :apa\n"[..]);
        let lines = decode_all(&mut codec, &mut buf);
        assert_eq!(lines, vec!["NICK apa", "USER apa * * :apa"]);
    }

    #[test]
    fn test_partial_line_retained() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"JOIN #fi"[..]);
        assert!(decode_all(&mut codec, &mut buf).is_empty());

        buf.extend_from_slice(b"sk\r\nPRIV");
        assert_eq!(decode_all(&mut codec, &mut buf), vec!["JOIN #fisk"]);
        assert_eq!(&buf[..], b"PRIV");
    }

    #[test]
    fn test_empty_lines_pass_through() {
        // The tokenizer is the layer that ignores empty lines.
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\r\n\n"[..]);
        assert_eq!(decode_all(&mut codec, &mut buf), vec!["", ""]);
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let msg = Message::new("PING", vec!["irc.example.net".to_string()]);
        codec.encode(&msg, &mut buf).unwrap();
        assert_eq!(&buf[..], b"PING irc.example.net\r\n");
    }
}
