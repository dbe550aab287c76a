//! Unit tests for the split-after line codec.
//!
//! Covers:
//! - complete lines keep their trailing newline (split-after semantics)
//! - partial trailing bytes are buffered across decode calls
//! - embedded `\r` is preserved byte-for-byte
//! - chunked input reassembles to exactly the original byte stream
//! - an unterminated fragment at EOF is discarded

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use game_warden::stream::codec::LineCodec;

/// A newline-terminated line decodes with the `\n` still attached.
#[test]
fn emitted_line_keeps_trailing_newline() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("hello world\n");

    let line = codec.decode(&mut buf).expect("decode must succeed");

    assert_eq!(
        line,
        Some("hello world\n".to_owned()),
        "split-after semantics: the newline belongs to the emitted line"
    );
    assert!(buf.is_empty(), "buffer must be fully consumed");
}

/// Bytes after the last newline stay buffered until the next read
/// completes the line.
#[test]
fn partial_trailing_fragment_is_buffered() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("first\nsecond");

    let first = codec.decode(&mut buf).expect("first decode");
    assert_eq!(first, Some("first\n".to_owned()));

    let pending = codec.decode(&mut buf).expect("second decode");
    assert!(pending.is_none(), "incomplete line must not be emitted yet");

    buf.extend_from_slice(b" half\n");
    let second = codec.decode(&mut buf).expect("third decode");
    assert_eq!(
        second,
        Some("second half\n".to_owned()),
        "fragment must combine with the next chunk"
    );
}

/// Embedded `\r` characters pass through untouched.
#[test]
fn embedded_carriage_return_is_preserved() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("windows line\r\n");

    let line = codec.decode(&mut buf).expect("decode must succeed");

    assert_eq!(line, Some("windows line\r\n".to_owned()));
}

/// For chunked input whose concatenation ends in a newline, the emitted
/// lines concatenate back to the input exactly — no loss, no duplication.
#[test]
fn chunked_input_reassembles_exactly() {
    let chunks: &[&[u8]] = &[b"ab", b"c\nde", b"f\r\n", b"", b"gh\nij\nk", b"\n"];
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::new();
    let mut emitted = String::new();

    for chunk in chunks {
        buf.extend_from_slice(chunk);
        while let Some(line) = codec.decode(&mut buf).expect("decode must succeed") {
            emitted.push_str(&line);
        }
    }

    let expected: Vec<u8> = chunks.concat();
    assert_eq!(
        emitted.as_bytes(),
        expected.as_slice(),
        "concatenated output must equal concatenated input"
    );
}

/// Multibyte UTF-8 content inside a line survives reassembly.
#[test]
fn multibyte_content_survives_reassembly() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::new();

    // Split a multibyte character across two chunks; only the completed
    // line is converted, so the character stays intact.
    let bytes = "玩家說話了\n".as_bytes();
    let (head, tail) = bytes.split_at(4);

    buf.extend_from_slice(head);
    assert!(codec.decode(&mut buf).expect("decode").is_none());

    buf.extend_from_slice(tail);
    let line = codec.decode(&mut buf).expect("decode");
    assert_eq!(line, Some("玩家說話了\n".to_owned()));
}

/// `decode_eof` drains buffered complete lines, then discards the
/// unterminated tail rather than flushing it.
#[test]
fn eof_discards_unterminated_fragment() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("done\nhalf a line");

    let line = codec.decode_eof(&mut buf).expect("decode_eof");
    assert_eq!(line, Some("done\n".to_owned()), "complete lines drain first");

    let tail = codec.decode_eof(&mut buf).expect("decode_eof");
    assert!(tail.is_none(), "unterminated fragment must be dropped at EOF");
    assert!(buf.is_empty(), "fragment must not linger in the buffer");
}

/// An empty buffer is a no-op for both decode paths.
#[test]
fn empty_buffer_is_noop() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::new();

    assert!(codec.decode(&mut buf).expect("decode").is_none());
    assert!(codec.decode_eof(&mut buf).expect("decode_eof").is_none());
}
