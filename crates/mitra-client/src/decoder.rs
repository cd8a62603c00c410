//! Stateful UTF-8 decoding across arbitrary byte boundaries.

use mitra_core::EvalError;

/// Decodes a byte stream piece by piece.
///
/// A multi-byte character split across two pieces is held back until the
/// rest of it arrives. Invalid sequences are errors, not replacement
/// characters.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `pending + bytes` as forms complete characters.
    ///
    /// May return an empty string when the piece only holds part of a character.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<String, EvalError> {
        self.pending.extend_from_slice(bytes);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            Err(e) if e.error_len().is_none() => {
                let tail = self.pending.split_off(e.valid_up_to());
                let head = std::mem::replace(&mut self.pending, tail);
                String::from_utf8(head).map_err(|e| EvalError::Decoding(e.to_string()))
            }
            Err(e) => Err(EvalError::Decoding(e.to_string())),
        }
    }

    /// Fails if the stream ended inside a multi-byte character.
    pub fn finish(&mut self) -> Result<(), EvalError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let held = self.pending.len();
        self.pending.clear();
        Err(EvalError::Decoding(format!(
            "stream ended inside a multi-byte character ({held} byte(s) pending)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"## Score").unwrap(), "## Score");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_split_character_decodes_once_complete() {
        let text = "अंक: ९/१०";
        let bytes = text.as_bytes();
        let mut decoder = Utf8Decoder::new();

        let first = decoder.decode(&bytes[..1]).unwrap();
        assert_eq!(first, "");
        let rest = decoder.decode(&bytes[1..]).unwrap();
        assert_eq!(format!("{first}{rest}"), text);
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_every_split_point_round_trips() {
        let text = "Feedback — **उत्कृष्ट** 👍 done";
        let bytes = text.as_bytes();

        for split in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut out = decoder.decode(&bytes[..split]).unwrap();
            out.push_str(&decoder.decode(&bytes[split..]).unwrap());
            assert!(decoder.finish().is_ok());
            assert_eq!(out, text, "split at {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "emoji 🎯 and हिन्दी";
        let mut decoder = Utf8Decoder::new();
        let out: String = text
            .as_bytes()
            .iter()
            .map(|b| decoder.decode(std::slice::from_ref(b)).unwrap())
            .collect();
        assert_eq!(out, text);
    }

    #[test]
    fn test_invalid_sequence_is_error() {
        let mut decoder = Utf8Decoder::new();
        let err = decoder.decode(&[b'o', b'k', 0xFF, b'!']).unwrap_err();
        assert!(matches!(err, EvalError::Decoding(_)));
    }

    #[test]
    fn test_truncated_character_at_end_is_error() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "é".as_bytes();
        assert_eq!(decoder.decode(&bytes[..1]).unwrap(), "");
        assert!(matches!(decoder.finish(), Err(EvalError::Decoding(_))));
    }
}
