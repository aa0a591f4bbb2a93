//! Archive Lua members are stored in the Windows-1252 code page, not UTF-8.
//!
//! Decoding is total: every byte maps to exactly one char (the five bytes the code page
//! leaves undefined map to the matching C1 control), so decode/encode is lossless.

use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

pub fn decode(data: &[u8]) -> Cow<'_, str> {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(data);
    text
}

pub fn decode_byte(byte: u8) -> char {
    if byte.is_ascii() {
        return byte as char;
    }
    decode(&[byte]).chars().next().unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Encode text for an archive member. Fails with the first character the code page
/// cannot represent.
pub fn encode(text: &str) -> Result<Cow<'_, [u8]>, char> {
    let (bytes, _, had_unmappable) = WINDOWS_1252.encode(text);
    if had_unmappable {
        let bad = text
            .chars()
            .find(|c| {
                let mut buf = [0_u8; 4];
                WINDOWS_1252.encode(c.encode_utf8(&mut buf)).2
            })
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Err(bad);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_byte, encode};

    #[test]
    fn every_byte_roundtrips() {
        let all: Vec<u8> = (0..=255).collect();
        let text = decode(&all);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(encode(&text).unwrap().as_ref(), all.as_slice());
    }

    #[test]
    fn extended_latin_maps_to_code_page() {
        assert_eq!(decode(b"caf\xe9 \x80"), "café €");
        assert_eq!(encode("Ça va").unwrap().as_ref(), b"\xc7a va");
        assert_eq!(decode_byte(0x8a), 'Š');
        assert_eq!(decode_byte(b'A'), 'A');
    }

    #[test]
    fn unmappable_characters_are_reported() {
        assert_eq!(encode("ok \u{65e5}"), Err('\u{65e5}'));
    }
}
