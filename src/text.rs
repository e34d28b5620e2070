use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Text encoding used for length-prefixed and nul-terminated strings.
///
/// Game data is authored on Korean Windows, so the default is EUC-KR
/// (code page 949).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    pub fn euc_kr() -> Self {
        TextEncoding(encoding_rs::EUC_KR)
    }

    pub fn utf_8() -> Self {
        TextEncoding(encoding_rs::UTF_8)
    }

    /// Looks up an encoding by WHATWG label, e.g. `"euc-kr"`, `"windows-949"`, `"utf-8"`.
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.as_bytes()).map(TextEncoding)
    }

    pub fn name(self) -> &'static str {
        self.0.name()
    }

    pub fn decode<'a>(self, bytes: &'a [u8]) -> Cow<'a, str> {
        let (text, had_errors) = self.0.decode_without_bom_handling(bytes);
        if had_errors {
            log::warn!("replaced malformed {} sequences in string", self.name());
        }
        text
    }

    pub fn encode<'a>(self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        let (bytes, _, had_errors) = self.0.encode(text);
        if had_errors {
            return Err(Error::Unencodable(text.to_string(), self.name()));
        }
        Ok(bytes)
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::euc_kr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_text_uses_two_bytes_per_syllable() {
        let text = TextEncoding::euc_kr();
        let bytes = text.encode("로즈").unwrap();
        assert_eq!(bytes.len(), 4);
        assert_eq!(text.decode(&bytes), "로즈");
    }

    #[test]
    fn labels_resolve() {
        assert_eq!(TextEncoding::for_label("windows-949"), Some(TextEncoding::euc_kr()));
        assert_eq!(TextEncoding::for_label("utf-8"), Some(TextEncoding::utf_8()));
        assert_eq!(TextEncoding::for_label("klingon"), None);
    }

    #[test]
    fn unencodable_text_is_an_error() {
        let err = TextEncoding::euc_kr().encode("\u{1F600}").unwrap_err();
        assert!(matches!(err, Error::Unencodable(_, "EUC-KR")));
    }
}
