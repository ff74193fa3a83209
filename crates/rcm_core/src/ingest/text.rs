use encoding_rs::WINDOWS_1252;

/// Which decoder produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1252,
}

/// Decode file bytes as UTF-8 (leading BOM dropped), falling back to Windows-1252.
pub fn decode_legacy_text(bytes: &[u8]) -> (String, SourceEncoding) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), SourceEncoding::Utf8),
        Err(e) => {
            tracing::warn!(err = %e, "UTF-8 decoding failed; falling back to windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), SourceEncoding::Windows1252)
        }
    }
}
