use serde::Serialize;

const ZIP_MAGIC: [u8; 2] = [0x50, 0x4b];
const SEVEN_ZIP_MAGIC: [u8; 6] = [0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c];
const HTML_PROBE_LEN: usize = 500;

/// Container format of a downloaded buffer, decided from its content only.
/// File names and `Content-Type` headers are never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    Zip,
    SevenZip,
    /// An HTML document, usually a landing page served instead of the file.
    Html,
    Unrecognized,
}

impl ArchiveKind {
    pub fn is_supported(self) -> bool {
        matches!(self, ArchiveKind::Zip | ArchiveKind::SevenZip)
    }
}

pub fn classify(bytes: &[u8]) -> ArchiveKind {
    if bytes.starts_with(&ZIP_MAGIC) {
        return ArchiveKind::Zip;
    }
    if bytes.starts_with(&SEVEN_ZIP_MAGIC) {
        return ArchiveKind::SevenZip;
    }

    let head = &bytes[..bytes.len().min(HTML_PROBE_LEN)];
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    if text.contains("<html") || text.contains("<!doctype") {
        ArchiveKind::Html
    } else {
        ArchiveKind::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_needs_only_two_byte_signature() {
        assert_eq!(classify(b"PK\x03\x04rest"), ArchiveKind::Zip);
        assert_eq!(classify(b"PK"), ArchiveKind::Zip);
        assert_eq!(classify(b"P"), ArchiveKind::Unrecognized);
    }

    #[test]
    fn seven_zip_needs_full_signature() {
        let mut buf = SEVEN_ZIP_MAGIC.to_vec();
        buf.extend_from_slice(&[0, 4, 1, 2]);
        assert_eq!(classify(&buf), ArchiveKind::SevenZip);
        assert_eq!(classify(&SEVEN_ZIP_MAGIC[..5]), ArchiveKind::Unrecognized);
    }

    #[test]
    fn html_marker_is_case_insensitive_within_probe_window() {
        assert_eq!(classify(b"<!DOCTYPE html><title>x</title>"), ArchiveKind::Html);
        assert_eq!(classify(b"\n  <HTML lang=en>"), ArchiveKind::Html);

        let mut late = vec![b' '; HTML_PROBE_LEN];
        late.extend_from_slice(b"<html>");
        assert_eq!(classify(&late), ArchiveKind::Unrecognized);
    }

    #[test]
    fn empty_and_binary_are_unrecognized() {
        assert_eq!(classify(b""), ArchiveKind::Unrecognized);
        assert_eq!(classify(&[0xff, 0xd8, 0xff, 0xe0]), ArchiveKind::Unrecognized);
        assert!(!ArchiveKind::Html.is_supported());
    }
}
