//! Upload payloads used across the integration tests

#![allow(dead_code)]

/// Smallest well-formed single page PDF with one line of Helvetica text.
pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100]
  /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >> endobj
4 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj
5 0 obj << /Length 37 >> stream
BT /F1 12 Tf 20 50 Td (Outline me) Tj ET
endstream endobj
trailer << /Root 1 0 R >>
%%EOF
";

/// Bytes standing in for a CorelDRAW document; content is never inspected locally.
pub const SAMPLE_CDR: &[u8] = b"RIFF\x10\x00\x00\x00CDRvvrsn\x04\x00\x00\x00\x00\x00\x00\x00";

/// A second, larger CDR payload for content-independence checks.
pub fn large_cdr() -> Vec<u8> {
    let mut data = SAMPLE_CDR.to_vec();
    data.extend(std::iter::repeat(0xAB).take(64 * 1024));
    data
}

/// Result the fake remote service hands back.
pub const CONVERTED_PDF: &[u8] = b"%PDF-1.7\n% converted by remote service\n%%EOF\n";
