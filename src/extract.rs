// Brokerage note reader - turns a PDF or text export into plain text
//
// PDFs go through pdf-extract. Anything else is read as bytes and decoded
// as UTF-8, falling back to ISO-8859-15 for notes exported by older
// broker systems.

use anyhow::Context;
use encoding_rs::ISO_8859_15;
use pdf_extract::extract_text;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;

/// Read a brokerage note as text, whatever its container.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    info!("Reading brokerage note: {:?}", path);

    if is_pdf(path) {
        return extract_text(path)
            .with_context(|| format!("Failed to extract text from PDF {}", path.display()));
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(decode_text(bytes))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// UTF-8 first, ISO-8859-15 otherwise (never fails)
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!("Note is not valid UTF-8, decoding as ISO-8859-15");
            let (decoded, _, _) = ISO_8859_15.decode(err.as_bytes());
            decoded.into_owned()
        }
    }
}
