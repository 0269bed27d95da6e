use printpdf::*;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

const PAGE_WIDTH_PT: f32 = 600.0;
const PAGE_HEIGHT_PT: f32 = 400.0;
const HEADING: &str = "CDR Viewer API Not Configured";
const HINT: &str = "Set ZAMZAR_API_KEY in the server environment to enable CDR conversion.";

fn pt(value: f32) -> Mm {
    Mm(value * 25.4 / 72.0)
}

/// Placeholder PDF served by the CDR route when no remote credential is
/// configured. Rendered once; every request gets the same bytes regardless of
/// what was uploaded.
#[derive(Clone)]
pub struct FallbackDocument {
    bytes: Arc<[u8]>,
}

impl FallbackDocument {
    pub fn render() -> Result<Self, FallbackError> {
        let (doc, page, layer) =
            PdfDocument::new(HEADING, pt(PAGE_WIDTH_PT), pt(PAGE_HEIGHT_PT), "Notice");
        let layer = doc.get_page(page).get_layer(layer);

        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| FallbackError(format!("font error: {e}")))?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| FallbackError(format!("font error: {e}")))?;

        layer.set_fill_color(Color::Rgb(Rgb::new(0.8, 0.1, 0.1, None)));
        layer.use_text(HEADING, 24.0, pt(50.0), pt(300.0), &bold);

        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.use_text(HINT, 14.0, pt(50.0), pt(250.0), &regular);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| FallbackError(format!("save error: {e}")))?;
        let bytes = buf
            .into_inner()
            .map_err(|e| FallbackError(format!("buffer error: {e}")))?;

        Ok(Self {
            bytes: bytes.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, &self.bytes).await
    }
}

#[derive(Debug, thiserror::Error)]
#[error("fallback PDF generation failed: {0}")]
pub struct FallbackError(String);
