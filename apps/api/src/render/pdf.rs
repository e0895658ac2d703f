//! Minimal PDF 1.4 serializer for laid-out pages.
//!
//! Object layout is fixed so output is byte-stable:
//! 1 catalog, 2 page tree, 3 Helvetica, 4 Helvetica-Bold, 5 info,
//! then one (page, content stream) pair per page. Streams are left
//! uncompressed and no timestamps or file IDs are written.

use std::io::{self, Write};

use crate::render::font_metrics::{ascii_substitute, FontFace};
use crate::render::layout::{DrawOp, PageLayout, Rgb, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};

/// Magic every serialized document starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF";
/// Anything this short cannot be a real resume.
pub const MIN_DOCUMENT_BYTES: usize = 100;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const INFO_ID: usize = 5;
const FIRST_PAGE_ID: usize = 6;

/// Why a buffer was rejected as a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfCheck {
    Valid,
    TooShort(usize),
    MissingMagic,
}

/// Header and length check shared by the renderer and the cache.
/// The magic may sit anywhere in the first five bytes.
pub fn check_pdf_bytes(bytes: &[u8]) -> PdfCheck {
    if bytes.len() <= MIN_DOCUMENT_BYTES {
        return PdfCheck::TooShort(bytes.len());
    }
    let head = &bytes[..5];
    if head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        PdfCheck::Valid
    } else {
        PdfCheck::MissingMagic
    }
}

impl PdfCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, PdfCheck::Valid)
    }

    pub fn describe(&self) -> String {
        match self {
            PdfCheck::Valid => "valid".to_string(),
            PdfCheck::TooShort(len) => {
                format!("{len} bytes, expected more than {MIN_DOCUMENT_BYTES}")
            }
            PdfCheck::MissingMagic => "missing %PDF header".to_string(),
        }
    }
}

/// Serializes pages into a complete PDF file.
pub fn write_pdf(title: &str, pages: &[PageLayout]) -> io::Result<Vec<u8>> {
    let mut objects: Vec<Vec<u8>> = Vec::with_capacity(FIRST_PAGE_ID - 1 + pages.len() * 2);

    let page_ids: Vec<usize> = (0..pages.len()).map(|i| FIRST_PAGE_ID + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    objects.push(format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").into_bytes());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} /MediaBox [0 0 {} {}] >>",
            pages.len(),
            PAGE_WIDTH_PT,
            PAGE_HEIGHT_PT
        )
        .into_bytes(),
    );
    objects.push(font_object(FontFace::Regular).into_bytes());
    objects.push(font_object(FontFace::Bold).into_bytes());

    objects.push(
        format!("<< /Producer (resume-api) /Title {} >>", text_string(title)).into_bytes(),
    );

    for (page, page_id) in pages.iter().zip(&page_ids) {
        let content_id = page_id + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /Resources << /Font << /{} {REGULAR_FONT_ID} 0 R /{} {BOLD_FONT_ID} 0 R >> >> /Contents {content_id} 0 R >>",
                FontFace::Regular.resource_name(),
                FontFace::Bold.resource_name(),
            )
            .into_bytes(),
        );

        let content = content_stream(page);
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(&content);
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out = Vec::new();
    build_pdf(&mut out, &objects)?;
    Ok(out)
}

fn build_pdf<W: Write>(out: &mut W, objects: &[Vec<u8>]) -> io::Result<()> {
    let mut offset = 0usize;
    write_bytes(out, b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n", &mut offset)?;

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(offset);
        write_bytes(out, format!("{} 0 obj\n", index + 1).as_bytes(), &mut offset)?;
        write_bytes(out, body, &mut offset)?;
        write_bytes(out, b"\nendobj\n", &mut offset)?;
    }

    let xref_start = offset;
    write_bytes(
        out,
        format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        &mut offset,
    )?;
    for entry in offsets {
        write_bytes(out, format!("{entry:010} 00000 n \n").as_bytes(), &mut offset)?;
    }
    let trailer = format!(
        "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R /Info {INFO_ID} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
        objects.len() + 1
    );
    write_bytes(out, trailer.as_bytes(), &mut offset)
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn font_object(face: FontFace) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        face.base_font()
    )
}

fn content_stream(page: &PageLayout) -> Vec<u8> {
    let mut out = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                face,
                size,
                color,
                text,
            } => {
                out.extend_from_slice(
                    format!(
                        "BT\n{} rg\n/{} {} Tf\n1 0 0 1 {} {} Tm\n(",
                        rgb(*color),
                        face.resource_name(),
                        num(*size),
                        num(*x),
                        num(*y)
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&encode_text(text));
                out.extend_from_slice(b") Tj\nET\n");
            }
            DrawOp::Rule {
                x1,
                x2,
                y,
                width,
                color,
            } => {
                out.extend_from_slice(
                    format!(
                        "{} RG\n{} w\n{} {} m\n{} {} l\nS\n",
                        rgb(*color),
                        num(*width),
                        num(*x1),
                        num(*y),
                        num(*x2),
                        num(*y)
                    )
                    .as_bytes(),
                );
            }
        }
    }
    out
}

/// Fixed two-decimal formatting so float noise never changes the bytes.
fn num(value: f32) -> String {
    format!("{value:.2}")
}

fn rgb(color: Rgb) -> String {
    format!("{} {} {}", num(color.0), num(color.1), num(color.2))
}

/// Encodes text as an escaped WinAnsi literal-string body.
///
/// Characters WinAnsi lacks are replaced with ASCII fallbacks; anything else
/// unmapped becomes `?`.
pub fn encode_text(input: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.extend_from_slice(b"\\\\"),
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\n' | '\r' | '\t' => out.push(b' '),
            ' '..='~' => out.push(ch as u8),
            _ => match (ascii_substitute(ch), winansi_byte(ch)) {
                (Some(sub), _) => out.extend_from_slice(&encode_text(sub)),
                (None, Some(byte)) => out.extend_from_slice(format!("\\{byte:03o}").as_bytes()),
                (None, None) => out.push(b'?'),
            },
        }
    }
    out
}

/// Info dictionary strings are not WinAnsi; write them as UTF-16BE hex with a
/// byte-order mark so any title round-trips.
fn text_string(input: &str) -> String {
    let mut out = String::from("<FEFF");
    for unit in input.encode_utf16() {
        out.push_str(&format!("{unit:04X}"));
    }
    out.push('>');
    out
}

fn winansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        _ => return None,
    };
    Some(byte)
}
