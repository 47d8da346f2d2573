//! Minimal PDF 1.4 writer for assessment reports.
//!
//! Text is set in the standard Type 1 Helvetica family with WinAnsi encoding, so only
//! single-byte characters are printable; anything else becomes `?`.

use crate::assessment::gateways::{CollaboratorError, DocumentRenderer};
use crate::assessment::report::{is_renderable, Report, PLACEHOLDER};

const A4_WIDTH: f32 = 595.28;
const A4_HEIGHT: f32 = 841.89;
const LEADING: f32 = 1.4;
// Average Helvetica advance width as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.52;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone)]
struct Line {
    face: Face,
    size: f32,
    align: Align,
    space_before: f32,
    text: String,
}

#[derive(Debug, Clone)]
pub struct PdfRenderer {
    page_width: f32,
    page_height: f32,
    margin: f32,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::a4()
    }
}

impl PdfRenderer {
    pub fn a4() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: 56.0,
        }
    }

    fn max_chars(&self, size: f32) -> usize {
        let usable = self.page_width - 2.0 * self.margin;
        ((usable / (size * AVERAGE_GLYPH_WIDTH)).floor() as usize).max(1)
    }

    fn layout(&self, report: &Report) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut push = |face, size, align, space_before, text: String| {
            lines.push(Line {
                face,
                size,
                align,
                space_before,
                text,
            });
        };

        push(Face::Bold, 16.0, Align::Center, 0.0, report.title.to_string());
        for (index, (label, value)) in report.title_block.lines().into_iter().enumerate() {
            let space = if index == 0 { 10.0 } else { 0.0 };
            push(
                Face::Regular,
                11.0,
                Align::Left,
                space,
                format!("{label}: {value}"),
            );
        }
        push(
            Face::Bold,
            12.0,
            Align::Left,
            8.0,
            report.maturity_headline.clone(),
        );
        push(
            Face::Regular,
            11.0,
            Align::Left,
            0.0,
            format!("Overall score: {:.2} / 5", report.score.average),
        );

        let mut space = 10.0;
        for text in wrap(&report.headline, self.max_chars(11.0)) {
            push(Face::Bold, 11.0, Align::Left, space, text);
            space = 0.0;
        }

        space = 6.0;
        for paragraph in report.body.lines() {
            if paragraph.trim().is_empty() {
                space = 6.0;
                continue;
            }
            for text in wrap(paragraph, self.max_chars(11.0)) {
                push(Face::Regular, 11.0, Align::Left, space, text);
                space = 0.0;
            }
        }

        push(
            Face::Italic,
            9.0,
            Align::Center,
            12.0,
            report.footer.to_string(),
        );
        lines
    }

    fn paginate(&self, lines: &[Line]) -> Vec<String> {
        let top = self.page_height - self.margin;
        let bottom = self.margin;
        let mut pages = Vec::new();
        let mut content = String::new();
        let mut y = top;

        for line in lines {
            let advance = line.space_before + line.size * LEADING;
            if y - advance < bottom && !content.is_empty() {
                pages.push(std::mem::take(&mut content));
                y = top;
            }
            y -= advance;

            let estimated_width = line.text.chars().count() as f32 * line.size * AVERAGE_GLYPH_WIDTH;
            let x = match line.align {
                Align::Left => self.margin,
                Align::Center => ((self.page_width - estimated_width) / 2.0).max(self.margin),
            };
            content.push_str(&format!(
                "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET\n",
                line.face.resource(),
                line.size,
                x,
                y,
                escape_text(&line.text)
            ));
        }

        if !content.is_empty() || pages.is_empty() {
            pages.push(content);
        }
        pages
    }

    fn write_document(&self, pages: &[String]) -> Vec<u8> {
        const FIRST_PAGE_OBJECT: usize = 6;

        let kids = (0..pages.len())
            .map(|index| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * index))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()).into_bytes(),
            font_object("Helvetica"),
            font_object("Helvetica-Bold"),
            font_object("Helvetica-Oblique"),
        ];

        for (index, content) in pages.iter().enumerate() {
            let contents_object = FIRST_PAGE_OBJECT + 2 * index + 1;
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >> >> \
                     /Contents {contents_object} 0 R >>",
                    self.page_width, self.page_height
                )
                .into_bytes(),
            );

            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend_from_slice(content.as_bytes());
            stream.extend_from_slice(b"\nendstream");
            objects.push(stream);
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let size = objects.len() + 1;
        out.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        out
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>, CollaboratorError> {
        let lines = self.layout(report);
        let pages = self.paginate(&lines);
        Ok(self.write_document(&pages))
    }
}

fn font_object(base_font: &str) -> Vec<u8> {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>")
        .into_bytes()
}

/// Greedy word wrap; words longer than a line are split across lines.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let split_at = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(offset, _)| offset);
            lines.push(word[..split_at].to_string());
            word = &word[split_at..];
        }
        if word.is_empty() {
            continue;
        }

        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text as the body of a PDF literal string, keeping the output ASCII.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        let c = if c == '\t' { ' ' } else { c };
        // WinAnsi assigns different glyphs to 0x80..=0x9F than Latin-1 does.
        let byte = if is_renderable(c) && !('\u{80}'..='\u{9f}').contains(&c) {
            u32::from(c) as u8
        } else {
            PLACEHOLDER as u8
        };
        match byte {
            b'(' | b')' | b'\\' => {
                escaped.push('\\');
                escaped.push(byte as char);
            }
            0x20..=0x7E => escaped.push(byte as char),
            other => escaped.push_str(&format!("\\{other:03o}")),
        }
    }
    escaped
}
