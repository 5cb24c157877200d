//! services/api/src/pdf.rs
//!
//! A small PDF 1.4 writer for the office's generated documents.
//!
//! Only the two standard fonts Helvetica and Helvetica-Bold are used, with
//! WinAnsiEncoding, so no font data is embedded. Text is laid out on A4 pages
//! with word wrapping by character count.

use chrono::{DateTime, Utc};
use lpms_core::finance::FinanceReport;
use lpms_core::legal_documents::{Block, LegalDocument};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const BODY_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 12.0;
const TITLE_SIZE: f32 = 16.0;
const LEADING: f32 = 15.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

struct Layout {
    pages: Vec<Vec<u8>>,
    current: Vec<u8>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn advance(&mut self, amount: f32) {
        self.y -= amount;
        if self.y < MARGIN {
            self.break_page();
        }
    }

    fn text_line(&mut self, text: &str, font: Font, size: f32, x: f32) {
        if self.y - size < MARGIN {
            self.break_page();
        }
        self.y -= size;
        self.current.extend_from_slice(
            format!("BT /{} {} Tf {:.2} {:.2} Td (", font.resource(), size, x, self.y).as_bytes(),
        );
        self.current.extend(encode_text(text));
        self.current.extend_from_slice(b") Tj ET\n");
        self.y -= (size * 1.35).max(LEADING) - size;
    }

    fn wrapped(&mut self, text: &str, font: Font, size: f32) {
        for line in wrap(text, chars_per_line(size)) {
            self.text_line(&line, font, size, MARGIN);
        }
    }

    fn centered(&mut self, text: &str, font: Font, size: f32) {
        for line in wrap(text, chars_per_line(size)) {
            let width = line.chars().count() as f32 * size * GLYPH_WIDTH;
            let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
            self.text_line(&line, font, size, x);
        }
    }

    fn rule(&mut self) {
        if self.y - LEADING < MARGIN {
            self.break_page();
        }
        self.y -= LEADING;
        let start = MARGIN;
        let end = MARGIN + 220.0;
        self.current.extend_from_slice(
            format!("0.5 w {:.2} {:.2} m {:.2} {:.2} l S\n", start, self.y, end, self.y).as_bytes(),
        );
        self.y -= 4.0;
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn chars_per_line(size: f32) -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (size * GLYPH_WIDTH * 1.1)) as usize
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                lines.push(head);
            }
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

/// WinAnsi bytes for a string literal, with `(`, `)` and `\` escaped.
///
/// Characters outside Latin-1 become `?`.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\u{2013}' | '\u{2014}' => out.push(b'-'),
            c if (c as u32) < 0x20 => out.push(b' '),
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Serializes content streams into a complete PDF file.
fn assemble(pages: Vec<Vec<u8>>) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3-4 fonts, then a (page, contents) pair per page.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + 2 * i).collect();
    let mut objects: Vec<Vec<u8>> = Vec::new();

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_vec(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    for (index, content) in pages.into_iter().enumerate() {
        let contents_id = page_ids[index] + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, contents_id
            )
            .into_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend(content);
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend(format!("{} 0 obj\n", i + 1).into_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).into_bytes());
    for offset in offsets {
        out.extend(format!("{:010} 00000 n \n", offset).into_bytes());
    }
    out.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .into_bytes(),
    );
    out
}

/// Lays out a legal document and returns the PDF bytes.
pub fn render_document(document: &LegalDocument) -> Vec<u8> {
    let mut layout = Layout::new();
    for block in &document.blocks {
        match block {
            Block::Title(text) => {
                layout.centered(text, Font::Bold, TITLE_SIZE);
                layout.advance(LEADING / 2.0);
            }
            Block::Heading(text) => {
                layout.advance(LEADING / 3.0);
                layout.wrapped(text, Font::Bold, HEADING_SIZE);
            }
            Block::Paragraph(text) => layout.wrapped(text, Font::Regular, BODY_SIZE),
            Block::Space(lines) => layout.advance(LEADING * lines),
            Block::Rule => layout.rule(),
        }
    }
    assemble(layout.finish())
}

fn money(value: f64) -> String {
    format!("R$ {:.2}", value).replace('.', ",")
}

pub const FINANCE_REPORT_FILE: &str = "Relatorio_Financeiro.pdf";

/// The financial report as a document of headings and lines.
pub fn finance_report_document(report: &FinanceReport, generated_at: DateTime<Utc>) -> LegalDocument {
    let period = match (report.from, report.to) {
        (Some(from), Some(to)) => format!(
            "Período: {} a {}",
            from.format("%d/%m/%Y"),
            to.format("%d/%m/%Y")
        ),
        (Some(from), None) => format!("Período: a partir de {}", from.format("%d/%m/%Y")),
        (None, Some(to)) => format!("Período: até {}", to.format("%d/%m/%Y")),
        (None, None) => "Período: todo o histórico".to_string(),
    };

    LegalDocument {
        file_name: FINANCE_REPORT_FILE,
        blocks: vec![
            Block::Title("RELATÓRIO FINANCEIRO".to_string()),
            Block::Paragraph(period),
            Block::Paragraph(format!(
                "Gerado em {}",
                generated_at.format("%d/%m/%Y %H:%M UTC")
            )),
            Block::Space(1.0),
            Block::Heading("Movimentações".to_string()),
            Block::Paragraph(format!("Lançamentos no período: {}", report.movement_count)),
            Block::Paragraph(format!("Total de entradas: {}", money(report.total_inflow))),
            Block::Paragraph(format!("Total de saídas: {}", money(report.total_outflow))),
            Block::Paragraph(format!("Lucro líquido: {}", money(report.net_profit))),
            Block::Space(1.0),
            Block::Heading("Carteira".to_string()),
            Block::Paragraph(format!(
                "RPVs pendentes: {}",
                money(report.pending_rpv_value)
            )),
            Block::Paragraph(format!("Processos ativos: {}", report.active_cases)),
        ],
    }
}

pub fn render_finance_report(report: &FinanceReport, generated_at: DateTime<Utc>) -> Vec<u8> {
    render_document(&finance_report_document(report, generated_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn output_is_a_complete_pdf() {
        let doc = LegalDocument {
            file_name: "x.pdf",
            blocks: vec![
                Block::Title("PROCURAÇÃO".to_string()),
                Block::Paragraph("Texto (com parênteses) e barra \\".to_string()),
                Block::Rule,
            ],
        };
        let bytes = render_document(&doc);
        let text = as_text(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("\\(com par"));
    }

    #[test]
    fn latin1_characters_are_single_bytes() {
        assert_eq!(encode_text("ção"), vec![0xE7, 0xE3, b'o']);
        assert_eq!(encode_text("nº"), vec![b'n', 0xBA]);
        assert_eq!(encode_text("€"), vec![b'?']);
    }

    #[test]
    fn wrap_respects_the_width() {
        let lines = wrap("um dois tres quatro cinco seis", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "um dois tres quatro cinco seis");
    }

    #[test]
    fn long_documents_span_several_pages() {
        let doc = LegalDocument {
            file_name: "long.pdf",
            blocks: (0..200)
                .map(|i| Block::Paragraph(format!("Linha {}", i)))
                .collect(),
        };
        let text = as_text(&render_document(&doc));
        let count = text
            .split("/Count ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap();
        assert!(count > 1);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = render_document(&LegalDocument {
            file_name: "x.pdf",
            blocks: vec![Block::Paragraph("Olá".to_string())],
        });
        let text = as_text(&bytes);
        let xref = text.find("xref\n").unwrap();
        let first_entry = text[xref..].lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(bytes[offset..].starts_with(b"1 0 obj"));
    }
}
