//! Смета в PDF для вложения в письмо.
//!
//! Документ собирается из тех же строк, что и HTML-письмо: сведения о
//! клиенте, параметры сметы, итог, примечания и условия. Используются
//! встроенные шрифты PDF, поэтому текст приводится к латинице.

use commons::errors::QuoteError;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
/// Отступ колонки значений в таблице.
const VALUE_COLUMN_MM: f32 = 85.0;
const LINE_HEIGHT_MM: f32 = 6.5;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const TEXT_SIZE: f32 = 10.0;

/// Строка документа.
#[derive(Debug, Clone, PartialEq)]
pub enum DocLine {
    /// Заголовок раздела.
    Heading(String),
    /// Строка таблицы: подпись и значение.
    Row(String, String),
    /// Абзац или пункт списка.
    Text(String),
    /// Итоговая сумма.
    Total(String),
}

/// Содержимое PDF-сметы.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteDocument {
    pub title: String,
    pub lines: Vec<DocLine>,
}

/// Страница, на которую сейчас выводится текст, и позиция курсора.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor<'_> {
    /// Сдвинуть курсор на `height`, начав новую страницу при необходимости.
    fn advance(&mut self, height: f32) {
        if self.y - height < MARGIN_MM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "text");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.y -= height;
    }

    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer
            .use_text(pdf_text(text), size, Mm(x), Mm(self.y), font);
    }
}

impl QuoteDocument {
    /// Сформировать PDF-файл.
    pub fn render(&self) -> Result<Vec<u8>, QuoteError> {
        let (doc, page, layer) = PdfDocument::new(
            pdf_text(&self.title),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "text".to_string(),
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;

        let mut cursor = Cursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        };
        cursor.text(&self.title, TITLE_SIZE, MARGIN_MM, &bold);
        cursor.advance(LINE_HEIGHT_MM);

        for line in &self.lines {
            match line {
                DocLine::Heading(text) => {
                    cursor.advance(LINE_HEIGHT_MM * 1.5);
                    cursor.text(text, HEADING_SIZE, MARGIN_MM, &bold);
                }
                DocLine::Row(label, value) => {
                    cursor.advance(LINE_HEIGHT_MM);
                    cursor.text(label, TEXT_SIZE, MARGIN_MM, &bold);
                    cursor.text(value, TEXT_SIZE, VALUE_COLUMN_MM, &regular);
                }
                DocLine::Text(text) => {
                    cursor.advance(LINE_HEIGHT_MM);
                    cursor.text(text, TEXT_SIZE, MARGIN_MM, &regular);
                }
                DocLine::Total(text) => {
                    cursor.advance(LINE_HEIGHT_MM * 1.5);
                    cursor.text(text, HEADING_SIZE, MARGIN_MM, &bold);
                }
            }
        }

        doc.save_to_bytes().map_err(pdf_err)
    }
}

fn pdf_err(err: printpdf::Error) -> QuoteError {
    QuoteError::notify_err(format!("формирование PDF: {err}"))
}

/// Привести текст к набору символов встроенных шрифтов PDF.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' | 'Ü' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            '²' => '2',
            '·' => '.',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(rows: usize) -> QuoteDocument {
        let mut lines = vec![DocLine::Heading("Customer".to_string())];
        for i in 0..rows {
            lines.push(DocLine::Row(format!("Item {i}"), "1,000.00".to_string()));
        }
        lines.push(DocLine::Total("Total: USD 10,500.00".to_string()));
        lines.push(DocLine::Text("- Quote valid for 30 days".to_string()));
        QuoteDocument {
            title: "Construction quote".to_string(),
            lines,
        }
    }

    #[test]
    fn renders_pdf_file() {
        let bytes = document(10).render().unwrap();
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_document_spans_pages() {
        let short = document(5).render().unwrap();
        let long = document(120).render().unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn text_is_folded_to_latin() {
        assert_eq!(pdf_text("Córdoba, 100 m²"), "Cordoba, 100 m2");
        assert_eq!(pdf_text("Ana Muñoz"), "Ana Munoz");
        assert_eq!(pdf_text("Иван"), "????");
        assert_eq!(pdf_text("a\tb"), "a?b");
    }
}
