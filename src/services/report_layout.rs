//! Fixed A4 layout of the evaluation report and its PDF rendering.
//!
//! Layout and rendering are separate so pagination can be checked without
//! producing PDF bytes. Coordinates are millimetres from the bottom-left
//! corner, as in PDF.

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};

use crate::error::Result;
use crate::models::question::QuestionKind;
use crate::models::summary::{EvaluationSummary, QuestionSummary};
use crate::services::presenter_service::PresenterService;
use crate::utils::math::{percentage, round1};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;
const FOOTER_Y_MM: f32 = 10.0;
const LINE_MM: f32 = 6.0;
const BAR_ROW_MM: f32 = 6.0;
const BLOCK_GAP_MM: f32 = 6.0;
const BAR_MAX_WIDTH_MM: f32 = 100.0;
const WRAP_CHARS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shade {
    /// Filled part of a rating bar.
    Accent,
    /// Background track of a rating bar.
    Track,
    /// Horizontal separator.
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        content: String,
    },
    Box {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        shade: Shade,
    },
}

impl Element {
    pub fn y(&self) -> f32 {
        match self {
            Element::Text { y, .. } | Element::Box { y, .. } => *y,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
    pub footer: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<Page>,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    /// Starts a new page unless `height` still fits above the bottom margin.
    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN_MM {
            self.pages.push(Page::default());
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn text(&mut self, x: f32, size: f32, bold: bool, content: impl Into<String>) {
        let y = self.y;
        self.push(Element::Text {
            x,
            y,
            size,
            bold,
            content: content.into(),
        });
        self.y -= LINE_MM;
    }

    fn rule(&mut self) {
        let y = self.y + 2.0;
        self.push(Element::Box {
            x: MARGIN_MM,
            y,
            width: PAGE_WIDTH_MM - 2.0 * MARGIN_MM,
            height: 0.3,
            shade: Shade::Rule,
        });
        self.y -= 2.0;
    }
}

pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn question_block_height(q: &QuestionSummary) -> f32 {
    let title = wrap_text(&format!("{}. {}", q.question_id, q.text), WRAP_CHARS).len() as f32;
    let body = match q.kind {
        QuestionKind::Rated => LINE_MM + 5.0 * BAR_ROW_MM,
        // Remarks paginate line by line, only the heading must fit.
        QuestionKind::Remarks => LINE_MM,
    };
    title * LINE_MM + body + BLOCK_GAP_MM
}

pub fn layout(summary: &EvaluationSummary, title: &str) -> ReportLayout {
    let mut cursor = Cursor::new();

    cursor.text(MARGIN_MM, 18.0, true, title);
    cursor.y -= 2.0;
    let subject = summary
        .subject_name
        .clone()
        .unwrap_or_else(|| format!("Subject #{}", summary.subject_id));
    cursor.text(MARGIN_MM, 11.0, false, format!("Subject: {}", subject));
    cursor.text(
        MARGIN_MM,
        11.0,
        false,
        format!("Evaluation #{}", summary.evaluation_id),
    );
    if let Some(at) = summary.generated_at {
        cursor.text(
            MARGIN_MM,
            9.0,
            false,
            format!("Generated {}", crate::utils::time::report_date(at)),
        );
    }
    cursor.rule();
    cursor.y -= LINE_MM / 2.0;

    cursor.text(MARGIN_MM, 14.0, true, "Summary");
    cursor.text(
        MARGIN_MM,
        11.0,
        false,
        format!(
            "Overall average: {:.1} / 5 ({})",
            summary.overall_average,
            PresenterService::rating_label(summary.overall_average)
        ),
    );
    cursor.text(
        MARGIN_MM,
        11.0,
        false,
        format!("Students responded: {}", summary.total_students),
    );
    cursor.text(
        MARGIN_MM,
        11.0,
        false,
        format!("Questions: {}", summary.questions.len()),
    );
    cursor.rule();
    cursor.y -= LINE_MM / 2.0;

    for q in &summary.questions {
        cursor.ensure_space(question_block_height(q));
        for line in wrap_text(&format!("{}. {}", q.question_id, q.text), WRAP_CHARS) {
            cursor.text(MARGIN_MM, 11.0, true, line);
        }
        match q.kind {
            QuestionKind::Rated => layout_rated(&mut cursor, q),
            QuestionKind::Remarks => layout_remarks(&mut cursor, q),
        }
        cursor.y -= BLOCK_GAP_MM;
    }

    let total = cursor.pages.len();
    for (idx, page) in cursor.pages.iter_mut().enumerate() {
        page.footer = format!("Page {} of {}", idx + 1, total);
    }
    ReportLayout {
        pages: cursor.pages,
    }
}

fn layout_rated(cursor: &mut Cursor, q: &QuestionSummary) {
    cursor.text(
        MARGIN_MM + 4.0,
        10.0,
        false,
        format!(
            "Average {:.1} / 5 ({})   Responses: {}",
            q.average_rating,
            PresenterService::rating_label(q.average_rating),
            q.total_responses
        ),
    );
    let denominator = if q.total_responses > 0 {
        q.total_responses
    } else {
        q.ratings_breakdown.total()
    };
    for (rating, count) in q.ratings_breakdown.descending() {
        let pct = round1(percentage(count, denominator));
        let y = cursor.y;
        let bar_x = MARGIN_MM + 20.0;
        cursor.push(Element::Text {
            x: MARGIN_MM + 4.0,
            y,
            size: 9.0,
            bold: false,
            content: format!("{} star", rating),
        });
        cursor.push(Element::Box {
            x: bar_x,
            y: y - 0.5,
            width: BAR_MAX_WIDTH_MM,
            height: 3.5,
            shade: Shade::Track,
        });
        if count > 0 {
            cursor.push(Element::Box {
                x: bar_x,
                y: y - 0.5,
                width: (BAR_MAX_WIDTH_MM * pct as f32 / 100.0).clamp(0.5, BAR_MAX_WIDTH_MM),
                height: 3.5,
                shade: Shade::Accent,
            });
        }
        cursor.push(Element::Text {
            x: bar_x + BAR_MAX_WIDTH_MM + 4.0,
            y,
            size: 9.0,
            bold: false,
            content: format!("{} ({:.1}%)", count, pct),
        });
        cursor.y -= BAR_ROW_MM;
    }
}

fn layout_remarks(cursor: &mut Cursor, q: &QuestionSummary) {
    if q.remarks.is_empty() {
        cursor.text(MARGIN_MM + 4.0, 10.0, false, "No remarks submitted.");
        return;
    }
    for remark in &q.remarks {
        for (i, line) in wrap_text(remark, WRAP_CHARS - 6).into_iter().enumerate() {
            cursor.ensure_space(LINE_MM);
            let content = if i == 0 { format!("- {}", line) } else { format!("  {}", line) };
            cursor.text(MARGIN_MM + 4.0, 10.0, false, content);
        }
    }
}

fn shade_color(shade: Shade) -> Color {
    let (r, g, b) = match shade {
        Shade::Accent => (0.39, 0.40, 0.95),
        Shade::Track => (0.89, 0.91, 0.94),
        Shade::Rule => (0.58, 0.64, 0.72),
    };
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.06, 0.09, 0.16, None))
}

fn draw_page(layer: &PdfLayerReference, page: &Page, regular: &IndirectFontRef, bold: &IndirectFontRef) {
    for element in &page.elements {
        match element {
            Element::Text {
                x,
                y,
                size,
                bold: is_bold,
                content,
            } => {
                layer.set_fill_color(black());
                let font = if *is_bold { bold } else { regular };
                layer.use_text(content.as_str(), *size, Mm(*x), Mm(*y), font);
            }
            Element::Box {
                x,
                y,
                width,
                height,
                shade,
            } => {
                layer.set_fill_color(shade_color(*shade));
                layer.add_rect(Rect::new(Mm(*x), Mm(*y), Mm(*x + *width), Mm(*y + *height)));
            }
        }
    }
    layer.set_fill_color(black());
    layer.use_text(
        page.footer.as_str(),
        8.0,
        Mm(PAGE_WIDTH_MM - MARGIN_MM - 25.0),
        Mm(FOOTER_Y_MM),
        regular,
    );
}

pub fn render_pdf(report: &ReportLayout, title: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Page 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (idx, page) in report.pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}", idx + 1),
            );
            doc.get_page(p).get_layer(l)
        };
        draw_page(&layer, page, &regular, &bold);
    }

    Ok(doc.save_to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::summary::RatingsBreakdown;

    fn summary(questions: usize) -> EvaluationSummary {
        EvaluationSummary {
            evaluation_id: 5,
            subject_id: 12,
            subject_name: Some("Prof. Santos".into()),
            total_students: 30,
            overall_average: 4.2,
            questions: (1..=questions as i64)
                .map(|id| QuestionSummary {
                    question_id: id,
                    text: "The instructor explains the lesson objectives at the start of every class session and relates them to previous topics".into(),
                    category: None,
                    kind: QuestionKind::Rated,
                    average_rating: 4.2,
                    total_responses: 30,
                    ratings_breakdown: [(5, 12), (4, 12), (3, 6)].into_iter().collect::<RatingsBreakdown>(),
                    remarks: Vec::new(),
                })
                .collect(),
            generated_at: None,
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn short_report_fits_one_page() {
        let report = layout(&summary(2), "Report");
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].footer, "Page 1 of 1");
    }

    #[test]
    fn long_report_paginates_above_margin() {
        let report = layout(&summary(20), "Report");
        assert!(report.pages.len() > 1);
        for page in &report.pages {
            assert!(!page.elements.is_empty());
            for el in &page.elements {
                assert!(el.y() >= MARGIN_MM - 1.0, "element below margin: {:?}", el);
                assert!(el.y() <= PAGE_HEIGHT_MM - MARGIN_MM);
            }
        }
        let last = report.pages.len();
        assert_eq!(report.pages[last - 1].footer, format!("Page {} of {}", last, last));
    }

    #[test]
    fn question_blocks_are_never_split() {
        let report = layout(&summary(20), "Report");
        for page in &report.pages[1..] {
            // Continuation pages start with a question heading.
            match &page.elements[0] {
                Element::Text { bold, content, .. } => {
                    assert!(*bold);
                    assert!(content.contains(". The instructor"));
                }
                other => panic!("unexpected first element {:?}", other),
            }
            let bars = page
                .elements
                .iter()
                .filter(|e| matches!(e, Element::Box { shade: Shade::Track, .. }))
                .count();
            assert_eq!(bars % 5, 0);
        }
    }

    #[test]
    fn bars_stay_within_track_when_counts_exceed_responses() {
        let mut s = summary(1);
        s.questions[0].total_responses = 2;
        let report = layout(&s, "Report");
        let widest = report.pages[0]
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Box { width, shade: Shade::Accent, .. } => Some(*width),
                _ => None,
            })
            .fold(0.0_f32, f32::max);
        assert_eq!(widest, BAR_MAX_WIDTH_MM);
    }

    #[test]
    fn layout_leaves_summary_untouched() {
        let s = summary(3);
        let before = s.clone();
        let _ = layout(&s, "Report");
        assert_eq!(s, before);
    }

    #[test]
    fn renders_pdf_bytes() {
        let report = layout(&summary(12), "Report");
        let bytes = render_pdf(&report, "Report").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
