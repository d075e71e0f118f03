use chrono::{DateTime, Utc};
use rust_xlsxwriter::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::question::QuestionKind;
use crate::models::summary::EvaluationSummary;
use crate::services::presenter_service::PresenterService;
use crate::services::report_layout;

/// Flat JSON projection of a summary, one row per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JsonReport {
    pub title: String,
    pub evaluation_id: i64,
    pub subject_id: i64,
    pub subject_name: Option<String>,
    pub total_students: u32,
    pub overall_average: f64,
    pub overall_label: String,
    pub exported_at: DateTime<Utc>,
    pub questions: Vec<JsonReportQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JsonReportQuestion {
    pub question_id: i64,
    pub question: String,
    pub category: Option<String>,
    pub kind: QuestionKind,
    pub average_rating: f64,
    pub total_responses: u32,
    pub rating_5: u32,
    pub rating_4: u32,
    pub rating_3: u32,
    pub rating_2: u32,
    pub rating_1: u32,
    #[serde(default)]
    pub remarks: Vec<String>,
}

/// A rendered download: bytes plus what the HTTP layer needs to serve it.
pub struct ExportFile {
    pub content_type: &'static str,
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Json => "application/json",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

pub struct ExportService;

impl ExportService {
    pub fn export(summary: &EvaluationSummary, format: ExportFormat, title: &str) -> Result<ExportFile> {
        let bytes = match format {
            ExportFormat::Pdf => Self::generate_pdf(summary, title)?,
            ExportFormat::Json => serde_json::to_vec_pretty(&Self::json_report(summary, title))?,
            ExportFormat::Xlsx => Self::generate_xlsx(summary, title)?,
        };
        tracing::info!(
            evaluation_id = summary.evaluation_id,
            format = format.extension(),
            size = bytes.len(),
            "evaluation report exported"
        );
        Ok(ExportFile {
            content_type: format.content_type(),
            filename: format!(
                "evaluation_{}_{}.{}",
                summary.evaluation_id,
                crate::utils::time::file_stamp(Utc::now()),
                format.extension()
            ),
            bytes,
        })
    }

    pub fn json_report(summary: &EvaluationSummary, title: &str) -> JsonReport {
        JsonReport {
            title: title.to_string(),
            evaluation_id: summary.evaluation_id,
            subject_id: summary.subject_id,
            subject_name: summary.subject_name.clone(),
            total_students: summary.total_students,
            overall_average: summary.overall_average,
            overall_label: PresenterService::rating_label(summary.overall_average).to_string(),
            exported_at: Utc::now(),
            questions: summary
                .questions
                .iter()
                .map(|q| {
                    let b = &q.ratings_breakdown;
                    JsonReportQuestion {
                        question_id: q.question_id,
                        question: q.text.clone(),
                        category: q.category.clone(),
                        kind: q.kind,
                        average_rating: q.average_rating,
                        total_responses: q.total_responses,
                        rating_5: b.count(5),
                        rating_4: b.count(4),
                        rating_3: b.count(3),
                        rating_2: b.count(2),
                        rating_1: b.count(1),
                        remarks: q.remarks.clone(),
                    }
                })
                .collect(),
        }
    }

    pub fn generate_pdf(summary: &EvaluationSummary, title: &str) -> Result<Vec<u8>> {
        let layout = report_layout::layout(summary, title);
        tracing::debug!(
            evaluation_id = summary.evaluation_id,
            pages = layout.pages.len(),
            "report laid out"
        );
        report_layout::render_pdf(&layout, title)
    }

    /// Workbook with a per-question sheet and, when present, a remarks sheet.
    pub fn generate_xlsx(summary: &EvaluationSummary, title: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        Self::write_questions_sheet(workbook.add_worksheet(), summary, title)?;
        if summary.remarks_questions().any(|q| !q.remarks.is_empty()) {
            Self::write_remarks_sheet(workbook.add_worksheet(), summary)?;
        }
        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }

    fn write_questions_sheet(
        worksheet: &mut Worksheet,
        summary: &EvaluationSummary,
        title: &str,
    ) -> Result<()> {
        worksheet.set_name("Questions")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let alt_row = Color::RGB(0xF8FAFC);
        let border_color = Color::RGB(0xE2E8F0);
        let high = Color::RGB(0x10B981);
        let mid = Color::RGB(0xF59E0B);
        let low = Color::RGB(0xEF4444);

        let columns = [
            ("№", 6.0),
            ("Question", 60.0),
            ("Category", 18.0),
            ("Average", 10.0),
            ("Rating", 14.0),
            ("Stars", 10.0),
            ("Responses", 11.0),
            ("5", 7.0),
            ("4", 7.0),
            ("3", 7.0),
            ("2", 7.0),
            ("1", 7.0),
        ];
        let last_col = (columns.len() - 1) as u16;
        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 36)?;
        worksheet.merge_range(0, 0, 0, last_col, title, &title_format)?;

        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        let subject = summary
            .subject_name
            .clone()
            .unwrap_or_else(|| format!("Subject #{}", summary.subject_id));
        let subtitle = format!(
            "{}  •  Evaluation #{}  •  Students: {}  •  Overall: {:.1} ({})  •  Exported {}",
            subject,
            summary.evaluation_id,
            summary.total_students,
            summary.overall_average,
            PresenterService::rating_label(summary.overall_average),
            crate::utils::time::report_date(Utc::now()),
        );
        worksheet.set_row_height(1, 22)?;
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 2;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 3;
        for (idx, q) in summary.questions.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row } else { Color::White };
            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            worksheet.write_number_with_format(row, 0, q.question_id as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &q.text, &wrap_fmt)?;
            worksheet.write_string_with_format(row, 2, q.category.as_deref().unwrap_or("—"), &base_fmt)?;

            if q.kind == QuestionKind::Remarks {
                worksheet.write_string_with_format(row, 3, "—", &center_fmt)?;
                worksheet.write_string_with_format(row, 4, "Remarks", &center_fmt)?;
                worksheet.write_string_with_format(row, 5, "—", &center_fmt)?;
                worksheet.write_number_with_format(row, 6, q.total_responses as f64, &center_fmt)?;
                for col in 7..=last_col {
                    worksheet.write_string_with_format(row, col, "—", &center_fmt)?;
                }
                continue;
            }

            let avg_color = if q.average_rating >= 4.0 {
                high
            } else if q.average_rating >= 2.5 {
                mid
            } else {
                low
            };
            let avg_fmt = center_fmt
                .clone()
                .set_bold()
                .set_font_color(avg_color)
                .set_num_format("0.0");
            worksheet.write_number_with_format(row, 3, q.average_rating, &avg_fmt)?;
            worksheet.write_string_with_format(
                row,
                4,
                PresenterService::rating_label(q.average_rating),
                &center_fmt,
            )?;
            worksheet.write_string_with_format(
                row,
                5,
                &PresenterService::stars_text(q.average_rating),
                &center_fmt,
            )?;
            worksheet.write_number_with_format(row, 6, q.total_responses as f64, &center_fmt)?;
            for (offset, (_, count)) in q.ratings_breakdown.descending().enumerate() {
                worksheet.write_number_with_format(row, 7 + offset as u16, count as f64, &center_fmt)?;
            }
        }

        let total_row = data_start_row + summary.questions.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let rated = summary.rated_questions().count();
        worksheet.merge_range(
            total_row,
            0,
            total_row,
            last_col,
            &format!(
                "Overall average {:.1} across {} rated question(s), {} student(s)",
                summary.overall_average, rated, summary.total_students
            ),
            &summary_fmt,
        )?;

        worksheet.set_freeze_panes(3, 0)?;
        Ok(())
    }

    fn write_remarks_sheet(worksheet: &mut Worksheet, summary: &EvaluationSummary) -> Result<()> {
        worksheet.set_name("Remarks")?;
        worksheet.set_column_width(0, 10.0)?;
        worksheet.set_column_width(1, 100.0)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x0F172A));
        worksheet.write_string_with_format(0, 0, "Question", &header_format)?;
        worksheet.write_string_with_format(0, 1, "Remark", &header_format)?;

        let wrap_fmt = Format::new().set_text_wrap().set_align(FormatAlign::Top);
        let mut row = 1u32;
        for q in summary.remarks_questions() {
            for remark in &q.remarks {
                worksheet.write_number(row, 0, q.question_id as f64)?;
                worksheet.write_string_with_format(row, 1, remark, &wrap_fmt)?;
                row += 1;
            }
        }
        Ok(())
    }
}
