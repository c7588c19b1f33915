use crate::error::Result;
use crate::models::application::{ApplicationRecord, ApplicationStatus, PaymentStatus};
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook from the applications list.
    pub fn generate_applications_xlsx(applications: &[ApplicationRecord]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Applications")?;

        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let status_received = Color::RGB(0x3B82F6);
        let status_review = Color::RGB(0xF59E0B);
        let status_approved = Color::RGB(0x10B981);
        let status_changes = Color::RGB(0xEF4444);
        let status_other = Color::RGB(0x64748B);

        let columns = [
            ("#", 6.0),
            ("Name", 28.0),
            ("Email", 30.0),
            ("Phone", 18.0),
            ("Position", 22.0),
            ("Status", 20.0),
            ("Uploads", 10.0),
            ("Rejected documents", 28.0),
            ("Pending re-uploads", 20.0),
            ("Payment", 12.0),
            ("Created", 20.0),
            ("Updated", 20.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(0, 28)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, i as u16, *name, &header_format)?;
        }

        for (idx, application) in applications.iter().enumerate() {
            let row = 1 + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(
                row,
                1,
                &application.personal_info.full_name,
                &base_fmt.clone().set_bold(),
            )?;
            worksheet.write_string_with_format(row, 2, &application.email, &base_fmt)?;
            worksheet.write_string_with_format(row, 3, &application.personal_info.phone, &base_fmt)?;
            worksheet.write_string_with_format(
                row,
                4,
                &application.job_preferences.position,
                &base_fmt,
            )?;

            let status_color = match application.status {
                ApplicationStatus::Received => status_received,
                ApplicationStatus::Review => status_review,
                ApplicationStatus::DocumentsApproved => status_approved,
                ApplicationStatus::ChangesRequired | ApplicationStatus::ReuploadRequested => {
                    status_changes
                }
                _ => status_other,
            };
            let status_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(status_color)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 5, application.status.as_str(), &status_fmt)?;

            worksheet.write_number_with_format(
                row,
                6,
                application.upload_count as f64,
                &center_fmt,
            )?;

            let rejected = application
                .rejected_kinds()
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            worksheet.write_string_with_format(
                row,
                7,
                if rejected.is_empty() { "—" } else { &rejected },
                &base_fmt,
            )?;

            let pending = application
                .reupload_requests
                .iter()
                .filter(|r| r.is_pending())
                .count();
            worksheet.write_number_with_format(row, 8, pending as f64, &center_fmt)?;

            let payment = match application.payment_status {
                PaymentStatus::Paid => "paid",
                PaymentStatus::Pending => "pending",
            };
            worksheet.write_string_with_format(row, 9, payment, &center_fmt)?;

            worksheet.write_string_with_format(
                row,
                10,
                &application.created_at.format("%d.%m.%Y %H:%M").to_string(),
                &center_fmt,
            )?;
            worksheet.write_string_with_format(
                row,
                11,
                &application.updated_at.format("%d.%m.%Y %H:%M").to_string(),
                &center_fmt,
            )?;
        }

        worksheet.set_freeze_panes(1, 0)?;
        if !applications.is_empty() {
            worksheet.autofilter(0, 0, applications.len() as u32, (columns.len() - 1) as u16)?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
