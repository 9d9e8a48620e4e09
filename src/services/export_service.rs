use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::middleware::error_handling::Result;
use crate::models::inquiry::{Inquiry, InquiryStatus, ServiceType};

/// Display format for submission timestamps across staff views, the CSV
/// export and the summary report (en-US short form, UTC).
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// CSV export of the full collection. Every field is wrapped in double
/// quotes with internal quotes doubled, so the output survives commas,
/// quotes and newlines in visitor-supplied text.
pub fn inquiries_to_csv(inquiries: &[Inquiry]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record([
            "ID",
            "Full Name",
            "Email",
            "Phone",
            "Service Type",
            "Status",
            "Submitted",
            "Message",
        ])
        .map_err(anyhow::Error::from)?;

    for inquiry in inquiries {
        writer
            .write_record([
                inquiry.id.as_str(),
                inquiry.full_name.as_str(),
                inquiry.email.as_str(),
                inquiry.phone.as_str(),
                inquiry.service_type.as_str(),
                inquiry.status.as_str(),
                &format_timestamp(inquiry.created_at),
                inquiry.message.as_str(),
            ])
            .map_err(anyhow::Error::from)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::Error::from(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| anyhow::Error::from(err).into())
}

/// Plain-text summary: counts grouped by status and by service type (zeros
/// included), plus oldest and newest submission timestamps.
pub fn summary_report(inquiries: &[Inquiry]) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "Inquiry Summary");
    let _ = writeln!(report, "===============");
    let _ = writeln!(report, "Total inquiries: {}", inquiries.len());
    let _ = writeln!(report);

    let _ = writeln!(report, "By status:");
    for status in InquiryStatus::ALL {
        let count = inquiries.iter().filter(|i| i.status == status).count();
        let _ = writeln!(report, "  {}: {}", status.label(), count);
    }
    let _ = writeln!(report);

    let _ = writeln!(report, "By service type:");
    for service in ServiceType::ALL {
        let count = inquiries
            .iter()
            .filter(|i| i.service_type == service)
            .count();
        let _ = writeln!(report, "  {}: {}", service, count);
    }
    let _ = writeln!(report);

    let oldest = inquiries.iter().map(|i| i.created_at).min();
    let newest = inquiries.iter().map(|i| i.created_at).max();
    let _ = writeln!(
        report,
        "Oldest submission: {}",
        oldest.map_or_else(|| "N/A".to_string(), format_timestamp)
    );
    let _ = writeln!(
        report,
        "Newest submission: {}",
        newest.map_or_else(|| "N/A".to_string(), format_timestamp)
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_inquiry(id: &str, message: &str) -> Inquiry {
        Inquiry {
            id: id.to_string(),
            inquiry_number: None,
            full_name: "Jane Visitor".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
            service_type: ServiceType::GeneralInquiry,
            message: message.to_string(),
            status: InquiryStatus::Pending,
            notes: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 2, 4, 15, 30, 0).unwrap(),
            last_updated: None,
            assigned_to: None,
        }
    }

    #[test]
    fn timestamps_use_the_short_display_form() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 4, 15, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "Feb 4, 2026, 03:30 PM");
    }

    #[test]
    fn every_csv_field_is_quoted() {
        let inquiries = vec![sample_inquiry("abc123", "plain message")];
        let csv = inquiries_to_csv(&inquiries).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("\"ID\",\"Full Name\""));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"abc123\",\"Jane Visitor\""));
    }

    #[test]
    fn quotes_and_commas_survive_a_round_trip() {
        let tricky = r#"She said "hello, there" and left"#;
        let inquiries = vec![sample_inquiry("abc123", tricky)];
        let csv = inquiries_to_csv(&inquiries).unwrap();

        // Internal quotes must be doubled on the wire.
        assert!(csv.contains(r#""She said ""hello, there"" and left""#));

        let mut reader = csv::ReaderBuilder::new().from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[7], tricky);
    }

    #[test]
    fn report_counts_cover_all_buckets() {
        let mut second = sample_inquiry("def456", "another message");
        second.status = InquiryStatus::Approved;
        second.service_type = ServiceType::MarriageCounseling;
        second.created_at = Utc.with_ymd_and_hms(2026, 2, 6, 9, 0, 0).unwrap();
        let inquiries = vec![sample_inquiry("abc123", "first"), second];

        let report = summary_report(&inquiries);
        assert!(report.contains("Total inquiries: 2"));
        assert!(report.contains("  Pending: 1"));
        assert!(report.contains("  Approved: 1"));
        assert!(report.contains("  Rejected: 0"));
        assert!(report.contains("  Marriage Counseling: 1"));
        assert!(report.contains("  Other: 0"));
        assert!(report.contains("Oldest submission: Feb 4, 2026, 03:30 PM"));
        assert!(report.contains("Newest submission: Feb 6, 2026, 09:00 AM"));
    }

    #[test]
    fn empty_collection_reports_na_timestamps() {
        let report = summary_report(&[]);
        assert!(report.contains("Total inquiries: 0"));
        assert!(report.contains("Oldest submission: N/A"));
        assert!(report.contains("Newest submission: N/A"));
    }
}
