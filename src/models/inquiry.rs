use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s\-\+\(\)]+$").unwrap());

#[derive(Debug, Error)]
#[error("unrecognized value: {0}")]
pub struct ParseEnumError(pub String);

/// The fixed catalog of services offered on the public contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "Marriage Counseling")]
    MarriageCounseling,
    #[serde(rename = "Pre-Marriage Counseling")]
    PreMarriageCounseling,
    #[serde(rename = "Marriage Registration")]
    MarriageRegistration,
    #[serde(rename = "General Inquiry")]
    GeneralInquiry,
    #[serde(rename = "Other")]
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::MarriageCounseling,
        ServiceType::PreMarriageCounseling,
        ServiceType::MarriageRegistration,
        ServiceType::GeneralInquiry,
        ServiceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::MarriageCounseling => "Marriage Counseling",
            ServiceType::PreMarriageCounseling => "Pre-Marriage Counseling",
            ServiceType::MarriageRegistration => "Marriage Registration",
            ServiceType::GeneralInquiry => "General Inquiry",
            ServiceType::Other => "Other",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| ParseEnumError(s.to_string()))
    }
}

/// Lifecycle status of an inquiry. `Pending` is assigned exactly once at
/// creation and is never a legal transition target afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InquiryStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Completed,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 5] = [
        InquiryStatus::Pending,
        InquiryStatus::InReview,
        InquiryStatus::Approved,
        InquiryStatus::Rejected,
        InquiryStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Pending => "pending",
            InquiryStatus::InReview => "in-review",
            InquiryStatus::Approved => "approved",
            InquiryStatus::Rejected => "rejected",
            InquiryStatus::Completed => "completed",
        }
    }

    /// Human-facing label as shown in staff views and the summary report.
    pub fn label(&self) -> &'static str {
        match self {
            InquiryStatus::Pending => "Pending",
            InquiryStatus::InReview => "In review",
            InquiryStatus::Approved => "Approved",
            InquiryStatus::Rejected => "Rejected",
            InquiryStatus::Completed => "Completed",
        }
    }

    /// The status transition guard table. `rejected` and `completed` are
    /// dead ends; `completed` is reachable only from `approved`.
    pub fn can_transition_to(self, target: InquiryStatus) -> bool {
        use InquiryStatus::*;
        match target {
            Approved | Rejected => matches!(self, Pending | InReview),
            InReview => matches!(self, Pending),
            Completed => matches!(self, Approved),
            Pending => false,
        }
    }

    /// Every status a given target may legally be reached from.
    pub fn allowed_sources(target: InquiryStatus) -> Vec<InquiryStatus> {
        InquiryStatus::ALL
            .into_iter()
            .filter(|current| current.can_transition_to(target))
            .collect()
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InquiryStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InquiryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Inquiry {
    pub id: String,
    pub inquiry_number: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub service_type: ServiceType,
    pub message: String,
    pub status: InquiryStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
}

fn validation_error(code: &'static str, message: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_string().into());
    error
}

fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.trim().is_empty() {
        return Err(validation_error("required", "Full name is required"));
    }
    if full_name.trim().chars().count() < 2 {
        return Err(validation_error("length", "Name must be at least 2 characters"));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        return Err(validation_error("required", "Phone number is required"));
    }
    if !PHONE_RE.is_match(phone.trim()) {
        return Err(validation_error("format", "Please enter a valid phone number"));
    }
    Ok(())
}

fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        return Err(validation_error("required", "Message is required"));
    }
    if message.trim().chars().count() < 10 {
        return Err(validation_error("length", "Message must be at least 10 characters"));
    }
    Ok(())
}

/// Visitor submission from the public contact form. Field rules mirror the
/// form's inline validation; nothing invalid reaches storage.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInquiryRequest {
    #[validate(custom(function = validate_full_name))]
    pub full_name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = validate_phone))]
    pub phone: String,
    pub service_type: ServiceType,
    #[validate(custom(function = validate_message))]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: InquiryStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNotesRequest {
    #[validate(length(max = 10000, message = "Notes too long"))]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryResponse {
    pub id: String,
    pub display_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiry_number: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub service_type: ServiceType,
    pub message: String,
    pub status: InquiryStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl From<Inquiry> for InquiryResponse {
    fn from(inquiry: Inquiry) -> Self {
        let display_number = display_number(&inquiry.id, inquiry.inquiry_number);
        Self {
            id: inquiry.id,
            display_number,
            inquiry_number: inquiry.inquiry_number,
            full_name: inquiry.full_name,
            email: inquiry.email,
            phone: inquiry.phone,
            service_type: inquiry.service_type,
            message: inquiry.message,
            status: inquiry.status,
            notes: inquiry.notes,
            created_at: inquiry.created_at,
            last_updated: inquiry.last_updated,
            assigned_to: inquiry.assigned_to,
        }
    }
}

/// Human-facing inquiry number. An explicit stored ordinal always wins;
/// otherwise the last 6 characters of the document id are read as a base-36
/// integer, falling back to the last 4 raw characters when that parse fails.
/// Cosmetic only: never persisted, never used for lookup or ordering.
pub fn display_number(id: &str, inquiry_number: Option<i32>) -> String {
    if let Some(number) = inquiry_number {
        return number.to_string();
    }
    let chars: Vec<char> = id.chars().collect();
    let chunk: String = chars[chars.len().saturating_sub(6)..].iter().collect();
    match i64::from_str_radix(&chunk, 36) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => chars[chars.len().saturating_sub(4)..].iter().collect(),
    }
}

/// Dashboard filter: exact match per dimension, `None` meaning "all", both
/// dimensions combined with AND. Pure; preserves input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InquiryFilter {
    pub service_type: Option<ServiceType>,
    pub status: Option<InquiryStatus>,
}

impl InquiryFilter {
    /// Builds a filter from raw query values, where absence or the literal
    /// `all` leaves a dimension unconstrained.
    pub fn from_params(
        service_type: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self, ParseEnumError> {
        let service_type = match service_type {
            None | Some("all") => None,
            Some(raw) => Some(raw.parse()?),
        };
        let status = match status {
            None | Some("all") => None,
            Some(raw) => Some(raw.parse()?),
        };
        Ok(Self { service_type, status })
    }

    pub fn matches(&self, inquiry: &Inquiry) -> bool {
        let service_ok = self
            .service_type
            .map_or(true, |service| inquiry.service_type == service);
        let status_ok = self.status.map_or(true, |status| inquiry.status == status);
        service_ok && status_ok
    }

    pub fn apply(&self, inquiries: Vec<Inquiry>) -> Vec<Inquiry> {
        inquiries
            .into_iter()
            .filter(|inquiry| self.matches(inquiry))
            .collect()
    }
}

/// Summary counts shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InquiryStats {
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub completed: usize,
}

impl InquiryStats {
    pub fn tally(inquiries: &[Inquiry]) -> Self {
        let count = |status: InquiryStatus| {
            inquiries
                .iter()
                .filter(|inquiry| inquiry.status == status)
                .count()
        };
        Self {
            total: inquiries.len(),
            pending: count(InquiryStatus::Pending),
            in_review: count(InquiryStatus::InReview),
            approved: count(InquiryStatus::Approved),
            rejected: count(InquiryStatus::Rejected),
            completed: count(InquiryStatus::Completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_inquiry(id: &str, service_type: ServiceType, status: InquiryStatus) -> Inquiry {
        Inquiry {
            id: id.to_string(),
            inquiry_number: None,
            full_name: "Jane Visitor".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
            service_type,
            message: "I would like to schedule a session.".to_string(),
            status,
            notes: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 2, 4, 9, 30, 0).unwrap(),
            last_updated: None,
            assigned_to: None,
        }
    }

    #[test]
    fn guard_table_is_closed_over_all_pairs() {
        use InquiryStatus::*;
        let permitted = [
            (Pending, Approved),
            (Pending, Rejected),
            (Pending, InReview),
            (InReview, Approved),
            (InReview, Rejected),
            (Approved, Completed),
        ];
        for current in InquiryStatus::ALL {
            for target in InquiryStatus::ALL {
                let expected = permitted.contains(&(current, target));
                assert_eq!(
                    current.can_transition_to(target),
                    expected,
                    "{current} -> {target}"
                );
            }
        }
    }

    #[test]
    fn rejected_and_completed_are_dead_ends() {
        for target in InquiryStatus::ALL {
            assert!(!InquiryStatus::Rejected.can_transition_to(target));
            assert!(!InquiryStatus::Completed.can_transition_to(target));
        }
    }

    #[test]
    fn allowed_sources_inverts_the_guard() {
        assert_eq!(
            InquiryStatus::allowed_sources(InquiryStatus::Completed),
            vec![InquiryStatus::Approved]
        );
        assert_eq!(
            InquiryStatus::allowed_sources(InquiryStatus::Approved),
            vec![InquiryStatus::Pending, InquiryStatus::InReview]
        );
        assert!(InquiryStatus::allowed_sources(InquiryStatus::Pending).is_empty());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in InquiryStatus::ALL {
            assert_eq!(status.as_str().parse::<InquiryStatus>().unwrap(), status);
        }
        assert!("archived".parse::<InquiryStatus>().is_err());
    }

    #[test]
    fn service_type_round_trips_through_strings() {
        for service in ServiceType::ALL {
            assert_eq!(service.as_str().parse::<ServiceType>().unwrap(), service);
        }
        assert!("Taxes".parse::<ServiceType>().is_err());
    }

    #[test]
    fn display_number_prefers_stored_ordinal() {
        assert_eq!(display_number("abc123xyz789", Some(42)), "42");
    }

    #[test]
    fn display_number_derives_from_id_tail() {
        let expected = i64::from_str_radix("xyz789", 36).unwrap().to_string();
        assert_eq!(display_number("abc123xyz789", None), expected);
        // Deterministic: same id, same number.
        assert_eq!(display_number("abc123xyz789", None), expected);
    }

    #[test]
    fn display_number_falls_back_to_raw_tail() {
        assert_eq!(display_number("doc_#41!", None), "#41!");
    }

    #[test]
    fn display_number_handles_short_ids() {
        assert_eq!(display_number("7", None), "7");
        assert_eq!(display_number("", None), "");
    }

    #[test]
    fn filter_all_all_is_identity() {
        let inquiries = vec![
            sample_inquiry("a1", ServiceType::MarriageCounseling, InquiryStatus::Pending),
            sample_inquiry("b2", ServiceType::GeneralInquiry, InquiryStatus::Approved),
            sample_inquiry("c3", ServiceType::Other, InquiryStatus::Rejected),
        ];
        let filter = InquiryFilter::from_params(Some("all"), Some("all")).unwrap();
        let filtered = filter.apply(inquiries.clone());
        let ids: Vec<_> = filtered.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2", "c3"]);
    }

    #[test]
    fn filters_combine_with_and() {
        let inquiries = vec![
            sample_inquiry("a1", ServiceType::MarriageCounseling, InquiryStatus::Pending),
            sample_inquiry("b2", ServiceType::MarriageCounseling, InquiryStatus::Approved),
            sample_inquiry("c3", ServiceType::GeneralInquiry, InquiryStatus::Pending),
        ];
        let filter = InquiryFilter::from_params(Some("Marriage Counseling"), Some("pending")).unwrap();
        let filtered = filter.apply(inquiries);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a1");
    }

    #[test]
    fn filtering_is_idempotent() {
        let inquiries = vec![
            sample_inquiry("a1", ServiceType::MarriageCounseling, InquiryStatus::Pending),
            sample_inquiry("b2", ServiceType::GeneralInquiry, InquiryStatus::Approved),
        ];
        let filter = InquiryFilter::from_params(None, Some("approved")).unwrap();
        let once = filter.apply(inquiries);
        let twice = filter.apply(once.clone());
        let once_ids: Vec<_> = once.iter().map(|i| i.id.clone()).collect();
        let twice_ids: Vec<_> = twice.iter().map(|i| i.id.clone()).collect();
        assert_eq!(once_ids, twice_ids);
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        assert!(InquiryFilter::from_params(Some("Gardening"), None).is_err());
        assert!(InquiryFilter::from_params(None, Some("archived")).is_err());
    }

    #[test]
    fn stats_tally_counts_every_status() {
        let inquiries = vec![
            sample_inquiry("a1", ServiceType::Other, InquiryStatus::Pending),
            sample_inquiry("b2", ServiceType::Other, InquiryStatus::Pending),
            sample_inquiry("c3", ServiceType::Other, InquiryStatus::InReview),
            sample_inquiry("d4", ServiceType::Other, InquiryStatus::Completed),
        ];
        let stats = InquiryStats::tally(&inquiries);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.in_review, 1);
        assert_eq!(stats.approved, 0);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn create_request_validation_matches_form_rules() {
        let valid = CreateInquiryRequest {
            full_name: "Jane Visitor".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 (555) 010-0100".to_string(),
            service_type: ServiceType::MarriageCounseling,
            message: "I would like to schedule a session.".to_string(),
        };
        assert!(valid.validate().is_ok());

        let mut bad_name = valid.clone();
        bad_name.full_name = " J ".to_string();
        assert!(bad_name.validate().is_err());

        let mut bad_email = valid.clone();
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());

        let mut bad_phone = valid.clone();
        bad_phone.phone = "call me maybe".to_string();
        assert!(bad_phone.validate().is_err());

        let mut short_message = valid.clone();
        short_message.message = "hi".to_string();
        assert!(short_message.validate().is_err());
    }

    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&InquiryStatus::InReview).unwrap(),
            "\"in-review\""
        );
        let parsed: InquiryStatus = serde_json::from_str("\"in-review\"").unwrap();
        assert_eq!(parsed, InquiryStatus::InReview);
    }
}
