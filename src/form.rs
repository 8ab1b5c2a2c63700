//! Input validation for the add/edit news form.

use crate::models::{parse_date, Category, NewsPayload, NewsRecord};
use std::borrow::Cow;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Error)]
/// Errors that can occur when turning form input into a payload.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid category")]
    InvalidCategory,

    #[error("invalid date")]
    InvalidDate,
}

/// Raw values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct NewsForm {
    #[validate(length(min = 3, message = "Arabic title must be at least 3 characters"))]
    pub title_arabic: String,
    #[validate(length(min = 3, message = "English title must be at least 3 characters"))]
    pub title_english: String,
    #[validate(length(min = 10, message = "Arabic description must be at least 10 characters"))]
    pub description_arabic: String,
    #[validate(length(min = 10, message = "English description must be at least 10 characters"))]
    pub description_english: String,
    #[validate(custom(function = "validate_category"))]
    pub category: String,
    #[validate(custom(function = "validate_date"))]
    pub date: String,
    /// URL of the image already attached to the record, kept when no new one is uploaded
    pub image: String,
}

impl NewsForm {
    /// Empty form dated today
    pub fn new() -> Self {
        Self {
            date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }

    /// Pre-fills an edit form from a stored record
    pub fn from_record(record: &NewsRecord) -> Self {
        Self {
            title_arabic: record.title_arabic.clone(),
            title_english: record.title_english.clone(),
            description_arabic: record.description_arabic.clone(),
            description_english: record.description_english.clone(),
            category: record.category.label().to_string(),
            date: record
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            image: record.image.clone().unwrap_or_default(),
        }
    }

    /// Strips surrounding whitespace from the text fields so length rules
    /// measure what is actually sent
    pub fn trimmed(self) -> Self {
        Self {
            title_arabic: self.title_arabic.trim().to_string(),
            title_english: self.title_english.trim().to_string(),
            description_arabic: self.description_arabic.trim().to_string(),
            description_english: self.description_english.trim().to_string(),
            category: self.category.trim().to_string(),
            date: self.date.trim().to_string(),
            image: self.image.trim().to_string(),
        }
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.trim().is_empty() {
        return Err(field_error("required", "Category is required"));
    }
    category
        .parse::<Category>()
        .map(|_| ())
        .map_err(|_| field_error("category", "Invalid category"))
}

fn validate_date(date: &str) -> Result<(), ValidationError> {
    if date.trim().is_empty() {
        return Err(field_error("required", "Date is required"));
    }
    parse_date(date)
        .map(|_| ())
        .ok_or_else(|| field_error("date", "Date must be YYYY-MM-DD"))
}

impl TryFrom<NewsForm> for NewsPayload {
    type Error = FormError;

    fn try_from(form: NewsForm) -> Result<Self, Self::Error> {
        let form = form.trimmed();
        form.validate()?;

        let category = form
            .category
            .parse::<Category>()
            .map_err(|_| FormError::InvalidCategory)?;
        let date = parse_date(&form.date).ok_or(FormError::InvalidDate)?;

        Ok(Self {
            title_arabic: form.title_arabic,
            title_english: form.title_english,
            description_arabic: form.description_arabic,
            description_english: form.description_english,
            category,
            date,
            image: form.image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsId;
    use chrono::NaiveDate;

    fn filled() -> NewsForm {
        NewsForm {
            title_arabic: "إطلاق المنتج".to_string(),
            title_english: " Product launch ".to_string(),
            description_arabic: "<p>تفاصيل إطلاق المنتج</p>".to_string(),
            description_english: "<p>Details of the launch</p>".to_string(),
            category: "Tech".to_string(),
            date: "2024-06-10".to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn test_valid_form_becomes_payload() {
        let payload = NewsPayload::try_from(filled()).unwrap();

        assert_eq!(payload.title_english, "Product launch");
        assert_eq!(payload.category, Category::Tech);
        assert_eq!(payload.date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(payload.image, "");
    }

    #[test]
    fn test_short_fields_are_rejected() {
        let form = NewsForm {
            title_english: "ab".to_string(),
            description_arabic: "قصير".to_string(),
            ..filled()
        };

        let err = form.validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("title_english"));
        assert!(fields.contains_key("description_arabic"));
        assert!(!fields.contains_key("title_arabic"));
    }

    #[test]
    fn test_padding_does_not_count_towards_length() {
        let form = NewsForm {
            title_english: "  ab ".to_string(),
            description_english: "          x".to_string(),
            ..filled()
        };

        let err = NewsPayload::try_from(form).unwrap_err();
        match err {
            FormError::Validation(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("title_english"));
                assert!(fields.contains_key("description_english"));
                assert!(!fields.contains_key("title_arabic"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_category_and_date_are_required() {
        let form = NewsForm {
            category: "Weather".to_string(),
            date: String::new(),
            ..filled()
        };

        let err = NewsPayload::try_from(form).unwrap_err();
        match err {
            FormError::Validation(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("category"));
                assert!(fields.contains_key("date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_form_is_dated_today() {
        let form = NewsForm::new();
        assert_eq!(parse_date(&form.date), Some(chrono::Local::now().date_naive()));
        assert!(form.category.is_empty());
    }

    #[test]
    fn test_from_record_prefills_edit_form() {
        let record = NewsRecord {
            id: NewsId::Number(4),
            title_arabic: "عنوان".to_string(),
            title_english: "Headline".to_string(),
            description_arabic: "وصف".to_string(),
            description_english: "Description".to_string(),
            category: Category::Opinions,
            date: NaiveDate::from_ymd_opt(2023, 12, 1),
            image: Some("https://cdn.test/4.png".to_string()),
        };

        let form = NewsForm::from_record(&record);
        assert_eq!(form.category, "Opinions");
        assert_eq!(form.date, "2023-12-01");
        assert_eq!(form.image, "https://cdn.test/4.png");
    }
}
