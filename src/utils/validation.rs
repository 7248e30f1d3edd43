//! Validation utilities

use crate::traits::*;
use crate::types::*;

/// Maximum length of a note, in characters
pub const MAX_NOTE_LENGTH: usize = 2000;

/// Validate a customer or contract id as typed by staff
pub fn validate_record_id(kind: &str, id: &str) -> PortalResult<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(PortalError::Validation(format!("{} ID cannot be empty", kind)));
    }

    if id.len() > 20 {
        return Err(PortalError::Validation(format!(
            "{} ID cannot exceed 20 characters",
            kind
        )));
    }

    // Billing API ids are numeric
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(PortalError::Validation(format!(
            "{} ID can only contain digits",
            kind
        )));
    }

    Ok(())
}

/// Validate the text of a note
pub fn validate_note_text(text: &str) -> PortalResult<()> {
    if text.trim().is_empty() {
        return Err(PortalError::Validation(
            "Note text cannot be empty".to_string(),
        ));
    }

    if text.chars().count() > MAX_NOTE_LENGTH {
        return Err(PortalError::Validation(format!(
            "Note text cannot exceed {} characters",
            MAX_NOTE_LENGTH
        )));
    }

    Ok(())
}

/// Stricter note validator used by the portal
pub struct EnhancedNoteValidator;

impl NoteValidator for EnhancedNoteValidator {
    fn validate_note(&self, note: &Note) -> PortalResult<()> {
        validate_record_id("Customer", &note.customer_id)?;
        validate_note_text(&note.text)?;

        if note.author.trim().is_empty() {
            return Err(PortalError::Validation(
                "Note author cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
