//! Default filling helpers shared by the profile models.
//!
//! Two flavours exist because the record families disagree: the standard
//! family treats a blank string like an unset one, HTTP only fills unset ones.

pub(crate) fn blank_or(field: &mut Option<String>, default: &str) {
    let blank = field.as_deref().is_none_or(|s| s.trim().is_empty());
    if blank {
        *field = Some(default.to_string());
    }
}

pub(crate) fn unset_or(field: &mut Option<String>, default: &str) {
    if field.is_none() {
        *field = Some(default.to_string());
    }
}

pub(crate) fn unset_or_value<T: Copy>(field: &mut Option<T>, default: T) {
    if field.is_none() {
        *field = Some(default);
    }
}

/// Borrow a normalized field for encoding.
pub(crate) fn required<'a>(field: &'a Option<String>, name: &'static str) -> crate::Result<&'a str> {
    field
        .as_deref()
        .ok_or(crate::ProfileError::UnnormalizedRecord { field: name })
}

pub(crate) fn required_copy<T: Copy>(field: &Option<T>, name: &'static str) -> crate::Result<T> {
    field.ok_or(crate::ProfileError::UnnormalizedRecord { field: name })
}
