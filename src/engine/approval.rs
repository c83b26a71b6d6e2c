//! Craftsman approval gate
//!
//! Decides whether a craftsman profile may act as a service provider.

use chrono::{DateTime, Utc};

use super::{EngineError, EngineResult};
use crate::domain::{Craftsman, MissingField};

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Every field still missing before `craftsman` can be approved
pub fn evaluate(craftsman: &Craftsman) -> Vec<MissingField> {
    let mut missing = Vec::new();

    if craftsman.full_name.trim().is_empty() {
        missing.push(MissingField::FullName);
    }
    if blank(craftsman.profile.as_deref()) {
        missing.push(MissingField::ProfileImage);
    }
    if blank(craftsman.profession.as_deref()) {
        missing.push(MissingField::Profession);
    }
    if blank(craftsman.description.as_deref()) {
        missing.push(MissingField::Description);
    }
    if blank(craftsman.primary_service.as_deref()) {
        missing.push(MissingField::PrimaryService);
    }
    if craftsman.service_image_ref().is_none() {
        missing.push(MissingField::ServiceImage);
    }

    missing
}

/// Approve, or fail listing every missing field. Never partially approves.
pub fn approve(craftsman: &mut Craftsman, now: DateTime<Utc>) -> EngineResult<()> {
    let missing = evaluate(craftsman);
    if !missing.is_empty() {
        return Err(EngineError::missing_fields(&missing));
    }

    craftsman.is_approved = true;
    craftsman.rejection_reason = None;
    craftsman.updated_at = now;
    Ok(())
}

/// Record rejection feedback. The craftsman stays pending until resubmission.
pub fn reject(craftsman: &mut Craftsman, reason: &str, now: DateTime<Utc>) -> EngineResult<()> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(EngineError::invalid_field(
            "reason",
            "a rejection reason is required",
        ));
    }

    craftsman.is_approved = false;
    craftsman.rejection_reason = Some(reason.to_string());
    craftsman.updated_at = now;
    Ok(())
}

/// Flip `is_active` on an approved craftsman, returning the new value
pub fn toggle_active(craftsman: &mut Craftsman, now: DateTime<Utc>) -> EngineResult<bool> {
    if !craftsman.is_approved {
        return Err(EngineError::validation(
            "only approved craftsmen can be activated or deactivated",
        ));
    }

    craftsman.is_active = !craftsman.is_active;
    craftsman.updated_at = now;
    Ok(craftsman.is_active)
}

/// A profile edit must not leave an approved craftsman failing the gate
pub fn check_edit(craftsman: &Craftsman) -> EngineResult<()> {
    if !craftsman.is_approved {
        return Ok(());
    }

    let missing = evaluate(craftsman);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::missing_fields(&missing))
    }
}
