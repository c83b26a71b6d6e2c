//! Craftsman domain types
//!
//! Service-provider profiles. A craftsman is never hard-deleted; approval and
//! activity are soft states changed through `engine::approval`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A service the craftsman offers, with a sample image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceOffering {
    #[serde(alias = "service_name")]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Craftsman entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Craftsman {
    /// Same id as the craftsman's auth identity
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub primary_service: Option<String>,
    pub services: Vec<ServiceOffering>,
    /// Legacy gallery list, may be populated instead of `services[..].image`
    pub service_images: Vec<String>,
    /// Legacy single image field
    pub service_image: Option<String>,
    pub profile: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    /// Latest admin rejection feedback, cleared on resubmission
    pub rejection_reason: Option<String>,
    /// Bumped on every stored change; profile writes are checked against it
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Craftsman {
    /// Whether the craftsman lists `service` as primary or offered service.
    /// Categories compare case-insensitively after trimming.
    pub fn offers(&self, service: &str) -> bool {
        let wanted = service.trim();
        if wanted.is_empty() {
            return false;
        }
        let same = |candidate: &str| candidate.trim().eq_ignore_ascii_case(wanted);

        self.primary_service.as_deref().is_some_and(same)
            || self.services.iter().any(|s| same(&s.name))
    }

    /// First service image across the three legacy representations
    pub fn service_image_ref(&self) -> Option<&str> {
        let non_empty = |s: &&str| !s.trim().is_empty();

        self.services
            .first()
            .and_then(|s| s.image.as_deref())
            .filter(non_empty)
            .or_else(|| self.service_images.first().map(String::as_str).filter(non_empty))
            .or_else(|| self.service_image.as_deref().filter(non_empty))
    }

    /// Eligible to be shown to clients and assigned to jobs
    #[cfg(test)]
    pub fn is_available(&self) -> bool {
        self.is_approved && self.is_active
    }
}

/// Request DTO for craftsman signup
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCraftsmanRequest {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub primary_service: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceOffering>,
    #[serde(default)]
    pub service_images: Vec<String>,
    #[serde(default)]
    pub service_image: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

/// Request DTO for profile edits (craftsman self-service or admin edit)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateCraftsmanRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub primary_service: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<ServiceOffering>>,
    #[serde(default)]
    pub service_images: Option<Vec<String>>,
    #[serde(default)]
    pub service_image: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

impl UpdateCraftsmanRequest {
    pub fn apply(self, craftsman: &mut Craftsman) {
        if let Some(v) = self.full_name {
            craftsman.full_name = v;
        }
        if self.phone.is_some() {
            craftsman.phone = self.phone;
        }
        if self.profession.is_some() {
            craftsman.profession = self.profession;
        }
        if self.description.is_some() {
            craftsman.description = self.description;
        }
        if self.location.is_some() {
            craftsman.location = self.location;
        }
        if self.primary_service.is_some() {
            craftsman.primary_service = self.primary_service;
        }
        if let Some(v) = self.services {
            craftsman.services = v;
        }
        if let Some(v) = self.service_images {
            craftsman.service_images = v;
        }
        if self.service_image.is_some() {
            craftsman.service_image = self.service_image;
        }
        if self.profile.is_some() {
            craftsman.profile = self.profile;
        }
    }
}

/// Request DTO for admin rejection
#[derive(Debug, Clone, Deserialize)]
pub struct RejectCraftsmanRequest {
    pub reason: String,
}

/// Field required before a craftsman can be approved
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    FullName,
    ProfileImage,
    Profession,
    Description,
    PrimaryService,
    ServiceImage,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MissingField::FullName => "full_name",
            MissingField::ProfileImage => "profile_image",
            MissingField::Profession => "profession",
            MissingField::Description => "description",
            MissingField::PrimaryService => "primary_service",
            MissingField::ServiceImage => "service_image",
        };
        write!(f, "{}", s)
    }
}

/// Admin view of an approval check
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalEvaluation {
    pub craftsman_id: Uuid,
    pub approvable: bool,
    pub missing: Vec<MissingField>,
}

/// Filter for craftsman list projections
#[derive(Debug, Clone, Default)]
pub struct CraftsmanQuery {
    pub approved: Option<bool>,
    pub active: Option<bool>,
    pub service: Option<String>,
}

impl CraftsmanQuery {
    pub fn available(service: Option<String>) -> Self {
        Self {
            approved: Some(true),
            active: Some(true),
            service,
        }
    }

    pub fn matches(&self, craftsman: &Craftsman) -> bool {
        if self.approved.is_some_and(|a| a != craftsman.is_approved) {
            return false;
        }
        if self.active.is_some_and(|a| a != craftsman.is_active) {
            return false;
        }
        match self.service.as_deref() {
            Some(service) => craftsman.offers(service),
            None => true,
        }
    }
}

/// Public directory entry for an approved, active craftsman
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftsmanPublic {
    pub id: Uuid,
    pub full_name: String,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub primary_service: Option<String>,
    pub services: Vec<ServiceOffering>,
    pub profile: Option<String>,
    pub service_image: Option<String>,
}

impl From<Craftsman> for CraftsmanPublic {
    fn from(c: Craftsman) -> Self {
        let service_image = c.service_image_ref().map(str::to_string);
        Self {
            id: c.id,
            full_name: c.full_name,
            profession: c.profession,
            description: c.description,
            location: c.location,
            primary_service: c.primary_service,
            services: c.services,
            profile: c.profile,
            service_image,
        }
    }
}
