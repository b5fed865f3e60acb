//! Certificate kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Semantic certificate kind, derived from issuance policy.
///
/// The set is closed: every kind the classifier can produce is listed
/// here, and field extraction is driven by matching on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateKind {
    /// Citizen certificate.
    NaturalPerson,
    /// Certificate issued to an organisation.
    LegalEntity,
    /// Person acting on behalf of an organisation.
    EntityRepresentative,
    /// Public administration employee.
    PublicEmployee,
    /// Public administration employee identified by pseudonym.
    PseudonymousPublicEmployee,
    /// Organisational seal for automated signing.
    ElectronicSeal,
    /// Server certificate of an electronic office (website).
    ElectronicOffice,
    /// Unclassified certificate. Chain validation applies, semantic field
    /// extraction does not.
    Unknown,
}

impl CertificateKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::NaturalPerson,
        Self::LegalEntity,
        Self::EntityRepresentative,
        Self::PublicEmployee,
        Self::PseudonymousPublicEmployee,
        Self::ElectronicSeal,
        Self::ElectronicOffice,
        Self::Unknown,
    ];

    /// Returns the stable identifier of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NaturalPerson => "natural_person",
            Self::LegalEntity => "legal_entity",
            Self::EntityRepresentative => "entity_representative",
            Self::PublicEmployee => "public_employee",
            Self::PseudonymousPublicEmployee => "pseudonymous_public_employee",
            Self::ElectronicSeal => "electronic_seal",
            Self::ElectronicOffice => "electronic_office",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` if semantic fields can be extracted for this kind.
    #[must_use]
    pub const fn supports_field_extraction(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateKind {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ClassifierError::UnknownKind {
                value: s.to_string(),
            })
    }
}
