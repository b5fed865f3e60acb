//! Per-kind locator tables and the classified certificate view.
//!
//! Each table lists the locations of one logical field for one certificate
//! kind, newest profile revision first. Revisions moved fields from the
//! subject DN into subject-alt-name directory attributes and then between
//! OID arcs, so most entries end with the DN attribute used by the oldest
//! profiles.

use super::{CertificateView, FieldLocator, FieldNamespace, resolve};
use crate::certificate::CertificateKind;

/// Logical fields with policy-version-dependent locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    /// Position or title of the holder within the organisation.
    HolderTitle,
    /// Organizational unit.
    OrganizationalUnit,
    /// Organisation name.
    OrganizationName,
    /// Tax or registry identifier of the subscribing organisation.
    SubscriberId,
    /// Name of the subscriber (holder, seal or office name).
    SubscriberName,
    /// Pseudonym of the holder.
    Pseudonym,
    /// National identity number of the holder.
    NationalId,
    /// Contact e-mail address.
    Email,
}

impl LogicalField {
    /// Every logical field.
    pub const ALL: [Self; 8] = [
        Self::HolderTitle,
        Self::OrganizationalUnit,
        Self::OrganizationName,
        Self::SubscriberId,
        Self::SubscriberName,
        Self::Pseudonym,
        Self::NationalId,
        Self::Email,
    ];
}

const fn subject(oid: &'static str) -> FieldLocator {
    FieldLocator::from_static(FieldNamespace::Subject, oid)
}

const fn san(oid: &'static str) -> FieldLocator {
    FieldLocator::from_static(FieldNamespace::SubjectAltName, oid)
}

// X.520 / PKCS#9 attribute types.
const DN_COMMON_NAME: FieldLocator = subject("2.5.4.3");
const DN_SERIAL_NUMBER: FieldLocator = subject("2.5.4.5");
const DN_ORGANIZATION: FieldLocator = subject("2.5.4.10");
const DN_ORGANIZATIONAL_UNIT: FieldLocator = subject("2.5.4.11");
const DN_TITLE: FieldLocator = subject("2.5.4.12");
const DN_PSEUDONYM: FieldLocator = subject("2.5.4.65");
const DN_ORGANIZATION_IDENTIFIER: FieldLocator = subject("2.5.4.97");
const DN_EMAIL: FieldLocator = subject("1.2.840.113549.1.9.1");

const PUBLIC_EMPLOYEE_TITLE: &[FieldLocator] = &[
    san("2.16.724.1.3.5.7.2.11"),
    san("2.16.724.1.3.5.7.1.11"),
    san("2.16.724.1.3.5.2.2.11"),
    DN_TITLE,
];
const PUBLIC_EMPLOYEE_UNIT: &[FieldLocator] = &[
    san("2.16.724.1.3.5.7.2.10"),
    san("2.16.724.1.3.5.7.1.10"),
    san("2.16.724.1.3.5.2.2.10"),
    DN_ORGANIZATIONAL_UNIT,
];
const PUBLIC_EMPLOYEE_ORGANIZATION: &[FieldLocator] = &[
    san("2.16.724.1.3.5.7.2.2"),
    san("2.16.724.1.3.5.7.1.2"),
    DN_ORGANIZATION,
];
const PUBLIC_EMPLOYEE_SUBSCRIBER_ID: &[FieldLocator] = &[
    san("2.16.724.1.3.5.7.2.3"),
    san("2.16.724.1.3.5.7.1.3"),
    DN_ORGANIZATION_IDENTIFIER,
];
const PUBLIC_EMPLOYEE_NAME: &[FieldLocator] = &[
    san("2.16.724.1.3.5.7.2.6"),
    san("2.16.724.1.3.5.7.1.6"),
    DN_COMMON_NAME,
];
const PUBLIC_EMPLOYEE_NATIONAL_ID: &[FieldLocator] = &[
    san("2.16.724.1.3.5.7.2.4"),
    san("2.16.724.1.3.5.7.1.4"),
    san("2.16.724.1.3.5.2.2.4"),
    DN_SERIAL_NUMBER,
];
const PUBLIC_EMPLOYEE_EMAIL: &[FieldLocator] = &[san("2.16.724.1.3.5.7.2.9"), DN_EMAIL];

const PSEUDONYM_EMPLOYEE_PSEUDONYM: &[FieldLocator] = &[
    san("2.16.724.1.3.5.4.2.12"),
    san("2.16.724.1.3.5.4.1.12"),
    DN_PSEUDONYM,
];
const PSEUDONYM_EMPLOYEE_TITLE: &[FieldLocator] = &[san("2.16.724.1.3.5.4.2.11"), DN_TITLE];
const PSEUDONYM_EMPLOYEE_UNIT: &[FieldLocator] =
    &[san("2.16.724.1.3.5.4.2.10"), DN_ORGANIZATIONAL_UNIT];
const PSEUDONYM_EMPLOYEE_ORGANIZATION: &[FieldLocator] =
    &[san("2.16.724.1.3.5.4.2.2"), DN_ORGANIZATION];
const PSEUDONYM_EMPLOYEE_SUBSCRIBER_ID: &[FieldLocator] =
    &[san("2.16.724.1.3.5.4.2.3"), DN_ORGANIZATION_IDENTIFIER];

const SEAL_NAME: &[FieldLocator] = &[
    san("2.16.724.1.3.5.6.2.5"),
    san("2.16.724.1.3.5.6.1.5"),
    DN_COMMON_NAME,
];
const SEAL_SUBSCRIBER_ID: &[FieldLocator] = &[
    san("2.16.724.1.3.5.6.2.3"),
    san("2.16.724.1.3.5.6.1.3"),
    DN_ORGANIZATION_IDENTIFIER,
    DN_SERIAL_NUMBER,
];
const SEAL_ORGANIZATION: &[FieldLocator] = &[
    san("2.16.724.1.3.5.6.2.2"),
    san("2.16.724.1.3.5.6.1.2"),
    DN_ORGANIZATION,
];
const SEAL_UNIT: &[FieldLocator] = &[DN_ORGANIZATIONAL_UNIT];
const SEAL_EMAIL: &[FieldLocator] = &[san("2.16.724.1.3.5.6.2.9"), DN_EMAIL];

const OFFICE_NAME: &[FieldLocator] = &[
    san("2.16.724.1.3.5.5.2.5"),
    san("2.16.724.1.3.5.5.1.5"),
    DN_COMMON_NAME,
];
const OFFICE_SUBSCRIBER_ID: &[FieldLocator] = &[
    san("2.16.724.1.3.5.5.2.3"),
    san("2.16.724.1.3.5.5.1.3"),
    DN_ORGANIZATION_IDENTIFIER,
];
const OFFICE_ORGANIZATION: &[FieldLocator] = &[san("2.16.724.1.3.5.5.2.2"), DN_ORGANIZATION];
const OFFICE_UNIT: &[FieldLocator] = &[DN_ORGANIZATIONAL_UNIT];

const PERSON_NATIONAL_ID: &[FieldLocator] = &[DN_SERIAL_NUMBER, san("1.3.6.1.4.1.5734.1.4")];
const PERSON_NAME: &[FieldLocator] = &[DN_COMMON_NAME];
const PERSON_EMAIL: &[FieldLocator] = &[DN_EMAIL];

const ENTITY_SUBSCRIBER_ID: &[FieldLocator] =
    &[DN_ORGANIZATION_IDENTIFIER, san("1.3.6.1.4.1.5734.1.7")];
const ENTITY_ORGANIZATION: &[FieldLocator] = &[DN_ORGANIZATION, san("1.3.6.1.4.1.5734.1.6")];
const ENTITY_UNIT: &[FieldLocator] = &[DN_ORGANIZATIONAL_UNIT];

const REPRESENTATIVE_TITLE: &[FieldLocator] = &[DN_TITLE];

/// Returns the ordered locators for `field` on certificates of `kind`.
///
/// Empty when the kind does not carry the field; always empty for
/// [`CertificateKind::Unknown`].
#[must_use]
pub const fn locators(kind: CertificateKind, field: LogicalField) -> &'static [FieldLocator] {
    use CertificateKind as K;
    use LogicalField as F;

    match (kind, field) {
        (K::PublicEmployee, F::HolderTitle) => PUBLIC_EMPLOYEE_TITLE,
        (K::PublicEmployee, F::OrganizationalUnit) => PUBLIC_EMPLOYEE_UNIT,
        (K::PublicEmployee, F::OrganizationName) => PUBLIC_EMPLOYEE_ORGANIZATION,
        (K::PublicEmployee, F::SubscriberId) => PUBLIC_EMPLOYEE_SUBSCRIBER_ID,
        (K::PublicEmployee, F::SubscriberName) => PUBLIC_EMPLOYEE_NAME,
        (K::PublicEmployee, F::NationalId) => PUBLIC_EMPLOYEE_NATIONAL_ID,
        (K::PublicEmployee, F::Email) => PUBLIC_EMPLOYEE_EMAIL,

        (K::PseudonymousPublicEmployee, F::Pseudonym) => PSEUDONYM_EMPLOYEE_PSEUDONYM,
        (K::PseudonymousPublicEmployee, F::HolderTitle) => PSEUDONYM_EMPLOYEE_TITLE,
        (K::PseudonymousPublicEmployee, F::OrganizationalUnit) => PSEUDONYM_EMPLOYEE_UNIT,
        (K::PseudonymousPublicEmployee, F::OrganizationName) => PSEUDONYM_EMPLOYEE_ORGANIZATION,
        (K::PseudonymousPublicEmployee, F::SubscriberId) => PSEUDONYM_EMPLOYEE_SUBSCRIBER_ID,

        (K::ElectronicSeal, F::SubscriberName) => SEAL_NAME,
        (K::ElectronicSeal, F::SubscriberId) => SEAL_SUBSCRIBER_ID,
        (K::ElectronicSeal, F::OrganizationName) => SEAL_ORGANIZATION,
        (K::ElectronicSeal, F::OrganizationalUnit) => SEAL_UNIT,
        (K::ElectronicSeal, F::Email) => SEAL_EMAIL,

        (K::ElectronicOffice, F::SubscriberName) => OFFICE_NAME,
        (K::ElectronicOffice, F::SubscriberId) => OFFICE_SUBSCRIBER_ID,
        (K::ElectronicOffice, F::OrganizationName) => OFFICE_ORGANIZATION,
        (K::ElectronicOffice, F::OrganizationalUnit) => OFFICE_UNIT,

        (K::NaturalPerson, F::NationalId) => PERSON_NATIONAL_ID,
        (K::NaturalPerson, F::SubscriberName) => PERSON_NAME,
        (K::NaturalPerson, F::Email) => PERSON_EMAIL,

        (K::LegalEntity, F::SubscriberId) => ENTITY_SUBSCRIBER_ID,
        (K::LegalEntity, F::OrganizationName | F::SubscriberName) => ENTITY_ORGANIZATION,
        (K::LegalEntity, F::OrganizationalUnit) => ENTITY_UNIT,

        (K::EntityRepresentative, F::NationalId) => PERSON_NATIONAL_ID,
        (K::EntityRepresentative, F::SubscriberName) => PERSON_NAME,
        (K::EntityRepresentative, F::SubscriberId) => ENTITY_SUBSCRIBER_ID,
        (K::EntityRepresentative, F::OrganizationName) => ENTITY_ORGANIZATION,
        (K::EntityRepresentative, F::HolderTitle) => REPRESENTATIVE_TITLE,
        (K::EntityRepresentative, F::Email) => PERSON_EMAIL,

        _ => &[],
    }
}

/// A certificate paired with the kind it was classified as.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedCertificate<'a, V: ?Sized> {
    kind: CertificateKind,
    view: &'a V,
}

impl<'a, V> ClassifiedCertificate<'a, V>
where
    V: CertificateView + ?Sized,
{
    /// Pairs a view with its kind.
    #[must_use]
    pub const fn new(kind: CertificateKind, view: &'a V) -> Self {
        Self { kind, view }
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> CertificateKind {
        self.kind
    }

    /// Returns the underlying view.
    #[must_use]
    pub const fn view(&self) -> &'a V {
        self.view
    }

    /// Resolves a logical field for this kind.
    #[must_use]
    pub fn field(&self, field: LogicalField) -> Option<String> {
        resolve(self.view, locators(self.kind, field))
    }
}
