//! Built-in policy bindings.
//!
//! Order is precedence: narrower prefixes that share a base with a broader
//! one are listed first.

use crate::certificate::CertificateKind;

/// Built-in `(policy prefix, kind)` bindings, in precedence order.
pub const BUILTIN_BINDINGS: &[(&str, CertificateKind)] = &[
    // Public administration profiles.
    ("2.16.724.1.3.5.7", CertificateKind::PublicEmployee),
    ("2.16.724.1.3.5.4", CertificateKind::PseudonymousPublicEmployee),
    ("2.16.724.1.3.5.6", CertificateKind::ElectronicSeal),
    ("2.16.724.1.3.5.5", CertificateKind::ElectronicOffice),
    // Citizen and entity profiles.
    ("1.3.6.1.4.1.5734.3.10", CertificateKind::NaturalPerson),
    ("1.3.6.1.4.1.5734.3.11.1", CertificateKind::EntityRepresentative),
    ("1.3.6.1.4.1.5734.3.11", CertificateKind::LegalEntity),
];
