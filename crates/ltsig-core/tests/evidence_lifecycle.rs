//! End-to-end evidence lifecycle: build, seal, transport and validate.

mod common;

use common::{
    DOCUMENT, MockRevocation, MockTsa, Pki, TsaMode, at, builder, join_envelope,
    reseal_with_revocation, split_envelope,
};
use ltsig_core::crypto::{ContentSigner, CryptoProvider, DigestAlgorithm, StandardCrypto};
use ltsig_core::evidence::{
    BuilderConfig, ContentInput, EnvelopeError, EvidenceBundle, EvidenceChainBuilder,
    EvidenceError, EvidenceValidator, RevocationSources, RevocationStatus, SealedBundle,
    ValidationStatus, ValidatorConfig,
};

fn full_bundle(pki: &Pki, tsa: &MockTsa, ocsp: &MockRevocation) -> EvidenceBundle {
    let base = builder().sign_document(&pki.signer, DOCUMENT).unwrap();
    let stamped = builder().add_timestamp(&base, tsa).unwrap();
    builder()
        .add_revocation_evidence(&stamped, &pki.store(), RevocationSources::new(ocsp))
        .unwrap()
}

fn sealed(pki: &Pki, bundle: &EvidenceBundle) -> SealedBundle {
    builder().seal(bundle, &pki.sealer).unwrap()
}

fn status_of(sealed: &SealedBundle, content: ContentInput<'_>) -> ValidationStatus {
    EvidenceValidator::new(&StandardCrypto, ValidatorConfig::default())
        .validate(sealed, content)
        .status
}

// =============================================================================
// Building
// =============================================================================

#[test]
fn test_evidence_count_grows_with_each_layer() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();

    let base = builder().sign_document(&pki.signer, DOCUMENT).unwrap();
    let stamped = builder().add_timestamp(&base, &tsa).unwrap();
    let revoked = builder()
        .add_revocation_evidence(&stamped, &pki.store(), RevocationSources::new(&ocsp))
        .unwrap();
    let archived = builder().add_archive_timestamp(&revoked, &tsa).unwrap();

    let counts: Vec<_> = [&base, &stamped, &revoked, &archived]
        .iter()
        .map(|b| b.evidence_count())
        .collect();
    assert_eq!(counts, vec![1, 2, 4, 5]);
    assert!(counts.windows(2).all(|pair| pair[0] < pair[1]));

    // Base signature and earlier layers are carried through untouched.
    assert_eq!(archived.base(), base.base());
    assert_eq!(archived.timestamp(), stamped.timestamp());
    assert_eq!(archived.revocation(), revoked.revocation());
}

#[test]
fn test_collaborators_receive_configured_timeout() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let timeout = std::time::Duration::from_millis(750);
    let builder = EvidenceChainBuilder::new(
        &StandardCrypto,
        BuilderConfig::default().with_service_timeout(timeout),
    );

    let base = builder.sign_document(&pki.signer, DOCUMENT).unwrap();
    builder.add_timestamp(&base, &tsa).unwrap();
    assert_eq!(tsa.calls(), 1);
    assert_eq!(tsa.last_timeout(), Some(timeout));
}

#[test]
fn test_unreachable_authority_is_a_service_error() {
    let pki = Pki::new();
    let tsa = MockTsa::with_mode(TsaMode::Unreachable);
    let base = builder().sign_document(&pki.signer, DOCUMENT).unwrap();

    let err = builder().add_timestamp(&base, &tsa).unwrap_err();
    assert!(matches!(err, EvidenceError::TimestampService { .. }));
    assert_eq!(base.evidence_count(), 1);
}

#[test]
fn test_token_for_other_data_is_rejected() {
    let pki = Pki::new();
    let tsa = MockTsa::with_mode(TsaMode::WrongImprint);
    let base = builder().sign_document(&pki.signer, DOCUMENT).unwrap();

    let err = builder().add_timestamp(&base, &tsa).unwrap_err();
    assert!(matches!(err, EvidenceError::TimestampService { .. }));
}

#[test]
fn test_failed_revocation_for_intermediate_adds_nothing() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let mut ocsp = MockRevocation::ocsp();
    ocsp.fail = true;

    let base = builder().sign_document(&pki.signer, DOCUMENT).unwrap();
    let stamped = builder().add_timestamp(&base, &tsa).unwrap();
    let err = builder()
        .add_revocation_evidence(&stamped, &pki.store(), RevocationSources::new(&ocsp))
        .unwrap_err();

    assert!(matches!(err, EvidenceError::RevocationUnavailable { .. }));
    assert!(stamped.revocation().is_empty());
}

#[test]
fn test_missing_intermediate_is_incomplete_chain() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let store = ltsig_core::evidence::TrustStore::new().with_anchor(pki.root.clone());

    let base = builder().sign_document(&pki.signer, DOCUMENT).unwrap();
    let stamped = builder().add_timestamp(&base, &tsa).unwrap();
    let err = builder()
        .add_revocation_evidence(&stamped, &store, RevocationSources::new(&ocsp))
        .unwrap_err();

    assert!(matches!(err, EvidenceError::IncompleteChain { .. }));
    assert_eq!(ocsp.calls(), 0);
}

#[test]
fn test_crl_fallback_when_enabled() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let mut ocsp = MockRevocation::ocsp();
    ocsp.fail = true;
    let crl = MockRevocation::crl();
    let builder = EvidenceChainBuilder::new(
        &StandardCrypto,
        BuilderConfig::default().with_revocation_policy(ltsig_core::evidence::RevocationPolicy {
            allow_fallback: true,
            max_fallback_window: None,
        }),
    );

    let base = builder.sign_document(&pki.signer, DOCUMENT).unwrap();
    let stamped = builder.add_timestamp(&base, &tsa).unwrap();
    let revoked = builder
        .add_revocation_evidence(
            &stamped,
            &pki.store(),
            RevocationSources::new(&ocsp).with_fallback(&crl),
        )
        .unwrap();

    assert_eq!(revoked.revocation().len(), 2);
    assert_eq!(crl.calls(), 2);

    let sealed = builder.seal(&revoked, &pki.sealer).unwrap();
    assert_eq!(status_of(&sealed, ContentInput::Document(DOCUMENT)), ValidationStatus::Valid);
}

// =============================================================================
// Envelope
// =============================================================================

#[test]
fn test_base_signature_round_trips() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let bundle = full_bundle(&pki, &tsa, &ocsp);

    let parsed = SealedBundle::from_bytes(&sealed(&pki, &bundle).to_bytes()).unwrap();
    assert_eq!(parsed.bundle(), &bundle);
    assert_eq!(parsed.bundle().base().value, bundle.base().value);
    assert_eq!(parsed.sealer(), pki.sealer.certificate());
}

#[test]
fn test_building_is_deterministic() {
    let pki = Pki::new();
    let ocsp = MockRevocation::ocsp();

    let first = sealed(&pki, &full_bundle(&pki, &MockTsa::new(), &ocsp));
    let second = sealed(&pki, &full_bundle(&pki, &MockTsa::new(), &ocsp));
    assert_eq!(first.to_bytes(), second.to_bytes());
}

#[test]
fn test_base64_transport() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    let text = format!("  {}\n", sealed.to_base64());
    let parsed = SealedBundle::from_base64(&text).unwrap();
    assert_eq!(parsed.to_bytes(), sealed.to_bytes());
    assert_eq!(status_of(&parsed, ContentInput::Document(DOCUMENT)), ValidationStatus::Valid);
}

#[test]
fn test_malformed_envelopes_are_parse_errors() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let bytes = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp)).to_bytes();

    let mut two_parts = bytes.clone();
    two_parts[5..9].copy_from_slice(&2u32.to_be_bytes());
    assert!(matches!(
        SealedBundle::from_bytes(&two_parts),
        Err(EnvelopeError::WrongPartCount { count: 2 })
    ));

    assert!(matches!(
        SealedBundle::from_base64("not*base64"),
        Err(EnvelopeError::Base64(_))
    ));

    assert!(matches!(
        SealedBundle::from_bytes(&bytes[..bytes.len() - 1]),
        Err(EnvelopeError::Truncated { .. })
    ));

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(matches!(
        SealedBundle::from_bytes(&trailing),
        Err(EnvelopeError::TrailingBytes { count: 1 })
    ));

    let mut fields = split_envelope(&bytes);
    fields[0] = b"{\"value\":".to_vec();
    assert!(matches!(
        SealedBundle::from_bytes(&join_envelope(&fields)),
        Err(EnvelopeError::PartDecode { .. })
    ));
}

// =============================================================================
// Validation scenarios
// =============================================================================

#[test]
fn test_good_bundle_is_valid() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    let outcome = EvidenceValidator::new(&StandardCrypto, ValidatorConfig::default())
        .validate(&sealed, ContentInput::Document(DOCUMENT));
    assert_eq!(outcome.status, ValidationStatus::Valid);
    assert_eq!(outcome.status.as_code(), "VALID");
    assert_eq!(&outcome.signer, pki.signer.certificate());
    assert_eq!(outcome.revocation_evidence.len(), 2);
    assert!(outcome.timestamp.is_some());
}

#[test]
fn test_flipped_envelope_byte_is_invalid() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let mut bytes = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp)).to_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let parsed = SealedBundle::from_bytes(&bytes).unwrap();
    assert_eq!(status_of(&parsed, ContentInput::Document(DOCUMENT)), ValidationStatus::Invalid);
}

#[test]
fn test_edited_signed_field_is_invalid() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let bytes = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp)).to_bytes();

    // One digit per field, each edit leaving the field decodable.
    let edits: [(usize, &[u8], &[u8]); 4] = [
        (0, b"2020-01-01T", b"2020-01-02T"),
        (1, b"2025-06-01T", b"2025-06-02T"),
        (2, b"2025-06-15T", b"2025-06-16T"),
        (3, b"2020-01-01T", b"2020-01-02T"),
    ];
    for (field, needle, replacement) in edits {
        let mut fields = split_envelope(&bytes);
        let offset = fields[field]
            .windows(needle.len())
            .position(|window| window == needle)
            .unwrap();
        fields[field][offset..offset + needle.len()].copy_from_slice(replacement);

        let parsed = SealedBundle::from_bytes(&join_envelope(&fields)).unwrap();
        assert_eq!(
            status_of(&parsed, ContentInput::Document(DOCUMENT)),
            ValidationStatus::Invalid,
            "field {field}"
        );
    }
}

#[test]
fn test_first_failing_check_decides_status() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let mut ocsp = MockRevocation::ocsp();
    ocsp.this_update = at(2025, 1, 1);
    ocsp.next_update = at(2025, 2, 1);
    ocsp.status = RevocationStatus::Revoked {
        revoked_at: at(2025, 1, 15),
        reason: None,
    };
    let stale_and_revoked = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    assert_eq!(
        status_of(&stale_and_revoked, ContentInput::Document(b"another document")),
        ValidationStatus::SignatureNotMatchData
    );
    assert_eq!(
        status_of(&stale_and_revoked, ContentInput::Document(DOCUMENT)),
        ValidationStatus::TimestampAfterValidityItem
    );

    ocsp.this_update = at(2025, 6, 1);
    ocsp.next_update = at(2025, 7, 1);
    let revoked = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));
    assert_eq!(
        status_of(&revoked, ContentInput::Document(DOCUMENT)),
        ValidationStatus::InvalidValidityItem
    );

    let mut tampered = revoked.to_bytes();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    let tampered = SealedBundle::from_bytes(&tampered).unwrap();
    assert_eq!(
        status_of(&tampered, ContentInput::Document(b"another document")),
        ValidationStatus::Invalid
    );
}

#[test]
fn test_other_content_does_not_match() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    assert_eq!(
        status_of(&sealed, ContentInput::Document(b"Resolution 2025/117: rejected.")),
        ValidationStatus::SignatureNotMatchData
    );
}

#[test]
fn test_document_and_digest_inputs_agree() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    let digest = StandardCrypto.digest(DigestAlgorithm::Sha256, DOCUMENT);
    assert_eq!(
        status_of(&sealed, ContentInput::Digest(&digest)),
        status_of(&sealed, ContentInput::Document(DOCUMENT))
    );

    let other = StandardCrypto.digest(DigestAlgorithm::Blake3, DOCUMENT);
    assert_eq!(
        status_of(&sealed, ContentInput::Digest(&other)),
        ValidationStatus::SignatureNotMatchData
    );
}

#[test]
fn test_evidence_expiring_before_timestamp() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let mut ocsp = MockRevocation::ocsp();
    ocsp.this_update = at(2025, 5, 1);
    ocsp.next_update = at(2025, 6, 1);
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    assert_eq!(
        status_of(&sealed, ContentInput::Document(DOCUMENT)),
        ValidationStatus::TimestampAfterValidityItem
    );
}

#[test]
fn test_evidence_about_another_certificate() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let genuine = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    let mut items = genuine.bundle().revocation().to_vec();
    items[0].subject = pki.root.identity();
    let forged = reseal_with_revocation(&genuine, &items, &pki.sealer);

    assert_eq!(
        status_of(&forged, ContentInput::Document(DOCUMENT)),
        ValidationStatus::InvalidValidityItem
    );
}

#[test]
fn test_revoked_signer() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let mut ocsp = MockRevocation::ocsp();
    ocsp.status = RevocationStatus::Revoked {
        revoked_at: at(2025, 3, 1),
        reason: Some("key_compromise".to_string()),
    };
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    let outcome = EvidenceValidator::new(&StandardCrypto, ValidatorConfig::default())
        .validate(&sealed, ContentInput::Document(DOCUMENT));
    assert_eq!(outcome.status, ValidationStatus::InvalidValidityItem);
    assert_eq!(outcome.status.as_code(), "INVALID_VALIDITY_ITEM");
}

#[test]
fn test_unknown_status_is_not_good() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let mut ocsp = MockRevocation::ocsp();
    ocsp.status = RevocationStatus::Unknown;
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));

    assert_eq!(
        status_of(&sealed, ContentInput::Document(DOCUMENT)),
        ValidationStatus::InvalidValidityItem
    );
}

#[test]
fn test_archive_timestamps_keep_bundle_valid() {
    let pki = Pki::new();
    let tsa = MockTsa::new();
    let ocsp = MockRevocation::ocsp();
    let bundle = full_bundle(&pki, &tsa, &ocsp);
    let archived = builder().add_archive_timestamp(&bundle, &tsa).unwrap();
    let archived = builder().add_archive_timestamp(&archived, &tsa).unwrap();

    let parsed = SealedBundle::from_base64(&sealed(&pki, &archived).to_base64()).unwrap();
    let outcome = EvidenceValidator::new(&StandardCrypto, ValidatorConfig::default())
        .validate(&parsed, ContentInput::Document(DOCUMENT));
    assert_eq!(outcome.status, ValidationStatus::Valid);
    assert_eq!(outcome.archive_timestamps.len(), 2);
}

#[test]
fn test_validation_is_repeatable() {
    let pki = Pki::new();
    let tsa = MockTsa::with_mode(TsaMode::CorruptSignature);
    let ocsp = MockRevocation::ocsp();
    let sealed = sealed(&pki, &full_bundle(&pki, &tsa, &ocsp));
    let validator = EvidenceValidator::new(&StandardCrypto, ValidatorConfig::default());

    let first = validator.validate(&sealed, ContentInput::Document(DOCUMENT));
    let second = validator.validate(&sealed, ContentInput::Document(DOCUMENT));
    assert_eq!(first.status, second.status);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.warnings.len(), 1);
}
