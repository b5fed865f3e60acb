//! Fuzz target for sealed envelope decoding and validation.
//!
//! This fuzzer tests that:
//! 1. Arbitrary bytes (raw or as Base64 text) decode without panicking
//! 2. Decoded envelopes validate without panicking
//! 3. Decoded envelopes re-encode to the exact input bytes

#![no_main]
use libfuzzer_sys::fuzz_target;
use ltsig_core::crypto::StandardCrypto;
use ltsig_core::evidence::{ContentInput, EvidenceValidator, SealedBundle, ValidatorConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = SealedBundle::from_base64(text);
    }

    if let Ok(sealed) = SealedBundle::from_bytes(data) {
        // The envelope keeps the raw parts it was parsed from.
        assert_eq!(sealed.to_bytes(), data, "re-encoding mismatch");

        let validator = EvidenceValidator::new(&StandardCrypto, ValidatorConfig::default());
        let _ = validator.validate(&sealed, ContentInput::Document(data));
    }
});
