// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verify engine coverage: round trips against the sign engine, tag and
//! signature policies, header invariants on malformed input, and verifier
//! dispatch.

use cosesign_abstractions::{KeyHandle, KidPolicy, SignatureSigner};
use cosesign_common::{
    Algorithm, CoseError, SignOptions, SignaturePolicy, TagPolicy, VerifyOptions,
};
use cosesign_signing::{MainSigner, ShortCircuitSigner, SignEngine};
use cosesign_validation::{MainVerifier, ShortCircuitVerifier, VerifyEngine};

use minicbor::Encoder;
use p256::pkcs8::{EncodePrivateKey as _, EncodePublicKey as _};
use rand_core::OsRng;

fn sign1(signer: &dyn SignatureSigner, options: SignOptions, payload: &[u8], aad: &[u8]) -> Vec<u8> {
    let mut engine = SignEngine::new(options);
    engine.add_signer(signer);
    let size = engine.sign1_size(payload, aad, &[]).unwrap();
    let mut out = vec![0u8; size];
    engine.sign1(payload, aad, &[], &mut out).unwrap();
    out
}

fn short_circuit_sign1(payload: &[u8], aad: &[u8]) -> Vec<u8> {
    let signer = ShortCircuitSigner::new(Algorithm::ShortCircuit256).unwrap();
    sign1(&signer, SignOptions::default(), payload, aad)
}

fn p256_keys() -> (p256::pkcs8::SecretDocument, p256::pkcs8::Document) {
    let sk = p256::ecdsa::SigningKey::random(&mut OsRng);
    (
        sk.to_pkcs8_der().unwrap(),
        sk.verifying_key().to_public_key_der().unwrap(),
    )
}

#[test]
fn short_circuit_round_trip() {
    let message = short_circuit_sign1(b"hello world, signed", b"");
    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);

    let verified = engine.verify1(&message, None, &[]).unwrap();
    assert_eq!(verified.payload, b"hello world, signed");
    assert_eq!(
        verified.parameters.protected_alg(),
        Some(Algorithm::ShortCircuit256.id())
    );
}

#[test]
fn tampered_payload_fails_verification() {
    let payload = b"a payload long enough to find";
    let mut message = short_circuit_sign1(payload, b"");

    // Flip one bit inside the embedded payload bytes.
    let pos = message
        .windows(payload.len())
        .position(|w| w == payload)
        .unwrap();
    message[pos + 3] ^= 0x01;

    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::SigVerifyFail
    );
}

#[test]
fn tampered_protected_headers_fail_verification() {
    let (sk, pk) = p256_keys();
    let signer = MainSigner::new(Algorithm::ES256, KeyHandle::new(sk.as_bytes())).unwrap();
    let mut message = sign1(&signer, SignOptions::default(), b"payload", b"");

    // protected = bstr({1: -7}); rewriting the alg value byte changes the
    // signed header bytes out from under the signature.
    let pattern = [0x43u8, 0xa1, 0x01, 0x26];
    let pos = message
        .windows(pattern.len())
        .position(|w| w == pattern)
        .unwrap();
    message[pos + 3] = 0x27; // alg -7 -> -8

    let verifier = MainVerifier::new(KeyHandle::new(pk.as_bytes()));
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);
    // The rewritten alg now names an algorithm this verifier declines.
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::NoVerifierForAlg
    );
}

#[test]
fn aad_mismatch_fails_verification() {
    let message = short_circuit_sign1(b"payload", b"aad-at-signing");
    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);

    engine.verify1(&message, None, b"aad-at-signing").unwrap();
    assert_eq!(
        engine.verify1(&message, None, b"different-aad").unwrap_err(),
        CoseError::SigVerifyFail
    );
}

#[test]
fn tag_policies_are_enforced() {
    let verifier = ShortCircuitVerifier::new();

    let untagged = sign1(
        &ShortCircuitSigner::new(Algorithm::ShortCircuit256).unwrap(),
        SignOptions {
            omit_cbor_tag: true,
            ..Default::default()
        },
        b"x",
        b"",
    );
    let tagged = short_circuit_sign1(b"x", b"");

    let mut engine = VerifyEngine::new(VerifyOptions {
        tag_policy: TagPolicy::Required,
        ..Default::default()
    });
    engine.add_verifier(&verifier);
    assert_eq!(
        engine.verify1(&untagged, None, &[]).unwrap_err(),
        CoseError::TagRequired
    );
    engine.verify1(&tagged, None, &[]).unwrap();

    let mut engine = VerifyEngine::new(VerifyOptions {
        tag_policy: TagPolicy::Prohibited,
        ..Default::default()
    });
    engine.add_verifier(&verifier);
    assert_eq!(
        engine.verify1(&tagged, None, &[]).unwrap_err(),
        CoseError::TagProhibited
    );
    engine.verify1(&untagged, None, &[]).unwrap();
}

#[test]
fn detached_payload_requires_external_bytes() {
    let signer = ShortCircuitSigner::new(Algorithm::ShortCircuit256).unwrap();
    let message = sign1(
        &signer,
        SignOptions {
            detached_payload: true,
            ..Default::default()
        },
        b"out of band",
        b"",
    );

    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);

    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::MissingPayload
    );

    let verified = engine.verify1(&message, Some(b"out of band"), &[]).unwrap();
    assert_eq!(verified.payload, b"out of band");

    assert_eq!(
        engine.verify1(&message, Some(b"wrong payload"), &[]).unwrap_err(),
        CoseError::SigVerifyFail
    );
}

/// Hand-builds an untagged COSE_Sign1 from raw parts.
fn build_sign1(protected: &[u8], payload: &[u8], signature: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    enc.array(4).unwrap();
    enc.bytes(protected).unwrap();
    enc.map(0).unwrap();
    enc.bytes(payload).unwrap();
    enc.bytes(signature).unwrap();
    enc.into_writer()
}

#[test]
fn unknown_critical_parameter_is_rejected() {
    // protected = {1: -7, 2: [99], 99: h'00'}
    let mut enc = Encoder::new(Vec::new());
    enc.map(3).unwrap();
    enc.i64(1).unwrap();
    enc.i64(-7).unwrap();
    enc.i64(2).unwrap();
    enc.array(1).unwrap();
    enc.i64(99).unwrap();
    enc.i64(99).unwrap();
    enc.bytes(&[0x00]).unwrap();
    let protected = enc.into_writer();

    let message = build_sign1(&protected, b"hello", &[0u8; 64]);
    let engine = VerifyEngine::new(VerifyOptions::default());
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::UnknownCriticalParameter
    );
}

#[test]
fn duplicate_label_across_buckets_is_rejected() {
    // protected = {4: h'aa'}, unprotected = {4: h'aa'}
    let mut enc = Encoder::new(Vec::new());
    enc.map(1).unwrap();
    enc.i64(4).unwrap();
    enc.bytes(&[0xaa]).unwrap();
    let protected = enc.into_writer();

    let mut enc = Encoder::new(Vec::new());
    enc.array(4).unwrap();
    enc.bytes(&protected).unwrap();
    enc.map(1).unwrap();
    enc.i64(4).unwrap();
    enc.bytes(&[0xaa]).unwrap();
    enc.bytes(b"hello").unwrap();
    enc.bytes(&[0u8; 64]).unwrap();
    let message = enc.into_writer();

    let engine = VerifyEngine::new(VerifyOptions::default());
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::DuplicateParameter
    );
}

#[test]
fn missing_alg_in_protected_bucket_is_rejected() {
    let message = build_sign1(&[], b"hello", &[0u8; 64]);
    let engine = VerifyEngine::new(VerifyOptions::default());
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::UnsupportedSigningAlg
    );
}

#[test]
fn decode_only_skips_the_signature_check() {
    let mut message = short_circuit_sign1(b"payload", b"");
    let len = message.len();
    message[len - 1] ^= 0xff; // corrupt the signature

    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions {
        decode_only: true,
        ..Default::default()
    });
    engine.add_verifier(&verifier);
    engine.verify1(&message, None, &[]).unwrap();
}

#[test]
fn no_verifier_for_the_algorithm_fails_dispatch() {
    let (sk_der, _) = p256_keys();
    let signer = MainSigner::new(Algorithm::ES256, KeyHandle::new(sk_der.as_bytes())).unwrap();
    let message = sign1(&signer, SignOptions::default(), b"payload", b"");

    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::NoVerifierForAlg
    );
}

#[test]
fn kid_dispatch_declines_to_the_matching_verifier() {
    let (_, pk1) = p256_keys();
    let (sk2, pk2) = p256_keys();

    let signer = MainSigner::new(Algorithm::ES256, KeyHandle::new(sk2.as_bytes()))
        .unwrap()
        .with_kid(b"key-2");
    let message = sign1(&signer, SignOptions::default(), b"payload", b"");

    let v1 = MainVerifier::new(KeyHandle::new(pk1.as_bytes())).with_kid(b"key-1");
    let v2 = MainVerifier::new(KeyHandle::new(pk2.as_bytes())).with_kid(b"key-2");

    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&v1);
    engine.add_verifier(&v2);
    let verified = engine.verify1(&message, None, &[]).unwrap();
    assert_eq!(verified.parameters.kid(), Some(b"key-2".as_slice()));
}

#[test]
fn kid_fail_policy_is_a_hard_error() {
    let (sk, pk) = p256_keys();
    let signer = MainSigner::new(Algorithm::ES256, KeyHandle::new(sk.as_bytes()))
        .unwrap()
        .with_kid(b"key-2");
    let message = sign1(&signer, SignOptions::default(), b"payload", b"");

    let v = MainVerifier::new(KeyHandle::new(pk.as_bytes()))
        .with_kid(b"key-1")
        .with_kid_policy(KidPolicy::Fail);
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&v);
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::KidUnmatched
    );
}

fn two_signer_cose_sign(payload: &[u8]) -> (Vec<u8>, p256::pkcs8::Document) {
    let sk = p256::ecdsa::SigningKey::random(&mut OsRng);
    let sk_der = sk.to_pkcs8_der().unwrap();
    let pk_der = sk.verifying_key().to_public_key_der().unwrap();

    let es_signer = MainSigner::new(Algorithm::ES256, KeyHandle::new(sk_der.as_bytes())).unwrap();
    let sc_signer = ShortCircuitSigner::new(Algorithm::ShortCircuit256).unwrap();

    let mut engine = SignEngine::new(SignOptions::default());
    engine.add_signer(&es_signer);
    engine.add_signer(&sc_signer);
    let size = engine.sign_size(payload, &[], &[]).unwrap();
    let mut out = vec![0u8; size];
    engine.sign(payload, &[], &[], &mut out).unwrap();
    (out, pk_der)
}

#[test]
fn cose_sign_verifies_under_both_policies() {
    let (message, pk_der) = two_signer_cose_sign(b"multi-signed");

    let es_verifier = MainVerifier::new(KeyHandle::new(pk_der.as_bytes()));
    let sc_verifier = ShortCircuitVerifier::new();

    for policy in [SignaturePolicy::AtLeastOne, SignaturePolicy::AllValid] {
        let mut engine = VerifyEngine::new(VerifyOptions {
            signature_policy: policy,
            ..Default::default()
        });
        engine.add_verifier(&es_verifier);
        engine.add_verifier(&sc_verifier);

        let verified = engine.verify(&message, None, &[]).unwrap();
        assert_eq!(verified.payload, b"multi-signed");
        assert_eq!(verified.signature_count, 2);
        assert_eq!(verified.verified_count, 2);
    }
}

#[test]
fn cose_sign_policies_differ_on_one_bad_signature() {
    let (mut message, pk_der) = two_signer_cose_sign(b"multi-signed");
    // The short-circuit signature is the last bstr in the message.
    let len = message.len();
    message[len - 1] ^= 0xff;

    let es_verifier = MainVerifier::new(KeyHandle::new(pk_der.as_bytes()));
    let sc_verifier = ShortCircuitVerifier::new();

    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&es_verifier);
    engine.add_verifier(&sc_verifier);
    let verified = engine.verify(&message, None, &[]).unwrap();
    assert_eq!(verified.signature_count, 2);
    assert_eq!(verified.verified_count, 1);

    let mut engine = VerifyEngine::new(VerifyOptions {
        signature_policy: SignaturePolicy::AllValid,
        ..Default::default()
    });
    engine.add_verifier(&es_verifier);
    engine.add_verifier(&sc_verifier);
    assert_eq!(
        engine.verify(&message, None, &[]).unwrap_err(),
        CoseError::SigVerifyFail
    );
}

#[test]
fn empty_signatures_array_is_rejected() {
    let mut enc = Encoder::new(Vec::new());
    enc.map(1).unwrap();
    enc.i64(1).unwrap();
    enc.i64(-7).unwrap();
    let protected = enc.into_writer();

    let mut enc = Encoder::new(Vec::new());
    enc.array(4).unwrap();
    enc.bytes(&protected).unwrap();
    enc.map(0).unwrap();
    enc.bytes(b"payload").unwrap();
    enc.array(0).unwrap();
    let message = enc.into_writer();

    let engine = VerifyEngine::new(VerifyOptions::default());
    assert_eq!(
        engine.verify(&message, None, &[]).unwrap_err(),
        CoseError::NoSignatures
    );
}

#[test]
fn strict_header_encoding_rejects_the_empty_map_form() {
    // protected bstr containing an empty map rather than the zero-length bstr.
    let message = build_sign1(&[0xa0], b"hello", &[0u8; 32]);

    let engine = VerifyEngine::new(VerifyOptions {
        strict_header_encoding: true,
        ..Default::default()
    });
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::ParameterType
    );

    // Non-strict decode gets past the headers (and then fails on the absent
    // alg, proving the empty-map form itself was accepted).
    let engine = VerifyEngine::new(VerifyOptions::default());
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::UnsupportedSigningAlg
    );
}

#[test]
fn trailing_bytes_after_the_message_are_rejected() {
    let mut message = short_circuit_sign1(b"x", b"");
    message.push(0x00);

    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);
    assert_eq!(
        engine.verify1(&message, None, &[]).unwrap_err(),
        CoseError::Sign1Format
    );
}

#[test]
fn truncated_input_is_not_well_formed() {
    let message = short_circuit_sign1(b"some payload", b"");
    let truncated = &message[..message.len() / 2];

    let verifier = ShortCircuitVerifier::new();
    let mut engine = VerifyEngine::new(VerifyOptions::default());
    engine.add_verifier(&verifier);
    assert_eq!(
        engine.verify1(truncated, None, &[]).unwrap_err(),
        CoseError::CborNotWellFormed
    );
}
