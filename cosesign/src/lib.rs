// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! High-level COSE signing and verification facade.
//!
//! This crate re-exports the workspace surface and adds the two-pass
//! convenience helpers most callers want: run the size-calculation pass,
//! allocate, then emit for real. Callers on fixed buffers use
//! [`SignEngine`] directly.
//!
//! ```no_run
//! use cosesign::{
//!     Algorithm, KeyHandle, MainSigner, MainVerifier, SignOptions, VerifyEngine,
//!     VerifyOptions,
//! };
//!
//! # fn demo(pkcs8_der: &[u8], spki_der: &[u8]) -> Result<(), cosesign::CoseError> {
//! let signer = MainSigner::new(Algorithm::ES256, KeyHandle::new(pkcs8_der))?;
//! let message = cosesign::sign1_to_vec(&signer, &SignOptions::default(), b"payload", &[], &[])?;
//!
//! let verifier = MainVerifier::new(KeyHandle::new(spki_der));
//! let mut engine = VerifyEngine::new(VerifyOptions::default());
//! engine.add_verifier(&verifier);
//! let verified = engine.verify1(&message, None, &[])?;
//! assert_eq!(verified.payload, b"payload");
//! # Ok(())
//! # }
//! ```

pub use cosesign_abstractions::{
    digest_sig_structure, CryptoProvider, HashContext, KeyHandle, KidPolicy, SignatureSigner,
    SignatureVerifier, TbsInput, VerifyDisposition,
};
pub use cosesign_common::{
    check_critical, decode_header_buckets, label, Algorithm, CoseError, DecodedHeaders,
    EndOfBuffer, HashAlgorithm, Label, MessageKind, MessageSink, Parameter, ParameterList,
    ParameterReader, ParameterStorage, ParameterValue, SigStructure, SignOptions,
    SignaturePolicy, TagPolicy, VerifyOptions, COSE_SIGN1_TAG, COSE_SIGN_TAG,
};
pub use cosesign_crypto::RustCryptoProvider;
#[cfg(feature = "short-circuit")]
pub use cosesign_crypto::SHORT_CIRCUIT_KID;
#[cfg(feature = "short-circuit")]
pub use cosesign_signing::ShortCircuitSigner;
pub use cosesign_signing::{EddsaSigner, MainSigner, SignEngine};
#[cfg(feature = "short-circuit")]
pub use cosesign_validation::ShortCircuitVerifier;
pub use cosesign_validation::{
    EddsaVerifier, MainVerifier, VerifiedSign, VerifiedSign1, VerifyEngine,
    DEFAULT_PARAMETER_CAPACITY,
};

/// Sign a COSE_Sign1 into a freshly allocated buffer.
///
/// Runs the size-calculation pass first so the allocation is exact.
pub fn sign1_to_vec(
    signer: &dyn SignatureSigner,
    options: &SignOptions,
    payload: &[u8],
    aad: &[u8],
    body_parameters: &[Parameter],
) -> Result<Vec<u8>, CoseError> {
    let mut engine = SignEngine::new(options.clone());
    engine.add_signer(signer);
    let size = engine.sign1_size(payload, aad, body_parameters)?;
    let mut out = vec![0u8; size];
    let written = engine.sign1(payload, aad, body_parameters, &mut out)?;
    out.truncate(written);
    Ok(out)
}

/// Sign a COSE_Sign with one COSE_Signature per signer into a freshly
/// allocated buffer.
pub fn sign_to_vec(
    signers: &[&dyn SignatureSigner],
    options: &SignOptions,
    payload: &[u8],
    aad: &[u8],
    body_parameters: &[Parameter],
) -> Result<Vec<u8>, CoseError> {
    let mut engine = SignEngine::new(options.clone());
    for signer in signers {
        engine.add_signer(*signer);
    }
    let size = engine.sign_size(payload, aad, body_parameters)?;
    let mut out = vec![0u8; size];
    let written = engine.sign(payload, aad, body_parameters, &mut out)?;
    out.truncate(written);
    Ok(out)
}
