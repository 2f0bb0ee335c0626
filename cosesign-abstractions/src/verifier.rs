// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The abstraction the verify engine dispatches through.
//!
//! Verifiers form an ordered chain. For each signature the engine offers the
//! chain in order; a verifier that does not handle the signature (wrong
//! algorithm, non-matching kid under the decline policy) returns
//! [`VerifyDisposition::Declined`] and the engine moves on. `Declined` is a
//! control signal, not an error; only a verifier that accepts and then fails
//! produces an error.

use minicbor::Decoder;

use cosesign_common::{CoseError, ParameterList, ParameterStorage, VerifyOptions};

/// Outcome of offering a signature to one verifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerifyDisposition {
    /// The verifier handled the signature and it checked out (or structure
    /// validation passed in decode-only mode).
    Verified,
    /// Not this verifier's signature; try the next one in the chain.
    Declined,
}

/// How a verifier treats a message kid that does not match its expectation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum KidPolicy {
    /// Decline, letting another verifier in the chain try. Chains of
    /// verifiers with distinct kids form a multi-key registry.
    #[default]
    Decline,
    /// Fail hard with [`CoseError::KidUnmatched`].
    Fail,
}

/// One verifier attached to a verify engine.
pub trait SignatureVerifier {
    /// COSE_Sign path: decode one COSE_Signature from `decoder`, then verify
    /// it. The engine snapshots the decoder position beforehand, so a
    /// verifier is free to consume the element and then decline.
    #[allow(clippy::too_many_arguments)]
    fn verify_signature(
        &self,
        options: &VerifyOptions,
        body_protected: &[u8],
        payload: &[u8],
        aad: &[u8],
        storage: &mut ParameterStorage,
        decoder: &mut Decoder<'_>,
    ) -> Result<VerifyDisposition, CoseError>;

    /// COSE_Sign1 path: the engine has already decoded the signature bytes
    /// and merged the body parameter buckets. `sign_protected` is `Some`
    /// only when called from a COSE_Signature context.
    #[allow(clippy::too_many_arguments)]
    fn verify1(
        &self,
        options: &VerifyOptions,
        body_protected: &[u8],
        sign_protected: Option<&[u8]>,
        payload: &[u8],
        aad: &[u8],
        parameters: &ParameterList,
        signature: &[u8],
    ) -> Result<VerifyDisposition, CoseError>;
}
