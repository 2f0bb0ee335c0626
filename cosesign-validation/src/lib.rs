// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign1 / COSE_Sign decoding and signature verification.
//!
//! The engine decodes the message shell, enforces the header invariants
//! (duplicates, criticality, bucket placement), then dispatches each
//! signature across an ordered verifier chain. A verifier that does not
//! handle a signature declines and the next one is offered it; only an
//! accepted-then-failed check is an error. The concrete verifiers mirror
//! the signer set: [`MainVerifier`] (ECDSA, RSASSA-PSS), [`EddsaVerifier`],
//! and the feature-gated [`ShortCircuitVerifier`].

mod engine;
mod verifier_eddsa;
mod verifier_main;
#[cfg(feature = "short-circuit")]
mod verifier_short;

pub use engine::{VerifyEngine, VerifiedSign, VerifiedSign1, DEFAULT_PARAMETER_CAPACITY};
pub use verifier_eddsa::EddsaVerifier;
pub use verifier_main::MainVerifier;
#[cfg(feature = "short-circuit")]
pub use verifier_short::ShortCircuitVerifier;

use cosesign_common::CoseError;

/// Map a CBOR decode error: not-well-formed input keeps its own kind,
/// anything else is the structural error for the message being decoded.
pub(crate) fn wf(e: minicbor::decode::Error, structural: CoseError) -> CoseError {
    if e.is_end_of_input() {
        CoseError::CborNotWellFormed
    } else {
        structural
    }
}
