// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign1 / COSE_Sign emission.
//!
//! The engine drives an ordered chain of signers through two passes over the
//! same code: a counting pass that learns the exact output size, then a real
//! pass into a caller-supplied buffer. The concrete signers:
//! - [`MainSigner`]: the hash-then-sign families (ECDSA, RSASSA-PSS).
//! - [`EddsaSigner`]: EdDSA, which signs the whole serialized Sig_structure
//!   and therefore materializes it into a bounded auxiliary buffer.
//! - [`ShortCircuitSigner`] (feature `short-circuit`): test-only
//!   pseudo-signing where the signature is the TBS digest.

mod engine;
mod signer_eddsa;
mod signer_main;
#[cfg(feature = "short-circuit")]
mod signer_short;

pub use engine::SignEngine;
pub use signer_eddsa::EddsaSigner;
pub use signer_main::MainSigner;
#[cfg(feature = "short-circuit")]
pub use signer_short::ShortCircuitSigner;

pub(crate) fn enc_err(
    _: minicbor::encode::Error<cosesign_common::EndOfBuffer>,
) -> cosesign_common::CoseError {
    cosesign_common::CoseError::EncodeBufferTooSmall
}
