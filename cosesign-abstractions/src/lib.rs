// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared interfaces for the COSE signing and verification crates.
//!
//! This crate exists to prevent circular dependencies across:
//! - the sign/verify engines (`cosesign-signing`, `cosesign-validation`)
//! - crypto backends (`cosesign-crypto` and any future provider)
//!
//! It is intentionally kept small and stable: the crypto-provider facade,
//! the signer/verifier abstractions the engines dispatch through, and the
//! kid-matching policy.

pub mod crypto;
pub mod signer;
pub mod verifier;

pub use crypto::{digest_sig_structure, CryptoProvider, HashContext, KeyHandle, TbsInput};
pub use signer::SignatureSigner;
pub use verifier::{KidPolicy, SignatureVerifier, VerifyDisposition};
