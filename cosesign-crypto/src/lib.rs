// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The default [`CryptoProvider`] implementation, backed by the RustCrypto
//! crates: `p256`/`p384`/`p521` for ECDSA, `rsa` for RSASSA-PSS,
//! `ed25519-dalek` for EdDSA, and `sha2` for hashing.
//!
//! The `short-circuit` feature (on by default, disabled for production with
//! `default-features = false`) adds a test-only pseudo-signing mode where the
//! "signature" is the TBS digest itself.
//!
//! [`CryptoProvider`]: cosesign_abstractions::CryptoProvider

mod provider;
#[cfg(feature = "short-circuit")]
mod short_circuit;

pub use provider::RustCryptoProvider;
#[cfg(feature = "short-circuit")]
pub use short_circuit::SHORT_CIRCUIT_KID;
