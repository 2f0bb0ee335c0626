// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The narrow facade over cryptographic primitives.
//!
//! Engines and concrete signers never call a crypto crate directly; they go
//! through [`CryptoProvider`]. Key material crosses this boundary as opaque
//! bytes so new backends (HSMs, other crypto crates) plug in without touching
//! the engines.

use cosesign_common::{CoseError, HashAlgorithm, SigStructure};
use cosesign_common::Algorithm;

/// Borrowed key material handed to a crypto provider.
///
/// The engines never interpret these bytes. The default provider expects
/// PKCS#8 DER for ECDSA/RSA private keys, SPKI DER for ECDSA/RSA public
/// keys, and raw 32-byte Ed25519 seeds (private) or points (public).
#[derive(Debug, Copy, Clone)]
pub struct KeyHandle<'a> {
    bytes: &'a [u8],
}

impl<'a> KeyHandle<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        KeyHandle { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Incremental hash computation handed out by a provider.
pub trait HashContext {
    fn update(&mut self, data: &[u8]);
    fn finish(self: Box<Self>) -> Vec<u8>;
}

/// What a provider signs or verifies.
#[derive(Debug, Copy, Clone)]
pub enum TbsInput<'a> {
    /// Digest of the Sig_structure (hash-then-sign algorithms).
    Digest(&'a [u8]),
    /// The full serialized Sig_structure (hash-less algorithms).
    Message(&'a [u8]),
}

/// Narrow facade over sign, verify, and hash primitives.
///
/// Implementations parse key bytes per call and must not retain them.
/// A provider that writes signatures into a bounded buffer reports overflow
/// as [`CoseError::SigBufferTooSmall`].
pub trait CryptoProvider {
    /// Produce a signature over `input`, returning the raw signature bytes
    /// in the COSE wire form for `algorithm` (e.g. `r || s` for ECDSA).
    fn sign(
        &self,
        algorithm: Algorithm,
        key: KeyHandle<'_>,
        input: TbsInput<'_>,
    ) -> Result<Vec<u8>, CoseError>;

    /// Check `signature` over `input`. `kid` is advisory, for providers that
    /// resolve keys by identifier.
    fn verify(
        &self,
        algorithm: Algorithm,
        key: KeyHandle<'_>,
        kid: Option<&[u8]>,
        input: TbsInput<'_>,
        signature: &[u8],
    ) -> Result<(), CoseError>;

    /// The exact signature length `sign` would produce. Used by the
    /// size-calculation pass, so it must match the real pass byte for byte.
    fn sig_size(&self, algorithm: Algorithm, key: KeyHandle<'_>) -> Result<usize, CoseError>;

    /// Begin an incremental hash.
    fn hash_start(&self, algorithm: HashAlgorithm) -> Result<Box<dyn HashContext>, CoseError>;
}

struct HashWriter<'a>(&'a mut dyn HashContext);

impl minicbor::encode::Write for HashWriter<'_> {
    type Error = core::convert::Infallible;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.0.update(buf);
        Ok(())
    }
}

/// Digest a Sig_structure by streaming its encoding into the provider's
/// hash, without materializing the serialized array.
pub fn digest_sig_structure(
    provider: &dyn CryptoProvider,
    hash: HashAlgorithm,
    sig_structure: &SigStructure<'_>,
) -> Result<Vec<u8>, CoseError> {
    let mut ctx = provider.hash_start(hash)?;
    {
        let mut enc = minicbor::Encoder::new(HashWriter(ctx.as_mut()));
        sig_structure
            .encode_into(&mut enc)
            .map_err(|_| CoseError::HashGeneralFail)?;
    }
    Ok(ctx.finish())
}
