// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The abstraction the sign engine drives.
//!
//! Each concrete signer owns one signing capability: an algorithm, a key
//! handle, and the header parameters it wants on the wire. The engine knows
//! nothing beyond this trait, so new algorithms (counter-signers,
//! post-quantum schemes) plug in without modifying the engine. A signer may
//! serve one algorithm or a family; the hash-then-sign signer covers ECDSA
//! and RSASSA-PSS because they differ only in the primitive invoked.

use minicbor::Encoder;

use cosesign_common::{CoseError, MessageKind, MessageSink, Parameter, SignOptions};

/// One signer attached to a sign engine.
pub trait SignatureSigner {
    /// Header parameters this signer contributes to the COSE_Sign1 body
    /// (typically `alg` and `kid`), merged into the caller's body headers
    /// under the no-duplicate rule. Never called for COSE_Sign; there each
    /// signer carries its parameters inside its own COSE_Signature.
    fn body_parameters(&self) -> Vec<Parameter>;

    /// Produce the signature.
    ///
    /// For [`MessageKind::Sign1`] append a bare signature byte string; for
    /// [`MessageKind::Sign`] append a complete COSE_Signature array
    /// `[protected bstr, unprotected map, signature bstr]`.
    ///
    /// When the encoder's sink is in size-only mode, no signing takes place:
    /// the signer must append a placeholder of exactly the length a real
    /// signature would occupy, so the size pass and the real pass agree.
    fn sign(
        &self,
        kind: MessageKind,
        options: &SignOptions,
        body_protected: &[u8],
        aad: &[u8],
        payload: &[u8],
        encoder: &mut Encoder<MessageSink<'_>>,
    ) -> Result<(), CoseError>;
}
