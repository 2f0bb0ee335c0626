// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cell::Cell;

use minicbor::Encoder;

use cosesign_abstractions::{CryptoProvider, KeyHandle, SignatureSigner, TbsInput};
use cosesign_common::{
    Algorithm, CoseError, MessageKind, MessageSink, Parameter, ParameterList, SigStructure,
    SignOptions,
};
use cosesign_crypto::RustCryptoProvider;

use crate::enc_err;

/// EdDSA signer.
///
/// EdDSA has no prehash step: the primitive consumes the whole serialized
/// Sig_structure, so this signer materializes it into an auxiliary buffer.
/// The buffer bound is caller-configurable; a Sig_structure exceeding it
/// fails with [`CoseError::TbsTooLarge`]. Both passes record the size the
/// buffer needed, so a size-calculation pass also tells the caller how big
/// an auxiliary bound a constrained deployment must budget.
pub struct EddsaSigner<'a> {
    key: KeyHandle<'a>,
    kid: Option<&'a [u8]>,
    extra_parameters: Vec<Parameter>,
    provider: &'a dyn CryptoProvider,
    auxiliary_bound: usize,
    auxiliary_high_water: Cell<usize>,
}

impl<'a> EddsaSigner<'a> {
    /// An EdDSA signer over a raw 32-byte Ed25519 seed.
    pub fn new(key: KeyHandle<'a>) -> Self {
        EddsaSigner {
            key,
            kid: None,
            extra_parameters: Vec::new(),
            provider: &RustCryptoProvider,
            auxiliary_bound: usize::MAX,
            auxiliary_high_water: Cell::new(0),
        }
    }

    pub fn with_kid(mut self, kid: &'a [u8]) -> Self {
        self.kid = Some(kid);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.extra_parameters = parameters;
        self
    }

    pub fn with_provider(mut self, provider: &'a dyn CryptoProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Bound the auxiliary Sig_structure buffer.
    pub fn with_auxiliary_buffer_bound(mut self, bound: usize) -> Self {
        self.auxiliary_bound = bound;
        self
    }

    /// The auxiliary buffer size the most recent pass needed (or would have
    /// needed, after a size-calculation pass).
    pub fn auxiliary_buffer_size(&self) -> usize {
        self.auxiliary_high_water.get()
    }

    fn own_parameters(&self) -> Vec<Parameter> {
        let mut out = vec![Parameter::alg(Algorithm::EdDsa)];
        if let Some(kid) = self.kid {
            out.push(Parameter::kid(kid));
        }
        out.extend(self.extra_parameters.iter().cloned());
        out
    }
}

impl SignatureSigner for EddsaSigner<'_> {
    fn body_parameters(&self) -> Vec<Parameter> {
        self.own_parameters()
    }

    fn sign(
        &self,
        kind: MessageKind,
        options: &SignOptions,
        body_protected: &[u8],
        aad: &[u8],
        payload: &[u8],
        encoder: &mut Encoder<MessageSink<'_>>,
    ) -> Result<(), CoseError> {
        let mut sign_protected = Vec::new();
        if kind == MessageKind::Sign {
            let parameters = ParameterList::from_slice(&self.own_parameters())?;
            sign_protected = parameters.encode_protected(options.canonical_encoding)?;
            encoder.array(3).map_err(enc_err)?;
            encoder.bytes(&sign_protected).map_err(enc_err)?;
            parameters
                .encode_unprotected(encoder, options.canonical_encoding)
                .map_err(enc_err)?;
        }

        let sign_protected_ref = match kind {
            MessageKind::Sign => Some(sign_protected.as_slice()),
            MessageKind::Sign1 => None,
        };
        let sig_structure = SigStructure {
            kind,
            body_protected,
            sign_protected: sign_protected_ref,
            external_aad: aad,
            payload,
        };
        self.auxiliary_high_water.set(sig_structure.encoded_size());

        if encoder.writer().is_size_only() {
            let size = self.provider.sig_size(Algorithm::EdDsa, self.key)?;
            encoder.bytes(&vec![0u8; size]).map_err(enc_err)?;
            return Ok(());
        }

        let tbs = sig_structure.to_vec_bounded(self.auxiliary_bound)?;
        let signature = self
            .provider
            .sign(Algorithm::EdDsa, self.key, TbsInput::Message(&tbs))?;
        encoder.bytes(&signature).map_err(enc_err)?;
        Ok(())
    }
}
