// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use minicbor::Encoder;

use cosesign_abstractions::{
    digest_sig_structure, CryptoProvider, KeyHandle, SignatureSigner, TbsInput,
};
use cosesign_common::{
    Algorithm, CoseError, MessageKind, MessageSink, Parameter, ParameterList, SigStructure,
    SignOptions,
};
use cosesign_crypto::{RustCryptoProvider, SHORT_CIRCUIT_KID};

use crate::enc_err;

/// Test-only signer whose "signature" is the TBS digest.
///
/// Useful for exercising the full encode/decode pipeline without key
/// material. Messages carry the fixed short-circuit kid so the matching
/// verifier refuses anything that was not produced by this mode.
pub struct ShortCircuitSigner<'a> {
    algorithm: Algorithm,
    extra_parameters: Vec<Parameter>,
    provider: &'a dyn CryptoProvider,
}

impl<'a> ShortCircuitSigner<'a> {
    /// A signer for one of the short-circuit pseudo-algorithms.
    pub fn new(algorithm: Algorithm) -> Result<Self, CoseError> {
        if !algorithm.is_short_circuit() {
            return Err(CoseError::UnsupportedSigningAlg);
        }
        Ok(ShortCircuitSigner {
            algorithm,
            extra_parameters: Vec::new(),
            provider: &RustCryptoProvider,
        })
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.extra_parameters = parameters;
        self
    }

    pub fn with_provider(mut self, provider: &'a dyn CryptoProvider) -> Self {
        self.provider = provider;
        self
    }

    fn own_parameters(&self) -> Vec<Parameter> {
        let mut out = vec![
            Parameter::alg(self.algorithm),
            Parameter::kid(SHORT_CIRCUIT_KID),
        ];
        out.extend(self.extra_parameters.iter().cloned());
        out
    }
}

impl SignatureSigner for ShortCircuitSigner<'_> {
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

        let key = KeyHandle::new(&[]);
        if encoder.writer().is_size_only() {
            let size = self.provider.sig_size(self.algorithm, key)?;
            encoder.bytes(&vec![0u8; size]).map_err(enc_err)?;
            return Ok(());
        }

        let hash = self.algorithm.hash().ok_or(CoseError::UnsupportedSigningAlg)?;
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
        let digest = digest_sig_structure(self.provider, hash, &sig_structure)?;
        let signature = self
            .provider
            .sign(self.algorithm, key, TbsInput::Digest(&digest))?;
        encoder.bytes(&signature).map_err(enc_err)?;
        Ok(())
    }
}
