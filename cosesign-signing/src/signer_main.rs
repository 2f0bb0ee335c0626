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
use cosesign_crypto::RustCryptoProvider;

use crate::enc_err;

/// Signer for the hash-then-sign algorithm families: ECDSA (ES256/384/512)
/// and RSASSA-PSS (PS256/384/512).
///
/// The two families share one signer because they differ only in the
/// primitive the crypto provider dispatches to; the TBS digest pipeline is
/// identical. The key is borrowed for the signer's lifetime and handed to
/// the provider on each use.
pub struct MainSigner<'a> {
    algorithm: Algorithm,
    key: KeyHandle<'a>,
    kid: Option<&'a [u8]>,
    extra_parameters: Vec<Parameter>,
    provider: &'a dyn CryptoProvider,
}

impl<'a> MainSigner<'a> {
    /// A signer for `algorithm` using the default crypto provider.
    pub fn new(algorithm: Algorithm, key: KeyHandle<'a>) -> Result<Self, CoseError> {
        if !algorithm.is_ecdsa() && !algorithm.is_rsassa_pss() {
            return Err(CoseError::UnsupportedSigningAlg);
        }
        Ok(MainSigner {
            algorithm,
            key,
            kid: None,
            extra_parameters: Vec::new(),
            provider: &RustCryptoProvider,
        })
    }

    /// Stamp a key identifier into the emitted headers.
    pub fn with_kid(mut self, kid: &'a [u8]) -> Self {
        self.kid = Some(kid);
        self
    }

    /// Additional header parameters for this signer's bucket contributions.
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.extra_parameters = parameters;
        self
    }

    pub fn with_provider(mut self, provider: &'a dyn CryptoProvider) -> Self {
        self.provider = provider;
        self
    }

    fn own_parameters(&self) -> Vec<Parameter> {
        let mut out = vec![Parameter::alg(self.algorithm)];
        if let Some(kid) = self.kid {
            out.push(Parameter::kid(kid));
        }
        out.extend(self.extra_parameters.iter().cloned());
        out
    }
}

impl SignatureSigner for MainSigner<'_> {
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
        // For COSE_Sign this signer emits a whole COSE_Signature; its own
        // parameters go into that structure's header buckets.
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

        if encoder.writer().is_size_only() {
            let size = self.provider.sig_size(self.algorithm, self.key)?;
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
            .sign(self.algorithm, self.key, TbsInput::Digest(&digest))?;
        encoder.bytes(&signature).map_err(enc_err)?;
        Ok(())
    }
}
