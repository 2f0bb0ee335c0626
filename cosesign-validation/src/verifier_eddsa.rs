// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cell::Cell;

use minicbor::Decoder;

use cosesign_abstractions::{
    CryptoProvider, KeyHandle, KidPolicy, SignatureVerifier, TbsInput, VerifyDisposition,
};
use cosesign_common::{
    check_critical, decode_header_buckets, Algorithm, CoseError, MessageKind, ParameterList,
    ParameterReader, ParameterStorage, SigStructure, VerifyOptions,
};
use cosesign_crypto::RustCryptoProvider;

use crate::wf;

/// EdDSA verifier.
///
/// Like the EdDSA signer, the verification primitive consumes the whole
/// serialized Sig_structure, so it is materialized into an auxiliary buffer
/// with a caller-configurable bound.
pub struct EddsaVerifier<'a> {
    key: KeyHandle<'a>,
    kid: Option<&'a [u8]>,
    kid_policy: KidPolicy,
    reader: Option<&'a dyn ParameterReader>,
    provider: &'a dyn CryptoProvider,
    auxiliary_bound: usize,
    auxiliary_high_water: Cell<usize>,
}

impl<'a> EddsaVerifier<'a> {
    /// A verifier over a raw 32-byte Ed25519 public key.
    pub fn new(key: KeyHandle<'a>) -> Self {
        EddsaVerifier {
            key,
            kid: None,
            kid_policy: KidPolicy::default(),
            reader: None,
            provider: &RustCryptoProvider,
            auxiliary_bound: usize::MAX,
            auxiliary_high_water: Cell::new(0),
        }
    }

    pub fn with_kid(mut self, kid: &'a [u8]) -> Self {
        self.kid = Some(kid);
        self
    }

    pub fn with_kid_policy(mut self, policy: KidPolicy) -> Self {
        self.kid_policy = policy;
        self
    }

    pub fn with_parameter_reader(mut self, reader: &'a dyn ParameterReader) -> Self {
        self.reader = Some(reader);
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

    /// The auxiliary buffer size the most recent verification needed.
    pub fn auxiliary_buffer_size(&self) -> usize {
        self.auxiliary_high_water.get()
    }
}

impl SignatureVerifier for EddsaVerifier<'_> {
    fn verify_signature(
        &self,
        options: &VerifyOptions,
        body_protected: &[u8],
        payload: &[u8],
        aad: &[u8],
        storage: &mut ParameterStorage,
        decoder: &mut Decoder<'_>,
    ) -> Result<VerifyDisposition, CoseError> {
        let len = decoder
            .array()
            .map_err(|e| wf(e, CoseError::SignFormat))?
            .ok_or(CoseError::SignFormat)?;
        if len != 3 {
            return Err(CoseError::SignFormat);
        }

        let headers = decode_header_buckets(decoder, storage, options.strict_header_encoding)?;
        check_critical(&headers, self.reader)?;

        let signature = decoder.bytes().map_err(|e| wf(e, CoseError::SignFormat))?;

        self.verify1(
            options,
            body_protected,
            Some(headers.protected_raw),
            payload,
            aad,
            &headers.parameters,
            signature,
        )
    }

    fn verify1(
        &self,
        options: &VerifyOptions,
        body_protected: &[u8],
        sign_protected: Option<&[u8]>,
        payload: &[u8],
        aad: &[u8],
        parameters: &ParameterList,
        signature: &[u8],
    ) -> Result<VerifyDisposition, CoseError> {
        let alg_id = parameters
            .protected_alg()
            .ok_or(CoseError::UnsupportedSigningAlg)?;
        match Algorithm::from_id(alg_id) {
            Some(Algorithm::EdDsa) => {}
            _ => return Ok(VerifyDisposition::Declined),
        }

        if let Some(expected) = self.kid {
            if parameters.kid() != Some(expected) {
                return match self.kid_policy {
                    KidPolicy::Decline => Ok(VerifyDisposition::Declined),
                    KidPolicy::Fail => Err(CoseError::KidUnmatched),
                };
            }
        }

        if options.decode_only {
            return Ok(VerifyDisposition::Verified);
        }

        let kind = match sign_protected {
            Some(_) => MessageKind::Sign,
            None => MessageKind::Sign1,
        };
        let sig_structure = SigStructure {
            kind,
            body_protected,
            sign_protected,
            external_aad: aad,
            payload,
        };
        self.auxiliary_high_water.set(sig_structure.encoded_size());
        let tbs = sig_structure.to_vec_bounded(self.auxiliary_bound)?;

        self.provider.verify(
            Algorithm::EdDsa,
            self.key,
            parameters.kid(),
            TbsInput::Message(&tbs),
            signature,
        )?;
        Ok(VerifyDisposition::Verified)
    }
}
