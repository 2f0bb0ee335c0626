// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use minicbor::Decoder;

use cosesign_abstractions::{
    digest_sig_structure, CryptoProvider, KeyHandle, KidPolicy, SignatureVerifier, TbsInput,
    VerifyDisposition,
};
use cosesign_common::{
    check_critical, decode_header_buckets, Algorithm, CoseError, MessageKind, ParameterList,
    ParameterReader, ParameterStorage, SigStructure, VerifyOptions,
};
use cosesign_crypto::RustCryptoProvider;

use crate::wf;

/// Verifier for the hash-then-sign algorithm families: ECDSA (ES256/384/512)
/// and RSASSA-PSS (PS256/384/512).
///
/// Declines signatures with any other algorithm so another verifier in the
/// chain can claim them. An expected kid narrows this verifier to one key;
/// the [`KidPolicy`] decides whether a mismatch declines or fails hard.
pub struct MainVerifier<'a> {
    key: KeyHandle<'a>,
    kid: Option<&'a [u8]>,
    kid_policy: KidPolicy,
    reader: Option<&'a dyn ParameterReader>,
    provider: &'a dyn CryptoProvider,
}

impl<'a> MainVerifier<'a> {
    /// A verifier over an SPKI DER public key, using the default provider.
    pub fn new(key: KeyHandle<'a>) -> Self {
        MainVerifier {
            key,
            kid: None,
            kid_policy: KidPolicy::default(),
            reader: None,
            provider: &RustCryptoProvider,
        }
    }

    /// Only handle signatures carrying this kid.
    pub fn with_kid(mut self, kid: &'a [u8]) -> Self {
        self.kid = Some(kid);
        self
    }

    pub fn with_kid_policy(mut self, policy: KidPolicy) -> Self {
        self.kid_policy = policy;
        self
    }

    /// Register a reader for application-defined critical parameters inside
    /// the COSE_Signature headers this verifier decodes.
    pub fn with_parameter_reader(mut self, reader: &'a dyn ParameterReader) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_provider(mut self, provider: &'a dyn CryptoProvider) -> Self {
        self.provider = provider;
        self
    }

    fn handles(&self, algorithm: Algorithm) -> bool {
        algorithm.is_ecdsa() || algorithm.is_rsassa_pss()
    }
}

impl SignatureVerifier for MainVerifier<'_> {
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
        let Some(algorithm) = Algorithm::from_id(alg_id) else {
            return Ok(VerifyDisposition::Declined);
        };
        if !self.handles(algorithm) {
            return Ok(VerifyDisposition::Declined);
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

        let hash = algorithm.hash().ok_or(CoseError::UnsupportedSigningAlg)?;
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
        let digest = digest_sig_structure(self.provider, hash, &sig_structure)?;
        self.provider.verify(
            algorithm,
            self.key,
            parameters.kid(),
            TbsInput::Digest(&digest),
            signature,
        )?;
        Ok(VerifyDisposition::Verified)
    }
}
