// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use minicbor::Decoder;

use cosesign_abstractions::{
    digest_sig_structure, CryptoProvider, KeyHandle, SignatureVerifier, TbsInput,
    VerifyDisposition,
};
use cosesign_common::{
    check_critical, decode_header_buckets, Algorithm, CoseError, MessageKind, ParameterList,
    ParameterReader, ParameterStorage, SigStructure, VerifyOptions,
};
use cosesign_crypto::{RustCryptoProvider, SHORT_CIRCUIT_KID};

use crate::wf;

/// Test-only verifier for the short-circuit pseudo-algorithms.
///
/// Only accepts messages stamped with the fixed short-circuit kid; anything
/// else fails with [`CoseError::KidUnmatched`], so a pseudo-signature can
/// never masquerade as a real one.
#[derive(Default)]
pub struct ShortCircuitVerifier<'a> {
    reader: Option<&'a dyn ParameterReader>,
    provider: Option<&'a dyn CryptoProvider>,
}

impl<'a> ShortCircuitVerifier<'a> {
    pub fn new() -> Self {
        ShortCircuitVerifier {
            reader: None,
            provider: None,
        }
    }

    pub fn with_parameter_reader(mut self, reader: &'a dyn ParameterReader) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_provider(mut self, provider: &'a dyn CryptoProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    fn provider(&self) -> &dyn CryptoProvider {
        self.provider.unwrap_or(&RustCryptoProvider)
    }
}

impl SignatureVerifier for ShortCircuitVerifier<'_> {
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
        let algorithm = match Algorithm::from_id(alg_id) {
            Some(a) if a.is_short_circuit() => a,
            _ => return Ok(VerifyDisposition::Declined),
        };

        if parameters.kid() != Some(SHORT_CIRCUIT_KID) {
            return Err(CoseError::KidUnmatched);
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
        let digest = digest_sig_structure(self.provider(), hash, &sig_structure)?;
        self.provider().verify(
            algorithm,
            KeyHandle::new(&[]),
            parameters.kid(),
            TbsInput::Digest(&digest),
            signature,
        )?;
        Ok(VerifyDisposition::Verified)
    }
}
