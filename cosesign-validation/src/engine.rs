// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use minicbor::data::{Tag, Type};
use minicbor::Decoder;

use cosesign_abstractions::{SignatureVerifier, VerifyDisposition};
use cosesign_common::{
    check_critical, decode_header_buckets, CoseError, DecodedHeaders, MessageKind, ParameterList,
    ParameterReader, ParameterStorage, SignaturePolicy, TagPolicy, VerifyOptions,
};

use crate::wf;

/// Default bound on decoded header parameters per operation.
pub const DEFAULT_PARAMETER_CAPACITY: usize = 16;

/// A successfully verified (or, in decode-only mode, validated) COSE_Sign1.
#[derive(Debug)]
pub struct VerifiedSign1<'m> {
    /// The covered payload: embedded bytes, or the caller's external bytes
    /// for a detached message.
    pub payload: &'m [u8],
    /// Body parameters from both buckets, merged.
    pub parameters: ParameterList,
    /// The raw serialized protected bucket.
    pub protected_raw: &'m [u8],
    /// The protected bucket arrived as a bstr-wrapped empty map rather than
    /// the zero-length byte string.
    pub empty_map_form: bool,
}

/// A successfully verified (or validated) COSE_Sign.
#[derive(Debug)]
pub struct VerifiedSign<'m> {
    pub payload: &'m [u8],
    pub body_parameters: ParameterList,
    pub protected_raw: &'m [u8],
    pub empty_map_form: bool,
    /// Signatures carried by the message.
    pub signature_count: usize,
    /// Signatures that validated.
    pub verified_count: usize,
}

struct BodyParts<'m> {
    headers: DecodedHeaders<'m>,
    payload: Option<&'m [u8]>,
}

/// Drives the decoding and verification of one signed message.
///
/// Attach verifiers in preference order; dispatch offers each signature to
/// the chain and the first verifier that accepts wins. An engine is cheap to
/// build and is not shared across threads mid-operation.
pub struct VerifyEngine<'a> {
    options: VerifyOptions,
    verifiers: Vec<&'a dyn SignatureVerifier>,
    reader: Option<&'a dyn ParameterReader>,
    parameter_capacity: usize,
}

impl<'a> VerifyEngine<'a> {
    pub fn new(options: VerifyOptions) -> Self {
        VerifyEngine {
            options,
            verifiers: Vec::new(),
            reader: None,
            parameter_capacity: DEFAULT_PARAMETER_CAPACITY,
        }
    }

    /// Append a verifier to the chain.
    pub fn add_verifier(&mut self, verifier: &'a dyn SignatureVerifier) {
        self.verifiers.push(verifier);
    }

    /// Register a reader for application-defined critical parameters in the
    /// body headers.
    pub fn set_parameter_reader(&mut self, reader: &'a dyn ParameterReader) {
        self.reader = Some(reader);
    }

    /// Bound the parameter pool for one operation.
    pub fn set_parameter_capacity(&mut self, capacity: usize) {
        self.parameter_capacity = capacity;
    }

    /// Decode and verify a COSE_Sign1.
    ///
    /// `external_payload` must be supplied when the message is detached.
    pub fn verify1<'m>(
        &self,
        message: &'m [u8],
        external_payload: Option<&'m [u8]>,
        aad: &[u8],
    ) -> Result<VerifiedSign1<'m>, CoseError> {
        if message.is_empty() {
            return Err(CoseError::Sign1Format);
        }
        let mut dec = Decoder::new(message);
        let mut storage = ParameterStorage::with_capacity(self.parameter_capacity);

        let body = self.decode_body(&mut dec, MessageKind::Sign1, &mut storage)?;
        let signature = dec.bytes().map_err(|e| wf(e, CoseError::Sign1Format))?;
        if dec.position() != message.len() {
            return Err(CoseError::Sign1Format);
        }

        let payload = match (body.payload, external_payload) {
            (Some(p), _) => p,
            (None, Some(p)) => p,
            (None, None) => return Err(CoseError::MissingPayload),
        };

        if body.headers.parameters.protected_alg().is_none() {
            return Err(CoseError::UnsupportedSigningAlg);
        }

        if !self.options.decode_only {
            let mut accepted = false;
            for verifier in &self.verifiers {
                match verifier.verify1(
                    &self.options,
                    body.headers.protected_raw,
                    None,
                    payload,
                    aad,
                    &body.headers.parameters,
                    signature,
                )? {
                    VerifyDisposition::Verified => {
                        accepted = true;
                        break;
                    }
                    VerifyDisposition::Declined => continue,
                }
            }
            if !accepted {
                return Err(CoseError::NoVerifierForAlg);
            }
        }

        Ok(VerifiedSign1 {
            payload,
            parameters: body.headers.parameters,
            protected_raw: body.headers.protected_raw,
            empty_map_form: body.headers.empty_map_form,
        })
    }

    /// Decode and verify a COSE_Sign under the configured signature policy.
    pub fn verify<'m>(
        &self,
        message: &'m [u8],
        external_payload: Option<&'m [u8]>,
        aad: &[u8],
    ) -> Result<VerifiedSign<'m>, CoseError> {
        if message.is_empty() {
            return Err(CoseError::SignFormat);
        }
        let mut dec = Decoder::new(message);
        let mut storage = ParameterStorage::with_capacity(self.parameter_capacity);

        let body = self.decode_body(&mut dec, MessageKind::Sign, &mut storage)?;

        let payload = match (body.payload, external_payload) {
            (Some(p), _) => p,
            (None, Some(p)) => p,
            (None, None) => return Err(CoseError::MissingPayload),
        };

        let count = dec
            .array()
            .map_err(|e| wf(e, CoseError::SignFormat))?
            .ok_or(CoseError::SignFormat)?;
        if count == 0 {
            return Err(CoseError::NoSignatures);
        }

        let mut verified_count = 0usize;
        let mut first_error: Option<CoseError> = None;

        for _ in 0..count {
            let start = dec.position();
            let mut accepted = false;

            for verifier in &self.verifiers {
                dec.set_position(start);
                match verifier.verify_signature(
                    &self.options,
                    body.headers.protected_raw,
                    payload,
                    aad,
                    &mut storage,
                    &mut dec,
                ) {
                    Ok(VerifyDisposition::Verified) => {
                        verified_count += 1;
                        accepted = true;
                        break;
                    }
                    Ok(VerifyDisposition::Declined) => continue,
                    Err(e) => {
                        if self.options.signature_policy == SignaturePolicy::AllValid {
                            return Err(e);
                        }
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                        accepted = true;
                        break;
                    }
                }
            }

            if !accepted {
                if self.options.signature_policy == SignaturePolicy::AllValid {
                    return Err(CoseError::NoVerifierForAlg);
                }
                if first_error.is_none() {
                    first_error = Some(CoseError::NoVerifierForAlg);
                }
            }

            // Realign on the element boundary regardless of how far the
            // winning (or failing) verifier read.
            dec.set_position(start);
            dec.skip().map_err(|e| wf(e, CoseError::SignFormat))?;
        }

        if dec.position() != message.len() {
            return Err(CoseError::SignFormat);
        }

        if verified_count == 0 {
            return Err(first_error.unwrap_or(CoseError::NoVerifierForAlg));
        }

        Ok(VerifiedSign {
            payload,
            body_parameters: body.headers.parameters,
            protected_raw: body.headers.protected_raw,
            empty_map_form: body.headers.empty_map_form,
            signature_count: count as usize,
            verified_count,
        })
    }

    fn decode_body<'m>(
        &self,
        dec: &mut Decoder<'m>,
        kind: MessageKind,
        storage: &mut ParameterStorage,
    ) -> Result<BodyParts<'m>, CoseError> {
        let structural = match kind {
            MessageKind::Sign1 => CoseError::Sign1Format,
            MessageKind::Sign => CoseError::SignFormat,
        };

        if dec.datatype().map_err(|e| wf(e, structural))? == Type::Tag {
            if self.options.tag_policy == TagPolicy::Prohibited {
                return Err(CoseError::TagProhibited);
            }
            let tag = dec.tag().map_err(|e| wf(e, structural))?;
            if tag != Tag::new(kind.tag()) {
                return Err(structural);
            }
        } else if self.options.tag_policy == TagPolicy::Required {
            return Err(CoseError::TagRequired);
        }

        let len = dec
            .array()
            .map_err(|e| wf(e, structural))?
            .ok_or(structural)?;
        if len != 4 {
            return Err(structural);
        }

        let headers =
            decode_header_buckets(dec, storage, self.options.strict_header_encoding)?;
        check_critical(&headers, self.reader)?;

        let payload = match dec.datatype().map_err(|e| wf(e, structural))? {
            Type::Null => {
                dec.null().map_err(|e| wf(e, structural))?;
                None
            }
            Type::Bytes => Some(dec.bytes().map_err(|e| wf(e, structural))?),
            _ => return Err(structural),
        };

        Ok(BodyParts { headers, payload })
    }
}
