// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use minicbor::data::Tag;
use minicbor::Encoder;

use cosesign_abstractions::SignatureSigner;
use cosesign_common::{
    CoseError, MessageKind, MessageSink, Parameter, ParameterList, SignOptions,
};

use crate::enc_err;

/// Drives the emission of one signed message.
///
/// Attach signers in the order their signatures should appear. The COSE_Sign1
/// entry points require exactly one signer; COSE_Sign takes one or more. An
/// engine is cheap to build and is not shared across threads mid-operation.
pub struct SignEngine<'a> {
    options: SignOptions,
    signers: Vec<&'a dyn SignatureSigner>,
}

impl<'a> SignEngine<'a> {
    pub fn new(options: SignOptions) -> Self {
        SignEngine {
            options,
            signers: Vec::new(),
        }
    }

    /// Append a signer to the chain.
    pub fn add_signer(&mut self, signer: &'a dyn SignatureSigner) {
        self.signers.push(signer);
    }

    /// Emit a COSE_Sign1 into `output`, returning the number of bytes
    /// written. The buffer contents are undefined on error.
    pub fn sign1(
        &self,
        payload: &[u8],
        aad: &[u8],
        body_parameters: &[Parameter],
        output: &mut [u8],
    ) -> Result<usize, CoseError> {
        self.emit(
            MessageKind::Sign1,
            payload,
            aad,
            body_parameters,
            MessageSink::new(output),
        )
    }

    /// The exact size [`Self::sign1`] would produce for the same inputs.
    pub fn sign1_size(
        &self,
        payload: &[u8],
        aad: &[u8],
        body_parameters: &[Parameter],
    ) -> Result<usize, CoseError> {
        self.emit(
            MessageKind::Sign1,
            payload,
            aad,
            body_parameters,
            MessageSink::size_only(),
        )
    }

    /// Emit a COSE_Sign with one COSE_Signature per attached signer.
    pub fn sign(
        &self,
        payload: &[u8],
        aad: &[u8],
        body_parameters: &[Parameter],
        output: &mut [u8],
    ) -> Result<usize, CoseError> {
        self.emit(
            MessageKind::Sign,
            payload,
            aad,
            body_parameters,
            MessageSink::new(output),
        )
    }

    /// The exact size [`Self::sign`] would produce for the same inputs.
    pub fn sign_size(
        &self,
        payload: &[u8],
        aad: &[u8],
        body_parameters: &[Parameter],
    ) -> Result<usize, CoseError> {
        self.emit(
            MessageKind::Sign,
            payload,
            aad,
            body_parameters,
            MessageSink::size_only(),
        )
    }

    fn emit(
        &self,
        kind: MessageKind,
        payload: &[u8],
        aad: &[u8],
        body_parameters: &[Parameter],
        sink: MessageSink<'_>,
    ) -> Result<usize, CoseError> {
        let single = match kind {
            MessageKind::Sign1 => match self.signers.as_slice() {
                [] => return Err(CoseError::NoSigners),
                [signer] => Some(*signer),
                _ => return Err(CoseError::TooManySigners),
            },
            MessageKind::Sign => {
                if self.signers.is_empty() {
                    return Err(CoseError::NoSigners);
                }
                None
            }
        };

        let mut parameters = ParameterList::from_slice(body_parameters)?;
        if let Some(signer) = single {
            parameters.merge(signer.body_parameters())?;
        }
        parameters.validate()?;
        if kind == MessageKind::Sign1 && parameters.protected_alg().is_none() {
            return Err(CoseError::UnsupportedSigningAlg);
        }

        let protected = parameters.encode_protected(self.options.canonical_encoding)?;

        let mut enc = Encoder::new(sink);
        if !self.options.omit_cbor_tag {
            enc.tag(Tag::new(kind.tag())).map_err(enc_err)?;
        }
        enc.array(4).map_err(enc_err)?;
        enc.bytes(&protected).map_err(enc_err)?;
        parameters
            .encode_unprotected(&mut enc, self.options.canonical_encoding)
            .map_err(enc_err)?;
        if self.options.detached_payload {
            enc.null().map_err(enc_err)?;
        } else {
            enc.bytes(payload).map_err(enc_err)?;
        }

        match single {
            Some(signer) => {
                signer.sign(kind, &self.options, &protected, aad, payload, &mut enc)?;
            }
            None => {
                enc.array(self.signers.len() as u64).map_err(enc_err)?;
                for signer in &self.signers {
                    signer.sign(kind, &self.options, &protected, aad, payload, &mut enc)?;
                }
            }
        }

        Ok(enc.into_writer().bytes_written())
    }
}
