// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The error taxonomy shared by every crate in the workspace.
//!
//! One flat enum, no chaining. The first error encountered wins and is
//! propagated unchanged to the engine entry point; the contents of any
//! caller-supplied output buffer are undefined after an error.

/// Errors produced while encoding, decoding, signing, or verifying.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoseError {
    /// The COSE_Sign1 structure is not a tagged/untagged 4-element array of
    /// the expected item types.
    #[error("malformed COSE_Sign1 structure")]
    Sign1Format,

    /// The COSE_Sign structure or one of its COSE_Signature entries is
    /// malformed.
    #[error("malformed COSE_Sign structure")]
    SignFormat,

    /// CBOR is well-formed but not decodable as the expected item.
    #[error("unexpected CBOR data item")]
    CborDecode,

    /// The input is not well-formed CBOR.
    #[error("CBOR is not well-formed")]
    CborNotWellFormed,

    /// The message carries a detached payload and the caller supplied none.
    #[error("detached payload requires externally supplied payload bytes")]
    MissingPayload,

    /// A COSE_Sign message with an empty signatures array.
    #[error("COSE_Sign contains no signatures")]
    NoSignatures,

    /// The same label occurs twice, within one header bucket or across the
    /// protected and unprotected buckets.
    #[error("duplicate header parameter label")]
    DuplicateParameter,

    /// A label listed in `crit` is absent or not understood.
    #[error("critical header parameter not understood")]
    UnknownCriticalParameter,

    /// The parameter storage pool is exhausted.
    #[error("too many header parameters")]
    TooManyParameters,

    /// A header parameter has the wrong CBOR type or sits in the wrong
    /// bucket (e.g. `alg` or `crit` outside the protected headers).
    #[error("header parameter type or placement is invalid")]
    ParameterType,

    /// The algorithm is unknown or not usable for the requested operation.
    #[error("unsupported signing algorithm")]
    UnsupportedSigningAlg,

    /// The cryptographic signature check failed.
    #[error("signature verification failed")]
    SigVerifyFail,

    /// The signing primitive failed.
    #[error("signing operation failed")]
    SigFail,

    /// The hash primitive failed or was fed the wrong input form.
    #[error("hash operation failed")]
    HashGeneralFail,

    /// A provider-side signature output buffer was too small.
    #[error("signature buffer too small")]
    SigBufferTooSmall,

    /// Key material could not be used with the requested algorithm.
    #[error("wrong type of key for algorithm")]
    WrongTypeOfKey,

    /// No verifier in the chain accepted the signature.
    #[error("no verifier for the signature's algorithm")]
    NoVerifierForAlg,

    /// The key identifier did not match the verifier's expectation.
    #[error("kid did not match")]
    KidUnmatched,

    /// The caller-supplied output buffer is too small for the message.
    #[error("output buffer too small")]
    EncodeBufferTooSmall,

    /// The serialized Sig_structure exceeds the auxiliary buffer bound.
    #[error("to-be-signed bytes too large")]
    TbsTooLarge,

    /// The message must carry the COSE tag but does not.
    #[error("required CBOR tag is absent")]
    TagRequired,

    /// The message carries the COSE tag but must not.
    #[error("prohibited CBOR tag is present")]
    TagProhibited,

    /// The COSE_Sign1 path needs exactly one signer and none is attached.
    #[error("no signer attached")]
    NoSigners,

    /// The COSE_Sign1 path needs exactly one signer and several are attached.
    #[error("more than one signer attached")]
    TooManySigners,
}
