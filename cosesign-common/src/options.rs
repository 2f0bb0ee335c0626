// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{COSE_SIGN1_TAG, COSE_SIGN_TAG};

/// Which COSE signed-message shape an operation works on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Single-signer COSE_Sign1.
    Sign1,
    /// Multi-signer COSE_Sign.
    Sign,
}

impl MessageKind {
    /// The CBOR tag for this message shape.
    pub fn tag(self) -> u64 {
        match self {
            MessageKind::Sign1 => COSE_SIGN1_TAG,
            MessageKind::Sign => COSE_SIGN_TAG,
        }
    }

    /// The Sig_structure context string for this message shape.
    pub fn context(self) -> &'static str {
        match self {
            MessageKind::Sign1 => "Signature1",
            MessageKind::Sign => "Signature",
        }
    }
}

/// How the verify engine treats the outer CBOR tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TagPolicy {
    /// Accept the message with or without its tag.
    #[default]
    Optional,
    /// The tag must be present.
    Required,
    /// The tag must be absent.
    Prohibited,
}

/// How many COSE_Sign signatures must validate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// At least one signature must validate.
    #[default]
    AtLeastOne,
    /// Every signature must validate.
    AllValid,
}

/// Options for the sign engine.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Leave out the leading CBOR tag (18 or 98).
    pub omit_cbor_tag: bool,

    /// Encode the payload slot as `null`; the payload travels out-of-band.
    /// The Sig_structure still covers the full payload bytes.
    pub detached_payload: bool,

    /// Sort header maps (integer labels ascending, then text labels) before
    /// emission. Default emission preserves insertion order.
    pub canonical_encoding: bool,
}

/// Options for the verify engine.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub tag_policy: TagPolicy,

    /// Validate structure and headers but skip the cryptographic check.
    pub decode_only: bool,

    /// COSE_Sign multi-signature acceptance policy.
    pub signature_policy: SignaturePolicy,

    /// Reject the empty-map form of an empty protected bucket instead of
    /// accepting it with a warning flag.
    pub strict_header_encoding: bool,
}
