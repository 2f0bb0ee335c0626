// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared COSE datatypes for the signing and verification crates.
//!
//! This crate intentionally exposes only a small surface area:
//! - The flat error taxonomy used by every crate in the workspace.
//! - The COSE algorithm registry subset this workspace supports.
//! - Header parameters: model, bucket invariants, encoding, decoding.
//! - The Sig_structure (to-be-signed) builder.
//! - The two-mode output sink backing size-calculation and emission passes.

pub mod algorithms;
pub mod error;
pub mod options;
pub mod parameters;
pub mod sig_structure;
pub mod sink;

// Re-export the core entry points so consumers can depend on this crate
// without needing to know the internal module layout.
pub use algorithms::{Algorithm, HashAlgorithm};
pub use error::CoseError;
pub use options::{MessageKind, SignOptions, SignaturePolicy, TagPolicy, VerifyOptions};
pub use parameters::{
    check_critical, decode_header_buckets, label, DecodedHeaders, Label, Parameter,
    ParameterList, ParameterReader, ParameterStorage, ParameterValue,
};
pub use sig_structure::SigStructure;
pub use sink::{EndOfBuffer, MessageSink};

/// CBOR tag for a COSE_Sign1 message.
pub const COSE_SIGN1_TAG: u64 = 18;

/// CBOR tag for a COSE_Sign message.
pub const COSE_SIGN_TAG: u64 = 98;
