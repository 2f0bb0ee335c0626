// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Constants for the test-only short-circuit signing mode.

/// The fixed key identifier every short-circuit signer stamps on its
/// messages. Verifiers reject any other kid, making accidental use of the
/// pseudo-signature mode outside tests loudly visible.
pub const SHORT_CIRCUIT_KID: &[u8] = &[
    0xef, 0x95, 0x4b, 0x4b, 0xd9, 0xbd, 0xf6, 0x70, 0xd0, 0x33, 0x60, 0x82, 0xf5, 0xef, 0x15,
    0x2a, 0xa7, 0x30, 0x09, 0x35, 0xba, 0x9b, 0xd3, 0xc3, 0x0c, 0x3f, 0x58, 0xb1, 0x85, 0x50,
    0xbc, 0x5e,
];
