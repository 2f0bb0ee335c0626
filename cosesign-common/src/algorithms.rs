// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Supported COSE algorithms (IANA COSE Algorithms registry).
///
/// The short-circuit ids live in the private-use space. The constants exist
/// unconditionally so messages naming them always decode; the pseudo-signing
/// code paths behind them only exist under the `short-circuit` cargo feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum Algorithm {
    /// ECDSA w/ SHA-256 over P-256.
    ES256 = -7,
    /// EdDSA (Ed25519). Signs the full Sig_structure, no prehash.
    EdDsa = -8,
    /// ECDSA w/ SHA-384 over P-384.
    ES384 = -35,
    /// ECDSA w/ SHA-512 over P-521.
    ES512 = -36,
    /// RSASSA-PSS w/ SHA-256.
    PS256 = -37,
    /// RSASSA-PSS w/ SHA-384.
    PS384 = -38,
    /// RSASSA-PSS w/ SHA-512.
    PS512 = -39,
    /// Test pseudo-algorithm: the "signature" is the SHA-256 TBS digest.
    ShortCircuit256 = -1_000_256,
    /// Test pseudo-algorithm over SHA-384.
    ShortCircuit384 = -1_000_384,
    /// Test pseudo-algorithm over SHA-512.
    ShortCircuit512 = -1_000_512,
}

/// Hash algorithms used when building the TBS digest.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl Algorithm {
    /// Look up an algorithm by its IANA id.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            -7 => Some(Algorithm::ES256),
            -8 => Some(Algorithm::EdDsa),
            -35 => Some(Algorithm::ES384),
            -36 => Some(Algorithm::ES512),
            -37 => Some(Algorithm::PS256),
            -38 => Some(Algorithm::PS384),
            -39 => Some(Algorithm::PS512),
            -1_000_256 => Some(Algorithm::ShortCircuit256),
            -1_000_384 => Some(Algorithm::ShortCircuit384),
            -1_000_512 => Some(Algorithm::ShortCircuit512),
            _ => None,
        }
    }

    /// The IANA id of this algorithm.
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn is_ecdsa(self) -> bool {
        matches!(self, Algorithm::ES256 | Algorithm::ES384 | Algorithm::ES512)
    }

    pub fn is_rsassa_pss(self) -> bool {
        matches!(self, Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512)
    }

    pub fn is_eddsa(self) -> bool {
        matches!(self, Algorithm::EdDsa)
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(
            self,
            Algorithm::ShortCircuit256 | Algorithm::ShortCircuit384 | Algorithm::ShortCircuit512
        )
    }

    /// The hash fed with the Sig_structure, or `None` for hash-less
    /// algorithms that sign the full serialized structure.
    pub fn hash(self) -> Option<HashAlgorithm> {
        match self {
            Algorithm::ES256 | Algorithm::PS256 | Algorithm::ShortCircuit256 => {
                Some(HashAlgorithm::Sha256)
            }
            Algorithm::ES384 | Algorithm::PS384 | Algorithm::ShortCircuit384 => {
                Some(HashAlgorithm::Sha384)
            }
            Algorithm::ES512 | Algorithm::PS512 | Algorithm::ShortCircuit512 => {
                Some(HashAlgorithm::Sha512)
            }
            Algorithm::EdDsa => None,
        }
    }
}
