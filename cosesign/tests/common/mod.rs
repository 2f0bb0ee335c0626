// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for the workspace-level integration tests: key generation
//! per algorithm family and small verify-engine builders.

#![allow(dead_code)]

use std::sync::OnceLock;

use p256::pkcs8::{EncodePrivateKey as _, EncodePublicKey as _};
use rand_core::OsRng;

/// DER key pair for the ECDSA/RSA families.
pub(crate) struct DerKeys {
    /// PKCS#8 private key.
    pub sk: Vec<u8>,
    /// SPKI public key.
    pub pk: Vec<u8>,
}

pub(crate) fn es256_keys() -> DerKeys {
    let sk = p256::ecdsa::SigningKey::random(&mut OsRng);
    DerKeys {
        pk: sk.verifying_key().to_public_key_der().unwrap().into_vec(),
        sk: sk.to_pkcs8_der().unwrap().as_bytes().to_vec(),
    }
}

pub(crate) fn es384_keys() -> DerKeys {
    let sk = p384::ecdsa::SigningKey::random(&mut OsRng);
    DerKeys {
        pk: sk.verifying_key().to_public_key_der().unwrap().into_vec(),
        sk: sk.to_pkcs8_der().unwrap().as_bytes().to_vec(),
    }
}

pub(crate) fn es512_keys() -> DerKeys {
    let sk = p521::ecdsa::SigningKey::random(&mut OsRng);
    DerKeys {
        pk: sk.verifying_key().to_public_key_der().unwrap().into_vec(),
        sk: sk.to_pkcs8_der().unwrap().as_bytes().to_vec(),
    }
}

/// Raw Ed25519 key pair: (seed, public point).
pub(crate) fn ed25519_keys() -> ([u8; 32], [u8; 32]) {
    let sk = ed25519_dalek::SigningKey::generate(&mut OsRng);
    (sk.to_bytes(), sk.verifying_key().to_bytes())
}

/// One shared RSA-2048 key pair; generation is slow enough to cache across
/// the PS256/PS384/PS512 tests.
pub(crate) fn rsa_keys() -> &'static DerKeys {
    static KEYS: OnceLock<DerKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let sk = rsa::RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        DerKeys {
            pk: sk.to_public_key().to_public_key_der().unwrap().into_vec(),
            sk: sk.to_pkcs8_der().unwrap().as_bytes().to_vec(),
        }
    })
}
