// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! RustCrypto-backed provider.
//!
//! Key inputs:
//! - ECDSA/RSA private keys: PKCS#8 DER.
//! - ECDSA/RSA public keys: SubjectPublicKeyInfo DER.
//! - Ed25519: raw 32-byte seed (private) / raw 32-byte point (public).
//!
//! ECDSA signatures are the raw `r || s` concatenation COSE carries; RSA-PSS
//! uses a salt length equal to the digest length.

use cosesign_abstractions::{CryptoProvider, HashContext, KeyHandle, TbsInput};
use cosesign_common::{Algorithm, CoseError, HashAlgorithm};

use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use p256::pkcs8::{DecodePrivateKey as _, DecodePublicKey as _};
use rand_core::OsRng;
use rsa::traits::PublicKeyParts as _;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use signature::hazmat::{PrehashSigner as _, PrehashVerifier as _};
use signature::{Signer as _, Verifier as _};

/// The default, stateless crypto provider.
#[derive(Debug, Default, Copy, Clone)]
pub struct RustCryptoProvider;

fn digest_input<'a>(input: TbsInput<'a>) -> Result<&'a [u8], CoseError> {
    match input {
        TbsInput::Digest(d) => Ok(d),
        TbsInput::Message(_) => Err(CoseError::HashGeneralFail),
    }
}

fn message_input<'a>(input: TbsInput<'a>) -> Result<&'a [u8], CoseError> {
    match input {
        TbsInput::Message(m) => Ok(m),
        TbsInput::Digest(_) => Err(CoseError::HashGeneralFail),
    }
}

fn pss_scheme(algorithm: Algorithm) -> Pss {
    match algorithm {
        Algorithm::PS384 => Pss::new::<Sha384>(),
        Algorithm::PS512 => Pss::new::<Sha512>(),
        _ => Pss::new::<Sha256>(),
    }
}

fn ed25519_signing_key(key: KeyHandle<'_>) -> Result<ed25519_dalek::SigningKey, CoseError> {
    let seed: &[u8; 32] = key
        .as_bytes()
        .try_into()
        .map_err(|_| CoseError::WrongTypeOfKey)?;
    Ok(ed25519_dalek::SigningKey::from_bytes(seed))
}

fn ed25519_verifying_key(key: KeyHandle<'_>) -> Result<ed25519_dalek::VerifyingKey, CoseError> {
    let point: &[u8; 32] = key
        .as_bytes()
        .try_into()
        .map_err(|_| CoseError::WrongTypeOfKey)?;
    ed25519_dalek::VerifyingKey::from_bytes(point).map_err(|_| CoseError::WrongTypeOfKey)
}

impl CryptoProvider for RustCryptoProvider {
    fn sign(
        &self,
        algorithm: Algorithm,
        key: KeyHandle<'_>,
        input: TbsInput<'_>,
    ) -> Result<Vec<u8>, CoseError> {
        match algorithm {
            Algorithm::ES256 => {
                let sk = p256::ecdsa::SigningKey::from_pkcs8_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let sig: p256::ecdsa::Signature = sk
                    .sign_prehash(digest_input(input)?)
                    .map_err(|_| CoseError::SigFail)?;
                Ok(sig.to_bytes().to_vec())
            }
            Algorithm::ES384 => {
                let sk = p384::ecdsa::SigningKey::from_pkcs8_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let sig: p384::ecdsa::Signature = sk
                    .sign_prehash(digest_input(input)?)
                    .map_err(|_| CoseError::SigFail)?;
                Ok(sig.to_bytes().to_vec())
            }
            Algorithm::ES512 => {
                let sk = p521::ecdsa::SigningKey::from_pkcs8_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let sig: p521::ecdsa::Signature = sk
                    .sign_prehash(digest_input(input)?)
                    .map_err(|_| CoseError::SigFail)?;
                Ok(sig.to_bytes().to_vec())
            }
            Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => {
                let sk = RsaPrivateKey::from_pkcs8_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                sk.sign_with_rng(&mut OsRng, pss_scheme(algorithm), digest_input(input)?)
                    .map_err(|_| CoseError::SigFail)
            }
            Algorithm::EdDsa => {
                let sk = ed25519_signing_key(key)?;
                Ok(sk.sign(message_input(input)?).to_bytes().to_vec())
            }
            #[cfg(feature = "short-circuit")]
            Algorithm::ShortCircuit256 | Algorithm::ShortCircuit384 | Algorithm::ShortCircuit512 => {
                // Test mode: the TBS digest stands in for the signature.
                Ok(digest_input(input)?.to_vec())
            }
            #[cfg(not(feature = "short-circuit"))]
            _ => Err(CoseError::UnsupportedSigningAlg),
        }
    }

    fn verify(
        &self,
        algorithm: Algorithm,
        key: KeyHandle<'_>,
        _kid: Option<&[u8]>,
        input: TbsInput<'_>,
        signature: &[u8],
    ) -> Result<(), CoseError> {
        match algorithm {
            Algorithm::ES256 => {
                let pk = p256::PublicKey::from_public_key_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let ep = pk.to_encoded_point(false);
                let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let sig = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CoseError::SigVerifyFail)?;
                vk.verify_prehash(digest_input(input)?, &sig)
                    .map_err(|_| CoseError::SigVerifyFail)
            }
            Algorithm::ES384 => {
                let pk = p384::PublicKey::from_public_key_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let ep = pk.to_encoded_point(false);
                let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let sig = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CoseError::SigVerifyFail)?;
                vk.verify_prehash(digest_input(input)?, &sig)
                    .map_err(|_| CoseError::SigVerifyFail)
            }
            Algorithm::ES512 => {
                let pk = p521::PublicKey::from_public_key_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let ep = pk.to_encoded_point(false);
                let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                let sig = p521::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CoseError::SigVerifyFail)?;
                vk.verify_prehash(digest_input(input)?, &sig)
                    .map_err(|_| CoseError::SigVerifyFail)
            }
            Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => {
                let pk = RsaPublicKey::from_public_key_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                pk.verify(pss_scheme(algorithm), digest_input(input)?, signature)
                    .map_err(|_| CoseError::SigVerifyFail)
            }
            Algorithm::EdDsa => {
                let vk = ed25519_verifying_key(key)?;
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| CoseError::SigVerifyFail)?;
                vk.verify(message_input(input)?, &sig)
                    .map_err(|_| CoseError::SigVerifyFail)
            }
            #[cfg(feature = "short-circuit")]
            Algorithm::ShortCircuit256 | Algorithm::ShortCircuit384 | Algorithm::ShortCircuit512 => {
                if digest_input(input)? == signature {
                    Ok(())
                } else {
                    Err(CoseError::SigVerifyFail)
                }
            }
            #[cfg(not(feature = "short-circuit"))]
            _ => Err(CoseError::UnsupportedSigningAlg),
        }
    }

    fn sig_size(&self, algorithm: Algorithm, key: KeyHandle<'_>) -> Result<usize, CoseError> {
        match algorithm {
            Algorithm::ES256 => Ok(64),
            Algorithm::ES384 => Ok(96),
            Algorithm::ES512 => Ok(132),
            Algorithm::EdDsa => Ok(64),
            Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => {
                // The signature spans the RSA modulus. The key may be either
                // the signing (PKCS#8) or the verifying (SPKI) form.
                if let Ok(sk) = RsaPrivateKey::from_pkcs8_der(key.as_bytes()) {
                    return Ok(sk.size());
                }
                let pk = RsaPublicKey::from_public_key_der(key.as_bytes())
                    .map_err(|_| CoseError::WrongTypeOfKey)?;
                Ok(pk.size())
            }
            #[cfg(feature = "short-circuit")]
            Algorithm::ShortCircuit256 | Algorithm::ShortCircuit384 | Algorithm::ShortCircuit512 => {
                match algorithm.hash() {
                    Some(h) => Ok(h.digest_len()),
                    None => Err(CoseError::UnsupportedSigningAlg),
                }
            }
            #[cfg(not(feature = "short-circuit"))]
            _ => Err(CoseError::UnsupportedSigningAlg),
        }
    }

    fn hash_start(&self, algorithm: HashAlgorithm) -> Result<Box<dyn HashContext>, CoseError> {
        Ok(match algorithm {
            HashAlgorithm::Sha256 => Box::new(Hasher::Sha256(Sha256::new())),
            HashAlgorithm::Sha384 => Box::new(Hasher::Sha384(Sha384::new())),
            HashAlgorithm::Sha512 => Box::new(Hasher::Sha512(Sha512::new())),
        })
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl HashContext for Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha384(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        match *self {
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha384(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
        }
    }
}
