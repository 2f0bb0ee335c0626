// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The Sig_structure: the canonical array whose serialization is signed.
//!
//! ```text
//! Sig_structure = [
//!    context        : "Signature1" / "Signature",
//!    body_protected : bstr,
//!    ? sign_protected : bstr,   ; COSE_Sign only
//!    external_aad   : bstr,
//!    payload        : bstr
//! ]
//! ```
//!
//! `payload` is always the full payload bytes, even for messages whose
//! payload slot is detached (`null`) on the wire.

use minicbor::encode::Write;
use minicbor::Encoder;

use crate::options::MessageKind;
use crate::sink::MessageSink;
use crate::CoseError;

/// Borrowed view of the pieces a Sig_structure is built from.
#[derive(Debug, Clone)]
pub struct SigStructure<'a> {
    pub kind: MessageKind,
    /// Serialized protected body headers (contents of the bstr; may be empty).
    pub body_protected: &'a [u8],
    /// Serialized protected headers of one COSE_Signature. `Some` exactly
    /// when `kind` is [`MessageKind::Sign`].
    pub sign_protected: Option<&'a [u8]>,
    /// Externally supplied additional authenticated data (empty if none).
    pub external_aad: &'a [u8],
    pub payload: &'a [u8],
}

impl SigStructure<'_> {
    fn element_count(&self) -> u64 {
        match self.sign_protected {
            Some(_) => 5,
            None => 4,
        }
    }

    /// Stream the deterministic encoding into `enc`.
    pub fn encode_into<W: Write>(
        &self,
        enc: &mut Encoder<W>,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        enc.array(self.element_count())?;
        enc.str(self.kind.context())?;
        enc.bytes(self.body_protected)?;
        if let Some(sign_protected) = self.sign_protected {
            enc.bytes(sign_protected)?;
        }
        enc.bytes(self.external_aad)?;
        enc.bytes(self.payload)?;
        Ok(())
    }

    /// Size of the serialized structure in bytes.
    pub fn encoded_size(&self) -> usize {
        let mut enc = Encoder::new(MessageSink::size_only());
        // Counting cannot fail.
        let _ = self.encode_into(&mut enc);
        enc.into_writer().bytes_written()
    }

    /// Materialize the serialized structure.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut enc = Encoder::new(Vec::with_capacity(self.encoded_size()));
        match self.encode_into(&mut enc) {
            Ok(()) => {}
            Err(_) => unreachable!("writing to a Vec cannot fail"),
        }
        enc.into_writer()
    }

    /// Materialize the serialized structure, bounded by `max_size` bytes.
    ///
    /// Used for hash-less algorithms that must see the whole structure at
    /// once; exceeding the caller's bound is [`CoseError::TbsTooLarge`].
    pub fn to_vec_bounded(&self, max_size: usize) -> Result<Vec<u8>, CoseError> {
        if self.encoded_size() > max_size {
            return Err(CoseError::TbsTooLarge);
        }
        Ok(self.to_vec())
    }
}
