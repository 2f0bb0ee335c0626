// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE header parameters: model, bucket invariants, encoding, decoding.
//!
//! A message carries two header buckets: the protected bucket, serialized
//! into a byte string and covered by the signature, and the unprotected
//! bucket, a bare map. The invariants enforced here:
//! - no duplicate label within a bucket or across buckets;
//! - `alg` and `crit` live only in the protected bucket;
//! - an empty protected bucket serializes as the zero-length byte string,
//!   never as a byte string containing an empty map;
//! - every label listed in `crit` is present and understood.

use std::collections::BTreeMap;

use minicbor::data::Type;
use minicbor::encode::Write;
use minicbor::{Decoder, Encoder};

use crate::algorithms::Algorithm;
use crate::error::CoseError;

/// Integer labels of the header parameters this workspace recognizes.
pub mod label {
    pub const ALG: i64 = 1;
    pub const CRIT: i64 = 2;
    pub const CONTENT_TYPE: i64 = 3;
    pub const KID: i64 = 4;
    pub const IV: i64 = 5;
    pub const PARTIAL_IV: i64 = 6;
}

/// A header parameter label: a small registered integer or a text string.
///
/// The derived order (integer labels ascending, then text labels) is the
/// canonical emission order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl Label {
    fn is_engine_known(&self) -> bool {
        matches!(self, Label::Int(label::ALG..=label::PARTIAL_IV))
    }
}

/// A header parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Bool(bool),
    Null,
    Array(Vec<ParameterValue>),
    Map(BTreeMap<Label, ParameterValue>),
}

impl ParameterValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ParameterValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParameterValue]> {
        match self {
            ParameterValue::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }
}

/// One labeled header parameter and the bucket it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub label: Label,
    pub value: ParameterValue,
    /// True if the parameter lives in the signature-covered bucket.
    pub protected: bool,
}

impl Parameter {
    pub fn new(label: Label, value: ParameterValue, protected: bool) -> Self {
        Parameter {
            label,
            value,
            protected,
        }
    }

    /// The `alg` parameter. Always protected.
    pub fn alg(algorithm: Algorithm) -> Self {
        Parameter::new(
            Label::Int(label::ALG),
            ParameterValue::Int(algorithm.id()),
            true,
        )
    }

    /// The `crit` parameter listing critical labels. Always protected.
    pub fn crit(labels: Vec<Label>) -> Self {
        let entries = labels
            .into_iter()
            .map(|l| match l {
                Label::Int(i) => ParameterValue::Int(i),
                Label::Text(t) => ParameterValue::Text(t),
            })
            .collect();
        Parameter::new(Label::Int(label::CRIT), ParameterValue::Array(entries), true)
    }

    /// The `content type` parameter, CoAP content-format form.
    pub fn content_type_int(format: u16) -> Self {
        Parameter::new(
            Label::Int(label::CONTENT_TYPE),
            ParameterValue::Int(i64::from(format)),
            false,
        )
    }

    /// The `content type` parameter, media-type form.
    pub fn content_type_text(media_type: impl Into<String>) -> Self {
        Parameter::new(
            Label::Int(label::CONTENT_TYPE),
            ParameterValue::Text(media_type.into()),
            false,
        )
    }

    /// The `kid` parameter. Unprotected by default; use [`Self::protect`]
    /// to move it into the protected bucket.
    pub fn kid(kid: impl Into<Vec<u8>>) -> Self {
        Parameter::new(
            Label::Int(label::KID),
            ParameterValue::Bytes(kid.into()),
            false,
        )
    }

    pub fn iv(iv: impl Into<Vec<u8>>) -> Self {
        Parameter::new(Label::Int(label::IV), ParameterValue::Bytes(iv.into()), false)
    }

    pub fn partial_iv(iv: impl Into<Vec<u8>>) -> Self {
        Parameter::new(
            Label::Int(label::PARTIAL_IV),
            ParameterValue::Bytes(iv.into()),
            false,
        )
    }

    /// Move this parameter into the protected bucket.
    pub fn protect(mut self) -> Self {
        self.protected = true;
        self
    }
}

/// An ordered collection of header parameters spanning both buckets.
///
/// Insertion order is preserved; duplicates are rejected on insert, which
/// covers both the within-bucket and the across-bucket rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterList {
    params: Vec<Parameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        ParameterList { params: Vec::new() }
    }

    pub fn from_slice(params: &[Parameter]) -> Result<Self, CoseError> {
        let mut list = ParameterList::new();
        for p in params {
            list.push(p.clone())?;
        }
        Ok(list)
    }

    /// Append a parameter, rejecting any label already present in either
    /// bucket.
    pub fn push(&mut self, parameter: Parameter) -> Result<(), CoseError> {
        if self.params.iter().any(|p| p.label == parameter.label) {
            return Err(CoseError::DuplicateParameter);
        }
        self.params.push(parameter);
        Ok(())
    }

    /// Merge another set of parameters under the no-duplicate rule.
    pub fn merge(
        &mut self,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Result<(), CoseError> {
        for p in parameters {
            self.push(p)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, label: &Label) -> Option<&Parameter> {
        self.params.iter().find(|p| p.label == *label)
    }

    /// Typed accessor for an integer-valued parameter in either bucket.
    pub fn get_int(&self, label: i64) -> Option<i64> {
        self.get(&Label::Int(label)).and_then(|p| p.value.as_int())
    }

    /// Typed accessor for a byte-string parameter in either bucket.
    pub fn get_bytes(&self, label: i64) -> Option<&[u8]> {
        self.get(&Label::Int(label)).and_then(|p| p.value.as_bytes())
    }

    /// The algorithm id, if an `alg` parameter sits in the protected bucket.
    pub fn protected_alg(&self) -> Option<i64> {
        self.params
            .iter()
            .find(|p| p.label == Label::Int(label::ALG) && p.protected)
            .and_then(|p| p.value.as_int())
    }

    /// The key identifier from either bucket.
    pub fn kid(&self) -> Option<&[u8]> {
        self.get_bytes(label::KID)
    }

    /// Check the well-known-parameter rules before encoding: types, bucket
    /// placement, and that `crit` only lists protected labels.
    pub fn validate(&self) -> Result<(), CoseError> {
        for p in &self.params {
            match p.label {
                Label::Int(label::ALG) => {
                    if !p.protected {
                        return Err(CoseError::ParameterType);
                    }
                    match p.value.as_int() {
                        Some(v) if v != 0 => {}
                        _ => return Err(CoseError::ParameterType),
                    }
                }
                Label::Int(label::CRIT) => {
                    if !p.protected {
                        return Err(CoseError::ParameterType);
                    }
                    let entries = p.value.as_array().ok_or(CoseError::ParameterType)?;
                    if entries.is_empty() {
                        return Err(CoseError::ParameterType);
                    }
                    for entry in entries {
                        let listed = match entry {
                            ParameterValue::Int(i) => Label::Int(*i),
                            ParameterValue::Text(t) => Label::Text(t.clone()),
                            _ => return Err(CoseError::ParameterType),
                        };
                        let present = self
                            .params
                            .iter()
                            .any(|q| q.protected && q.label == listed);
                        if !present {
                            return Err(CoseError::UnknownCriticalParameter);
                        }
                    }
                }
                Label::Int(label::CONTENT_TYPE) => match &p.value {
                    ParameterValue::Int(v) if (0..=i64::from(u16::MAX)).contains(v) => {}
                    ParameterValue::Text(_) => {}
                    _ => return Err(CoseError::ParameterType),
                },
                Label::Int(label::KID | label::IV | label::PARTIAL_IV) => {
                    if p.value.as_bytes().is_none() {
                        return Err(CoseError::ParameterType);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn bucket(&self, protected: bool, canonical: bool) -> Vec<&Parameter> {
        let mut entries: Vec<&Parameter> =
            self.params.iter().filter(|p| p.protected == protected).collect();
        if canonical {
            entries.sort_by(|a, b| a.label.cmp(&b.label));
        }
        entries
    }

    /// Serialize the protected bucket: the contents of the wire byte string.
    ///
    /// An empty bucket yields the zero-length byte string.
    pub fn encode_protected(&self, canonical: bool) -> Result<Vec<u8>, CoseError> {
        self.validate()?;
        let entries = self.bucket(true, canonical);
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut enc = Encoder::new(Vec::new());
        match encode_map(&mut enc, &entries) {
            Ok(()) => {}
            Err(_) => unreachable!("writing to a Vec cannot fail"),
        }
        Ok(enc.into_writer())
    }

    /// Serialize the unprotected bucket as a bare map (possibly empty).
    pub fn encode_unprotected<W: Write>(
        &self,
        enc: &mut Encoder<W>,
        canonical: bool,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        encode_map(enc, &self.bucket(false, canonical))
    }
}

fn encode_map<W: Write>(
    enc: &mut Encoder<W>,
    entries: &[&Parameter],
) -> Result<(), minicbor::encode::Error<W::Error>> {
    enc.map(entries.len() as u64)?;
    for p in entries {
        encode_label(enc, &p.label)?;
        encode_value(enc, &p.value)?;
    }
    Ok(())
}

fn encode_label<W: Write>(
    enc: &mut Encoder<W>,
    label: &Label,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    match label {
        Label::Int(i) => enc.i64(*i)?,
        Label::Text(t) => enc.str(t)?,
    };
    Ok(())
}

fn encode_value<W: Write>(
    enc: &mut Encoder<W>,
    value: &ParameterValue,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    match value {
        ParameterValue::Int(i) => {
            enc.i64(*i)?;
        }
        ParameterValue::Bytes(b) => {
            enc.bytes(b)?;
        }
        ParameterValue::Text(t) => {
            enc.str(t)?;
        }
        ParameterValue::Bool(b) => {
            enc.bool(*b)?;
        }
        ParameterValue::Null => {
            enc.null()?;
        }
        ParameterValue::Array(items) => {
            enc.array(items.len() as u64)?;
            for item in items {
                encode_value(enc, item)?;
            }
        }
        ParameterValue::Map(entries) => {
            enc.map(entries.len() as u64)?;
            for (k, v) in entries {
                encode_label(enc, k)?;
                encode_value(enc, v)?;
            }
        }
    }
    Ok(())
}

/// Bounded pool budgeting how many parameters a decode may hold.
///
/// One pool serves a whole verify operation, including the headers of every
/// COSE_Signature; exhausting it is the non-fatal
/// [`CoseError::TooManyParameters`].
#[derive(Debug)]
pub struct ParameterStorage {
    remaining: usize,
}

impl ParameterStorage {
    pub fn with_capacity(capacity: usize) -> Self {
        ParameterStorage {
            remaining: capacity,
        }
    }

    /// Reserve room for one more decoded parameter.
    pub fn take(&mut self) -> Result<(), CoseError> {
        if self.remaining == 0 {
            return Err(CoseError::TooManyParameters);
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// Caller hook for application-defined header parameters.
pub trait ParameterReader {
    /// Offered each decoded parameter the engine does not recognize. Return
    /// true if the parameter is understood; a `crit`-listed parameter no one
    /// understands fails verification.
    fn read_parameter(&self, parameter: &Parameter) -> bool;
}

/// Result of decoding one protected-bstr/unprotected-map header pair.
#[derive(Debug)]
pub struct DecodedHeaders<'a> {
    /// Parameters from both buckets, merged under the no-duplicate rule.
    pub parameters: ParameterList,
    /// The raw serialized protected bucket, as covered by the signature.
    pub protected_raw: &'a [u8],
    /// Labels listed in the `crit` parameter.
    pub crit: Vec<Label>,
    /// Labels the engine did not recognize.
    pub unknown: Vec<Label>,
    /// True when the protected bucket arrived as a bstr-wrapped empty map
    /// instead of the zero-length byte string.
    pub empty_map_form: bool,
}

fn cbor_decode_err(e: minicbor::decode::Error) -> CoseError {
    if e.is_end_of_input() {
        CoseError::CborNotWellFormed
    } else {
        CoseError::CborDecode
    }
}

/// Decode the two back-to-back header items: the protected bucket byte
/// string and the unprotected map.
///
/// Accepts both encodings of an empty protected bucket; the empty-map form
/// sets [`DecodedHeaders::empty_map_form`] and is rejected when `strict` is
/// set.
pub fn decode_header_buckets<'a>(
    dec: &mut Decoder<'a>,
    storage: &mut ParameterStorage,
    strict: bool,
) -> Result<DecodedHeaders<'a>, CoseError> {
    let protected_raw = dec.bytes().map_err(cbor_decode_err)?;

    let mut parameters = ParameterList::new();
    let mut crit = Vec::new();
    let mut unknown = Vec::new();
    let mut empty_map_form = false;

    if protected_raw == [0xa0] {
        empty_map_form = true;
        if strict {
            return Err(CoseError::ParameterType);
        }
    }

    if !protected_raw.is_empty() {
        let mut pdec = Decoder::new(protected_raw);
        decode_parameter_map(&mut pdec, true, storage, &mut parameters, &mut crit, &mut unknown)?;
        if pdec.position() != protected_raw.len() {
            return Err(CoseError::CborDecode);
        }
    }

    decode_parameter_map(dec, false, storage, &mut parameters, &mut crit, &mut unknown)?;

    Ok(DecodedHeaders {
        parameters,
        protected_raw,
        crit,
        unknown,
        empty_map_form,
    })
}

/// Check that every `crit`-listed label is present in the protected bucket
/// and understood, either by the engine or by the caller's `reader`.
pub fn check_critical(
    headers: &DecodedHeaders<'_>,
    reader: Option<&dyn ParameterReader>,
) -> Result<(), CoseError> {
    for listed in &headers.crit {
        let parameter = headers
            .parameters
            .iter()
            .find(|p| p.protected && p.label == *listed)
            .ok_or(CoseError::UnknownCriticalParameter)?;

        if listed.is_engine_known() {
            continue;
        }
        if let Some(reader) = reader {
            if reader.read_parameter(parameter) {
                continue;
            }
        }
        return Err(CoseError::UnknownCriticalParameter);
    }
    Ok(())
}

fn decode_parameter_map(
    dec: &mut Decoder<'_>,
    protected: bool,
    storage: &mut ParameterStorage,
    parameters: &mut ParameterList,
    crit: &mut Vec<Label>,
    unknown: &mut Vec<Label>,
) -> Result<(), CoseError> {
    let len = dec
        .map()
        .map_err(cbor_decode_err)?
        .ok_or(CoseError::CborDecode)?;

    for _ in 0..len {
        let lab = decode_label(dec)?;
        let value = decode_value(dec)?;

        match lab {
            Label::Int(label::ALG) => {
                if !protected {
                    return Err(CoseError::ParameterType);
                }
                match value.as_int() {
                    Some(v) if v != 0 => {}
                    _ => return Err(CoseError::ParameterType),
                }
            }
            Label::Int(label::CRIT) => {
                if !protected {
                    return Err(CoseError::ParameterType);
                }
                let entries = value.as_array().ok_or(CoseError::ParameterType)?;
                if entries.is_empty() {
                    return Err(CoseError::ParameterType);
                }
                for entry in entries {
                    match entry {
                        ParameterValue::Int(i) => crit.push(Label::Int(*i)),
                        ParameterValue::Text(t) => crit.push(Label::Text(t.clone())),
                        _ => return Err(CoseError::ParameterType),
                    }
                }
            }
            Label::Int(label::CONTENT_TYPE) => match &value {
                ParameterValue::Int(v) if (0..=i64::from(u16::MAX)).contains(v) => {}
                ParameterValue::Text(_) => {}
                _ => return Err(CoseError::ParameterType),
            },
            Label::Int(label::KID | label::IV | label::PARTIAL_IV) => {
                if value.as_bytes().is_none() {
                    return Err(CoseError::ParameterType);
                }
            }
            _ => unknown.push(lab.clone()),
        }

        storage.take()?;
        parameters.push(Parameter::new(lab, value, protected))?;
    }

    Ok(())
}

fn decode_label(dec: &mut Decoder<'_>) -> Result<Label, CoseError> {
    match dec.datatype().map_err(cbor_decode_err)? {
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => Ok(Label::Int(dec.i64().map_err(cbor_decode_err)?)),
        Type::String => Ok(Label::Text(dec.str().map_err(cbor_decode_err)?.to_string())),
        _ => Err(CoseError::ParameterType),
    }
}

fn decode_value(dec: &mut Decoder<'_>) -> Result<ParameterValue, CoseError> {
    match dec.datatype().map_err(cbor_decode_err)? {
        Type::Null => {
            dec.null().map_err(cbor_decode_err)?;
            Ok(ParameterValue::Null)
        }
        Type::Bool => Ok(ParameterValue::Bool(dec.bool().map_err(cbor_decode_err)?)),
        Type::Bytes => Ok(ParameterValue::Bytes(
            dec.bytes().map_err(cbor_decode_err)?.to_vec(),
        )),
        Type::String => Ok(ParameterValue::Text(
            dec.str().map_err(cbor_decode_err)?.to_string(),
        )),
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => Ok(ParameterValue::Int(dec.i64().map_err(cbor_decode_err)?)),
        Type::Array => {
            let len = dec
                .array()
                .map_err(cbor_decode_err)?
                .ok_or(CoseError::CborDecode)?;
            let mut out = Vec::with_capacity(len as usize);
            for _ in 0..len {
                out.push(decode_value(dec)?);
            }
            Ok(ParameterValue::Array(out))
        }
        Type::Map => {
            let len = dec
                .map()
                .map_err(cbor_decode_err)?
                .ok_or(CoseError::CborDecode)?;
            let mut out = BTreeMap::new();
            for _ in 0..len {
                let k = decode_label(dec)?;
                let v = decode_value(dec)?;
                out.insert(k, v);
            }
            Ok(ParameterValue::Map(out))
        }
        _ => Err(CoseError::ParameterType),
    }
}
