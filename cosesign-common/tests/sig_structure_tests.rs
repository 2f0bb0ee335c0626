// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cosesign_common::{CoseError, MessageKind, MessageSink, SigStructure};
use minicbor::encode::Write as _;
use minicbor::Encoder;

#[test]
fn signature1_encoding_matches_hand_built_bytes() {
    let body_protected = [0xa1, 0x01, 0x26]; // {1: -7}
    let sig_structure = SigStructure {
        kind: MessageKind::Sign1,
        body_protected: &body_protected,
        sign_protected: None,
        external_aad: &[],
        payload: b"payload",
    };

    let mut enc = Encoder::new(Vec::new());
    enc.array(4).unwrap();
    enc.str("Signature1").unwrap();
    enc.bytes(&body_protected).unwrap();
    enc.bytes(&[]).unwrap();
    enc.bytes(b"payload").unwrap();
    let expected = enc.into_writer();

    assert_eq!(sig_structure.to_vec(), expected);
    assert_eq!(sig_structure.encoded_size(), expected.len());
}

#[test]
fn signature_encoding_carries_sign_protected() {
    let body_protected = [0xa1, 0x01, 0x26];
    let sign_protected = [0xa1, 0x01, 0x27];
    let sig_structure = SigStructure {
        kind: MessageKind::Sign,
        body_protected: &body_protected,
        sign_protected: Some(&sign_protected),
        external_aad: b"aad",
        payload: b"payload",
    };

    let bytes = sig_structure.to_vec();
    let mut dec = minicbor::Decoder::new(&bytes);
    assert_eq!(dec.array().unwrap(), Some(5));
    assert_eq!(dec.str().unwrap(), "Signature");
    assert_eq!(dec.bytes().unwrap(), body_protected);
    assert_eq!(dec.bytes().unwrap(), sign_protected);
    assert_eq!(dec.bytes().unwrap(), b"aad");
    assert_eq!(dec.bytes().unwrap(), b"payload");
}

#[test]
fn bounded_encoding_enforces_the_auxiliary_limit() {
    let sig_structure = SigStructure {
        kind: MessageKind::Sign1,
        body_protected: &[],
        sign_protected: None,
        external_aad: &[],
        payload: &[0u8; 128],
    };

    let size = sig_structure.encoded_size();
    assert_eq!(
        sig_structure.to_vec_bounded(size - 1).unwrap_err(),
        CoseError::TbsTooLarge
    );
    assert_eq!(sig_structure.to_vec_bounded(size).unwrap().len(), size);
}

#[test]
fn counting_sink_matches_buffer_sink() {
    let mut counter = MessageSink::size_only();
    counter.write_all(b"hello").unwrap();
    counter.write_all(b" world").unwrap();
    assert!(counter.is_size_only());
    assert_eq!(counter.bytes_written(), 11);

    let mut buf = [0u8; 11];
    let mut sink = MessageSink::new(&mut buf);
    sink.write_all(b"hello").unwrap();
    sink.write_all(b" world").unwrap();
    assert_eq!(sink.bytes_written(), 11);
    assert_eq!(&buf, b"hello world");
}

#[test]
fn buffer_sink_rejects_overflow() {
    let mut buf = [0u8; 4];
    let mut sink = MessageSink::new(&mut buf);
    sink.write_all(b"1234").unwrap();
    assert!(sink.write_all(b"5").is_err());
}
