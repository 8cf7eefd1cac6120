use stream_identity::{IdentityError, StreamSigner, compound};

#[test]
fn signed_names_verify_with_the_same_secret() {
    let signer = StreamSigner::new("s3cret");
    let name = compound(&[Some("post"), Some("17"), None, Some("comments")]);
    let id = signer.sign(&name).unwrap();
    assert_eq!(signer.verify(id.as_str()), Ok("post:17:comments".to_string()));
}

#[test]
fn names_with_the_separator_still_verify() {
    let signer = StreamSigner::new("s3cret");
    let id = signer.sign("a--b").unwrap();
    assert_eq!(signer.verify(id.as_str()).as_deref(), Ok("a--b"));
}

#[test]
fn tampering_is_detected() {
    let signer = StreamSigner::new("s3cret");
    let id = signer.sign("room:1").unwrap().into_string();
    let (_, digest) = id.split_once("--").unwrap();

    let forged_data = signer.sign("room:2").unwrap().into_string();
    let (other_data, _) = forged_data.split_once("--").unwrap();
    assert_eq!(
        signer.verify(&format!("{other_data}--{digest}")),
        Err(IdentityError::BadSignature)
    );
    assert_eq!(
        StreamSigner::new("other").verify(&id),
        Err(IdentityError::BadSignature)
    );
}

#[test]
fn malformed_identifiers_are_rejected() {
    let signer = StreamSigner::new("s3cret");
    assert_eq!(signer.verify("no-separator"), Err(IdentityError::Malformed));
    assert_eq!(signer.verify("--abcd"), Err(IdentityError::Malformed));
    assert!(matches!(signer.verify("abc--zz"), Err(IdentityError::Hex(_))));
}
