use qrl_xmss::{
    address_is_valid, derive_address, Error, HashFunction, TraversalStrategy, Xmss, XmssSeed,
};

fn simple_xmss() {
    // A user creates a random 48-byte seed. Keep it secret: it is the whole key.
    let seed = XmssSeed::random();

    // Create a key pair of height 4, i.e. 16 one-time signatures, using the
    // BDS traversal so that signing does not recompute the tree.
    let mut xmss = Xmss::fast(&seed, 4, HashFunction::Shake128).unwrap();

    // The extended public key and the address can be published.
    let pk = xmss.extended_pk();
    let address = xmss.address();
    println!("public key: {}", pk.to_hex());
    println!("address:    {}", address);

    // Anyone can derive the address from the public key and check it.
    assert_eq!(derive_address(pk.as_ref()).unwrap(), address);
    assert!(address_is_valid(address.as_ref()));

    // Sign a message. Every signature uses up one leaf of the tree.
    let msg1 = "Hi! This is my first XMSS message!".as_bytes();
    let sig1 = xmss.sign(msg1).unwrap().to_bytes();
    assert_eq!(sig1.len(), xmss.signature_len());

    // Verification only needs the message, the signature and the public key.
    assert!(Xmss::verify(msg1, &sig1, pk.as_ref()));

    // A signature does not verify a different message.
    let msg2 = "This is not what I signed.".as_bytes();
    assert!(!Xmss::verify(msg2, &sig1, pk.as_ref()));

    // The same seed and descriptor always rebuild the same key, here with the
    // basic traversal. Do not sign with both copies: the index is not shared.
    let restored =
        Xmss::from_extended_seed(xmss.extended_seed().as_ref(), TraversalStrategy::Basic).unwrap();
    assert_eq!(restored.extended_pk(), pk);

    // Use up the remaining leaves.
    while xmss.remaining_signatures() > 0 {
        let sig = xmss.sign(msg2).unwrap().to_bytes();
        assert!(Xmss::verify(msg2, &sig, pk.as_ref()));
    }

    // Oh, no! The key is exhausted and refuses to sign again.
    assert_eq!(xmss.sign(msg1), Err(Error::ExhaustedKey { height: 4 }));
    println!("signed {} messages", xmss.index());
}

fn main() {
    // Debug level shows key generation and rejected signatures.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    simple_xmss();
}
