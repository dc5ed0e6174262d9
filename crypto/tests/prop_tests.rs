use proptest::prelude::*;

use wordrop_crypto::{TokenCodec, TokenError};
use wordrop_types::{SubscriberId, Timestamp};

proptest! {
    /// parse(issue(id, code)) recovers the pair at any instant before expiry.
    #[test]
    fn issue_parse_roundtrip(
        seq in any::<u64>(),
        code in "[0-9a-f]{24}",
        issued in 0u64..4_000_000_000,
        offset in 0u64..900,
    ) {
        let codec = TokenCodec::new(b"prop-secret", 900).unwrap();
        let id = SubscriberId::from_sequence(seq);
        let now = Timestamp::new(issued);
        let token = codec.issue(&id, &code, now).unwrap();

        let claims = codec.parse(&token, now.plus_secs(offset)).unwrap();
        prop_assert_eq!(claims.id, id);
        prop_assert_eq!(claims.verification_code, code);
    }

    /// A token never validates under a different secret.
    #[test]
    fn foreign_secret_never_validates(seq in any::<u64>(), secret in prop::collection::vec(any::<u8>(), 1..64)) {
        prop_assume!(secret.as_slice() != b"prop-secret");
        let issuer = TokenCodec::new(b"prop-secret", 900).unwrap();
        let verifier = TokenCodec::new(&secret, 900).unwrap();
        let now = Timestamp::new(1_000);
        let token = issuer.issue(&SubscriberId::from_sequence(seq), "code", now).unwrap();
        prop_assert_eq!(verifier.parse(&token, now), Err(TokenError::BadSignature));
    }
}
