use super::*;

#[test]
fn test_token_parse_unpadded() {
    let token = Token::parse("eyJzZWVkIjoiYWJjIiwidm9sIjowLjI1fQ.c2lnbmF0dXJl").unwrap();
    assert_eq!(token.seed(), "abc");
    assert_eq!(token.volatility(), 0.25);
    assert_eq!(token.volatility_level().get(), 4);
    assert_eq!(token.raw(), "eyJzZWVkIjoiYWJjIiwidm9sIjowLjI1fQ.c2lnbmF0dXJl");
}

#[test]
fn test_token_parse_padded() {
    let token = Token::parse("eyJzZWVkIjoicyIsInZvbCI6MX0=.sig").unwrap();
    assert_eq!(token.seed(), "s");
    assert_eq!(token.volatility_level(), VolatilityLevel::MIN);
}

#[test]
fn test_token_default_volatility() {
    let token = Token::parse("eyJzZWVkIjoiYWJjIn0.x").unwrap();
    assert_eq!(token.payload().vol, None);
    assert_eq!(token.volatility(), DEFAULT_VOLATILITY);
    assert_eq!(token.volatility_level().get(), 3);
}

#[test]
fn test_token_signature_is_opaque() {
    // Anything after the first dot is carried, never decoded.
    let token = Token::parse("eyJzZWVkIjoiYWJjIn0.!!not-base64!!.more").unwrap();
    assert_eq!(token.seed(), "abc");
}

#[test]
fn test_token_errors() {
    assert!(matches!(
        Token::parse("eyJzZWVkIjoiYWJjIn0"),
        Err(TokenError::MissingSignature)
    ));
    assert!(matches!(Token::parse("***.sig"), Err(TokenError::Base64(_))));
    assert!(matches!(Token::parse("bm90IGpzb24.sig"), Err(TokenError::Json(_))));
    // Seed is required.
    assert!(matches!(Token::parse("eyJ2b2wiOjAuNX0.sig"), Err(TokenError::Json(_))));
}

#[test]
fn test_token_encode_parse() {
    let payload = TokenPayload {
        seed: "00112233445566778899aabbccddeeff".to_string(),
        vol: Some(0.75),
    };
    let raw = Token::encode(&payload, "signature").unwrap();
    assert!(!raw.contains('='));
    let token = Token::parse(&raw).unwrap();
    assert_eq!(token.payload(), &payload);
    assert_eq!(token.volatility_level().get(), 2);
}
