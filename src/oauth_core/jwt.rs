//! Signed JWT encoding of protocol messages (request objects).

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};

use super::message::Message;
use super::types::{JWTAlgorithm, Result};

fn encoding_key(key: &str, alg: JWTAlgorithm) -> Result<EncodingKey> {
    Ok(match alg {
        JWTAlgorithm::HS256 | JWTAlgorithm::HS384 | JWTAlgorithm::HS512 => EncodingKey::from_secret(key.as_bytes()),
        JWTAlgorithm::RS256 => EncodingKey::from_rsa_pem(key.as_bytes())?,
    })
}

fn decoding_key(key: &str, alg: JWTAlgorithm) -> Result<DecodingKey> {
    Ok(match alg {
        JWTAlgorithm::HS256 | JWTAlgorithm::HS384 | JWTAlgorithm::HS512 => DecodingKey::from_secret(key.as_bytes()),
        JWTAlgorithm::RS256 => DecodingKey::from_rsa_pem(key.as_bytes())?,
    })
}

/// Signs `claims` as a compact JWS.
///
/// `key` is the shared secret for HS* and the RSA private key PEM for RS256.
pub fn encode_claims(claims: &Map<String, Value>, key: &str, alg: JWTAlgorithm) -> Result<String> {
    let header = Header::new(alg.into());
    Ok(encode(&header, claims, &encoding_key(key, alg)?)?)
}

/// Decodes the claims of a compact JWS.
///
/// Messages carry no registered claims, so none are required and `exp`/`aud`
/// are not checked. With `verify` off the signature is ignored and `key` is
/// not used.
pub fn decode_claims(token: &str, key: &str, alg: JWTAlgorithm, verify: bool) -> Result<Map<String, Value>> {
    let mut validation = Validation::new(alg.into());
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;
    let key = if verify {
        decoding_key(key, alg)?
    } else {
        validation.insecure_disable_signature_validation();
        DecodingKey::from_secret(&[])
    };
    Ok(decode::<Map<String, Value>>(token, &key, &validation)?.claims)
}

/// Signs every parameter of `message`, extensions included.
pub fn encode_message<M: Message>(message: &M, key: &str, alg: JWTAlgorithm) -> Result<String> {
    encode_claims(&message.to_map(true), key, alg)
}

/// Decodes a message from a compact JWS. Does not run the message's own verification.
pub fn decode_message<M: Message>(token: &str, key: &str, alg: JWTAlgorithm, verify: bool, extended: bool) -> Result<M> {
    M::from_map(decode_claims(token, key, alg, verify)?, extended)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oauth_core::message::AuthorizationRequest;
    use crate::oauth_core::types::OAuthError;

    fn request() -> AuthorizationRequest {
        let mut req = AuthorizationRequest {
            response_type: vec!["code".into()],
            client_id: "cid".into(),
            state: Some("s1".into()),
            ..Default::default()
        };
        req.extension.insert("nonce".into(), Value::String("n-1".into()));
        req
    }

    #[test]
    fn signed_message_decodes_with_same_key() {
        let token = encode_message(&request(), "k3y", JWTAlgorithm::HS256).unwrap();
        let decoded: AuthorizationRequest = decode_message(&token, "k3y", JWTAlgorithm::HS256, true, true).unwrap();
        assert_eq!(decoded, request());
    }

    #[test]
    fn wrong_key_is_rejected_only_when_verifying() {
        let token = encode_message(&request(), "k3y", JWTAlgorithm::HS512).unwrap();
        let err = decode_message::<AuthorizationRequest>(&token, "other", JWTAlgorithm::HS512, true, false);
        assert!(matches!(err, Err(OAuthError::Codec(_))));
        let decoded: AuthorizationRequest = decode_message(&token, "other", JWTAlgorithm::HS512, false, false).unwrap();
        assert_eq!(decoded.client_id, "cid");
        assert!(decoded.extension.is_empty());
    }
}
