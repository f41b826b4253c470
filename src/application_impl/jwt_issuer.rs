use crate::application_port::{
    AccessVerification, AuthError, IssuedToken, RefreshVerification, TokenIssuer,
};
use crate::domain_model::{Principal, Role, SubjectId};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TYP_ACCESS: &str = "access";
const TYP_REFRESH: &str = "refresh";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
    pub access_secret: Vec<u8>,
    /// Retired access secrets still accepted for verification during a key
    /// rollover, highest priority first. Never used for signing.
    pub access_legacy_secrets: Vec<Vec<u8>>,
    pub refresh_secret: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    typ: String,
    #[serde(default)]
    jti: Option<String>,
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    role: Role,
    typ: String,
    jti: String,
    iat: i64,
    exp: i64,
    iss: String,
}

/// HS256 issuer with independent key material per token kind. An access token
/// can never verify where a refresh token is expected (and vice versa): the
/// signature fails first, and the `typ` claim is a second line behind that.
pub struct JwtHs256Issuer {
    issuer: String,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
    access_encoding: EncodingKey,
    access_decoding: Vec<DecodingKey>,
    refresh_encoding: EncodingKey,
    refresh_decoding: Vec<DecodingKey>,
    validation: Validation,
    validation_expired_ok: Validation,
}

impl JwtHs256Issuer {
    /// A missing secret is a configuration error and refuses to boot; it is
    /// never mapped to a per-request failure.
    pub fn new(cfg: JwtConfig) -> anyhow::Result<Self> {
        if cfg.access_secret.is_empty() || cfg.refresh_secret.is_empty() {
            return Err(anyhow::anyhow!("jwt signing secrets must not be empty"));
        }
        if cfg.access_secret == cfg.refresh_secret {
            return Err(anyhow::anyhow!(
                "access and refresh secrets must be independent"
            ));
        }

        let mut access_decoding = vec![DecodingKey::from_secret(&cfg.access_secret)];
        for legacy in &cfg.access_legacy_secrets {
            access_decoding.push(DecodingKey::from_secret(legacy));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[cfg.issuer.clone()]);

        let mut validation_expired_ok = validation.clone();
        validation_expired_ok.validate_exp = false;

        Ok(Self {
            issuer: cfg.issuer,
            access_ttl: cfg.access_ttl,
            refresh_ttl: cfg.refresh_ttl,
            access_encoding: EncodingKey::from_secret(&cfg.access_secret),
            access_decoding,
            refresh_encoding: EncodingKey::from_secret(&cfg.refresh_secret),
            refresh_decoding: vec![DecodingKey::from_secret(&cfg.refresh_secret)],
            validation,
            validation_expired_ok,
        })
    }

    #[inline]
    fn fresh_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn sign<C: Serialize>(&self, claims: &C, key: &EncodingKey) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Try every verification key in priority order. Success and failure are
    /// plain return values; a signature-valid-but-expired outcome under any
    /// key is remembered so the caller can tell `ExpiredToken` apart in logs.
    fn decode_with_keys<C: DeserializeOwned>(
        token: &str,
        keys: &[DecodingKey],
        validation: &Validation,
    ) -> Result<C, AuthError> {
        let mut saw_expired = false;
        for key in keys {
            match decode::<C>(token, key, validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => {
                    if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                        saw_expired = true;
                    }
                }
            }
        }
        if saw_expired {
            Err(AuthError::ExpiredToken)
        } else {
            Err(AuthError::MalformedToken)
        }
    }

    #[inline]
    fn parse_subject(sub: &str) -> Result<SubjectId, AuthError> {
        sub.parse::<SubjectId>().map_err(|_| AuthError::MalformedToken)
    }

    #[inline]
    fn exp_to_datetime(exp: i64) -> Result<DateTime<Utc>, AuthError> {
        DateTime::from_timestamp(exp, 0).ok_or(AuthError::MalformedToken)
    }

    fn refresh_verification(claims: RefreshClaims) -> Result<RefreshVerification, AuthError> {
        if claims.typ != TYP_REFRESH {
            return Err(AuthError::TypeMismatch);
        }
        Ok(RefreshVerification {
            subject: Self::parse_subject(&claims.sub)?,
            role: claims.role,
            id: claims.jti,
            expires_at: Self::exp_to_datetime(claims.exp)?,
        })
    }
}

#[async_trait::async_trait]
impl TokenIssuer for JwtHs256Issuer {
    async fn issue_access(&self, principal: &Principal) -> Result<IssuedToken, AuthError> {
        let id = Self::fresh_id();
        let iat = Utc::now();
        let exp = iat + self.access_ttl;
        let claims = AccessClaims {
            sub: principal.subject.to_string(),
            role: principal.role,
            email: principal.email.clone(),
            typ: TYP_ACCESS.to_string(),
            jti: Some(id.clone()),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };
        let token = self.sign(&claims, &self.access_encoding)?;
        Ok(IssuedToken {
            token,
            id,
            expires_at: exp,
        })
    }

    async fn issue_refresh(&self, principal: &Principal) -> Result<IssuedToken, AuthError> {
        let id = Self::fresh_id();
        let iat = Utc::now();
        let exp = iat + self.refresh_ttl;
        let claims = RefreshClaims {
            sub: principal.subject.to_string(),
            role: principal.role,
            typ: TYP_REFRESH.to_string(),
            jti: id.clone(),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };
        let token = self.sign(&claims, &self.refresh_encoding)?;
        Ok(IssuedToken {
            token,
            id,
            expires_at: exp,
        })
    }

    async fn verify_access(&self, token: &str) -> Result<AccessVerification, AuthError> {
        let claims: AccessClaims =
            Self::decode_with_keys(token, &self.access_decoding, &self.validation)?;
        if claims.typ != TYP_ACCESS {
            return Err(AuthError::TypeMismatch);
        }
        Ok(AccessVerification {
            subject: Self::parse_subject(&claims.sub)?,
            role: claims.role,
            email: claims.email,
            id: claims.jti,
            expires_at: Self::exp_to_datetime(claims.exp)?,
        })
    }

    async fn verify_refresh(&self, token: &str) -> Result<RefreshVerification, AuthError> {
        let claims: RefreshClaims =
            Self::decode_with_keys(token, &self.refresh_decoding, &self.validation)?;
        Self::refresh_verification(claims)
    }

    async fn verify_refresh_expired_ok(
        &self,
        token: &str,
    ) -> Result<RefreshVerification, AuthError> {
        let claims: RefreshClaims =
            Self::decode_with_keys(token, &self.refresh_decoding, &self.validation_expired_ok)?;
        Self::refresh_verification(claims)
    }
}
