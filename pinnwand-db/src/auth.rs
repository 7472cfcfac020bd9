use crate::{
    client::{DbClient, DbError, Result},
    record::AuthenticationRecord,
};
use pinnwand_common::{
    model::{
        Id,
        auth::{
            AccessToken, AuthToken, AuthTokenHash, Authentication, Credentials, TokenKind,
            TokenPair, verify_password,
        },
        user::UserMarker,
    },
    util::PositiveDuration,
};
use sqlx::{query, query_as};
use time::{OffsetDateTime, UtcDateTime};
use tracing::{debug, info, instrument};

/// How long freshly issued tokens stay valid.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct TokenLifetimes {
    pub access: PositiveDuration,
    pub refresh: PositiveDuration,
}

#[derive(sqlx::FromRow)]
struct LoginRecord {
    user_snowflake: i64,
    password_hash: String,
}

impl DbClient {
    /// Unknown email and wrong password fail the same way.
    #[instrument(skip(self, lifetimes))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        lifetimes: TokenLifetimes,
    ) -> Result<TokenPair> {
        let record = query_as::<_, LoginRecord>(
            "
            SELECT
                user_snowflake,
                password_hash
            FROM
                users
            WHERE
                email = $1
            ",
        )
        .bind(&credentials.email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::InvalidCredentials)?;

        if !verify_password(&credentials.password, &record.password_hash)? {
            return Err(DbError::InvalidCredentials);
        }

        let user_id = Id::from_db(record.user_snowflake);
        let access_token = self
            .issue_token(user_id, TokenKind::Access, lifetimes.access)
            .await?;
        let refresh_token = self
            .issue_token(user_id, TokenKind::Refresh, lifetimes.refresh)
            .await?;

        info!(%user_id, "User logged in");
        Ok(TokenPair {
            access_token: access_token.as_token_str(),
            refresh_token: refresh_token.as_token_str(),
        })
    }

    /// Trades a live refresh token for a new access token.
    #[instrument(skip(self, lifetime))]
    pub async fn refresh_access_token(
        &self,
        refresh_token: &AuthToken,
        lifetime: PositiveDuration,
    ) -> Result<AccessToken> {
        let token_hash = refresh_token.hash()?;
        let authentication = self
            .fetch_auth(&token_hash)
            .await?
            .filter(|authentication| {
                authentication.kind == TokenKind::Refresh
                    && authentication.user == refresh_token.user_id
                    && !authentication.is_expired_at(UtcDateTime::now())
            })
            .ok_or(DbError::InvalidCredentials)?;

        let access_token = self
            .issue_token(authentication.user, TokenKind::Access, lifetime)
            .await?;

        debug!(user_id = %authentication.user, "Access token refreshed");
        Ok(AccessToken {
            access_token: access_token.as_token_str(),
        })
    }

    async fn issue_token(
        &self,
        user_id: Id<UserMarker>,
        kind: TokenKind,
        lifetime: PositiveDuration,
    ) -> Result<AuthToken> {
        let token = AuthToken::generate_random(user_id);
        let token_hash = token.hash()?;

        query(
            "
            INSERT INTO authentications (token_hash, user_snowflake, kind, created_at, expires_after_seconds)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&token_hash.0[..])
        .bind(user_id.to_db())
        .bind(kind.as_str())
        .bind(OffsetDateTime::now_utc())
        .bind(lifetime.whole_seconds())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    pub async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                user_snowflake,
                kind,
                token_hash,
                created_at,
                expires_after_seconds
            FROM
                authentications
            WHERE
                token_hash = $1
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }
}
