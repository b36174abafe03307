//! Collection ids, collection names and prefixed column names.
//!
//! Every column carries its entity prefix so that a single PocketBase
//! instance can host these collections next to application data without
//! name clashes.

pub mod users {
    pub const COLLECTION: &str = "users";
    pub const COLLECTION_ID: &str = "authjsusers0001";

    pub const NAME: &str = "user_name";
    pub const EMAIL: &str = "user_email";
    pub const EMAIL_VERIFIED: &str = "user_email_verified";
    pub const IMAGE: &str = "user_image";
}

pub mod accounts {
    pub const COLLECTION: &str = "accounts";
    pub const COLLECTION_ID: &str = "authjsaccnts001";

    pub const TYPE: &str = "account_type";
    pub const PROVIDER: &str = "account_provider";
    pub const PROVIDER_ACCOUNT_ID: &str = "account_provider_account_id";
    pub const USER: &str = "account_user";
    pub const REFRESH_TOKEN: &str = "account_refresh_token";
    pub const ACCESS_TOKEN: &str = "account_access_token";
    pub const EXPIRES_AT: &str = "account_expires_at";
    pub const TOKEN_TYPE: &str = "account_token_type";
    pub const SCOPE: &str = "account_scope";
    pub const ID_TOKEN: &str = "account_id_token";
    pub const SESSION_STATE: &str = "account_session_state";
}

pub mod sessions {
    pub const COLLECTION: &str = "sessions";
    pub const COLLECTION_ID: &str = "authjssessns001";

    pub const SESSION_TOKEN: &str = "session_session_token";
    pub const USER: &str = "session_user";
    pub const EXPIRES: &str = "session_expires";
}

pub mod verification_tokens {
    pub const COLLECTION: &str = "verification_tokens";
    pub const COLLECTION_ID: &str = "authjsvtokens01";

    pub const IDENTIFIER: &str = "verification_token_identifier";
    pub const TOKEN: &str = "verification_token_token";
    pub const EXPIRES: &str = "verification_token_expires";
}

pub mod authenticators {
    pub const COLLECTION: &str = "authenticators";
    pub const COLLECTION_ID: &str = "authjsauthntr01";

    pub const CREDENTIAL_ID: &str = "authenticator_credential_id";
    pub const USER: &str = "authenticator_user";
    pub const PROVIDER_ACCOUNT_ID: &str = "authenticator_provider_account_id";
    pub const CREDENTIAL_PUBLIC_KEY: &str = "authenticator_credential_public_key";
    pub const COUNTER: &str = "authenticator_counter";
    pub const CREDENTIAL_DEVICE_TYPE: &str = "authenticator_credential_device_type";
    pub const CREDENTIAL_BACKED_UP: &str = "authenticator_credential_backed_up";
    pub const TRANSPORTS: &str = "authenticator_transports";
}
