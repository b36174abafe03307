//! WebAuthn credentials.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

/// A registered WebAuthn authenticator. Unique on `(userId, credentialId)`
/// and on `credentialId` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticator {
    #[serde(rename = "credentialID")]
    pub credential_id: String,
    pub user_id: UserId,
    pub provider_account_id: String,
    pub credential_public_key: String,
    pub counter: i64,
    pub credential_device_type: String,
    pub credential_backed_up: bool,
    #[serde(default)]
    pub transports: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authenticator_uses_framework_credential_id_casing() {
        let authenticator: Authenticator = serde_json::from_value(json!({
            "credentialID": "cred-1",
            "userId": "u1",
            "providerAccountId": "cred-1",
            "credentialPublicKey": "pk",
            "counter": 3,
            "credentialDeviceType": "singleDevice",
            "credentialBackedUp": false
        }))
        .unwrap();

        assert_eq!(authenticator.credential_id, "cred-1");
        assert_eq!(authenticator.transports, None);
        assert_eq!(
            serde_json::to_value(&authenticator).unwrap()["credentialID"],
            json!("cred-1")
        );
    }
}
