// secret.rs — The SecretStore capability.
//
// Connector credentials are stored encrypted by the surrounding service;
// the core receives plaintext through this trait exactly where a
// connector is constructed and holds it no longer than the connector
// does. Encryption at rest is the service layer's concern.

use std::collections::HashMap;

use async_trait::async_trait;

/// Decrypts a credential blob into its key/value fields.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Decrypt one credential blob. The error string is surfaced to the
    /// operator, never to tenants.
    async fn decrypt(&self, blob: &[u8]) -> Result<HashMap<String, String>, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plaintext "store" for tests: blobs are `key=value` lines.
    struct PlainSecretStore;

    #[async_trait]
    impl SecretStore for PlainSecretStore {
        async fn decrypt(&self, blob: &[u8]) -> Result<HashMap<String, String>, String> {
            let text = std::str::from_utf8(blob).map_err(|e| e.to_string())?;
            Ok(text
                .lines()
                .filter_map(|line| {
                    line.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn decrypt_yields_credential_fields() {
        let store = PlainSecretStore;
        let fields = store
            .decrypt(b"account_id=12345\ntoken_secret=shh")
            .await
            .unwrap();
        assert_eq!(fields.get("account_id").map(String::as_str), Some("12345"));
        assert_eq!(fields.len(), 2);
    }
}
