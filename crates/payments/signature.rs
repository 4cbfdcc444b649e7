use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Digest for the outbound widget hand-off. The gateway recomputes this over
/// the same field order before accepting a payment, so the concatenation
/// order is part of the wire contract.
pub fn checkout_digest(reference: &str, amount_minor: i32, currency: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_minor.to_string().as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies the checksum delivered in the webhook header against the event
/// body. The event names its own signed properties (`signature.properties`,
/// in order); each dotted path is resolved against the body, the resolved
/// values are concatenated, the event timestamp and the shared secret are
/// appended, and the SHA-256 hex digest must equal the checksum.
///
/// Every malformed shape verifies false rather than surfacing a separate
/// error; comparison is constant-time.
pub fn verify_event_checksum(event: &Value, secret: &str, checksum: &str) -> bool {
    let Some(expected) = event_digest(event, secret) else {
        return false;
    };
    let provided = checksum.trim().to_ascii_lowercase();

    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

fn event_digest(event: &Value, secret: &str) -> Option<String> {
    let properties = event.get("signature")?.get("properties")?.as_array()?;

    let mut payload = String::new();
    for property in properties {
        let path = property.as_str()?;
        payload.push_str(&resolve_path(event, path));
    }
    payload.push_str(&scalar_to_string(event.get("timestamp")?));
    payload.push_str(secret);

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// Object navigation by dotted path; anything missing resolves to the empty
/// string so one absent optional field does not shift the others.
fn resolve_path(event: &Value, path: &str) -> String {
    let mut current = event;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    scalar_to_string(current)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        // Arrays and objects serialize to their compact JSON form, which is
        // the canonical representation the gateway signs.
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test_shared_secret";

    fn sample_event() -> Value {
        json!({
            "event": "transaction.updated",
            "timestamp": "1722470400",
            "signature": {
                "properties": [
                    "data.transaction.reference",
                    "data.transaction.status",
                    "data.transaction.amount",
                    "data.transaction.currency"
                ]
            },
            "data": {
                "transaction": {
                    "id": "txn_9f1",
                    "reference": "PAY-1722470000000-a1B2c3D4e5",
                    "status": "APPROVED",
                    "amount": 999,
                    "currency": "USD"
                }
            }
        })
    }

    fn digest_of(payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    #[test]
    fn accepts_matching_checksum() {
        let event = sample_event();
        let checksum = digest_of(&format!(
            "PAY-1722470000000-a1B2c3D4e5APPROVED999USD1722470400{SECRET}"
        ));

        assert!(verify_event_checksum(&event, SECRET, &checksum));
    }

    #[test]
    fn accepts_uppercase_checksum() {
        let event = sample_event();
        let checksum = digest_of(&format!(
            "PAY-1722470000000-a1B2c3D4e5APPROVED999USD1722470400{SECRET}"
        ))
        .to_ascii_uppercase();

        assert!(verify_event_checksum(&event, SECRET, &checksum));
    }

    #[test]
    fn rejects_tampered_amount() {
        let mut event = sample_event();
        let checksum = digest_of(&format!(
            "PAY-1722470000000-a1B2c3D4e5APPROVED999USD1722470400{SECRET}"
        ));

        event["data"]["transaction"]["amount"] = json!(1);

        assert!(!verify_event_checksum(&event, SECRET, &checksum));
    }

    #[test]
    fn rejects_wrong_secret() {
        let event = sample_event();
        let checksum = digest_of(&format!(
            "PAY-1722470000000-a1B2c3D4e5APPROVED999USD1722470400{SECRET}"
        ));

        assert!(!verify_event_checksum(&event, "another secret", &checksum));
    }

    #[test]
    fn missing_paths_resolve_to_empty_string() {
        let mut event = sample_event();
        event["signature"]["properties"] = json!([
            "data.transaction.reference",
            "data.transaction.installments"
        ]);
        let checksum = digest_of(&format!("PAY-1722470000000-a1B2c3D4e51722470400{SECRET}"));

        assert!(verify_event_checksum(&event, SECRET, &checksum));
    }

    #[test]
    fn non_scalar_values_serialize_to_compact_json() {
        let mut event = sample_event();
        event["signature"]["properties"] = json!(["data.transaction.card"]);
        event["data"]["transaction"]["card"] = json!({"brand": "visa", "last4": "4242"});
        let checksum = digest_of(&format!(
            "{}{}{}",
            r#"{"brand":"visa","last4":"4242"}"#, "1722470400", SECRET
        ));

        assert!(verify_event_checksum(&event, SECRET, &checksum));
    }

    #[test]
    fn malformed_events_verify_false() {
        assert!(!verify_event_checksum(&json!({}), SECRET, "deadbeef"));
        assert!(!verify_event_checksum(
            &json!({"signature": {"properties": "not-a-list"}, "timestamp": "1"}),
            SECRET,
            "deadbeef"
        ));
        assert!(!verify_event_checksum(
            &json!({"signature": {"properties": [42]}, "timestamp": "1"}),
            SECRET,
            "deadbeef"
        ));
        // properties present but the timestamp is missing
        assert!(!verify_event_checksum(
            &json!({"signature": {"properties": []}}),
            SECRET,
            "deadbeef"
        ));
    }

    #[test]
    fn checkout_digest_is_order_sensitive() {
        let digest = checkout_digest("PAY-1-x", 999, "USD", SECRET);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, checkout_digest("PAY-1-x", 999, "USD", SECRET));
        assert_ne!(digest, checkout_digest("PAY-1-x", 998, "USD", SECRET));
        assert_ne!(digest, checkout_digest("PAY-1-x", 999, "EUR", SECRET));
    }
}
