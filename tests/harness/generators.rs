// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use contact_relay::{limiter::ClientId, validator::ContactPayload};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client identities for testing.
pub fn generate_clients(count: usize) -> Vec<ClientId> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            ClientId::from(IpAddr::V4(Ipv4Addr::new(10, a, b, c)))
        })
        .collect()
}

/// Generate distinct valid submissions.
pub fn generate_valid_payloads(count: usize) -> Vec<ContactPayload> {
    (0..count)
        .map(|i| {
            ContactPayload::new(
                &format!("Visitor {i}"),
                &format!("visitor{i}@example.com"),
                &format!("Hello from visitor {i}.\nLoved the projects section."),
            )
        })
        .collect()
}

/// Payloads that must fail validation, with the fields expected to fail.
pub fn generate_invalid_payloads() -> Vec<(ContactPayload, Vec<&'static str>)> {
    let raw = |value: serde_json::Value| -> ContactPayload {
        serde_json::from_value(value).unwrap()
    };

    vec![
        (ContactPayload::new("  ", "a@b.com", "hi"), vec!["name"]),
        (ContactPayload::new("Ann", "not-an-email", "hi"), vec!["email"]),
        (ContactPayload::new("Ann", "ann@example.com", " \n\t "), vec!["message"]),
        (ContactPayload::new("", "", ""), vec!["name", "email", "message"]),
        (raw(json!({})), vec!["name", "email", "message"]),
        (
            raw(json!({ "name": "Ann", "email": 7, "message": "hi" })),
            vec!["email"],
        ),
        (
            raw(json!({ "name": ["Ann"], "email": "ann@example.com", "message": true })),
            vec!["name", "message"],
        ),
    ]
}

/// Malformed email addresses that the validator must reject.
pub fn generate_malformed_emails() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "not-an-email",
        "@example.com",
        "ann@",
        "ann@@example.com",
        "ann@example",
        "ann@.com",
        "ann example@example.com",
        "<ann@example.com>",
        "ann@exa mple.com",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clients() {
        let clients = generate_clients(256);
        assert_eq!(clients.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = clients.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_generate_valid_payloads() {
        let payloads = generate_valid_payloads(3);
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[1].name.as_ref().and_then(|v| v.as_str()), Some("Visitor 1"));
    }
}
