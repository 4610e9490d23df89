// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff notification text.

use parley_core::Visitor;

/// Subject and body of the "new visitor message" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffNotification {
    pub subject: String,
    pub body: String,
}

pub fn staff_notification(
    site_name: &str,
    admin_url: &str,
    conversation_id: i64,
    visitor: &Visitor,
    message: &str,
) -> StaffNotification {
    let name = visitor
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Visitor");
    let email = visitor
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or("not provided");
    let separator = if admin_url.contains('?') { '&' } else { '?' };

    StaffNotification {
        subject: format!("[{site_name}] New message from a visitor"),
        body: format!(
            "You have a new message that needs attention:\n\n\
             Visitor: {name}\n\
             Email: {email}\n\
             Message: {message}\n\n\
             View conversation: {admin_url}{separator}conversation_id={conversation_id}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visitor(name: Option<&str>, email: Option<&str>) -> Visitor {
        Visitor {
            id: 1,
            token: "v_1700000000_abc123xyz".into(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            phone: None,
            ip: None,
            user_agent: None,
            page_url: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            last_seen_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn anonymous_visitor_uses_placeholders() {
        let n = staff_notification(
            "Example Shop",
            "https://shop.example.com/admin",
            42,
            &visitor(None, Some("  ")),
            "Where is my order?",
        );
        assert_eq!(n.subject, "[Example Shop] New message from a visitor");
        assert!(n.body.contains("Visitor: Visitor\n"));
        assert!(n.body.contains("Email: not provided\n"));
        assert!(n.body.contains("Message: Where is my order?"));
        assert!(
            n.body
                .ends_with("https://shop.example.com/admin?conversation_id=42")
        );
    }

    #[test]
    fn link_appends_to_existing_query() {
        let n = staff_notification(
            "Shop",
            "https://x.test/wp-admin/admin.php?page=chat",
            7,
            &visitor(Some("Lan"), Some("lan@example.com")),
            "hi",
        );
        assert!(n.body.contains("Visitor: Lan\n"));
        assert!(n.body.contains("Email: lan@example.com\n"));
        assert!(n.body.ends_with("admin.php?page=chat&conversation_id=7"));
    }
}
