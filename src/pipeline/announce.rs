//! Announcement building
//!
//! Turns one decoded message into a speech utterance: resolve the sender's
//! spoken identity, render the announcement template. Utterances always
//! append; an announcement never interrupts one already speaking.

use std::sync::Arc;

use super::decode::DecodedMessage;
use crate::config::AnnounceConfig;
use crate::directory::ContactResolver;
use crate::speech::SpeechUtterance;

/// Builds speech utterances for decoded messages
pub struct AnnouncementBuilder {
    directory: Arc<dyn ContactResolver>,
    config: AnnounceConfig,
}

impl AnnouncementBuilder {
    /// Create a builder over a contact directory
    #[must_use]
    pub fn new(directory: Arc<dyn ContactResolver>, config: AnnounceConfig) -> Self {
        Self { directory, config }
    }

    /// Build the utterance for one message
    pub async fn build(&self, message: &DecodedMessage) -> SpeechUtterance {
        let identity = self.resolve_identity(message.sender.as_deref()).await;
        let text = self
            .config
            .template
            .replace("{sender}", &identity)
            .replace("{body}", &message.body);
        SpeechUtterance::append(text)
    }

    /// Resolve the spoken identity for a sender address
    ///
    /// No address → the configured unknown-sender label. Directory hit → the
    /// display name. Miss, or a lookup failure (logged) → the fallback form
    /// of the raw address.
    async fn resolve_identity(&self, sender: Option<&str>) -> String {
        let Some(address) = sender else {
            return self.config.unknown_sender.clone();
        };

        match self.directory.lookup(address).await {
            Ok(Some(name)) => name,
            Ok(None) => fallback_identity(address),
            Err(e) => {
                tracing::warn!(error = %e, "contact lookup failed, using raw address");
                fallback_identity(address)
            }
        }
    }
}

/// Fallback spoken identity for an unresolved address
///
/// Drops exactly the first character, historically the "+" of an E.164
/// number. The character is dropped whatever it is, and an address of
/// length 1 or less yields an empty identity; both quirks are long-standing
/// behavior, kept as-is.
fn fallback_identity(address: &str) -> String {
    let mut chars = address.chars();
    chars.next();
    chars.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::ContactEntry;
    use crate::directory::StaticDirectory;
    use crate::speech::SpeechPriority;
    use crate::{Error, Result};

    struct FailingDirectory;

    #[async_trait]
    impl ContactResolver for FailingDirectory {
        async fn lookup(&self, _address: &str) -> Result<Option<String>> {
            Err(Error::Directory("backend offline".to_string()))
        }
    }

    fn builder_with(contacts: &[(&str, &str)]) -> AnnouncementBuilder {
        let entries: Vec<ContactEntry> = contacts
            .iter()
            .map(|(name, number)| ContactEntry {
                name: (*name).to_string(),
                number: (*number).to_string(),
            })
            .collect();
        AnnouncementBuilder::new(
            Arc::new(StaticDirectory::new(&entries)),
            AnnounceConfig::default(),
        )
    }

    fn message(sender: Option<&str>, body: &str) -> DecodedMessage {
        DecodedMessage {
            sender: sender.map(ToString::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn fallback_strips_exactly_one_leading_character() {
        assert_eq!(fallback_identity("+15551234567"), "15551234567");
        // The first character is dropped whatever it is
        assert_eq!(fallback_identity("15551234567"), "5551234567");
    }

    #[test]
    fn fallback_on_short_address_is_empty() {
        assert_eq!(fallback_identity("+"), "");
        assert_eq!(fallback_identity(""), "");
    }

    #[tokio::test]
    async fn known_sender_uses_display_name() {
        let builder = builder_with(&[("Alice", "+15551234567")]);
        let utterance = builder
            .build(&message(Some("+15551234567"), "lunch?"))
            .await;

        assert_eq!(utterance.text, "New message from Alice. lunch?");
        assert_eq!(utterance.priority, SpeechPriority::Append);
    }

    #[tokio::test]
    async fn unknown_sender_falls_back_to_stripped_address() {
        let builder = builder_with(&[]);
        let utterance = builder
            .build(&message(Some("+15551234567"), "who dis"))
            .await;

        assert_eq!(utterance.text, "New message from 15551234567. who dis");
    }

    #[tokio::test]
    async fn missing_sender_uses_unknown_label() {
        let builder = builder_with(&[]);
        let utterance = builder.build(&message(None, "hello")).await;

        assert_eq!(utterance.text, "New message from an unknown sender. hello");
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_stripped_address() {
        let builder = AnnouncementBuilder::new(
            Arc::new(FailingDirectory),
            AnnounceConfig::default(),
        );
        let utterance = builder
            .build(&message(Some("+15551234567"), "still spoken"))
            .await;

        assert_eq!(utterance.text, "New message from 15551234567. still spoken");
    }
}
