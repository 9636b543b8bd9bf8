//! Event classification: filters a transport event against the target selector and resolves
//! every identity the rest of the pipeline needs.

use std::sync::Arc;

use relay_core::{
    CanonicalId, ClassifiedMessage, DeviceIdentity, InboundEvent, MessageDirection,
    ParticipantAddress,
};
use tracing::debug;

use crate::resolver::IdentityResolver;
use crate::selector::TargetSelector;

/// Label for self-authored messages when the local profile has no push name.
pub const SELF_LABEL: &str = "Me";

/// Why an event was not relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Payload carries no text (media, reactions, empty body).
    NoText,
    /// Conversation partner is not the monitored target.
    NotTarget(CanonicalId),
}

#[derive(Debug, Clone)]
pub enum Classification {
    Relay(ClassifiedMessage),
    Skip(SkipReason),
}

pub struct EventClassifier {
    resolver: Arc<IdentityResolver>,
    selector: TargetSelector,
    device: DeviceIdentity,
}

impl EventClassifier {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        selector: TargetSelector,
        device: DeviceIdentity,
    ) -> Self {
        Self {
            resolver,
            selector,
            device,
        }
    }

    /// Classifies one event. Only side effect: identity store reads.
    pub async fn classify(&self, event: &InboundEvent) -> Classification {
        let text = match event.payload.text() {
            Some(text) => text.to_string(),
            None => {
                debug!(event_id = %event.id, "Skipping event without text");
                return Classification::Skip(SkipReason::NoText);
            }
        };

        let direction = if event.is_from_self {
            MessageDirection::Outgoing
        } else {
            MessageDirection::Incoming
        };

        let self_phone = self.resolver.resolve(&self.device.address).await;
        let (sender_phone, receiver_phone) = match direction {
            MessageDirection::Outgoing => (self_phone, self.resolver.resolve(&event.chat).await),
            MessageDirection::Incoming => (self.resolver.resolve(&event.sender).await, self_phone),
        };
        let partner = match direction {
            MessageDirection::Outgoing => receiver_phone.clone(),
            MessageDirection::Incoming => sender_phone.clone(),
        };

        if !self.selector.matches(&partner).await {
            debug!(event_id = %event.id, partner = %partner, "Skipping event outside target");
            return Classification::Skip(SkipReason::NotTarget(partner));
        }

        let display_name = self
            .display_name(&event.sender, event.push_name.as_deref(), &sender_phone)
            .await;
        let (author, partner_name) = match direction {
            MessageDirection::Outgoing => {
                let author = self
                    .device
                    .push_name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| SELF_LABEL.to_string());
                let partner_name = self
                    .resolver
                    .contact_name(&event.chat)
                    .await
                    .unwrap_or_else(|| partner.to_string());
                (author, partner_name)
            }
            MessageDirection::Incoming => (display_name.clone(), display_name.clone()),
        };

        Classification::Relay(ClassifiedMessage {
            id: event.id.clone(),
            sender_address: event.sender.clone(),
            sender_phone,
            receiver_phone,
            partner,
            partner_name,
            display_name,
            author,
            text,
            direction,
            received_at: event.received_at,
        })
    }

    /// Contact full name, then the advertised push name, then the resolved phone.
    async fn display_name(
        &self,
        sender: &ParticipantAddress,
        push_name: Option<&str>,
        sender_phone: &CanonicalId,
    ) -> String {
        if let Some(name) = self.resolver.contact_name(sender).await {
            return name;
        }
        push_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| sender_phone.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use relay_core::MessagePayload;
    use std::time::Duration;
    use storage::InMemoryIdentityStore;

    const SELF_PHONE: &str = "919811111111";

    fn event(
        sender: ParticipantAddress,
        chat: ParticipantAddress,
        from_self: bool,
        text: &str,
    ) -> InboundEvent {
        InboundEvent {
            id: "evt-1".to_string(),
            sender,
            chat,
            is_from_self: from_self,
            push_name: Some("pushy".to_string()),
            received_at: Utc::now(),
            payload: MessagePayload::Conversation(text.to_string()),
        }
    }

    async fn classifier(
        store: InMemoryIdentityStore,
        push_name: Option<&str>,
    ) -> (EventClassifier, TargetSelector) {
        let resolver = Arc::new(IdentityResolver::new(
            Arc::new(store),
            Duration::from_millis(100),
        ));
        let selector = TargetSelector::new();
        let device = DeviceIdentity {
            address: ParticipantAddress::direct(SELF_PHONE),
            push_name: push_name.map(str::to_string),
        };
        (
            EventClassifier::new(resolver, selector.clone(), device),
            selector,
        )
    }

    fn relayed(c: Classification) -> ClassifiedMessage {
        match c {
            Classification::Relay(m) => m,
            Classification::Skip(reason) => panic!("expected relay, got skip: {:?}", reason),
        }
    }

    #[tokio::test]
    async fn test_incoming_message_partner_is_sender() {
        let store = InMemoryIdentityStore::new();
        store
            .insert_contact(&ParticipantAddress::direct("919800000001"), "Asha Rao")
            .await;
        let (classifier, _) = classifier(store, None).await;
        let customer = ParticipantAddress::direct("919800000001");

        let msg = relayed(
            classifier
                .classify(&event(customer.clone(), customer, false, "2 pizzas"))
                .await,
        );

        assert_eq!(msg.partner, CanonicalId::from("919800000001"));
        assert_eq!(msg.sender_phone, CanonicalId::from("919800000001"));
        assert_eq!(msg.receiver_phone, CanonicalId::from(SELF_PHONE));
        assert_eq!(msg.display_name, "Asha Rao");
        assert_eq!(msg.author, "Asha Rao");
        assert_eq!(msg.partner_name, "Asha Rao");
        assert_eq!(msg.direction, MessageDirection::Incoming);
        assert_eq!(msg.text, "2 pizzas");
    }

    #[tokio::test]
    async fn test_outgoing_message_partner_is_chat() {
        let store = InMemoryIdentityStore::new();
        store
            .insert_contact(&ParticipantAddress::direct("919800000001"), "Asha Rao")
            .await;
        let (classifier, _) = classifier(store, None).await;

        let msg = relayed(
            classifier
                .classify(&event(
                    ParticipantAddress::direct(SELF_PHONE),
                    ParticipantAddress::direct("919800000001"),
                    true,
                    "Your order has been placed!",
                ))
                .await,
        );

        assert_eq!(msg.partner, CanonicalId::from("919800000001"));
        assert_eq!(msg.sender_phone, CanonicalId::from(SELF_PHONE));
        assert_eq!(msg.author, SELF_LABEL);
        assert_eq!(msg.partner_name, "Asha Rao");
        assert!(msg.is_from_self());
    }

    #[tokio::test]
    async fn test_self_push_name_overrides_me() {
        let (classifier, _) = classifier(InMemoryIdentityStore::new(), Some("Pizza Point")).await;

        let msg = relayed(
            classifier
                .classify(&event(
                    ParticipantAddress::direct(SELF_PHONE),
                    ParticipantAddress::direct("919800000001"),
                    true,
                    "ok",
                ))
                .await,
        );

        assert_eq!(msg.author, "Pizza Point");
        assert_eq!(msg.partner_name, "919800000001");
    }

    #[tokio::test]
    async fn test_display_name_falls_back_to_push_name_then_phone() {
        let (classifier, _) = classifier(InMemoryIdentityStore::new(), None).await;
        let customer = ParticipantAddress::direct("919800000001");

        let msg = relayed(
            classifier
                .classify(&event(customer.clone(), customer.clone(), false, "hi"))
                .await,
        );
        assert_eq!(msg.display_name, "pushy");

        let mut no_push = event(customer.clone(), customer, false, "hi");
        no_push.push_name = None;
        let msg = relayed(classifier.classify(&no_push).await);
        assert_eq!(msg.display_name, "919800000001");
    }

    #[tokio::test]
    async fn test_aliased_sender_resolves_to_phone_partner() {
        let store = InMemoryIdentityStore::new();
        store.insert_alias("20000000000001", "919800000001").await;
        let (classifier, selector) = classifier(store, None).await;
        selector.set_specific("919800000001").await.unwrap();
        let alias = ParticipantAddress::aliased("20000000000001");

        let msg = relayed(
            classifier
                .classify(&event(alias.clone(), alias, false, "hello"))
                .await,
        );

        assert_eq!(msg.partner, CanonicalId::from("919800000001"));
    }

    #[tokio::test]
    async fn test_non_text_payload_is_skipped() {
        let (classifier, _) = classifier(InMemoryIdentityStore::new(), None).await;
        let customer = ParticipantAddress::direct("919800000001");
        let mut evt = event(customer.clone(), customer, false, "");
        evt.payload = MessagePayload::Unsupported {
            kind: "image".to_string(),
        };

        assert!(matches!(
            classifier.classify(&evt).await,
            Classification::Skip(SkipReason::NoText)
        ));
    }

    #[tokio::test]
    async fn test_specific_target_skips_other_partners() {
        let (classifier, selector) = classifier(InMemoryIdentityStore::new(), None).await;
        selector.set_specific("919800000001").await.unwrap();
        let other = ParticipantAddress::direct("919800000002");

        let result = classifier
            .classify(&event(other.clone(), other, false, "hello"))
            .await;

        assert!(matches!(
            result,
            Classification::Skip(SkipReason::NotTarget(ref p)) if p.as_str() == "919800000002"
        ));
    }

    #[tokio::test]
    async fn test_specific_target_keeps_self_messages_to_partner() {
        let (classifier, selector) = classifier(InMemoryIdentityStore::new(), None).await;
        selector.set_specific("919800000001").await.unwrap();

        let to_partner = classifier
            .classify(&event(
                ParticipantAddress::direct(SELF_PHONE),
                ParticipantAddress::direct("919800000001"),
                true,
                "sure",
            ))
            .await;
        let to_other = classifier
            .classify(&event(
                ParticipantAddress::direct(SELF_PHONE),
                ParticipantAddress::direct("919800000002"),
                true,
                "sure",
            ))
            .await;

        assert!(matches!(to_partner, Classification::Relay(_)));
        assert!(matches!(to_other, Classification::Skip(SkipReason::NotTarget(_))));
    }
}
