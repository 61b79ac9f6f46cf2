//! Per-sender conversation bookkeeping

use crate::infrastructure::entities::{
    Conversation, ConversationState, ConversationUpdate, CountChange, NewConversation,
};
use crate::infrastructure::traits::{BotRepository, StoreError};
use anyhow::anyhow;

/// Records one more message from `phone_number`.
///
/// The first message opens an active conversation. Later ones bump the message count and
/// replace `last_command` only when they carry a non-empty command themselves.
pub async fn touch(
    repo: &dyn BotRepository,
    phone_number: &str,
    command: Option<&str>,
) -> anyhow::Result<Conversation> {
    let command = command.filter(|name| !name.is_empty());

    if repo.get_conversation(phone_number).await.is_none() {
        let created = repo
            .create_conversation(NewConversation {
                phone_number: phone_number.to_owned(),
                display_name: None,
                message_count: 1,
                is_active: true,
                last_command: command.map(str::to_owned),
                conversation_state: ConversationState::Active,
            })
            .await;

        match created {
            Ok(conversation) => return Ok(conversation),
            // another message from the same sender got there first
            Err(StoreError::ConversationExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    repo.update_conversation(
        phone_number,
        ConversationUpdate {
            message_count: Some(CountChange::Increment(1)),
            last_command: command.map(str::to_owned),
            ..ConversationUpdate::default()
        },
    )
    .await
    .ok_or_else(|| anyhow!("conversation for `{phone_number}` vanished during update"))
}
