use serde::Deserialize;

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

impl Message {
    /// A message is a command when it starts with a bot_command entity
    pub fn is_command(&self) -> bool {
        self.entities
            .iter()
            .any(|entity| entity.kind == "bot_command" && entity.offset == 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Transport-independent view of an operator message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: Option<i64>,
    pub sender_name: Option<String>,
    pub chat_id: i64,
    pub text: String,
    pub is_command: bool,
}

impl InboundMessage {
    /// Updates without a message (edits, callbacks, ...) are skipped
    pub fn from_update(update: Update) -> Option<Self> {
        let message = update.message?;
        let is_command = message.is_command();

        Some(Self {
            sender: message.from.as_ref().map(|user| user.id),
            sender_name: message.from.and_then(|user| user.username),
            chat_id: message.chat.id,
            text: message.text.unwrap_or_default(),
            is_command,
        })
    }
}
