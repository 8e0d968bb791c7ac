use serde::Serialize;
use serde_json::Value;

use super::{
    channel, entries_in_display_order, read_bool, read_enum, read_list, read_num_string, read_str,
    subtree,
};

/// Slack connection form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackForm {
    pub enabled: bool,
    pub bot_token: String,
    pub app_token: String,
    pub dm_enabled: bool,
    pub allow_from: String,
    pub group_enabled: bool,
    pub group_channels: String,
    pub media_max_mb: String,
    pub text_chunk_limit: String,
    pub reaction_notifications: String,
    pub reaction_allowlist: String,
    pub slash_enabled: bool,
    pub slash_name: String,
    pub slash_session_prefix: String,
    pub slash_ephemeral: bool,
    pub actions: SlackActionForm,
    pub channels: Vec<SlackChannelForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackActionForm {
    pub reactions: bool,
    pub messages: bool,
    pub pins: bool,
    pub member_info: bool,
    pub emoji_list: bool,
}

impl Default for SlackActionForm {
    fn default() -> Self {
        Self {
            reactions: true,
            messages: true,
            pins: true,
            member_info: true,
            emoji_list: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackChannelForm {
    pub key: String,
    pub allow: bool,
    pub require_mention: bool,
}

impl SlackForm {
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        let slack = channel(doc, "slack");
        let dm = subtree(slack, "dm");
        let slash = subtree(slack, "slashCommand");
        Self {
            enabled: read_bool(slack, "enabled", true),
            bot_token: read_str(slack, "botToken"),
            app_token: read_str(slack, "appToken"),
            dm_enabled: read_bool(dm, "enabled", true),
            allow_from: read_list(dm, "allowFrom"),
            group_enabled: read_bool(dm, "groupEnabled", false),
            group_channels: read_list(dm, "groupChannels"),
            media_max_mb: read_num_string(slack, "mediaMaxMb"),
            text_chunk_limit: read_num_string(slack, "textChunkLimit"),
            // "own" is only ever the fallback here, never an accepted value.
            reaction_notifications: read_enum(
                slack,
                "reactionNotifications",
                &["off", "all", "allowlist"],
                "own",
            ),
            reaction_allowlist: read_list(slack, "reactionAllowlist"),
            slash_enabled: read_bool(slash, "enabled", false),
            slash_name: read_str(slash, "name"),
            slash_session_prefix: read_str(slash, "sessionPrefix"),
            slash_ephemeral: read_bool(slash, "ephemeral", true),
            actions: read_actions(subtree(slack, "actions")),
            channels: read_channels(slack),
        }
    }
}

impl Default for SlackForm {
    fn default() -> Self {
        Self::from_document(&Value::Null)
    }
}

fn read_actions(node: &Value) -> SlackActionForm {
    let defaults = SlackActionForm::default();
    SlackActionForm {
        reactions: read_bool(node, "reactions", defaults.reactions),
        messages: read_bool(node, "messages", defaults.messages),
        pins: read_bool(node, "pins", defaults.pins),
        member_info: read_bool(node, "memberInfo", defaults.member_info),
        emoji_list: read_bool(node, "emojiList", defaults.emoji_list),
    }
}

fn read_channels(slack: &Value) -> Vec<SlackChannelForm> {
    let Some(channels) = slack.get("channels").and_then(Value::as_object) else {
        return Vec::new();
    };
    entries_in_display_order(channels)
        .into_iter()
        .map(|(key, value)| SlackChannelForm {
            key: key.clone(),
            allow: read_bool(value, "allow", true),
            require_mention: read_bool(value, "requireMention", false),
        })
        .collect()
}
