use serde::Serialize;
use serde_json::Value;

use super::{
    channel, entries_in_display_order, read_bool, read_enum, read_list, read_num_string, read_str,
    subtree,
};

/// Discord connection form, including per-guild overrides and the action
/// toggles exposed to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordForm {
    pub enabled: bool,
    pub token: String,
    pub dm_enabled: bool,
    pub allow_from: String,
    pub group_enabled: bool,
    pub group_channels: String,
    pub media_max_mb: String,
    pub history_limit: String,
    pub text_chunk_limit: String,
    pub reply_to_mode: String,
    pub guilds: Vec<DiscordGuildForm>,
    pub actions: DiscordActionForm,
    pub slash_enabled: bool,
    pub slash_name: String,
    pub slash_session_prefix: String,
    pub slash_ephemeral: bool,
}

/// One entry of the `discord.guilds` mapping, keyed by guild id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordGuildForm {
    pub key: String,
    pub slug: String,
    pub require_mention: bool,
    pub reaction_notifications: String,
    pub users: String,
    pub channels: Vec<DiscordGuildChannelForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordGuildChannelForm {
    pub key: String,
    pub allow: bool,
    pub require_mention: bool,
}

/// Action toggles. Notification-heavy actions default off, the rest on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordActionForm {
    pub reactions: bool,
    pub stickers: bool,
    pub polls: bool,
    pub permissions: bool,
    pub messages: bool,
    pub threads: bool,
    pub pins: bool,
    pub search: bool,
    pub member_info: bool,
    pub role_info: bool,
    pub channel_info: bool,
    pub voice_status: bool,
    pub events: bool,
    pub roles: bool,
    pub moderation: bool,
}

impl Default for DiscordActionForm {
    fn default() -> Self {
        Self {
            reactions: true,
            stickers: true,
            polls: true,
            permissions: true,
            messages: true,
            threads: true,
            pins: true,
            search: true,
            member_info: true,
            role_info: true,
            channel_info: true,
            voice_status: true,
            events: false,
            roles: false,
            moderation: false,
        }
    }
}

impl DiscordForm {
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        let discord = channel(doc, "discord");
        let dm = subtree(discord, "dm");
        let slash = subtree(discord, "slashCommand");
        Self {
            enabled: read_bool(discord, "enabled", true),
            token: read_str(discord, "token"),
            dm_enabled: read_bool(dm, "enabled", true),
            allow_from: read_list(dm, "allowFrom"),
            group_enabled: read_bool(dm, "groupEnabled", false),
            group_channels: read_list(dm, "groupChannels"),
            media_max_mb: read_num_string(discord, "mediaMaxMb"),
            history_limit: read_num_string(discord, "historyLimit"),
            text_chunk_limit: read_num_string(discord, "textChunkLimit"),
            reply_to_mode: read_enum(discord, "replyToMode", &["first", "all"], "off"),
            guilds: read_guilds(discord),
            actions: read_actions(subtree(discord, "actions")),
            slash_enabled: read_bool(slash, "enabled", false),
            slash_name: read_str(slash, "name"),
            slash_session_prefix: read_str(slash, "sessionPrefix"),
            slash_ephemeral: read_bool(slash, "ephemeral", true),
        }
    }
}

impl Default for DiscordForm {
    fn default() -> Self {
        Self::from_document(&Value::Null)
    }
}

fn read_guilds(discord: &Value) -> Vec<DiscordGuildForm> {
    // Guilds are a mapping keyed by guild id. The retired sequence layout
    // carried no per-guild settings, so it projects to no entries.
    let Some(guilds) = discord.get("guilds").and_then(Value::as_object) else {
        return Vec::new();
    };
    entries_in_display_order(guilds)
        .into_iter()
        .map(|(key, entry)| DiscordGuildForm {
            key: key.clone(),
            slug: read_str(entry, "slug"),
            require_mention: read_bool(entry, "requireMention", false),
            reaction_notifications: read_enum(
                entry,
                "reactionNotifications",
                &["off", "all", "own", "allowlist"],
                "own",
            ),
            users: read_list(entry, "users"),
            channels: read_guild_channels(entry),
        })
        .collect()
}

fn read_guild_channels(entry: &Value) -> Vec<DiscordGuildChannelForm> {
    match entry.get("channels") {
        Some(Value::Object(map)) => entries_in_display_order(map)
            .into_iter()
            .map(|(key, value)| guild_channel(key.clone(), value))
            .collect(),
        // Sequence layouts keep their positions as entry keys.
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, value)| guild_channel(i.to_string(), value))
            .collect(),
        _ => Vec::new(),
    }
}

fn guild_channel(key: String, value: &Value) -> DiscordGuildChannelForm {
    DiscordGuildChannelForm {
        key,
        allow: read_bool(value, "allow", true),
        require_mention: read_bool(value, "requireMention", false),
    }
}

fn read_actions(node: &Value) -> DiscordActionForm {
    let defaults = DiscordActionForm::default();
    DiscordActionForm {
        reactions: read_bool(node, "reactions", defaults.reactions),
        stickers: read_bool(node, "stickers", defaults.stickers),
        polls: read_bool(node, "polls", defaults.polls),
        permissions: read_bool(node, "permissions", defaults.permissions),
        messages: read_bool(node, "messages", defaults.messages),
        threads: read_bool(node, "threads", defaults.threads),
        pins: read_bool(node, "pins", defaults.pins),
        search: read_bool(node, "search", defaults.search),
        member_info: read_bool(node, "memberInfo", defaults.member_info),
        role_info: read_bool(node, "roleInfo", defaults.role_info),
        channel_info: read_bool(node, "channelInfo", defaults.channel_info),
        voice_status: read_bool(node, "voiceStatus", defaults.voice_status),
        events: read_bool(node, "events", defaults.events),
        roles: read_bool(node, "roles", defaults.roles),
        moderation: read_bool(node, "moderation", defaults.moderation),
    }
}
