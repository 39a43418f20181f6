//! Message channels and their permission gates.
//!
//! The view layer is the authoritative information boundary; channels
//! are a second gate the moderator consults before recording speech.

use crate::{ChannelId, Phase, PlayerId};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// A named permission predicate over players and phases.
pub trait Channel: std::fmt::Debug + Send + Sync {
    /// Channel identifier.
    fn id(&self) -> ChannelId;

    /// Whether `player` may post during `phase`.
    fn can_send(&self, player: &PlayerId, phase: Phase) -> bool;

    /// Whether `player` may read this channel.
    fn can_read(&self, player: &PlayerId) -> bool;
}

/// Town square. Everyone reads; posting only during discussion.
#[derive(Debug, Clone)]
pub struct PublicChannel {
    members: BTreeSet<PlayerId>,
}

impl PublicChannel {
    /// Creates the channel for the seated players.
    pub fn new(members: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }
}

impl Channel for PublicChannel {
    fn id(&self) -> ChannelId {
        ChannelId::Public
    }

    fn can_send(&self, player: &PlayerId, phase: Phase) -> bool {
        self.members.contains(player) && phase == Phase::DayDiscussion
    }

    fn can_read(&self, player: &PlayerId) -> bool {
        self.members.contains(player)
    }
}

/// Pack channel. Only wolves read; posting only at night.
#[derive(Debug, Clone)]
pub struct WolfChannel {
    members: BTreeSet<PlayerId>,
}

impl WolfChannel {
    /// Creates the channel for the pack.
    pub fn new(wolves: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            members: wolves.into_iter().collect(),
        }
    }
}

impl Channel for WolfChannel {
    fn id(&self) -> ChannelId {
        ChannelId::Wolf
    }

    fn can_send(&self, player: &PlayerId, phase: Phase) -> bool {
        self.members.contains(player) && phase == Phase::Night
    }

    fn can_read(&self, player: &PlayerId) -> bool {
        self.members.contains(player)
    }
}

/// Private channel between two players.
#[derive(Debug, Clone)]
pub struct DirectChannel {
    first: PlayerId,
    second: PlayerId,
    members: BTreeSet<PlayerId>,
}

impl DirectChannel {
    /// Creates a channel open during discussion.
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let members = [first.clone(), second.clone()].into_iter().collect();
        Self { first, second, members }
    }
}

impl Channel for DirectChannel {
    fn id(&self) -> ChannelId {
        ChannelId::Direct(self.first.clone(), self.second.clone())
    }

    fn can_send(&self, player: &PlayerId, phase: Phase) -> bool {
        self.members.contains(player) && phase == Phase::DayDiscussion
    }

    fn can_read(&self, player: &PlayerId) -> bool {
        self.members.contains(player)
    }
}

/// A stored channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Message {
    /// Author.
    sender_id: PlayerId,
    /// Channel posted on.
    channel: ChannelId,
    /// Text.
    content: String,
    /// Day posted.
    day: u32,
    /// Phase posted.
    phase: Phase,
}

/// Which optional channels a game opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ChannelPolicy {
    /// Open the pack channel.
    pub allow_wolf_chat: bool,
    /// Open a direct channel for every pair of players.
    pub allow_dms: bool,
}

/// Routes and stores messages after permission checks.
#[derive(Debug, Default)]
pub struct ChannelManager {
    channels: BTreeMap<ChannelId, Box<dyn Channel>>,
    messages: Vec<Message>,
}

impl ChannelManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a channel.
    pub fn register(&mut self, channel: Box<dyn Channel>) {
        self.channels.insert(channel.id(), channel);
    }

    /// Replaces all channels with the standard set for a game.
    #[instrument(skip(self, players, wolves))]
    pub fn create_channels(&mut self, players: &[PlayerId], wolves: &[PlayerId], policy: ChannelPolicy) {
        self.channels.clear();
        self.register(Box::new(PublicChannel::new(players.iter().cloned())));
        if policy.allow_wolf_chat {
            self.register(Box::new(WolfChannel::new(wolves.iter().cloned())));
        }
        if policy.allow_dms {
            for (i, a) in players.iter().enumerate() {
                for b in &players[i + 1..] {
                    self.register(Box::new(DirectChannel::new(a.clone(), b.clone())));
                }
            }
        }
        debug!(channels = self.channels.len(), "Channels created");
    }

    /// Whether `player` may post on `channel` during `phase`.
    pub fn can_send(&self, channel: &ChannelId, player: &PlayerId, phase: Phase) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|c| c.can_send(player, phase))
    }

    /// Stores a message if its sender may post; returns whether it was accepted.
    pub fn send(&mut self, message: Message) -> bool {
        if !self.can_send(message.channel(), message.sender_id(), *message.phase()) {
            warn!(
                sender = %message.sender_id(),
                channel = %message.channel(),
                phase = %message.phase(),
                "Message rejected"
            );
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Messages `player` may read, in posting order.
    pub fn visible_messages(&self, player: &PlayerId) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| match self.channels.get(m.channel()) {
                Some(channel) => channel.can_read(player),
                None => *m.channel() == ChannelId::Public,
            })
            .collect()
    }
}
