//! Serenity event handler implementation

use lock_types::{IncomingMessage, MessageAuthor};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info};

use crate::health::AppState;
use crate::lock::LockService;
use crate::platform::SerenityPlatform;

pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Discord bot connected as {} ({} guilds)",
            ready.user.tag(),
            ready.guilds.len()
        );

        let data = ctx.data.read().await;
        if let Some(health) = data.get::<AppState>() {
            health
                .set_ready(ready.user.name.clone(), ready.guilds.len())
                .await;
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages
        if msg.author.bot {
            return;
        }

        let (service, health) = {
            let data = ctx.data.read().await;
            match data.get::<LockService>() {
                Some(s) => (s.clone(), data.get::<AppState>().cloned()),
                None => {
                    error!("LockService not found in context data");
                    return;
                }
            }
        };

        let platform = SerenityPlatform::from_context(&ctx);
        let disposition = service.handle_message(&platform, &to_incoming(&msg)).await;

        if let Some(health) = health {
            health.record(disposition);
        }
    }
}

fn to_incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        guild_id: msg.guild_id.map(|g| g.get()),
        author: MessageAuthor {
            id: msg.author.id.get(),
            username: msg.author.name.clone(),
            tag: msg.author.tag(),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        mentions: msg.mentions.iter().map(|u| u.id.get()).collect(),
    }
}
