//! Gateway event boundary.
//!
//! Each event is handled in its own tokio task. Errors and panics inside that task
//! end up with the admin and never reach poise's event loop. Messages from one user
//! may therefore be handled in parallel; the cooldown check in
//! [`crate::bot::policy::NotSpammable`] claims the window atomically for that reason.

use crate::{
    bot::{
        BotData,
        chat::{ChatGateway, IncomingMessage, SerenityChat},
        dispatch::CommandContext,
        mines, notify,
        react_roles::{self, ReactionEvent},
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

/// Poise event hook: routes messages and reactions.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    let chat: Arc<dyn ChatGateway> = Arc::new(SerenityChat::new(ctx));
    let bot_id = framework.bot_id;

    match event {
        serenity::FullEvent::Message { new_message } => {
            let message = IncomingMessage::from_serenity(new_message, bot_id);
            if message.from_self || message.author_is_bot {
                return Ok(());
            }
            spawn_guarded(data, &chat, "message", {
                let data = data.clone();
                let chat = Arc::clone(&chat);
                async move { handle_message(data, chat, message).await }
            });
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            let reaction = ReactionEvent::from_serenity(add_reaction, bot_id);
            spawn_guarded(data, &chat, "reaction add", {
                let data = data.clone();
                let chat = Arc::clone(&chat);
                async move {
                    react_roles::on_reaction_add(&data, chat.as_ref(), &reaction)
                        .await
                        .map(drop)
                }
            });
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            let reaction = ReactionEvent::from_serenity(removed_reaction, bot_id);
            spawn_guarded(data, &chat, "reaction removal", {
                let data = data.clone();
                let chat = Arc::clone(&chat);
                async move {
                    react_roles::on_reaction_remove(&data, chat.as_ref(), &reaction)
                        .await
                        .map(drop)
                }
            });
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            debug!("Gateway ready as {}", data_about_bot.user.name);
        }
        _ => {}
    }
    Ok(())
}

/// Runs command dispatch, then mine evaluation, for one message.
pub async fn handle_message(
    data: BotData,
    chat: Arc<dyn ChatGateway>,
    message: IncomingMessage,
) -> Result<()> {
    let ctx = CommandContext {
        data: data.clone(),
        chat: Arc::clone(&chat),
        message,
    };
    let outcome = data.registry.dispatch(&ctx).await;
    debug!("Dispatch outcome: {:?}", outcome);

    let mut rng = StdRng::from_os_rng();
    mines::evaluate_message(&data, &chat, &ctx.message, &mut rng).await?;
    Ok(())
}

/// Spawns `work` and reports its error or panic to the admin.
fn spawn_guarded<F>(data: &BotData, chat: &Arc<dyn ChatGateway>, what: &'static str, work: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let admin_id = data.config.admin_id;
    let chat = Arc::clone(chat);
    tokio::spawn(async move {
        let detail = match tokio::spawn(work).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(join_error) if join_error.is_panic() => {
                error!("Handler for {} panicked", what);
                format!("panic: {join_error}")
            }
            Err(join_error) => join_error.to_string(),
        };
        notify::notify_admin(
            chat.as_ref(),
            admin_id,
            &format!("Handling a {what} failed"),
            &detail,
        )
        .await;
    });
}
