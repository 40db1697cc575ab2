mod api;
mod charts;
mod config;
mod discord;
mod logging;
mod scheduler;
mod util;

use poise::serenity_prelude as serenity;
use tracing::info;

use crate::discord::DiscordPresence;

#[derive(Debug)]
struct Data {}

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    if std::env::var("RUST_BACKTRACE").is_err() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    // a missing .env is fine, the environment may already be set
    let _ = dotenvy::dotenv();

    let cfg = config::load_config()?;

    logging::init(&cfg.log)?;
    info!("Logging Initialised. Initialising Steam Now application");

    let token = cfg.discord_token.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions::<Data, Error> {
            on_error: |error| {
                Box::pin(async move {
                    tracing::error!("Poise error: {:?}", error);
                    if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {:?}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                info!(user = %ready.user.name, "Logged in");
                let sink = DiscordPresence::new(ctx.clone(), cfg.guild_id, cfg.online_status);
                scheduler::spawn_scheduler(&cfg, sink)?;
                Ok(Data {})
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, serenity::GatewayIntents::GUILDS)
        .framework(framework)
        .await?;

    info!("Setup complete. Starting client listener");

    client.start().await?;
    Ok(())
}
