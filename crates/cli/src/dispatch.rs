//! Routes inbound events to handlers and applies the top-level error
//! policy: validation failures become their specific user-facing text,
//! infrastructure failures are logged in full and answered with a generic
//! apology.

use std::sync::Arc;

use moodtrack_core::config::Configuration;
use moodtrack_service::{
    ConversationService, Dispatcher, GraphingService, RegistrationOutcome, ServiceError,
    Transport, UserService,
};
use moodtrack_telegram::InboundEvent;

const GENERIC_ERROR_TEXT: &str =
    "Something went wrong while processing your message. Please try again later.";
const OFFSET_USAGE_TEXT: &str = "Please provide an offset in days like this: /offset 1";
const UNKNOWN_COMMAND_TEXT: &str =
    "I don't know that command. Try /record, /graph, /baseline, /auto_baseline or /offset.";
const ALREADY_REGISTERED_TEXT: &str =
    "You are already registered! Type /record to create a record or /graph to see your data.";
const AUTO_BASELINE_DISABLED_TEXT: &str = "Auto-baseline disabled.";

pub struct Handlers {
    pub users: Arc<UserService>,
    pub conversation: Arc<ConversationService>,
    pub graphing: Arc<GraphingService>,
    pub dispatcher: Dispatcher,
    pub transport: Arc<dyn Transport>,
    pub config: Arc<Configuration>,
}

pub async fn handle_event(handlers: &Handlers, event: InboundEvent) {
    let user_id = match &event {
        InboundEvent::Command { user_id, .. } | InboundEvent::ButtonPress { user_id, .. } => {
            *user_id
        },
    };

    if let Err(error) = route(handlers, event).await {
        match error.user_message() {
            Some(text) => {
                tracing::warn!(user_id, %error, "rejected user input");
                deliver(handlers, user_id, &text).await;
            },
            None => {
                tracing::error!(user_id, %error, "handler failed");
                deliver(handlers, user_id, GENERIC_ERROR_TEXT).await;
            },
        }
    }
}

/// Best-effort send from the error path; a failure here is only logged,
/// there is nobody left to tell.
async fn deliver(handlers: &Handlers, user_id: i64, text: &str) {
    if let Err(error) = handlers.transport.send_text(user_id, text).await {
        tracing::error!(user_id, %error, "could not deliver error message");
    }
}

async fn route(h: &Handlers, event: InboundEvent) -> Result<(), ServiceError> {
    match event {
        InboundEvent::ButtonPress { user_id, payload } => {
            h.dispatcher.handle_button(user_id, &payload).await
        },
        InboundEvent::Command { user_id, command, args } => match command.as_str() {
            "start" => start(h, user_id).await,
            "record" => h.conversation.start_recording(user_id).await,
            "graph" => h.graphing.start_graphing(user_id).await,
            "baseline" => h.conversation.record_baseline(user_id).await,
            "auto_baseline" => toggle_auto_baseline(h, user_id).await,
            "offset" => offset(h, user_id, &args).await,
            _ => {
                h.transport.send_text(user_id, UNKNOWN_COMMAND_TEXT).await?;
                Ok(())
            },
        },
    }
}

async fn start(h: &Handlers, user_id: i64) -> Result<(), ServiceError> {
    match h.users.create_user(user_id).await? {
        RegistrationOutcome::Created(_) => {
            h.transport.send_text(user_id, &introduction_text(&h.config)).await?;
        },
        RegistrationOutcome::AlreadyRegistered => {
            h.transport.send_text(user_id, ALREADY_REGISTERED_TEXT).await?;
        },
    }
    Ok(())
}

async fn toggle_auto_baseline(h: &Handlers, user_id: i64) -> Result<(), ServiceError> {
    if h.users.toggle_auto_baseline(user_id).await? {
        let time = h
            .users
            .find_user(user_id)
            .await?
            .and_then(|u| u.auto_baseline_time())
            .map_or_else(String::new, |t| t.format("%H:%M:%S").to_string());
        h.transport
            .send_text(
                user_id,
                &format!(
                    "Auto-baseline enabled; baseline records will be created daily at {time} UTC."
                ),
            )
            .await?;
    } else {
        h.transport.send_text(user_id, AUTO_BASELINE_DISABLED_TEXT).await?;
    }
    Ok(())
}

/// `/offset` expects exactly one integer-day argument; anything else is a
/// usage error, not a failure.
async fn offset(h: &Handlers, user_id: i64, args: &[String]) -> Result<(), ServiceError> {
    let days = match args {
        [days] => days.parse::<i64>().ok(),
        _ => None,
    };
    match days {
        Some(days) => h.conversation.offset_timestamp(user_id, days).await,
        None => {
            h.transport.send_text(user_id, OFFSET_USAGE_TEXT).await?;
            Ok(())
        },
    }
}

fn introduction_text(config: &Configuration) -> String {
    let bullet_points: Vec<String> = config
        .metrics()
        .iter()
        .map(|m| format!("- {}", capitalize(&m.name)))
        .collect();
    format!(
        "Hi! You can track your mood with me. Simply type /record to get started. \
         By default, I will track the following metrics:\n{}",
        bullet_points.join("\n")
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introduction_lists_configured_metrics() {
        let config = Configuration::from_yaml(
            r#"
metrics:
  - name: mood
    user_prompt: "?"
    values:
      Good: 1
  - name: sleep
    user_prompt: "?"
    values:
      Short: 0
"#,
        )
        .unwrap();
        let text = introduction_text(&config);
        assert!(text.contains("- Mood"));
        assert!(text.contains("- Sleep"));
    }
}
