use aqibot_core::{LocationQuery, Reading, Severity};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    Ephemeral,
}

/// Message body Slack accepts both as a slash-command response and as a
/// webhook / `response_url` post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub response_type: ResponseType,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "icon_emoji", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Identity fields stamped onto every message the bot sends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessagePresentation {
    pub username: Option<String>,
    pub channel: Option<String>,
}

pub struct MessageBuilder {
    response_type: ResponseType,
    text: String,
    icon: Option<String>,
}

impl MessageBuilder {
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::InChannel, text: text.into(), icon: None }
    }

    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::Ephemeral, text: text.into(), icon: None }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn build(self, presentation: &MessagePresentation) -> OutboundMessage {
        OutboundMessage {
            response_type: self.response_type,
            text: self.text,
            username: presentation.username.clone(),
            icon: self.icon,
            channel: presentation.channel.clone(),
        }
    }
}

pub const HEALTHY_ICON: &str = ":sunny:";
pub const CAUTION_ICON: &str = ":mask:";
pub const SEVERE_ICON: &str = ":skull_and_crossbones:";

pub fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Healthy => HEALTHY_ICON,
        Severity::Caution => CAUTION_ICON,
        Severity::Severe => SEVERE_ICON,
    }
}

pub fn reading_message(
    query: &LocationQuery,
    reading: Reading,
    as_cigarettes: bool,
    presentation: &MessagePresentation,
) -> OutboundMessage {
    let text = if as_cigarettes {
        format!(
            "Breathing the air in {} today is like smoking {:.2} cigarettes.",
            query.city(),
            reading.cigarette_equivalent()
        )
    } else {
        format!("AQI in {}, {}: {}", query.city(), query.state(), reading.aqi)
    };

    MessageBuilder::in_channel(text).icon(severity_icon(reading.severity())).build(presentation)
}

pub fn refusal_message(presentation: &MessagePresentation) -> OutboundMessage {
    MessageBuilder::ephemeral("Sorry, I can't do that. Maybe ask nicely?").build(presentation)
}

pub fn usage_message(presentation: &MessagePresentation) -> OutboundMessage {
    MessageBuilder::ephemeral(
        "Sorry, I couldn't understand that. Try `city \"<city>\" \"<state>\" \"<country>\"`, \
         or one of `sf`, `nyc`, `seattle`, `la`. Add `cigarettes` for a cigarette equivalent.",
    )
    .build(presentation)
}

pub fn failure_message(presentation: &MessagePresentation) -> OutboundMessage {
    MessageBuilder::ephemeral("Sorry, I couldn't fetch the air quality right now.")
        .build(presentation)
}

#[cfg(test)]
mod tests {
    use aqibot_core::{LocationQuery, NamedLocation, Reading};
    use serde_json::json;

    use super::{
        failure_message, reading_message, refusal_message, usage_message, MessagePresentation,
        ResponseType, CAUTION_ICON, HEALTHY_ICON, SEVERE_ICON,
    };

    fn presentation() -> MessagePresentation {
        MessagePresentation { username: Some("aqibot".to_owned()), channel: None }
    }

    #[test]
    fn reading_icons_follow_severity_bands() {
        let query = NamedLocation::Sf.query();
        let icon = |aqi| reading_message(&query, Reading::new(aqi), false, &presentation()).icon;

        assert_eq!(icon(50).as_deref(), Some(HEALTHY_ICON));
        assert_eq!(icon(51).as_deref(), Some(CAUTION_ICON));
        assert_eq!(icon(200).as_deref(), Some(CAUTION_ICON));
        assert_eq!(icon(201).as_deref(), Some(SEVERE_ICON));
    }

    #[test]
    fn reading_text_reports_raw_value() {
        let query = LocationQuery::new("Oakland", "California", "USA").expect("location");
        let message = reading_message(&query, Reading::new(42), false, &presentation());

        assert_eq!(message.text, "AQI in Oakland, California: 42");
        assert_eq!(message.response_type, ResponseType::InChannel);
    }

    #[test]
    fn cigarette_text_replaces_raw_value() {
        let query = NamedLocation::Nyc.query();
        let message = reading_message(&query, Reading::new(120), true, &presentation());

        assert_eq!(
            message.text,
            "Breathing the air in New York City today is like smoking 5.56 cigarettes."
        );
        assert!(!message.text.contains("120"));
    }

    #[test]
    fn serializes_slack_field_names_and_omits_missing_channel() {
        let message =
            reading_message(&NamedLocation::Sf.query(), Reading::new(10), false, &presentation());
        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(
            value,
            json!({
                "response_type": "in_channel",
                "text": "AQI in San Francisco, California: 10",
                "username": "aqibot",
                "icon_emoji": ":sunny:",
            })
        );
    }

    #[test]
    fn webhook_presentation_sets_channel() {
        let presentation = MessagePresentation {
            username: Some("aqibot".to_owned()),
            channel: Some("#air".to_owned()),
        };
        let value = serde_json::to_value(failure_message(&presentation)).expect("serialize");
        assert_eq!(value["channel"], "#air");
        assert_eq!(value["response_type"], "ephemeral");
    }

    #[test]
    fn refusal_and_usage_are_ephemeral() {
        assert_eq!(refusal_message(&presentation()).response_type, ResponseType::Ephemeral);
        assert!(usage_message(&presentation()).text.contains("city"));
    }
}
