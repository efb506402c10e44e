//! WhatsApp channel via the Twilio messaging webhook.
//!
//! Maps the form-encoded webhook payload to a canonical message tuple and
//! wraps outbound text in the TwiML response envelope.

use serde::Deserialize;

/// Prefix Twilio puts on WhatsApp sender addresses.
const WHATSAPP_PREFIX: &str = "whatsapp:+";

/// Inbound Twilio webhook payload. Fields we do not use are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioInbound {
    #[serde(rename = "MessageType")]
    pub message_type: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "ProfileName")]
    pub profile_name: Option<String>,
}

/// Transport-independent inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage {
    /// Stable sender identity: the phone number without channel prefix.
    pub user_id: String,
    pub text: String,
    pub display_name: Option<String>,
}

/// Map an inbound payload to a canonical message.
///
/// `None` for anything that is not a plain text message from an identified
/// sender; the caller replies with the fixed fallback and touches nothing.
pub fn canonicalize(inbound: &TwilioInbound) -> Option<CanonicalMessage> {
    if inbound.message_type.as_deref() != Some("text") {
        return None;
    }
    let from = inbound.from.as_deref()?;
    let user_id = from.strip_prefix(WHATSAPP_PREFIX).unwrap_or(from);

    Some(CanonicalMessage {
        user_id: user_id.to_string(),
        text: inbound.body.clone().unwrap_or_default(),
        display_name: inbound.profile_name.clone(),
    })
}

/// Wrap one outbound text body in the TwiML response envelope.
pub fn twiml_reply(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Response><Message>{}</Message></Response>",
        xml_escape(body)
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
