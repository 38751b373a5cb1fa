//! ExpressLink AT command set
//!
//! Exact, case-sensitive strings understood by the module, plus builders
//! for the commands that embed a topic or payload.

use heapless::String;

use super::config::COMMAND_CAPACITY;
use super::error::LinkError;

/// Liveness probe
pub const AT: &str = "AT";
/// Free-text module identity
pub const CONF_ABOUT: &str = "AT+CONF? About";
/// Connection status query
pub const CONNECT_QUERY: &str = "AT+CONNECT?";
/// Connect-initiate
pub const CONNECT: &str = "AT+CONNECT";
/// Drop the cloud session
pub const DISCONNECT: &str = "AT+DISCONNECT";
/// Poll for one received message
pub const GET: &str = "AT+GET";

const SEND_PREFIX: &str = "AT+SEND ";
const SUBSCRIBE_PREFIX: &str = "AT+SUBSCRIBE ";

/// Success marker in command responses
pub const OK: &str = "OK";
/// Marker in a status response that denotes an active session
pub const CONNECTED_MARKER: &str = "1";

/// Owned command line, terminator excluded
pub type Command = String<COMMAND_CAPACITY>;

/// Does a status response report an active session?
pub fn reports_connected(response: &str) -> bool {
    response.contains(CONNECTED_MARKER)
}

/// Build `AT+SEND <topic> <payload>` with quotes in the payload escaped
///
/// Escaping is a single pass that prefixes every `"` with a backslash.
/// Existing backslashes are left alone.
///
/// # Errors
///
/// - `InvalidTopic` if the topic is empty or contains whitespace
/// - `CommandTooLong` if the escaped command exceeds [`COMMAND_CAPACITY`]
pub fn send(topic: &str, payload: &str) -> Result<Command, LinkError> {
    validate_topic(topic)?;

    let mut command = Command::new();
    push(&mut command, SEND_PREFIX)?;
    push(&mut command, topic)?;
    push(&mut command, " ")?;
    for c in payload.chars() {
        if c == '"' {
            command.push('\\').map_err(|_| LinkError::CommandTooLong)?;
        }
        command.push(c).map_err(|_| LinkError::CommandTooLong)?;
    }
    Ok(command)
}

/// Build `AT+SUBSCRIBE <topic>`
pub fn subscribe(topic: &str) -> Result<Command, LinkError> {
    validate_topic(topic)?;

    let mut command = Command::new();
    push(&mut command, SUBSCRIBE_PREFIX)?;
    push(&mut command, topic)?;
    Ok(command)
}

/// Extract the message from an `AT+GET` response
///
/// The response is `<prefix> <message>`; everything up to and including
/// the first space is discarded. No space, or nothing after it, means no
/// message.
pub fn message_body(response: &str) -> Option<&str> {
    let (_, body) = response.split_once(' ')?;
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn validate_topic(topic: &str) -> Result<(), LinkError> {
    if topic.is_empty() || topic.chars().any(|c| c.is_whitespace()) {
        return Err(LinkError::InvalidTopic);
    }
    Ok(())
}

fn push(command: &mut Command, s: &str) -> Result<(), LinkError> {
    command.push_str(s).map_err(|_| LinkError::CommandTooLong)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_escapes_quotes() {
        let command = send("knowgraph/events", r#"He said "hi""#).unwrap();
        assert_eq!(command.as_str(), r#"AT+SEND knowgraph/events He said \"hi\""#);
    }

    #[test]
    fn test_send_leaves_backslashes_alone() {
        let command = send("t", r#"a\b"c"#).unwrap();
        assert_eq!(command.as_str(), r#"AT+SEND t a\b\"c"#);
    }

    #[test]
    fn test_send_rejects_bad_topics() {
        assert_eq!(send("", "x"), Err(LinkError::InvalidTopic));
        assert_eq!(send("two words", "x"), Err(LinkError::InvalidTopic));
        assert_eq!(subscribe("a\tb"), Err(LinkError::InvalidTopic));
    }

    #[test]
    fn test_send_too_long() {
        // Every quote doubles in size once escaped
        let payload: std::string::String = core::iter::repeat('"').take(COMMAND_CAPACITY / 2).collect();
        assert_eq!(send("t", &payload), Err(LinkError::CommandTooLong));
    }

    #[test]
    fn test_subscribe_command() {
        let command = subscribe("device/cmd").unwrap();
        assert_eq!(command.as_str(), "AT+SUBSCRIBE device/cmd");
    }

    #[test]
    fn test_message_body() {
        assert_eq!(message_body("MSG hello-world"), Some("hello-world"));
        assert_eq!(message_body("OK1 topic/a {\"v\": 1}"), Some("topic/a {\"v\": 1}"));
        assert_eq!(message_body("OK"), None);
        assert_eq!(message_body("OK "), None);
    }

    #[test]
    fn test_reports_connected() {
        assert!(reports_connected("+CONNECT: 1"));
        assert!(!reports_connected("+CONNECT: 0"));
    }
}
