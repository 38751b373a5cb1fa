//! Publish / subscribe over ExpressLink
//!
//! Topics and payloads travel inside single AT command lines, so payloads
//! must not contain line terminators and topics must not contain spaces.

use hal_abstractions::{Clock, DelayNs, SerialChannel};
use heapless::String;

use super::command;
use super::config::RESPONSE_CAPACITY;
use super::error::LinkError;
use super::ExpressLink;

/// A message fetched with [`ExpressLink::receive`]
pub type Message = String<RESPONSE_CAPACITY>;

impl<C, K, D> ExpressLink<C, K, D>
where
    C: SerialChannel,
    K: Clock,
    D: DelayNs,
{
    /// Publish `payload` on `topic`
    ///
    /// Connects first if needed. Double quotes in the payload are escaped
    /// with a backslash; backslashes themselves are not escaped.
    ///
    /// # Errors
    ///
    /// - `InvalidTopic` / `CommandTooLong` / `InvalidCommand` for payloads
    ///   that cannot be expressed as one command line (nothing is sent,
    ///   not even a connect)
    /// - connect errors, unchanged
    /// - the send error; the session is then assumed dropped and the
    ///   state falls back to `Initialized`, so the next call reconnects
    pub async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError> {
        let send = command::send(topic, payload)?;
        if !self.is_connected() {
            self.connect().await?;
        }

        match self
            .run_expect(&send, command::OK, self.config.publish_timeout_ms)
            .await
        {
            Ok(_) => {
                info!("Message published to: {}", topic);
                Ok(())
            }
            Err(LinkError::InvalidCommand) => Err(LinkError::InvalidCommand),
            Err(e) => {
                error!("Failed to publish message: {}", e);
                self.session.drop_connection();
                Err(e)
            }
        }
    }

    /// Subscribe to `topic`
    ///
    /// Connects first if needed. A failed subscribe does not change the
    /// session state.
    pub async fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        let subscribe = command::subscribe(topic)?;
        if !self.is_connected() {
            self.connect().await?;
        }

        match self
            .run_expect(&subscribe, command::OK, self.config.subscribe_timeout_ms)
            .await
        {
            Ok(_) => {
                info!("Subscribed to: {}", topic);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to subscribe to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    /// Poll once for a received message
    ///
    /// Returns `None` without touching the channel when not connected.
    /// Otherwise issues one `AT+GET`; the text after the first space of
    /// the response is the message. A failed poll and an empty queue both
    /// yield `None`.
    pub async fn receive(&mut self) -> Option<Message> {
        if !self.is_connected() {
            return None;
        }

        let response = match self.run(command::GET, self.config.receive_timeout_ms).await {
            Ok(response) => response,
            Err(LinkError::ResponseOverflow) => {
                error!("Received message over {} bytes dropped", RESPONSE_CAPACITY);
                return None;
            }
            Err(_) => return None,
        };
        let body = command::message_body(&response)?;

        let mut message = Message::new();
        // A body is always shorter than the response it came from
        message.push_str(body).ok()?;
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expresslink::mock::{FakeTime, MockModem};
    use crate::expresslink::{LinkConfig, LinkState};
    use embassy_futures::block_on;

    type TestLink<'a> = ExpressLink<MockModem, &'a FakeTime, &'a FakeTime>;

    fn link(modem: MockModem, time: &FakeTime) -> TestLink<'_> {
        ExpressLink::new(modem, time, time, LinkConfig::default())
    }

    fn initialized(connected: bool) -> MockModem {
        let status = if connected {
            "OK 1 CONNECTED\r\n"
        } else {
            "OK 0 DISCONNECTED\r\n"
        };
        MockModem::new()
            .expect("AT", "OK\r\n")
            .expect("AT+CONF? About", "OK ExpressLink\r\n")
            .expect("AT+CONNECT?", status)
    }

    fn ready(modem: MockModem, time: &FakeTime) -> TestLink<'_> {
        let mut link = link(modem, time);
        block_on(link.initialize()).unwrap();
        link
    }

    #[test]
    fn test_publish_escapes_quotes() {
        let time = FakeTime::default();
        let modem = initialized(true).expect(r#"AT+SEND topic/a He said \"hi\""#, "OK\r\n");
        let mut link = ready(modem, &time);

        assert_eq!(block_on(link.publish("topic/a", r#"He said "hi""#)), Ok(()));
        assert!(link
            .channel()
            .sent()
            .last()
            .unwrap()
            .contains(r#"He said \"hi\""#));
    }

    #[test]
    fn test_publish_connects_first() {
        let time = FakeTime::default();
        let modem = initialized(false)
            .expect("AT+CONNECT", "OK\r\n")
            .expect("AT+CONNECT?", "OK 1 CONNECTED\r\n")
            .expect("AT+SEND knowgraph/events {}", "OK\r\n");
        let mut link = ready(modem, &time);

        assert_eq!(block_on(link.publish("knowgraph/events", "{}")), Ok(()));
        assert_eq!(link.state(), LinkState::Connected);
        assert_eq!(link.channel().remaining(), 0);
    }

    #[test]
    fn test_publish_before_initialize_fails_unsent() {
        let time = FakeTime::default();
        let mut link = link(MockModem::new(), &time);

        assert_eq!(
            block_on(link.publish("knowgraph/events", "{}")),
            Err(LinkError::NotReady)
        );
        assert!(link.channel().sent().is_empty());
    }

    #[test]
    fn test_failed_publish_drops_session_and_next_publish_reconnects() {
        let time = FakeTime::default();
        let modem = initialized(true)
            .expect("AT+SEND t first", "ERR11 NOT CONNECTED\r\n")
            .expect("AT+CONNECT", "OK\r\n")
            .expect("AT+CONNECT?", "OK 1 CONNECTED\r\n")
            .expect("AT+SEND t second", "OK\r\n");
        let mut link = ready(modem, &time);

        assert_eq!(
            block_on(link.publish("t", "first")),
            Err(LinkError::UnexpectedResponse)
        );
        assert_eq!(link.state(), LinkState::Initialized);

        assert_eq!(block_on(link.publish("t", "second")), Ok(()));
        assert_eq!(link.channel().count("AT+CONNECT"), 1);
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[test]
    fn test_publish_timeout_drops_session() {
        let time = FakeTime::default();
        let modem = initialized(true).expect("AT+SEND t x", "");
        let mut link = ready(modem, &time);
        let started = time.now_ms();

        assert_eq!(block_on(link.publish("t", "x")), Err(LinkError::Timeout));
        assert!(time.now_ms() - started >= 5000);
        assert!(!link.is_connected());
    }

    #[test]
    fn test_publish_rejects_multiline_payload_without_dropping_session() {
        let time = FakeTime::default();
        let mut link = ready(initialized(true), &time);

        assert_eq!(
            block_on(link.publish("t", "line one\r\nline two")),
            Err(LinkError::InvalidCommand)
        );
        assert!(link.is_connected());
    }

    #[test]
    fn test_subscribe() {
        let time = FakeTime::default();
        let modem = initialized(true)
            .expect("AT+SUBSCRIBE device/cmd", "OK\r\n")
            .expect("AT+SUBSCRIBE device/other", "ERR7 OUT OF RANGE\r\n");
        let mut link = ready(modem, &time);

        assert_eq!(block_on(link.subscribe("device/cmd")), Ok(()));
        assert_eq!(
            block_on(link.subscribe("device/other")),
            Err(LinkError::UnexpectedResponse)
        );
        // Unlike publish, a failed subscribe keeps the session
        assert!(link.is_connected());
    }

    #[test]
    fn test_receive_strips_prefix() {
        let time = FakeTime::default();
        let modem = initialized(true).expect("AT+GET", "MSG hello-world\r\n");
        let mut link = ready(modem, &time);

        let message = block_on(link.receive()).unwrap();
        assert_eq!(message.as_str(), "hello-world");
    }

    #[test]
    fn test_receive_message_longer_than_a_status_line() {
        let time = FakeTime::default();
        let body: std::string::String = core::iter::repeat('x').take(300).collect();
        let reply = std::format!("OK1 device/cmd {body}\r\n");
        let modem = initialized(true).expect("AT+GET", &reply);
        let mut link = ready(modem, &time);

        let message = block_on(link.receive()).unwrap();
        assert_eq!(message.len(), "device/cmd ".len() + 300);
        assert!(message.ends_with(body.as_str()));
    }

    #[test]
    fn test_receive_fits_largest_publishable_payload() {
        let time = FakeTime::default();
        let body: std::string::String = core::iter::repeat('y').take(1800).collect();
        let reply = std::format!("OK1 t {body}\r\n");
        let modem = initialized(true).expect("AT+GET", &reply);
        let mut link = ready(modem, &time);

        assert!(block_on(link.receive()).is_some());
    }

    #[test]
    fn test_bad_topic_fails_before_connecting() {
        let time = FakeTime::default();
        // Initialized, not connected: any AT+CONNECT would be unscripted
        let mut link = ready(initialized(false), &time);
        let sent_before = link.channel().sent().len();
        let started = time.now_ms();

        assert_eq!(
            block_on(link.publish("two words", "{}")),
            Err(LinkError::InvalidTopic)
        );
        assert_eq!(block_on(link.subscribe("")), Err(LinkError::InvalidTopic));
        assert_eq!(link.channel().sent().len(), sent_before);
        assert_eq!(time.now_ms(), started);
        assert_eq!(link.state(), LinkState::Initialized);
    }

    #[test]
    fn test_receive_without_space_is_empty() {
        let time = FakeTime::default();
        let modem = initialized(true).expect("AT+GET", "OK\r\n");
        let mut link = ready(modem, &time);

        assert_eq!(block_on(link.receive()), None);
    }

    #[test]
    fn test_receive_on_failed_poll_is_empty() {
        let time = FakeTime::default();
        let modem = initialized(true).expect("AT+GET", "");
        let mut link = ready(modem, &time);

        assert_eq!(block_on(link.receive()), None);
        assert!(link.is_connected());
    }

    #[test]
    fn test_receive_when_not_connected_sends_nothing() {
        let time = FakeTime::default();
        let mut link = ready(initialized(false), &time);
        let sent_before = link.channel().sent().len();

        assert_eq!(block_on(link.receive()), None);
        assert_eq!(link.channel().sent().len(), sent_before);
    }
}
