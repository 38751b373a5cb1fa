//! Command/response engine
//!
//! Turns the raw [`SerialChannel`] into a half-duplex request/response
//! primitive: send one command line, wait a bounded time for one
//! terminated, non-blank response line.
//!
//! # Algorithm
//!
//! 1. Discard whatever is already buffered (a late answer to an earlier
//!    command must not be mistaken for this one)
//! 2. Write the command followed by `\r\n`
//! 3. Accumulate bytes; each time the buffer ends in `\r\n`, trim it.
//!    Non-blank means done, blank means keep waiting
//! 4. Sleep [`POLL_INTERVAL_MS`] whenever no byte is available
//! 5. Give up once the deadline measured from step 2 has passed
//!
//! Nothing is retried or resent here. Callers decide.

use hal_abstractions::{Clock, DelayNs, SerialChannel};
use heapless::{String, Vec};

use super::config::{POLL_INTERVAL_MS, RESPONSE_CAPACITY};
use super::error::LinkError;

/// Line terminator, both directions
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Trimmed response line
pub type Response = String<RESPONSE_CAPACITY>;

/// Exclusive owner of the serial channel
///
/// Every method takes `&mut self`: a second command cannot be written while
/// a response is pending.
pub struct CommandEngine<C, K, D> {
    channel: C,
    clock: K,
    delay: D,
}

impl<C, K, D> CommandEngine<C, K, D>
where
    C: SerialChannel,
    K: Clock,
    D: DelayNs,
{
    /// Take ownership of an already-opened channel
    ///
    /// # Arguments
    ///
    /// * `channel` - Serial link to the module, configured and open
    /// * `clock` - Monotonic clock used for deadlines
    /// * `delay` - Sleep primitive used between read attempts
    pub fn new(channel: C, clock: K, delay: D) -> Self {
        Self {
            channel,
            clock,
            delay,
        }
    }

    /// Send `command` and wait up to `timeout_ms` for a response line
    ///
    /// # Returns
    ///
    /// The response with surrounding whitespace trimmed, never empty.
    ///
    /// # Errors
    ///
    /// - `InvalidCommand` if `command` contains `\r` or `\n` (nothing is sent)
    /// - `Timeout` if no non-blank line arrived in time
    /// - `EmptyResponse` if only blank lines arrived in time
    /// - `ResponseOverflow` if the line outgrew [`RESPONSE_CAPACITY`]
    /// - `UnexpectedResponse` if the line is not UTF-8
    /// - `Channel` on serial I/O failure
    pub async fn execute(&mut self, command: &str, timeout_ms: u64) -> Result<Response, LinkError> {
        if command.contains(['\r', '\n']) {
            return Err(LinkError::InvalidCommand);
        }

        self.discard_input()?;

        self.channel
            .write_all(command.as_bytes())
            .await
            .map_err(|_| LinkError::Channel)?;
        self.channel
            .write_all(LINE_TERMINATOR)
            .await
            .map_err(|_| LinkError::Channel)?;

        self.read_line(timeout_ms).await
    }

    /// [`execute`](Self::execute), then require `expected` in the response
    ///
    /// The match is a case-sensitive substring search anywhere in the
    /// trimmed response. A response without it is `UnexpectedResponse`.
    pub async fn execute_expect(
        &mut self,
        command: &str,
        expected: &str,
        timeout_ms: u64,
    ) -> Result<Response, LinkError> {
        let response = self.execute(command, timeout_ms).await?;
        if response.contains(expected) {
            Ok(response)
        } else {
            Err(LinkError::UnexpectedResponse)
        }
    }

    /// Sleep on the engine's delay primitive
    pub(crate) async fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// Borrow the channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        let mut discarded = 0usize;
        while self.channel.bytes_available().map_err(|_| LinkError::Channel)? > 0 {
            if self.channel.read_byte().map_err(|_| LinkError::Channel)?.is_none() {
                break;
            }
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} stale bytes", discarded);
        }
        Ok(())
    }

    async fn read_line(&mut self, timeout_ms: u64) -> Result<Response, LinkError> {
        let start = self.clock.now_ms();
        let mut line: Vec<u8, RESPONSE_CAPACITY> = Vec::new();
        let mut saw_blank_line = false;

        loop {
            if self.clock.now_ms().saturating_sub(start) >= timeout_ms {
                if !line.is_empty() {
                    trace!("Partial response dropped ({} bytes)", line.len());
                }
                return Err(if saw_blank_line {
                    LinkError::EmptyResponse
                } else {
                    LinkError::Timeout
                });
            }

            let Some(byte) = self.channel.read_byte().map_err(|_| LinkError::Channel)? else {
                self.delay.delay_ms(POLL_INTERVAL_MS).await;
                continue;
            };

            line.push(byte).map_err(|_| LinkError::ResponseOverflow)?;
            if !line.ends_with(LINE_TERMINATOR) {
                continue;
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                saw_blank_line = true;
                line.clear();
                continue;
            }

            let text = core::str::from_utf8(trimmed).map_err(|_| LinkError::UnexpectedResponse)?;
            let mut response = Response::new();
            response
                .push_str(text)
                .map_err(|_| LinkError::ResponseOverflow)?;
            return Ok(response);
        }
    }
}
