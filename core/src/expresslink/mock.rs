//! Scripted ExpressLink module and fake time for host tests

use core::cell::Cell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use hal_abstractions::{Clock, DelayNs, SerialChannel};

use super::engine::LINE_TERMINATOR;

/// Clock that only moves when someone sleeps on it
#[derive(Default)]
pub(crate) struct FakeTime {
    now_us: Cell<u64>,
}

impl FakeTime {
    pub(crate) fn now_ms(&self) -> u64 {
        self.now_us.get() / 1000
    }

    fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

impl Clock for FakeTime {
    fn now_ms(&self) -> u64 {
        FakeTime::now_ms(self)
    }
}

impl DelayNs for &FakeTime {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance_us(u64::from(ns) / 1000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance_us(u64::from(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance_us(u64::from(ms) * 1000);
    }
}

/// Module double answering a fixed script of commands
///
/// Each written line must match the next scripted command exactly; its
/// reply bytes then become readable. An empty reply models a silent
/// module. Any unscripted or mismatched command fails the test.
#[derive(Default)]
pub(crate) struct MockModem {
    script: VecDeque<(String, Vec<u8>)>,
    rx: VecDeque<u8>,
    pending: Vec<u8>,
    sent: Vec<String>,
}

impl MockModem {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer the next occurrence of `command` with `reply`
    pub(crate) fn expect(mut self, command: &str, reply: &str) -> Self {
        self.script
            .push_back((command.into(), reply.as_bytes().to_vec()));
        self
    }

    /// Bytes already waiting before the first command
    pub(crate) fn with_stale(mut self, bytes: &str) -> Self {
        self.rx.extend(bytes.bytes());
        self
    }

    /// Every command line written so far, terminators stripped
    pub(crate) fn sent(&self) -> &[String] {
        &self.sent
    }

    /// How many times `command` was written
    pub(crate) fn count(&self, command: &str) -> usize {
        self.sent.iter().filter(|c| c.as_str() == command).count()
    }

    /// Scripted commands not yet written
    pub(crate) fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SerialChannel for MockModem {
    type Error = Infallible;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        Ok(self.rx.pop_front())
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.pending.extend_from_slice(bytes);

        while let Some(end) = self
            .pending
            .windows(LINE_TERMINATOR.len())
            .position(|w| w == LINE_TERMINATOR)
        {
            let line: Vec<u8> = self.pending.drain(..end + LINE_TERMINATOR.len()).collect();
            let command = String::from_utf8(line[..end].to_vec()).expect("command is ASCII");

            let (expected, reply) = self
                .script
                .pop_front()
                .unwrap_or_else(|| panic!("unscripted command: {command:?}"));
            assert_eq!(command, expected, "unexpected command");

            self.rx.extend(reply);
            self.sent.push(command);
        }
        Ok(())
    }
}
