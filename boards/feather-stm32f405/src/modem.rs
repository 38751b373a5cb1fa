//! ExpressLink module wiring
//!
//! The module sits on USART3 (Feather pins TX = PB10, RX = PB11). The UART
//! is interrupt-driven and buffered so no byte is lost while the link
//! engine sleeps between polls.

use defmt::{error, info};
use embassy_stm32::peripherals;
use embassy_stm32::usart::{self, BufferedUart, DataBits, StopBits};
use embassy_time::{Delay, Instant};
use hal_abstractions::{Clock, IoChannel, LineConfig, Parity};
use iot_core::{ExpressLink, LinkConfig};
use static_cell::StaticCell;

embassy_stm32::bind_interrupts!(pub struct Irqs {
    USART3 => usart::BufferedInterruptHandler<peripherals::USART3>;
});

type UartPeripheral = embassy_stm32::Peri<'static, peripherals::USART3>;
type PinPB10 = embassy_stm32::Peri<'static, peripherals::PB10>;
type PinPB11 = embassy_stm32::Peri<'static, peripherals::PB11>;

/// UART ring buffer sizes
const TX_BUFFER_SIZE: usize = 256;
const RX_BUFFER_SIZE: usize = 512;

/// Peripherals handed to the node task
pub struct ModemPeripherals {
    pub uart: UartPeripheral,
    pub tx: PinPB10,
    pub rx: PinPB11,
}

/// Link clock backed by the embassy time driver
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// The concrete ExpressLink driver of this board
pub type Modem = ExpressLink<IoChannel<BufferedUart<'static>>, UptimeClock, Delay>;

/// Modem bring-up errors
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum ModemError {
    /// Line settings the USART cannot produce
    UnsupportedLine,
    /// HAL rejected the UART configuration
    UartConfig,
}

/// Translate a link line configuration into USART settings
fn uart_config(line: &LineConfig) -> Result<usart::Config, ModemError> {
    let mut config = usart::Config::default();
    config.baudrate = line.baud_rate;
    config.data_bits = match line.data_bits {
        8 => DataBits::DataBits8,
        9 => DataBits::DataBits9,
        _ => return Err(ModemError::UnsupportedLine),
    };
    config.parity = match line.parity {
        Parity::None => usart::Parity::ParityNone,
        Parity::Even => usart::Parity::ParityEven,
        Parity::Odd => usart::Parity::ParityOdd,
    };
    config.stop_bits = match line.stop_bits {
        1 => StopBits::STOP1,
        2 => StopBits::STOP2,
        _ => return Err(ModemError::UnsupportedLine),
    };
    Ok(config)
}

/// Open USART3 and wrap it in an ExpressLink driver
///
/// Can only be called once: the UART buffers are static.
pub fn open(periph: ModemPeripherals, config: LinkConfig) -> Result<Modem, ModemError> {
    static TX_BUF: StaticCell<[u8; TX_BUFFER_SIZE]> = StaticCell::new();
    static RX_BUF: StaticCell<[u8; RX_BUFFER_SIZE]> = StaticCell::new();

    let uart_config = uart_config(&config.line)?;
    let uart = BufferedUart::new(
        periph.uart,
        periph.rx,
        periph.tx,
        TX_BUF.init([0; TX_BUFFER_SIZE]),
        RX_BUF.init([0; RX_BUFFER_SIZE]),
        Irqs,
        uart_config,
    )
    .map_err(|_| {
        error!("USART3 configuration rejected");
        ModemError::UartConfig
    })?;

    info!(
        "USART3 open for ExpressLink at {} baud",
        config.line.baud_rate
    );
    Ok(ExpressLink::new(IoChannel::new(uart), UptimeClock, Delay, config))
}
