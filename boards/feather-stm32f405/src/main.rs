#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod device_id;
mod modem;
mod rtc;
mod sensors;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [SPI1, SPI2, SPI3])]
mod app {
    use super::*;
    use defmt::{error, info, warn};
    use embassy_stm32::gpio::{Level, Output, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode, LsConfig, LseConfig, LseMode};
    use embassy_stm32::time::Hertz;
    use embassy_time::Delay;

    use iot_core::{LinkConfig, NodeConfig, SensorNode};
    use modem::{ModemPeripherals, UptimeClock};
    use rtc::RtcWallClock;
    use sensors::InternalTemperature;

    type AdcPeripheral = embassy_stm32::Peri<'static, peripherals::ADC1>;
    type RtcPeripheral = embassy_stm32::Peri<'static, peripherals::RTC>;

    struct NodePeripherals {
        modem: ModemPeripherals,
        adc: AdcPeripheral,
        rtc: RtcPeripheral,
    }

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        led: Output<'static>,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("ExpressLink sensor node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE, 32.768 kHz LSE (PC14/PC15)
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        // VCO / DIVQ(7) = 48 MHz (USB clock)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz, USART3
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz, ADC1

        config.rcc.ls = LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz(32_768),
                mode: LseMode::Oscillator(embassy_stm32::rcc::LseDrive::MediumHigh),
            }),
        };

        let p = embassy_stm32::init(config);

        info!("System initialized with HSE (12MHz) and LSE (32.768kHz)");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);
        info!("TIM2 monotonic timer initialized at 1 MHz");

        let led = Output::new(p.PC1, Level::High, Speed::Low);

        let node_periph = NodePeripherals {
            modem: ModemPeripherals {
                uart: p.USART3,
                tx: p.PB10,
                rx: p.PB11,
            },
            adc: p.ADC1,
            rtc: p.RTC,
        };

        heartbeat::spawn().ok();
        node_task::spawn(node_periph).ok();

        (Shared {}, Local { led })
    }

    /// Heartbeat task
    #[task(priority = 1, local = [led])]
    async fn heartbeat(cx: heartbeat::Context) {
        info!("Heartbeat task started");
        loop {
            cx.local.led.set_high();
            Mono::delay(100.millis()).await;
            cx.local.led.set_low();
            Mono::delay(4900.millis()).await;
        }
    }

    /// Sensor node task: wake, report for one active window, sleep
    ///
    /// The link driver owns USART3 and must stay within this task.
    #[task(priority = 1)]
    async fn node_task(_cx: node_task::Context, periph: NodePeripherals) -> ! {
        info!("Node task started");

        let mut link = match modem::open(periph.modem, LinkConfig::default()) {
            Ok(link) => link,
            Err(e) => {
                error!("ExpressLink UART unavailable: {:?}", e);
                // Nothing to report through; keep the heartbeat alive
                loop {
                    Mono::delay(1.hours()).await;
                }
            }
        };

        let config = NodeConfig {
            device: device_id::device_info(),
            ..NodeConfig::default()
        };
        let sleep_secs = u64::from(config.duty_cycle.sleep_secs);
        info!("Node EPC: {}", config.device.epc.as_str());

        let sensors = InternalTemperature::new(periph.adc);
        let wall_clock = RtcWallClock::new(periph.rtc);
        let mut node = SensorNode::new(sensors, wall_clock, config);

        let clock = UptimeClock;
        let mut delay = Delay;

        loop {
            match link.initialize().await {
                Ok(state) => {
                    info!("ExpressLink ready: {}", state);

                    let summary = node.run_active_window(&mut link, &clock, &mut delay).await;
                    if summary.published == 0 {
                        warn!("No events delivered this cycle");
                    }

                    if link.is_connected() {
                        if let Err(e) = link.disconnect().await {
                            warn!("Disconnect failed: {}", e);
                        }
                    }
                }
                Err(e) => warn!("ExpressLink initialization failed, retrying next cycle: {}", e),
            }

            info!("Sleeping for {} s", sleep_secs);
            Mono::delay(sleep_secs.secs()).await;
        }
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
