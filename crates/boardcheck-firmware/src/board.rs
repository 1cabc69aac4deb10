//! Pin map and peripheral wiring of the ESP32-S3 test board
//!
//! | GPIO | Function                               |
//! |------|----------------------------------------|
//! | 0    | Push-button, active low, pull-up       |
//! | 1    | LDR (ADC1)                             |
//! | 2    | Trim potentiometer (ADC1)              |
//! | 4    | WS2812B data (SPI3 MOSI)               |
//! | 5-7  | RGB LED red/green/blue (LEDC)          |
//! | 8/9  | OLED SDA/SCL (I2C0, 400 kHz)           |
//! | 10   | SD card CS                             |
//! | 11   | SD card MOSI (SPI2)                    |
//! | 12   | SD card SCK (SPI2)                     |
//! | 13   | SD card MISO (SPI2)                    |
//! | 14   | Passive buzzer (MCPWM0)                |
//! | 15   | DHT22 data, open drain                 |

use core::cell::RefCell;

use boardcheck_core::Board;
use boardcheck_core::PeripheralError;
use boardcheck_core::outputs::{Buzzer, PwmOutput, RgbLed, Ws2812Spi, ws2812};
use boardcheck_core::sensors::{AnalogInput, Dht22};
use boardcheck_core::storage::{FixedTimeSource, SdCardStorage};
use boardcheck_core::ui::{GraphicsDisplay, Panel};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::SdCard;
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcChannel, AdcConfig, AdcPin, Attenuation};
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::ledc::channel::{self, ChannelHW, ChannelIFace};
use esp_hal::ledc::timer::{self, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::mcpwm::operator::{PwmPin, PwmPinConfig};
use esp_hal::mcpwm::timer::{PwmWorkingMode, Timer as McpwmTimer};
use esp_hal::mcpwm::{McPwm, PeripheralClockConfig};
use esp_hal::peripherals::{ADC1, GPIO1, GPIO2, MCPWM0, Peripherals};
use esp_hal::spi::Mode as SpiMode;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use log::{error, info};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};
use static_cell::StaticCell;

/// Pixels on the WS2812B strip
pub const STRIP_LEN: usize = 10;

/// PWM frequency of the shared RGB LED timer
const RGB_PWM_HZ: u32 = 1_000;
const RGB_DUTY_BITS: u32 = 10;

/// MCPWM counter clock for the buzzer
const BUZZER_CLOCK_HZ: u32 = 1_000_000;

const SD_SPI_KHZ: u32 = 400;

type Oled = Ssd1306<
    I2CInterface<I2c<'static, Blocking>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;
type SharedAdc = RefCell<Adc<'static, ADC1<'static>, Blocking>>;
type SdSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, Delay>;

pub type FirmwareBoard = Board<
    GraphicsDisplay<OledPanel>,
    Ws2812Spi<Spi<'static, Blocking>>,
    Dht22<Flex<'static>, Delay>,
    Input<'static>,
    McpwmBuzzer,
    LedcChannel,
    AdcInput<GPIO1<'static>>,
    AdcInput<GPIO2<'static>>,
    SdCardStorage<SdCard<SdSpi, Delay>, FixedTimeSource>,
>;

// ---------------------------------------------------------------------------
// OLED
// ---------------------------------------------------------------------------

/// SSD1306 128x64 in buffered mode.
pub struct OledPanel {
    display: Oled,
}

impl OriginDimensions for OledPanel {
    fn size(&self) -> Size {
        self.display.size()
    }
}

impl DrawTarget for OledPanel {
    type Color = BinaryColor;
    type Error = <Oled as DrawTarget>::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.display.draw_iter(pixels)
    }
}

impl Panel for OledPanel {
    fn init(&mut self) -> Result<(), PeripheralError> {
        self.display.init().map_err(|e| {
            error!("SSD1306 init failed: {:?}", e);
            PeripheralError::InitializationFailed {
                peripheral: "OLED",
                details: "no answer on I2C",
            }
        })
    }

    fn flush(&mut self) -> Result<(), PeripheralError> {
        self.display.flush().map_err(|e| {
            error!("SSD1306 flush failed: {:?}", e);
            PeripheralError::OperationFailed {
                peripheral: "OLED",
                operation: "flush",
                details: "I2C write error",
            }
        })
    }
}

// ---------------------------------------------------------------------------
// RGB LED (LEDC)
// ---------------------------------------------------------------------------

/// One LEDC low-speed channel. All three RGB channels share one timer, so
/// the frequency is fixed at [`RGB_PWM_HZ`].
pub struct LedcChannel {
    channel: channel::Channel<'static, LowSpeed>,
    configured: bool,
}

impl PwmOutput for LedcChannel {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.configured {
            Ok(())
        } else {
            Err(PeripheralError::InitializationFailed {
                peripheral: "RGB LED",
                details: "LEDC channel not configured",
            })
        }
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), PeripheralError> {
        if hz == RGB_PWM_HZ {
            return Ok(());
        }
        error!("RGB LED: {} Hz requested, timer runs at {} Hz", hz, RGB_PWM_HZ);
        Err(PeripheralError::OperationFailed {
            peripheral: "RGB LED",
            operation: "set_frequency",
            details: "frequency fixed by shared timer",
        })
    }

    fn set_duty(&mut self, duty: u16) -> Result<(), PeripheralError> {
        self.channel
            .set_duty_hw(u32::from(duty) >> (16 - RGB_DUTY_BITS));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Buzzer (MCPWM)
// ---------------------------------------------------------------------------

/// Passive buzzer on MCPWM0 operator 0, output A. The timer is restarted
/// with a new period for every frequency change.
pub struct McpwmBuzzer {
    timer: McpwmTimer<0, MCPWM0<'static>>,
    pin: PwmPin<'static, MCPWM0<'static>, 0, true>,
    clock: Option<PeripheralClockConfig>,
    period: u16,
}

impl PwmOutput for McpwmBuzzer {
    fn init(&mut self) -> Result<(), PeripheralError> {
        if self.clock.is_some() {
            Ok(())
        } else {
            Err(PeripheralError::InitializationFailed {
                peripheral: "Buzzer",
                details: "MCPWM clock not available",
            })
        }
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), PeripheralError> {
        let clock = self.clock.ok_or(PeripheralError::OperationFailed {
            peripheral: "Buzzer",
            operation: "set_frequency",
            details: "MCPWM clock not available",
        })?;
        let ticks = (BUZZER_CLOCK_HZ / hz.max(1)).clamp(2, u16::MAX as u32);
        self.period = (ticks - 1) as u16;

        let timer_cfg =
            clock.timer_clock_with_prescaler(self.period, PwmWorkingMode::Increase, 0);
        self.timer.stop();
        self.timer.start(timer_cfg);
        Ok(())
    }

    fn set_duty(&mut self, duty: u16) -> Result<(), PeripheralError> {
        let compare = (u32::from(duty) * (u32::from(self.period) + 1)) >> 16;
        self.pin.set_timestamp(compare as u16);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Analog inputs (ADC1)
// ---------------------------------------------------------------------------

/// One ADC1 channel. Both analog inputs share the converter.
pub struct AdcInput<PIN> {
    adc: &'static SharedAdc,
    pin: AdcPin<PIN, ADC1<'static>>,
    label: &'static str,
}

impl<PIN: AdcChannel> AnalogInput for AdcInput<PIN> {
    fn read_raw(&mut self) -> Result<u16, PeripheralError> {
        let label = self.label;
        let raw: u16 = nb::block!(self.adc.borrow_mut().read_oneshot(&mut self.pin)).map_err(
            |e| {
                error!("{} ADC read failed: {:?}", label, e);
                PeripheralError::OperationFailed {
                    peripheral: label,
                    operation: "read",
                    details: "ADC conversion error",
                }
            },
        )?;
        // 12-bit conversion to full 16-bit scale
        Ok((raw << 4) | (raw >> 8))
    }
}

// ---------------------------------------------------------------------------
// Board assembly
// ---------------------------------------------------------------------------

fn init_rgb_channels(
    ledc: &Ledc<'static>,
    pins: (
        esp_hal::peripherals::GPIO5<'static>,
        esp_hal::peripherals::GPIO6<'static>,
        esp_hal::peripherals::GPIO7<'static>,
    ),
) -> RgbLed<LedcChannel> {
    static RGB_TIMER: StaticCell<timer::Timer<'static, LowSpeed>> = StaticCell::new();

    let mut lstimer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    let timer_ok = lstimer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty10Bit,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_hz(RGB_PWM_HZ),
        })
        .map_err(|e| error!("LEDC timer config failed: {:?}", e))
        .is_ok();
    let lstimer: &'static timer::Timer<'static, LowSpeed> = RGB_TIMER.init(lstimer);

    let make_channel = |number, pin: esp_hal::gpio::AnyPin<'static>| {
        let mut channel = ledc.channel(number, pin);
        let configured = timer_ok
            && channel
                .configure(channel::config::Config {
                    timer: lstimer,
                    duty_pct: 0,
                    pin_config: channel::config::PinConfig::PushPull,
                })
                .map_err(|e| error!("LEDC channel config failed: {:?}", e))
                .is_ok();
        LedcChannel {
            channel,
            configured,
        }
    };

    RgbLed::new(
        make_channel(channel::Number::Channel0, pins.0.into()),
        make_channel(channel::Number::Channel1, pins.1.into()),
        make_channel(channel::Number::Channel2, pins.2.into()),
    )
}

fn init_buzzer(
    p_mcpwm: MCPWM0<'static>,
    pin: esp_hal::peripherals::GPIO14<'static>,
    tone_duty: u16,
) -> Buzzer<McpwmBuzzer> {
    let clock = PeripheralClockConfig::with_frequency(Rate::from_hz(BUZZER_CLOCK_HZ))
        .map_err(|e| error!("MCPWM clock config failed: {:?}", e))
        .ok();
    // the driver needs some clock config even when the requested one failed
    let mut mcpwm = McPwm::new(
        p_mcpwm,
        clock.unwrap_or_else(|| PeripheralClockConfig::with_prescaler(0)),
    );
    mcpwm.operator0.set_timer(&mcpwm.timer0);
    let pwm_pin = mcpwm
        .operator0
        .with_pin_a(pin, PwmPinConfig::UP_ACTIVE_HIGH);

    Buzzer::new(
        McpwmBuzzer {
            timer: mcpwm.timer0,
            pin: pwm_pin,
            clock,
            period: 0,
        },
        tone_duty,
    )
}

/// Configure every pin and bus and hand the drivers over, uninitialized.
pub fn init_board(p: Peripherals, tone_duty: u16) -> FirmwareBoard {
    // OLED on I2C0
    let i2c = I2c::new(p.I2C0, I2cConfig::default().with_frequency(Rate::from_khz(400)))
        .expect("valid I2C config")
        .with_sda(p.GPIO8)
        .with_scl(p.GPIO9);
    let oled = Ssd1306::new(
        I2CDisplayInterface::new(i2c),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    let display = GraphicsDisplay::new(OledPanel { display: oled });

    // WS2812B on SPI3, MOSI only
    let strip_spi = Spi::new(
        p.SPI3,
        SpiConfig::default()
            .with_frequency(Rate::from_hz(ws2812::SPI_FREQUENCY_HZ))
            .with_mode(SpiMode::_0),
    )
    .expect("valid WS2812 SPI config")
    .with_mosi(p.GPIO4);
    let strip = Ws2812Spi::new(strip_spi, STRIP_LEN);

    // DHT22 on an open-drain line with pull-up
    let mut dht_pin = Flex::new(p.GPIO15);
    dht_pin.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    dht_pin.set_high();
    dht_pin.set_output_enable(true);
    dht_pin.set_input_enable(true);
    let climate = Dht22::new(dht_pin, Delay::new());

    let button = Input::new(p.GPIO0, InputConfig::default().with_pull(Pull::Up));

    let buzzer = init_buzzer(p.MCPWM0, p.GPIO14, tone_duty);

    let mut ledc = Ledc::new(p.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
    static LEDC: StaticCell<Ledc<'static>> = StaticCell::new();
    let ledc: &'static Ledc<'static> = LEDC.init(ledc);
    let rgb = init_rgb_channels(ledc, (p.GPIO5, p.GPIO6, p.GPIO7));

    // LDR and trimmer share ADC1
    let mut adc_cfg = AdcConfig::new();
    let light_pin = adc_cfg.enable_pin(p.GPIO1, Attenuation::_11dB);
    let trim_pin = adc_cfg.enable_pin(p.GPIO2, Attenuation::_11dB);
    static ADC: StaticCell<SharedAdc> = StaticCell::new();
    let adc: &'static SharedAdc = ADC.init(RefCell::new(Adc::new(p.ADC1, adc_cfg)));
    let light = AdcInput {
        adc,
        pin: light_pin,
        label: "LDR",
    };
    let trim = AdcInput {
        adc,
        pin: trim_pin,
        label: "Trimmer",
    };

    // SD card on SPI2 at the 400 kHz identification clock
    let sd_spi = Spi::new(
        p.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_khz(SD_SPI_KHZ))
            .with_mode(SpiMode::_0),
    )
    .expect("valid SD SPI config")
    .with_sck(p.GPIO12)
    .with_mosi(p.GPIO11)
    .with_miso(p.GPIO13);
    let sd_cs = Output::new(p.GPIO10, Level::High, OutputConfig::default());
    let sd_device =
        ExclusiveDevice::new(sd_spi, sd_cs, Delay::new()).unwrap_or_else(|e| match e {});
    let storage = SdCardStorage::new(SdCard::new(sd_device, Delay::new()), FixedTimeSource);

    info!("Board wiring done");

    Board {
        display,
        strip,
        climate,
        button,
        buzzer,
        rgb,
        light,
        trim,
        storage,
    }
}
