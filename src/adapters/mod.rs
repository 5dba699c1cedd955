//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorSource       | ESP32 ADC1 (4 channels)      |
//! |                | ChargePath         | Charge-enable GPIOs          |
//! |                | DutyOutput         | LEDC discharge PWM           |
//! |                | StatusIndicator    | Status LED GPIO              |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `nvs`          | ConfigPort         | NVS / in-memory store        |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
