//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `hardware`  | SensorPort         | SCD30 over I2C               |
//! |             | IndicatorPort      | ESP32 GPIO                   |
//! | `iot_hub`   | CloudPort          | Azure IoT Hub (MQTT, espidf) |
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `nvs`       | ConfigPort         | NVS / in-memory store        |
//! | `time`      | —                  | ESP32 system timer           |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA             |

pub mod hardware;
pub mod iot_hub;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
