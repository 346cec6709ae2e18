//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to                  |
//! |-------------|-------------------|------------------------------|
//! | `device_id` | —                 | eFuse factory MAC            |
//! | `http`      | HttpPort          | ESP-IDF HTTP client / sim    |
//! | `washer`    | WasherPort        | Washer board UART / sim      |
//! | `wifi`      | ConnectivityPort  | ESP-IDF WiFi STA / sim       |
//! | `system`    | —                 | esp_restart, blocking delays |

pub mod device_id;
pub mod http;
pub mod system;
pub mod washer;
pub mod wifi;
