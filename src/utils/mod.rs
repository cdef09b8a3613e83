pub mod parsing;

// Re-export commonly used items
pub use parsing::{parse_hex_color, parse_led_mode, parse_usb_id};
