pub mod command_code;
pub mod epd7in5_v2;
pub mod gpio_pin;
