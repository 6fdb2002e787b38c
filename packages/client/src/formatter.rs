//! Message formatting utilities for client display.

use hiroba_shared::time::timestamp_to_jst_clock;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a relayed text message
    ///
    /// # Arguments
    ///
    /// * `content` - The message content
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_text_message(content: &str, received_at: i64) -> String {
        format!("\n[{}] {}\n", timestamp_to_jst_clock(received_at), content)
    }

    /// Format a relayed binary message
    ///
    /// # Arguments
    ///
    /// * `byte_count` - The number of bytes received
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_binary_message(byte_count: usize, received_at: i64) -> String {
        format!(
            "\n[{}] <binary message: {} bytes>\n",
            timestamp_to_jst_clock(received_at),
            byte_count
        )
    }

    /// Format the banner shown after connecting
    pub fn format_connected(url: &str) -> String {
        format!(
            "\nConnected to {}. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
            url
        )
    }
}
