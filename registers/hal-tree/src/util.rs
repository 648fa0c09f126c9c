// Licensed under the Apache-2.0 license

//! Utility functions for naming and formatting.

/// Base name of the generated file and type for an addrmap instance.
///
/// # Examples
/// ```
/// use registers_hal_tree::util::hal_name;
/// assert_eq!(hal_name("gpio0"), "gpio0_hal");
/// assert_eq!(hal_name("UART_Top"), "uart_top_hal");
/// ```
pub fn hal_name(inst_name: &str) -> String {
    inst_name.to_lowercase() + "_hal"
}

/// Formats an integer as a hex constant with underscores for readability.
///
/// Values <= 9 are formatted as decimal; larger values use hex with
/// underscore separators every 4 digits.
///
/// # Examples
/// ```
/// use registers_hal_tree::util::hex_const;
/// assert_eq!(hex_const(5), "5");
/// assert_eq!(hex_const(0x1234), "0x1234");
/// assert_eq!(hex_const(0x12345678), "0x1234_5678");
/// ```
pub fn hex_const(val: u64) -> String {
    if val > 9 {
        let mut x = String::new();
        for (i, c) in format!("{val:x}").chars().rev().enumerate() {
            if i % 4 == 0 && i != 0 {
                x.push('_');
            }
            x.push(c);
        }
        "0x".to_string() + &x.chars().rev().collect::<String>()
    } else {
        format!("{val}")
    }
}

/// Splits a description into trimmed lines, dropping leading and trailing
/// blank lines.
pub fn desc_lines(desc: &str) -> Vec<&str> {
    let lines: Vec<&str> = desc.lines().map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |e| e + 1);
    lines[start..end].to_vec()
}
