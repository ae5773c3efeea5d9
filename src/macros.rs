//! Small formatting helpers used by the `log::debug!` call sites throughout the crate.

/// Render a byte slice as a hex dump (`"X"`) or as a dot-for-unprintable ASCII
/// strip (`"C"`), the way `util::pretty_cursor` does for interactive debugging
/// but cheap enough to build inline in a `debug!()` argument.
#[macro_export]
macro_rules! format_buffer {
    ("X", $buf:expr) => {{
        let mut s = String::new();
        for b in $buf.iter() {
            s.push_str(&format!("{:02X} ", b));
        }
        s
    }};
    ("C", $buf:expr) => {{
        let mut s = String::new();
        for b in $buf.iter() {
            let c = *b as char;
            if c.is_ascii_graphic() {
                s.push(c);
            } else {
                s.push('.');
            }
        }
        s
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn hex_dump() {
        let buf: &[u8] = &[0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(format_buffer!("X", buf), "DE AD BE EF ");
    }

    #[test]
    fn ascii_dump() {
        let buf: &[u8] = b"www\x00google";
        assert_eq!(format_buffer!("C", buf), "www.google");
    }
}
