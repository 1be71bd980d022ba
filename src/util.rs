//! util — мелкие хелперы вывода.

/// Hex-дамп: 16 байт на строку, без offset-колонки.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            if i % 16 == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_every_16_bytes() {
        let dump = hex_dump(&[0xABu8; 17]);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ab ab"));
        assert_eq!(lines[1], "ab");
    }

    #[test]
    fn empty_input() {
        assert_eq!(hex_dump(&[]), "");
    }
}
