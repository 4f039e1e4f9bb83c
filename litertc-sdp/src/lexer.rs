use shared::error::{Error, Result};

/// A single `<type>=<value>` SDP line.
pub(crate) struct Line<'a> {
    pub(crate) typ: u8,
    pub(crate) value: &'a str,
}

/// Splits raw SDP into lines and validates the `<type>=` prefix of each.
///
/// Lines are separated by CR, LF, or CRLF. Empty lines are skipped.
/// A surviving line shorter than three characters, or without `=` as
/// its second byte, is malformed. The type byte itself is not
/// validated here; unknown types are ignored by the caller.
pub(crate) fn lines(raw: &str) -> impl Iterator<Item = Result<Line<'_>>> {
    raw.split(['\r', '\n']).filter(|l| !l.is_empty()).map(|l| {
        let bytes = l.as_bytes();
        if l.len() < 3 || bytes[1] != b'=' {
            return Err(Error::ErrSdpMalformed);
        }
        Ok(Line {
            typ: bytes[0],
            value: &l[2..],
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings() {
        for raw in ["v=0\nt=0 0", "v=0\rt=0 0", "v=0\r\nt=0 0", "v=0\r\nt=0 0\r\n"] {
            let parsed: Result<Vec<_>> = lines(raw).collect();
            let parsed = parsed.unwrap();
            assert_eq!(parsed.len(), 2, "{raw:?}");
            assert_eq!(parsed[0].typ, b'v');
            assert_eq!(parsed[1].value, "0 0");
        }
    }

    #[test]
    fn test_malformed_lines() {
        assert!(lines("v0").next().unwrap().is_err());
        assert!(lines("v=").next().unwrap().is_err());
        assert!(lines("x").next().unwrap().is_err());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lines("").count(), 0);
    }
}
