//! Line framing for the protocol stream: chunks arrive on arbitrary
//! boundaries, commands are newline-terminated.

/// Reassembles newline-terminated commands from a chunked byte stream.
/// An incomplete trailing fragment is buffered and prefixed to the next
/// chunk's first line. Framing works on raw bytes and converts per
/// completed line, so a multibyte character split across reads stays
/// intact.
#[derive(Debug, Default)]
pub struct LineFramer {
    fragment: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> LineFramer {
        LineFramer::default()
    }

    /// Feed one chunk and return every completed line, in order. A
    /// trailing carriage return is stripped from each line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.fragment.extend_from_slice(&rest[..pos]);
            if self.fragment.last() == Some(&b'\r') {
                self.fragment.pop();
            }
            lines.push(String::from_utf8_lossy(&self.fragment).into_owned());
            self.fragment.clear();
            rest = &rest[pos + 1..];
        }
        self.fragment.extend_from_slice(rest);
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_splits_lines() {
        let mut framer = LineFramer::new();
        assert_eq!(
            framer.push(b"one\ntwo\nthree\n"),
            vec!["one", "two", "three"]
        );
    }

    #[test]
    fn trailing_fragment_buffers() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"mazeWi"), Vec::<String>::new());
        assert_eq!(framer.push(b"dth\nwall"), vec!["mazeWidth"]);
        assert_eq!(framer.push(b"Front\n"), vec!["wallFront"]);
    }

    #[test]
    fn chunk_boundaries_do_not_change_the_sequence() {
        let input = b"interfaceType DISCRETE\nmoveForward\nturnTo NORTH\npose\n";
        let whole = LineFramer::new().push(input);
        // Re-deliver the same bytes one at a time
        let mut framer = LineFramer::new();
        let mut pieced = Vec::new();
        for byte in input {
            pieced.extend(framer.push(std::slice::from_ref(byte)));
        }
        assert_eq!(whole, pieced);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        // "setTileText 0 0 μ\n" with the two-byte μ split between reads
        let input = "setTileText 0 0 μ\n".as_bytes();
        let whole = LineFramer::new().push(input);
        let mut framer = LineFramer::new();
        let split = input.len() - 2; // between the bytes of μ
        let mut pieced = framer.push(&input[..split]);
        pieced.extend(framer.push(&input[split..]));
        assert_eq!(whole, pieced);
        assert_eq!(pieced, vec!["setTileText 0 0 μ"]);
    }

    #[test]
    fn carriage_returns_stripped() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"moveForward\r\n"), vec!["moveForward"]);
    }
}
