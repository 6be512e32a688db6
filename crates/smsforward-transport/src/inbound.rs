use crate::error::{RelayError, Result};
use serde::Deserialize;
use std::io::{BufRead, ErrorKind};

/// One line of the inbound feed. Multi-part messages carry a shared
/// `reference` plus their 1-based `part` out of `parts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundEvent {
    pub sender: String,
    pub body: String,
    #[serde(default)]
    pub reference: Option<u32>,
    #[serde(default)]
    pub part: Option<u16>,
    #[serde(default)]
    pub parts: Option<u16>,
}

impl InboundEvent {
    pub fn single(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            reference: None,
            part: None,
            parts: None,
        }
    }

    pub fn is_segment(&self) -> bool {
        self.parts.is_some_and(|parts| parts > 1)
    }
}

/// Reads JSON-lines events, skipping blank lines. A read error is yielded
/// once and ends the iteration.
pub struct InboundReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> InboundReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for InboundReader<R> {
    type Item = Result<InboundEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(RelayError::Io(err)));
                }
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(line).map_err(|err| {
                RelayError::Parse(format!("line {}: {err}", self.line_no))
            }));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{InboundEvent, InboundReader};
    use crate::error::RelayError;
    use std::io::{self, BufRead, Cursor, Read};

    /// Serves `good` and then fails every read.
    pub(crate) struct FailingFeed {
        good: Cursor<Vec<u8>>,
        pub(crate) reads_after_eof: usize,
    }

    impl FailingFeed {
        pub(crate) fn new(good: &str) -> Self {
            Self {
                good: Cursor::new(good.as_bytes().to_vec()),
                reads_after_eof: 0,
            }
        }
    }

    impl Read for FailingFeed {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let filled = self.fill_buf()?;
            let n = filled.len().min(buf.len());
            buf[..n].copy_from_slice(&filled[..n]);
            self.consume(n);
            Ok(n)
        }
    }

    impl BufRead for FailingFeed {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.good.position() < self.good.get_ref().len() as u64 {
                return self.good.fill_buf();
            }
            self.reads_after_eof += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "feed closed"))
        }

        fn consume(&mut self, amt: usize) {
            self.good.consume(amt);
        }
    }

    #[test]
    fn reads_events_and_skips_blank_lines() {
        let input = concat!(
            "{\"sender\":\"+12025550143\",\"body\":\"hi\"}\n",
            "\n",
            "  \n",
            "{\"sender\":\"BANK\",\"body\":\"a\",\"reference\":7,\"part\":1,\"parts\":2}\n",
        );
        let events: Vec<_> = InboundReader::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .expect("events");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], InboundEvent::single("+12025550143", "hi"));
        assert!(!events[0].is_segment());
        assert_eq!(events[1].reference, Some(7));
        assert!(events[1].is_segment());
    }

    #[test]
    fn reports_line_number_on_bad_json() {
        let input = "{\"sender\":\"a\",\"body\":\"b\"}\n\nnot json\n{\"sender\":\"c\",\"body\":\"d\"}\n";
        let mut reader = InboundReader::new(Cursor::new(input));
        assert!(reader.next().expect("first").is_ok());
        match reader.next().expect("second") {
            Err(RelayError::Parse(message)) => assert!(message.starts_with("line 3:")),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(reader.next().expect("third").is_ok());
        assert!(reader.next().is_none());
    }

    #[test]
    fn read_error_is_reported_once_then_iteration_ends() {
        let feed = FailingFeed::new("{\"sender\":\"a\",\"body\":\"b\"}\n");
        let mut reader = InboundReader::new(feed);
        assert!(reader.next().expect("first").is_ok());
        assert!(matches!(reader.next(), Some(Err(RelayError::Io(_)))));
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
        assert_eq!(reader.reader.reads_after_eof, 1);
    }

    #[test]
    fn body_whitespace_is_preserved() {
        let input = "{\"sender\":\"a\",\"body\":\"  two\\nlines  \"}\n";
        let event = InboundReader::new(Cursor::new(input))
            .next()
            .expect("event")
            .expect("ok");
        assert_eq!(event.body, "  two\nlines  ");
    }
}
