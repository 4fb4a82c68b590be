use crate::ReadSeek;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::SeekFrom;

/// A predicate over the full contents of a file.
///
/// Implementations may read as much of the stream as they like; the caller
/// rewinds it afterwards.
pub trait Filter: Send + Sync {
    fn apply(&self, reader: &mut dyn ReadSeek) -> Result<bool>;
}

/// An ordered chain of [`Filter`]s. A file is accepted only if every filter
/// accepts it; evaluation stops at the first rejection or error.
#[derive(Default)]
pub struct Filters {
    filters: Vec<Box<dyn Filter>>,
}
impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter over `stream`, each from offset zero.
    ///
    /// On success (accept or reject) the stream is left at offset zero.
    pub fn apply(&self, stream: &mut dyn ReadSeek) -> Result<bool> {
        for filter in &self.filters {
            rewind(stream)?;
            if !filter.apply(stream)? {
                rewind(stream)?;
                return Ok(false);
            }
        }
        rewind(stream)?;
        Ok(true)
    }
}
impl std::fmt::Debug for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filters").field("len", &self.filters.len()).finish()
    }
}

pub(crate) fn rewind(stream: &mut dyn ReadSeek) -> Result<()> {
    stream.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Seek};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reads everything, counts calls, accepts when the content contains a needle.
    struct Contains {
        needle: &'static str,
        calls: Arc<AtomicUsize>,
    }
    impl Filter for Contains {
        fn apply(&self, reader: &mut dyn ReadSeek) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut content = String::new();
            reader.read_to_string(&mut content).or_raise(|| ErrorKind::Io)?;
            Ok(content.contains(self.needle))
        }
    }

    struct Broken;
    impl Filter for Broken {
        fn apply(&self, _reader: &mut dyn ReadSeek) -> Result<bool> {
            exn::bail!(ErrorKind::InvalidData)
        }
    }

    fn contains(needle: &'static str) -> (Contains, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Contains { needle, calls: Arc::clone(&calls) }, calls)
    }

    #[test]
    fn test_empty_chain_accepts() {
        let mut stream = Cursor::new(b"anything".to_vec());
        assert!(Filters::new().apply(&mut stream).unwrap());
    }

    #[test]
    fn test_every_filter_sees_whole_stream() {
        let (first, first_calls) = contains("hello");
        let (second, second_calls) = contains("world");
        let filters = Filters::new().with(first).with(second);
        let mut stream = Cursor::new(b"hello world".to_vec());
        assert!(filters.apply(&mut stream).unwrap());
        assert_eq!(stream.stream_position().unwrap(), 0);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejection_short_circuits() {
        let (first, _) = contains("nope");
        let (second, second_calls) = contains("hello");
        let filters = Filters::new().with(first).with(second);
        let mut stream = Cursor::new(b"hello world".to_vec());
        assert!(!filters.apply(&mut stream).unwrap());
        assert_eq!(stream.stream_position().unwrap(), 0);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_errors_propagate() {
        let filters = Filters::new().with(Broken);
        let mut stream = Cursor::new(Vec::new());
        let err = filters.apply(&mut stream).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData);
    }

    #[test]
    fn test_stream_rewound_even_if_filter_reads_partially() {
        struct Peek;
        impl Filter for Peek {
            fn apply(&self, reader: &mut dyn ReadSeek) -> Result<bool> {
                let mut head = [0u8; 3];
                reader.read_exact(&mut head).or_raise(|| ErrorKind::Io)?;
                Ok(&head == b"abc")
            }
        }
        let filters = Filters::new().with(Peek);
        let mut stream = Cursor::new(b"abcdef".to_vec());
        assert!(filters.apply(&mut stream).unwrap());
        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "abcdef");
    }
}
