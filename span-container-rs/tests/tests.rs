use span_container_rs::format::{
    Container, ContainerFileHeader, ContainerReader, ContainerWriter, EncoderType, FileHeader,
    FormatVersion, HeaderReader,
};
use span_container_rs::{SeekableSource, Span, SpanContainerIterator, SpanError, VirtualOffset};
use std::cell::Cell;
use std::io::{self, BufReader, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::rc::Rc;

const V3: FormatVersion = FormatVersion::new(3, 0);

/// Header occupying bytes 0..100, then three 150-byte containers at 100, 250 and 400.
fn sample_file() -> (Vec<u8>, Vec<u64>) {
    let text = "x".repeat(100 - ContainerFileHeader::FIXED_SIZE);
    let mut writer = ContainerWriter::new(Vec::new(), V3, [1u8; 20], &text).unwrap();
    // 14-byte container header + 136-byte payload.
    let offsets = (0..3u8)
        .map(|i| writer.write_container(EncoderType::Raw, 1, &[i; 136]).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(offsets, vec![100, 250, 400]);
    (writer.into_inner().unwrap(), offsets)
}

fn vo(coarse: u64, fine: u16) -> u64 {
    VirtualOffset::from_parts(coarse, fine).raw()
}

fn offsets_of(iter: SpanContainerIterator<Cursor<Vec<u8>>>) -> Vec<u64> {
    iter.map(|c| c.unwrap().offset).collect()
}

/// Header of 100 bytes followed by fixed 150-byte containers; counts decodes.
#[derive(Default)]
struct FixedSizeFormat {
    decodes: Cell<usize>,
}

struct FixedHeader;

impl FileHeader for FixedHeader {
    fn version(&self) -> FormatVersion {
        FormatVersion::new(1, 0)
    }
}

#[derive(Debug)]
struct FixedContainer {
    offset: u64,
}

impl Container for FixedContainer {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }
}

impl HeaderReader for FixedSizeFormat {
    type Header = FixedHeader;

    fn read_header<R>(&self, source: &mut R) -> Result<Self::Header, SpanError>
    where
        R: SeekableSource + ?Sized,
    {
        source.seek_to(100)?;
        Ok(FixedHeader)
    }
}

impl ContainerReader for FixedSizeFormat {
    type Container = FixedContainer;

    fn read_container<R>(
        &self,
        _version: FormatVersion,
        source: &mut R,
    ) -> Result<Self::Container, SpanError>
    where
        R: SeekableSource + ?Sized,
    {
        let mut buf = [0u8; 150];
        source.read_exact(&mut buf)?;
        self.decodes.set(self.decodes.get() + 1);
        Ok(FixedContainer { offset: 0 })
    }
}

/// In-memory source whose seeks and position queries fail once `broken` is set.
struct BreakableSource {
    inner: Cursor<Vec<u8>>,
    broken: Rc<Cell<bool>>,
}

impl Read for BreakableSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for BreakableSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if self.broken.get() {
            return Err(io::Error::other("device unavailable"));
        }
        self.inner.seek(pos)
    }
}

#[test]
fn test_end_to_end_span_covering_two_containers() {
    let (bytes, _) = sample_file();
    let mut iter =
        SpanContainerIterator::from_spans(Cursor::new(bytes), &[100 << 16, 250 << 16]).unwrap();
    assert_eq!(iter.first_container_offset(), 100);
    assert_eq!(iter.header().version, V3);

    assert!(iter.has_next().unwrap());
    let first = iter.next_container().unwrap();
    assert_eq!(first.offset, 100);
    assert_eq!(first.data, vec![0u8; 136]);

    assert!(iter.has_next().unwrap());
    let second = iter.next_container().unwrap();
    assert_eq!(second.offset, 250);
    assert_eq!(second.data, vec![1u8; 136]);

    assert!(!iter.has_next().unwrap());
    assert_eq!(iter.active_span(), None);
}

#[test]
fn test_single_container_span() {
    let (bytes, _) = sample_file();
    let mut iter =
        SpanContainerIterator::from_spans(Cursor::new(bytes), &[vo(250, 0), vo(250, 1)]).unwrap();
    assert!(iter.has_next().unwrap());
    assert_eq!(iter.next_container().unwrap().offset, 250);
    assert!(!iter.has_next().unwrap());
}

#[test]
fn test_disjoint_spans_in_order() {
    let (bytes, offsets) = sample_file();
    let coordinates = offsets
        .iter()
        .flat_map(|&o| [vo(o, 0), vo(o, 10)])
        .collect::<Vec<_>>();
    let iter = SpanContainerIterator::from_spans(Cursor::new(bytes.clone()), &coordinates).unwrap();
    assert_eq!(offsets_of(iter), offsets);

    // Skipping the middle container.
    let iter = SpanContainerIterator::from_spans(
        Cursor::new(bytes),
        &[vo(100, 0), vo(100, 10), vo(400, 0), vo(400, 10)],
    )
    .unwrap();
    assert_eq!(offsets_of(iter), vec![100, 400]);
}

#[test]
fn test_fine_offsets_are_ignored_at_container_granularity() {
    let (bytes, _) = sample_file();
    let iter =
        SpanContainerIterator::from_spans(Cursor::new(bytes), &[vo(100, 77), vo(250, 3)]).unwrap();
    assert_eq!(offsets_of(iter), vec![100, 250]);
}

#[test]
fn test_offsets_increase_within_a_span() {
    let (bytes, _) = sample_file();
    let iter =
        SpanContainerIterator::from_spans(Cursor::new(bytes), &[vo(100, 0), vo(400, 0)]).unwrap();
    let offsets = offsets_of(iter);
    assert_eq!(offsets, vec![100, 250, 400]);
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_has_next_is_idempotent() {
    let format = FixedSizeFormat::default();
    let source = Cursor::new(vec![0u8; 550]);
    let mut iter = SpanContainerIterator::with_format(
        format,
        source,
        &[vo(100, 0), vo(100, 1), vo(400, 0), vo(400, 1)],
    )
    .unwrap();

    for _ in 0..3 {
        assert!(iter.has_next().unwrap());
        assert_eq!(iter.active_span(), Some(0));
    }
    assert_eq!(iter.next_container().unwrap().offset, 100);

    // The cursor moves to the second span once, then stays there.
    for _ in 0..3 {
        assert!(iter.has_next().unwrap());
        assert_eq!(iter.active_span(), Some(1));
    }
    assert_eq!(iter.format().decodes.get(), 1);
    assert_eq!(iter.next_container().unwrap().offset, 400);

    for _ in 0..3 {
        assert!(!iter.has_next().unwrap());
    }
    assert_eq!(iter.format().decodes.get(), 2);
    assert_eq!(iter.into_inner().position(), 550);
}

#[test]
fn test_next_past_span_end_does_not_decode() {
    let mut iter = SpanContainerIterator::with_format(
        FixedSizeFormat::default(),
        Cursor::new(vec![0u8; 550]),
        &[vo(100, 0), vo(100, 1)],
    )
    .unwrap();

    assert_eq!(iter.next_container().unwrap().offset, 100);
    assert_eq!(iter.format().decodes.get(), 1);

    match iter.next_container() {
        Err(SpanError::OutOfBounds { position, end }) => {
            assert_eq!(position, 250);
            assert_eq!(end, 100);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(iter.format().decodes.get(), 1);

    // Same once the cursor is exhausted.
    assert!(!iter.has_next().unwrap());
    assert!(matches!(
        iter.next_container(),
        Err(SpanError::OutOfBounds { .. })
    ));
    assert_eq!(iter.format().decodes.get(), 1);
}

#[test]
fn test_overlapping_spans_never_seek_backward() {
    let (bytes, _) = sample_file();
    let iter = SpanContainerIterator::from_spans(
        Cursor::new(bytes.clone()),
        &[vo(100, 0), vo(250, 0), vo(250, 0), vo(400, 0)],
    )
    .unwrap();
    assert_eq!(offsets_of(iter), vec![100, 250, 400]);

    // A span entirely behind the current position yields nothing.
    let iter = SpanContainerIterator::from_spans(
        Cursor::new(bytes),
        &[vo(400, 0), vo(400, 1), vo(100, 0), vo(100, 1)],
    )
    .unwrap();
    assert_eq!(offsets_of(iter), vec![400]);
}

#[test]
fn test_construction_errors() {
    let (bytes, _) = sample_file();

    let err = SpanContainerIterator::from_spans(Cursor::new(bytes.clone()), &[vo(100, 0)])
        .err()
        .unwrap();
    assert!(matches!(err, SpanError::OddCoordinateCount(1)));
    assert!(err.is_construction());

    let err = SpanContainerIterator::from_spans(Cursor::new(bytes.clone()), &[])
        .err()
        .unwrap();
    assert!(matches!(err, SpanError::EmptyCoordinates));

    let err = SpanContainerIterator::from_spans(
        Cursor::new(bytes.clone()),
        &[vo(100, 0), vo(250, 0), vo(250, 0), vo(250, 0)],
    )
    .err()
    .unwrap();
    assert!(matches!(err, SpanError::InvalidRange { .. }));
    assert!(err.is_construction());

    let err = SpanContainerIterator::from_spans(Cursor::new(b"not a container file".to_vec()), &[0, 1])
        .err()
        .unwrap();
    assert!(matches!(err, SpanError::InvalidData(_)));
    assert!(!err.is_construction());
}

#[test]
fn test_span_construction() {
    assert!(Span::new(VirtualOffset::new(1), VirtualOffset::new(2)).is_ok());
    assert!(Span::new(VirtualOffset::new(2), VirtualOffset::new(2)).is_err());
    assert!(Span::new(VirtualOffset::new(3), VirtualOffset::new(2)).is_err());
}

#[test]
fn test_remove_is_unsupported() {
    let (bytes, _) = sample_file();
    let mut iter =
        SpanContainerIterator::from_spans(Cursor::new(bytes), &[vo(100, 0), vo(250, 0)]).unwrap();
    assert!(matches!(iter.remove(), Err(SpanError::Unsupported(_))));
    assert_eq!(iter.spans().len(), 1);
}

#[test]
fn test_truncated_file_stops_iteration_with_error() {
    let (mut bytes, _) = sample_file();
    bytes.truncate(300);
    let mut iter =
        SpanContainerIterator::from_spans(Cursor::new(bytes), &[vo(100, 0), vo(400, 0)]).unwrap();

    assert_eq!(iter.next().unwrap().unwrap().offset, 100);
    match iter.next() {
        Some(Err(SpanError::Io(e))) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(iter.next().is_none());
}

#[test]
fn test_whole_file_from_first_container_offset() {
    let mut writer = ContainerWriter::new(Vec::new(), FormatVersion::new(2, 1), [9u8; 20], "").unwrap();
    writer.write_container(EncoderType::ZLib, 3, b"aaaaaaaaaaaaaaaa").unwrap();
    writer.write_container(EncoderType::Raw, 2, b"bb").unwrap();
    let eof = writer.write_eof().unwrap();
    let bytes = writer.into_inner().unwrap();

    let probe = SpanContainerIterator::from_spans(Cursor::new(bytes.clone()), &[0, 1]).unwrap();
    let first = probe.first_container_offset();
    assert_eq!(first, ContainerFileHeader::FIXED_SIZE as u64);

    let containers = SpanContainerIterator::from_spans(Cursor::new(bytes), &[vo(first, 0), vo(eof, 0)])
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(containers.len(), 3);
    assert_eq!(containers[0].data, b"aaaaaaaaaaaaaaaa");
    assert_eq!(containers[0].record_count, 3);
    assert_eq!(containers[1].data, b"bb");
    assert!(containers[2].is_eof());
    assert_eq!(containers[2].offset, eof);
}

#[test]
fn test_iterate_file_on_disk() {
    let mut file = tempfile::tempfile().unwrap();
    let mut writer = ContainerWriter::new(&mut file, V3, [2u8; 20], "on disk").unwrap();
    let offsets = (0..5u32)
        .map(|i| {
            let payload = format!("container {i}").repeat(10);
            writer
                .write_container(EncoderType::ZLib, i, payload.as_bytes())
                .unwrap()
        })
        .collect::<Vec<_>>();
    writer.write_eof().unwrap();
    writer.into_inner().unwrap();

    let coordinates = [vo(offsets[1], 0), vo(offsets[2], 0), vo(offsets[4], 0), vo(offsets[4], 1)];
    let iter = SpanContainerIterator::from_spans(BufReader::new(file), &coordinates).unwrap();
    assert_eq!(iter.header().text, "on disk");

    let containers = iter.collect::<Result<Vec<_>, _>>().unwrap();
    let read = containers.iter().map(|c| c.offset).collect::<Vec<_>>();
    assert_eq!(read, vec![offsets[1], offsets[2], offsets[4]]);
    assert_eq!(containers[2].record_count, 4);
    assert_eq!(containers[2].data, "container 4".repeat(10).into_bytes());
}

#[test]
fn test_source_failure_in_has_next_is_an_error() {
    let (bytes, _) = sample_file();
    let broken = Rc::new(Cell::new(false));
    let source = BreakableSource {
        inner: Cursor::new(bytes),
        broken: broken.clone(),
    };
    let mut iter = SpanContainerIterator::from_spans(source, &[vo(100, 0), vo(400, 0)]).unwrap();
    assert_eq!(iter.next_container().unwrap().offset, 100);

    broken.set(true);
    match iter.has_next() {
        Err(SpanError::Io(e)) => assert_eq!(e.to_string(), "device unavailable"),
        other => panic!("unexpected result: {other:?}"),
    }

    // The iterator adapter reports the failure once, then stops.
    assert!(matches!(iter.next(), Some(Err(SpanError::Io(_)))));
    assert!(iter.next().is_none());

    // Nothing was consumed past the failure.
    broken.set(false);
    assert_eq!(iter.into_inner().inner.position(), 250);
}
