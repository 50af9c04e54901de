use bencode_typed::core::read_byte_string;
use bencode_typed::{decode, decode_slice, encode, skip_value, Bytes, Decode, Encode, Reader};
use proptest::prelude::*;

#[derive(Encode, Decode, Debug, PartialEq, Default, Clone)]
struct FileEntry {
    #[bencode(tag = "path", required)]
    path: Vec<String>,
    #[bencode(tag = "length")]
    length: i64,
    #[bencode(tag = "md5sum")]
    md5sum: Option<String>,
    #[bencode(tag = "attr")]
    attr: Option<Bytes>,
}

fn file_entry() -> impl Strategy<Value = FileEntry> {
    (
        prop::collection::vec(".*", 0..4),
        any::<i64>(),
        prop::option::of("[0-9a-f]{32}"),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..8)),
    )
        .prop_map(|(path, length, md5sum, attr)| FileEntry {
            path,
            length,
            md5sum,
            attr: attr.map(Bytes::from),
        })
}

/// Top-level keys of an encoded dict, in wire order.
fn dict_keys(buf: Bytes) -> Vec<Bytes> {
    let mut reader = Reader::new(buf);
    assert_eq!(reader.read_u8().unwrap(), b'd');
    let mut keys = Vec::new();
    while reader.peek_u8().unwrap() != b'e' {
        keys.push(read_byte_string(&mut reader).unwrap());
        skip_value(&mut reader).unwrap();
    }
    keys
}

proptest! {
    #[test]
    fn prop_integer_roundtrip(value in any::<i64>()) {
        let mut buf = encode(&value).unwrap();
        let expected = format!("i{}e", value);
        prop_assert_eq!(&buf[..], expected.as_bytes());
        prop_assert_eq!(decode::<i64>(&mut buf).unwrap(), value);
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn prop_wide_integer_roundtrip(value in any::<i128>()) {
        let mut buf = encode(&value).unwrap();
        prop_assert_eq!(decode::<i128>(&mut buf).unwrap(), value);
    }

    #[test]
    fn prop_string_roundtrip(value in ".*") {
        let mut buf = encode(&value).unwrap();
        prop_assert_eq!(decode::<String>(&mut buf).unwrap(), value);
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn prop_bytes_roundtrip(value in prop::collection::vec(any::<u8>(), 0..256)) {
        let value = Bytes::from(value);
        let mut buf = encode(&value).unwrap();
        prop_assert_eq!(decode::<Bytes>(&mut buf).unwrap(), value);
    }

    #[test]
    fn prop_nested_list_roundtrip(
        value in prop::collection::vec(prop::collection::vec(any::<i64>(), 0..8), 0..8)
    ) {
        let mut buf = encode(&value).unwrap();
        prop_assert_eq!(decode::<Vec<Vec<i64>>>(&mut buf).unwrap(), value);
    }

    #[test]
    fn prop_record_roundtrip(entry in file_entry()) {
        let mut buf = encode(&entry).unwrap();
        prop_assert_eq!(decode::<FileEntry>(&mut buf).unwrap(), entry);
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn prop_record_keys_sorted(entry in file_entry()) {
        let keys = dict_keys(encode(&entry).unwrap());
        prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(keys.len(), 2 + entry.md5sum.is_some() as usize + entry.attr.is_some() as usize);
    }

    #[test]
    fn prop_strict_prefix_fails(entry in file_entry()) {
        let buf = encode(&entry).unwrap();
        for len in 0..buf.len() {
            prop_assert!(decode_slice::<FileEntry>(&buf[..len]).is_err());
        }
    }

    #[test]
    fn prop_skip_matches_decode(value in prop::collection::vec(".*", 0..6)) {
        let mut buf = encode(&value).unwrap();
        let len = buf.len();
        let mut reader = Reader::new(buf.clone());
        skip_value(&mut reader).unwrap();
        prop_assert_eq!(reader.position(), len);
        let _: Vec<String> = decode(&mut buf).unwrap();
        prop_assert!(buf.is_empty());
    }
}
