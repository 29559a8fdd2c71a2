//! The encoded format.
//!
//! This module holds no code. It describes the bytes a [`Document`][crate::Document] is made of.
//!
//! # Document
//!
//! ```text
//! document = key_type key? revision? root_array
//! ```
//!
//! The header is a one-byte key marker (`?` no key, `*` auto-increment, `+` unsigned, `-`
//! signed, `!` string), the key itself, and a varint revision. Unsigned and signed keys are 8
//! bytes little-endian; string keys are a varint length followed by UTF-8. There is neither a
//! key nor a revision when the marker is `?`. Everything after the header is one array, the
//! root, and nothing may follow it.
//!
//! # Varints
//!
//! Lengths, counts, and capacities are varints of 1 to 9 bytes. The number of leading zero bits
//! in the first byte is the number of bytes that follow it, and the value is stored big-endian in
//! the remaining bits. Values up to 127 take one byte:
//!
//! | Value   | Bytes              |
//! | ------- | ------------------ |
//! | 5       | `85`               |
//! | 300     | `41 2c`            |
//! | 2^64-1  | `00 ff .. ff`      |
//!
//! # Fields
//!
//! Every field starts with a tag byte. Fixed-width bodies are little-endian.
//!
//! | Tag  | Field          | Body                                      |
//! | ---- | -------------- | ----------------------------------------- |
//! | `n`  | null           | none                                      |
//! | `t`  | true           | none                                      |
//! | `f`  | false          | none                                      |
//! | `c`  | u8             | 1 byte                                    |
//! | `d`  | u16            | 2 bytes                                   |
//! | `i`  | u32            | 4 bytes                                   |
//! | `l`  | u64            | 8 bytes                                   |
//! | `C`  | i8             | 1 byte                                    |
//! | `D`  | i16            | 2 bytes                                   |
//! | `I`  | i32            | 4 bytes                                   |
//! | `L`  | i64            | 8 bytes                                   |
//! | `r`  | f32            | 4 bytes                                   |
//! | `s`  | string         | `len:varint utf8`                         |
//! | `b`  | binary         | `mime:varint len:varint bytes`            |
//! | `x`  | custom binary  | `type_len:varint type len:varint bytes`   |
//!
//! The `mime` of a binary field is an id from the table in [`mime`][crate::mime].
//!
//! # Containers
//!
//! Arrays and objects hold their members inline and end with a `0x00` byte. Each object member
//! is a key (`len:varint utf8`) followed by a field. The tag records the container's
//! derivation:
//!
//! | Derivation   | Array | Object |
//! | ------------ | ----- | ------ |
//! | unsorted multi | `[` | `{`    |
//! | sorted multi   | `<` | `~`    |
//! | unsorted set   | `/` | `:`    |
//! | sorted set     | `=` | `#`    |
//!
//! Columns hold fixed-width values of one type:
//!
//! ```text
//! column = tag count:varint capacity:varint slot{capacity}
//! ```
//!
//! The tag is `0x80 + 10 * derivation + element`, where derivation counts from 0 in the order
//! above and element is, from 0: u8, u16, u32, u64, i8, i16, i32, i64, f32, boolean. That gives
//! the tags `0x80` through `0xa7`. Slots past `count` are reserved space. Slots hold null as a
//! sentinel: the maximum value for unsigned types, the minimum plus one for signed types, NaN
//! for floats, and `2` for booleans (`0` is false and `1` is true).
//!
//! When a column fills up, its capacity grows by a factor of
//! [`COLUMN_GROWTH_FACTOR`][crate::COLUMN_GROWTH_FACTOR], rounded up, and by at least one slot.
//!
//! # Example
//!
//! The JSON `{"a": [1, 2]}`, ingested into a document without a key, with a column capacity of
//! 2:
//!
//! ```text
//! 3f              ?       no key
//! 5b              [       root array
//!   7b            {       object
//!     81 61       "a"
//!     80 82 82    column of u8, count 2, capacity 2
//!       01 02
//!   00            end of object
//! 00              end of root array
//! ```
