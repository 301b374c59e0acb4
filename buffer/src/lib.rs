//! Byte-level buffer primitives for deltasnap.
//!
//! This crate provides [`ByteWriter`] and [`ByteReader`] for fixed-size,
//! little-endian encoding and decoding, plus [`Marker`] slots for writing a
//! length or offset after the data it describes.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Values are copied through `to_le_bytes`/`from_le_bytes`.
//! - **Bounded operations** - Reads are bounds-checked and writes respect a ceiling.
//! - **No domain knowledge** - This crate knows nothing about entities, components, or snapshots.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use buffer::{ByteReader, ByteWriter};
//!
//! let mut writer = ByteWriter::new();
//! let len = writer.create_marker::<i32>().unwrap();
//! writer.write(1.5f32).unwrap();
//! writer.patch(len, 4).unwrap();
//!
//! let bytes = writer.finish();
//! let mut reader = ByteReader::new(&bytes);
//! assert_eq!(reader.read::<i32>().unwrap(), 4);
//! assert_eq!(reader.read::<f32>().unwrap(), 1.5);
//! ```

mod error;
mod reader;
mod value;
mod writer;

pub use error::{BufferError, BufferResult};
pub use reader::ByteReader;
pub use value::WireValue;
pub use writer::{ByteWriter, Marker, DEFAULT_MAX_LEN};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = ByteWriter::new();
        let _ = ByteReader::new(&[]);
        let _ = DEFAULT_MAX_LEN;
        let _: BufferResult<()> = Ok(());
        fn assert_value<T: WireValue>() {}
        assert_value::<f32>();
    }

    #[test]
    fn mixed_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write(true).unwrap();
        writer.write(-7i32).unwrap();
        writer.write([1.0f32, -2.0, 3.5]).unwrap();
        writer.write(u64::MAX).unwrap();
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes);
        assert!(reader.read::<bool>().unwrap());
        assert_eq!(reader.read::<i32>().unwrap(), -7);
        assert_eq!(reader.read::<[f32; 3]>().unwrap(), [1.0, -2.0, 3.5]);
        assert_eq!(reader.read::<u64>().unwrap(), u64::MAX);
        assert!(reader.is_empty());
    }
}
