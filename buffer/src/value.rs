//! Fixed-size values with a stable little-endian layout.

/// A value with a fixed wire size and a little-endian byte layout.
///
/// `write_le` is always handed exactly `SIZE` bytes and `read_le` is always
/// handed at least `SIZE` bytes; callers enforce the bounds.
pub trait WireValue: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Writes the value into `out[..Self::SIZE]`.
    fn write_le(&self, out: &mut [u8]);

    /// Reads a value from `bytes[..Self::SIZE]`.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_le(&self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    Self::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl WireValue for bool {
    const SIZE: usize = 1;

    #[inline]
    fn write_le(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl<T: WireValue, const N: usize> WireValue for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn write_le(&self, out: &mut [u8]) {
        for (item, chunk) in self.iter().zip(out.chunks_exact_mut(T::SIZE)) {
            item.write_le(chunk);
        }
    }

    fn read_le(bytes: &[u8]) -> Self {
        std::array::from_fn(|i| T::read_le(&bytes[i * T::SIZE..]))
    }
}
