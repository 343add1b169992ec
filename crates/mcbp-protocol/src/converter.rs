//! Byte conversion between fixed-width values and byte spans.
//!
//! Every multi-byte field on the wire is big-endian ("network byte order").
//! The converter reads and writes values at the start of the span it is
//! given, so callers slice to the field offset first:
//!
//! ```
//! use mcbp_protocol::converter::ByteConverter;
//!
//! let converter = ByteConverter::new();
//! let mut header = [0u8; 24];
//! converter.write_u32(0xDEAD_BEEF, &mut header[12..]).unwrap();
//! assert_eq!(converter.read_u32(&header[12..]).unwrap(), 0xDEAD_BEEF);
//! ```
//!
//! All reads are bounds-checked: a span shorter than the value width yields
//! [`ProtocolError::IncompleteFrame`] rather than a panic, which lets the
//! operation layer turn truncated responses into a client failure.

use crate::error::ProtocolError;

/// Byte order used for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Big-endian, as used on the wire.
    #[default]
    Network,
    /// Host byte order.
    Native,
}

/// A value with a fixed encoded width.
pub trait FixedWidth: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode from the first `WIDTH` bytes of `src`.
    ///
    /// Returns `None` if `src` is shorter than `WIDTH`.
    fn decode(src: &[u8], order: ByteOrder) -> Option<Self>;

    /// Encode into the first `WIDTH` bytes of `dst`.
    ///
    /// Returns `false` without writing if `dst` is shorter than `WIDTH`.
    fn encode(self, dst: &mut [u8], order: ByteOrder) -> bool;
}

macro_rules! fixed_width {
    ($($ty:ty),* $(,)?) => {$(
        impl FixedWidth for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn decode(src: &[u8], order: ByteOrder) -> Option<Self> {
                let raw: [u8; std::mem::size_of::<$ty>()] =
                    src.get(..Self::WIDTH)?.try_into().ok()?;
                Some(match order {
                    ByteOrder::Network => <$ty>::from_be_bytes(raw),
                    ByteOrder::Native => <$ty>::from_ne_bytes(raw),
                })
            }

            fn encode(self, dst: &mut [u8], order: ByteOrder) -> bool {
                let raw = match order {
                    ByteOrder::Network => self.to_be_bytes(),
                    ByteOrder::Native => self.to_ne_bytes(),
                };
                match dst.get_mut(..Self::WIDTH) {
                    Some(slot) => {
                        slot.copy_from_slice(&raw);
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

fixed_width!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl FixedWidth for bool {
    const WIDTH: usize = 1;

    fn decode(src: &[u8], _order: ByteOrder) -> Option<Self> {
        src.first().map(|b| *b != 0)
    }

    fn encode(self, dst: &mut [u8], _order: ByteOrder) -> bool {
        match dst.first_mut() {
            Some(slot) => {
                *slot = u8::from(self);
                true
            }
            None => false,
        }
    }
}

macro_rules! network_order_accessors {
    ($(($read:ident, $write:ident, $ty:ty)),* $(,)?) => {$(
        #[doc = concat!("Read a network-order `", stringify!($ty), "` from the start of `src`.")]
        pub fn $read(&self, src: &[u8]) -> Result<$ty, ProtocolError> {
            self.read(src, ByteOrder::Network)
        }

        #[doc = concat!("Write a network-order `", stringify!($ty), "` to the start of `dst`.")]
        pub fn $write(&self, value: $ty, dst: &mut [u8]) -> Result<(), ProtocolError> {
            self.write(value, dst, ByteOrder::Network)
        }
    )*};
}

/// Stateless converter between values and byte spans.
///
/// The converter is a zero-sized value so it can be copied into every
/// connection a pool creates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteConverter;

impl ByteConverter {
    /// Create a converter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Read a value from the start of `src` in the given byte order.
    pub fn read<T: FixedWidth>(&self, src: &[u8], order: ByteOrder) -> Result<T, ProtocolError> {
        T::decode(src, order).ok_or(ProtocolError::IncompleteFrame {
            expected: T::WIDTH,
            actual: src.len(),
        })
    }

    /// Write a value to the start of `dst` in the given byte order.
    pub fn write<T: FixedWidth>(
        &self,
        value: T,
        dst: &mut [u8],
        order: ByteOrder,
    ) -> Result<(), ProtocolError> {
        if value.encode(dst, order) {
            Ok(())
        } else {
            Err(ProtocolError::BufferOverflow {
                needed: T::WIDTH,
                capacity: dst.len(),
            })
        }
    }

    /// Encode a value into a freshly allocated, minimally sized buffer.
    #[must_use]
    pub fn encode<T: FixedWidth>(&self, value: T, order: ByteOrder) -> Vec<u8> {
        let mut buf = vec![0u8; T::WIDTH];
        value.encode(&mut buf, order);
        buf
    }

    network_order_accessors!(
        (read_u8, write_u8, u8),
        (read_i16, write_i16, i16),
        (read_u16, write_u16, u16),
        (read_i32, write_i32, i32),
        (read_u32, write_u32, u32),
        (read_i64, write_i64, i64),
        (read_u64, write_u64, u64),
    );

    /// Read a boolean (any non-zero byte is `true`).
    pub fn read_bool(&self, src: &[u8], order: ByteOrder) -> Result<bool, ProtocolError> {
        self.read(src, order)
    }

    /// Read an IEEE-754 single.
    pub fn read_f32(&self, src: &[u8], order: ByteOrder) -> Result<f32, ProtocolError> {
        self.read(src, order)
    }

    /// Read an IEEE-754 double.
    pub fn read_f64(&self, src: &[u8], order: ByteOrder) -> Result<f64, ProtocolError> {
        self.read(src, order)
    }

    /// Decode the whole of `src` as UTF-8.
    pub fn read_string(&self, src: &[u8]) -> Result<String, ProtocolError> {
        std::str::from_utf8(src)
            .map(str::to_owned)
            .map_err(|e| ProtocolError::StringEncoding(e.to_string()))
    }

    /// Copy the UTF-8 bytes of `value` to the start of `dst`.
    ///
    /// Returns the number of bytes written.
    pub fn write_string(&self, value: &str, dst: &mut [u8]) -> Result<usize, ProtocolError> {
        let bytes = value.as_bytes();
        let capacity = dst.len();
        let slot = dst
            .get_mut(..bytes.len())
            .ok_or(ProtocolError::BufferOverflow {
                needed: bytes.len(),
                capacity,
            })?;
        slot.copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Read a timestamp stored as signed milliseconds since the Unix epoch.
    #[cfg(feature = "chrono")]
    pub fn read_timestamp(
        &self,
        src: &[u8],
        order: ByteOrder,
    ) -> Result<chrono::DateTime<chrono::Utc>, ProtocolError> {
        let millis: i64 = self.read(src, order)?;
        chrono::DateTime::from_timestamp_millis(millis).ok_or(ProtocolError::InvalidTimestamp(millis))
    }

    /// Write a timestamp as signed milliseconds since the Unix epoch.
    #[cfg(feature = "chrono")]
    pub fn write_timestamp(
        &self,
        value: chrono::DateTime<chrono::Utc>,
        dst: &mut [u8],
        order: ByteOrder,
    ) -> Result<(), ProtocolError> {
        self.write(value.timestamp_millis(), dst, order)
    }

    /// Set or clear the bit at `position` (0 = least significant).
    ///
    /// Positions outside `0..8` leave the byte unchanged.
    pub fn set_bit(&self, byte: &mut u8, position: u32, value: bool) {
        let Some(mask) = 1u8.checked_shl(position) else {
            return;
        };
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Get the bit at `position` (0 = least significant).
    #[must_use]
    pub fn get_bit(&self, byte: u8, position: u32) -> bool {
        1u8.checked_shl(position).is_some_and(|mask| byte & mask != 0)
    }
}
