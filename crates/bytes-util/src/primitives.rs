use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::range_check;

/// Largest value representable by the 24-bit fields of the FLV format.
pub const UI24_MAX: u32 = 0x00FF_FFFF;

/// Big-endian primitive reads used by the FLV container and script data formats.
///
/// Every read advances the reader by the width of the operand. A reader with
/// fewer bytes left than the width fails with [`io::ErrorKind::UnexpectedEof`],
/// which the upper layers report as end of input.
pub trait ReadPrimitivesExt: io::Read {
    /// Reads an unsigned 8-bit integer.
    fn read_ui8(&mut self) -> io::Result<u8> {
        self.read_u8()
    }

    /// Reads an unsigned 16-bit integer.
    fn read_ui16(&mut self) -> io::Result<u16> {
        self.read_u16::<BigEndian>()
    }

    /// Reads an unsigned 24-bit integer.
    fn read_ui24(&mut self) -> io::Result<u32> {
        self.read_u24::<BigEndian>()
    }

    /// Reads an unsigned 32-bit integer.
    fn read_ui32(&mut self) -> io::Result<u32> {
        self.read_u32::<BigEndian>()
    }

    /// Reads a signed 16-bit integer.
    fn read_si16(&mut self) -> io::Result<i16> {
        self.read_i16::<BigEndian>()
    }

    /// Reads a signed 32-bit integer stored in the "extended" layout used by
    /// FLV tag timestamps: the lower 24 bits first, then the upper 8 bits.
    fn read_si32_extended(&mut self) -> io::Result<i32> {
        let low = self.read_u24::<BigEndian>()?;
        let high = self.read_u8()? as u32;
        Ok(((high << 24) | low) as i32)
    }

    /// Reads an IEEE-754 double.
    fn read_double(&mut self) -> io::Result<f64> {
        self.read_f64::<BigEndian>()
    }
}

impl<R: io::Read + ?Sized> ReadPrimitivesExt for R {}

/// Big-endian primitive writes, the mirror of [`ReadPrimitivesExt`].
pub trait WritePrimitivesExt: io::Write {
    /// Writes an unsigned 8-bit integer.
    fn write_ui8(&mut self, value: u8) -> io::Result<()> {
        self.write_u8(value)
    }

    /// Writes an unsigned 16-bit integer.
    fn write_ui16(&mut self, value: u16) -> io::Result<()> {
        self.write_u16::<BigEndian>(value)
    }

    /// Writes an unsigned 24-bit integer.
    ///
    /// Fails with [`io::ErrorKind::InvalidData`] if the value does not fit in 24 bits.
    fn write_ui24(&mut self, value: u32) -> io::Result<()> {
        range_check!(value, 0, UI24_MAX)?;
        self.write_u24::<BigEndian>(value)
    }

    /// Writes an unsigned 32-bit integer.
    fn write_ui32(&mut self, value: u32) -> io::Result<()> {
        self.write_u32::<BigEndian>(value)
    }

    /// Writes a signed 16-bit integer.
    fn write_si16(&mut self, value: i16) -> io::Result<()> {
        self.write_i16::<BigEndian>(value)
    }

    /// Writes a signed 32-bit integer in the extended timestamp layout.
    fn write_si32_extended(&mut self, value: i32) -> io::Result<()> {
        let value = value as u32;
        self.write_u24::<BigEndian>(value & UI24_MAX)?;
        self.write_u8((value >> 24) as u8)
    }

    /// Writes an IEEE-754 double.
    fn write_double(&mut self, value: f64) -> io::Result<()> {
        self.write_f64::<BigEndian>(value)
    }
}

impl<W: io::Write + ?Sized> WritePrimitivesExt for W {}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn eof<T: std::fmt::Debug>(result: io::Result<T>) -> bool {
        matches!(result, Err(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }

    #[test]
    fn test_read_known_values() {
        assert_eq!((&[0x22][..]).read_ui8().unwrap(), 34);
        assert_eq!((&[0x00, 0x42][..]).read_ui16().unwrap(), 66);
        assert_eq!((&[0x00, 0x04, 0xd2][..]).read_ui24().unwrap(), 1234);
        assert_eq!((&[0x02, 0x93, 0xd3, 0xde][..]).read_ui32().unwrap(), 43242462);
        assert_eq!((&[0x0d, 0xd8][..]).read_si16().unwrap(), 3544);
        assert_eq!(
            (&[0xcc, 0xff, 0x1b, 0xff][..]).read_si32_extended().unwrap(),
            -3342565
        );
        assert_eq!(
            (&[0xbf, 0xd4, 0xdd, 0x2f, 0x1a, 0x9f, 0xbe, 0x77][..])
                .read_double()
                .unwrap(),
            -0.326
        );
    }

    #[test]
    fn test_write_known_values() {
        let mut buf = Vec::new();
        buf.write_ui8(58).unwrap();
        buf.write_ui16(333).unwrap();
        buf.write_ui24(4321).unwrap();
        buf.write_ui32(3426345).unwrap();
        buf.write_si16(-24).unwrap();
        buf.write_si32_extended(9823).unwrap();
        buf.write_double(324653.45).unwrap();

        assert_eq!(
            buf,
            [
                0x3a, // ui8
                0x01, 0x4d, // ui16
                0x00, 0x10, 0xe1, // ui24
                0x00, 0x34, 0x48, 0x29, // ui32
                0xff, 0xe8, // si16
                0x00, 0x26, 0x5f, 0x00, // si32 extended
                0x41, 0x13, 0xd0, 0xb5, 0xcc, 0xcc, 0xcc, 0xcd, // double
            ]
        );
    }

    #[test]
    fn test_write_ui24_out_of_range() {
        let mut buf = Vec::new();
        let err = buf.write_ui24(UI24_MAX + 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_one_byte_short() {
        assert!(eof((&[][..]).read_ui8()));
        assert!(eof((&[0x00][..]).read_ui16()));
        assert!(eof((&[0x00, 0x00][..]).read_ui24()));
        assert!(eof((&[0x00, 0x00, 0x00][..]).read_ui32()));
        assert!(eof((&[0x00][..]).read_si16()));
        assert!(eof((&[0x00, 0x26, 0x5f][..]).read_si32_extended()));
        assert!(eof((&[0x00; 7][..]).read_double()));
    }

    proptest! {
        #[test]
        fn roundtrip_ui24(v in 0u32..=UI24_MAX) {
            let mut buf = Vec::new();
            buf.write_ui24(v).unwrap();
            prop_assert_eq!(buf.len(), 3);
            prop_assert_eq!(buf.as_slice().read_ui24().unwrap(), v);
        }

        #[test]
        fn roundtrip_si32_extended(v in any::<i32>()) {
            let mut buf = Vec::new();
            buf.write_si32_extended(v).unwrap();
            prop_assert_eq!(buf.as_slice().read_si32_extended().unwrap(), v);
            prop_assert!(eof((&buf[1..]).read_si32_extended()));
        }

        #[test]
        fn roundtrip_si16(v in any::<i16>()) {
            let mut buf = Vec::new();
            buf.write_si16(v).unwrap();
            prop_assert_eq!(buf.as_slice().read_si16().unwrap(), v);
        }

        #[test]
        fn roundtrip_double(
            v in any::<f64>().prop_filter("NaN never compares equal", |v| !v.is_nan())
        ) {
            let mut buf = Vec::new();
            buf.write_double(v).unwrap();
            prop_assert_eq!(buf.as_slice().read_double().unwrap(), v);
            prop_assert!(eof((&buf[1..]).read_double()));
        }
    }
}
