use std::io;
use std::io::Result;

fn invalid_data(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_owned())
}

pub trait ByteReader: io::Read {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
    fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }
    fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Reads the one or two byte "S" integer.
    ///
    /// Low bits `10` mark a single byte holding `value << 2`, low bits `101`
    /// a u16 holding `value << 3`.
    fn read_s(&mut self) -> Result<u16> {
        let first = self.read_u8()?;
        if first & 0x03 == 0x02 {
            return Ok(u16::from(first >> 2));
        }
        if first & 0x07 == 0x05 {
            let second = self.read_u8()?;
            return Ok(u16::from_le_bytes([first, second]) >> 3);
        }
        Err(invalid_data("Invalid S integer tag"))
    }

    /// Reads the one, two or four byte "X" integer.
    fn read_x(&mut self) -> Result<u32> {
        let first = self.read_u8()?;
        if first & 0x01 == 0 {
            return Ok(u32::from(first >> 1));
        }
        if first & 0x03 == 0x01 {
            let second = self.read_u8()?;
            return Ok(u32::from(u16::from_le_bytes([first, second]) >> 2));
        }
        if first & 0x07 == 0x03 {
            let mut rest = [0u8; 3];
            self.read_exact(&mut rest)?;
            return Ok(u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 3);
        }
        Err(invalid_data("Invalid X integer tag"))
    }

    /// Reads `length` bytes of ISO 8859-1 text.
    fn read_latin1(&mut self, length: usize) -> Result<String> {
        let mut buf = vec![0u8; length];
        self.read_exact(&mut buf)?;
        Ok(buf.into_iter().map(char::from).collect())
    }
}

impl<R: io::Read + ?Sized> ByteReader for R {}

pub trait ByteWriter: io::Write {
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])
    }
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }
    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }
    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    fn write_s(&mut self, value: u16) -> Result<()> {
        match value {
            0..=0x3f => self.write_u8(((value as u8) << 2) | 0x02),
            0x40..=0x1fff => self.write_u16((value << 3) | 0x05),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Value too large for an S integer",
            )),
        }
    }

    fn write_x(&mut self, value: u32) -> Result<()> {
        match value {
            0..=0x7f => self.write_u8((value as u8) << 1),
            0x80..=0x3fff => self.write_u16(((value as u16) << 2) | 0x01),
            0x4000..=0x1fff_ffff => self.write_u32((value << 3) | 0x03),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Value too large for an X integer",
            )),
        }
    }

    /// Writes `string` as ISO 8859-1 without a length prefix.
    fn write_latin1(&mut self, string: &str) -> Result<()> {
        let bytes = string
            .chars()
            .map(|c| u8::try_from(u32::from(c)))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "Character outside ISO 8859-1")
            })?;
        self.write_all(&bytes)
    }
}

impl<W: io::Write + ?Sized> ByteWriter for W {}
